// SPDX-License-Identifier: MIT OR Apache-2.0
//! Seam to the external media subsystem.
//!
//! Decoding, seeking and muxing live outside this workspace's core. The core
//! only needs to ask an opened asset about its tracks.

use std::fmt;
use std::path::Path;

/// Affine transform a player applies to decoded frames to show them upright.
///
/// Same layout as a 2D affine matrix `[a b 0; c d 0; tx ty 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoTransform {
    /// Row 0, column 0
    pub a: f64,
    /// Row 0, column 1
    pub b: f64,
    /// Row 1, column 0
    pub c: f64,
    /// Row 1, column 1
    pub d: f64,
    /// X translation
    pub tx: f64,
    /// Y translation
    pub ty: f64,
}

impl VideoTransform {
    /// The identity transform
    pub const IDENTITY: Self = Self { a: 1.0, b: 0.0, c: 0.0, d: 1.0, tx: 0.0, ty: 0.0 };

    /// Clockwise rotation by a multiple of 90 degrees for a frame of the given
    /// natural size, translated so the result stays in the positive quadrant.
    pub fn quarter_turns(turns: i32, width: f64, height: f64) -> Self {
        match turns.rem_euclid(4) {
            1 => Self { a: 0.0, b: 1.0, c: -1.0, d: 0.0, tx: height, ty: 0.0 },
            2 => Self { a: -1.0, b: 0.0, c: 0.0, d: -1.0, tx: width, ty: height },
            3 => Self { a: 0.0, b: -1.0, c: 1.0, d: 0.0, tx: 0.0, ty: width },
            _ => Self::IDENTITY,
        }
    }

    /// Rotation in whole clockwise quarter turns (0..=3), rounded to the nearest
    pub fn rotation_quarter_turns(&self) -> i32 {
        let radians = self.b.atan2(self.a);
        (radians / std::f64::consts::FRAC_PI_2).round() as i32 & 3
    }

    /// Whether the transform leaves frames untouched
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for VideoTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Metadata of the first video track of an asset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoTrackInfo {
    /// Encoded frame width in pixels, before the transform
    pub natural_width: f64,
    /// Encoded frame height in pixels, before the transform
    pub natural_height: f64,
    /// Orientation transform
    pub preferred_transform: VideoTransform,
    /// Nominal frames per second, `0` when unknown
    pub nominal_frame_rate: f64,
}

/// An opened video asset
pub trait MediaAsset: Send + Sync + fmt::Debug {
    /// Location of the asset
    fn path(&self) -> &Path;

    /// Duration in seconds
    fn duration(&self) -> f64;

    /// First video track, if any
    fn video_track(&self) -> Option<VideoTrackInfo>;

    /// Whether the asset has at least one audio track
    fn has_audio(&self) -> bool;
}
