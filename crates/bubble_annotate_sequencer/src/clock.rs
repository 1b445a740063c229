// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame clock: snapping and stepping on the source video's frame grid.

use crate::media::MediaAsset;

/// Frame rate assumed when the source does not report a usable one
pub const DEFAULT_FRAME_RATE: f64 = 30.0;

/// Frame grid derived from the source video
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    frame_duration: f64,
}

impl FrameClock {
    /// Create a clock at [`DEFAULT_FRAME_RATE`]
    pub fn new() -> Self {
        Self {
            frame_duration: 1.0 / DEFAULT_FRAME_RATE,
        }
    }

    /// Create a clock for a frame rate, falling back to the default for
    /// non-positive or non-finite rates
    pub fn from_frame_rate(frame_rate: f64) -> Self {
        let mut clock = Self::new();
        clock.set_frame_rate(frame_rate);
        clock
    }

    /// Create a clock for an asset, see [`FrameClock::update_from_asset`]
    pub fn for_asset(asset: Option<&dyn MediaAsset>) -> Self {
        let mut clock = Self::new();
        clock.update_from_asset(asset);
        clock
    }

    /// Recompute the frame duration for a newly loaded asset
    pub fn update_from_asset(&mut self, asset: Option<&dyn MediaAsset>) {
        let rate = asset
            .and_then(|asset| asset.video_track())
            .map_or(0.0, |track| track.nominal_frame_rate);
        self.set_frame_rate(rate);
    }

    fn set_frame_rate(&mut self, frame_rate: f64) {
        self.frame_duration = if frame_rate.is_finite() && frame_rate > 0.0 {
            1.0 / frame_rate
        } else {
            1.0 / DEFAULT_FRAME_RATE
        };
    }

    /// Seconds per frame
    pub fn frame_duration(&self) -> f64 {
        self.frame_duration
    }

    /// Nearest frame index for a time (may be negative for negative times)
    pub fn frame_index(&self, time: f64) -> i64 {
        (time / self.frame_duration).round() as i64
    }

    /// Start time of a frame, clamped at frame 0
    pub fn frame_time(&self, frame: i64) -> f64 {
        frame.max(0) as f64 * self.frame_duration
    }

    /// Round to the nearest frame boundary, never below 0
    pub fn snap_to_frame(&self, time: f64) -> f64 {
        self.frame_time(self.frame_index(time))
    }

    /// Snap, then step one frame forward
    pub fn nudge_forward(&self, time: f64) -> f64 {
        self.frame_time(self.frame_index(time).max(0) + 1)
    }

    /// Snap, then step one frame back, stopping at 0
    pub fn nudge_backward(&self, time: f64) -> f64 {
        self.frame_time(self.frame_index(time) - 1)
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
