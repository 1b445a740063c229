// SPDX-License-Identifier: MIT OR Apache-2.0
//! Opacity keyframes that fade annotations in and out.
//!
//! Each annotation gets a piecewise-linear opacity curve over the whole
//! timeline. Key times are normalized to the curve duration, the same form
//! the render backend bakes into the overlay.

use serde::{Deserialize, Serialize};

/// Start times below this are treated as "visible from the first frame"
pub const ZERO_START_THRESHOLD: f64 = 0.01;

/// Length of the fade-out ramp after the end time, in seconds
pub const FADE_OUT_DURATION: f64 = 0.05;

/// Minimum padding between the end time and the end of the curve, in seconds
pub const TAIL_PADDING: f64 = 0.5;

/// Normalized gap before the entry key that forces a hard cut instead of a ramp
pub const ENTRY_EPSILON: f64 = 0.001;

/// A single opacity keyframe
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Normalized time in `0..=1`
    pub time: f64,
    /// Opacity at this time
    pub value: f64,
}

impl Keyframe {
    /// Create a new keyframe
    pub fn new(time: f64, value: f64) -> Self {
        Self { time, value }
    }
}

/// Interpolation utilities
pub struct Interpolation;

impl Interpolation {
    /// Linear interpolation between two values
    pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
        a + (b - a) * t
    }
}

/// Piecewise-linear opacity curve for one annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpacityCurve {
    /// Curve duration in seconds; key times are fractions of this
    pub duration: f64,
    /// Keyframes in ascending time order
    pub keyframes: Vec<Keyframe>,
}

impl OpacityCurve {
    /// Schedule an annotation shown during `[start_time, end_time]` on a
    /// timeline of `timeline_duration` seconds.
    ///
    /// The curve duration is stretched to at least `end_time + 0.5` so the
    /// fade-out always fits.
    pub fn schedule(start_time: f64, end_time: f64, timeline_duration: f64) -> Self {
        let duration = timeline_duration.max(end_time + TAIL_PADDING);
        let visible_end = end_time / duration;
        let fade_out = ((end_time + FADE_OUT_DURATION) / duration).min(1.0);

        let keyframes = if start_time < ZERO_START_THRESHOLD {
            vec![
                Keyframe::new(0.0, 1.0),
                Keyframe::new(visible_end, 1.0),
                Keyframe::new(fade_out, 0.0),
            ]
        } else {
            let fade_in = start_time.max(0.001) / duration;
            vec![
                Keyframe::new(0.0, 0.0),
                Keyframe::new(fade_in - ENTRY_EPSILON, 0.0),
                Keyframe::new(fade_in, 1.0),
                Keyframe::new(visible_end, 1.0),
                Keyframe::new(fade_out, 0.0),
            ]
        };

        Self { duration, keyframes }
    }

    /// Normalized key times
    pub fn key_times(&self) -> Vec<f64> {
        self.keyframes.iter().map(|k| k.time).collect()
    }

    /// Key values
    pub fn values(&self) -> Vec<f64> {
        self.keyframes.iter().map(|k| k.value).collect()
    }

    /// Keyframes converted to absolute seconds
    pub fn absolute_keyframes(&self) -> impl Iterator<Item = Keyframe> + '_ {
        self.keyframes
            .iter()
            .map(move |k| Keyframe::new(k.time * self.duration, k.value))
    }

    /// Evaluate at a normalized time. Values hold flat before the first and
    /// after the last keyframe.
    pub fn evaluate(&self, time: f64) -> f64 {
        let (Some(first), Some(last)) = (self.keyframes.first(), self.keyframes.last()) else {
            return 0.0;
        };

        if time <= first.time {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }

        let (prev, next) = self.find_keyframes(time);
        let span = next.time - prev.time;
        if span <= 0.0 {
            return next.value;
        }
        Interpolation::lerp(prev.value, next.value, (time - prev.time) / span)
    }

    /// Evaluate at an absolute time in seconds
    pub fn opacity_at(&self, seconds: f64) -> f64 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        self.evaluate(seconds / self.duration)
    }

    /// Find the keyframes surrounding `time`, which must lie inside the curve
    fn find_keyframes(&self, time: f64) -> (&Keyframe, &Keyframe) {
        let next_index = self
            .keyframes
            .iter()
            .position(|k| k.time > time)
            .unwrap_or(self.keyframes.len() - 1)
            .max(1);
        (&self.keyframes[next_index - 1], &self.keyframes[next_index])
    }
}
