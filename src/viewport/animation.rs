// SPDX-License-Identifier: MPL-2.0
//! Timed resolution transitions.

use std::time::{Duration, Instant};

/// Progress curve applied to a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    Linear,
    /// Starts fast and decelerates toward the target.
    #[default]
    EaseOut,
}

impl Easing {
    /// Maps linear progress `t` in `[0, 1]` to eased progress.
    #[must_use]
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseOut => 1.0 - (1.0 - t).powi(3),
        }
    }
}

/// An in-flight transition of the view resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolutionAnimation {
    from: f64,
    to: f64,
    started_at: Instant,
    duration: Duration,
    easing: Easing,
}

/// Value of an animation at a point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub resolution: f64,
    pub complete: bool,
}

impl ResolutionAnimation {
    #[must_use]
    pub fn new(from: f64, to: f64, started_at: Instant, duration: Duration, easing: Easing) -> Self {
        Self {
            from,
            to,
            started_at,
            duration,
            easing,
        }
    }

    #[must_use]
    pub fn target(&self) -> f64 {
        self.to
    }

    /// Samples the animation at `now`. Times before the start sample as the start.
    #[must_use]
    pub fn sample(&self, now: Instant) -> Sample {
        let elapsed = now.saturating_duration_since(self.started_at);
        if self.duration.is_zero() || elapsed >= self.duration {
            return Sample {
                resolution: self.to,
                complete: true,
            };
        }
        let progress = self.easing.apply(elapsed.as_secs_f64() / self.duration.as_secs_f64());
        Sample {
            resolution: self.from + progress * (self.to - self.from),
            complete: false,
        }
    }
}
