// SPDX-License-Identifier: MPL-2.0
//! Construction options for a view.

use super::animation::Easing;
use super::extent::Coordinate;
use crate::config::{
    DEFAULT_RESOLUTION, DEFAULT_ZOOM_FACTOR, MAX_RESOLUTION, MIN_RESOLUTION,
    ZOOM_ANIMATION_DURATION,
};
use crate::error::{Error, Result};
use std::time::Duration;

/// Named view parameters, validated before a controller uses them.
#[derive(Debug, Clone, Copy)]
pub struct ViewOptions {
    /// Initial center. `None` centers on the content extent.
    pub center: Option<Coordinate>,

    /// Initial resolution, used until the first fit.
    pub resolution: f64,

    pub min_resolution: f64,
    pub max_resolution: f64,

    /// Initial rotation in radians.
    pub rotation: f64,

    /// Ratio between adjacent zoom levels (must be > 1).
    pub zoom_factor: f64,

    /// Duration of an animated zoom step.
    pub zoom_duration: Duration,

    pub easing: Easing,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            center: None,
            resolution: DEFAULT_RESOLUTION,
            min_resolution: MIN_RESOLUTION,
            max_resolution: MAX_RESOLUTION,
            rotation: 0.0,
            zoom_factor: DEFAULT_ZOOM_FACTOR,
            zoom_duration: ZOOM_ANIMATION_DURATION,
            easing: Easing::EaseOut,
        }
    }
}

impl ViewOptions {
    /// Checks that the options describe a usable view.
    pub fn validate(&self) -> Result<()> {
        if !(self.min_resolution.is_finite() && self.min_resolution > 0.0) {
            return Err(Error::Config(format!(
                "min_resolution must be a positive number, got {}",
                self.min_resolution
            )));
        }
        if !self.max_resolution.is_finite() || self.max_resolution < self.min_resolution {
            return Err(Error::Config(format!(
                "max_resolution ({}) must be finite and >= min_resolution ({})",
                self.max_resolution, self.min_resolution
            )));
        }
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(Error::Config(format!(
                "resolution must be a positive number, got {}",
                self.resolution
            )));
        }
        if !(self.zoom_factor.is_finite() && self.zoom_factor > 1.0) {
            return Err(Error::Config(format!(
                "zoom_factor must be greater than 1, got {}",
                self.zoom_factor
            )));
        }
        if !self.rotation.is_finite() {
            return Err(Error::Config("rotation must be finite".into()));
        }
        if let Some(center) = self.center {
            if !(center.x.is_finite() && center.y.is_finite()) {
                return Err(Error::Config("center must be finite".into()));
            }
        }
        Ok(())
    }

    /// Clamps a resolution into `[min_resolution, max_resolution]`.
    #[must_use]
    pub fn clamp_resolution(&self, resolution: f64) -> f64 {
        resolution.clamp(self.min_resolution, self.max_resolution)
    }
}
