// SPDX-License-Identifier: MPL-2.0
//! Viewport state management
//!
//! The [`ViewportController`] owns the map-style view over the video:
//! center, resolution, rotation, the fixed content extent and the
//! resolution bounds. It is created before the media is ready and stays
//! inert until [`ViewportController::initialize`] is called with the
//! content extent; every operation before that is a no-op.
//!
//! Resolution bounds are enforced on every resting state. Animated zoom
//! steps clamp their target before animating, so an in-flight transition
//! never leaves the bounds either.

pub mod animation;
pub mod extent;
pub mod options;

pub use animation::{Easing, ResolutionAnimation};
pub use extent::{Coordinate, Extent, Size};
pub use options::ViewOptions;

use crate::compositor::FrameTransform;
use crate::error::Result;
use std::time::Instant;

/// Direction of a discrete zoom step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    /// Towards smaller resolutions (more detail).
    In,
    /// Towards larger resolutions (more content).
    Out,
}

impl ZoomDirection {
    /// Signed step: `-1` zooms in, `+1` zooms out.
    #[must_use]
    pub fn sign(self) -> i32 {
        match self {
            ZoomDirection::In => -1,
            ZoomDirection::Out => 1,
        }
    }
}

/// View state at rest (or sampled mid-animation).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub center: Coordinate,
    pub resolution: f64,
    pub rotation: f64,
    pub extent: Extent,
    pub min_resolution: f64,
    pub max_resolution: f64,
}

/// Owns the view state and the only in-flight resolution animation.
#[derive(Debug, Clone)]
pub struct ViewportController {
    options: ViewOptions,
    viewport: Size,
    state: Option<ViewState>,
    animation: Option<ResolutionAnimation>,
}

impl ViewportController {
    /// Creates an uninitialized controller after validating `options`.
    pub fn new(options: ViewOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            options,
            viewport: Size::default(),
            state: None,
            animation: None,
        })
    }

    /// Fixes the content extent and fits it into `viewport`.
    ///
    /// Only the first call has an effect: the extent never changes once set.
    pub fn initialize(&mut self, extent: Extent, viewport: Size) {
        if self.state.is_some() {
            tracing::debug!("viewport already initialized, ignoring new extent");
            return;
        }
        self.viewport = viewport;
        let center = self.options.center.unwrap_or_else(|| extent.center());
        self.state = Some(ViewState {
            center: extent.clamp(center),
            resolution: self.options.clamp_resolution(self.options.resolution),
            rotation: self.options.rotation,
            extent,
            min_resolution: self.options.min_resolution,
            max_resolution: self.options.max_resolution,
        });
        tracing::debug!(
            width = extent.width(),
            height = extent.height(),
            "viewport initialized"
        );
        self.fit_to_extent();
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    /// Current view state, `None` before initialization.
    #[must_use]
    pub fn view_state(&self) -> Option<&ViewState> {
        self.state.as_ref()
    }

    #[must_use]
    pub fn options(&self) -> &ViewOptions {
        &self.options
    }

    #[must_use]
    pub fn viewport_size(&self) -> Size {
        self.viewport
    }

    /// Updates the viewport size. The view keeps its center and resolution.
    pub fn set_viewport_size(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Target of the in-flight zoom animation.
    #[must_use]
    pub fn animation_target(&self) -> Option<f64> {
        self.animation.map(|animation| animation.target())
    }

    /// Drops the in-flight animation, leaving the resolution where it is.
    pub fn cancel_animation(&mut self) {
        if self.animation.take().is_some() {
            tracing::trace!("zoom animation cancelled");
        }
    }

    /// Steps the in-flight animation to `now`. Returns whether it is still running.
    pub fn advance(&mut self, now: Instant) -> bool {
        let Some(animation) = self.animation else {
            return false;
        };
        let Some(state) = self.state.as_mut() else {
            self.animation = None;
            return false;
        };

        let sample = animation.sample(now);
        if sample.complete {
            state.resolution = self.options.clamp_resolution(sample.resolution);
            self.animation = None;
            false
        } else {
            state.resolution = sample.resolution;
            true
        }
    }

    /// Shows the whole extent centered in the viewport.
    pub fn fit_to_extent(&mut self) {
        self.cancel_animation();
        let viewport = self.viewport;
        let options = self.options;
        let Some(state) = self.state.as_mut() else {
            return;
        };
        if viewport.is_empty() || state.extent.is_empty() {
            tracing::debug!(?viewport, "cannot fit into an empty viewport");
            return;
        }

        let resolution = (state.extent.width() / f64::from(viewport.width))
            .max(state.extent.height() / f64::from(viewport.height));
        state.resolution = options.clamp_resolution(resolution);
        state.center = state.extent.center();
    }

    /// Clears rotation and fits the extent.
    pub fn reset_view(&mut self) {
        self.cancel_animation();
        let Some(state) = self.state.as_mut() else {
            return;
        };
        state.rotation = 0.0;
        self.fit_to_extent();
    }

    /// Jumps to native pixel scale (resolution 1), keeping the center.
    pub fn zoom_to_full(&mut self) {
        self.cancel_animation();
        let options = self.options;
        if let Some(state) = self.state.as_mut() {
            state.resolution = options.clamp_resolution(1.0);
        }
    }

    /// Starts an animated zoom of one level in `direction`.
    ///
    /// Any in-flight animation is cancelled first at its current value, so
    /// the last request wins.
    pub fn zoom_by_step(&mut self, direction: ZoomDirection, now: Instant) {
        if self.state.is_none() {
            return;
        }
        self.advance(now);
        self.cancel_animation();

        let Some(current) = self.state.as_ref().map(|state| state.resolution) else {
            return;
        };
        let target = self.step_resolution(current, direction);
        self.animation = Some(ResolutionAnimation::new(
            current,
            target,
            now,
            self.options.zoom_duration,
            self.options.easing,
        ));
        tracing::trace!(from = current, to = target, "zoom animation started");
    }

    pub fn zoom_in(&mut self, now: Instant) {
        self.zoom_by_step(ZoomDirection::In, now);
    }

    pub fn zoom_out(&mut self, now: Instant) {
        self.zoom_by_step(ZoomDirection::Out, now);
    }

    /// Resolution one zoom level away from `resolution`, clamped into bounds.
    ///
    /// Levels are `max_resolution / zoom_factor^n`; the current resolution
    /// is snapped to the nearest level before stepping. A step never moves
    /// against its direction, even when the snapped level lies beyond a bound.
    fn step_resolution(&self, resolution: f64, direction: ZoomDirection) -> f64 {
        let ViewOptions {
            zoom_factor,
            max_resolution,
            ..
        } = self.options;
        let level = ((max_resolution / resolution).ln() / zoom_factor.ln()).round();
        let next = (level - f64::from(direction.sign())).max(0.0);
        let candidate = self
            .options
            .clamp_resolution(max_resolution / zoom_factor.powf(next));
        match direction {
            ZoomDirection::In => candidate.min(resolution),
            ZoomDirection::Out => candidate.max(resolution),
        }
    }

    /// Moves the view by a drag of `dx`, `dy` viewport pixels.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        let (sin, cos) = state.rotation.sin_cos();
        let delta_x = -dx * state.resolution;
        let delta_y = dy * state.resolution;
        let center = Coordinate::new(
            state.center.x + delta_x * cos - delta_y * sin,
            state.center.y + delta_x * sin + delta_y * cos,
        );
        state.center = state.extent.clamp(center);
    }

    /// Sets the view rotation in radians.
    pub fn set_rotation(&mut self, rotation: f64) {
        if !rotation.is_finite() {
            return;
        }
        if let Some(state) = self.state.as_mut() {
            state.rotation = rotation;
        }
    }

    /// Transform the compositor needs to draw the current view.
    ///
    /// With a rotated view the extent is the bounding box of the rotated
    /// viewport; the host applies the rotation when presenting the buffer.
    #[must_use]
    pub fn frame_transform(&self, pixel_ratio: f64) -> Option<FrameTransform> {
        let state = self.state.as_ref()?;
        if self.viewport.is_empty() || !(pixel_ratio.is_finite() && pixel_ratio > 0.0) {
            return None;
        }

        let half_width = f64::from(self.viewport.width) * state.resolution / 2.0;
        let half_height = f64::from(self.viewport.height) * state.resolution / 2.0;
        let (sin, cos) = state.rotation.sin_cos();
        let (sin, cos) = (sin.abs(), cos.abs());
        let extent = Extent::around(
            state.center,
            half_width * cos + half_height * sin,
            half_width * sin + half_height * cos,
        );

        let device = |content: f64| (content / state.resolution * pixel_ratio).round() as u32;
        Some(FrameTransform {
            extent,
            resolution: state.resolution,
            pixel_ratio,
            size: Size::new(device(extent.width()), device(extent.height())),
        })
    }
}
