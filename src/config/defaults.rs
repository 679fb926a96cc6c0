// SPDX-License-Identifier: MPL-2.0
//! Centralized default values for all configuration constants.
//!
//! This module serves as the single source of truth for default values
//! used across the crate. Constants are organized by category.
//!
//! # Categories
//!
//! - **View**: Resolution bounds, zoom factor and zoom animation
//! - **Playback**: Redraw cadence and looping
//! - **Host**: Headless host viewport and snapshot settings

use std::time::Duration;

// ==========================================================================
// View Defaults
// ==========================================================================

/// Resolution the view starts at before the first fit (1.0 = native pixels).
pub const DEFAULT_RESOLUTION: f64 = 1.0;

/// Smallest resolution (most zoomed in) a view may rest at.
pub const MIN_RESOLUTION: f64 = 0.1;

/// Largest resolution (most zoomed out) a view may rest at.
pub const MAX_RESOLUTION: f64 = 10.0;

/// Ratio between two adjacent zoom levels.
pub const DEFAULT_ZOOM_FACTOR: f64 = 2.0;

/// Duration of an animated zoom step, in milliseconds.
pub const ZOOM_ANIMATION_DURATION_MS: u64 = 250;

/// Duration of an animated zoom step.
pub const ZOOM_ANIMATION_DURATION: Duration = Duration::from_millis(ZOOM_ANIMATION_DURATION_MS);

// ==========================================================================
// Playback Defaults
// ==========================================================================

/// Target number of playback loop iterations per second.
pub const TARGET_FRAME_RATE: u32 = 60;

/// Interval between two display refresh opportunities at the target rate.
pub const FRAME_INTERVAL: Duration = Duration::from_micros(1_000_000 / TARGET_FRAME_RATE as u64);

/// Whether media restarts from the beginning when it reaches the end.
pub const DEFAULT_LOOP: bool = true;

/// Capacity of the decoder → media source event channel.
/// Small on purpose: the viewer only ever shows the newest frame.
pub const DECODER_EVENT_CAPACITY: usize = 2;

// ==========================================================================
// Host Defaults
// ==========================================================================

/// Default viewport width for the headless host, in pixels.
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 800;

/// Default viewport height for the headless host, in pixels.
pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 600;

/// Default device pixel ratio.
pub const DEFAULT_PIXEL_RATIO: f64 = 1.0;

/// How long the headless host waits for a source to become ready.
pub const DEFAULT_READY_TIMEOUT_SECS: u64 = 10;

/// Number of playback frames the headless host renders by default.
pub const DEFAULT_HOST_FRAMES: u32 = 120;

/// A snapshot is written every this many rendered frames.
pub const DEFAULT_SNAPSHOT_INTERVAL: u32 = 30;

// ==========================================================================
// Compile-time Validation
// ==========================================================================

const _: () = {
    assert!(MIN_RESOLUTION > 0.0);
    assert!(MIN_RESOLUTION <= DEFAULT_RESOLUTION);
    assert!(MAX_RESOLUTION >= DEFAULT_RESOLUTION);
    assert!(DEFAULT_ZOOM_FACTOR > 1.0);
    assert!(TARGET_FRAME_RATE > 0);
    assert!(DECODER_EVENT_CAPACITY > 0);
    assert!(DEFAULT_SNAPSHOT_INTERVAL > 0);
};
