// SPDX-License-Identifier: MPL-2.0
//! `video_viewport` renders a playing video as a pannable, zoomable raster
//! layer inside a map-style viewport.
//!
//! The view is described like a map view (center, resolution, rotation,
//! extent) rather than with playback controls. A [`viewer::Viewer`] ties
//! together the media source, the viewport controller, the frame compositor
//! and the playback loop; a rendering host drives it and presents the
//! composited buffer.

pub mod app;
pub mod compositor;
pub mod config;
pub mod error;
pub mod media;
pub mod video_player;
pub mod viewer;
pub mod viewport;

#[cfg(test)]
mod test_utils;
