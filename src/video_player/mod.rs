// SPDX-License-Identifier: MPL-2.0
//! Video playback plumbing.
//!
//! The FFmpeg decoder runs on a Tokio blocking task and talks to the
//! single-threaded viewer over channels; the playback loop turns "the media
//! is playing" into one redraw per display refresh.

mod decoder;
pub mod playback_loop;

pub use decoder::{AsyncDecoder, DecodedFrame, DecoderCommand, DecoderEvent};
pub use playback_loop::{
    FrameRequest, FrameScheduler, Iteration, LoopState, ManualScheduler, PlaybackLoop,
};
