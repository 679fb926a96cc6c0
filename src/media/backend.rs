// SPDX-License-Identifier: MPL-2.0
//! Port between a [`MediaSource`](super::MediaSource) and whatever decodes the media.
//!
//! The FFmpeg [`AsyncDecoder`] is the production adapter. Anything that
//! accepts [`DecoderCommand`]s and produces [`DecoderEvent`]s can stand in
//! for it, which is how the viewer is driven in tests.

use crate::error::Result;
use crate::video_player::{AsyncDecoder, DecoderCommand, DecoderEvent};

/// Decoder behind a media source.
///
/// Methods never block: commands are queued and events are polled.
pub trait MediaBackend {
    /// Queues a command for the decoder.
    ///
    /// # Errors
    ///
    /// Fails when the decoder is gone.
    fn send_command(&self, command: DecoderCommand) -> Result<()>;

    /// Returns the next pending event, if any.
    fn try_recv_event(&mut self) -> Option<DecoderEvent>;
}

impl MediaBackend for AsyncDecoder {
    fn send_command(&self, command: DecoderCommand) -> Result<()> {
        AsyncDecoder::send_command(self, command)
    }

    fn try_recv_event(&mut self) -> Option<DecoderEvent> {
        AsyncDecoder::try_recv_event(self)
    }
}
