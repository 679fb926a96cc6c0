// SPDX-License-Identifier: MPL-2.0
//! Media source.
//!
//! A [`MediaSource`] owns the decoder of one media resource and exposes what
//! the viewer needs from it: a one-shot readiness signal carrying the
//! intrinsic size, the newest decoded frame, and idempotent play/pause.
//!
//! Decode failures are not reported to callers. A source that cannot be
//! decoded logs the failure and simply never becomes ready.

pub mod backend;
pub mod video;

pub use backend::MediaBackend;

use crate::config::DEFAULT_LOOP;
use crate::error::VideoError;
use crate::video_player::{AsyncDecoder, DecodedFrame, DecoderCommand, DecoderEvent};

/// Lifecycle of a media source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaState {
    /// Created, not opened yet.
    Uninitialized,
    /// Opened, waiting for the intrinsic size.
    Loading,
    /// Intrinsic size known, never played.
    Ready,
    Playing,
    Paused,
}

impl MediaState {
    /// Whether the intrinsic size is known.
    #[must_use]
    pub fn is_ready(self) -> bool {
        matches!(self, Self::Ready | Self::Playing | Self::Paused)
    }
}

/// Intrinsic size of the media in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MediaDimensions {
    pub width: u32,
    pub height: u32,
}

impl MediaDimensions {
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

type ReadyCallback = Box<dyn FnOnce(MediaDimensions)>;

/// A playable media resource and its decode state.
pub struct MediaSource {
    locator: String,
    state: MediaState,
    dimensions: MediaDimensions,
    duration_secs: Option<f64>,
    loop_enabled: bool,
    backend: Option<Box<dyn MediaBackend>>,
    current_frame: Option<DecodedFrame>,
    ready_callbacks: Vec<ReadyCallback>,
}

impl std::fmt::Debug for MediaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaSource")
            .field("locator", &self.locator)
            .field("state", &self.state)
            .field("dimensions", &self.dimensions)
            .field("loop_enabled", &self.loop_enabled)
            .field("pending_callbacks", &self.ready_callbacks.len())
            .finish_non_exhaustive()
    }
}

impl MediaSource {
    /// Creates a source for `locator` (file path or URL). Nothing is decoded yet.
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            state: MediaState::Uninitialized,
            dimensions: MediaDimensions::default(),
            duration_secs: None,
            loop_enabled: DEFAULT_LOOP,
            backend: None,
            current_frame: None,
            ready_callbacks: Vec::new(),
        }
    }

    /// Starts decoding the locator with FFmpeg.
    ///
    /// Failures are logged and leave the source loading forever.
    pub fn open(&mut self) {
        if self.state != MediaState::Uninitialized {
            return;
        }
        self.state = MediaState::Loading;
        match AsyncDecoder::new(&self.locator) {
            Ok(decoder) => {
                tracing::info!(locator = %self.locator, "opening media");
                self.backend = Some(Box::new(decoder));
            }
            Err(err) => {
                tracing::warn!(locator = %self.locator, "media will not become ready: {err}");
            }
        }
    }

    /// Starts decoding with a caller-provided backend.
    pub fn open_with(&mut self, backend: Box<dyn MediaBackend>) {
        if self.state != MediaState::Uninitialized {
            return;
        }
        tracing::info!(locator = %self.locator, "opening media");
        self.state = MediaState::Loading;
        self.backend = Some(backend);
    }

    /// Registers a callback fired once when the intrinsic size becomes known.
    ///
    /// Every registration fires exactly once. Registering after readiness
    /// fires immediately.
    pub fn on_ready(&mut self, callback: impl FnOnce(MediaDimensions) + 'static) {
        if self.state.is_ready() {
            callback(self.dimensions);
        } else {
            self.ready_callbacks.push(Box::new(callback));
        }
    }

    /// Drains pending decoder events.
    ///
    /// Returns the intrinsic size on the call that made the source ready,
    /// `None` on every other call. Only the newest queued frame is kept.
    pub fn poll(&mut self) -> Option<MediaDimensions> {
        let mut became_ready = None;
        let mut reached_end = false;

        while let Some(event) = self
            .backend
            .as_mut()
            .and_then(|backend| backend.try_recv_event())
        {
            match event {
                DecoderEvent::Loaded {
                    width,
                    height,
                    duration_secs,
                } => {
                    let dimensions = MediaDimensions { width, height };
                    if self.state == MediaState::Loading && !dimensions.is_empty() {
                        self.dimensions = dimensions;
                        self.duration_secs = duration_secs;
                        self.state = MediaState::Ready;
                        became_ready = Some(dimensions);
                    }
                }
                DecoderEvent::FrameReady(frame) => {
                    if self.state.is_ready()
                        && frame.width == self.dimensions.width
                        && frame.height == self.dimensions.height
                    {
                        self.current_frame = Some(frame);
                    } else {
                        tracing::trace!(
                            width = frame.width,
                            height = frame.height,
                            "dropping frame that does not match the intrinsic size"
                        );
                    }
                }
                DecoderEvent::EndOfStream => reached_end = true,
                DecoderEvent::Error(message) => {
                    tracing::warn!(locator = %self.locator, "decoder: {}", VideoError::from_message(&message));
                }
            }
        }

        if let Some(dimensions) = became_ready {
            tracing::info!(
                locator = %self.locator,
                width = dimensions.width,
                height = dimensions.height,
                "media ready"
            );
            for callback in std::mem::take(&mut self.ready_callbacks) {
                callback(dimensions);
            }
        }

        if reached_end && self.state == MediaState::Playing {
            if self.loop_enabled {
                self.send(DecoderCommand::Seek { target_secs: 0.0 });
                self.send(DecoderCommand::Play);
            } else {
                self.state = MediaState::Paused;
            }
        }

        became_ready
    }

    /// Starts playback. No-op while playing or before readiness.
    pub fn play(&mut self) {
        match self.state {
            MediaState::Ready | MediaState::Paused => {
                self.send(DecoderCommand::Play);
                self.state = MediaState::Playing;
            }
            MediaState::Playing => {}
            MediaState::Uninitialized | MediaState::Loading => {
                tracing::debug!("play ignored: media not ready");
            }
        }
    }

    /// Pauses playback. No-op unless playing.
    pub fn pause(&mut self) {
        if self.state == MediaState::Playing {
            self.send(DecoderCommand::Pause);
            self.state = MediaState::Paused;
        }
    }

    /// Current paused flag. A source that is not playing counts as paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.state != MediaState::Playing
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.state == MediaState::Playing
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    #[must_use]
    pub fn state(&self) -> MediaState {
        self.state
    }

    /// Intrinsic size; zero until ready.
    #[must_use]
    pub fn dimensions(&self) -> MediaDimensions {
        self.dimensions
    }

    #[must_use]
    pub fn duration_secs(&self) -> Option<f64> {
        self.duration_secs
    }

    /// Newest decoded frame, `None` until ready.
    #[must_use]
    pub fn current_frame(&self) -> Option<&DecodedFrame> {
        if self.state.is_ready() {
            self.current_frame.as_ref()
        } else {
            None
        }
    }

    #[must_use]
    pub fn locator(&self) -> &str {
        &self.locator
    }

    #[must_use]
    pub fn is_loop_enabled(&self) -> bool {
        self.loop_enabled
    }

    pub fn set_loop(&mut self, enabled: bool) {
        self.loop_enabled = enabled;
    }

    /// Stops the decoder and releases it. The source cannot be reopened.
    pub fn close(&mut self) {
        if let Some(backend) = self.backend.take() {
            // The decoder may already be gone; nothing left to release then
            let _ = backend.send_command(DecoderCommand::Stop);
            tracing::debug!(locator = %self.locator, "media closed");
        }
        if self.state == MediaState::Playing {
            self.state = MediaState::Paused;
        }
        self.ready_callbacks.clear();
    }

    fn send(&self, command: DecoderCommand) {
        if let Some(backend) = &self.backend {
            if let Err(err) = backend.send_command(command) {
                tracing::warn!(locator = %self.locator, "decoder command dropped: {err}");
            }
        }
    }
}

impl Drop for MediaSource {
    fn drop(&mut self) {
        self.close();
    }
}
