// SPDX-License-Identifier: MPL-2.0
//! Wiring between the media source, the view, the compositor and the
//! playback loop.
//!
//! The [`Viewer`] is what a rendering host embeds. The host:
//! 1. calls [`Viewer::poll`] regularly so decoded frames and readiness arrive,
//! 2. forwards input as [`ViewerCommand`]s,
//! 3. hands fired frame requests to [`Viewer::on_frame`] and calls
//!    [`Viewer::tick`] once per display refresh,
//! 4. calls [`Viewer::render`] whenever [`Viewer::take_redraw_request`] says so.
//!
//! View commands are ignored until the media is ready, which is the only
//! point at which the view has an extent to work with.

use crate::compositor::FrameCompositor;
use crate::error::Result;
use crate::media::{MediaDimensions, MediaSource};
use crate::video_player::{
    FrameRequest, FrameScheduler, Iteration, ManualScheduler, PlaybackLoop,
};
use crate::viewport::{Extent, Size, ViewOptions, ViewportController};
use std::time::Instant;
use tiny_skia::Pixmap;

/// Input from the host, already mapped from pointer and UI events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewerCommand {
    /// Click on the view.
    TogglePlayback,
    ResetView,
    ZoomIn,
    ZoomOut,
    ZoomToFull,
    /// Drag by a distance in viewport pixels.
    Pan { dx: f64, dy: f64 },
    /// Set the view rotation in radians.
    Rotate { radians: f64 },
    /// The host viewport changed size.
    Resize { width: u32, height: u32 },
}

pub struct Viewer<S: FrameScheduler = ManualScheduler> {
    media: MediaSource,
    viewport: ViewportController,
    compositor: FrameCompositor,
    playback: PlaybackLoop,
    scheduler: S,
    viewport_size: Size,
    pixel_ratio: f64,
    update_while_animating: bool,
    redraw_requested: bool,
}

impl<S: FrameScheduler> Viewer<S> {
    /// Creates a viewer for `media`, which may or may not be opened yet.
    pub fn new(
        media: MediaSource,
        options: ViewOptions,
        scheduler: S,
        viewport_size: Size,
        pixel_ratio: f64,
    ) -> Result<Self> {
        Ok(Self {
            media,
            viewport: ViewportController::new(options)?,
            compositor: FrameCompositor::new(),
            playback: PlaybackLoop::new(),
            scheduler,
            viewport_size,
            pixel_ratio,
            update_while_animating: true,
            redraw_requested: false,
        })
    }

    /// Pumps media events. Returns the intrinsic size when the media just became ready.
    pub fn poll(&mut self) -> Option<MediaDimensions> {
        let ready = self.media.poll();
        if let Some(dimensions) = ready {
            self.viewport.initialize(
                Extent::from_size(dimensions.width, dimensions.height),
                self.viewport_size,
            );
            self.redraw_requested = true;
        }
        ready
    }

    /// Applies a host command. Ignored until the media is ready.
    pub fn handle(&mut self, command: ViewerCommand, now: Instant) {
        if let ViewerCommand::Resize { width, height } = command {
            self.viewport_size = Size::new(width, height);
            self.viewport.set_viewport_size(self.viewport_size);
            self.redraw_requested = true;
            return;
        }
        if !self.media.is_ready() {
            tracing::debug!(?command, "command ignored: media not ready");
            return;
        }

        match command {
            ViewerCommand::TogglePlayback => self.toggle_playback(),
            ViewerCommand::ResetView => self.viewport.reset_view(),
            ViewerCommand::ZoomIn => self.viewport.zoom_in(now),
            ViewerCommand::ZoomOut => self.viewport.zoom_out(now),
            ViewerCommand::ZoomToFull => self.viewport.zoom_to_full(),
            ViewerCommand::Pan { dx, dy } => self.viewport.pan_by(dx, dy),
            ViewerCommand::Rotate { radians } => self.viewport.set_rotation(radians),
            ViewerCommand::Resize { .. } => {}
        }
        self.redraw_requested = true;
    }

    /// Plays when paused, pauses when playing.
    ///
    /// Pausing leaves the loop to notice on its next frame.
    pub fn toggle_playback(&mut self) {
        if !self.media.is_ready() {
            return;
        }
        if self.media.is_paused() {
            self.media.play();
            if self.playback.start(&self.media, &mut self.scheduler) == Iteration::Redraw {
                self.redraw_requested = true;
            }
        } else {
            self.media.pause();
        }
    }

    /// Handles a fired frame request from the scheduler.
    pub fn on_frame(&mut self, request: FrameRequest) {
        if self.playback.on_frame(request, &self.media, &mut self.scheduler) == Iteration::Redraw {
            self.redraw_requested = true;
        }
    }

    /// Advances the view animation. Returns whether it is still running.
    pub fn tick(&mut self, now: Instant) -> bool {
        let was_animating = self.viewport.is_animating();
        let animating = self.viewport.advance(now);
        if was_animating && (self.update_while_animating || !animating) {
            self.redraw_requested = true;
        }
        animating
    }

    /// Whether a redraw is pending, clearing the flag.
    pub fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.redraw_requested)
    }

    #[must_use]
    pub fn needs_redraw(&self) -> bool {
        self.redraw_requested
    }

    /// Redraws the compositor buffer for the current view.
    ///
    /// Returns `None` until the media is ready.
    pub fn render(&mut self) -> Result<Option<&Pixmap>> {
        if !self.media.is_ready() {
            return Ok(None);
        }
        let Some(transform) = self.viewport.frame_transform(self.pixel_ratio) else {
            return Ok(None);
        };
        self.redraw_requested = false;
        let buffer = self
            .compositor
            .compose(self.media.current_frame(), &transform)?;
        Ok(Some(buffer))
    }

    /// Stops the loop, the animation and the decoder.
    pub fn teardown(&mut self) {
        self.playback.stop(&mut self.scheduler);
        self.viewport.cancel_animation();
        self.media.pause();
        self.media.close();
        self.redraw_requested = false;
        tracing::debug!("viewer torn down");
    }

    /// Whether to keep redrawing while a zoom animation runs.
    pub fn set_update_while_animating(&mut self, enabled: bool) {
        self.update_while_animating = enabled;
    }

    #[must_use]
    pub fn media(&self) -> &MediaSource {
        &self.media
    }

    pub fn media_mut(&mut self) -> &mut MediaSource {
        &mut self.media
    }

    #[must_use]
    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    #[must_use]
    pub fn playback(&self) -> &PlaybackLoop {
        &self.playback
    }

    #[must_use]
    pub fn compositor(&self) -> &FrameCompositor {
        &self.compositor
    }

    #[must_use]
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }
}

impl<S: FrameScheduler> Drop for Viewer<S> {
    fn drop(&mut self) {
        self.playback.stop(&mut self.scheduler);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::tests::ScriptedBackend;
    use crate::media::MediaState;
    use crate::test_utils::assert_abs_diff_eq;
    use crate::video_player::{DecoderCommand, LoopState};
    use crate::viewport::Coordinate;
    use std::time::Duration;

    fn viewer(viewport: Size) -> (Viewer, ScriptedBackend) {
        let backend = ScriptedBackend::default();
        let mut media = MediaSource::new("scripted://clip");
        media.open_with(Box::new(backend.clone()));
        let viewer = Viewer::new(
            media,
            ViewOptions::default(),
            ManualScheduler::new(),
            viewport,
            1.0,
        )
        .expect("default options are valid");
        (viewer, backend)
    }

    fn ready_viewer() -> (Viewer, ScriptedBackend) {
        let (mut viewer, backend) = viewer(Size::new(320, 180));
        backend.push_loaded(640, 360);
        backend.push_frame(640, 360, 0.0);
        viewer.poll();
        (viewer, backend)
    }

    #[test]
    fn commands_before_ready_are_ignored() {
        let (mut viewer, backend) = viewer(Size::new(320, 180));
        let now = Instant::now();

        viewer.handle(ViewerCommand::TogglePlayback, now);
        viewer.handle(ViewerCommand::ZoomIn, now);

        assert!(backend.commands().is_empty());
        assert!(viewer.viewport().view_state().is_none());
        assert!(viewer.render().expect("render").is_none());
    }

    #[test]
    fn readiness_fits_the_view() {
        let (viewer, _backend) = ready_viewer();
        let state = viewer.viewport().view_state().expect("initialized");
        assert_abs_diff_eq!(state.resolution, 2.0);
        assert_eq!(state.center, Coordinate::new(320.0, 180.0));
        assert!(viewer.needs_redraw());
    }

    #[test]
    fn render_produces_viewport_sized_buffer() {
        let (mut viewer, _backend) = ready_viewer();
        let buffer = viewer.render().expect("render").expect("buffer");
        assert_eq!((buffer.width(), buffer.height()), (320, 180));
        assert!(!viewer.needs_redraw());
    }

    #[test]
    fn toggle_starts_and_stops_playback() {
        let (mut viewer, backend) = ready_viewer();
        viewer.take_redraw_request();

        viewer.handle(ViewerCommand::TogglePlayback, Instant::now());
        assert_eq!(viewer.media().state(), MediaState::Playing);
        assert!(viewer.playback().is_scheduled());
        assert_eq!(viewer.scheduler().pending_count(), 1);
        assert!(viewer.take_redraw_request());

        viewer.handle(ViewerCommand::TogglePlayback, Instant::now());
        assert_eq!(viewer.media().state(), MediaState::Paused);

        let pending = viewer.scheduler_mut().take_pending();
        for request in pending {
            viewer.on_frame(request);
        }
        assert_eq!(viewer.playback().state(), LoopState::Cancelled);
        assert_eq!(viewer.scheduler().pending_count(), 0);
        assert_eq!(
            backend.commands(),
            vec![DecoderCommand::Play, DecoderCommand::Pause]
        );
    }

    #[test]
    fn fast_double_toggle_keeps_a_single_loop() {
        let (mut viewer, _backend) = ready_viewer();
        let now = Instant::now();

        viewer.handle(ViewerCommand::TogglePlayback, now);
        viewer.handle(ViewerCommand::TogglePlayback, now);
        viewer.handle(ViewerCommand::TogglePlayback, now);

        assert!(viewer.media().is_playing());
        assert_eq!(viewer.scheduler().pending_count(), 1);
    }

    #[test]
    fn tick_requests_redraws_while_animating() {
        let (mut viewer, _backend) = ready_viewer();
        let start = Instant::now();
        viewer.handle(ViewerCommand::ZoomIn, start);
        viewer.take_redraw_request();

        assert!(viewer.tick(start + Duration::from_millis(100)));
        assert!(viewer.take_redraw_request());

        assert!(!viewer.tick(start + Duration::from_millis(300)));
        assert!(viewer.take_redraw_request());

        assert!(!viewer.tick(start + Duration::from_millis(400)));
        assert!(!viewer.take_redraw_request());
    }

    #[test]
    fn resize_applies_before_ready() {
        let (mut viewer, backend) = viewer(Size::new(10, 10));
        viewer.handle(
            ViewerCommand::Resize {
                width: 320,
                height: 180,
            },
            Instant::now(),
        );
        backend.push_loaded(640, 360);
        viewer.poll();

        let state = viewer.viewport().view_state().expect("initialized");
        assert_abs_diff_eq!(state.resolution, 2.0);
    }

    #[test]
    fn teardown_cancels_everything() {
        let (mut viewer, backend) = ready_viewer();
        let now = Instant::now();
        viewer.handle(ViewerCommand::TogglePlayback, now);
        viewer.handle(ViewerCommand::ZoomIn, now);

        viewer.teardown();

        assert_eq!(viewer.scheduler().pending_count(), 0);
        assert!(!viewer.viewport().is_animating());
        assert!(viewer.media().is_paused());
        assert_eq!(
            backend.commands(),
            vec![
                DecoderCommand::Play,
                DecoderCommand::Pause,
                DecoderCommand::Stop
            ]
        );
    }
}
