// SPDX-License-Identifier: MPL-2.0
//! Redraw loop driven by media playback.
//!
//! While the media plays, every display refresh requests one compositor
//! redraw and schedules the next refresh. The play/pause check happens on
//! every iteration, so pausing the media ends the loop at its next frame.
//!
//! Scheduling goes through a [`FrameScheduler`] supplied by the rendering
//! host. At most one frame request is outstanding per loop at any time, and
//! it is always cancelled on [`PlaybackLoop::stop`].

use crate::media::MediaSource;
use std::collections::VecDeque;

/// Token for one pending "call me at the next display refresh" request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest(u64);

impl FrameRequest {
    #[must_use]
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Display-refresh hook of the rendering host.
pub trait FrameScheduler {
    /// Requests a callback at the next refresh opportunity.
    fn request_frame(&mut self) -> FrameRequest;

    /// Cancels a pending request. Unknown or already fired requests are ignored.
    fn cancel_frame(&mut self, request: FrameRequest);
}

/// Scheduler whose requests fire when the host drains them.
///
/// Hosts with their own refresh timer call [`ManualScheduler::take_pending`]
/// once per refresh and hand every returned request back to the loop.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    pending: VecDeque<FrameRequest>,
}

impl ManualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns every request pending right now.
    pub fn take_pending(&mut self) -> Vec<FrameRequest> {
        self.pending.drain(..).collect()
    }

    /// Number of outstanding requests.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameRequest {
        self.next_id += 1;
        let request = FrameRequest(self.next_id);
        self.pending.push_back(request);
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        self.pending.retain(|pending| *pending != request);
    }
}

/// Loop lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Never started.
    Idle,
    /// Waiting for the given frame request to fire.
    Scheduled(FrameRequest),
    /// Stopped, either explicitly or because the media paused.
    Cancelled,
}

/// Outcome of driving the loop once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Iteration {
    /// The compositor must redraw.
    Redraw,
    /// Nothing to do.
    Skipped,
}

#[derive(Debug)]
pub struct PlaybackLoop {
    state: LoopState,
    iterations: u64,
}

impl Default for PlaybackLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackLoop {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: LoopState::Idle,
            iterations: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> LoopState {
        self.state
    }

    #[must_use]
    pub fn is_scheduled(&self) -> bool {
        matches!(self.state, LoopState::Scheduled(_))
    }

    /// Total redraws requested by this loop.
    #[must_use]
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Runs the first iteration if `media` is playing.
    ///
    /// No-op while a request is already scheduled, so two loops never overlap.
    pub fn start<S: FrameScheduler + ?Sized>(
        &mut self,
        media: &MediaSource,
        scheduler: &mut S,
    ) -> Iteration {
        if self.is_scheduled() || !media.is_playing() {
            return Iteration::Skipped;
        }
        tracing::debug!("playback loop started");
        self.iterate(media, scheduler)
    }

    /// Handles a fired frame request.
    ///
    /// Requests other than the pending one are stale and ignored.
    pub fn on_frame<S: FrameScheduler + ?Sized>(
        &mut self,
        request: FrameRequest,
        media: &MediaSource,
        scheduler: &mut S,
    ) -> Iteration {
        match self.state {
            LoopState::Scheduled(pending) if pending == request => self.iterate(media, scheduler),
            _ => {
                tracing::trace!(request = request.id(), "ignoring stale frame request");
                Iteration::Skipped
            }
        }
    }

    /// Cancels the pending request, if any.
    pub fn stop<S: FrameScheduler + ?Sized>(&mut self, scheduler: &mut S) {
        if let LoopState::Scheduled(request) = self.state {
            scheduler.cancel_frame(request);
            self.state = LoopState::Cancelled;
            tracing::debug!(iterations = self.iterations, "playback loop stopped");
        }
    }

    /// Requests a redraw, then schedules the next iteration while still playing.
    fn iterate<S: FrameScheduler + ?Sized>(
        &mut self,
        media: &MediaSource,
        scheduler: &mut S,
    ) -> Iteration {
        self.iterations += 1;
        if media.is_playing() {
            self.state = LoopState::Scheduled(scheduler.request_frame());
        } else {
            self.state = LoopState::Cancelled;
            tracing::debug!(iterations = self.iterations, "playback loop ended: media paused");
        }
        Iteration::Redraw
    }
}
