// SPDX-License-Identifier: MPL-2.0
//! Async video frame decoder using FFmpeg.
//!
//! This module provides asynchronous video frame decoding via Tokio tasks,
//! delivering frames through channels so the single-threaded viewer never
//! blocks on decode.

use crate::config::DECODER_EVENT_CAPACITY;
use crate::error::{Error, Result, VideoError};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Represents a decoded video frame ready for display.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    /// RGBA pixel data (width × height × 4 bytes).
    pub rgba_data: Arc<Vec<u8>>,

    /// Frame width in pixels.
    pub width: u32,

    /// Frame height in pixels.
    pub height: u32,

    /// Presentation timestamp in seconds.
    pub pts_secs: f64,
}

impl DecodedFrame {
    /// Returns the total size in bytes.
    pub fn size_bytes(&self) -> usize {
        self.rgba_data.len()
    }
}

/// Commands sent to the decoder task.
#[derive(Debug, Clone, PartialEq)]
pub enum DecoderCommand {
    /// Start or resume decoding at playback pace.
    Play,

    /// Pause decoding (stop sending frames).
    Pause,

    /// Seek to a specific timestamp.
    Seek { target_secs: f64 },

    /// Stop decoding and release resources.
    Stop,
}

/// Events sent from the decoder to the media source.
#[derive(Debug, Clone)]
pub enum DecoderEvent {
    /// The stream was opened and its intrinsic size is known.
    Loaded {
        width: u32,
        height: u32,
        duration_secs: Option<f64>,
    },

    /// A new frame is ready for display.
    FrameReady(DecodedFrame),

    /// Playback reached the end of the stream.
    EndOfStream,

    /// An error occurred during decoding.
    Error(String),
}

/// Async video decoder that runs in a Tokio blocking task.
pub struct AsyncDecoder {
    /// Channel for sending commands to the decoder task.
    command_tx: mpsc::UnboundedSender<DecoderCommand>,

    /// Channel for receiving events from the decoder task.
    /// Bounded so a slow consumer applies backpressure instead of queueing frames.
    event_rx: mpsc::Receiver<DecoderEvent>,
}

/// Wall-clock pacing of frames by presentation timestamp.
#[derive(Debug, Default)]
struct FramePacer {
    started_at: Option<Instant>,
    first_pts: Option<f64>,
}

impl FramePacer {
    fn start(&mut self) {
        self.started_at = Some(Instant::now());
        self.first_pts = None;
    }

    fn reset(&mut self) {
        self.started_at = None;
        self.first_pts = None;
    }

    /// How long to wait before presenting a frame with `pts_secs`.
    fn delay_until(&mut self, pts_secs: f64, now: Instant) -> Duration {
        let Some(started_at) = self.started_at else {
            return Duration::ZERO;
        };
        let first = *self.first_pts.get_or_insert(pts_secs);
        let due = started_at + Duration::from_secs_f64((pts_secs - first).max(0.0));
        due.saturating_duration_since(now)
    }
}

/// Converts decoded frames to RGBA and hands them to the media source.
struct FrameOutput<'a> {
    scaler: &'a mut ffmpeg_next::software::scaling::Context,
    time_base: f64,
    width: u32,
    height: u32,
    event_tx: &'a mpsc::Sender<DecoderEvent>,
}

impl FrameOutput<'_> {
    /// Sends every frame the codec can produce right now.
    ///
    /// Returns the number of frames sent, or `None` once the receiver is gone.
    fn drain(
        &mut self,
        decoder: &mut ffmpeg_next::decoder::Video,
        mut pacer: Option<&mut FramePacer>,
    ) -> Option<usize> {
        let mut sent = 0;
        let mut decoded_frame = ffmpeg_next::frame::Video::empty();
        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            let mut rgb_frame = ffmpeg_next::frame::Video::empty();
            if let Err(e) = self.scaler.run(&decoded_frame, &mut rgb_frame) {
                let _ = self
                    .event_tx
                    .blocking_send(DecoderEvent::Error(format!("Scaling failed: {e}")));
                continue;
            }

            let pts_secs = decoded_frame
                .timestamp()
                .map_or(0.0, |pts| pts as f64 * self.time_base);
            if let Some(pacer) = pacer.as_deref_mut() {
                let delay = pacer.delay_until(pts_secs, Instant::now());
                if !delay.is_zero() {
                    std::thread::sleep(delay);
                }
            }

            let frame = DecodedFrame {
                rgba_data: Arc::new(AsyncDecoder::extract_rgba_data(&rgb_frame)),
                width: self.width,
                height: self.height,
                pts_secs,
            };
            self.event_tx
                .blocking_send(DecoderEvent::FrameReady(frame))
                .ok()?;
            sent += 1;
        }
        Some(sent)
    }
}

impl AsyncDecoder {
    /// Opens `locator` (a file path or any URL FFmpeg understands).
    ///
    /// Must be called from within a Tokio runtime. Decoding happens on a
    /// blocking thread; the first events are `Loaded` followed by the
    /// first frame.
    pub fn new(locator: &str) -> Result<Self> {
        let is_url = locator.contains("://");
        if !is_url && !Path::new(locator).exists() {
            return Err(VideoError::IoError(format!("Video file not found: {locator}")).into());
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| VideoError::Other(format!("No async runtime for decoder: {e}")))?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(DECODER_EVENT_CAPACITY);

        let locator = locator.to_string();
        // FFmpeg contexts are not Send, so everything lives on the blocking thread
        runtime.spawn_blocking(move || {
            if let Err(e) = Self::decoder_loop_blocking(&locator, command_rx, &event_tx) {
                tracing::warn!(%locator, "decoder task failed: {e}");
                let _ = event_tx.blocking_send(DecoderEvent::Error(e.to_string()));
            }
        });

        Ok(Self {
            command_tx,
            event_rx,
        })
    }

    /// Sends a command to the decoder task.
    pub fn send_command(&self, command: DecoderCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|_| Error::Video(VideoError::DecoderStopped))
    }

    /// Receives the next event from the decoder (non-blocking).
    ///
    /// Returns `None` if no events are available.
    pub fn try_recv_event(&mut self) -> Option<DecoderEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Receives the next event from the decoder.
    ///
    /// Returns `None` if the decoder task has terminated.
    pub async fn recv_event(&mut self) -> Option<DecoderEvent> {
        self.event_rx.recv().await
    }

    /// Main decoder loop running in a blocking thread.
    fn decoder_loop_blocking(
        locator: &str,
        mut command_rx: mpsc::UnboundedReceiver<DecoderCommand>,
        event_tx: &mpsc::Sender<DecoderEvent>,
    ) -> Result<()> {
        crate::media::video::init_ffmpeg()?;

        let mut ictx = ffmpeg_next::format::input(&locator)
            .map_err(|e| VideoError::from_message(&format!("Failed to open video: {e}")))?;

        let input = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or(VideoError::NoVideoStream)?;
        let video_stream_index = input.index();

        let context_decoder =
            ffmpeg_next::codec::context::Context::from_parameters(input.parameters())
                .map_err(|e| VideoError::from_message(&format!("codec context: {e}")))?;
        let mut decoder = context_decoder
            .decoder()
            .video()
            .map_err(|e| VideoError::from_message(&format!("video decoder: {e}")))?;

        let width = decoder.width();
        let height = decoder.height();
        if width == 0 || height == 0 {
            return Err(VideoError::CorruptedFile.into());
        }

        let mut scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGBA,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .map_err(|e| VideoError::DecodingFailed(format!("scaler: {e}")))?;

        let time_base = input.time_base();
        let time_base_f64 = f64::from(time_base.numerator()) / f64::from(time_base.denominator());

        let duration_secs = (ictx.duration() > 0)
            .then(|| ictx.duration() as f64 / f64::from(ffmpeg_next::ffi::AV_TIME_BASE));
        if event_tx
            .blocking_send(DecoderEvent::Loaded {
                width,
                height,
                duration_secs,
            })
            .is_err()
        {
            return Ok(());
        }
        tracing::debug!(%locator, width, height, ?duration_secs, "video stream opened");

        let mut output = FrameOutput {
            scaler: &mut scaler,
            time_base: time_base_f64,
            width,
            height,
            event_tx,
        };
        let mut pacer = FramePacer::default();
        let mut is_playing = false;
        // Decode the first frame right away so the view has something to show while paused
        let mut decode_single_frame = true;

        loop {
            match command_rx.try_recv() {
                Ok(DecoderCommand::Play) => {
                    // Pausing only stops reading packets, so resuming continues in place
                    is_playing = true;
                    pacer.start();
                }
                Ok(DecoderCommand::Pause) => {
                    is_playing = false;
                    pacer.reset();
                }
                Ok(DecoderCommand::Seek { target_secs }) => {
                    // AV_TIME_BASE is microseconds
                    let timestamp = (target_secs * 1_000_000.0) as i64;
                    if let Err(e) = ictx.seek(timestamp, ..timestamp) {
                        let _ = event_tx.blocking_send(DecoderEvent::Error(format!("Seek failed: {e}")));
                    } else {
                        decoder.flush();
                        if is_playing {
                            pacer.start();
                        } else {
                            decode_single_frame = true;
                        }
                    }
                }
                Ok(DecoderCommand::Stop) | Err(mpsc::error::TryRecvError::Disconnected) => break,
                Err(mpsc::error::TryRecvError::Empty) => {}
            }

            if !is_playing && !decode_single_frame {
                std::thread::sleep(Duration::from_millis(10));
                continue;
            }

            let mut frames_sent = 0usize;
            for (stream, packet) in ictx.packets() {
                if stream.index() != video_stream_index {
                    continue;
                }

                if let Err(e) = decoder.send_packet(&packet) {
                    let _ = event_tx.blocking_send(DecoderEvent::Error(format!("Packet send failed: {e}")));
                    continue;
                }

                match output.drain(&mut decoder, is_playing.then_some(&mut pacer)) {
                    Some(sent) => frames_sent += sent,
                    None => return Ok(()),
                }
                if frames_sent > 0 {
                    break;
                }
            }

            if frames_sent == 0 {
                // Out of packets: flush the frames the codec still holds for reordering
                if decoder.send_eof().is_ok()
                    && output
                        .drain(&mut decoder, is_playing.then_some(&mut pacer))
                        .is_none()
                {
                    return Ok(());
                }
                let _ = event_tx.blocking_send(DecoderEvent::EndOfStream);
                is_playing = false;
                pacer.reset();
            }
            decode_single_frame = false;
        }

        tracing::debug!(%locator, "decoder stopped");
        Ok(())
    }

    /// Extracts RGBA data from a decoded frame, handling stride correctly.
    fn extract_rgba_data(frame: &ffmpeg_next::frame::Video) -> Vec<u8> {
        let width = frame.width() as usize;
        let height = frame.height() as usize;
        let data = frame.data(0);
        let stride = frame.stride(0);

        let mut rgba_bytes = Vec::with_capacity(width * height * 4);
        for y in 0..height {
            let row_start = y * stride;
            rgba_bytes.extend_from_slice(&data[row_start..row_start + width * 4]);
        }
        rgba_bytes
    }
}
