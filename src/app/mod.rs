// SPDX-License-Identifier: MPL-2.0
//! Headless rendering host.
//!
//! Plays a media locator through a [`Viewer`] on a 60 Hz ticker and writes
//! composited snapshots to PNG files. This is the same contract a windowed
//! host follows, minus the window: poll media, forward commands, fire frame
//! requests, render on demand.

use crate::config::{
    self, Config, DEFAULT_HOST_FRAMES, DEFAULT_READY_TIMEOUT_SECS, DEFAULT_SNAPSHOT_INTERVAL,
    FRAME_INTERVAL,
};
use crate::error::{Error, Result};
use crate::media::MediaSource;
use crate::video_player::ManualScheduler;
use crate::viewer::{Viewer, ViewerCommand};
use crate::viewport::Size;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;

/// Command-line flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Flags {
    pub locator: String,
    pub config_path: Option<PathBuf>,
    pub size: Option<Size>,
    pub pixel_ratio: Option<f64>,
    pub frames: u32,
    pub snapshot_interval: u32,
    pub output_dir: PathBuf,
    pub zoom_steps: i32,
    pub no_loop: bool,
    pub ready_timeout: Duration,
}

pub const USAGE: &str = "\
Usage: video_viewport [OPTIONS] <LOCATOR>

Options:
  --config <PATH>       Settings file (default: user config dir)
  --size <WxH>          Viewport size in pixels
  --pixel-ratio <F>     Device pixel ratio
  --frames <N>          Frames to render before stopping
  --every <N>           Write a snapshot every N rendered frames
  --out <DIR>           Snapshot directory (default: current dir)
  --zoom <N>            Zoom steps after fitting (negative zooms out)
  --no-loop             Stop at the end of the media
  --timeout <SECS>      Seconds to wait for the media to become ready
  -h, --help            Print this help";

impl Flags {
    /// Parses flags from the process arguments.
    pub fn from_env() -> Result<Option<Self>> {
        Self::from_args(pico_args::Arguments::from_env())
    }

    /// Parses flags; `Ok(None)` means help was requested.
    pub fn from_args(mut args: pico_args::Arguments) -> Result<Option<Self>> {
        if args.contains(["-h", "--help"]) {
            return Ok(None);
        }
        let flag_error = |e: pico_args::Error| Error::Config(e.to_string());

        let config_path = args
            .opt_value_from_os_str("--config", |s| Ok::<_, String>(PathBuf::from(s)))
            .map_err(flag_error)?;
        let size = args
            .opt_value_from_fn("--size", parse_size)
            .map_err(flag_error)?;
        let pixel_ratio = args
            .opt_value_from_str("--pixel-ratio")
            .map_err(flag_error)?;
        let frames = args
            .opt_value_from_str("--frames")
            .map_err(flag_error)?
            .unwrap_or(DEFAULT_HOST_FRAMES);
        let snapshot_interval: u32 = args
            .opt_value_from_str("--every")
            .map_err(flag_error)?
            .unwrap_or(DEFAULT_SNAPSHOT_INTERVAL);
        let output_dir = args
            .opt_value_from_os_str("--out", |s| Ok::<_, String>(PathBuf::from(s)))
            .map_err(flag_error)?
            .unwrap_or_else(|| PathBuf::from("."));
        let zoom_steps = args
            .opt_value_from_str("--zoom")
            .map_err(flag_error)?
            .unwrap_or(0);
        let no_loop = args.contains("--no-loop");
        let ready_timeout = Duration::from_secs(
            args.opt_value_from_str("--timeout")
                .map_err(flag_error)?
                .unwrap_or(DEFAULT_READY_TIMEOUT_SECS),
        );

        let locator = args
            .finish()
            .into_iter()
            .next()
            .and_then(|s| s.into_string().ok())
            .ok_or_else(|| Error::Config("missing media locator".into()))?;

        if snapshot_interval == 0 {
            return Err(Error::Config("--every must be at least 1".into()));
        }

        Ok(Some(Self {
            locator,
            config_path,
            size,
            pixel_ratio,
            frames,
            snapshot_interval,
            output_dir,
            zoom_steps,
            no_loop,
            ready_timeout,
        }))
    }
}

fn parse_size(value: &str) -> std::result::Result<Size, String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got '{value}'"))?;
    let width: u32 = width.trim().parse().map_err(|e| format!("width: {e}"))?;
    let height: u32 = height.trim().parse().map_err(|e| format!("height: {e}"))?;
    if width == 0 || height == 0 {
        return Err(format!("size must be non-zero, got '{value}'"));
    }
    Ok(Size::new(width, height))
}

fn load_config(flags: &Flags) -> Result<Config> {
    match &flags.config_path {
        Some(path) => config::load_from_path(path),
        None => config::load(),
    }
}

/// Runs the headless host until `flags.frames` frames are rendered.
pub fn run(flags: Flags) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    runtime.block_on(run_host(flags))
}

async fn run_host(flags: Flags) -> Result<()> {
    let config = load_config(&flags)?;
    let options = config.view_options()?;
    let (width, height) = config.viewport_size();
    let viewport = flags.size.unwrap_or(Size::new(width, height));
    let pixel_ratio = flags.pixel_ratio.unwrap_or_else(|| config.pixel_ratio());

    let mut media = MediaSource::new(flags.locator.clone());
    media.set_loop(config.loop_enabled() && !flags.no_loop);
    let mut viewer = Viewer::new(media, options, ManualScheduler::new(), viewport, pixel_ratio)?;
    viewer.media_mut().open();

    let mut ticker = tokio::time::interval(FRAME_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let deadline = Instant::now() + flags.ready_timeout;
    loop {
        ticker.tick().await;
        if viewer.poll().is_some() {
            break;
        }
        if Instant::now() >= deadline {
            viewer.teardown();
            return Err(Error::Io(format!(
                "{} did not become ready within {:?}",
                flags.locator, flags.ready_timeout
            )));
        }
    }

    let now = Instant::now();
    let zoom = if flags.zoom_steps < 0 {
        ViewerCommand::ZoomOut
    } else {
        ViewerCommand::ZoomIn
    };
    for _ in 0..flags.zoom_steps.unsigned_abs() {
        viewer.handle(zoom, now);
        // Let each step land so the next one starts from its target
        viewer.tick(now + options.zoom_duration);
    }
    viewer.handle(ViewerCommand::TogglePlayback, now);

    std::fs::create_dir_all(&flags.output_dir)?;
    let mut rendered = 0u32;
    while rendered < flags.frames {
        ticker.tick().await;
        viewer.poll();
        viewer.tick(Instant::now());
        for request in viewer.scheduler_mut().take_pending() {
            viewer.on_frame(request);
        }
        if !viewer.take_redraw_request() {
            if !viewer.playback().is_scheduled() && !viewer.viewport().is_animating() {
                tracing::info!("playback ended");
                break;
            }
            continue;
        }
        if viewer.render()?.is_none() {
            continue;
        }
        rendered += 1;
        if rendered % flags.snapshot_interval == 0 {
            write_snapshot(&viewer, &flags.output_dir, rendered)?;
        }
    }

    viewer.handle(ViewerCommand::TogglePlayback, Instant::now());
    viewer.teardown();
    tracing::info!(frames = rendered, "done");
    Ok(())
}

fn write_snapshot(viewer: &Viewer, dir: &Path, index: u32) -> Result<()> {
    let image = viewer
        .compositor()
        .snapshot()
        .ok_or_else(|| Error::Render("nothing rendered yet".into()))?;
    let path = dir.join(format!("frame_{index:05}.png"));
    image.save(&path)?;
    tracing::debug!(path = %path.display(), "snapshot written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    fn args(values: &[&str]) -> pico_args::Arguments {
        pico_args::Arguments::from_vec(values.iter().map(OsString::from).collect())
    }

    #[test]
    fn parses_locator_and_defaults() {
        let flags = Flags::from_args(args(&["clip.mp4"]))
            .expect("valid flags")
            .expect("not help");
        assert_eq!(flags.locator, "clip.mp4");
        assert_eq!(flags.frames, DEFAULT_HOST_FRAMES);
        assert_eq!(flags.snapshot_interval, DEFAULT_SNAPSHOT_INTERVAL);
        assert_eq!(flags.zoom_steps, 0);
        assert!(flags.size.is_none());
        assert!(!flags.no_loop);
    }

    #[test]
    fn parses_all_options() {
        let flags = Flags::from_args(args(&[
            "--size",
            "320x180",
            "--pixel-ratio",
            "2",
            "--frames",
            "10",
            "--every",
            "5",
            "--out",
            "snaps",
            "--zoom",
            "-2",
            "--no-loop",
            "https://example.com/clip.mp4",
        ]))
        .expect("valid flags")
        .expect("not help");

        assert_eq!(flags.size, Some(Size::new(320, 180)));
        assert_eq!(flags.pixel_ratio, Some(2.0));
        assert_eq!(flags.frames, 10);
        assert_eq!(flags.snapshot_interval, 5);
        assert_eq!(flags.output_dir, PathBuf::from("snaps"));
        assert_eq!(flags.zoom_steps, -2);
        assert!(flags.no_loop);
        assert_eq!(flags.locator, "https://example.com/clip.mp4");
    }

    #[test]
    fn help_returns_none() {
        assert!(Flags::from_args(args(&["--help"]))
            .expect("help is not an error")
            .is_none());
    }

    #[test]
    fn missing_locator_is_an_error() {
        assert!(matches!(
            Flags::from_args(args(&["--frames", "3"])),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn parse_size_rejects_bad_input() {
        assert_eq!(parse_size("640X360"), Ok(Size::new(640, 360)));
        assert!(parse_size("640").is_err());
        assert!(parse_size("0x10").is_err());
        assert!(parse_size("ax10").is_err());
    }

    #[test]
    fn run_times_out_when_media_never_becomes_ready() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let config_path = temp_dir.path().join("settings.toml");
        std::fs::write(&config_path, "").expect("write settings");
        let flags = Flags {
            ready_timeout: Duration::from_millis(50),
            config_path: Some(config_path),
            output_dir: temp_dir.path().to_path_buf(),
            ..Flags::from_args(args(&["/nonexistent/clip.mp4"]))
                .expect("valid flags")
                .expect("not help")
        };

        let result = run(flags);

        assert!(matches!(result, Err(Error::Io(message)) if message.contains("did not become ready")));
    }
}
