// SPDX-License-Identifier: MPL-2.0
//! FFmpeg-backed decoding against real files.
//!
//! Skipped when the sample files are not present.

use std::time::Duration;
use video_viewport::media::MediaSource;
use video_viewport::video_player::{AsyncDecoder, DecoderCommand, DecoderEvent};

const SAMPLES: [&str; 3] = [
    "tests/data/sample.mp4",
    "tests/data/sample.webm",
    "tests/data/sample.mkv",
];

fn available(path: &str) -> bool {
    std::path::Path::new(path).exists()
}

async fn next_event(decoder: &mut AsyncDecoder) -> Option<DecoderEvent> {
    tokio::time::timeout(Duration::from_secs(5), decoder.recv_event())
        .await
        .ok()
        .flatten()
}

#[tokio::test]
async fn decoder_reports_size_then_first_frame() {
    for path in SAMPLES.into_iter().filter(|p| available(p)) {
        let mut decoder = AsyncDecoder::new(path).expect("sample opens");

        let Some(DecoderEvent::Loaded { width, height, .. }) = next_event(&mut decoder).await
        else {
            panic!("{path}: first event should be Loaded");
        };
        assert!(width > 0 && height > 0, "{path}: empty size");

        match next_event(&mut decoder).await {
            Some(DecoderEvent::FrameReady(frame)) => {
                assert_eq!((frame.width, frame.height), (width, height));
                assert_eq!(frame.size_bytes(), (width * height * 4) as usize);
            }
            other => panic!("{path}: expected first frame, got {other:?}"),
        }

        decoder
            .send_command(DecoderCommand::Stop)
            .expect("decoder still running");
    }
}

#[tokio::test]
async fn decoder_produces_frames_while_playing() {
    let path = SAMPLES[0];
    if !available(path) {
        return;
    }
    let mut decoder = AsyncDecoder::new(path).expect("sample opens");
    decoder
        .send_command(DecoderCommand::Play)
        .expect("decoder running");

    let mut frames = 0;
    while frames < 5 {
        match next_event(&mut decoder).await {
            Some(DecoderEvent::FrameReady(_)) => frames += 1,
            Some(DecoderEvent::EndOfStream) | None => break,
            Some(DecoderEvent::Loaded { .. }) if frames == 0 => {}
            Some(other) => panic!("unexpected event while playing: {other:?}"),
        }
    }
    assert!(frames > 0);
    let _ = decoder.send_command(DecoderCommand::Stop);
}

#[test]
fn missing_file_is_rejected() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime");
    let _guard = runtime.enter();

    assert!(AsyncDecoder::new("tests/data/does_not_exist.mp4").is_err());
}

#[tokio::test]
async fn media_source_becomes_ready_from_a_real_file() {
    let path = SAMPLES[0];
    if !available(path) {
        return;
    }
    let mut media = MediaSource::new(path);
    media.open();

    let mut ready = None;
    for _ in 0..200 {
        ready = media.poll();
        if ready.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }

    let dimensions = ready.expect("media became ready");
    assert!(!dimensions.is_empty());
    assert!(media.is_paused());
}

async fn collect_frames(decoder: &mut AsyncDecoder, count: usize, last_pts: &mut f64) {
    let mut seen = 0;
    while seen < count {
        match next_event(decoder).await {
            Some(DecoderEvent::FrameReady(frame)) => {
                *last_pts = last_pts.max(frame.pts_secs);
                seen += 1;
            }
            Some(DecoderEvent::EndOfStream) | None => break,
            Some(_) => {}
        }
    }
}

#[tokio::test]
async fn resuming_continues_where_playback_paused() {
    let path = SAMPLES[0];
    if !available(path) {
        return;
    }
    let mut decoder = AsyncDecoder::new(path).expect("sample opens");
    let mut last_pts = 0.0;
    decoder
        .send_command(DecoderCommand::Play)
        .expect("decoder running");
    collect_frames(&mut decoder, 10, &mut last_pts).await;

    decoder
        .send_command(DecoderCommand::Pause)
        .expect("decoder running");
    tokio::time::sleep(Duration::from_millis(100)).await;
    while let Some(event) = decoder.try_recv_event() {
        if let DecoderEvent::FrameReady(frame) = event {
            last_pts = last_pts.max(frame.pts_secs);
        }
    }

    decoder
        .send_command(DecoderCommand::Play)
        .expect("decoder running");
    loop {
        match next_event(&mut decoder).await {
            Some(DecoderEvent::FrameReady(frame)) => {
                assert!(
                    frame.pts_secs >= last_pts,
                    "resumed at {} after pausing at {last_pts}",
                    frame.pts_secs
                );
                break;
            }
            Some(DecoderEvent::EndOfStream) | None => break,
            Some(_) => {}
        }
    }
    let _ = decoder.send_command(DecoderCommand::Stop);
}

#[tokio::test]
async fn playing_to_the_end_delivers_every_frame() {
    let path = SAMPLES[0];
    if !available(path) {
        return;
    }
    ffmpeg_next::init().expect("ffmpeg init");
    let expected = ffmpeg_next::format::input(&path)
        .expect("sample opens")
        .streams()
        .best(ffmpeg_next::media::Type::Video)
        .map_or(0, |stream| stream.frames());

    let mut decoder = AsyncDecoder::new(path).expect("sample opens");
    decoder
        .send_command(DecoderCommand::Play)
        .expect("decoder running");

    let mut frames = 0i64;
    let mut reached_end = false;
    while let Ok(Some(event)) =
        tokio::time::timeout(Duration::from_secs(60), decoder.recv_event()).await
    {
        match event {
            DecoderEvent::FrameReady(_) => frames += 1,
            DecoderEvent::EndOfStream => {
                reached_end = true;
                break;
            }
            _ => {}
        }
    }

    assert!(reached_end);
    if expected > 0 {
        assert_eq!(frames, expected);
    }
    let _ = decoder.send_command(DecoderCommand::Stop);
}
