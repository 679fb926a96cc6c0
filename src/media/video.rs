// SPDX-License-Identifier: MPL-2.0
//! FFmpeg process-wide setup.

use crate::error::{Result, VideoError};
use std::sync::Once;

/// Static flag to ensure FFmpeg is initialized only once.
static FFMPEG_INIT: Once = Once::new();

/// Initialize FFmpeg with appropriate log level.
///
/// Safe to call multiple times; initialization happens once. The FFmpeg log
/// level is set to ERROR so container warnings do not flood stderr.
pub fn init_ffmpeg() -> Result<()> {
    let mut init_result: Result<()> = Ok(());

    FFMPEG_INIT.call_once(|| {
        if let Err(e) = ffmpeg_next::init() {
            init_result = Err(VideoError::Other(format!("FFmpeg initialization failed: {e}")).into());
            return;
        }

        // SAFETY: av_log_set_level is thread-safe and only affects logging
        unsafe {
            ffmpeg_next::ffi::av_log_set_level(ffmpeg_next::ffi::AV_LOG_ERROR);
        }
    });

    init_result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        assert!(init_ffmpeg().is_ok());
        assert!(init_ffmpeg().is_ok());
    }
}
