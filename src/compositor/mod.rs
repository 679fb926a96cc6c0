// SPDX-License-Identifier: MPL-2.0
//! Frame compositor.
//!
//! Produces the raster handed to the rendering host on every redraw: the
//! current video frame drawn into a viewport-sized buffer under the active
//! view transform. Each call recomputes the whole buffer from its inputs,
//! nothing is carried over from the previous frame.
//!
//! Content space has its origin at the bottom-left with Y up, raster space
//! has its origin at the top-left with Y down. The transform therefore
//! scales by `pixel_ratio / resolution` and translates by
//! `(-extent.min_x, extent.max_y - content_height)`.

use crate::error::{Error, Result};
use crate::video_player::DecodedFrame;
use crate::viewport::{Extent, Size};
use image_rs::RgbaImage;
use tiny_skia::{Color, FilterQuality, Pixmap, PixmapPaint, PixmapRef, Transform};

/// Coordinate transform for one redraw request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTransform {
    /// Visible content extent.
    pub extent: Extent,

    /// Content pixels per viewport pixel.
    pub resolution: f64,

    /// Device pixels per viewport pixel.
    pub pixel_ratio: f64,

    /// Buffer size in device pixels.
    pub size: Size,
}

impl FrameTransform {
    #[must_use]
    pub fn scale_factor(&self) -> f64 {
        self.pixel_ratio / self.resolution
    }

    /// Raster transform placing content `(0, 0)` of a `content_height` tall frame.
    #[must_use]
    pub fn to_raster(&self, content_height: u32) -> Transform {
        let scale = self.scale_factor() as f32;
        let translate_x = -self.extent.min_x;
        let translate_y = self.extent.max_y - f64::from(content_height);
        Transform::from_scale(scale, scale).pre_translate(translate_x as f32, translate_y as f32)
    }
}

/// Owns the compositor buffer and redraws it on request.
#[derive(Debug, Default)]
pub struct FrameCompositor {
    buffer: Option<Pixmap>,
}

impl FrameCompositor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Redraws the buffer for `transform` and returns it.
    ///
    /// `frame` is `None` until the media source is ready; the buffer is then
    /// returned cleared. Frame pixels must be RGBA with straight alpha equal
    /// to 255 (decoded video is opaque), which is also valid premultiplied data.
    pub fn compose(
        &mut self,
        frame: Option<&DecodedFrame>,
        transform: &FrameTransform,
    ) -> Result<&Pixmap> {
        let buffer = self.prepare_buffer(transform.size)?;
        buffer.fill(Color::TRANSPARENT);

        if let Some(frame) = frame {
            let source = PixmapRef::from_bytes(&frame.rgba_data, frame.width, frame.height)
                .ok_or_else(|| {
                    Error::Render(format!(
                        "frame data ({} bytes) does not match {}x{} RGBA",
                        frame.rgba_data.len(),
                        frame.width,
                        frame.height
                    ))
                })?;
            let paint = PixmapPaint {
                quality: FilterQuality::Bilinear,
                ..PixmapPaint::default()
            };
            buffer.draw_pixmap(0, 0, source, &paint, transform.to_raster(frame.height), None);
        }

        Ok(buffer)
    }

    /// Recreates the buffer when the requested size changed.
    fn prepare_buffer(&mut self, size: Size) -> Result<&mut Pixmap> {
        let reuse = self
            .buffer
            .as_ref()
            .is_some_and(|buffer| buffer.width() == size.width && buffer.height() == size.height);
        if !reuse {
            let pixmap = Pixmap::new(size.width, size.height).ok_or_else(|| {
                Error::Render(format!(
                    "cannot allocate a {}x{} buffer",
                    size.width, size.height
                ))
            })?;
            tracing::trace!(width = size.width, height = size.height, "compositor buffer resized");
            self.buffer = Some(pixmap);
        }
        self.buffer
            .as_mut()
            .ok_or_else(|| Error::Render("compositor buffer missing".into()))
    }

    /// Last composed buffer, if any.
    #[must_use]
    pub fn buffer(&self) -> Option<&Pixmap> {
        self.buffer.as_ref()
    }

    /// Size of the current buffer in device pixels.
    #[must_use]
    pub fn size(&self) -> Option<Size> {
        self.buffer
            .as_ref()
            .map(|buffer| Size::new(buffer.width(), buffer.height()))
    }

    /// Copies the current buffer into a straight-alpha RGBA image.
    #[must_use]
    pub fn snapshot(&self) -> Option<RgbaImage> {
        let buffer = self.buffer.as_ref()?;
        let data = buffer
            .pixels()
            .iter()
            .flat_map(|pixel| {
                let color = pixel.demultiply();
                [color.red(), color.green(), color.blue(), color.alpha()]
            })
            .collect();
        RgbaImage::from_raw(buffer.width(), buffer.height(), data)
    }
}
