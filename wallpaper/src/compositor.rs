//! CPU compositing of frames onto the host canvas.
//!
//! Frames are scaled to their target bounds once, up front, with
//! [`scale_frame`]. Drawing is then a clipped 1:1 blend.

use anyhow::{Context, Result};
use common::Rect;
use image::{Rgba, RgbaImage};
use std::path::Path;

use crate::frame_store::Frame;

/// RGBA8 surface the host draws its modules into
pub struct Canvas {
    pixels: RgbaImage,
}

impl Canvas {
    /// New opaque black canvas
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn clear(&mut self, color: [u8; 4]) {
        for pixel in self.pixels.pixels_mut() {
            pixel.0 = color;
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels.get_pixel(x, y).0
    }

    /// Write the canvas to an image file, format chosen by extension
    pub fn save(&self, path: &Path) -> Result<()> {
        self.pixels
            .save(path)
            .with_context(|| format!("Failed to save canvas to {}", path.display()))
    }
}

/// Stretch `frame` to `width`x`height` with nearest-neighbour sampling
pub fn scale_frame(frame: &Frame, width: u32, height: u32) -> Result<Frame> {
    use fast_image_resize as fr;

    if (frame.width(), frame.height()) == (width, height) {
        return Ok(frame.clone());
    }
    if width == 0 || height == 0 || frame.width() == 0 || frame.height() == 0 {
        anyhow::bail!(
            "Cannot scale {} ({}x{}) to {}x{}",
            frame.name(),
            frame.width(),
            frame.height(),
            width,
            height
        );
    }

    let src = fr::images::Image::from_vec_u8(
        frame.width(),
        frame.height(),
        frame.pixels().as_raw().clone(),
        fr::PixelType::U8x4,
    )
    .context("Failed to create source image")?;

    let mut dst = fr::images::Image::new(width, height, fr::PixelType::U8x4);

    let mut resizer = fr::Resizer::new();
    resizer
        .resize(
            &src,
            &mut dst,
            &fr::ResizeOptions::new().resize_alg(fr::ResizeAlg::Nearest),
        )
        .with_context(|| format!("Failed to resize {}", frame.name()))?;

    let pixels = RgbaImage::from_raw(width, height, dst.into_vec())
        .context("Failed to create output image buffer")?;

    Ok(Frame::new(frame.name(), pixels))
}

/// Blend `frame` onto the canvas with its top-left corner at the origin of
/// `bounds`.
///
/// The frame is drawn at its own size, limited to `bounds`; scale it with
/// [`scale_frame`] beforehand to fill them. Anything outside the canvas is
/// clipped. Returns the number of canvas pixels touched.
pub fn composite(canvas: &mut Canvas, frame: &Frame, bounds: Rect, alpha: f32) -> usize {
    let alpha = alpha.clamp(0.0, 1.0);
    if alpha.is_nan() || alpha <= 0.0 || bounds.is_empty() {
        return 0;
    }

    let (left, top) = (i64::from(bounds.x), i64::from(bounds.y));
    let width = i64::from(bounds.width.min(frame.width()));
    let height = i64::from(bounds.height.min(frame.height()));

    let x0 = left.max(0);
    let y0 = top.max(0);
    let x1 = (left + width).min(i64::from(canvas.width()));
    let y1 = (top + height).min(i64::from(canvas.height()));
    if x0 >= x1 || y0 >= y1 {
        return 0;
    }

    let source = frame.pixels();
    for y in y0..y1 {
        let sy = (y - top) as u32;
        for x in x0..x1 {
            let src = source.get_pixel((x - left) as u32, sy).0;
            let dst = canvas.pixels.get_pixel_mut(x as u32, y as u32);
            dst.0 = blend(src, dst.0, alpha);
        }
    }

    ((x1 - x0) * (y1 - y0)) as usize
}

/// Source-over blend with the source alpha scaled by `alpha`
fn blend(src: [u8; 4], dst: [u8; 4], alpha: f32) -> [u8; 4] {
    let a = f32::from(src[3]) / 255.0 * alpha;
    let inv = 1.0 - a;
    let mix = |s: u8, d: u8| (f32::from(s) * a + f32::from(d) * inv).round() as u8;

    [
        mix(src[0], dst[0]),
        mix(src[1], dst[1]),
        mix(src[2], dst[2]),
        (255.0 * a + f32::from(dst[3]) * inv).round() as u8,
    ]
}
