//! Mode-aware sheet canvas
//!
//! The canvas is allocated in the color of the first frame so the saved
//! sheet keeps the source's channel layout. Only the 8-bit layouts get a
//! native buffer; anything else (16-bit, float) falls back to RGBA so the
//! run degrades instead of aborting.

use image::imageops;
use image::{ColorType, DynamicImage, GrayAlphaImage, GrayImage, RgbImage, RgbaImage};

/// Pixel buffer for the sheet being assembled.
///
/// Cells not covered by a paste stay zeroed: transparent in alpha modes,
/// black otherwise.
pub enum SheetCanvas {
    L8(GrayImage),
    La8(GrayAlphaImage),
    Rgb8(RgbImage),
    Rgba8(RgbaImage),
}

impl SheetCanvas {
    /// Allocate a canvas in `color`, or in RGBA when that color has no
    /// native buffer here. Returns the canvas and whether it fell back.
    pub fn new(color: ColorType, width: u32, height: u32) -> (Self, bool) {
        match color {
            ColorType::L8 => (SheetCanvas::L8(GrayImage::new(width, height)), false),
            ColorType::La8 => (SheetCanvas::La8(GrayAlphaImage::new(width, height)), false),
            ColorType::Rgb8 => (SheetCanvas::Rgb8(RgbImage::new(width, height)), false),
            ColorType::Rgba8 => (SheetCanvas::Rgba8(RgbaImage::new(width, height)), false),
            _ => (SheetCanvas::Rgba8(RgbaImage::new(width, height)), true),
        }
    }

    /// Color the canvas is held in.
    pub fn color(&self) -> ColorType {
        match self {
            SheetCanvas::L8(_) => ColorType::L8,
            SheetCanvas::La8(_) => ColorType::La8,
            SheetCanvas::Rgb8(_) => ColorType::Rgb8,
            SheetCanvas::Rgba8(_) => ColorType::Rgba8,
        }
    }

    /// Paste `frame` with its top-left corner at (x, y), converting it to
    /// the canvas color first. Conversion in the `image` crate is
    /// infallible, so this is always best-effort-complete.
    pub fn paste(&mut self, frame: &DynamicImage, x: u32, y: u32) {
        match self {
            SheetCanvas::L8(buf) => imageops::replace(buf, &frame.to_luma8(), x as i64, y as i64),
            SheetCanvas::La8(buf) => {
                imageops::replace(buf, &frame.to_luma_alpha8(), x as i64, y as i64)
            }
            SheetCanvas::Rgb8(buf) => imageops::replace(buf, &frame.to_rgb8(), x as i64, y as i64),
            SheetCanvas::Rgba8(buf) => {
                imageops::replace(buf, &frame.to_rgba8(), x as i64, y as i64)
            }
        }
    }

    /// Hand the buffer over for downscaling/saving.
    pub fn into_dynamic(self) -> DynamicImage {
        match self {
            SheetCanvas::L8(buf) => DynamicImage::ImageLuma8(buf),
            SheetCanvas::La8(buf) => DynamicImage::ImageLumaA8(buf),
            SheetCanvas::Rgb8(buf) => DynamicImage::ImageRgb8(buf),
            SheetCanvas::Rgba8(buf) => DynamicImage::ImageRgba8(buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_native_modes_no_fallback() {
        for color in [ColorType::L8, ColorType::La8, ColorType::Rgb8, ColorType::Rgba8] {
            let (canvas, fell_back) = SheetCanvas::new(color, 8, 8);
            assert!(!fell_back);
            assert_eq!(canvas.color(), color);
        }
    }

    #[test]
    fn test_exotic_mode_falls_back_to_rgba() {
        let (canvas, fell_back) = SheetCanvas::new(ColorType::Rgb32F, 8, 8);
        assert!(fell_back);
        assert_eq!(canvas.color(), ColorType::Rgba8);

        let (canvas, fell_back) = SheetCanvas::new(ColorType::L16, 8, 8);
        assert!(fell_back);
        assert_eq!(canvas.color(), ColorType::Rgba8);
    }

    #[test]
    fn test_paste_places_and_converts() {
        let (mut canvas, _) = SheetCanvas::new(ColorType::Rgba8, 4, 2);
        let frame = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, image::Rgb([255, 0, 0])));
        canvas.paste(&frame, 2, 0);

        let out = canvas.into_dynamic().to_rgba8();
        // Left half untouched (transparent), right half opaque red
        assert_eq!(out.get_pixel(0, 0), &Rgba([0, 0, 0, 0]));
        assert_eq!(out.get_pixel(2, 0), &Rgba([255, 0, 0, 255]));
        assert_eq!(out.get_pixel(3, 1), &Rgba([255, 0, 0, 255]));
    }
}
