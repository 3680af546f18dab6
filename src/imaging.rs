//! Single-channel image primitives the detector is built on.
//!
//! Everything here operates on whole frames and returns a new buffer; the
//! detector owns every intermediate image it produces.

use crate::error::{AnalyzerError, Result};
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbImage};
use imageproc::contrast::threshold;
use imageproc::map::{map_colors, map_colors2};

/// Value written into a mask for pixels that survive thresholding
pub const LIT: u8 = 255;

/// Mask pixels strictly above this value count as lit
pub const LIT_FLOOR: u8 = 1;

#[inline]
pub fn is_lit(value: u8) -> bool {
    value > LIT_FLOOR
}

/// Mirror an image around its vertical axis
pub fn flip_horizontal(image: &RgbImage) -> RgbImage {
    imageops::flip_horizontal(image)
}

/// Convert RGB to luma with the 0.299/0.587/0.114 weighting
pub fn to_grayscale(image: &RgbImage) -> GrayImage {
    map_colors(image, |rgb| {
        let gray = 0.299 * rgb[0] as f32 + 0.587 * rgb[1] as f32 + 0.114 * rgb[2] as f32;
        Luma([gray.round().min(255.0) as u8])
    })
}

/// Bilinear resize; a same-size request returns a copy
pub fn resize_linear(image: &GrayImage, width: u32, height: u32) -> GrayImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    imageops::resize(image, width, height, FilterType::Triangle)
}

/// Per-pixel |a - b| of two equally sized images
pub fn absolute_difference(a: &GrayImage, b: &GrayImage) -> Result<GrayImage> {
    if a.dimensions() != b.dimensions() {
        return Err(AnalyzerError::FrameShape {
            details: format!(
                "cannot difference {}x{} against {}x{}",
                a.width(),
                a.height(),
                b.width(),
                b.height()
            ),
        }
        .into());
    }

    Ok(map_colors2(a, b, |p, q| Luma([p[0].abs_diff(q[0])])))
}

/// Pixels above `cutoff` become [`LIT`], everything else 0
pub fn binary_threshold(image: &GrayImage, cutoff: u8) -> GrayImage {
    threshold(image, cutoff)
}

/// Processing size for a frame after applying `scale`
pub fn scaled_dimensions(width: u32, height: u32, scale: f32) -> (u32, u32) {
    (
        (width as f32 * scale) as u32,
        (height as f32 * scale) as u32,
    )
}
