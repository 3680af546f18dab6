use crate::imaging::is_lit;
use image::GrayImage;
use tracing::{debug, trace};

/// Pixel count of the 1280x720 frame the movement base is calibrated against
pub const REFERENCE_FRAME_AREA: f64 = 921_600.0;

/// Decides whether a frame-difference mask shows enough change to analyze
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionGate {
    required_lit_pixels: f64,
}

impl MotionGate {
    /// Scale the calibrated movement base to a `width` x `height` frame
    pub fn new(sum_required_for_movement_base: f32, width: u32, height: u32) -> Self {
        let area = width as f64 * height as f64;
        let required_lit_pixels = sum_required_for_movement_base as f64 * area / REFERENCE_FRAME_AREA;

        debug!(
            "Motion gate for {}x{} requires more than {:.1} lit pixels",
            width, height, required_lit_pixels
        );

        Self {
            required_lit_pixels,
        }
    }

    pub fn required_lit_pixels(&self) -> f64 {
        self.required_lit_pixels
    }

    /// True once the lit-pixel count exceeds the threshold. Stops scanning at that point.
    pub fn is_moving(&self, mask: &GrayImage) -> bool {
        let mut lit = 0u64;
        for pixel in mask.pixels() {
            if is_lit(pixel[0]) {
                lit += 1;
                if lit as f64 > self.required_lit_pixels {
                    trace!("Motion threshold crossed after {} lit pixels", lit);
                    return true;
                }
            }
        }
        false
    }
}
