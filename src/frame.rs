use crate::error::{AnalyzerError, Result};
use image::RgbImage;
use std::sync::Arc;
use std::time::SystemTime;

const BYTES_PER_PIXEL: usize = 3;

/// Raw RGB24 frame as delivered by a frame source
#[derive(Debug, Clone)]
pub struct FrameData {
    /// Unique frame identifier
    pub id: u64,
    /// Timestamp when frame was captured
    pub timestamp: SystemTime,
    /// Raw pixel rows (shared ownership so sources can hand out cheap clones)
    pub data: Arc<Vec<u8>>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Bytes between the starts of two consecutive rows
    pub stride: usize,
}

impl FrameData {
    /// Create a tightly packed frame (stride = width * 3)
    pub fn new(id: u64, timestamp: SystemTime, data: Vec<u8>, width: u32, height: u32) -> Self {
        Self::with_stride(
            id,
            timestamp,
            data,
            width,
            height,
            width as usize * BYTES_PER_PIXEL,
        )
    }

    /// Create a frame whose rows may carry trailing padding
    pub fn with_stride(
        id: u64,
        timestamp: SystemTime,
        data: Vec<u8>,
        width: u32,
        height: u32,
        stride: usize,
    ) -> Self {
        Self {
            id,
            timestamp,
            data: Arc::new(data),
            width,
            height,
            stride,
        }
    }

    /// Wrap a decoded RGB image
    pub fn from_rgb_image(id: u64, timestamp: SystemTime, image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self::new(id, timestamp, image.into_raw(), width, height)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Check that the buffer can hold `height` rows of `width` pixels
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(AnalyzerError::FrameShape {
                details: format!("frame {} has zero size {}x{}", self.id, self.width, self.height),
            }
            .into());
        }

        let row_bytes = self.width as usize * BYTES_PER_PIXEL;
        if self.stride < row_bytes {
            return Err(AnalyzerError::FrameShape {
                details: format!(
                    "frame {} stride {} is shorter than a row of {} bytes",
                    self.id, self.stride, row_bytes
                ),
            }
            .into());
        }

        let required = self.stride * (self.height as usize - 1) + row_bytes;
        if self.data.len() < required {
            return Err(AnalyzerError::FrameShape {
                details: format!(
                    "frame {} holds {} bytes, {}x{} with stride {} needs {}",
                    self.id,
                    self.data.len(),
                    self.width,
                    self.height,
                    self.stride,
                    required
                ),
            }
            .into());
        }

        Ok(())
    }

    /// Copy the pixel rows into a packed RGB image, dropping any row padding
    pub fn to_rgb_image(&self) -> Result<RgbImage> {
        self.validate()?;

        let row_bytes = self.width as usize * BYTES_PER_PIXEL;
        let packed = if self.stride == row_bytes {
            self.data[..row_bytes * self.height as usize].to_vec()
        } else {
            let mut packed = Vec::with_capacity(row_bytes * self.height as usize);
            for row in self.data.chunks(self.stride).take(self.height as usize) {
                packed.extend_from_slice(&row[..row_bytes]);
            }
            packed
        };

        RgbImage::from_raw(self.width, self.height, packed).ok_or_else(|| {
            AnalyzerError::FrameShape {
                details: format!("failed to build RGB image from frame {}", self.id),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_frame_validates() {
        let frame = FrameData::new(1, SystemTime::now(), vec![0u8; 4 * 2 * 3], 4, 2);
        assert!(frame.validate().is_ok());
        assert_eq!(frame.stride, 12);
        assert_eq!(frame.dimensions(), (4, 2));
    }

    #[test]
    fn test_zero_size_frame_is_rejected() {
        let frame = FrameData::new(1, SystemTime::now(), Vec::new(), 0, 0);
        assert!(frame.validate().is_err());
    }

    #[test]
    fn test_short_buffer_is_rejected() {
        let frame = FrameData::new(1, SystemTime::now(), vec![0u8; 10], 4, 2);
        assert!(frame.validate().is_err());
    }

    #[test]
    fn test_padded_rows_are_stripped() {
        // 2x2 frame, each row padded with two bytes
        let data = vec![
            1, 1, 1, 2, 2, 2, 0xAA, 0xAA, //
            3, 3, 3, 4, 4, 4, 0xBB, 0xBB,
        ];
        let frame = FrameData::with_stride(7, SystemTime::now(), data, 2, 2, 8);
        let image = frame.to_rgb_image().unwrap();

        assert_eq!(image.get_pixel(0, 0).0, [1, 1, 1]);
        assert_eq!(image.get_pixel(1, 0).0, [2, 2, 2]);
        assert_eq!(image.get_pixel(0, 1).0, [3, 3, 3]);
        assert_eq!(image.get_pixel(1, 1).0, [4, 4, 4]);
    }

    #[test]
    fn test_rgb_image_round_trip_keeps_id() {
        let image = RgbImage::from_pixel(3, 3, image::Rgb([9, 8, 7]));
        let frame = FrameData::from_rgb_image(42, SystemTime::now(), image.clone());
        assert_eq!(frame.id, 42);
        assert_eq!(frame.to_rgb_image().unwrap(), image);
    }
}
