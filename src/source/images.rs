use super::FrameSource;
use crate::error::{Result, SourceError};
use crate::frame::FrameData;

use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info};

const SUPPORTED_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "ppm", "tif"];

/// Plays back still images from a directory in file name order
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    position: usize,
}

impl ImageSequenceSource {
    pub fn open<P: AsRef<Path>>(directory: P) -> Result<Self> {
        let directory = directory.as_ref();
        let entries = std::fs::read_dir(directory).map_err(|e| SourceError::DeviceOpen {
            details: format!("cannot read {}: {}", directory.display(), e),
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && is_supported(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            return Err(SourceError::DeviceOpen {
                details: format!("no images found in {}", directory.display()),
            }
            .into());
        }

        info!(
            "Image sequence source: {} frames from {}",
            paths.len(),
            directory.display()
        );

        Ok(Self { paths, position: 0 })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<FrameData>> {
        let path = match self.paths.get(self.position) {
            Some(path) => path,
            None => return Ok(None),
        };

        let image = image::open(path)
            .map_err(|e| SourceError::Decode {
                details: format!("{}: {}", path.display(), e),
            })?
            .to_rgb8();

        let id = self.position as u64;
        self.position += 1;
        debug!("Loaded frame {} from {}", id, path.display());

        Ok(Some(FrameData::from_rgb_image(id, SystemTime::now(), image)))
    }

    fn name(&self) -> &str {
        "images"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_frames_play_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        RgbImage::from_pixel(4, 3, Rgb([20, 20, 20]))
            .save(dir.path().join("frame_002.png"))
            .unwrap();
        RgbImage::from_pixel(4, 3, Rgb([10, 10, 10]))
            .save(dir.path().join("frame_001.png"))
            .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a frame").unwrap();

        let mut source = ImageSequenceSource::open(dir.path()).unwrap();
        assert_eq!(source.len(), 2);

        let first = source.next_frame().unwrap().unwrap();
        assert_eq!(first.id, 0);
        assert_eq!(first.dimensions(), (4, 3));
        assert_eq!(first.data[0], 10);

        let second = source.next_frame().unwrap().unwrap();
        assert_eq!(second.data[0], 20);

        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_empty_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ImageSequenceSource::open(dir.path()).is_err());
    }

    #[test]
    fn test_missing_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = ImageSequenceSource::open(dir.path().join("missing"));
        assert!(matches!(
            result,
            Err(crate::error::GestureError::Source(SourceError::DeviceOpen { .. }))
        ));
    }

    #[test]
    fn test_corrupt_image_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.png"), b"not really a png").unwrap();

        let mut source = ImageSequenceSource::open(dir.path()).unwrap();
        assert!(matches!(
            source.next_frame(),
            Err(crate::error::GestureError::Source(SourceError::Decode { .. }))
        ));
    }
}
