use crate::analyzer::{BodyRegion, DetectionResult, GestureState};
use crate::config::OutputConfig;
use crate::error::{GestureError, Result};
use crate::overlay;

use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info};

const METADATA_FILE: &str = "detections.jsonl";

/// One line of the detection log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub frame_id: u64,
    pub timestamp: SystemTime,
    pub is_moving: bool,
    pub body: Option<BodyRegion>,
    pub gesture: Option<GestureState>,
}

impl From<&DetectionResult> for DetectionRecord {
    fn from(result: &DetectionResult) -> Self {
        Self {
            frame_id: result.frame_id,
            timestamp: result.timestamp,
            is_moving: result.is_moving,
            body: result.body,
            gesture: result.gesture,
        }
    }
}

/// Persists annotated masks and detection records for later inspection
pub struct DetectionWriter {
    directory: PathBuf,
    save_masks: bool,
    metadata: Option<BufWriter<File>>,
}

impl DetectionWriter {
    /// Writer for `config`, or `None` when no output directory is configured
    pub fn from_config(config: &OutputConfig) -> Result<Option<Self>> {
        match &config.directory {
            Some(directory) => Ok(Some(Self::new(
                directory,
                config.save_masks,
                config.save_metadata,
            )?)),
            None => Ok(None),
        }
    }

    pub fn new<P: AsRef<Path>>(directory: P, save_masks: bool, save_metadata: bool) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory)?;

        let metadata = if save_metadata {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(directory.join(METADATA_FILE))?;
            Some(BufWriter::new(file))
        } else {
            None
        };

        info!("Writing detection output to {}", directory.display());

        Ok(Self {
            directory,
            save_masks,
            metadata,
        })
    }

    pub fn write(&mut self, result: &DetectionResult) -> Result<()> {
        if self.save_masks {
            let path = self.mask_path(result.frame_id);
            overlay::annotate(result).save(&path)?;
            debug!("Saved mask {}", path.display());
        }

        if let Some(metadata) = self.metadata.as_mut() {
            let line = serde_json::to_string(&DetectionRecord::from(result)).map_err(|e| {
                GestureError::component(
                    "detection_writer",
                    format!("Failed to serialize record: {}", e),
                )
            })?;
            writeln!(metadata, "{}", line)?;
        }

        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        if let Some(metadata) = self.metadata.as_mut() {
            metadata.flush()?;
        }
        Ok(())
    }

    pub fn mask_path(&self, frame_id: u64) -> PathBuf {
        self.directory.join(format!("mask_{:06}.png", frame_id))
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.directory.join(METADATA_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectorSettings;
    use crate::analyzer::GestureDetector;
    use crate::frame::FrameData;
    use image::{Rgb, RgbImage};

    fn still_result() -> DetectionResult {
        let frame = FrameData::from_rgb_image(
            3,
            SystemTime::now(),
            RgbImage::from_pixel(64, 48, Rgb([10, 10, 10])),
        );
        let detector = GestureDetector::new(DetectorSettings::default(), &frame).unwrap();
        detector.detect(&frame, &frame).unwrap()
    }

    #[test]
    fn test_writes_mask_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = DetectionWriter::new(dir.path().join("out"), true, true).unwrap();

        let result = still_result();
        writer.write(&result).unwrap();
        writer.flush().unwrap();

        let mask = image::open(writer.mask_path(3)).unwrap().to_luma8();
        assert_eq!(mask.dimensions(), (32, 24));

        let log = fs::read_to_string(writer.metadata_path()).unwrap();
        let record: DetectionRecord = serde_json::from_str(log.lines().next().unwrap()).unwrap();
        assert_eq!(record.frame_id, 3);
        assert!(!record.is_moving);
        assert!(record.body.is_none());
    }

    #[test]
    fn test_masks_can_be_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = DetectionWriter::new(dir.path(), false, false).unwrap();
        writer.write(&still_result()).unwrap();

        assert!(!writer.mask_path(3).exists());
        assert!(!writer.metadata_path().exists());
    }

    #[test]
    fn test_no_directory_means_no_writer() {
        let config = OutputConfig {
            directory: None,
            save_masks: true,
            save_metadata: true,
        };
        assert!(DetectionWriter::from_config(&config).unwrap().is_none());
    }
}
