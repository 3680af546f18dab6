#[cfg(all(feature = "camera", target_os = "linux"))]
mod camera;
mod images;
mod synthetic;

#[cfg(all(feature = "camera", target_os = "linux"))]
pub use camera::CameraSource;
pub use images::ImageSequenceSource;
pub use synthetic::{Pose, SyntheticSource};

use crate::config::{SourceConfig, SourceKind};
use crate::error::{Result, SourceError};
use crate::frame::FrameData;

/// Blocking supplier of raw frames, pulled one at a time by the runner
pub trait FrameSource {
    /// Next frame, or `None` once the stream has ended
    fn next_frame(&mut self) -> Result<Option<FrameData>>;

    fn name(&self) -> &str;
}

/// Build the source selected in the configuration
pub fn open_source(config: &SourceConfig) -> Result<Box<dyn FrameSource>> {
    match config.kind {
        SourceKind::Synthetic => Ok(Box::new(SyntheticSource::new(
            config.resolution.0,
            config.resolution.1,
            config.synthetic_frames,
        ))),
        SourceKind::Images => {
            let directory = config
                .directory
                .as_deref()
                .ok_or_else(|| SourceError::DeviceOpen {
                    details: "image source requires a directory".to_string(),
                })?;
            Ok(Box::new(ImageSequenceSource::open(directory)?))
        }
        SourceKind::Camera => open_camera(config),
    }
}

#[cfg(all(feature = "camera", target_os = "linux"))]
fn open_camera(config: &SourceConfig) -> Result<Box<dyn FrameSource>> {
    Ok(Box::new(CameraSource::open(config)?))
}

#[cfg(not(all(feature = "camera", target_os = "linux")))]
fn open_camera(_config: &SourceConfig) -> Result<Box<dyn FrameSource>> {
    Err(SourceError::DeviceOpen {
        details: "camera capture needs the `camera` feature on Linux".to_string(),
    }
    .into())
}
