use super::FrameSource;
use crate::config::SourceConfig;
use crate::error::{Result, SourceError};
use crate::frame::FrameData;

use gstreamer::prelude::*;
use gstreamer::Pipeline;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use std::time::SystemTime;
use tracing::{debug, info, trace, warn};

/// Live v4l2 camera delivering RGB frames through a GStreamer appsink
pub struct CameraSource {
    pipeline: Pipeline,
    appsink: AppSink,
    frame_counter: u64,
}

impl CameraSource {
    pub fn open(config: &SourceConfig) -> Result<Self> {
        let (width, height) = config.resolution;
        info!(
            "Opening camera /dev/video{} ({}x{} @ {}fps)",
            config.device_index, width, height, config.fps
        );

        gstreamer::init().map_err(|e| SourceError::DeviceOpen {
            details: format!("Failed to initialize GStreamer: {}", e),
        })?;

        let pipeline_desc = format!(
            "v4l2src device=/dev/video{} do-timestamp=true ! \
             videoconvert ! \
             videoscale ! \
             video/x-raw,format=RGB,width={},height={},framerate={}/1 ! \
             appsink name=sink sync=false max-buffers=2 drop=true",
            config.device_index, width, height, config.fps
        );
        debug!("Creating GStreamer pipeline: {}", pipeline_desc);

        let pipeline = gstreamer::parse::launch(&pipeline_desc)
            .map_err(|e| SourceError::DeviceOpen {
                details: format!("Failed to create pipeline: {}", e),
            })?
            .downcast::<Pipeline>()
            .map_err(|_| SourceError::DeviceOpen {
                details: "Failed to downcast to Pipeline".to_string(),
            })?;

        let appsink = pipeline
            .by_name("sink")
            .ok_or_else(|| SourceError::DeviceOpen {
                details: "Failed to get appsink element".to_string(),
            })?
            .downcast::<AppSink>()
            .map_err(|_| SourceError::DeviceOpen {
                details: "Failed to downcast to AppSink".to_string(),
            })?;

        pipeline
            .set_state(gstreamer::State::Playing)
            .map_err(|e| SourceError::DeviceOpen {
                details: format!("Failed to start camera pipeline: {}", e),
            })?;

        Ok(Self {
            pipeline,
            appsink,
            frame_counter: 0,
        })
    }

    fn sample_to_frame(&mut self, sample: gstreamer::Sample) -> Result<FrameData> {
        let buffer = sample.buffer().ok_or_else(|| SourceError::CaptureStream {
            details: "No buffer in sample".to_string(),
        })?;

        let caps = sample.caps().ok_or_else(|| SourceError::CaptureStream {
            details: "No caps in sample".to_string(),
        })?;

        let video_info = VideoInfo::from_caps(caps).map_err(|e| SourceError::CaptureStream {
            details: format!("Failed to get video info: {}", e),
        })?;

        let map = buffer
            .map_readable()
            .map_err(|e| SourceError::CaptureStream {
                details: format!("Failed to map buffer: {}", e),
            })?;

        let id = self.frame_counter;
        self.frame_counter += 1;

        let stride = video_info.stride()[0] as usize;
        trace!(
            "Captured frame {} ({}x{}, stride {})",
            id,
            video_info.width(),
            video_info.height(),
            stride
        );

        Ok(FrameData::with_stride(
            id,
            SystemTime::now(),
            map.as_slice().to_vec(),
            video_info.width(),
            video_info.height(),
            stride,
        ))
    }
}

impl FrameSource for CameraSource {
    fn next_frame(&mut self) -> Result<Option<FrameData>> {
        match self.appsink.pull_sample() {
            Ok(sample) => self.sample_to_frame(sample).map(Some),
            Err(_) if self.appsink.is_eos() => {
                info!("Camera stream ended");
                Ok(None)
            }
            Err(e) => Err(SourceError::CaptureStream {
                details: format!("Failed to pull sample: {}", e),
            }
            .into()),
        }
    }

    fn name(&self) -> &str {
        "camera"
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        if let Err(e) = self.pipeline.set_state(gstreamer::State::Null) {
            warn!("Failed to stop camera pipeline cleanly: {}", e);
        }
    }
}
