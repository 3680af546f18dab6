use super::body::{BodyRegion, BodySegmenter};
use super::gesture::{GestureClassifier, GestureState};
use super::motion::MotionGate;
use super::profile::IntensityProfile;
use crate::config::DetectorSettings;
use crate::error::{AnalyzerError, Result};
use crate::frame::FrameData;
use crate::imaging;

use image::GrayImage;
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// Outcome of running the detector on one frame pair
#[derive(Debug, Clone)]
pub struct DetectionResult {
    pub frame_id: u64,
    pub timestamp: SystemTime,
    pub is_moving: bool,
    /// Present only when `is_moving`
    pub body: Option<BodyRegion>,
    /// Present only when `is_moving`
    pub gesture: Option<GestureState>,
    /// Background-difference mask when moving. Still frames skip the background
    /// difference and carry the frame-to-frame mask instead, so renderers must not
    /// expect a silhouette here unless `is_moving` is set.
    pub motion_mask: GrayImage,
}

impl DetectionResult {
    fn still(frame: &FrameData, motion_mask: GrayImage) -> Self {
        Self {
            frame_id: frame.id,
            timestamp: frame.timestamp,
            is_moving: false,
            body: None,
            gesture: None,
            motion_mask,
        }
    }

    fn moving(
        frame: &FrameData,
        body: BodyRegion,
        gesture: GestureState,
        motion_mask: GrayImage,
    ) -> Self {
        Self {
            frame_id: frame.id,
            timestamp: frame.timestamp,
            is_moving: true,
            body: Some(body),
            gesture: Some(gesture),
            motion_mask,
        }
    }

    /// Gesture if one was classified this frame
    pub fn recognized_gesture(&self) -> Option<GestureState> {
        self.gesture.filter(|g| g.is_gesture)
    }
}

/// Background-subtraction gesture detector.
///
/// The background is the frame passed to [`GestureDetector::new`] and is never
/// refreshed, so the detector assumes a fixed camera and stable lighting.
pub struct GestureDetector {
    settings: DetectorSettings,
    frame_size: (u32, u32),
    processing_size: (u32, u32),
    background: GrayImage,
    motion_gate: MotionGate,
    segmenter: BodySegmenter,
    classifier: GestureClassifier,
}

impl GestureDetector {
    /// Create a detector using `background` as the fixed empty-scene reference
    pub fn new(settings: DetectorSettings, background: &FrameData) -> Result<Self> {
        settings
            .validate()
            .map_err(|e| AnalyzerError::InvalidSettings {
                details: e.to_string(),
            })?;
        background.validate()?;

        let frame_size = background.dimensions();
        let processing_size =
            imaging::scaled_dimensions(frame_size.0, frame_size.1, settings.scale);
        if processing_size.0 == 0 || processing_size.1 == 0 {
            return Err(AnalyzerError::InvalidSettings {
                details: format!(
                    "scale {} shrinks {}x{} frames to nothing",
                    settings.scale, frame_size.0, frame_size.1
                ),
            }
            .into());
        }

        if (processing_size.0 as usize) < settings.num_slices {
            warn!(
                "Processing width {} is smaller than {} slices; no body can be found",
                processing_size.0, settings.num_slices
            );
        }

        let background = preprocess(background, processing_size)?;
        let motion_gate = MotionGate::new(
            settings.sum_required_for_movement_base,
            processing_size.0,
            processing_size.1,
        );

        info!(
            "Gesture detector ready: {}x{} frames processed at {}x{}, {} slices",
            frame_size.0, frame_size.1, processing_size.0, processing_size.1, settings.num_slices
        );

        Ok(Self {
            settings,
            frame_size,
            processing_size,
            background,
            motion_gate,
            segmenter: BodySegmenter::new(settings.torso_coefficient),
            classifier: GestureClassifier::new(settings.arm_to_torso_ratio),
        })
    }

    /// Analyze `current` against `previous` (for motion) and the background (for the body)
    pub fn detect(&self, current: &FrameData, previous: &FrameData) -> Result<DetectionResult> {
        self.check_frame(current)?;
        self.check_frame(previous)?;

        let current_gray = preprocess(current, self.processing_size)?;
        let previous_gray = preprocess(previous, self.processing_size)?;

        let frame_mask = self.difference_mask(&previous_gray, &current_gray)?;
        if !self.motion_gate.is_moving(&frame_mask) {
            debug!("Frame {} is still", current.id);
            return Ok(DetectionResult::still(current, frame_mask));
        }

        let background_mask = self.difference_mask(&self.background, &current_gray)?;
        let profile = IntensityProfile::from_mask(&background_mask, self.settings.num_slices);
        let body = self
            .segmenter
            .segment(&profile, background_mask.width());
        let gesture = self.classifier.classify(&body);

        debug!(
            "Frame {} is moving: body={} gesture={:?}",
            current.id,
            body.is_body(),
            gesture
        );

        Ok(DetectionResult::moving(current, body, gesture, background_mask))
    }

    pub fn settings(&self) -> &DetectorSettings {
        &self.settings
    }

    /// Raw frame size every input must match
    pub fn frame_size(&self) -> (u32, u32) {
        self.frame_size
    }

    /// Size of the grayscale masks the detector produces
    pub fn processing_size(&self) -> (u32, u32) {
        self.processing_size
    }

    pub fn motion_gate(&self) -> &MotionGate {
        &self.motion_gate
    }

    fn difference_mask(&self, a: &GrayImage, b: &GrayImage) -> Result<GrayImage> {
        let diff = imaging::absolute_difference(a, b)?;
        Ok(imaging::binary_threshold(&diff, self.settings.threshold))
    }

    fn check_frame(&self, frame: &FrameData) -> Result<()> {
        frame.validate()?;
        if frame.dimensions() != self.frame_size {
            return Err(AnalyzerError::FrameShape {
                details: format!(
                    "frame {} is {}x{}, background is {}x{}",
                    frame.id, frame.width, frame.height, self.frame_size.0, self.frame_size.1
                ),
            }
            .into());
        }
        Ok(())
    }
}

/// Mirror, convert to grayscale and shrink a raw frame
fn preprocess(frame: &FrameData, size: (u32, u32)) -> Result<GrayImage> {
    let rgb = frame.to_rgb_image()?;
    let flipped = imaging::flip_horizontal(&rgb);
    let gray = imaging::to_grayscale(&flipped);
    Ok(imaging::resize_linear(&gray, size.0, size.1))
}
