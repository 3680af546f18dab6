pub mod config;
pub mod error;
pub mod frame;
pub mod imaging;
pub mod analyzer;
pub mod source;
pub mod overlay;
pub mod output;
pub mod runner;

pub use config::{DetectorSettings, GestureCamConfig, SourceKind};
pub use error::{GestureError, Result};
pub use frame::FrameData;
pub use analyzer::{
    BodyRegion, BodySegmenter, BodySpan, DetectionResult, GestureClassifier, GestureDetector,
    GestureState, IntensityProfile, MotionGate,
};
pub use source::{open_source, FrameSource, ImageSequenceSource, Pose, SyntheticSource};
pub use output::{DetectionRecord, DetectionWriter};
pub use runner::{GestureRunner, RunnerStats, StopReason};
