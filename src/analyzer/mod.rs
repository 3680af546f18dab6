mod body;
mod gesture;
mod motion;
mod pipeline;
mod profile;

pub use body::{BodyRegion, BodySegmenter, BodySpan};
pub use gesture::{GestureClassifier, GestureState};
pub use motion::{MotionGate, REFERENCE_FRAME_AREA};
pub use pipeline::{DetectionResult, GestureDetector};
pub use profile::IntensityProfile;
