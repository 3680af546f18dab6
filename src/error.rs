use thiserror::Error;

#[derive(Error, Debug)]
pub enum GestureError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Analyzer error: {0}")]
    Analyzer(#[from] AnalyzerError),

    #[error("Frame source error: {0}")]
    Source(#[from] SourceError),

    #[error("System error: {message}")]
    System { message: String },

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },
}

/// Faults raised by the detection core. Empty scenes are not faults.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Invalid detector settings: {details}")]
    InvalidSettings { details: String },

    #[error("Frame shape mismatch: {details}")]
    FrameShape { details: String },
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to open frame source: {details}")]
    DeviceOpen { details: String },

    #[error("Capture stream error: {details}")]
    CaptureStream { details: String },

    #[error("Failed to decode frame: {details}")]
    Decode { details: String },
}

impl GestureError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn component<C: Into<String>, M: Into<String>>(component: C, message: M) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GestureError>;
