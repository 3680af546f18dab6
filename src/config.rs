use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GestureCamConfig {
    pub detector: DetectorSettings,
    pub source: SourceConfig,
    pub output: OutputConfig,
    pub runner: RunnerConfig,
}

/// Tuning values for the detection pipeline. Fixed for the lifetime of a detector.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct DetectorSettings {
    /// Difference binarization cutoff
    #[serde(default = "default_threshold")]
    pub threshold: u8,

    /// Number of vertical bands the frame is sliced into
    #[serde(default = "default_num_slices")]
    pub num_slices: usize,

    /// Fraction of peak band intensity a band must keep to count as torso
    #[serde(default = "default_torso_coefficient")]
    pub torso_coefficient: f32,

    /// Minimum arm/torso width fraction for an arm to count as raised
    #[serde(default = "default_arm_to_torso_ratio")]
    pub arm_to_torso_ratio: f32,

    /// Downscale factor applied before processing
    #[serde(default = "default_scale")]
    pub scale: f32,

    /// Lit-pixel count that signals movement on a 921600-pixel frame
    #[serde(default = "default_sum_required_for_movement_base")]
    pub sum_required_for_movement_base: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Generated figure frames, no hardware needed
    Synthetic,
    /// Directory of still images played back in file name order
    Images,
    /// Live v4l2 camera (requires the `camera` feature)
    Camera,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SourceConfig {
    #[serde(default = "default_source_kind")]
    pub kind: SourceKind,

    /// Directory read by the image sequence source
    #[serde(default)]
    pub directory: Option<String>,

    /// Camera device index (e.g., 0 for /dev/video0)
    #[serde(default = "default_device_index")]
    pub device_index: u32,

    /// Frame resolution (width, height) for camera and synthetic sources
    #[serde(default = "default_resolution")]
    pub resolution: (u32, u32),

    /// Frames per second requested from the camera
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Number of frames the synthetic source emits
    #[serde(default = "default_synthetic_frames")]
    pub synthetic_frames: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct OutputConfig {
    /// Directory for annotated masks and metadata; nothing is written when unset
    #[serde(default)]
    pub directory: Option<String>,

    /// Save the annotated difference mask of every frame as PNG
    #[serde(default = "default_save_masks")]
    pub save_masks: bool,

    /// Append one JSON line per processed frame
    #[serde(default = "default_save_metadata")]
    pub save_metadata: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RunnerConfig {
    /// Stop after this many processed frames
    #[serde(default)]
    pub max_frames: Option<u64>,

    /// Time spent waiting for a key press between frames
    #[serde(default = "default_key_wait_ms")]
    pub key_wait_ms: u64,

    /// Watch the terminal for `q`/`Esc` between frames
    #[serde(default = "default_interactive")]
    pub interactive: bool,
}

impl GestureCamConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("gesturecam.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("detector.threshold", default_threshold() as i64)?
            .set_default("detector.num_slices", default_num_slices() as i64)?
            .set_default(
                "detector.torso_coefficient",
                default_torso_coefficient() as f64,
            )?
            .set_default(
                "detector.arm_to_torso_ratio",
                default_arm_to_torso_ratio() as f64,
            )?
            .set_default("detector.scale", default_scale() as f64)?
            .set_default(
                "detector.sum_required_for_movement_base",
                default_sum_required_for_movement_base() as f64,
            )?
            .set_default("source.kind", "synthetic")?
            .set_default("source.device_index", default_device_index())?
            .set_default(
                "source.resolution",
                vec![default_resolution().0, default_resolution().1],
            )?
            .set_default("source.fps", default_fps())?
            .set_default(
                "source.synthetic_frames",
                default_synthetic_frames() as i64,
            )?
            .set_default("output.save_masks", default_save_masks())?
            .set_default("output.save_metadata", default_save_metadata())?
            .set_default("runner.key_wait_ms", default_key_wait_ms() as i64)?
            .set_default("runner.interactive", default_interactive())?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // GESTURECAM_DETECTOR__NUM_SLICES=24 overrides detector.num_slices
            .add_source(
                Environment::with_prefix("GESTURECAM")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: GestureCamConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.detector.validate()?;

        match self.source.kind {
            SourceKind::Images => {
                if self.source.directory.is_none() {
                    return Err(ConfigError::Message(
                        "Image source requires source.directory".to_string(),
                    ));
                }
            }
            SourceKind::Camera | SourceKind::Synthetic => {
                if self.source.resolution.0 == 0 || self.source.resolution.1 == 0 {
                    return Err(ConfigError::Message(
                        "Source resolution must be greater than 0".to_string(),
                    ));
                }
            }
        }

        if self.source.kind == SourceKind::Camera && self.source.fps == 0 {
            return Err(ConfigError::Message(
                "Camera fps must be greater than 0".to_string(),
            ));
        }

        if self.runner.max_frames == Some(0) {
            return Err(ConfigError::Message(
                "runner.max_frames must be greater than 0 when set".to_string(),
            ));
        }

        Ok(())
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> crate::error::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

impl DetectorSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_slices == 0 {
            return Err(ConfigError::Message(
                "detector.num_slices must be greater than 0".to_string(),
            ));
        }

        if !(self.scale > 0.0 && self.scale <= 1.0) {
            return Err(ConfigError::Message(format!(
                "detector.scale must be in (0, 1], got {}",
                self.scale
            )));
        }

        if !(0.0..=1.0).contains(&self.torso_coefficient) {
            return Err(ConfigError::Message(format!(
                "detector.torso_coefficient must be in [0, 1], got {}",
                self.torso_coefficient
            )));
        }

        if !(0.0..=1.0).contains(&self.arm_to_torso_ratio) {
            return Err(ConfigError::Message(format!(
                "detector.arm_to_torso_ratio must be in [0, 1], got {}",
                self.arm_to_torso_ratio
            )));
        }

        if !(self.sum_required_for_movement_base >= 0.0) {
            return Err(ConfigError::Message(format!(
                "detector.sum_required_for_movement_base must not be negative, got {}",
                self.sum_required_for_movement_base
            )));
        }

        Ok(())
    }
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            num_slices: default_num_slices(),
            torso_coefficient: default_torso_coefficient(),
            arm_to_torso_ratio: default_arm_to_torso_ratio(),
            scale: default_scale(),
            sum_required_for_movement_base: default_sum_required_for_movement_base(),
        }
    }
}

impl Default for GestureCamConfig {
    fn default() -> Self {
        Self {
            detector: DetectorSettings::default(),
            source: SourceConfig {
                kind: default_source_kind(),
                directory: None,
                device_index: default_device_index(),
                resolution: default_resolution(),
                fps: default_fps(),
                synthetic_frames: default_synthetic_frames(),
            },
            output: OutputConfig {
                directory: None,
                save_masks: default_save_masks(),
                save_metadata: default_save_metadata(),
            },
            runner: RunnerConfig {
                max_frames: None,
                key_wait_ms: default_key_wait_ms(),
                interactive: default_interactive(),
            },
        }
    }
}

// Default value functions
fn default_threshold() -> u8 {
    80
}
fn default_num_slices() -> usize {
    20
}
fn default_torso_coefficient() -> f32 {
    0.4
}
fn default_arm_to_torso_ratio() -> f32 {
    0.4
}
fn default_scale() -> f32 {
    0.5
}
fn default_sum_required_for_movement_base() -> f32 {
    1000.0
}

fn default_source_kind() -> SourceKind {
    SourceKind::Synthetic
}
fn default_device_index() -> u32 {
    0
}
fn default_resolution() -> (u32, u32) {
    (640, 480)
}
fn default_fps() -> u32 {
    30
}
fn default_synthetic_frames() -> usize {
    12
}

fn default_save_masks() -> bool {
    true
}
fn default_save_metadata() -> bool {
    false
}

fn default_key_wait_ms() -> u64 {
    50
}
fn default_interactive() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = GestureCamConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.detector.threshold, 80);
        assert_eq!(config.detector.num_slices, 20);
        assert_eq!(config.detector.scale, 0.5);
    }

    #[test]
    fn test_detector_validation() {
        let mut settings = DetectorSettings::default();
        settings.num_slices = 0;
        assert!(settings.validate().is_err());

        let mut settings = DetectorSettings::default();
        settings.scale = 0.0;
        assert!(settings.validate().is_err());
        settings.scale = 1.5;
        assert!(settings.validate().is_err());
        settings.scale = 1.0;
        assert!(settings.validate().is_ok());

        let mut settings = DetectorSettings::default();
        settings.torso_coefficient = 1.2;
        assert!(settings.validate().is_err());

        let mut settings = DetectorSettings::default();
        settings.arm_to_torso_ratio = -0.1;
        assert!(settings.validate().is_err());

        let mut settings = DetectorSettings::default();
        settings.sum_required_for_movement_base = f32::NAN;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_config_validation() {
        let mut config = GestureCamConfig::default();
        config.source.kind = SourceKind::Images;

        // Image playback without a directory
        assert!(config.validate().is_err());

        config.source.directory = Some("./frames".to_string());
        assert!(config.validate().is_ok());

        config.runner.max_frames = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gesturecam.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[detector]\nnum_slices = 32\ntorso_coefficient = 0.5\n\n[source]\nkind = \"images\"\ndirectory = \"/tmp/frames\""
        )
        .unwrap();

        let config = GestureCamConfig::load_from_file(&path).unwrap();
        assert_eq!(config.detector.num_slices, 32);
        assert_eq!(config.detector.torso_coefficient, 0.5);
        assert_eq!(config.detector.threshold, 80);
        assert_eq!(config.source.kind, SourceKind::Images);
        assert_eq!(config.source.directory.as_deref(), Some("/tmp/frames"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = GestureCamConfig::load_from_file(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.detector, DetectorSettings::default());
        assert_eq!(config.source.resolution, (640, 480));
    }

    #[test]
    fn test_environment_variable_override() {
        env::set_var("GESTURECAM_RUNNER__KEY_WAIT_MS", "75");

        let dir = tempfile::tempdir().unwrap();
        let config = GestureCamConfig::load_from_file(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.runner.key_wait_ms, 75);

        env::remove_var("GESTURECAM_RUNNER__KEY_WAIT_MS");
    }

    #[test]
    fn test_toml_round_trip_of_defaults() {
        let config = GestureCamConfig::default();
        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("[detector]"));

        let parsed: GestureCamConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_toml_failure_is_serialization_error() {
        // a bare integer is not a TOML document
        let err = toml::to_string(&42u8).unwrap_err();
        assert!(matches!(
            crate::error::GestureError::from(err),
            crate::error::GestureError::Serialization(_)
        ));
    }
}
