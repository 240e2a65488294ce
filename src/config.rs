use crate::mapper::{CalibrationWindow, OutOfRangePolicy, VolumeRange};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PinchvolConfig {
    pub camera: CameraConfig,
    pub detector: DetectorConfig,
    pub mapping: MappingConfig,
    pub sink: SinkConfig,
    pub control: ControlConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CameraConfig {
    /// Camera source: "gstreamer" (V4L2 device) or "synthetic". Defaults to
    /// gstreamer only in builds with the `camera` feature.
    #[serde(default = "default_camera_kind")]
    pub kind: String,

    /// Camera device index (e.g., 0 for /dev/video0)
    #[serde(default = "default_camera_index")]
    pub index: u32,

    /// Preferred resolution (width, height)
    #[serde(default = "default_camera_resolution")]
    pub resolution: (u32, u32),

    /// Frames per second requested from the driver
    #[serde(default = "default_camera_fps")]
    pub fps: u32,

    /// Timeout for a single frame read in milliseconds
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Number of open attempts before startup fails
    #[serde(default = "default_open_attempts")]
    pub open_attempts: u32,

    /// Delay before the first open retry in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Upper bound for the exponential retry delay in milliseconds
    #[serde(default = "default_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,

    /// Consecutive frame misses before the device is reopened (0 disables)
    #[serde(default = "default_reopen_after_misses")]
    pub reopen_after_misses: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DetectorConfig {
    /// Landmark provider command line (program followed by arguments)
    #[serde(default)]
    pub command: Vec<String>,

    /// Convert BGR frames to RGB before handing them to the provider
    #[serde(default = "default_convert_to_rgb")]
    pub convert_to_rgb: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MappingConfig {
    /// Pinch distance in pixels mapped to the minimum volume
    #[serde(default = "default_distance_low")]
    pub distance_low: f64,

    /// Pinch distance in pixels mapped to the maximum volume
    #[serde(default = "default_distance_high")]
    pub distance_high: f64,

    /// Out-of-window handling: "clamp" or "reject"
    #[serde(default)]
    pub policy: OutOfRangePolicy,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SinkConfig {
    /// Volume backend: "software" or "alsa"
    #[serde(default = "default_sink_kind")]
    pub kind: String,

    /// Range reported by the software sink (min, max)
    #[serde(default = "default_software_range")]
    pub software_range: (f64, f64),

    /// ALSA card passed to amixer
    #[serde(default = "default_alsa_card")]
    pub alsa_card: String,

    /// ALSA simple mixer control
    #[serde(default = "default_alsa_control")]
    pub alsa_control: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ControlConfig {
    /// Fixed pause between iterations in milliseconds
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    /// Stop after this many iterations (unbounded when absent)
    #[serde(default)]
    pub max_iterations: Option<u64>,

    /// Listen for q/Esc on the terminal
    #[serde(default = "default_keyboard")]
    pub keyboard: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DisplayConfig {
    /// Render the terminal status line
    #[serde(default = "default_display_enabled")]
    pub enabled: bool,
}

impl PinchvolConfig {
    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("camera.kind", default_camera_kind())?
            .set_default("camera.index", default_camera_index())?
            .set_default(
                "camera.resolution",
                vec![default_camera_resolution().0, default_camera_resolution().1],
            )?
            .set_default("camera.fps", default_camera_fps())?
            .set_default("camera.read_timeout_ms", default_read_timeout_ms())?
            .set_default("camera.open_attempts", default_open_attempts())?
            .set_default("camera.retry_delay_ms", default_retry_delay_ms())?
            .set_default("camera.max_retry_delay_ms", default_max_retry_delay_ms())?
            .set_default("camera.reopen_after_misses", default_reopen_after_misses())?
            .set_default("detector.command", Vec::<String>::new())?
            .set_default("detector.convert_to_rgb", default_convert_to_rgb())?
            .set_default("mapping.distance_low", default_distance_low())?
            .set_default("mapping.distance_high", default_distance_high())?
            .set_default("mapping.policy", "clamp")?
            .set_default("sink.kind", default_sink_kind())?
            .set_default(
                "sink.software_range",
                vec![default_software_range().0, default_software_range().1],
            )?
            .set_default("sink.alsa_card", default_alsa_card())?
            .set_default("sink.alsa_control", default_alsa_control())?
            .set_default("control.frame_interval_ms", default_frame_interval_ms())?
            .set_default("control.keyboard", default_keyboard())?
            .set_default("display.enabled", default_display_enabled())?
            .add_source(File::with_name(&path_str).required(false))
            // PINCHVOL_CAMERA__INDEX=1, PINCHVOL_MAPPING__POLICY=reject, ...
            .add_source(
                Environment::with_prefix("PINCHVOL")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: PinchvolConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.camera.kind.as_str(), "gstreamer" | "synthetic") {
            return Err(ConfigError::Message(format!(
                "Unknown camera kind '{}' (expected gstreamer or synthetic)",
                self.camera.kind
            )));
        }

        if self.camera.resolution.0 == 0 || self.camera.resolution.1 == 0 {
            return Err(ConfigError::Message(
                "Camera resolution must be greater than 0".to_string(),
            ));
        }

        if self.camera.fps == 0 {
            return Err(ConfigError::Message(
                "Camera fps must be greater than 0".to_string(),
            ));
        }

        if self.camera.open_attempts == 0 {
            return Err(ConfigError::Message(
                "Camera open_attempts must be at least 1".to_string(),
            ));
        }

        if self.camera.read_timeout_ms == 0 {
            return Err(ConfigError::Message(
                "Camera read_timeout_ms must be greater than 0".to_string(),
            ));
        }

        self.calibration_window()
            .map_err(|e| ConfigError::Message(e.to_string()))?;

        if !matches!(self.sink.kind.as_str(), "software" | "alsa") {
            return Err(ConfigError::Message(format!(
                "Unknown sink kind '{}' (expected software or alsa)",
                self.sink.kind
            )));
        }

        if self.sink.kind == "software" {
            let (min, max) = self.sink.software_range;
            VolumeRange::new(min, max).map_err(|e| ConfigError::Message(e.to_string()))?;
        }

        if self.control.max_iterations == Some(0) {
            return Err(ConfigError::Message(
                "Control max_iterations must be greater than 0 when set".to_string(),
            ));
        }

        Ok(())
    }

    /// Calibration window described by the mapping section
    pub fn calibration_window(&self) -> Result<CalibrationWindow, crate::error::CalibrationError> {
        CalibrationWindow::new(self.mapping.distance_low, self.mapping.distance_high)
    }

    /// Pacing delay between iterations
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.control.frame_interval_ms)
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for PinchvolConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                kind: default_camera_kind(),
                index: default_camera_index(),
                resolution: default_camera_resolution(),
                fps: default_camera_fps(),
                read_timeout_ms: default_read_timeout_ms(),
                open_attempts: default_open_attempts(),
                retry_delay_ms: default_retry_delay_ms(),
                max_retry_delay_ms: default_max_retry_delay_ms(),
                reopen_after_misses: default_reopen_after_misses(),
            },
            detector: DetectorConfig {
                command: Vec::new(),
                convert_to_rgb: default_convert_to_rgb(),
            },
            mapping: MappingConfig {
                distance_low: default_distance_low(),
                distance_high: default_distance_high(),
                policy: OutOfRangePolicy::default(),
            },
            sink: SinkConfig {
                kind: default_sink_kind(),
                software_range: default_software_range(),
                alsa_card: default_alsa_card(),
                alsa_control: default_alsa_control(),
            },
            control: ControlConfig {
                frame_interval_ms: default_frame_interval_ms(),
                max_iterations: None,
                keyboard: default_keyboard(),
            },
            display: DisplayConfig {
                enabled: default_display_enabled(),
            },
        }
    }
}

// Default value functions
fn default_camera_kind() -> String {
    if cfg!(all(feature = "camera", target_os = "linux")) {
        "gstreamer".to_string()
    } else {
        "synthetic".to_string()
    }
}
fn default_camera_index() -> u32 {
    0
}
fn default_camera_resolution() -> (u32, u32) {
    (320, 240)
}
fn default_camera_fps() -> u32 {
    30
}
fn default_read_timeout_ms() -> u64 {
    1000
}
fn default_open_attempts() -> u32 {
    2
}
fn default_retry_delay_ms() -> u64 {
    500
}
fn default_max_retry_delay_ms() -> u64 {
    5000
}
fn default_reopen_after_misses() -> u32 {
    30
}

fn default_convert_to_rgb() -> bool {
    true
}

fn default_distance_low() -> f64 {
    15.0
}
fn default_distance_high() -> f64 {
    220.0
}

fn default_sink_kind() -> String {
    "software".to_string()
}
fn default_software_range() -> (f64, f64) {
    (-65.25, 0.0)
}
fn default_alsa_card() -> String {
    "default".to_string()
}
fn default_alsa_control() -> String {
    "Master".to_string()
}

fn default_frame_interval_ms() -> u64 {
    33
} // ~30 iterations per second

fn default_keyboard() -> bool {
    true
}
fn default_display_enabled() -> bool {
    true
}
