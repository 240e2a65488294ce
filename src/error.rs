use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PinchvolError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Landmark detection error: {0}")]
    Detection(#[from] DetectionError),

    #[error("Measurement error: {0}")]
    Measurement(#[from] MeasurementError),

    #[error("Calibration error: {0}")]
    Calibration(#[from] CalibrationError),

    #[error("Volume sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Startup failed in {component}: {message}")]
    Startup { component: String, message: String },
}

impl PinchvolError {
    pub fn startup(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Startup {
            component: component.into(),
            message: message.into(),
        }
    }
}

/// Camera (frame source) errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CameraError {
    #[error("Camera device {device} unavailable: {details}")]
    DeviceUnavailable { device: u32, details: String },

    #[error("Frame unavailable: {details}")]
    FrameUnavailable { details: String },

    #[error("No frame received within {timeout:?}")]
    FrameTimeout { timeout: Duration },

    #[error("Camera configuration failed: {details}")]
    Configuration { details: String },

    #[error("Camera handle already closed")]
    Closed,
}

impl CameraError {
    /// Frame-level misses the loop skips over; everything else means the device is gone.
    pub fn is_frame_miss(&self) -> bool {
        matches!(
            self,
            CameraError::FrameUnavailable { .. } | CameraError::FrameTimeout { .. }
        )
    }
}

/// Landmark provider errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectionError {
    #[error("Landmark provider failed to start: {details}")]
    Spawn { details: String },

    #[error("Landmark provider I/O failed: {details}")]
    Io { details: String },

    #[error("Landmark provider returned malformed output: {details}")]
    Protocol { details: String },

    #[error("Landmark provider exited")]
    Exited,
}

/// Landmark-to-measurement reduction errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeasurementError {
    #[error("Hand has {actual} landmarks, topology requires {expected}")]
    TopologyMismatch { expected: usize, actual: usize },

    #[error("Landmark at position {position} carries id {id}")]
    MisplacedLandmark { position: usize, id: usize },
}

/// Calibration window and volume range construction errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("Calibration window requires low < high, got ({low}, {high})")]
    InvalidWindow { low: f64, high: f64 },

    #[error("Volume range requires min <= max, got ({min}, {max})")]
    InvalidRange { min: f64, max: f64 },
}

/// Volume sink errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SinkError {
    #[error("Volume control unavailable: {details}")]
    Unavailable { details: String },

    #[error("Volume write rejected: {details}")]
    WriteRejected { details: String },

    #[error("Volume read failed: {details}")]
    ReadFailed { details: String },
}

/// Errors raised inside one loop iteration.
///
/// Each variant is recovered at the loop boundary: logged, iteration abandoned,
/// loop continues.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IterationError {
    #[error(transparent)]
    Frame(#[from] CameraError),

    #[error(transparent)]
    Detection(#[from] DetectionError),

    #[error(transparent)]
    Measurement(#[from] MeasurementError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

pub type Result<T> = std::result::Result<T, PinchvolError>;
