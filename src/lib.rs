pub mod app;
pub mod camera;
pub mod config;
pub mod detector;
pub mod display;
pub mod error;
pub mod frame;
pub mod landmarks;
pub mod mapper;
pub mod measurement;
pub mod recovery;
pub mod sink;

#[cfg(test)]
pub(crate) mod testing;

pub use app::{ControlContext, ControlLoop, LoopState, LoopStats, ShutdownReason, StopSignal};
pub use camera::{CameraHandle, FrameSource, FrameSourceOpener, OpenRequest};
pub use config::PinchvolConfig;
pub use detector::{DetectedHand, LandmarkProvider};
pub use display::{Display, NullDisplay, Overlay, TerminalDisplay};
pub use error::{PinchvolError, Result};
pub use frame::{Frame, FrameFormat};
pub use landmarks::{HandObservation, Landmark, NormalizedLandmark};
pub use mapper::{CalibrationWindow, MappingOutcome, OutOfRangePolicy, VolumeMapper, VolumeRange};
pub use measurement::Measurement;
pub use sink::VolumeSink;
