mod builder;
#[cfg(all(feature = "camera", target_os = "linux"))]
mod gst;
mod interface;
mod synthetic;

pub use builder::{open_with_retry, opener_for};
#[cfg(all(feature = "camera", target_os = "linux"))]
pub use gst::{GstCamera, GstOpener};
pub use interface::{CameraHandle, FrameSource, FrameSourceOpener, OpenRequest};
pub use synthetic::{SyntheticCamera, SyntheticOpener};
