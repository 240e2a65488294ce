use crate::config::CameraConfig;
use crate::error::CameraError;
use crate::frame::Frame;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

/// Parameters for opening a camera device
#[derive(Debug, Clone, PartialEq)]
pub struct OpenRequest {
    /// Device index (e.g., 0 for /dev/video0)
    pub index: u32,
    /// Preferred frame width
    pub width: u32,
    /// Preferred frame height
    pub height: u32,
    /// Requested frame rate
    pub fps: u32,
    /// Upper bound for one blocking frame read
    pub read_timeout: Duration,
}

impl OpenRequest {
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            index: config.index,
            width: config.resolution.0,
            height: config.resolution.1,
            fps: config.fps,
            read_timeout: Duration::from_millis(config.read_timeout_ms),
        }
    }
}

/// An opened, streaming camera device.
#[async_trait]
pub trait FrameSource: Send {
    /// Pull the next frame. `CameraError::FrameUnavailable` is an expected,
    /// transient outcome.
    async fn read(&mut self) -> Result<Frame, CameraError>;

    /// Release the underlying device.
    fn close(&mut self);

    /// Human readable description for logs
    fn describe(&self) -> String;
}

/// Factory for [`FrameSource`]s.
///
/// Implementations must only return a source once the device is actually
/// streaming; a device that was constructed but never produced data is
/// reported as `CameraError::DeviceUnavailable`.
#[async_trait]
pub trait FrameSourceOpener: Send + Sync {
    async fn open(&self, request: &OpenRequest) -> Result<Box<dyn FrameSource>, CameraError>;
}

/// Owning handle around an open [`FrameSource`].
///
/// `close` on the wrapped source runs exactly once: on the first call to
/// [`CameraHandle::release`], or when the handle is dropped.
pub struct CameraHandle {
    source: Option<Box<dyn FrameSource>>,
    description: String,
}

impl CameraHandle {
    pub fn new(source: Box<dyn FrameSource>) -> Self {
        let description = source.describe();
        Self {
            source: Some(source),
            description,
        }
    }

    /// Read the next frame from the open device
    pub async fn read(&mut self) -> Result<Frame, CameraError> {
        match self.source.as_mut() {
            Some(source) => source.read().await,
            None => Err(CameraError::Closed),
        }
    }

    /// Close the device. Later calls are no-ops.
    pub fn release(&mut self) {
        if let Some(mut source) = self.source.take() {
            info!("Releasing camera {}", self.description);
            source.close();
        } else {
            debug!("Camera {} already released", self.description);
        }
    }

    pub fn is_open(&self) -> bool {
        self.source.is_some()
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl Drop for CameraHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for CameraHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraHandle")
            .field("description", &self.description)
            .field("open", &self.is_open())
            .finish()
    }
}
