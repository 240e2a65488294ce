use super::interface::{CameraHandle, FrameSourceOpener, OpenRequest};
use super::synthetic::SyntheticOpener;
use crate::config::CameraConfig;
use crate::error::{CameraError, PinchvolError, Result};
use crate::recovery::RetryPolicy;
use tracing::info;

/// Select the frame source backend named by the configuration
pub fn opener_for(config: &CameraConfig) -> Result<Box<dyn FrameSourceOpener>> {
    match config.kind.as_str() {
        "synthetic" => Ok(Box::new(SyntheticOpener)),
        "gstreamer" => gstreamer_opener(),
        other => Err(PinchvolError::Camera(CameraError::Configuration {
            details: format!("Unknown camera kind '{}'", other),
        })),
    }
}

#[cfg(all(feature = "camera", target_os = "linux"))]
fn gstreamer_opener() -> Result<Box<dyn FrameSourceOpener>> {
    Ok(Box::new(super::gst::GstOpener))
}

#[cfg(not(all(feature = "camera", target_os = "linux")))]
fn gstreamer_opener() -> Result<Box<dyn FrameSourceOpener>> {
    Err(PinchvolError::Camera(CameraError::Configuration {
        details: "GStreamer capture requires the `camera` feature on Linux; use camera.kind = \"synthetic\""
            .to_string(),
    }))
}

/// Open a camera, retrying per `policy`. Exhausting the attempts yields
/// `CameraError::DeviceUnavailable`.
pub async fn open_with_retry(
    opener: &dyn FrameSourceOpener,
    request: &OpenRequest,
    policy: &RetryPolicy,
) -> std::result::Result<CameraHandle, CameraError> {
    let source = policy
        .run("camera open", |attempt| async move {
            info!(
                "Opening camera {} (attempt {}/{})",
                request.index, attempt, policy.max_attempts
            );
            opener.open(request).await
        })
        .await
        .map_err(|e| match e {
            CameraError::DeviceUnavailable { .. } => e,
            other => CameraError::DeviceUnavailable {
                device: request.index,
                details: other.to_string(),
            },
        })?;

    let handle = CameraHandle::new(source);
    info!("Camera {} opened", handle.description());
    Ok(handle)
}
