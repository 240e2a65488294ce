//! Hand landmark providers.
//!
//! The pose model itself lives outside this crate. A provider receives one
//! frame and reports every hand it found as normalized keypoints; the control
//! loop turns those into pixel-space [`HandObservation`]s.

mod command;
mod idle;

pub use command::CommandLandmarkProvider;
pub use idle::IdleProvider;

use crate::config::DetectorConfig;
use crate::error::{DetectionError, MeasurementError};
use crate::frame::Frame;
use crate::landmarks::{HandObservation, NormalizedLandmark};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One hand as reported by a provider, in provider order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DetectedHand {
    pub landmarks: Vec<NormalizedLandmark>,
}

impl DetectedHand {
    pub fn new(landmarks: Vec<NormalizedLandmark>) -> Self {
        Self { landmarks }
    }

    /// Pixel-space observation of this hand in `frame`
    pub fn observe(&self, frame: &Frame) -> Result<HandObservation, MeasurementError> {
        HandObservation::from_normalized(&self.landmarks, frame.width, frame.height)
    }
}

/// Hand-pose estimator consumed by the control loop.
#[async_trait]
pub trait LandmarkProvider: Send {
    /// Run one landmark pass. An empty result means no hand in the frame.
    async fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedHand>, DetectionError>;

    /// Release provider resources
    async fn shutdown(&mut self) {}

    /// Provider identifier for logs
    fn name(&self) -> &str;
}

/// Build the provider named by the configuration
pub fn provider_for(config: &DetectorConfig) -> Result<Box<dyn LandmarkProvider>, DetectionError> {
    if config.command.is_empty() {
        warn!("No landmark provider command configured; hands will never be detected");
        return Ok(Box::new(IdleProvider));
    }

    Ok(Box::new(CommandLandmarkProvider::spawn(
        &config.command,
        config.convert_to_rgb,
    )?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameFormat;
    use crate::landmarks::hand_with_tips;
    use std::time::SystemTime;

    #[test]
    fn test_observe_scales_to_frame() {
        let frame = Frame::new(0, SystemTime::now(), vec![0; 200 * 100 * 3], 200, 100, FrameFormat::Rgb24);
        let hand = DetectedHand::new(hand_with_tips((0.1, 0.1), (0.9, 0.9)));

        let observation = hand.observe(&frame).unwrap();
        assert_eq!(observation.thumb_tip().x, 20);
        assert_eq!(observation.index_tip().y, 90);
    }

    #[test]
    fn test_observe_rejects_partial_hand() {
        let frame = Frame::new(0, SystemTime::now(), vec![0; 3], 1, 1, FrameFormat::Rgb24);
        let hand = DetectedHand::new(vec![NormalizedLandmark::new(0.1, 0.1); 5]);

        assert!(matches!(
            hand.observe(&frame),
            Err(MeasurementError::TopologyMismatch { actual: 5, .. })
        ));
    }

    #[test]
    fn test_detected_hand_accepts_arrays_and_objects() {
        let from_arrays: DetectedHand = serde_json::from_str("[[0.1, 0.2], [0.3, 0.4, -0.05]]").unwrap();
        assert_eq!(from_arrays.landmarks[0], NormalizedLandmark::new(0.1, 0.2));
        assert_eq!(from_arrays.landmarks[1].z, Some(-0.05));

        let from_objects: DetectedHand =
            serde_json::from_str(r#"[{"x": 0.1, "y": 0.2}]"#).unwrap();
        assert_eq!(from_objects.landmarks[0], NormalizedLandmark::new(0.1, 0.2));
    }

    #[tokio::test]
    async fn test_empty_command_uses_idle_provider() {
        let config = DetectorConfig {
            command: Vec::new(),
            convert_to_rgb: true,
        };
        let mut provider = provider_for(&config).unwrap();
        let frame = Frame::new(0, SystemTime::now(), vec![0; 3], 1, 1, FrameFormat::Rgb24);

        assert_eq!(provider.name(), "idle");
        assert!(provider.detect(&frame).await.unwrap().is_empty());
    }
}
