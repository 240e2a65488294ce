use super::{DetectedHand, LandmarkProvider};
use crate::error::DetectionError;
use crate::frame::Frame;
use async_trait::async_trait;

/// Provider that never reports a hand
#[derive(Debug, Default, Clone)]
pub struct IdleProvider;

#[async_trait]
impl LandmarkProvider for IdleProvider {
    async fn detect(&mut self, _frame: &Frame) -> Result<Vec<DetectedHand>, DetectionError> {
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        "idle"
    }
}
