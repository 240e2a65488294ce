use super::types::IterationOutcome;
use crate::error::IterationError;

/// Control loop counters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoopStats {
    pub iterations: u64,
    pub frames_dropped: u64,
    pub no_hand: u64,
    pub applied: u64,
    pub rejected: u64,
    pub sink_failures: u64,
    pub detector_failures: u64,
    pub measurement_failures: u64,
    pub camera_reopens: u64,
    pub render_failures: u64,
    pub last_level: Option<f64>,
}

impl LoopStats {
    pub fn record_outcome(&mut self, outcome: &IterationOutcome) {
        match outcome {
            IterationOutcome::NoHand => self.no_hand += 1,
            IterationOutcome::Applied { level, .. } => {
                self.applied += 1;
                self.last_level = Some(*level);
            }
            IterationOutcome::Rejected { .. } => self.rejected += 1,
        }
    }

    pub fn record_error(&mut self, error: &IterationError) {
        match error {
            IterationError::Frame(_) => self.frames_dropped += 1,
            IterationError::Detection(_) => self.detector_failures += 1,
            IterationError::Measurement(_) => self.measurement_failures += 1,
            IterationError::Sink(_) => self.sink_failures += 1,
        }
    }

    /// Iterations that reached the landmark pass
    pub fn frames_processed(&self) -> u64 {
        self.iterations - self.frames_dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CameraError, SinkError};

    #[test]
    fn test_record_outcomes_and_errors() {
        let mut stats = LoopStats::default();
        stats.iterations = 4;
        stats.record_outcome(&IterationOutcome::NoHand);
        stats.record_outcome(&IterationOutcome::Applied {
            distance: 220.0,
            level: 0.0,
        });
        stats.record_error(&IterationError::Frame(CameraError::FrameUnavailable {
            details: "dropped".to_string(),
        }));
        stats.record_error(&IterationError::Sink(SinkError::WriteRejected {
            details: "busy".to_string(),
        }));

        assert_eq!(stats.no_hand, 1);
        assert_eq!(stats.applied, 1);
        assert_eq!(stats.last_level, Some(0.0));
        assert_eq!(stats.frames_dropped, 1);
        assert_eq!(stats.sink_failures, 1);
        assert_eq!(stats.frames_processed(), 3);
    }
}
