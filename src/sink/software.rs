use super::VolumeSink;
use crate::error::SinkError;
use crate::mapper::VolumeRange;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
struct SoftwareState {
    level: f64,
    writes: u64,
}

/// In-process volume level, used when no OS mixer is wired up
pub struct SoftwareVolumeSink {
    range: VolumeRange,
    state: Arc<Mutex<SoftwareState>>,
}

impl SoftwareVolumeSink {
    /// Start at the top of the range
    pub fn new(range: VolumeRange) -> Self {
        Self {
            range,
            state: Arc::new(Mutex::new(SoftwareState {
                level: range.max(),
                writes: 0,
            })),
        }
    }

    /// Read-only view on the level that stays valid after the sink is moved
    /// into the control loop
    pub fn handle(&self) -> SoftwareVolumeHandle {
        SoftwareVolumeHandle {
            state: Arc::clone(&self.state),
        }
    }
}

#[async_trait]
impl VolumeSink for SoftwareVolumeSink {
    async fn range(&mut self) -> Result<VolumeRange, SinkError> {
        Ok(self.range)
    }

    async fn set_level(&mut self, level: f64) -> Result<(), SinkError> {
        if !level.is_finite() || level < self.range.min() || level > self.range.max() {
            return Err(SinkError::WriteRejected {
                details: format!(
                    "level {} outside [{}, {}]",
                    level,
                    self.range.min(),
                    self.range.max()
                ),
            });
        }

        let mut state = self.state.lock();
        state.level = level;
        state.writes += 1;
        debug!("Software volume set to {:.2}", level);
        Ok(())
    }

    async fn current_level(&mut self) -> Result<f64, SinkError> {
        Ok(self.state.lock().level)
    }

    fn describe(&self) -> String {
        format!("software [{}, {}]", self.range.min(), self.range.max())
    }
}

/// Shared view on a [`SoftwareVolumeSink`]
#[derive(Clone)]
pub struct SoftwareVolumeHandle {
    state: Arc<Mutex<SoftwareState>>,
}

impl SoftwareVolumeHandle {
    pub fn level(&self) -> f64 {
        self.state.lock().level
    }

    pub fn writes(&self) -> u64 {
        self.state.lock().writes
    }
}
