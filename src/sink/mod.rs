//! Audio endpoint volume control.

mod alsa;
mod software;

pub use alsa::AlsaMixerSink;
pub use software::{SoftwareVolumeHandle, SoftwareVolumeSink};

use crate::config::SinkConfig;
use crate::error::{CalibrationError, SinkError};
use crate::mapper::VolumeRange;
use async_trait::async_trait;

/// Volume endpoint driven by the control loop. The loop is open-loop: the
/// current level is read for display only.
#[async_trait]
pub trait VolumeSink: Send {
    /// Valid level interval in the sink's native unit
    async fn range(&mut self) -> Result<VolumeRange, SinkError>;

    /// Apply a level inside [`VolumeSink::range`]
    async fn set_level(&mut self, level: f64) -> Result<(), SinkError>;

    /// Level currently applied by the endpoint
    async fn current_level(&mut self) -> Result<f64, SinkError>;

    /// Human readable description for logs
    fn describe(&self) -> String;
}

/// Build the sink named by the configuration
pub fn sink_for(config: &SinkConfig) -> Result<Box<dyn VolumeSink>, SinkError> {
    match config.kind.as_str() {
        "software" => {
            let (min, max) = config.software_range;
            let range = VolumeRange::new(min, max).map_err(range_error)?;
            Ok(Box::new(SoftwareVolumeSink::new(range)))
        }
        "alsa" => Ok(Box::new(AlsaMixerSink::new(
            &config.alsa_card,
            &config.alsa_control,
        ))),
        other => Err(SinkError::Unavailable {
            details: format!("Unknown sink kind '{}'", other),
        }),
    }
}

fn range_error(e: CalibrationError) -> SinkError {
    SinkError::Unavailable {
        details: e.to_string(),
    }
}
