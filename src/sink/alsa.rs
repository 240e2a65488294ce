use super::VolumeSink;
use crate::error::SinkError;
use crate::mapper::VolumeRange;
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

/// ALSA simple mixer control driven through `amixer`.
///
/// Levels are raw mixer steps as reported by `Limits: Playback <min> - <max>`.
pub struct AlsaMixerSink {
    card: String,
    control: String,
}

impl AlsaMixerSink {
    pub fn new(card: &str, control: &str) -> Self {
        Self {
            card: card.to_string(),
            control: control.to_string(),
        }
    }

    async fn amixer(&self, args: &[&str]) -> Result<String, SinkError> {
        let output = Command::new("amixer")
            .arg("-D")
            .arg(&self.card)
            .args(args)
            .output()
            .await
            .map_err(|e| SinkError::Unavailable {
                details: format!("failed to run amixer: {}", e),
            })?;

        if !output.status.success() {
            return Err(SinkError::Unavailable {
                details: format!(
                    "amixer {} exited with {}: {}",
                    args.join(" "),
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn sget(&self) -> Result<String, SinkError> {
        self.amixer(&["sget", &self.control]).await
    }
}

#[async_trait]
impl VolumeSink for AlsaMixerSink {
    async fn range(&mut self) -> Result<VolumeRange, SinkError> {
        let report = self.sget().await?;
        let (min, max) = parse_limits(&report).ok_or_else(|| SinkError::Unavailable {
            details: format!("no playback limits reported for '{}'", self.control),
        })?;

        info!(
            "ALSA control {} on {} has range {} - {}",
            self.control, self.card, min, max
        );

        VolumeRange::new(min, max).map_err(|e| SinkError::Unavailable {
            details: e.to_string(),
        })
    }

    async fn set_level(&mut self, level: f64) -> Result<(), SinkError> {
        if !level.is_finite() {
            return Err(SinkError::WriteRejected {
                details: format!("non-finite level {}", level),
            });
        }

        let steps = format!("{}", level.round() as i64);
        debug!("Setting ALSA control {} to {}", self.control, steps);

        self.amixer(&["-q", "sset", &self.control, &steps])
            .await
            .map_err(|e| SinkError::WriteRejected {
                details: e.to_string(),
            })?;
        Ok(())
    }

    async fn current_level(&mut self) -> Result<f64, SinkError> {
        let report = self.sget().await.map_err(|e| SinkError::ReadFailed {
            details: e.to_string(),
        })?;

        parse_current(&report).ok_or_else(|| SinkError::ReadFailed {
            details: format!("no playback level reported for '{}'", self.control),
        })
    }

    fn describe(&self) -> String {
        format!("alsa {}:{}", self.card, self.control)
    }
}

/// `  Limits: Playback 0 - 87` -> (0, 87)
fn parse_limits(report: &str) -> Option<(f64, f64)> {
    report.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("Limits:")?;
        let rest = rest.trim().trim_start_matches("Playback").trim();
        let (min, max) = rest.split_once('-')?;
        Some((min.trim().parse().ok()?, max.trim().parse().ok()?))
    })
}

/// First channel line, e.g. `  Front Left: Playback 60 [69%] [-20.25dB] [on]` -> 60
fn parse_current(report: &str) -> Option<f64> {
    report.lines().find_map(|line| {
        let line = line.trim();
        if line.starts_with("Limits:") || line.starts_with("Playback channels:") {
            return None;
        }
        let (_, rest) = line.split_once(": Playback ")?;
        rest.split_whitespace().next()?.parse().ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONO: &str = "Simple mixer control 'Master',0
  Capabilities: pvolume pvolume-joined pswitch pswitch-joined
  Playback channels: Mono
  Limits: Playback 0 - 87
  Mono: Playback 60 [69%] [-20.25dB] [on]
";

    const STEREO: &str = "Simple mixer control 'Master',0
  Capabilities: pvolume pswitch pswitch-joined
  Playback channels: Front Left - Front Right
  Limits: Playback 0 - 65536
  Mono:
  Front Left: Playback 32768 [50%] [on]
  Front Right: Playback 32768 [50%] [on]
";

    #[test]
    fn test_parse_limits() {
        assert_eq!(parse_limits(MONO), Some((0.0, 87.0)));
        assert_eq!(parse_limits(STEREO), Some((0.0, 65536.0)));
        assert_eq!(parse_limits("Simple mixer control 'Capture',0"), None);
    }

    #[test]
    fn test_parse_current() {
        assert_eq!(parse_current(MONO), Some(60.0));
        assert_eq!(parse_current(STEREO), Some(32768.0));
        assert_eq!(parse_current("  Mono:\n"), None);
    }

    #[tokio::test]
    async fn test_set_level_on_missing_card_is_rejected() {
        let mut sink = AlsaMixerSink::new("pinchvol-no-such-card", "Master");

        let result = sink.set_level(40.0).await;
        assert!(matches!(result, Err(SinkError::WriteRejected { .. })));
    }

    #[tokio::test]
    async fn test_set_level_rejects_non_finite() {
        let mut sink = AlsaMixerSink::new("default", "Master");

        let result = sink.set_level(f64::NAN).await;
        assert!(matches!(result, Err(SinkError::WriteRejected { .. })));
    }
}
