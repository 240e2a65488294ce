use super::{DetectedHand, LandmarkProvider};
use crate::error::DetectionError;
use crate::frame::Frame;
use async_trait::async_trait;
use serde::Deserialize;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, trace, warn};

/// One reply line from the provider process
#[derive(Debug, Deserialize)]
struct ProviderReply {
    #[serde(default)]
    hands: Vec<DetectedHand>,
    #[serde(default)]
    error: Option<String>,
}

/// Landmark provider running as a child process.
///
/// Per frame the child receives a header line
/// `FRAME <id> <width> <height> <format> <byte_len>` followed by the raw
/// pixel bytes on stdin, and answers with one JSON line on stdout:
/// `{"hands": [[[x, y, z], ...], ...]}`.
pub struct CommandLandmarkProvider {
    program: String,
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    convert_to_rgb: bool,
    line: String,
}

impl CommandLandmarkProvider {
    /// Spawn the provider process
    pub fn spawn(command: &[String], convert_to_rgb: bool) -> Result<Self, DetectionError> {
        let (program, args) = command.split_first().ok_or_else(|| DetectionError::Spawn {
            details: "empty command line".to_string(),
        })?;

        info!("Starting landmark provider: {}", command.join(" "));

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DetectionError::Spawn {
                details: format!("{}: {}", program, e),
            })?;

        let stdin = child.stdin.take().ok_or_else(|| DetectionError::Spawn {
            details: "child stdin not captured".to_string(),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| DetectionError::Spawn {
            details: "child stdout not captured".to_string(),
        })?;

        Ok(Self {
            program: program.clone(),
            child,
            stdin,
            stdout: BufReader::new(stdout),
            convert_to_rgb,
            line: String::new(),
        })
    }

    fn io_error(e: std::io::Error) -> DetectionError {
        if e.kind() == std::io::ErrorKind::BrokenPipe {
            DetectionError::Exited
        } else {
            DetectionError::Io {
                details: e.to_string(),
            }
        }
    }

    async fn send_frame(&mut self, frame: &Frame) -> Result<(), DetectionError> {
        let header = format!(
            "FRAME {} {} {} {} {}\n",
            frame.id,
            frame.width,
            frame.height,
            frame.format.tag(),
            frame.data.len()
        );

        self.stdin
            .write_all(header.as_bytes())
            .await
            .map_err(Self::io_error)?;
        self.stdin
            .write_all(frame.data.as_slice())
            .await
            .map_err(Self::io_error)?;
        self.stdin.flush().await.map_err(Self::io_error)
    }

    async fn read_reply(&mut self) -> Result<Vec<DetectedHand>, DetectionError> {
        self.line.clear();
        let read = self
            .stdout
            .read_line(&mut self.line)
            .await
            .map_err(Self::io_error)?;

        if read == 0 {
            return Err(DetectionError::Exited);
        }

        parse_reply(&self.line)
    }
}

/// Parse one provider reply line
fn parse_reply(line: &str) -> Result<Vec<DetectedHand>, DetectionError> {
    let reply: ProviderReply =
        serde_json::from_str(line.trim()).map_err(|e| DetectionError::Protocol {
            details: e.to_string(),
        })?;

    match reply.error {
        Some(message) => Err(DetectionError::Protocol { details: message }),
        None => Ok(reply.hands),
    }
}

#[async_trait]
impl LandmarkProvider for CommandLandmarkProvider {
    async fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedHand>, DetectionError> {
        if self.convert_to_rgb {
            let rgb = frame.to_rgb();
            self.send_frame(&rgb).await?;
        } else {
            self.send_frame(frame).await?;
        }

        let hands = self.read_reply().await?;
        trace!("Provider reported {} hand(s) for frame {}", hands.len(), frame.id);
        Ok(hands)
    }

    async fn shutdown(&mut self) {
        debug!("Stopping landmark provider {}", self.program);
        if let Err(e) = self.child.start_kill() {
            warn!("Failed to stop landmark provider {}: {}", self.program, e);
            return;
        }
        match self.child.wait().await {
            Ok(status) => info!("Landmark provider {} exited: {}", self.program, status),
            Err(e) => warn!("Failed to reap landmark provider {}: {}", self.program, e),
        }
    }

    fn name(&self) -> &str {
        &self.program
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameFormat;
    use std::time::SystemTime;

    #[test]
    fn test_parse_reply_with_hands() {
        let hands = parse_reply(r#"{"hands": [[[0.1, 0.2, 0.0], [0.3, 0.4]]]}"#).unwrap();
        assert_eq!(hands.len(), 1);
        assert_eq!(hands[0].landmarks.len(), 2);
        assert_eq!(hands[0].landmarks[1].x, 0.3);
    }

    #[test]
    fn test_parse_reply_empty_and_error() {
        assert!(parse_reply("{\"hands\": []}\n").unwrap().is_empty());
        assert!(parse_reply("{}").unwrap().is_empty());
        assert_eq!(
            parse_reply(r#"{"error": "model not loaded"}"#),
            Err(DetectionError::Protocol {
                details: "model not loaded".to_string()
            })
        );
        assert!(matches!(
            parse_reply("not json"),
            Err(DetectionError::Protocol { .. })
        ));
    }

    #[tokio::test]
    async fn test_spawn_missing_program() {
        let result = CommandLandmarkProvider::spawn(
            &["/nonexistent/pinchvol-provider".to_string()],
            true,
        );
        assert!(matches!(result, Err(DetectionError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_round_trip_through_shell_provider() {
        // Reads the header, discards the pixels, answers with no hands
        let script = r#"while read -r tag id w h fmt len; do dd bs=1 count="$len" of=/dev/null 2>/dev/null; echo '{"hands": []}'; done"#;
        let mut provider =
            CommandLandmarkProvider::spawn(&["sh".to_string(), "-c".to_string(), script.to_string()], true)
                .unwrap();

        let frame = Frame::new(3, SystemTime::now(), vec![7u8; 4 * 2 * 3], 4, 2, FrameFormat::Bgr24);
        for _ in 0..3 {
            assert!(provider.detect(&frame).await.unwrap().is_empty());
        }

        provider.shutdown().await;
    }
}
