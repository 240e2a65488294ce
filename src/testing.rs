//! Scripted collaborators for control loop tests.

use crate::camera::{FrameSource, FrameSourceOpener, OpenRequest};
use crate::config::PinchvolConfig;
use crate::detector::{DetectedHand, LandmarkProvider};
use crate::display::{Display, Overlay};
use crate::error::{CameraError, DetectionError, SinkError};
use crate::frame::{Frame, FrameFormat};
use crate::landmarks::hand_with_tips;
use crate::mapper::VolumeRange;
use crate::sink::VolumeSink;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::time::SystemTime;

/// Side length of the square frames produced by [`ScriptedOpener`]
pub const FRAME_SIZE: u32 = 440;

/// Configuration tuned for fast, hardware-free loop runs
pub fn test_config(max_iterations: u64) -> PinchvolConfig {
    let mut config = PinchvolConfig::default();
    config.camera.kind = "synthetic".to_string();
    config.camera.resolution = (FRAME_SIZE, FRAME_SIZE);
    config.camera.retry_delay_ms = 1;
    config.camera.max_retry_delay_ms = 1;
    config.control.frame_interval_ms = 1;
    config.control.max_iterations = Some(max_iterations);
    config.control.keyboard = false;
    config
}

/// Hand whose thumb sits at the origin and whose index tip sits
/// `pinch_px` pixels to the right in a [`FRAME_SIZE`] frame
pub fn hand_with_pinch(pinch_px: u32) -> DetectedHand {
    let x = pinch_px as f64 / FRAME_SIZE as f64;
    DetectedHand::new(hand_with_tips((0.0, 0.0), (x, 0.0)))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReadStep {
    Frame,
    Unavailable,
}

#[derive(Debug, Default)]
pub struct CameraLog {
    pub open_attempts: u32,
    pub opens: u32,
    pub closes: u32,
    pub reads: u32,
}

/// Opener whose first `failures` opens fail, and whose cameras follow a
/// shared read script (frames once the script runs out)
#[derive(Clone, Default)]
pub struct ScriptedOpener {
    pub log: Arc<Mutex<CameraLog>>,
    failures: Arc<Mutex<u32>>,
    reads: Arc<Mutex<VecDeque<ReadStep>>>,
}

impl ScriptedOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_opens(self, failures: u32) -> Self {
        *self.failures.lock() = failures;
        self
    }

    pub fn with_reads(self, steps: impl IntoIterator<Item = ReadStep>) -> Self {
        self.reads.lock().extend(steps);
        self
    }
}

#[async_trait]
impl FrameSourceOpener for ScriptedOpener {
    async fn open(&self, request: &OpenRequest) -> Result<Box<dyn FrameSource>, CameraError> {
        self.log.lock().open_attempts += 1;

        {
            let mut failures = self.failures.lock();
            if *failures > 0 {
                *failures -= 1;
                return Err(CameraError::DeviceUnavailable {
                    device: request.index,
                    details: "scripted open failure".to_string(),
                });
            }
        }

        self.log.lock().opens += 1;
        Ok(Box::new(ScriptedCamera {
            log: Arc::clone(&self.log),
            reads: Arc::clone(&self.reads),
            next_id: 0,
        }))
    }
}

struct ScriptedCamera {
    log: Arc<Mutex<CameraLog>>,
    reads: Arc<Mutex<VecDeque<ReadStep>>>,
    next_id: u64,
}

#[async_trait]
impl FrameSource for ScriptedCamera {
    async fn read(&mut self) -> Result<Frame, CameraError> {
        self.log.lock().reads += 1;
        let step = self.reads.lock().pop_front().unwrap_or(ReadStep::Frame);

        match step {
            ReadStep::Frame => {
                self.next_id += 1;
                let size = (FRAME_SIZE * FRAME_SIZE * 3) as usize;
                Ok(Frame::new(
                    self.next_id,
                    SystemTime::now(),
                    vec![0u8; size],
                    FRAME_SIZE,
                    FRAME_SIZE,
                    FrameFormat::Rgb24,
                ))
            }
            ReadStep::Unavailable => Err(CameraError::FrameUnavailable {
                details: "scripted drop".to_string(),
            }),
        }
    }

    fn close(&mut self) {
        self.log.lock().closes += 1;
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

#[derive(Debug, Default)]
pub struct ProviderLog {
    pub detections: u32,
    pub shutdowns: u32,
}

/// Provider replaying scripted replies, then `fallback` forever
pub struct ScriptedProvider {
    pub log: Arc<Mutex<ProviderLog>>,
    replies: VecDeque<Result<Vec<DetectedHand>, DetectionError>>,
    fallback: Vec<DetectedHand>,
}

impl ScriptedProvider {
    pub fn new(fallback: Vec<DetectedHand>) -> Self {
        Self {
            log: Arc::default(),
            replies: VecDeque::new(),
            fallback,
        }
    }

    pub fn with_replies(
        mut self,
        replies: impl IntoIterator<Item = Result<Vec<DetectedHand>, DetectionError>>,
    ) -> Self {
        self.replies.extend(replies);
        self
    }
}

#[async_trait]
impl LandmarkProvider for ScriptedProvider {
    async fn detect(&mut self, _frame: &Frame) -> Result<Vec<DetectedHand>, DetectionError> {
        self.log.lock().detections += 1;
        self.replies
            .pop_front()
            .unwrap_or_else(|| Ok(self.fallback.clone()))
    }

    async fn shutdown(&mut self) {
        self.log.lock().shutdowns += 1;
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[derive(Debug)]
pub struct SinkLog {
    pub level: f64,
    pub writes: Vec<f64>,
    pub range_queries: u32,
}

/// Sink recording every write, with optional failure injection
pub struct RecordingSink {
    pub log: Arc<Mutex<SinkLog>>,
    range: VolumeRange,
    fail_range: bool,
    fail_writes: bool,
}

impl RecordingSink {
    /// Sink over `min..max`, starting at `initial`
    pub fn new(min: f64, max: f64, initial: f64) -> Self {
        Self {
            log: Arc::new(Mutex::new(SinkLog {
                level: initial,
                writes: Vec::new(),
                range_queries: 0,
            })),
            range: VolumeRange::new(min, max).unwrap(),
            fail_range: false,
            fail_writes: false,
        }
    }

    pub fn failing_range(mut self) -> Self {
        self.fail_range = true;
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }
}

#[async_trait]
impl VolumeSink for RecordingSink {
    async fn range(&mut self) -> Result<VolumeRange, SinkError> {
        self.log.lock().range_queries += 1;
        if self.fail_range {
            return Err(SinkError::Unavailable {
                details: "scripted endpoint missing".to_string(),
            });
        }
        Ok(self.range)
    }

    async fn set_level(&mut self, level: f64) -> Result<(), SinkError> {
        if self.fail_writes {
            return Err(SinkError::WriteRejected {
                details: "scripted write failure".to_string(),
            });
        }
        let mut log = self.log.lock();
        log.level = level;
        log.writes.push(level);
        Ok(())
    }

    async fn current_level(&mut self) -> Result<f64, SinkError> {
        Ok(self.log.lock().level)
    }

    fn describe(&self) -> String {
        "recording".to_string()
    }
}

#[derive(Debug, Default)]
pub struct DisplayLog {
    pub overlays: Vec<Overlay>,
    pub closes: u32,
}

#[derive(Default)]
pub struct RecordingDisplay {
    pub log: Arc<Mutex<DisplayLog>>,
}

impl Display for RecordingDisplay {
    fn present(&mut self, _frame: &Frame, overlay: &Overlay) -> io::Result<()> {
        self.log.lock().overlays.push(overlay.clone());
        Ok(())
    }

    fn close(&mut self) {
        self.log.lock().closes += 1;
    }
}
