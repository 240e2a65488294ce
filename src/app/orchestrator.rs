use super::keyboard_input::KeyboardInputHandler;
use super::stats::LoopStats;
use super::stop::StopSignal;
use super::types::LoopState;
use crate::camera::{CameraHandle, FrameSourceOpener, OpenRequest};
use crate::config::PinchvolConfig;
use crate::detector::LandmarkProvider;
use crate::display::Display;
use crate::error::Result;
use crate::mapper::{CalibrationWindow, OutOfRangePolicy, VolumeMapper, VolumeRange};
use crate::recovery::{MissTracker, RetryPolicy};
use crate::sink::VolumeSink;
use std::time::Duration;

/// Collaborators driven by the control loop, built once by the caller
pub struct ControlContext {
    pub opener: Box<dyn FrameSourceOpener>,
    pub provider: Box<dyn LandmarkProvider>,
    pub sink: Box<dyn VolumeSink>,
    pub display: Box<dyn Display>,
}

/// Frame-paced gesture-to-volume controller
pub struct ControlLoop {
    pub(super) context: ControlContext,

    // Settings derived from configuration
    pub(super) open_request: OpenRequest,
    pub(super) retry: RetryPolicy,
    pub(super) window: CalibrationWindow,
    pub(super) policy: OutOfRangePolicy,
    pub(super) frame_interval: Duration,
    pub(super) max_iterations: Option<u64>,

    // Acquired during startup
    pub(super) camera: Option<CameraHandle>,
    pub(super) range: Option<VolumeRange>,
    pub(super) mapper: Option<VolumeMapper>,

    pub(super) misses: MissTracker,
    pub(super) resolution_logged: bool,
    pub(super) stats: LoopStats,

    // Lifecycle management
    pub(super) state: LoopState,
    pub(super) history: Vec<LoopState>,
    pub(super) stop: StopSignal,
    pub(super) keyboard_handler: Option<KeyboardInputHandler>,
    pub(super) keyboard_enabled: bool,
    pub(super) signal_handling: bool,
    pub(super) provider_released: bool,
    pub(super) display_released: bool,
}

impl ControlLoop {
    /// Create a loop for a validated configuration
    pub fn new(config: &PinchvolConfig, context: ControlContext) -> Result<Self> {
        let window = config.calibration_window()?;

        Ok(Self {
            context,
            open_request: OpenRequest::from_config(&config.camera),
            retry: RetryPolicy::from_camera_config(&config.camera),
            window,
            policy: config.mapping.policy,
            frame_interval: config.frame_interval(),
            max_iterations: config.control.max_iterations,
            camera: None,
            range: None,
            mapper: None,
            misses: MissTracker::new(config.camera.reopen_after_misses),
            resolution_logged: false,
            stats: LoopStats::default(),
            state: LoopState::Starting,
            history: vec![LoopState::Starting],
            stop: StopSignal::new(),
            keyboard_handler: None,
            keyboard_enabled: config.control.keyboard,
            signal_handling: true,
            provider_released: false,
            display_released: false,
        })
    }

    /// Enable or disable the terminal key listener
    pub fn set_keyboard_enabled(&mut self, enabled: bool) {
        self.keyboard_enabled = enabled;
    }

    /// Enable or disable the Ctrl+C / SIGTERM handlers
    pub fn set_signal_handling(&mut self, enabled: bool) {
        self.signal_handling = enabled;
    }

    /// Handle for requesting a stop from outside the loop
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    pub fn mapper(&self) -> Option<&VolumeMapper> {
        self.mapper.as_ref()
    }

    pub fn camera_open(&self) -> bool {
        self.camera.as_ref().is_some_and(CameraHandle::is_open)
    }
}
