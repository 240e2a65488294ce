use super::{ControlLoop, IterationOutcome, ShutdownReason};
use crate::camera::CameraHandle;
use crate::display::Overlay;
use crate::error::{CameraError, IterationError, Result, SinkError};
use crate::frame::Frame;
use crate::mapper::MappingOutcome;
use crate::measurement::{measure_frame, Measurement};
use tokio::time::sleep;
use tracing::{debug, info, trace, warn};

impl ControlLoop {
    /// Start, run until a stop is requested, shut down.
    ///
    /// Returns the process exit code. Startup failures are returned as errors
    /// after the loop has reached `Stopped`.
    pub async fn run(&mut self) -> Result<i32> {
        self.start().await?;
        self.run_loop().await;
        self.shutdown().await
    }

    /// Iterate until the stop signal is seen at the pacing checkpoint
    pub(super) async fn run_loop(&mut self) {
        loop {
            self.stats.iterations += 1;

            match self.run_iteration().await {
                Ok(outcome) => {
                    trace!("Iteration {}: {:?}", self.stats.iterations, outcome);
                    self.stats.record_outcome(&outcome);
                }
                Err(e) => self.recover(e).await,
            }

            if let Some(limit) = self.max_iterations {
                if self.stats.iterations >= limit {
                    self.stop.request(ShutdownReason::IterationLimit(limit));
                }
            }

            sleep(self.frame_interval).await;

            if self.stop.is_requested() {
                break;
            }
        }
    }

    /// One pass: frame, landmarks, measurement, mapping, sink write, overlay
    pub(super) async fn run_iteration(
        &mut self,
    ) -> std::result::Result<IterationOutcome, IterationError> {
        let frame = self.read_frame().await?;
        self.misses.record_frame();

        let detected = self.context.provider.detect(&frame).await?;
        let measurement = measure_frame(&detected, &frame)?;

        let result = match measurement {
            Some(m) => self.apply(&m).await,
            None => Ok(IterationOutcome::NoHand),
        };

        self.render(&frame, measurement).await;
        result
    }

    async fn read_frame(&mut self) -> std::result::Result<Frame, CameraError> {
        let camera = self.camera.as_mut().ok_or(CameraError::Closed)?;
        let frame = camera.read().await?;

        if !self.resolution_logged
            && (frame.width, frame.height) != (self.open_request.width, self.open_request.height)
        {
            info!(
                "Camera delivers {}x{} instead of the requested {}x{}; using delivered size",
                frame.width, frame.height, self.open_request.width, self.open_request.height
            );
            self.resolution_logged = true;
        }

        Ok(frame)
    }

    async fn apply(
        &mut self,
        measurement: &Measurement,
    ) -> std::result::Result<IterationOutcome, IterationError> {
        let mapper = self.mapper.ok_or_else(|| SinkError::Unavailable {
            details: "volume range was never queried".to_string(),
        })?;

        match mapper.map(measurement.distance) {
            MappingOutcome::Target(level) => {
                self.context.sink.set_level(level).await?;
                debug!("Pinch {:.1}px -> volume {:.2}", measurement.distance, level);
                Ok(IterationOutcome::Applied {
                    distance: measurement.distance,
                    level,
                })
            }
            MappingOutcome::Rejected { distance } => {
                warn!(
                    "Pinch {:.1}px outside calibration window [{}, {}]; volume unchanged",
                    distance,
                    mapper.window().low(),
                    mapper.window().high()
                );
                Ok(IterationOutcome::Rejected { distance })
            }
        }
    }

    /// Refresh the displayed level from the sink and draw the overlay
    async fn render(&mut self, frame: &Frame, measurement: Option<Measurement>) {
        let volume = match self.context.sink.current_level().await {
            Ok(level) => Some(level),
            Err(e) => {
                debug!("Could not read current volume: {}", e);
                None
            }
        };

        let overlay = Overlay {
            frame_id: frame.id,
            state: self.state,
            measurement,
            volume,
            range: self.range,
        };

        if let Err(e) = self.context.display.present(frame, &overlay) {
            self.stats.render_failures += 1;
            debug!("Display render failed: {}", e);
        }
    }

    /// Loop-boundary handling for every recoverable iteration error
    async fn recover(&mut self, error: IterationError) {
        self.stats.record_error(&error);

        match &error {
            IterationError::Frame(e) => {
                if self.misses.consecutive_misses() == 0 {
                    warn!("Frame dropped: {}", e);
                } else {
                    debug!("Frame dropped: {}", e);
                }
                if self.misses.record_miss() {
                    self.reopen_camera().await;
                }
            }
            IterationError::Detection(e) => warn!("Landmark pass failed: {}", e),
            IterationError::Measurement(e) => warn!("Discarding hand observation: {}", e),
            IterationError::Sink(e) => warn!("Volume update failed: {}", e),
        }
    }

    /// Close the stalled device and try to open it again once
    async fn reopen_camera(&mut self) {
        self.stats.camera_reopens += 1;
        warn!("Camera {} stalled, reopening", self.open_request.index);

        if let Some(mut camera) = self.camera.take() {
            camera.release();
        }

        match self.context.opener.open(&self.open_request).await {
            Ok(source) => {
                let camera = CameraHandle::new(source);
                info!("Camera {} reopened", camera.description());
                self.camera = Some(camera);
            }
            Err(e) => warn!("Camera reopen failed: {}", e),
        }
    }
}
