use super::stop::StopSignal;
use super::{ControlLoop, LoopState, ShutdownReason};
use crate::error::Result;
use tracing::{info, warn};

impl ControlLoop {
    /// Drain and stop after the loop has observed the stop signal
    pub async fn shutdown(&mut self) -> Result<i32> {
        self.set_state(LoopState::Draining);
        match self.stop.reason() {
            Some(reason) => info!("Shutdown initiated: {}", reason),
            None => info!("Shutdown initiated"),
        }

        if let Some(mut keyboard_handler) = self.keyboard_handler.take() {
            keyboard_handler.stop().await;
        }

        self.release_resources().await;
        self.set_state(LoopState::Stopped);

        let stats = &self.stats;
        info!(
            iterations = stats.iterations,
            frames_dropped = stats.frames_dropped,
            no_hand = stats.no_hand,
            applied = stats.applied,
            rejected = stats.rejected,
            sink_failures = stats.sink_failures,
            detector_failures = stats.detector_failures,
            measurement_failures = stats.measurement_failures,
            camera_reopens = stats.camera_reopens,
            "Control loop stopped"
        );

        Ok(0)
    }

    /// Release provider, display and camera. Each is released at most once,
    /// whichever exit path gets here first.
    pub(super) async fn release_resources(&mut self) {
        if !self.provider_released {
            self.provider_released = true;
            info!("Stopping landmark provider {}", self.context.provider.name());
            self.context.provider.shutdown().await;
        }

        if !self.display_released {
            self.display_released = true;
            self.context.display.close();
        }

        if let Some(mut camera) = self.camera.take() {
            camera.release();
        }
    }
}

/// Route Ctrl+C and SIGTERM into the stop signal
pub fn install_signal_handlers(stop: &StopSignal) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let stop_sigterm = stop.clone();
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::spawn(async move {
                    if sigterm.recv().await.is_some() {
                        info!("Received SIGTERM signal");
                        stop_sigterm.request(ShutdownReason::Signal("SIGTERM".to_string()));
                    }
                });
            }
            Err(e) => warn!("Failed to register SIGTERM handler: {}", e),
        }
    }

    let stop_sigint = stop.clone();
    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            info!("Received SIGINT signal (Ctrl+C)");
            stop_sigint.request(ShutdownReason::Signal("SIGINT".to_string()));
        }
    });
}
