use super::keyboard_input::KeyboardInputHandler;
use super::shutdown::install_signal_handlers;
use super::{ControlLoop, LoopState};
use crate::camera::open_with_retry;
use crate::error::{PinchvolError, Result};
use crate::mapper::VolumeMapper;
use tracing::{error, info};

impl ControlLoop {
    /// Acquire the camera and the volume range, then enter `Running`.
    ///
    /// Any failure is fatal: resources acquired so far are released and the
    /// loop goes straight to `Stopped`.
    pub async fn start(&mut self) -> Result<()> {
        info!("Starting control loop");

        if let Err(e) = self.acquire().await {
            error!("Startup failed: {}", e);
            self.release_resources().await;
            self.set_state(LoopState::Stopped);
            return Err(e);
        }

        if self.keyboard_enabled {
            let mut handler = KeyboardInputHandler::new(self.stop.clone());
            handler.start();
            self.keyboard_handler = Some(handler);
        }

        if self.signal_handling {
            install_signal_handlers(&self.stop);
        }

        self.set_state(LoopState::Running);
        info!("Control loop running");
        Ok(())
    }

    async fn acquire(&mut self) -> Result<()> {
        let camera = open_with_retry(self.context.opener.as_ref(), &self.open_request, &self.retry)
            .await?;
        self.camera = Some(camera);

        let range = self
            .context
            .sink
            .range()
            .await
            .map_err(|e| PinchvolError::startup(self.context.sink.describe(), e.to_string()))?;

        let mapper = VolumeMapper::new(self.window, range, self.policy);
        info!(
            "Mapping pinch [{}, {}] px onto {} [{}, {}] ({:?})",
            self.window.low(),
            self.window.high(),
            self.context.sink.describe(),
            range.min(),
            range.max(),
            self.policy
        );

        self.range = Some(range);
        self.mapper = Some(mapper);
        Ok(())
    }
}
