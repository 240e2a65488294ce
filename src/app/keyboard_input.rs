use super::stop::StopSignal;
use super::types::ShutdownReason;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::time::Duration;
use tokio::task::{self, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Terminal key listener: `q`, `Esc` and `Ctrl+C` request a stop.
///
/// Runs on a blocking thread with the terminal in raw mode; the control loop
/// never waits on it.
pub struct KeyboardInputHandler {
    stop: StopSignal,
    cancellation_token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl KeyboardInputHandler {
    pub fn new(stop: StopSignal) -> Self {
        Self {
            stop,
            cancellation_token: CancellationToken::new(),
            task: None,
        }
    }

    /// Start listening for keys
    pub fn start(&mut self) {
        info!("Starting keyboard input handler - press q or Esc to quit");

        let stop = self.stop.clone();
        let cancellation_token = self.cancellation_token.clone();

        self.task = Some(task::spawn_blocking(move || {
            if let Err(e) = enable_raw_mode() {
                error!("Failed to enable raw mode for keyboard input: {}", e);
                return;
            }

            loop {
                if cancellation_token.is_cancelled() {
                    debug!("Keyboard input handler stopping");
                    break;
                }

                match event::poll(Duration::from_millis(100)) {
                    Ok(true) => {
                        if let Ok(Event::Key(key_event)) = event::read() {
                            if let Some(reason) = stop_reason(&key_event) {
                                info!("Quit key pressed - requesting shutdown");
                                stop.request(reason);
                                break;
                            }
                        }
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!("Error polling for keyboard events: {}", e);
                    }
                }
            }

            if let Err(e) = disable_raw_mode() {
                error!("Failed to disable raw mode: {}", e);
            }
            debug!("Keyboard input handler task exited");
        }));
    }

    /// Stop listening and restore the terminal
    pub async fn stop(&mut self) {
        info!("Stopping keyboard input handler");
        self.cancellation_token.cancel();

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Keyboard input task ended abnormally: {}", e);
            }
        }

        // Restore the terminal even if the poller panicked
        let _ = disable_raw_mode();
    }
}

/// Raw mode swallows SIGINT, so Ctrl+C arrives as a key event
fn stop_reason(key: &KeyEvent) -> Option<ShutdownReason> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Some(ShutdownReason::UserRequest),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(ShutdownReason::Signal("SIGINT".to_string()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quit_keys() {
        let q = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        let esc = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        let c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE);

        assert_eq!(stop_reason(&q), Some(ShutdownReason::UserRequest));
        assert_eq!(stop_reason(&esc), Some(ShutdownReason::UserRequest));
        assert_eq!(
            stop_reason(&ctrl_c),
            Some(ShutdownReason::Signal("SIGINT".to_string()))
        );
        assert_eq!(stop_reason(&c), None);
    }

    #[tokio::test]
    async fn test_keyboard_handler_stop_without_start() {
        let stop = StopSignal::new();
        let mut handler = KeyboardInputHandler::new(stop.clone());

        handler.stop().await;
        assert!(handler.cancellation_token.is_cancelled());
        assert!(!stop.is_requested());
    }
}
