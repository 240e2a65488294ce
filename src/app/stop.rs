use super::types::ShutdownReason;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Cooperative stop request shared by the loop, the keyboard poller and the
/// signal handlers. The loop only looks at it at the pacing checkpoint.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    token: CancellationToken,
    reason: Arc<Mutex<Option<ShutdownReason>>>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. The first reason recorded wins.
    pub fn request(&self, reason: ShutdownReason) {
        let mut current = self.reason.lock();
        if current.is_none() {
            debug!("Stop requested: {}", reason);
            *current = Some(reason);
        }
        self.token.cancel();
    }

    pub fn is_requested(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn reason(&self) -> Option<ShutdownReason> {
        self.reason.lock().clone()
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}
