use std::fmt;

/// Control loop lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Starting,
    Running,
    Draining,
    Stopped,
}

/// Why the loop was asked to stop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    Signal(String),
    UserRequest,
    IterationLimit(u64),
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::Signal(name) => write!(f, "received {}", name),
            ShutdownReason::UserRequest => write!(f, "user requested via keyboard"),
            ShutdownReason::IterationLimit(n) => write!(f, "iteration limit of {} reached", n),
        }
    }
}

/// Result of one completed iteration
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IterationOutcome {
    /// No hand in the frame, volume untouched
    NoHand,
    /// Volume written to the sink
    Applied { distance: f64, level: f64 },
    /// Measurement outside the calibration window under the reject policy
    Rejected { distance: f64 },
}
