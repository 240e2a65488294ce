//! The control loop: startup, frame-paced iterations, shutdown.

mod keyboard_input;
mod orchestrator;
mod runtime;
mod shutdown;
mod startup;
mod state;
mod stats;
mod stop;
mod types;


pub use keyboard_input::KeyboardInputHandler;
pub use orchestrator::{ControlContext, ControlLoop};
pub use shutdown::install_signal_handlers;
pub use stats::LoopStats;
pub use stop::StopSignal;
pub use types::{IterationOutcome, LoopState, ShutdownReason};
