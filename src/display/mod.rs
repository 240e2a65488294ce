//! Overlay presentation for the control loop.

mod overlay;
mod terminal;

pub use overlay::Overlay;
pub use terminal::TerminalDisplay;

use crate::config::DisplayConfig;
use crate::frame::Frame;
use std::io;

/// Renders a frame together with its annotations.
///
/// Render failures are reported to the loop, which logs them and carries on.
pub trait Display: Send {
    fn present(&mut self, frame: &Frame, overlay: &Overlay) -> io::Result<()>;

    /// Release the output. Called once when the loop stops.
    fn close(&mut self);
}

/// Display that drops everything
#[derive(Debug, Default)]
pub struct NullDisplay;

impl Display for NullDisplay {
    fn present(&mut self, _frame: &Frame, _overlay: &Overlay) -> io::Result<()> {
        Ok(())
    }

    fn close(&mut self) {}
}

pub fn display_for(config: &DisplayConfig) -> Box<dyn Display> {
    if config.enabled {
        Box::new(TerminalDisplay::stdout())
    } else {
        Box::new(NullDisplay)
    }
}
