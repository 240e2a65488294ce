use super::{Display, Overlay};
use crate::frame::Frame;
use crossterm::cursor::MoveToColumn;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use crossterm::QueueableCommand;
use std::io::{self, Stdout, Write};
use tracing::debug;

const BAR_WIDTH: usize = 20;

/// Single status line redrawn in place on every frame
pub struct TerminalDisplay<W: Write + Send = Stdout> {
    out: W,
    closed: bool,
    frames: u64,
}

impl TerminalDisplay<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TerminalDisplay<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            closed: false,
            frames: 0,
        }
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames
    }

    #[cfg(test)]
    pub(crate) fn output(&self) -> &W {
        &self.out
    }
}

/// Text of the status line for one frame
pub fn status_line(frame: &Frame, overlay: &Overlay) -> String {
    let bar = match overlay.volume_fraction() {
        Some(fraction) => {
            let filled = (fraction * BAR_WIDTH as f64).round() as usize;
            format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
        }
        None => format!("[{}]", "?".repeat(BAR_WIDTH)),
    };

    let pinch = match (overlay.measurement, overlay.line()) {
        (Some(m), Some(((tx, ty), (ix, iy)))) => {
            format!("pinch {:6.1}px ({},{})-({},{})", m.distance, tx, ty, ix, iy)
        }
        _ => "no hand".to_string(),
    };

    format!(
        "{:?} #{} {}x{} | {} | {} {}",
        overlay.state,
        frame.id,
        frame.width,
        frame.height,
        pinch,
        overlay.volume_label(),
        bar
    )
}

impl<W: Write + Send> Display for TerminalDisplay<W> {
    fn present(&mut self, frame: &Frame, overlay: &Overlay) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }

        let line = status_line(frame, overlay);
        self.out
            .queue(MoveToColumn(0))?
            .queue(Clear(ClearType::CurrentLine))?
            .queue(Print(line))?;
        self.out.flush()?;
        self.frames += 1;
        Ok(())
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        // Leave the last status line on screen and move below it
        let _ = self.out.write_all(b"\r\n");
        let _ = self.out.flush();
        debug!("Terminal display closed after {} frames", self.frames);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::LoopState;
    use crate::frame::FrameFormat;
    use crate::mapper::VolumeRange;
    use std::time::SystemTime;

    fn frame() -> Frame {
        Frame::new(7, SystemTime::now(), vec![0u8; 4 * 2 * 3], 4, 2, FrameFormat::Rgb24)
    }

    #[test]
    fn test_status_line_without_hand() {
        let overlay = Overlay::new(7, LoopState::Running);
        let line = status_line(&frame(), &overlay);

        assert!(line.starts_with("Running #7 4x2"));
        assert!(line.contains("no hand"));
        assert!(line.contains("vol --"));
    }

    #[test]
    fn test_status_line_volume_bar() {
        let mut overlay = Overlay::new(7, LoopState::Running);
        overlay.volume = Some(0.0);
        overlay.range = Some(VolumeRange::new(-60.0, 0.0).unwrap());

        let line = status_line(&frame(), &overlay);
        assert!(line.ends_with(&format!("[{}]", "#".repeat(BAR_WIDTH))));
    }

    #[test]
    fn test_present_and_close_once() {
        let mut display = TerminalDisplay::new(Vec::new());
        let overlay = Overlay::new(7, LoopState::Running);

        display.present(&frame(), &overlay).unwrap();
        display.close();
        display.close();
        display.present(&frame(), &overlay).unwrap();

        assert_eq!(display.frames_presented(), 1);
        let written = String::from_utf8_lossy(display.output()).to_string();
        assert!(written.contains("Running #7"));
        assert_eq!(written.matches("\r\n").count(), 1);
    }
}
