//! Terminal output for partial and final hypotheses

use std::io::Write;
use tracing::debug;

/// Side-effect-only sink for recognized text
pub trait Display {
    fn show(&mut self, segment: u64, text: &str);
}

/// Rewrites the current line while a segment is in progress and moves to a
/// new line when the next segment starts.
pub struct TerminalDisplay<W: Write = std::io::Stderr> {
    out: W,
    last_segment: Option<u64>,
}

impl TerminalDisplay {
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write> TerminalDisplay<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last_segment: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn render(&mut self, segment: u64, text: &str) -> std::io::Result<()> {
        if self.last_segment.is_some_and(|last| last != segment) {
            writeln!(self.out)?;
        }
        // \x1b[K clears leftovers of a longer previous partial
        write!(self.out, "\r{}: {}\x1b[K", segment, text)?;
        self.out.flush()
    }
}

impl<W: Write> Display for TerminalDisplay<W> {
    fn show(&mut self, segment: u64, text: &str) {
        if let Err(e) = self.render(segment, text) {
            debug!("Display write failed: {}", e);
        }
        self.last_segment = Some(segment);
    }
}
