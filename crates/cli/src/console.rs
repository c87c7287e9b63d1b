//! Terminal output
//!
//! [`Console`] is the writer every layer prints through. Command output goes
//! to the output stream; spinner frames, status lines and rendered errors go
//! to the diagnostic stream, so `--format json` output stays parseable. Clones share
//! the same underlying writers.

use std::fmt;
use std::io::{self, IsTerminal, Write};
use std::sync::{Arc, Mutex, PoisonError};

use colored::{ColoredString, Colorize};

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Shared handle on the output and diagnostic streams
#[derive(Clone)]
pub struct Console {
    out: SharedWriter,
    err: SharedWriter,
    is_terminal: bool,
    color: bool,
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Console")
            .field("is_terminal", &self.is_terminal)
            .field("color", &self.color)
            .finish_non_exhaustive()
    }
}

impl Console {
    /// Output on stdout, diagnostics on stderr
    ///
    /// The spinner runs only when stderr is a terminal; colors only when both
    /// streams are.
    pub fn stdout() -> Self {
        let is_terminal = io::stderr().is_terminal();
        let color = is_terminal && io::stdout().is_terminal();
        Self::new(Box::new(io::stdout()), Box::new(io::stderr()), is_terminal, color)
    }

    pub fn new(
        out: Box<dyn Write + Send>,
        err: Box<dyn Write + Send>,
        is_terminal: bool,
        color: bool,
    ) -> Self {
        Self { out: Arc::new(Mutex::new(out)), err: Arc::new(Mutex::new(err)), is_terminal, color }
    }

    /// In-memory console with both streams captured in one buffer
    pub fn buffered() -> (Self, OutputBuffer) {
        Self::shared_buffer(false)
    }

    /// Like [`Console::buffered`] but behaves like a terminal (spinner enabled)
    pub fn buffered_terminal() -> (Self, OutputBuffer) {
        Self::shared_buffer(true)
    }

    /// In-memory console with separate output and diagnostic buffers
    pub fn buffered_split() -> (Self, OutputBuffer, OutputBuffer) {
        let out = OutputBuffer::default();
        let err = OutputBuffer::default();
        (Self::new(Box::new(out.clone()), Box::new(err.clone()), false, false), out, err)
    }

    fn shared_buffer(is_terminal: bool) -> (Self, OutputBuffer) {
        let buffer = OutputBuffer::default();
        let writer: SharedWriter = Arc::new(Mutex::new(Box::new(buffer.clone())));
        let console = Self { out: Arc::clone(&writer), err: writer, is_terminal, color: false };
        (console, buffer)
    }

    pub fn is_terminal(&self) -> bool {
        self.is_terminal
    }

    /// Print one line
    pub fn line(&self, text: impl fmt::Display) {
        write_to(&self.out, &format!("{text}\n"));
    }

    /// Print a status line with a check mark on the diagnostic stream
    pub fn success(&self, text: impl fmt::Display) {
        let mark = self.paint("✓", |s| s.green());
        write_to(&self.err, &format!("{mark} {text}\n"));
    }

    /// Print a framed block on the diagnostic stream: a bold red title
    /// followed by indented lines
    pub fn panel<I, S>(&self, title: &str, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mark = self.paint("✗", |s| s.red());
        let mut out = format!("{mark} {}\n", self.paint(title, |s| s.bold()));
        for line in lines {
            for physical in line.as_ref().lines() {
                out.push_str("  ");
                out.push_str(physical);
                out.push('\n');
            }
        }
        write_to(&self.err, &out);
    }

    /// Overwrite the current line without a newline (spinner frames)
    pub fn inline(&self, text: &str) {
        write_to(&self.err, &format!("\r{text}"));
    }

    /// Erase the current line
    pub fn clear_line(&self) {
        write_to(&self.err, "\r\x1b[2K");
    }

    fn paint(&self, text: &str, style: fn(&str) -> ColoredString) -> String {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }
}

fn write_to(writer: &SharedWriter, text: &str) {
    let mut writer = writer.lock().unwrap_or_else(PoisonError::into_inner);
    // A closed pipe leaves nothing useful to do
    if writer.write_all(text.as_bytes()).and_then(|()| writer.flush()).is_err() {
        tracing::debug!("Console write failed");
    }
}

/// Cloneable in-memory sink backing the buffered consoles
#[derive(Debug, Clone, Default)]
pub struct OutputBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl OutputBuffer {
    /// Everything written so far
    pub fn contents(&self) -> String {
        let bytes = self.bytes.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for OutputBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().unwrap_or_else(PoisonError::into_inner).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
