//! User-facing status lines.
//!
//! Status lines ("Server listening on ...", "Server stopped by user.") are
//! part of the tool's interface rather than diagnostics, so they bypass
//! `tracing` and go to a [`Console`] sink: stdout in the binary, an
//! in-memory buffer in tests.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use tracing::warn;

/// Cloneable sink for status lines.
#[derive(Clone)]
pub struct Console {
    sink: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Console {
    /// Console writing to the process's standard output.
    pub fn stdout() -> Self {
        Self::with_writer(io::stdout())
    }

    /// Console writing to an arbitrary sink.
    pub fn with_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            sink: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// Console capturing everything it prints, plus a handle to read it back.
    pub fn buffer() -> (Self, SharedBuffer) {
        let buffer = SharedBuffer::default();
        (Self::with_writer(buffer.clone()), buffer)
    }

    /// Print one line.
    pub fn say(&self, line: impl AsRef<str>) {
        let mut sink = match self.sink.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let result = writeln!(sink, "{}", line.as_ref()).and_then(|()| sink.flush());
        if let Err(e) = result {
            warn!(error = %e, "Failed to write status line");
        }
    }
}

/// In-memory writer shared between a [`Console`] and its reader.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    /// Everything written so far, lossily decoded.
    pub fn contents(&self) -> String {
        let bytes = match self.inner.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.inner.lock() {
            Ok(mut guard) => guard.extend_from_slice(buf),
            Err(poisoned) => poisoned.into_inner().extend_from_slice(buf),
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_captures_lines() {
        let (console, buffer) = Console::buffer();
        console.say("first");
        console.clone().say(String::from("second"));
        assert_eq!(buffer.contents(), "first\nsecond\n");
    }
}
