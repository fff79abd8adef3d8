//! Process console with scoped redirection.
//!
//! The pretty-printer writes to a [`Console`] rather than straight to stdout,
//! so a caller can point the console at an in-memory buffer for the length of
//! one call. [`Console::redirect`] returns a guard; the previous destination
//! comes back when the guard is dropped, whether the call returned, failed,
//! panicked or was cancelled.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

type Sink = Box<dyn Write + Send>;

/// A swappable output destination, stdout by default.
pub struct Console {
    target: Mutex<Sink>,
}

impl Console {
    /// Console writing to the process standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub fn new(sink: impl Write + Send + 'static) -> Self {
        Self {
            target: Mutex::new(Box::new(sink)),
        }
    }

    pub fn write_str(&self, text: &str) -> io::Result<()> {
        self.lock().write_all(text.as_bytes())
    }

    pub fn write_line(&self, line: &str) -> io::Result<()> {
        let mut target = self.lock();
        target.write_all(line.as_bytes())?;
        target.write_all(b"\n")
    }

    pub fn flush(&self) -> io::Result<()> {
        self.lock().flush()
    }

    /// Send everything written to this console into `sink` until the
    /// returned guard is dropped.
    pub fn redirect(&self, sink: impl Write + Send + 'static) -> Redirect<'_> {
        let previous = std::mem::replace(&mut *self.lock(), Box::new(sink));
        Redirect {
            console: self,
            previous: Some(previous),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Sink> {
        // A panic while writing leaves the sink usable.
        self.target.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Restores the console's previous destination on drop.
#[must_use = "the console is restored as soon as the guard is dropped"]
pub struct Redirect<'a> {
    console: &'a Console,
    previous: Option<Sink>,
}

impl Drop for Redirect<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            let mut target = self.console.lock();
            if let Err(e) = target.flush() {
                tracing::warn!("Failed to flush redirected console: {}", e);
            }
            *target = previous;
        }
    }
}

/// Shared in-memory sink; clones write to the same buffer.
#[derive(Clone, Default)]
pub struct CaptureBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.lock()).into_owned()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.bytes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
