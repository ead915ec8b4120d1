use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use watchfs::output::Reporter;

/// Cloneable in-memory writer, used to capture reporter output.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock().unwrap()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A reporter writing into two buffers: `(reporter, stdout, stderr)`.
pub fn capturing_reporter(quiet: bool) -> (Reporter, SharedBuffer, SharedBuffer) {
    let stdout = SharedBuffer::new();
    let stderr = SharedBuffer::new();
    let reporter = Reporter::with_writers(Box::new(stdout.clone()), Box::new(stderr.clone()), quiet);
    (reporter, stdout, stderr)
}
