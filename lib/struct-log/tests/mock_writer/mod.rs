use std::io;
use std::sync::{Mutex, MutexGuard};

use tracing_subscriber::fmt::MakeWriter;

/// Appends everything written to a shared in-memory buffer.
pub struct MockWriter {
    buffer: &'static Mutex<Vec<u8>>,
}

impl MockWriter {
    pub fn new(buffer: &'static Mutex<Vec<u8>>) -> Self {
        Self { buffer }
    }

    fn lock(&self) -> io::Result<MutexGuard<'static, Vec<u8>>> {
        self.buffer
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "buffer lock poisoned"))
    }
}

impl io::Write for MockWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock()?.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for MockWriter {
    type Writer = MockWriter;

    fn make_writer(&'a self) -> Self::Writer {
        MockWriter::new(self.buffer)
    }
}
