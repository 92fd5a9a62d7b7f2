//! Output sinks for fully formatted lines.
//!
//! A [`DirectPrinter`] hands each line to a [`Sink`] shared with every other
//! writer of the stream, while a [`BufferPrinter`] keeps lines in memory
//! until they are flushed into such a sink or discarded.

use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

use log::error;
use parking_lot::Mutex;

/// Prefix of every line of the protocol.
pub const LINE_PREFIX: &str = "FIRE ";

/// Destination of formatted lines.
///
/// `write` always receives complete lines, terminated by `\n`.
pub trait Printer: fmt::Debug + Send {
    /// Outputs one line.
    fn write(&mut self, line: &[u8]);

    /// The lines accumulated so far, for printers that buffer.
    fn buffer(&self) -> Option<&[u8]> {
        None
    }

    /// Discards buffered lines. Nothing to do for direct printers.
    fn clear(&mut self) {}

    /// The shared sink a direct printer writes to.
    fn sink(&self) -> Option<&Sink> {
        None
    }
}

/// Append-only, shared destination of the line stream.
///
/// Each `write_all` is atomic with respect to other writers of the same sink.
#[derive(Clone)]
pub struct Sink(Arc<Mutex<Box<dyn Write + Send>>>);

impl Sink {
    /// A sink over `writer`.
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self(Arc::new(Mutex::new(Box::new(writer))))
    }

    /// A sink over the process' standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Writes `bytes` in one go, holding the sink for the whole write.
    pub fn write_all(&self, bytes: &[u8]) -> io::Result<()> {
        self.0.lock().write_all(bytes)
    }

    /// Flushes the underlying writer.
    pub fn flush(&self) -> io::Result<()> {
        self.0.lock().flush()
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Sink(..)")
    }
}

/// Writes every line straight to its [`Sink`].
#[derive(Clone, Debug)]
pub struct DirectPrinter {
    sink: Sink,
}

impl DirectPrinter {
    /// A printer writing to `sink`.
    pub const fn new(sink: Sink) -> Self {
        Self { sink }
    }
}

impl Printer for DirectPrinter {
    fn write(&mut self, line: &[u8]) {
        if let Err(err) = self.sink.write_all(line) {
            error!("Firehose sink rejected a line: {}", err);
        }
    }

    fn sink(&self) -> Option<&Sink> {
        Some(&self.sink)
    }
}

/// Accumulates lines in memory.
#[derive(Clone, Debug, Default)]
pub struct BufferPrinter {
    buffer: Vec<u8>,
}

impl BufferPrinter {
    /// An empty buffer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// The buffered lines.
    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }
}

impl Printer for BufferPrinter {
    fn write(&mut self, line: &[u8]) {
        self.buffer.extend_from_slice(line);
    }

    fn buffer(&self) -> Option<&[u8]> {
        Some(&self.buffer)
    }

    fn clear(&mut self) {
        self.buffer.clear();
    }
}
