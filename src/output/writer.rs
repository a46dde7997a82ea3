//! Message sinks

use crate::engine::Message;
use crate::error::{Error, Result};
use std::io::{BufWriter, Write};

/// Consumer of protocol messages, in emission order
pub trait MessageSink {
    /// Write one message
    fn emit(&mut self, message: &Message) -> Result<()>;

    /// Flush buffered output
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Writes each message as one line of JSON
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: BufWriter<W>,
    messages_written: usize,
}

impl JsonLinesSink<std::io::Stdout> {
    /// Sink writing to stdout
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> JsonLinesSink<W> {
    /// Create a sink over a writer
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            messages_written: 0,
        }
    }

    /// Number of messages written
    pub fn messages_written(&self) -> usize {
        self.messages_written
    }

    /// Flush and return the underlying writer
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| Error::output(format!("Failed to flush output: {}", e.error())))
    }
}

impl<W: Write> MessageSink for JsonLinesSink<W> {
    fn emit(&mut self, message: &Message) -> Result<()> {
        serde_json::to_writer(&mut self.writer, message)
            .map_err(|e| Error::output(format!("Failed to serialize message: {e}")))?;
        self.writer
            .write_all(b"\n")
            .map_err(|e| Error::output(format!("Failed to write message: {e}")))?;
        self.messages_written += 1;

        // STATE lines must reach the consumer as soon as they are written
        if message.is_state() {
            MessageSink::flush(self)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| Error::output(format!("Failed to flush output: {e}")))
    }
}

/// Collects messages in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    /// Messages in emission order
    pub messages: Vec<Message>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// RECORD messages of one stream
    pub fn records_for(&self, stream: &str) -> Vec<&Message> {
        self.messages
            .iter()
            .filter(|m| m.is_record() && m.stream() == Some(stream))
            .collect()
    }
}

impl MessageSink for MemorySink {
    fn emit(&mut self, message: &Message) -> Result<()> {
        self.messages.push(message.clone());
        Ok(())
    }
}

impl<S: MessageSink + ?Sized> MessageSink for &mut S {
    fn emit(&mut self, message: &Message) -> Result<()> {
        (**self).emit(message)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}
