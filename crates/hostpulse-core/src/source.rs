//! Event sources: where wire messages come from.
//!
//! The dashboard only needs "give me the next message". Transports (a TCP
//! stream, a capture file, a scripted list in tests) implement
//! [`EventSource`]; decode errors for a single message are returned so the
//! caller can log and keep reading.

use std::collections::VecDeque;
use std::io::BufRead;

use crate::wire::{Message, WireError};

/// A push channel of decoded messages.
pub trait EventSource {
    /// Next message, `Ok(None)` at end of stream.
    fn next_message(&mut self) -> Result<Option<Message>, WireError>;
}

/// One JSON envelope per line. Blank lines are skipped.
pub struct JsonLinesSource<R> {
    reader: R,
    line: String,
    line_no: usize,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            line_no: 0,
        }
    }

    /// Number of lines consumed so far.
    pub fn line_no(&self) -> usize {
        self.line_no
    }
}

impl<R: BufRead> EventSource for JsonLinesSource<R> {
    fn next_message(&mut self) -> Result<Option<Message>, WireError> {
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            let text = self.line.trim();
            if text.is_empty() {
                continue;
            }
            return Message::from_json(text).map(Some);
        }
    }
}

/// Messages handed out from memory, in order.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    queue: VecDeque<Message>,
}

impl ScriptedSource {
    pub fn new<I: IntoIterator<Item = Message>>(messages: I) -> Self {
        Self {
            queue: messages.into_iter().collect(),
        }
    }

    pub fn push(&mut self, message: Message) {
        self.queue.push_back(message);
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl EventSource for ScriptedSource {
    fn next_message(&mut self) -> Result<Option<Message>, WireError> {
        Ok(self.queue.pop_front())
    }
}

/// Drain `source`, handing each message to `sink`.
///
/// Decode failures are logged and skipped; I/O failures end the drain.
/// Returns the number of messages delivered.
pub fn drain<S, F>(source: &mut S, mut sink: F) -> Result<usize, WireError>
where
    S: EventSource + ?Sized,
    F: FnMut(Message),
{
    let mut delivered = 0;
    loop {
        match source.next_message() {
            Ok(Some(msg)) => {
                sink(msg);
                delivered += 1;
            }
            Ok(None) => return Ok(delivered),
            Err(WireError::Io(e)) => return Err(WireError::Io(e)),
            Err(e) => log::warn!("skipping message: {e}"),
        }
    }
}
