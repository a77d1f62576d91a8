//! The wire protocol: three NUL-terminated UTF-8 fields per event, no
//! length prefix, no version byte. The connection itself is the envelope.

use crate::event::{PublisherEvent, SubscriberEvent};
use std::io::{BufRead, BufReader, Read};
use thiserror::Error;

/// Minimum capacity of the buffered reader backing a [`Deframer`]; the wire
/// format itself is unbounded, this just avoids a read syscall per byte.
const MIN_BUFFER: usize = 1024;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Serializes an event as `<name>\0<location>\0<description>\0`.
pub fn encode_event(event: &PublisherEvent) -> Vec<u8> {
    let mut buf = Vec::with_capacity(
        event.name.len() + event.location.len() + event.description.len() + 3,
    );
    buf.extend_from_slice(event.name.as_bytes());
    buf.push(0);
    buf.extend_from_slice(event.location.as_bytes());
    buf.push(0);
    buf.extend_from_slice(event.description.as_bytes());
    buf.push(0);
    buf
}

/// The three raw fields decoded off the wire, before the sender's address
/// and port (known only to the connection, not the protocol) are attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub name: String,
    pub location: String,
    pub description: String,
}

impl RawEvent {
    pub fn with_sender(self, sender_address: String, sender_port: String) -> SubscriberEvent {
        SubscriberEvent {
            name: self.name,
            location: self.location,
            description: self.description,
            sender_address,
            sender_port,
        }
    }
}

/// Reads NUL-delimited fields off a stream and assembles them into events.
///
/// Built on a `BufReader` so partial reads, and NULs that land on a chunk
/// boundary, are handled for free by `read_until`.
pub struct Deframer<R> {
    reader: BufReader<R>,
}

impl<R: Read> Deframer<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::with_capacity(MIN_BUFFER, inner),
        }
    }

    /// Reads the next event, or `None` on a clean end-of-stream (including
    /// a stream that closes mid-record, which is treated identically: the
    /// partial record is discarded).
    pub fn read_event(&mut self) -> Result<Option<RawEvent>> {
        let name = match self.read_field()? {
            Some(f) => f,
            None => return Ok(None),
        };
        let location = match self.read_field()? {
            Some(f) => f,
            None => return Ok(None),
        };
        let description = match self.read_field()? {
            Some(f) => f,
            None => return Ok(None),
        };
        Ok(Some(RawEvent {
            name,
            location,
            description,
        }))
    }

    fn read_field(&mut self) -> Result<Option<String>> {
        let mut buf = Vec::new();
        let n = self.reader.read_until(0, &mut buf)?;
        if n == 0 {
            return Ok(None);
        }
        if buf.last() == Some(&0) {
            buf.pop();
        } else {
            // EOF before the terminating NUL: a truncated record.
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }
}
