//! Capacity-bounded byte stream with split writer/reader roles
//!
//! A [`ByteStream`] is owned by exactly one party. Write-side operations are
//! reached through [`ByteStream::writer`], read-side operations through
//! [`ByteStream::reader`]. Both handles borrow the same state, so the terminal
//! error flag set from one side is seen from the other.
//!
//! Nothing here blocks: writes beyond the available capacity are truncated and
//! callers that need backpressure poll [`ByteStream::available_capacity`].

use bytes::{Buf, Bytes, BytesMut};
use std::collections::VecDeque;
use std::fmt;
use std::ops::Deref;

/// Bounded FIFO of bytes, stored as a queue of chunks.
#[derive(Clone, Default)]
pub struct ByteStream {
    /// Maximum number of bytes buffered at once
    capacity: u64,
    /// Buffered chunks, front is the oldest. Never holds an empty chunk.
    chunks: VecDeque<Bytes>,
    /// No further writes accepted
    closed: bool,
    /// Terminal error, shared by both roles
    error: bool,
    /// Total bytes accepted by `push`
    bytes_pushed: u64,
    /// Total bytes discarded by `pop`
    bytes_popped: u64,
}

impl ByteStream {
    /// Create an empty stream holding at most `capacity` bytes
    pub fn new(capacity: u64) -> Self {
        ByteStream {
            capacity,
            ..Default::default()
        }
    }

    /// Write-side handle
    pub fn writer(&mut self) -> Writer<'_> {
        Writer { stream: self }
    }

    /// Read-side handle
    pub fn reader(&mut self) -> Reader<'_> {
        Reader { stream: self }
    }

    /// Fixed capacity given at construction
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Has the stream suffered an error?
    pub fn has_error(&self) -> bool {
        self.error
    }

    /// Has the writer closed the stream?
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// How many bytes can be pushed right now
    pub fn available_capacity(&self) -> u64 {
        self.capacity - self.bytes_buffered()
    }

    /// Total number of bytes cumulatively pushed
    pub fn bytes_pushed(&self) -> u64 {
        self.bytes_pushed
    }

    /// Total number of bytes cumulatively popped
    pub fn bytes_popped(&self) -> u64 {
        self.bytes_popped
    }

    /// Number of bytes pushed and not yet popped
    pub fn bytes_buffered(&self) -> u64 {
        self.bytes_pushed - self.bytes_popped
    }

    /// Closed and fully drained
    pub fn is_finished(&self) -> bool {
        self.closed && self.bytes_buffered() == 0
    }

    fn set_error(&mut self) {
        self.error = true;
    }
}

impl fmt::Debug for ByteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteStream")
            .field("capacity", &self.capacity)
            .field("buffered", &self.bytes_buffered())
            .field("chunks", &self.chunks.len())
            .field("closed", &self.closed)
            .field("error", &self.error)
            .finish()
    }
}

/// Write-side view of a [`ByteStream`]
pub struct Writer<'a> {
    stream: &'a mut ByteStream,
}

impl Writer<'_> {
    /// Append as much of `data` as the available capacity allows
    ///
    /// The excess is dropped silently. Pushing to a closed stream does nothing.
    pub fn push(&mut self, data: impl Into<Bytes>) {
        if self.stream.closed {
            return;
        }

        let mut data = data.into();
        let available = self.stream.available_capacity();
        if data.len() as u64 > available {
            data.truncate(available as usize);
        }

        if data.is_empty() {
            return;
        }

        self.stream.bytes_pushed += data.len() as u64;
        self.stream.chunks.push_back(data);
    }

    /// Signal that nothing more will be written. Idempotent.
    pub fn close(&mut self) {
        self.stream.closed = true;
    }

    /// Mark the stream as failed
    pub fn set_error(&mut self) {
        self.stream.set_error();
    }
}

impl Deref for Writer<'_> {
    type Target = ByteStream;

    fn deref(&self) -> &ByteStream {
        self.stream
    }
}

/// Read-side view of a [`ByteStream`]
pub struct Reader<'a> {
    stream: &'a mut ByteStream,
}

impl Reader<'_> {
    /// The next contiguous run of buffered bytes
    ///
    /// May be shorter than [`ByteStream::bytes_buffered`]; callers loop with
    /// [`Reader::pop`] to see everything.
    pub fn peek(&self) -> &[u8] {
        self.stream.chunks.front().map(|chunk| &chunk[..]).unwrap_or(&[])
    }

    /// Discard the first `len` buffered bytes
    ///
    /// Asking for more than is buffered discards everything that is.
    pub fn pop(&mut self, len: u64) {
        let len = len.min(self.stream.bytes_buffered());
        let mut remaining = len;

        while remaining > 0 {
            let Some(front) = self.stream.chunks.front_mut() else {
                break;
            };

            if front.len() as u64 <= remaining {
                remaining -= front.len() as u64;
                self.stream.chunks.pop_front();
            } else {
                front.advance(remaining as usize);
                remaining = 0;
            }
        }

        self.stream.bytes_popped += len;
    }

    /// Peek and pop up to `max_len` bytes into one contiguous buffer
    pub fn read(&mut self, max_len: u64) -> Bytes {
        let want = max_len.min(self.stream.bytes_buffered()) as usize;

        // Single-chunk fast path keeps the read zero-copy
        if let Some(front) = self.stream.chunks.front() {
            if front.len() >= want {
                let out = front.slice(..want);
                self.pop(want as u64);
                return out;
            }
        }

        let mut out = BytesMut::with_capacity(want);
        while out.len() < want {
            let take = (want - out.len()).min(self.peek().len());
            out.extend_from_slice(&self.peek()[..take]);
            self.pop(take as u64);
        }
        out.freeze()
    }

    /// Mark the stream as failed
    pub fn set_error(&mut self) {
        self.stream.set_error();
    }
}

impl Deref for Reader<'_> {
    type Target = ByteStream;

    fn deref(&self) -> &ByteStream {
        self.stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncating_push() {
        let mut stream = ByteStream::new(3);

        stream.writer().push("abc");
        assert_eq!(stream.available_capacity(), 0);

        stream.writer().push("de");
        assert_eq!(stream.bytes_pushed(), 3);

        let mut reader = stream.reader();
        assert_eq!(reader.peek(), b"abc");
        reader.pop(3);
        assert_eq!(reader.bytes_buffered(), 0);
        assert_eq!(reader.bytes_popped(), 3);
    }

    #[test]
    fn test_partial_pop_across_chunks() {
        let mut stream = ByteStream::new(16);
        stream.writer().push("hello");
        stream.writer().push("world");

        let mut reader = stream.reader();
        reader.pop(3);
        assert_eq!(reader.peek(), b"lo");
        reader.pop(4);
        assert_eq!(reader.peek(), b"rld");
        assert_eq!(reader.bytes_buffered(), 3);
        assert_eq!(reader.bytes_popped(), 7);
    }

    #[test]
    fn test_close_and_finish() {
        let mut stream = ByteStream::new(8);
        stream.writer().push("ab");
        stream.writer().close();
        stream.writer().close();

        assert!(stream.is_closed());
        assert!(!stream.is_finished());

        stream.writer().push("cd");
        assert_eq!(stream.bytes_pushed(), 2);

        stream.reader().pop(2);
        assert!(stream.is_finished());
    }

    #[test]
    fn test_error_visible_from_both_roles() {
        let mut stream = ByteStream::new(8);
        assert!(!stream.reader().has_error());

        stream.writer().set_error();
        assert!(stream.reader().has_error());
        assert!(stream.has_error());
    }

    #[test]
    fn test_read_spans_chunks() {
        let mut stream = ByteStream::new(32);
        stream.writer().push("abc");
        stream.writer().push("def");
        stream.writer().push("ghi");

        let out = stream.reader().read(7);
        assert_eq!(&out[..], b"abcdefg");
        assert_eq!(stream.bytes_buffered(), 2);

        let rest = stream.reader().read(100);
        assert_eq!(&rest[..], b"hi");
        assert_eq!(stream.bytes_buffered(), 0);
    }

    #[test]
    fn test_pop_more_than_buffered() {
        let mut stream = ByteStream::new(8);
        stream.writer().push("abc");
        stream.reader().pop(10);

        assert_eq!(stream.bytes_popped(), 3);
        assert_eq!(stream.bytes_buffered(), 0);
        assert_eq!(stream.available_capacity(), 8);
    }

    #[test]
    fn test_capacity_recovers_after_pop() {
        let mut stream = ByteStream::new(4);
        stream.writer().push("abcd");
        stream.reader().pop(2);
        stream.writer().push("efgh");

        assert_eq!(stream.bytes_pushed(), 6);
        assert_eq!(&stream.reader().read(4)[..], b"cdef");
    }
}
