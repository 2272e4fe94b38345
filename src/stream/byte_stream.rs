//! Capacity-Bounded Byte Stream
//!
//! A FIFO of bytes with a fixed capacity, written on one side and read on
//! the other. Writes past the available capacity are silently truncated;
//! an error flag lets a writer signal abnormal termination to the reader.

use bytes::{Buf, Bytes, BytesMut};
use std::collections::VecDeque;

/// In-order byte stream with a fixed capacity.
///
/// The capacity limits how many bytes may be buffered at once, not how many
/// flow through the stream over its lifetime. Data is stored as a deque of
/// chunks so pushes and pops stay cheap.
#[derive(Debug)]
pub struct ByteStream {
    capacity: usize,
    chunks: VecDeque<Bytes>,
    buffered: usize,
    pushed: u64,
    popped: u64,
    closed: bool,
    error: bool,
}

impl ByteStream {
    /// Create a stream that buffers at most `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            chunks: VecDeque::new(),
            buffered: 0,
            pushed: 0,
            popped: 0,
            closed: false,
            error: false,
        }
    }

    /// Append bytes to the stream, truncating silently to the available
    /// capacity. Returns the number of bytes actually accepted.
    pub fn push(&mut self, mut data: Bytes) -> usize {
        if self.closed || self.error {
            return 0;
        }
        let accepted = data.len().min(self.available_capacity());
        if accepted == 0 {
            return 0;
        }
        data.truncate(accepted);
        self.buffered += accepted;
        self.pushed += accepted as u64;
        self.chunks.push_back(data);
        accepted
    }

    /// Signal that nothing more will be pushed.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Signal an abnormal termination to the reader.
    pub fn set_error(&mut self) {
        self.error = true;
    }

    /// Peek at the front chunk of buffered bytes without consuming it.
    ///
    /// Returns an empty slice when nothing is buffered. A single call may
    /// expose fewer bytes than `bytes_buffered()`; callers drain by
    /// alternating `peek` and `pop`.
    pub fn peek(&self) -> &[u8] {
        self.chunks.front().map(|chunk| chunk.as_ref()).unwrap_or(&[])
    }

    /// Discard up to `len` buffered bytes from the front of the stream.
    pub fn pop(&mut self, len: usize) {
        let mut remaining = len.min(self.buffered);
        self.buffered -= remaining;
        self.popped += remaining as u64;
        while remaining > 0 {
            match self.chunks.front_mut() {
                Some(chunk) if remaining < chunk.len() => {
                    chunk.advance(remaining);
                    remaining = 0;
                }
                Some(chunk) => {
                    remaining -= chunk.len();
                    self.chunks.pop_front();
                }
                None => break,
            }
        }
    }

    /// Remove and return up to `len` bytes from the front of the stream.
    pub fn read(&mut self, len: usize) -> Bytes {
        let take = len.min(self.buffered);
        if take == 0 {
            return Bytes::new();
        }
        // Fast path: the front chunk alone satisfies the request.
        if let Some(front) = self.chunks.front() {
            if front.len() >= take {
                let out = front.slice(..take);
                self.pop(take);
                return out;
            }
        }
        let mut out = BytesMut::with_capacity(take);
        let mut remaining = take;
        while remaining > 0 {
            let chunk = self.peek();
            if chunk.is_empty() {
                break;
            }
            let n = remaining.min(chunk.len());
            out.extend_from_slice(&chunk[..n]);
            self.pop(n);
            remaining -= n;
        }
        out.freeze()
    }

    /// Whether the writer has closed the stream.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Whether the stream is closed and fully drained.
    pub fn is_finished(&self) -> bool {
        self.closed && self.buffered == 0
    }

    /// Whether the error flag has been raised.
    pub fn has_error(&self) -> bool {
        self.error
    }

    /// How many more bytes can be pushed right now.
    pub fn available_capacity(&self) -> usize {
        self.capacity - self.buffered
    }

    /// Number of bytes currently buffered (pushed but not yet popped).
    pub fn bytes_buffered(&self) -> usize {
        self.buffered
    }

    /// Total number of bytes ever pushed.
    pub fn bytes_pushed(&self) -> u64 {
        self.pushed
    }

    /// Total number of bytes ever popped.
    pub fn bytes_popped(&self) -> u64 {
        self.popped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_read_back() {
        let mut stream = ByteStream::new(16);
        assert_eq!(stream.push(Bytes::from_static(b"hello")), 5);
        assert_eq!(stream.bytes_pushed(), 5);
        assert_eq!(stream.bytes_buffered(), 5);
        assert_eq!(stream.available_capacity(), 11);

        assert_eq!(stream.read(5), Bytes::from_static(b"hello"));
        assert_eq!(stream.bytes_popped(), 5);
        assert_eq!(stream.bytes_buffered(), 0);
        assert_eq!(stream.available_capacity(), 16);
    }

    #[test]
    fn test_push_truncates_to_capacity() {
        let mut stream = ByteStream::new(3);
        assert_eq!(stream.push(Bytes::from_static(b"hello")), 3);
        assert_eq!(stream.bytes_pushed(), 3);
        assert_eq!(stream.available_capacity(), 0);

        // A full stream accepts nothing more.
        assert_eq!(stream.push(Bytes::from_static(b"x")), 0);

        assert_eq!(stream.read(3), Bytes::from_static(b"hel"));
    }

    #[test]
    fn test_capacity_frees_after_pop() {
        let mut stream = ByteStream::new(2);
        stream.push(Bytes::from_static(b"ab"));
        stream.pop(1);
        assert_eq!(stream.available_capacity(), 1);
        assert_eq!(stream.push(Bytes::from_static(b"c")), 1);
        assert_eq!(stream.read(2), Bytes::from_static(b"bc"));
    }

    #[test]
    fn test_peek_and_partial_pop() {
        let mut stream = ByteStream::new(8);
        stream.push(Bytes::from_static(b"abcd"));
        assert_eq!(stream.peek(), b"abcd");
        stream.pop(2);
        assert_eq!(stream.peek(), b"cd");
        assert_eq!(stream.bytes_popped(), 2);
    }

    #[test]
    fn test_read_across_chunks() {
        let mut stream = ByteStream::new(8);
        stream.push(Bytes::from_static(b"ab"));
        stream.push(Bytes::from_static(b"cd"));
        assert_eq!(stream.read(3), Bytes::from_static(b"abc"));
        assert_eq!(stream.read(3), Bytes::from_static(b"d"));
    }

    #[test]
    fn test_close_and_finish() {
        let mut stream = ByteStream::new(8);
        stream.push(Bytes::from_static(b"ab"));
        stream.close();
        assert!(stream.is_closed());
        assert!(!stream.is_finished());

        // Pushes after close are rejected.
        assert_eq!(stream.push(Bytes::from_static(b"cd")), 0);

        stream.pop(2);
        assert!(stream.is_finished());
    }

    #[test]
    fn test_error_flag() {
        let mut stream = ByteStream::new(8);
        assert!(!stream.has_error());
        stream.set_error();
        assert!(stream.has_error());
        assert_eq!(stream.push(Bytes::from_static(b"x")), 0);
    }

    #[test]
    fn test_empty_peek_and_pop() {
        let mut stream = ByteStream::new(4);
        assert_eq!(stream.peek(), b"");
        stream.pop(10); // no-op on an empty stream
        assert_eq!(stream.bytes_popped(), 0);
        assert_eq!(stream.read(4), Bytes::new());
    }
}
