//! TCP segment and acknowledgment messages exchanged between a sender and
//! the peer's receiver.

use super::SeqNum;
use bytes::Bytes;

/// A segment produced by a [`TcpSender`](super::TcpSender) and consumed by
/// the peer's [`TcpReceiver`](super::TcpReceiver).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Segment {
    /// Sequence number of the first unit (SYN, byte, or FIN) in the segment.
    pub seqno: SeqNum,
    pub syn: bool,
    pub fin: bool,
    pub payload: Bytes,
}

impl Segment {
    /// A zero-length segment carrying only a sequence number, used for pure
    /// acknowledgments and window probes.
    pub fn empty(seqno: SeqNum) -> Self {
        Self {
            seqno,
            ..Self::default()
        }
    }

    /// How many sequence numbers this segment occupies: one per payload
    /// byte, plus one each for SYN and FIN.
    pub fn sequence_length(&self) -> u64 {
        self.payload.len() as u64 + self.syn as u64 + self.fin as u64
    }
}

/// Feedback from a receiver to the peer's sender: the cumulative
/// acknowledgment (absent until a SYN has been seen) and the advertised
/// window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AckMessage {
    pub ackno: Option<SeqNum>,
    pub window_size: u16,
}
