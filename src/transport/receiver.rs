//! TCP Receiver
//!
//! Translates incoming segments into reassembler insertions and produces
//! the acknowledgment/window feedback for the peer's sender. The SYN of the
//! first segment fixes the connection's zero point; sequence number 0 is
//! the SYN itself, so stream index = absolute seqno - 1.

use super::{AckMessage, Segment, SeqNum};
use crate::stream::{ByteStream, Reassembler};

/// Receiver side of a TCP connection.
#[derive(Debug, Default)]
pub struct TcpReceiver {
    /// Sequence number of the SYN, once seen. The first SYN wins.
    zero_point: Option<SeqNum>,
}

impl TcpReceiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one incoming segment, delegating byte placement to the
    /// reassembler. Segments arriving before any SYN are dropped silently.
    pub fn receive(
        &mut self,
        segment: &Segment,
        reassembler: &mut Reassembler,
        inbound: &mut ByteStream,
    ) {
        if segment.syn && self.zero_point.is_none() {
            self.zero_point = Some(segment.seqno);
        }
        let zero_point = match self.zero_point {
            Some(zero_point) => zero_point,
            None => return,
        };

        let syn = segment.syn as u64;
        // The next byte expected is the best guess for which 2^32 cycle the
        // segment belongs to.
        let checkpoint = inbound.bytes_pushed() + 1 - syn;
        let absolute = segment.seqno.unwrap(zero_point, checkpoint);
        // SYN occupies sequence number 0, so stream indices are shifted down
        // by one. A bogus non-SYN segment at the zero point wraps to a huge
        // index and is discarded by the reassembler's window clip.
        let first_index = (absolute + syn).wrapping_sub(1);

        reassembler.insert(first_index, &segment.payload, segment.fin, inbound);
    }

    /// Current acknowledgment and advertised window.
    ///
    /// The ackno is the sequence number of the next unit expected: absent
    /// before any SYN, and one past the delivered bytes afterwards (plus one
    /// more once the stream is closed, covering the FIN).
    pub fn ack_message(&self, inbound: &ByteStream) -> AckMessage {
        let ackno = self
            .zero_point
            .map(|zero_point| zero_point + (inbound.bytes_pushed() + 1 + inbound.is_closed() as u64));
        AckMessage {
            ackno,
            window_size: inbound.available_capacity().min(u16::MAX as usize) as u16,
        }
    }
}
