//! TCP Sender
//!
//! Reads from an outbound [`ByteStream`] and produces segments that fit the
//! receiver-advertised window, tracking everything sent but not yet
//! acknowledged. A single retransmission timer covers the oldest
//! outstanding segment; on expiry that segment is resent and the timeout
//! doubles (exponential backoff), except while the peer advertises a zero
//! window, where a retransmission is a probe rather than a loss signal.

use super::{AckMessage, RetransmissionTimer, Segment, SeqNum};
use crate::stream::ByteStream;
use std::collections::VecDeque;

/// Configuration for a [`TcpSender`].
#[derive(Debug, Clone)]
pub struct TcpSenderConfig {
    /// Retransmission timeout before any backoff, in milliseconds.
    pub initial_rto_ms: u64,
    /// Maximum payload bytes per segment.
    pub max_payload_size: usize,
    /// Fixed initial sequence number; `None` picks a random one.
    pub isn: Option<SeqNum>,
}

impl Default for TcpSenderConfig {
    fn default() -> Self {
        Self {
            initial_rto_ms: 1000,
            max_payload_size: 1000,
            isn: None,
        }
    }
}

impl TcpSenderConfig {
    /// Configuration with a fixed ISN, for deterministic behavior.
    pub fn with_isn(isn: SeqNum) -> Self {
        Self {
            isn: Some(isn),
            ..Self::default()
        }
    }
}

/// Sender side of a TCP connection.
#[derive(Debug)]
pub struct TcpSender {
    isn: SeqNum,
    initial_rto_ms: u64,
    max_payload_size: usize,

    syn_sent: bool,
    fin_sent: bool,

    rto_ms: u64,
    timer: RetransmissionTimer,

    /// Window size last advertised by the peer; 1 until the first ack.
    window_size: u64,
    /// Highest acknowledged absolute sequence number.
    recv_no: u64,
    /// Next absolute sequence number to assign.
    next_no: u64,

    consecutive_retransmissions: u64,
    bytes_in_flight: u64,

    /// Segments built but not yet handed to the caller.
    ready: VecDeque<Segment>,
    /// Segments transmitted but not yet fully acknowledged, oldest first.
    outstanding: VecDeque<Segment>,
}

impl TcpSender {
    pub fn new(config: TcpSenderConfig) -> Self {
        let isn = config.isn.unwrap_or_else(|| SeqNum::new(rand::random()));
        Self {
            isn,
            initial_rto_ms: config.initial_rto_ms,
            max_payload_size: config.max_payload_size,
            syn_sent: false,
            fin_sent: false,
            rto_ms: config.initial_rto_ms,
            timer: RetransmissionTimer::new(),
            window_size: 1,
            recv_no: 0,
            next_no: 0,
            consecutive_retransmissions: 0,
            bytes_in_flight: 0,
            ready: VecDeque::new(),
            outstanding: VecDeque::new(),
        }
    }

    /// Number of sequence numbers sent but not yet acknowledged.
    pub fn sequence_numbers_in_flight(&self) -> u64 {
        self.bytes_in_flight
    }

    /// How many consecutive retransmissions have happened.
    pub fn consecutive_retransmissions(&self) -> u64 {
        self.consecutive_retransmissions
    }

    /// Hand the caller the next segment awaiting transmission, if any.
    pub fn maybe_send(&mut self) -> Option<Segment> {
        self.ready.pop_front()
    }

    /// Fill the peer's window with segments read from `outbound`.
    ///
    /// SYN and FIN each consume one unit of window. A zero advertised
    /// window is treated as one so a single probe segment can be sent.
    pub fn push(&mut self, outbound: &mut ByteStream) {
        if self.fin_sent {
            return;
        }
        let window_edge = self.recv_no + self.window_size.max(1);
        let mut available = window_edge.saturating_sub(self.next_no);

        while available > 0 && !self.fin_sent {
            let mut segment = Segment::empty(SeqNum::wrap(self.next_no, self.isn));

            if !self.syn_sent {
                self.syn_sent = true;
                segment.syn = true;
                available -= 1;
            }

            let len = available
                .min(self.max_payload_size as u64)
                .min(outbound.bytes_buffered() as u64) as usize;
            segment.payload = outbound.read(len);
            available -= len as u64;

            if outbound.is_finished() && available > 0 {
                self.fin_sent = true;
                segment.fin = true;
                available -= 1;
            }

            let sequence_length = segment.sequence_length();
            if sequence_length == 0 {
                return;
            }
            self.next_no += sequence_length;
            self.bytes_in_flight += sequence_length;
            self.ready.push_back(segment.clone());
            self.outstanding.push_back(segment);
            if !self.timer.is_running() {
                self.timer.start();
            }
        }
    }

    /// A zero-length segment carrying the next sequence number, for pure
    /// acknowledgments and probes.
    pub fn send_empty_message(&self) -> Segment {
        Segment::empty(SeqNum::wrap(self.next_no, self.isn))
    }

    /// Process acknowledgment/window feedback from the peer's receiver.
    pub fn receive(&mut self, ack: &AckMessage) {
        self.window_size = ack.window_size as u64;
        let ackno = match ack.ackno {
            Some(ackno) => ackno,
            None => return,
        };

        let recv_no = ackno.unwrap(self.isn, self.next_no);
        // An ack beyond anything sent is stale or corrupt.
        if recv_no > self.next_no {
            return;
        }
        self.recv_no = recv_no;

        let mut acked_any = false;
        while let Some(oldest) = self.outstanding.front() {
            let start = oldest.seqno.unwrap(self.isn, self.next_no);
            if start + oldest.sequence_length() > recv_no {
                break;
            }
            self.bytes_in_flight -= oldest.sequence_length();
            self.outstanding.pop_front();
            acked_any = true;
        }

        if acked_any {
            self.rto_ms = self.initial_rto_ms;
            self.consecutive_retransmissions = 0;
            self.timer.start();
            if self.outstanding.is_empty() {
                self.timer.stop();
            }
        }
    }

    /// Advance simulated time. On timeout, requeue the oldest outstanding
    /// segment and back off the timer (unless the peer window is zero).
    pub fn tick(&mut self, ms_since_last_tick: u64) {
        if !self.timer.is_running() {
            return;
        }
        self.timer.tick(ms_since_last_tick);
        if !self.timer.expired(self.rto_ms) || self.outstanding.is_empty() {
            return;
        }

        if let Some(oldest) = self.outstanding.front() {
            self.ready.push_back(oldest.clone());
        }
        if self.window_size != 0 {
            self.consecutive_retransmissions += 1;
            self.rto_ms *= 2;
        }
        self.timer.start();
    }
}
