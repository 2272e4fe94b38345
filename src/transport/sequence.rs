//! TCP Sequence Numbers
//!
//! Sequence numbers on the wire are 32-bit values that wrap at 2^32, while
//! stream positions are absolute 64-bit indices. This module converts
//! between the two: wrapping is a modular add against the connection's zero
//! point, and unwrapping picks, among all absolute indices congruent to a
//! wrapped value, the one closest to a caller-supplied checkpoint.

use std::fmt;
use std::ops::Add;

/// A 32-bit wrapped sequence number.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SeqNum(u32);

impl SeqNum {
    /// Create a sequence number from a raw u32 value.
    #[inline]
    pub const fn new(value: u32) -> Self {
        SeqNum(value)
    }

    /// Get the raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Add an offset to the sequence number (with wraparound).
    #[inline]
    pub const fn wrapping_add(self, offset: u32) -> Self {
        SeqNum(self.0.wrapping_add(offset))
    }

    /// Wrap an absolute 64-bit stream index relative to `zero_point`.
    #[inline]
    pub fn wrap(absolute: u64, zero_point: SeqNum) -> SeqNum {
        zero_point.wrapping_add(absolute as u32)
    }

    /// Recover the absolute 64-bit index of this sequence number.
    ///
    /// Every wrapped value corresponds to infinitely many absolute indices,
    /// one per 2^32 cycle. The result is the candidate closest to
    /// `checkpoint`, which callers supply as a recently-seen index (for a
    /// receiver, the next byte expected).
    pub fn unwrap(self, zero_point: SeqNum, checkpoint: u64) -> u64 {
        const TWO_31: u64 = 1 << 31;
        const TWO_32: u64 = 1 << 32;

        let offset = self.0.wrapping_sub(zero_point.0) as u64;
        let candidate = (checkpoint >> 32 << 32) + offset;

        // Saturating adds: checkpoints in the top half-cycle of u64 would
        // otherwise overflow, and no higher candidate exists up there anyway.
        if candidate > checkpoint.saturating_add(TWO_31) && candidate >= TWO_32 {
            candidate - TWO_32
        } else if checkpoint >= TWO_31 && candidate < checkpoint - TWO_31 {
            candidate.saturating_add(TWO_32)
        } else {
            candidate
        }
    }
}

impl fmt::Debug for SeqNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SeqNum({})", self.0)
    }
}

impl fmt::Display for SeqNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SeqNum {
    #[inline]
    fn from(value: u32) -> Self {
        SeqNum(value)
    }
}

impl From<SeqNum> for u32 {
    #[inline]
    fn from(seq: SeqNum) -> Self {
        seq.0
    }
}

impl Add<u64> for SeqNum {
    type Output = SeqNum;

    #[inline]
    fn add(self, rhs: u64) -> Self::Output {
        self.wrapping_add(rhs as u32)
    }
}
