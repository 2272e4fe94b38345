//! Stream Reassembler
//!
//! Accepts byte runs tagged with their absolute position in the stream, in
//! any order and with arbitrary overlap or duplication, and pushes them into
//! a [`ByteStream`] in order. Runs that cannot be delivered yet are held in
//! a map keyed by start index; overlapping runs are merged on insertion so
//! the map never stores the same byte twice.

use super::ByteStream;
use bytes::Bytes;
use std::collections::BTreeMap;

/// Reassembles out-of-order byte runs into an ordered [`ByteStream`].
#[derive(Debug, Default)]
pub struct Reassembler {
    /// Buffered runs keyed by absolute start index. Invariant: no two
    /// entries overlap or touch.
    pending: BTreeMap<u64, Vec<u8>>,
    /// Sum of the lengths of all buffered runs.
    pending_bytes: u64,
    /// Total stream length, once the last substring has been seen.
    end_index: Option<u64>,
}

impl Reassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a byte run starting at absolute index `first_index`.
    ///
    /// The run is clipped to the output's acceptance window: bytes already
    /// delivered and bytes past the available capacity are dropped. Whatever
    /// remains is merged into the pending map, and any prefix of the stream
    /// that is now contiguous is pushed into `output`. When the substring
    /// carrying `is_last_substring` has been fully delivered, the output is
    /// closed.
    pub fn insert(
        &mut self,
        first_index: u64,
        data: &[u8],
        is_last_substring: bool,
        output: &mut ByteStream,
    ) {
        let window_start = output.bytes_pushed();
        let window_end = window_start + output.available_capacity() as u64;

        let mut start = first_index;
        let mut data: &[u8] = data;

        // Clip to the acceptance window [window_start, window_end).
        if start >= window_end || start.saturating_add(data.len() as u64) <= window_start {
            data = &[];
        }
        if !data.is_empty() && start + data.len() as u64 > window_end {
            data = &data[..(window_end - start) as usize];
        }
        if !data.is_empty() && start < window_start {
            data = &data[(window_start - start) as usize..];
            start = window_start;
        }

        if is_last_substring {
            self.end_index = Some(start + data.len() as u64);
        }

        if !data.is_empty() {
            self.store(start, data);
        }

        // Deliver the contiguous prefix.
        loop {
            let next = output.bytes_pushed();
            match self.pending.remove(&next) {
                Some(run) => {
                    self.pending_bytes -= run.len() as u64;
                    output.push(Bytes::from(run));
                }
                None => break,
            }
        }

        if self.end_index == Some(output.bytes_pushed()) {
            output.close();
        }
    }

    /// Merge a clipped run into the pending map, absorbing any stored runs
    /// it overlaps or touches.
    fn store(&mut self, mut start: u64, data: &[u8]) {
        let mut run = data.to_vec();

        // A predecessor run that reaches `start` either subsumes the new
        // run entirely or is extended with its non-overlapping suffix.
        if let Some((&prev_start, prev_run)) = self.pending.range(..=start).next_back() {
            let prev_end = prev_start + prev_run.len() as u64;
            if prev_end >= start + run.len() as u64 {
                return;
            }
            if prev_end >= start {
                if let Some(mut merged) = self.pending.remove(&prev_start) {
                    self.pending_bytes -= merged.len() as u64;
                    merged.extend_from_slice(&run[(prev_end - start) as usize..]);
                    run = merged;
                    start = prev_start;
                }
            }
        }

        // Absorb every following run the merged run overlaps or touches.
        let mut end = start + run.len() as u64;
        while let Some((&next_start, _)) = self.pending.range(start..).next() {
            if next_start > end {
                break;
            }
            if let Some(next_run) = self.pending.remove(&next_start) {
                self.pending_bytes -= next_run.len() as u64;
                let next_end = next_start + next_run.len() as u64;
                if next_end > end {
                    run.extend_from_slice(&next_run[(end - next_start) as usize..]);
                    end = next_end;
                }
            }
        }

        self.pending_bytes += run.len() as u64;
        self.pending.insert(start, run);
    }

    /// Number of bytes buffered but not yet delivered.
    pub fn bytes_pending(&self) -> u64 {
        self.pending_bytes
    }
}
