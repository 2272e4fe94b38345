//! Retransmission timer: an elapsed-time counter driven by explicit ticks.

/// Counts simulated milliseconds while running. The owner decides what
/// timeout to compare against, so backoff lives in the sender, not here.
#[derive(Debug, Default)]
pub struct RetransmissionTimer {
    elapsed_ms: u64,
    running: bool,
}

impl RetransmissionTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the timer from zero.
    pub fn start(&mut self) {
        self.elapsed_ms = 0;
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advance the timer by `ms` simulated milliseconds.
    pub fn tick(&mut self, ms: u64) {
        self.elapsed_ms += ms;
    }

    /// Whether the timer is running and has accumulated at least `rto_ms`.
    pub fn expired(&self, rto_ms: u64) -> bool {
        self.running && self.elapsed_ms >= rto_ms
    }
}
