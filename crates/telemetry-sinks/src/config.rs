//! Runtime-tunable knobs for a sink's queue/worker (SPEC_FULL.md §1 "Config").
//!
//! Spec §6 is explicit that the core defines no on-disk format or
//! environment variables; this config is constructed in-process only, the
//! same way the teacher threads small `...Config` structs through its
//! constructors rather than reading them from the environment.

use std::time::Duration;

use crate::handle::DEFAULT_QUEUE_CAPACITY;
use crate::worker::DEFAULT_POLL_INTERVAL;

/// Per-sink tuning: how many snapshots may queue before `push` starts
/// returning `false` (spec §4.6, §5 backpressure), and how long the worker
/// sleeps between drain passes when its queue is empty (spec §4.6 "~250us").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotterConfig {
    queue_capacity: usize,
    poll_interval: Duration,
}

impl Default for SnapshotterConfig {
    fn default() -> Self {
        Self { queue_capacity: DEFAULT_QUEUE_CAPACITY, poll_interval: DEFAULT_POLL_INTERVAL }
    }
}

impl SnapshotterConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the sink's queue depth. A full queue makes `push` (and
    /// therefore `take_snapshot`) return `false`; it never blocks.
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// How long the worker sleeps after finding its queue empty before
    /// polling again.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}
