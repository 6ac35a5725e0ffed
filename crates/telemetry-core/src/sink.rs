//! The collaborator interface a [`crate::channel::Channel`] talks to (spec
//! §6 "Collaborator (sink) interface"). The queue/worker plumbing and
//! concrete adapters live in the `telemetry-sinks` crate; this crate only
//! needs the narrow contract `take_snapshot` calls.

use crate::schema::Schema;
use crate::snapshot::Snapshot;

/// What a [`crate::channel::Channel`] needs from a sink: register a
/// channel's schema once, and enqueue snapshots without blocking on I/O.
pub trait Sink: Send + Sync {
    /// Called once per channel before that channel's first `push`, and
    /// idempotently thereafter under an identical schema hash (spec §4.6).
    fn add_channel(&self, channel_name: &str, schema: &Schema);

    /// Enqueue a snapshot. Must be non-blocking and lock-free on the fast
    /// path (spec §5); returns `false` if the sink's queue is full.
    fn push(&self, snapshot: &Snapshot) -> bool;
}
