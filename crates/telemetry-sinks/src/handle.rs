//! Adapts a [`SinkStore`] plus its [`SinkWorker`] into the
//! [`telemetry_core::Sink`] trait a `Channel` talks to.

use std::sync::Arc;

use telemetry_core::{Schema, Sink, Snapshot};

use crate::config::SnapshotterConfig;
use crate::worker::{SinkStore, SinkWorker};

/// Default bound on a sink's queue depth (spec §4.6 leaves this
/// implementation-defined; this mirrors a generous but finite buffer so a
/// slow consumer fails `push` rather than growing without bound).
pub const DEFAULT_QUEUE_CAPACITY: usize = 4096;

/// Wraps a [`SinkStore`] with the queue/worker machinery and implements
/// [`Sink`], so `Arc<SinkHandle<S>>` can be handed to
/// [`telemetry_core::Channel::add_sink`].
pub struct SinkHandle<S: SinkStore> {
    store: Arc<S>,
    worker: SinkWorker,
}

impl<S: SinkStore> SinkHandle<S> {
    #[must_use]
    pub fn new(store: S) -> Arc<Self> {
        Self::with_capacity(store, DEFAULT_QUEUE_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(store: S, capacity: usize) -> Arc<Self> {
        Self::with_config(store, SnapshotterConfig::new().with_queue_capacity(capacity))
    }

    /// Build from an explicit [`SnapshotterConfig`], overriding both queue
    /// capacity and the worker's idle-poll interval in one call.
    #[must_use]
    pub fn with_config(store: S, config: SnapshotterConfig) -> Arc<Self> {
        let store = Arc::new(store);
        let worker = SinkWorker::spawn_with_config(store.clone(), config.queue_capacity(), config.poll_interval());
        Arc::new(Self { store, worker })
    }

    /// Shut down the worker thread early. Idempotent; also run on `Drop`.
    pub fn stop(&self) {
        self.worker.stop();
    }

    #[must_use]
    pub fn inner(&self) -> &Arc<S> {
        &self.store
    }
}

impl<S: SinkStore> Sink for SinkHandle<S> {
    fn add_channel(&self, channel_name: &str, schema: &Schema) {
        self.store.add_channel(channel_name, schema);
    }

    fn push(&self, snapshot: &Snapshot) -> bool {
        self.worker.push(snapshot.clone())
    }
}
