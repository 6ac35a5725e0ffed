//! MPSC queue + consumer thread shared by every concrete sink (spec §4.6).
//!
//! Grounded on `original_source`'s `data_tamer_cpp/src/data_sink.cpp`
//! (`DataSinkBase::Pimpl`): a `moodycamel::ConcurrentQueue` drained by one
//! thread that sleeps ~250µs when idle. `crossbeam_channel::bounded` is the
//! idiomatic Rust stand-in for that queue — `try_recv` in a loop gives the
//! same drain-then-sleep shape without needing a third-party lock-free
//! queue crate.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;

use telemetry_core::{Schema, Snapshot};

/// Default idle-sleep interval between drain passes (spec §4.6 "~250us").
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_micros(250);

/// What a concrete sink implements (spec §4.6 "Contract of a concrete
/// sink"). `add_channel` is invoked synchronously by [`crate::SinkHandle`],
/// off the worker thread; `store` is called once per dequeued snapshot, in
/// push order, on the worker thread alone.
pub trait SinkStore: Send + Sync + 'static {
    fn add_channel(&self, channel_name: &str, schema: &Schema);
    fn store(&self, snapshot: &Snapshot) -> bool;
}

/// Owns the bounded queue and the background thread draining it. Shared by
/// every concrete sink adapter via composition (spec §4.6 "Sink base").
///
/// `sender` is a lock-free `crossbeam_channel` handle, so [`Self::push`]
/// never blocks on a mutex (spec §5 "MUST make this lock-free on the fast
/// path"); only [`Self::stop`], which runs at most once per shutdown, takes
/// the join-handle mutex.
pub struct SinkWorker {
    sender: crossbeam_channel::Sender<Snapshot>,
    run: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl SinkWorker {
    /// Spawn the consumer thread for `store`. `capacity` bounds the queue;
    /// once full, [`Self::push`] returns `false` (spec §5 backpressure).
    /// Uses [`DEFAULT_POLL_INTERVAL`] for the idle sleep; see
    /// [`Self::spawn_with_config`] to override it.
    #[must_use]
    pub fn spawn<S: SinkStore>(store: Arc<S>, capacity: usize) -> Self {
        Self::spawn_with_config(store, capacity, DEFAULT_POLL_INTERVAL)
    }

    /// Like [`Self::spawn`] but with an explicit idle-sleep interval,
    /// typically sourced from a [`crate::SnapshotterConfig`].
    #[must_use]
    pub fn spawn_with_config<S: SinkStore>(store: Arc<S>, capacity: usize, poll_interval: Duration) -> Self {
        let (sender, receiver) = crossbeam_channel::bounded::<Snapshot>(capacity);
        let run = Arc::new(AtomicBool::new(true));
        let worker_run = run.clone();
        let handle = std::thread::Builder::new()
            .name("telemetry-sink-worker".to_string())
            .spawn(move || {
                log::debug!("sink worker thread started");
                while worker_run.load(Ordering::Acquire) {
                    let mut drained = false;
                    while let Ok(snapshot) = receiver.try_recv() {
                        drained = true;
                        if !store.store(&snapshot) {
                            log::warn!("sink rejected a snapshot for channel '{}'", snapshot.channel_name);
                        }
                    }
                    if !drained {
                        std::thread::sleep(poll_interval);
                    }
                }
                // Drain whatever is left so no pushed-but-unconsumed
                // snapshot is silently lost on shutdown.
                while let Ok(snapshot) = receiver.try_recv() {
                    let _ = store.store(&snapshot);
                }
                log::debug!("sink worker thread stopped");
            })
            .expect("spawning the sink worker thread");
        Self { sender, run, handle: Mutex::new(Some(handle)) }
    }

    /// Enqueue a snapshot without blocking. Returns `false` if the queue is
    /// full (spec §4.6 "MUST document the push-returns-false condition").
    #[must_use]
    pub fn push(&self, snapshot: Snapshot) -> bool {
        self.sender.try_send(snapshot).is_ok()
    }

    /// Idempotent shutdown: signal the worker and join it. Safe to call
    /// more than once and safe to call from `Drop`.
    pub fn stop(&self) {
        self.run.store(false, Ordering::Release);
        if let Some(handle) = self.handle.lock().take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SinkWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        seen: Mutex<Vec<i64>>,
    }

    impl SinkStore for Recorder {
        fn add_channel(&self, _channel_name: &str, _schema: &Schema) {}

        fn store(&self, snapshot: &Snapshot) -> bool {
            self.seen.lock().unwrap().push(snapshot.timestamp);
            true
        }
    }

    fn sample(ts: i64) -> Snapshot {
        Snapshot {
            channel_name: "chan".to_string(),
            schema_hash: 1,
            timestamp: ts,
            active_mask: vec![1],
            payload: vec![],
        }
    }

    #[test]
    fn pushed_snapshots_are_drained_in_order() {
        let recorder = Arc::new(Recorder { seen: Mutex::new(Vec::new()) });
        let worker = SinkWorker::spawn(recorder.clone(), 16);
        for i in 0..5 {
            assert!(worker.push(sample(i)));
        }
        worker.stop();
        assert_eq!(*recorder.seen.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn full_queue_rejects_push() {
        let (sender, _receiver) = crossbeam_channel::bounded::<Snapshot>(1);
        sender.try_send(sample(0)).unwrap();
        let worker = SinkWorker { sender, run: Arc::new(AtomicBool::new(false)), handle: Mutex::new(None) };
        assert!(!worker.push(sample(1)));
    }

    #[test]
    fn stop_is_idempotent() {
        let recorder = Arc::new(Recorder { seen: Mutex::new(Vec::new()) });
        let worker = SinkWorker::spawn(recorder, 4);
        worker.stop();
        worker.stop();
    }
}
