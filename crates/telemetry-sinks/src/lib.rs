//! Queue/worker plumbing and concrete sink adapters (spec §4.6).
//!
//! [`telemetry_core::Channel::take_snapshot`] talks to the narrow
//! [`telemetry_core::Sink`] trait; this crate supplies the machinery real
//! sinks are built from — a bounded MPSC queue drained by a dedicated
//! worker thread ([`SinkWorker`]) — plus [`SinkHandle`], which adapts any
//! [`SinkStore`] implementation into a [`telemetry_core::Sink`].

mod config;
mod dummy_sink;
mod handle;
mod worker;

pub use config::SnapshotterConfig;
pub use dummy_sink::DummySink;
pub use handle::{SinkHandle, DEFAULT_QUEUE_CAPACITY};
pub use worker::{SinkStore, SinkWorker, DEFAULT_POLL_INTERVAL};
