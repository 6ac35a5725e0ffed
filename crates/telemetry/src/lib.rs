//! In-process telemetry snapshotter: periodic binary snapshots of live
//! program variables, with pluggable sinks and an independent schema/
//! snapshot decoder.
//!
//! This crate is a thin facade over three independently versioned crates:
//! [`telemetry_core`] (channel engine, registration, schema), [`telemetry_sinks`]
//! (the sink worker thread and the in-tree [`telemetry_sinks::DummySink`]),
//! and [`telemetry_parser`] (the pure text/wire decoder). Most applications
//! only need [`prelude`].

pub use telemetry_core;
pub use telemetry_parser;
pub use telemetry_sinks;

/// The common set of names most call sites need: channel creation,
/// registration, and the two built-in sink types.
pub mod prelude {
    pub use telemetry_core::{
        BasicType, Channel, ChannelsRegistry, CustomType, LoggedValue, RegistrationError,
        RegistrationId, Schema, Sink, Snapshot, TypeField,
    };
    pub use telemetry_sinks::{DummySink, SinkHandle, SinkStore, SnapshotterConfig};
}
