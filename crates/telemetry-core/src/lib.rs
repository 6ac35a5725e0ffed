//! Channel engine, schema model and registries for in-process telemetry
//! snapshotting.
//!
//! This crate owns everything upstream of a sink: value registration,
//! schema construction and its stable hash, and the per-channel snapshot
//! protocol. Sink queues/workers live in `telemetry-sinks`; the pure
//! text/wire decoder lives in `telemetry-parser` as an intentionally
//! independent reimplementation (see `telemetry-parser`'s crate docs).

pub mod basic_type;
pub mod channel;
pub mod custom_types;
pub mod logged_value;
pub mod registry;
pub mod schema;
pub mod sink;
pub mod snapshot;
pub mod value_ptr;

pub use basic_type::{BasicType, Numeric};
pub use channel::{Channel, RegistrationError, RegistrationId};
pub use custom_types::{CustomSerializer, CustomType, CustomTypeRegistry};
pub use logged_value::LoggedValue;
pub use registry::ChannelsRegistry;
pub use schema::{schema_to_text, CustomSchema, Schema, TypeField, SCHEMA_VERSION};
pub use sink::Sink;
pub use snapshot::{get_bit, now_nanos, set_bit, Snapshot};
pub use value_ptr::ValuePtr;
