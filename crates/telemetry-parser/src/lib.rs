//! Pure, side-effect-free schema-text and snapshot-payload decoder.
//!
//! This crate is an intentionally independent reimplementation of the wire
//! format `telemetry-core` writes — see [`basic_type`] and [`schema`] doc
//! comments for why it does not depend on `telemetry-core` at all. A tool
//! that only needs to decode recorded snapshots (offline analysis, a
//! separately versioned log viewer) can depend on this crate alone.

pub mod basic_type;
pub mod error;
pub mod schema;
pub mod snapshot;
pub mod value;

pub use basic_type::BasicType;
pub use error::ParseError;
pub use schema::{parse_schema, Schema, TypeField, SCHEMA_VERSION};
pub use snapshot::{get_bit, parse_snapshot, SnapshotView};
pub use value::NumberValue;
