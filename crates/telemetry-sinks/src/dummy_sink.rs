//! A no-op sink that only counts snapshots, for tests and debugging.
//!
//! Grounded on `original_source`'s `data_tamer_cpp/include/data_tamer/
//! sinks/dummy_sink.hpp` `DummySink`.

use std::collections::HashMap;

use parking_lot::RwLock;

use telemetry_core::{Schema, Snapshot};

use crate::worker::SinkStore;

#[derive(Default)]
struct State {
    schemas: HashMap<u64, Schema>,
    schema_names: HashMap<u64, String>,
    snapshot_counts: HashMap<u64, u64>,
    latest_snapshot: Option<Snapshot>,
}

/// Records every schema it is given and counts snapshots per schema hash.
/// Does not do anything with the payload bytes beyond keeping the latest one.
#[derive(Default)]
pub struct DummySink {
    state: RwLock<State>,
}

impl DummySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn snapshot_count(&self, schema_hash: u64) -> u64 {
        self.state.read().snapshot_counts.get(&schema_hash).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn channel_name_for(&self, schema_hash: u64) -> Option<String> {
        self.state.read().schema_names.get(&schema_hash).cloned()
    }

    #[must_use]
    pub fn schema_for(&self, schema_hash: u64) -> Option<Schema> {
        self.state.read().schemas.get(&schema_hash).cloned()
    }

    #[must_use]
    pub fn latest_snapshot(&self) -> Option<Snapshot> {
        self.state.read().latest_snapshot.clone()
    }
}

impl SinkStore for DummySink {
    fn add_channel(&self, channel_name: &str, schema: &Schema) {
        let mut state = self.state.write();
        state.schemas.insert(schema.hash, schema.clone());
        state.schema_names.insert(schema.hash, channel_name.to_string());
        state.snapshot_counts.entry(schema.hash).or_insert(0);
    }

    fn store(&self, snapshot: &Snapshot) -> bool {
        let mut state = self.state.write();
        state.latest_snapshot = Some(snapshot.clone());
        *state.snapshot_counts.entry(snapshot.schema_hash).or_insert(0) += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_snapshots_per_schema_hash() {
        let sink = DummySink::new();
        let schema = Schema::new("chan");
        sink.add_channel("chan", &schema);
        assert_eq!(sink.snapshot_count(schema.hash), 0);
        let snapshot = Snapshot { channel_name: "chan".to_string(), schema_hash: schema.hash, timestamp: 1, active_mask: vec![], payload: vec![] };
        sink.store(&snapshot);
        sink.store(&snapshot);
        assert_eq!(sink.snapshot_count(schema.hash), 2);
        assert_eq!(sink.channel_name_for(schema.hash).as_deref(), Some("chan"));
    }

    #[test]
    fn add_channel_is_idempotent_under_identical_schema() {
        let sink = DummySink::new();
        let schema = Schema::new("chan");
        sink.add_channel("chan", &schema);
        sink.add_channel("chan", &schema);
        assert_eq!(sink.snapshot_count(schema.hash), 0);
    }
}
