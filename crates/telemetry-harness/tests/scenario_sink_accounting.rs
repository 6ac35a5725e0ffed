//! Spec §8 scenario 1: two sinks on one channel, repeated snapshots.

use std::sync::Arc;

use telemetry_core::Channel;
use telemetry_sinks::{DummySink, SinkHandle};

#[test]
fn two_sinks_each_reach_ten_snapshots_with_one_schema_entry() {
    let channel = Channel::new("metrics");
    let sink_a = SinkHandle::new(DummySink::new());
    let sink_b = SinkHandle::new(DummySink::new());
    channel.add_sink(sink_a.clone());
    channel.add_sink(sink_b.clone());

    let var: f64 = 3.14;
    let count: i32 = 49;
    unsafe { channel.register_scalar("var", &var) }.unwrap();
    unsafe { channel.register_scalar("count", &count) }.unwrap();

    for _ in 0..10 {
        assert!(channel.take_snapshot(0));
    }

    // `stop` joins the worker thread only after it drains every queued
    // snapshot, so it also serves as the synchronization point between the
    // asynchronous sink worker and these assertions.
    sink_a.stop();
    sink_b.stop();

    let schema_hash = channel.schema().hash;
    for sink in [&sink_a, &sink_b] {
        assert_eq!(sink.inner().snapshot_count(schema_hash), 10);
        assert_eq!(sink.inner().schema_for(schema_hash).unwrap().hash, schema_hash);
        assert_eq!(sink.inner().channel_name_for(schema_hash).as_deref(), Some("metrics"));
    }
}
