//! Cross-crate integration scenarios for the telemetry snapshotter.
//!
//! This crate has no public API of its own; see `tests/` for the scenarios
//! from the channel-engine specification (sink accounting, mask flips,
//! dynamic-vector resizing, custom composites, parser round-trips).
