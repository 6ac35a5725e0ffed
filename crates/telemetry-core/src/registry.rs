//! Process-wide channel directory (spec §4.5 "ChannelsRegistry").
//!
//! Mirrors the teacher's `OnceLock<PointerRegistry>` singleton pattern
//! (`crates/glibc_rust/src/safety/registry.rs`) while also exposing an
//! explicit, non-singleton constructor for tests that want an isolated
//! registry rather than the process-wide one.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::channel::Channel;
use crate::sink::Sink;

/// A lookup table of named [`Channel`]s, plus a set of default sinks
/// attached to every channel created through [`Self::get_channel`].
#[derive(Default)]
pub struct ChannelsRegistry {
    channels: RwLock<HashMap<String, Arc<Channel>>>,
    default_sinks: RwLock<Vec<Arc<dyn Sink>>>,
}

impl ChannelsRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the channel named `name`, creating it (with every registered
    /// default sink attached) if it does not already exist.
    #[must_use]
    pub fn get_channel(&self, name: &str) -> Arc<Channel> {
        if let Some(existing) = self.channels.read().get(name) {
            return existing.clone();
        }
        let mut channels = self.channels.write();
        if let Some(existing) = channels.get(name) {
            return existing.clone();
        }
        let channel = Channel::new(name);
        for sink in self.default_sinks.read().iter() {
            channel.add_sink(sink.clone());
        }
        channels.insert(name.to_string(), channel.clone());
        channel
    }

    /// Register a sink that will be attached to every channel created from
    /// now on (existing channels are left untouched, spec §4.5 point 2).
    pub fn add_default_sink(&self, sink: Arc<dyn Sink>) {
        self.default_sinks.write().push(sink);
    }

    /// Drop every known channel and default sink. Intended for test
    /// isolation; the process-wide registry is rarely cleared in practice.
    pub fn clear(&self) {
        self.channels.write().clear();
        self.default_sinks.write().clear();
    }

    #[must_use]
    pub fn channel_names(&self) -> Vec<String> {
        self.channels.read().keys().cloned().collect()
    }
}

static GLOBAL_CHANNELS: OnceLock<ChannelsRegistry> = OnceLock::new();

/// The process-wide registry used by callers that don't manage their own
/// `ChannelsRegistry` instance.
#[must_use]
pub fn global_registry() -> &'static ChannelsRegistry {
    GLOBAL_CHANNELS.get_or_init(ChannelsRegistry::new)
}
