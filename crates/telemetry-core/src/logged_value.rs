//! Scoped RAII handle bundling a value with its registration (spec §4.5).
//!
//! Grounded on `original_source`'s `data_tamer_cpp/include/data_tamer/
//! values.hpp` `LoggedValue<T>` and the RAII lifetime demo in
//! `original_source/data_tamer_cpp/examples/raii.cpp`.

use std::sync::{Arc, Weak};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::basic_type::Numeric;
use crate::channel::{Channel, RegistrationError, RegistrationId};

struct Registration {
    channel: Weak<Channel>,
    id: RegistrationId,
}

/// A named value of type `T` that registers itself with a channel on
/// construction and unregisters on drop.
///
/// `T` must be `Copy` because the value lives behind a raw pointer the
/// channel reads from a different thread during `take_snapshot`; an
/// in-place mutation through a non-`Copy` type could race a concurrent read
/// of a partially written value.
pub struct LoggedValue<T: Numeric> {
    storage: Arc<RwLock<T>>,
    registration: Option<Registration>,
    name: String,
}

impl<T: Numeric> LoggedValue<T> {
    /// Create and register `name` on `channel` with initial value
    /// `initial`. If registration fails (e.g. the name is already taken
    /// with an incompatible shape), the handle still holds its value
    /// locally but is not attached to the channel.
    #[must_use]
    pub fn new(channel: &Arc<Channel>, name: impl Into<String>, initial: T) -> Self {
        let name = name.into();
        let storage = Arc::new(RwLock::new(initial));
        let registration = Self::try_register(channel, &name, &storage)
            .map(|id| Registration { channel: Arc::downgrade(channel), id });
        Self { storage, registration, name }
    }

    /// Like [`Self::new`] but surfaces the [`RegistrationError`] instead of
    /// silently degrading to a detached handle.
    pub fn try_new(
        channel: &Arc<Channel>,
        name: impl Into<String>,
        initial: T,
    ) -> Result<Self, RegistrationError> {
        let name = name.into();
        let storage = Arc::new(RwLock::new(initial));
        let id = Self::register(channel, &name, &storage)?;
        Ok(Self {
            storage,
            registration: Some(Registration { channel: Arc::downgrade(channel), id }),
            name,
        })
    }

    fn try_register(channel: &Arc<Channel>, name: &str, storage: &Arc<RwLock<T>>) -> Option<RegistrationId> {
        Self::register(channel, name, storage).ok()
    }

    fn register(
        channel: &Arc<Channel>,
        name: &str,
        storage: &Arc<RwLock<T>>,
    ) -> Result<RegistrationId, RegistrationError> {
        // SAFETY: `storage` is an `Arc<RwLock<T>>` held for the lifetime of
        // this `LoggedValue`; the raw pointer below stays valid for as long
        // as this struct (and the `Arc` clone it holds) is alive, and is
        // only ever dereferenced while the channel lock is held.
        let raw: *const T = unsafe { &*storage.data_ptr() };
        unsafe { channel.register_scalar(name, raw) }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read-locked scoped borrow of the current value.
    #[must_use]
    pub fn get(&self) -> RwLockReadGuard<'_, T> {
        self.storage.read()
    }

    /// Write-locked scoped borrow of the current value, for in-place edits.
    #[must_use]
    pub fn get_mut(&self) -> RwLockWriteGuard<'_, T> {
        self.storage.write()
    }

    /// Overwrite the value. When `auto_enable` is set and the handle is
    /// still attached to a live channel, also re-enables the slot if it was
    /// disabled (spec §4.5 `set(v, auto_enable=true)`).
    pub fn set(&self, value: T, auto_enable: bool) {
        *self.storage.write() = value;
        if !auto_enable {
            return;
        }
        if let Some(registration) = &self.registration {
            if let Some(channel) = registration.channel.upgrade() {
                channel.set_enabled(registration.id, true);
            }
        }
    }

    /// Whether the owning channel is still alive. `false` means all
    /// operations degrade to plain in-memory get/set (spec §4.5 last bullet).
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.registration.as_ref().is_some_and(|r| r.channel.upgrade().is_some())
    }
}

impl<T: Numeric> Drop for LoggedValue<T> {
    fn drop(&mut self) {
        if let Some(registration) = self.registration.take() {
            if let Some(channel) = registration.channel.upgrade() {
                channel.unregister(registration.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_on_new_and_unregisters_on_drop() {
        let channel = Channel::new("chan");
        {
            let lv = LoggedValue::new(&channel, "v", 1i32);
            assert!(lv.is_attached());
            assert_eq!(*lv.get(), 1);
        }
        // Slot was freed; a fresh LoggedValue with the same name re-uses it.
        let lv2 = LoggedValue::try_new(&channel, "v", 2i32);
        assert!(lv2.is_ok());
    }

    #[test]
    fn set_with_auto_enable_reenables_disabled_slot() {
        let channel = Channel::new("chan");
        let lv = LoggedValue::try_new(&channel, "v", 1i32).unwrap();
        channel.set_enabled(lv.registration.as_ref().unwrap().id, false);
        assert_eq!(channel.active_flags(), vec![0u8]);
        lv.set(42, true);
        assert_eq!(*lv.get(), 42);
        assert_eq!(channel.active_flags(), vec![1u8]);
    }

    #[test]
    fn set_without_auto_enable_leaves_mask_untouched() {
        let channel = Channel::new("chan");
        let lv = LoggedValue::try_new(&channel, "v", 1i32).unwrap();
        channel.set_enabled(lv.registration.as_ref().unwrap().id, false);
        lv.set(7, false);
        assert_eq!(channel.active_flags(), vec![0u8]);
    }

    #[test]
    fn dropped_channel_degrades_to_local_storage() {
        let lv = {
            let channel = Channel::new("chan");
            LoggedValue::try_new(&channel, "v", 1i32).unwrap()
        };
        assert!(!lv.is_attached());
        lv.set(99, true);
        assert_eq!(*lv.get(), 99);
    }
}
