//! The registration registry, enable mask and `take_snapshot` serializer
//! (spec §4.4). Grounded on `original_source`'s `data_tamer_cpp/src/
//! channel.cpp` (`LogChannel::Pimpl`, `registerValueImpl`, `takeSnapshot`).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use crate::basic_type::{BasicType, Numeric};
use crate::custom_types::{CustomSerializer, CustomType, CustomTypeRegistry, FieldKind};
use crate::schema::{fold_field_into_hash, CustomSchema, Schema, TypeField};
use crate::sink::Sink;
use crate::snapshot::{now_nanos, set_bit, Snapshot};
use crate::value_ptr::ValuePtr;

/// Identifies a contiguous range of schema slots produced by one
/// registration call. Composite registrations that expand to many fields
/// return a range wider than one (spec §3 "RegistrationID").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationId {
    pub first_index: usize,
    pub fields_count: usize,
}

impl std::ops::AddAssign for RegistrationId {
    /// Concatenate two contiguous registrations (`id += other`).
    fn add_assign(&mut self, other: Self) {
        self.fields_count += other.fields_count;
    }
}

/// Errors surfaced by [`Channel::register`] and friends (spec §7).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("field name '{0}' contains a space")]
    NameInvalid(String),
    #[error("cannot register new field '{0}': schema is frozen after the first snapshot")]
    FrozenSchema(String),
    #[error("field '{0}' was previously registered with an incompatible shape")]
    TypeMismatch(String),
    #[error("field '{0}' is already registered; call unregister() first")]
    AlreadyRegistered(String),
}

struct ValueHolder {
    name: String,
    enabled: bool,
    registered: bool,
    value_ptr: ValuePtr,
}

struct Inner {
    channel_name: String,
    series: Vec<ValueHolder>,
    registered_values: HashMap<String, usize>,
    mask_dirty: bool,
    active_mask: Vec<u8>,
    schema: Schema,
    logging_started: bool,
    sinks: Vec<Arc<dyn Sink>>,
}

/// A named, self-contained group of registered values that are snapshotted
/// together. Shared ownership (`Arc<Channel>`) lets [`crate::logged_value::LoggedValue`]
/// hold a [`std::sync::Weak`] back-reference without a cycle.
pub struct Channel {
    inner: Mutex<Inner>,
    type_registry: CustomTypeRegistry,
}

impl Channel {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        let name = name.into();
        Arc::new(Self {
            inner: Mutex::new(Inner {
                schema: Schema::new(&name),
                channel_name: name,
                series: Vec::new(),
                registered_values: HashMap::new(),
                mask_dirty: true,
                active_mask: Vec::new(),
                logging_started: false,
                sinks: Vec::new(),
            }),
            type_registry: CustomTypeRegistry::new(),
        })
    }

    #[must_use]
    pub fn channel_name(&self) -> String {
        self.inner.lock().channel_name.clone()
    }

    /// Register a numeric scalar.
    ///
    /// # Safety
    /// `value` must remain valid for as long as the registration is live.
    pub unsafe fn register_scalar<T: Numeric>(
        &self,
        name: &str,
        value: *const T,
    ) -> Result<RegistrationId, RegistrationError> {
        let value_ptr = unsafe { ValuePtr::scalar(value) };
        self.register_impl(name, value_ptr, T::KIND.as_str(), None)
    }

    /// Register a dynamically sized sequence of numeric values.
    ///
    /// # Safety
    /// `vec` must remain valid for as long as the registration is live.
    pub unsafe fn register_vector<T: Numeric>(
        &self,
        name: &str,
        vec: *const Vec<T>,
    ) -> Result<RegistrationId, RegistrationError> {
        let value_ptr = unsafe { ValuePtr::dynamic_vector(vec) };
        self.register_impl(name, value_ptr, T::KIND.as_str(), None)
    }

    /// Register a fixed-length array of numeric values.
    ///
    /// # Safety
    /// `array` must remain valid for as long as the registration is live.
    pub unsafe fn register_array<T: Numeric, const N: usize>(
        &self,
        name: &str,
        array: *const [T; N],
    ) -> Result<RegistrationId, RegistrationError> {
        let value_ptr = unsafe { ValuePtr::fixed_array(array) };
        self.register_impl(name, value_ptr, T::KIND.as_str(), None)
    }

    /// Register a scalar user composite.
    ///
    /// # Safety
    /// `value` must remain valid for as long as the registration is live.
    pub unsafe fn register_custom<T: CustomType>(
        &self,
        name: &str,
        value: *const T,
    ) -> Result<RegistrationId, RegistrationError> {
        self.ensure_custom_type::<T>();
        let serializer = self.type_registry.get_or_register::<T>();
        let type_schema = serializer.type_schema();
        let value_ptr = unsafe { ValuePtr::custom_scalar(value, serializer) };
        self.register_impl(name, value_ptr, T::type_name(), type_schema)
    }

    /// Register a `Vec<T>` of user composites.
    ///
    /// # Safety
    /// `vec` must remain valid for as long as the registration is live.
    pub unsafe fn register_custom_vector<T: CustomType>(
        &self,
        name: &str,
        vec: *const Vec<T>,
    ) -> Result<RegistrationId, RegistrationError> {
        self.ensure_custom_type::<T>();
        let serializer = self.type_registry.get_or_register::<T>();
        let type_schema = serializer.type_schema();
        let value_ptr = unsafe { ValuePtr::custom_dynamic_vector(vec, serializer) };
        self.register_impl(name, value_ptr, T::type_name(), type_schema)
    }

    /// Register a fixed-length `[T; N]` array of user composites.
    ///
    /// # Safety
    /// `array` must remain valid for as long as the registration is live.
    pub unsafe fn register_custom_array<T: CustomType, const N: usize>(
        &self,
        name: &str,
        array: *const [T; N],
    ) -> Result<RegistrationId, RegistrationError> {
        self.ensure_custom_type::<T>();
        let serializer = self.type_registry.get_or_register::<T>();
        let type_schema = serializer.type_schema();
        let value_ptr = unsafe { ValuePtr::custom_fixed_array(array, serializer) };
        self.register_impl(name, value_ptr, T::type_name(), type_schema)
    }

    /// Register using a caller-supplied opaque serializer, bypassing the
    /// `CustomType` introspection path entirely (spec §4.4
    /// `register_custom`, the "advanced" path of spec §4.2 point 4).
    pub fn register_with_serializer(
        &self,
        name: &str,
        value_ptr: ValuePtr,
        serializer: &Arc<dyn CustomSerializer>,
    ) -> Result<RegistrationId, RegistrationError> {
        self.register_impl(name, value_ptr, serializer.type_name(), serializer.type_schema())
    }

    fn ensure_custom_type<T: CustomType>(&self) {
        if self.type_registry.contains(T::type_name()) {
            return;
        }
        let fields = T::field_schemas();
        let mut inner = self.inner.lock();
        add_custom_type_recursive(&mut inner.schema, T::type_name(), &fields);
    }

    fn register_impl(
        &self,
        name: &str,
        value_ptr: ValuePtr,
        type_name: &str,
        custom_schema: Option<CustomSchema>,
    ) -> Result<RegistrationId, RegistrationError> {
        if name.contains(' ') {
            return Err(RegistrationError::NameInvalid(name.to_string()));
        }
        let mut inner = self.inner.lock();
        inner.mask_dirty = true;

        if let Some(&index) = inner.registered_values.get(name) {
            let holder = &inner.series[index];
            if holder.registered {
                return Err(RegistrationError::AlreadyRegistered(name.to_string()));
            }
            if !holder.value_ptr.shape_eq(&value_ptr) {
                return Err(RegistrationError::TypeMismatch(name.to_string()));
            }
            let holder = &mut inner.series[index];
            holder.registered = true;
            holder.enabled = true;
            holder.value_ptr = value_ptr;
            return Ok(RegistrationId { first_index: index, fields_count: 1 });
        }

        if inner.logging_started {
            return Err(RegistrationError::FrozenSchema(name.to_string()));
        }

        let field = TypeField {
            field_name: name.to_string(),
            r#type: value_ptr.r#type(),
            type_name: if value_ptr.r#type() == BasicType::Other {
                type_name.to_string()
            } else {
                value_ptr.r#type().as_str().to_string()
            },
            is_vector: value_ptr.is_vector(),
            array_size: u32::from(value_ptr.vector_size()),
        };

        let index = inner.series.len();
        inner.series.push(ValueHolder { name: name.to_string(), enabled: true, registered: true, value_ptr });
        inner.registered_values.insert(name.to_string(), index);
        inner.schema.hash = fold_field_into_hash(&field, inner.schema.hash);
        inner.schema.fields.push(field);

        // Opaque advanced-path schema (spec §4.2 point 4): only recorded if
        // this type name wasn't already introspected into custom_types, and
        // first occurrence wins, mirroring `ensure_custom_type`.
        if let Some(custom_schema) = custom_schema {
            if !inner.schema.custom_types.contains_key(type_name) {
                inner.schema.custom_schemas.entry(type_name.to_string()).or_insert(custom_schema);
            }
        }

        Ok(RegistrationId { first_index: index, fields_count: 1 })
    }

    /// Toggle `enabled` for every slot in `id`'s range. Safe to call after
    /// the first snapshot; much cheaper than unregister/register.
    pub fn set_enabled(&self, id: RegistrationId, enable: bool) {
        let mut inner = self.inner.lock();
        for i in 0..id.fields_count {
            let holder = &mut inner.series[id.first_index + i];
            if holder.enabled != enable {
                holder.enabled = enable;
                inner.mask_dirty = true;
            }
        }
    }

    /// Clear `registered`/`enabled` for every slot in `id`'s range. The
    /// schema keeps the slot (append-only); a later `register*` call with
    /// the identical name and shape may reuse it.
    pub fn unregister(&self, id: RegistrationId) {
        let mut inner = self.inner.lock();
        for i in 0..id.fields_count {
            let holder = &mut inner.series[id.first_index + i];
            holder.registered = false;
            holder.enabled = false;
        }
        inner.mask_dirty = true;
    }

    /// Insert a sink into the sink set (idempotent by pointer identity).
    pub fn add_sink(&self, sink: Arc<dyn Sink>) {
        let mut inner = self.inner.lock();
        if !inner.sinks.iter().any(|s| Arc::ptr_eq(s, &sink)) {
            inner.sinks.push(sink);
        }
    }

    #[must_use]
    pub fn active_flags(&self) -> Vec<u8> {
        let mut inner = self.inner.lock();
        rebuild_mask_if_dirty(&mut inner);
        inner.active_mask.clone()
    }

    #[must_use]
    pub fn schema(&self) -> Schema {
        self.inner.lock().schema.clone()
    }

    /// Take a snapshot at `timestamp` (nanoseconds, caller-supplied or
    /// wall-clock-at-entry via [`crate::snapshot::now_nanos`]). Implements
    /// the ten-step protocol of spec §4.4.
    #[must_use]
    pub fn take_snapshot(&self, timestamp: i64) -> bool {
        let (snapshot, sinks) = {
            let mut inner = self.inner.lock();
            if inner.sinks.is_empty() {
                log::debug!("take_snapshot on channel '{}' skipped: no sinks registered", inner.channel_name);
                return false;
            }
            rebuild_mask_if_dirty(&mut inner);

            let payload_cap: usize = inner.series.iter().map(|h| h.value_ptr.serialized_size()).sum();
            let mut payload = vec![0u8; payload_cap];

            if !inner.logging_started {
                inner.logging_started = true;
                let schema = inner.schema.clone();
                let channel_name = inner.channel_name.clone();
                for sink in &inner.sinks {
                    sink.add_channel(&channel_name, &schema);
                }
            }

            let written = {
                let mut cursor: &mut [u8] = &mut payload;
                for holder in &inner.series {
                    if holder.enabled {
                        holder.value_ptr.serialize(&mut cursor);
                    }
                }
                payload_cap - cursor.len()
            };
            payload.truncate(written);

            let snapshot = Snapshot {
                channel_name: inner.channel_name.clone(),
                schema_hash: inner.schema.hash,
                timestamp,
                active_mask: inner.active_mask.clone(),
                payload,
            };
            (snapshot, inner.sinks.clone())
        };

        sinks.iter().fold(true, |acc, sink| {
            let pushed = sink.push(&snapshot);
            if !pushed {
                log::warn!("sink rejected snapshot for channel '{}': queue full", snapshot.channel_name);
            }
            acc & pushed
        })
    }

    /// Convenience over [`Self::take_snapshot`] using the current wall clock.
    #[must_use]
    pub fn take_snapshot_now(&self) -> bool {
        self.take_snapshot(now_nanos())
    }
}

fn rebuild_mask_if_dirty(inner: &mut Inner) {
    if !inner.mask_dirty {
        return;
    }
    inner.mask_dirty = false;
    let len = inner.series.len().div_ceil(8);
    let mut mask = vec![0xFFu8; len];
    for (i, holder) in inner.series.iter().enumerate() {
        if !holder.enabled {
            set_bit(&mut mask, i, false);
        }
    }
    inner.active_mask = mask;
}

fn add_custom_type_recursive(schema: &mut Schema, type_name: &str, fields: &[crate::custom_types::FieldSchema]) {
    if schema.custom_types.contains_key(type_name) {
        return;
    }
    schema.custom_types.insert(type_name.to_string(), crate::custom_types::to_type_fields(fields));
    for field in fields {
        if let FieldKind::Custom { type_name: nested_name, field_schemas, .. } = &field.kind {
            add_custom_type_recursive(schema, nested_name, &field_schemas());
        }
    }
}
