//! Compile-time-introspected composite types (spec §4.2).
//!
//! Rust has no template specialization, so — per spec §9's "derive macro or
//! a trait the user implements manually" — this module takes the manual
//! trait path: a user composite implements [`CustomType`], declaring its
//! ordered field list via [`CustomType::field_schemas`]. [`CustomTypeRegistry`]
//! then lazily builds and deduplicates a type-erased [`CustomSerializer`]
//! per type name, exactly mirroring the C++ `TypesRegistry::getSerializer<T>()`
//! in `original_source`'s `custom_types.hpp`.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::basic_type::BasicType;
use crate::schema::{CustomSchema, TypeField};

/// One field of a user composite, as declared by [`CustomType::field_schemas`].
pub struct FieldSchema {
    pub name: &'static str,
    pub kind: FieldKind,
    pub is_vector: bool,
    /// `0` for a scalar or dynamic sequence; `> 0` for a fixed array.
    pub array_size: u32,
}

pub enum FieldKind {
    Numeric(BasicType),
    /// A nested composite. `is_fixed_size`/`fixed_size` are the nested
    /// type's own static functions, threaded through without needing a
    /// registry lookup at schema-build time.
    Custom {
        type_name: &'static str,
        is_fixed_size: fn() -> bool,
        fixed_size: fn() -> usize,
        /// Recursively describes the nested type's own fields, so the
        /// channel engine can register it into `Schema::custom_types`
        /// transitively (spec §4.3 point 4).
        field_schemas: fn() -> Vec<FieldSchema>,
    },
}

impl FieldSchema {
    fn is_fixed_size(&self) -> bool {
        if self.is_vector && self.array_size == 0 {
            return false;
        }
        match &self.kind {
            FieldKind::Numeric(_) => true,
            FieldKind::Custom { is_fixed_size, .. } => is_fixed_size(),
        }
    }

    fn element_fixed_size(&self) -> usize {
        match &self.kind {
            FieldKind::Numeric(k) => k.size_of(),
            FieldKind::Custom { fixed_size, .. } => fixed_size(),
        }
    }

    fn contribution(&self) -> usize {
        let n = if self.is_vector { self.array_size as usize } else { 1 };
        n * self.element_fixed_size()
    }
}

/// A user-defined composite type with a declared, ordered field list.
///
/// Implementors provide the static shape (`type_name`, `field_schemas`) the
/// registry uses to build the schema, plus the instance-level
/// serialization the registry delegates to once it has decided whether the
/// type is fixed-size.
pub trait CustomType: 'static {
    fn type_name() -> &'static str
    where
        Self: Sized;

    /// Ordered `(field_name, shape)` list, walked in declaration order —
    /// the Rust equivalent of the C++ `TypeDefinition(dummy, visitor)` call.
    fn field_schemas() -> Vec<FieldSchema>
    where
        Self: Sized;

    /// Serialize `self`'s fields, in declaration order, into `dest`.
    fn serialize_into(&self, dest: &mut &mut [u8]);

    /// Size of this particular instance. Only consulted when the type is
    /// not fixed-size (i.e. contains a dynamic sequence somewhere in its
    /// field tree); fixed-size types use the statically computed size.
    fn instance_size(&self) -> usize {
        0
    }
}

/// Compute `is_fixed_size` for a type from its field list, per spec §4.2
/// point 2: fixed iff every leaf is numeric or a fixed array of fixed
/// elements; a dynamic sequence anywhere ⇒ not fixed.
#[must_use]
pub fn is_fixed_size(fields: &[FieldSchema]) -> bool {
    fields.iter().all(FieldSchema::is_fixed_size)
}

/// Sum of each field's fixed contribution. Only meaningful when
/// [`is_fixed_size`] returned `true` for the same field list.
#[must_use]
pub fn fixed_size_of(fields: &[FieldSchema]) -> usize {
    fields.iter().map(FieldSchema::contribution).sum()
}

/// Convert a type's static field list into the [`TypeField`] rows stored in
/// `Schema::custom_types`.
#[must_use]
pub fn to_type_fields(fields: &[FieldSchema]) -> Vec<TypeField> {
    fields
        .iter()
        .map(|f| {
            let (kind, type_name) = match &f.kind {
                FieldKind::Numeric(k) => (*k, k.as_str().to_string()),
                FieldKind::Custom { type_name, .. } => (BasicType::Other, (*type_name).to_string()),
            };
            TypeField {
                field_name: f.name.to_string(),
                r#type: kind,
                type_name,
                is_vector: f.is_vector,
                array_size: f.array_size,
            }
        })
        .collect()
}

/// Type-erased, raw-pointer-based serializer (spec §4.2's `CustomSerializer`
/// interface, spec §6's "Custom-serializer interface"). Every method takes
/// `*const ()` cast from the concrete `*const T` the [`ValuePtr`](crate::value_ptr::ValuePtr)
/// holds; `CustomSerializerT<T>` below is the only safe way to construct one.
pub trait CustomSerializer: Send + Sync {
    fn type_name(&self) -> &str;
    fn is_fixed_size(&self) -> bool;
    fn fixed_size(&self) -> usize;

    /// The advanced/opaque path's own schema (spec §4.2 point 4, §6): an
    /// `(encoding, schema_text)` pair the registry records verbatim into
    /// `Schema::custom_schemas` instead of introspecting fields. Serializers
    /// built from [`CustomType`] (the `CustomSerializerT<T>` bridge below)
    /// have nothing opaque to report, so the default is `None`.
    fn type_schema(&self) -> Option<CustomSchema> {
        None
    }

    /// # Safety
    /// `ptr` must point to a live `T` for the `T` this serializer was built for.
    fn serialized_size_raw(&self, ptr: *const ()) -> usize;
    /// # Safety
    /// Same as [`Self::serialized_size_raw`].
    fn serialize_raw(&self, ptr: *const (), dest: &mut &mut [u8]);

    /// # Safety
    /// `ptr` must point to a live `[T; n]`.
    fn array_serialized_size_raw(&self, ptr: *const (), n: usize) -> usize;
    /// # Safety
    /// Same as [`Self::array_serialized_size_raw`].
    fn serialize_array_raw(&self, ptr: *const (), n: usize, dest: &mut &mut [u8]);

    /// # Safety
    /// `ptr` must point to a live `Vec<T>`.
    fn vec_serialized_size_raw(&self, ptr: *const ()) -> usize;
    /// # Safety
    /// Same as [`Self::vec_serialized_size_raw`].
    fn serialize_vec_raw(&self, ptr: *const (), dest: &mut &mut [u8]);
}

struct CustomSerializerT<T: CustomType> {
    name: String,
    fixed_size: usize,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T: CustomType> CustomSerializerT<T> {
    fn new() -> Self {
        let fields = T::field_schemas();
        let fixed = if is_fixed_size(&fields) { fixed_size_of(&fields) } else { 0 };
        Self { name: T::type_name().to_string(), fixed_size: fixed, _marker: std::marker::PhantomData }
    }
}

impl<T: CustomType> CustomSerializer for CustomSerializerT<T> {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn is_fixed_size(&self) -> bool {
        self.fixed_size > 0
    }

    fn fixed_size(&self) -> usize {
        self.fixed_size
    }

    fn serialized_size_raw(&self, ptr: *const ()) -> usize {
        if self.fixed_size > 0 {
            return self.fixed_size;
        }
        let obj = unsafe { &*ptr.cast::<T>() };
        obj.instance_size()
    }

    fn serialize_raw(&self, ptr: *const (), dest: &mut &mut [u8]) {
        let obj = unsafe { &*ptr.cast::<T>() };
        obj.serialize_into(dest);
    }

    fn array_serialized_size_raw(&self, ptr: *const (), n: usize) -> usize {
        if self.fixed_size > 0 {
            return n * self.fixed_size;
        }
        let slice = unsafe { std::slice::from_raw_parts(ptr.cast::<T>(), n) };
        slice.iter().map(T::instance_size).sum()
    }

    fn serialize_array_raw(&self, ptr: *const (), n: usize, dest: &mut &mut [u8]) {
        let slice = unsafe { std::slice::from_raw_parts(ptr.cast::<T>(), n) };
        for item in slice {
            item.serialize_into(dest);
        }
    }

    fn vec_serialized_size_raw(&self, ptr: *const ()) -> usize {
        let vec = unsafe { &*ptr.cast::<Vec<T>>() };
        if self.fixed_size > 0 {
            vec.len() * self.fixed_size
        } else {
            vec.iter().map(T::instance_size).sum()
        }
    }

    fn serialize_vec_raw(&self, ptr: *const (), dest: &mut &mut [u8]) {
        let vec = unsafe { &*ptr.cast::<Vec<T>>() };
        for item in vec {
            item.serialize_into(dest);
        }
    }
}

/// Registry of [`CustomSerializer`]s, deduplicated by type name
/// (first writer wins, spec §4.2 point 1).
#[derive(Default)]
pub struct CustomTypeRegistry {
    types: Mutex<HashMap<String, Arc<dyn CustomSerializer>>>,
}

impl CustomTypeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (lazily building) the serializer for `T`, and the field schema
    /// list used to extend a channel's schema.
    #[must_use]
    pub fn get_or_register<T: CustomType>(&self) -> Arc<dyn CustomSerializer> {
        let name = T::type_name().to_string();
        let mut types = self.types.lock();
        if let Some(existing) = types.get(&name) {
            return existing.clone();
        }
        let serializer: Arc<dyn CustomSerializer> = Arc::new(CustomSerializerT::<T>::new());
        types.insert(name, serializer.clone());
        serializer
    }

    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.types.lock().contains_key(type_name)
    }
}

static GLOBAL_TYPES: OnceLock<CustomTypeRegistry> = OnceLock::new();

/// Process-wide custom-type registry, analogous to the teacher's
/// `global_registry()` (`crates/glibc_rust/src/safety/registry.rs`).
#[must_use]
pub fn global_registry() -> &'static CustomTypeRegistry {
    GLOBAL_TYPES.get_or_init(CustomTypeRegistry::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Point3D {
        x: f64,
        y: f64,
        z: f64,
    }

    impl CustomType for Point3D {
        fn type_name() -> &'static str {
            "Point3D"
        }

        fn field_schemas() -> Vec<FieldSchema> {
            vec![
                FieldSchema { name: "x", kind: FieldKind::Numeric(BasicType::Float64), is_vector: false, array_size: 0 },
                FieldSchema { name: "y", kind: FieldKind::Numeric(BasicType::Float64), is_vector: false, array_size: 0 },
                FieldSchema { name: "z", kind: FieldKind::Numeric(BasicType::Float64), is_vector: false, array_size: 0 },
            ]
        }

        fn serialize_into(&self, dest: &mut &mut [u8]) {
            for v in [self.x, self.y, self.z] {
                let bytes = v.to_le_bytes();
                let (head, tail) = std::mem::take(dest).split_at_mut(8);
                head.copy_from_slice(&bytes);
                *dest = tail;
            }
        }
    }

    #[test]
    fn point3d_is_fixed_size_24_bytes() {
        let registry = CustomTypeRegistry::new();
        let serializer = registry.get_or_register::<Point3D>();
        assert!(serializer.is_fixed_size());
        assert_eq!(serializer.fixed_size(), 24);
    }

    #[test]
    fn dedup_by_name_first_writer_wins() {
        let registry = CustomTypeRegistry::new();
        let a = registry.get_or_register::<Point3D>();
        let b = registry.get_or_register::<Point3D>();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn serializes_in_declaration_order() {
        let registry = CustomTypeRegistry::new();
        let serializer = registry.get_or_register::<Point3D>();
        let p = Point3D { x: 1.0, y: 2.0, z: 3.0 };
        let mut buf = [0u8; 24];
        {
            let mut cursor: &mut [u8] = &mut buf;
            serializer.serialize_raw((&p as *const Point3D).cast(), &mut cursor);
        }
        assert_eq!(f64::from_le_bytes(buf[0..8].try_into().unwrap()), 1.0);
        assert_eq!(f64::from_le_bytes(buf[16..24].try_into().unwrap()), 3.0);
    }
}
