//! Type-erased non-owning reference to a live variable (spec §4.1).
//!
//! Mirrors the C++ `ValuePtr`'s four constructor overloads. Rust has no
//! lifetime-checked way to hold a reference of unknown duration across the
//! registry/channel boundary, so — like the teacher's membrane pointer
//! registry (`crates/glibc_rust/src/safety/registry.rs`, `page_oracle.rs`)
//! — this is a raw, `unsafe`-constructed non-owning pointer. The caller
//! upholds the contract spec §3 "Lifetimes" describes: the pointee outlives
//! every registration that references it.

use std::slice;

use crate::basic_type::{BasicType, Numeric};
use crate::custom_types::CustomSerializer;

enum Shape {
    Scalar,
    DynamicVector,
    FixedArray(u32),
}

/// A type-erased, non-owning reference to a registered value.
pub struct ValuePtr {
    ptr: *const (),
    kind: BasicType,
    element_size: usize,
    shape: Shape,
    custom: Option<std::sync::Arc<dyn CustomSerializer>>,
    len_fn: Option<unsafe fn(*const ()) -> usize>,
}

// SAFETY: a `ValuePtr` never dereferences `ptr` except inside `serialize`/
// `serialized_size`, both of which the channel engine only calls while
// holding the channel's mutex from the thread invoking `take_snapshot`.
// The pointee is `Send + Sync` from the perspective of this crate because
// callers of the unsafe constructors guarantee exclusive registration.
unsafe impl Send for ValuePtr {}
unsafe impl Sync for ValuePtr {}

impl ValuePtr {
    /// Reference to a single scalar numeric value.
    ///
    /// # Safety
    /// `value` must remain valid for as long as the returned `ValuePtr` is
    /// registered with a channel.
    #[must_use]
    pub unsafe fn scalar<T: Numeric>(value: *const T) -> Self {
        Self {
            ptr: value.cast(),
            kind: T::KIND,
            element_size: std::mem::size_of::<T>(),
            shape: Shape::Scalar,
            custom: None,
            len_fn: None,
        }
    }

    /// Reference to a `Vec<T>` of numeric values (dynamically sized).
    ///
    /// # Safety
    /// `vec` must remain valid, and its length must not be mutated
    /// concurrently with a `take_snapshot` call, for as long as the
    /// returned `ValuePtr` is registered.
    #[must_use]
    pub unsafe fn dynamic_vector<T: Numeric>(vec: *const Vec<T>) -> Self {
        unsafe fn len_of<T>(ptr: *const ()) -> usize {
            unsafe { (*ptr.cast::<Vec<T>>()).len() }
        }
        Self {
            ptr: vec.cast(),
            kind: T::KIND,
            element_size: std::mem::size_of::<T>(),
            shape: Shape::DynamicVector,
            custom: None,
            len_fn: Some(len_of::<T>),
        }
    }

    /// Reference to a fixed-length `[T; N]` array of numeric values.
    ///
    /// # Safety
    /// `array` must remain valid for as long as the returned `ValuePtr` is
    /// registered.
    #[must_use]
    pub unsafe fn fixed_array<T: Numeric, const N: usize>(array: *const [T; N]) -> Self {
        Self {
            ptr: array.cast(),
            kind: T::KIND,
            element_size: std::mem::size_of::<T>(),
            shape: Shape::FixedArray(N as u32),
            custom: None,
            len_fn: None,
        }
    }

    /// Reference to a scalar custom-serialized instance.
    ///
    /// # Safety
    /// Same contract as [`ValuePtr::scalar`]; `serializer` is applied to
    /// `*instance` on every `serialize`/`serialized_size` call.
    #[must_use]
    pub unsafe fn custom_scalar<T>(
        instance: *const T,
        serializer: std::sync::Arc<dyn CustomSerializer>,
    ) -> Self {
        Self {
            ptr: instance.cast(),
            kind: BasicType::Other,
            element_size: 0,
            shape: Shape::Scalar,
            custom: Some(serializer),
            len_fn: None,
        }
    }

    /// Reference to a `Vec<T>` of custom-serialized instances.
    ///
    /// # Safety
    /// Same contract as [`ValuePtr::dynamic_vector`].
    #[must_use]
    pub unsafe fn custom_dynamic_vector<T>(
        vec: *const Vec<T>,
        serializer: std::sync::Arc<dyn CustomSerializer>,
    ) -> Self {
        unsafe fn len_of<T>(ptr: *const ()) -> usize {
            unsafe { (*ptr.cast::<Vec<T>>()).len() }
        }
        Self {
            ptr: vec.cast(),
            kind: BasicType::Other,
            element_size: 0,
            shape: Shape::DynamicVector,
            custom: Some(serializer),
            len_fn: Some(len_of::<T>),
        }
    }

    /// Reference to a fixed-length `[T; N]` array of custom-serialized
    /// instances.
    ///
    /// # Safety
    /// Same contract as [`ValuePtr::fixed_array`].
    #[must_use]
    pub unsafe fn custom_fixed_array<T, const N: usize>(
        array: *const [T; N],
        serializer: std::sync::Arc<dyn CustomSerializer>,
    ) -> Self {
        Self {
            ptr: array.cast(),
            kind: BasicType::Other,
            element_size: 0,
            shape: Shape::FixedArray(N as u32),
            custom: Some(serializer),
            len_fn: None,
        }
    }

    #[must_use]
    pub fn r#type(&self) -> BasicType {
        self.kind
    }

    #[must_use]
    pub fn is_vector(&self) -> bool {
        !matches!(self.shape, Shape::Scalar)
    }

    /// `0` means dynamically sized.
    #[must_use]
    pub fn vector_size(&self) -> u16 {
        match self.shape {
            Shape::Scalar | Shape::DynamicVector => 0,
            Shape::FixedArray(n) => n as u16,
        }
    }

    fn runtime_len(&self) -> usize {
        match self.shape {
            Shape::Scalar => 1,
            Shape::FixedArray(n) => n as usize,
            Shape::DynamicVector => {
                // SAFETY: see the constructor's safety contract.
                unsafe { (self.len_fn.expect("dynamic vector always carries a len_fn"))(self.ptr) }
            }
        }
    }

    /// Byte length this value will occupy in a serialized payload.
    #[must_use]
    pub fn serialized_size(&self) -> usize {
        if let Some(serializer) = &self.custom {
            return self.custom_size(serializer.as_ref());
        }
        match self.shape {
            Shape::Scalar => self.element_size,
            Shape::FixedArray(n) => n as usize * self.element_size,
            Shape::DynamicVector => 4 + self.runtime_len() * self.element_size,
        }
    }

    fn custom_size(&self, serializer: &dyn CustomSerializer) -> usize {
        match self.shape {
            Shape::Scalar => serializer.serialized_size_raw(self.ptr),
            Shape::FixedArray(n) => {
                if serializer.is_fixed_size() {
                    n as usize * serializer.fixed_size()
                } else {
                    // SAFETY: pointer layout for custom fixed arrays is an
                    // opaque `[T; N]`; the registry's stride knowledge
                    // (element_size) is 0 for custom types, so we delegate
                    // per-element sizing through the serializer's raw API.
                    serializer.array_serialized_size_raw(self.ptr, n as usize)
                }
            }
            Shape::DynamicVector => {
                let len = self.runtime_len();
                if len == 0 {
                    return 4;
                }
                if serializer.is_fixed_size() {
                    4 + len * serializer.fixed_size()
                } else {
                    4 + serializer.vec_serialized_size_raw(self.ptr)
                }
            }
        }
    }

    /// Write this value's serialized bytes into `dest`, advancing it past
    /// what was written. `dest` must have at least [`Self::serialized_size`]
    /// bytes remaining.
    pub fn serialize(&self, dest: &mut &mut [u8]) {
        if let Some(serializer) = &self.custom {
            self.serialize_custom(serializer.as_ref(), dest);
            return;
        }
        match self.shape {
            Shape::Scalar => self.write_raw(self.ptr, self.element_size, dest),
            Shape::FixedArray(n) => {
                for i in 0..n as usize {
                    let elem = unsafe { self.ptr.cast::<u8>().add(i * self.element_size) };
                    self.write_raw(elem.cast(), self.element_size, dest);
                }
            }
            Shape::DynamicVector => {
                let len = self.runtime_len() as u32;
                write_len_prefix(len, dest);
                let data_ptr = self.vec_data_ptr();
                for i in 0..len as usize {
                    let elem = unsafe { data_ptr.add(i * self.element_size) };
                    self.write_raw(elem.cast(), self.element_size, dest);
                }
            }
        }
    }

    fn vec_data_ptr(&self) -> *const u8 {
        macro_rules! data_ptr_for {
            ($ty:ty) => {
                unsafe { (*self.ptr.cast::<Vec<$ty>>()).as_ptr().cast::<u8>() }
            };
        }
        match self.kind {
            BasicType::Bool => data_ptr_for!(bool),
            BasicType::Int8 => data_ptr_for!(i8),
            BasicType::Uint8 | BasicType::Char => data_ptr_for!(u8),
            BasicType::Int16 => data_ptr_for!(i16),
            BasicType::Uint16 => data_ptr_for!(u16),
            BasicType::Int32 => data_ptr_for!(i32),
            BasicType::Uint32 => data_ptr_for!(u32),
            BasicType::Int64 => data_ptr_for!(i64),
            BasicType::Uint64 => data_ptr_for!(u64),
            BasicType::Float32 => data_ptr_for!(f32),
            BasicType::Float64 => data_ptr_for!(f64),
            BasicType::Other => unreachable!("custom vectors are serialized via serialize_custom"),
        }
    }

    fn write_raw(&self, ptr: *const (), len: usize, dest: &mut &mut [u8]) {
        let bytes = unsafe { slice::from_raw_parts(ptr.cast::<u8>(), len) };
        let (head, tail) = std::mem::take(dest).split_at_mut(len);
        if cfg!(target_endian = "little") {
            head.copy_from_slice(bytes);
        } else {
            for (dst, src) in head.iter_mut().zip(bytes.iter().rev()) {
                *dst = *src;
            }
        }
        *dest = tail;
    }

    fn serialize_custom(&self, serializer: &dyn CustomSerializer, dest: &mut &mut [u8]) {
        match self.shape {
            Shape::Scalar => serializer.serialize_raw(self.ptr, dest),
            Shape::FixedArray(n) => serializer.serialize_array_raw(self.ptr, n as usize, dest),
            Shape::DynamicVector => {
                let len = self.runtime_len() as u32;
                write_len_prefix(len, dest);
                serializer.serialize_vec_raw(self.ptr, dest);
            }
        }
    }

    /// Compares `(type, is_vector, vector_size)` only, per spec §4.1 — used
    /// to validate re-registration under an identical name.
    #[must_use]
    pub fn shape_eq(&self, other: &ValuePtr) -> bool {
        self.kind == other.kind
            && self.is_vector() == other.is_vector()
            && self.vector_size() == other.vector_size()
    }
}

fn write_len_prefix(len: u32, dest: &mut &mut [u8]) {
    let bytes = len.to_le_bytes();
    let (head, tail) = std::mem::take(dest).split_at_mut(4);
    head.copy_from_slice(&bytes);
    *dest = tail;
}
