//! The closed set of numeric kinds a [`TypeField`](crate::schema::TypeField) can carry.

use std::fmt;

/// Canonical wire kind of a scalar leaf. Enum types are represented by
/// their underlying integer kind; a user-defined composite is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[repr(u8)]
pub enum BasicType {
    Bool = 0,
    Char = 1,
    Int8 = 2,
    Uint8 = 3,
    Int16 = 4,
    Uint16 = 5,
    Int32 = 6,
    Uint32 = 7,
    Int64 = 8,
    Uint64 = 9,
    Float32 = 10,
    Float64 = 11,
    Other = 12,
}

const TYPES_COUNT: usize = 13;

const NAMES: [&str; TYPES_COUNT] = [
    "bool", "char", "int8", "uint8", "int16", "uint16", "int32", "uint32", "int64", "uint64",
    "float32", "float64", "other",
];

const SIZES: [usize; TYPES_COUNT] = [1, 1, 1, 1, 2, 2, 4, 4, 8, 8, 4, 8, 0];

const ALL: [BasicType; TYPES_COUNT] = [
    BasicType::Bool,
    BasicType::Char,
    BasicType::Int8,
    BasicType::Uint8,
    BasicType::Int16,
    BasicType::Uint16,
    BasicType::Int32,
    BasicType::Uint32,
    BasicType::Int64,
    BasicType::Uint64,
    BasicType::Float32,
    BasicType::Float64,
    BasicType::Other,
];

impl BasicType {
    /// Canonical lowercase name used in the schema text form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        NAMES[self as usize]
    }

    /// Parse a canonical name back into a `BasicType`. Unknown names map to
    /// `Other`, matching the C++ reference's `FromStr` fallback.
    #[must_use]
    pub fn from_str_lossy(name: &str) -> BasicType {
        ALL.iter().copied().find(|t| t.as_str() == name).unwrap_or(BasicType::Other)
    }

    /// Byte size of one element for every kind except `Other`, whose size
    /// depends on the registered custom serializer.
    #[must_use]
    pub fn size_of(self) -> usize {
        SIZES[self as usize]
    }

    /// All non-`Other` kinds, in declaration order.
    #[must_use]
    pub fn numeric_kinds() -> impl Iterator<Item = BasicType> {
        ALL.iter().copied().filter(|t| *t != BasicType::Other)
    }
}

impl fmt::Display for BasicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Implemented for every Rust type that maps onto a numeric [`BasicType`].
/// Mirrors the C++ `GetBasicType<T>()` template.
pub trait Numeric: Copy + 'static {
    const KIND: BasicType;
}

macro_rules! impl_numeric {
    ($ty:ty, $kind:expr) => {
        impl Numeric for $ty {
            const KIND: BasicType = $kind;
        }
    };
}

impl_numeric!(bool, BasicType::Bool);
impl_numeric!(i8, BasicType::Int8);
impl_numeric!(u8, BasicType::Uint8);
impl_numeric!(i16, BasicType::Int16);
impl_numeric!(u16, BasicType::Uint16);
impl_numeric!(i32, BasicType::Int32);
impl_numeric!(u32, BasicType::Uint32);
impl_numeric!(i64, BasicType::Int64);
impl_numeric!(u64, BasicType::Uint64);
impl_numeric!(f32, BasicType::Float32);
impl_numeric!(f64, BasicType::Float64);
