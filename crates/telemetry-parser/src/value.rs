//! The decoded-leaf payload handed to a `parse_snapshot` number callback.
//! Mirrors the C++ `VarNumber` variant (`original_source`'s
//! `data_tamer_parser.hpp`).

/// A decoded numeric leaf, tagged by its source [`crate::BasicType`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberValue {
    Bool(bool),
    Char(u8),
    Int8(i8),
    Uint8(u8),
    Int16(i16),
    Uint16(u16),
    Int32(i32),
    Uint32(u32),
    Int64(i64),
    Uint64(u64),
    Float32(f32),
    Float64(f64),
}

impl NumberValue {
    /// Widen to `f64`, matching the C++ reference's `OTHER ⇒ NaN` fallback
    /// semantics for any context that wants a single scalar view.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        match self {
            NumberValue::Bool(v) => f64::from(u8::from(v)),
            NumberValue::Char(v) | NumberValue::Uint8(v) => f64::from(v),
            NumberValue::Int8(v) => f64::from(v),
            NumberValue::Int16(v) => f64::from(v),
            NumberValue::Uint16(v) => f64::from(v),
            NumberValue::Int32(v) => f64::from(v),
            NumberValue::Uint32(v) => f64::from(v),
            NumberValue::Int64(v) => v as f64,
            NumberValue::Uint64(v) => v as f64,
            NumberValue::Float32(v) => f64::from(v),
            NumberValue::Float64(v) => v,
        }
    }
}
