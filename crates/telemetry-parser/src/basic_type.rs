//! The same closed tag set as `telemetry_core::BasicType`, reimplemented
//! independently on purpose.
//!
//! `original_source`'s `data_tamer_cpp` ships two headers —
//! `data_tamer/types.hpp` for the writer and `data_tamer_parser/
//! data_tamer_parser.hpp` for the reader — that never include each other
//! and must agree on the wire format by implementation discipline alone.
//! This crate keeps that separation deliberately: it does not depend on
//! `telemetry-core`, so a tool linking only `telemetry-parser` can decode
//! schemas emitted by a producer built against a different `telemetry-core`
//! version, as long as both sides honor the text format in spec §4.3.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
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

pub const TYPES_COUNT: usize = 13;

const NAMES: [&str; TYPES_COUNT] = [
    "bool", "char", "int8", "uint8", "int16", "uint16", "int32", "uint32", "int64", "uint64",
    "float32", "float64", "other",
];

/// Legacy uppercase tokens accepted for backward compatibility with older
/// schema text, in the same slot order as [`NAMES`] (`FLOAT`→`float32`,
/// `DOUBLE`→`float64`).
const LEGACY_NAMES: [&str; TYPES_COUNT] = [
    "BOOL", "CHAR", "INT8", "UINT8", "INT16", "UINT16", "INT32", "UINT32", "INT64", "UINT64",
    "FLOAT", "DOUBLE", "OTHER",
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
    #[must_use]
    pub fn as_str(self) -> &'static str {
        NAMES[self as usize]
    }

    #[must_use]
    pub fn size_of(self) -> usize {
        SIZES[self as usize]
    }

    /// Match a canonical (modern, lowercase) token at the start of `text`,
    /// returning the matched kind and the token's byte length.
    #[must_use]
    pub fn match_modern_prefix(text: &str) -> Option<(BasicType, usize)> {
        ALL.iter().find_map(|&kind| {
            let name = NAMES[kind as usize];
            text.starts_with(name).then_some((kind, name.len()))
        })
    }

    /// Match a legacy uppercase token at the start of `text` (back-compat
    /// with pre-v4 schema text, spec §4.7 "legacy uppercase tokens").
    #[must_use]
    pub fn match_legacy_prefix(text: &str) -> Option<BasicType> {
        ALL.iter().find(|&&kind| text.starts_with(LEGACY_NAMES[kind as usize])).copied()
    }
}

impl fmt::Display for BasicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modern_prefix_matches_longest_canonical_name() {
        assert_eq!(BasicType::match_modern_prefix("float32[] vals"), Some((BasicType::Float32, 7)));
        assert_eq!(BasicType::match_modern_prefix("int8 x"), Some((BasicType::Int8, 4)));
    }

    #[test]
    fn legacy_prefix_maps_float_double_onto_new_names() {
        assert_eq!(BasicType::match_legacy_prefix("FLOAT"), Some(BasicType::Float32));
        assert_eq!(BasicType::match_legacy_prefix("DOUBLE"), Some(BasicType::Float64));
    }
}
