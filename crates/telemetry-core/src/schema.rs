//! The schema model and its stable hash (spec §3, §4.3).

use std::collections::BTreeMap;

use crate::basic_type::BasicType;

/// A single schema field: either a top-level channel field or a member of a
/// custom type's field list.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TypeField {
    pub field_name: String,
    pub r#type: BasicType,
    pub type_name: String,
    pub is_vector: bool,
    pub array_size: u32,
}

impl TypeField {
    /// A plain scalar field of a numeric kind.
    #[must_use]
    pub fn scalar(field_name: impl Into<String>, kind: BasicType) -> Self {
        Self {
            field_name: field_name.into(),
            r#type: kind,
            type_name: kind.as_str().to_string(),
            is_vector: false,
            array_size: 0,
        }
    }

    /// A dynamically sized sequence (`array_size == 0`).
    #[must_use]
    pub fn dynamic_vector(field_name: impl Into<String>, kind: BasicType, type_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            r#type: kind,
            type_name: type_name.into(),
            is_vector: true,
            array_size: 0,
        }
    }

    /// A fixed-length array field (`array_size > 0`).
    #[must_use]
    pub fn fixed_array(field_name: impl Into<String>, kind: BasicType, type_name: impl Into<String>, n: u32) -> Self {
        Self {
            field_name: field_name.into(),
            r#type: kind,
            type_name: type_name.into(),
            is_vector: true,
            array_size: n,
        }
    }
}

/// An opaque, user-supplied schema for a custom-serialized type: the
/// advanced path where the registry records `(encoding, schema_text)`
/// without introspecting fields (spec §3, §4.2 point 4). Carries
/// `serde::Serialize`/`Deserialize` so a host application can persist or
/// transmit the opaque pair alongside its own config, even though the core
/// wire format itself (spec §6) is hand-rolled, not `serde`-encoded.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CustomSchema {
    pub encoding: String,
    pub schema_text: String,
}

/// The ordered list of fields a channel will ever emit, plus transitive
/// composite definitions, identified by a stable 64-bit hash.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Schema {
    pub hash: u64,
    pub channel_name: String,
    pub fields: Vec<TypeField>,
    /// Keyed by type name; first-occurrence wins (spec §4.3 point 4).
    pub custom_types: BTreeMap<String, Vec<TypeField>>,
    pub custom_schemas: BTreeMap<String, CustomSchema>,
}

impl Schema {
    /// A fresh, empty schema for `channel_name`. `hash` is seeded with
    /// `str_hash(channel_name)` per spec §3.
    #[must_use]
    pub fn new(channel_name: impl Into<String>) -> Self {
        let channel_name = channel_name.into();
        let hash = str_hash(&channel_name);
        Self {
            hash,
            channel_name,
            fields: Vec::new(),
            custom_types: BTreeMap::new(),
            custom_schemas: BTreeMap::new(),
        }
    }
}

/// FNV-1a over raw bytes. Deliberately not `std::hash::Hash` /
/// `DefaultHasher`: that hasher's algorithm is explicitly unspecified
/// across Rust releases, which would make the schema hash unstable between
/// the process that records a channel and a separately built tool that
/// parses its schema text later. FNV-1a is fixed by its constants alone, so
/// `telemetry-parser` can reimplement it byte-for-byte with no shared
/// dependency and still agree bit-for-bit.
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = OFFSET_BASIS;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

fn str_hash(s: &str) -> u64 {
    fnv1a(s.as_bytes())
}

fn u64_hash(v: u64) -> u64 {
    fnv1a(&v.to_le_bytes())
}

fn bool_hash(v: bool) -> u64 {
    fnv1a(&[u8::from(v)])
}

/// `combine(h, x) = h XOR (hash(x) + 0x9e3779b9 + (h<<6) + (h>>2))`.
fn combine(hash: u64, value_hash: u64) -> u64 {
    hash ^ value_hash
        .wrapping_add(0x9e37_79b9)
        .wrapping_add(hash << 6)
        .wrapping_add(hash >> 2)
}

/// Fold a single top-level [`TypeField`] into the rolling schema hash, in
/// the order: name, type-kind, optional type-name, is_vector, array_size.
/// The parser side (`telemetry-parser`) MUST reproduce this exactly.
#[must_use]
pub fn fold_field_into_hash(field: &TypeField, hash: u64) -> u64 {
    let mut h = hash;
    h = combine(h, str_hash(&field.field_name));
    h = combine(h, u64_hash(field.r#type as u64));
    if field.r#type == BasicType::Other {
        h = combine(h, str_hash(&field.type_name));
    }
    h = combine(h, bool_hash(field.is_vector));
    h = combine(h, u64_hash(u64::from(field.array_size)));
    h
}

/// `type_token`, e.g. `float64`, `float64[]`, or `Point3D[3]`.
fn type_token(field: &TypeField) -> String {
    if !field.is_vector {
        field.type_name.clone()
    } else if field.array_size == 0 {
        format!("{}[]", field.type_name)
    } else {
        format!("{}[{}]", field.type_name, field.array_size)
    }
}

/// `SCHEMA_VERSION`, bumped whenever the text form or hash formula changes.
/// Must match `telemetry_parser::SCHEMA_VERSION`.
pub const SCHEMA_VERSION: u32 = 4;

/// Render the text form described in spec §4.3.
#[must_use]
pub fn schema_to_text(schema: &Schema) -> String {
    let mut out = String::new();
    out.push_str(&format!("### version: {SCHEMA_VERSION}\n"));
    out.push_str(&format!("### hash: {}\n", schema.hash));
    out.push_str(&format!("### channel_name: {}\n", schema.channel_name));
    for field in &schema.fields {
        out.push_str(&format!("{} {}\n", type_token(field), field.field_name));
    }
    for (name, fields) in &schema.custom_types {
        out.push_str("==============================\n");
        out.push_str(&format!("MSG: {name}\n"));
        for field in fields {
            out.push_str(&format!("{} {}\n", type_token(field), field.field_name));
        }
    }
    out
}
