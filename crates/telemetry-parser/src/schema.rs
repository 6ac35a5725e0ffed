//! Independent reimplementation of `telemetry_core::{TypeField, Schema}`
//! and its text-form parser (spec §4.3, §4.7).

use std::collections::BTreeMap;

use crate::basic_type::BasicType;
use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeField {
    pub field_name: String,
    pub r#type: BasicType,
    pub type_name: String,
    pub is_vector: bool,
    pub array_size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    pub hash: u64,
    pub channel_name: String,
    pub fields: Vec<TypeField>,
    pub custom_types: BTreeMap<String, Vec<TypeField>>,
}

/// Must match `telemetry_core::schema::SCHEMA_VERSION` bit-for-bit.
pub const SCHEMA_VERSION: u32 = 4;

/// FNV-1a, reproduced byte-for-byte from `telemetry_core::schema`'s
/// implementation. See that module's doc comment for why this is
/// hand-rolled instead of `DefaultHasher`.
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

fn combine(hash: u64, value_hash: u64) -> u64 {
    hash ^ value_hash.wrapping_add(0x9e37_79b9).wrapping_add(hash << 6).wrapping_add(hash >> 2)
}

fn fold_field_into_hash(field: &TypeField, hash: u64) -> u64 {
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

fn trim(s: &str) -> &str {
    s.trim_matches(|c: char| c == ' ' || c == '\r')
}

/// Parse the text form written by `telemetry_core::schema::schema_to_text`.
///
/// # Errors
/// Returns [`ParseError::SchemaVersionMismatch`] or
/// [`ParseError::SchemaHashMismatch`] if the recomputed hash disagrees with
/// the declared one, and [`ParseError::MalformedLine`] /
/// [`ParseError::ExpectedMessageHeader`] on structurally invalid text.
pub fn parse_schema(text: &str) -> Result<Schema, ParseError> {
    let mut schema = Schema::default();
    let mut declared_hash: Option<u64> = None;
    let mut in_top_level = true;
    let mut current_type_name = String::new();

    let mut lines = text.lines().enumerate().peekable();
    while let Some((line_number, raw_line)) = lines.next() {
        let line = trim(raw_line);
        if line.is_empty() {
            continue;
        }
        if line.starts_with("==============================") {
            let Some((header_number, header_raw)) = lines.next() else {
                return Err(ParseError::ExpectedMessageHeader { line: String::new() });
            };
            let header = trim(header_raw);
            let Some(name) = header.strip_prefix("MSG: ") else {
                return Err(ParseError::MalformedLine { line_number: header_number, line: header.to_string() });
            };
            current_type_name = trim(name).to_string();
            schema.custom_types.entry(current_type_name.clone()).or_default();
            in_top_level = false;
            continue;
        }

        if let Some(value) = line.strip_prefix("### version:") {
            let found: u32 = trim(value)
                .parse()
                .map_err(|_| ParseError::MalformedLine { line_number, line: line.to_string() })?;
            if found != SCHEMA_VERSION {
                return Err(ParseError::SchemaVersionMismatch { expected: SCHEMA_VERSION, found });
            }
            continue;
        }
        if let Some(value) = line.strip_prefix("### hash:") {
            let hash: u64 = trim(value)
                .parse()
                .map_err(|_| ParseError::MalformedLine { line_number, line: line.to_string() })?;
            declared_hash = Some(hash);
            continue;
        }
        if let Some(value) = line.strip_prefix("### channel_name:") {
            schema.channel_name = trim(value).to_string();
            schema.hash = str_hash(&schema.channel_name);
            continue;
        }

        let Some(space_pos) = line.find(' ') else {
            return Err(ParseError::MalformedLine { line_number, line: line.to_string() });
        };
        let type_token = trim(&line[..space_pos]);
        let field_name = trim(&line[space_pos + 1..]);

        let field = parse_field_line(type_token, field_name, line_number, line)?;

        if in_top_level {
            schema.hash = fold_field_into_hash(&field, schema.hash);
            schema.fields.push(field);
        } else {
            schema.custom_types.get_mut(&current_type_name).expect("inserted above").push(field);
        }
    }

    if let Some(declared) = declared_hash {
        if declared != schema.hash {
            return Err(ParseError::SchemaHashMismatch { declared, computed: schema.hash });
        }
    }
    Ok(schema)
}

fn parse_field_line(type_token: &str, field_name: &str, line_number: usize, line: &str) -> Result<TypeField, ParseError> {
    let (kind, matched_len) = match BasicType::match_modern_prefix(type_token) {
        Some(found) => found,
        None => match BasicType::match_legacy_prefix(type_token) {
            Some(kind) => (kind, 0),
            None => (BasicType::Other, 0),
        },
    };

    let type_name = if kind == BasicType::Other {
        let bracket = type_token.find(|c| c == '[' || c == ' ').unwrap_or(type_token.len());
        type_token[..bracket].to_string()
    } else {
        kind.as_str().to_string()
    };

    let rest = &type_token[matched_len.min(type_token.len())..];
    let mut is_vector = false;
    let mut array_size = 0u32;
    if let Some(open) = rest.find('[') {
        is_vector = true;
        if let Some(close) = rest[open..].find(']') {
            let inside = trim(&rest[open + 1..open + close]);
            if !inside.is_empty() {
                array_size = inside
                    .parse()
                    .map_err(|_| ParseError::MalformedLine { line_number, line: line.to_string() })?;
            }
        }
    }

    Ok(TypeField {
        field_name: field_name.to_string(),
        r#type: kind,
        type_name,
        is_vector,
        array_size,
    })
}
