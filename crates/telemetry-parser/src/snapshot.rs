//! Snapshot payload decoding (spec §4.7). Pure, side-effect-free, no I/O.
//!
//! Grounded on `original_source`'s `data_tamer_parser.hpp`
//! `ParseSnapshotRecursive`/`ParseSnapshot`.

use crate::basic_type::BasicType;
use crate::error::ParseError;
use crate::schema::{Schema, TypeField};
use crate::value::NumberValue;

/// A snapshot's wire fields, borrowed rather than owned, for zero-copy
/// decoding.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotView<'a> {
    pub schema_hash: u64,
    pub timestamp: i64,
    pub active_mask: &'a [u8],
    pub payload: &'a [u8],
}

/// Bit `i` of a packed active mask, LSB-first within each byte. Must match
/// `telemetry_core::snapshot::get_bit`.
#[must_use]
pub fn get_bit(mask: &[u8], index: usize) -> bool {
    (mask[index >> 3] & (1 << (index % 8))) != 0
}

struct Cursor<'a> {
    data: &'a [u8],
}

impl<'a> Cursor<'a> {
    fn take(&mut self, field_name: &str, n: usize) -> Result<&'a [u8], ParseError> {
        if self.data.len() < n {
            return Err(ParseError::BufferOverflow {
                field_name: field_name.to_string(),
                needed: n,
                remaining: self.data.len(),
            });
        }
        let (head, tail) = self.data.split_at(n);
        self.data = tail;
        Ok(head)
    }

    fn take_rest(&mut self) -> &'a [u8] {
        std::mem::take(&mut self.data)
    }
}

fn deserialize_number(kind: BasicType, field_name: &str, cursor: &mut Cursor) -> Result<NumberValue, ParseError> {
    Ok(match kind {
        BasicType::Bool => NumberValue::Bool(cursor.take(field_name, 1)?[0] != 0),
        BasicType::Char => NumberValue::Char(cursor.take(field_name, 1)?[0]),
        BasicType::Int8 => NumberValue::Int8(cursor.take(field_name, 1)?[0] as i8),
        BasicType::Uint8 => NumberValue::Uint8(cursor.take(field_name, 1)?[0]),
        BasicType::Int16 => NumberValue::Int16(i16::from_le_bytes(cursor.take(field_name, 2)?.try_into().unwrap())),
        BasicType::Uint16 => NumberValue::Uint16(u16::from_le_bytes(cursor.take(field_name, 2)?.try_into().unwrap())),
        BasicType::Int32 => NumberValue::Int32(i32::from_le_bytes(cursor.take(field_name, 4)?.try_into().unwrap())),
        BasicType::Uint32 => NumberValue::Uint32(u32::from_le_bytes(cursor.take(field_name, 4)?.try_into().unwrap())),
        BasicType::Int64 => NumberValue::Int64(i64::from_le_bytes(cursor.take(field_name, 8)?.try_into().unwrap())),
        BasicType::Uint64 => NumberValue::Uint64(u64::from_le_bytes(cursor.take(field_name, 8)?.try_into().unwrap())),
        BasicType::Float32 => NumberValue::Float32(f32::from_le_bytes(cursor.take(field_name, 4)?.try_into().unwrap())),
        BasicType::Float64 => NumberValue::Float64(f64::from_le_bytes(cursor.take(field_name, 8)?.try_into().unwrap())),
        BasicType::Other => unreachable!("deserialize_number is never called for a composite field"),
    })
}

fn le_u32(field_name: &str, cursor: &mut Cursor) -> Result<u32, ParseError> {
    Ok(u32::from_le_bytes(cursor.take(field_name, 4)?.try_into().unwrap()))
}

/// Recurse through one field (and, for composites, its declared sub-fields)
/// consuming `cursor`. Numeric leaves invoke `on_number(path, value)`.
///
/// When a composite's `type_name` is absent from `custom_types` — the
/// opaque advanced-registration path — the remainder of the buffer is
/// handed to `on_custom(path, raw_bytes, type_name)` and consumed whole,
/// since the wire format carries no declared length for it; this is only
/// well-defined when such a field is the last one parsed.
#[allow(clippy::too_many_arguments)]
fn parse_field_recursive<N, C>(
    field: &TypeField,
    custom_types: &std::collections::BTreeMap<String, Vec<TypeField>>,
    cursor: &mut Cursor,
    prefix: &str,
    on_number: &mut N,
    on_custom: &mut C,
) -> Result<(), ParseError>
where
    N: FnMut(&str, NumberValue),
    C: FnMut(&str, &[u8], &str),
{
    let count = if field.is_vector && field.array_size == 0 {
        le_u32(&field.field_name, cursor)? as usize
    } else if field.is_vector {
        field.array_size as usize
    } else {
        1
    };

    let new_prefix = if prefix.is_empty() { field.field_name.clone() } else { format!("{prefix}/{}", field.field_name) };
    let paths: Vec<String> =
        if field.is_vector { (0..count).map(|i| format!("{new_prefix}[{i}]")).collect() } else { vec![new_prefix] };

    for path in paths {
        if field.r#type != BasicType::Other {
            let value = deserialize_number(field.r#type, &field.field_name, cursor)?;
            on_number(&path, value);
            continue;
        }
        match custom_types.get(&field.type_name) {
            Some(sub_fields) => {
                for sub_field in sub_fields {
                    parse_field_recursive(sub_field, custom_types, cursor, &path, on_number, on_custom)?;
                }
            }
            None => {
                let raw = cursor.take_rest();
                on_custom(&path, raw, &field.type_name);
            }
        }
    }
    Ok(())
}

/// Walk `schema.fields` in order; for each whose `active_mask` bit is set,
/// decode it from `snapshot.payload`, invoking `on_number`/`on_custom` for
/// leaves (spec §4.7). Returns `Ok(false)` without decoding anything if the
/// snapshot's schema hash does not match `schema.hash`.
pub fn parse_snapshot<N, C>(
    schema: &Schema,
    snapshot: SnapshotView<'_>,
    mut on_number: N,
    mut on_custom: C,
) -> Result<bool, ParseError>
where
    N: FnMut(&str, NumberValue),
    C: FnMut(&str, &[u8], &str),
{
    if schema.hash != snapshot.schema_hash {
        return Ok(false);
    }
    let mut cursor = Cursor { data: snapshot.payload };
    for (i, field) in schema.fields.iter().enumerate() {
        if get_bit(snapshot.active_mask, i) {
            parse_field_recursive(field, &schema.custom_types, &mut cursor, "", &mut on_number, &mut on_custom)?;
        }
    }
    Ok(true)
}
