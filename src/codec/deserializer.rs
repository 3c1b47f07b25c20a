//! Binary decoder for packed characteristic structures.

use byteorder::{ByteOrder, LittleEndian};

use super::record::{FieldValue, Record};
use super::registry::StructKind;
use super::types::*;
use crate::error::{CodecError, Result};

/// Decode a raw characteristic payload into a record.
///
/// The payload must be exactly the structure's size. Every addressable field
/// is produced; fields holding their sentinel come back as
/// [`FieldValue::Absent`].
pub fn decode(kind: StructKind, data: &[u8]) -> Result<Record> {
    let schema = kind.schema();

    if data.len() != schema.total_size {
        return Err(CodecError::LengthMismatch {
            kind,
            expected: schema.total_size,
            actual: data.len(),
        });
    }

    let mut record = Record::new();
    for field in &schema.fields {
        if let FieldKind::Scalar { ty, sentinel, .. } = field.kind {
            let bytes = &data[field.offset..field.offset + ty.size()];
            record.insert(field.name, read_scalar(ty, sentinel, bytes));
        }
    }

    Ok(record)
}

/// Interpret `bytes` as `ty` and collapse the sentinel to `Absent`.
fn read_scalar(ty: ScalarType, sentinel: Sentinel, bytes: &[u8]) -> FieldValue {
    let value = match ty {
        ScalarType::UInt8 => FieldValue::Int(i64::from(bytes[0])),
        ScalarType::Int8 => FieldValue::Int(i64::from(bytes[0] as i8)),
        ScalarType::UInt16 => FieldValue::Int(i64::from(LittleEndian::read_u16(bytes))),
        ScalarType::Int16 => FieldValue::Int(i64::from(LittleEndian::read_i16(bytes))),
        ScalarType::UInt32 => FieldValue::Int(i64::from(LittleEndian::read_u32(bytes))),
        ScalarType::Int32 => FieldValue::Int(i64::from(LittleEndian::read_i32(bytes))),
        ScalarType::Float32 => FieldValue::Float(f64::from(LittleEndian::read_f32(bytes))),
        ScalarType::Float64 => FieldValue::Float(LittleEndian::read_f64(bytes)),
    };

    let is_sentinel = match (sentinel, value) {
        (Sentinel::Nan, FieldValue::Float(v)) => v.is_nan(),
        (Sentinel::Int(raw), FieldValue::Int(v)) => v == raw,
        _ => false,
    };

    if is_sentinel {
        FieldValue::Absent
    } else {
        value
    }
}
