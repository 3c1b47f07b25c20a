//! Core schema types for packed characteristic structures.

use std::collections::HashMap;
use std::fmt;

use crate::error::{CodecError, Result};

/// Scalar type of a field. All scalars are little-endian on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    UInt8,
    Int8,
    UInt16,
    Int16,
    UInt32,
    Int32,
    Float32,
    Float64,
}

impl ScalarType {
    /// Get the size in bytes of this scalar type.
    pub fn size(self) -> usize {
        match self {
            ScalarType::UInt8 | ScalarType::Int8 => 1,
            ScalarType::UInt16 | ScalarType::Int16 => 2,
            ScalarType::UInt32 | ScalarType::Int32 | ScalarType::Float32 => 4,
            ScalarType::Float64 => 8,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, ScalarType::Float32 | ScalarType::Float64)
    }

    /// Inclusive integer range, `None` for floating-point types.
    pub fn int_range(self) -> Option<(i64, i64)> {
        match self {
            ScalarType::UInt8 => Some((0, u8::MAX as i64)),
            ScalarType::Int8 => Some((i8::MIN as i64, i8::MAX as i64)),
            ScalarType::UInt16 => Some((0, u16::MAX as i64)),
            ScalarType::Int16 => Some((i16::MIN as i64, i16::MAX as i64)),
            ScalarType::UInt32 => Some((0, u32::MAX as i64)),
            ScalarType::Int32 => Some((i32::MIN as i64, i32::MAX as i64)),
            ScalarType::Float32 | ScalarType::Float64 => None,
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarType::UInt8 => "uint8",
            ScalarType::Int8 => "int8",
            ScalarType::UInt16 => "uint16",
            ScalarType::Int16 => "int16",
            ScalarType::UInt32 => "uint32",
            ScalarType::Int32 => "int32",
            ScalarType::Float32 => "float32",
            ScalarType::Float64 => "float64",
        };
        f.write_str(name)
    }
}

/// Reserved value meaning "leave this field unchanged".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sentinel {
    /// Field cannot be left unchanged; a value must always be written.
    None,
    /// Any NaN bit pattern. Only valid on float fields.
    Nan,
    /// A specific raw integer value.
    Int(i64),
}

impl Sentinel {
    pub fn is_supported(self) -> bool {
        !matches!(self, Sentinel::None)
    }
}

impl fmt::Display for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentinel::None => f.write_str("-"),
            Sentinel::Nan => f.write_str("NaN"),
            Sentinel::Int(v) if *v < 0 => write!(f, "{}", v),
            Sentinel::Int(v) => write!(f, "{:#X}", v),
        }
    }
}

/// Storage of a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    /// An addressable scalar value.
    ///
    /// `fill` is written when a field without a sentinel is omitted and no
    /// baseline supplies it. Unlike a sentinel it is an ordinary value on
    /// decode.
    Scalar {
        ty: ScalarType,
        sentinel: Sentinel,
        fill: Option<i64>,
    },
    /// Padding bytes. Never exposed in records, always written as zero.
    Reserved { len: usize },
}

/// A field with its resolved position inside the structure.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub offset: usize,
    pub kind: FieldKind,
}

impl FieldSpec {
    /// Width of the field in bytes.
    pub fn size(&self) -> usize {
        match self.kind {
            FieldKind::Scalar { ty, .. } => ty.size(),
            FieldKind::Reserved { len } => len,
        }
    }

    /// Scalar type, `None` for reserved padding.
    pub fn scalar(&self) -> Option<ScalarType> {
        match self.kind {
            FieldKind::Scalar { ty, .. } => Some(ty),
            FieldKind::Reserved { .. } => None,
        }
    }

    pub fn sentinel(&self) -> Sentinel {
        match self.kind {
            FieldKind::Scalar { sentinel, .. } => sentinel,
            FieldKind::Reserved { .. } => Sentinel::None,
        }
    }

    /// Value written for an omitted field that has no sentinel.
    pub fn fill(&self) -> Option<i64> {
        match self.kind {
            FieldKind::Scalar { fill, .. } => fill,
            FieldKind::Reserved { .. } => None,
        }
    }

    pub fn is_reserved(&self) -> bool {
        matches!(self.kind, FieldKind::Reserved { .. })
    }
}

/// A complete, validated structure layout.
#[derive(Debug, Clone)]
pub struct StructSchema {
    pub name: &'static str,
    pub fields: Vec<FieldSpec>,
    pub total_size: usize,
    index: HashMap<&'static str, usize>,
}

impl StructSchema {
    /// Build a schema and check it against its declared size.
    ///
    /// Fields must be contiguous, in offset order, non-overlapping and must
    /// cover exactly `total_size` bytes. Names must be unique.
    pub fn new(name: &'static str, total_size: usize, fields: Vec<FieldSpec>) -> Result<Self> {
        let mut index = HashMap::with_capacity(fields.len());
        let mut expected_offset = 0;

        for (i, field) in fields.iter().enumerate() {
            if field.offset != expected_offset {
                return Err(CodecError::Schema(format!(
                    "{}: field '{}' at offset {} but previous field ends at {}",
                    name, field.name, field.offset, expected_offset
                )));
            }
            if let FieldKind::Scalar { ty, sentinel, fill } = field.kind {
                if sentinel == Sentinel::Nan && !ty.is_float() {
                    return Err(CodecError::Schema(format!(
                        "{}: NaN sentinel on integer field '{}'",
                        name, field.name
                    )));
                }
                if let Sentinel::Int(raw) = sentinel {
                    let in_range = ty
                        .int_range()
                        .is_some_and(|(min, max)| raw >= min && raw <= max);
                    if !in_range {
                        return Err(CodecError::Schema(format!(
                            "{}: sentinel {} not representable as {} for field '{}'",
                            name, raw, ty, field.name
                        )));
                    }
                }
                if let Some(value) = fill {
                    let in_range = ty
                        .int_range()
                        .is_some_and(|(min, max)| value >= min && value <= max);
                    if sentinel.is_supported() || !in_range {
                        return Err(CodecError::Schema(format!(
                            "{}: fill {} invalid for field '{}'",
                            name, value, field.name
                        )));
                    }
                }
            }
            if index.insert(field.name, i).is_some() {
                return Err(CodecError::Schema(format!(
                    "{}: duplicate field '{}'",
                    name, field.name
                )));
            }
            expected_offset += field.size();
        }

        if expected_offset != total_size {
            return Err(CodecError::Schema(format!(
                "{}: fields cover {} bytes but declared size is {}",
                name, expected_offset, total_size
            )));
        }

        Ok(Self {
            name,
            fields,
            total_size,
            index,
        })
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    /// Fields that appear in records (everything except reserved padding).
    pub fn addressable_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| !f.is_reserved())
    }
}
