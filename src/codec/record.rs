//! Name-keyed records exchanged with the encoder and decoder.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Number, Value};

use crate::error::{CodecError, Result};

/// A single field value, or the explicit marker for "leave unchanged".
///
/// Sentinels never appear here: the decoder maps them to [`FieldValue::Absent`]
/// and the encoder maps `Absent` back to the field's sentinel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Absent,
    Int(i64),
    Float(f64),
}

impl FieldValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }

    /// Numeric value as `f64`, `None` when absent.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            FieldValue::Absent => None,
            FieldValue::Int(v) => Some(v as f64),
            FieldValue::Float(v) => Some(v),
        }
    }

    /// Integer value. Floats only qualify when they are integral.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            FieldValue::Absent => None,
            FieldValue::Int(v) => Some(v),
            FieldValue::Float(v) if v.is_finite() && v.fract() == 0.0 => {
                if v >= i64::MIN as f64 && v < i64::MAX as f64 {
                    Some(v as i64)
                } else {
                    None
                }
            }
            FieldValue::Float(_) => None,
        }
    }

    /// JSON form: `null` when absent (or not finite), otherwise a number.
    pub fn to_json(&self) -> Value {
        match *self {
            FieldValue::Absent => Value::Null,
            FieldValue::Int(v) => Value::Number(v.into()),
            FieldValue::Float(v) => Number::from_f64(v).map_or(Value::Null, Value::Number),
        }
    }

    /// Parse a JSON scalar for `field`.
    pub fn from_json(field: &str, value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(FieldValue::Absent),
            Value::Number(n) => {
                if let Some(v) = n.as_i64() {
                    Ok(FieldValue::Int(v))
                } else if let Some(v) = n.as_u64() {
                    // Beyond i64; no field can hold it, but keep the number for the range error
                    Ok(FieldValue::Float(v as f64))
                } else {
                    n.as_f64()
                        .map(FieldValue::Float)
                        .ok_or_else(|| CodecError::InvalidValue {
                            field: field.to_string(),
                            reason: format!("unrepresentable number {}", n),
                        })
                }
            }
            other => Err(CodecError::InvalidValue {
                field: field.to_string(),
                reason: format!("expected a number or null, got {}", other),
            }),
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Absent => f.write_str("absent"),
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{}", v),
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for FieldValue {
            fn from(v: $t) -> Self {
                FieldValue::Int(i64::from(v))
            }
        })*
    };
}

impl_from_int!(u8, i8, u16, i16, u32, i32, i64);

impl From<f32> for FieldValue {
    fn from(v: f32) -> Self {
        FieldValue::Float(f64::from(v))
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(FieldValue::Absent, Into::into)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match *self {
            FieldValue::Absent => serializer.serialize_none(),
            FieldValue::Int(v) => serializer.serialize_i64(v),
            FieldValue::Float(v) => serializer.serialize_f64(v),
        }
    }
}

/// Field values keyed by name.
///
/// Records produced by the decoder hold every addressable field in layout
/// order. Records built by callers may hold any subset; a field that is not
/// present is "omitted" and gets filled by the encoder's merge policy.
/// Equality ignores field order.
#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace a field, returning the previous value.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.fields.push((name, value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// The value of a field that is both present and not absent.
    pub fn value(&self, name: &str) -> Option<FieldValue> {
        self.get(name).copied().filter(|v| !v.is_absent())
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        let pos = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(pos).1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Canonical JSON object. Absent fields render as `null`.
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(n, v)| (n.clone(), v.to_json()))
            .collect();
        Value::Object(map)
    }

    /// Build a record from a JSON object of numbers and nulls.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| CodecError::InvalidValue {
            field: "<record>".to_string(),
            reason: format!("expected a JSON object, got {}", value),
        })?;

        let mut record = Record::new();
        for (name, v) in object {
            record.insert(name.clone(), FieldValue::from_json(name, v)?);
        }
        Ok(record)
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(n, v)| other.get(n) == Some(v))
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

/// Serializes in field order, unlike [`Record::to_json`] which sorts keys.
impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
