//! Binary encoder and partial-update merger.

use byteorder::{ByteOrder, LittleEndian};

use super::record::{FieldValue, Record};
use super::registry::StructKind;
use super::types::*;
use crate::error::{CodecError, Result};

/// How fields omitted from a record are filled.
#[derive(Debug, Clone, Copy)]
pub enum MergePolicy<'a> {
    /// Omitted fields are written as their sentinel so the firmware keeps
    /// its current value. Fields without a sentinel must be supplied.
    SentinelPassThrough,
    /// Omitted fields are copied from a previously read record. Where the
    /// baseline has no value either, the sentinel is used if the field has one.
    ///
    /// Only the fields being filled are looked up in the baseline; any other
    /// names it carries are ignored rather than rejected.
    BaselineFill(&'a Record),
}

/// Encode a (possibly partial) record.
///
/// Without a baseline this is [`MergePolicy::SentinelPassThrough`], with one
/// it is [`MergePolicy::BaselineFill`].
pub fn encode(kind: StructKind, record: &Record, baseline: Option<&Record>) -> Result<Vec<u8>> {
    let policy = baseline.map_or(MergePolicy::SentinelPassThrough, MergePolicy::BaselineFill);
    encode_with(kind, record, policy)
}

/// Encode a record under an explicit merge policy.
///
/// The output is always exactly `kind.schema().total_size` bytes. Reserved
/// padding is zeroed. Nothing is produced if any field fails.
pub fn encode_with(kind: StructKind, record: &Record, policy: MergePolicy<'_>) -> Result<Vec<u8>> {
    let schema = kind.schema();

    for (name, _) in record.iter() {
        match schema.field(name) {
            Some(field) if !field.is_reserved() => {}
            _ => {
                return Err(CodecError::UnknownField {
                    kind,
                    field: name.to_string(),
                })
            }
        }
    }

    let mut buf = vec![0u8; schema.total_size];
    for field in &schema.fields {
        let FieldKind::Scalar { ty, sentinel, .. } = field.kind else {
            continue;
        };
        let value = resolve(kind, field, sentinel, record, policy)?;
        let out = &mut buf[field.offset..field.offset + ty.size()];
        match value {
            FieldValue::Absent => write_sentinel(ty, sentinel, out),
            present => write_value(field.name, ty, present, out)?,
        }
    }

    Ok(buf)
}

/// Pick the value to write for one field. `Absent` means "write the sentinel".
fn resolve(
    kind: StructKind,
    field: &FieldSpec,
    sentinel: Sentinel,
    record: &Record,
    policy: MergePolicy<'_>,
) -> Result<FieldValue> {
    let requested = record.get(field.name).copied();

    match requested {
        Some(FieldValue::Absent) if !sentinel.is_supported() => {
            return Err(CodecError::UnsupportedPartialUpdate {
                kind,
                field: field.name.to_string(),
            });
        }
        Some(value) if !leaves_unchanged(value, sentinel) => return Ok(value),
        _ => {}
    }

    let from_baseline = match policy {
        MergePolicy::BaselineFill(baseline) => baseline.value(field.name),
        MergePolicy::SentinelPassThrough => None,
    };

    match (from_baseline, field.fill()) {
        (Some(value), _) => Ok(value),
        (None, _) if sentinel.is_supported() => Ok(FieldValue::Absent),
        (None, Some(fill)) => Ok(FieldValue::Int(fill)),
        (None, None) => Err(CodecError::MissingBaseline {
            kind,
            field: field.name.to_string(),
        }),
    }
}

/// Absent, or a value equal to the field's sentinel.
fn leaves_unchanged(value: FieldValue, sentinel: Sentinel) -> bool {
    match (value, sentinel) {
        (FieldValue::Absent, _) => true,
        (FieldValue::Float(v), Sentinel::Nan) => v.is_nan(),
        (FieldValue::Float(v), Sentinel::Int(raw)) => v == raw as f64,
        (FieldValue::Int(v), Sentinel::Int(raw)) => v == raw,
        _ => false,
    }
}

fn write_sentinel(ty: ScalarType, sentinel: Sentinel, out: &mut [u8]) {
    match sentinel {
        Sentinel::Nan => write_float(ty, f64::NAN, out),
        Sentinel::Int(raw) => write_int(ty, raw, out),
        // resolve() never asks for a sentinel the field does not have
        Sentinel::None => {}
    }
}

fn write_value(name: &str, ty: ScalarType, value: FieldValue, out: &mut [u8]) -> Result<()> {
    let out_of_range = || CodecError::OutOfRange {
        field: name.to_string(),
        value: value.to_string(),
        scalar: ty.to_string(),
    };

    match ty.int_range() {
        Some((min, max)) => {
            let v = value.as_i64().ok_or_else(out_of_range)?;
            if v < min || v > max {
                return Err(out_of_range());
            }
            write_int(ty, v, out);
        }
        None => {
            let v = value.as_f64().ok_or_else(out_of_range)?;
            if ty == ScalarType::Float32 && v.is_finite() && v.abs() > f64::from(f32::MAX) {
                return Err(out_of_range());
            }
            write_float(ty, v, out);
        }
    }

    Ok(())
}

/// `v` must already be within the type's range.
fn write_int(ty: ScalarType, v: i64, out: &mut [u8]) {
    match ty {
        ScalarType::UInt8 => out[0] = v as u8,
        ScalarType::Int8 => out[0] = v as i8 as u8,
        ScalarType::UInt16 => LittleEndian::write_u16(out, v as u16),
        ScalarType::Int16 => LittleEndian::write_i16(out, v as i16),
        ScalarType::UInt32 => LittleEndian::write_u32(out, v as u32),
        ScalarType::Int32 => LittleEndian::write_i32(out, v as i32),
        ScalarType::Float32 | ScalarType::Float64 => write_float(ty, v as f64, out),
    }
}

fn write_float(ty: ScalarType, v: f64, out: &mut [u8]) {
    match ty {
        ScalarType::Float32 => LittleEndian::write_f32(out, v as f32),
        ScalarType::Float64 => LittleEndian::write_f64(out, v),
        _ => write_int(ty, v as i64, out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_fill_for_blower_pid() {
        let record = Record::new().with("kp", 1.25f32);
        let bytes = encode(StructKind::BlowerPid, &record, None).unwrap();

        assert_eq!(bytes.len(), 72);
        assert_eq!(LittleEndian::read_f32(&bytes[0..4]), 1.25);
        assert!(LittleEndian::read_f32(&bytes[4..8]).is_nan());
        assert_eq!(LittleEndian::read_u16(&bytes[28..30]), 0xFFFF);
        assert_eq!(&bytes[36..48], &[0u8; 12]);
    }

    #[test]
    fn test_fill_fields_prefer_baseline() {
        let baseline = Record::new().with("update_interval_ms", 50u32);
        let record = Record::new().with("kp", 1.0f32);

        let bytes = encode(StructKind::BlowerPid, &record, Some(&baseline)).unwrap();
        assert_eq!(LittleEndian::read_u32(&bytes[36..40]), 50);
        assert_eq!(LittleEndian::read_u32(&bytes[40..44]), 0);
    }

    #[test]
    fn test_explicit_absent_on_fill_field() {
        let record = Record::new().with("flags", FieldValue::Absent);
        let err = encode(StructKind::BlowerPid, &record, None).unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedPartialUpdate { ref field, .. } if field == "flags"));
    }

    #[test]
    fn test_missing_baseline_for_flag_field() {
        let record = Record::new().with("blower_rpm", 1500.0f32);
        let err = encode(StructKind::ManualControl, &record, None).unwrap_err();
        assert_eq!(
            err,
            CodecError::MissingBaseline {
                kind: StructKind::ManualControl,
                field: "enable_getriebemotor_nvs".to_string(),
            }
        );
    }

    #[test]
    fn test_explicit_absent_on_flag_field() {
        let record = Record::new()
            .with("enable_getriebemotor_nvs", FieldValue::Absent)
            .with("blower_rpm", 1500.0f32);
        let baseline = Record::new().with("enable_getriebemotor_nvs", 1u8);

        let err = encode(StructKind::ManualControl, &record, Some(&baseline)).unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedPartialUpdate { .. }));
    }

    #[test]
    fn test_baseline_without_flag_field() {
        let baseline = Record::new().with("feeder_seconds", 5.0f32);
        let record = Record::new().with("blower_rpm", 1.0f32);

        let err = encode(StructKind::ManualControl, &record, Some(&baseline)).unwrap_err();
        assert_eq!(
            err,
            CodecError::MissingBaseline {
                kind: StructKind::ManualControl,
                field: "enable_getriebemotor_nvs".to_string(),
            }
        );
    }

    #[test]
    fn test_unrepresentable_baseline_value() {
        let record = Record::new().with("blower_rpm", 1.0f32);

        for bad in [FieldValue::Int(300), FieldValue::Float(0.5)] {
            let baseline = Record::new().with("enable_getriebemotor_nvs", bad);
            let err = encode(StructKind::ManualControl, &record, Some(&baseline)).unwrap_err();
            assert!(
                matches!(err, CodecError::OutOfRange { ref field, .. } if field == "enable_getriebemotor_nvs"),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_baseline_ignores_foreign_fields() {
        let baseline = Record::new()
            .with("enable_getriebemotor_nvs", 0u8)
            .with("not_a_field", 1u8);
        let record = Record::new().with("blower_rpm", 1.0f32);

        assert!(encode(StructKind::ManualControl, &record, Some(&baseline)).is_ok());
    }

    #[test]
    fn test_baseline_fill_copies_omitted_fields() {
        let baseline = Record::new()
            .with("enable_getriebemotor_nvs", 1u8)
            .with("feeder_seconds", 5.0f32);
        let record = Record::new().with("blower_rpm", 1500.0f32);

        let bytes = encode(StructKind::ManualControl, &record, Some(&baseline)).unwrap();

        assert_eq!(LittleEndian::read_f32(&bytes[0..4]), 1500.0);
        assert!(LittleEndian::read_f32(&bytes[4..8]).is_nan());
        assert_eq!(bytes[12], 1);
        assert_eq!(LittleEndian::read_f32(&bytes[13..17]), 5.0);
        assert_eq!(&bytes[17..25], &[0u8; 8]);
    }

    #[test]
    fn test_explicit_absent_equals_omission() {
        let baseline = Record::new()
            .with("enable_getriebemotor_nvs", 0u8)
            .with("feeder_seconds", 2.0f32);
        let omitted = Record::new().with("blower_rpm", 900.0f32);
        let explicit = omitted.clone().with("feeder_seconds", FieldValue::Absent);

        assert_eq!(
            encode(StructKind::ManualControl, &omitted, Some(&baseline)).unwrap(),
            encode(StructKind::ManualControl, &explicit, Some(&baseline)).unwrap()
        );
    }

    #[test]
    fn test_nan_value_is_treated_as_absent() {
        let baseline = Record::new().with("kp", 3.0f32);
        let record = Record::new().with("kp", f64::NAN);

        let bytes = encode(StructKind::BlowerPid, &record, Some(&baseline)).unwrap();
        assert_eq!(LittleEndian::read_f32(&bytes[0..4]), 3.0);
    }

    #[test]
    fn test_integer_sentinel_value_is_treated_as_absent() {
        let baseline = Record::new().with("current_pwm", 300u16);

        for requested in [FieldValue::Int(0xFFFF), FieldValue::Float(65535.0)] {
            let record = Record::new().with("current_pwm", requested);

            let bytes = encode(StructKind::BlowerPid, &record, Some(&baseline)).unwrap();
            assert_eq!(LittleEndian::read_u16(&bytes[28..30]), 300);

            let bytes = encode(StructKind::BlowerPid, &record, None).unwrap();
            assert_eq!(LittleEndian::read_u16(&bytes[28..30]), 0xFFFF);
        }

        let no_sentinel = [
            "state", "rgb0_red", "rgb0_green", "rgb0_blue", "rgb1_red", "rgb1_green", "rgb1_blue",
        ];
        let baseline = no_sentinel
            .into_iter()
            .map(|name| (name, FieldValue::Int(0)))
            .collect::<Record>()
            .with("encoder_count", -5i32);
        let record = Record::new().with("encoder_count", i32::MIN);

        let bytes = encode(StructKind::SystemState, &record, Some(&baseline)).unwrap();
        assert_eq!(LittleEndian::read_i32(&bytes[33..37]), -5);
    }

    #[test]
    fn test_unknown_field() {
        let record = Record::new().with("kpp", 1.0f32);
        let err = encode(StructKind::BlowerPid, &record, None).unwrap_err();
        assert_eq!(
            err,
            CodecError::UnknownField {
                kind: StructKind::BlowerPid,
                field: "kpp".to_string(),
            }
        );
    }

    #[test]
    fn test_reserved_is_not_addressable() {
        let baseline = Record::new().with("enable_getriebemotor_nvs", 0u8);
        let record = Record::new().with("reserved", 0u8);
        let err = encode(StructKind::ManualControl, &record, Some(&baseline)).unwrap_err();
        assert!(matches!(err, CodecError::UnknownField { .. }));
    }

    #[test]
    fn test_out_of_range_integers() {
        for (field, value) in [("current_pwm", 70_000i64), ("current_pwm", -1), ("flags", 1 << 33)] {
            let record = Record::new().with(field, value);
            let err = encode(StructKind::BlowerPid, &record, None).unwrap_err();
            assert!(
                matches!(err, CodecError::OutOfRange { field: ref f, .. } if f == field),
                "{field}={value} should be out of range"
            );
        }
    }

    #[test]
    fn test_fractional_value_for_integer_field() {
        let record = Record::new().with("current_pwm", 12.5f64);
        let err = encode(StructKind::BlowerPid, &record, None).unwrap_err();
        assert!(matches!(err, CodecError::OutOfRange { .. }));

        let record = Record::new().with("current_pwm", 12.0f64);
        let bytes = encode(StructKind::BlowerPid, &record, None).unwrap();
        assert_eq!(LittleEndian::read_u16(&bytes[28..30]), 12);
    }

    #[test]
    fn test_float_beyond_f32() {
        let record = Record::new().with("kp", 1e300f64);
        let err = encode(StructKind::BlowerPid, &record, None).unwrap_err();
        assert!(matches!(err, CodecError::OutOfRange { .. }));
    }

    #[test]
    fn test_integer_into_float_field() {
        let record = Record::new().with("kd", 2i64);
        let bytes = encode(StructKind::BlowerPid, &record, None).unwrap();
        assert_eq!(LittleEndian::read_f32(&bytes[8..12]), 2.0);
    }
}
