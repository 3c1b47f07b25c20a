//! Typed views over the decoded records.
//!
//! Fields the firmware can leave unchanged are `Option`s: `None` is written as
//! the field's sentinel. `Some` holding the sentinel value itself means the
//! same thing and reads back as `None`. Fields without a sentinel are plain
//! values.

use serde::{Deserialize, Serialize};

use super::deserializer::decode;
use super::record::{FieldValue, Record};
use super::registry::StructKind;
use super::serializer::encode;
use crate::error::{CodecError, Result};

/// A typed structure with a fixed layout.
pub trait TypedRecord: Sized {
    const KIND: StructKind;

    /// Every addressable field, `None` mapped to [`FieldValue::Absent`].
    fn to_record(&self) -> Record;

    fn from_record(record: &Record) -> Result<Self>;
}

/// Decode a payload straight into a typed record.
pub fn decode_typed<T: TypedRecord>(data: &[u8]) -> Result<T> {
    T::from_record(&decode(T::KIND, data)?)
}

/// Encode a typed record. `None` fields are sent as sentinels.
pub fn encode_typed<T: TypedRecord>(value: &T) -> Result<Vec<u8>> {
    encode(T::KIND, &value.to_record(), None)
}

fn opt_f32(record: &Record, name: &str) -> Result<Option<f32>> {
    match record.get(name) {
        None | Some(FieldValue::Absent) => Ok(None),
        Some(v) => v
            .as_f64()
            .map(|f| Some(f as f32))
            .ok_or_else(|| invalid(name, "not a number")),
    }
}

fn opt_int<T: TryFrom<i64>>(record: &Record, name: &str) -> Result<Option<T>> {
    match record.get(name) {
        None | Some(FieldValue::Absent) => Ok(None),
        Some(v) => {
            let raw = v.as_i64().ok_or_else(|| invalid(name, "not an integer"))?;
            T::try_from(raw).map(Some).map_err(|_| CodecError::OutOfRange {
                field: name.to_string(),
                value: raw.to_string(),
                scalar: std::any::type_name::<T>().to_string(),
            })
        }
    }
}

fn req_int<T: TryFrom<i64>>(record: &Record, name: &str) -> Result<T> {
    opt_int(record, name)?.ok_or_else(|| invalid(name, "required field is missing"))
}

fn invalid(name: &str, reason: &str) -> CodecError {
    CodecError::InvalidValue {
        field: name.to_string(),
        reason: reason.to_string(),
    }
}

/// One LED colour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    pub fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((red, green, blue): (u8, u8, u8)) -> Self {
        Self { red, green, blue }
    }
}

/// Device telemetry. Read-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemState {
    pub state: u8,
    pub pressure1: Option<f32>,
    pub pressure2: Option<f32>,
    pub abs_pressure: Option<f32>,
    pub motor_current: Option<f32>,
    pub getriebemotor_pwm: Option<u16>,
    pub vibrationsmotor_pwm: Option<u16>,
    pub blower_pwm: Option<u16>,
    pub blower_pulse_rate_rpm: Option<f32>,
    pub rgb: [Rgb; 2],
    pub encoder_count: Option<i32>,
    pub blower_pulse_count: Option<u32>,
}

const RGB_FIELDS: [[&str; 3]; 2] = [
    ["rgb0_red", "rgb0_green", "rgb0_blue"],
    ["rgb1_red", "rgb1_green", "rgb1_blue"],
];

impl TypedRecord for SystemState {
    const KIND: StructKind = StructKind::SystemState;

    fn to_record(&self) -> Record {
        let mut record = Record::new()
            .with("state", self.state)
            .with("pressure1", self.pressure1)
            .with("pressure2", self.pressure2)
            .with("abs_pressure", self.abs_pressure)
            .with("motor_current", self.motor_current)
            .with("getriebemotor_pwm", self.getriebemotor_pwm)
            .with("vibrationsmotor_pwm", self.vibrationsmotor_pwm)
            .with("blower_pwm", self.blower_pwm)
            .with("blower_pulse_rate_rpm", self.blower_pulse_rate_rpm);
        for (led, [r, g, b]) in self.rgb.iter().zip(RGB_FIELDS) {
            record.insert(r, led.red);
            record.insert(g, led.green);
            record.insert(b, led.blue);
        }
        record
            .with("encoder_count", self.encoder_count)
            .with("blower_pulse_count", self.blower_pulse_count)
    }

    fn from_record(record: &Record) -> Result<Self> {
        let mut rgb = [Rgb::default(); 2];
        for (led, [r, g, b]) in rgb.iter_mut().zip(RGB_FIELDS) {
            *led = Rgb::new(req_int(record, r)?, req_int(record, g)?, req_int(record, b)?);
        }

        Ok(Self {
            state: req_int(record, "state")?,
            pressure1: opt_f32(record, "pressure1")?,
            pressure2: opt_f32(record, "pressure2")?,
            abs_pressure: opt_f32(record, "abs_pressure")?,
            motor_current: opt_f32(record, "motor_current")?,
            getriebemotor_pwm: opt_int(record, "getriebemotor_pwm")?,
            vibrationsmotor_pwm: opt_int(record, "vibrationsmotor_pwm")?,
            blower_pwm: opt_int(record, "blower_pwm")?,
            blower_pulse_rate_rpm: opt_f32(record, "blower_pulse_rate_rpm")?,
            rgb,
            encoder_count: opt_int(record, "encoder_count")?,
            blower_pulse_count: opt_int(record, "blower_pulse_count")?,
        })
    }
}

/// Operator set-points.
///
/// `enable_getriebemotor_nvs` has no "unchanged" value; partial writes of
/// this structure need a baseline read first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManualControl {
    pub blower_rpm: Option<f32>,
    pub getriebemotor_pwm: Option<f32>,
    pub vibrationsmotor_pwm: Option<f32>,
    pub enable_getriebemotor_nvs: u8,
    pub feeder_seconds: Option<f32>,
}

impl TypedRecord for ManualControl {
    const KIND: StructKind = StructKind::ManualControl;

    fn to_record(&self) -> Record {
        Record::new()
            .with("blower_rpm", self.blower_rpm)
            .with("getriebemotor_pwm", self.getriebemotor_pwm)
            .with("vibrationsmotor_pwm", self.vibrationsmotor_pwm)
            .with("enable_getriebemotor_nvs", self.enable_getriebemotor_nvs)
            .with("feeder_seconds", self.feeder_seconds)
    }

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            blower_rpm: opt_f32(record, "blower_rpm")?,
            getriebemotor_pwm: opt_f32(record, "getriebemotor_pwm")?,
            vibrationsmotor_pwm: opt_f32(record, "vibrationsmotor_pwm")?,
            enable_getriebemotor_nvs: req_int(record, "enable_getriebemotor_nvs")?,
            feeder_seconds: opt_f32(record, "feeder_seconds")?,
        })
    }
}

/// Blower PID controller parameters and live state.
///
/// Every float and PWM field supports "leave unchanged", so
/// `BlowerPid { kp: Some(1.2), ..BlowerPid::partial() }` updates only `kp`.
/// The u32 fields have no such value and are sent as given (0 in `partial()`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlowerPid {
    pub kp: Option<f32>,
    pub ki: Option<f32>,
    pub kd: Option<f32>,
    pub target_frequency: Option<f32>,
    pub current_frequency: Option<f32>,
    pub last_error: Option<f32>,
    pub integral_sum: Option<f32>,
    pub current_pwm: Option<u16>,
    pub manual_pwm_value: Option<u16>,
    pub min_pwm_output: Option<u16>,
    pub max_pwm_output: Option<u16>,
    pub update_interval_ms: u32,
    pub flags: u32,
    pub last_update_tick: u32,
    pub feed_forward: Option<f32>,
    pub derivative_filter_hz: Option<f32>,
    pub reserved_floats: [Option<f32>; 4],
}

const RESERVED_FLOAT_FIELDS: [&str; 4] = [
    "reserved_float_0",
    "reserved_float_1",
    "reserved_float_2",
    "reserved_float_3",
];

impl BlowerPid {
    /// All sentinel-capable fields absent, the rest zero.
    pub fn partial() -> Self {
        Self::default()
    }
}

impl TypedRecord for BlowerPid {
    const KIND: StructKind = StructKind::BlowerPid;

    fn to_record(&self) -> Record {
        let mut record = Record::new()
            .with("kp", self.kp)
            .with("ki", self.ki)
            .with("kd", self.kd)
            .with("target_frequency", self.target_frequency)
            .with("current_frequency", self.current_frequency)
            .with("last_error", self.last_error)
            .with("integral_sum", self.integral_sum)
            .with("current_pwm", self.current_pwm)
            .with("manual_pwm_value", self.manual_pwm_value)
            .with("min_pwm_output", self.min_pwm_output)
            .with("max_pwm_output", self.max_pwm_output)
            .with("update_interval_ms", self.update_interval_ms)
            .with("flags", self.flags)
            .with("last_update_tick", self.last_update_tick)
            .with("feed_forward", self.feed_forward)
            .with("derivative_filter_hz", self.derivative_filter_hz);
        for (name, value) in RESERVED_FLOAT_FIELDS.iter().zip(self.reserved_floats) {
            record.insert(*name, value);
        }
        record
    }

    fn from_record(record: &Record) -> Result<Self> {
        let mut reserved_floats = [None; 4];
        for (slot, name) in reserved_floats.iter_mut().zip(RESERVED_FLOAT_FIELDS) {
            *slot = opt_f32(record, name)?;
        }

        Ok(Self {
            kp: opt_f32(record, "kp")?,
            ki: opt_f32(record, "ki")?,
            kd: opt_f32(record, "kd")?,
            target_frequency: opt_f32(record, "target_frequency")?,
            current_frequency: opt_f32(record, "current_frequency")?,
            last_error: opt_f32(record, "last_error")?,
            integral_sum: opt_f32(record, "integral_sum")?,
            current_pwm: opt_int(record, "current_pwm")?,
            manual_pwm_value: opt_int(record, "manual_pwm_value")?,
            min_pwm_output: opt_int(record, "min_pwm_output")?,
            max_pwm_output: opt_int(record, "max_pwm_output")?,
            update_interval_ms: req_int(record, "update_interval_ms")?,
            flags: req_int(record, "flags")?,
            last_update_tick: req_int(record, "last_update_tick")?,
            feed_forward: opt_f32(record, "feed_forward")?,
            derivative_filter_hz: opt_f32(record, "derivative_filter_hz")?,
            reserved_floats,
        })
    }
}
