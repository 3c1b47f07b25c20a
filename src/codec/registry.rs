//! Built-in structure layouts mirrored from the Zellenradschleuse firmware.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use super::types::*;
use crate::error::{CodecError, Result};
use crate::uuids::Characteristic;

/// The structures exchanged with the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructKind {
    SystemState,
    ManualControl,
    BlowerPid,
}

impl StructKind {
    pub const ALL: [StructKind; 3] = [
        StructKind::SystemState,
        StructKind::ManualControl,
        StructKind::BlowerPid,
    ];

    /// Name used in JSON, the CLI and error messages.
    pub fn name(self) -> &'static str {
        match self {
            StructKind::SystemState => "system_state",
            StructKind::ManualControl => "manual_control",
            StructKind::BlowerPid => "blower_pid",
        }
    }

    /// The validated layout for this kind.
    ///
    /// # Panics
    ///
    /// Panics on first use if the built-in layout is inconsistent. That is a
    /// bug in this crate, never a property of input data.
    pub fn schema(self) -> &'static StructSchema {
        static SYSTEM_STATE: OnceLock<StructSchema> = OnceLock::new();
        static MANUAL_CONTROL: OnceLock<StructSchema> = OnceLock::new();
        static BLOWER_PID: OnceLock<StructSchema> = OnceLock::new();

        match self {
            StructKind::SystemState => SYSTEM_STATE.get_or_init(|| load(system_state_schema)),
            StructKind::ManualControl => MANUAL_CONTROL.get_or_init(|| load(manual_control_schema)),
            StructKind::BlowerPid => BLOWER_PID.get_or_init(|| load(blower_pid_schema)),
        }
    }

    /// Characteristic that carries this structure.
    pub fn characteristic(self) -> Characteristic {
        match self {
            StructKind::SystemState => Characteristic::SystemState,
            StructKind::ManualControl => Characteristic::ManualControl,
            StructKind::BlowerPid => Characteristic::BlowerPid,
        }
    }

    /// Whether the firmware accepts writes to this structure.
    pub fn is_writable(self) -> bool {
        !matches!(self, StructKind::SystemState)
    }
}

impl fmt::Display for StructKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StructKind {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        StructKind::ALL
            .into_iter()
            .find(|kind| kind.name() == normalized)
            .ok_or_else(|| CodecError::Schema(format!("Unknown structure kind '{}'", s)))
    }
}

fn load(build: fn() -> Result<StructSchema>) -> StructSchema {
    build().unwrap_or_else(|e| panic!("built-in layout invalid: {e}"))
}

const U16_UNCHANGED: Sentinel = Sentinel::Int(u16::MAX as i64);
const U32_UNCHANGED: Sentinel = Sentinel::Int(u32::MAX as i64);
const I32_UNCHANGED: Sentinel = Sentinel::Int(i32::MIN as i64);

/// Lays out fields back to back, the way the firmware's packed structs do.
struct LayoutBuilder {
    fields: Vec<FieldSpec>,
    offset: usize,
}

impl LayoutBuilder {
    fn new() -> Self {
        Self {
            fields: Vec::new(),
            offset: 0,
        }
    }

    fn push(mut self, name: &'static str, kind: FieldKind) -> Self {
        let field = FieldSpec {
            name,
            offset: self.offset,
            kind,
        };
        self.offset += field.size();
        self.fields.push(field);
        self
    }

    fn scalar(self, name: &'static str, ty: ScalarType, sentinel: Sentinel) -> Self {
        self.push(
            name,
            FieldKind::Scalar {
                ty,
                sentinel,
                fill: None,
            },
        )
    }

    /// No sentinel; `value` is written when the field is omitted.
    fn filled(self, name: &'static str, ty: ScalarType, value: i64) -> Self {
        self.push(
            name,
            FieldKind::Scalar {
                ty,
                sentinel: Sentinel::None,
                fill: Some(value),
            },
        )
    }

    fn float(self, name: &'static str) -> Self {
        self.scalar(name, ScalarType::Float32, Sentinel::Nan)
    }

    fn reserved(self, name: &'static str, len: usize) -> Self {
        self.push(name, FieldKind::Reserved { len })
    }

    fn build(self, name: &'static str, declared_size: usize) -> Result<StructSchema> {
        StructSchema::new(name, declared_size, self.fields)
    }
}

fn system_state_schema() -> Result<StructSchema> {
    LayoutBuilder::new()
        .scalar("state", ScalarType::UInt8, Sentinel::None)
        .float("pressure1")
        .float("pressure2")
        .float("abs_pressure")
        .float("motor_current")
        .scalar("getriebemotor_pwm", ScalarType::UInt16, U16_UNCHANGED)
        .scalar("vibrationsmotor_pwm", ScalarType::UInt16, U16_UNCHANGED)
        .scalar("blower_pwm", ScalarType::UInt16, U16_UNCHANGED)
        .float("blower_pulse_rate_rpm")
        // 0xFF is a legitimate colour component, so the LEDs carry no sentinel
        .scalar("rgb0_red", ScalarType::UInt8, Sentinel::None)
        .scalar("rgb0_green", ScalarType::UInt8, Sentinel::None)
        .scalar("rgb0_blue", ScalarType::UInt8, Sentinel::None)
        .scalar("rgb1_red", ScalarType::UInt8, Sentinel::None)
        .scalar("rgb1_green", ScalarType::UInt8, Sentinel::None)
        .scalar("rgb1_blue", ScalarType::UInt8, Sentinel::None)
        .scalar("encoder_count", ScalarType::Int32, I32_UNCHANGED)
        .scalar("blower_pulse_count", ScalarType::UInt32, U32_UNCHANGED)
        .build("SystemState", 41)
}

fn manual_control_schema() -> Result<StructSchema> {
    LayoutBuilder::new()
        .float("blower_rpm")
        .float("getriebemotor_pwm")
        .float("vibrationsmotor_pwm")
        .scalar("enable_getriebemotor_nvs", ScalarType::UInt8, Sentinel::None)
        .float("feeder_seconds")
        .reserved("reserved", 8)
        .build("ManualControl", 25)
}

fn blower_pid_schema() -> Result<StructSchema> {
    LayoutBuilder::new()
        .float("kp")
        .float("ki")
        .float("kd")
        .float("target_frequency")
        .float("current_frequency")
        .float("last_error")
        .float("integral_sum")
        .scalar("current_pwm", ScalarType::UInt16, U16_UNCHANGED)
        .scalar("manual_pwm_value", ScalarType::UInt16, U16_UNCHANGED)
        .scalar("min_pwm_output", ScalarType::UInt16, U16_UNCHANGED)
        .scalar("max_pwm_output", ScalarType::UInt16, U16_UNCHANGED)
        // the firmware has no "unchanged" value for these; partial writes send 0
        .filled("update_interval_ms", ScalarType::UInt32, 0)
        .filled("flags", ScalarType::UInt32, 0)
        .filled("last_update_tick", ScalarType::UInt32, 0)
        .float("feed_forward")
        .float("derivative_filter_hz")
        .float("reserved_float_0")
        .float("reserved_float_1")
        .float("reserved_float_2")
        .float("reserved_float_3")
        .build("BlowerPID", 72)
}
