//! Test fixtures for integration tests
//!
//! Hand-built characteristic payloads and random record generators.

use byteorder::{ByteOrder, LittleEndian};
use metexon_ble::codec::{ScalarType, Sentinel};
use metexon_ble::{FieldValue, Record, StructKind};
use rand::Rng;

/// BlowerPID payload as the firmware would report it
pub fn blower_pid_payload() -> Vec<u8> {
    let mut data = vec![0u8; 72];
    LittleEndian::write_f32(&mut data[0..4], 1.0); // kp
    LittleEndian::write_f32(&mut data[4..8], 0.5); // ki
    LittleEndian::write_f32(&mut data[8..12], 0.1); // kd
    LittleEndian::write_f32(&mut data[12..16], 100.0); // target_frequency
    LittleEndian::write_f32(&mut data[16..20], 95.0); // current_frequency
    LittleEndian::write_f32(&mut data[20..24], 5.0); // last_error
    LittleEndian::write_f32(&mut data[24..28], 10.0); // integral_sum
    LittleEndian::write_u16(&mut data[28..30], 111); // current_pwm
    LittleEndian::write_u16(&mut data[30..32], 222); // manual_pwm_value
    LittleEndian::write_u16(&mut data[32..34], 10); // min_pwm_output
    LittleEndian::write_u16(&mut data[34..36], 1023); // max_pwm_output
    LittleEndian::write_u32(&mut data[36..40], 50); // update_interval_ms
    LittleEndian::write_u32(&mut data[40..44], 3); // flags
    LittleEndian::write_u32(&mut data[44..48], 123_456); // last_update_tick
    LittleEndian::write_f32(&mut data[48..52], 0.0); // feed_forward
    LittleEndian::write_f32(&mut data[52..56], 25.0); // derivative_filter_hz
    for offset in [56, 60, 64, 68] {
        LittleEndian::write_f32(&mut data[offset..offset + 4], f32::NAN); // reserved_floats
    }
    data
}

/// ManualControl payload with the given motor enable flag
pub fn manual_control_payload(enable_getriebemotor_nvs: u8) -> Vec<u8> {
    let mut data = vec![0u8; 25];
    LittleEndian::write_f32(&mut data[0..4], 800.0); // blower_rpm
    LittleEndian::write_f32(&mut data[4..8], 12.5); // getriebemotor_pwm
    LittleEndian::write_f32(&mut data[8..12], f32::NAN); // vibrationsmotor_pwm
    data[12] = enable_getriebemotor_nvs;
    LittleEndian::write_f32(&mut data[13..17], 2.0); // feeder_seconds
    data
}

/// SystemState payload with both LEDs set
pub fn system_state_payload() -> Vec<u8> {
    let mut data = vec![0u8; 41];
    data[0] = 2; // state
    LittleEndian::write_f32(&mut data[1..5], 1013.25); // pressure1
    LittleEndian::write_f32(&mut data[5..9], 990.5); // pressure2
    LittleEndian::write_f32(&mut data[9..13], f32::NAN); // abs_pressure
    LittleEndian::write_f32(&mut data[13..17], 0.75); // motor_current
    LittleEndian::write_u16(&mut data[17..19], 300); // getriebemotor_pwm
    LittleEndian::write_u16(&mut data[19..21], 0xFFFF); // vibrationsmotor_pwm
    LittleEndian::write_u16(&mut data[21..23], 512); // blower_pwm
    LittleEndian::write_f32(&mut data[23..27], 1450.0); // blower_pulse_rate_rpm
    data[27..33].copy_from_slice(&[255, 0, 0, 0, 128, 255]); // rgb
    LittleEndian::write_i32(&mut data[33..37], -1200); // encoder_count
    LittleEndian::write_u32(&mut data[37..41], 987_654); // blower_pulse_count
    data
}

/// A representable, non-sentinel value for a scalar
pub fn random_value<R: Rng>(rng: &mut R, ty: ScalarType, sentinel: Sentinel) -> FieldValue {
    match ty.int_range() {
        Some((min, max)) => loop {
            let v = rng.gen_range(min..=max);
            if sentinel != Sentinel::Int(v) {
                break FieldValue::Int(v);
            }
        },
        // f32-exact so the value survives narrowing
        None => FieldValue::from(rng.gen_range(-1.0e6f32..1.0e6f32)),
    }
}

/// Every addressable field set to a random value
pub fn random_record<R: Rng>(rng: &mut R, kind: StructKind) -> Record {
    kind.schema()
        .addressable_fields()
        .filter_map(|f| f.scalar().map(|ty| (f.name, random_value(rng, ty, f.sentinel()))))
        .collect()
}

/// Random record where sentinel-capable fields are absent with probability `p_absent`
pub fn random_partial_record<R: Rng>(rng: &mut R, kind: StructKind, p_absent: f64) -> Record {
    let mut record = Record::new();
    for field in kind.schema().addressable_fields() {
        let Some(ty) = field.scalar() else { continue };
        let value = if field.sentinel().is_supported() && rng.gen_bool(p_absent) {
            FieldValue::Absent
        } else {
            random_value(rng, ty, field.sentinel())
        };
        record.insert(field.name, value);
    }
    record
}
