//! GATT UUIDs of the Metexon service.
//!
//! The firmware declares its 128-bit UUIDs with the bytes listed least
//! significant first (`BLE_UUID128_INIT` order). [`uuid::Uuid`] stores them in
//! canonical RFC 4122 order, so every firmware byte list is reversed once here
//! and nowhere else.

use std::fmt;

use uuid::Uuid;

/// Convert a firmware (LSB-first) byte list into a canonical UUID.
pub const fn from_firmware_bytes(bytes: [u8; 16]) -> Uuid {
    let mut canonical = [0u8; 16];
    let mut i = 0;
    while i < 16 {
        canonical[i] = bytes[15 - i];
        i += 1;
    }
    Uuid::from_bytes(canonical)
}

/// The firmware (LSB-first) byte list for a canonical UUID.
pub fn to_firmware_bytes(uuid: &Uuid) -> [u8; 16] {
    let mut bytes = *uuid.as_bytes();
    bytes.reverse();
    bytes
}

const SERVICE_BYTES: [u8; 16] = [
    0xAA, 0x85, 0x9E, 0x5F, 0xDD, 0x5A, 0x82, 0x42, 0x81, 0x84, 0xC4, 0xE1, 0x23, 0x5F, 0x35, 0x42,
];
const DEVICE_TYPE_BYTES: [u8; 16] = [
    0xA0, 0xAF, 0x5C, 0xCA, 0xB2, 0x97, 0xDF, 0x4F, 0xBC, 0xC2, 0xFA, 0x6B, 0x78, 0xB7, 0xF7, 0x68,
];
const SYSTEM_STATE_BYTES: [u8; 16] = [
    0x68, 0x87, 0x98, 0x89, 0x0F, 0xFE, 0xAC, 0x4F, 0xAD, 0x0D, 0xF0, 0xDB, 0x24, 0xF6, 0xB1, 0x2F,
];
const RGB_LED_BYTES: [u8; 16] = [
    0x6C, 0xD5, 0xD1, 0x16, 0x9A, 0x35, 0x54, 0x4B, 0xBA, 0xCC, 0x47, 0xF1, 0x94, 0x0F, 0x37, 0x95,
];
const BLOWER_PID_BYTES: [u8; 16] = [
    0x4C, 0x38, 0x61, 0x23, 0x01, 0xBB, 0xA4, 0x41, 0x8F, 0x1B, 0x41, 0x8F, 0x95, 0x13, 0xC0, 0x60,
];
const WIFI_BYTES: [u8; 16] = [
    0xBD, 0xDA, 0x5D, 0x96, 0xF0, 0xF6, 0x7F, 0x45, 0x9C, 0x6D, 0x59, 0xF5, 0xB4, 0x6C, 0x77, 0x07,
];
const OTA_BYTES: [u8; 16] = [
    0x3E, 0x2D, 0x88, 0xB7, 0xEA, 0xED, 0x19, 0x43, 0x91, 0xB8, 0xD2, 0x04, 0x5F, 0x85, 0xD1, 0x2C,
];
const MANUAL_CONTROL_BYTES: [u8; 16] = [
    0x7B, 0xC1, 0x42, 0x5E, 0x11, 0xAA, 0x4D, 0x49, 0xA7, 0x77, 0xC5, 0x31, 0x9F, 0x42, 0xB3, 0x56,
];

/// Primary Metexon service
pub const SERVICE_UUID: Uuid = from_firmware_bytes(SERVICE_BYTES);

pub const DEVICE_TYPE_UUID: Uuid = from_firmware_bytes(DEVICE_TYPE_BYTES);
pub const SYSTEM_STATE_UUID: Uuid = from_firmware_bytes(SYSTEM_STATE_BYTES);
pub const RGB_LED_UUID: Uuid = from_firmware_bytes(RGB_LED_BYTES);
pub const BLOWER_PID_UUID: Uuid = from_firmware_bytes(BLOWER_PID_BYTES);
pub const MANUAL_CONTROL_UUID: Uuid = from_firmware_bytes(MANUAL_CONTROL_BYTES);

/// WiFi provisioning (not driven by this crate)
pub const WIFI_UUID: Uuid = from_firmware_bytes(WIFI_BYTES);

/// Firmware update (not driven by this crate)
pub const OTA_UUID: Uuid = from_firmware_bytes(OTA_BYTES);

/// `0000xxxx-0000-1000-8000-00805f9b34fb`
const BLUETOOTH_BASE: u128 = 0x0000_0000_0000_1000_8000_0080_5F9B_34FB;

pub const BLUETOOTH_BASE_UUID: Uuid = Uuid::from_u128(BLUETOOTH_BASE);

/// Expand a 16-bit SIG-assigned UUID onto the Bluetooth base UUID.
pub const fn short_uuid_16(short: u16) -> Uuid {
    short_uuid_32(short as u32)
}

/// Expand a 32-bit SIG-assigned UUID onto the Bluetooth base UUID.
pub const fn short_uuid_32(short: u32) -> Uuid {
    Uuid::from_u128(BLUETOOTH_BASE | ((short as u128) << 96))
}

/// The 32-bit short form of `uuid`, if it sits on the Bluetooth base UUID.
pub fn short_form(uuid: &Uuid) -> Option<u32> {
    let value = uuid.as_u128();
    if value & ((1u128 << 96) - 1) == BLUETOOTH_BASE {
        Some((value >> 96) as u32)
    } else {
        None
    }
}

/// Characteristics exposed by the Metexon service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Characteristic {
    DeviceType,
    SystemState,
    RgbLed,
    BlowerPid,
    Wifi,
    Ota,
    ManualControl,
}

impl Characteristic {
    pub const ALL: [Characteristic; 7] = [
        Characteristic::DeviceType,
        Characteristic::SystemState,
        Characteristic::RgbLed,
        Characteristic::BlowerPid,
        Characteristic::Wifi,
        Characteristic::Ota,
        Characteristic::ManualControl,
    ];

    pub const fn uuid(self) -> Uuid {
        from_firmware_bytes(self.firmware_bytes())
    }

    /// Bytes as listed in the firmware source.
    pub const fn firmware_bytes(self) -> [u8; 16] {
        match self {
            Characteristic::DeviceType => DEVICE_TYPE_BYTES,
            Characteristic::SystemState => SYSTEM_STATE_BYTES,
            Characteristic::RgbLed => RGB_LED_BYTES,
            Characteristic::BlowerPid => BLOWER_PID_BYTES,
            Characteristic::Wifi => WIFI_BYTES,
            Characteristic::Ota => OTA_BYTES,
            Characteristic::ManualControl => MANUAL_CONTROL_BYTES,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Characteristic::DeviceType => "device_type",
            Characteristic::SystemState => "system_state",
            Characteristic::RgbLed => "rgb_led",
            Characteristic::BlowerPid => "blower_pid",
            Characteristic::Wifi => "wifi",
            Characteristic::Ota => "ota",
            Characteristic::ManualControl => "manual_control",
        }
    }

    pub fn from_uuid(uuid: &Uuid) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.uuid() == *uuid)
    }
}

impl fmt::Display for Characteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<Characteristic> for Uuid {
    fn from(c: Characteristic) -> Self {
        c.uuid()
    }
}
