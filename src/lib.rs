//! Client for the BLE characteristics of Metexon Zellenradschleuse devices.
//!
//! The device exposes its state and set-points as fixed-layout, packed,
//! little-endian structures. This crate translates between those payloads and
//! typed records, and implements the firmware's partial-update protocol.
//!
//! # Features
//!
//! - Schema-driven codec for `SystemState`, `ManualControl` and `BlowerPID`
//! - Sentinel values ("leave unchanged") mapped to explicit absent markers
//! - Partial writes by sentinel pass-through or by merging over a baseline read
//! - Characteristic UUIDs in canonical and firmware byte order
//! - Transport-agnostic async client, with a `btleplug` transport behind the
//!   `ble` feature
//!
//! # Example
//!
//! ```
//! use metexon_ble::{decode, encode, Record, StructKind};
//!
//! // Only kp changes; every other field is sent as its sentinel
//! let update = Record::new().with("kp", 1.2f32);
//! let bytes = encode(StructKind::BlowerPid, &update, None)?;
//! assert_eq!(bytes.len(), 72);
//!
//! let record = decode(StructKind::BlowerPid, &bytes)?;
//! assert!(record.get("ki").unwrap().is_absent());
//! # Ok::<(), metexon_ble::CodecError>(())
//! ```
//!
//! # Partial updates
//!
//! | Field kind | Omitted, no baseline | Omitted, with baseline |
//! |------------|----------------------|------------------------|
//! | float | NaN | baseline value |
//! | integer with sentinel | sentinel | baseline value |
//! | integer without sentinel | `MissingBaseline` error | baseline value |
//!
//! Reserved padding is never addressable and is always written as zero.

#[cfg(feature = "ble")]
pub mod ble;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod transport;
pub mod uuids;

pub use client::ZellenradschleuseClient;
pub use codec::{
    decode, decode_typed, encode, encode_typed, encode_with, BlowerPid, FieldValue, ManualControl,
    MergePolicy, Record, Rgb, StructKind, SystemState, TypedRecord,
};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult, CodecError, ConfigError, Result};
pub use transport::{MemoryTransport, Transport};
pub use uuids::Characteristic;

#[cfg(feature = "ble")]
pub use ble::{BleError, BleTransport};
