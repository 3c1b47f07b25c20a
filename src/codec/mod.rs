//! Binary codec for the packed structures exposed over GATT.
//!
//! Every structure is little-endian and packed without padding. Layouts live
//! in [`registry`]; [`decode`] turns a payload into a [`Record`] and
//! [`encode`] turns a (possibly partial) record back into bytes.

pub mod deserializer;
pub mod record;
pub mod registry;
pub mod serializer;
pub mod typed;
pub mod types;

pub use deserializer::decode;
pub use record::{FieldValue, Record};
pub use registry::StructKind;
pub use serializer::{encode, encode_with, MergePolicy};
pub use typed::{decode_typed, encode_typed, BlowerPid, ManualControl, Rgb, SystemState, TypedRecord};
pub use types::{FieldKind, FieldSpec, ScalarType, Sentinel, StructSchema};
