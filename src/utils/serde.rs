//! Byte encoding of the messages exchanged between the two parties.
//!
//! The protocol itself is transport agnostic: every message is a plain value
//! deriving [`Serialize`] and [`Deserialize`](serde::Deserialize). These
//! helpers fix the encoding a host application should use when it moves them
//! over a wire.

use serde::{Serialize, de::DeserializeOwned};

/// Encodes a protocol message as bytes.
pub fn serialize<T: Serialize + ?Sized>(val: &T) -> Result<Vec<u8>, bincode::Error> {
    bincode::serialize(val)
}

/// Decodes a protocol message previously produced by [`serialize`].
pub fn deserialize<T: DeserializeOwned>(slice: &[u8]) -> Result<T, bincode::Error> {
    bincode::deserialize(slice)
}
