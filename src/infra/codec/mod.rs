//! Byte-level encodings of protocol values.
pub mod wire;
