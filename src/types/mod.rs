//! Wire-level value types.
//!
//! - `Buffer`/`ReadBuffer`: little-endian cursor encoding
//! - `Compact`: packed 32-bit difficulty targets
//! - `Hash`: fixed 32-byte digests
//! - `Encode`/`Decode`: the traits `#[derive(WireCodec)]` implements

pub mod buffer;
pub mod compact;
pub mod encoding;
pub mod hash;
