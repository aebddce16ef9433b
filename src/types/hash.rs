//! 32-byte digest type with network-order display.
//!
//! A [`Hash`] is read two ways: as a plain byte string (wire form, `to_hex`)
//! and as an unsigned big-endian integer (ordering, target comparison).
//! Display follows the network convention of printing the byte-reversed form.
//!
//! Only the value core lives here; digest functions are in
//! [`crate::crypto::digest`] and random generation in [`crate::crypto::random`].

use crate::types::buffer::{BufferError, ReadBuffer};
use crate::types::encoding::{Decode, Encode, EncodeSink};
use bprimitives_derive::Error;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Digest length in bytes.
pub const HASH_SIZE: usize = 32;

/// The all-zero hash.
pub const HASH_ZERO: Hash = Hash([0u8; HASH_SIZE]);

/// `0x01` followed by 31 zero bytes, in byte order.
pub const HASH_ONE: Hash = {
    let mut bytes = [0u8; HASH_SIZE];
    bytes[0] = 0x01;
    Hash(bytes)
};

/// Errors produced when parsing a textual hash.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HashError {
    /// Input is not valid hexadecimal.
    #[error("invalid hex hash: {0}")]
    InvalidHex(String),
}

/// Fixed-size 32-byte digest.
///
/// `Copy` and immutable: every transformation (`reverse`, construction from
/// bytes) produces a new value. The derived ordering compares bytes
/// lexicographically, which for equal-length arrays is exactly the unsigned
/// big-endian numeric order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash(pub [u8; HASH_SIZE]);

impl Hash {
    /// Builds a hash from an arbitrary-length byte slice, right-aligned.
    ///
    /// Longer input keeps only its last 32 bytes (the low-order end of a
    /// big-endian integer); shorter input is left-padded with zeros.
    pub fn from_bytes(bytes: &[u8]) -> Hash {
        let bytes = if bytes.len() > HASH_SIZE {
            &bytes[bytes.len() - HASH_SIZE..]
        } else {
            bytes
        };

        let mut out = [0u8; HASH_SIZE];
        out[HASH_SIZE - bytes.len()..].copy_from_slice(bytes);
        Hash(out)
    }

    /// Parses plain (unreversed) hex.
    pub fn from_hex(s: &str) -> Result<Hash, HashError> {
        let bytes = hex::decode(s).map_err(|e| HashError::InvalidHex(e.to_string()))?;
        Ok(Hash::from_bytes(&bytes))
    }

    /// Parses the display form produced by `to_string`.
    pub fn from_reversed_hex(s: &str) -> Result<Hash, HashError> {
        let mut bytes = hex::decode(s).map_err(|e| HashError::InvalidHex(e.to_string()))?;
        bytes.reverse();
        Ok(Hash::from_bytes(&bytes))
    }

    pub const fn zero() -> Hash {
        HASH_ZERO
    }

    pub fn is_zero(&self) -> bool {
        *self == HASH_ZERO
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// Returns bytes `begin..end` in byte order.
    ///
    /// # Panics
    ///
    /// Panics if the range falls outside the 32 bytes.
    pub fn take_bytes(&self, begin: usize, end: usize) -> &[u8] {
        &self.0[begin..end]
    }

    /// Returns a new hash with the byte order flipped.
    pub fn reverse(&self) -> Hash {
        let mut bytes = self.0;
        bytes.reverse();
        Hash(bytes)
    }

    /// Hex of the bytes as stored, without reversal.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter().rev() {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl FromStr for Hash {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hash::from_reversed_hex(s)
    }
}

impl From<[u8; HASH_SIZE]> for Hash {
    fn from(bytes: [u8; HASH_SIZE]) -> Self {
        Hash(bytes)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Encode for Hash {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        out.write(&self.0);
    }
}

impl Decode for Hash {
    fn decode(input: &mut ReadBuffer<'_>) -> Result<Self, BufferError> {
        input.get_hash()
    }
}

/// Comparator for `sort_by` and friends: unsigned big-endian order.
pub fn by_hash(a: &Hash, b: &Hash) -> Ordering {
    a.0.cmp(&b.0)
}

/// Sorts hashes into ascending numeric order.
pub fn sort_hashes(hashes: &mut [Hash]) {
    hashes.sort_unstable_by(by_hash);
}
