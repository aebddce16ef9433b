//! SHA-256 based digests.

use crate::types::encoding::{Encode, EncodeSink};
use crate::types::hash::Hash;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Length of a [`hash160`] digest.
pub const HASH160_SIZE: usize = 20;

/// Single SHA-256 pass.
pub fn hash256(data: &[u8]) -> Hash {
    Hash(Sha256::digest(data).into())
}

/// SHA-256 applied twice. Used for checksums and canonical identifiers.
pub fn dhash256(data: &[u8]) -> Hash {
    hash256(&Sha256::digest(data))
}

/// SHA-256 followed by RIPEMD-160, for short address-style digests.
pub fn hash160(data: &[u8]) -> [u8; HASH160_SIZE] {
    Ripemd160::digest(Sha256::digest(data)).into()
}

/// Double SHA-256 of a value's wire encoding, streamed without a buffer.
pub fn dhash256_encoded<T: Encode + ?Sized>(value: &T) -> Hash {
    let mut builder = HashBuilder::new();
    value.encode(&mut builder);
    builder.finalize_double()
}

/// Incremental SHA-256.
///
/// Implements [`EncodeSink`] so encodable values can be fed in directly.
#[derive(Clone, Default)]
pub struct HashBuilder {
    hasher: Sha256,
}

impl HashBuilder {
    pub fn new() -> Self {
        Self {
            hasher: Sha256::new(),
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Single-pass digest of everything fed so far.
    pub fn finalize(self) -> Hash {
        Hash(self.hasher.finalize().into())
    }

    /// Hashes the single-pass digest once more.
    pub fn finalize_double(self) -> Hash {
        hash256(&self.hasher.finalize())
    }
}

impl EncodeSink for HashBuilder {
    fn write(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }
}
