//! Compact base-256 floating point encoding of large integers.
//!
//! Used for proof-of-work style difficulty targets. The 32-bit value is laid
//! out as:
//!
//! ```text
//! -------------------------------------------------
//! |   Exponent     |    Sign    |    Mantissa     |
//! -------------------------------------------------
//! | 8 bits [31-24] | 1 bit [23] | 23 bits [22-00] |
//! -------------------------------------------------
//! ```
//!
//! and denotes `(-1^sign) * mantissa * 256^(exponent-3)`.
//!
//! Nothing is normalised: a zero mantissa means zero whatever the exponent,
//! and low-order bytes beyond the three mantissa bytes are dropped on encode.
//!
//! The encoder keeps its byte count in an 8-bit exponent and shifts it in
//! place, so the packed exponent byte is always zero. Encoded values carry
//! the leading bytes and sign of the input but not its magnitude:
//! `[0x01]` encodes to `0x00010000`, which decodes to zero.

use crate::types::buffer::{BufferError, ReadBuffer};
use crate::types::encoding::{Decode, Encode, EncodeSink};
use crate::types::hash::Hash;
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::Zero;
use std::fmt;

/// Encoded size in bytes.
pub const COMPACT_SIZE: usize = 4;

const SIGN_BIT: u32 = 0x0080_0000;
const MANTISSA_MASK: u32 = 0x007F_FFFF;

/// A packed 32-bit target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Compact(pub u32);

impl Compact {
    pub const fn new(bits: u32) -> Compact {
        Compact(bits)
    }

    pub const fn to_u32(self) -> u32 {
        self.0
    }

    pub const fn exponent(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn mantissa(self) -> u32 {
        self.0 & MANTISSA_MASK
    }

    pub const fn is_negative(self) -> bool {
        self.0 & SIGN_BIT != 0
    }

    /// Encodes an unsigned big-endian magnitude.
    pub fn from_bytes(bytes: &[u8]) -> Compact {
        Compact::from_bigint(&BigInt::from_bytes_be(Sign::Plus, bytes))
    }

    /// Encodes a signed integer, keeping its three most significant bytes
    /// as the mantissa.
    pub fn from_bigint(n: &BigInt) -> Compact {
        let magnitude = n.magnitude();
        if magnitude.is_zero() {
            return Compact(0);
        }

        let size = magnitude.bits().div_ceil(8);
        let mut exponent = size as u8;
        let mut mantissa = if size <= 3 {
            low_u32(magnitude) << (8 * (3 - size))
        } else {
            low_u32(&(magnitude >> (8 * (size - 3))))
        };

        // A mantissa with bit 23 set would read back as negative, so give up
        // one byte of precision and bump the exponent instead.
        if mantissa & SIGN_BIT != 0 {
            mantissa >>= 8;
            exponent = exponent.wrapping_add(1);
        }

        let mut bits = pack_exponent(exponent) | mantissa;
        if n.sign() == Sign::Minus {
            bits |= SIGN_BIT;
        }
        Compact(bits)
    }

    /// Decodes to the signed integer this value denotes.
    pub fn to_bigint(self) -> BigInt {
        let sign = if self.is_negative() {
            Sign::Minus
        } else {
            Sign::Plus
        };
        BigInt::from_biguint(sign, self.magnitude())
    }

    /// Minimal big-endian bytes of the magnitude; empty for zero.
    ///
    /// The sign is not part of the byte form; see [`Compact::is_negative`]
    /// or [`Compact::to_bigint`].
    pub fn to_bytes(self) -> Vec<u8> {
        let magnitude = self.magnitude();
        if magnitude.is_zero() {
            return Vec::new();
        }
        magnitude.to_bytes_be()
    }

    /// The magnitude as a right-aligned hash, for comparing block hashes
    /// against the target.
    pub fn to_hash(self) -> Hash {
        Hash::from_bytes(&self.to_bytes())
    }

    fn magnitude(self) -> BigUint {
        let exponent = self.0 >> 24;
        let mantissa = self.mantissa();
        if exponent <= 3 {
            BigUint::from(mantissa >> (8 * (3 - exponent)))
        } else {
            BigUint::from(mantissa) << (8 * (exponent - 3)) as usize
        }
    }
}

/// Shifts the exponent into the top byte within its own 8-bit width, which
/// leaves nothing behind for any exponent.
fn pack_exponent(exponent: u8) -> u32 {
    u32::from(exponent.checked_shl(24).unwrap_or(0))
}

fn low_u32(n: &BigUint) -> u32 {
    n.iter_u32_digits().next().unwrap_or(0)
}

impl From<u32> for Compact {
    fn from(bits: u32) -> Self {
        Compact(bits)
    }
}

impl From<Compact> for u32 {
    fn from(compact: Compact) -> Self {
        compact.0
    }
}

impl fmt::Display for Compact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

impl Encode for Compact {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        out.write(&self.0.to_le_bytes());
    }
}

impl Decode for Compact {
    fn decode(input: &mut ReadBuffer<'_>) -> Result<Self, BufferError> {
        input.get_compact()
    }
}
