//! Encoding and decoding traits over the wire buffer.
//!
//! All multi-byte integers are little-endian.
//!
//! # Binary Format
//!
//! - `u8`/`u16`/`u32`/`u64`: fixed-width little-endian
//! - `bool`: single byte (0 = false, 1 = true)
//! - [`VarInt`]: 1, 3, 5 or 9 bytes (see [`EncodeSink::write_var_int`])
//! - `Vec<T>`: VarInt element count followed by the elements, so `Vec<u8>`
//!   is exactly a var-bytes field
//! - `Option<T>`: 1-byte tag (0 = None, 1 = Some) followed by the value
//! - `[T; N]`: elements back to back, no prefix
//! - [`Hash`](crate::types::hash::Hash): 32 raw bytes
//! - [`Compact`](crate::types::compact::Compact): 4-byte little-endian scalar
//!
//! Structs and enums get these traits through `#[derive(WireCodec)]`.

use crate::types::buffer::{BufferError, ReadBuffer};

/// Upper bound on decoded element counts, so a hostile prefix cannot force
/// a huge allocation.
pub const MAX_VEC_LEN: u64 = 1_000_000;

/// Destination for encoded bytes.
///
/// Implemented by [`Buffer`](crate::types::buffer::Buffer), `Vec<u8>`,
/// [`SizeCounter`] and the SHA-256 [`HashBuilder`](crate::crypto::digest::HashBuilder),
/// so values can be hashed without an intermediate allocation.
pub trait EncodeSink {
    /// Appends raw bytes.
    fn write(&mut self, bytes: &[u8]);

    /// Appends `n` in the narrowest VarInt form.
    ///
    /// | value                   | bytes                     |
    /// |-------------------------|---------------------------|
    /// | `< 0xFD`                | the value itself          |
    /// | `<= 0xFFFF`             | `0xFD` + `u16` LE         |
    /// | `<= 0xFFFF_FFFF`        | `0xFE` + `u32` LE         |
    /// | otherwise               | `0xFF` + `u64` LE         |
    fn write_var_int(&mut self, n: u64) {
        match n {
            0..=0xFC => self.write(&[n as u8]),
            0xFD..=0xFFFF => {
                self.write(&[0xFD]);
                self.write(&(n as u16).to_le_bytes());
            }
            0x1_0000..=0xFFFF_FFFF => {
                self.write(&[0xFE]);
                self.write(&(n as u32).to_le_bytes());
            }
            _ => {
                self.write(&[0xFF]);
                self.write(&n.to_le_bytes());
            }
        }
    }
}

/// Counts encoded bytes without storing them.
#[derive(Debug, Default)]
pub struct SizeCounter {
    len: usize,
}

impl SizeCounter {
    pub fn new() -> Self {
        Self { len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl EncodeSink for SizeCounter {
    fn write(&mut self, bytes: &[u8]) {
        self.len += bytes.len();
    }
}

impl EncodeSink for Vec<u8> {
    fn write(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}

/// Types with a wire encoding.
pub trait Encode {
    fn encode<S: EncodeSink>(&self, out: &mut S);

    /// Number of bytes `encode` will produce.
    fn encoded_len(&self) -> usize {
        let mut counter = SizeCounter::new();
        self.encode(&mut counter);
        counter.len()
    }

    /// Encodes into a vector allocated with the exact capacity.
    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode(&mut out);
        out
    }
}

/// Types that can be read back from the wire.
pub trait Decode: Sized {
    /// Reads one value at the cursor.
    fn decode(input: &mut ReadBuffer<'_>) -> Result<Self, BufferError>;

    /// Decodes a value that must span the whole input.
    fn from_bytes(data: &[u8]) -> Result<Self, BufferError> {
        let mut input = ReadBuffer::new(data);
        let value = Self::decode(&mut input)?;

        match input.remaining() {
            0 => Ok(value),
            extra => Err(BufferError::TrailingBytes(extra)),
        }
    }
}

/// A `u64` carried in VarInt form.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarInt(pub u64);

impl Encode for VarInt {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        out.write_var_int(self.0);
    }
}

impl Decode for VarInt {
    fn decode(input: &mut ReadBuffer<'_>) -> Result<Self, BufferError> {
        input.get_var_int().map(VarInt)
    }
}

impl From<u64> for VarInt {
    fn from(n: u64) -> Self {
        VarInt(n)
    }
}

impl Encode for u8 {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        out.write(&[*self]);
    }
}

impl Decode for u8 {
    fn decode(input: &mut ReadBuffer<'_>) -> Result<Self, BufferError> {
        input.get_u8()
    }
}

macro_rules! impl_uint {
    ($($t:ty => $get:ident),*) => {
        $(
            impl Encode for $t {
                fn encode<S: EncodeSink>(&self, out: &mut S) {
                    out.write(&self.to_le_bytes());
                }
            }

            impl Decode for $t {
                fn decode(input: &mut ReadBuffer<'_>) -> Result<Self, BufferError> {
                    input.$get()
                }
            }
        )*
    };
}

impl_uint!(u16 => get_u16, u32 => get_u32, u64 => get_u64);

impl Encode for bool {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        out.write(&[*self as u8]);
    }
}

impl Decode for bool {
    fn decode(input: &mut ReadBuffer<'_>) -> Result<Self, BufferError> {
        let checkpoint = input.size();
        match input.get_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => {
                input.rewind(checkpoint);
                Err(BufferError::InvalidValue(other))
            }
        }
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        out.write_var_int(self.len() as u64);
        for item in self {
            item.encode(out);
        }
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(input: &mut ReadBuffer<'_>) -> Result<Self, BufferError> {
        let checkpoint = input.size();
        let result = decode_vec(input);
        if result.is_err() {
            input.rewind(checkpoint);
        }
        result
    }
}

fn decode_vec<T: Decode>(input: &mut ReadBuffer<'_>) -> Result<Vec<T>, BufferError> {
    let len = input.get_var_int()?;
    if len > MAX_VEC_LEN {
        return Err(BufferError::LengthOverflow(len));
    }

    // Reserve no more than the input could plausibly hold.
    let mut vec = Vec::with_capacity((len as usize).min(input.remaining()));
    for _ in 0..len {
        vec.push(T::decode(input)?);
    }
    Ok(vec)
}

impl<T: Encode> Encode for Option<T> {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        match self {
            None => out.write(&[0]),
            Some(value) => {
                out.write(&[1]);
                value.encode(out);
            }
        }
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(input: &mut ReadBuffer<'_>) -> Result<Self, BufferError> {
        let checkpoint = input.size();
        let result = match input.get_u8()? {
            0 => Ok(None),
            1 => T::decode(input).map(Some),
            other => Err(BufferError::InvalidValue(other)),
        };
        if result.is_err() {
            input.rewind(checkpoint);
        }
        result
    }
}

impl<T: Encode, const N: usize> Encode for [T; N] {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        for item in self {
            item.encode(out);
        }
    }
}

impl<T: Decode, const N: usize> Decode for [T; N] {
    fn decode(input: &mut ReadBuffer<'_>) -> Result<Self, BufferError> {
        let checkpoint = input.size();
        let mut items = Vec::with_capacity(N);
        for _ in 0..N {
            match T::decode(input) {
                Ok(item) => items.push(item),
                Err(err) => {
                    input.rewind(checkpoint);
                    return Err(err);
                }
            }
        }
        // Exactly N items were pushed above.
        items
            .try_into()
            .map_err(|_| BufferError::LengthOverflow(N as u64))
    }
}

macro_rules! impl_tuple {
    ($($name:ident),+) => {
        impl<$($name: Encode),+> Encode for ($($name,)+) {
            #[allow(non_snake_case)]
            fn encode<S: EncodeSink>(&self, out: &mut S) {
                let ($($name,)+) = self;
                $($name.encode(out);)+
            }
        }

        impl<$($name: Decode),+> Decode for ($($name,)+) {
            fn decode(input: &mut ReadBuffer<'_>) -> Result<Self, BufferError> {
                let checkpoint = input.size();
                let result: Result<Self, BufferError> =
                    (|| Ok(($($name::decode(input)?,)+)))();
                if result.is_err() {
                    input.rewind(checkpoint);
                }
                result
            }
        }
    };
}

impl_tuple!(A, B);
impl_tuple!(A, B, C);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::buffer::Buffer;

    #[test]
    fn size_counter_accumulates() {
        let mut counter = SizeCounter::new();
        assert!(counter.is_empty());
        counter.write(&[1, 2, 3]);
        counter.write(&[4, 5]);
        assert_eq!(counter.len(), 5);
    }

    #[test]
    fn to_bytes_has_exact_capacity() {
        let data: Vec<u8> = vec![1, 2, 3, 4, 5];
        let bytes = data.to_bytes();
        assert_eq!(bytes.len(), 1 + 5);
        assert_eq!(bytes.capacity(), bytes.len());
    }

    #[test]
    fn u32_is_little_endian() {
        assert_eq!(0x12345678u32.to_bytes(), vec![0x78, 0x56, 0x34, 0x12]);
        assert_eq!(u32::from_bytes(&[0x78, 0x56, 0x34, 0x12]).unwrap(), 0x12345678);
    }

    #[test]
    fn var_int_widths() {
        let cases: [(u64, usize); 7] = [
            (0, 1),
            (0xFC, 1),
            (0xFD, 3),
            (0xFFFF, 3),
            (0x1_0000, 5),
            (0xFFFF_FFFF, 5),
            (0x1_0000_0000, 9),
        ];
        for (value, len) in cases {
            let bytes = VarInt(value).to_bytes();
            assert_eq!(bytes.len(), len, "value {:#x}", value);
            assert_eq!(VarInt::from_bytes(&bytes).unwrap(), VarInt(value));
        }
    }

    #[test]
    fn vec_u8_matches_var_bytes_layout() {
        let payload = vec![0xAAu8, 0xBB, 0xCC];
        let mut buf = Buffer::new();
        buf.put_var_bytes(&payload);
        assert_eq!(payload.to_bytes(), buf.into_bytes());
    }

    #[test]
    fn vec_roundtrip() {
        let original: Vec<u32> = vec![1, 2, 3, 4, 5];
        let decoded = Vec::<u32>::from_bytes(&original.to_bytes()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn vec_length_overflow() {
        let bytes = VarInt(MAX_VEC_LEN + 1).to_bytes();
        assert!(matches!(
            Vec::<u8>::from_bytes(&bytes),
            Err(BufferError::LengthOverflow(_))
        ));
    }

    #[test]
    fn vec_truncated_leaves_cursor_at_prefix() {
        let mut bytes = VarInt(4).to_bytes();
        bytes.extend_from_slice(&[1, 2]);
        let mut input = ReadBuffer::new(&bytes);
        assert!(matches!(
            Vec::<u8>::decode(&mut input),
            Err(BufferError::Overflow { .. })
        ));
        assert_eq!(input.size(), 0);
    }

    #[test]
    fn bool_rejects_other_bytes() {
        assert!(!bool::from_bytes(&[0]).unwrap());
        assert!(bool::from_bytes(&[1]).unwrap());
        assert!(matches!(
            bool::from_bytes(&[2]),
            Err(BufferError::InvalidValue(2))
        ));
    }

    #[test]
    fn option_tags() {
        assert_eq!(None::<u32>.to_bytes(), vec![0]);
        let some = Some(0x12345678u32).to_bytes();
        assert_eq!(some[0], 1);
        assert_eq!(Option::<u32>::from_bytes(&some).unwrap(), Some(0x12345678));
        assert!(matches!(
            Option::<u32>::from_bytes(&[7, 0, 0, 0, 0]),
            Err(BufferError::InvalidValue(7))
        ));
    }

    #[test]
    fn array_has_no_prefix() {
        let arr: [u16; 2] = [0x0102, 0x0304];
        assert_eq!(arr.to_bytes(), vec![0x02, 0x01, 0x04, 0x03]);
        assert_eq!(<[u16; 2]>::from_bytes(&arr.to_bytes()).unwrap(), arr);
    }

    #[test]
    fn trailing_bytes_rejected() {
        assert!(matches!(
            u8::from_bytes(&[42, 0xFF]),
            Err(BufferError::TrailingBytes(1))
        ));
    }

    #[test]
    fn empty_input_overflows() {
        assert!(matches!(
            u32::from_bytes(&[]),
            Err(BufferError::Overflow { needed: 4, remaining: 0 })
        ));
    }
}
