//! Little-endian cursor buffers for the wire format.
//!
//! [`Buffer`] is the write side: it owns its storage and only ever appends,
//! so its cursor always equals its length. [`ReadBuffer`] is the read side:
//! it borrows the caller's bytes and walks them with a cursor.
//!
//! Reads come in two tiers:
//! - `get_*` are checked. When fewer bytes remain than the field needs they
//!   return [`BufferError::Overflow`] and leave the cursor where it was.
//! - `take_*` are unchecked and panic on overrun. They are for hot paths that
//!   already validated the length with [`ReadBuffer::has_size`]; an overrun
//!   there is a caller bug, not an input error.
//!
//! Writes never fail.

use crate::crypto::digest::dhash256;
use crate::types::compact::{COMPACT_SIZE, Compact};
use crate::types::encoding::EncodeSink;
use crate::types::hash::{HASH_SIZE, Hash};
use bprimitives_derive::Error;

/// Initial capacity reserved by [`Buffer::new`].
pub const DEFAULT_CAPACITY: usize = 128;

/// Length of the trailing checksum written by [`Buffer::put_checksum`].
pub const CHECKSUM_SIZE: usize = 4;

/// Errors reported by checked reads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// Fewer bytes remain than the field requires.
    #[error("buffer overflow: need {needed} bytes, {remaining} remaining")]
    Overflow { needed: usize, remaining: usize },
    /// A length prefix is larger than this platform or the decoder accepts.
    #[error("length prefix {0} exceeds the allowed maximum")]
    LengthOverflow(u64),
    /// Stored checksum does not match the preceding bytes.
    #[error("checksum mismatch: expected {expected:08x}, found {actual:08x}")]
    ChecksumMismatch { expected: u32, actual: u32 },
    /// Input continues after a value that should have consumed all of it.
    #[error("{0} trailing bytes after decoded value")]
    TrailingBytes(usize),
    /// Tag or flag byte outside the accepted set.
    #[error("invalid tag byte {0:#04x}")]
    InvalidValue(u8),
}

/// Append-only little-endian writer.
///
/// Every `put_*` returns `&mut Self` so fields can be chained:
///
/// ```
/// use bprimitives::types::buffer::Buffer;
///
/// let mut buf = Buffer::new();
/// buf.put_u32(1).put_var_bytes(b"payload").put_checksum();
/// assert_eq!(buf.size(), 4 + 1 + 7 + 4);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buffer {
    data: Vec<u8>,
}

impl Buffer {
    /// Creates an empty writer with [`DEFAULT_CAPACITY`] reserved.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    pub fn put_u8(&mut self, n: u8) -> &mut Self {
        self.data.push(n);
        self
    }

    pub fn put_u16(&mut self, n: u16) -> &mut Self {
        self.put_bytes(&n.to_le_bytes())
    }

    pub fn put_u32(&mut self, n: u32) -> &mut Self {
        self.put_bytes(&n.to_le_bytes())
    }

    pub fn put_u64(&mut self, n: u64) -> &mut Self {
        self.put_bytes(&n.to_le_bytes())
    }

    /// Appends `n` as a VarInt, discriminator byte included for values of
    /// `0xFD` and above.
    pub fn put_var_int(&mut self, n: u64) -> &mut Self {
        self.write_var_int(n);
        self
    }

    /// Appends raw bytes with no length prefix.
    pub fn put_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.data.extend_from_slice(bytes);
        self
    }

    /// Appends a VarInt length followed by the bytes.
    pub fn put_var_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.put_var_int(bytes.len() as u64).put_bytes(bytes)
    }

    pub fn put_hash(&mut self, hash: &Hash) -> &mut Self {
        self.put_bytes(hash.as_slice())
    }

    pub fn put_compact(&mut self, compact: Compact) -> &mut Self {
        self.put_u32(compact.to_u32())
    }

    /// Appends the first four bytes of `dhash256` over everything written so
    /// far.
    pub fn put_checksum(&mut self) -> &mut Self {
        let digest = dhash256(&self.data);
        self.put_bytes(digest.take_bytes(0, CHECKSUM_SIZE))
    }

    /// Bytes written so far. A writer only appends, so this is also its
    /// cursor position.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The bytes produced so far.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl EncodeSink for Buffer {
    fn write(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }
}

impl From<Buffer> for Vec<u8> {
    fn from(buf: Buffer) -> Self {
        buf.data
    }
}

/// Cursor over borrowed little-endian bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadBuffer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ReadBuffer<'a> {
    /// Wraps `data` without copying it; the cursor starts at 0.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Whether at least `n` unread bytes remain.
    pub fn has_size(&self, n: usize) -> bool {
        n <= self.remaining()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Bytes consumed so far.
    pub fn size(&self) -> usize {
        self.pos
    }

    /// The whole underlying sequence, consumed or not.
    pub fn bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Moves the cursor back to `pos`, a value previously returned by
    /// [`size`](Self::size).
    ///
    /// # Panics
    ///
    /// Panics if `pos` lies ahead of the current cursor.
    pub fn rewind(&mut self, pos: usize) {
        assert!(pos <= self.pos, "rewind target {} is past cursor {}", pos, self.pos);
        self.pos = pos;
    }

    /// Consumes `n` bytes or reports how short the input is.
    fn advance(&mut self, n: usize) -> Result<&'a [u8], BufferError> {
        if !self.has_size(n) {
            return Err(BufferError::Overflow {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Consumes `N` bytes, panicking on overrun.
    fn advance_unchecked<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    fn advance_array<const N: usize>(&mut self) -> Result<[u8; N], BufferError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.advance(N)?);
        Ok(out)
    }

    pub fn get_u8(&mut self) -> Result<u8, BufferError> {
        self.advance_array::<1>().map(|b| b[0])
    }

    pub fn get_u16(&mut self) -> Result<u16, BufferError> {
        self.advance_array().map(u16::from_le_bytes)
    }

    pub fn get_u32(&mut self) -> Result<u32, BufferError> {
        self.advance_array().map(u32::from_le_bytes)
    }

    pub fn get_u64(&mut self) -> Result<u64, BufferError> {
        self.advance_array().map(u64::from_le_bytes)
    }

    /// Reads a VarInt. `0xFD`, `0xFE` and `0xFF` only select the payload
    /// width; any other first byte is the value. On overflow the cursor is
    /// restored to before the discriminator.
    pub fn get_var_int(&mut self) -> Result<u64, BufferError> {
        let checkpoint = self.pos;
        let result = match self.get_u8()? {
            0xFD => self.get_u16().map(u64::from),
            0xFE => self.get_u32().map(u64::from),
            0xFF => self.get_u64(),
            n => Ok(u64::from(n)),
        };
        if result.is_err() {
            self.pos = checkpoint;
        }
        result
    }

    /// Borrows the next `n` bytes.
    pub fn get_bytes(&mut self, n: usize) -> Result<&'a [u8], BufferError> {
        self.advance(n)
    }

    /// Reads a VarInt length and borrows that many bytes. On failure the
    /// cursor is restored to before the length prefix.
    pub fn get_var_bytes(&mut self) -> Result<&'a [u8], BufferError> {
        let checkpoint = self.pos;
        let len = self.get_var_int()?;
        let result = usize::try_from(len)
            .map_err(|_| BufferError::LengthOverflow(len))
            .and_then(|n| self.advance(n));
        if result.is_err() {
            self.pos = checkpoint;
        }
        result
    }

    pub fn get_hash(&mut self) -> Result<Hash, BufferError> {
        self.advance(HASH_SIZE).map(Hash::from_bytes)
    }

    pub fn get_compact(&mut self) -> Result<Compact, BufferError> {
        self.advance_array::<COMPACT_SIZE>()
            .map(|b| Compact::new(u32::from_le_bytes(b)))
    }

    /// Reads a 4-byte checksum and checks it against `dhash256` of every byte
    /// before it. On mismatch the cursor is left before the checksum.
    pub fn get_checksum(&mut self) -> Result<(), BufferError> {
        let checkpoint = self.pos;
        let stored = self.advance_array::<CHECKSUM_SIZE>()?;
        let digest = dhash256(&self.data[..checkpoint]);

        let mut computed = [0u8; CHECKSUM_SIZE];
        computed.copy_from_slice(digest.take_bytes(0, CHECKSUM_SIZE));
        if stored != computed {
            self.pos = checkpoint;
            return Err(BufferError::ChecksumMismatch {
                expected: u32::from_be_bytes(computed),
                actual: u32::from_be_bytes(stored),
            });
        }
        Ok(())
    }

    /// # Panics
    ///
    /// Panics if no bytes remain.
    pub fn take_u8(&mut self) -> u8 {
        self.advance_unchecked::<1>()[0]
    }

    /// # Panics
    ///
    /// Panics if fewer than 2 bytes remain.
    pub fn take_u16(&mut self) -> u16 {
        u16::from_le_bytes(self.advance_unchecked())
    }

    /// # Panics
    ///
    /// Panics if fewer than 4 bytes remain.
    pub fn take_u32(&mut self) -> u32 {
        u32::from_le_bytes(self.advance_unchecked())
    }

    /// # Panics
    ///
    /// Panics if fewer than 8 bytes remain.
    pub fn take_u64(&mut self) -> u64 {
        u64::from_le_bytes(self.advance_unchecked())
    }

    /// # Panics
    ///
    /// Panics if fewer than 32 bytes remain.
    pub fn take_hash(&mut self) -> Hash {
        Hash(self.advance_unchecked::<HASH_SIZE>())
    }

    /// # Panics
    ///
    /// Panics if fewer than 4 bytes remain.
    pub fn take_compact(&mut self) -> Compact {
        Compact::new(self.take_u32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::digest::hash256;

    fn overflow(needed: usize, remaining: usize) -> BufferError {
        BufferError::Overflow { needed, remaining }
    }

    #[test]
    fn new_buffer_is_empty() {
        let buf = Buffer::new();
        assert_eq!(buf.size(), 0);
        assert!(buf.is_empty());
        assert!(buf.bytes().is_empty());
    }

    #[test]
    fn size_tracks_appended_bytes() {
        let mut buf = Buffer::with_capacity(4);
        buf.put_u16(7).put_var_bytes(b"abc");
        assert_eq!(buf.size(), buf.bytes().len());
        assert_eq!(buf.size(), 6);
        assert!(!buf.is_empty());
    }

    #[test]
    fn integers_are_little_endian() {
        let mut buf = Buffer::new();
        buf.put_u8(0x01)
            .put_u16(0x0203)
            .put_u32(0x0405_0607)
            .put_u64(0x0809_0A0B_0C0D_0E0F);
        assert_eq!(
            buf.bytes(),
            &[
                0x01, 0x03, 0x02, 0x07, 0x06, 0x05, 0x04, 0x0F, 0x0E, 0x0D, 0x0C, 0x0B, 0x0A,
                0x09, 0x08
            ]
        );
        assert_eq!(buf.size(), 15);
    }

    #[test]
    fn checked_integer_roundtrip() {
        let mut buf = Buffer::new();
        buf.put_u8(u8::MAX)
            .put_u16(0xBEEF)
            .put_u32(u32::MAX - 1)
            .put_u64(u64::MAX / 3);
        let bytes = buf.into_bytes();

        let mut rd = ReadBuffer::new(&bytes);
        assert_eq!(rd.get_u8().unwrap(), u8::MAX);
        assert_eq!(rd.get_u16().unwrap(), 0xBEEF);
        assert_eq!(rd.get_u32().unwrap(), u32::MAX - 1);
        assert_eq!(rd.get_u64().unwrap(), u64::MAX / 3);
        assert_eq!(rd.size(), bytes.len());
        assert_eq!(rd.remaining(), 0);
    }

    #[test]
    fn unchecked_integer_roundtrip() {
        let mut buf = Buffer::new();
        buf.put_u8(7).put_u16(300).put_u32(70_000).put_u64(1 << 40);
        let bytes = buf.into_bytes();

        let mut rd = ReadBuffer::new(&bytes);
        assert!(rd.has_size(15));
        assert_eq!(rd.take_u8(), 7);
        assert_eq!(rd.take_u16(), 300);
        assert_eq!(rd.take_u32(), 70_000);
        assert_eq!(rd.take_u64(), 1 << 40);
        assert!(!rd.has_size(1));
    }

    #[test]
    #[should_panic]
    fn unchecked_read_past_end_panics() {
        let bytes = [0u8; 3];
        let mut rd = ReadBuffer::new(&bytes);
        rd.take_u32();
    }

    #[test]
    fn var_int_boundaries_roundtrip() {
        let cases: [(u64, &[u8]); 7] = [
            (0, &[0x00]),
            (0xFC, &[0xFC]),
            (0xFD, &[0xFD, 0xFD, 0x00]),
            (0xFFFF, &[0xFD, 0xFF, 0xFF]),
            (0x1_0000, &[0xFE, 0x00, 0x00, 0x01, 0x00]),
            (0xFFFF_FFFF, &[0xFE, 0xFF, 0xFF, 0xFF, 0xFF]),
            (
                0x1_0000_0000,
                &[0xFF, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00],
            ),
        ];
        for (value, encoded) in cases {
            let mut buf = Buffer::new();
            buf.put_var_int(value);
            assert_eq!(buf.bytes(), encoded, "value {:#x}", value);

            let mut rd = ReadBuffer::new(buf.bytes());
            assert_eq!(rd.get_var_int().unwrap(), value);
            assert_eq!(rd.remaining(), 0);
        }
    }

    #[test]
    fn var_bytes_roundtrip() {
        let payload = vec![0x5Au8; 300];
        let mut buf = Buffer::new();
        buf.put_var_bytes(&payload).put_var_bytes(&[]);
        assert_eq!(buf.size(), 3 + 300 + 1);

        let bytes = buf.into_bytes();
        let mut rd = ReadBuffer::new(&bytes);
        assert_eq!(rd.get_var_bytes().unwrap(), payload.as_slice());
        assert!(rd.get_var_bytes().unwrap().is_empty());
    }

    #[test]
    fn hash_and_compact_fields() {
        let hash = hash256(b"field");
        let compact = Compact::new(0x1d00_ffff);
        let mut buf = Buffer::new();
        buf.put_hash(&hash).put_compact(compact);
        assert_eq!(buf.size(), HASH_SIZE + COMPACT_SIZE);
        assert_eq!(&buf.bytes()[HASH_SIZE..], &[0xFF, 0xFF, 0x00, 0x1D]);

        let bytes = buf.into_bytes();
        let mut rd = ReadBuffer::new(&bytes);
        assert_eq!(rd.get_hash().unwrap(), hash);
        assert_eq!(rd.get_compact().unwrap(), compact);

        let mut rd = ReadBuffer::new(&bytes);
        assert_eq!(rd.take_hash(), hash);
        assert_eq!(rd.take_compact(), compact);
    }

    #[test]
    fn checked_reads_overflow_without_moving_cursor() {
        let bytes = [0xAAu8; 3];
        let mut rd = ReadBuffer::new(&bytes);
        rd.get_u8().unwrap();

        assert_eq!(rd.get_u32(), Err(overflow(4, 2)));
        assert_eq!(rd.get_u64(), Err(overflow(8, 2)));
        assert_eq!(rd.get_hash(), Err(overflow(32, 2)));
        assert_eq!(rd.get_compact(), Err(overflow(4, 2)));
        assert_eq!(rd.get_bytes(3), Err(overflow(3, 2)));
        assert_eq!(rd.size(), 1);

        assert_eq!(rd.get_u16().unwrap(), 0xAAAA);
        assert_eq!(rd.get_u8(), Err(overflow(1, 0)));
        assert_eq!(rd.get_u16(), Err(overflow(2, 0)));
        assert_eq!(rd.size(), 3);
    }

    #[test]
    fn truncated_var_int_restores_cursor() {
        let bytes = [0xFE, 0x01, 0x02];
        let mut rd = ReadBuffer::new(&bytes);
        assert_eq!(rd.get_var_int(), Err(overflow(4, 2)));
        assert_eq!(rd.size(), 0);
    }

    #[test]
    fn truncated_var_bytes_restores_cursor() {
        let bytes = [0x05, 0x01, 0x02];
        let mut rd = ReadBuffer::new(&bytes);
        assert_eq!(rd.get_var_bytes(), Err(overflow(5, 2)));
        assert_eq!(rd.size(), 0);
    }

    #[test]
    fn get_bytes_borrows_input() {
        let bytes = [1u8, 2, 3, 4];
        let mut rd = ReadBuffer::new(&bytes);
        let head = rd.get_bytes(2).unwrap();
        assert_eq!(head, &[1, 2]);
        assert_eq!(rd.bytes(), &bytes);
        assert_eq!(rd.size(), 2);
    }

    #[test]
    fn checksum_covers_preceding_bytes() {
        let mut buf = Buffer::new();
        buf.put_bytes(b"hello").put_checksum();
        let expected = dhash256(b"hello");
        assert_eq!(&buf.bytes()[5..], expected.take_bytes(0, 4));

        let bytes = buf.into_bytes();
        let mut rd = ReadBuffer::new(&bytes);
        rd.get_bytes(5).unwrap();
        assert_eq!(rd.get_checksum(), Ok(()));
        assert_eq!(rd.remaining(), 0);
    }

    #[test]
    fn corrupted_checksum_is_reported() {
        let mut buf = Buffer::new();
        buf.put_u32(42).put_checksum();
        let mut bytes = buf.into_bytes();
        bytes[0] ^= 0x01;

        let mut rd = ReadBuffer::new(&bytes);
        rd.get_u32().unwrap();
        assert!(matches!(
            rd.get_checksum(),
            Err(BufferError::ChecksumMismatch { .. })
        ));
        assert_eq!(rd.size(), 4);
    }

    #[test]
    fn rewind_allows_retry() {
        let bytes = [0x01, 0x02];
        let mut rd = ReadBuffer::new(&bytes);
        let mark = rd.size();
        assert_eq!(rd.get_u16().unwrap(), 0x0201);
        rd.rewind(mark);
        assert_eq!(rd.get_u8().unwrap(), 0x01);
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            overflow(4, 1).to_string(),
            "buffer overflow: need 4 bytes, 1 remaining"
        );
        assert_eq!(
            BufferError::InvalidValue(0x07).to_string(),
            "invalid tag byte 0x07"
        );
    }
}
