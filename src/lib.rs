//! Binary wire primitives.
//!
//! A little-endian cursor buffer with VarInt and checksum support, the
//! compact base-256 target encoding, and a 32-byte digest type displayed in
//! network (byte-reversed) order.
//!
//! ```
//! use bprimitives::types::buffer::{Buffer, ReadBuffer};
//! use bprimitives::types::compact::Compact;
//! use bprimitives::crypto::digest::dhash256;
//!
//! let mut buf = Buffer::new();
//! buf.put_var_int(0xFFFF)
//!     .put_compact(Compact::new(0x1d00_ffff))
//!     .put_hash(&dhash256(b"parent"))
//!     .put_checksum();
//!
//! let mut rd = ReadBuffer::new(buf.bytes());
//! assert_eq!(rd.get_var_int().unwrap(), 0xFFFF);
//! assert_eq!(rd.get_compact().unwrap().to_u32(), 0x1d00_ffff);
//! assert_eq!(rd.get_hash().unwrap(), dhash256(b"parent"));
//! rd.get_checksum().unwrap();
//! ```

// Lets derive output name `::bprimitives::...` from inside this crate too.
extern crate self as bprimitives;

pub mod crypto;
pub mod types;
pub mod utils;

pub use bprimitives_derive::{Error, WireCodec};
