//! Derive macros for the bprimitives crate.
//!
//! Provides:
//! - `#[derive(WireCodec)]` - `Encode`/`Decode` over the little-endian wire buffer
//! - `#[derive(Error)]` - `Display` and `std::error::Error` from `#[error("...")]` messages

mod error;
mod wire_codec;

use proc_macro::TokenStream;

/// Implements `Encode` and `Decode` by walking fields in declaration order.
#[proc_macro_derive(WireCodec)]
pub fn derive_wire_codec(input: TokenStream) -> TokenStream {
    wire_codec::derive_wire_codec(input)
}

/// Implements `Display` and `Error` for error enums and structs.
#[proc_macro_derive(Error, attributes(error))]
pub fn derive_error(input: TokenStream) -> TokenStream {
    error::derive_error(input)
}
