//! Derive macro for wire encoding.
//!
//! Generates `Encode` and `Decode` implementations against the crate's
//! little-endian [`Buffer`]/[`ReadBuffer`] pair.
//!
//! # Supported Types
//!
//! - **Named structs**: `struct Header { version: u32, prev: Hash }`
//! - **Tuple structs**: `struct Target(Compact)`
//! - **Unit structs**: `struct Ping`
//! - **Enums**: one `u8` tag followed by the variant's fields
//!
//! Unions are rejected at compile time.
//!
//! Fields are written in declaration order with no padding or field tags, so
//! the layout is exactly the concatenation of each field's own encoding.
//! A failed decode rewinds the cursor to where the value started.
//!
//! [`Buffer`]: ../bprimitives/types/buffer/struct.Buffer.html
//! [`ReadBuffer`]: ../bprimitives/types/buffer/struct.ReadBuffer.html

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{Data, DataEnum, DeriveInput, Fields, Ident, parse_macro_input};

/// Derives `Encode` and `Decode` for a type.
///
/// # Example
///
/// ```ignore
/// use bprimitives::WireCodec;
///
/// #[derive(WireCodec)]
/// pub struct Header {
///     pub version: u32,
///     pub bits: Compact,
/// }
/// ```
///
/// expands to roughly
///
/// ```ignore
/// impl Encode for Header {
///     fn encode<S: EncodeSink>(&self, out: &mut S) {
///         let Self { version, bits } = self;
///         Encode::encode(version, out);
///         Encode::encode(bits, out);
///     }
/// }
///
/// impl Decode for Header {
///     fn decode(input: &mut ReadBuffer<'_>) -> Result<Self, BufferError> {
///         Ok(Self {
///             version: Decode::decode(input)?,
///             bits: Decode::decode(input)?,
///         })
///     }
/// }
/// ```
pub fn derive_wire_codec(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let (encode_body, decode_body) = match &input.data {
        Data::Struct(data) => struct_bodies(&data.fields),
        Data::Enum(data) => enum_bodies(data)?,
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "WireCodec derive does not support unions",
            ));
        }
    };

    Ok(quote! {
        impl #impl_generics ::bprimitives::types::encoding::Encode for #name #ty_generics #where_clause {
            fn encode<S: ::bprimitives::types::encoding::EncodeSink>(&self, out: &mut S) {
                #encode_body
            }
        }

        impl #impl_generics ::bprimitives::types::encoding::Decode for #name #ty_generics #where_clause {
            fn decode(
                input: &mut ::bprimitives::types::buffer::ReadBuffer<'_>,
            ) -> ::std::result::Result<Self, ::bprimitives::types::buffer::BufferError> {
                let checkpoint = input.size();
                let result: ::std::result::Result<Self, ::bprimitives::types::buffer::BufferError> =
                    (|| { #decode_body })();
                if result.is_err() {
                    input.rewind(checkpoint);
                }
                result
            }
        }
    })
}

/// Local names bound to each field when destructuring: the field name for
/// named fields, `f0..fN` for positional ones.
fn bindings(fields: &Fields) -> Vec<Ident> {
    match fields {
        Fields::Named(named) => named
            .named
            .iter()
            .filter_map(|f| f.ident.clone())
            .collect(),
        Fields::Unnamed(unnamed) => (0..unnamed.unnamed.len())
            .map(|i| format_ident!("f{}", i))
            .collect(),
        Fields::Unit => Vec::new(),
    }
}

/// Pattern that destructures `path` into the given bindings.
fn pattern(path: &TokenStream2, fields: &Fields, binds: &[Ident]) -> TokenStream2 {
    match fields {
        Fields::Named(_) => quote! { #path { #(#binds),* } },
        Fields::Unnamed(_) => quote! { #path ( #(#binds),* ) },
        Fields::Unit => quote! { #path },
    }
}

/// Expression that decodes every field in order and builds `path`.
fn construct(path: &TokenStream2, fields: &Fields) -> TokenStream2 {
    let decode = quote! { ::bprimitives::types::encoding::Decode::decode(input)? };
    match fields {
        Fields::Named(named) => {
            let inits = named.named.iter().map(|f| {
                let name = &f.ident;
                quote! { #name: #decode }
            });
            quote! { #path { #(#inits),* } }
        }
        Fields::Unnamed(unnamed) => {
            let values = unnamed.unnamed.iter().map(|_| &decode);
            quote! { #path ( #(#values),* ) }
        }
        Fields::Unit => quote! { #path },
    }
}

fn encode_fields(binds: &[Ident]) -> TokenStream2 {
    quote! {
        #(::bprimitives::types::encoding::Encode::encode(#binds, out);)*
    }
}

fn struct_bodies(fields: &Fields) -> (TokenStream2, TokenStream2) {
    let path = quote! { Self };
    let binds = bindings(fields);

    let encode = if binds.is_empty() {
        quote! { let _ = out; }
    } else {
        let pat = pattern(&path, fields, &binds);
        let writes = encode_fields(&binds);
        quote! {
            let #pat = self;
            #writes
        }
    };

    let value = construct(&path, fields);
    let decode = quote! { Ok(#value) };

    (encode, decode)
}

fn enum_bodies(data: &DataEnum) -> syn::Result<(TokenStream2, TokenStream2)> {
    let tags = variant_tags(data)?;

    let mut encode_arms = Vec::with_capacity(data.variants.len());
    let mut decode_arms = Vec::with_capacity(data.variants.len());

    for (variant, tag) in data.variants.iter().zip(tags) {
        let ident = &variant.ident;
        let path = quote! { Self::#ident };
        let binds = bindings(&variant.fields);
        let pat = pattern(&path, &variant.fields, &binds);
        let writes = encode_fields(&binds);
        let value = construct(&path, &variant.fields);

        encode_arms.push(quote! {
            #pat => {
                ::bprimitives::types::encoding::Encode::encode(&#tag, out);
                #writes
            }
        });
        decode_arms.push(quote! {
            #tag => Ok(#value),
        });
    }

    let encode = quote! {
        match self {
            #(#encode_arms)*
        }
    };
    let decode = quote! {
        let tag: u8 = ::bprimitives::types::encoding::Decode::decode(input)?;
        match tag {
            #(#decode_arms)*
            other => Err(::bprimitives::types::buffer::BufferError::InvalidValue(other)),
        }
    };

    Ok((encode, decode))
}

/// Resolves each variant's wire tag. Explicit `= N` discriminants are honoured
/// and implicit ones continue from the previous variant, as rustc does.
fn variant_tags(data: &DataEnum) -> syn::Result<Vec<u8>> {
    let mut tags = Vec::with_capacity(data.variants.len());
    let mut next: Option<u8> = Some(0);

    for variant in &data.variants {
        let tag = match &variant.discriminant {
            Some((_, expr)) => literal_tag(expr)?,
            None => next.ok_or_else(|| {
                syn::Error::new_spanned(variant, "WireCodec enum tags must fit in a u8")
            })?,
        };
        tags.push(tag);
        next = tag.checked_add(1);
    }

    Ok(tags)
}

fn literal_tag(expr: &syn::Expr) -> syn::Result<u8> {
    if let syn::Expr::Lit(lit) = expr
        && let syn::Lit::Int(int) = &lit.lit
    {
        return int.base10_parse::<u8>();
    }
    Err(syn::Error::new_spanned(
        expr,
        "WireCodec enum discriminants must be u8 integer literals",
    ))
}
