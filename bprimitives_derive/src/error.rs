//! Derive macro for error types.
//!
//! Generates `std::fmt::Display` and `std::error::Error` from an
//! `#[error("...")]` message on each enum variant (or on the struct itself).
//!
//! ```ignore
//! use bprimitives::Error;
//!
//! #[derive(Debug, Error)]
//! pub enum BufferError {
//!     #[error("buffer overflow: need {needed} bytes, {remaining} remaining")]
//!     Overflow { needed: usize, remaining: usize },
//!
//!     #[error("invalid tag {0}")]
//!     InvalidValue(u8),
//! }
//! ```
//!
//! Positional fields are referenced as `{0}`, `{1}`; named fields by name.
//! Format specs such as `{0:08x}` are allowed. Fields the message does not
//! mention are ignored.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{ToTokens, format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Fields, Ident, Lit, Meta, parse_macro_input};

pub fn derive_error(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let body = match &input.data {
        Data::Enum(data) => {
            let arms = data
                .variants
                .iter()
                .map(|variant| {
                    let message = message(&variant.attrs, &variant.ident)?;
                    let ident = &variant.ident;
                    Ok(display_arm(quote! { Self::#ident }, &variant.fields, &message))
                })
                .collect::<syn::Result<Vec<_>>>()?;
            quote! {
                match self {
                    #(#arms)*
                }
            }
        }
        Data::Struct(data) => {
            let message = message(&input.attrs, &input.ident)?;
            let arm = display_arm(quote! { Self }, &data.fields, &message);
            quote! {
                match self {
                    #arm
                }
            }
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "Error derive does not support unions",
            ));
        }
    };

    Ok(quote! {
        impl #impl_generics ::std::fmt::Display for #name #ty_generics #where_clause {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                #body
            }
        }

        impl #impl_generics ::std::error::Error for #name #ty_generics #where_clause {}
    })
}

/// Builds one `pattern => write!(...)` arm. Only fields referenced by the
/// message are bound, since `write!` rejects unused named arguments.
fn display_arm(path: TokenStream2, fields: &Fields, message: &str) -> TokenStream2 {
    match fields {
        Fields::Unit => quote! {
            #path => f.write_str(#message),
        },
        Fields::Named(named) => {
            let used: Vec<&Ident> = named
                .named
                .iter()
                .filter_map(|field| field.ident.as_ref())
                .filter(|ident| mentions(message, &ident.to_string()))
                .collect();
            quote! {
                #path { #(#used,)* .. } => write!(f, #message, #(#used = #used),*),
            }
        }
        Fields::Unnamed(unnamed) => {
            let mut format = message.to_string();
            let mut binds = Vec::with_capacity(unnamed.unnamed.len());
            let mut used = Vec::new();
            for i in 0..unnamed.unnamed.len() {
                let positional = i.to_string();
                if mentions(message, &positional) {
                    let ident = format_ident!("f{}", i);
                    format = rename_placeholder(&format, &positional, &ident.to_string());
                    binds.push(ident.to_token_stream());
                    used.push(ident);
                } else {
                    binds.push(quote! { _ });
                }
            }
            quote! {
                #path ( #(#binds),* ) => write!(f, #format, #(#used = #used),*),
            }
        }
    }
}

/// Whether `message` contains a `{name}` or `{name:...}` placeholder.
fn mentions(message: &str, name: &str) -> bool {
    message.contains(&format!("{{{}}}", name)) || message.contains(&format!("{{{}:", name))
}

fn rename_placeholder(message: &str, from: &str, to: &str) -> String {
    message
        .replace(&format!("{{{}}}", from), &format!("{{{}}}", to))
        .replace(&format!("{{{}:", from), &format!("{{{}:", to))
}

/// Reads the string literal out of `#[error("...")]`.
fn message<T: ToTokens>(attrs: &[Attribute], target: &T) -> syn::Result<String> {
    let Some(attr) = attrs.iter().find(|attr| attr.path().is_ident("error")) else {
        return Err(syn::Error::new_spanned(
            target,
            "missing #[error(\"...\")] attribute; every error must declare a display message",
        ));
    };

    let Meta::List(list) = &attr.meta else {
        return Err(syn::Error::new_spanned(
            &attr.meta,
            "expected #[error(\"message\")]",
        ));
    };

    match syn::parse2::<Lit>(list.tokens.clone()) {
        Ok(Lit::Str(lit)) => Ok(lit.value()),
        _ => Err(syn::Error::new_spanned(
            &attr.meta,
            "#[error] message must be a string literal, e.g. #[error(\"overflow: {0}\")]",
        )),
    }
}
