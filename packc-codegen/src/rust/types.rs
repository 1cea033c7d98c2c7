//! Type mapping for the Rust backend.

use packc_schema::{ArrayKind, Primitive, ResolvedType, TypeKind};
use proc_macro2::{Ident, Literal, Span, TokenStream};
use quote::{format_ident, quote};

/// Keywords usable as raw identifiers.
const RAW_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

/// Keywords that cannot be raw identifiers.
const RESERVED: &[&str] = &["_", "crate", "self", "Self", "super"];

/// Converts a schema identifier to a Rust identifier.
///
/// Keywords become raw identifiers (`r#type`); the few that cannot be raw
/// get a trailing underscore.
#[must_use]
pub fn rust_ident(name: &str) -> Ident {
    if RESERVED.contains(&name) {
        format_ident!("{}_", name)
    } else if RAW_KEYWORDS.contains(&name) {
        Ident::new_raw(name, Span::call_site())
    } else {
        format_ident!("{}", name)
    }
}

/// Maps a primitive to its Rust type.
#[must_use]
pub fn primitive_type(primitive: Primitive) -> TokenStream {
    match primitive {
        Primitive::U8 => quote!(u8),
        Primitive::U16 => quote!(u16),
        Primitive::U32 => quote!(u32),
        Primitive::U64 => quote!(u64),
        Primitive::I8 => quote!(i8),
        Primitive::I16 => quote!(i16),
        Primitive::I32 => quote!(i32),
        Primitive::I64 => quote!(i64),
        Primitive::F32 => quote!(f32),
        Primitive::F64 => quote!(f64),
        Primitive::Bool => quote!(bool),
        Primitive::String => quote!(String),
    }
}

/// Maps an element type to its Rust type.
#[must_use]
pub fn element_type(kind: &TypeKind) -> TokenStream {
    match kind {
        TypeKind::Primitive(p) => primitive_type(*p),
        TypeKind::Enum(name) | TypeKind::Alias(name) | TypeKind::Struct(name) => {
            let ident = rust_ident(name);
            quote!(#ident)
        }
    }
}

/// Maps a resolved type to its Rust type: `[T; N]`, `Vec<T>` or `T`.
#[must_use]
pub fn rust_type(ty: &ResolvedType) -> TokenStream {
    let element = element_type(&ty.kind);
    match ty.array {
        ArrayKind::Scalar => element,
        ArrayKind::Fixed(len) => {
            let len = Literal::u64_unsuffixed(len);
            quote!([#element; #len])
        }
        ArrayKind::Dynamic => quote!(Vec<#element>),
    }
}
