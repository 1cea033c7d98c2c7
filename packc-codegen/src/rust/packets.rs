//! Struct and alias code generation.

use super::types::{rust_ident, rust_type};
use packc_schema::{ResolvedAlias, ResolvedStruct};
use proc_macro2::TokenStream;
use quote::quote;

/// Generator for struct definitions.
pub struct PacketGenerator<'a> {
    packet: &'a ResolvedStruct,
}

impl<'a> PacketGenerator<'a> {
    /// Creates a new packet generator.
    #[must_use]
    pub fn new(packet: &'a ResolvedStruct) -> Self {
        Self { packet }
    }

    /// Generates the struct declaration.
    #[must_use]
    pub fn generate(&self) -> TokenStream {
        let packet = self.packet;
        let name = rust_ident(&packet.name);

        let doc = match (&packet.instance_of, &packet.parent) {
            (Some(instance), _) => {
                let text = format!(" {}<{}>", instance.base, instance.args.join(", "));
                quote!(#[doc = #text])
            }
            (None, Some(parent)) => {
                let text = format!(" Extends `{parent}`.");
                quote!(#[doc = #text])
            }
            (None, None) => TokenStream::new(),
        };

        let fields = packet.fields.iter().map(|field| {
            let ident = rust_ident(&field.name);
            let ty = rust_type(&field.ty);
            let bits = field.bit_size.map(|bits| {
                let text = format!(" bits: {bits}");
                quote!(#[doc = #text])
            });
            quote! {
                #bits
                pub #ident: #ty
            }
        });

        quote! {
            #doc
            #[allow(non_camel_case_types, non_snake_case)]
            #[derive(Debug, Clone, PartialEq)]
            pub struct #name {
                #( #fields, )*
            }
        }
    }
}

/// Generates a type alias.
#[must_use]
pub fn generate_alias(alias: &ResolvedAlias) -> TokenStream {
    let name = rust_ident(&alias.name);
    let target = rust_type(&alias.target);
    quote! {
        #[allow(non_camel_case_types)]
        pub type #name = #target;
    }
}
