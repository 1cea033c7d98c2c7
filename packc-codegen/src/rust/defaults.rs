//! `Default` implementations carrying schema default values.

use super::types::rust_ident;
use crate::error::CodegenError;
use packc_schema::{
    ArrayKind, DefaultValue, Primitive, ResolvedStruct, ResolvedType, SchemaIr, TypeKind,
};
use proc_macro2::{Literal, TokenStream};
use quote::quote;

/// Generator for `impl Default` blocks.
pub struct DefaultsGenerator<'a> {
    ir: &'a SchemaIr,
}

impl<'a> DefaultsGenerator<'a> {
    /// Creates a new defaults generator.
    #[must_use]
    pub fn new(ir: &'a SchemaIr) -> Self {
        Self { ir }
    }

    /// Generates `impl Default` for a struct.
    ///
    /// # Errors
    /// Returns `CodegenError` if a default value cannot be rendered.
    pub fn generate(&self, packet: &ResolvedStruct) -> Result<TokenStream, CodegenError> {
        let name = rust_ident(&packet.name);
        let mut fields = Vec::with_capacity(packet.fields.len());
        for field in &packet.fields {
            let ident = rust_ident(&field.name);
            let value = match &field.default {
                Some(default) => self.value(&field.ty.kind, default, &field.name)?,
                None => self.zero(&field.ty),
            };
            fields.push(quote!(#ident: #value));
        }

        Ok(quote! {
            impl Default for #name {
                fn default() -> Self {
                    Self {
                        #( #fields, )*
                    }
                }
            }
        })
    }

    /// Value of a field without a schema default.
    fn zero(&self, ty: &ResolvedType) -> TokenStream {
        if matches!(self.ir.storage_type(ty).array, ArrayKind::Fixed(_)) {
            quote!(core::array::from_fn(|_| Default::default()))
        } else {
            quote!(Default::default())
        }
    }

    /// Renders a default value as an expression of type `kind`.
    fn value(
        &self,
        kind: &TypeKind,
        value: &DefaultValue,
        field: &str,
    ) -> Result<TokenStream, CodegenError> {
        let (resolved, _) = self.ir.resolve_kind(kind);
        match (resolved, value) {
            (TypeKind::Primitive(p), DefaultValue::Integer(v)) if p.is_integer() => {
                let magnitude = Literal::u128_unsuffixed(v.unsigned_abs());
                if *v < 0 {
                    Ok(quote!(-#magnitude))
                } else {
                    Ok(quote!(#magnitude))
                }
            }
            (TypeKind::Primitive(p), DefaultValue::Float(v)) if p.is_float() => {
                if !v.is_finite() {
                    return Err(CodegenError::generation(format!(
                        "default value {v} of field '{field}' is not finite"
                    )));
                }
                let literal = Literal::f64_unsuffixed(*v);
                Ok(quote!(#literal))
            }
            (TypeKind::Primitive(Primitive::Bool), DefaultValue::Bool(b)) => Ok(quote!(#b)),
            (TypeKind::Primitive(Primitive::String), DefaultValue::Str(s)) => {
                let literal: TokenStream = format!("\"{s}\"").parse().map_err(|_| {
                    CodegenError::generation(format!(
                        "default value of field '{field}' is not a valid string literal"
                    ))
                })?;
                Ok(quote!(String::from(#literal)))
            }
            (TypeKind::Enum(name), DefaultValue::EnumMember(member)) => {
                let name = rust_ident(name);
                let member = rust_ident(member);
                Ok(quote!(#name::#member))
            }
            (TypeKind::Struct(name), DefaultValue::Packet(members)) => {
                self.packet_literal(name, members)
            }
            _ => Err(CodegenError::generation(format!(
                "default value of field '{field}' does not match type '{}'",
                kind.name()
            ))),
        }
    }

    /// Builds a nested value by overriding fields of the type's default.
    fn packet_literal(
        &self,
        name: &str,
        members: &[(String, DefaultValue)],
    ) -> Result<TokenStream, CodegenError> {
        let packet = self
            .ir
            .get_struct(name)
            .ok_or_else(|| CodegenError::unknown_type(name, "<literal>"))?;
        let ty = rust_ident(name);
        if members.is_empty() {
            return Ok(quote!(#ty::default()));
        }

        let mut assignments = Vec::with_capacity(members.len());
        for (member, value) in members {
            let field = packet
                .fields
                .iter()
                .find(|f| f.name == *member)
                .ok_or_else(|| CodegenError::unknown_type(name, member.as_str()))?;
            let ident = rust_ident(member);
            let expr = self.value(&field.ty.kind, value, member)?;
            assignments.push(quote!(value.#ident = #expr;));
        }
        Ok(quote!({
            let mut value = #ty::default();
            #( #assignments )*
            value
        }))
    }
}
