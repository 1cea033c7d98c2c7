//! Enum code generation.

use super::types::{primitive_type, rust_ident};
use crate::error::CodegenError;
use packc_schema::ResolvedEnum;
use proc_macro2::{Literal, TokenStream};
use quote::quote;

/// Generator for enum definitions.
pub struct EnumGenerator<'a> {
    enum_def: &'a ResolvedEnum,
}

impl<'a> EnumGenerator<'a> {
    /// Creates a new enum generator.
    #[must_use]
    pub fn new(enum_def: &'a ResolvedEnum) -> Self {
        Self { enum_def }
    }

    /// Generates the enum with its integer conversions.
    ///
    /// # Errors
    /// Returns `CodegenError::Generation` if a discriminant does not fit the
    /// encoding type.
    pub fn generate(&self) -> Result<TokenStream, CodegenError> {
        let enum_def = self.enum_def;
        let max = enum_def
            .encoding
            .integer_range()
            .map_or(0, |(_, max)| max);
        if let Some(last) = enum_def.values.last() {
            if i128::from(last.value) > max {
                return Err(CodegenError::generation(format!(
                    "enum '{}' has more values than {} can hold",
                    enum_def.name, enum_def.encoding
                )));
            }
        }

        let name = rust_ident(&enum_def.name);
        let repr = primitive_type(enum_def.encoding);
        let variants: Vec<_> = enum_def.values.iter().map(|v| rust_ident(&v.name)).collect();
        let discriminants: Vec<_> = enum_def
            .values
            .iter()
            .map(|v| Literal::u64_unsuffixed(v.value))
            .collect();

        Ok(quote! {
            #[allow(non_camel_case_types)]
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            #[repr(#repr)]
            pub enum #name {
                #( #variants = #discriminants, )*
            }

            impl From<#name> for #repr {
                fn from(value: #name) -> Self {
                    value as Self
                }
            }

            impl TryFrom<#repr> for #name {
                type Error = #repr;

                fn try_from(value: #repr) -> Result<Self, Self::Error> {
                    match value {
                        #( #discriminants => Ok(Self::#variants), )*
                        other => Err(other),
                    }
                }
            }
        })
    }

    /// Generates `impl Default`, selecting the first value.
    #[must_use]
    pub fn generate_default(&self) -> TokenStream {
        let name = rust_ident(&self.enum_def.name);
        let Some(first) = self.enum_def.values.first() else {
            return TokenStream::new();
        };
        let first = rust_ident(&first.name);
        quote! {
            impl Default for #name {
                fn default() -> Self {
                    Self::#first
                }
            }
        }
    }
}
