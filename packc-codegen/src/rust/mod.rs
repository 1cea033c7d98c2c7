//! Rust code generation modules.
//!
//! The declarations unit holds enums, aliases and structs; the definitions
//! unit holds their `Default` implementations. Both are meant to be pulled
//! into the same module, e.g. with `include!`.

pub mod defaults;
pub mod enums;
pub mod packets;
pub mod types;

pub use defaults::DefaultsGenerator;
pub use enums::EnumGenerator;
pub use packets::PacketGenerator;

use crate::config::GeneratorConfig;
use crate::error::CodegenError;
use crate::generator::{GeneratedFile, GeneratedUnits};
use packc_schema::{IrItem, SchemaIr};
use proc_macro2::TokenStream;

/// Rust backend.
pub struct RustGenerator<'a> {
    ir: &'a SchemaIr,
    config: &'a GeneratorConfig,
}

impl<'a> RustGenerator<'a> {
    /// Creates a new Rust generator.
    #[must_use]
    pub fn new(ir: &'a SchemaIr, config: &'a GeneratorConfig) -> Self {
        Self { ir, config }
    }

    /// Generates `<unit>.rs` and `<unit>_defaults.rs`.
    ///
    /// # Errors
    /// Returns `CodegenError` if an enum or default value cannot be rendered.
    pub fn generate(&self) -> Result<GeneratedUnits, CodegenError> {
        let mut declarations = Vec::new();
        let mut definitions = Vec::new();
        let defaults = DefaultsGenerator::new(self.ir);

        for item in &self.ir.items {
            match item {
                IrItem::Enum(e) => {
                    let generator = EnumGenerator::new(e);
                    declarations.push(generator.generate()?);
                    definitions.push(generator.generate_default());
                }
                IrItem::Alias(a) => declarations.push(packets::generate_alias(a)),
                IrItem::Struct(s) => {
                    declarations.push(PacketGenerator::new(s).generate());
                    definitions.push(defaults.generate(s)?);
                }
            }
        }

        let unit = &self.config.unit_name;
        Ok(GeneratedUnits {
            declarations: GeneratedFile::new(
                format!("{unit}.rs"),
                self.render(&declarations),
            ),
            definitions: GeneratedFile::new(
                format!("{unit}_defaults.rs"),
                self.render(&definitions),
            ),
        })
    }

    fn render(&self, items: &[TokenStream]) -> String {
        let mut output = String::new();
        if self.config.banner {
            output.push_str("// Generated by packc. Do not edit.\n\n");
        }
        for item in items {
            output.push_str(&item.to_string());
            output.push_str("\n\n");
        }
        output
    }
}
