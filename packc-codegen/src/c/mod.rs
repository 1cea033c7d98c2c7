//! C code generation.
//!
//! Produces a header with every type declaration and a source file with one
//! `Name_init` function per struct that zeroes the value and applies the
//! schema defaults.

pub mod header;
pub mod source;
pub mod types;

pub use header::HeaderGenerator;
pub use source::SourceGenerator;

use crate::config::GeneratorConfig;
use crate::error::CodegenError;
use crate::generator::{GeneratedFile, GeneratedUnits};
use packc_schema::SchemaIr;

/// C backend.
pub struct CGenerator<'a> {
    ir: &'a SchemaIr,
    config: &'a GeneratorConfig,
}

impl<'a> CGenerator<'a> {
    /// Creates a new C generator.
    #[must_use]
    pub fn new(ir: &'a SchemaIr, config: &'a GeneratorConfig) -> Self {
        Self { ir, config }
    }

    /// Generates `<unit>.h` and `<unit>.c`.
    ///
    /// # Errors
    /// Returns `CodegenError` if a default value cannot be rendered.
    pub fn generate(&self) -> Result<GeneratedUnits, CodegenError> {
        let header = HeaderGenerator::new(self.ir, self.config).generate();
        let source = SourceGenerator::new(self.ir, self.config).generate()?;
        let unit = &self.config.unit_name;
        Ok(GeneratedUnits {
            declarations: GeneratedFile::new(format!("{unit}.h"), header),
            definitions: GeneratedFile::new(format!("{unit}.c"), source),
        })
    }
}
