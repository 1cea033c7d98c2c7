//! Backend dispatch and output writing.

use crate::c::CGenerator;
use crate::config::{GeneratorConfig, Target};
use crate::error::CodegenError;
use crate::rust::RustGenerator;
use packc_schema::SchemaIr;
use std::path::{Path, PathBuf};

/// One generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// File name relative to the output directory.
    pub file_name: String,
    /// File contents.
    pub contents: String,
}

impl GeneratedFile {
    /// Creates a generated file.
    pub fn new(file_name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            contents: contents.into(),
        }
    }
}

/// The two units produced for every schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedUnits {
    /// Type declarations (C header, Rust types).
    pub declarations: GeneratedFile,
    /// Definitions (C init functions, Rust `Default` impls).
    pub definitions: GeneratedFile,
}

impl GeneratedUnits {
    /// Returns both files, declarations first.
    #[must_use]
    pub fn files(&self) -> [&GeneratedFile; 2] {
        [&self.declarations, &self.definitions]
    }

    /// Writes both files into `dir`, creating it if needed.
    ///
    /// # Errors
    /// Returns `CodegenError::Io` if the directory or a file cannot be
    /// written.
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>, CodegenError> {
        std::fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(2);
        for file in self.files() {
            let path = dir.join(&file.file_name);
            std::fs::write(&path, &file.contents)?;
            tracing::info!(path = %path.display(), bytes = file.contents.len(), "wrote unit");
            written.push(path);
        }
        Ok(written)
    }
}

/// Code generator over an intermediate representation.
pub struct Generator<'a> {
    ir: &'a SchemaIr,
    config: GeneratorConfig,
}

impl<'a> Generator<'a> {
    /// Creates a generator with the default configuration (C target).
    #[must_use]
    pub fn new(ir: &'a SchemaIr) -> Self {
        Self::with_config(ir, GeneratorConfig::default())
    }

    /// Creates a generator with an explicit configuration.
    #[must_use]
    pub fn with_config(ir: &'a SchemaIr, config: GeneratorConfig) -> Self {
        Self { ir, config }
    }

    /// Generates the declarations and definitions units.
    ///
    /// # Errors
    /// Returns `CodegenError` if the configuration is invalid or a value
    /// cannot be rendered for the target.
    pub fn generate(&self) -> Result<GeneratedUnits, CodegenError> {
        self.config.validate()?;
        tracing::debug!(
            target_lang = %self.config.target,
            unit = %self.config.unit_name,
            items = self.ir.items.len(),
            "generating code"
        );
        match self.config.target {
            Target::C => CGenerator::new(self.ir, &self.config).generate(),
            Target::Rust => RustGenerator::new(self.ir, &self.config).generate(),
        }
    }
}
