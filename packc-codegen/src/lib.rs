//! # packc Codegen
//!
//! Code generation from packet schemas.
//!
//! This crate provides:
//! - C header and source generation (types plus `_init` functions)
//! - Rust type generation with `Default` implementations
//! - Writing generated units to an output directory

pub mod c;
pub mod config;
pub mod error;
pub mod generator;
pub mod rust;

pub use config::{GeneratorConfig, Target};
pub use error::CodegenError;
pub use generator::{GeneratedFile, GeneratedUnits, Generator};

use packc_schema::SchemaIr;
use std::path::{Path, PathBuf};

/// Generates code from a single self-contained schema source.
///
/// # Arguments
/// * `source` - Schema text; imports are not allowed
/// * `config` - Generator options
///
/// # Returns
/// The declarations and definitions units.
///
/// # Errors
/// Returns `CodegenError` if parsing, validation or generation fails.
pub fn generate_from_str(
    source: &str,
    config: &GeneratorConfig,
) -> Result<GeneratedUnits, CodegenError> {
    let program = packc_schema::parse_source(source)?;
    let ir = SchemaIr::from_program(&program)?;
    Generator::with_config(&ir, config.clone()).generate()
}

/// Generates code from a schema file, resolving its imports.
///
/// # Arguments
/// * `path` - Path to the root schema file
/// * `config` - Generator options
///
/// # Returns
/// The declarations and definitions units.
///
/// # Errors
/// Returns `CodegenError` if reading, parsing, or generation fails.
pub fn generate_from_file(
    path: &Path,
    config: &GeneratorConfig,
) -> Result<GeneratedUnits, CodegenError> {
    let compilation = packc_schema::compile_file(path)?;
    let ir = SchemaIr::from_program(&compilation.program)?;
    Generator::with_config(&ir, config.clone()).generate()
}

/// Compiles `input` and writes both units into `output_dir`.
///
/// # Errors
/// Returns `CodegenError` if compilation, generation or writing fails.
pub fn compile_to_dir(
    input: &Path,
    output_dir: &Path,
    config: &GeneratorConfig,
) -> Result<Vec<PathBuf>, CodegenError> {
    generate_from_file(input, config)?.write_to(output_dir)
}
