//! # packc Schema
//!
//! Front end of the packet schema compiler.
//!
//! This crate provides:
//! - Lexing of `.pkt` schema sources
//! - Recursive-descent parsing with semantic checks
//! - Import resolution across files
//! - Whole-program validation (inheritance cycles, duplicates)
//! - Intermediate representation for code generation

pub mod error;
pub mod imports;
pub mod ir;
pub mod lexer;
pub mod parser;
pub mod symbols;
pub mod types;
pub mod validation;

pub use error::{LexicalError, Result, SchemaError};
pub use imports::{Compilation, Compiler, FsLoader, MemoryLoader, SourceLoader};
pub use ir::{
    EnumValue, GenericInstance, IrItem, ResolvedAlias, ResolvedEnum, ResolvedField,
    ResolvedStruct, ResolvedType, SchemaIr, TypeKind,
};
pub use lexer::{Token, TokenKind, tokenize};
pub use parser::{ImportHandler, NoImports, Parser, ResolvedImport, parse, parse_source};
pub use symbols::SymbolTable;
pub use types::{
    ArrayKind, DataType, Declaration, DefaultValue, EnumDef, Field, Import, Packet, Position,
    Primitive, Program, TypeAlias,
};
pub use validation::validate_program;

/// Compiles a schema file from disk together with everything it imports.
///
/// # Errors
/// Returns the first error raised by any file in the import graph.
pub fn compile_file(path: impl AsRef<std::path::Path>) -> Result<Compilation> {
    Compiler::new(FsLoader).compile(path)
}
