//! # packc
//!
//! Packet schema compiler.
//!
//! Reads `.pkt` schemas describing packets, enums and type aliases, resolves
//! their imports and emits plain data types for C or Rust.
//!
//! ## Features
//!
//! - **Imports** - Schemas split across files, diamonds merged once
//! - **Inheritance** - Single-parent packets flattened into one struct
//! - **Generics** - Generic packets instantiated per argument list
//! - **Defaults** - Field defaults emitted as `_init` functions or `Default` impls
//!
//! ## Quick Start
//!
//! ```ignore
//! use packc::prelude::*;
//!
//! let config = GeneratorConfig::new().target(Target::Rust);
//! let units = generate_from_str("packet Ping { seq: u32 = 1 }", &config)?;
//! println!("{}", units.declarations.contents);
//! ```
//!
//! ## Crate Organization
//!
//! - [`schema`] - Lexing, parsing, imports, validation and IR
//! - [`codegen`] - C and Rust backends
//! - [`tree`] - Declaration tree printing

pub mod prelude;
pub mod tree;

/// Lexing, parsing, import resolution and validation.
pub mod schema {
    pub use packc_schema::*;
}

/// Code generation backends.
pub mod codegen {
    pub use packc_codegen::*;
}

pub use packc_codegen::{
    CodegenError, GeneratedFile, GeneratedUnits, Generator, GeneratorConfig, Target,
    compile_to_dir, generate_from_file, generate_from_str,
};
pub use packc_schema::{Compilation, Program, SchemaError, SchemaIr, compile_file};
