//! Prelude module for convenient imports.
//!
//! ```ignore
//! use packc::prelude::*;
//! ```

// Front end
pub use packc_schema::{
    Compilation, Compiler, Declaration, FsLoader, MemoryLoader, Program, SchemaError, SchemaIr,
    SourceLoader, compile_file, parse_source,
};

// Backends
pub use packc_codegen::{
    CodegenError, GeneratedUnits, Generator, GeneratorConfig, Target, compile_to_dir,
    generate_from_file, generate_from_str,
};

pub use crate::tree::render_tree;
