//! Error types for lexing, parsing and validating packet schemas.

use std::path::PathBuf;
use thiserror::Error;

/// Error raised by the lexer on malformed input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at line {line}, column {column}")]
pub struct LexicalError {
    /// Description of the problem.
    pub message: String,
    /// Line where lexing failed (1-based).
    pub line: usize,
    /// Column where lexing failed (1-based).
    pub column: usize,
}

impl LexicalError {
    /// Creates a lexical error at the given position.
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

/// Error type for schema compilation.
///
/// Every variant is fatal: compilation stops at the first error and errors
/// raised while compiling an imported file reach the caller unchanged.
#[derive(Debug, Clone, Error)]
pub enum SchemaError {
    /// Malformed token.
    #[error("lexical error: {0}")]
    Lexical(#[from] LexicalError),

    /// Grammar violation or failed semantic check.
    #[error("parse error: {message} at line {line}, column {column}")]
    Parse {
        /// Error message.
        message: String,
        /// Line of the offending token.
        line: usize,
        /// Column of the offending token.
        column: usize,
    },

    /// Inheritance cycle detected after parsing.
    #[error("cyclic inheritance detected: {path}")]
    CyclicInheritance {
        /// Packet chain forming the cycle.
        path: String,
    },

    /// Import path could not be resolved or read.
    #[error("cannot resolve import '{}': {reason}", path.display())]
    FileResolution {
        /// Path that failed.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// Two different declarations share one name.
    #[error("duplicate {kind} definition: '{name}'")]
    DuplicateDefinition {
        /// Kind of definition (packet, enum, alias).
        kind: String,
        /// Name of the duplicate.
        name: String,
    },

    /// Generated name clashes with a declared type.
    #[error("generated name '{name}' collides with an existing type")]
    NameCollision {
        /// The clashing name.
        name: String,
    },
}

impl SchemaError {
    /// Creates a parse error at the given position.
    pub fn parse(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::Parse {
            message: message.into(),
            line,
            column,
        }
    }

    /// Creates a duplicate definition error.
    pub fn duplicate(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::DuplicateDefinition {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Creates a file resolution error.
    pub fn file_resolution(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::FileResolution {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns true if this is a parse error.
    #[must_use]
    pub const fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

/// Result type alias for schema operations.
pub type Result<T> = std::result::Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexical_error_display() {
        let err = LexicalError::new("Unterminated string", 3, 7);
        assert_eq!(err.to_string(), "Unterminated string at line 3, column 7");
    }

    #[test]
    fn test_parse_error_display() {
        let err = SchemaError::parse("Undefined type 'Foo'", 2, 10);
        assert!(err.is_parse());
        assert_eq!(
            err.to_string(),
            "parse error: Undefined type 'Foo' at line 2, column 10"
        );
    }

    #[test]
    fn test_lexical_error_converts() {
        let err: SchemaError = LexicalError::new("Unexpected character: @", 1, 1).into();
        assert!(matches!(err, SchemaError::Lexical(_)));
    }

    #[test]
    fn test_file_resolution_display() {
        let err = SchemaError::file_resolution("missing.pkt", "not found");
        assert_eq!(
            err.to_string(),
            "cannot resolve import 'missing.pkt': not found"
        );
    }
}
