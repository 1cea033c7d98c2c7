//! Type mapping utilities for the C backend.
//!
//! # Type Mapping
//!
//! | Schema type | C type            |
//! |-------------|-------------------|
//! | u8..u64     | uint8_t..uint64_t |
//! | i8..i64     | int8_t..int64_t   |
//! | f32 / f64   | float / double    |
//! | bool        | bool              |
//! | string      | char *            |
//! | `[N]T`      | `T name[N]`       |
//! | `[]T`       | `packc_slice_T`   |

use crate::error::CodegenError;
use packc_schema::{ArrayKind, DefaultValue, Primitive, ResolvedType, SchemaIr, TypeKind};

const C_KEYWORDS: &[&str] = &[
    "auto", "bool", "break", "case", "char", "const", "continue", "default", "do", "double",
    "else", "enum", "extern", "false", "float", "for", "goto", "if", "inline", "int", "long",
    "register", "restrict", "return", "short", "signed", "sizeof", "static", "struct", "switch",
    "true", "typedef", "union", "unsigned", "void", "volatile", "while", "_Bool", "_Complex",
    "_Imaginary",
];

/// Prefix of generated dynamic array structs.
pub const SLICE_PREFIX: &str = "packc_slice_";

/// Converts a schema identifier to a valid C identifier.
///
/// Schema identifiers are already C-shaped; only reserved words change.
///
/// ```ignore
/// assert_eq!(c_identifier("default"), "default_");
/// assert_eq!(c_identifier("speed"), "speed");
/// ```
pub(crate) fn c_identifier(name: &str) -> String {
    if C_KEYWORDS.contains(&name) {
        format!("{name}_")
    } else {
        name.to_string()
    }
}

/// Maps a primitive to its C representation.
pub(crate) const fn c_primitive(primitive: Primitive) -> &'static str {
    match primitive {
        Primitive::U8 => "uint8_t",
        Primitive::U16 => "uint16_t",
        Primitive::U32 => "uint32_t",
        Primitive::U64 => "uint64_t",
        Primitive::I8 => "int8_t",
        Primitive::I16 => "int16_t",
        Primitive::I32 => "int32_t",
        Primitive::I64 => "int64_t",
        Primitive::F32 => "float",
        Primitive::F64 => "double",
        Primitive::Bool => "bool",
        Primitive::String => "char *",
    }
}

/// Maps an element type to its C type name.
pub(crate) fn c_type(kind: &TypeKind) -> String {
    match kind {
        TypeKind::Primitive(p) => c_primitive(*p).to_string(),
        TypeKind::Enum(name) | TypeKind::Alias(name) | TypeKind::Struct(name) => {
            c_identifier(name)
        }
    }
}

/// Name of the slice struct holding a dynamic array of `kind`.
pub(crate) fn slice_name(kind: &TypeKind) -> String {
    format!("{SLICE_PREFIX}{}", kind.name())
}

/// Joins a base type and a declarator, keeping pointer stars attached.
pub(crate) fn declare(base: &str, declarator: &str) -> String {
    if base.ends_with('*') {
        format!("{base}{declarator}")
    } else {
        format!("{base} {declarator}")
    }
}

/// Declares `name` with type `ty`, without bit-field or terminator.
pub(crate) fn declaration(ty: &ResolvedType, name: &str) -> String {
    match ty.array {
        ArrayKind::Scalar => declare(&c_type(&ty.kind), name),
        ArrayKind::Fixed(len) => declare(&c_type(&ty.kind), &format!("{name}[{len}]")),
        ArrayKind::Dynamic => declare(&slice_name(&ty.kind), name),
    }
}

/// Renders a scalar default value as a C expression.
///
/// # Errors
/// Returns `CodegenError::Generation` if the value does not fit the type or
/// is a packet literal.
pub(crate) fn c_literal(
    ir: &SchemaIr,
    kind: &TypeKind,
    value: &DefaultValue,
) -> Result<String, CodegenError> {
    let (resolved, _) = ir.resolve_kind(kind);
    match (resolved, value) {
        (TypeKind::Primitive(p), DefaultValue::Integer(v)) if p.is_integer() => {
            Ok(integer_literal(*p, *v))
        }
        (TypeKind::Primitive(p), DefaultValue::Float(v)) if p.is_float() => {
            if !v.is_finite() {
                return Err(CodegenError::generation(format!(
                    "default value {v} is not finite"
                )));
            }
            let suffix = if *p == Primitive::F32 { "f" } else { "" };
            Ok(format!("{v:?}{suffix}"))
        }
        (TypeKind::Primitive(Primitive::Bool), DefaultValue::Bool(b)) => Ok(b.to_string()),
        (TypeKind::Primitive(Primitive::String), DefaultValue::Str(s)) => Ok(format!("\"{s}\"")),
        (TypeKind::Enum(name), DefaultValue::EnumMember(member)) => {
            Ok(format!("{}_{member}", c_identifier(name)))
        }
        _ => Err(CodegenError::generation(format!(
            "default value {value:?} does not match type '{}'",
            kind.name()
        ))),
    }
}

fn integer_literal(primitive: Primitive, value: i128) -> String {
    match primitive {
        Primitive::U64 => format!("UINT64_C({value})"),
        Primitive::I64 if value == i128::from(i64::MIN) => "INT64_MIN".to_string(),
        Primitive::I64 => format!("INT64_C({value})"),
        Primitive::U32 => format!("{value}u"),
        _ => value.to_string(),
    }
}
