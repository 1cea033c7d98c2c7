//! Declaration tree produced by the parser.
//!
//! All nodes are plain owned data. A [`Program`] keeps its declarations in
//! source order; imported declarations stay nested under their [`Import`]
//! record at the point of the directive.

use std::fmt;

/// Built-in primitive types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// Unsigned 8-bit integer.
    U8,
    /// Unsigned 16-bit integer.
    U16,
    /// Unsigned 32-bit integer.
    U32,
    /// Unsigned 64-bit integer.
    U64,
    /// Signed 8-bit integer.
    I8,
    /// Signed 16-bit integer.
    I16,
    /// Signed 32-bit integer.
    I32,
    /// Signed 64-bit integer.
    I64,
    /// 32-bit floating point.
    F32,
    /// 64-bit floating point.
    F64,
    /// Boolean.
    Bool,
    /// Text.
    String,
}

impl Primitive {
    /// All primitives, in keyword order.
    pub const ALL: [Self; 12] = [
        Self::U8,
        Self::U16,
        Self::U32,
        Self::U64,
        Self::I8,
        Self::I16,
        Self::I32,
        Self::I64,
        Self::F32,
        Self::F64,
        Self::Bool,
        Self::String,
    ];

    /// Parses a primitive from its schema keyword.
    #[must_use]
    pub fn from_keyword(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.keyword() == name)
    }

    /// Returns the schema keyword.
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Bool => "bool",
            Self::String => "string",
        }
    }

    /// Returns the width in bits for numeric types.
    #[must_use]
    pub const fn bit_width(&self) -> Option<u32> {
        match self {
            Self::U8 | Self::I8 => Some(8),
            Self::U16 | Self::I16 => Some(16),
            Self::U32 | Self::I32 | Self::F32 => Some(32),
            Self::U64 | Self::I64 | Self::F64 => Some(64),
            Self::Bool | Self::String => None,
        }
    }

    /// Returns true for signed and unsigned integers.
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        self.is_signed() || self.is_unsigned()
    }

    /// Returns true for signed integers.
    #[must_use]
    pub const fn is_signed(&self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }

    /// Returns true for unsigned integers.
    #[must_use]
    pub const fn is_unsigned(&self) -> bool {
        matches!(self, Self::U8 | Self::U16 | Self::U32 | Self::U64)
    }

    /// Returns true for floating point types.
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// Returns the inclusive value range of an integer type.
    #[must_use]
    pub fn integer_range(&self) -> Option<(i128, i128)> {
        let bits = self.bit_width()?;
        if self.is_unsigned() {
            Some((0, (1i128 << bits) - 1))
        } else if self.is_signed() {
            Some((-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1))
        } else {
            None
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Array dimension of a data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ArrayKind {
    /// Not an array.
    #[default]
    Scalar,
    /// `[N]T`
    Fixed(u64),
    /// `[]T`
    Dynamic,
}

/// Reference to a type by name, with at most one array dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataType {
    /// Primitive keyword, enum, alias, packet or generic parameter name.
    pub name: String,
    /// Array dimension.
    pub array: ArrayKind,
}

impl DataType {
    /// Creates a scalar data type.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            array: ArrayKind::Scalar,
        }
    }

    /// Creates a fixed-length array type.
    pub fn fixed_array(name: impl Into<String>, len: u64) -> Self {
        Self {
            name: name.into(),
            array: ArrayKind::Fixed(len),
        }
    }

    /// Creates a dynamically-sized array type.
    pub fn dynamic_array(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            array: ArrayKind::Dynamic,
        }
    }

    /// Returns true if this type has an array dimension.
    #[must_use]
    pub const fn is_array(&self) -> bool {
        !matches!(self.array, ArrayKind::Scalar)
    }

    /// Returns the fixed length, if any.
    #[must_use]
    pub const fn array_len(&self) -> Option<u64> {
        match self.array {
            ArrayKind::Fixed(n) => Some(n),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.array {
            ArrayKind::Scalar => write!(f, "{}", self.name),
            ArrayKind::Fixed(n) => write!(f, "[{n}]{}", self.name),
            ArrayKind::Dynamic => write!(f, "[]{}", self.name),
        }
    }
}

/// Default value attached to a field, already checked against its type.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// Integer literal.
    Integer(i128),
    /// Floating point literal.
    Float(f64),
    /// `true` / `false`.
    Bool(bool),
    /// String literal content (escapes kept verbatim).
    Str(String),
    /// Enum member name.
    EnumMember(String),
    /// Packet literal, in source order.
    Packet(Vec<(String, DefaultValue)>),
}

/// Source position of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    /// Line (1-based).
    pub line: usize,
    /// Column (1-based).
    pub column: usize,
}

impl Position {
    /// Creates a position.
    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Field within a packet.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Field name.
    pub name: String,
    /// Declared type.
    pub data_type: DataType,
    /// Generic arguments when the type is a generic packet.
    pub generic_args: Vec<DataType>,
    /// Default value.
    pub default_value: Option<DefaultValue>,
    /// Packing width in bits.
    pub bit_size: Option<u32>,
    /// Position of the field name.
    pub position: Position,
}

impl Field {
    /// Creates a field with no generic arguments, default or bit size.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            generic_args: Vec::new(),
            default_value: None,
            bit_size: None,
            position: Position::default(),
        }
    }
}

/// Packet (struct) definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    /// Packet name.
    pub name: String,
    /// Own fields, in declaration order.
    pub fields: Vec<Field>,
    /// Generic parameter names; empty for concrete packets.
    pub generic_params: Vec<String>,
    /// Parent packet name.
    pub parent: Option<String>,
    /// Position of the packet name.
    pub position: Position,
}

impl Packet {
    /// Creates an empty concrete packet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            generic_params: Vec::new(),
            parent: None,
            position: Position::default(),
        }
    }

    /// Returns true if this packet is a generic template.
    #[must_use]
    pub fn is_generic(&self) -> bool {
        !self.generic_params.is_empty()
    }
}

/// Enumeration definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDef {
    /// Enum name.
    pub name: String,
    /// Underlying type name as written.
    pub underlying: String,
    /// Value names in declaration order.
    pub values: Vec<String>,
    /// Position of the enum name.
    pub position: Position,
}

impl EnumDef {
    /// Returns true if `value` is a member.
    #[must_use]
    pub fn has_value(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }
}

/// Type alias definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeAlias {
    /// Alias name.
    pub name: String,
    /// Aliased type.
    pub aliased: DataType,
    /// Position of the alias name.
    pub position: Position,
}

/// Import directive and the declarations it pulled in.
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    /// Path as written in the source.
    pub path: String,
    /// Declarations of the imported file; empty when it was merged elsewhere.
    pub declarations: Vec<Declaration>,
}

/// Top-level declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    /// `import "path"`
    Import(Import),
    /// `type Name = T`
    TypeAlias(TypeAlias),
    /// `enum Name : T { ... }`
    Enum(EnumDef),
    /// `packet Name { ... }`
    Packet(Packet),
}

impl Declaration {
    /// Returns the declared name, or the path for imports.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Import(i) => &i.path,
            Self::TypeAlias(a) => &a.name,
            Self::Enum(e) => &e.name,
            Self::Packet(p) => &p.name,
        }
    }
}

/// Root of a compiled schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    /// Top-level declarations in source order.
    pub declarations: Vec<Declaration>,
}

impl Program {
    /// Creates a program from declarations.
    #[must_use]
    pub fn new(declarations: Vec<Declaration>) -> Self {
        Self { declarations }
    }

    /// Returns every non-import declaration, imported ones expanded in place.
    #[must_use]
    pub fn flatten(&self) -> Vec<&Declaration> {
        let mut out = Vec::new();
        let mut stack: Vec<std::slice::Iter<'_, Declaration>> = vec![self.declarations.iter()];
        while let Some(iter) = stack.last_mut() {
            match iter.next() {
                Some(Declaration::Import(import)) => stack.push(import.declarations.iter()),
                Some(decl) => out.push(decl),
                None => {
                    stack.pop();
                }
            }
        }
        out
    }

    /// Returns every packet in the merged program.
    #[must_use]
    pub fn packets(&self) -> Vec<&Packet> {
        self.flatten()
            .into_iter()
            .filter_map(|d| match d {
                Declaration::Packet(p) => Some(p),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_from_keyword() {
        assert_eq!(Primitive::from_keyword("u8"), Some(Primitive::U8));
        assert_eq!(Primitive::from_keyword("string"), Some(Primitive::String));
        assert_eq!(Primitive::from_keyword("uint8"), None);
    }

    #[test]
    fn test_primitive_classification() {
        assert!(Primitive::I16.is_signed());
        assert!(Primitive::U64.is_integer());
        assert!(!Primitive::F32.is_integer());
        assert!(Primitive::F64.is_float());
        assert_eq!(Primitive::Bool.bit_width(), None);
        assert_eq!(Primitive::U16.bit_width(), Some(16));
    }

    #[test]
    fn test_integer_range() {
        assert_eq!(Primitive::U8.integer_range(), Some((0, 255)));
        assert_eq!(Primitive::I8.integer_range(), Some((-128, 127)));
        assert_eq!(
            Primitive::U64.integer_range(),
            Some((0, i128::from(u64::MAX)))
        );
        assert_eq!(Primitive::F32.integer_range(), None);
    }

    #[test]
    fn test_data_type_display() {
        assert_eq!(DataType::named("u8").to_string(), "u8");
        assert_eq!(DataType::fixed_array("u8", 4).to_string(), "[4]u8");
        assert_eq!(DataType::dynamic_array("string").to_string(), "[]string");
        assert_eq!(DataType::fixed_array("u8", 4).array_len(), Some(4));
        assert!(DataType::dynamic_array("u8").is_array());
    }

    #[test]
    fn test_program_flatten_expands_imports() {
        let program = Program::new(vec![
            Declaration::Import(Import {
                path: "common.pkt".to_string(),
                declarations: vec![Declaration::Packet(Packet::new("Header"))],
            }),
            Declaration::Packet(Packet::new("Login")),
        ]);
        let names: Vec<_> = program.flatten().iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["Header", "Login"]);
        assert_eq!(program.packets().len(), 2);
    }
}
