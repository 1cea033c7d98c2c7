//! Recursive-descent parser with embedded semantic checks.
//!
//! The parser makes a single forward pass over the token stream with one
//! token of lookahead. Every reference is checked against the
//! [`SymbolTable`] as it is consumed, so types must be declared (or
//! imported) before use.

use crate::error::{Result, SchemaError};
use crate::lexer::{Token, TokenKind, tokenize};
use crate::symbols::{SymbolTable, TypeTarget};
use crate::types::{
    ArrayKind, DataType, Declaration, DefaultValue, EnumDef, Field, Import, Packet, Position,
    Primitive, Program, TypeAlias,
};
use crate::validation::validate_program;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Outcome of resolving one `import` directive.
#[derive(Debug, Default)]
pub struct ResolvedImport {
    /// Declarations to attach to the import record.
    pub declarations: Vec<Declaration>,
    /// Symbols to merge into the importing scope.
    pub exports: Option<SymbolTable>,
}

/// Resolves `import` directives on behalf of the parser.
pub trait ImportHandler {
    /// Resolves `path` as written in `importer`.
    ///
    /// # Errors
    /// Returns `SchemaError` if the import cannot be satisfied.
    fn resolve_import(&mut self, importer: &Path, path: &str) -> Result<ResolvedImport>;
}

/// Handler for standalone sources, which cannot import.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoImports;

impl ImportHandler for NoImports {
    fn resolve_import(&mut self, importer: &Path, path: &str) -> Result<ResolvedImport> {
        Err(SchemaError::file_resolution(
            path,
            format!(
                "imports are not available when parsing '{}' standalone",
                importer.display()
            ),
        ))
    }
}

/// Parses a token stream of a single file. Imports are rejected.
///
/// # Errors
/// Returns `SchemaError` on the first grammar or semantic violation.
pub fn parse(tokens: Vec<Token>, file: impl Into<PathBuf>) -> Result<Program> {
    Parser::new(tokens, file).parse(&mut NoImports)
}

/// Lexes, parses and validates a single self-contained source.
///
/// # Errors
/// Returns `SchemaError` on the first lexical, parse or validation error.
pub fn parse_source(source: &str) -> Result<Program> {
    let tokens = tokenize(source)?;
    let program = parse(tokens, "<input>")?;
    validate_program(&program)?;
    Ok(program)
}

/// Owned view of a resolved type, used while the parser needs `&mut self`.
enum LiteralKind {
    Integer(Primitive),
    Float(Primitive),
    Bool,
    Str,
    Enum(EnumDef),
    Packet { name: String, fields: Vec<Field> },
}

/// Recursive-descent parser for one file.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    file: PathBuf,
    symbols: SymbolTable,
}

impl Parser {
    /// Creates a parser over `tokens` belonging to `file`.
    pub fn new(mut tokens: Vec<Token>, file: impl Into<PathBuf>) -> Self {
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            let (line, column) = tokens.last().map_or((1, 1), |t| (t.line, t.column));
            tokens.push(Token::new(TokenKind::Eof, "", line, column));
        }
        let file = file.into();
        Self {
            tokens,
            current: 0,
            symbols: SymbolTable::new(file.clone()),
            file,
        }
    }

    /// Symbols defined or merged so far.
    #[must_use]
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Consumes the parser, returning its symbol table.
    #[must_use]
    pub fn into_symbols(self) -> SymbolTable {
        self.symbols
    }

    /// Parses the whole token stream.
    ///
    /// # Errors
    /// Returns `SchemaError` on the first grammar or semantic violation.
    pub fn parse(&mut self, imports: &mut dyn ImportHandler) -> Result<Program> {
        let mut declarations = Vec::new();
        while self.peek_kind() != TokenKind::Eof {
            let declaration = match self.peek_kind() {
                TokenKind::Import => Declaration::Import(self.import_declaration(imports)?),
                TokenKind::Type => Declaration::TypeAlias(self.type_alias()?),
                TokenKind::Enum => Declaration::Enum(self.enum_declaration()?),
                TokenKind::Packet => Declaration::Packet(self.packet()?),
                other => return Err(self.error(format!("Unexpected token {other}"))),
            };
            declarations.push(declaration);
        }
        Ok(Program::new(declarations))
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    fn import_declaration(&mut self, imports: &mut dyn ImportHandler) -> Result<Import> {
        self.expect(TokenKind::Import)?;
        let path = self.expect(TokenKind::String)?.text;
        let resolved = imports.resolve_import(&self.file, &path)?;
        if let Some(exports) = &resolved.exports {
            self.symbols.merge(exports)?;
        }
        Ok(Import {
            path,
            declarations: resolved.declarations,
        })
    }

    fn type_alias(&mut self) -> Result<TypeAlias> {
        self.expect(TokenKind::Type)?;
        let name = self.expect(TokenKind::Identifier)?;
        self.check_new_name(&name)?;
        self.expect(TokenKind::Equals)?;
        let aliased = self.data_type()?;

        if let Some(packet) = self.symbols.packet(&aliased.name) {
            if packet.is_generic() {
                return Err(error_at(
                    &name,
                    format!("Type alias cannot refer to generic packet '{}'", packet.name),
                ));
            }
        }

        let alias = TypeAlias {
            name: name.text.clone(),
            aliased,
            position: position(&name),
        };
        self.symbols.define_alias(alias.clone());
        Ok(alias)
    }

    fn enum_declaration(&mut self) -> Result<EnumDef> {
        self.expect(TokenKind::Enum)?;
        let name = self.expect(TokenKind::Identifier)?;
        self.check_new_name(&name)?;
        self.expect(TokenKind::Colon)?;
        let underlying = self.expect(TokenKind::Identifier)?;
        let Some(encoding) = self.symbols.integer_primitive(&underlying.text) else {
            return Err(error_at(
                &underlying,
                format!(
                    "Invalid enum type: {}. Must be a primitive integer type or a defined integer type.",
                    underlying.text
                ),
            ));
        };
        let max_value = encoding.integer_range().map_or(0, |(_, max)| max);

        self.expect(TokenKind::LBrace)?;
        let mut values: Vec<String> = Vec::new();
        while self.peek_kind() != TokenKind::RBrace {
            let value = self.expect(TokenKind::Identifier)?;
            if values.contains(&value.text) {
                return Err(error_at(
                    &value,
                    format!("Duplicate enum value '{}'", value.text),
                ));
            }
            // Values are numbered from zero.
            if i128::try_from(values.len()).unwrap_or(i128::MAX) > max_value {
                return Err(error_at(
                    &value,
                    format!(
                        "Enum '{}' has more values than {encoding} can hold",
                        name.text
                    ),
                ));
            }
            values.push(value.text);
            if self.peek_kind() == TokenKind::Comma {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;

        if values.is_empty() {
            return Err(error_at(
                &name,
                format!("Enum '{}' must declare at least one value", name.text),
            ));
        }

        let enum_def = EnumDef {
            name: name.text.clone(),
            underlying: underlying.text,
            values,
            position: position(&name),
        };
        self.symbols.define_enum(enum_def.clone());
        Ok(enum_def)
    }

    fn packet(&mut self) -> Result<Packet> {
        self.expect(TokenKind::Packet)?;
        let name = self.expect(TokenKind::Identifier)?;
        if self.symbols.is_declared(&name.text) {
            return Err(error_at(
                &name,
                format!("Packet '{}' is already defined", name.text),
            ));
        }

        let generic_params = if self.peek_kind() == TokenKind::LAngle {
            self.generic_params()?
        } else {
            Vec::new()
        };
        self.symbols.enter_generic_scope(&generic_params);

        let parent = if self.peek_kind() == TokenKind::Colon {
            self.advance();
            let parent = self.expect(TokenKind::Identifier)?;
            match self.symbols.packet(&parent.text) {
                None => {
                    return Err(error_at(
                        &parent,
                        format!("Parent packet '{}' is not defined", parent.text),
                    ));
                }
                Some(p) if p.is_generic() => {
                    return Err(error_at(
                        &parent,
                        format!("Parent packet '{}' is generic and cannot be inherited", p.name),
                    ));
                }
                Some(_) => Some(parent.text),
            }
        } else {
            None
        };

        self.expect(TokenKind::LBrace)?;
        let mut fields = Vec::new();
        while self.peek_kind() != TokenKind::RBrace {
            fields.push(self.field()?);
        }
        self.expect(TokenKind::RBrace)?;

        self.check_field_uniqueness(&fields, parent.as_deref())?;

        let packet = Packet {
            name: name.text.clone(),
            fields,
            generic_params,
            parent,
            position: position(&name),
        };
        self.symbols.define_packet(packet.clone());
        self.symbols.exit_generic_scope();
        Ok(packet)
    }

    fn field(&mut self) -> Result<Field> {
        let name = self.expect(TokenKind::Identifier)?;
        self.expect(TokenKind::Colon)?;
        let data_type = self.data_type()?;
        let generic_args = if self.peek_kind() == TokenKind::LAngle {
            self.generic_args()?
        } else {
            Vec::new()
        };
        self.check_generic_args(&name, &data_type, &generic_args)?;

        let mut default_value = None;
        if self.peek_kind() == TokenKind::Equals {
            self.advance();
            if data_type.is_array() {
                return Err(self.error(format!(
                    "Default values are not supported for array field '{}'",
                    name.text
                )));
            }
            default_value = Some(self.default_value(&data_type)?);
        }

        let mut bit_size = None;
        if self.peek_kind() == TokenKind::LBracket {
            self.advance();
            let keyword = self.expect(TokenKind::Identifier)?;
            if keyword.text != "bits" {
                return Err(error_at(
                    &keyword,
                    format!("Expected 'bits', got '{}'", keyword.text),
                ));
            }
            self.expect(TokenKind::Colon)?;
            let size = self.expect(TokenKind::Number)?;
            let bits = size
                .text
                .parse::<u32>()
                .map_err(|_| error_at(&size, format!("Invalid bit size '{}'", size.text)))?;
            self.expect(TokenKind::RBracket)?;
            self.check_bit_size(&size, &data_type, bits)?;
            bit_size = Some(bits);
        }

        Ok(Field {
            name: name.text.clone(),
            data_type,
            generic_args,
            default_value,
            bit_size,
            position: position(&name),
        })
    }

    fn data_type(&mut self) -> Result<DataType> {
        match self.peek_kind() {
            TokenKind::LBracket => self.array_type(),
            TokenKind::Identifier => {
                let name = self.advance();
                if !self.symbols.is_type(&name.text) {
                    return Err(error_at(&name, format!("Undefined type '{}'", name.text)));
                }
                Ok(DataType::named(name.text))
            }
            _ => Err(self.error("Expected data type")),
        }
    }

    fn array_type(&mut self) -> Result<DataType> {
        self.expect(TokenKind::LBracket)?;
        let array = if self.peek_kind() == TokenKind::Number {
            let size = self.advance();
            match size.text.parse::<u64>() {
                Ok(n) if n > 0 => ArrayKind::Fixed(n),
                _ => {
                    return Err(error_at(
                        &size,
                        format!("Invalid array length '{}'", size.text),
                    ));
                }
            }
        } else {
            ArrayKind::Dynamic
        };
        self.expect(TokenKind::RBracket)?;

        let element = self.data_type()?;
        if self.carries_array(&element) {
            return Err(self.error("Nested arrays are not supported"));
        }
        Ok(DataType {
            name: element.name,
            array,
        })
    }

    fn generic_params(&mut self) -> Result<Vec<String>> {
        self.expect(TokenKind::LAngle)?;
        let mut params: Vec<String> = Vec::new();
        loop {
            let param = self.expect(TokenKind::Identifier)?;
            if params.contains(&param.text) {
                return Err(error_at(
                    &param,
                    format!("Duplicate generic parameter '{}'", param.text),
                ));
            }
            if self.symbols.is_declared(&param.text) {
                return Err(error_at(
                    &param,
                    format!("Generic parameter '{}' shadows an existing type", param.text),
                ));
            }
            params.push(param.text);
            if self.peek_kind() == TokenKind::RAngle {
                break;
            }
            self.expect(TokenKind::Comma)?;
        }
        self.expect(TokenKind::RAngle)?;
        Ok(params)
    }

    fn generic_args(&mut self) -> Result<Vec<DataType>> {
        self.expect(TokenKind::LAngle)?;
        let mut args = Vec::new();
        loop {
            args.push(self.data_type()?);
            if self.peek_kind() == TokenKind::RAngle {
                break;
            }
            self.expect(TokenKind::Comma)?;
        }
        self.expect(TokenKind::RAngle)?;
        Ok(args)
    }

    // ------------------------------------------------------------------
    // Default values
    // ------------------------------------------------------------------

    fn default_value(&mut self, data_type: &DataType) -> Result<DefaultValue> {
        match self.literal_kind(data_type)? {
            LiteralKind::Integer(primitive) => {
                let token = self.expect(TokenKind::Number)?;
                let value = token
                    .text
                    .parse::<i128>()
                    .map_err(|_| error_at(&token, format!("Invalid number '{}'", token.text)))?;
                if let Some((min, max)) = primitive.integer_range() {
                    if value < min || value > max {
                        return Err(error_at(
                            &token,
                            format!("Value {value} out of range for {primitive}"),
                        ));
                    }
                }
                Ok(DefaultValue::Integer(value))
            }
            LiteralKind::Float(primitive) => {
                let token = match self.peek_kind() {
                    TokenKind::Float => self.advance(),
                    _ => self.expect(TokenKind::Number)?,
                };
                let value = token
                    .text
                    .parse::<f64>()
                    .map_err(|_| error_at(&token, format!("Invalid number '{}'", token.text)))?;
                let finite = match primitive {
                    Primitive::F32 => (value as f32).is_finite(),
                    _ => value.is_finite(),
                };
                if !finite {
                    return Err(error_at(
                        &token,
                        format!("Value {} out of range for {primitive}", token.text),
                    ));
                }
                Ok(DefaultValue::Float(value))
            }
            LiteralKind::Bool => {
                let token = self.expect(TokenKind::Identifier)?;
                match token.text.as_str() {
                    "true" => Ok(DefaultValue::Bool(true)),
                    "false" => Ok(DefaultValue::Bool(false)),
                    other => Err(error_at(&token, format!("Invalid boolean value: {other}"))),
                }
            }
            LiteralKind::Str => Ok(DefaultValue::Str(self.expect(TokenKind::String)?.text)),
            LiteralKind::Enum(enum_def) => {
                let token = self.expect(TokenKind::Identifier)?;
                if !enum_def.has_value(&token.text) {
                    return Err(error_at(
                        &token,
                        format!("Invalid enum value: {}", token.text),
                    ));
                }
                Ok(DefaultValue::EnumMember(token.text))
            }
            LiteralKind::Packet { name, fields } => self.packet_literal(&name, &fields),
        }
    }

    fn literal_kind(&self, data_type: &DataType) -> Result<LiteralKind> {
        let resolution = self
            .symbols
            .resolve(data_type)
            .map_err(|message| self.error(message))?;
        if resolution.is_array {
            return Err(self.error(format!(
                "Default values are not supported for array type '{data_type}'"
            )));
        }
        match resolution.target {
            TypeTarget::Primitive(p) if p.is_integer() => Ok(LiteralKind::Integer(p)),
            TypeTarget::Primitive(p) if p.is_float() => Ok(LiteralKind::Float(p)),
            TypeTarget::Primitive(Primitive::Bool) => Ok(LiteralKind::Bool),
            TypeTarget::Primitive(_) => Ok(LiteralKind::Str),
            TypeTarget::Enum(e) => Ok(LiteralKind::Enum(e.clone())),
            TypeTarget::Packet(p) if !p.is_generic() => Ok(LiteralKind::Packet {
                name: p.name.clone(),
                fields: self
                    .symbols
                    .effective_fields(&p.name)
                    .into_iter()
                    .cloned()
                    .collect(),
            }),
            TypeTarget::Packet(_) | TypeTarget::GenericParam => Err(self.error(format!(
                "Unsupported type for default value: {}",
                data_type.name
            ))),
        }
    }

    fn packet_literal(&mut self, packet: &str, fields: &[Field]) -> Result<DefaultValue> {
        self.expect(TokenKind::LBrace)?;
        let mut values: Vec<(String, DefaultValue)> = Vec::new();
        while self.peek_kind() != TokenKind::RBrace {
            let name = self.expect(TokenKind::Identifier)?;
            self.expect(TokenKind::Colon)?;
            let Some(field) = fields.iter().find(|f| f.name == name.text) else {
                return Err(error_at(
                    &name,
                    format!("Unknown field '{}' in packet '{packet}'", name.text),
                ));
            };
            if values.iter().any(|(n, _)| *n == name.text) {
                return Err(error_at(
                    &name,
                    format!("Duplicate field '{}' in packet literal", name.text),
                ));
            }
            if !field.generic_args.is_empty() {
                return Err(error_at(
                    &name,
                    format!("Unsupported type for default value: {}", field.data_type.name),
                ));
            }
            let value = self.default_value(&field.data_type)?;
            values.push((name.text, value));
            if self.peek_kind() == TokenKind::Comma {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(DefaultValue::Packet(values))
    }

    // ------------------------------------------------------------------
    // Semantic checks
    // ------------------------------------------------------------------

    fn check_new_name(&self, name: &Token) -> Result<()> {
        if self.symbols.is_declared(&name.text) {
            return Err(error_at(
                name,
                format!("Type '{}' is already defined", name.text),
            ));
        }
        Ok(())
    }

    fn check_generic_args(&self, field: &Token, data_type: &DataType, args: &[DataType]) -> Result<()> {
        match self.symbols.packet(&data_type.name) {
            Some(packet) if packet.is_generic() => {
                if args.len() != packet.generic_params.len() {
                    return Err(error_at(
                        field,
                        format!(
                            "Generic packet '{}' expects {} generic argument(s), got {}",
                            packet.name,
                            packet.generic_params.len(),
                            args.len()
                        ),
                    ));
                }
            }
            _ if !args.is_empty() => {
                return Err(error_at(
                    field,
                    format!("Type '{}' is not generic", data_type.name),
                ));
            }
            _ => return Ok(()),
        }

        for arg in args {
            if arg.is_array() {
                return Err(error_at(
                    field,
                    format!("Generic argument '{arg}' must be a named type"),
                ));
            }
            if self.carries_array(arg) {
                return Err(error_at(
                    field,
                    format!("Generic argument '{arg}' must not be an array type"),
                ));
            }
            if self.symbols.packet(&arg.name).is_some_and(Packet::is_generic) {
                return Err(error_at(
                    field,
                    format!(
                        "Generic packet '{}' cannot be used as a generic argument",
                        arg.name
                    ),
                ));
            }
        }
        Ok(())
    }

    /// True if `data_type` is an array, directly or through aliases.
    fn carries_array(&self, data_type: &DataType) -> bool {
        self.symbols
            .resolve(data_type)
            .is_ok_and(|resolution| resolution.is_array)
    }

    fn check_bit_size(&self, at: &Token, data_type: &DataType, bits: u32) -> Result<()> {
        let primitive = if data_type.is_array() {
            None
        } else {
            self.symbols.integer_primitive(&data_type.name)
        };
        let Some(primitive) = primitive else {
            return Err(error_at(
                at,
                format!("Bit-size annotation requires a scalar integer field, found '{data_type}'"),
            ));
        };
        let width = primitive.bit_width().unwrap_or(0);
        if bits == 0 || bits > width {
            return Err(error_at(
                at,
                format!("Bit size {bits} out of range for '{data_type}' (1..={width})"),
            ));
        }
        Ok(())
    }

    fn check_field_uniqueness(&self, fields: &[Field], parent: Option<&str>) -> Result<()> {
        let mut names: HashSet<&str> = parent
            .map(|p| {
                self.symbols
                    .effective_fields(p)
                    .into_iter()
                    .map(|f| f.name.as_str())
                    .collect()
            })
            .unwrap_or_default();

        for field in fields {
            if !names.insert(field.name.as_str()) {
                return Err(SchemaError::parse(
                    format!("Duplicate field name '{}'", field.name),
                    field.position.line,
                    field.position.column,
                ));
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------------

    fn current_token(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.current.min(last)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.current_token().kind
    }

    fn advance(&mut self) -> Token {
        let token = self.current_token().clone();
        if self.current < self.tokens.len() - 1 {
            self.current += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.peek_kind() == kind {
            return Ok(self.advance());
        }
        Err(self.error(format!("Expected {kind}, got {}", self.peek_kind())))
    }

    fn error(&self, message: impl Into<String>) -> SchemaError {
        error_at(self.current_token(), message)
    }
}

fn error_at(token: &Token, message: impl Into<String>) -> SchemaError {
    SchemaError::parse(message, token.line, token.column)
}

fn position(token: &Token) -> Position {
    Position::new(token.line, token.column)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Program {
        parse_source(source).expect("Failed to parse")
    }

    fn parse_err(source: &str) -> String {
        match parse_source(source) {
            Ok(_) => panic!("expected failure for:\n{source}"),
            Err(e) => e.to_string(),
        }
    }

    fn packet<'a>(program: &'a Program, name: &str) -> &'a Packet {
        program
            .packets()
            .into_iter()
            .find(|p| p.name == name)
            .expect("packet not found")
    }

    #[test]
    fn test_parse_simple_packet() {
        let program = parse_ok("packet Ping { id: u32 payload: [4]u8 tags: []string }");
        let ping = packet(&program, "Ping");
        assert_eq!(ping.fields.len(), 3);
        assert_eq!(ping.fields[1].data_type, DataType::fixed_array("u8", 4));
        assert_eq!(ping.fields[2].data_type, DataType::dynamic_array("string"));
        assert_eq!(ping.position, Position::new(1, 8));
    }

    #[test]
    fn test_undefined_type() {
        let err = parse_err("packet P { x: Missing }");
        assert!(err.contains("Undefined type 'Missing'"), "{err}");
        assert!(err.contains("line 1, column 15"), "{err}");
    }

    #[test]
    fn test_forward_reference_rejected() {
        let err = parse_err("packet A { b: B } packet B { x: u8 }");
        assert!(err.contains("Undefined type 'B'"), "{err}");
    }

    #[test]
    fn test_duplicate_packet() {
        let err = parse_err("packet A {} packet A {}");
        assert!(err.contains("Packet 'A' is already defined"), "{err}");
    }

    #[test]
    fn test_duplicate_across_kinds() {
        let err = parse_err("enum A : u8 { X } packet A {}");
        assert!(err.contains("already defined"), "{err}");
        let err = parse_err("type u8 = u16");
        assert!(err.contains("Type 'u8' is already defined"), "{err}");
    }

    #[test]
    fn test_inheritance_chain() {
        let program = parse_ok("packet A {} packet B : A {} packet C : B {}");
        assert_eq!(packet(&program, "C").parent.as_deref(), Some("B"));
    }

    #[test]
    fn test_undefined_parent() {
        let err = parse_err("packet B : A {}");
        assert!(err.contains("Parent packet 'A' is not defined"), "{err}");
    }

    #[test]
    fn test_field_uniqueness_across_inheritance() {
        let err = parse_err("packet A { x: u8 } packet B : A { x: u16 }");
        assert!(err.contains("Duplicate field name 'x'"), "{err}");

        let err = parse_err("packet A { x: u8 } packet B : A {} packet C : B { x: u8 }");
        assert!(err.contains("Duplicate field name 'x'"), "{err}");

        let err = parse_err("packet A { x: u8 x: u16 }");
        assert!(err.contains("Duplicate field name 'x'"), "{err}");
    }

    #[test]
    fn test_child_effective_fields() {
        let tokens = tokenize("packet A { x: u8 } packet B : A { y: u16 }").expect("lex");
        let mut parser = Parser::new(tokens, "test.pkt");
        parser.parse(&mut NoImports).expect("Failed to parse");
        let names: Vec<_> = parser
            .symbols()
            .effective_fields("B")
            .iter()
            .map(|f| f.name.clone())
            .collect();
        assert_eq!(names, vec!["x", "y"]);
    }

    #[test]
    fn test_generic_arity() {
        let base = "packet Box<T> { value: T }";
        let err = parse_err(&format!("{base} packet P {{ b: Box<u8, u16> }}"));
        assert!(err.contains("expects 1 generic argument(s), got 2"), "{err}");

        let err = parse_err(&format!("{base} packet P {{ b: Box }}"));
        assert!(err.contains("expects 1 generic argument(s), got 0"), "{err}");

        let program = parse_ok(&format!("{base} packet P {{ b: Box<u8> c: Box<u16> }}"));
        let p = packet(&program, "P");
        assert_eq!(p.fields[0].generic_args, vec![DataType::named("u8")]);
        assert_eq!(p.fields[1].generic_args, vec![DataType::named("u16")]);
    }

    #[test]
    fn test_generic_args_on_plain_type() {
        let err = parse_err("packet P { x: u8<u16> }");
        assert!(err.contains("Type 'u8' is not generic"), "{err}");
    }

    #[test]
    fn test_generic_param_scope() {
        let err = parse_err("packet Box<T> { value: T } packet P { x: T }");
        assert!(err.contains("Undefined type 'T'"), "{err}");

        let err = parse_err("packet Pair<T, T> {}");
        assert!(err.contains("Duplicate generic parameter 'T'"), "{err}");

        let err = parse_err("packet Wrap<u8> { v: u8 }");
        assert!(err.contains("shadows an existing type"), "{err}");
    }

    #[test]
    fn test_generic_inside_generic() {
        let program = parse_ok(
            "packet Box<T> { value: T } packet Pair<A, B> { first: Box<A> second: []B }",
        );
        let pair = packet(&program, "Pair");
        assert_eq!(pair.generic_params, vec!["A", "B"]);
        assert_eq!(pair.fields[0].generic_args, vec![DataType::named("A")]);
    }

    #[test]
    fn test_enum_default_value() {
        let base = "enum Color : u8 { RED, GREEN }";
        let program = parse_ok(&format!("{base} packet P {{ c: Color = RED }}"));
        assert_eq!(
            packet(&program, "P").fields[0].default_value,
            Some(DefaultValue::EnumMember("RED".to_string()))
        );

        let err = parse_err(&format!("{base} packet P {{ c: Color = BLUE }}"));
        assert!(err.contains("Invalid enum value: BLUE"), "{err}");
    }

    #[test]
    fn test_enum_underlying_type() {
        let err = parse_err("enum E : f32 { A }");
        assert!(err.contains("Invalid enum type: f32"), "{err}");

        parse_ok("type Byte = u8 enum E : Byte { A, B, }");
        parse_ok("enum Base : u16 { A } enum E : Base { B }");

        let err = parse_err("enum E : u8 { A, A }");
        assert!(err.contains("Duplicate enum value 'A'"), "{err}");

        let err = parse_err("enum E : u8 { }");
        assert!(err.contains("at least one value"), "{err}");
    }

    #[test]
    fn test_enum_values_fit_encoding() {
        let values = |n: usize| {
            (0..n)
                .map(|i| format!("V{i}"))
                .collect::<Vec<_>>()
                .join(", ")
        };
        parse_ok(&format!("enum E : u8 {{ {} }}", values(256)));
        parse_ok(&format!("enum E : i8 {{ {} }}", values(128)));

        let err = parse_err(&format!("enum E : u8 {{ {} }}", values(300)));
        assert!(err.contains("Enum 'E' has more values than u8 can hold"), "{err}");
        assert!(err.contains("column 1441"), "{err}");

        let err = parse_err(&format!("enum E : i8 {{ {} }}", values(129)));
        assert!(err.contains("more values than i8"), "{err}");
    }

    #[test]
    fn test_alias_transitivity() {
        let program = parse_ok("type Byte = u8 type Flag = Byte packet P { f: Flag = 1 }");
        assert_eq!(
            packet(&program, "P").fields[0].default_value,
            Some(DefaultValue::Integer(1))
        );
    }

    #[test]
    fn test_primitive_defaults() {
        let program = parse_ok(
            r#"packet P {
                a: u8 = 255
                b: i16 = -3
                c: f32 = 1.5
                d: f64 = 2
                e: bool = true
                f: string = "hi"
            }"#,
        );
        let p = packet(&program, "P");
        let defaults: Vec<_> = p.fields.iter().map(|f| f.default_value.clone()).collect();
        assert_eq!(
            defaults,
            vec![
                Some(DefaultValue::Integer(255)),
                Some(DefaultValue::Integer(-3)),
                Some(DefaultValue::Float(1.5)),
                Some(DefaultValue::Float(2.0)),
                Some(DefaultValue::Bool(true)),
                Some(DefaultValue::Str("hi".to_string())),
            ]
        );
    }

    #[test]
    fn test_float_defaults_must_fit() {
        let huge = format!("1{}", "0".repeat(300));
        let err = parse_err(&format!("packet P {{ a: f32 = {huge} }}"));
        assert!(err.contains("out of range for f32"), "{err}");

        let program = parse_ok(&format!("packet P {{ a: f64 = {huge} }}"));
        assert_eq!(
            packet(&program, "P").fields[0].default_value,
            Some(DefaultValue::Float(1e300))
        );

        let err = parse_err(&format!("packet P {{ a: f64 = 1{}.0 }}", "0".repeat(400)));
        assert!(err.contains("out of range for f64"), "{err}");
    }

    #[test]
    fn test_invalid_defaults() {
        let err = parse_err("packet P { a: u8 = 256 }");
        assert!(err.contains("Value 256 out of range for u8"), "{err}");

        let err = parse_err("packet P { a: u8 = -1 }");
        assert!(err.contains("out of range"), "{err}");

        let err = parse_err("packet P { a: bool = yes }");
        assert!(err.contains("Invalid boolean value: yes"), "{err}");

        let err = parse_err("packet P { a: string = 5 }");
        assert!(err.contains("Expected string, got number"), "{err}");

        let err = parse_err("packet P { a: [2]u8 = 5 }");
        assert!(err.contains("array field"), "{err}");

        let err = parse_err("packet Box<T> { value: T = 1 }");
        assert!(err.contains("Unsupported type for default value: T"), "{err}");
    }

    #[test]
    fn test_packet_literal_default() {
        let program = parse_ok(
            r#"enum Mode : u8 { ON, OFF }
               packet Base { id: u16 }
               packet Point : Base { x: i32 y: i32 mode: Mode }
               packet Shape { origin: Point = { id: 7, x: 1, y: -2, mode: OFF } }"#,
        );
        let shape = packet(&program, "Shape");
        assert_eq!(
            shape.fields[0].default_value,
            Some(DefaultValue::Packet(vec![
                ("id".to_string(), DefaultValue::Integer(7)),
                ("x".to_string(), DefaultValue::Integer(1)),
                ("y".to_string(), DefaultValue::Integer(-2)),
                ("mode".to_string(), DefaultValue::EnumMember("OFF".to_string())),
            ]))
        );
    }

    #[test]
    fn test_packet_literal_errors() {
        let base = "packet Point { x: i32 y: i32 }";
        let err = parse_err(&format!("{base} packet S {{ p: Point = {{ z: 1 }} }}"));
        assert!(err.contains("Unknown field 'z' in packet 'Point'"), "{err}");

        let err = parse_err(&format!("{base} packet S {{ p: Point = {{ x: 1, x: 2 }} }}"));
        assert!(err.contains("Duplicate field 'x' in packet literal"), "{err}");
    }

    #[test]
    fn test_nested_packet_literal() {
        let program = parse_ok(
            r#"packet Inner { v: u8 }
               packet Middle { inner: Inner }
               packet Outer { m: Middle = { inner: { v: 3 } } }"#,
        );
        let outer = packet(&program, "Outer");
        assert_eq!(
            outer.fields[0].default_value,
            Some(DefaultValue::Packet(vec![(
                "inner".to_string(),
                DefaultValue::Packet(vec![("v".to_string(), DefaultValue::Integer(3))])
            )]))
        );
    }

    #[test]
    fn test_bit_size() {
        let program = parse_ok(
            "enum Kind : u8 { A, B } packet P { flags: u8 [bits: 3] kind: Kind = B [bits: 2] }",
        );
        let p = packet(&program, "P");
        assert_eq!(p.fields[0].bit_size, Some(3));
        assert_eq!(p.fields[1].bit_size, Some(2));
        assert_eq!(
            p.fields[1].default_value,
            Some(DefaultValue::EnumMember("B".to_string()))
        );
    }

    #[test]
    fn test_bit_size_range() {
        let err = parse_err("packet P { flags: u8 [bits: 9] }");
        assert!(err.contains("Bit size 9 out of range for 'u8' (1..=8)"), "{err}");

        let err = parse_err("packet P { flags: u8 [bits: 0] }");
        assert!(err.contains("out of range"), "{err}");

        let err = parse_err("packet P { ratio: f32 [bits: 4] }");
        assert!(err.contains("requires a scalar integer field"), "{err}");

        let err = parse_err("packet P { raw: [2]u8 [bits: 4] }");
        assert!(err.contains("requires a scalar integer field"), "{err}");

        let err = parse_err("packet P { flags: u8 [size: 4] }");
        assert!(err.contains("Expected 'bits'"), "{err}");
    }

    #[test]
    fn test_array_types() {
        let err = parse_err("packet P { x: [0]u8 }");
        assert!(err.contains("Invalid array length '0'"), "{err}");

        let err = parse_err("packet P { x: [2][3]u8 }");
        assert!(err.contains("Nested arrays are not supported"), "{err}");
    }

    #[test]
    fn test_nested_arrays_through_aliases() {
        let err = parse_err("type Bytes = [4]u8 packet P { x: [2]Bytes }");
        assert!(err.contains("Nested arrays are not supported"), "{err}");

        let err = parse_err("type Bytes = [4]u8 type Key = Bytes packet P { x: []Key }");
        assert!(err.contains("Nested arrays are not supported"), "{err}");

        let err = parse_err("type Bytes = [4]u8 type Pair = [2]Bytes");
        assert!(err.contains("Nested arrays are not supported"), "{err}");

        parse_ok("type Byte = u8 packet P { x: [2]Byte }");
    }

    #[test]
    fn test_array_alias_as_generic_argument() {
        let err = parse_err(
            "type Bytes = [4]u8 packet Box<T> { items: []T } packet P { b: Box<Bytes> }",
        );
        assert!(err.contains("Generic argument 'Bytes' must not be an array type"), "{err}");

        let err = parse_err("packet Box<T> { v: T } packet P { b: Box<[2]u8> }");
        assert!(err.contains("must be a named type"), "{err}");
    }

    #[test]
    fn test_alias_to_generic_rejected() {
        let err = parse_err("packet Box<T> { v: T } type B = Box");
        assert!(err.contains("cannot refer to generic packet 'Box'"), "{err}");
    }

    #[test]
    fn test_generic_parent_rejected() {
        let err = parse_err("packet Box<T> { v: T } packet P : Box {}");
        assert!(err.contains("is generic and cannot be inherited"), "{err}");
    }

    #[test]
    fn test_unexpected_token() {
        let err = parse_err("packet P { x: u8 } }");
        assert!(err.contains("Unexpected token '}'"), "{err}");

        let err = parse_err("packet P { x: u8");
        assert!(err.contains("got end of file"), "{err}");
    }

    #[test]
    fn test_import_rejected_standalone() {
        let err = parse_source("import \"common.pkt\"").unwrap_err();
        assert!(matches!(err, SchemaError::FileResolution { .. }));
    }

    #[test]
    fn test_parser_without_eof_token() {
        let tokens = vec![
            Token::new(TokenKind::Packet, "packet", 1, 1),
            Token::new(TokenKind::Identifier, "P", 1, 8),
            Token::new(TokenKind::LBrace, "{", 1, 10),
            Token::new(TokenKind::RBrace, "}", 1, 11),
        ];
        let program = parse(tokens, "manual.pkt").expect("Failed to parse");
        assert_eq!(program.declarations.len(), 1);
    }
}
