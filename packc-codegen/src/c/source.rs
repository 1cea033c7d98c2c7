//! C source rendering: one `_init` function per struct.

use super::types::{c_identifier, c_literal};
use crate::config::GeneratorConfig;
use crate::error::CodegenError;
use packc_schema::{ArrayKind, DefaultValue, ResolvedStruct, ResolvedType, SchemaIr, TypeKind};

/// Generator for the definitions unit.
pub struct SourceGenerator<'a> {
    ir: &'a SchemaIr,
    config: &'a GeneratorConfig,
}

impl<'a> SourceGenerator<'a> {
    /// Creates a new source generator.
    #[must_use]
    pub fn new(ir: &'a SchemaIr, config: &'a GeneratorConfig) -> Self {
        Self { ir, config }
    }

    /// Generates the complete source file.
    ///
    /// # Errors
    /// Returns `CodegenError` if a default value cannot be rendered.
    pub fn generate(&self) -> Result<String, CodegenError> {
        let mut output = String::new();
        if self.config.banner {
            output.push_str("/* Generated by packc. Do not edit. */\n\n");
        }
        output.push_str(&format!("#include \"{}.h\"\n\n", self.config.unit_name));
        output.push_str("#include <string.h>\n");

        for packet in self.ir.structs() {
            output.push('\n');
            output.push_str(&self.generate_init(packet)?);
        }
        Ok(output)
    }

    /// Generates `Name_init`.
    fn generate_init(&self, packet: &ResolvedStruct) -> Result<String, CodegenError> {
        let name = c_identifier(&packet.name);
        let mut body = String::new();
        body.push_str("    memset(value, 0, sizeof(*value));\n");

        for field in &packet.fields {
            let target = format!("value->{}", c_identifier(&field.name));
            self.init_nested(&mut body, &target, &field.ty);
            if let Some(default) = &field.default {
                self.assign_default(&mut body, &target, &field.ty, default, &field.name)?;
            }
        }

        Ok(format!(
            "void {name}_init({name} *value)\n{{\n{body}}}\n"
        ))
    }

    /// Calls the init function of packet-typed members.
    fn init_nested(&self, body: &mut String, target: &str, ty: &ResolvedType) {
        let storage = self.ir.storage_type(ty);
        let (element, _) = self.ir.resolve_kind(&storage.kind);
        let TypeKind::Struct(nested) = element else {
            return;
        };
        let nested = c_identifier(nested);
        match storage.array {
            ArrayKind::Scalar => {
                body.push_str(&format!("    {nested}_init(&{target});\n"));
            }
            ArrayKind::Fixed(len) => {
                body.push_str(&format!(
                    "    for (size_t i = 0; i < {len}; ++i) {{\n        {nested}_init(&{target}[i]);\n    }}\n"
                ));
            }
            ArrayKind::Dynamic => {}
        }
    }

    /// Assigns a default, expanding packet literals into member paths.
    fn assign_default(
        &self,
        body: &mut String,
        target: &str,
        ty: &ResolvedType,
        value: &DefaultValue,
        field: &str,
    ) -> Result<(), CodegenError> {
        let DefaultValue::Packet(members) = value else {
            let literal = c_literal(self.ir, &ty.kind, value)?;
            body.push_str(&format!("    {target} = {literal};\n"));
            return Ok(());
        };

        let (kind, _) = self.ir.resolve_kind(&ty.kind);
        let nested = self
            .ir
            .get_struct(kind.name())
            .ok_or_else(|| CodegenError::unknown_type(kind.name(), field))?;
        for (member, member_value) in members {
            let member_field = nested
                .fields
                .iter()
                .find(|f| f.name == *member)
                .ok_or_else(|| CodegenError::unknown_type(&nested.name, member.as_str()))?;
            let member_target = format!("{target}.{}", c_identifier(member));
            self.assign_default(body, &member_target, &member_field.ty, member_value, member)?;
        }
        Ok(())
    }
}
