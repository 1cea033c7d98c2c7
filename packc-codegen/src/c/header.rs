//! C header rendering.

use super::types::{c_identifier, c_primitive, c_type, declaration, declare, slice_name};
use crate::config::GeneratorConfig;
use packc_schema::{
    ArrayKind, IrItem, ResolvedAlias, ResolvedEnum, ResolvedStruct, ResolvedType, SchemaIr,
    TypeKind,
};
use std::collections::HashSet;

/// Generator for the declarations unit.
pub struct HeaderGenerator<'a> {
    ir: &'a SchemaIr,
    config: &'a GeneratorConfig,
}

impl<'a> HeaderGenerator<'a> {
    /// Creates a new header generator.
    #[must_use]
    pub fn new(ir: &'a SchemaIr, config: &'a GeneratorConfig) -> Self {
        Self { ir, config }
    }

    /// Generates the complete header.
    #[must_use]
    pub fn generate(&self) -> String {
        let mut output = String::new();
        let guard = self.config.guard();

        if self.config.banner {
            output.push_str("/* Generated by packc. Do not edit. */\n\n");
        }
        output.push_str(&format!("#ifndef {guard}\n#define {guard}\n\n"));
        output.push_str("#include <stdbool.h>\n");
        output.push_str("#include <stddef.h>\n");
        output.push_str("#include <stdint.h>\n\n");
        output.push_str("#ifdef __cplusplus\nextern \"C\" {\n#endif\n\n");

        let mut slices = HashSet::new();
        for item in &self.ir.items {
            for ty in dynamic_types(item) {
                if slices.insert(slice_name(&ty.kind)) {
                    output.push_str(&self.generate_slice(&ty.kind));
                }
            }
            match item {
                IrItem::Enum(e) => output.push_str(&self.generate_enum(e)),
                IrItem::Alias(a) => output.push_str(&self.generate_alias(a)),
                IrItem::Struct(s) => output.push_str(&self.generate_struct(s)),
            }
        }

        let structs: Vec<_> = self.ir.structs().collect();
        if !structs.is_empty() {
            output.push_str("/* Reset to zero, then apply schema defaults. */\n");
            for s in structs {
                let name = c_identifier(&s.name);
                output.push_str(&format!("void {name}_init({name} *value);\n"));
            }
            output.push('\n');
        }

        output.push_str("#ifdef __cplusplus\n}\n#endif\n\n");
        output.push_str(&format!("#endif /* {guard} */\n"));
        output
    }

    /// Generates the slice struct for a dynamic array element type.
    fn generate_slice(&self, element: &TypeKind) -> String {
        let name = slice_name(element);
        let mut output = String::new();
        output.push_str(&format!("typedef struct {name} {{\n"));
        output.push_str(&format!("    {};\n", declare(&c_type(element), "*data")));
        output.push_str("    size_t len;\n");
        output.push_str(&format!("}} {name};\n\n"));
        output
    }

    /// Generates an enum as an integer typedef plus named constants.
    fn generate_enum(&self, enum_def: &ResolvedEnum) -> String {
        let name = c_identifier(&enum_def.name);
        let mut output = String::new();
        output.push_str(&format!(
            "typedef {} {name};\n",
            c_primitive(enum_def.encoding)
        ));
        output.push_str("enum {\n");
        let values: Vec<String> = enum_def
            .values
            .iter()
            .map(|v| format!("    {name}_{} = {}", v.name, v.value))
            .collect();
        output.push_str(&values.join(",\n"));
        output.push_str("\n};\n\n");
        output
    }

    fn generate_alias(&self, alias: &ResolvedAlias) -> String {
        format!(
            "typedef {};\n\n",
            declaration(&alias.target, &c_identifier(&alias.name))
        )
    }

    /// Generates a struct with inheritance already flattened.
    fn generate_struct(&self, packet: &ResolvedStruct) -> String {
        let name = c_identifier(&packet.name);
        let mut output = String::new();

        if let Some(instance) = &packet.instance_of {
            output.push_str(&format!(
                "/* {}<{}> */\n",
                instance.base,
                instance.args.join(", ")
            ));
        } else if let Some(parent) = &packet.parent {
            output.push_str(&format!("/* Extends {parent}. */\n"));
        }

        output.push_str(&format!("typedef struct {name} {{\n"));
        if packet.fields.is_empty() {
            // C forbids empty structs.
            output.push_str("    uint8_t packc_reserved;\n");
        }
        for field in &packet.fields {
            let mut line = declaration(&field.ty, &c_identifier(&field.name));
            if let Some(bits) = field.bit_size {
                line.push_str(&format!(" : {bits}"));
            }
            output.push_str(&format!("    {line};\n"));
        }
        output.push_str(&format!("}} {name};\n\n"));
        output
    }
}

/// Dynamic array types an item needs declared before it.
fn dynamic_types(item: &IrItem) -> Vec<&ResolvedType> {
    let is_dynamic = |ty: &&ResolvedType| matches!(ty.array, ArrayKind::Dynamic);
    match item {
        IrItem::Alias(a) => std::iter::once(&a.target).filter(is_dynamic).collect(),
        IrItem::Struct(s) => s.fields.iter().map(|f| &f.ty).filter(is_dynamic).collect(),
        IrItem::Enum(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use packc_schema::parse_source;

    fn header(source: &str) -> String {
        let program = parse_source(source).expect("Failed to parse");
        let ir = SchemaIr::from_program(&program).expect("Failed to build IR");
        let config = GeneratorConfig::default();
        HeaderGenerator::new(&ir, &config).generate()
    }

    #[test]
    fn test_header_skeleton() {
        let output = header("");
        assert!(output.starts_with("/* Generated by packc. Do not edit. */"));
        assert!(output.contains("#ifndef PACKETS_H\n#define PACKETS_H"));
        assert!(output.contains("#include <stdint.h>"));
        assert!(output.trim_end().ends_with("#endif /* PACKETS_H */"));
    }

    #[test]
    fn test_enum() {
        let output = header("enum Color : u16 { RED, GREEN }");
        assert!(output.contains("typedef uint16_t Color;"));
        assert!(output.contains("enum {\n    Color_RED = 0,\n    Color_GREEN = 1\n};"));
    }

    #[test]
    fn test_struct_fields() {
        let output = header(
            "packet Ping { id: u32 flags: u8 [bits: 3] payload: [4]u8 name: string tags: []string }",
        );
        let expected = "typedef struct Ping {\n    uint32_t id;\n    uint8_t flags : 3;\n    uint8_t payload[4];\n    char *name;\n    packc_slice_string tags;\n} Ping;";
        assert!(output.contains(expected), "{output}");
        assert!(output.contains("typedef struct packc_slice_string {\n    char **data;\n    size_t len;\n} packc_slice_string;"));
        assert!(output.contains("void Ping_init(Ping *value);"));
    }

    #[test]
    fn test_slice_emitted_once_before_use() {
        let output = header("packet A { x: []u8 } packet B { y: []u8 }");
        assert_eq!(output.matches("typedef struct packc_slice_u8 {").count(), 1);
        let slice = output.find("packc_slice_u8 {").expect("slice missing");
        let first_use = output.find("typedef struct A").expect("struct missing");
        assert!(slice < first_use);
    }

    #[test]
    fn test_aliases() {
        let output = header("type Bytes = [16]u8 type Id = u64 type Names = []string");
        assert!(output.contains("typedef uint8_t Bytes[16];"));
        assert!(output.contains("typedef uint64_t Id;"));
        assert!(output.contains("typedef packc_slice_string Names;"));
    }

    #[test]
    fn test_inherited_fields_flattened() {
        let output = header("packet Base { id: u8 } packet Child : Base { extra: u16 }");
        assert!(output.contains(
            "/* Extends Base. */\ntypedef struct Child {\n    uint8_t id;\n    uint16_t extra;\n} Child;"
        ));
    }

    #[test]
    fn test_generic_instantiation() {
        let output = header("packet Box<T> { value: T } packet P { b: Box<u32> }");
        assert!(output.contains("/* Box<u32> */\ntypedef struct Box_u32 {\n    uint32_t value;\n} Box_u32;"));
        assert!(output.contains("    Box_u32 b;"));
        assert!(!output.contains("typedef struct Box {"));
    }

    #[test]
    fn test_empty_packet_and_keywords() {
        let output = header("packet Empty {} packet K { default: u8 }");
        assert!(output.contains("typedef struct Empty {\n    uint8_t packc_reserved;\n} Empty;"));
        assert!(output.contains("    uint8_t default_;"));
    }

    #[test]
    fn test_header_guard_override() {
        let program = parse_source("packet P {}").expect("Failed to parse");
        let ir = SchemaIr::from_program(&program).expect("Failed to build IR");
        let config = GeneratorConfig::new().header_guard("WIRE_H").banner(false);
        let output = HeaderGenerator::new(&ir, &config).generate();
        assert!(output.starts_with("#ifndef WIRE_H"));
    }
}
