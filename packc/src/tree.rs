//! Declaration tree printing for the `ast` subcommand.

use packc_schema::{Declaration, DefaultValue, Field, Packet, Program};
use std::fmt::Write;

const INDENT: &str = "  ";

/// Renders a program as an indented declaration tree.
///
/// Imported declarations are nested under the import that brought them in.
/// Re-imports of an already merged file show no children.
#[must_use]
pub fn render_tree(program: &Program) -> String {
    let mut output = String::new();
    for declaration in &program.declarations {
        render_declaration(&mut output, declaration, 0);
    }
    output
}

fn render_declaration(output: &mut String, declaration: &Declaration, depth: usize) {
    let pad = INDENT.repeat(depth);
    match declaration {
        Declaration::Import(import) => {
            let _ = writeln!(output, "{pad}import \"{}\"", import.path);
            for nested in &import.declarations {
                render_declaration(output, nested, depth + 1);
            }
        }
        Declaration::TypeAlias(alias) => {
            let _ = writeln!(output, "{pad}type {} = {}", alias.name, alias.aliased);
        }
        Declaration::Enum(enum_def) => {
            let _ = writeln!(
                output,
                "{pad}enum {} : {} {{ {} }}",
                enum_def.name,
                enum_def.underlying,
                enum_def.values.join(", ")
            );
        }
        Declaration::Packet(packet) => render_packet(output, packet, depth),
    }
}

fn render_packet(output: &mut String, packet: &Packet, depth: usize) {
    let pad = INDENT.repeat(depth);
    let _ = write!(output, "{pad}packet {}", packet.name);
    if packet.is_generic() {
        let _ = write!(output, "<{}>", packet.generic_params.join(", "));
    }
    if let Some(parent) = &packet.parent {
        let _ = write!(output, " : {parent}");
    }
    output.push('\n');
    for field in &packet.fields {
        let _ = writeln!(output, "{pad}{INDENT}{}", render_field(field));
    }
}

fn render_field(field: &Field) -> String {
    let mut line = format!("{}: {}", field.name, field.data_type);
    if !field.generic_args.is_empty() {
        let args: Vec<String> = field.generic_args.iter().map(ToString::to_string).collect();
        let _ = write!(line, "<{}>", args.join(", "));
    }
    if let Some(value) = &field.default_value {
        let _ = write!(line, " = {}", render_value(value));
    }
    if let Some(bits) = field.bit_size {
        let _ = write!(line, " [bits: {bits}]");
    }
    line
}

fn render_value(value: &DefaultValue) -> String {
    match value {
        DefaultValue::Integer(v) => v.to_string(),
        DefaultValue::Float(v) => format!("{v:?}"),
        DefaultValue::Bool(v) => v.to_string(),
        DefaultValue::Str(s) => format!("\"{s}\""),
        DefaultValue::EnumMember(member) => member.clone(),
        DefaultValue::Packet(fields) => {
            let entries: Vec<String> = fields
                .iter()
                .map(|(name, value)| format!("{name}: {}", render_value(value)))
                .collect();
            format!("{{ {} }}", entries.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use packc_schema::{MemoryLoader, parse_source};

    #[test]
    fn test_render_declarations() {
        let program = parse_source(
            r#"
            type Id = u64
            enum Mode : u8 { OFF, ON }
            packet Point { x: i32 = -1 y: i32 }
            packet Box<T> { items: []T }
            packet Shape : Point {
                origin: Point = { x: 1, y: 2 }
                boxed: Box<u32>
                mode: Mode = ON
                flags: u8 [bits: 3]
                ratio: f32 = 0.5
            }
            "#,
        )
        .expect("Failed to parse");

        let tree = render_tree(&program);
        let expected = "\
type Id = u64
enum Mode : u8 { OFF, ON }
packet Point
  x: i32 = -1
  y: i32
packet Box<T>
  items: []T
packet Shape : Point
  origin: Point = { x: 1, y: 2 }
  boxed: Box<u32>
  mode: Mode = ON
  flags: u8 [bits: 3]
  ratio: f32 = 0.5
";
        assert_eq!(tree, expected);
    }

    #[test]
    fn test_render_imports_nested() {
        let loader = MemoryLoader::new()
            .with_file("/schemas/common.pkt", "type Id = u64")
            .with_file(
                "/schemas/main.pkt",
                "import \"common.pkt\"\nimport \"common.pkt\"\npacket Login { id: Id }",
            );
        let compilation = packc_schema::Compiler::new(loader)
            .compile("/schemas/main.pkt")
            .expect("Failed to compile");

        let tree = render_tree(&compilation.program);
        assert_eq!(
            tree,
            "import \"common.pkt\"\n  type Id = u64\nimport \"common.pkt\"\npacket Login\n  id: Id\n"
        );
    }
}
