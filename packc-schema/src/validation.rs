//! Whole-program validation.
//!
//! Runs once after every file has been parsed and merged. Checks that need
//! only local context (undefined types, field uniqueness) happen in the
//! parser instead.

use crate::error::SchemaError;
use crate::types::{Packet, Program};
use std::collections::HashMap;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    OnPath,
    Done,
}

/// Validates a merged program.
///
/// # Arguments
/// * `program` - The program to validate, imports included
///
/// # Returns
/// Ok(()) if valid, or SchemaError describing the issue.
///
/// # Errors
/// Returns `DuplicateDefinition` if two packets share a name, or
/// `CyclicInheritance` if a packet is its own ancestor.
pub fn validate_program(program: &Program) -> Result<(), SchemaError> {
    let packets = program.packets();
    let by_name = index_packets(&packets)?;
    check_cyclic_inheritance(&packets, &by_name)?;
    tracing::debug!(packets = packets.len(), "program validated");
    Ok(())
}

fn index_packets<'a>(packets: &[&'a Packet]) -> Result<HashMap<&'a str, &'a Packet>, SchemaError> {
    let mut by_name = HashMap::with_capacity(packets.len());
    for packet in packets {
        if by_name.insert(packet.name.as_str(), *packet).is_some() {
            return Err(SchemaError::duplicate("packet", packet.name.clone()));
        }
    }
    Ok(by_name)
}

/// Walks `child -> parent` edges from every packet, keeping the current
/// path on an explicit stack.
fn check_cyclic_inheritance(
    packets: &[&Packet],
    by_name: &HashMap<&str, &Packet>,
) -> Result<(), SchemaError> {
    let mut visits: HashMap<&str, Visit> = HashMap::new();

    for packet in packets {
        let mut path: Vec<&str> = Vec::new();
        let mut current = Some(packet.name.as_str());

        while let Some(name) = current {
            match visits.get(name) {
                Some(Visit::Done) => break,
                Some(Visit::OnPath) => {
                    let mut chain = path.clone();
                    chain.push(name);
                    let path = chain.join(" -> ");
                    tracing::debug!(%path, "inheritance cycle found");
                    return Err(SchemaError::CyclicInheritance { path });
                }
                None => {
                    visits.insert(name, Visit::OnPath);
                    path.push(name);
                    current = by_name.get(name).and_then(|p| p.parent.as_deref());
                }
            }
        }

        for name in path {
            visits.insert(name, Visit::Done);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Declaration, Import};

    fn packet(name: &str, parent: Option<&str>) -> Declaration {
        let mut packet = Packet::new(name);
        packet.parent = parent.map(str::to_string);
        Declaration::Packet(packet)
    }

    #[test]
    fn test_valid_chain() {
        let program = Program::new(vec![
            packet("A", None),
            packet("B", Some("A")),
            packet("C", Some("B")),
            packet("D", Some("A")),
        ]);
        validate_program(&program).expect("Failed to validate");
    }

    #[test]
    fn test_two_node_cycle() {
        let program = Program::new(vec![packet("A", Some("B")), packet("B", Some("A"))]);
        match validate_program(&program) {
            Err(SchemaError::CyclicInheritance { path }) => assert_eq!(path, "A -> B -> A"),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_self_cycle() {
        let program = Program::new(vec![packet("A", Some("A"))]);
        match validate_program(&program) {
            Err(SchemaError::CyclicInheritance { path }) => assert_eq!(path, "A -> A"),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_cycle_reached_through_tail() {
        let program = Program::new(vec![
            packet("Leaf", Some("X")),
            packet("X", Some("Y")),
            packet("Y", Some("X")),
        ]);
        match validate_program(&program) {
            Err(SchemaError::CyclicInheritance { path }) => {
                assert_eq!(path, "Leaf -> X -> Y -> X");
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_cycle_across_import() {
        let program = Program::new(vec![
            Declaration::Import(Import {
                path: "base.pkt".to_string(),
                declarations: vec![packet("A", Some("B"))],
            }),
            packet("B", Some("A")),
        ]);
        assert!(matches!(
            validate_program(&program),
            Err(SchemaError::CyclicInheritance { .. })
        ));
    }

    #[test]
    fn test_duplicate_packet_names() {
        let program = Program::new(vec![packet("A", None), packet("A", None)]);
        assert!(matches!(
            validate_program(&program),
            Err(SchemaError::DuplicateDefinition { .. })
        ));
    }

    #[test]
    fn test_unknown_parent_is_ignored() {
        let program = Program::new(vec![packet("A", Some("Missing"))]);
        validate_program(&program).expect("Failed to validate");
    }
}
