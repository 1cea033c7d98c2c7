//! Symbol tables threaded through the parser.
//!
//! A [`SymbolTable`] is the explicit analysis context for one file: the
//! packets, enums and aliases visible at the current point of the parse,
//! plus the generic parameters of the packet being parsed. Tables of
//! imported files are merged in as read-only copies.

use crate::error::SchemaError;
use crate::types::{ArrayKind, DataType, EnumDef, Field, Packet, Primitive, TypeAlias};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::PathBuf;

/// A definition together with the file that declared it.
#[derive(Debug, Clone)]
struct Defined<T> {
    def: T,
    origin: PathBuf,
}

/// What a data type name ultimately denotes.
#[derive(Debug, Clone, Copy)]
pub enum TypeTarget<'a> {
    /// Built-in primitive.
    Primitive(Primitive),
    /// User enum.
    Enum(&'a EnumDef),
    /// User packet.
    Packet(&'a Packet),
    /// Generic parameter of the packet being parsed.
    GenericParam,
}

/// Result of resolving a data type through its alias chain.
#[derive(Debug, Clone, Copy)]
pub struct Resolution<'a> {
    /// Final target.
    pub target: TypeTarget<'a>,
    /// True if any hop carried an array dimension.
    pub is_array: bool,
}

/// Symbols visible while parsing one file.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    origin: PathBuf,
    packets: BTreeMap<String, Defined<Packet>>,
    types: BTreeSet<String>,
    enums: BTreeMap<String, Defined<EnumDef>>,
    aliases: BTreeMap<String, Defined<TypeAlias>>,
    generic_params: Vec<String>,
}

impl SymbolTable {
    /// Creates a table holding only the primitives.
    pub fn new(origin: impl Into<PathBuf>) -> Self {
        Self {
            origin: origin.into(),
            packets: BTreeMap::new(),
            types: Primitive::ALL
                .iter()
                .map(|p| p.keyword().to_string())
                .collect(),
            enums: BTreeMap::new(),
            aliases: BTreeMap::new(),
            generic_params: Vec::new(),
        }
    }

    /// Returns true if `name` can be used as a field type here.
    #[must_use]
    pub fn is_type(&self, name: &str) -> bool {
        self.types.contains(name) || self.packets.contains_key(name) || self.is_generic_param(name)
    }

    /// Returns true if `name` is already taken by a primitive or user type.
    #[must_use]
    pub fn is_declared(&self, name: &str) -> bool {
        self.types.contains(name) || self.packets.contains_key(name)
    }

    /// Returns true if `name` is a generic parameter in scope.
    #[must_use]
    pub fn is_generic_param(&self, name: &str) -> bool {
        self.generic_params.iter().any(|p| p == name)
    }

    /// Looks up a packet.
    #[must_use]
    pub fn packet(&self, name: &str) -> Option<&Packet> {
        self.packets.get(name).map(|d| &d.def)
    }

    /// Looks up an enum.
    #[must_use]
    pub fn enum_def(&self, name: &str) -> Option<&EnumDef> {
        self.enums.get(name).map(|d| &d.def)
    }

    /// Looks up an alias.
    #[must_use]
    pub fn alias(&self, name: &str) -> Option<&TypeAlias> {
        self.aliases.get(name).map(|d| &d.def)
    }

    /// Registers a packet.
    pub fn define_packet(&mut self, packet: Packet) {
        let origin = self.origin.clone();
        self.packets
            .insert(packet.name.clone(), Defined { def: packet, origin });
    }

    /// Registers an enum and its type name.
    pub fn define_enum(&mut self, enum_def: EnumDef) {
        let origin = self.origin.clone();
        self.types.insert(enum_def.name.clone());
        self.enums
            .insert(enum_def.name.clone(), Defined { def: enum_def, origin });
    }

    /// Registers an alias and its type name.
    pub fn define_alias(&mut self, alias: TypeAlias) {
        let origin = self.origin.clone();
        self.types.insert(alias.name.clone());
        self.aliases
            .insert(alias.name.clone(), Defined { def: alias, origin });
    }

    /// Opens the generic parameter scope of a packet.
    pub fn enter_generic_scope(&mut self, params: &[String]) {
        self.generic_params = params.to_vec();
    }

    /// Closes the generic parameter scope.
    pub fn exit_generic_scope(&mut self) {
        self.generic_params.clear();
    }

    /// Resolves a data type through aliases to its final target.
    ///
    /// # Errors
    /// Returns a message if a name is undefined or the alias chain is cyclic.
    pub fn resolve(&self, data_type: &DataType) -> Result<Resolution<'_>, String> {
        let mut name = data_type.name.as_str();
        let mut is_array = data_type.is_array();
        let mut seen = HashSet::new();

        loop {
            if self.is_generic_param(name) {
                return Ok(Resolution {
                    target: TypeTarget::GenericParam,
                    is_array,
                });
            }
            if let Some(primitive) = Primitive::from_keyword(name) {
                return Ok(Resolution {
                    target: TypeTarget::Primitive(primitive),
                    is_array,
                });
            }
            if let Some(enum_def) = self.enum_def(name) {
                return Ok(Resolution {
                    target: TypeTarget::Enum(enum_def),
                    is_array,
                });
            }
            if let Some(packet) = self.packet(name) {
                return Ok(Resolution {
                    target: TypeTarget::Packet(packet),
                    is_array,
                });
            }
            let Some(alias) = self.alias(name) else {
                return Err(format!("Undefined type '{name}'"));
            };
            if !seen.insert(name) {
                return Err(format!("Cyclic type alias involving '{name}'"));
            }
            is_array |= alias.aliased.array != ArrayKind::Scalar;
            name = &alias.aliased.name;
        }
    }

    /// Resolves a type name to the integer primitive it is encoded as,
    /// following aliases and enum underlying types. Arrays never qualify.
    #[must_use]
    pub fn integer_primitive(&self, name: &str) -> Option<Primitive> {
        let mut current = name;
        let mut seen = HashSet::new();
        loop {
            if !seen.insert(current) {
                return None;
            }
            let resolution = self.resolve(&DataType::named(current)).ok()?;
            if resolution.is_array {
                return None;
            }
            match resolution.target {
                TypeTarget::Primitive(p) if p.is_integer() => return Some(p),
                TypeTarget::Enum(e) => current = &e.underlying,
                _ => return None,
            }
        }
    }

    /// Returns every field of `packet_name` and its ancestors, root first.
    #[must_use]
    pub fn effective_fields(&self, packet_name: &str) -> Vec<&Field> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = self.packet(packet_name);
        while let Some(packet) = current {
            if !seen.insert(packet.name.as_str()) {
                break;
            }
            chain.push(packet);
            current = packet.parent.as_deref().and_then(|p| self.packet(p));
        }
        chain
            .into_iter()
            .rev()
            .flat_map(|p| p.fields.iter())
            .collect()
    }

    /// Merges another file's exported symbols into this scope.
    ///
    /// Entries that came from the same origin are skipped, so merging the
    /// same file twice is a no-op.
    ///
    /// # Errors
    /// Returns `DuplicateDefinition` if a name is bound to two different
    /// declarations.
    pub fn merge(&mut self, other: &SymbolTable) -> Result<(), SchemaError> {
        merge_map(&mut self.packets, &other.packets, "packet")?;
        merge_map(&mut self.enums, &other.enums, "enum")?;
        merge_map(&mut self.aliases, &other.aliases, "alias")?;

        for name in &other.types {
            self.types.insert(name.clone());
        }
        for name in self.packets.keys() {
            if self.enums.contains_key(name) || self.aliases.contains_key(name) {
                return Err(SchemaError::duplicate("type", name.clone()));
            }
        }
        for name in self.enums.keys() {
            if self.aliases.contains_key(name) {
                return Err(SchemaError::duplicate("type", name.clone()));
            }
        }
        Ok(())
    }
}

fn merge_map<T: Clone>(
    into: &mut BTreeMap<String, Defined<T>>,
    from: &BTreeMap<String, Defined<T>>,
    kind: &str,
) -> Result<(), SchemaError> {
    for (name, defined) in from {
        match into.get(name) {
            Some(existing) if existing.origin == defined.origin => {}
            Some(_) => return Err(SchemaError::duplicate(kind, name.clone())),
            None => {
                into.insert(name.clone(), defined.clone());
            }
        }
    }
    Ok(())
}
