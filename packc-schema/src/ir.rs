//! Intermediate representation for code generation.
//!
//! This module provides a flattened, resolved representation of a program
//! that backends can render without looking at the declaration tree:
//! inheritance is flattened, generic packets are instantiated and every
//! item appears after the items it depends on.

use crate::error::{Result, SchemaError};
use crate::types::{
    ArrayKind, DataType, Declaration, DefaultValue, EnumDef, Packet, Position, Primitive, Program,
    TypeAlias,
};
use std::collections::{HashMap, HashSet};

/// Intermediate representation of a program for code generation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaIr {
    /// Items in dependency order.
    pub items: Vec<IrItem>,
}

/// One emitted definition.
#[derive(Debug, Clone, PartialEq)]
pub enum IrItem {
    /// Enumeration.
    Enum(ResolvedEnum),
    /// Type alias.
    Alias(ResolvedAlias),
    /// Concrete struct, either a packet or a generic instantiation.
    Struct(ResolvedStruct),
}

impl IrItem {
    /// Returns the item name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Enum(e) => &e.name,
            Self::Alias(a) => &a.name,
            Self::Struct(s) => &s.name,
        }
    }
}

/// Resolved enum with its integer encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEnum {
    /// Enum name.
    pub name: String,
    /// Integer primitive the enum is encoded as.
    pub encoding: Primitive,
    /// Values with their discriminants.
    pub values: Vec<EnumValue>,
}

/// Enum member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    /// Member name.
    pub name: String,
    /// Discriminant (declaration index).
    pub value: u64,
}

/// Resolved type alias.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAlias {
    /// Alias name.
    pub name: String,
    /// Aliased type.
    pub target: ResolvedType,
}

/// What a type reference names once generics are substituted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Built-in primitive.
    Primitive(Primitive),
    /// User enum.
    Enum(String),
    /// User alias.
    Alias(String),
    /// Concrete struct (packet or instantiation).
    Struct(String),
}

impl TypeKind {
    /// Returns the schema-level name of the type.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Primitive(p) => p.keyword(),
            Self::Enum(n) | Self::Alias(n) | Self::Struct(n) => n,
        }
    }
}

/// Resolved field or alias type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedType {
    /// Element type.
    pub kind: TypeKind,
    /// Array dimension.
    pub array: ArrayKind,
}

impl ResolvedType {
    /// Creates a scalar type.
    #[must_use]
    pub const fn scalar(kind: TypeKind) -> Self {
        Self {
            kind,
            array: ArrayKind::Scalar,
        }
    }

    /// Returns true if this type has an array dimension.
    #[must_use]
    pub const fn is_array(&self) -> bool {
        !matches!(self.array, ArrayKind::Scalar)
    }
}

/// Generic packet an instantiation was produced from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericInstance {
    /// Generic packet name.
    pub base: String,
    /// Argument type names.
    pub args: Vec<String>,
}

/// Concrete struct with inheritance flattened.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStruct {
    /// Struct name.
    pub name: String,
    /// Direct parent packet.
    pub parent: Option<String>,
    /// Set for generic instantiations.
    pub instance_of: Option<GenericInstance>,
    /// Ancestor fields first, then own fields.
    pub fields: Vec<ResolvedField>,
}

/// Field with its resolved type.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField {
    /// Field name.
    pub name: String,
    /// Resolved type.
    pub ty: ResolvedType,
    /// Default value.
    pub default: Option<DefaultValue>,
    /// Packing width in bits.
    pub bit_size: Option<u32>,
    /// Packet that declared the field.
    pub origin: String,
}

impl SchemaIr {
    /// Creates an intermediate representation from a validated program.
    ///
    /// # Errors
    /// Returns `NameCollision` if an instantiation name clashes with a user
    /// type or another instantiation, and a parse error for references
    /// that cannot be resolved.
    pub fn from_program(program: &Program) -> Result<Self> {
        let mut lowering = Lowering::new(program);
        for decl in program.flatten() {
            match decl {
                Declaration::Enum(e) => {
                    let resolved = lowering.lower_enum(e)?;
                    lowering.items.push(IrItem::Enum(resolved));
                }
                Declaration::TypeAlias(a) => {
                    let target = lowering.lower_type(&a.aliased, &[], &Subst::new(), a.position)?;
                    lowering.items.push(IrItem::Alias(ResolvedAlias {
                        name: a.name.clone(),
                        target,
                    }));
                }
                Declaration::Packet(p) if !p.is_generic() => {
                    let resolved = lowering.lower_struct(&p.name, p, &Subst::new(), None)?;
                    lowering.items.push(IrItem::Struct(resolved));
                }
                Declaration::Packet(_) | Declaration::Import(_) => {}
            }
        }
        tracing::debug!(
            items = lowering.items.len(),
            instances = lowering.instances.len(),
            "intermediate representation built"
        );
        Ok(Self {
            items: lowering.items,
        })
    }

    /// Iterates over structs in emission order.
    pub fn structs(&self) -> impl Iterator<Item = &ResolvedStruct> {
        self.items.iter().filter_map(|i| match i {
            IrItem::Struct(s) => Some(s),
            _ => None,
        })
    }

    /// Iterates over enums in emission order.
    pub fn enums(&self) -> impl Iterator<Item = &ResolvedEnum> {
        self.items.iter().filter_map(|i| match i {
            IrItem::Enum(e) => Some(e),
            _ => None,
        })
    }

    /// Gets a struct by name.
    #[must_use]
    pub fn get_struct(&self, name: &str) -> Option<&ResolvedStruct> {
        self.structs().find(|s| s.name == name)
    }

    /// Gets an enum by name.
    #[must_use]
    pub fn get_enum(&self, name: &str) -> Option<&ResolvedEnum> {
        self.enums().find(|e| e.name == name)
    }

    /// Gets an alias by name.
    #[must_use]
    pub fn get_alias(&self, name: &str) -> Option<&ResolvedAlias> {
        self.items.iter().find_map(|i| match i {
            IrItem::Alias(a) if a.name == name => Some(a),
            _ => None,
        })
    }

    /// Follows aliases from `kind` to the type it finally names.
    ///
    /// Returns the final kind and whether any alias on the way carried an
    /// array dimension.
    #[must_use]
    pub fn resolve_kind<'a>(&'a self, kind: &'a TypeKind) -> (&'a TypeKind, bool) {
        let mut current = kind;
        let mut is_array = false;
        for _ in 0..=self.items.len() {
            let TypeKind::Alias(name) = current else {
                break;
            };
            let Some(alias) = self.get_alias(name) else {
                break;
            };
            is_array |= alias.target.is_array();
            current = &alias.target.kind;
        }
        (current, is_array)
    }

    /// Follows scalar aliases from `ty` until it reaches an array, a
    /// non-alias type or an alias carrying an array dimension, which is
    /// unwrapped once.
    ///
    /// The result is the storage shape of a field declared with `ty`.
    #[must_use]
    pub fn storage_type<'a>(&'a self, ty: &'a ResolvedType) -> &'a ResolvedType {
        let mut current = ty;
        for _ in 0..=self.items.len() {
            if current.is_array() {
                break;
            }
            let TypeKind::Alias(name) = &current.kind else {
                break;
            };
            let Some(alias) = self.get_alias(name) else {
                break;
            };
            current = &alias.target;
        }
        current
    }
}

/// Generic parameter bindings of the packet being lowered.
type Subst = HashMap<String, DataType>;

struct Lowering<'a> {
    packets: HashMap<&'a str, &'a Packet>,
    enums: HashMap<&'a str, &'a EnumDef>,
    aliases: HashMap<&'a str, &'a TypeAlias>,
    user_names: HashSet<&'a str>,
    instances: HashMap<String, Vec<String>>,
    items: Vec<IrItem>,
}

impl<'a> Lowering<'a> {
    fn new(program: &'a Program) -> Self {
        let mut lowering = Self {
            packets: HashMap::new(),
            enums: HashMap::new(),
            aliases: HashMap::new(),
            user_names: HashSet::new(),
            instances: HashMap::new(),
            items: Vec::new(),
        };
        for decl in program.flatten() {
            match decl {
                Declaration::Packet(p) => {
                    lowering.packets.entry(p.name.as_str()).or_insert(p);
                }
                Declaration::Enum(e) => {
                    lowering.enums.entry(e.name.as_str()).or_insert(e);
                }
                Declaration::TypeAlias(a) => {
                    lowering.aliases.entry(a.name.as_str()).or_insert(a);
                }
                Declaration::Import(_) => continue,
            }
            lowering.user_names.insert(decl.name());
        }
        lowering
    }

    fn lower_enum(&self, enum_def: &EnumDef) -> Result<ResolvedEnum> {
        let mut current = enum_def.underlying.as_str();
        let mut encoding = None;
        for _ in 0..=(self.enums.len() + self.aliases.len()) {
            if let Some(p) = Primitive::from_keyword(current) {
                encoding = Some(p).filter(Primitive::is_integer);
                break;
            }
            if let Some(e) = self.enums.get(current) {
                current = &e.underlying;
            } else if let Some(a) = self.aliases.get(current).filter(|a| !a.aliased.is_array()) {
                current = &a.aliased.name;
            } else {
                break;
            }
        }

        let Some(encoding) = encoding else {
            return Err(SchemaError::parse(
                format!("Invalid enum type: {}", enum_def.underlying),
                enum_def.position.line,
                enum_def.position.column,
            ));
        };
        let max_value = encoding.integer_range().map_or(0, |(_, max)| max);
        if i128::try_from(enum_def.values.len()).unwrap_or(i128::MAX) > max_value + 1 {
            return Err(SchemaError::parse(
                format!(
                    "Enum '{}' has more values than {encoding} can hold",
                    enum_def.name
                ),
                enum_def.position.line,
                enum_def.position.column,
            ));
        }

        Ok(ResolvedEnum {
            name: enum_def.name.clone(),
            encoding,
            values: enum_def
                .values
                .iter()
                .zip(0u64..)
                .map(|(name, value)| EnumValue {
                    name: name.clone(),
                    value,
                })
                .collect(),
        })
    }

    fn lower_struct(
        &mut self,
        name: &str,
        packet: &'a Packet,
        subst: &Subst,
        instance_of: Option<GenericInstance>,
    ) -> Result<ResolvedStruct> {
        let mut chain = vec![packet];
        let mut seen = HashSet::from([packet.name.as_str()]);
        let mut parent = packet.parent.as_deref();
        while let Some(parent_name) = parent {
            let Some(ancestor) = self.packets.get(parent_name).copied() else {
                return Err(undefined(parent_name, packet.position));
            };
            if !seen.insert(parent_name) {
                return Err(SchemaError::CyclicInheritance {
                    path: format!("{} -> {parent_name}", packet.name),
                });
            }
            chain.push(ancestor);
            parent = ancestor.parent.as_deref();
        }

        let mut fields = Vec::new();
        for declaring in chain.into_iter().rev() {
            let bindings = if std::ptr::eq(declaring, packet) {
                subst.clone()
            } else {
                Subst::new()
            };
            for field in &declaring.fields {
                let ty =
                    self.lower_type(&field.data_type, &field.generic_args, &bindings, field.position)?;
                fields.push(ResolvedField {
                    name: field.name.clone(),
                    ty,
                    default: field.default_value.clone(),
                    bit_size: field.bit_size,
                    origin: declaring.name.clone(),
                });
            }
        }

        Ok(ResolvedStruct {
            name: name.to_string(),
            parent: packet.parent.clone(),
            instance_of,
            fields,
        })
    }

    fn lower_type(
        &mut self,
        data_type: &DataType,
        args: &[DataType],
        subst: &Subst,
        position: Position,
    ) -> Result<ResolvedType> {
        if let Some(bound) = subst.get(&data_type.name) {
            let inner = self.lower_type(bound, &[], &Subst::new(), position)?;
            return Ok(ResolvedType {
                kind: inner.kind,
                array: data_type.array,
            });
        }

        let name = data_type.name.as_str();
        let kind = if let Some(p) = Primitive::from_keyword(name) {
            TypeKind::Primitive(p)
        } else if self.enums.contains_key(name) {
            TypeKind::Enum(name.to_string())
        } else if self.aliases.contains_key(name) {
            TypeKind::Alias(name.to_string())
        } else if let Some(packet) = self.packets.get(name).copied() {
            if packet.is_generic() {
                let concrete: Vec<DataType> = args
                    .iter()
                    .map(|a| subst.get(&a.name).cloned().unwrap_or_else(|| a.clone()))
                    .collect();
                TypeKind::Struct(self.instantiate(packet, &concrete, position)?)
            } else {
                TypeKind::Struct(name.to_string())
            }
        } else {
            return Err(undefined(name, position));
        };

        Ok(ResolvedType {
            kind,
            array: data_type.array,
        })
    }

    /// Emits the instantiation of `packet` with `args` unless it exists,
    /// returning its name.
    fn instantiate(
        &mut self,
        packet: &'a Packet,
        args: &[DataType],
        position: Position,
    ) -> Result<String> {
        if args.len() != packet.generic_params.len() {
            return Err(SchemaError::parse(
                format!(
                    "Generic packet '{}' expects {} generic argument(s), got {}",
                    packet.name,
                    packet.generic_params.len(),
                    args.len()
                ),
                position.line,
                position.column,
            ));
        }

        let arg_names: Vec<String> = args.iter().map(|a| a.name.clone()).collect();
        let name = format!("{}_{}", packet.name, arg_names.join("_"));
        if let Some(existing) = self.instances.get(&name) {
            if *existing == arg_names {
                return Ok(name);
            }
            return Err(SchemaError::NameCollision { name });
        }
        if self.user_names.contains(name.as_str()) {
            return Err(SchemaError::NameCollision { name });
        }
        self.instances.insert(name.clone(), arg_names.clone());
        tracing::debug!(%name, base = %packet.name, "instantiating generic packet");

        let subst: Subst = packet
            .generic_params
            .iter()
            .cloned()
            .zip(args.iter().cloned())
            .collect();
        let instance = GenericInstance {
            base: packet.name.clone(),
            args: arg_names,
        };
        let resolved = self.lower_struct(&name, packet, &subst, Some(instance))?;
        self.items.push(IrItem::Struct(resolved));
        Ok(name)
    }
}

fn undefined(name: &str, position: Position) -> SchemaError {
    SchemaError::parse(
        format!("Undefined type '{name}'"),
        position.line,
        position.column,
    )
}
