use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle of a package inside a [`CodeGraph`](crate::graph::CodeGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PackageId(pub usize);

/// Handle of a class or interface. Stable for the lifetime of the graph and
/// used as the key of every node-level metric store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeId(pub usize);

/// Handle of a method owned by a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MethodId(pub usize);

/// Handle of a free-standing function owned by a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FunctionId(pub usize);

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "package#{}", self.0)
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type#{}", self.0)
    }
}

/// Build the registry key of a type: "package::Name".
pub fn qualify(package: &str, name: &str) -> String {
    format!("{package}::{name}")
}

/// Variant of a type declaration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    #[default]
    Class,
    Interface,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKind::Class => write!(f, "class"),
            TypeKind::Interface => write!(f, "interface"),
        }
    }
}

/// Reference from a type to a parent class or interface.
///
/// Never owning: a resolved reference is a handle into the graph's arena, an
/// unresolved one keeps the name as written in the source (external library,
/// missing file, typo).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeRef {
    Resolved(TypeId),
    Unresolved(String),
}

impl TypeRef {
    pub fn resolved(&self) -> Option<TypeId> {
        match self {
            TypeRef::Resolved(id) => Some(*id),
            TypeRef::Unresolved(_) => None,
        }
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, TypeRef::Unresolved(_))
    }
}

/// A named namespace owning an ordered, de-duplicated set of types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub(crate) id: PackageId,
    pub(crate) name: String,
    pub(crate) types: Vec<TypeId>,
    pub(crate) functions: Vec<FunctionId>,
}

impl Package {
    pub fn id(&self) -> PackageId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Types in insertion order.
    pub fn types(&self) -> &[TypeId] {
        &self.types
    }

    pub fn functions(&self) -> &[FunctionId] {
        &self.functions
    }
}

/// A class or interface declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeNode {
    pub(crate) id: TypeId,
    pub(crate) name: String,
    pub(crate) qualified_name: String,
    pub(crate) kind: TypeKind,
    pub(crate) package: PackageId,
    pub(crate) parent: Option<TypeRef>,
    pub(crate) interfaces: Vec<TypeRef>,
    pub(crate) methods: Vec<MethodId>,
}

impl TypeNode {
    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn package(&self) -> PackageId {
        self.package
    }

    pub fn is_class(&self) -> bool {
        self.kind == TypeKind::Class
    }

    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    /// The single parent class. Always `None` for interfaces.
    pub fn parent_class(&self) -> Option<&TypeRef> {
        self.parent.as_ref()
    }

    pub fn has_parent_class(&self) -> bool {
        self.parent.is_some()
    }

    /// Interfaces implemented by a class, or extended by an interface.
    pub fn implemented_interfaces(&self) -> &[TypeRef] {
        &self.interfaces
    }

    pub fn methods(&self) -> &[MethodId] {
        &self.methods
    }
}

/// A method declared on a type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Method {
    pub(crate) id: MethodId,
    pub(crate) name: String,
    pub(crate) owner: TypeId,
    pub(crate) is_abstract: bool,
}

impl Method {
    pub fn id(&self) -> MethodId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> TypeId {
        self.owner
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }
}

/// A free-standing function declared in a package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    pub(crate) id: FunctionId,
    pub(crate) name: String,
    pub(crate) package: PackageId,
}

impl Function {
    pub fn id(&self) -> FunctionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn package(&self) -> PackageId {
        self.package
    }
}
