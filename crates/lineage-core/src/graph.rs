use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::types::{
    qualify, Function, FunctionId, Method, MethodId, Package, PackageId, TypeId, TypeKind,
    TypeNode, TypeRef,
};

/// Arena-owned registry of packages, types, methods and functions.
///
/// Every relation between types is stored as a [`TypeRef`] handle, so the
/// graph never owns a cycle even when the input describes one. Analyzers only
/// get shared references; the graph is read-only for the whole analysis.
#[derive(Debug, Clone, Default)]
pub struct CodeGraph {
    packages: Vec<Package>,
    types: Vec<TypeNode>,
    methods: Vec<Method>,
    functions: Vec<Function>,
    package_index: HashMap<String, PackageId>,
    type_index: HashMap<String, TypeId>,
}

impl CodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a package. Returns the existing id if the name is already known.
    pub fn add_package(&mut self, name: &str) -> PackageId {
        if let Some(&id) = self.package_index.get(name) {
            return id;
        }
        let id = PackageId(self.packages.len());
        self.packages.push(Package {
            id,
            name: name.to_string(),
            types: Vec::new(),
            functions: Vec::new(),
        });
        self.package_index.insert(name.to_string(), id);
        id
    }

    /// Add a class or interface to a package.
    ///
    /// Re-adding the same name with the same kind returns the existing id and
    /// keeps its original position in the package.
    pub fn add_type(
        &mut self,
        package: PackageId,
        name: &str,
        kind: TypeKind,
    ) -> Result<TypeId, ModelError> {
        let package_name = self.package_ref(package)?.name.clone();
        let qualified_name = qualify(&package_name, name);

        if let Some(&existing) = self.type_index.get(&qualified_name) {
            let existing_kind = self.types[existing.0].kind;
            if existing_kind != kind {
                return Err(ModelError::KindMismatch {
                    name: qualified_name,
                    existing: existing_kind,
                    requested: kind,
                });
            }
            return Ok(existing);
        }

        let id = TypeId(self.types.len());
        self.types.push(TypeNode {
            id,
            name: name.to_string(),
            qualified_name: qualified_name.clone(),
            kind,
            package,
            parent: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
        });
        self.type_index.insert(qualified_name, id);
        self.packages[package.0].types.push(id);
        Ok(id)
    }

    pub fn add_class(&mut self, package: PackageId, name: &str) -> Result<TypeId, ModelError> {
        self.add_type(package, name, TypeKind::Class)
    }

    pub fn add_interface(&mut self, package: PackageId, name: &str) -> Result<TypeId, ModelError> {
        self.add_type(package, name, TypeKind::Interface)
    }

    /// Set the single parent class of a class.
    ///
    /// Cycles are not rejected here: malformed input is representable and the
    /// analyzers guard their walks instead.
    pub fn set_parent_class(&mut self, child: TypeId, parent: TypeRef) -> Result<(), ModelError> {
        let child_node = self.type_ref(child)?;
        if !child_node.is_class() {
            return Err(ModelError::InvalidParent {
                child: child_node.qualified_name.clone(),
                parent: self.describe(&parent),
                reason: "only classes have a parent class",
            });
        }
        if let TypeRef::Resolved(parent_id) = parent {
            let parent_node = self.type_ref(parent_id)?;
            if !parent_node.is_class() {
                return Err(ModelError::InvalidParent {
                    child: child_node.qualified_name.clone(),
                    parent: parent_node.qualified_name.clone(),
                    reason: "the parent is an interface",
                });
            }
        }
        self.types[child.0].parent = Some(parent);
        Ok(())
    }

    /// Record an interface implemented by a class, or extended by an interface.
    pub fn add_implemented_interface(
        &mut self,
        ty: TypeId,
        interface: TypeRef,
    ) -> Result<(), ModelError> {
        let node = self.type_ref(ty)?;
        if let TypeRef::Resolved(target) = interface {
            let target_node = self.type_ref(target)?;
            if !target_node.is_interface() {
                return Err(ModelError::InvalidInterface {
                    ty: node.qualified_name.clone(),
                    target: target_node.qualified_name.clone(),
                    reason: "the target is a class",
                });
            }
        }
        let interfaces = &mut self.types[ty.0].interfaces;
        if !interfaces.contains(&interface) {
            interfaces.push(interface);
        }
        Ok(())
    }

    /// Add a method to a type. Returns the existing id for a repeated name.
    pub fn add_method(
        &mut self,
        owner: TypeId,
        name: &str,
        is_abstract: bool,
    ) -> Result<MethodId, ModelError> {
        let node = self.type_ref(owner)?;
        if let Some(&existing) = node
            .methods
            .iter()
            .find(|m| self.methods[m.0].name == name)
        {
            return Ok(existing);
        }
        let id = MethodId(self.methods.len());
        self.methods.push(Method {
            id,
            name: name.to_string(),
            owner,
            is_abstract,
        });
        self.types[owner.0].methods.push(id);
        Ok(id)
    }

    /// Add a free-standing function to a package.
    pub fn add_function(&mut self, package: PackageId, name: &str) -> Result<FunctionId, ModelError> {
        self.package_ref(package)?;
        let id = FunctionId(self.functions.len());
        self.functions.push(Function {
            id,
            name: name.to_string(),
            package,
        });
        self.packages[package.0].functions.push(id);
        Ok(id)
    }

    pub fn package(&self, id: PackageId) -> Option<&Package> {
        self.packages.get(id.0)
    }

    pub fn type_node(&self, id: TypeId) -> Option<&TypeNode> {
        self.types.get(id.0)
    }

    pub fn method(&self, id: MethodId) -> Option<&Method> {
        self.methods.get(id.0)
    }

    pub fn function(&self, id: FunctionId) -> Option<&Function> {
        self.functions.get(id.0)
    }

    /// The package that owns a type.
    pub fn package_of(&self, id: TypeId) -> Option<&Package> {
        self.type_node(id).and_then(|t| self.package(t.package))
    }

    pub fn package_by_name(&self, name: &str) -> Option<PackageId> {
        self.package_index.get(name).copied()
    }

    pub fn type_by_qualified_name(&self, qualified_name: &str) -> Option<TypeId> {
        self.type_index.get(qualified_name).copied()
    }

    /// All types with the given simple name, in insertion order.
    pub fn find_types_by_name(&self, name: &str) -> Vec<TypeId> {
        self.types
            .iter()
            .filter(|t| t.name == name)
            .map(|t| t.id)
            .collect()
    }

    /// Package ids in insertion order.
    pub fn package_ids(&self) -> Vec<PackageId> {
        self.packages.iter().map(|p| p.id).collect()
    }

    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.iter()
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeNode> {
        self.types.iter()
    }

    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Build the edge index of resolved inheritance relations.
    pub fn inheritance_graph(&self) -> InheritanceGraph {
        InheritanceGraph::build(self)
    }

    fn package_ref(&self, id: PackageId) -> Result<&Package, ModelError> {
        self.packages.get(id.0).ok_or(ModelError::UnknownPackage(id))
    }

    fn type_ref(&self, id: TypeId) -> Result<&TypeNode, ModelError> {
        self.types.get(id.0).ok_or(ModelError::UnknownType(id))
    }

    fn describe(&self, reference: &TypeRef) -> String {
        match reference {
            TypeRef::Resolved(id) => self
                .type_node(*id)
                .map(|t| t.qualified_name.clone())
                .unwrap_or_else(|| id.to_string()),
            TypeRef::Unresolved(name) => name.clone(),
        }
    }
}

/// Kind of a resolved inheritance edge, pointing from child to parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    Extends,
    Implements,
}

/// Directed index of resolved inheritance edges (child -> parent).
///
/// Node `i` of the underlying petgraph holds `TypeId(i)`; unresolved
/// references have no edge.
pub struct InheritanceGraph {
    graph: DiGraph<TypeId, EdgeKind>,
}

impl InheritanceGraph {
    pub fn build(code: &CodeGraph) -> Self {
        let mut graph = DiGraph::with_capacity(code.type_count(), code.type_count());
        for ty in code.types() {
            graph.add_node(ty.id);
        }
        for ty in code.types() {
            let child = NodeIndex::new(ty.id.0);
            if let Some(parent) = ty.parent.as_ref().and_then(TypeRef::resolved) {
                graph.add_edge(child, NodeIndex::new(parent.0), EdgeKind::Extends);
            }
            for interface in ty.interfaces.iter().filter_map(TypeRef::resolved) {
                graph.add_edge(child, NodeIndex::new(interface.0), EdgeKind::Implements);
            }
        }
        Self { graph }
    }

    /// Types whose parent class is `id`.
    pub fn children(&self, id: TypeId) -> Vec<TypeId> {
        self.incoming(id, EdgeKind::Extends)
    }

    pub fn child_count(&self, id: TypeId) -> usize {
        self.children(id).len()
    }

    /// Types that implement (or, for interfaces, extend) the interface `id`.
    pub fn implementors(&self, id: TypeId) -> Vec<TypeId> {
        self.incoming(id, EdgeKind::Implements)
    }

    /// Groups of types that are their own transitive parent. Well-formed input
    /// never produces one.
    pub fn cycles(&self) -> Vec<Vec<TypeId>> {
        petgraph::algo::kosaraju_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || self.graph.contains_edge(scc[0], scc[0]))
            .map(|scc| scc.iter().map(|&idx| self.graph[idx]).collect())
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn incoming(&self, id: TypeId, kind: EdgeKind) -> Vec<TypeId> {
        if id.0 >= self.graph.node_count() {
            return Vec::new();
        }
        let mut found: Vec<TypeId> = self
            .graph
            .edges_directed(NodeIndex::new(id.0), Direction::Incoming)
            .filter(|e| *e.weight() == kind)
            .map(|e| self.graph[e.source()])
            .collect();
        found.sort();
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (CodeGraph, TypeId, TypeId, TypeId) {
        let mut graph = CodeGraph::new();
        let pkg = graph.add_package("library");
        let base = graph.add_class(pkg, "Base").unwrap();
        let child = graph.add_class(pkg, "Child").unwrap();
        let iface = graph.add_interface(pkg, "Printable").unwrap();
        graph
            .set_parent_class(child, TypeRef::Resolved(base))
            .unwrap();
        graph
            .add_implemented_interface(child, TypeRef::Resolved(iface))
            .unwrap();
        (graph, base, child, iface)
    }

    #[test]
    fn test_packages_unique_by_name() {
        let mut graph = CodeGraph::new();
        let a = graph.add_package("library");
        let b = graph.add_package("library");
        assert_eq!(a, b);
        assert_eq!(graph.package_count(), 1);
    }

    #[test]
    fn test_types_deduplicated_in_insertion_order() {
        let mut graph = CodeGraph::new();
        let pkg = graph.add_package("library");
        let a = graph.add_class(pkg, "A").unwrap();
        let b = graph.add_class(pkg, "B").unwrap();
        let again = graph.add_class(pkg, "A").unwrap();
        assert_eq!(a, again);
        assert_eq!(graph.package(pkg).unwrap().types(), &[a, b]);
        assert_eq!(graph.type_by_qualified_name("library::B"), Some(b));
    }

    #[test]
    fn test_redeclare_with_other_kind_fails() {
        let mut graph = CodeGraph::new();
        let pkg = graph.add_package("library");
        graph.add_class(pkg, "A").unwrap();
        let err = graph.add_interface(pkg, "A").unwrap_err();
        assert!(matches!(err, ModelError::KindMismatch { .. }));
    }

    #[test]
    fn test_unknown_package_rejected() {
        let mut graph = CodeGraph::new();
        let err = graph.add_class(PackageId(3), "A").unwrap_err();
        assert_eq!(err, ModelError::UnknownPackage(PackageId(3)));
    }

    #[test]
    fn test_parent_must_be_class() {
        let (mut graph, base, _, iface) = sample();
        let err = graph
            .set_parent_class(base, TypeRef::Resolved(iface))
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidParent { .. }));

        let err = graph
            .set_parent_class(iface, TypeRef::Unresolved("Object".to_string()))
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidParent { .. }));
    }

    #[test]
    fn test_interface_target_must_be_interface() {
        let (mut graph, base, child, _) = sample();
        let err = graph
            .add_implemented_interface(child, TypeRef::Resolved(base))
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidInterface { .. }));
    }

    #[test]
    fn test_methods_and_functions() {
        let (mut graph, base, _, _) = sample();
        let m1 = graph.add_method(base, "run", false).unwrap();
        let m2 = graph.add_method(base, "run", true).unwrap();
        assert_eq!(m1, m2, "repeated method name returns the existing id");
        assert_eq!(graph.method(m1).unwrap().owner(), base);
        assert!(!graph.method(m1).unwrap().is_abstract());

        let pkg = graph.package_by_name("library").unwrap();
        let f = graph.add_function(pkg, "helper").unwrap();
        assert_eq!(graph.function(f).unwrap().name(), "helper");
        assert_eq!(graph.package(pkg).unwrap().functions(), &[f]);
    }

    #[test]
    fn test_inheritance_graph_children_and_implementors() {
        let (graph, base, child, iface) = sample();
        let hierarchy = graph.inheritance_graph();
        assert_eq!(hierarchy.node_count(), 3);
        assert_eq!(hierarchy.edge_count(), 2);
        assert_eq!(hierarchy.children(base), vec![child]);
        assert_eq!(hierarchy.child_count(child), 0);
        assert_eq!(hierarchy.implementors(iface), vec![child]);
        assert!(hierarchy.cycles().is_empty());
    }

    #[test]
    fn test_unresolved_parent_has_no_edge() {
        let mut graph = CodeGraph::new();
        let pkg = graph.add_package("app");
        let a = graph.add_class(pkg, "A").unwrap();
        graph
            .set_parent_class(a, TypeRef::Unresolved("Exception".to_string()))
            .unwrap();
        let hierarchy = graph.inheritance_graph();
        assert_eq!(hierarchy.edge_count(), 0);
        assert!(graph.type_node(a).unwrap().has_parent_class());
    }

    #[test]
    fn test_cycles_detected() {
        let mut graph = CodeGraph::new();
        let pkg = graph.add_package("broken");
        let a = graph.add_class(pkg, "A").unwrap();
        let b = graph.add_class(pkg, "B").unwrap();
        let c = graph.add_class(pkg, "C").unwrap();
        graph.set_parent_class(a, TypeRef::Resolved(b)).unwrap();
        graph.set_parent_class(b, TypeRef::Resolved(a)).unwrap();
        graph.set_parent_class(c, TypeRef::Resolved(c)).unwrap();

        let cycles = graph.inheritance_graph().cycles();
        assert_eq!(cycles.len(), 2, "two-node cycle and self-loop: {cycles:?}");
    }
}
