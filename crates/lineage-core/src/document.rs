//! Declarative description of a code model.
//!
//! A parser (or a test fixture) describes packages and their types by name; the
//! document is then turned into a [`CodeGraph`] with every reference resolved
//! against the registry. References that match nothing stay
//! [`TypeRef::Unresolved`].
//!
//! ```toml
//! [[package]]
//! name = "library"
//!
//! [[package.type]]
//! name = "Circle"
//! extends = ["Shape"]
//! implements = ["Drawable"]
//! methods = [{ name = "area" }]
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::graph::CodeGraph;
use crate::types::{qualify, PackageId, TypeId, TypeKind, TypeRef};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelDocument {
    #[serde(default, rename = "package")]
    pub packages: Vec<PackageDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageDecl {
    pub name: String,
    #[serde(default, rename = "type")]
    pub types: Vec<TypeDecl>,
    #[serde(default)]
    pub functions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    #[serde(default)]
    pub kind: TypeKind,
    /// Parent class of a class (at most one), or parent interfaces of an
    /// interface.
    #[serde(default)]
    pub extends: Vec<String>,
    #[serde(default)]
    pub implements: Vec<String>,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
}

impl ModelDocument {
    pub fn from_toml_str(content: &str) -> Result<Self, ModelError> {
        toml::from_str(content).map_err(|e| ModelError::Document(e.to_string()))
    }

    /// Build the graph in two passes: declare everything, then resolve
    /// references, so declaration order never matters.
    pub fn build(&self) -> Result<CodeGraph, ModelError> {
        let mut graph = CodeGraph::new();
        let mut declared: Vec<(PackageId, TypeId, &TypeDecl)> = Vec::new();

        for package in &self.packages {
            let package_id = graph.add_package(&package.name);
            for decl in &package.types {
                let ty = graph.add_type(package_id, &decl.name, decl.kind)?;
                for method in &decl.methods {
                    graph.add_method(ty, &method.name, method.is_abstract)?;
                }
                declared.push((package_id, ty, decl));
            }
            for function in &package.functions {
                graph.add_function(package_id, function)?;
            }
        }

        for (package_id, ty, decl) in declared {
            match decl.kind {
                TypeKind::Class => {
                    if decl.extends.len() > 1 {
                        return Err(ModelError::Document(format!(
                            "class '{}' extends more than one class",
                            decl.name
                        )));
                    }
                    if let Some(parent) = decl.extends.first() {
                        let parent = resolve(&graph, package_id, parent);
                        graph.set_parent_class(ty, parent)?;
                    }
                }
                TypeKind::Interface => {
                    if !decl.implements.is_empty() {
                        return Err(ModelError::Document(format!(
                            "interface '{}' cannot implement, it can only extend",
                            decl.name
                        )));
                    }
                    for parent in &decl.extends {
                        let parent = resolve(&graph, package_id, parent);
                        graph.add_implemented_interface(ty, parent)?;
                    }
                }
            }
            for interface in &decl.implements {
                let interface = resolve(&graph, package_id, interface);
                graph.add_implemented_interface(ty, interface)?;
            }
        }

        Ok(graph)
    }
}

impl CodeGraph {
    pub fn from_document(document: &ModelDocument) -> Result<Self, ModelError> {
        document.build()
    }
}

/// Resolve a written reference: a qualified `pkg::Name`, then a name in the
/// same package, then a simple name that is unique across the graph.
fn resolve(graph: &CodeGraph, from: PackageId, reference: &str) -> TypeRef {
    if let Some(id) = graph.type_by_qualified_name(reference) {
        return TypeRef::Resolved(id);
    }
    if !reference.contains("::") {
        if let Some(package) = graph.package(from) {
            if let Some(id) = graph.type_by_qualified_name(&qualify(package.name(), reference)) {
                return TypeRef::Resolved(id);
            }
        }
        if let [only] = graph.find_types_by_name(reference).as_slice() {
            return TypeRef::Resolved(*only);
        }
    }
    TypeRef::Unresolved(reference.to_string())
}
