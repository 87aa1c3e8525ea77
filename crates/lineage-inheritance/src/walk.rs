use std::collections::{HashMap, HashSet};

use lineage_core::{CodeGraph, TypeId, TypeRef};

/// Where a walk up the parent-class chain stopped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WalkEnd {
    /// A type with no parent class.
    Root(TypeId),
    /// A parent that is not in the registry; counted as one hop.
    External(String),
    /// The walk reached a type it had already passed.
    Cycle(TypeId),
}

/// Result of walking from a class to the top of its hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ancestry {
    pub depth: usize,
    /// Resolved ancestors, nearest first.
    pub ancestors: Vec<TypeId>,
    pub end: WalkEnd,
}

impl Ancestry {
    /// The hierarchy this class belongs to, for per-root aggregation.
    pub fn root(&self) -> &WalkEnd {
        &self.end
    }
}

/// Follow parent-class references from `start` through the full, unfiltered
/// graph. Interfaces never contribute.
pub fn walk_ancestors(graph: &CodeGraph, start: TypeId) -> Ancestry {
    let mut visited = HashSet::from([start]);
    let mut ancestors = Vec::new();
    let mut current = start;

    let end = loop {
        let Some(node) = graph.type_node(current) else {
            break WalkEnd::Root(current);
        };
        match node.parent_class() {
            None => break WalkEnd::Root(current),
            Some(TypeRef::Unresolved(name)) => break WalkEnd::External(name.clone()),
            Some(TypeRef::Resolved(parent)) => {
                if !visited.insert(*parent) {
                    break WalkEnd::Cycle(*parent);
                }
                ancestors.push(*parent);
                current = *parent;
            }
        }
    };

    let depth = match end {
        WalkEnd::External(_) => ancestors.len() + 1,
        WalkEnd::Root(_) | WalkEnd::Cycle(_) => ancestors.len(),
    };
    Ancestry {
        depth,
        ancestors,
        end,
    }
}

/// Counts of methods a class adds and overrides relative to its ancestors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MethodDelta {
    pub added: usize,
    pub overridden: usize,
}

/// Compare the methods declared on `class` with those visible on its
/// ancestors. The nearest declaration of a name decides whether it is
/// abstract; implementing an abstract method is neither added nor overridden.
pub fn method_delta(graph: &CodeGraph, class: TypeId, ancestry: &Ancestry) -> MethodDelta {
    let mut inherited: HashMap<&str, bool> = HashMap::new();
    for ancestor in &ancestry.ancestors {
        let Some(node) = graph.type_node(*ancestor) else {
            continue;
        };
        for method in node.methods().iter().filter_map(|m| graph.method(*m)) {
            inherited
                .entry(method.name())
                .or_insert(method.is_abstract());
        }
    }

    let mut delta = MethodDelta::default();
    let Some(node) = graph.type_node(class) else {
        return delta;
    };
    for method in node.methods().iter().filter_map(|m| graph.method(*m)) {
        match inherited.get(method.name()) {
            None => delta.added += 1,
            Some(false) => delta.overridden += 1,
            Some(true) => {}
        }
    }
    delta
}
