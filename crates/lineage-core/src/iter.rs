use crate::analyzer::Analyzer;
use crate::error::{AnalysisError, ModelError};
use crate::filter::FilterCollection;
use crate::graph::CodeGraph;
use crate::types::{Package, PackageId, TypeNode};

/// Immutable snapshot handed to [`Analyzer::analyze`]: the graph, the packages
/// to analyze (in order), the filter chain, and the analyzers that already ran.
///
/// Holding shared borrows of the graph and the filters for the whole run is
/// what keeps filter mutation from racing an active analysis.
pub struct AnalysisInput<'g> {
    graph: &'g CodeGraph,
    packages: Vec<PackageId>,
    filters: &'g FilterCollection,
    finished: &'g [Box<dyn Analyzer>],
}

impl<'g> AnalysisInput<'g> {
    /// Snapshot the given packages. Repeated ids are visited once; an id the
    /// graph does not know is a programming error.
    pub fn new<I>(
        graph: &'g CodeGraph,
        packages: I,
        filters: &'g FilterCollection,
    ) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = PackageId>,
    {
        let mut ordered: Vec<PackageId> = Vec::new();
        for id in packages {
            if graph.package(id).is_none() {
                return Err(ModelError::UnknownPackage(id));
            }
            if !ordered.contains(&id) {
                ordered.push(id);
            }
        }
        Ok(Self::from_validated(graph, ordered, filters))
    }

    /// Snapshot of ids already checked against `graph`.
    pub(crate) fn from_validated(
        graph: &'g CodeGraph,
        packages: Vec<PackageId>,
        filters: &'g FilterCollection,
    ) -> Self {
        Self {
            graph,
            packages,
            filters,
            finished: &[],
        }
    }

    /// Snapshot every package of the graph.
    pub fn all(graph: &'g CodeGraph, filters: &'g FilterCollection) -> Self {
        Self::from_validated(graph, graph.package_ids(), filters)
    }

    /// Attach the analyzers that already ran, so a dependent analyzer can
    /// read their results.
    pub fn with_dependencies(mut self, finished: &'g [Box<dyn Analyzer>]) -> Self {
        self.finished = finished;
        self
    }

    pub fn graph(&self) -> &'g CodeGraph {
        self.graph
    }

    pub fn filters(&self) -> &'g FilterCollection {
        self.filters
    }

    pub fn package_ids(&self) -> &[PackageId] {
        &self.packages
    }

    /// Fresh traversal of the accepted packages.
    pub fn packages(&self) -> PackageIter<'_> {
        PackageIter {
            graph: self.graph,
            filters: self.filters,
            packages: &self.packages,
            position: 0,
        }
    }

    /// Fresh traversal of the accepted types, package by package, each in
    /// insertion order.
    pub fn types(&self) -> NodeIterator<'_> {
        NodeIterator {
            graph: self.graph,
            filters: self.filters,
            packages: &self.packages,
            package_pos: 0,
            type_pos: 0,
        }
    }

    /// Accepted types that are classes.
    pub fn classes(&self) -> impl Iterator<Item = &TypeNode> + '_ {
        self.types().filter(|t| t.is_class())
    }

    /// A finished analyzer this run may read from.
    pub fn dependency(&self, name: &str) -> Option<&dyn Analyzer> {
        self.finished
            .iter()
            .find(|a| a.name() == name)
            .map(|a| &**a)
    }

    /// Like [`dependency`](Self::dependency), but a missing analyzer is an error
    /// attributed to `requester`.
    pub fn require(&self, requester: &str, name: &str) -> Result<&dyn Analyzer, AnalysisError> {
        self.dependency(name)
            .ok_or_else(|| AnalysisError::MissingDependency {
                analyzer: requester.to_string(),
                dependency: name.to_string(),
            })
    }
}

/// Lazy traversal of accepted packages. Each call to
/// [`AnalysisInput::packages`] starts an independent one.
#[derive(Clone)]
pub struct PackageIter<'a> {
    graph: &'a CodeGraph,
    filters: &'a FilterCollection,
    packages: &'a [PackageId],
    position: usize,
}

impl<'a> Iterator for PackageIter<'a> {
    type Item = &'a Package;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&id) = self.packages.get(self.position) {
            self.position += 1;
            if let Some(package) = self.graph.package(id) {
                if self.filters.accept_package(package) {
                    return Some(package);
                }
            }
        }
        None
    }
}

/// Lazy, restartable traversal of accepted types.
///
/// The cursor lives in the iterator, never in the graph, so cloning forks an
/// independent traversal and a new one can start at any time.
#[derive(Clone)]
pub struct NodeIterator<'a> {
    graph: &'a CodeGraph,
    filters: &'a FilterCollection,
    packages: &'a [PackageId],
    package_pos: usize,
    type_pos: usize,
}

impl<'a> Iterator for NodeIterator<'a> {
    type Item = &'a TypeNode;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&package_id) = self.packages.get(self.package_pos) {
            let Some(package) = self.graph.package(package_id) else {
                self.package_pos += 1;
                continue;
            };
            while let Some(&type_id) = package.types().get(self.type_pos) {
                self.type_pos += 1;
                if let Some(ty) = self.graph.type_node(type_id) {
                    if self.filters.accept_type(ty, package) {
                        return Some(ty);
                    }
                }
            }
            self.package_pos += 1;
            self.type_pos = 0;
        }
        None
    }
}
