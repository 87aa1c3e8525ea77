use std::collections::{BTreeMap, HashMap};

use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analyzer::Analyzer;
use crate::error::AnalysisError;
use crate::filter::FilterCollection;
use crate::graph::CodeGraph;
use crate::iter::AnalysisInput;
use crate::metrics::MetricMap;
use crate::types::PackageId;

/// Merged output of a pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Analyzer names in the order they ran.
    pub analyzers: Vec<String>,
    /// Project metrics of every analyzer, merged into one map.
    pub project: MetricMap,
    /// Node metrics of every accepted type, keyed by qualified name.
    pub nodes: BTreeMap<String, MetricMap>,
}

/// Runs a set of analyzers over one graph, honoring their declared
/// dependencies.
pub struct AnalysisPipeline {
    analyzers: Vec<Box<dyn Analyzer>>,
}

impl AnalysisPipeline {
    pub fn new(analyzers: Vec<Box<dyn Analyzer>>) -> Self {
        Self { analyzers }
    }

    pub fn register(&mut self, analyzer: Box<dyn Analyzer>) {
        self.analyzers.push(analyzer);
    }

    pub fn analyzer(&self, name: &str) -> Option<&dyn Analyzer> {
        self.analyzers
            .iter()
            .find(|a| a.name() == name)
            .map(|a| &**a)
    }

    /// Analyzer names in dependency order (dependencies first).
    pub fn execution_order(&self) -> Result<Vec<&'static str>, AnalysisError> {
        Ok(self
            .ordered_indices()?
            .into_iter()
            .map(|idx| self.analyzers[idx].name())
            .collect())
    }

    /// Run every analyzer over the given packages.
    ///
    /// If an analyzer fails, the remaining ones are not run and the error is
    /// returned; all analyzers stay registered either way.
    pub fn run(
        &mut self,
        graph: &CodeGraph,
        packages: &[PackageId],
        filters: &FilterCollection,
    ) -> Result<AnalysisReport, AnalysisError> {
        let order = self.ordered_indices()?;
        let package_ids = AnalysisInput::new(graph, packages.iter().copied(), filters)?
            .package_ids()
            .to_vec();

        let mut pending: Vec<Option<Box<dyn Analyzer>>> =
            std::mem::take(&mut self.analyzers).into_iter().map(Some).collect();
        let mut finished: Vec<Box<dyn Analyzer>> = Vec::with_capacity(pending.len());
        let mut failure = None;

        for idx in order {
            let Some(mut analyzer) = pending[idx].take() else {
                continue;
            };
            debug!(analyzer = analyzer.name(), "running analyzer");
            let outcome = {
                let input = AnalysisInput::from_validated(graph, package_ids.clone(), filters)
                    .with_dependencies(&finished);
                analyzer.analyze(&input)
            };
            finished.push(analyzer);
            if let Err(e) = outcome {
                failure = Some(e);
                break;
            }
        }

        finished.extend(pending.into_iter().flatten());
        self.analyzers = finished;
        if let Some(e) = failure {
            return Err(e);
        }

        let order = self.execution_order()?;
        let input = AnalysisInput::from_validated(graph, package_ids, filters);
        let mut report = AnalysisReport {
            analyzers: order.iter().map(|n| n.to_string()).collect(),
            ..AnalysisReport::default()
        };
        for name in &order {
            if let Some(analyzer) = self.analyzer(name) {
                report.project.merge(&analyzer.project_metrics());
            }
        }
        for ty in input.types() {
            let mut merged = MetricMap::new();
            for name in &order {
                if let Some(analyzer) = self.analyzer(name) {
                    merged.merge(&analyzer.node_metrics(ty.id()));
                }
            }
            if !merged.is_empty() {
                report.nodes.insert(ty.qualified_name().to_string(), merged);
            }
        }
        Ok(report)
    }

    fn ordered_indices(&self) -> Result<Vec<usize>, AnalysisError> {
        let mut by_name: HashMap<&'static str, usize> = HashMap::new();
        for (idx, analyzer) in self.analyzers.iter().enumerate() {
            if by_name.insert(analyzer.name(), idx).is_some() {
                return Err(AnalysisError::DuplicateAnalyzer(analyzer.name().to_string()));
            }
        }

        let mut deps: DiGraph<usize, ()> = DiGraph::new();
        let nodes: Vec<_> = (0..self.analyzers.len()).map(|i| deps.add_node(i)).collect();
        for (idx, analyzer) in self.analyzers.iter().enumerate() {
            for dependency in analyzer.dependencies() {
                let Some(&dep_idx) = by_name.get(dependency) else {
                    return Err(AnalysisError::UnknownDependency {
                        analyzer: analyzer.name().to_string(),
                        dependency: dependency.to_string(),
                    });
                };
                deps.add_edge(nodes[dep_idx], nodes[idx], ());
            }
        }

        toposort(&deps, None)
            .map(|sorted| sorted.into_iter().map(|n| deps[n]).collect())
            .map_err(|cycle| {
                let name = self.analyzers[deps[cycle.node_id()]].name();
                AnalysisError::DependencyCycle(name.to_string())
            })
    }
}
