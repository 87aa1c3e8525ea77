use std::collections::HashMap;

use rayon::prelude::*;
use tracing::{debug, trace, warn};

use lineage_core::config::{AhhReference, AndcDenominator, Config, InheritanceConfig};
use lineage_core::{
    AnalysisError, AnalysisInput, Analyzer, CodeGraph, InheritanceGraph, MetricMap, MetricStore,
    TypeId, TypeNode,
};

use crate::walk::{method_delta, walk_ancestors, WalkEnd};
use crate::{AHH, ANALYZER_NAME, ANDC, DIT, MAX_DIT, NOAM, NOC, NOOM};

/// Per-class results of the visiting phase.
#[derive(Debug, Clone, PartialEq)]
struct ClassVisit {
    id: TypeId,
    dit: usize,
    noc: usize,
    noam: usize,
    noom: usize,
    root: WalkEnd,
}

impl ClassVisit {
    fn metrics(&self) -> MetricMap {
        MetricMap::new()
            .with(DIT, self.dit)
            .with(NOC, self.noc)
            .with(NOAM, self.noam)
            .with(NOOM, self.noom)
    }
}

/// Computes depth of inheritance tree, number of children, and the project
/// averages ANDC and AHH over the accepted classes.
///
/// Each `analyze` runs Visiting (per class, optionally on rayon), then
/// Aggregating, to completion; results of the previous run are discarded
/// first. Interfaces are not visited.
pub struct InheritanceAnalyzer {
    config: InheritanceConfig,
    parallel: bool,
    store: MetricStore,
}

impl InheritanceAnalyzer {
    pub fn new() -> Self {
        Self::with_config(InheritanceConfig::default())
    }

    pub fn with_config(config: InheritanceConfig) -> Self {
        Self {
            config,
            parallel: true,
            store: MetricStore::new(ANALYZER_NAME).with_project_defaults(project_defaults()),
        }
    }

    /// Build from the `[inheritance]` and `[analysis]` config sections.
    pub fn from_config(config: &Config) -> Self {
        Self::with_config(config.inheritance).parallel(config.analysis.parallel)
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn config(&self) -> &InheritanceConfig {
        &self.config
    }

    fn visit(graph: &CodeGraph, hierarchy: &InheritanceGraph, class: &TypeNode) -> ClassVisit {
        let ancestry = walk_ancestors(graph, class.id());
        match ancestry.root() {
            WalkEnd::Cycle(at) => warn!(
                class = class.qualified_name(),
                revisited = graph
                    .type_node(*at)
                    .map(TypeNode::qualified_name)
                    .unwrap_or_default(),
                depth = ancestry.depth,
                "inheritance cycle, depth of inheritance tree truncated"
            ),
            WalkEnd::External(name) => trace!(
                class = class.qualified_name(),
                parent = name.as_str(),
                "unresolved parent class treated as hierarchy root"
            ),
            WalkEnd::Root(_) => {}
        }

        let delta = method_delta(graph, class.id(), &ancestry);
        ClassVisit {
            id: class.id(),
            dit: ancestry.depth,
            noc: hierarchy.child_count(class.id()),
            noam: delta.added,
            noom: delta.overridden,
            root: ancestry.end,
        }
    }
}

impl Default for InheritanceAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for InheritanceAnalyzer {
    fn name(&self) -> &'static str {
        ANALYZER_NAME
    }

    fn analyze(&mut self, input: &AnalysisInput<'_>) -> Result<(), AnalysisError> {
        self.store.reset();

        let graph = input.graph();
        let hierarchy = graph.inheritance_graph();
        let classes: Vec<&TypeNode> = input.classes().collect();
        debug!(
            phase = "visiting",
            classes = classes.len(),
            parallel = self.parallel,
            "inheritance analysis"
        );

        let visits: Vec<ClassVisit> = if self.parallel {
            classes
                .par_iter()
                .map(|class| Self::visit(graph, &hierarchy, class))
                .collect()
        } else {
            classes
                .iter()
                .map(|class| Self::visit(graph, &hierarchy, class))
                .collect()
        };

        for visit in &visits {
            self.store.set_node(visit.id, visit.metrics())?;
        }

        debug!(phase = "aggregating", classes = visits.len(), "inheritance analysis");
        let andc = average_derived_classes(&visits, self.config.andc_denominator);
        let ahh = average_hierarchy_height(&visits, self.config.ahh_reference);
        let max_dit = visits.iter().map(|v| v.dit).max().unwrap_or(0);
        self.store.set_project(
            MetricMap::new()
                .with(ANDC, andc)
                .with(AHH, ahh)
                .with(MAX_DIT, max_dit),
        );

        debug!(phase = "done", andc, ahh, max_dit, "inheritance analysis");
        Ok(())
    }

    fn node_metrics(&self, node: TypeId) -> MetricMap {
        self.store.node(node)
    }

    fn project_metrics(&self) -> MetricMap {
        self.store.project()
    }
}

fn project_defaults() -> MetricMap {
    MetricMap::new()
        .with(ANDC, 0.0)
        .with(AHH, 0.0)
        .with(MAX_DIT, 0usize)
}

fn mean(sum: usize, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

fn average_derived_classes(visits: &[ClassVisit], denominator: AndcDenominator) -> f64 {
    match denominator {
        AndcDenominator::ClassesWithChildren => {
            let parents: Vec<usize> = visits.iter().map(|v| v.noc).filter(|&n| n > 0).collect();
            mean(parents.iter().sum(), parents.len())
        }
        AndcDenominator::AllClasses => {
            mean(visits.iter().map(|v| v.noc).sum(), visits.len())
        }
    }
}

fn average_hierarchy_height(visits: &[ClassVisit], reference: AhhReference) -> f64 {
    match reference {
        AhhReference::AllClasses => mean(visits.iter().map(|v| v.dit).sum(), visits.len()),
        AhhReference::HierarchyRoots => {
            let mut deepest: HashMap<&WalkEnd, usize> = HashMap::new();
            for visit in visits {
                let depth = deepest.entry(&visit.root).or_insert(0);
                *depth = (*depth).max(visit.dit);
            }
            mean(deepest.values().sum(), deepest.len())
        }
    }
}
