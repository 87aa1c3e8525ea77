use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::types::TypeId;

/// A single metric value. Serializes as a plain number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Int(i64),
    Float(f64),
}

impl MetricValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            MetricValue::Int(v) => *v as f64,
            MetricValue::Float(v) => *v,
        }
    }

    /// The integer value, or `None` for a float metric.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetricValue::Int(v) => Some(*v),
            MetricValue::Float(_) => None,
        }
    }
}

impl From<i64> for MetricValue {
    fn from(v: i64) -> Self {
        MetricValue::Int(v)
    }
}

impl From<usize> for MetricValue {
    fn from(v: usize) -> Self {
        MetricValue::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Float(v)
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Int(v) => write!(f, "{v}"),
            MetricValue::Float(v) => write!(f, "{v:.4}"),
        }
    }
}

/// Mapping from metric short name ("dit", "andc", ...) to value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricMap(BTreeMap<String, MetricValue>);

impl MetricMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<MetricValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<MetricValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<MetricValue> {
        self.0.get(name).copied()
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, MetricValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Copy every entry of `other` into this map; `other` wins on conflicts.
    pub fn merge(&mut self, other: &MetricMap) {
        for (name, value) in &other.0 {
            self.0.insert(name.clone(), *value);
        }
    }
}

impl Index<&str> for MetricMap {
    type Output = MetricValue;

    fn index(&self, name: &str) -> &MetricValue {
        match self.0.get(name) {
            Some(value) => value,
            None => panic!("no metric named '{name}'"),
        }
    }
}

/// Per-analyzer storage of node-level and project-level metrics.
///
/// Reset at the start of every run; each node is written at most once per
/// run, so partitioned parallel producers never need a lock.
#[derive(Debug, Clone)]
pub struct MetricStore {
    owner: String,
    nodes: HashMap<TypeId, MetricMap>,
    project: MetricMap,
    project_defaults: MetricMap,
}

impl MetricStore {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            nodes: HashMap::new(),
            project: MetricMap::new(),
            project_defaults: MetricMap::new(),
        }
    }

    /// Project values reported before any run and restored on every reset.
    pub fn with_project_defaults(mut self, defaults: MetricMap) -> Self {
        self.project = defaults.clone();
        self.project_defaults = defaults;
        self
    }

    pub fn reset(&mut self) {
        self.nodes.clear();
        self.project = self.project_defaults.clone();
    }

    pub fn set_node(&mut self, node: TypeId, metrics: MetricMap) -> Result<(), AnalysisError> {
        if self.nodes.contains_key(&node) {
            return Err(AnalysisError::DuplicateNodeWrite {
                analyzer: self.owner.clone(),
                node,
            });
        }
        self.nodes.insert(node, metrics);
        Ok(())
    }

    /// Metrics of one node, or an empty map for a node never visited.
    pub fn node(&self, node: TypeId) -> MetricMap {
        self.nodes.get(&node).cloned().unwrap_or_default()
    }

    pub fn set_project(&mut self, metrics: MetricMap) {
        self.project = metrics;
    }

    pub fn project(&self) -> MetricMap {
        self.project.clone()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Visited node ids, sorted.
    pub fn node_ids(&self) -> Vec<TypeId> {
        let mut ids: Vec<TypeId> = self.nodes.keys().copied().collect();
        ids.sort();
        ids
    }
}
