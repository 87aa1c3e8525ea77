use crate::error::AnalysisError;
use crate::iter::AnalysisInput;
use crate::metrics::MetricMap;
use crate::types::TypeId;

/// Trait that each metric analyzer must implement.
pub trait Analyzer: Send + Sync {
    /// Stable analyzer name (e.g., "inheritance"), used to address it as a
    /// dependency.
    fn name(&self) -> &'static str;

    /// Names of analyzers whose results this one reads during `analyze`.
    fn dependencies(&self) -> &[&'static str] {
        &[]
    }

    /// Compute metrics for the accepted nodes of `input`, replacing the
    /// results of any previous run.
    fn analyze(&mut self, input: &AnalysisInput<'_>) -> Result<(), AnalysisError>;

    /// Metrics of one type. Empty for a type that was never visited.
    fn node_metrics(&self, node: TypeId) -> MetricMap;

    /// Project-wide aggregates. Identity values before the first run.
    fn project_metrics(&self) -> MetricMap;
}
