pub mod analyzer;
pub mod config;
pub mod document;
pub mod error;
pub mod filter;
pub mod graph;
pub mod iter;
pub mod metrics;
pub mod pipeline;
pub mod types;

pub use analyzer::Analyzer;
pub use config::Config;
pub use document::ModelDocument;
pub use error::{AnalysisError, ModelError};
pub use filter::{Filter, FilterCollection, NodeRef, PackageExcludeFilter, PackageFilter};
pub use graph::{CodeGraph, InheritanceGraph};
pub use iter::{AnalysisInput, NodeIterator};
pub use metrics::{MetricMap, MetricStore, MetricValue};
pub use pipeline::{AnalysisPipeline, AnalysisReport};
pub use types::*;
