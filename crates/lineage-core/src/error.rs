use thiserror::Error;

use crate::types::{PackageId, TypeId, TypeKind};

/// Errors raised while building or addressing the code model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("unknown {0}")]
    UnknownPackage(PackageId),

    #[error("unknown {0}")]
    UnknownType(TypeId),

    #[error("'{name}' is already declared as {existing}, cannot redeclare it as {requested}")]
    KindMismatch {
        name: String,
        existing: TypeKind,
        requested: TypeKind,
    },

    #[error("'{child}' cannot have parent class '{parent}': {reason}")]
    InvalidParent {
        child: String,
        parent: String,
        reason: &'static str,
    },

    #[error("'{ty}' cannot implement '{target}': {reason}")]
    InvalidInterface {
        ty: String,
        target: String,
        reason: &'static str,
    },

    #[error("invalid model document: {0}")]
    Document(String),
}

/// Errors raised by analyzers and the analysis pipeline.
///
/// Data-shape anomalies (unresolved parents, cycles, empty filters) never end
/// up here; they resolve to defined default values instead.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("analyzer '{0}' is registered more than once")]
    DuplicateAnalyzer(String),

    #[error("analyzer '{analyzer}' depends on unknown analyzer '{dependency}'")]
    UnknownDependency {
        analyzer: String,
        dependency: String,
    },

    #[error("analyzer dependency cycle involving '{0}'")]
    DependencyCycle(String),

    #[error("analyzer '{analyzer}' needs results from '{dependency}', which has not run")]
    MissingDependency {
        analyzer: String,
        dependency: String,
    },

    #[error("analyzer '{analyzer}' wrote metrics for {node} twice in one run")]
    DuplicateNodeWrite { analyzer: String, node: TypeId },
}
