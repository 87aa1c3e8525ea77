//! Inheritance metrics over a [`lineage_core::CodeGraph`].
//!
//! Node metrics, keyed by class:
//! - `dit`: depth of inheritance tree
//! - `noc`: number of direct child classes
//! - `noam`: number of added methods
//! - `noom`: number of overridden methods
//!
//! Project metrics: `andc` (average number of derived classes), `ahh`
//! (average hierarchy height) and `max_dit`.

pub mod analyzer;
pub mod walk;

pub use analyzer::InheritanceAnalyzer;

/// Name under which the analyzer registers in a pipeline.
pub const ANALYZER_NAME: &str = "inheritance";

pub const DIT: &str = "dit";
pub const NOC: &str = "noc";
pub const NOAM: &str = "noam";
pub const NOOM: &str = "noom";
pub const ANDC: &str = "andc";
pub const AHH: &str = "ahh";
pub const MAX_DIT: &str = "max_dit";
