use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::config::FilterConfig;
use crate::types::{Package, TypeNode};

/// A node a filter can be asked about.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Package(&'a Package),
    Type {
        ty: &'a TypeNode,
        package: &'a Package,
    },
}

impl<'a> NodeRef<'a> {
    /// The package itself, or the package owning the type.
    pub fn package(&self) -> &'a Package {
        match *self {
            NodeRef::Package(package) => package,
            NodeRef::Type { package, .. } => package,
        }
    }
}

/// Inclusion predicate over packages and types.
pub trait Filter: fmt::Debug + Send + Sync {
    fn accept(&self, node: NodeRef<'_>) -> bool;
}

/// Whitelist: accepts a package, or a type through its owning package, iff
/// the package name is one of the allowed names.
#[derive(Debug, Clone)]
pub struct PackageFilter {
    allowed: BTreeSet<String>,
}

impl PackageFilter {
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allowed(&self) -> impl Iterator<Item = &str> {
        self.allowed.iter().map(String::as_str)
    }
}

impl Filter for PackageFilter {
    fn accept(&self, node: NodeRef<'_>) -> bool {
        self.allowed.contains(node.package().name())
    }
}

/// Blacklist: rejects a package, or a type through its owning package, when
/// the package name matches one of the glob patterns (`vendor*`, `test?`).
#[derive(Debug, Clone)]
pub struct PackageExcludeFilter {
    patterns: Vec<String>,
    set: GlobSet,
}

impl PackageExcludeFilter {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern)
                .with_context(|| format!("invalid package pattern '{pattern}'"))?;
            builder.add(glob);
        }
        let set = builder
            .build()
            .context("failed to compile package exclude patterns")?;
        Ok(Self {
            patterns: patterns.to_vec(),
            set,
        })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl Filter for PackageExcludeFilter {
    fn accept(&self, node: NodeRef<'_>) -> bool {
        !self.set.is_match(node.package().name())
    }
}

/// Ordered, AND-combined chain of filters.
///
/// An owned value handed to the analysis entry point rather than process-wide
/// state. Cloning is cheap and shares the filters. While an analysis borrows
/// the collection it cannot be mutated.
#[derive(Debug, Clone, Default)]
pub struct FilterCollection {
    filters: Vec<Arc<dyn Filter>>,
}

impl FilterCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the chain described by the `[filter]` config section: the
    /// whitelist first (when present), then the exclude patterns.
    pub fn from_config(config: &FilterConfig) -> Result<Self> {
        let mut collection = Self::new();
        if let Some(include) = &config.include_packages {
            collection.add_filter(PackageFilter::new(include.iter().cloned()));
        }
        if !config.exclude_packages.is_empty() {
            collection.add_filter(PackageExcludeFilter::new(&config.exclude_packages)?);
        }
        Ok(collection)
    }

    pub fn add_filter<F: Filter + 'static>(&mut self, filter: F) {
        self.filters.push(Arc::new(filter));
    }

    pub fn with_filter<F: Filter + 'static>(mut self, filter: F) -> Self {
        self.add_filter(filter);
        self
    }

    pub fn clear(&mut self) {
        self.filters.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// True iff the chain is empty or every filter accepts the node.
    pub fn accept(&self, node: NodeRef<'_>) -> bool {
        self.filters.iter().all(|f| f.accept(node))
    }

    pub fn accept_package(&self, package: &Package) -> bool {
        self.accept(NodeRef::Package(package))
    }

    pub fn accept_type(&self, ty: &TypeNode, package: &Package) -> bool {
        self.accept(NodeRef::Type { ty, package })
    }
}
