// src/tree/catalog.rs

//! Lookup structure over the definitions of one or more recipe trees

use crate::package::PackageRef;
use crate::tree::definition::PackageDefinition;
use crate::version::{PortageVersion, cmp_version_str};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::warn;

/// Definitions keyed by `category/name`, each list sorted by version
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    packages: BTreeMap<String, Vec<PackageDefinition>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a definition; an existing `(category, name, version)` is replaced
    pub fn insert(&mut self, def: PackageDefinition) {
        let versions = self.packages.entry(def.key()).or_default();

        match versions.binary_search_by(|d| cmp_version_str(&d.version, &def.version)) {
            Ok(idx) => versions[idx] = def,
            Err(idx) => versions.insert(idx, def),
        }
    }

    /// Definition of exactly `category/name-version`
    pub fn find_exact(&self, category: &str, name: &str, version: &str) -> Option<&PackageDefinition> {
        self.find_all(category, name)
            .iter()
            .find(|d| cmp_version_str(&d.version, version) == Ordering::Equal)
    }

    /// Every version of `category/name`, ascending
    pub fn find_all(&self, category: &str, name: &str) -> &[PackageDefinition] {
        self.packages
            .get(&format!("{}/{}", category, name))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Highest version admitted by the reference's selector, or the highest
    /// version overall when nothing is admitted
    pub fn find_best(&self, pkg: &PackageRef) -> Option<&PackageDefinition> {
        let candidates = self.find_all(&pkg.category, &pkg.name);
        let highest = candidates.last();

        let selector = match pkg.selector() {
            Ok(s) => s,
            Err(e) => {
                warn!("Unusable selector on {}: {}", pkg.key(), e);
                return highest;
            }
        };

        candidates
            .iter()
            .rev()
            .find(|d| {
                PortageVersion::parse(&d.version)
                    .map(|v| selector.admits(&v))
                    .unwrap_or(false)
            })
            .or(highest)
    }

    /// Every definition once, ordered by key then version
    pub fn world(&self) -> Vec<&PackageDefinition> {
        self.packages.values().flatten().collect()
    }

    /// Number of definitions
    pub fn len(&self) -> usize {
        self.packages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
