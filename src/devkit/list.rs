// src/devkit/list.rs

//! Packages available in the store and packages still to build

use super::knife::{Analysis, RepoKnife};
use crate::error::Result;
use crate::package::PackageRef;
use crate::resolver::{OrderedBuild, resolve_build_order};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

pub struct RepoList<'a> {
    knife: &'a RepoKnife,
}

impl<'a> RepoList<'a> {
    pub fn new(knife: &'a RepoKnife) -> Self {
        Self { knife }
    }

    /// Packages with a valid artifact in the store
    pub fn availables(&self) -> Result<Vec<PackageRef>> {
        Ok(self.knife.analyze()?.packages())
    }

    /// Tree packages without an artifact, minus the ignore rules, sorted by
    /// fingerprint
    pub fn missings(&self) -> Result<Vec<PackageRef>> {
        let analysis = self.knife.analyze()?;
        Ok(self.missings_from(&analysis))
    }

    /// Missing packages in build order
    pub fn missings_ordered(&self, with_resolve: bool) -> Result<OrderedBuild> {
        let missing = self.missings()?;
        Ok(resolve_build_order(
            self.knife.tree().build(),
            &missing,
            with_resolve,
        ))
    }

    /// Missing packages computed from an existing analysis
    pub fn missings_from(&self, analysis: &Analysis) -> Vec<PackageRef> {
        let available: HashSet<String> = analysis
            .packages()
            .iter()
            .map(PackageRef::fingerprint)
            .collect();

        let mut missing: BTreeMap<String, PackageRef> = BTreeMap::new();
        for def in self.knife.tree().runtime().world() {
            let pkg = def.package();
            let fingerprint = pkg.fingerprint();

            if available.contains(&fingerprint) {
                continue;
            }
            if self.knife.specs().to_ignore(&pkg) {
                debug!("[{}] Ignored by specs", fingerprint);
                continue;
            }
            missing.insert(fingerprint, pkg);
        }

        missing.into_values().collect()
    }
}
