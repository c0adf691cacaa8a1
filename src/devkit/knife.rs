// src/devkit/knife.rs

//! Store analysis: which artifacts are valid and which can be removed

use crate::artifact::{ArtifactKind, ArtifactMetadata, classify, dirname, sibling_metadata};
use crate::backend::Backend;
use crate::error::Result;
use crate::package::PackageRef;
use crate::specs::DevkitSpecs;
use crate::tree::RecipeTree;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Classified view of the store produced by [`RepoKnife::analyze`]
#[derive(Debug, Default)]
pub struct Analysis {
    /// Valid metadata sidecars by key
    pub metadata: BTreeMap<String, ArtifactMetadata>,
    /// Valid payloads by key, mapped to their metadata key
    pub payloads: BTreeMap<String, String>,
    /// Keys that can be removed
    pub to_remove: Vec<String>,
    /// Repository index files seen and left alone
    pub index_files: Vec<String>,
    /// Keys returned by the backend, before excludes
    pub processed_files: usize,
}

impl Analysis {
    /// Identities of the valid artifacts, deduplicated, in fingerprint order
    pub fn packages(&self) -> Vec<PackageRef> {
        let by_fingerprint: BTreeMap<String, PackageRef> = self
            .metadata
            .values()
            .map(|m| {
                let pkg = m.package();
                (pkg.fingerprint(), pkg)
            })
            .collect();
        by_fingerprint.into_values().collect()
    }

    fn drop_metadata(&mut self, key: &str, reason: &str) {
        if self.metadata.remove(key).is_some() {
            info!("[{}] {}", key, reason);
            self.to_remove.push(key.to_string());
        }
    }

    fn drop_payload(&mut self, key: &str, reason: &str) {
        if self.payloads.remove(key).is_some() {
            info!("[{}] {}", key, reason);
            self.to_remove.push(key.to_string());
        }
    }
}

/// Payload key described by a metadata sidecar stored under `meta_key`
fn payload_key(meta_key: &str, meta: &ArtifactMetadata) -> String {
    format!("{}{}", dirname(meta_key), meta.payload_name())
}

/// Analyzer owning the specs, the store backend and the loaded trees
pub struct RepoKnife {
    specs: DevkitSpecs,
    backend: Box<dyn Backend>,
    tree: RecipeTree,
}

impl RepoKnife {
    pub fn new(specs: DevkitSpecs, backend: Box<dyn Backend>) -> Self {
        Self {
            specs,
            backend,
            tree: RecipeTree::new(),
        }
    }

    /// Load recipe trees, returning the number of definitions read
    pub fn load_trees<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<usize> {
        let mut total = 0;
        for path in paths {
            info!("Loading tree {}...", path.as_ref().display());
            total += self.tree.load(path)?;
        }
        Ok(total)
    }

    pub fn tree(&self) -> &RecipeTree {
        &self.tree
    }

    pub fn specs(&self) -> &DevkitSpecs {
        &self.specs
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Classify every key of the store
    ///
    /// Listing and metadata decoding failures abort the analysis.
    pub fn analyze(&self) -> Result<Analysis> {
        let mut analysis = Analysis::default();

        let mut keys = self.backend.list()?;
        analysis.processed_files = keys.len();
        keys.sort();
        keys.dedup();

        for key in keys {
            if self.specs.is_excluded(&key) {
                debug!("[{}] Excluded", key);
                continue;
            }

            match classify(&key) {
                ArtifactKind::RepositoryIndex => {
                    debug!("Ignoring repository file {}", key);
                    analysis.index_files.push(key);
                }
                ArtifactKind::Metadata => {
                    debug!("[{}] Analyzing...", key);
                    let meta = self.backend.fetch_metadata(&key)?;
                    analysis.metadata.insert(key, meta);
                }
                ArtifactKind::Payload => {
                    debug!("[{}] Analyzing...", key);
                    let sibling = sibling_metadata(&key);
                    analysis.payloads.insert(key, sibling);
                }
                ArtifactKind::Stray => {
                    info!("[{}] Not an artifact", key);
                    analysis.to_remove.push(key);
                }
            }
        }

        self.check_pairing(&mut analysis);
        self.check_tree_membership(&mut analysis);

        debug!(
            "Analysis of {} files: {} packages, {} to remove",
            analysis.processed_files,
            analysis.metadata.len(),
            analysis.to_remove.len()
        );
        Ok(analysis)
    }

    /// Keep only metadata and payloads that point at each other
    fn check_pairing(&self, analysis: &mut Analysis) {
        let obsolete: Vec<String> = analysis
            .metadata
            .iter()
            .filter(|(key, meta)| {
                let payload = payload_key(key, meta);
                analysis.payloads.get(&payload) != Some(*key)
            })
            .map(|(key, _)| key.clone())
            .collect();

        for key in obsolete {
            analysis.drop_metadata(&key, "Metadata without payload");
        }

        let orphans: Vec<String> = analysis
            .payloads
            .iter()
            .filter(|(_, meta_key)| !analysis.metadata.contains_key(*meta_key))
            .map(|(key, _)| key.clone())
            .collect();

        for key in orphans {
            analysis.drop_payload(&key, "Payload without metadata");
        }
    }

    /// Drop artifacts whose package is no longer in any tree
    fn check_tree_membership(&self, analysis: &mut Analysis) {
        let stale: Vec<(String, String)> = analysis
            .metadata
            .iter()
            .filter(|(_, meta)| {
                let pkg = meta.package();
                self.tree.runtime().find_all(&pkg.category, &pkg.name).is_empty()
            })
            .map(|(key, meta)| (key.clone(), payload_key(key, meta)))
            .collect();

        for (meta_key, payload) in stale {
            analysis.drop_metadata(&meta_key, "Package not available in tree");
            analysis.drop_payload(&payload, "Package not available in tree");
        }
    }
}
