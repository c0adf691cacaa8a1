// src/tree/mod.rs

//! Recipe tree reader
//!
//! A recipe tree is a directory hierarchy where every directory holding a
//! `definition.yaml` describes one package version. Loading fills two
//! catalogs with the same identities:
//! - the runtime catalog, carrying the definition's `requires`
//! - the build catalog, carrying the `requires` of the sibling `build.yaml`
//!
//! Several trees can be loaded into the same `RecipeTree`; later
//! definitions replace earlier ones with the same `(category, name, version)`.

mod catalog;
mod definition;

pub use catalog::Catalog;
pub use definition::{
    BUILD_FILE, DEFINITION_FILE, PackageDefinition, parse_build_requires, parse_definition,
    parse_definition_file,
};

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Runtime and build catalogs loaded from one or more trees
#[derive(Debug, Default)]
pub struct RecipeTree {
    runtime: Catalog,
    build: Catalog,
    paths: Vec<PathBuf>,
}

impl RecipeTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every definition below `path`, returning how many were read
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let root = path.as_ref();
        if !root.is_dir() {
            return Err(Error::NotFound(format!(
                "Recipe tree {} does not exist or is not a directory",
                root.display()
            )));
        }

        let mut count = 0;
        for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                Error::IoError(format!("Failed to walk tree {}: {}", root.display(), e))
            })?;

            if !entry.file_type().is_file() || entry.file_name() != DEFINITION_FILE {
                continue;
            }

            let def = parse_definition_file(entry.path())?;
            let build_requires = parse_build_requires(&def.path)?;
            debug!(
                "Loaded {} ({} runtime, {} build requires)",
                def.package(),
                def.requires.len(),
                build_requires.len()
            );

            let mut build_def = def.clone();
            build_def.requires = build_requires;
            self.runtime.insert(def);
            self.build.insert(build_def);
            count += 1;
        }

        info!("Loaded {} definitions from {}", count, root.display());
        self.paths.push(root.to_path_buf());
        Ok(count)
    }

    /// Catalog with runtime requires
    pub fn runtime(&self) -> &Catalog {
        &self.runtime
    }

    /// Catalog with build-time requires
    pub fn build(&self) -> &Catalog {
        &self.build
    }

    /// Trees loaded so far
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}
