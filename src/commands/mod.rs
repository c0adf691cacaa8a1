// src/commands/mod.rs
//! Command handlers for the repository devkit CLI

mod clean;
mod pkgs;

pub use clean::cmd_clean;
pub use pkgs::{PkgsOptions, cmd_pkgs};

use crate::cli::BackendArgs;
use anyhow::{Context, Result, bail};
use repo_devkit::{BackendKind, DevkitSpecs, RepoKnife, load_specs_file, open_backend};
use tracing::{debug, info};

/// Build a knife from the global options: specs, backend and trees
fn open_knife(trees: &[String], specs_file: Option<&str>, backend: &BackendArgs) -> Result<RepoKnife> {
    if trees.is_empty() {
        bail!("At least one --tree is required");
    }

    let specs = match specs_file {
        Some(path) => load_specs_file(path)
            .with_context(|| format!("Failed to load specs file {}", path))?,
        None => DevkitSpecs::new(),
    };

    let kind = BackendKind::parse(&backend.backend)?;
    debug!("Opening {} backend", kind);
    let store = open_backend(kind, backend.path.as_deref(), &backend.options())
        .with_context(|| format!("Failed to open the {} backend", kind))?;

    let mut knife = RepoKnife::new(specs, store);
    let count = knife.load_trees(trees).context("Failed to load recipe trees")?;
    info!("Loaded {} package definitions", count);

    Ok(knife)
}
