// src/commands/pkgs.rs
//! Package listing command

use super::open_knife;
use crate::cli::BackendArgs;
use anyhow::{Context, Result};
use regex::Regex;
use repo_devkit::{PackageRef, RepoList};
use tracing::info;

/// Flags of the `pkgs` command
#[derive(Debug, Default)]
pub struct PkgsOptions {
    pub availables: bool,
    pub build_ordered: bool,
    pub with_resolve: bool,
    pub filters: Vec<String>,
    pub limit: usize,
    pub json: bool,
}

pub fn cmd_pkgs(
    trees: &[String],
    specs_file: Option<&str>,
    backend: &BackendArgs,
    opts: &PkgsOptions,
) -> Result<()> {
    let knife = open_knife(trees, specs_file, backend)?;
    let list = RepoList::new(&knife);

    let mut pkgs = if opts.availables {
        list.availables().context("Failed to list available packages")?
    } else if opts.build_ordered {
        let ordered = list
            .missings_ordered(opts.with_resolve)
            .context("Failed to order missing packages")?;
        for key in &ordered.changed {
            info!("Build requires of {} were serialized", key);
        }
        ordered.order
    } else {
        list.missings().context("Failed to list missing packages")?
    };

    let filters = compile_filters(&opts.filters)?;
    pkgs.retain(|p| matches_filters(&filters, p));

    // Build order must be kept as computed
    if !opts.build_ordered {
        pkgs.sort_by_key(PackageRef::fingerprint);
    }
    if opts.limit > 0 {
        pkgs.truncate(opts.limit);
    }

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&pkgs)?);
    } else {
        for pkg in &pkgs {
            println!("{}", pkg.fingerprint());
        }
    }

    Ok(())
}

fn compile_filters(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| Regex::new(p).with_context(|| format!("Invalid filter regex '{}'", p)))
        .collect()
}

/// A package is kept when no filter is given or any filter matches its key
fn matches_filters(filters: &[Regex], pkg: &PackageRef) -> bool {
    filters.is_empty() || filters.iter().any(|re| re.is_match(&pkg.key()))
}
