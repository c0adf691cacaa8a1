// src/cli/mod.rs
//! CLI definitions for the repository devkit
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.
//!
//! Commands:
//! - `clean` - Remove invalid files from the artifact store
//! - `pkgs` - List available or missing packages

use clap::{Parser, Subcommand};

mod backend;

pub use backend::BackendArgs;

#[derive(Parser)]
#[command(name = "repo-devkit")]
#[command(version)]
#[command(about = "Maintenance devkit for Portage-derived package repositories", long_about = None)]
pub struct Cli {
    /// Recipe tree to load (repeatable)
    #[arg(short, long = "tree", global = true, value_name = "PATH")]
    pub tree: Vec<String>,

    /// YAML file with cleaner excludes and list ignore rules
    #[arg(short, long, global = true, value_name = "FILE")]
    pub specs_file: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Remove stray, orphaned and obsolete files from the store
    Clean {
        #[command(flatten)]
        backend: BackendArgs,

        /// Only report what would be removed
        #[arg(long)]
        dry_run: bool,
    },

    /// List packages available in the store or missing from it
    Pkgs {
        #[command(flatten)]
        backend: BackendArgs,

        /// List packages with a valid artifact in the store
        #[arg(long, conflicts_with = "missings", required_unless_present = "missings")]
        availables: bool,

        /// List tree packages without an artifact
        #[arg(long)]
        missings: bool,

        /// Sort missing packages in build order
        #[arg(long, requires = "missings")]
        build_ordered: bool,

        /// Serialize shared build dependencies before ordering
        #[arg(long, requires = "build_ordered")]
        build_ordered_with_resolve: bool,

        /// Keep only packages whose category/name matches (repeatable)
        #[arg(short, long, value_name = "REGEX")]
        filter: Vec<String>,

        /// Maximum number of packages to print (0 = unlimited)
        #[arg(short, long, default_value = "0")]
        limit: usize,

        /// Print JSON instead of one fingerprint per line
        #[arg(long)]
        json: bool,
    },
}
