// src/lib.rs

//! Repository maintenance devkit
//!
//! Keeps a binary package repository built from a Portage-derived recipe
//! tree in shape:
//! - reconciles the artifact store against the recipe trees and removes
//!   stray, orphaned and obsolete files
//! - reports which tree packages are available in the store and which are
//!   missing, optionally in a valid rebuild order
//!
//! # Architecture
//!
//! - `backend`: local directory, S3-compatible bucket or HTTP namespace
//! - `tree`: runtime and build catalogs read from `definition.yaml` files
//! - `devkit`: the knife (analysis), the cleaner and the lister
//! - `resolver`: level-based build ordering with cycle handling

pub mod artifact;
pub mod backend;
pub mod devkit;
mod error;
pub mod package;
pub mod resolver;
pub mod specs;
pub mod tree;
pub mod version;

pub use backend::{Backend, BackendKind, BackendOptions, open_backend};
pub use devkit::{Analysis, CleanReport, RepoCleaner, RepoKnife, RepoList};
pub use error::{Error, Result};
pub use package::PackageRef;
pub use resolver::{OrderedBuild, resolve_build_order};
pub use specs::{DevkitSpecs, load_specs_file};
pub use tree::{Catalog, PackageDefinition, RecipeTree};
pub use version::{PortageVersion, VersionSelector, admit, cmp_version_str, parse_version};
