// src/devkit/mod.rs

//! Repository maintenance operations
//!
//! - [`RepoKnife`] classifies the store against the loaded trees
//! - [`RepoCleaner`] removes what the knife rejected
//! - [`RepoList`] reports available and missing packages

mod cleaner;
mod knife;
mod list;

pub use cleaner::{CleanReport, RepoCleaner};
pub use knife::{Analysis, RepoKnife};
pub use list::RepoList;
