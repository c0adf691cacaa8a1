// src/artifact/mod.rs

//! Artifacts stored in the repository namespace
//!
//! The store is a flat set of keys. Payload tarballs and their metadata
//! sidecars are siblings whose names differ only by extension.

mod classify;
mod metadata;

pub use classify::{ArtifactKind, basename, classify, dirname, sibling_metadata};
pub use metadata::{ArtifactMetadata, CompileSpec, SpecPackage};
