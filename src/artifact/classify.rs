// src/artifact/classify.rs

//! Classification of store keys
//!
//! Keys are classified by file name, in ladder order:
//! 1. repository index files (`repository.yaml`, `tree.tar.*`, ...)
//! 2. metadata sidecars (`*metadata.yaml`)
//! 3. payloads (`*package.tar`, `*package.tar.<ext>`)
//! 4. anything else is a stray

use regex::Regex;
use std::sync::LazyLock;
use strum_macros::{Display, EnumString};

static INDEX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(repository\.meta\.yaml(\.tar\..+)?|repository\.yaml|tree\.tar(\..+)?|compilertree\.tar(\..+)?)$",
    )
    .unwrap()
});

static METADATA_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"metadata\.yaml$").unwrap());

static PAYLOAD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"package\.tar(\.[^.]+)*$").unwrap());

static SIBLING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.package\.tar(\.gz|\.zst)?$").unwrap());

/// Structural category of a store key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum ArtifactKind {
    /// Repository index file, never touched
    RepositoryIndex,
    /// Metadata sidecar
    Metadata,
    /// Package payload tarball
    Payload,
    /// Anything else
    Stray,
}

/// File name part of a key
pub fn basename(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// Directory part of a key including the trailing `/`, empty for flat keys
pub fn dirname(key: &str) -> &str {
    match key.rfind('/') {
        Some(idx) => &key[..=idx],
        None => "",
    }
}

/// Classify a key by its file name
pub fn classify(key: &str) -> ArtifactKind {
    let name = basename(key);

    if INDEX_RE.is_match(name) {
        ArtifactKind::RepositoryIndex
    } else if METADATA_RE.is_match(name) {
        ArtifactKind::Metadata
    } else if PAYLOAD_RE.is_match(name) {
        ArtifactKind::Payload
    } else {
        ArtifactKind::Stray
    }
}

/// Metadata key paired with a payload key
///
/// `foo-1.0.package.tar.zst` → `foo-1.0.metadata.yaml`. Payloads with an
/// unknown compression extension map to themselves and never pair.
pub fn sibling_metadata(payload_key: &str) -> String {
    SIBLING_RE.replace(payload_key, ".metadata.yaml").into_owned()
}
