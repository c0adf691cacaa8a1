// src/backend/mod.rs

//! Artifact store backends
//!
//! Every store is reached through the three-operation [`Backend`] trait. The
//! concrete implementation is picked once, by [`BackendKind`], when the
//! devkit is constructed:
//! - `local`: a plain directory
//! - `s3`: an S3-compatible bucket
//! - `http`: a namespace on an HTTP artifact service

mod http;
mod local;
mod profile;
mod s3;

pub use http::HttpBackend;
pub use local::LocalBackend;
pub use profile::{PROFILES_ENV, Profile, ProfileStore};
pub use s3::S3Backend;

use crate::artifact::ArtifactMetadata;
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::path::Path;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

/// Operations the devkit needs from an artifact store
pub trait Backend {
    /// Every key in the store; never a partial listing
    fn list(&self) -> Result<Vec<String>>;

    /// Fetch and decode the metadata sidecar stored under `key`
    fn fetch_metadata(&self, key: &str) -> Result<ArtifactMetadata>;

    /// Delete `key` from the store
    fn remove(&self, key: &str) -> Result<()>;
}

/// Available backend implementations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum BackendKind {
    Local,
    S3,
    Http,
}

impl BackendKind {
    /// Parse a backend name, listing the accepted names on failure
    pub fn parse(name: &str) -> Result<Self> {
        name.parse().map_err(|_| {
            let known: Vec<String> = BackendKind::iter().map(|k| k.to_string()).collect();
            Error::ConfigError(format!(
                "Invalid backend '{}' (expected one of: {})",
                name,
                known.join(", ")
            ))
        })
    }
}

/// String options handed to a backend constructor
///
/// Names are the bare option names (`bucket`, `endpoint`, `namespace`, ...).
#[derive(Debug, Clone, Default)]
pub struct BackendOptions {
    values: BTreeMap<String, String>,
}

impl BackendOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option; empty values are treated as unset
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        if !value.is_empty() {
            self.values.insert(name.to_string(), value);
        }
        self
    }

    /// Set an option only when a value is present
    pub fn set_opt(&mut self, name: &str, value: Option<impl Into<String>>) -> &mut Self {
        if let Some(v) = value {
            self.set(name, v);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Fetch a mandatory option
    pub fn require(&self, name: &str, backend: BackendKind) -> Result<&str> {
        self.get(name).ok_or_else(|| {
            Error::InitError(format!("The {} backend requires the '{}' option", backend, name))
        })
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for BackendOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut opts = BackendOptions::new();
        for (k, v) in iter {
            opts.set(&k.into(), v);
        }
        opts
    }
}

/// Construct the backend selected by `kind`
///
/// `path` is the store directory for the local backend. Remote backends
/// accept it as an optional local artifact directory that must exist.
pub fn open_backend(
    kind: BackendKind,
    path: Option<&str>,
    opts: &BackendOptions,
) -> Result<Box<dyn Backend>> {
    if kind != BackendKind::Local {
        if let Some(p) = path.filter(|p| !p.is_empty()) {
            if !Path::new(p).exists() {
                return Err(Error::InitError(format!("The path {} doesn't exist", p)));
            }
        }
    }

    let backend: Box<dyn Backend> = match kind {
        BackendKind::Local => {
            let path = path.filter(|p| !p.is_empty()).ok_or_else(|| {
                Error::InitError("The local backend requires a path".to_string())
            })?;
            Box::new(LocalBackend::new(path)?)
        }
        BackendKind::S3 => Box::new(S3Backend::new(opts)?),
        BackendKind::Http => Box::new(HttpBackend::new(opts)?),
    };

    Ok(backend)
}
