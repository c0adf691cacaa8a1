// src/backend/local.rs

//! Store backed by a local directory

use super::Backend;
use crate::artifact::ArtifactMetadata;
use crate::error::{Error, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A flat directory of artifacts; subdirectories are not part of the store
#[derive(Debug)]
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    /// Open `path`, which must be an existing directory
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref();
        let meta = fs::metadata(root).map_err(|e| {
            Error::InitError(format!("Cannot access store path {}: {}", root.display(), e))
        })?;

        if !meta.is_dir() {
            return Err(Error::InitError(format!(
                "Store path {} is not a directory",
                root.display()
            )));
        }

        Ok(Self {
            root: root.to_path_buf(),
        })
    }
}

impl Backend for LocalBackend {
    fn list(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.root).map_err(|e| {
            Error::IoError(format!("Failed to list {}: {}", self.root.display(), e))
        })?;

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                Error::IoError(format!("Failed to list {}: {}", self.root.display(), e))
            })?;
            if entry.file_type()?.is_dir() {
                continue;
            }
            // A lossy key would name a path that does not exist
            match entry.file_name().into_string() {
                Ok(name) => keys.push(name),
                Err(name) => warn!(
                    "Skipping {}: file name is not valid UTF-8",
                    self.root.join(name).display()
                ),
            }
        }

        keys.sort();
        debug!("Local store {} holds {} files", self.root.display(), keys.len());
        Ok(keys)
    }

    fn fetch_metadata(&self, key: &str) -> Result<ArtifactMetadata> {
        let path = self.root.join(key);
        let bytes = fs::read(&path)
            .map_err(|e| Error::IoError(format!("Failed to read {}: {}", path.display(), e)))?;
        ArtifactMetadata::from_yaml(&bytes)
            .map_err(|e| Error::ParseError(format!("{}: {}", key, e)))
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.root.join(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("{} already absent", path.display());
                Ok(())
            }
            Err(e) => Err(Error::BackendError(format!(
                "Failed to remove {}: {}",
                path.display(),
                e
            ))),
        }
    }
}
