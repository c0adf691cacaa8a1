// src/backend/profile.rs

//! Named connection profiles for the HTTP namespace backend
//!
//! ```yaml
//! profiles:
//!   prod:
//!     master: https://artifacts.example.org
//!     api_key: abc123
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable overriding the profile store location
pub const PROFILES_ENV: &str = "REPO_DEVKIT_PROFILES";

/// Connection settings of one profile
#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub master: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileStore {
    #[serde(default)]
    profiles: BTreeMap<String, Profile>,
}

impl ProfileStore {
    /// Location of the profile store: `$REPO_DEVKIT_PROFILES`, else
    /// `<config dir>/repo-devkit/profiles.yaml`
    pub fn default_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(PROFILES_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|d| d.join("repo-devkit").join("profiles.yaml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("Failed to read profiles {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
            .map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e)))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| Error::ConfigError(format!("Invalid profile store: {}", e)))
    }

    /// Load the store from its default location
    pub fn load_default() -> Result<Self> {
        let path = Self::default_path().ok_or_else(|| {
            Error::ConfigError("Cannot determine the profile store location".to_string())
        })?;
        Self::load(&path)
    }

    pub fn get(&self, name: &str) -> Result<&Profile> {
        self.profiles
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("Profile '{}'", name)))
    }
}
