// src/specs/mod.rs

//! Operator configuration (the specs file)
//!
//! ```yaml
//! cleaner:
//!   excludes:
//!     - "^keep-.*"
//! list:
//!   exclude_pkgs:
//!     - name: gcc
//!       category: sys-devel
//!       version: ">=13"
//! ```
//!
//! Every section is optional. Exclude regexes are compiled when the file is
//! loaded, so an invalid pattern is reported before any store access.

use crate::error::{Error, Result};
use crate::package::{PackageRef, null_as_default, scalar_string};
use crate::version::{PortageVersion, VersionSelector};
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

/// `cleaner` section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CleanerSpecs {
    /// Store keys matching any of these regexes are invisible to the knife
    #[serde(default, deserialize_with = "null_as_default")]
    pub excludes: Vec<String>,
}

/// One entry of the missing-list ignore rules
#[derive(Debug, Clone, Deserialize)]
pub struct IgnoredPackage {
    pub name: String,
    pub category: String,
    #[serde(default, deserialize_with = "scalar_string")]
    pub version: String,
}

impl IgnoredPackage {
    fn matches_key(&self, pkg: &PackageRef) -> bool {
        self.name == pkg.name && self.category == pkg.category
    }
}

/// `list` section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListSpecs {
    #[serde(default, deserialize_with = "null_as_default")]
    pub exclude_pkgs: Vec<IgnoredPackage>,
}

/// Parsed specs file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DevkitSpecs {
    #[serde(default, deserialize_with = "null_as_default")]
    pub cleaner: CleanerSpecs,
    #[serde(default, deserialize_with = "null_as_default")]
    pub list: ListSpecs,

    #[serde(skip)]
    excludes: Vec<Regex>,
}

impl DevkitSpecs {
    /// Empty configuration: nothing excluded, nothing ignored
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let mut specs: DevkitSpecs = if content.trim().is_empty() {
            DevkitSpecs::default()
        } else {
            serde_yaml::from_str(content)
                .map_err(|e| Error::ConfigError(format!("Invalid specs: {}", e)))?
        };

        specs.excludes = specs
            .cleaner
            .excludes
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| {
                    Error::ConfigError(format!("Invalid exclude regex '{}': {}", pattern, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(specs)
    }

    /// Whether `key` matches any cleaner exclude rule
    pub fn is_excluded(&self, key: &str) -> bool {
        self.excludes.iter().any(|re| re.is_match(key))
    }

    /// Whether `pkg` is covered by an ignore rule
    ///
    /// When the candidate version or the selector of a rule naming the same
    /// package cannot be parsed, the candidate is ignored.
    pub fn to_ignore(&self, pkg: &PackageRef) -> bool {
        let mut rules = self
            .list
            .exclude_pkgs
            .iter()
            .filter(|rule| rule.matches_key(pkg))
            .peekable();

        if rules.peek().is_none() {
            return false;
        }

        let version = match PortageVersion::parse(&pkg.version) {
            Ok(v) => v,
            Err(e) => {
                warn!("Ignoring {}: unparseable version: {}", pkg.fingerprint(), e);
                return true;
            }
        };

        for rule in rules {
            match VersionSelector::parse(&rule.version) {
                Ok(selector) if selector.admits(&version) => return true,
                Ok(_) => {}
                Err(e) => {
                    warn!(
                        "Ignoring {}: invalid selector '{}': {}",
                        pkg.fingerprint(),
                        rule.version,
                        e
                    );
                    return true;
                }
            }
        }

        false
    }
}

/// Load the specs file at `path`
pub fn load_specs_file(path: impl AsRef<Path>) -> Result<DevkitSpecs> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::ConfigError(format!("Failed to read specs file {}: {}", path.display(), e))
    })?;
    DevkitSpecs::from_yaml(&content)
}
