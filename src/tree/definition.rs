// src/tree/definition.rs

//! Package definitions read from `definition.yaml` / `build.yaml`

use crate::error::{Error, Result};
use crate::package::{PackageRef, null_as_default, optional_scalar_string, scalar_string, sanitize_category};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File holding a package definition
pub const DEFINITION_FILE: &str = "definition.yaml";

/// Optional sibling holding build-time requires
pub const BUILD_FILE: &str = "build.yaml";

/// A package as described by a recipe tree
#[derive(Debug, Clone, Deserialize)]
pub struct PackageDefinition {
    pub name: String,
    pub category: String,
    #[serde(default, deserialize_with = "scalar_string")]
    pub version: String,
    #[serde(default, deserialize_with = "optional_scalar_string")]
    pub slot: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub requires: Vec<PackageRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub conflicts: Vec<PackageRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub provides: Vec<PackageRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: BTreeMap<String, serde_yaml::Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub uses: Vec<String>,

    /// Directory the definition was read from
    #[serde(skip)]
    pub path: PathBuf,
}

/// The subset of `build.yaml` the devkit consumes
#[derive(Debug, Default, Deserialize)]
struct BuildDefinition {
    #[serde(default, deserialize_with = "null_as_default")]
    requires: Vec<PackageRef>,
}

impl PackageDefinition {
    /// Identity of this definition with a concrete version
    pub fn package(&self) -> PackageRef {
        PackageRef::new(&self.category, &self.name, &self.version)
    }

    pub fn key(&self) -> String {
        format!("{}/{}", self.category, self.name)
    }

    /// Fold the slot into the category here and in every reference
    pub fn sanitized(mut self) -> Self {
        if let Some(slot) = self.slot.take() {
            self.category = sanitize_category(&self.category, &slot);
        }
        self.requires = sanitize_all(self.requires);
        self.conflicts = sanitize_all(self.conflicts);
        self.provides = sanitize_all(self.provides);
        self
    }
}

fn sanitize_all(refs: Vec<PackageRef>) -> Vec<PackageRef> {
    refs.into_iter().map(PackageRef::sanitized).collect()
}

/// Parse a definition from a YAML string
pub fn parse_definition(content: &str) -> Result<PackageDefinition> {
    let def: PackageDefinition = serde_yaml::from_str(content)
        .map_err(|e| Error::ParseError(format!("Invalid definition: {}", e)))?;

    if def.name.is_empty() || def.category.is_empty() {
        return Err(Error::ParseError(
            "Definition name and category cannot be empty".to_string(),
        ));
    }

    Ok(def.sanitized())
}

/// Parse `definition.yaml` and record its directory as the definition path
pub fn parse_definition_file(path: &Path) -> Result<PackageDefinition> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::IoError(format!("Failed to read definition {}: {}", path.display(), e))
    })?;

    let mut def = parse_definition(&content)
        .map_err(|e| Error::ParseError(format!("{}: {}", path.display(), e)))?;
    def.path = path.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok(def)
}

/// Read the build-time requires next to a definition, empty when absent
pub fn parse_build_requires(dir: &Path) -> Result<Vec<PackageRef>> {
    let path = dir.join(BUILD_FILE);
    if !path.is_file() {
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(&path).map_err(|e| {
        Error::IoError(format!("Failed to read {}: {}", path.display(), e))
    })?;

    // An empty build.yaml is allowed
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let build: BuildDefinition = serde_yaml::from_str(&content)
        .map_err(|e| Error::ParseError(format!("{}: {}", path.display(), e)))?;
    Ok(sanitize_all(build.requires))
}
