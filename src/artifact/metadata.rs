// src/artifact/metadata.rs

//! Metadata sidecar decoding

use crate::error::{Error, Result};
use crate::artifact::classify::basename;
use crate::package::{PackageRef, null_as_default, optional_scalar_string, scalar_string};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Package identity as recorded in the compile spec
#[derive(Debug, Clone, Deserialize)]
pub struct SpecPackage {
    pub name: String,
    pub category: String,
    #[serde(default, deserialize_with = "scalar_string")]
    pub version: String,
    #[serde(default, deserialize_with = "optional_scalar_string")]
    pub slot: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: BTreeMap<String, serde_yaml::Value>,
}

/// Build description embedded in the sidecar
#[derive(Debug, Clone, Deserialize)]
pub struct CompileSpec {
    pub package: SpecPackage,
    #[serde(default, deserialize_with = "null_as_default")]
    pub requires: Vec<PackageRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub conflicts: Vec<PackageRef>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub steps: Vec<serde_yaml::Value>,
}

/// Decoded `*.metadata.yaml`
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactMetadata {
    /// Payload file the sidecar describes; only the file name is meaningful
    pub path: String,
    pub compilespec: CompileSpec,
}

impl ArtifactMetadata {
    pub fn from_yaml(bytes: &[u8]) -> Result<Self> {
        serde_yaml::from_slice(bytes)
            .map_err(|e| Error::ParseError(format!("Invalid artifact metadata: {}", e)))
    }

    /// Slot-sanitized identity of the packaged artifact
    pub fn package(&self) -> PackageRef {
        let spec = &self.compilespec.package;
        PackageRef {
            category: spec.category.clone(),
            name: spec.name.clone(),
            version: spec.version.clone(),
            slot: spec.slot.clone(),
        }
        .sanitized()
    }

    /// File name of the payload
    pub fn payload_name(&self) -> &str {
        basename(&self.path)
    }
}
