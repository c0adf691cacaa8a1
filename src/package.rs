// src/package.rs

//! Package identity shared by the tree reader, the knife and the resolver
//!
//! A package is identified by `(category, name)` for graph purposes and by
//! `category/name-version` (the fingerprint) for set operations.

use crate::error::Result;
use crate::version::VersionSelector;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A package reference as it appears in definitions, requires lists and
/// metadata sidecars
///
/// `version` holds either a concrete version ("1.0") or a selector
/// (">=1.0") depending on where the reference came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageRef {
    pub name: String,
    pub category: String,
    #[serde(default, deserialize_with = "scalar_string")]
    pub version: String,
    #[serde(default, skip_serializing, deserialize_with = "optional_scalar_string")]
    pub slot: Option<String>,
}

impl PackageRef {
    pub fn new(category: &str, name: &str, version: &str) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            version: version.to_string(),
            slot: None,
        }
    }

    /// Graph identity, `category/name`
    pub fn key(&self) -> String {
        format!("{}/{}", self.category, self.name)
    }

    /// Set identity, `category/name-version`
    pub fn fingerprint(&self) -> String {
        format!("{}/{}-{}", self.category, self.name, self.version)
    }

    /// Fold a non-default slot into the category
    ///
    /// Slot "2/2.30" on category "sys-libs" yields category "sys-libs-2".
    /// The slot is consumed so sanitizing twice is a no-op.
    pub fn sanitized(mut self) -> Self {
        if let Some(slot) = self.slot.take() {
            self.category = sanitize_category(&self.category, &slot);
        }
        self
    }

    /// Interpret `version` as a selector
    pub fn selector(&self) -> Result<VersionSelector> {
        VersionSelector::parse(&self.version)
    }
}

impl fmt::Display for PackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fingerprint())
    }
}

/// Effective category for a slotted package
pub fn sanitize_category(category: &str, slot: &str) -> String {
    let slot = slot.trim();
    if slot.is_empty() || slot == "0" {
        return category.to_string();
    }

    let major = slot.split('/').next().unwrap_or(slot);
    if major.is_empty() || major == "0" {
        category.to_string()
    } else {
        format!("{}-{}", category, major)
    }
}

/// Accept unquoted YAML scalars (`version: 1.2`, `slot: 0`) as strings
pub(crate) fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::Null => Ok(String::new()),
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => Err(D::Error::custom(format!("expected a scalar, found {:?}", other))),
    }
}

pub(crate) fn optional_scalar_string<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    scalar_string(deserializer).map(|s| (!s.is_empty()).then_some(s))
}

/// Treat an explicit YAML `null` like a missing key
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_and_fingerprint() {
        let pkg = PackageRef::new("app-misc", "foo", "1.0-r1");
        assert_eq!(pkg.key(), "app-misc/foo");
        assert_eq!(pkg.fingerprint(), "app-misc/foo-1.0-r1");
        assert_eq!(pkg.to_string(), "app-misc/foo-1.0-r1");
    }

    #[test]
    fn test_sanitize_category() {
        assert_eq!(sanitize_category("sys-libs", "0"), "sys-libs");
        assert_eq!(sanitize_category("sys-libs", ""), "sys-libs");
        assert_eq!(sanitize_category("sys-libs", "2"), "sys-libs-2");
        assert_eq!(sanitize_category("sys-libs", "2/2.30"), "sys-libs-2");
        assert_eq!(sanitize_category("dev-lang", "0/1"), "dev-lang");
    }

    #[test]
    fn test_sanitized_is_idempotent() {
        let mut pkg = PackageRef::new("dev-lang", "python", "3.11.4");
        pkg.slot = Some("3.11".to_string());

        let once = pkg.sanitized();
        assert_eq!(once.category, "dev-lang-3.11");
        let twice = once.clone().sanitized();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_deserialize_defaults() {
        let pkg: PackageRef = serde_yaml::from_str("name: foo\ncategory: bar\n").unwrap();
        assert_eq!(pkg.version, "");
        assert!(pkg.selector().unwrap().is_any());
    }

    #[test]
    fn test_deserialize_unquoted_scalars() {
        let pkg: PackageRef =
            serde_yaml::from_str("name: foo\ncategory: bar\nversion: 2\nslot: 0\n").unwrap();
        assert_eq!(pkg.version, "2");
        assert_eq!(pkg.slot.as_deref(), Some("0"));
        assert_eq!(pkg.sanitized().category, "bar");
    }

    #[test]
    fn test_null_as_default() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(default, deserialize_with = "null_as_default")]
            items: Vec<String>,
        }

        let null: Holder = serde_yaml::from_str("items: null
").unwrap();
        assert!(null.items.is_empty());
        let tilde: Holder = serde_yaml::from_str("items: ~
").unwrap();
        assert!(tilde.items.is_empty());
        let set: Holder = serde_yaml::from_str("items: [a]
").unwrap();
        assert_eq!(set.items, vec!["a"]);
    }
}
