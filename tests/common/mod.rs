// tests/common/mod.rs

//! Shared test utilities: a recipe tree and a local store in a temp dir.

use repo_devkit::artifact::ArtifactMetadata;
use repo_devkit::{
    Backend, BackendKind, BackendOptions, DevkitSpecs, Error, RepoKnife, Result, open_backend,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Category used by every helper
pub const CATEGORY: &str = "cat";

/// A recipe tree plus a local artifact store.
///
/// Keep the value alive for the duration of the test to prevent cleanup.
pub struct TestRepo {
    _dir: TempDir,
    pub tree: PathBuf,
    pub store: PathBuf,
}

impl TestRepo {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let tree = dir.path().join("tree");
        let store = dir.path().join("store");
        fs::create_dir_all(&tree).unwrap();
        fs::create_dir_all(&store).unwrap();

        Self {
            _dir: dir,
            tree,
            store,
        }
    }

    /// Add `cat/<name>-<version>` to the tree with the given build requires
    pub fn define(&self, name: &str, version: &str, build_requires: &[&str]) -> &Self {
        let dir = self.tree.join(CATEGORY).join(format!("{}-{}", name, version));
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("definition.yaml"),
            format!(
                "name: {}\ncategory: {}\nversion: \"{}\"\n",
                name, CATEGORY, version
            ),
        )
        .unwrap();

        if !build_requires.is_empty() {
            fs::write(dir.join("build.yaml"), requires_yaml(build_requires)).unwrap();
        }
        self
    }

    /// Store a payload and its metadata for `cat/<name>-<version>`
    pub fn publish(&self, name: &str, version: &str) -> &Self {
        self.put(&payload_name(name, version), "payload");
        self.put(&metadata_name(name, version), &metadata_yaml(name, version));
        self
    }

    /// Store an arbitrary file
    pub fn put(&self, key: &str, content: &str) -> &Self {
        fs::write(self.store.join(key), content).unwrap();
        self
    }

    pub fn exists(&self, key: &str) -> bool {
        self.store.join(key).exists()
    }

    /// Knife over the local store with the tree loaded
    pub fn knife(&self, specs: DevkitSpecs) -> RepoKnife {
        let store = open_backend(
            BackendKind::Local,
            Some(path_str(&self.store)),
            &BackendOptions::new(),
        )
        .unwrap();

        self.knife_with(specs, store)
    }

    /// Knife over an arbitrary backend with the tree loaded
    pub fn knife_with(&self, specs: DevkitSpecs, store: Box<dyn Backend>) -> RepoKnife {
        let mut knife = RepoKnife::new(specs, store);
        knife.load_trees(&[&self.tree]).unwrap();
        knife
    }
}

/// Remote store whose listing always fails, as when the service is down
pub struct UnreachableStore;

impl Backend for UnreachableStore {
    fn list(&self) -> Result<Vec<String>> {
        Err(Error::BackendError(
            "Namespace listing returned HTTP 503: unavailable".to_string(),
        ))
    }

    fn fetch_metadata(&self, key: &str) -> Result<ArtifactMetadata> {
        Err(Error::DownloadError(format!("Fetching {} failed", key)))
    }

    fn remove(&self, key: &str) -> Result<()> {
        Err(Error::BackendError(format!("Removing {} failed", key)))
    }
}

pub fn payload_name(name: &str, version: &str) -> String {
    format!("{}-{}.package.tar", name, version)
}

pub fn metadata_name(name: &str, version: &str) -> String {
    format!("{}-{}.metadata.yaml", name, version)
}

pub fn metadata_yaml(name: &str, version: &str) -> String {
    format!(
        "path: /build/{}\ncompilespec:\n  package:\n    name: {}\n    category: {}\n    version: \"{}\"\n",
        payload_name(name, version),
        name,
        CATEGORY,
        version
    )
}

fn requires_yaml(names: &[&str]) -> String {
    let mut yaml = String::from("requires:\n");
    for name in names {
        yaml.push_str(&format!(
            "  - name: {}\n    category: {}\n    version: \">=0\"\n",
            name, CATEGORY
        ));
    }
    yaml
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}
