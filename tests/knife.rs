// tests/knife.rs

//! Integration tests for store analysis and cleanup over a local store.

mod common;

use common::{TestRepo, UnreachableStore, metadata_name, metadata_yaml, payload_name};
use repo_devkit::{DevkitSpecs, Error, RepoCleaner, RepoList};
use std::collections::BTreeSet;

fn removal_set(repo: &TestRepo) -> BTreeSet<String> {
    let knife = repo.knife(DevkitSpecs::new());
    knife.analyze().unwrap().to_remove.into_iter().collect()
}

fn set(keys: &[&str]) -> BTreeSet<String> {
    keys.iter().map(|k| k.to_string()).collect()
}

#[test]
fn test_stray_files_removed() {
    let repo = TestRepo::new();
    repo.define("a", "1.0", &[]);
    repo.publish("a", "1.0")
        .put("stray.txt", "junk")
        .put("repository.yaml", "index");

    let knife = repo.knife(DevkitSpecs::new());
    let analysis = knife.analyze().unwrap();

    assert_eq!(analysis.to_remove, vec!["stray.txt"]);
    assert_eq!(analysis.index_files, vec!["repository.yaml"]);
    assert_eq!(analysis.metadata.len(), 1);
    assert_eq!(analysis.payloads.len(), 1);
}

#[test]
fn test_orphaned_payload() {
    let repo = TestRepo::new();
    repo.define("a", "1.0", &[]);
    repo.put(&payload_name("a", "1.0"), "payload");

    assert_eq!(removal_set(&repo), set(&["a-1.0.package.tar"]));
}

#[test]
fn test_orphaned_metadata() {
    let repo = TestRepo::new();
    repo.define("a", "1.0", &[]);
    repo.put(&metadata_name("a", "1.0"), &metadata_yaml("a", "1.0"));

    assert_eq!(removal_set(&repo), set(&["a-1.0.metadata.yaml"]));
}

#[test]
fn test_stale_package_not_in_tree() {
    let repo = TestRepo::new();
    repo.define("b", "1.0", &[]);
    repo.publish("a", "1.0");

    assert_eq!(
        removal_set(&repo),
        set(&["a-1.0.metadata.yaml", "a-1.0.package.tar"])
    );
}

#[test]
fn test_other_version_in_tree_keeps_artifact() {
    // Membership is checked by category and name only
    let repo = TestRepo::new();
    repo.define("a", "2.0", &[]);
    repo.publish("a", "1.0");

    assert!(removal_set(&repo).is_empty());
}

#[test]
fn test_partition() {
    let repo = TestRepo::new();
    repo.define("a", "1.0", &[]).define("b", "1.0", &[]);
    repo.publish("a", "1.0")
        .publish("b", "1.0")
        .publish("gone", "1.0")
        .put(&payload_name("c", "1.0"), "payload")
        .put("notes.txt", "")
        .put("repository.meta.yaml.tar.zst", "");

    let knife = repo.knife(DevkitSpecs::new());
    let analysis = knife.analyze().unwrap();

    let mut seen: Vec<&String> = analysis
        .metadata
        .keys()
        .chain(analysis.payloads.keys())
        .chain(analysis.to_remove.iter())
        .chain(analysis.index_files.iter())
        .collect();
    let total = seen.len();
    seen.sort();
    seen.dedup();

    assert_eq!(total, seen.len(), "a key landed in two buckets");
    assert_eq!(total, analysis.processed_files);
    assert_eq!(analysis.processed_files, 9);

    // Pairing holds both ways
    for (payload, meta) in &analysis.payloads {
        assert!(analysis.metadata.contains_key(meta), "{} unpaired", payload);
    }
    assert_eq!(analysis.metadata.len(), analysis.payloads.len());
}

#[test]
fn test_excluded_keys_are_untouched() {
    let repo = TestRepo::new();
    repo.define("a", "1.0", &[]);
    repo.put("keep-me.txt", "").put("drop-me.txt", "");

    let specs = DevkitSpecs::from_yaml("cleaner:\n  excludes:\n    - \"^keep-\"\n").unwrap();
    let knife = repo.knife(specs);
    let report = RepoCleaner::new(&knife, false).run().unwrap();

    assert_eq!(report.removed, vec!["drop-me.txt"]);
    assert!(repo.exists("keep-me.txt"));
    assert!(!repo.exists("drop-me.txt"));
}

#[test]
fn test_dry_run_keeps_files() {
    let repo = TestRepo::new();
    repo.define("a", "1.0", &[]);
    repo.put("stray.txt", "");

    let knife = repo.knife(DevkitSpecs::new());
    let report = RepoCleaner::new(&knife, true).run().unwrap();

    assert_eq!(report.candidates, vec!["stray.txt"]);
    assert!(report.removed.is_empty());
    assert!(repo.exists("stray.txt"));
}

#[test]
fn test_cleaner_is_idempotent() {
    let repo = TestRepo::new();
    repo.define("a", "1.0", &[]);
    repo.publish("a", "1.0")
        .publish("old", "0.1")
        .put(&metadata_name("b", "1.0"), &metadata_yaml("b", "1.0"))
        .put("stray.txt", "");

    let knife = repo.knife(DevkitSpecs::new());
    let first = RepoCleaner::new(&knife, false).run().unwrap();
    assert!(first.is_success());
    assert_eq!(first.removed.len(), 4);

    let second = RepoCleaner::new(&knife, false).run().unwrap();
    assert!(second.candidates.is_empty());
    assert!(repo.exists(&payload_name("a", "1.0")));
    assert!(repo.exists(&metadata_name("a", "1.0")));
}

#[test]
fn test_broken_metadata_aborts_analysis() {
    let repo = TestRepo::new();
    repo.define("a", "1.0", &[]);
    repo.put(&payload_name("a", "1.0"), "payload")
        .put(&metadata_name("a", "1.0"), "compilespec: [");

    let knife = repo.knife(DevkitSpecs::new());
    assert!(knife.analyze().is_err());
    assert!(RepoCleaner::new(&knife, false).run().is_err());
    assert!(repo.exists(&payload_name("a", "1.0")));
}

#[cfg(target_os = "linux")]
#[test]
fn test_non_utf8_names_are_never_reported_removed() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let repo = TestRepo::new();
    repo.define("a", "1.0", &[]);
    repo.put("stray.txt", "");
    let odd = repo.store.join(OsStr::from_bytes(b"junk-\xff.txt"));
    std::fs::write(&odd, "").unwrap();

    let knife = repo.knife(DevkitSpecs::new());
    let first = RepoCleaner::new(&knife, false).run().unwrap();
    assert_eq!(first.removed, vec!["stray.txt"]);
    assert!(first.failed.is_empty());

    let second = RepoCleaner::new(&knife, false).run().unwrap();
    assert!(second.candidates.is_empty());
    assert!(odd.exists());
}

#[test]
fn test_failed_listing_aborts_analysis() {
    let repo = TestRepo::new();
    repo.define("a", "1.0", &[]);

    let knife = repo.knife_with(DevkitSpecs::new(), Box::new(UnreachableStore));
    assert!(matches!(knife.analyze(), Err(Error::BackendError(_))));
    assert!(RepoCleaner::new(&knife, false).run().is_err());

    // A partial view of the store must not be reported as missing packages
    let list = RepoList::new(&knife);
    assert!(list.missings().is_err());
    assert!(list.availables().is_err());
}
