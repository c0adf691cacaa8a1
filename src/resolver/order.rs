// src/resolver/order.rs

//! Build order computation over the level structure
//!
//! 1. Missing packages are added at level 1 and their build requires are
//!    expanded one level deeper each time, guarded against cycles.
//! 2. Every graph node absent from the top level is added there too, with
//!    its own subtree.
//! 3. Optionally, shared dependencies are serialized: packages needing the
//!    same leaf are chained so they end up on distinct levels. Each pass
//!    rewrites the graph and the levels are rebuilt from it.
//! 4. Levels are walked from the deepest; the first occurrence of a missing
//!    package's key emits it.

use super::graph::{DepGraph, DepNode, Reparent};
use super::levels::{LevelTree, Levels};
use crate::package::PackageRef;
use crate::tree::Catalog;
use crate::version::cmp_version_str;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, info, warn};

/// Result of a build order computation
#[derive(Debug, Clone, Default)]
pub struct OrderedBuild {
    /// Missing packages, dependencies first
    pub order: Vec<PackageRef>,
    /// Packages whose build requires were rewritten while serializing
    pub changed: Vec<String>,
    /// Missing packages absent from the build catalog
    pub skipped: Vec<PackageRef>,
    /// Serialization passes run (0 without resolve)
    pub passes: usize,
}

/// Stateful driver for one build order computation
pub struct BuildOrder<'a> {
    catalog: &'a Catalog,
    graph: DepGraph,
    levels: Levels,
    roots: Vec<PackageRef>,
    expanded: HashSet<(String, usize)>,
    unresolved: BTreeSet<String>,
    changed: BTreeSet<String>,
}

impl<'a> BuildOrder<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            graph: DepGraph::new(),
            levels: Levels::new(),
            roots: Vec::new(),
            expanded: HashSet::new(),
            unresolved: BTreeSet::new(),
            changed: BTreeSet::new(),
        }
    }

    pub fn graph(&self) -> &DepGraph {
        &self.graph
    }

    pub fn levels(&self) -> &Levels {
        &self.levels
    }

    /// Order `missing`; `resolve` enables the serialization pass
    pub fn run(&mut self, missing: &[PackageRef], resolve: bool) -> OrderedBuild {
        let mut skipped = Vec::new();

        for pkg in missing {
            if self.add_deps(pkg, None, 1, &mut Vec::new()) {
                self.roots.push(pkg.clone());
            } else {
                warn!("Skipping {}: not available in the build tree", pkg);
                skipped.push(pkg.clone());
            }
        }
        self.align_top_level();

        if let Some(cycle) = self.graph.detect_cycle() {
            warn!("Build dependencies contain a cycle: {}", cycle.join(" <- "));
        }

        let passes = if resolve { self.resolve() } else { 0 };
        debug!("Levels:\n{}", self.levels);

        let order = self.emit(&group_by_key(&self.roots));
        if !self.changed.is_empty() {
            info!("Serialized build requires of {} packages", self.changed.len());
        }

        OrderedBuild {
            order,
            changed: self.changed.iter().cloned().collect(),
            skipped,
            passes,
        }
    }

    /// Place `pkg` at `level` and expand its requires below it
    ///
    /// Returns false when the package is unknown to the build catalog.
    fn add_deps(
        &mut self,
        pkg: &PackageRef,
        father: Option<&str>,
        level: usize,
        stack: &mut Vec<String>,
    ) -> bool {
        let key = pkg.key();
        if stack.contains(&key) {
            debug!("Cycle detected on {} ({})", key, stack.join(" -> "));
            return true;
        }

        if !self.graph.contains(&key) {
            match self.catalog.find_best(pkg) {
                Some(def) => {
                    self.graph
                        .insert(DepNode::new(def.package(), def.requires.clone()));
                }
                None => {
                    if father.is_some() && self.unresolved.insert(key.clone()) {
                        warn!("Dependency {} of {} not found", pkg, father.unwrap_or_default());
                    }
                    return false;
                }
            }
        }

        self.levels.extend_to(level);
        if let Some(tree) = self.levels.tree_mut(level - 1) {
            tree.add(&key, father);
        }

        if !self.expanded.insert((key.clone(), level)) {
            return true;
        }

        let requires = self
            .graph
            .get(&key)
            .map(|n| n.requires.clone())
            .unwrap_or_default();

        stack.push(key.clone());
        for dep in &requires {
            self.add_deps(dep, Some(&key), level + 1, stack);
        }
        stack.pop();
        true
    }

    /// Ensure the top level holds every node of the graph
    fn align_top_level(&mut self) {
        let keys: Vec<String> = self.graph.keys().cloned().collect();
        for key in keys {
            if self.levels.tree(0).is_some_and(|t| t.contains(&key)) {
                continue;
            }
            if let Some(pkg) = self.graph.get(&key).map(|n| n.package.clone()) {
                self.add_deps(&pkg, None, 1, &mut Vec::new());
            }
        }
    }

    /// Recompute the levels from the current graph
    fn rebuild_levels(&mut self) {
        self.levels = Levels::new();
        self.expanded.clear();

        let roots = self.roots.clone();
        for root in &roots {
            self.add_deps(root, None, 1, &mut Vec::new());
        }
        self.align_top_level();
    }

    fn resolve(&mut self) -> usize {
        let mut passes = 0;
        loop {
            let top = self.levels.tree(0).map_or(0, LevelTree::len);
            self.levels.extend_to(top);
            passes += 1;

            if !self.sweep() {
                break;
            }
            self.rebuild_levels();
        }
        debug!("Resolve completed after {} passes", passes);
        passes
    }

    /// One bottom-up pass over every leaf; true when the graph changed
    ///
    /// Levels are rebuilt once per pass, not per change. Reparenting checks
    /// its preconditions on the live graph, so stale leaves are harmless.
    fn sweep(&mut self) -> bool {
        let mut changed = false;
        for pos in (0..self.levels.len()).rev() {
            let keys = self.levels.tree(pos).map(LevelTree::keys).unwrap_or_default();
            for key in keys {
                changed |= self.analyze_leaf(pos, &key);
            }
        }
        changed
    }

    fn analyze_leaf(&mut self, pos: usize, key: &str) -> bool {
        let Some(leaf) = self.levels.tree(pos).and_then(|t| t.get(key)).cloned() else {
            return false;
        };

        if leaf.fathers.is_empty() {
            if pos != 0 {
                warn!("Unexpected leaf without father at level {} for {}", pos, key);
            }
            return false;
        }

        let first = leaf.fathers[0].clone();
        let mut last = first.clone();
        let mut rescan = false;

        // Chain the fathers sharing this leaf
        for pair in leaf.fathers.windows(2) {
            if self.apply(&pair[1], key, &pair[0]) {
                last = pair[1].clone();
                rescan = true;
            }
        }

        for upper in (0..pos).rev() {
            let Some(ancestor) = self.levels.tree(upper).and_then(|t| t.get(key)).cloned() else {
                continue;
            };

            if ancestor.fathers.is_empty() {
                if upper == 0 {
                    debug!("Dropping {} from the top level", key);
                    if let Some(tree) = self.levels.tree_mut(0) {
                        tree.remove(key);
                    }
                }
                continue;
            }

            for father in &ancestor.fathers {
                if *father == first || *father == last {
                    continue;
                }
                if self.apply(father, key, &last) {
                    last = father.clone();
                    rescan = true;
                }
            }
        }

        rescan
    }

    fn apply(&mut self, from: &str, old_dep: &str, new_dep: &str) -> bool {
        match self.graph.reparent(from, old_dep, new_dep) {
            Reparent::Cycle => {
                debug!("Not moving {} onto {}: cycle", from, new_dep);
                false
            }
            outcome if outcome.is_change() => {
                debug!("{} now builds after {} instead of {} ({:?})", from, new_dep, old_dep, outcome);
                self.changed.insert(from.to_string());
                true
            }
            _ => false,
        }
    }

    fn emit(&self, missing: &BTreeMap<String, Vec<PackageRef>>) -> Vec<PackageRef> {
        let mut processed = HashSet::new();
        let mut order = Vec::new();

        for tree in self.levels.deepest_first() {
            for leaf in tree.leaves() {
                if processed.contains(&leaf.key) {
                    continue;
                }
                if let Some(pkgs) = missing.get(&leaf.key) {
                    processed.insert(leaf.key.clone());
                    order.extend(pkgs.iter().cloned());
                }
            }
        }
        order
    }
}

/// Missing packages grouped by key, versions ascending
fn group_by_key(pkgs: &[PackageRef]) -> BTreeMap<String, Vec<PackageRef>> {
    let mut grouped: BTreeMap<String, Vec<PackageRef>> = BTreeMap::new();
    for pkg in pkgs {
        let versions = grouped.entry(pkg.key()).or_default();
        if !versions.contains(pkg) {
            versions.push(pkg.clone());
        }
    }

    for versions in grouped.values_mut() {
        versions.sort_by(|a, b| cmp_version_str(&a.version, &b.version));
    }
    grouped
}

/// Order `missing` using the build requires of `catalog`
pub fn resolve_build_order(catalog: &Catalog, missing: &[PackageRef], resolve: bool) -> OrderedBuild {
    BuildOrder::new(catalog).run(missing, resolve)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::parse_definition;

    fn catalog(layout: &[(&str, &[&str])]) -> Catalog {
        let mut catalog = Catalog::new();
        for (name, deps) in layout {
            let mut yaml = format!("name: {}\ncategory: cat\nversion: \"1.0\"\nrequires:\n", name);
            for dep in *deps {
                yaml.push_str(&format!("  - name: {}\n    category: cat\n    version: \">=0\"\n", dep));
            }
            if deps.is_empty() {
                yaml.push_str("  []\n");
            }
            catalog.insert(parse_definition(&yaml).unwrap());
        }
        catalog
    }

    fn missing(names: &[&str]) -> Vec<PackageRef> {
        names.iter().map(|n| PackageRef::new("cat", n, "1.0")).collect()
    }

    fn names(order: &[PackageRef]) -> Vec<String> {
        order.iter().map(|p| p.name.clone()).collect()
    }

    fn position(order: &[String], name: &str) -> usize {
        order.iter().position(|n| n == name).unwrap()
    }

    fn chain_catalog() -> Catalog {
        // a → b → c, d → b
        catalog(&[("a", &["b"]), ("b", &["c"]), ("c", &[]), ("d", &["b"])])
    }

    #[test]
    fn test_build_ordered() {
        let catalog = chain_catalog();
        let result = resolve_build_order(&catalog, &missing(&["a", "b", "c", "d"]), false);
        let order = names(&result.order);

        assert_eq!(order.len(), 4);
        assert_eq!(&order[..2], &["c", "b"]);
        assert!(result.changed.is_empty());
    }

    #[test]
    fn test_build_ordered_with_resolve() {
        let catalog = chain_catalog();
        let result = resolve_build_order(&catalog, &missing(&["a", "b", "c", "d"]), true);
        let order = names(&result.order);

        assert_eq!(order.len(), 4);
        for late in ["a", "d"] {
            for early in ["b", "c"] {
                assert!(position(&order, early) < position(&order, late), "{:?}", order);
            }
        }
        assert_eq!(result.changed, vec!["cat/d"]);
    }

    #[test]
    fn test_shared_dependency_serialized_in_one_pass() {
        // p00..p19 all need base
        let fans: Vec<String> = (0..20).map(|i| format!("p{:02}", i)).collect();
        let mut layout: Vec<(&str, &[&str])> = vec![("base", &[])];
        layout.extend(fans.iter().map(|n| (n.as_str(), &["base"][..])));
        let catalog = catalog(&layout);

        let mut todo: Vec<&str> = fans.iter().map(String::as_str).collect();
        todo.push("base");
        let result = resolve_build_order(&catalog, &missing(&todo), true);
        let order = names(&result.order);

        assert_eq!(result.changed.len(), 19);
        assert!(result.passes <= 3, "{} passes", result.passes);
        assert_eq!(order[0], "base");
        for pair in fans.windows(2) {
            assert!(position(&order, &pair[0]) < position(&order, &pair[1]), "{:?}", order);
        }
    }

    #[test]
    fn test_only_missing_are_emitted() {
        let catalog = chain_catalog();
        let result = resolve_build_order(&catalog, &missing(&["a", "d"]), true);
        let order = names(&result.order);
        assert_eq!(order.len(), 2);
        assert!(order.contains(&"a".to_string()));
        assert!(order.contains(&"d".to_string()));
    }

    #[test]
    fn test_missing_root_skipped() {
        let catalog = chain_catalog();
        let result = resolve_build_order(&catalog, &missing(&["c", "ghost"]), false);
        assert_eq!(names(&result.order), vec!["c"]);
        assert_eq!(names(&result.skipped), vec!["ghost"]);
    }

    #[test]
    fn test_unknown_dependency_ignored() {
        let catalog = catalog(&[("a", &["ghost", "b"]), ("b", &[])]);
        let result = resolve_build_order(&catalog, &missing(&["a", "b"]), true);
        assert_eq!(names(&result.order), vec!["b", "a"]);
    }

    #[test]
    fn test_cycle_terminates() {
        // a ⇄ b, both need x
        let catalog = catalog(&[("a", &["b", "x"]), ("b", &["a", "x"]), ("x", &[])]);
        for resolve in [false, true] {
            let result = resolve_build_order(&catalog, &missing(&["a", "b", "x"]), resolve);
            let order = names(&result.order);
            assert_eq!(order.len(), 3);
            assert_eq!(order[0], "x");
        }
    }

    #[test]
    fn test_all_versions_emitted() {
        let mut catalog = catalog(&[("lib", &[])]);
        catalog.insert(
            parse_definition("name: lib\ncategory: cat\nversion: \"0.9\"\n").unwrap(),
        );
        let todo = vec![
            PackageRef::new("cat", "lib", "1.0"),
            PackageRef::new("cat", "lib", "0.9"),
        ];
        let result = resolve_build_order(&catalog, &todo, false);
        let versions: Vec<&str> = result.order.iter().map(|p| p.version.as_str()).collect();
        assert_eq!(versions, vec!["0.9", "1.0"]);
    }

    #[test]
    fn test_order_respects_transitive_deps() {
        let layout: &[(&str, &[&str])] = &[
            ("app", &["gui", "net"]),
            ("gui", &["gfx", "base"]),
            ("net", &["ssl", "base"]),
            ("ssl", &["base"]),
            ("gfx", &["base", "ssl"]),
            ("tool", &["net", "gfx"]),
            ("base", &[]),
        ];
        let catalog = catalog(layout);
        let all: Vec<&str> = layout.iter().map(|(n, _)| *n).collect();

        for resolve in [false, true] {
            let result = resolve_build_order(&catalog, &missing(&all), resolve);
            let order = names(&result.order);
            assert_eq!(order.len(), all.len());

            for (name, deps) in layout {
                for dep in *deps {
                    assert!(
                        position(&order, dep) < position(&order, name),
                        "{} before {} in {:?}",
                        dep,
                        name,
                        order
                    );
                }
            }
        }
    }
}
