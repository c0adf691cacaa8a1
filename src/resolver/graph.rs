// src/resolver/graph.rs

//! Build dependency graph
//!
//! Nodes are keyed by `category/name`; versions never take part in graph
//! identity. Each node owns its outgoing `requires`, which the resolver is
//! allowed to rewrite through [`DepGraph::reparent`].

use crate::package::PackageRef;
use std::collections::{BTreeMap, HashSet};

/// Version selector given to edges created by re-parenting
const ANY_VERSION: &str = ">=0";

/// A package in the build graph
#[derive(Debug, Clone)]
pub struct DepNode {
    pub package: PackageRef,
    pub requires: Vec<PackageRef>,
}

impl DepNode {
    pub fn new(package: PackageRef, requires: Vec<PackageRef>) -> Self {
        Self { package, requires }
    }

    pub fn key(&self) -> String {
        self.package.key()
    }

    fn requires_key(&self, key: &str) -> bool {
        self.requires.iter().any(|r| r.key() == key)
    }
}

/// Outcome of [`DepGraph::reparent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reparent {
    /// Nothing to do: no such edge, or the move would not keep the ordering
    Unchanged,
    /// The new edge would close a cycle; nothing was modified
    Cycle,
    /// The edge was redundant with another path and was removed
    Dropped,
    /// The edge now points at the new dependency
    Moved,
}

impl Reparent {
    pub fn is_change(self) -> bool {
        matches!(self, Reparent::Dropped | Reparent::Moved)
    }
}

/// Arena of build nodes keyed by `category/name`
#[derive(Debug, Default, Clone)]
pub struct DepGraph {
    nodes: BTreeMap<String, DepNode>,
}

impl DepGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, keeping an existing node with the same key
    pub fn insert(&mut self, node: DepNode) -> &DepNode {
        self.nodes.entry(node.key()).or_insert(node)
    }

    pub fn get(&self, key: &str) -> Option<&DepNode> {
        self.nodes.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.nodes.keys()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Requires of `key` that resolve to nodes of this graph
    pub fn dependencies(&self, key: &str) -> Vec<String> {
        let mut deps = Vec::new();
        if let Some(node) = self.nodes.get(key) {
            for r in &node.requires {
                let dep = r.key();
                if self.nodes.contains_key(&dep) && !deps.contains(&dep) {
                    deps.push(dep);
                }
            }
        }
        deps
    }

    /// Whether `to` is reachable from `from` through one or more edges
    pub fn reaches(&self, from: &str, to: &str) -> bool {
        let mut visited = HashSet::new();
        let mut stack = self.dependencies(from);

        while let Some(key) = stack.pop() {
            if key == to {
                return true;
            }
            if visited.insert(key.clone()) {
                stack.extend(self.dependencies(&key));
            }
        }
        false
    }

    /// Move the edge `from → old_dep` onto `new_dep`
    ///
    /// The move keeps every ordering constraint the old edge implied, since
    /// `new_dep` must already reach `old_dep`. An edge that would close a
    /// cycle is refused. When `from` still reaches `new_dep` without the old
    /// edge, the old edge is simply dropped.
    pub fn reparent(&mut self, from: &str, old_dep: &str, new_dep: &str) -> Reparent {
        if from == new_dep || old_dep == new_dep {
            return Reparent::Unchanged;
        }
        match self.nodes.get(from) {
            Some(node) if node.requires_key(old_dep) => {}
            _ => return Reparent::Unchanged,
        }
        if !self.contains(new_dep) || !self.reaches(new_dep, old_dep) {
            return Reparent::Unchanged;
        }
        if self.reaches(new_dep, from) {
            return Reparent::Cycle;
        }

        let reached_before = self.reaches(from, new_dep);
        let removed = self.take_edge(from, old_dep);

        if self.reaches(from, new_dep) {
            return Reparent::Dropped;
        }
        if reached_before {
            // Only reachable through the old edge: moving it gains nothing
            self.restore_edge(from, removed);
            return Reparent::Unchanged;
        }

        let target = self.nodes.get(new_dep).map(|n| n.package.clone());
        if let (Some(node), Some(target)) = (self.nodes.get_mut(from), target) {
            node.requires.push(PackageRef::new(&target.category, &target.name, ANY_VERSION));
        }
        Reparent::Moved
    }

    fn take_edge(&mut self, from: &str, dep: &str) -> Vec<PackageRef> {
        let mut removed = Vec::new();
        if let Some(node) = self.nodes.get_mut(from) {
            let (gone, kept): (Vec<_>, Vec<_>) =
                node.requires.drain(..).partition(|r| r.key() == dep);
            node.requires = kept;
            removed = gone;
        }
        removed
    }

    fn restore_edge(&mut self, from: &str, refs: Vec<PackageRef>) {
        if let Some(node) = self.nodes.get_mut(from) {
            node.requires.extend(refs);
        }
    }

    /// Detect a dependency cycle, returning the keys involved
    pub fn detect_cycle(&self) -> Option<Vec<String>> {
        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        let mut cycle = Vec::new();

        for key in self.nodes.keys() {
            if !visited.contains(key)
                && self.dfs_cycle_detect(key, &mut visited, &mut rec_stack, &mut cycle)
            {
                return Some(cycle);
            }
        }
        None
    }

    fn dfs_cycle_detect(
        &self,
        key: &str,
        visited: &mut HashSet<String>,
        rec_stack: &mut HashSet<String>,
        cycle: &mut Vec<String>,
    ) -> bool {
        visited.insert(key.to_string());
        rec_stack.insert(key.to_string());

        for dep in self.dependencies(key) {
            if !visited.contains(&dep) {
                if self.dfs_cycle_detect(&dep, visited, rec_stack, cycle) {
                    cycle.push(key.to_string());
                    return true;
                }
            } else if rec_stack.contains(&dep) {
                cycle.push(dep);
                cycle.push(key.to_string());
                return true;
            }
        }

        rec_stack.remove(key);
        false
    }
}
