// src/resolver/levels.rs

//! Level structure used to order builds
//!
//! A package added at level `n` (1-based) lands in tree `n-1` and its
//! requirements are added at level `n+1`, so every dependency appears at
//! least one tree deeper than the packages needing it.

use std::collections::HashMap;
use std::fmt;

/// A package occurrence inside one level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    pub key: String,
    /// Keys of the packages that pulled this leaf in (reverse edges)
    pub fathers: Vec<String>,
    /// How many times the leaf was added to this level
    pub counter: usize,
}

impl Leaf {
    fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            fathers: Vec::new(),
            counter: 0,
        }
    }

    /// More than one package in the upper level needs this leaf
    pub fn is_shared(&self) -> bool {
        self.fathers.len() > 1
    }
}

/// Leaves of one level, in insertion order
#[derive(Debug, Clone, Default)]
pub struct LevelTree {
    leaves: Vec<Leaf>,
    index: HashMap<String, usize>,
}

impl LevelTree {
    /// Record `key` in this level, adding `father` to its fathers
    pub fn add(&mut self, key: &str, father: Option<&str>) {
        let idx = match self.index.get(key) {
            Some(&idx) => idx,
            None => {
                self.leaves.push(Leaf::new(key));
                self.index.insert(key.to_string(), self.leaves.len() - 1);
                self.leaves.len() - 1
            }
        };

        let leaf = &mut self.leaves[idx];
        leaf.counter += 1;
        if let Some(father) = father {
            if !leaf.fathers.iter().any(|f| f == father) {
                leaf.fathers.push(father.to_string());
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Leaf> {
        self.index.get(key).map(|&idx| &self.leaves[idx])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Drop `key` from this level, keeping the order of the others
    pub fn remove(&mut self, key: &str) -> Option<Leaf> {
        let idx = self.index.remove(key)?;
        let leaf = self.leaves.remove(idx);
        for slot in self.index.values_mut() {
            if *slot > idx {
                *slot -= 1;
            }
        }
        Some(leaf)
    }

    pub fn leaves(&self) -> &[Leaf] {
        &self.leaves
    }

    pub fn keys(&self) -> Vec<String> {
        self.leaves.iter().map(|l| l.key.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }
}

/// Ordered list of level trees; tree 0 is the top
#[derive(Debug, Clone, Default)]
pub struct Levels {
    trees: Vec<LevelTree>,
}

impl Levels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure at least `count` trees exist
    pub fn extend_to(&mut self, count: usize) {
        if self.trees.len() < count {
            self.trees.resize_with(count, LevelTree::default);
        }
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn tree(&self, pos: usize) -> Option<&LevelTree> {
        self.trees.get(pos)
    }

    pub fn tree_mut(&mut self, pos: usize) -> Option<&mut LevelTree> {
        self.trees.get_mut(pos)
    }

    /// Trees from the deepest to the top
    pub fn deepest_first(&self) -> impl Iterator<Item = &LevelTree> {
        self.trees.iter().rev()
    }
}

impl fmt::Display for Levels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (pos, tree) in self.trees.iter().enumerate() {
            writeln!(f, "L{} ({} leaves)", pos, tree.len())?;
            for leaf in tree.leaves() {
                if leaf.fathers.is_empty() {
                    writeln!(f, "  {} [x{}]", leaf.key, leaf.counter)?;
                } else {
                    writeln!(
                        f,
                        "  {} [x{}] <- {}",
                        leaf.key,
                        leaf.counter,
                        leaf.fathers.join(", ")
                    )?;
                }
            }
        }
        Ok(())
    }
}
