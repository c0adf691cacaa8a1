// src/resolver/mod.rs

//! Build order resolution for missing packages
//!
//! Given the packages absent from the store and the build catalog of the
//! loaded trees, compute an order in which every package comes after the
//! packages it needs at build time. Dependency cycles never abort the
//! computation; the packages involved come out in an arbitrary but stable
//! order.

mod graph;
mod levels;
mod order;

pub use graph::{DepGraph, DepNode, Reparent};
pub use levels::{Leaf, LevelTree, Levels};
pub use order::{BuildOrder, OrderedBuild, resolve_build_order};
