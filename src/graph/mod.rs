//! Graph module for the installed dependency tree.
//!
//! [`loader::load_tree`] reads a project and its `node_modules` into a
//! [`DependencyGraph`]; [`DependencyGraph::flatten`] turns that graph into
//! an ordered, deduplicated list of [`DependencyRecord`]s.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use installed::graph::{load_tree, Depth};
//!
//! let graph = load_tree(Path::new(".")).unwrap();
//! for record in graph.flatten(Depth::Unbounded) {
//!     println!("{}", record);
//! }
//! ```

mod dependency_graph;
pub mod loader;
mod record;

pub use dependency_graph::{Depth, DependencyEdge, DependencyGraph, DependencyNode};
pub use loader::{load_tree, NODE_MODULES};
pub use record::DependencyRecord;
