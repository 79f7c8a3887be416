//! installed - inspect, query and format the installed dependencies of an npm project
//!
//! This crate reads a project's `node_modules` tree into a graph, flattens
//! it into deduplicated records, filters them by dev/extraneous status,
//! matches them against `name@range` queries, and renders the result.

pub mod error;
pub mod export;
pub mod filter;
pub mod graph;
pub mod inspect;
pub mod logging;
pub mod matcher;
pub mod parser;

pub use error::{InstalledError, Result};
pub use filter::FilterOptions;
pub use graph::{Depth, DependencyRecord};
pub use inspect::{match_installed, read_installed, QueryOptions};
pub use matcher::{MatchQuery, MatchResult};
