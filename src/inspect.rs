//! The read → filter → match pipeline behind the `installed` command.

use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::filter::FilterOptions;
use crate::graph::{load_tree, Depth, DependencyRecord};
use crate::matcher::{match_records, MatchQuery, MatchResult};

/// What to read from an installed tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// How deep below the project's direct dependencies to look.
    pub depth: Depth,
    pub filter: FilterOptions,
}

/// Lists the installed packages of the project at `dir`, in traversal
/// order, with dev and extraneous packages filtered per `options`.
pub fn read_installed(dir: &Path, options: &QueryOptions) -> Result<Vec<DependencyRecord>> {
    let graph = load_tree(dir)?;
    let records = graph.flatten(options.depth);
    let total = records.len();
    let records = options.filter.apply(records);

    debug!(
        dir = %dir.display(),
        total,
        kept = records.len(),
        "read installed packages"
    );
    Ok(records)
}

/// Reads the installed packages of `dir` and keeps those matching any of
/// `queries`. No queries keeps everything.
pub fn match_installed(
    dir: &Path,
    queries: &[MatchQuery],
    options: &QueryOptions,
) -> Result<MatchResult> {
    let records = read_installed(dir, options)?;
    Ok(match_records(records, queries))
}

/// The record describing the project at `dir` itself.
pub fn read_project(dir: &Path) -> Result<Option<DependencyRecord>> {
    Ok(load_tree(dir)?.root_record())
}
