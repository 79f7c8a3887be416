//! Loads an installed `node_modules` tree from disk.
//!
//! The physical layout is read first: every package directory found under
//! a `node_modules` folder becomes a node whose parent is the package that
//! holds that folder. Declared dependencies are then resolved the way Node
//! resolves them, by looking in the package's own `node_modules` and then
//! in each ancestor's.

use indexmap::IndexMap;
use petgraph::graph::NodeIndex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

use super::dependency_graph::{DependencyGraph, DependencyNode};
use crate::error::{InstalledError, Result};
use crate::parser::{read_manifest, DependencyType, Manifest, PackageJson};

/// Directory that holds installed packages.
pub const NODE_MODULES: &str = "node_modules";

/// Reads the project at `dir` and everything installed beneath it.
///
/// # Errors
///
/// Fails with [`InstalledError::ManifestNotFound`] when `dir` has no
/// `package.json`; nothing is loaded in that case. Broken manifests of
/// installed packages are skipped with a warning.
pub fn load_tree(dir: &Path) -> Result<DependencyGraph> {
    let manifest = read_manifest(dir)?;
    let real_path = dunce::canonicalize(dir).map_err(|source| InstalledError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let fallback_name = real_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = manifest
        .package
        .name
        .clone()
        .unwrap_or(fallback_name);

    let mut loader = Loader::default();
    let mut root = loader.node(&name, &manifest, dir, real_path);
    root.root = true;
    root.dev_dependencies = manifest.package.dev_dependencies.clone().unwrap_or_default();
    let root = loader.graph.add_node(root);
    loader.packages.insert(root, manifest.package);
    loader.order.push(root);

    loader.scan(root, dir);
    loader.resolve();

    let mut graph = loader.graph;
    let extraneous = graph.mark_extraneous();
    debug!(
        root = %dir.display(),
        packages = graph.node_count(),
        edges = graph.edge_count(),
        extraneous,
        cycles = graph.has_cycles(),
        "loaded installed tree"
    );
    Ok(graph)
}

#[derive(Default)]
struct Loader {
    graph: DependencyGraph,
    /// Packages physically installed in each node's `node_modules`.
    children: HashMap<NodeIndex, IndexMap<String, NodeIndex>>,
    packages: HashMap<NodeIndex, PackageJson>,
    /// Nodes in the order they were created.
    order: Vec<NodeIndex>,
}

impl Loader {
    fn node(
        &self,
        name: &str,
        manifest: &Manifest,
        path: &Path,
        real_path: PathBuf,
    ) -> DependencyNode {
        let mut node = DependencyNode::new(
            name,
            manifest.package.version.clone().unwrap_or_default(),
            real_path,
        );
        node.path = path.to_path_buf();
        node.real_name = manifest
            .package
            .name
            .clone()
            .filter(|real| real != name);
        node.manifest = manifest.raw.clone();
        node
    }

    /// Records the packages installed below `dir` as children of `parent`
    /// and recurses into packages not seen before.
    fn scan(&mut self, parent: NodeIndex, dir: &Path) {
        for (name, path) in installed_packages(&dir.join(NODE_MODULES)) {
            let manifest = match read_manifest(&path) {
                Ok(manifest) => manifest,
                Err(e) => {
                    warn!(package = %name, error = %e, "skipping installed package");
                    continue;
                }
            };
            let real_path = match dunce::canonicalize(&path) {
                Ok(real_path) => real_path,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "cannot resolve real path");
                    continue;
                }
            };

            if let Some(existing) = self.graph.find_by_real_path(&real_path) {
                self.children.entry(parent).or_default().insert(name, existing);
                continue;
            }

            let mut node = self.node(&name, &manifest, &path, real_path);
            node.parent = Some(parent);
            let idx = self.graph.add_node(node);
            trace!(
                package = %name,
                declared = manifest.package.dependency_count(),
                "found installed package"
            );
            self.packages.insert(idx, manifest.package);
            self.order.push(idx);
            self.children.entry(parent).or_default().insert(name, idx);

            self.scan(idx, &path);
        }
    }

    /// Adds declared edges, unresolved placeholders and undeclared edges
    /// for every node.
    fn resolve(&mut self) {
        for idx in self.order.clone() {
            let Some(package) = self.packages.get(&idx) else {
                continue;
            };
            let is_root = self.graph.root() == Some(idx);

            let mut sections = vec![
                (package.dependencies.clone(), DependencyType::Production),
                (package.optional_dependencies.clone(), DependencyType::Optional),
            ];
            if is_root {
                sections.push((package.dev_dependencies.clone(), DependencyType::Development));
            }

            let mut declared: HashSet<String> = HashSet::new();
            for (deps, dep_type) in sections {
                for (name, range) in deps.unwrap_or_default() {
                    if !declared.insert(name.clone()) {
                        continue;
                    }
                    match self.lookup(idx, &name) {
                        Some(target) => self.graph.add_edge(idx, target, name, dep_type, true),
                        None => {
                            if let Some(node) = self.graph.node_mut(idx) {
                                node.unresolved.push((name, range));
                            }
                        }
                    }
                }
            }

            let undeclared: Vec<(String, NodeIndex)> = self
                .children
                .get(&idx)
                .map(|children| {
                    children
                        .iter()
                        .filter(|(name, _)| !declared.contains(*name))
                        .map(|(name, &child)| (name.clone(), child))
                        .collect()
                })
                .unwrap_or_default();
            for (name, child) in undeclared {
                self.graph
                    .add_edge(idx, child, name, DependencyType::Production, false);
            }
        }
    }

    /// Finds the package `name` resolves to from `from`.
    fn lookup(&self, from: NodeIndex, name: &str) -> Option<NodeIndex> {
        let mut current = Some(from);
        while let Some(idx) = current {
            if let Some(&found) = self.children.get(&idx).and_then(|c| c.get(name)) {
                return Some(found);
            }
            current = self.graph.node(idx).and_then(|n| n.parent);
        }
        None
    }
}

/// Lists the package directories in a `node_modules` folder as
/// `(name, path)`, expanding `@scope` folders. Sorted by name.
pub fn installed_packages(node_modules: &Path) -> Vec<(String, PathBuf)> {
    let mut packages = Vec::new();
    for (file_name, path) in list_dir(node_modules) {
        if file_name.starts_with('.') {
            continue;
        }
        if file_name.starts_with('@') {
            for (scoped, scoped_path) in list_dir(&path) {
                if !scoped.starts_with('.') {
                    packages.push((format!("{}/{}", file_name, scoped), scoped_path));
                }
            }
        } else {
            packages.push((file_name, path));
        }
    }
    packages
}

/// Directories (or links to directories) directly inside `dir`.
fn list_dir(dir: &Path) -> Vec<(String, PathBuf)> {
    if !dir.is_dir() {
        return Vec::new();
    }

    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "cannot read directory entry");
                None
            }
        })
        .filter(|entry| entry.path().is_dir())
        .map(|entry| {
            (
                entry.file_name().to_string_lossy().into_owned(),
                entry.into_path(),
            )
        })
        .collect()
}
