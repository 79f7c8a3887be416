//! Dependency graph implementation using petgraph.
//!
//! Installed packages live once in an arena (`DiGraph`) keyed by their
//! real path. Parent links and dependency edges are plain indices into
//! that arena, so cyclic installs never create ownership cycles.

use indexmap::IndexMap;
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, EdgeReference, NodeIndex};
use petgraph::visit::{EdgeRef, VisitMap, Visitable};
use petgraph::Direction;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, trace};

use super::record::DependencyRecord;
use crate::parser::DependencyType;

/// How far below the root a traversal may go.
///
/// `Limited(0)` yields only the root's direct dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    Limited(usize),
    Unbounded,
}

impl Depth {
    /// Returns true if packages `level` edges below the root's children
    /// may be visited.
    pub fn allows(&self, level: usize) -> bool {
        match self {
            Depth::Limited(max) => level <= *max,
            Depth::Unbounded => true,
        }
    }
}

impl Default for Depth {
    fn default() -> Self {
        Depth::Limited(0)
    }
}

impl FromStr for Depth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "-1" || s.eq_ignore_ascii_case("infinity") || s.eq_ignore_ascii_case("inf") {
            return Ok(Depth::Unbounded);
        }
        s.parse::<usize>().map(Depth::Limited).map_err(|_| {
            format!(
                "Invalid depth: '{}'. Use a non-negative integer, -1 or Infinity",
                s
            )
        })
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Depth::Limited(max) => write!(f, "{}", max),
            Depth::Unbounded => write!(f, "Infinity"),
        }
    }
}

/// An installed package in the arena.
#[derive(Debug, Clone)]
pub struct DependencyNode {
    /// Name the package is installed under.
    pub name: String,
    /// Manifest name, when it differs from `name` (aliased installs).
    pub real_name: Option<String>,
    /// Installed version.
    pub version: String,
    /// Install location.
    pub path: PathBuf,
    /// Canonical location; identity of the node.
    pub real_path: PathBuf,
    /// The package whose `node_modules` holds this one.
    pub parent: Option<NodeIndex>,
    /// `devDependencies` of the manifest; only populated for the root.
    pub dev_dependencies: IndexMap<String, String>,
    /// Installed without being required by any declared dependency chain.
    pub extraneous: bool,
    /// True only for the project itself.
    pub root: bool,
    /// Declared dependencies that are not installed: name -> range.
    pub unresolved: Vec<(String, String)>,
    /// The package's full manifest.
    pub manifest: serde_json::Value,
}

impl DependencyNode {
    /// Creates a new node located at `real_path`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use installed::graph::DependencyNode;
    ///
    /// let node = DependencyNode::new("mkdirp", "1.0.4", "/app/node_modules/mkdirp");
    /// assert_eq!(node.name, "mkdirp");
    /// assert!(node.parent.is_none());
    /// ```
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        real_path: impl Into<PathBuf>,
    ) -> Self {
        let real_path = real_path.into();
        Self {
            name: name.into(),
            real_name: None,
            version: version.into(),
            path: real_path.clone(),
            real_path,
            parent: None,
            dev_dependencies: IndexMap::new(),
            extraneous: false,
            root: false,
            unresolved: Vec::new(),
            manifest: serde_json::Value::Null,
        }
    }
}

/// An edge from a package to one of its dependencies.
#[derive(Debug, Clone)]
pub struct DependencyEdge {
    /// Key under which the dependency appears.
    pub name: String,
    /// Declaration order among the source's edges.
    pub position: usize,
    /// Manifest section the dependency was declared in.
    pub dep_type: DependencyType,
    /// False for packages found in `node_modules` but not declared.
    pub declared: bool,
}

/// The installed dependency tree of a project.
///
/// # Example
///
/// ```rust
/// use installed::graph::{Depth, DependencyGraph, DependencyNode};
/// use installed::parser::DependencyType;
///
/// let mut graph = DependencyGraph::new();
/// let mut app = DependencyNode::new("app", "1.0.0", "/app");
/// app.root = true;
/// let app = graph.add_node(app);
/// let once = graph.add_node(DependencyNode::new("once", "1.4.0", "/app/node_modules/once"));
/// graph.add_edge(app, once, "once", DependencyType::Production, true);
///
/// let records = graph.flatten(Depth::Unbounded);
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].to_string(), "once@1.4.0");
/// ```
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// The underlying directed graph
    graph: DiGraph<DependencyNode, DependencyEdge>,
    /// Maps real paths to their node indices
    node_indices: HashMap<PathBuf, NodeIndex>,
    /// The project node
    root: Option<NodeIndex>,
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyGraph {
    /// Creates a new empty dependency graph.
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_indices: HashMap::new(),
            root: None,
        }
    }

    /// Adds a package to the arena.
    ///
    /// If a node with the same real path already exists, its index is
    /// returned and `node` is discarded. The first node flagged `root`
    /// becomes the graph root.
    pub fn add_node(&mut self, node: DependencyNode) -> NodeIndex {
        if let Some(&idx) = self.node_indices.get(&node.real_path) {
            return idx;
        }

        let real_path = node.real_path.clone();
        let is_root = node.root;
        let idx = self.graph.add_node(node);
        self.node_indices.insert(real_path, idx);
        if is_root && self.root.is_none() {
            self.root = Some(idx);
        }
        idx
    }

    /// Adds a dependency edge after the source's existing edges.
    pub fn add_edge(
        &mut self,
        from: NodeIndex,
        to: NodeIndex,
        name: impl Into<String>,
        dep_type: DependencyType,
        declared: bool,
    ) {
        let position = self.graph.edges_directed(from, Direction::Outgoing).count();
        self.graph.add_edge(
            from,
            to,
            DependencyEdge {
                name: name.into(),
                position,
                dep_type,
                declared,
            },
        );
    }

    /// Returns the project node, if one was added.
    pub fn root(&self) -> Option<NodeIndex> {
        self.root
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&DependencyNode> {
        self.graph.node_weight(idx)
    }

    pub fn node_mut(&mut self, idx: NodeIndex) -> Option<&mut DependencyNode> {
        self.graph.node_weight_mut(idx)
    }

    /// Looks a package up by its canonical location.
    pub fn find_by_real_path(&self, real_path: &Path) -> Option<NodeIndex> {
        self.node_indices.get(real_path).copied()
    }

    /// Returns the outgoing edges of `idx` in declaration order.
    pub fn dependencies(&self, idx: NodeIndex) -> Vec<EdgeReference<'_, DependencyEdge>> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .collect();
        edges.sort_by_key(|e| e.weight().position);
        edges
    }

    /// Checks if the installed tree contains circular dependencies.
    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Returns the number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Checks if the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Returns true if `idx` is listed in its parent's `devDependencies`.
    ///
    /// Only the direct parent is consulted, so the dependencies of a dev
    /// dependency are not themselves dev dependencies.
    pub fn is_dev_dependency(&self, idx: NodeIndex) -> bool {
        let Some(node) = self.graph.node_weight(idx) else {
            return false;
        };
        if node.root {
            return false;
        }
        node.parent
            .and_then(|parent| self.graph.node_weight(parent))
            .is_some_and(|parent| parent.dev_dependencies.contains_key(&node.name))
    }

    /// Flags every package not reachable from the root through declared
    /// edges as extraneous.
    ///
    /// Returns the number of extraneous packages.
    pub fn mark_extraneous(&mut self) -> usize {
        let Some(root) = self.root else {
            return 0;
        };

        let mut reached = self.graph.visit_map();
        let mut queue = VecDeque::from([root]);
        reached.visit(root);

        while let Some(idx) = queue.pop_front() {
            for edge in self.graph.edges_directed(idx, Direction::Outgoing) {
                if edge.weight().declared && reached.visit(edge.target()) {
                    queue.push_back(edge.target());
                }
            }
        }

        let mut count = 0;
        for idx in self.graph.node_indices() {
            let extraneous = !reached.is_visited(&idx);
            self.graph[idx].extraneous = extraneous;
            if extraneous {
                count += 1;
            }
        }
        count
    }

    /// Flattens the tree below the root into records, depth first.
    ///
    /// Each physical package (real path) is emitted at most once, at the
    /// position it is first reached; a package already seen is skipped
    /// along with everything below it. Children follow declaration order.
    pub fn flatten(&self, max_depth: Depth) -> Vec<DependencyRecord> {
        let mut records = Vec::new();
        let Some(root) = self.root else {
            return records;
        };

        let mut visited = self.graph.visit_map();
        visited.visit(root);
        self.flatten_from(root, 0, max_depth, &mut visited, &mut records);

        debug!(
            records = records.len(),
            depth = %max_depth,
            "flattened dependency tree"
        );
        records
    }

    fn flatten_from<M: VisitMap<NodeIndex>>(
        &self,
        idx: NodeIndex,
        level: usize,
        max_depth: Depth,
        visited: &mut M,
        records: &mut Vec<DependencyRecord>,
    ) {
        if !max_depth.allows(level) {
            return;
        }

        let parent = self.graph[idx].parent;
        for edge in self.dependencies(idx) {
            let child = edge.target();
            if child == idx || Some(child) == parent {
                continue;
            }
            if !visited.visit(child) {
                continue;
            }
            trace!(
                from = %self.graph[idx].name,
                to = %edge.weight().name,
                kind = %edge.weight().dep_type,
                level,
                "following dependency"
            );
            records.push(self.record(child, level));
            self.flatten_from(child, level + 1, max_depth, visited, records);
        }
    }

    fn record(&self, idx: NodeIndex, depth: usize) -> DependencyRecord {
        let node = &self.graph[idx];
        let dependencies = self
            .dependencies(idx)
            .into_iter()
            .filter(|e| e.target() != idx)
            .map(|e| e.weight().name.clone())
            .collect();

        DependencyRecord {
            name: node.name.clone(),
            real_name: node.real_name.clone(),
            version: node.version.clone(),
            path: node.path.clone(),
            real_path: node.real_path.clone(),
            depth,
            dev: self.is_dev_dependency(idx),
            extraneous: node.extraneous,
            dependencies,
            manifest: node.manifest.clone(),
        }
    }

    /// Builds the record describing the project itself.
    pub fn root_record(&self) -> Option<DependencyRecord> {
        self.root.map(|root| self.record(root, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(records: &[DependencyRecord]) -> Vec<String> {
        records.iter().map(|r| r.name.clone()).collect()
    }

    /// app -> [a, b]; a -> [c]; b -> [c] with c shared.
    fn diamond() -> (DependencyGraph, NodeIndex) {
        let mut graph = DependencyGraph::new();
        let mut app = DependencyNode::new("app", "1.0.0", "/app");
        app.root = true;
        let app = graph.add_node(app);
        let a = graph.add_node(DependencyNode::new("a", "1.0.0", "/app/node_modules/a"));
        let b = graph.add_node(DependencyNode::new("b", "1.0.0", "/app/node_modules/b"));
        let c = graph.add_node(DependencyNode::new("c", "1.0.0", "/app/node_modules/c"));
        for idx in [a, b, c] {
            graph.node_mut(idx).unwrap().parent = Some(app);
        }
        graph.add_edge(app, a, "a", DependencyType::Production, true);
        graph.add_edge(app, b, "b", DependencyType::Production, true);
        graph.add_edge(a, c, "c", DependencyType::Production, true);
        graph.add_edge(b, c, "c", DependencyType::Production, true);
        graph.add_edge(app, c, "c", DependencyType::Production, false);
        (graph, app)
    }

    #[test]
    fn test_create_empty_graph() {
        let graph = DependencyGraph::new();
        assert!(graph.is_empty());
        assert!(graph.root().is_none());
        assert!(graph.flatten(Depth::Unbounded).is_empty());
    }

    #[test]
    fn test_add_node_dedups_real_path() {
        let mut graph = DependencyGraph::new();
        let first = graph.add_node(DependencyNode::new("a", "1.0.0", "/x/a"));
        let second = graph.add_node(DependencyNode::new("a-link", "1.0.0", "/x/a"));

        assert_eq!(first, second);
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.node(first).unwrap().name, "a");
    }

    #[test]
    fn test_dependencies_in_declaration_order() {
        let (graph, app) = diamond();
        let order: Vec<_> = graph
            .dependencies(app)
            .iter()
            .map(|e| e.weight().name.clone())
            .collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_flatten_depth_zero() {
        let (graph, _) = diamond();
        assert_eq!(names(&graph.flatten(Depth::Limited(0))), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_flatten_diamond_first_visit_wins() {
        let (graph, _) = diamond();
        let records = graph.flatten(Depth::Unbounded);

        assert_eq!(names(&records), vec!["a", "c", "b"]);
        assert_eq!(records[1].depth, 1);
    }

    #[test]
    fn test_flatten_cycle_terminates() {
        let mut graph = DependencyGraph::new();
        let mut app = DependencyNode::new("app", "1.0.0", "/app");
        app.root = true;
        let app = graph.add_node(app);
        let a = graph.add_node(DependencyNode::new("a", "1.0.0", "/app/node_modules/a"));
        let b = graph.add_node(DependencyNode::new("b", "1.0.0", "/app/node_modules/b"));
        graph.add_edge(app, a, "a", DependencyType::Production, true);
        graph.add_edge(a, b, "b", DependencyType::Production, true);
        graph.add_edge(b, a, "a", DependencyType::Production, true);
        graph.add_edge(b, app, "app", DependencyType::Production, true);

        assert!(graph.has_cycles());
        assert_eq!(names(&graph.flatten(Depth::Unbounded)), vec!["a", "b"]);
    }

    #[test]
    fn test_flatten_skips_self_loop() {
        let mut graph = DependencyGraph::new();
        let mut app = DependencyNode::new("app", "1.0.0", "/app");
        app.root = true;
        let app = graph.add_node(app);
        let a = graph.add_node(DependencyNode::new("a", "1.0.0", "/app/node_modules/a"));
        graph.add_edge(app, a, "a", DependencyType::Production, true);
        graph.add_edge(a, a, "a", DependencyType::Production, true);

        let records = graph.flatten(Depth::Unbounded);
        assert_eq!(names(&records), vec!["a"]);
        assert!(records[0].dependencies.is_empty());
    }

    #[test]
    fn test_flatten_skips_edge_to_physical_parent() {
        // app -> [a, p]; a is installed under p and lists p back.
        let mut graph = DependencyGraph::new();
        let mut app = DependencyNode::new("app", "1.0.0", "/app");
        app.root = true;
        let app = graph.add_node(app);

        let mut p = DependencyNode::new("p", "1.0.0", "/app/node_modules/p");
        p.parent = Some(app);
        let p = graph.add_node(p);

        let mut a = DependencyNode::new("a", "1.0.0", "/app/node_modules/p/node_modules/a");
        a.parent = Some(p);
        let a = graph.add_node(a);

        let mut q = DependencyNode::new("q", "1.0.0", "/app/node_modules/q");
        q.parent = Some(app);
        let q = graph.add_node(q);

        graph.add_edge(app, a, "a", DependencyType::Production, true);
        graph.add_edge(app, p, "p", DependencyType::Production, true);
        graph.add_edge(a, p, "p", DependencyType::Production, true);
        graph.add_edge(p, q, "q", DependencyType::Production, true);

        let records = graph.flatten(Depth::Unbounded);
        assert_eq!(names(&records), vec!["a", "p", "q"]);
        assert_eq!(records[1].depth, 0);
        assert_eq!(records[2].depth, 1);

        assert_eq!(names(&graph.flatten(Depth::Limited(0))), vec!["a", "p"]);
    }

    #[test]
    fn test_flatten_depth_monotonic() {
        let mut graph = DependencyGraph::new();
        let mut app = DependencyNode::new("app", "1.0.0", "/app");
        app.root = true;
        let mut parent = graph.add_node(app);
        for (i, name) in ["a", "b", "c", "d"].iter().enumerate() {
            let path = format!("/app/{}", "node_modules/x/".repeat(i)) + name;
            let child = graph.add_node(DependencyNode::new(*name, "1.0.0", path));
            graph.add_edge(parent, child, *name, DependencyType::Production, true);
            parent = child;
        }

        let mut previous: Vec<String> = Vec::new();
        for depth in 0..5 {
            let current = names(&graph.flatten(Depth::Limited(depth)));
            assert_eq!(&current[..previous.len()], &previous[..]);
            previous = current;
        }
        assert_eq!(previous, names(&graph.flatten(Depth::Unbounded)));
        assert_eq!(previous.len(), 4);
    }

    #[test]
    fn test_is_dev_dependency_direct_parent_only() {
        let mut graph = DependencyGraph::new();
        let mut app = DependencyNode::new("app", "1.0.0", "/app");
        app.root = true;
        app.dev_dependencies.insert("tape".into(), "^4.0.0".into());
        let app = graph.add_node(app);

        let mut tape = DependencyNode::new("tape", "4.9.0", "/app/node_modules/tape");
        tape.parent = Some(app);
        let tape = graph.add_node(tape);

        let mut through = DependencyNode::new("through", "2.3.8", "/app/node_modules/through");
        through.parent = Some(app);
        let through = graph.add_node(through);

        graph.add_edge(app, tape, "tape", DependencyType::Development, true);
        graph.add_edge(tape, through, "through", DependencyType::Production, true);

        assert!(graph.is_dev_dependency(tape));
        assert!(!graph.is_dev_dependency(through));
        assert!(!graph.is_dev_dependency(app));

        let records = graph.flatten(Depth::Unbounded);
        assert!(records[0].dev);
        assert!(!records[1].dev);
    }

    #[test]
    fn test_mark_extraneous() {
        let (mut graph, _) = diamond();
        let stray = graph.add_node(DependencyNode::new("stray", "0.1.0", "/app/node_modules/stray"));
        let root = graph.root().unwrap();
        graph.add_edge(root, stray, "stray", DependencyType::Production, false);

        assert_eq!(graph.mark_extraneous(), 1);
        assert!(graph.node(stray).unwrap().extraneous);
        assert!(!graph.node(root).unwrap().extraneous);

        let records = graph.flatten(Depth::Limited(0));
        let stray_record = records.iter().find(|r| r.name == "stray").unwrap();
        assert!(stray_record.is_extraneous());
    }

    #[test]
    fn test_depth_from_str() {
        assert_eq!("0".parse::<Depth>().unwrap(), Depth::Limited(0));
        assert_eq!("3".parse::<Depth>().unwrap(), Depth::Limited(3));
        assert_eq!("-1".parse::<Depth>().unwrap(), Depth::Unbounded);
        assert_eq!("Infinity".parse::<Depth>().unwrap(), Depth::Unbounded);
        assert!("deep".parse::<Depth>().is_err());
        assert!("-2".parse::<Depth>().is_err());
    }

    #[test]
    fn test_depth_display() {
        assert_eq!(Depth::Limited(2).to_string(), "2");
        assert_eq!(Depth::Unbounded.to_string(), "Infinity");
        assert_eq!(Depth::default(), Depth::Limited(0));
    }
}
