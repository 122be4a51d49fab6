//! The resolved requirement graph and its traversal.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use depsat_core::specifier::split_key;
use depsat_core::Specifier;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Bfs, EdgeRef};
use semver::Version;

/// A specifier together with the concrete versions it matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flattening {
    pub specifier: Specifier,
    /// Ascending.
    pub versions: Vec<Version>,
}

/// The dependency specifiers declared by one concrete version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDependencies {
    pub name: String,
    pub version: Version,
    pub dependencies: Vec<Specifier>,
}

impl VersionDependencies {
    /// Canonical key of the concrete version, `name:version`.
    pub fn key(&self) -> String {
        format!("{}:{}", self.name, self.version)
    }
}

/// Everything the crawl learned, ready for the solver.
#[derive(Debug, Clone, Default)]
pub struct ResolvedGraph {
    pub roots: Vec<Specifier>,
    /// One entry per processed specifier that the registry could answer.
    pub flattened: Vec<Flattening>,
    /// One entry per expanded concrete version, ordered by name then version.
    pub edges: Vec<VersionDependencies>,
    /// Specifiers whose package or dependency lookup failed.
    pub missing: Vec<Specifier>,
}

impl ResolvedGraph {
    /// Distinct package names that had at least one version expanded.
    pub fn package_count(&self) -> usize {
        self.edges
            .iter()
            .map(|e| e.name.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Keys of all missing specifiers, sorted.
    pub fn missing_keys(&self) -> BTreeSet<String> {
        self.missing.iter().map(Specifier::key).collect()
    }

    pub fn is_missing(&self, specifier: &Specifier) -> bool {
        self.missing.contains(specifier)
    }

    /// Build the traversable form of this graph.
    pub fn requirement_graph(&self) -> RequirementGraph {
        RequirementGraph::from_resolved(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Specifier,
    Version,
}

/// A node of the requirement graph: a specifier or a concrete version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementNode {
    pub key: String,
    pub name: String,
    pub kind: NodeKind,
}

impl fmt::Display for RequirementNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NodeKind::Specifier => write!(f, "{}", self.key),
            NodeKind::Version => match split_key(&self.key) {
                Some((name, version)) => write!(f, "{name}@{version}"),
                None => write!(f, "{}", self.key),
            },
        }
    }
}

/// Directed graph: specifier → each matching version, version → each of its
/// dependency specifiers.
///
/// A bare-version range such as `b:1.0.0` shares its key with the concrete
/// version `b:1.0.0`; both collapse into one version node.
pub struct RequirementGraph {
    graph: DiGraph<RequirementNode, ()>,
    index: HashMap<String, NodeIndex>,
    roots: Vec<NodeIndex>,
}

impl RequirementGraph {
    pub fn from_resolved(resolved: &ResolvedGraph) -> Self {
        let mut graph = Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
            roots: Vec::new(),
        };

        for root in &resolved.roots {
            let idx = graph.add_node(&root.key(), root.name(), NodeKind::Specifier);
            if !graph.roots.contains(&idx) {
                graph.roots.push(idx);
            }
        }
        for flat in &resolved.flattened {
            let name = flat.specifier.name();
            let from = graph.add_node(&flat.specifier.key(), name, NodeKind::Specifier);
            for version in &flat.versions {
                let to = graph.add_node(&format!("{name}:{version}"), name, NodeKind::Version);
                graph.add_edge(from, to);
            }
        }
        for entry in &resolved.edges {
            let from = graph.add_node(&entry.key(), &entry.name, NodeKind::Version);
            for dep in &entry.dependencies {
                let to = graph.add_node(&dep.key(), dep.name(), NodeKind::Specifier);
                graph.add_edge(from, to);
            }
        }
        for missing in &resolved.missing {
            graph.add_node(&missing.key(), missing.name(), NodeKind::Specifier);
        }

        graph
    }

    fn add_node(&mut self, key: &str, name: &str, kind: NodeKind) -> NodeIndex {
        if let Some(&idx) = self.index.get(key) {
            if kind == NodeKind::Version {
                self.graph[idx].kind = NodeKind::Version;
            }
            return idx;
        }
        let idx = self.graph.add_node(RequirementNode {
            key: key.to_string(),
            name: name.to_string(),
            kind,
        });
        self.index.insert(key.to_string(), idx);
        idx
    }

    fn add_edge(&mut self, from: NodeIndex, to: NodeIndex) {
        if from != to && !self.graph.edges(from).any(|e| e.target() == to) {
            self.graph.add_edge(from, to, ());
        }
    }

    pub fn find(&self, key: &str) -> Option<&RequirementNode> {
        self.index.get(key).map(|&idx| &self.graph[idx])
    }

    /// Keys reachable from any root, roots included.
    pub fn reachable_keys(&self) -> HashSet<String> {
        let mut reached = HashSet::new();
        for &root in &self.roots {
            let mut bfs = Bfs::new(&self.graph, root);
            while let Some(idx) = bfs.next(&self.graph) {
                reached.insert(self.graph[idx].key.clone());
            }
        }
        reached
    }

    /// Shortest chain of requirements from a root to `target`.
    ///
    /// `target` is either a full key (`name:spec`) or a package name, in
    /// which case any node of that package ends the search.
    pub fn find_path(&self, target: &str) -> Option<Vec<&RequirementNode>> {
        let exact = self.index.get(target).copied();
        let is_goal = |idx: NodeIndex| match exact {
            Some(goal) => idx == goal,
            None => self.graph[idx].name == target,
        };

        self.roots
            .iter()
            .filter_map(|&root| {
                petgraph::algo::astar(&self.graph, root, is_goal, |_| 1usize, |_| 0)
            })
            .min_by_key(|(cost, _)| *cost)
            .map(|(_, path)| path.into_iter().map(|idx| &self.graph[idx]).collect())
    }

    /// Render the graph as a tree under each root.
    ///
    /// Nodes already printed on the current branch are not descended into
    /// again, so cycles terminate.
    pub fn print_tree(&self, max_depth: Option<usize>) -> String {
        let mut output = String::new();
        let mut visited = HashSet::new();
        let count = self.roots.len();
        for (i, &root) in self.roots.iter().enumerate() {
            self.print_subtree(&mut output, root, "", i == count - 1, 0, max_depth, &mut visited);
        }
        output
    }

    #[allow(clippy::too_many_arguments)]
    fn print_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        prefix: &str,
        is_last: bool,
        depth: usize,
        max_depth: Option<usize>,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        let node = &self.graph[idx];
        output.push_str(&format!("{prefix}{connector}{node}\n"));

        if max_depth.is_some_and(|max| depth >= max) {
            return;
        }
        if !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let mut children: Vec<NodeIndex> = self.graph.edges(idx).map(|e| e.target()).collect();
        children.sort_by(|a, b| self.graph[*a].key.cmp(&self.graph[*b].key));
        let count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            self.print_subtree(
                output,
                child,
                &child_prefix,
                i == count - 1,
                depth + 1,
                max_depth,
                visited,
            );
        }

        visited.remove(&idx);
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}
