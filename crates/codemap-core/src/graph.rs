//! Project dependency graph with petgraph-backed traversal

use crate::error::{Error, Result};
use crate::model::*;
use chrono::{DateTime, Utc};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Bfs;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// The dependency graph: every module of a project plus its import edges.
///
/// Rebuilt wholesale on each index run, never merged with a previous state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub modules: BTreeMap<String, Module>,
    pub edges: Vec<Edge>,
    pub indexed_at: DateTime<Utc>,
}

impl Graph {
    pub fn new() -> Self {
        Graph {
            modules: BTreeMap::new(),
            edges: Vec::new(),
            indexed_at: Utc::now(),
        }
    }

    /// Total number of modules.
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Total number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn module(&self, path: &str) -> Option<&Module> {
        self.modules.get(path)
    }

    /// Check the whole-graph invariants: every edge joins two known modules and
    /// every internal dependency has a matching edge.
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for edge in &self.edges {
            if !self.modules.contains_key(&edge.source) {
                return Err(Error::Graph(format!("edge source {} is not a module", edge.source)));
            }
            if !self.modules.contains_key(&edge.target) {
                return Err(Error::Graph(format!("edge target {} is not a module", edge.target)));
            }
            seen.insert((edge.source.as_str(), edge.target.as_str()));
        }
        for module in self.modules.values() {
            for dep in &module.deps_internal {
                if !seen.contains(&(module.path.as_str(), dep.as_str())) {
                    return Err(Error::Graph(format!(
                        "{} depends on {} but no edge exists",
                        module.path, dep
                    )));
                }
            }
        }
        Ok(())
    }

    /// Modules imported directly by `path`.
    pub fn dependencies(&self, path: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|e| e.source == path)
            .map(|e| e.target.as_str())
            .collect()
    }

    /// Modules that import `path` directly.
    pub fn dependents(&self, path: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|e| e.target == path)
            .map(|e| e.source.as_str())
            .collect()
    }

    /// Every module that reaches `path` through one or more imports.
    pub fn transitive_dependents(&self, path: &str) -> BTreeSet<String> {
        let view = GraphView::new(self);
        let Some(start) = view.index_of(path) else {
            return BTreeSet::new();
        };
        let reversed = petgraph::visit::Reversed(&view.inner);
        let mut bfs = Bfs::new(reversed, start);
        let mut out = BTreeSet::new();
        while let Some(idx) = bfs.next(reversed) {
            if idx != start {
                out.insert(view.inner[idx].to_string());
            }
        }
        out
    }

    /// Import cycles, each reported as a sorted list of module paths.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let view = GraphView::new(self);
        let mut cycles: Vec<Vec<String>> = tarjan_scc(&view.inner)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || view
                        .inner
                        .find_edge(component[0], component[0])
                        .is_some()
            })
            .map(|component| {
                let mut paths: Vec<String> =
                    component.iter().map(|idx| view.inner[*idx].to_string()).collect();
                paths.sort();
                paths
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// Count how many modules use each external package.
    pub fn external_usage(&self) -> BTreeMap<String, usize> {
        let mut usage = BTreeMap::new();
        for module in self.modules.values() {
            for package in &module.deps_external {
                *usage.entry(package.clone()).or_insert(0) += 1;
            }
        }
        usage
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

/// Borrowed petgraph view used for traversals.
struct GraphView<'a> {
    inner: DiGraph<&'a str, ()>,
    indices: HashMap<&'a str, NodeIndex>,
}

impl<'a> GraphView<'a> {
    fn new(graph: &'a Graph) -> Self {
        let mut inner = DiGraph::new();
        let mut indices = HashMap::new();
        for path in graph.modules.keys() {
            let idx = inner.add_node(path.as_str());
            indices.insert(path.as_str(), idx);
        }
        for edge in &graph.edges {
            if let (Some(&s), Some(&t)) = (
                indices.get(edge.source.as_str()),
                indices.get(edge.target.as_str()),
            ) {
                inner.add_edge(s, t, ());
            }
        }
        GraphView { inner, indices }
    }

    fn index_of(&self, path: &str) -> Option<NodeIndex> {
        self.indices.get(path).copied()
    }
}
