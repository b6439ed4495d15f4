//! Test utilities for codemap-core

use crate::model::{Edge, Interface, InterfaceKind, Language, Module};
use crate::graph::Graph;
use std::collections::BTreeSet;
use std::fs;
use tempfile::TempDir;

/// Build a module record with the given internal dependencies.
pub fn module(path: &str, deps: &[&str]) -> Module {
    Module {
        path: path.to_string(),
        language: Language::Python,
        line_count: 10,
        summary: format!("{path} summary"),
        interfaces: vec![Interface {
            name: "run".to_string(),
            kind: InterfaceKind::Function,
            signature: "def run()".to_string(),
            doc_summary: None,
            source_line: 1,
        }],
        deps_internal: deps.iter().map(|d| d.to_string()).collect(),
        deps_external: BTreeSet::new(),
    }
}

/// Build a consistent graph from `(path, deps)` pairs.
pub fn graph_from(spec: &[(&str, &[&str])]) -> Graph {
    let mut graph = Graph::new();
    for (path, deps) in spec {
        graph.modules.insert(path.to_string(), module(path, deps));
        for dep in *deps {
            graph.edges.push(Edge::imports(*path, *dep));
        }
    }
    graph
}

/// Create a repository with a specific file structure
pub fn create_repo_with_structure(structure: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    for (path, content) in structure {
        let full_path = root.join(path);

        // Create parent directories if needed
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }

        fs::write(&full_path, content).unwrap();
    }

    temp_dir
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_from_is_consistent() {
        let graph = graph_from(&[("a.py", &["b.py"]), ("b.py", &[])]);
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_create_repo_with_structure() {
        let temp_dir = create_repo_with_structure(&[("pkg/a.py", "x = 1\n")]);
        assert!(temp_dir.path().join("pkg/a.py").exists());
    }
}
