//! Orchestrates a full two-pass index: discovery, then parse and resolve

use crate::discovery::{discover, SourceFile};
use crate::extractor::{ResolveContext, Resolution};
use codemap_core::{
    save_graph, Edge, Error, Graph, Language, Module, ProjectLayout, Result,
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// What happened to one discovered file.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Parsed(Module),
    ParseFailed {
        path: String,
        reason: String,
        line: Option<usize>,
    },
    Skipped {
        path: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

/// A relative import that matched no known module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedImport {
    pub path: String,
    pub import: String,
    pub line: usize,
}

/// Everything one indexing run produced.
#[derive(Debug, Clone)]
pub struct IndexReport {
    pub graph: Graph,
    pub failures: Vec<FileFailure>,
    pub skipped: Vec<SkippedFile>,
    /// Edges dropped because their target failed to parse.
    pub dangling: Vec<Edge>,
    pub unresolved: Vec<UnresolvedImport>,
}

impl IndexReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.skipped.is_empty() && self.dangling.is_empty()
    }
}

/// Builds the dependency graph of one project.
pub struct Coordinator {
    root: PathBuf,
    languages: Vec<Language>,
    layout: ProjectLayout,
}

impl Coordinator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let layout = ProjectLayout::detect(&root);
        Coordinator {
            root,
            languages: Vec::new(),
            layout,
        }
    }

    /// Restrict indexing to these languages. Empty means all.
    pub fn with_languages(mut self, languages: Vec<Language>) -> Self {
        self.languages = languages;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// Index the project and replace `.codemap/graph.json`.
    pub fn run_full_index(&self) -> Result<IndexReport> {
        let report = self.build_graph()?;
        save_graph(&report.graph, &self.root)?;
        tracing::info!(
            "Indexed {} modules, {} edges ({} failed, {} skipped)",
            report.graph.module_count(),
            report.graph.edge_count(),
            report.failures.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Build the graph in memory without persisting it.
    pub fn build_graph(&self) -> Result<IndexReport> {
        let discovery = discover(&self.root, &self.languages)?;
        let known = discovery.known_paths();

        let mut graph = Graph::new();
        let mut report = IndexReport {
            graph: Graph::new(),
            failures: Vec::new(),
            skipped: Vec::new(),
            dangling: Vec::new(),
            unresolved: Vec::new(),
        };

        for file in &discovery.files {
            let (outcome, unresolved) = self.index_file(file, &known);
            report.unresolved.extend(unresolved);
            match outcome {
                FileOutcome::Parsed(module) => {
                    graph.modules.insert(module.path.clone(), module);
                }
                FileOutcome::ParseFailed { path, reason, line } => {
                    tracing::warn!("Failed to parse {}: {}", path, reason);
                    report.failures.push(FileFailure { path, line, reason });
                }
                FileOutcome::Skipped { path, reason } => {
                    tracing::debug!("Skipped {}: {}", path, reason);
                    report.skipped.push(SkippedFile { path, reason });
                }
            }
        }

        report.dangling = synthesize_edges(&mut graph);
        for edge in &report.dangling {
            tracing::debug!("Dropped dangling edge {} -> {}", edge.source, edge.target);
        }
        graph.validate()?;
        report.graph = graph;
        Ok(report)
    }

    /// Parse one discovered file and resolve its imports against `known`.
    pub fn index_file(
        &self,
        file: &SourceFile,
        known: &BTreeSet<String>,
    ) -> (FileOutcome, Vec<UnresolvedImport>) {
        let source = match std::fs::read(&file.abs_path) {
            Ok(bytes) => bytes,
            Err(e) => {
                let outcome = FileOutcome::Skipped {
                    path: file.path.clone(),
                    reason: format!("unreadable: {e}"),
                };
                return (outcome, Vec::new());
            }
        };

        let adapter = file.adapter;
        let parsed = match adapter.parse(&source) {
            Ok(parsed) => parsed,
            Err(err) => {
                let outcome = FileOutcome::ParseFailed {
                    path: file.path.clone(),
                    line: err.line(),
                    reason: match err {
                        Error::Parse { message, .. } => message,
                        other => other.to_string(),
                    },
                };
                return (outcome, Vec::new());
            }
        };

        let ctx = ResolveContext::new(known, &file.path)
            .with_prefix(self.layout.prefix_for(file.language));
        let mut module = Module {
            path: file.path.clone(),
            language: file.language,
            line_count: parsed.line_count,
            summary: parsed.describe(file.language),
            interfaces: parsed.interfaces.clone(),
            deps_internal: BTreeSet::new(),
            deps_external: BTreeSet::new(),
        };
        let mut unresolved = Vec::new();

        for import in &parsed.imports {
            match adapter.resolve(import, &ctx) {
                Some(Resolution::Internal(target)) if target != file.path => {
                    module.deps_internal.insert(target);
                }
                Some(Resolution::Internal(_)) => {}
                Some(Resolution::External(package)) => {
                    module.deps_external.insert(package);
                }
                None if import.is_relative() => {
                    tracing::debug!(
                        "Unresolved import {} in {}:{}",
                        import.display(),
                        file.path,
                        import.line
                    );
                    unresolved.push(UnresolvedImport {
                        path: file.path.clone(),
                        import: import.display(),
                        line: import.line,
                    });
                }
                // Standard library and platform imports.
                None => {}
            }
        }

        (FileOutcome::Parsed(module), unresolved)
    }
}

/// One edge per internal dependency. Dependencies on modules that are not in
/// the graph are removed and returned.
fn synthesize_edges(graph: &mut Graph) -> Vec<Edge> {
    let present: BTreeSet<String> = graph.modules.keys().cloned().collect();
    let mut dangling = Vec::new();

    for module in graph.modules.values_mut() {
        let missing: Vec<String> = module
            .deps_internal
            .iter()
            .filter(|dep| !present.contains(*dep))
            .cloned()
            .collect();
        for target in missing {
            module.deps_internal.remove(&target);
            dangling.push(Edge::imports(module.path.clone(), target));
        }
    }

    graph.edges = graph
        .modules
        .values()
        .flat_map(|m| m.deps_internal.iter().map(|dep| Edge::imports(m.path.clone(), dep.clone())))
        .collect();
    dangling
}
