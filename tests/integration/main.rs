//! Integration tests for Codemap
//!
//! These tests drive the indexer, the sync engine and the CLI together on
//! throwaway project trees.

use codemap_core::{graph_path, knowledge_path, load_graph, staleness_path, KnowledgeCache};
use codemap_indexer::Coordinator;
use codemap_sync::{StalenessLookup, Status, SyncEngine, SyncOptions};
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn oracle_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "pkg/__init__.py", "");
    write(root, "pkg/a.py", "def a():\n    pass\n");
    write(root, "pkg/sub/__init__.py", "");
    write(root, "pkg/sub/b.py", "from .. import a\nfrom ..sub.c import thing\nfrom . import c as again\n");
    write(root, "pkg/sub/c.py", "import json\nimport numpy as np\n");
    dir
}

fn learn_all(root: &Path) {
    SyncEngine::new(root)
        .run(&SyncOptions {
            learn: true,
            ..SyncOptions::default()
        })
        .unwrap();
}

fn codemap(root: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_codemap"))
        .arg("--root")
        .arg(root)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute codemap")
}

/// Relative imports resolve through the full pipeline
#[test]
fn test_relative_import_resolution_end_to_end() {
    let dir = oracle_project();
    let report = Coordinator::new(dir.path()).run_full_index().unwrap();
    let graph = load_graph(dir.path()).unwrap().unwrap();

    assert!(report.unresolved.is_empty());
    assert_eq!(graph.dependencies("pkg/sub/b.py"), vec!["pkg/a.py", "pkg/sub/c.py"]);
    let c = graph.module("pkg/sub/c.py").unwrap();
    assert!(c.deps_internal.is_empty());
    assert_eq!(c.deps_external.iter().collect::<Vec<_>>(), vec!["numpy"]);
    assert_eq!(
        graph.transitive_dependents("pkg/sub/c.py").into_iter().collect::<Vec<_>>(),
        vec!["pkg/sub/b.py"]
    );
}

/// Indexing never touches learned knowledge
#[test]
fn test_reindex_leaves_knowledge_untouched() {
    let dir = oracle_project();
    learn_all(dir.path());
    let before = fs::read(knowledge_path(dir.path())).unwrap();

    Coordinator::new(dir.path()).run_full_index().unwrap();
    write(dir.path(), "pkg/d.py", "from . import a\n");
    Coordinator::new(dir.path()).run_full_index().unwrap();

    assert_eq!(fs::read(knowledge_path(dir.path())).unwrap(), before);
    assert!(graph_path(dir.path()).exists());
}

/// A file that fails to parse is reported and the rest still index and sync
#[test]
fn test_broken_file_is_isolated() {
    let dir = oracle_project();
    write(dir.path(), "pkg/broken.py", "class (:\n");

    let report = Coordinator::new(dir.path()).run_full_index().unwrap();
    assert_eq!(report.graph.module_count(), 5);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, "pkg/broken.py");

    let sync = SyncEngine::new(dir.path())
        .run(&SyncOptions {
            learn: true,
            ..SyncOptions::default()
        })
        .unwrap();
    assert_eq!(sync.learned.len(), 5);
    assert_eq!(sync.errors.len(), 1);
}

/// Editing a file after learning flips it to stale, reverting flips it back
#[test]
fn test_edit_and_revert_cycle() {
    let dir = oracle_project();
    learn_all(dir.path());
    let original = fs::read_to_string(dir.path().join("pkg/a.py")).unwrap();

    write(dir.path(), "pkg/a.py", "def a():\n    return 2\n");
    let report = SyncEngine::new(dir.path()).run(&SyncOptions::default()).unwrap();
    assert_eq!(report.stale(), vec!["pkg/a.py"]);
    let lookup = StalenessLookup::load(dir.path()).unwrap().unwrap();
    assert_eq!(lookup.lookup("pkg/a.py"), Some(Status::Stale));

    write(dir.path(), "pkg/a.py", &original);
    let report = SyncEngine::new(dir.path()).run(&SyncOptions::default()).unwrap();
    assert!(report.stale().is_empty());
    assert!(!KnowledgeCache::load(dir.path()).unwrap().is_stale("pkg/a.py"));
}

/// The CLI writes both artifacts and prints machine-readable summaries
#[test]
fn test_cli_index_sync_and_clear() {
    let dir = oracle_project();
    let root = dir.path();

    let output = codemap(root, &["index", "--json"]);
    assert!(output.status.success());
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["modules"], 5);
    assert_eq!(summary["edges"], 2);

    let output = codemap(root, &["sync", "--learn", "--json"]);
    assert!(output.status.success());
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["counts"]["unknown"], 5);
    assert_eq!(summary["learned"].as_array().unwrap().len(), 5);

    let output = codemap(root, &["deps", "pkg/a.py"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("pkg/sub/b.py"));

    assert!(codemap(root, &["clear"]).status.success());
    assert!(!graph_path(root).exists());
    assert!(!staleness_path(root).exists());
    assert!(knowledge_path(root).exists());

    assert!(codemap(root, &["clear", "--all"]).status.success());
    assert!(!knowledge_path(root).exists());
}

#[test]
fn test_cli_deps_without_graph_fails() {
    let dir = oracle_project();
    let output = codemap(dir.path(), &["deps", "pkg/a.py"]);
    assert!(!output.status.success());
}

#[test]
fn test_cli_rejects_unknown_language() {
    let dir = oracle_project();
    let output = codemap(dir.path(), &["index", "--lang", "cobol"]);
    assert!(!output.status.success());
}
