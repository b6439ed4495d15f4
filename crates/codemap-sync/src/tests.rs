//! Unit tests for codemap-sync module

use crate::*;
use codemap_core::{knowledge_path, ContentRef, KnowledgeCache, Language, StoredLearning};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn project(files: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    for (path, content) in files {
        write(temp_dir.path(), path, content);
    }
    temp_dir
}

fn write(root: &Path, rel: &str, content: &str) {
    let full_path = root.join(rel);
    fs::create_dir_all(full_path.parent().unwrap()).unwrap();
    fs::write(full_path, content).unwrap();
}

fn sample_project() -> TempDir {
    project(&[
        ("app/__init__.py", ""),
        ("app/main.py", "from . import db\n\ndef run():\n    pass\n"),
        ("app/db.py", "\"\"\"Database access.\"\"\"\n"),
    ])
}

fn sync(root: &Path, learn: bool) -> SyncReport {
    SyncEngine::new(root)
        .run(&SyncOptions {
            learn,
            languages: Vec::new(),
        })
        .unwrap()
}

#[test]
fn test_first_sync_reports_unknown() {
    let dir = sample_project();
    let report = sync(dir.path(), false);

    assert_eq!(
        report.unknown(),
        vec!["app/__init__.py", "app/db.py", "app/main.py"]
    );
    assert!(report.learned.is_empty());
    assert!(!knowledge_path(dir.path()).exists());

    let lookup = StalenessLookup::load(dir.path()).unwrap().unwrap();
    assert!(lookup.files.is_empty());
}

#[test]
fn test_learn_is_idempotent() {
    let dir = sample_project();
    let first = sync(dir.path(), true);
    assert_eq!(first.learned.len(), 3);
    assert_eq!(first.counts().unknown, 3);

    let second = sync(dir.path(), true);
    assert!(second.learned.is_empty());
    assert_eq!(
        second.counts(),
        StatusCounts {
            known: 3,
            stale: 0,
            unknown: 0,
            deleted: 0
        }
    );

    let cache = KnowledgeCache::load(dir.path()).unwrap();
    assert_eq!(cache.get("app/db.py").unwrap().summary, "Database access.");
}

#[test]
fn test_staleness_round_trip_on_revert() {
    let dir = sample_project();
    sync(dir.path(), true);
    let original = fs::read_to_string(dir.path().join("app/db.py")).unwrap();

    write(dir.path(), "app/db.py", "\"\"\"Database access, now cached.\"\"\"\n");
    let cache = KnowledgeCache::load(dir.path()).unwrap();
    assert!(cache.is_stale("app/db.py"));
    assert_eq!(sync(dir.path(), false).stale(), vec!["app/db.py"]);

    write(dir.path(), "app/db.py", &original);
    assert!(!cache.is_stale("app/db.py"));
    let report = sync(dir.path(), false);
    assert!(report.stale().is_empty());
    assert_eq!(report.counts().known, 3);
}

#[test]
fn test_stale_file_is_relearned() {
    let dir = sample_project();
    sync(dir.path(), true);
    write(dir.path(), "app/main.py", "def run():\n    return 1\n");

    let report = sync(dir.path(), true);
    assert_eq!(report.stale(), vec!["app/main.py"]);
    assert_eq!(report.learned, vec!["app/main.py".to_string()]);

    let lookup = StalenessLookup::load(dir.path()).unwrap().unwrap();
    assert_eq!(lookup.lookup("app/main.py"), Some(Status::Known));
}

#[test]
fn test_deleted_files_are_detected() {
    let dir = sample_project();
    sync(dir.path(), true);
    fs::remove_file(dir.path().join("app/db.py")).unwrap();

    let report = sync(dir.path(), false);
    assert_eq!(report.deleted(), vec!["app/db.py"]);
    let counts = report.counts();
    assert_eq!(counts.known + counts.stale + counts.unknown, 2);
    assert_eq!(counts.deleted, 1);

    let lookup = StalenessLookup::load(dir.path()).unwrap().unwrap();
    assert_eq!(lookup.lookup("app/db.py"), Some(Status::Deleted));
}

#[test]
fn test_language_filter_limits_deletions() {
    let dir = sample_project();
    write(dir.path(), "tool/main.rs", "fn main() {}\n");
    sync(dir.path(), true);
    fs::remove_file(dir.path().join("tool/main.rs")).unwrap();
    fs::remove_file(dir.path().join("app/db.py")).unwrap();

    let python_only = SyncEngine::new(dir.path())
        .run(&SyncOptions {
            learn: false,
            languages: vec![Language::Python],
        })
        .unwrap();
    assert_eq!(python_only.deleted(), vec!["app/db.py"]);
    assert!(python_only.files.iter().all(|f| f.path.ends_with(".py")));

    let everything = sync(dir.path(), false);
    assert_eq!(everything.deleted(), vec!["app/db.py", "tool/main.rs"]);
}

#[test]
fn test_language_filter_keeps_other_languages_in_lookup() {
    let dir = sample_project();
    write(dir.path(), "tool/main.rs", "fn main() {}\n");
    write(dir.path(), "tool/cli.rs", "pub fn run() {}\n");
    write(dir.path(), "tool/old.rs", "pub fn old() {}\n");
    sync(dir.path(), true);

    write(dir.path(), "tool/cli.rs", "pub fn run() { todo!() }\n");
    fs::remove_file(dir.path().join("tool/old.rs")).unwrap();
    let python_only = SyncEngine::new(dir.path())
        .run(&SyncOptions {
            learn: false,
            languages: vec![Language::Python],
        })
        .unwrap();
    assert_eq!(python_only.files.len(), 3);

    let lookup = StalenessLookup::load(dir.path()).unwrap().unwrap();
    assert_eq!(lookup.lookup("app/db.py"), Some(Status::Known));
    assert_eq!(lookup.lookup("tool/main.rs"), Some(Status::Known));
    assert_eq!(lookup.lookup("tool/cli.rs"), Some(Status::Stale));
    assert_eq!(lookup.lookup("tool/old.rs"), Some(Status::Deleted));
}

#[test]
fn test_entry_without_provenance_is_stale() {
    let dir = sample_project();
    let mut cache = KnowledgeCache::load(dir.path()).unwrap();
    cache.put(StoredLearning {
        module_path: "app/db.py".to_string(),
        learned_at: chrono::Utc::now(),
        summary: "hand written".to_string(),
        purpose: String::new(),
        key_functions: Default::default(),
        gotchas: vec!["written by someone else".to_string()],
        confidence: 0.9,
        source_ref: None,
    });
    cache.save().unwrap();

    let report = sync(dir.path(), false);
    assert_eq!(report.stale(), vec!["app/db.py"]);
    assert_eq!(report.files.iter().find(|f| f.path == "app/db.py").unwrap().stored_hash, None);
}

#[test]
fn test_learn_failures_do_not_abort() {
    let dir = sample_project();
    write(dir.path(), "app/broken.py", "def broken(:\n");

    let report = sync(dir.path(), true);
    assert_eq!(report.learned.len(), 3);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].path, "app/broken.py");
    assert!(report.errors[0].reason.contains("line 1"));

    let lookup = StalenessLookup::load(dir.path()).unwrap().unwrap();
    assert_eq!(lookup.lookup("app/broken.py"), None);
}

#[test]
fn test_corrupt_cache_is_recovered() {
    let dir = sample_project();
    write(dir.path(), ".codemap/knowledge.json", "{not json");

    let report = sync(dir.path(), false);
    assert!(report.recovered_cache);
    assert_eq!(report.counts().unknown, 3);
}

#[test]
fn test_learning_preserves_foreign_sections() {
    let dir = sample_project();
    write(
        dir.path(),
        ".codemap/knowledge.json",
        r#"{"decisions": [{"id": 1, "text": "use sqlite"}], "learnings": {}}"#,
    );

    sync(dir.path(), true);
    let doc: serde_json::Value =
        serde_json::from_slice(&fs::read(knowledge_path(dir.path())).unwrap()).unwrap();
    assert_eq!(doc["decisions"][0]["text"], "use sqlite");
    assert_eq!(doc["learnings"].as_object().unwrap().len(), 3);
}

#[test]
fn test_summary_json_shape() {
    let dir = sample_project();
    let mut cache = KnowledgeCache::load(dir.path()).unwrap();
    cache.put(StoredLearning {
        module_path: "app/gone.py".to_string(),
        learned_at: chrono::Utc::now(),
        summary: "gone".to_string(),
        purpose: String::new(),
        key_functions: Default::default(),
        gotchas: Vec::new(),
        confidence: 0.2,
        source_ref: Some(ContentRef::new("app/gone.py", "00")),
    });
    cache.save().unwrap();

    let report = sync(dir.path(), false);
    insta::assert_json_snapshot!(report.summary(), @r#"
    {
      "counts": {
        "known": 0,
        "stale": 0,
        "unknown": 3,
        "deleted": 1
      },
      "known": [],
      "stale": [],
      "unknown": [
        "app/__init__.py",
        "app/db.py",
        "app/main.py"
      ],
      "deleted": [
        "app/gone.py"
      ],
      "learned": [],
      "errors": [],
      "recovered_cache": false
    }
    "#);
}
