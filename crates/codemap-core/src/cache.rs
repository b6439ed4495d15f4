//! State directory layout and graph persistence

use crate::error::{Error, Result};
use crate::graph::Graph;
use std::path::{Path, PathBuf};

/// State directory: .codemap/
pub const STATE_DIR: &str = ".codemap";

/// Persisted dependency graph
pub const GRAPH_FILE: &str = "graph.json";

/// Persisted knowledge cache
pub const KNOWLEDGE_FILE: &str = "knowledge.json";

/// Derived path -> status lookup written after every sync
pub const STALENESS_FILE: &str = "staleness.json";

/// Optional configuration
pub const CONFIG_FILE: &str = "config.toml";

/// Get state directory path
pub fn state_dir(root: &Path) -> PathBuf {
    root.join(STATE_DIR)
}

pub fn graph_path(root: &Path) -> PathBuf {
    state_dir(root).join(GRAPH_FILE)
}

pub fn knowledge_path(root: &Path) -> PathBuf {
    state_dir(root).join(KNOWLEDGE_FILE)
}

pub fn staleness_path(root: &Path) -> PathBuf {
    state_dir(root).join(STALENESS_FILE)
}

pub fn config_path(root: &Path) -> PathBuf {
    state_dir(root).join(CONFIG_FILE)
}

/// Ensure state directory exists
pub fn ensure_state_dir(root: &Path) -> Result<()> {
    let dir = state_dir(root);
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|source| Error::ProjectRoot {
            path: root.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

/// Write `contents` next to `path` and rename it into place, so readers never
/// observe a half-written document.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Replace the persisted graph wholesale.
pub fn save_graph(graph: &Graph, root: &Path) -> Result<()> {
    ensure_state_dir(root)?;
    let path = graph_path(root);
    let json = serde_json::to_vec_pretty(graph)?;
    write_atomic(&path, &json)?;
    tracing::debug!("Graph saved: {}", path.display());
    Ok(())
}

/// Load the persisted graph, if any.
pub fn load_graph(root: &Path) -> Result<Option<Graph>> {
    let path = graph_path(root);
    if !path.exists() {
        return Ok(None);
    }
    let bytes = std::fs::read(&path)?;
    let graph = serde_json::from_slice(&bytes).map_err(|e| Error::CacheCorruption {
        path: path.clone(),
        message: e.to_string(),
    })?;
    tracing::debug!("Graph loaded from: {}", path.display());
    Ok(Some(graph))
}

/// Remove derived state (graph and staleness lookup). The knowledge cache is
/// only removed when `include_knowledge` is set.
pub fn clear_state(root: &Path, include_knowledge: bool) -> Result<Vec<PathBuf>> {
    let mut targets = vec![graph_path(root), staleness_path(root)];
    if include_knowledge {
        targets.push(knowledge_path(root));
    }
    let mut removed = Vec::new();
    for path in targets {
        if path.exists() {
            std::fs::remove_file(&path)?;
            removed.push(path);
        }
    }
    Ok(removed)
}
