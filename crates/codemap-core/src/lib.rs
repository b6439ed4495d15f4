//! Codemap Core: dependency graph model, content hashing, and knowledge cache

pub mod cache;
pub mod config;
pub mod error;
pub mod graph;
pub mod hasher;
pub mod knowledge;
pub mod model;
pub mod workspace;


#[cfg(test)]
pub mod test_utils;

pub use model::{Language, InterfaceKind, Interface, Module, EdgeKind, Edge, relative_path};
pub use graph::Graph;
pub use error::{Error, Result};
pub use hasher::{ContentRef, hash_file, hash_bytes, HASH_CHUNK_SIZE};
pub use knowledge::{KnowledgeCache, StoredLearning};
pub use config::Config;
pub use workspace::{WorkspaceType, ProjectLayout, detect_workspace};
pub use cache::{STATE_DIR, GRAPH_FILE, KNOWLEDGE_FILE, STALENESS_FILE, CONFIG_FILE, state_dir, graph_path, knowledge_path, staleness_path, config_path, ensure_state_dir, write_atomic, save_graph, load_graph, clear_state};
