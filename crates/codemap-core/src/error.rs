//! Error taxonomy shared by the indexer and the sync engine

use std::path::PathBuf;

/// Convenience alias used across the workspace.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The project root cannot be read or written. The only fatal condition.
    #[error("project root {path} is not accessible: {source}")]
    ProjectRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A single file failed to parse.
    #[error("{}", parse_message(.line, .message))]
    Parse { line: Option<usize>, message: String },

    #[error("no language adapter registered for {0}")]
    MissingAdapter(String),

    /// The file disappeared or became unreadable between discovery and hashing.
    #[error("cannot hash {path}: {source}")]
    HashIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("persisted document {path} is corrupt: {message}")]
    CacheCorruption { path: PathBuf, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    /// A graph invariant does not hold.
    #[error("graph error: {0}")]
    Graph(String),
}

fn parse_message(line: &Option<usize>, message: &str) -> String {
    match line {
        Some(line) => format!("parse error at line {line}: {message}"),
        None => format!("parse error: {message}"),
    }
}

impl Error {
    /// Build a parse error for a specific line.
    pub fn parse_at(line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line: Some(line),
            message: message.into(),
        }
    }

    /// Line number carried by a parse error, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::Parse { line, .. } => *line,
            _ => None,
        }
    }
}
