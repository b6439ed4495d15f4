//! SHA-256 content fingerprints used for staleness detection.
//!
//! Files are streamed in fixed-size chunks so arbitrarily large inputs are
//! hashed with bounded memory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Chunk size used when streaming a file into the hasher.
pub const HASH_CHUNK_SIZE: usize = 64 * 1024;

/// Compute the lowercase hex SHA-256 of a file's raw bytes.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_CHUNK_SIZE];
    loop {
        let n = match file.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Compute the lowercase hex SHA-256 of in-memory content.
pub fn hash_bytes(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// A path paired with the hash of its bytes at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRef {
    pub path: String,
    pub content_hash: String,
    pub hashed_at: DateTime<Utc>,
}

impl ContentRef {
    /// Hash `rel_path` under `root` and record it.
    pub fn capture(root: &Path, rel_path: &str) -> io::Result<Self> {
        let content_hash = hash_file(&root.join(rel_path))?;
        Ok(Self::new(rel_path, content_hash))
    }

    pub fn new(path: impl Into<String>, content_hash: impl Into<String>) -> Self {
        ContentRef {
            path: path.into(),
            content_hash: content_hash.into(),
            hashed_at: Utc::now(),
        }
    }
}
