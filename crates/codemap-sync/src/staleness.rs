//! The staleness lookup artifact (`.codemap/staleness.json`)
//!
//! A flattened `path -> known|stale|deleted` map regenerated after every sync,
//! so consumers can check a path without re-hashing anything. Paths without
//! an entry have never been learned.

use crate::status::Status;
use chrono::{DateTime, Utc};
use codemap_core::{ensure_state_dir, staleness_path, write_atomic, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StalenessLookup {
    pub generated_at: DateTime<Utc>,
    pub files: BTreeMap<String, Status>,
}

impl StalenessLookup {
    /// Build the lookup from final per-file statuses. Unknown files are left out.
    pub fn from_statuses<'a>(statuses: impl IntoIterator<Item = (&'a str, Status)>) -> Self {
        StalenessLookup {
            generated_at: Utc::now(),
            files: statuses
                .into_iter()
                .filter(|(_, status)| *status != Status::Unknown)
                .map(|(path, status)| (path.to_string(), status))
                .collect(),
        }
    }

    pub fn lookup(&self, path: &str) -> Option<Status> {
        self.files.get(path).copied()
    }

    pub fn write(&self, root: &Path) -> Result<()> {
        ensure_state_dir(root)?;
        let json = serde_json::to_vec_pretty(self)?;
        write_atomic(&staleness_path(root), &json)
    }

    /// Read the artifact; `Ok(None)` when no sync has run yet.
    pub fn load(root: &Path) -> Result<Option<Self>> {
        let path = staleness_path(root);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&path)?;
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| Error::CacheCorruption {
                path,
                message: e.to_string(),
            })
    }
}
