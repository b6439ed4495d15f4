//! Per-file reconciliation status

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a file relates to the knowledge cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Cached and the hash still matches.
    Known,
    /// Cached, but the file changed or the entry has no provenance.
    Stale,
    /// On disk with no cache entry.
    Unknown,
    /// Cached, but no longer discovered on disk.
    Deleted,
}

impl Status {
    pub const ALL: [Status; 4] = [Status::Known, Status::Stale, Status::Unknown, Status::Deleted];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Known => "known",
            Status::Stale => "stale",
            Status::Unknown => "unknown",
            Status::Deleted => "deleted",
        }
    }

    /// Files the learn pass picks up.
    pub fn needs_learning(&self) -> bool {
        matches!(self, Status::Unknown | Status::Stale)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileStatus {
    pub path: String,
    pub status: Status,
    /// Hash of the file as found during this run; absent for deleted files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_hash: Option<String>,
    /// Hash recorded by the cache entry, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored_hash: Option<String>,
}

/// Classify a discovered file against its cache entry hash.
///
/// `entry` is `None` when the cache has no entry, `Some(None)` when the
/// entry carries no content reference.
pub fn classify(current_hash: &str, entry: Option<Option<&str>>) -> Status {
    match entry {
        None => Status::Unknown,
        Some(None) => Status::Stale,
        Some(Some(stored)) if stored != current_hash => Status::Stale,
        Some(Some(_)) => Status::Known,
    }
}
