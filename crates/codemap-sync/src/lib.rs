//! Codemap Sync: reconciles the knowledge cache with the working tree

pub mod engine;
pub mod learn;
pub mod staleness;
pub mod status;

#[cfg(test)]
pub mod tests;

pub use engine::{StatusCounts, SyncEngine, SyncError, SyncOptions, SyncReport, SyncSummary};
pub use learn::synthesize;
pub use staleness::StalenessLookup;
pub use status::{FileStatus, Status};
