//! Reconciles the knowledge cache with the files on disk

use crate::learn::synthesize;
use crate::staleness::StalenessLookup;
use crate::status::{classify, FileStatus, Status};
use codemap_core::{hash_file, KnowledgeCache, Language, Result};
use codemap_indexer::discover;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Learn unknown and stale files after classifying them.
    pub learn: bool,
    /// Restrict the run to these languages. Empty means all.
    pub languages: Vec<Language>,
}

/// A per-file problem that did not stop the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncError {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub known: usize,
    pub stale: usize,
    pub unknown: usize,
    pub deleted: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// Classification of every file as found before learning, sorted by path.
    pub files: Vec<FileStatus>,
    /// Paths learned during this run.
    pub learned: Vec<String>,
    pub errors: Vec<SyncError>,
    /// The knowledge document was unreadable and the run started from empty.
    pub recovered_cache: bool,
}

impl SyncReport {
    pub fn paths_with(&self, status: Status) -> Vec<&str> {
        self.files
            .iter()
            .filter(|f| f.status == status)
            .map(|f| f.path.as_str())
            .collect()
    }

    pub fn known(&self) -> Vec<&str> {
        self.paths_with(Status::Known)
    }

    pub fn stale(&self) -> Vec<&str> {
        self.paths_with(Status::Stale)
    }

    pub fn unknown(&self) -> Vec<&str> {
        self.paths_with(Status::Unknown)
    }

    pub fn deleted(&self) -> Vec<&str> {
        self.paths_with(Status::Deleted)
    }

    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for file in &self.files {
            match file.status {
                Status::Known => counts.known += 1,
                Status::Stale => counts.stale += 1,
                Status::Unknown => counts.unknown += 1,
                Status::Deleted => counts.deleted += 1,
            }
        }
        counts
    }

    /// Status of every file after the learn pass.
    pub fn final_statuses(&self) -> impl Iterator<Item = (&str, Status)> {
        let learned: BTreeSet<&str> = self.learned.iter().map(String::as_str).collect();
        self.files.iter().map(move |f| {
            let status = if learned.contains(f.path.as_str()) {
                Status::Known
            } else {
                f.status
            };
            (f.path.as_str(), status)
        })
    }

    pub fn summary(&self) -> SyncSummary<'_> {
        SyncSummary {
            counts: self.counts(),
            known: self.known(),
            stale: self.stale(),
            unknown: self.unknown(),
            deleted: self.deleted(),
            learned: self.learned.iter().map(String::as_str).collect(),
            errors: &self.errors,
            recovered_cache: self.recovered_cache,
        }
    }
}

/// Serializable view of a report for `--json` output.
#[derive(Debug, Serialize)]
pub struct SyncSummary<'a> {
    pub counts: StatusCounts,
    pub known: Vec<&'a str>,
    pub stale: Vec<&'a str>,
    pub unknown: Vec<&'a str>,
    pub deleted: Vec<&'a str>,
    pub learned: Vec<&'a str>,
    pub errors: &'a [SyncError],
    pub recovered_cache: bool,
}

pub struct SyncEngine {
    root: PathBuf,
}

impl SyncEngine {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        SyncEngine { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Classify every file, optionally learn the unknown and stale ones, and
    /// regenerate the staleness lookup.
    pub fn run(&self, options: &SyncOptions) -> Result<SyncReport> {
        let discovery = discover(&self.root, &options.languages)?;
        let mut cache = KnowledgeCache::load(&self.root)?;
        let mut report = SyncReport {
            recovered_cache: cache.recovered_from_corruption(),
            ..SyncReport::default()
        };

        let mut present = BTreeSet::new();
        for file in &discovery.files {
            let entry = cache.get(&file.path);
            let current = match hash_file(&file.abs_path) {
                Ok(hash) => hash,
                Err(e) => {
                    // Vanished since discovery: absent for this run.
                    tracing::debug!("Cannot hash {}: {}", file.path, e);
                    report.errors.push(SyncError {
                        path: file.path.clone(),
                        reason: format!("cannot hash: {e}"),
                    });
                    continue;
                }
            };
            present.insert(file.path.as_str());
            let stored = entry.map(|learning| learning.stored_hash());
            report.files.push(FileStatus {
                path: file.path.clone(),
                status: classify(&current, stored),
                current_hash: Some(current),
                stored_hash: stored.flatten().map(str::to_string),
            });
        }

        for path in cache.list_paths() {
            if present.contains(path.as_str()) || !in_scope(&path, &options.languages) {
                continue;
            }
            let stored_hash = cache.get(&path).and_then(|l| l.stored_hash()).map(str::to_string);
            report.files.push(FileStatus {
                path,
                status: Status::Deleted,
                current_hash: None,
                stored_hash,
            });
        }
        report.files.sort_by(|a, b| a.path.cmp(&b.path));

        if options.learn {
            self.learn(&mut cache, &mut report)?;
        }

        let mut lookup = StalenessLookup::from_statuses(report.final_statuses());
        if !options.languages.is_empty() {
            lookup.files.extend(self.out_of_scope_statuses(&cache, &options.languages));
        }
        lookup.write(&self.root)?;

        let counts = report.counts();
        tracing::info!(
            "Sync: {} known, {} stale, {} unknown, {} deleted, {} learned",
            counts.known,
            counts.stale,
            counts.unknown,
            counts.deleted,
            report.learned.len()
        );
        Ok(report)
    }

    /// Statuses of cached entries a language filter excluded from this run.
    /// The lookup covers the whole cache, so they are classified here without
    /// appearing in the report.
    fn out_of_scope_statuses(
        &self,
        cache: &KnowledgeCache,
        languages: &[Language],
    ) -> Vec<(String, Status)> {
        cache
            .iter()
            .filter(|(path, _)| !in_scope(path, languages))
            .map(|(path, learning)| {
                let status = match hash_file(&self.root.join(path)) {
                    Ok(current) => classify(&current, Some(learning.stored_hash())),
                    Err(_) => Status::Deleted,
                };
                (path.clone(), status)
            })
            .collect()
    }

    fn learn(&self, cache: &mut KnowledgeCache, report: &mut SyncReport) -> Result<()> {
        let pending: Vec<String> = report
            .files
            .iter()
            .filter(|f| f.status.needs_learning())
            .map(|f| f.path.clone())
            .collect();

        for path in pending {
            match synthesize(&self.root, &path) {
                Ok(learning) => {
                    tracing::debug!("Learned {}", path);
                    cache.put(learning);
                    report.learned.push(path);
                }
                Err(e) => {
                    tracing::warn!("Could not learn {}: {}", path, e);
                    report.errors.push(SyncError {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if !report.learned.is_empty() {
            cache.save()?;
        }
        Ok(())
    }
}

/// Whether a cached path belongs to this run. Without a language filter every
/// entry does, including ones no adapter handles.
fn in_scope(path: &str, languages: &[Language]) -> bool {
    languages.is_empty()
        || Language::from_path(Path::new(path)).is_some_and(|l| languages.contains(&l))
}

