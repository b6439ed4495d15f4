//! Source file discovery
//!
//! Walks the project root, prunes excluded directories and keeps every file
//! a registered adapter claims. The full path set is known before any file
//! is parsed, which the import resolvers rely on.

use crate::extractor::LanguageAdapter;
use crate::languages::{adapter_for_path, excluded_dirs_for, is_excluded_dir};
use codemap_core::{relative_path, Error, Language, Result};
use ignore::WalkBuilder;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// One discovered source file.
#[derive(Clone)]
pub struct SourceFile {
    /// Project-relative, `/`-separated path.
    pub path: String,
    pub abs_path: PathBuf,
    pub language: Language,
    pub adapter: &'static dyn LanguageAdapter,
}

impl std::fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceFile")
            .field("path", &self.path)
            .field("language", &self.language)
            .finish()
    }
}

/// Result of a discovery walk, sorted by path.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub files: Vec<SourceFile>,
}

impl Discovery {
    pub fn known_paths(&self) -> BTreeSet<String> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&SourceFile> {
        self.files
            .binary_search_by(|f| f.path.as_str().cmp(path))
            .ok()
            .map(|idx| &self.files[idx])
    }
}

/// Discover source files under `root` for the given languages (empty = all).
///
/// An unreadable root is the only error; unreadable entries below it are
/// logged and skipped.
pub fn discover(root: &Path, languages: &[Language]) -> Result<Discovery> {
    std::fs::read_dir(root).map_err(|source| Error::ProjectRoot {
        path: root.to_path_buf(),
        source,
    })?;

    let excluded = excluded_dirs_for(languages);
    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .hidden(false)
        .follow_links(false)
        .filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
            !(is_dir
                && entry.depth() > 0
                && is_excluded_dir(&entry.file_name().to_string_lossy(), &excluded))
        })
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                tracing::warn!("Walk error: {}", err);
                continue;
            }
        };
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let abs_path = entry.path();
        let Some(adapter) = adapter_for_path(abs_path) else {
            continue;
        };
        if !languages.is_empty() && !languages.contains(&adapter.language()) {
            continue;
        }
        let Some(path) = relative_path(root, abs_path) else {
            continue;
        };
        files.push(SourceFile {
            path,
            abs_path: abs_path.to_path_buf(),
            language: adapter.language(),
            adapter,
        });
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::debug!("Discovered {} source files under {}", files.len(), root.display());
    Ok(Discovery { files })
}
