//! Language adapters and the static registry that selects them

pub mod doc;
pub mod go;
pub mod java;
pub mod javascript;
pub mod python;
pub mod rust;
pub mod typescript;

use crate::extractor::LanguageAdapter;
use codemap_core::Language;
use std::collections::BTreeSet;
use std::path::Path;

/// Directories skipped regardless of language.
pub const COMMON_EXCLUDED_DIRS: &[&str] = &[".git", ".hg", ".svn", ".codemap", ".idea", ".vscode"];

static ADAPTERS: [&dyn LanguageAdapter; 7] = [
    &python::PythonAdapter,
    &rust::RustAdapter,
    &typescript::TypeScriptAdapter,
    &typescript::TsxAdapter,
    &javascript::JavaScriptAdapter,
    &go::GoAdapter,
    &java::JavaAdapter,
];

/// Every registered adapter.
pub fn adapters() -> &'static [&'static dyn LanguageAdapter] {
    &ADAPTERS
}

/// Get the adapter for a file based on its extension
pub fn adapter_for_path(path: &Path) -> Option<&'static dyn LanguageAdapter> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    ADAPTERS
        .iter()
        .copied()
        .find(|adapter| adapter.extensions().contains(&ext.as_str()))
}

/// The primary adapter of a language (TSX shares TypeScript's resolver).
pub fn adapter_for_language(language: Language) -> &'static dyn LanguageAdapter {
    match language {
        Language::Python => &python::PythonAdapter,
        Language::Rust => &rust::RustAdapter,
        Language::TypeScript => &typescript::TypeScriptAdapter,
        Language::JavaScript => &javascript::JavaScriptAdapter,
        Language::Go => &go::GoAdapter,
        Language::Java => &java::JavaAdapter,
    }
}

/// Excluded directory names for the given languages; empty means all.
pub fn excluded_dirs_for(languages: &[Language]) -> BTreeSet<&'static str> {
    let mut dirs: BTreeSet<&'static str> = COMMON_EXCLUDED_DIRS.iter().copied().collect();
    for adapter in ADAPTERS.iter() {
        if languages.is_empty() || languages.contains(&adapter.language()) {
            dirs.extend(adapter.excluded_dirs().iter().copied());
        }
    }
    dirs
}

/// Match a directory name against an exclusion set. `*suffix` entries
/// match by suffix (`*.egg-info`).
pub fn is_excluded_dir(name: &str, excluded: &BTreeSet<&'static str>) -> bool {
    excluded.contains(name)
        || excluded
            .iter()
            .filter_map(|pattern| pattern.strip_prefix('*'))
            .any(|suffix| name.ends_with(suffix))
}
