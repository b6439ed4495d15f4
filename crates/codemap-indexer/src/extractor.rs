//! Language adapter trait definition

use codemap_core::{Interface, Language, Result};
use serde::Serialize;
use std::collections::BTreeSet;

/// One import statement as written in the source, before resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawImport {
    /// Module path in the language's own notation (`a.b`, `crate::x`, `./y`, ...).
    /// For relative imports this is the part after the relative marker.
    pub module: String,
    /// Directory levels to ascend; 0 means absolute, 1 means the current package.
    pub level: usize,
    /// Imported symbols, when the statement names them.
    pub names: Vec<String>,
    /// 1-based line of the statement.
    pub line: usize,
}

impl RawImport {
    pub fn absolute(module: impl Into<String>, line: usize) -> Self {
        RawImport {
            module: module.into(),
            level: 0,
            names: Vec::new(),
            line,
        }
    }

    pub fn relative(module: impl Into<String>, level: usize, line: usize) -> Self {
        RawImport {
            module: module.into(),
            level,
            names: Vec::new(),
            line,
        }
    }

    pub fn with_names(mut self, names: Vec<String>) -> Self {
        self.names = names;
        self
    }

    pub fn is_relative(&self) -> bool {
        self.level > 0
    }

    /// Human-readable form used in diagnostics.
    pub fn display(&self) -> String {
        if self.level == 0 {
            self.module.clone()
        } else {
            format!("{}{}", ".".repeat(self.level), self.module)
        }
    }
}

/// Uniform output of every language adapter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFile {
    /// File-level documentation, reduced to its first sentence.
    pub summary: Option<String>,
    pub imports: Vec<RawImport>,
    pub interfaces: Vec<Interface>,
    pub line_count: usize,
}

impl ParsedFile {
    /// Describe the file: its own documentation when present, otherwise the
    /// most prominent interfaces, otherwise a generic line-count note.
    pub fn describe(&self, language: Language) -> String {
        if let Some(summary) = self.summary.as_ref().filter(|s| !s.is_empty()) {
            return summary.clone();
        }
        let prominent = self.prominent_interfaces(3);
        if !prominent.is_empty() {
            let names: Vec<String> = prominent
                .iter()
                .map(|i| format!("{} {}", i.kind.as_str(), i.name))
                .collect();
            let more = self.interfaces.len().saturating_sub(prominent.len());
            let tail = if more > 0 {
                format!(" and {more} more")
            } else {
                String::new()
            };
            return format!("Defines {}{}", names.join(", "), tail);
        }
        format!("{} source file, {} lines", language, self.line_count)
    }

    /// Up to `limit` interfaces ordered by kind prominence, then source order.
    pub fn prominent_interfaces(&self, limit: usize) -> Vec<&Interface> {
        let mut ranked: Vec<&Interface> = self.interfaces.iter().collect();
        ranked.sort_by(|a, b| {
            b.kind
                .prominence()
                .cmp(&a.kind.prominence())
                .then(a.source_line.cmp(&b.source_line))
        });
        ranked.truncate(limit);
        ranked
    }
}

/// Outcome of resolving one import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Project-relative path of an internal module.
    Internal(String),
    /// Name of a third-party package.
    External(String),
}

/// Everything a resolver may consult. Resolvers never touch the filesystem.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    /// Every discovered module path, computed before any resolution starts.
    pub known_paths: &'a BTreeSet<String>,
    /// Path of the module containing the import.
    pub current_module: &'a str,
    /// Language-specific project prefix (go.mod module path, Python `src`, Java source root).
    pub project_prefix: Option<&'a str>,
}

impl<'a> ResolveContext<'a> {
    pub fn new(known_paths: &'a BTreeSet<String>, current_module: &'a str) -> Self {
        ResolveContext {
            known_paths,
            current_module,
            project_prefix: None,
        }
    }

    pub fn with_prefix(mut self, prefix: Option<&'a str>) -> Self {
        self.project_prefix = prefix;
        self
    }

    pub fn knows(&self, path: &str) -> bool {
        self.known_paths.contains(path)
    }
}

/// A per-language parser and import resolver. Implementations are stateless
/// and independent of each other.
pub trait LanguageAdapter: Send + Sync {
    fn language(&self) -> Language;

    /// File extensions this adapter handles (without the dot).
    fn extensions(&self) -> &'static [&'static str];

    /// Directory names skipped during discovery for this language.
    /// Entries starting with `*` match as a suffix.
    fn excluded_dirs(&self) -> &'static [&'static str];

    /// Parse raw file bytes into the uniform record.
    fn parse(&self, source: &[u8]) -> Result<ParsedFile>;

    /// Classify one import as internal, external, or neither (`None`).
    fn resolve(&self, import: &RawImport, ctx: &ResolveContext<'_>) -> Option<Resolution>;
}
