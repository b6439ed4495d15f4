//! Core data structures for the dependency graph

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Languages with a registered parser adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Rust,
    TypeScript,
    JavaScript,
    Go,
    Java,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::Python,
        Language::Rust,
        Language::TypeScript,
        Language::JavaScript,
        Language::Go,
        Language::Java,
    ];

    /// Detect language from file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str())? {
            "py" | "pyi" => Some(Language::Python),
            "rs" => Some(Language::Rust),
            "ts" | "tsx" | "mts" | "cts" => Some(Language::TypeScript),
            "js" | "jsx" | "mjs" | "cjs" => Some(Language::JavaScript),
            "go" => Some(Language::Go),
            "java" => Some(Language::Java),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Rust => "rust",
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
            Language::Go => "go",
            Language::Java => "java",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "python" | "py" => Ok(Language::Python),
            "rust" | "rs" => Ok(Language::Rust),
            "typescript" | "ts" => Ok(Language::TypeScript),
            "javascript" | "js" => Ok(Language::JavaScript),
            "go" | "golang" => Ok(Language::Go),
            "java" => Ok(Language::Java),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

/// Discriminates what kind of exported symbol an interface represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterfaceKind {
    Function,
    Method,
    Class,
    Struct,
    Enum,
    Trait,
    Interface,
    TypeAlias,
    Constant,
    Module,
}

impl InterfaceKind {
    /// Types rank above callables, callables above constants.
    pub fn prominence(&self) -> u8 {
        match self {
            InterfaceKind::Class
            | InterfaceKind::Struct
            | InterfaceKind::Trait
            | InterfaceKind::Interface => 3,
            InterfaceKind::Enum | InterfaceKind::TypeAlias | InterfaceKind::Function => 2,
            InterfaceKind::Method | InterfaceKind::Module => 1,
            InterfaceKind::Constant => 0,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, InterfaceKind::Function | InterfaceKind::Method)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InterfaceKind::Function => "function",
            InterfaceKind::Method => "method",
            InterfaceKind::Class => "class",
            InterfaceKind::Struct => "struct",
            InterfaceKind::Enum => "enum",
            InterfaceKind::Trait => "trait",
            InterfaceKind::Interface => "interface",
            InterfaceKind::TypeAlias => "type alias",
            InterfaceKind::Constant => "constant",
            InterfaceKind::Module => "module",
        }
    }
}

/// One exported symbol of a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,
    pub kind: InterfaceKind,
    pub signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_summary: Option<String>,
    /// 1-based line of the declaration.
    pub source_line: usize,
}

/// One parsed source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// Project-relative path using `/` separators.
    pub path: String,
    pub language: Language,
    pub line_count: usize,
    pub summary: String,
    pub interfaces: Vec<Interface>,
    pub deps_internal: BTreeSet<String>,
    pub deps_external: BTreeSet<String>,
}

/// What kind of relationship an edge represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    #[default]
    Imports,
}

/// A directed dependency between two internal modules.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub kind: EdgeKind,
}

impl Edge {
    pub fn imports(source: impl Into<String>, target: impl Into<String>) -> Self {
        Edge {
            source: source.into(),
            target: target.into(),
            kind: EdgeKind::Imports,
        }
    }
}

/// Convert a path relative to `root` into the canonical `/`-separated form.
pub fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
