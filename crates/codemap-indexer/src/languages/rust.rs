//! Rust adapter using tree-sitter

use super::doc::comment_summary;
use crate::extractor::{LanguageAdapter, ParsedFile, RawImport, ResolveContext, Resolution};
use crate::parser::{self, line_of, named_children, signature_before, text};
use crate::paths::join;
use codemap_core::{Interface, InterfaceKind, Language, Result};
use regex::Regex;
use std::sync::LazyLock;
use tree_sitter::Node;

pub struct RustAdapter;

/// Crates that ship with the toolchain.
const BUILTIN_CRATES: &[&str] = &["alloc", "core", "proc_macro", "std", "test"];

static USE_ALIAS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+as\s+[A-Za-z_][A-Za-z0-9_]*").expect("static regex"));

impl LanguageAdapter for RustAdapter {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["rs"]
    }

    fn excluded_dirs(&self) -> &'static [&'static str] {
        &["target"]
    }

    fn parse(&self, source: &[u8]) -> Result<ParsedFile> {
        let code = parser::decode(source)?;
        let tree = parser::parse_tree(&tree_sitter_rust::LANGUAGE.into(), code)?;
        let root = tree.root_node();

        let mut imports = Vec::new();
        let mut interfaces = Vec::new();
        for item in named_children(root) {
            match item.kind() {
                "use_declaration" => imports.extend(use_imports(item, source)),
                "extern_crate_declaration" => {
                    if let Some(name) = item.child_by_field_name("name") {
                        imports.push(RawImport::absolute(text(name, source), line_of(item)));
                    }
                }
                "mod_item" if item.child_by_field_name("body").is_none() => {
                    if let Some(name) = item.child_by_field_name("name") {
                        imports.push(RawImport::relative(text(name, source), 1, line_of(item)));
                    }
                    interfaces.extend(item_interface(item, source));
                }
                "impl_item" => interfaces.extend(impl_methods(item, source)),
                _ => interfaces.extend(item_interface(item, source)),
            }
        }

        Ok(ParsedFile {
            summary: inner_doc(root, source),
            imports,
            interfaces,
            line_count: parser::line_count(code),
        })
    }

    fn resolve(&self, import: &RawImport, ctx: &ResolveContext<'_>) -> Option<Resolution> {
        let (crate_root, current) = module_segments(ctx.current_module);
        let segments: Vec<String> = import
            .module
            .split("::")
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        let search = ModuleSearch {
            crate_root: &crate_root,
            ctx,
        };

        if import.level > 0 {
            let keep = current.len().checked_sub(import.level - 1)?;
            let mut full = current[..keep].to_vec();
            full.extend(segments);
            return search.longest_prefix(&full, keep).map(Resolution::Internal);
        }

        let first = segments.first()?;
        if first == "crate" {
            return search
                .longest_prefix(&segments[1..], 0)
                .map(Resolution::Internal);
        }
        if BUILTIN_CRATES.contains(&first.as_str()) {
            return None;
        }

        // 2018 paths may name a child module of the current one.
        let mut full = current.clone();
        full.extend(segments.iter().cloned());
        if let Some(found) = search.longest_prefix(&full, current.len() + 1) {
            return Some(Resolution::Internal(found));
        }
        Some(Resolution::External(first.clone()))
    }
}

/// Crate root directory and module path of a file. The root is the nearest
/// `src` ancestor, or the file's own directory when there is none.
/// `mod.rs`, `lib.rs` and `main.rs` stand for their directory.
pub fn module_segments(path: &str) -> (String, Vec<String>) {
    let parts: Vec<&str> = path.split('/').collect();
    let dirs = &parts[..parts.len().saturating_sub(1)];
    let root_len = dirs
        .iter()
        .rposition(|p| *p == "src")
        .map(|i| i + 1)
        .unwrap_or(dirs.len());

    let mut segments: Vec<String> = parts[root_len..].iter().map(|s| s.to_string()).collect();
    if let Some(last) = segments.pop() {
        let stem = last.strip_suffix(".rs").unwrap_or(&last);
        if !matches!(stem, "mod" | "lib" | "main") {
            segments.push(stem.to_string());
        }
    }
    (parts[..root_len].join("/"), segments)
}

struct ModuleSearch<'a> {
    crate_root: &'a str,
    ctx: &'a ResolveContext<'a>,
}

impl ModuleSearch<'_> {
    /// Deepest known module file for `full`, never shorter than `min_len`
    /// segments and never the importing file itself.
    fn longest_prefix(&self, full: &[String], min_len: usize) -> Option<String> {
        if min_len > full.len() {
            return None;
        }
        (min_len..=full.len()).rev().find_map(|len| {
            let candidates = if len == 0 {
                vec![
                    join(self.crate_root, "lib.rs"),
                    join(self.crate_root, "main.rs"),
                ]
            } else {
                let base = join(self.crate_root, &full[..len].join("/"));
                vec![format!("{base}.rs"), join(&base, "mod.rs")]
            };
            candidates
                .into_iter()
                .find(|c| self.ctx.knows(c) && c != self.ctx.current_module)
        })
    }
}

fn use_imports(node: Node<'_>, source: &[u8]) -> Vec<RawImport> {
    let Some(argument) = node.child_by_field_name("argument") else {
        return Vec::new();
    };
    let line = line_of(node);
    let flat: String = USE_ALIAS
        .replace_all(text(argument, source), "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    expand_use_tree(&flat)
        .into_iter()
        .filter_map(|path| path_import(&path, line))
        .collect()
}

/// Expand `a::{b, c::{d, e}}` into `a::b`, `a::c::d`, `a::c::e`.
/// `self` entries collapse onto their parent and globs are dropped.
pub fn expand_use_tree(path: &str) -> Vec<String> {
    let Some(open) = path.find('{') else {
        return vec![trim_use_path(path)];
    };
    let prefix = &path[..open];
    let Some(close) = path.rfind('}').filter(|&close| close > open) else {
        return vec![trim_use_path(prefix)];
    };
    let inner = &path[open + 1..close];

    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, ch) in inner.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                items.push(&inner[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    items.push(&inner[start..]);

    items
        .into_iter()
        .filter(|item| !item.is_empty())
        .flat_map(|item| expand_use_tree(&format!("{prefix}{item}")))
        .collect()
}

fn trim_use_path(path: &str) -> String {
    let path = path.trim_end_matches("::");
    let path = path.strip_suffix("::*").unwrap_or(path);
    let path = path.strip_suffix("::self").unwrap_or(path);
    path.to_string()
}

fn path_import(path: &str, line: usize) -> Option<RawImport> {
    let segments: Vec<&str> = path.split("::").filter(|s| !s.is_empty() && *s != "*").collect();
    let first = *segments.first()?;
    let supers = segments.iter().take_while(|s| **s == "super").count();
    let import = match first {
        "self" => RawImport::relative(segments[1..].join("::"), 1, line),
        "super" => RawImport::relative(segments[supers..].join("::"), 1 + supers, line),
        _ => RawImport::absolute(segments.join("::"), line),
    };
    Some(import)
}

fn is_public(item: Node<'_>, source: &[u8]) -> bool {
    named_children(item)
        .into_iter()
        .any(|c| c.kind() == "visibility_modifier" && text(c, source) == "pub")
}

fn item_interface(item: Node<'_>, source: &[u8]) -> Option<Interface> {
    let (kind, body_field) = match item.kind() {
        "function_item" => (InterfaceKind::Function, "body"),
        "struct_item" | "union_item" => (InterfaceKind::Struct, "body"),
        "enum_item" => (InterfaceKind::Enum, "body"),
        "trait_item" => (InterfaceKind::Trait, "body"),
        "type_item" => (InterfaceKind::TypeAlias, "type"),
        "const_item" | "static_item" => (InterfaceKind::Constant, "value"),
        "mod_item" => (InterfaceKind::Module, "body"),
        _ => return None,
    };
    if !is_public(item, source) {
        return None;
    }
    let name = text(item.child_by_field_name("name")?, source);
    Some(Interface {
        name: name.to_string(),
        kind,
        signature: signature_before(item, body_field, source),
        doc_summary: outer_doc(item, source),
        source_line: line_of(item),
    })
}

/// Public methods of inherent impls, named `Type::method`.
fn impl_methods(item: Node<'_>, source: &[u8]) -> Vec<Interface> {
    if item.child_by_field_name("trait").is_some() {
        return Vec::new();
    }
    let (Some(ty), Some(body)) = (
        item.child_by_field_name("type"),
        item.child_by_field_name("body"),
    ) else {
        return Vec::new();
    };
    let type_name = text(ty, source).split('<').next().unwrap_or("").trim();

    named_children(body)
        .into_iter()
        .filter(|f| f.kind() == "function_item")
        .filter_map(|f| {
            let mut method = item_interface(f, source)?;
            method.name = format!("{type_name}::{}", method.name);
            method.kind = InterfaceKind::Method;
            Some(method)
        })
        .collect()
}

/// `///` comments directly above an item, skipping attributes.
fn outer_doc(item: Node<'_>, source: &[u8]) -> Option<String> {
    let mut lines = Vec::new();
    let mut current = item.prev_sibling();
    while let Some(node) = current {
        match node.kind() {
            "attribute_item" => {}
            "line_comment" if text(node, source).starts_with("///") => {
                lines.push(text(node, source).trim_end());
            }
            _ => break,
        }
        current = node.prev_sibling();
    }
    lines.reverse();
    comment_summary(&lines.join("\n"))
}

/// Leading `//!` block of the file.
fn inner_doc(root: Node<'_>, source: &[u8]) -> Option<String> {
    let lines: Vec<&str> = named_children(root)
        .into_iter()
        .take_while(|n| matches!(n.kind(), "line_comment" | "inner_attribute_item"))
        .map(|n| text(n, source).trim_end())
        .filter(|t| t.starts_with("//!"))
        .collect();
    comment_summary(&lines.join("\n"))
}
