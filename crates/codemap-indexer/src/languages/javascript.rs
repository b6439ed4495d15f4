//! JavaScript adapter, plus the ECMAScript extraction and module resolution
//! shared with the TypeScript adapters

use super::doc::comment_summary;
use crate::extractor::{LanguageAdapter, ParsedFile, RawImport, ResolveContext, Resolution};
use crate::parser::{self, collapse_whitespace, line_of, named_children, signature_before, text};
use crate::paths::{ascend, join, normalize, parent_dir};
use codemap_core::{Interface, InterfaceKind, Language, Result};
use tree_sitter::Node;

pub struct JavaScriptAdapter;

/// Directories skipped for JavaScript and TypeScript projects.
pub(super) const ECMASCRIPT_EXCLUDED_DIRS: &[&str] =
    &["node_modules", ".next", "coverage", "dist", "build"];

/// Extensions tried, in order, when a specifier omits one.
const RESOLVE_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts", "d.ts", "js", "jsx", "mjs", "cjs"];

/// Node.js core modules. Sorted for binary search.
const NODE_BUILTINS: &[&str] = &[
    "assert", "async_hooks", "buffer", "child_process", "cluster", "console", "constants",
    "crypto", "dgram", "diagnostics_channel", "dns", "domain", "events", "fs", "http", "http2",
    "https", "inspector", "module", "net", "os", "path", "perf_hooks", "process", "punycode",
    "querystring", "readline", "repl", "stream", "string_decoder", "sys", "timers", "tls",
    "trace_events", "tty", "url", "util", "v8", "vm", "wasi", "worker_threads", "zlib",
];

impl LanguageAdapter for JavaScriptAdapter {
    fn language(&self) -> Language {
        Language::JavaScript
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["js", "jsx", "mjs", "cjs"]
    }

    fn excluded_dirs(&self) -> &'static [&'static str] {
        ECMASCRIPT_EXCLUDED_DIRS
    }

    fn parse(&self, source: &[u8]) -> Result<ParsedFile> {
        parse_ecmascript(&tree_sitter_javascript::LANGUAGE.into(), source)
    }

    fn resolve(&self, import: &RawImport, ctx: &ResolveContext<'_>) -> Option<Resolution> {
        resolve_specifier(import, ctx)
    }
}

/// Parse a JavaScript-family file with the given grammar. Syntax errors are
/// tolerated; whatever the tree yields is extracted.
pub(super) fn parse_ecmascript(grammar: &tree_sitter::Language, source: &[u8]) -> Result<ParsedFile> {
    let code = parser::decode(source)?;
    let tree = parser::parse_tree(grammar, code)?;
    let root = tree.root_node();

    let mut imports = Vec::new();
    collect_imports(root, source, &mut imports);

    let interfaces = named_children(root)
        .into_iter()
        .filter(|n| n.kind() == "export_statement")
        .flat_map(|n| exported_interfaces(n, source))
        .collect();

    let summary = named_children(root)
        .into_iter()
        .find(|n| n.kind() != "hash_bang_line")
        .filter(|n| n.kind() == "comment")
        .and_then(|n| comment_summary(text(n, source)));

    Ok(ParsedFile {
        summary,
        imports,
        interfaces,
        line_count: parser::line_count(code),
    })
}

fn collect_imports(node: Node<'_>, source: &[u8], out: &mut Vec<RawImport>) {
    match node.kind() {
        "import_statement" | "export_statement" | "import_require_clause" => {
            if let Some(src) = node.child_by_field_name("source") {
                out.extend(specifier_import(string_value(src, source), line_of(node)));
            }
        }
        "call_expression" => {
            let callee = node.child_by_field_name("function");
            let is_loader = callee.is_some_and(|f| {
                f.kind() == "import" || (f.kind() == "identifier" && text(f, source) == "require")
            });
            let first_arg = node
                .child_by_field_name("arguments")
                .and_then(|args| args.named_child(0))
                .filter(|arg| arg.kind() == "string");
            if let (true, Some(arg)) = (is_loader, first_arg) {
                out.extend(specifier_import(string_value(arg, source), line_of(node)));
            }
        }
        _ => {}
    }
    for child in named_children(node) {
        collect_imports(child, source, out);
    }
}

fn string_value<'a>(node: Node<'_>, source: &'a [u8]) -> &'a str {
    text(node, source).trim_matches(|c| c == '"' || c == '\'' || c == '`')
}

/// Turn a module specifier into a raw import. `./x` is level 1, each
/// further `../` adds one.
pub(super) fn specifier_import(specifier: &str, line: usize) -> Option<RawImport> {
    if specifier.is_empty() {
        return None;
    }
    if specifier == "." || specifier == ".." || specifier.starts_with("./") || specifier.starts_with("../") {
        let mut rest = specifier.strip_prefix("./").unwrap_or(specifier);
        let mut level = 1;
        loop {
            if let Some(r) = rest.strip_prefix("../") {
                rest = r;
            } else if rest == ".." {
                rest = "";
            } else {
                break;
            }
            level += 1;
        }
        let rest = if rest == "." { "" } else { rest };
        return Some(RawImport::relative(rest, level, line));
    }
    Some(RawImport::absolute(specifier, line))
}

fn exported_interfaces(export: Node<'_>, source: &[u8]) -> Vec<Interface> {
    let Some(decl) = export.child_by_field_name("declaration") else {
        return Vec::new();
    };
    let doc = export
        .prev_named_sibling()
        .filter(|n| n.kind() == "comment" && text(*n, source).starts_with("/**"))
        .and_then(|n| comment_summary(text(n, source)));
    let line = line_of(export);

    let single = |kind: InterfaceKind, body: &str| -> Vec<Interface> {
        decl.child_by_field_name("name")
            .map(|name| Interface {
                name: text(name, source).to_string(),
                kind,
                signature: signature_before(decl, body, source),
                doc_summary: doc.clone(),
                source_line: line,
            })
            .into_iter()
            .collect()
    };

    match decl.kind() {
        "function_declaration" | "generator_function_declaration" | "function_signature" => {
            single(InterfaceKind::Function, "body")
        }
        "class_declaration" | "abstract_class_declaration" => single(InterfaceKind::Class, "body"),
        "interface_declaration" => single(InterfaceKind::Interface, "body"),
        "type_alias_declaration" => single(InterfaceKind::TypeAlias, "value"),
        "enum_declaration" => single(InterfaceKind::Enum, "body"),
        "lexical_declaration" | "variable_declaration" => named_children(decl)
            .into_iter()
            .filter(|d| d.kind() == "variable_declarator")
            .filter_map(|declarator| {
                let name = text(declarator.child_by_field_name("name")?, source);
                let value = declarator.child_by_field_name("value");
                let callable = value
                    .is_some_and(|v| matches!(v.kind(), "arrow_function" | "function_expression" | "function"));
                let signature = match value.filter(|_| callable) {
                    Some(func) => format!("const {name} = {}", signature_before(func, "body", source)),
                    None => collapse_whitespace(text(declarator, source).lines().next().unwrap_or(name)),
                };
                Some(Interface {
                    name: name.to_string(),
                    kind: if callable {
                        InterfaceKind::Function
                    } else {
                        InterfaceKind::Constant
                    },
                    signature: signature.trim_end_matches(" =>").to_string(),
                    doc_summary: doc.clone(),
                    source_line: line,
                })
            })
            .collect(),
        _ => Vec::new(),
    }
}

pub fn is_node_builtin(specifier: &str) -> bool {
    if specifier.starts_with("node:") {
        return true;
    }
    let top = specifier.split('/').next().unwrap_or(specifier);
    NODE_BUILTINS.binary_search(&top).is_ok()
}

/// Package name of a bare specifier: `@scope/name` stays whole.
fn package_name(specifier: &str) -> String {
    let mut parts = specifier.split('/');
    match (parts.next(), parts.next()) {
        (Some(scope), Some(name)) if scope.starts_with('@') => format!("{scope}/{name}"),
        (Some(name), _) => name.to_string(),
        _ => specifier.to_string(),
    }
}

/// Resolve a JavaScript-family import against the known module paths.
pub(super) fn resolve_specifier(import: &RawImport, ctx: &ResolveContext<'_>) -> Option<Resolution> {
    if import.is_relative() {
        let base = ascend(parent_dir(ctx.current_module), import.level - 1)?;
        let target = normalize(&join(&base, &import.module))?;
        return find_module(&target, ctx).map(Resolution::Internal);
    }

    let specifier = import.module.as_str();
    if specifier.starts_with('/') || is_node_builtin(specifier) {
        return None;
    }
    if let Some(rest) = specifier.strip_prefix("@/").or_else(|| specifier.strip_prefix("~/")) {
        return [join("src", rest), rest.to_string()]
            .iter()
            .find_map(|target| find_module(target, ctx))
            .map(Resolution::Internal);
    }
    // baseUrl-style paths such as `components/Button`.
    if specifier.contains('/') && !specifier.starts_with('@') {
        if let Some(found) = find_module(specifier, ctx) {
            return Some(Resolution::Internal(found));
        }
    }
    Some(Resolution::External(package_name(specifier)))
}

/// Exact file, file plus extension, or directory index.
fn find_module(target: &str, ctx: &ResolveContext<'_>) -> Option<String> {
    if target.is_empty() {
        return RESOLVE_EXTENSIONS
            .iter()
            .map(|ext| format!("index.{ext}"))
            .find(|c| ctx.knows(c));
    }
    if ctx.knows(target) {
        return Some(target.to_string());
    }
    // `./x.js` written in TypeScript sources refers to `x.ts`.
    let stem = ["js", "jsx", "mjs", "cjs"]
        .iter()
        .find_map(|ext| target.strip_suffix(&format!(".{ext}")))
        .unwrap_or(target);

    RESOLVE_EXTENSIONS
        .iter()
        .map(|ext| format!("{stem}.{ext}"))
        .chain(
            RESOLVE_EXTENSIONS
                .iter()
                .map(|ext| join(target, &format!("index.{ext}"))),
        )
        .find(|c| ctx.knows(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn known(paths: &[&str]) -> BTreeSet<String> {
        paths.iter().map(|s| s.to_string()).collect()
    }

    fn resolve(known: &BTreeSet<String>, from: &str, specifier: &str) -> Option<Resolution> {
        let import = specifier_import(specifier, 1).unwrap();
        JavaScriptAdapter.resolve(&import, &ResolveContext::new(known, from))
    }

    #[test]
    fn test_specifier_levels() {
        let levels: Vec<(String, usize)> = ["./a", "../b/c", "../../d", ".", "..", "lodash"]
            .iter()
            .map(|s| {
                let i = specifier_import(s, 1).unwrap();
                (i.module, i.level)
            })
            .collect();
        assert_eq!(
            levels,
            vec![
                ("a".to_string(), 1),
                ("b/c".to_string(), 2),
                ("d".to_string(), 3),
                (String::new(), 1),
                (String::new(), 2),
                ("lodash".to_string(), 0),
            ]
        );
    }

    #[test]
    fn test_resolve_relative() {
        let known = known(&[
            "src/app.js",
            "src/util/format.js",
            "src/util/index.js",
            "src/lib/api.ts",
        ]);
        let internal = |p: &str| Some(Resolution::Internal(p.to_string()));
        assert_eq!(resolve(&known, "src/app.js", "./util/format"), internal("src/util/format.js"));
        assert_eq!(resolve(&known, "src/app.js", "./util"), internal("src/util/index.js"));
        assert_eq!(resolve(&known, "src/util/format.js", "../app.js"), internal("src/app.js"));
        assert_eq!(resolve(&known, "src/util/format.js", "."), internal("src/util/index.js"));
        assert_eq!(resolve(&known, "src/app.js", "./lib/api.js"), internal("src/lib/api.ts"));
        assert_eq!(resolve(&known, "src/app.js", "./missing"), None);
        assert_eq!(resolve(&known, "src/app.js", "../../../outside"), None);
    }

    #[test]
    fn test_resolve_packages() {
        let known = known(&["src/app.js"]);
        assert_eq!(
            resolve(&known, "src/app.js", "@babel/core/lib/parse"),
            Some(Resolution::External("@babel/core".to_string()))
        );
        assert_eq!(
            resolve(&known, "src/app.js", "lodash/fp"),
            Some(Resolution::External("lodash".to_string()))
        );
        assert_eq!(resolve(&known, "src/app.js", "fs/promises"), None);
        assert_eq!(resolve(&known, "src/app.js", "node:path"), None);
    }

    #[test]
    fn test_extract_imports() {
        let parsed = JavaScriptAdapter
            .parse(
                b"import React from 'react';\n\
                  import { format } from \"./util/format\";\n\
                  export { api } from '../api';\n\
                  const fs = require('fs');\n\
                  async function load() { return import('./lazy'); }\n",
            )
            .unwrap();
        let found: Vec<(String, usize, usize)> = parsed
            .imports
            .iter()
            .map(|i| (i.module.clone(), i.level, i.line))
            .collect();
        assert_eq!(
            found,
            vec![
                ("react".to_string(), 0, 1),
                ("util/format".to_string(), 1, 2),
                ("api".to_string(), 2, 3),
                ("fs".to_string(), 0, 4),
                ("lazy".to_string(), 1, 5),
            ]
        );
    }

    #[test]
    fn test_extract_exports() {
        let parsed = JavaScriptAdapter
            .parse(
                br#"/**
 * Date formatting helpers.
 */

/** Format a date as ISO. */
export function formatDate(date) {
  return date.toISOString();
}

export const parse = (text) => new Date(text);
export const VERSION = "1.0";
export class Formatter {}
function internal() {}
"#,
            )
            .unwrap();
        assert_eq!(parsed.summary.as_deref(), Some("Date formatting helpers."));
        let names: Vec<(&str, InterfaceKind)> = parsed
            .interfaces
            .iter()
            .map(|i| (i.name.as_str(), i.kind))
            .collect();
        assert_eq!(
            names,
            vec![
                ("formatDate", InterfaceKind::Function),
                ("parse", InterfaceKind::Function),
                ("VERSION", InterfaceKind::Constant),
                ("Formatter", InterfaceKind::Class),
            ]
        );
        assert_eq!(parsed.interfaces[0].doc_summary.as_deref(), Some("Format a date as ISO."));
        assert_eq!(parsed.interfaces[0].signature, "function formatDate(date)");
        assert_eq!(parsed.interfaces[1].signature, "const parse = (text)");
    }

    #[test]
    fn builtins_table_is_sorted() {
        assert!(NODE_BUILTINS.windows(2).all(|w| w[0] < w[1]));
    }
}
