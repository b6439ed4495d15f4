//! Python adapter using tree-sitter
//!
//! Python is parsed strictly: any syntax error in the tree fails the file.

use super::doc::docstring_summary;
use crate::extractor::{LanguageAdapter, ParsedFile, RawImport, ResolveContext, Resolution};
use crate::parser::{self, line_of, named_children, signature_before, text};
use crate::paths::{ascend, join, parent_dir};
use codemap_core::{Interface, InterfaceKind, Language, Result};
use tree_sitter::Node;

pub struct PythonAdapter;

/// Top-level modules shipped with CPython. Sorted for binary search.
const STDLIB: &[&str] = &[
    "__future__", "_thread", "abc", "argparse", "array", "ast", "asyncio", "atexit", "base64",
    "binascii", "bisect", "builtins", "bz2", "calendar", "cmath", "codecs", "collections",
    "colorsys", "concurrent", "configparser", "contextlib", "contextvars", "copy", "copyreg",
    "csv", "ctypes", "curses", "dataclasses", "datetime", "dbm", "decimal", "difflib", "dis",
    "doctest", "email", "encodings", "enum", "errno", "faulthandler", "fcntl", "filecmp",
    "fileinput", "fnmatch", "fractions", "ftplib", "functools", "gc", "getopt", "getpass",
    "gettext", "glob", "graphlib", "grp", "gzip", "hashlib", "heapq", "hmac", "html", "http",
    "imaplib", "importlib", "inspect", "io", "ipaddress", "itertools", "json", "keyword",
    "linecache", "locale", "logging", "lzma", "mailbox", "marshal", "math", "mimetypes", "mmap",
    "multiprocessing", "netrc", "numbers", "operator", "optparse", "os", "pathlib", "pdb",
    "pickle", "pkgutil", "platform", "plistlib", "poplib", "posix", "pprint", "profile",
    "pstats", "pty", "pwd", "py_compile", "queue", "quopri", "random", "re", "readline",
    "reprlib", "resource", "runpy", "sched", "secrets", "select", "selectors", "shelve", "shlex",
    "shutil", "signal", "site", "smtplib", "socket", "socketserver", "sqlite3", "ssl", "stat",
    "statistics", "string", "stringprep", "struct", "subprocess", "symtable", "sys", "sysconfig",
    "syslog", "tarfile", "tempfile", "termios", "textwrap", "threading", "time", "timeit",
    "tkinter", "token", "tokenize", "tomllib", "trace", "traceback", "tracemalloc", "tty",
    "turtle", "types", "typing", "unicodedata", "unittest", "urllib", "uuid", "venv", "warnings",
    "wave", "weakref", "webbrowser", "winreg", "wsgiref", "xml", "xmlrpc", "zipapp", "zipfile",
    "zipimport", "zlib", "zoneinfo",
];

pub fn is_stdlib(top_level: &str) -> bool {
    STDLIB.binary_search(&top_level).is_ok()
}

impl LanguageAdapter for PythonAdapter {
    fn language(&self) -> Language {
        Language::Python
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["py", "pyi"]
    }

    fn excluded_dirs(&self) -> &'static [&'static str] {
        &[
            "__pycache__",
            ".venv",
            "venv",
            "env",
            ".tox",
            ".mypy_cache",
            ".pytest_cache",
            ".ruff_cache",
            ".eggs",
            "*.egg-info",
            "build",
            "dist",
        ]
    }

    fn parse(&self, source: &[u8]) -> Result<ParsedFile> {
        let code = parser::decode(source)?;
        let tree = parser::parse_tree(&tree_sitter_python::LANGUAGE.into(), code)?;
        let root = tree.root_node();
        if let Some(err) = parser::syntax_error(root) {
            return Err(err);
        }

        let mut imports = Vec::new();
        collect_imports(root, source, &mut imports);

        let interfaces = named_children(root)
            .into_iter()
            .filter_map(|node| extract_interface(node, source))
            .collect();

        Ok(ParsedFile {
            summary: body_docstring(root, source),
            imports,
            interfaces,
            line_count: parser::line_count(code),
        })
    }

    fn resolve(&self, import: &RawImport, ctx: &ResolveContext<'_>) -> Option<Resolution> {
        if import.is_relative() {
            return resolve_relative(import, ctx).map(Resolution::Internal);
        }
        resolve_absolute(&import.module, ctx)
    }
}

/// Walk the whole tree; imports inside functions and `try` blocks count too.
fn collect_imports(node: Node<'_>, source: &[u8], out: &mut Vec<RawImport>) {
    match node.kind() {
        "import_statement" => {
            let mut cursor = node.walk();
            for name in node.children_by_field_name("name", &mut cursor) {
                let module = imported_name(name, source);
                if !module.is_empty() {
                    out.push(RawImport::absolute(module, line_of(node)));
                }
            }
        }
        "import_from_statement" => out.extend(from_import(node, source)),
        _ => {
            for child in named_children(node) {
                collect_imports(child, source, out);
            }
        }
    }
}

fn from_import(node: Node<'_>, source: &[u8]) -> Vec<RawImport> {
    let line = line_of(node);
    let Some(module_node) = node.child_by_field_name("module_name") else {
        return Vec::new();
    };

    let (module, level) = if module_node.kind() == "relative_import" {
        let mut level = 0;
        let mut module = String::new();
        for child in named_children(module_node) {
            match child.kind() {
                "import_prefix" => level = text(child, source).matches('.').count(),
                "dotted_name" => module = text(child, source).to_string(),
                _ => {}
            }
        }
        (module, level)
    } else {
        (text(module_node, source).to_string(), 0)
    };

    let mut names: Vec<String> = {
        let mut cursor = node.walk();
        node.children_by_field_name("name", &mut cursor)
            .map(|n| imported_name(n, source))
            .filter(|n| !n.is_empty())
            .collect()
    };
    if named_children(node).iter().any(|c| c.kind() == "wildcard_import") {
        names.push("*".to_string());
    }

    // `from . import a, b` names sibling modules, one edge each.
    if level > 0 && module.is_empty() && !names.is_empty() {
        return names
            .into_iter()
            .map(|name| RawImport::relative("", level, line).with_names(vec![name]))
            .collect();
    }
    vec![RawImport::relative(module, level, line).with_names(names)]
}

/// `a.b` from a `dotted_name` or the original name of an `aliased_import`.
fn imported_name(node: Node<'_>, source: &[u8]) -> String {
    let target = if node.kind() == "aliased_import" {
        node.child_by_field_name("name").unwrap_or(node)
    } else {
        node
    };
    text(target, source).to_string()
}

fn extract_interface(node: Node<'_>, source: &[u8]) -> Option<Interface> {
    match node.kind() {
        "decorated_definition" => {
            let definition = node.child_by_field_name("definition")?;
            let mut interface = extract_interface(definition, source)?;
            interface.source_line = line_of(node);
            Some(interface)
        }
        "function_definition" | "class_definition" => {
            let name = text(node.child_by_field_name("name")?, source);
            if name.starts_with('_') {
                return None;
            }
            let kind = if node.kind() == "class_definition" {
                InterfaceKind::Class
            } else {
                InterfaceKind::Function
            };
            Some(Interface {
                name: name.to_string(),
                kind,
                signature: signature_before(node, "body", source),
                doc_summary: node
                    .child_by_field_name("body")
                    .and_then(|body| body_docstring(body, source)),
                source_line: line_of(node),
            })
        }
        "expression_statement" => {
            let assignment = node.named_child(0).filter(|n| n.kind() == "assignment")?;
            let left = assignment.child_by_field_name("left")?;
            let name = text(left, source);
            if left.kind() != "identifier" || !is_constant_name(name) {
                return None;
            }
            Some(Interface {
                name: name.to_string(),
                kind: InterfaceKind::Constant,
                signature: parser::collapse_whitespace(
                    text(assignment, source).lines().next().unwrap_or(name),
                ),
                doc_summary: None,
                source_line: line_of(node),
            })
        }
        _ => None,
    }
}

fn is_constant_name(name: &str) -> bool {
    !name.starts_with('_')
        && name.chars().any(|c| c.is_ascii_uppercase())
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Docstring of a module or block: a string as its first statement.
fn body_docstring(block: Node<'_>, source: &[u8]) -> Option<String> {
    let first = named_children(block)
        .into_iter()
        .find(|n| n.kind() != "comment")?;
    let string = first.named_child(0)?;
    if first.kind() != "expression_statement" || string.kind() != "string" {
        return None;
    }
    docstring_summary(text(string, source))
}

/// Candidate files for a dotted module path rooted at `base`.
fn candidates(base: &str) -> [String; 3] {
    [
        format!("{base}.py"),
        format!("{base}.pyi"),
        join(base, "__init__.py"),
    ]
}

fn first_known(base: &str, ctx: &ResolveContext<'_>) -> Option<String> {
    if base.is_empty() {
        return None;
    }
    candidates(base).into_iter().find(|c| ctx.knows(c))
}

fn resolve_absolute(module: &str, ctx: &ResolveContext<'_>) -> Option<Resolution> {
    let segments: Vec<&str> = module.split('.').filter(|s| !s.is_empty()).collect();
    let top = *segments.first()?;

    // Longest prefix first: `import pkg.sub.mod` prefers the deepest module.
    for len in (1..=segments.len()).rev() {
        let base = segments[..len].join("/");
        let bases = std::iter::once(base.clone()).chain(ctx.project_prefix.map(|p| join(p, &base)));
        for candidate_base in bases {
            if let Some(found) = first_known(&candidate_base, ctx) {
                return Some(Resolution::Internal(found));
            }
        }
    }

    if is_stdlib(top) {
        None
    } else {
        Some(Resolution::External(top.to_string()))
    }
}

fn resolve_relative(import: &RawImport, ctx: &ResolveContext<'_>) -> Option<String> {
    let package = ascend(parent_dir(ctx.current_module), import.level - 1)?;

    if !import.module.is_empty() {
        return first_known(&join(&package, &import.module.replace('.', "/")), ctx);
    }

    import
        .names
        .iter()
        .filter(|name| name.as_str() != "*")
        .find_map(|name| first_known(&join(&package, name), ctx))
        .or_else(|| {
            let init = join(&package, "__init__.py");
            ctx.knows(&init).then_some(init)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn parse(source: &str) -> ParsedFile {
        PythonAdapter.parse(source.as_bytes()).unwrap()
    }

    fn oracle_tree() -> BTreeSet<String> {
        [
            "pkg/__init__.py",
            "pkg/core.py",
            "pkg/utils.py",
            "pkg/sub/__init__.py",
            "pkg/sub/module.py",
            "pkg/sub/helper.py",
            "pkg/other/__init__.py",
            "pkg/other/stuff.py",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn resolve_in(known: &BTreeSet<String>, from: &str, import: RawImport) -> Option<Resolution> {
        PythonAdapter.resolve(&import, &ResolveContext::new(known, from))
    }

    fn internal(path: &str) -> Option<Resolution> {
        Some(Resolution::Internal(path.to_string()))
    }

    #[test]
    fn relative_import_oracle() {
        let known = oracle_tree();
        assert_eq!(
            resolve_in(&known, "pkg/core.py", RawImport::relative("utils", 1, 1)),
            internal("pkg/utils.py")
        );
        assert_eq!(
            resolve_in(&known, "pkg/sub/module.py", RawImport::relative("helper", 1, 1)),
            internal("pkg/sub/helper.py")
        );
        assert_eq!(
            resolve_in(&known, "pkg/sub/module.py", RawImport::relative("core", 2, 1)),
            internal("pkg/core.py")
        );
        assert_eq!(
            resolve_in(&known, "pkg/sub/module.py", RawImport::relative("other.stuff", 2, 1)),
            internal("pkg/other/stuff.py")
        );
        assert_eq!(
            resolve_in(&known, "pkg/sub/module.py", RawImport::relative("", 1, 1)),
            internal("pkg/sub/__init__.py")
        );
        assert_eq!(
            resolve_in(&known, "pkg/sub/module.py", RawImport::relative("x", 4, 1)),
            None
        );
    }

    #[test]
    fn from_dot_import_names_resolve_to_siblings() {
        let known = oracle_tree();
        let helper = RawImport::relative("", 1, 1).with_names(vec!["helper".to_string()]);
        assert_eq!(
            resolve_in(&known, "pkg/sub/module.py", helper),
            internal("pkg/sub/helper.py")
        );
        // A name that is not a module falls back to the package itself.
        let symbol = RawImport::relative("", 1, 1).with_names(vec!["VERSION".to_string()]);
        assert_eq!(
            resolve_in(&known, "pkg/sub/module.py", symbol),
            internal("pkg/sub/__init__.py")
        );
    }

    #[test]
    fn absolute_imports() {
        let known = oracle_tree();
        let from = "pkg/core.py";
        assert_eq!(
            resolve_in(&known, from, RawImport::absolute("pkg.sub.helper", 1)),
            internal("pkg/sub/helper.py")
        );
        assert_eq!(
            resolve_in(&known, from, RawImport::absolute("pkg.other", 1)),
            internal("pkg/other/__init__.py")
        );
        assert_eq!(
            resolve_in(&known, from, RawImport::absolute("requests.adapters", 1)),
            Some(Resolution::External("requests".to_string()))
        );
        assert_eq!(resolve_in(&known, from, RawImport::absolute("os.path", 1)), None);
    }

    #[test]
    fn src_layout_prefix() {
        let known: BTreeSet<String> = ["src/app/__init__.py", "src/app/db.py"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let ctx = ResolveContext::new(&known, "src/app/__init__.py").with_prefix(Some("src"));
        assert_eq!(
            PythonAdapter.resolve(&RawImport::absolute("app.db", 1), &ctx),
            internal("src/app/db.py")
        );
    }

    #[test]
    fn extracts_imports() {
        let parsed = parse(
            "import os, pkg.core as core\n\
             from . import a, b\n\
             from ..sub import helper as h\n\
             from .utils import *\n\
             from __future__ import annotations\n\
             \n\
             def lazy():\n    import json\n",
        );
        let found: Vec<(String, usize, Vec<String>)> = parsed
            .imports
            .iter()
            .map(|i| (i.module.clone(), i.level, i.names.clone()))
            .collect();
        assert_eq!(
            found,
            vec![
                ("os".to_string(), 0, vec![]),
                ("pkg.core".to_string(), 0, vec![]),
                (String::new(), 1, vec!["a".to_string()]),
                (String::new(), 1, vec!["b".to_string()]),
                ("sub".to_string(), 2, vec!["helper".to_string()]),
                ("utils".to_string(), 1, vec!["*".to_string()]),
                ("json".to_string(), 0, vec![]),
            ]
        );
        assert_eq!(parsed.imports[4].line, 3);
    }

    #[test]
    fn extracts_public_interfaces() {
        let parsed = parse(
            r#""""Billing helpers. Nothing else."""

MAX_RETRIES = 3
_private = 1

@dataclass
class Invoice:
    """An invoice."""
    total: int

def charge(amount: int) -> bool:
    return True

def _hidden():
    pass
"#,
        );
        assert_eq!(parsed.summary.as_deref(), Some("Billing helpers."));
        let names: Vec<(&str, InterfaceKind)> = parsed
            .interfaces
            .iter()
            .map(|i| (i.name.as_str(), i.kind))
            .collect();
        assert_eq!(
            names,
            vec![
                ("MAX_RETRIES", InterfaceKind::Constant),
                ("Invoice", InterfaceKind::Class),
                ("charge", InterfaceKind::Function),
            ]
        );
        assert_eq!(parsed.interfaces[1].doc_summary.as_deref(), Some("An invoice."));
        assert_eq!(parsed.interfaces[1].source_line, 6);
        assert_eq!(parsed.interfaces[2].signature, "def charge(amount: int) -> bool");
        assert_eq!(parsed.line_count, 15);
    }

    #[test]
    fn syntax_error_fails_with_line() {
        let err = PythonAdapter
            .parse(b"import os\n\ndef broken(:\n    pass\n")
            .unwrap_err();
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn empty_file_parses() {
        let parsed = parse("");
        assert!(parsed.imports.is_empty());
        assert_eq!(parsed.line_count, 0);
        assert_eq!(parsed.describe(Language::Python), "python source file, 0 lines");
    }

    #[test]
    fn stdlib_table_is_sorted() {
        assert!(STDLIB.windows(2).all(|w| w[0] < w[1]));
    }
}
