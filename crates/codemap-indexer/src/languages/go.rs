//! Go adapter using tree-sitter

use super::doc::comment_summary;
use crate::extractor::{LanguageAdapter, ParsedFile, RawImport, ResolveContext, Resolution};
use crate::parser::{self, collapse_whitespace, line_of, named_children, signature_before, text};
use crate::paths::first_file_in;
use codemap_core::{Interface, InterfaceKind, Language, Result};
use tree_sitter::Node;

pub struct GoAdapter;

impl LanguageAdapter for GoAdapter {
    fn language(&self) -> Language {
        Language::Go
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["go"]
    }

    fn excluded_dirs(&self) -> &'static [&'static str] {
        &["vendor", "testdata"]
    }

    fn parse(&self, source: &[u8]) -> Result<ParsedFile> {
        let code = parser::decode(source)?;
        let tree = parser::parse_tree(&tree_sitter_go::LANGUAGE.into(), code)?;
        let root = tree.root_node();

        let mut imports = Vec::new();
        let mut interfaces = Vec::new();
        let mut summary = None;
        for decl in named_children(root) {
            match decl.kind() {
                "package_clause" => summary = leading_comment(decl, source),
                "import_declaration" => collect_import_specs(decl, source, &mut imports),
                "function_declaration" | "method_declaration" => {
                    interfaces.extend(function_interface(decl, source))
                }
                "type_declaration" => interfaces.extend(specs(decl, source, "type", |spec| {
                    match spec.child_by_field_name("type").map(|t| t.kind()) {
                        Some("struct_type") => InterfaceKind::Struct,
                        Some("interface_type") => InterfaceKind::Interface,
                        _ => InterfaceKind::TypeAlias,
                    }
                })),
                "const_declaration" => {
                    interfaces.extend(specs(decl, source, "const", |_| InterfaceKind::Constant))
                }
                "var_declaration" => {
                    interfaces.extend(specs(decl, source, "var", |_| InterfaceKind::Constant))
                }
                _ => {}
            }
        }

        Ok(ParsedFile {
            summary,
            imports,
            interfaces,
            line_count: parser::line_count(code),
        })
    }

    fn resolve(&self, import: &RawImport, ctx: &ResolveContext<'_>) -> Option<Resolution> {
        let path = import.module.as_str();
        if let Some(module) = ctx.project_prefix {
            let local = if path == module {
                Some("")
            } else {
                path.strip_prefix(module).and_then(|rest| rest.strip_prefix('/'))
            };
            if let Some(dir) = local {
                return first_file_in(ctx.known_paths, dir, "go", |p| p.ends_with("_test.go"))
                    .map(Resolution::Internal);
            }
        }

        let segments: Vec<&str> = path.split('/').collect();
        if segments.first().is_some_and(|host| host.contains('.')) {
            let end = segments.len().min(3);
            return Some(Resolution::External(segments[..end].join("/")));
        }
        // Standard library.
        None
    }
}

pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
}

fn collect_import_specs(node: Node<'_>, source: &[u8], out: &mut Vec<RawImport>) {
    for child in named_children(node) {
        match child.kind() {
            "import_spec" => {
                let Some(path) = child.child_by_field_name("path") else {
                    continue;
                };
                let path = text(path, source).trim_matches(|c| c == '"' || c == '`');
                if !path.is_empty() && path != "C" {
                    out.push(RawImport::absolute(path, line_of(child)));
                }
            }
            "import_spec_list" => collect_import_specs(child, source, out),
            _ => {}
        }
    }
}

fn function_interface(decl: Node<'_>, source: &[u8]) -> Option<Interface> {
    let name = text(decl.child_by_field_name("name")?, source);
    if !is_exported(name) {
        return None;
    }
    let (name, kind) = match receiver_type(decl, source) {
        Some(recv) => (format!("{recv}.{name}"), InterfaceKind::Method),
        None => (name.to_string(), InterfaceKind::Function),
    };
    Some(Interface {
        name,
        kind,
        signature: signature_before(decl, "body", source),
        doc_summary: leading_comment(decl, source),
        source_line: line_of(decl),
    })
}

/// `Server` for `func (s *Server[T]) Run()`.
fn receiver_type(decl: Node<'_>, source: &[u8]) -> Option<String> {
    let receiver = decl.child_by_field_name("receiver")?;
    let param = named_children(receiver)
        .into_iter()
        .find(|p| p.kind() == "parameter_declaration")?;
    let ty = text(param.child_by_field_name("type")?, source);
    let ty = ty.trim_start_matches('*');
    Some(ty.split('[').next().unwrap_or(ty).to_string())
}

/// Exported specs of a grouped or single `type`/`const`/`var` declaration.
fn specs(
    decl: Node<'_>,
    source: &[u8],
    keyword: &str,
    kind_of: impl Fn(Node<'_>) -> InterfaceKind,
) -> Vec<Interface> {
    let mut out = Vec::new();
    let mut pending = named_children(decl);
    while let Some(spec) = pending.pop() {
        if spec.kind().ends_with("_spec_list") {
            pending.extend(named_children(spec));
            continue;
        }
        if !matches!(spec.kind(), "type_spec" | "type_alias" | "const_spec" | "var_spec") {
            continue;
        }
        let mut cursor = spec.walk();
        let names: Vec<Node<'_>> = spec.children_by_field_name("name", &mut cursor).collect();
        for name_node in names {
            let name = text(name_node, source);
            if !is_exported(name) {
                continue;
            }
            let first_line = text(spec, source).lines().next().unwrap_or(name);
            out.push(Interface {
                name: name.to_string(),
                kind: kind_of(spec),
                signature: format!(
                    "{keyword} {}",
                    collapse_whitespace(first_line).trim_end_matches(['{', '(']).trim_end()
                ),
                doc_summary: leading_comment(spec, source).or_else(|| leading_comment(decl, source)),
                source_line: line_of(spec),
            });
        }
    }
    out.sort_by_key(|i| i.source_line);
    out
}

/// Contiguous `//` comment lines ending on the line above `node`.
fn leading_comment(node: Node<'_>, source: &[u8]) -> Option<String> {
    let mut lines = Vec::new();
    let mut expected_row = node.start_position().row;
    let mut current = node.prev_named_sibling();
    while let Some(comment) = current.filter(|c| c.kind() == "comment") {
        if comment.end_position().row + 1 != expected_row {
            break;
        }
        let line = text(comment, source);
        if !line.starts_with("//go:") && !line.starts_with("// +build") {
            lines.push(line);
        }
        expected_row = comment.start_position().row;
        current = comment.prev_named_sibling();
    }
    lines.reverse();
    comment_summary(&lines.join("\n"))
}
