//! Java adapter using tree-sitter

use super::doc::comment_summary;
use crate::extractor::{LanguageAdapter, ParsedFile, RawImport, ResolveContext, Resolution};
use crate::parser::{self, line_of, named_children, signature_before, text};
use crate::paths::{first_file_in, join};
use codemap_core::{Interface, InterfaceKind, Language, Result};
use tree_sitter::Node;

pub struct JavaAdapter;

/// Packages provided by the JDK.
const PLATFORM_PREFIXES: &[&str] = &["java.", "javax.", "jdk.", "sun.", "com.sun."];

impl LanguageAdapter for JavaAdapter {
    fn language(&self) -> Language {
        Language::Java
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["java"]
    }

    fn excluded_dirs(&self) -> &'static [&'static str] {
        &["target", "build", ".gradle", "out"]
    }

    fn parse(&self, source: &[u8]) -> Result<ParsedFile> {
        let code = parser::decode(source)?;
        let tree = parser::parse_tree(&tree_sitter_java::LANGUAGE.into(), code)?;
        let root = tree.root_node();

        let mut imports = Vec::new();
        let mut interfaces = Vec::new();
        let mut summary = None;
        for node in named_children(root) {
            match node.kind() {
                "import_declaration" => imports.extend(import_of(node, source)),
                kind if type_kind(kind).is_some() => {
                    if let Some(ty) = type_interface(node, source) {
                        if summary.is_none() {
                            summary = ty.doc_summary.clone();
                        }
                        let methods = public_methods(node, &ty.name, source);
                        interfaces.push(ty);
                        interfaces.extend(methods);
                    }
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
        let module = import.module.as_str();
        if PLATFORM_PREFIXES.iter().any(|p| module.starts_with(p)) {
            return None;
        }
        let segments: Vec<&str> = module.split('.').filter(|s| !s.is_empty()).collect();
        let roots: Vec<&str> = ctx.project_prefix.into_iter().chain([""]).collect();

        if import.names.iter().any(|n| n == "*") {
            let dir = segments.join("/");
            for root in &roots {
                if let Some(found) = first_file_in(ctx.known_paths, &join(root, &dir), "java", |_| false) {
                    return Some(Resolution::Internal(found));
                }
            }
        }

        // Longest prefix: `a.b.C.method` from a static import still finds `a/b/C.java`.
        for len in (1..=segments.len()).rev() {
            let file = format!("{}.java", segments[..len].join("/"));
            for root in &roots {
                let candidate = join(root, &file);
                if ctx.knows(&candidate) {
                    return Some(Resolution::Internal(candidate));
                }
            }
        }

        let end = segments.len().min(2);
        (end > 0).then(|| Resolution::External(segments[..end].join(".")))
    }
}

fn type_kind(kind: &str) -> Option<InterfaceKind> {
    match kind {
        "class_declaration" | "record_declaration" => Some(InterfaceKind::Class),
        "interface_declaration" | "annotation_type_declaration" => Some(InterfaceKind::Interface),
        "enum_declaration" => Some(InterfaceKind::Enum),
        _ => None,
    }
}

/// `import a.b.C;`, `import a.b.*;`, `import static a.b.C.m;`
fn import_of(node: Node<'_>, source: &[u8]) -> Option<RawImport> {
    let body = text(node, source)
        .trim()
        .trim_start_matches("import")
        .trim_end_matches(';')
        .trim();
    let body = body.strip_prefix("static").map(str::trim).unwrap_or(body);
    let body: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    if body.is_empty() {
        return None;
    }
    let import = match body.strip_suffix(".*") {
        Some(package) => RawImport::absolute(package, line_of(node)).with_names(vec!["*".to_string()]),
        None => RawImport::absolute(body.as_str(), line_of(node)),
    };
    Some(import)
}

fn modifiers(node: Node<'_>, source: &[u8]) -> String {
    named_children(node)
        .into_iter()
        .find(|c| c.kind() == "modifiers")
        .map(|m| text(m, source).to_string())
        .unwrap_or_default()
}

fn has_modifier(modifiers: &str, keyword: &str) -> bool {
    modifiers.split_whitespace().any(|word| word == keyword)
}

fn type_interface(node: Node<'_>, source: &[u8]) -> Option<Interface> {
    let kind = type_kind(node.kind())?;
    if !has_modifier(&modifiers(node, source), "public") {
        return None;
    }
    Some(Interface {
        name: text(node.child_by_field_name("name")?, source).to_string(),
        kind,
        signature: signature_before(node, "body", source),
        doc_summary: javadoc(node, source),
        source_line: line_of(node),
    })
}

/// Public methods of a type, named `Type.method`. Interface methods are
/// public unless marked otherwise.
fn public_methods(node: Node<'_>, type_name: &str, source: &[u8]) -> Vec<Interface> {
    let implicit_public = node.kind() == "interface_declaration";
    let Some(body) = node.child_by_field_name("body") else {
        return Vec::new();
    };
    named_children(body)
        .into_iter()
        .filter(|m| m.kind() == "method_declaration")
        .filter_map(|method| {
            let mods = modifiers(method, source);
            let public = has_modifier(&mods, "public")
                || (implicit_public && !has_modifier(&mods, "private"));
            if !public {
                return None;
            }
            let name = text(method.child_by_field_name("name")?, source);
            Some(Interface {
                name: format!("{type_name}.{name}"),
                kind: InterfaceKind::Method,
                signature: signature_before(method, "body", source),
                doc_summary: javadoc(method, source),
                source_line: line_of(method),
            })
        })
        .collect()
}

fn javadoc(node: Node<'_>, source: &[u8]) -> Option<String> {
    node.prev_named_sibling()
        .filter(|c| c.kind() == "block_comment" && text(*c, source).starts_with("/**"))
        .and_then(|c| comment_summary(text(c, source)))
}
