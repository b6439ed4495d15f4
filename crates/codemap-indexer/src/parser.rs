//! Tree-sitter plumbing shared by the language adapters
//!
//! Each parse builds its own `Parser`; indexing is a single synchronous pass
//! so there is nothing to pool.

use codemap_core::{Error, Result};
use tree_sitter::{Language, Node, Parser, Tree};

/// Decode source bytes, reporting the line of the first invalid byte.
pub fn decode(source: &[u8]) -> Result<&str> {
    std::str::from_utf8(source).map_err(|e| {
        let line = source[..e.valid_up_to()]
            .iter()
            .filter(|&&b| b == b'\n')
            .count()
            + 1;
        Error::parse_at(line, "file is not valid UTF-8")
    })
}

/// Parse `source` with the given grammar.
pub fn parse_tree(grammar: &Language, source: &str) -> Result<Tree> {
    let mut parser = Parser::new();
    parser.set_language(grammar).map_err(|e| Error::Parse {
        line: None,
        message: format!("failed to load grammar: {e}"),
    })?;
    parser.parse(source, None).ok_or_else(|| Error::Parse {
        line: None,
        message: "parser produced no tree".to_string(),
    })
}

/// First ERROR or MISSING node in document order.
pub fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

/// Turn the first syntax error of a tree into a parse error.
pub fn syntax_error(root: Node<'_>) -> Option<Error> {
    let node = first_error(root)?;
    let message = if node.is_missing() {
        format!("missing `{}`", node.kind())
    } else {
        "invalid syntax".to_string()
    };
    Some(Error::parse_at(line_of(node), message))
}

/// Source text of a node, or "" if it falls outside valid UTF-8.
pub fn text<'a>(node: Node<'_>, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

/// 1-based start line of a node.
pub fn line_of(node: Node<'_>) -> usize {
    node.start_position().row + 1
}

pub fn line_count(source: &str) -> usize {
    source.lines().count()
}

/// Declaration text up to (not including) the child in `body_field`,
/// whitespace-collapsed. Falls back to the first line of the node.
pub fn signature_before(node: Node<'_>, body_field: &str, source: &[u8]) -> String {
    let end = node
        .child_by_field_name(body_field)
        .map(|body| body.start_byte())
        .unwrap_or_else(|| node.end_byte());
    let raw = source
        .get(node.start_byte()..end)
        .and_then(|bytes| std::str::from_utf8(bytes).ok())
        .unwrap_or("");
    let raw = if end == node.end_byte() {
        raw.lines().next().unwrap_or("")
    } else {
        raw
    };
    collapse_whitespace(raw)
        .trim_end_matches(['{', ':', ';', '='])
        .trim_end()
        .to_string()
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Named children of a node, collected so callers can recurse freely.
pub fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn python() -> Language {
        tree_sitter_python::LANGUAGE.into()
    }

    #[test]
    fn test_parse_python() {
        let tree = parse_tree(&python(), "def main():\n    pass\n").unwrap();
        assert_eq!(tree.root_node().kind(), "module");
        assert!(first_error(tree.root_node()).is_none());
    }

    #[test]
    fn test_syntax_error_line() {
        let tree = parse_tree(&python(), "x = 1\n\ndef broken(:\n    pass\n").unwrap();
        let err = syntax_error(tree.root_node()).unwrap();
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn test_decode_reports_line() {
        let bytes = b"ok\nstill ok\n\xff\xfe";
        let err = decode(bytes).unwrap_err();
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn test_signature_before_body() {
        let source = "def add(a, b) -> int:\n    return a + b\n";
        let tree = parse_tree(&python(), source).unwrap();
        let func = tree.root_node().named_child(0).unwrap();
        assert_eq!(
            signature_before(func, "body", source.as_bytes()),
            "def add(a, b) -> int"
        );
    }
}
