//! Comment and docstring cleanup shared by the adapters

use regex::Regex;
use std::sync::LazyLock;

/// Leading comment markers: `/**`, `/*`, `*/`, `///`, `//!`, `//`, `#`, `*`.
static COMMENT_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:/\*[*!]?|\*/|//[/!]?|#|\*)?").expect("static regex"));

/// String prefixes and quotes around a Python docstring.
static STRING_QUOTES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)^[rRuUbBfF]{0,2}("""|'''|"|')(.*?)("""|'''|"|')?$"#).expect("static regex")
});

const MAX_SUMMARY_CHARS: usize = 200;

/// Summarize a comment block (any of the supported comment syntaxes).
pub fn comment_summary(raw: &str) -> Option<String> {
    let lines: Vec<String> = raw
        .lines()
        .map(|line| {
            let line = line.trim_end().trim_end_matches("*/");
            COMMENT_MARKER.replace(line, "").trim().to_string()
        })
        .collect();
    first_sentence(&lines)
}

/// Summarize a string literal used as a docstring.
pub fn docstring_summary(literal: &str) -> Option<String> {
    let body = STRING_QUOTES
        .captures(literal.trim())
        .and_then(|c| c.get(2))
        .map(|m| m.as_str())
        .unwrap_or(literal);
    let lines: Vec<String> = body.lines().map(|l| l.trim().to_string()).collect();
    first_sentence(&lines)
}

/// First sentence of the first paragraph. Tag lines (`@param`) end the paragraph.
fn first_sentence(lines: &[String]) -> Option<String> {
    let paragraph: Vec<&str> = lines
        .iter()
        .map(|l| l.as_str())
        .skip_while(|l| l.is_empty())
        .take_while(|l| !l.is_empty() && !l.starts_with('@'))
        .collect();
    if paragraph.is_empty() {
        return None;
    }
    let joined = paragraph.join(" ");
    let sentence = match joined.find(". ") {
        Some(idx) => &joined[..=idx],
        None => joined.as_str(),
    };
    Some(truncate(sentence.trim(), MAX_SUMMARY_CHARS))
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{}...", cut.trim_end())
}
