//! TypeScript and TSX adapters using tree-sitter
//!
//! Both share the JavaScript extraction and resolution; only the grammar differs.

use super::javascript::{parse_ecmascript, resolve_specifier, ECMASCRIPT_EXCLUDED_DIRS};
use crate::extractor::{LanguageAdapter, ParsedFile, RawImport, ResolveContext, Resolution};
use codemap_core::{Language, Result};

pub struct TypeScriptAdapter;

/// `.tsx` needs the JSX-aware grammar.
pub struct TsxAdapter;

impl LanguageAdapter for TypeScriptAdapter {
    fn language(&self) -> Language {
        Language::TypeScript
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["ts", "mts", "cts"]
    }

    fn excluded_dirs(&self) -> &'static [&'static str] {
        ECMASCRIPT_EXCLUDED_DIRS
    }

    fn parse(&self, source: &[u8]) -> Result<ParsedFile> {
        parse_ecmascript(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(), source)
    }

    fn resolve(&self, import: &RawImport, ctx: &ResolveContext<'_>) -> Option<Resolution> {
        resolve_specifier(import, ctx)
    }
}

impl LanguageAdapter for TsxAdapter {
    fn language(&self) -> Language {
        Language::TypeScript
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["tsx"]
    }

    fn excluded_dirs(&self) -> &'static [&'static str] {
        ECMASCRIPT_EXCLUDED_DIRS
    }

    fn parse(&self, source: &[u8]) -> Result<ParsedFile> {
        parse_ecmascript(&tree_sitter_typescript::LANGUAGE_TSX.into(), source)
    }

    fn resolve(&self, import: &RawImport, ctx: &ResolveContext<'_>) -> Option<Resolution> {
        resolve_specifier(import, ctx)
    }
}
