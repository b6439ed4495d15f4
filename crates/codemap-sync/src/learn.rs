//! Structural learning: turn one parsed file into a cache entry

use chrono::Utc;
use codemap_core::{hash_bytes, ContentRef, Error, Result, StoredLearning};
use codemap_indexer::{adapter_for_path, ParsedFile};
use std::collections::BTreeMap;
use std::path::Path;

/// Most callables recorded per file.
const MAX_KEY_FUNCTIONS: usize = 10;

/// Parse `rel_path` under `root` and build a learning stamped with the hash of
/// exactly the bytes that were parsed.
pub fn synthesize(root: &Path, rel_path: &str) -> Result<StoredLearning> {
    let adapter =
        adapter_for_path(Path::new(rel_path)).ok_or_else(|| Error::MissingAdapter(rel_path.to_string()))?;
    let bytes = std::fs::read(root.join(rel_path)).map_err(|source| Error::HashIo {
        path: rel_path.to_string(),
        source,
    })?;
    let parsed = adapter.parse(&bytes)?;
    let language = adapter.language();

    Ok(StoredLearning {
        module_path: rel_path.to_string(),
        learned_at: Utc::now(),
        summary: parsed.describe(language),
        purpose: purpose(&parsed),
        key_functions: key_functions(&parsed),
        gotchas: Vec::new(),
        confidence: confidence(&parsed),
        source_ref: Some(ContentRef::new(rel_path, hash_bytes(&bytes))),
    })
}

fn purpose(parsed: &ParsedFile) -> String {
    match (parsed.interfaces.len(), parsed.imports.len()) {
        (0, 0) => String::new(),
        (exports, imports) => format!("Exposes {exports} interfaces and imports {imports} modules"),
    }
}

/// Public callables, mapped to their doc summary or signature.
fn key_functions(parsed: &ParsedFile) -> BTreeMap<String, String> {
    parsed
        .interfaces
        .iter()
        .filter(|i| i.kind.is_callable())
        .take(MAX_KEY_FUNCTIONS)
        .map(|i| {
            let description = i.doc_summary.clone().unwrap_or_else(|| i.signature.clone());
            (i.name.clone(), description)
        })
        .collect()
}

/// Documented files are trusted most; a bare line count least.
fn confidence(parsed: &ParsedFile) -> f32 {
    if parsed.summary.is_some() {
        0.6
    } else if !parsed.interfaces.is_empty() {
        0.4
    } else {
        0.2
    }
}
