//! Knowledge cache: hash-addressed learnings about individual files.
//!
//! Entries record the content hash that was valid when they were produced.
//! An entry is stale as soon as the live file hashes differently, and fresh
//! again if the file is reverted byte-for-byte. The dependency graph never
//! writes here; rebuilding it leaves every entry untouched.
//!
//! The persisted document may carry sections owned by other tools. Saving
//! re-reads the document from disk and replaces only the `learnings` key;
//! every other section is written back as the exact JSON text it was read as.

use crate::cache::{ensure_state_dir, knowledge_path, write_atomic, KNOWLEDGE_FILE};
use crate::error::{Error, Result};
use crate::hasher::{hash_file, ContentRef};
use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

const LEARNINGS_KEY: &str = "learnings";

/// Cached semantic summary of one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredLearning {
    pub module_path: String,
    pub learned_at: DateTime<Utc>,
    pub summary: String,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub key_functions: BTreeMap<String, String>,
    #[serde(default)]
    pub gotchas: Vec<String>,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub source_ref: Option<ContentRef>,
}

impl StoredLearning {
    /// True when the entry has no provenance or its hash differs from `current_hash`.
    pub fn is_stale_against(&self, current_hash: &str) -> bool {
        match &self.source_ref {
            Some(source_ref) => source_ref.content_hash != current_hash,
            None => true,
        }
    }

    pub fn stored_hash(&self) -> Option<&str> {
        self.source_ref.as_ref().map(|r| r.content_hash.as_str())
    }
}

/// Persistent map of path -> StoredLearning rooted at a project.
#[derive(Debug)]
pub struct KnowledgeCache {
    root: PathBuf,
    learnings: BTreeMap<String, StoredLearning>,
    recovered_from_corruption: bool,
}

impl KnowledgeCache {
    /// An empty cache for `root`, ignoring anything on disk.
    pub fn empty(root: &Path) -> Self {
        KnowledgeCache {
            root: root.to_path_buf(),
            learnings: BTreeMap::new(),
            recovered_from_corruption: false,
        }
    }

    /// Load the cache for `root`. A missing document yields an empty cache; a
    /// corrupt one is logged and treated as empty.
    pub fn load(root: &Path) -> Result<Self> {
        let mut cache = Self::empty(root);
        match read_document(&knowledge_path(root)) {
            Ok(Some(doc)) => {
                if let Some(raw) = doc.get(LEARNINGS_KEY) {
                    match serde_json::from_str(raw.get()) {
                        Ok(learnings) => cache.learnings = learnings,
                        Err(e) => {
                            tracing::warn!("Ignoring corrupt learnings section: {}", e);
                            cache.recovered_from_corruption = true;
                        }
                    }
                }
            }
            Ok(None) => {}
            Err(Error::CacheCorruption { path, message }) => {
                tracing::warn!(
                    "Knowledge cache {} is corrupt ({}), starting empty",
                    path.display(),
                    message
                );
                cache.recovered_from_corruption = true;
            }
            Err(e) => return Err(e),
        }
        tracing::debug!("Loaded {} learnings", cache.learnings.len());
        Ok(cache)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether loading had to discard an unreadable document.
    pub fn recovered_from_corruption(&self) -> bool {
        self.recovered_from_corruption
    }

    pub fn get(&self, path: &str) -> Option<&StoredLearning> {
        self.learnings.get(path)
    }

    /// Insert or fully overwrite the entry for `learning.module_path`.
    pub fn put(&mut self, learning: StoredLearning) {
        self.learnings.insert(learning.module_path.clone(), learning);
    }

    pub fn remove(&mut self, path: &str) -> Option<StoredLearning> {
        self.learnings.remove(path)
    }

    pub fn list_paths(&self) -> Vec<String> {
        self.learnings.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.learnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.learnings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &StoredLearning)> {
        self.learnings.iter()
    }

    /// Re-hash the live file and compare it with the cached entry. Paths
    /// without an entry, and entries whose file is gone, are stale.
    pub fn is_stale(&self, path: &str) -> bool {
        let Some(learning) = self.learnings.get(path) else {
            return true;
        };
        match hash_file(&self.root.join(path)) {
            Ok(current) => learning.is_stale_against(&current),
            Err(e) => {
                tracing::debug!("Cannot hash {}: {}", path, e);
                true
            }
        }
    }

    /// Write the learnings back, preserving every other top-level section of
    /// the on-disk document. An unreadable document is moved aside first.
    pub fn save(&self) -> Result<()> {
        ensure_state_dir(&self.root)?;
        let path = knowledge_path(&self.root);
        let mut doc = match read_document(&path) {
            Ok(Some(doc)) => doc,
            Ok(None) => Document::default(),
            Err(Error::CacheCorruption { message, .. }) => {
                let backup = move_aside(&path)?;
                tracing::warn!(
                    "Knowledge document {} is corrupt ({}), moved to {}",
                    path.display(),
                    message,
                    backup.display()
                );
                Document::default()
            }
            Err(e) => return Err(e),
        };
        doc.set(LEARNINGS_KEY, serde_json::value::to_raw_value(&self.learnings)?);
        let json = serde_json::to_vec_pretty(&doc)?;
        write_atomic(&path, &json)?;
        tracing::debug!("Saved {} learnings to {}", self.learnings.len(), path.display());
        Ok(())
    }
}

/// Top-level sections of the knowledge document in file order, each kept as
/// raw JSON text.
#[derive(Debug, Default)]
struct Document {
    sections: Vec<(String, Box<RawValue>)>,
}

impl Document {
    fn get(&self, key: &str) -> Option<&RawValue> {
        self.sections
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_ref())
    }

    fn set(&mut self, key: &str, value: Box<RawValue>) {
        match self.sections.iter_mut().find(|(name, _)| name == key) {
            Some((_, slot)) => *slot = value,
            None => self.sections.push((key.to_string(), value)),
        }
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct DocumentVisitor;

        impl<'de> Visitor<'de> for DocumentVisitor {
            type Value = Document;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Document, A::Error> {
                let mut sections = Vec::new();
                while let Some(entry) = map.next_entry::<String, Box<RawValue>>()? {
                    sections.push(entry);
                }
                Ok(Document { sections })
            }
        }

        deserializer.deserialize_map(DocumentVisitor)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sections.len()))?;
        for (name, value) in &self.sections {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

fn read_document(path: &Path) -> Result<Option<Document>> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = std::fs::read(path)?;
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| Error::CacheCorruption {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Rename an unreadable document to a timestamped sibling so its contents
/// survive the next write.
fn move_aside(path: &Path) -> Result<PathBuf> {
    let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3f");
    let backup = path.with_file_name(format!("{KNOWLEDGE_FILE}.corrupt-{stamp}"));
    std::fs::rename(path, &backup)?;
    Ok(backup)
}
