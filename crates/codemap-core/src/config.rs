//! Optional per-project configuration (`.codemap/config.toml`)

use crate::cache::config_path;
use crate::error::{Error, Result};
use crate::model::Language;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub index: IndexConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexConfig {
    /// Restrict discovery to these languages. Empty means all.
    pub languages: Vec<Language>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Learn unknown and stale files without `--learn`.
    pub learn: bool,
}

impl Config {
    /// Load the project's config file, falling back to defaults when absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = config_path(root);
        if !path.exists() {
            return Ok(Config::default());
        }
        let text = std::fs::read_to_string(&path)?;
        let config = Self::parse(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Languages in effect for a command: the CLI choice wins over the
    /// configured list. Empty means every language.
    pub fn languages(&self, cli: Option<Language>) -> Vec<Language> {
        match cli {
            Some(language) => vec![language],
            None => self.index.languages.clone(),
        }
    }
}
