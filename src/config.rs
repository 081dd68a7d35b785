// ⚙️ Configuration - where the card tables live and which features are on
//
// {
//   "data_dir": "data",
//   "cards_file": "cards-all.tsv",
//   "details_file": "detail-all.tsv",
//   "default_max": 100,
//   "fuzzy_enabled": true,
//   "ruby_fallback_fuzzy": true
// }

use crate::query::{QueryExecutor, DEFAULT_MAX};
use crate::store::{CardStore, DataSource};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Overrides `data_dir` when set
pub const DATA_DIR_ENV: &str = "CARD_RESOLVER_DATA_DIR";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_cards_file")]
    pub cards_file: String,
    /// `null` disables the detail table
    #[serde(default = "default_details_file")]
    pub details_file: Option<String>,
    #[serde(default = "default_max")]
    pub default_max: usize,
    #[serde(default = "default_true")]
    pub fuzzy_enabled: bool,
    #[serde(default = "default_true")]
    pub ruby_fallback_fuzzy: bool,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_cards_file() -> String {
    "cards-all.tsv".to_string()
}

fn default_details_file() -> Option<String> {
    Some("detail-all.tsv".to_string())
}

fn default_max() -> usize {
    DEFAULT_MAX
}

fn default_true() -> bool {
    true
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            data_dir: default_data_dir(),
            cards_file: default_cards_file(),
            details_file: default_details_file(),
            default_max: default_max(),
            fuzzy_enabled: true,
            ruby_fallback_fuzzy: true,
        }
    }
}

impl SearchConfig {
    /// Load config from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: SearchConfig =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;

        Ok(config)
    }

    /// File config when given, defaults otherwise; then the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => SearchConfig::from_file(path)?,
            None => SearchConfig::default(),
        };
        Ok(config.with_env_overrides(std::env::var_os(DATA_DIR_ENV).map(PathBuf::from)))
    }

    /// Apply an override for `data_dir` (taken from the environment by `load`)
    pub fn with_env_overrides(mut self, data_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = data_dir.filter(|d| !d.as_os_str().is_empty()) {
            self.data_dir = dir;
        }
        self
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn data_source(&self) -> DataSource {
        let source = DataSource::new(self.data_dir.join(&self.cards_file));
        match &self.details_file {
            Some(file) => source.with_details(self.data_dir.join(file)),
            None => source,
        }
    }

    /// Store over the configured files (not loaded yet)
    pub fn store(&self) -> CardStore {
        CardStore::new(self.data_source())
    }

    /// Executor with this config's feature switches
    pub fn executor<'s>(&self, store: &'s CardStore) -> QueryExecutor<'s> {
        QueryExecutor::new(store)
            .with_fuzzy_supported(self.fuzzy_enabled)
            .with_ruby_fallback_fuzzy(self.ruby_fallback_fuzzy)
    }
}

// ============================================================================
// TESTS
// ============================================================================
