// 🗃️ Card Store - loaded-once, read-only snapshot of the card tables
//
// Lifecycle is explicit:
//   load()  → builds the collection on first call, cached afterwards
//   clear() → drops the cache; the next load() reads the files again
// No background refresh. Pass the store to whatever needs it.

use crate::card::{load_cards_tsv, load_details_tsv, CardDetail, CardRecord};
use crate::error::Result;
use crate::schema::{is_rejected, SchemaValidator};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

// ============================================================================
// DATA SOURCE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSource {
    pub cards_path: PathBuf,
    /// Supplemental detail table, merged by card id
    pub details_path: Option<PathBuf>,
}

impl DataSource {
    pub fn new(cards_path: impl Into<PathBuf>) -> Self {
        DataSource {
            cards_path: cards_path.into(),
            details_path: None,
        }
    }

    pub fn with_details(mut self, details_path: impl Into<PathBuf>) -> Self {
        self.details_path = Some(details_path.into());
        self
    }
}

// ============================================================================
// CARD COLLECTION
// ============================================================================

/// Immutable snapshot: records in file order plus an id index
#[derive(Debug, Default)]
pub struct CardCollection {
    records: Vec<CardRecord>,
    id_index: HashMap<String, Vec<usize>>,
}

impl CardCollection {
    pub fn new(records: Vec<CardRecord>) -> Self {
        let mut id_index: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, record) in records.iter().enumerate() {
            id_index.entry(record.card_id().to_string()).or_default().push(i);
        }
        CardCollection { records, id_index }
    }

    pub fn records(&self) -> &[CardRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every record carrying this id (normally one)
    pub fn by_id(&self, card_id: &str) -> Vec<&CardRecord> {
        self.id_index
            .get(card_id)
            .map(|indexes| indexes.iter().map(|&i| &self.records[i]).collect())
            .unwrap_or_default()
    }

    /// Ids that appear on more than one row
    pub fn duplicate_ids(&self) -> Vec<&str> {
        let mut dups: Vec<&str> = self
            .id_index
            .iter()
            .filter(|(_, rows)| rows.len() > 1)
            .map(|(id, _)| id.as_str())
            .collect();
        dups.sort_unstable();
        dups
    }
}

// ============================================================================
// CARD STORE
// ============================================================================

#[derive(Debug)]
enum Source {
    Files(DataSource),
    Memory(Vec<CardRecord>),
}

/// Injectable cache around the card collection
#[derive(Debug)]
pub struct CardStore {
    source: Source,
    cache: RwLock<Option<Arc<CardCollection>>>,
}

impl CardStore {
    pub fn new(source: DataSource) -> Self {
        CardStore {
            source: Source::Files(source),
            cache: RwLock::new(None),
        }
    }

    /// Store over records already in memory (tests, embedding)
    pub fn from_records(records: Vec<CardRecord>) -> Self {
        CardStore {
            source: Source::Memory(records),
            cache: RwLock::new(None),
        }
    }

    /// Snapshot of the collection, reading the source on first use
    pub fn load(&self) -> Result<Arc<CardCollection>> {
        if let Some(collection) = self.cache.read().unwrap_or_else(PoisonError::into_inner).as_ref() {
            return Ok(Arc::clone(collection));
        }

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have filled it between the two locks
        if let Some(collection) = cache.as_ref() {
            return Ok(Arc::clone(collection));
        }

        let collection = Arc::new(self.build()?);
        *cache = Some(Arc::clone(&collection));
        Ok(collection)
    }

    /// Drop the cached snapshot
    pub fn clear(&self) {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        if cache.take().is_some() {
            info!("card cache cleared");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    fn build(&self) -> Result<CardCollection> {
        let (records, details) = match &self.source {
            Source::Memory(records) => (records.clone(), Vec::new()),
            Source::Files(source) => {
                let records = load_cards_tsv(&source.cards_path)?;
                info!("loaded {} card rows from {}", records.len(), source.cards_path.display());
                let details = match &source.details_path {
                    Some(path) => {
                        let details = load_details_tsv(path)?;
                        info!("loaded {} detail rows from {}", details.len(), path.display());
                        details
                    }
                    None => Vec::new(),
                };
                (records, details)
            }
        };

        let records = merge_details(validate_rows(records), &details);
        let collection = CardCollection::new(records);

        for id in collection.duplicate_ids() {
            warn!("card id {} appears on more than one row", id);
        }
        debug!("card collection ready: {} records", collection.len());

        Ok(collection)
    }
}

fn validate_rows(records: Vec<CardRecord>) -> Vec<CardRecord> {
    let validator = SchemaValidator::new();
    let total = records.len();

    let kept: Vec<CardRecord> = records
        .into_iter()
        .enumerate()
        .filter(|(row, record)| match validator.validate(record) {
            Ok(()) => true,
            Err(errors) => {
                for error in &errors {
                    debug!("row {}: {}", row + 1, error);
                }
                if is_rejected(&errors) {
                    warn!("skipping row {} ({:?}): missing id or card type", row + 1, record.name());
                    false
                } else {
                    true
                }
            }
        })
        .map(|(_, record)| record)
        .collect();

    if kept.len() < total {
        warn!("skipped {} invalid card rows", total - kept.len());
    }
    kept
}

fn merge_details(mut records: Vec<CardRecord>, details: &[CardDetail]) -> Vec<CardRecord> {
    if details.is_empty() {
        return records;
    }

    let by_id: HashMap<&str, &CardDetail> = details.iter().map(|d| (d.card_id.as_str(), d)).collect();
    let mut merged = 0;
    for record in &mut records {
        if let Some(detail) = by_id.get(record.card_id()) {
            record.merge_detail(detail);
            merged += 1;
        }
    }
    debug!("merged detail rows into {} cards", merged);
    records
}

// ============================================================================
// TESTS
// ============================================================================
