// 🃏 Card Records - flat-file rows with a cached canonical name key
//
// Two tab-separated tables:
//   cards-all.tsv   one row per card, header row of camelCase column names
//   detail-all.tsv  supplemental rulings, merged into the card row by cardId

use crate::error::{Result, SearchError};
use crate::fields::CardField;
use crate::normalize::normalize;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Optional precomputed canonical key column in the card table
pub const NAME_KEY_COLUMN: &str = "nameModified";

// ============================================================================
// CARD RECORD
// ============================================================================

/// One card: field → value, plus the canonical key of its name
///
/// Records are built once at load time and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRecord {
    values: BTreeMap<CardField, String>,
    name_key: String,
}

impl CardRecord {
    /// Minimal record: identity fields only
    pub fn new(card_type: impl Into<String>, name: impl Into<String>, card_id: impl Into<String>) -> Self {
        CardRecord::from_values([
            (CardField::CardType, card_type.into()),
            (CardField::Name, name.into()),
            (CardField::CardId, card_id.into()),
        ])
    }

    /// Build from (field, value) pairs. Empty values are dropped.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = (CardField, String)>,
    {
        let values: BTreeMap<CardField, String> =
            values.into_iter().filter(|(_, v)| !v.is_empty()).collect();
        let name_key = normalize(values.get(&CardField::Name).map_or("", String::as_str));
        CardRecord { values, name_key }
    }

    /// Build from one TSV row keyed by header. Unknown columns are ignored;
    /// a non-empty `nameModified` column is trusted as the canonical key.
    pub fn from_row(row: &HashMap<String, String>) -> Self {
        let mut record = CardRecord::from_values(
            row.iter()
                .filter_map(|(k, v)| CardField::from_name(k).map(|f| (f, v.clone()))),
        );
        if let Some(key) = row.get(NAME_KEY_COLUMN).filter(|k| !k.is_empty()) {
            record.name_key = key.clone();
        }
        record
    }

    /// Builder: set one field
    pub fn with_field(self, field: CardField, value: impl Into<String>) -> Self {
        let mut values = self.values;
        values.insert(field, value.into());
        let keep_key = field != CardField::Name;
        let name_key = self.name_key;
        let mut record = CardRecord::from_values(values);
        if keep_key {
            record.name_key = name_key;
        }
        record
    }

    /// Value of a field, "" when absent
    pub fn get(&self, field: CardField) -> &str {
        self.values.get(&field).map_or("", String::as_str)
    }

    pub fn has(&self, field: CardField) -> bool {
        !self.get(field).is_empty()
    }

    pub fn name(&self) -> &str {
        self.get(CardField::Name)
    }

    pub fn card_id(&self) -> &str {
        self.get(CardField::CardId)
    }

    pub fn card_type(&self) -> &str {
        self.get(CardField::CardType)
    }

    /// Canonical key of the name (precomputed, never recomputed per query)
    pub fn name_key(&self) -> &str {
        &self.name_key
    }

    /// Non-empty fields in column order
    pub fn fields(&self) -> impl Iterator<Item = (CardField, &str)> {
        self.values.iter().map(|(f, v)| (*f, v.as_str()))
    }

    /// Fold the detail row into this record (load time only)
    pub(crate) fn merge_detail(&mut self, detail: &CardDetail) {
        let pairs = [
            (CardField::SupplementInfo, &detail.supplement_info),
            (CardField::SupplementDate, &detail.supplement_date),
            (CardField::PendulumSupplementInfo, &detail.pendulum_supplement_info),
            (CardField::PendulumSupplementDate, &detail.pendulum_supplement_date),
        ];
        for (field, value) in pairs {
            if !value.is_empty() {
                self.values.insert(field, value.clone());
            }
        }
    }
}

/// Flat JSON object of the non-empty fields, in column order
impl Serialize for CardRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (field, value) in &self.values {
            map.serialize_entry(field.as_str(), value)?;
        }
        map.end()
    }
}

// ============================================================================
// CARD DETAIL
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDetail {
    pub card_id: String,
    #[serde(default)]
    pub card_name: String,
    #[serde(default)]
    pub supplement_info: String,
    #[serde(default)]
    pub supplement_date: String,
    #[serde(default)]
    pub pendulum_supplement_info: String,
    #[serde(default)]
    pub pendulum_supplement_date: String,
}

// ============================================================================
// TSV LOADING
// ============================================================================

fn tsv_reader(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| SearchError::unavailable(path.display().to_string(), e))
}

/// Load the card table
pub fn load_cards_tsv(path: &Path) -> Result<Vec<CardRecord>> {
    let mut rdr = tsv_reader(path)?;
    let mut cards = Vec::new();

    for result in rdr.deserialize::<HashMap<String, String>>() {
        let row = result.map_err(|e| SearchError::unavailable(path.display().to_string(), e))?;
        if row.values().all(|v| v.is_empty()) {
            continue;
        }
        cards.push(CardRecord::from_row(&row));
    }

    Ok(cards)
}

/// Load the detail table
pub fn load_details_tsv(path: &Path) -> Result<Vec<CardDetail>> {
    let mut rdr = tsv_reader(path)?;
    let mut details = Vec::new();

    for result in rdr.deserialize::<CardDetail>() {
        let detail = result.map_err(|e| SearchError::unavailable(path.display().to_string(), e))?;
        if detail.card_id.is_empty() {
            continue;
        }
        details.push(detail);
    }

    Ok(details)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("card_resolver_card_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_record_accessors() {
        let card = CardRecord::new("monster", "青眼の白龍", "4007")
            .with_field(CardField::Atk, "3000")
            .with_field(CardField::Ruby, "ブルーアイズ・ホワイト・ドラゴン");

        assert_eq!(card.name(), "青眼の白龍");
        assert_eq!(card.card_id(), "4007");
        assert_eq!(card.card_type(), "monster");
        assert_eq!(card.get(CardField::Atk), "3000");
        assert_eq!(card.get(CardField::Def), "");
        assert!(!card.has(CardField::PendulumText));
        assert_eq!(card.name_key(), "青眼ノ白龍");
    }

    #[test]
    fn test_name_key_follows_name() {
        let card = CardRecord::new("monster", "青眼の白竜", "1").with_field(CardField::Name, "ブラック・マジシャン");
        assert_eq!(card.name_key(), "ブラックマジシャン");
    }

    #[test]
    fn test_from_row_uses_name_modified() {
        let mut row = HashMap::new();
        row.insert("cardType".to_string(), "monster".to_string());
        row.insert("name".to_string(), "青眼の白龍".to_string());
        row.insert("cardId".to_string(), "4007".to_string());
        row.insert("nameModified".to_string(), "precomputed".to_string());
        row.insert("somethingElse".to_string(), "ignored".to_string());

        let card = CardRecord::from_row(&row);
        assert_eq!(card.name_key(), "precomputed");
        assert_eq!(card.fields().count(), 3);
    }

    #[test]
    fn test_record_serializes_flat() {
        let card = CardRecord::new("spell", "強欲な壺", "4844");
        let json = serde_json::to_string(&card).unwrap();
        assert_eq!(json, r#"{"cardType":"spell","name":"強欲な壺","cardId":"4844"}"#);
    }

    #[test]
    fn test_load_cards_tsv() {
        let path = temp_file(
            "cards.tsv",
            "cardType\tname\truby\tcardId\ttext\n\
             monster\t青眼の白龍\tブルーアイズ・ホワイト・ドラゴン\t4007\t\"伝説\"のドラゴン\n\
             \n\
             spell\t強欲な壺\tごうよくなつぼ\t4844\n",
        );

        let cards = load_cards_tsv(&path).unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].get(CardField::Text), "\"伝説\"のドラゴン");
        assert_eq!(cards[1].name(), "強欲な壺");
        assert_eq!(cards[1].get(CardField::Text), "");
    }

    #[test]
    fn test_load_details_tsv() {
        let path = temp_file(
            "details.tsv",
            "cardId\tcardName\tsupplementInfo\tsupplementDate\tpendulumSupplementInfo\tpendulumSupplementDate\n\
             4007\t青眼の白龍\t補足\t2024-01-01\t\t\n",
        );

        let details = load_details_tsv(&path).unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].supplement_info, "補足");

        let mut card = CardRecord::new("monster", "青眼の白龍", "4007");
        card.merge_detail(&details[0]);
        assert_eq!(card.get(CardField::SupplementInfo), "補足");
        assert_eq!(card.get(CardField::PendulumSupplementInfo), "");
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let err = load_cards_tsv(Path::new("/definitely/not/here.tsv")).unwrap_err();
        assert!(matches!(err, SearchError::DataSourceUnavailable { .. }));
    }
}
