// 🔎 Query Executor - filter → matching cards → sort → limit → columns
//
// Flow:
//   validate(filter, options)   nothing is read before this passes
//   scan                        every field AND-ed, conditions per combinator
//   sort                        stable; numeric fields by leading integer
//   limit                       after the sort, reports truncation
//   project                     requested columns + auto-include rules

use crate::card::CardRecord;
use crate::error::{Result, SearchError};
use crate::fields::{CardField, FieldRole};
use crate::filter::{Combinator, Condition, Filter};
use crate::matcher::{FieldMatcher, MatchFlags, MatchMode};
use crate::normalize::collation_key;
use crate::store::{CardCollection, CardStore};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::str::FromStr;
use tracing::{debug, info};

/// Result limit when the caller gives none
pub const DEFAULT_MAX: usize = 100;

// ============================================================================
// SORTING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: CardField,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn asc(field: CardField) -> Self {
        SortSpec {
            field,
            order: SortOrder::Asc,
        }
    }

    pub fn desc(field: CardField) -> Self {
        SortSpec {
            field,
            order: SortOrder::Desc,
        }
    }

    fn compare(&self, a: &CardRecord, b: &CardRecord) -> Ordering {
        let (va, vb) = (a.get(self.field), b.get(self.field));
        let ordering = if self.field.is_numeric() {
            leading_int(va).cmp(&leading_int(vb))
        } else {
            collation_key(va).cmp(&collation_key(vb))
        };
        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// `field` or `field:asc` / `field:desc`
impl FromStr for SortSpec {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        let (name, order) = match s.split_once(':') {
            Some((name, order)) => (name.trim(), Some(order.trim())),
            None => (s.trim(), None),
        };

        let field = CardField::from_name(name).ok_or_else(|| SearchError::UnknownSortField {
            field: name.to_string(),
            available: CardField::available_names(),
        })?;

        let order = match order.map(str::to_ascii_lowercase).as_deref() {
            None | Some("") | Some("asc") => SortOrder::Asc,
            Some("desc") => SortOrder::Desc,
            Some(other) => {
                return Err(SearchError::invalid(format!(
                    "sort order must be \"asc\" or \"desc\", got \"{other}\""
                )))
            }
        };

        Ok(SortSpec { field, order })
    }
}

/// Leading-integer parse: optional sign then digits; anything else is 0
fn leading_int(value: &str) -> i64 {
    let trimmed = value.trim_start();
    let (sign, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse::<i64>().map(|n| sign * n).unwrap_or(0)
}

// ============================================================================
// QUERY OPTIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    pub mode: MatchMode,
    pub flags: MatchFlags,
    /// Re-test failed name conditions against the ruby reading
    pub include_ruby: bool,
    pub sort: Option<SortSpec>,
    /// `None` = unlimited
    pub max: Option<usize>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        QueryOptions {
            mode: MatchMode::Exact,
            flags: MatchFlags::default(),
            include_ruby: true,
            sort: None,
            max: Some(DEFAULT_MAX),
        }
    }
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Partial name matching; wildcards are switched off since the two conflict
    pub fn partial() -> Self {
        QueryOptions {
            mode: MatchMode::Partial,
            flags: MatchFlags {
                allow_wildcard: false,
                ..MatchFlags::default()
            },
            ..Self::default()
        }
    }

    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_flags(mut self, flags: MatchFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_fuzzy(mut self, fuzzy: bool) -> Self {
        self.flags.fuzzy = fuzzy;
        self
    }

    pub fn with_include_ruby(mut self, include_ruby: bool) -> Self {
        self.include_ruby = include_ruby;
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_max(mut self, max: Option<usize>) -> Self {
        self.max = max;
        self
    }
}

// ============================================================================
// QUERY OUTCOME
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOutcome {
    pub records: Vec<CardRecord>,
    /// Matches before the limit was applied
    pub total_matches: usize,
    pub truncated: bool,
}

// ============================================================================
// COMPILED FILTER
// ============================================================================

struct CompiledCondition {
    primary: FieldMatcher,
    /// Ruby re-test for name conditions
    fallback: Option<FieldMatcher>,
}

struct CompiledField {
    field: CardField,
    combinator: Combinator,
    conditions: Vec<CompiledCondition>,
}

impl CompiledField {
    fn matches(&self, record: &CardRecord) -> bool {
        let value = record.get(self.field);
        let cached_key = (self.field == CardField::Name).then(|| record.name_key());

        let test = |c: &CompiledCondition| {
            c.primary.matches(value, cached_key)
                || c.fallback
                    .as_ref()
                    .is_some_and(|f| f.matches(record.get(CardField::Ruby), None))
        };

        match self.combinator {
            Combinator::And => self.conditions.iter().all(test),
            Combinator::Or => self.conditions.iter().any(test),
        }
    }
}

// ============================================================================
// QUERY EXECUTOR
// ============================================================================

pub struct QueryExecutor<'s> {
    store: &'s CardStore,
    fuzzy_supported: bool,
    ruby_fallback_fuzzy: bool,
}

impl<'s> QueryExecutor<'s> {
    pub fn new(store: &'s CardStore) -> Self {
        QueryExecutor {
            store,
            fuzzy_supported: true,
            ruby_fallback_fuzzy: true,
        }
    }

    /// Reject fuzzy requests with `UnimplementedFeature` when false
    pub fn with_fuzzy_supported(mut self, supported: bool) -> Self {
        self.fuzzy_supported = supported;
        self
    }

    /// Whether the ruby fallback keeps fuzzy matching
    pub fn with_ruby_fallback_fuzzy(mut self, enabled: bool) -> Self {
        self.ruby_fallback_fuzzy = enabled;
        self
    }

    pub fn store(&self) -> &'s CardStore {
        self.store
    }

    /// Structural checks; runs before any record is read
    pub fn validate(&self, filter: &Filter, options: &QueryOptions) -> Result<()> {
        for field_filter in filter.iter() {
            if field_filter.conditions.is_empty() {
                return Err(SearchError::invalid(format!(
                    "field `{}` has an empty condition list",
                    field_filter.field
                )));
            }
            if field_filter.conditions.iter().any(Condition::is_regex_literal) {
                return Err(SearchError::UnsupportedLiteral {
                    field: field_filter.field.to_string(),
                });
            }
        }

        if options.mode == MatchMode::Partial {
            if options.flags.allow_wildcard {
                return Err(SearchError::ConflictingModeFlags(
                    "partial mode and wildcards cannot be used together".to_string(),
                ));
            }
            if filter.fields().any(|f| f != CardField::Name) {
                return Err(SearchError::ConflictingModeFlags(
                    "partial mode is only allowed when filtering by name".to_string(),
                ));
            }
        }

        if options.flags.fuzzy {
            if !self.fuzzy_supported {
                return Err(SearchError::UnimplementedFeature(
                    "fuzzy matching is disabled in this configuration".to_string(),
                ));
            }
            if options.mode == MatchMode::Partial {
                return Err(SearchError::ConflictingModeFlags(
                    "fuzzy matching and partial mode cannot be used together".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Validate, load the snapshot, scan
    pub fn execute(&self, filter: &Filter, options: &QueryOptions) -> Result<QueryOutcome> {
        self.validate(filter, options)?;
        let collection = self.store.load()?;
        Ok(self.scan(&collection, filter, options))
    }

    /// Same as [`execute`](Self::execute) against a snapshot the caller holds
    pub fn execute_on(
        &self,
        collection: &CardCollection,
        filter: &Filter,
        options: &QueryOptions,
    ) -> Result<QueryOutcome> {
        self.validate(filter, options)?;
        Ok(self.scan(collection, filter, options))
    }

    /// Execute and project in one call
    pub fn run(&self, filter: &Filter, options: &QueryOptions, projection: &Projection) -> Result<QueryRows> {
        let outcome = self.execute(filter, options)?;
        Ok(QueryRows::from_outcome(&outcome, projection))
    }

    fn compile(&self, filter: &Filter, options: &QueryOptions) -> Vec<CompiledField> {
        filter
            .iter()
            .map(|field_filter| {
                let field = field_filter.field;
                let is_name = field == CardField::Name;
                let mode = if is_name { options.mode } else { MatchMode::Exact };

                let conditions = field_filter
                    .conditions
                    .iter()
                    .map(|condition| {
                        let primary = FieldMatcher::compile(condition, field.role(), mode, options.flags);
                        let fallback = (is_name && options.include_ruby && *condition != Condition::Empty)
                            .then(|| {
                                let flags = MatchFlags {
                                    normalize: true,
                                    allow_wildcard: options.flags.allow_wildcard,
                                    fuzzy: options.flags.fuzzy && self.ruby_fallback_fuzzy,
                                };
                                FieldMatcher::compile(condition, FieldRole::NameLike, mode, flags)
                            });
                        CompiledCondition { primary, fallback }
                    })
                    .collect();

                CompiledField {
                    field,
                    combinator: field_filter.combinator,
                    conditions,
                }
            })
            .collect()
    }

    fn scan(&self, collection: &CardCollection, filter: &Filter, options: &QueryOptions) -> QueryOutcome {
        let compiled = self.compile(filter, options);

        let mut records: Vec<CardRecord> = collection
            .records()
            .iter()
            .filter(|record| compiled.iter().all(|field| field.matches(record)))
            .cloned()
            .collect();

        debug!(
            "scanned {} records, {} matched {} field(s)",
            collection.len(),
            records.len(),
            filter.len()
        );

        if let Some(sort) = &options.sort {
            records.sort_by(|a, b| sort.compare(a, b));
        }

        let total_matches = records.len();
        let truncated = options.max.is_some_and(|max| total_matches > max);
        if let Some(max) = options.max {
            records.truncate(max);
        }
        if truncated {
            info!("results truncated: showing {} of {}", records.len(), total_matches);
        }

        QueryOutcome {
            records,
            total_matches,
            truncated,
        }
    }
}

// ============================================================================
// PROJECTION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    /// `None` = every non-empty field
    pub columns: Option<Vec<CardField>>,
    pub auto_ruby: bool,
    pub auto_pendulum: bool,
    pub auto_supplement: bool,
}

impl Default for Projection {
    fn default() -> Self {
        Projection {
            columns: None,
            auto_ruby: true,
            auto_pendulum: true,
            auto_supplement: true,
        }
    }
}

impl Projection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn columns(columns: Vec<CardField>) -> Self {
        Projection {
            columns: Some(columns),
            ..Self::default()
        }
    }

    /// Comma-separated column list, e.g. `name,cardId`
    pub fn parse_columns(list: &str) -> Result<Vec<CardField>> {
        list.split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(|c| {
                CardField::from_name(c).ok_or_else(|| {
                    SearchError::invalid(format!(
                        "unknown column `{c}`. Available fields: {}",
                        CardField::available_names()
                    ))
                })
            })
            .collect()
    }

    pub fn with_auto_ruby(mut self, enabled: bool) -> Self {
        self.auto_ruby = enabled;
        self
    }

    pub fn with_auto_pendulum(mut self, enabled: bool) -> Self {
        self.auto_pendulum = enabled;
        self
    }

    pub fn with_auto_supplement(mut self, enabled: bool) -> Self {
        self.auto_supplement = enabled;
        self
    }

    /// Final column list for one record
    pub fn columns_for(&self, record: &CardRecord) -> Vec<CardField> {
        let Some(requested) = &self.columns else {
            return record.fields().map(|(field, _)| field).collect();
        };

        let mut columns: Vec<CardField> = Vec::with_capacity(requested.len() + 4);
        let push = |columns: &mut Vec<CardField>, field: CardField| {
            if !columns.contains(&field) {
                columns.push(field);
            }
        };
        for field in requested {
            push(&mut columns, *field);
        }

        let has_name = requested.contains(&CardField::Name);
        let has_text = requested.contains(&CardField::Text);
        let has_pendulum_text = requested.contains(&CardField::PendulumText);
        let record_is_pendulum = record.has(CardField::PendulumText);
        let pendulum_side = has_pendulum_text || (has_text && record_is_pendulum);

        if self.auto_ruby && has_name {
            push(&mut columns, CardField::Ruby);
        }

        if self.auto_pendulum {
            if has_text && record_is_pendulum {
                push(&mut columns, CardField::PendulumText);
            }
            if has_text && record.has(CardField::SupplementInfo) {
                push(&mut columns, CardField::SupplementInfo);
            }
            if pendulum_side && record.has(CardField::PendulumSupplementInfo) {
                push(&mut columns, CardField::PendulumSupplementInfo);
            }
        }

        if self.auto_supplement {
            if has_text {
                push(&mut columns, CardField::SupplementInfo);
            }
            if pendulum_side {
                push(&mut columns, CardField::PendulumSupplementInfo);
            }
        }

        columns
    }

    pub fn project(&self, record: &CardRecord) -> ProjectedRow {
        ProjectedRow {
            cells: self
                .columns_for(record)
                .into_iter()
                .map(|field| (field, record.get(field).to_string()))
                .collect(),
        }
    }
}

/// One output row; serializes as a JSON object in column order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedRow {
    cells: Vec<(CardField, String)>,
}

impl ProjectedRow {
    pub fn get(&self, field: CardField) -> Option<&str> {
        self.cells
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v.as_str())
    }

    pub fn columns(&self) -> Vec<CardField> {
        self.cells.iter().map(|(f, _)| *f).collect()
    }
}

impl Serialize for ProjectedRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (field, value) in &self.cells {
            map.serialize_entry(field.as_str(), value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRows {
    pub rows: Vec<ProjectedRow>,
    pub total_matches: usize,
    pub truncated: bool,
}

impl QueryRows {
    pub fn from_outcome(outcome: &QueryOutcome, projection: &Projection) -> Self {
        QueryRows {
            rows: outcome.records.iter().map(|r| projection.project(r)).collect(),
            total_matches: outcome.total_matches,
            truncated: outcome.truncated,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FieldFilter;

    fn create_test_cards() -> Vec<CardRecord> {
        vec![
            CardRecord::new("monster", "青眼の白龍", "4007")
                .with_field(CardField::Ruby, "ブルーアイズ・ホワイト・ドラゴン")
                .with_field(CardField::Attribute, "光")
                .with_field(CardField::Race, "ドラゴン族")
                .with_field(CardField::LevelValue, "8")
                .with_field(CardField::Atk, "3000")
                .with_field(CardField::Def, "2500")
                .with_field(
                    CardField::Text,
                    "高い攻撃力を誇る伝説のドラゴン。どんな相手でも粉砕する、その破壊力は計り知れない。",
                ),
            CardRecord::new("monster", "青眼の亜白龍", "11709")
                .with_field(CardField::Ruby, "ブルーアイズ・オルタナティブ・ホワイト・ドラゴン")
                .with_field(CardField::Attribute, "光")
                .with_field(CardField::Race, "ドラゴン族")
                .with_field(CardField::LevelValue, "8")
                .with_field(CardField::Atk, "3000")
                .with_field(CardField::Def, "2500")
                .with_field(CardField::Text, "このカードは通常召喚できない。"),
            CardRecord::new("monster", "ブラック・マジシャン", "4041")
                .with_field(CardField::Ruby, "ブラック・マジシャン")
                .with_field(CardField::Attribute, "闇")
                .with_field(CardField::Race, "魔法使い族")
                .with_field(CardField::LevelValue, "7")
                .with_field(CardField::Atk, "2500")
                .with_field(CardField::Def, "2100")
                .with_field(CardField::Text, "魔法使いとしては、攻撃力・守備力ともに最高クラス。"),
            CardRecord::new("spell", "強欲な壺", "4844")
                .with_field(CardField::Ruby, "ごうよくなつぼ")
                .with_field(CardField::Text, "自分はデッキから２枚ドローする。")
                .with_field(CardField::SupplementInfo, "禁止カード"),
            CardRecord::new("trap", "聖なるバリア －ミラーフォース－", "4861")
                .with_field(CardField::Ruby, "せいなるばりあ　みらーふぉーす")
                .with_field(
                    CardField::Text,
                    "相手モンスターの攻撃宣言時に発動できる。相手フィールドの攻撃表示モンスターを全て破壊する。",
                ),
            CardRecord::new("trap", "神の宣告", "5206")
                .with_field(CardField::Ruby, "かみのせんこく")
                .with_field(
                    CardField::Text,
                    "LPを半分払って以下の効果を発動できる。●魔法・罠カードが発動した時に発動できる。その発動を無効にし破壊する。",
                ),
            CardRecord::new("monster", "オッドアイズ・ペンデュラム・ドラゴン", "9849")
                .with_field(CardField::Ruby, "オッドアイズ・ペンデュラム・ドラゴン")
                .with_field(CardField::Attribute, "闇")
                .with_field(CardField::Race, "ドラゴン族")
                .with_field(CardField::LevelValue, "7")
                .with_field(CardField::PendulumScale, "4")
                .with_field(CardField::Atk, "2500")
                .with_field(CardField::Def, "2000")
                .with_field(
                    CardField::PendulumText,
                    "①：１ターンに１度、自分のペンデュラムモンスターの戦闘で発生する自分への戦闘ダメージを０にできる。",
                )
                .with_field(
                    CardField::Text,
                    "①：このカードが相手モンスターと戦闘を行う場合、このカードが相手に与える戦闘ダメージは倍になる。",
                )
                .with_field(CardField::PendulumSupplementInfo, "ペンデュラム効果の補足"),
        ]
    }

    fn ids(outcome: &QueryOutcome) -> Vec<&str> {
        outcome.records.iter().map(|r| r.card_id()).collect()
    }

    fn run(filter: Filter, options: QueryOptions) -> Result<QueryOutcome> {
        let store = CardStore::from_records(create_test_cards());
        QueryExecutor::new(&store).execute(&filter, &options)
    }

    #[test]
    fn test_exact_name_with_columns() {
        let store = CardStore::from_records(create_test_cards());
        let executor = QueryExecutor::new(&store);
        let filter = Filter::new().with_value(CardField::Name, "青眼の白龍");
        let projection = Projection::columns(vec![CardField::Name, CardField::CardId]);

        let rows = executor.run(&filter, &QueryOptions::default(), &projection).unwrap();
        assert_eq!(rows.rows.len(), 1);
        let row = &rows.rows[0];
        assert_eq!(row.get(CardField::CardId), Some("4007"));
        // ruby is auto-included after the requested columns
        assert_eq!(row.columns(), vec![CardField::Name, CardField::CardId, CardField::Ruby]);

        let json = serde_json::to_string(row).unwrap();
        assert_eq!(
            json,
            r#"{"name":"青眼の白龍","cardId":"4007","ruby":"ブルーアイズ・ホワイト・ドラゴン"}"#
        );
    }

    #[test]
    fn test_name_variants_normalize() {
        let outcome = run(Filter::new().with_value(CardField::Name, "青眼の 白竜"), QueryOptions::default()).unwrap();
        assert_eq!(ids(&outcome), vec!["4007"]);
    }

    #[test]
    fn test_ruby_fallback() {
        let filter = Filter::new().with_value(CardField::Name, "ぶるーあいず・ほわいと・どらごん");
        assert_eq!(ids(&run(filter.clone(), QueryOptions::default()).unwrap()), vec!["4007"]);

        let no_ruby = QueryOptions::default().with_include_ruby(false);
        assert!(run(filter, no_ruby).unwrap().records.is_empty());
    }

    #[test]
    fn test_wildcard_is_superset_of_exact() {
        let exact = run(Filter::new().with_value(CardField::Name, "青眼の白龍"), QueryOptions::default()).unwrap();
        let wild = run(Filter::new().with_value(CardField::Name, "青眼の*白龍"), QueryOptions::default()).unwrap();
        assert_eq!(ids(&wild), vec!["4007", "11709"]);
        for id in ids(&exact) {
            assert!(ids(&wild).contains(&id));
        }
    }

    #[test]
    fn test_negative_text_search() {
        let filter = Filter::new().with_value(CardField::Text, r#"破壊 -"無効""#);
        let outcome = run(filter, QueryOptions::default()).unwrap();
        assert_eq!(ids(&outcome), vec!["4007", "4861"]);
    }

    #[test]
    fn test_or_and_and_combinators() {
        let filter = Filter::new()
            .with(FieldFilter::any_of(CardField::CardType, ["spell", "trap"]))
            .with(FieldFilter::all_of(CardField::Text, ["発動", "破壊"]));
        let outcome = run(filter, QueryOptions::default()).unwrap();
        assert_eq!(ids(&outcome), vec!["4861", "5206"]);
    }

    #[test]
    fn test_empty_condition() {
        let filter = Filter::new()
            .with_value(CardField::CardType, "monster")
            .with(FieldFilter::empty(CardField::PendulumText));
        let outcome = run(filter, QueryOptions::default()).unwrap();
        assert_eq!(ids(&outcome), vec!["4007", "11709", "4041"]);
    }

    #[test]
    fn test_numeric_sort_desc_is_stable() {
        let filter = Filter::new().with_value(CardField::CardType, "monster");

        let desc = run(filter.clone(), QueryOptions::default().with_sort(SortSpec::desc(CardField::Atk))).unwrap();
        assert_eq!(ids(&desc), vec!["4007", "11709", "4041", "9849"]);

        let asc = run(filter, QueryOptions::default().with_sort(SortSpec::asc(CardField::Atk))).unwrap();
        assert_eq!(ids(&asc), vec!["4041", "9849", "4007", "11709"]);
    }

    #[test]
    fn test_card_id_sorts_numerically() {
        let outcome = run(Filter::new(), QueryOptions::default().with_sort(SortSpec::asc(CardField::CardId))).unwrap();
        assert_eq!(ids(&outcome), vec!["4007", "4041", "4844", "4861", "5206", "9849", "11709"]);
    }

    #[test]
    fn test_limit_reports_truncation() {
        let outcome = run(Filter::new(), QueryOptions::default().with_max(Some(3))).unwrap();
        assert_eq!(outcome.records.len(), 3);
        assert_eq!(outcome.total_matches, 7);
        assert!(outcome.truncated);

        let unlimited = run(Filter::new(), QueryOptions::default().with_max(None)).unwrap();
        assert_eq!(unlimited.records.len(), 7);
        assert!(!unlimited.truncated);
    }

    #[test]
    fn test_partial_name() {
        let outcome = run(Filter::new().with_value(CardField::Name, "ブラック"), QueryOptions::partial()).unwrap();
        assert_eq!(ids(&outcome), vec!["4041"]);
    }

    #[test]
    fn test_fuzzy_name() {
        let options = QueryOptions::default().with_fuzzy(true);
        let outcome = run(Filter::new().with_value(CardField::Name, "ブラックマジシャソ"), options).unwrap();
        assert_eq!(ids(&outcome), vec!["4041"]);
    }

    #[test]
    fn test_ruby_fallback_keeps_wildcard() {
        let filter = Filter::new().with_value(CardField::Name, "ごうよく*");
        assert_eq!(ids(&run(filter.clone(), QueryOptions::default()).unwrap()), vec!["4844"]);

        let no_ruby = QueryOptions::default().with_include_ruby(false);
        assert!(run(filter, no_ruby).unwrap().records.is_empty());
    }

    #[test]
    fn test_ruby_fallback_fuzzy_switch() {
        let store = CardStore::from_records(create_test_cards());
        let filter = Filter::new().with_value(CardField::Name, "ごうよくなつば");
        let options = QueryOptions::default().with_fuzzy(true);

        let outcome = QueryExecutor::new(&store).execute(&filter, &options).unwrap();
        assert_eq!(ids(&outcome), vec!["4844"]);

        let strict_ruby = QueryExecutor::new(&store).with_ruby_fallback_fuzzy(false);
        assert!(strict_ruby.execute(&filter, &options).unwrap().records.is_empty());

        // Without fuzzy the typo finds nothing either way
        let plain = QueryExecutor::new(&store).execute(&filter, &QueryOptions::default()).unwrap();
        assert!(plain.records.is_empty());
    }

    #[test]
    fn test_validation_errors() {
        let name_and_text = Filter::new()
            .with_value(CardField::Name, "青眼")
            .with_value(CardField::Text, "破壊");
        let err = run(name_and_text, QueryOptions::partial()).unwrap_err();
        assert!(matches!(err, SearchError::ConflictingModeFlags(_)));

        let partial_wild = QueryOptions::default().with_mode(MatchMode::Partial);
        let err = run(Filter::new().with_value(CardField::Name, "青眼"), partial_wild).unwrap_err();
        assert!(matches!(err, SearchError::ConflictingModeFlags(_)));

        let err = run(
            Filter::new().with_value(CardField::Name, "青眼"),
            QueryOptions::partial().with_fuzzy(true),
        )
        .unwrap_err();
        assert!(matches!(err, SearchError::ConflictingModeFlags(_)));

        let err = run(Filter::new().with_value(CardField::Name, "/青眼.*/"), QueryOptions::default()).unwrap_err();
        assert!(matches!(err, SearchError::UnsupportedLiteral { .. }));
    }

    #[test]
    fn test_fuzzy_unsupported() {
        let store = CardStore::from_records(create_test_cards());
        let executor = QueryExecutor::new(&store).with_fuzzy_supported(false);
        let filter = Filter::new().with_value(CardField::Name, "青眼");

        let err = executor
            .execute(&filter, &QueryOptions::default().with_fuzzy(true))
            .unwrap_err();
        assert!(matches!(err, SearchError::UnimplementedFeature(_)));
        // validation failed before anything was loaded
        assert!(!store.is_loaded());
    }

    #[test]
    fn test_sort_spec_parse() {
        assert_eq!("atk:desc".parse::<SortSpec>().unwrap(), SortSpec::desc(CardField::Atk));
        assert_eq!("name".parse::<SortSpec>().unwrap(), SortSpec::asc(CardField::Name));
        assert!(matches!(
            "power:desc".parse::<SortSpec>().unwrap_err(),
            SearchError::UnknownSortField { .. }
        ));
        assert!(matches!(
            "atk:sideways".parse::<SortSpec>().unwrap_err(),
            SearchError::InvalidFilterSyntax(_)
        ));
    }

    #[test]
    fn test_leading_int() {
        assert_eq!(leading_int("3000"), 3000);
        assert_eq!(leading_int("?"), 0);
        assert_eq!(leading_int(""), 0);
        assert_eq!(leading_int("12abc"), 12);
        assert_eq!(leading_int("-1"), -1);
    }

    #[test]
    fn test_projection_auto_rules_for_pendulum() {
        let cards = create_test_cards();
        let odd_eyes = &cards[6];
        let pot = &cards[3];
        let projection = Projection::columns(vec![CardField::Name, CardField::Text]);

        assert_eq!(
            projection.columns_for(odd_eyes),
            vec![
                CardField::Name,
                CardField::Text,
                CardField::Ruby,
                CardField::PendulumText,
                CardField::PendulumSupplementInfo,
                CardField::SupplementInfo,
            ]
        );
        assert_eq!(
            projection.columns_for(pot),
            vec![CardField::Name, CardField::Text, CardField::Ruby, CardField::SupplementInfo]
        );

        let plain = projection
            .with_auto_ruby(false)
            .with_auto_pendulum(false)
            .with_auto_supplement(false);
        assert_eq!(plain.columns_for(odd_eyes), vec![CardField::Name, CardField::Text]);
    }

    #[test]
    fn test_projection_supplement_even_if_empty() {
        let cards = create_test_cards();
        let projection = Projection::columns(vec![CardField::Text]).with_auto_pendulum(false);
        let row = projection.project(&cards[0]);
        assert_eq!(row.get(CardField::SupplementInfo), Some(""));
    }

    #[test]
    fn test_full_projection_is_non_empty_fields() {
        let cards = create_test_cards();
        let row = Projection::all().project(&cards[3]);
        assert_eq!(
            row.columns(),
            vec![
                CardField::CardType,
                CardField::Name,
                CardField::Ruby,
                CardField::CardId,
                CardField::Text,
                CardField::SupplementInfo,
            ]
        );
    }

    #[test]
    fn test_parse_columns() {
        assert_eq!(
            Projection::parse_columns("name, cardId").unwrap(),
            vec![CardField::Name, CardField::CardId]
        );
        assert!(Projection::parse_columns("name,power").is_err());
    }
}
