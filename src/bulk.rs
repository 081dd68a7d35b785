// 📦 Bulk Queries - several filter queries against one snapshot
// One malformed entry yields its own error; the rest of the batch still runs.

use crate::error::{Result, SearchError};
use crate::filter::Filter;
use crate::matcher::{MatchFlags, MatchMode};
use crate::query::{Projection, QueryExecutor, QueryOptions, QueryRows, SortSpec};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use tracing::{debug, warn};

/// One entry of a batch, as accepted on the wire
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkQuery {
    pub filter: Value,
    #[serde(default)]
    pub cols: Option<Vec<String>>,
    #[serde(default)]
    pub mode: Option<MatchMode>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub max: Option<usize>,
    #[serde(default)]
    pub include_ruby: Option<bool>,
    #[serde(default, alias = "flagAutoModify")]
    pub normalize: Option<bool>,
    #[serde(default, alias = "flagAllowWild")]
    pub allow_wildcard: Option<bool>,
    #[serde(default, alias = "flagNearly")]
    pub fuzzy: Option<bool>,
    #[serde(default, alias = "flagAutoRuby")]
    pub auto_ruby: Option<bool>,
    #[serde(default, alias = "flagAutoPend")]
    pub auto_pendulum: Option<bool>,
    #[serde(default, alias = "flagAutoSupply")]
    pub auto_supplement: Option<bool>,
}

impl BulkQuery {
    pub fn new(filter: Value) -> Self {
        BulkQuery {
            filter,
            cols: None,
            mode: None,
            sort: None,
            max: None,
            include_ruby: None,
            normalize: None,
            allow_wildcard: None,
            fuzzy: None,
            auto_ruby: None,
            auto_pendulum: None,
            auto_supplement: None,
        }
    }

    /// Parse a JSON array of queries
    pub fn parse_list(json: &str) -> Result<Vec<BulkQuery>> {
        serde_json::from_str(json).map_err(|e| SearchError::invalid(format!("invalid bulk query list: {e}")))
    }

    pub fn options(&self, default_max: usize) -> Result<QueryOptions> {
        let mode = self.mode.unwrap_or_default();
        let defaults = MatchFlags::default();
        // Partial mode without an explicit wildcard setting turns wildcards off
        let allow_wildcard = self
            .allow_wildcard
            .unwrap_or(mode != MatchMode::Partial && defaults.allow_wildcard);

        let mut options = QueryOptions::default()
            .with_mode(mode)
            .with_flags(MatchFlags {
                normalize: self.normalize.unwrap_or(defaults.normalize),
                allow_wildcard,
                fuzzy: self.fuzzy.unwrap_or(defaults.fuzzy),
            })
            .with_include_ruby(self.include_ruby.unwrap_or(true))
            .with_max(Some(self.max.unwrap_or(default_max)));

        if let Some(sort) = &self.sort {
            options = options.with_sort(sort.parse::<SortSpec>()?);
        }
        Ok(options)
    }

    pub fn projection(&self) -> Result<Projection> {
        let mut projection = match &self.cols {
            Some(cols) => Projection::columns(Projection::parse_columns(&cols.join(","))?),
            None => Projection::all(),
        };
        projection.auto_ruby = self.auto_ruby.unwrap_or(true);
        projection.auto_pendulum = self.auto_pendulum.unwrap_or(true);
        projection.auto_supplement = self.auto_supplement.unwrap_or(true);
        Ok(projection)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkResult {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<QueryRows>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_error")]
    pub error: Option<SearchError>,
}

fn serialize_error<S: Serializer>(error: &Option<SearchError>, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_str(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

/// Run every query against one loaded snapshot
pub fn run_bulk(executor: &QueryExecutor<'_>, queries: &[BulkQuery], default_max: usize) -> Result<Vec<BulkResult>> {
    let collection = executor.store().load()?;

    let results = queries
        .iter()
        .enumerate()
        .map(|(index, query)| {
            let outcome = Filter::from_json(&query.filter).and_then(|filter| {
                let options = query.options(default_max)?;
                let projection = query.projection()?;
                let outcome = executor.execute_on(&collection, &filter, &options)?;
                Ok(QueryRows::from_outcome(&outcome, &projection))
            });

            match outcome {
                Ok(rows) => {
                    debug!("bulk query {}: {} row(s)", index, rows.rows.len());
                    BulkResult {
                        index,
                        result: Some(rows),
                        error: None,
                    }
                }
                Err(e) => {
                    warn!("bulk query {} failed: {}", index, e);
                    BulkResult {
                        index,
                        result: None,
                        error: Some(e),
                    }
                }
            }
        })
        .collect();

    Ok(results)
}

// ============================================================================
// TESTS
// ============================================================================
