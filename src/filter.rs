// 🧾 Filters - per-field AND/OR condition sets
//
// Accepted JSON shapes per field:
//   "name": "青眼の白龍"                              → one condition, AND
//   "name": ["青眼の白龍", "ブラック・マジシャン"]     → OR over the list
//   "name": {"op": "or", "cond": ["a", "b"]}          → explicit
// All fields present in a filter are AND-ed together.

use crate::error::{Result, SearchError};
use crate::fields::CardField;
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;

// ============================================================================
// CONDITION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Field must be empty / absent
    Empty,
    /// Literal pattern (may carry wildcards or negative phrases)
    Value(String),
}

impl Condition {
    pub fn value(v: impl Into<String>) -> Self {
        let v = v.into();
        if v.is_empty() {
            Condition::Empty
        } else {
            Condition::Value(v)
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Condition::Empty => None,
            Condition::Value(v) => Some(v),
        }
    }

    /// `/.../` style input
    pub fn is_regex_literal(&self) -> bool {
        self.as_str().is_some_and(is_regex_literal)
    }

    fn from_json(field: CardField, value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Condition::Empty),
            Value::String(s) => Ok(Condition::value(s.as_str())),
            Value::Number(n) => Ok(Condition::Value(n.to_string())),
            Value::Bool(b) => Ok(Condition::Value(b.to_string())),
            Value::Array(_) | Value::Object(_) => Err(SearchError::invalid(format!(
                "condition for `{field}` must be a scalar, got {value}"
            ))),
        }
    }
}

fn is_regex_literal(s: &str) -> bool {
    s.len() >= 2 && s.starts_with('/') && s.ends_with('/')
}

/// Recursive regex-literal check over a raw JSON filter value
pub fn contains_regex_literal(value: &Value) -> bool {
    match value {
        Value::String(s) => is_regex_literal(s),
        Value::Array(items) => items.iter().any(contains_regex_literal),
        Value::Object(map) => map.values().any(contains_regex_literal),
        _ => false,
    }
}

// ============================================================================
// COMBINATOR
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Combinator {
    #[default]
    And,
    Or,
}

impl FromStr for Combinator {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "and" => Ok(Combinator::And),
            "or" => Ok(Combinator::Or),
            other => Err(SearchError::invalid(format!(
                "combinator must be \"and\" or \"or\", got \"{other}\""
            ))),
        }
    }
}

// ============================================================================
// FIELD FILTER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub field: CardField,
    pub combinator: Combinator,
    pub conditions: Vec<Condition>,
}

impl FieldFilter {
    /// Single bare value (AND)
    pub fn single(field: CardField, value: impl Into<String>) -> Self {
        FieldFilter {
            field,
            combinator: Combinator::And,
            conditions: vec![Condition::value(value)],
        }
    }

    /// Field must be empty
    pub fn empty(field: CardField) -> Self {
        FieldFilter {
            field,
            combinator: Combinator::And,
            conditions: vec![Condition::Empty],
        }
    }

    /// Any of the values (OR)
    pub fn any_of<I, S>(field: CardField, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldFilter {
            field,
            combinator: Combinator::Or,
            conditions: values.into_iter().map(Condition::value).collect(),
        }
    }

    /// All of the values (AND)
    pub fn all_of<I, S>(field: CardField, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldFilter {
            field,
            combinator: Combinator::And,
            conditions: values.into_iter().map(Condition::value).collect(),
        }
    }

    fn from_json(field: CardField, value: &Value) -> Result<Self> {
        match value {
            Value::Array(items) => Ok(FieldFilter {
                field,
                combinator: Combinator::Or,
                conditions: items
                    .iter()
                    .map(|v| Condition::from_json(field, v))
                    .collect::<Result<_>>()?,
            }),
            Value::Object(map) => {
                let op = map.get("op").or_else(|| map.get("combinator"));
                let cond = map.get("cond").or_else(|| map.get("conditions"));

                if op.is_none() && cond.is_none() {
                    return Err(SearchError::invalid(format!(
                        "object for `{field}` needs \"op\" and/or \"cond\""
                    )));
                }

                let combinator = match op {
                    None | Some(Value::Null) => Combinator::And,
                    Some(Value::String(s)) => s.parse()?,
                    Some(other) => {
                        return Err(SearchError::invalid(format!(
                            "combinator for `{field}` must be a string, got {other}"
                        )))
                    }
                };

                let conditions = match cond {
                    None => Vec::new(),
                    Some(Value::Array(items)) => items
                        .iter()
                        .map(|v| Condition::from_json(field, v))
                        .collect::<Result<_>>()?,
                    Some(v) => vec![Condition::from_json(field, v)?],
                };

                Ok(FieldFilter {
                    field,
                    combinator,
                    conditions,
                })
            }
            scalar => Ok(FieldFilter {
                field,
                combinator: Combinator::And,
                conditions: vec![Condition::from_json(field, scalar)?],
            }),
        }
    }
}

// ============================================================================
// FILTER
// ============================================================================

/// Field → conditions. Absent fields impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    fields: BTreeMap<CardField, FieldFilter>,
}

impl Filter {
    pub fn new() -> Self {
        Filter::default()
    }

    /// Builder: add (or replace) one field's conditions
    pub fn with(mut self, field_filter: FieldFilter) -> Self {
        self.fields.insert(field_filter.field, field_filter);
        self
    }

    /// Shorthand for a single bare value
    pub fn with_value(self, field: CardField, value: impl Into<String>) -> Self {
        self.with(FieldFilter::single(field, value))
    }

    pub fn get(&self, field: CardField) -> Option<&FieldFilter> {
        self.fields.get(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldFilter> {
        self.fields.values()
    }

    pub fn fields(&self) -> impl Iterator<Item = CardField> + '_ {
        self.fields.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Parse the JSON filter shape
    pub fn from_json(value: &Value) -> Result<Self> {
        let map = value.as_object().ok_or_else(|| {
            SearchError::invalid(format!("filter must be a JSON object, got {value}"))
        })?;

        // Regex literals are rejected before anything else is interpreted
        for (key, raw) in map {
            if contains_regex_literal(raw) {
                return Err(SearchError::UnsupportedLiteral { field: key.clone() });
            }
        }

        let mut filter = Filter::new();
        for (key, raw) in map {
            let field = CardField::from_name(key).ok_or_else(|| {
                SearchError::invalid(format!(
                    "unknown field `{key}`. Available fields: {}",
                    CardField::available_names()
                ))
            })?;

            let field_filter = FieldFilter::from_json(field, raw)?;
            if field_filter.conditions.is_empty() {
                return Err(SearchError::invalid(format!(
                    "field `{key}` has an empty condition list"
                )));
            }
            filter = filter.with(field_filter);
        }

        Ok(filter)
    }
}

impl FromStr for Filter {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(s)
            .map_err(|e| SearchError::invalid(format!("invalid JSON filter: {e}")))?;
        Filter::from_json(&value)
    }
}

// ============================================================================
// TESTS
// ============================================================================
