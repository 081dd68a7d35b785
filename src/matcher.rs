// 🎯 Field Matcher - does one field value satisfy one condition?
//
// Priority order:
//   1. empty condition      → field must be empty
//   2. negative phrases     → any literal hit in the raw value fails the field
//   3. pure-negative        → passes once the negative check passed
//   4. wildcard (`*`)       → regex, anchored for names, unanchored for text
//   5. normalized name      → equality / containment / fuzzy on canonical keys
//   6. free text            → case-sensitive containment
//   7. plain                → partial: containment, exact: equality

use crate::fields::FieldRole;
use crate::filter::Condition;
use crate::fuzzy::fuzzy_match;
use crate::normalize::normalize;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::OnceLock;

// ============================================================================
// MODE & FLAGS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Exact,
    Partial,
}

impl FromStr for MatchMode {
    type Err = crate::error::SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(MatchMode::Exact),
            "partial" => Ok(MatchMode::Partial),
            other => Err(crate::error::SearchError::invalid(format!(
                "mode must be \"exact\" or \"partial\", got \"{other}\""
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchFlags {
    /// Compare canonical keys for name-like fields
    pub normalize: bool,
    /// Treat `*` as "any run of characters" in name-like and free-text fields
    pub allow_wildcard: bool,
    /// Edit-distance matching for name-like fields
    pub fuzzy: bool,
}

impl Default for MatchFlags {
    fn default() -> Self {
        MatchFlags {
            normalize: true,
            allow_wildcard: true,
            fuzzy: false,
        }
    }
}

// ============================================================================
// NEGATIVE PHRASES
// ============================================================================

static NEGATIVE_PATTERN: OnceLock<Regex> = OnceLock::new();

fn negative_pattern() -> &'static Regex {
    NEGATIVE_PATTERN.get_or_init(|| {
        // delimiter (start or any whitespace, U+3000 included) + `-` + quoted phrase
        Regex::new(r#"(?:^|\s)-(?:"([^"]+)"|'([^']+)'|`([^`]+)`)"#)
            .expect("static negative-phrase pattern is valid")
    })
}

/// A condition split into its positive residue and exclusion phrases
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegativeSplit {
    pub positive: String,
    pub negatives: Vec<String>,
}

pub fn parse_negative(pattern: &str) -> NegativeSplit {
    let negatives: Vec<String> = negative_pattern()
        .captures_iter(pattern)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)))
        .map(|m| m.as_str().to_string())
        .collect();

    let positive = if negatives.is_empty() {
        pattern.to_string()
    } else {
        negative_pattern().replace_all(pattern, "").trim().to_string()
    };

    NegativeSplit { positive, negatives }
}

// ============================================================================
// WILDCARD
// ============================================================================

/// Stands in for `*` while the pattern goes through normalization
const WILDCARD_SENTINEL: char = '\u{FFFF}';

/// Two-step transform: protect + (optionally) normalize, then escape every
/// literal run and join the runs with `.*`
fn compile_wildcard(pattern: &str, normalize_pattern: bool, anchored: bool) -> Option<Regex> {
    let protected: String = pattern
        .chars()
        .map(|c| if c == '*' { WILDCARD_SENTINEL } else { c })
        .collect();
    let body = if normalize_pattern {
        normalize(&protected)
    } else {
        protected
    };

    let source = body
        .split(WILDCARD_SENTINEL)
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");

    let source = if anchored {
        format!("(?s)^{source}$")
    } else {
        format!("(?s){source}")
    };

    match Regex::new(&source) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!("wildcard pattern {:?} did not compile: {}", pattern, e);
            None
        }
    }
}

// ============================================================================
// FIELD MATCHER
// ============================================================================

#[derive(Debug, Clone)]
enum Positive {
    /// Condition was absent / null
    ExpectEmpty,
    /// Only negative phrases were given
    NegativeOnly,
    /// Wildcard regex; `normalized` says which side of the value to test
    Wildcard { regex: Option<Regex>, normalized: bool },
    /// Canonical key of the pattern (name-like + normalize)
    Normalized(String),
    /// Raw pattern
    Literal(String),
}

/// One condition compiled for one field role. Compile once per query, test
/// once per record.
#[derive(Debug, Clone)]
pub struct FieldMatcher {
    role: FieldRole,
    mode: MatchMode,
    fuzzy: bool,
    negatives: Vec<String>,
    positive: Positive,
}

impl FieldMatcher {
    pub fn compile(condition: &Condition, role: FieldRole, mode: MatchMode, flags: MatchFlags) -> Self {
        let raw = match condition {
            Condition::Empty => {
                return FieldMatcher {
                    role,
                    mode,
                    fuzzy: false,
                    negatives: Vec::new(),
                    positive: Positive::ExpectEmpty,
                };
            }
            Condition::Value(v) => v,
        };

        let NegativeSplit { positive, negatives } = parse_negative(raw);
        let name_like = role == FieldRole::NameLike;
        let normalized = name_like && flags.normalize;
        let wildcard_eligible = matches!(role, FieldRole::NameLike | FieldRole::FreeText);

        let positive = if positive.is_empty() {
            Positive::NegativeOnly
        } else if wildcard_eligible && flags.allow_wildcard && positive.contains('*') {
            Positive::Wildcard {
                regex: compile_wildcard(&positive, normalized, name_like),
                normalized,
            }
        } else if normalized {
            Positive::Normalized(normalize(&positive))
        } else {
            Positive::Literal(positive)
        };

        FieldMatcher {
            role,
            mode,
            fuzzy: flags.fuzzy && name_like,
            negatives,
            positive,
        }
    }

    /// Test a field value. `cached_key` is the precomputed canonical key of
    /// `value`, when the record carries one.
    pub fn matches(&self, value: &str, cached_key: Option<&str>) -> bool {
        if let Positive::ExpectEmpty = self.positive {
            return value.is_empty();
        }

        // Negative phrases test the raw value, before any normalization
        if self.negatives.iter().any(|neg| value.contains(neg.as_str())) {
            return false;
        }

        let canonical = || match cached_key {
            Some(key) => std::borrow::Cow::Borrowed(key),
            None => std::borrow::Cow::Owned(normalize(value)),
        };

        match &self.positive {
            Positive::ExpectEmpty => value.is_empty(),
            Positive::NegativeOnly => !self.negatives.is_empty(),
            Positive::Wildcard { regex, normalized } => match regex {
                Some(re) if *normalized => re.is_match(&canonical()),
                Some(re) => re.is_match(value),
                None => false,
            },
            Positive::Normalized(pattern) => {
                let key = canonical();
                if self.fuzzy {
                    fuzzy_match(&key, pattern)
                } else if self.mode == MatchMode::Partial {
                    key.contains(pattern.as_str())
                } else {
                    key == pattern.as_str()
                }
            }
            Positive::Literal(pattern) => match self.role {
                FieldRole::FreeText => value.contains(pattern.as_str()),
                FieldRole::NameLike if self.fuzzy => fuzzy_match(value, pattern),
                _ if self.mode == MatchMode::Partial => value.contains(pattern.as_str()),
                _ => value == pattern,
            },
        }
    }
}

/// One-shot form of [`FieldMatcher`]: compile and test in a single call
pub fn matches(
    field_value: &str,
    condition: &Condition,
    mode: MatchMode,
    flags: MatchFlags,
    role: FieldRole,
) -> bool {
    FieldMatcher::compile(condition, role, mode, flags).matches(field_value, None)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cond(s: &str) -> Condition {
        Condition::value(s)
    }

    fn exact() -> MatchFlags {
        MatchFlags::default()
    }

    fn no_wild() -> MatchFlags {
        MatchFlags {
            allow_wildcard: false,
            ..MatchFlags::default()
        }
    }

    #[test]
    fn test_empty_condition_matches_only_empty_value() {
        let c = Condition::Empty;
        assert!(matches("", &c, MatchMode::Exact, exact(), FieldRole::Plain));
        assert!(!matches("x", &c, MatchMode::Exact, exact(), FieldRole::Plain));
        assert!(!matches("x", &c, MatchMode::Exact, exact(), FieldRole::NameLike));
    }

    #[test]
    fn test_parse_negative_all_quote_styles() {
        let split = parse_negative(r#"破壊 -"無効" -'除外'　-`墓地`"#);
        assert_eq!(split.positive, "破壊");
        assert_eq!(split.negatives, vec!["無効", "除外", "墓地"]);
    }

    #[test]
    fn test_parse_negative_requires_delimiter() {
        // hyphen in the middle of a word is not a negative token
        let split = parse_negative(r#"abc-"def""#);
        assert!(split.negatives.is_empty());
        assert_eq!(split.positive, r#"abc-"def""#);
    }

    #[test]
    fn test_negative_text_search() {
        let c = cond(r#"破壊 -"無効""#);
        let role = FieldRole::FreeText;
        assert!(matches("モンスターを破壊する。", &c, MatchMode::Exact, exact(), role));
        assert!(!matches("破壊を無効にする。", &c, MatchMode::Exact, exact(), role));
        assert!(!matches("何もしない。", &c, MatchMode::Exact, exact(), role));
    }

    #[test]
    fn test_pure_negative_condition() {
        let c = cond(r#"-"無効""#);
        let role = FieldRole::FreeText;
        assert!(matches("破壊する。", &c, MatchMode::Exact, exact(), role));
        assert!(!matches("無効にする。", &c, MatchMode::Exact, exact(), role));
    }

    #[test]
    fn test_negative_runs_on_raw_value_for_names() {
        // the phrase contains a symbol that normalization would strip
        let c = cond(r#"青眼* -"の白""#);
        let role = FieldRole::NameLike;
        assert!(!matches("青眼の白龍", &c, MatchMode::Exact, exact(), role));
        assert!(matches("青眼の究極竜", &c, MatchMode::Exact, exact(), role));
    }

    #[test]
    fn test_wildcard_name_is_anchored_and_normalized() {
        let c = cond("ブルーアイズ*");
        let role = FieldRole::NameLike;
        assert!(matches("ブルーアイズ・ホワイト・ドラゴン", &c, MatchMode::Exact, exact(), role));
        assert!(matches("ぶるーあいず・ほわいと", &c, MatchMode::Exact, exact(), role));
        assert!(!matches("真のブルーアイズ", &c, MatchMode::Exact, exact(), role));
    }

    #[test]
    fn test_wildcard_text_is_unanchored_and_raw() {
        let c = cond("特殊*できない");
        let role = FieldRole::FreeText;
        assert!(matches("このカードは特殊召喚できない。", &c, MatchMode::Exact, exact(), role));
        assert!(!matches("このカードは通常召喚できない。", &c, MatchMode::Exact, exact(), role));
    }

    #[test]
    fn test_wildcard_escapes_regex_metacharacters() {
        let c = cond("No.39*");
        let role = FieldRole::FreeText;
        assert!(matches("No.39 希望皇ホープ", &c, MatchMode::Exact, exact(), role));
        assert!(!matches("No939 希望皇ホープ", &c, MatchMode::Exact, exact(), role));
    }

    #[test]
    fn test_wildcard_disabled_is_literal() {
        let c = cond("青眼*");
        let role = FieldRole::FreeText;
        assert!(!matches("青眼の白龍", &c, MatchMode::Exact, no_wild(), role));
        assert!(matches("「青眼*」", &c, MatchMode::Exact, no_wild(), role));
    }

    #[test]
    fn test_wildcard_ignored_for_plain_fields() {
        let c = cond("40*");
        assert!(!matches("4007", &c, MatchMode::Exact, exact(), FieldRole::Plain));
        assert!(matches("40*", &c, MatchMode::Exact, exact(), FieldRole::Plain));
    }

    #[test]
    fn test_wildcard_superset_of_exact() {
        let names = ["青眼の白龍", "青眼の究極竜", "ブラック・マジシャン", "青眼の亜白龍"];
        let role = FieldRole::NameLike;
        let exact_hits: Vec<_> = names
            .iter()
            .filter(|n| matches(n, &cond("青眼の白龍"), MatchMode::Exact, exact(), role))
            .collect();
        let wild_hits: Vec<_> = names
            .iter()
            .filter(|n| matches(n, &cond("青眼の*白龍"), MatchMode::Exact, exact(), role))
            .collect();
        assert!(exact_hits.iter().all(|n| wild_hits.contains(n)));
        assert_eq!(wild_hits.len(), 2);
    }

    #[test]
    fn test_normalized_name_equality() {
        let role = FieldRole::NameLike;
        assert!(matches("青眼の白龍", &cond("青眼の白竜"), MatchMode::Exact, exact(), role));
        assert!(matches("ブラック・マジシャン", &cond("ぶらっく まじしゃん"), MatchMode::Exact, exact(), role));
        assert!(!matches("ブラック・マジシャン・ガール", &cond("ブラック・マジシャン"), MatchMode::Exact, exact(), role));
    }

    #[test]
    fn test_normalized_name_partial() {
        let role = FieldRole::NameLike;
        let flags = no_wild();
        assert!(matches("ブラック・マジシャン・ガール", &cond("マジシャン"), MatchMode::Partial, flags, role));
        assert!(!matches("青眼の白龍", &cond("マジシャン"), MatchMode::Partial, flags, role));
    }

    #[test]
    fn test_cached_key_is_used() {
        let m = FieldMatcher::compile(&cond("キー"), FieldRole::NameLike, MatchMode::Exact, exact());
        // value would normalize to something else; the cached key wins
        assert!(m.matches("anything", Some("キー")));
        assert!(!m.matches("キー", Some("other")));
    }

    #[test]
    fn test_fuzzy_name() {
        let flags = MatchFlags {
            fuzzy: true,
            ..MatchFlags::default()
        };
        let role = FieldRole::NameLike;
        assert!(matches("ブラック・マジシャン", &cond("ブラックマジシヤン"), MatchMode::Exact, flags, role));
        assert!(!matches("青眼の白龍", &cond("ブラックマジシャン"), MatchMode::Exact, flags, role));
        // fuzzy never applies outside name-like fields
        assert!(!matches("3000", &cond("3001"), MatchMode::Exact, flags, FieldRole::Plain));
    }

    #[test]
    fn test_fuzzy_without_normalization() {
        let flags = MatchFlags {
            normalize: false,
            allow_wildcard: false,
            fuzzy: true,
        };
        assert!(matches("Dark Magician", &cond("Dark Magican"), MatchMode::Exact, flags, FieldRole::NameLike));
    }

    #[test]
    fn test_plain_fields() {
        let role = FieldRole::Plain;
        assert!(matches("4007", &cond("4007"), MatchMode::Exact, exact(), role));
        assert!(!matches("14007", &cond("4007"), MatchMode::Exact, exact(), role));
        assert!(matches("14007", &cond("4007"), MatchMode::Partial, no_wild(), role));
    }

    #[test]
    fn test_free_text_is_case_sensitive_containment() {
        let role = FieldRole::FreeText;
        assert!(matches("Draw 1 card.", &cond("Draw"), MatchMode::Exact, exact(), role));
        assert!(!matches("Draw 1 card.", &cond("draw"), MatchMode::Exact, exact(), role));
    }
}
