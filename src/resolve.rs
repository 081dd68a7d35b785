// 🔁 Replacement Resolver - rewrite references into id-qualified form
//
// text → extract → dedupe (kind, query) → one search per unique pattern
//      → classify each occurrence → splice edits back-to-front
//
// Output tokens:
//   resolved    {{Name|Id}}                      (or 《Name》)
//   ambiguous   {{`Query`_`Name1|Id1`_`Name2|Id2`}}
//   not found   {{NOTFOUND_`Query`}}

use crate::card::CardRecord;
use crate::error::{Result, SearchError};
use crate::extract::{extract, ExtractedPattern, PatternKind};
use crate::fields::CardField;
use crate::filter::Filter;
use crate::matcher::MatchFlags;
use crate::query::{QueryExecutor, QueryOptions};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::ops::Range;
use tracing::{debug, info, warn};

// ============================================================================
// SEARCH SEAM
// ============================================================================

/// Look up the cards for one extracted reference
pub trait CardSearch {
    fn search(&self, kind: PatternKind, query: &str) -> Result<Vec<CardRecord>>;
}

impl<F> CardSearch for F
where
    F: Fn(PatternKind, &str) -> Result<Vec<CardRecord>>,
{
    fn search(&self, kind: PatternKind, query: &str) -> Result<Vec<CardRecord>> {
        self(kind, query)
    }
}

/// [`CardSearch`] backed by the query executor
pub struct ExecutorSearch<'s> {
    executor: QueryExecutor<'s>,
}

impl<'s> ExecutorSearch<'s> {
    pub fn new(executor: QueryExecutor<'s>) -> Self {
        ExecutorSearch { executor }
    }

    /// Filter and options used for one reference kind
    pub fn query_for(kind: PatternKind, query: &str) -> (Filter, QueryOptions) {
        let (field, allow_wildcard) = match kind {
            PatternKind::ById => (CardField::CardId, false),
            PatternKind::Exact => (CardField::Name, false),
            PatternKind::Flexible => (CardField::Name, true),
        };
        let options = QueryOptions::default()
            .with_flags(MatchFlags {
                normalize: true,
                allow_wildcard,
                fuzzy: false,
            })
            .with_max(None);
        (Filter::new().with_value(field, query), options)
    }
}

impl CardSearch for ExecutorSearch<'_> {
    fn search(&self, kind: PatternKind, query: &str) -> Result<Vec<CardRecord>> {
        if kind == PatternKind::ById {
            let collection = self.executor.store().load()?;
            return Ok(collection.by_id(query).into_iter().cloned().collect());
        }

        let (filter, options) = Self::query_for(kind, query);
        match self.executor.execute(&filter, &options) {
            Ok(outcome) => Ok(outcome.records),
            // A reference body the query layer refuses is just a reference with no matches
            Err(e @ (SearchError::UnsupportedLiteral { .. } | SearchError::InvalidFilterSyntax(_))) => {
                warn!("{} {:?} not searchable: {}", kind, query, e);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}

// ============================================================================
// EXTRACT + SEARCH
// ============================================================================

/// One unique (kind, query) and what it matched
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternMatch {
    /// First occurrence in the text
    pub pattern: ExtractedPattern,
    pub results: Vec<CardRecord>,
}

/// Search each unique (kind, query) once, in first-seen order
pub fn search_patterns(patterns: &[ExtractedPattern], search: &dyn CardSearch) -> Result<Vec<PatternMatch>> {
    let mut seen: HashSet<(PatternKind, &str)> = HashSet::new();
    let mut matches = Vec::new();

    for pattern in patterns {
        if !seen.insert((pattern.kind, pattern.query.as_str())) {
            continue;
        }
        let results = search.search(pattern.kind, &pattern.query)?;
        debug!("{} {:?}: {} result(s)", pattern.kind, pattern.query, results.len());
        matches.push(PatternMatch {
            pattern: pattern.clone(),
            results,
        });
    }

    Ok(matches)
}

// ============================================================================
// REPORT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ReplacementOutcome {
    Resolved,
    Ambiguous,
    NotFound,
    AlreadyQualified,
    Corrected,
}

impl ReplacementOutcome {
    pub fn is_unresolved(&self) -> bool {
        matches!(self, ReplacementOutcome::Ambiguous | ReplacementOutcome::NotFound)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternOutcome {
    pub original: String,
    pub replacement: String,
    pub outcome: ReplacementOutcome,
    pub kind: PatternKind,
    pub start: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplacementReport {
    pub text: String,
    pub has_unresolved: bool,
    pub warnings: Vec<String>,
    /// Document order
    pub outcomes: Vec<PatternOutcome>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RenderStyle {
    /// `{{Name|Id}}`
    #[default]
    IdQualified,
    /// `《Name》`
    ExactName,
}

// ============================================================================
// RENDERING
// ============================================================================

fn render_qualified(card: &CardRecord) -> String {
    format!("{{{{{}|{}}}}}", card.name(), card.card_id())
}

fn render_resolved(card: &CardRecord, style: RenderStyle) -> String {
    match style {
        RenderStyle::IdQualified => render_qualified(card),
        RenderStyle::ExactName => format!("《{}》", card.name()),
    }
}

fn render_ambiguous(query: &str, cards: &[CardRecord]) -> String {
    let candidates = cards
        .iter()
        .map(|c| format!("`{}|{}`", c.name(), c.card_id()))
        .collect::<Vec<_>>()
        .join("_");
    format!("{{{{`{}`_{}}}}}", query, candidates)
}

fn render_not_found(query: &str) -> String {
    format!("{{{{NOTFOUND_`{}`}}}}", query)
}

/// Apply (span, replacement) edits back-to-front into a fresh buffer.
/// Spans index the original text and must not overlap.
fn apply_edits(text: &str, mut edits: Vec<(Range<usize>, String)>) -> String {
    edits.sort_by(|a, b| b.0.start.cmp(&a.0.start));

    let mut pieces: Vec<&str> = Vec::with_capacity(edits.len() * 2 + 1);
    let mut tail_end = text.len();
    for (span, replacement) in &edits {
        pieces.push(&text[span.end..tail_end]);
        pieces.push(replacement);
        tail_end = span.start;
    }
    pieces.push(&text[..tail_end]);
    pieces.reverse();
    pieces.concat()
}

// ============================================================================
// RESOLVER
// ============================================================================

const UNRESOLVED_WARNING: &str = "Text contains unresolved references that require manual review";

#[derive(Debug, Clone, Default)]
pub struct ReplacementResolver {
    style: RenderStyle,
}

impl ReplacementResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style(mut self, style: RenderStyle) -> Self {
        self.style = style;
        self
    }

    /// Extract the references from `text` and resolve them
    pub fn resolve_text(&self, text: &str, search: &dyn CardSearch) -> Result<ReplacementReport> {
        let patterns = extract(text);
        self.resolve(text, &patterns, search)
    }

    pub fn resolve(
        &self,
        text: &str,
        patterns: &[ExtractedPattern],
        search: &dyn CardSearch,
    ) -> Result<ReplacementReport> {
        let mut patterns = patterns.to_vec();
        patterns.sort_by_key(|p| p.start);
        check_spans(text, &patterns)?;

        let results: HashMap<(PatternKind, String), Vec<CardRecord>> = search_patterns(&patterns, search)?
            .into_iter()
            .map(|m| ((m.pattern.kind, m.pattern.query), m.results))
            .collect();

        let mut warnings = Vec::new();
        let mut outcomes = Vec::with_capacity(patterns.len());
        let mut edits = Vec::new();

        for pattern in &patterns {
            let cards = results
                .get(&(pattern.kind, pattern.query.clone()))
                .map(Vec::as_slice)
                .unwrap_or_default();

            let (replacement, outcome) = match pattern.kind {
                PatternKind::ById => classify_by_id(pattern, cards, &mut warnings),
                _ => self.classify_by_name(pattern, cards),
            };

            if replacement != pattern.raw {
                edits.push((pattern.span(), replacement.clone()));
            }
            outcomes.push(PatternOutcome {
                original: pattern.raw.clone(),
                replacement,
                outcome,
                kind: pattern.kind,
                start: pattern.start,
            });
        }

        let text = apply_edits(text, edits);

        let count = |kind: ReplacementOutcome| outcomes.iter().filter(|o| o.outcome == kind).count();
        let not_found = count(ReplacementOutcome::NotFound);
        let ambiguous = count(ReplacementOutcome::Ambiguous);
        let has_unresolved = not_found + ambiguous > 0;

        if has_unresolved {
            warnings.push(UNRESOLVED_WARNING.to_string());
            if not_found > 0 {
                warnings.push(format!("Found {} pattern(s) with no matches (NOTFOUND_*)", not_found));
            }
            if ambiguous > 0 {
                warnings.push(format!(
                    "Found {} pattern(s) with multiple matches - please select the correct one",
                    ambiguous
                ));
            }
        }

        info!(
            "resolved {} reference(s): {} not found, {} ambiguous",
            outcomes.len(),
            not_found,
            ambiguous
        );

        Ok(ReplacementReport {
            text,
            has_unresolved,
            warnings,
            outcomes,
        })
    }

    fn classify_by_name(&self, pattern: &ExtractedPattern, cards: &[CardRecord]) -> (String, ReplacementOutcome) {
        match cards {
            [] => (render_not_found(&pattern.query), ReplacementOutcome::NotFound),
            [card] => (render_resolved(card, self.style), ReplacementOutcome::Resolved),
            many => (render_ambiguous(&pattern.query, many), ReplacementOutcome::Ambiguous),
        }
    }
}

/// Patterns must point at their own text and must not overlap
fn check_spans(text: &str, patterns: &[ExtractedPattern]) -> Result<()> {
    let mut previous_end = 0;
    for pattern in patterns {
        if text.get(pattern.span()) != Some(pattern.raw.as_str()) {
            return Err(SearchError::invalid(format!(
                "pattern {:?} does not match the text at offset {}",
                pattern.raw, pattern.start
            )));
        }
        if pattern.start < previous_end {
            return Err(SearchError::invalid(format!(
                "pattern {:?} at offset {} overlaps the previous pattern",
                pattern.raw, pattern.start
            )));
        }
        previous_end = pattern.end();
    }
    Ok(())
}

fn classify_by_id(
    pattern: &ExtractedPattern,
    cards: &[CardRecord],
    warnings: &mut Vec<String>,
) -> (String, ReplacementOutcome) {
    let display = pattern.display_name.as_deref().unwrap_or_default();
    let unchanged = pattern.raw.clone();

    match cards {
        [] => {
            warnings.push(format!("No card found for id {} (written as \"{}\")", pattern.query, display));
            (unchanged, ReplacementOutcome::NotFound)
        }
        [card] if card.name() == display => (unchanged, ReplacementOutcome::AlreadyQualified),
        [card] => {
            warnings.push(format!(
                "Corrected card name for id {}: \"{}\" -> \"{}\"",
                pattern.query,
                display,
                card.name()
            ));
            (render_qualified(card), ReplacementOutcome::Corrected)
        }
        many => {
            warnings.push(format!(
                "Card id {} matches {} records; ids are expected to be unique",
                pattern.query,
                many.len()
            ));
            if many.iter().any(|c| c.name() == display) {
                (unchanged, ReplacementOutcome::AlreadyQualified)
            } else {
                (unchanged, ReplacementOutcome::Ambiguous)
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
