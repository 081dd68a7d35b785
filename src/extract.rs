// 🧩 Pattern Extractor - card references embedded in prose
//
// Grammars, highest priority first:
//   {{Display|Query}}   ById      already id-qualified
//   《Name》             Exact     exact name, no wildcard
//   {Name}              Flexible  wildcard + normalization
//
// A span claimed by a higher grammar is invisible to lower ones. Without this,
// every `{{a|b}}` would also read as the Flexible query `{a|b`.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PatternKind {
    ById,
    Exact,
    Flexible,
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::ById => "byId",
            PatternKind::Exact => "exact",
            PatternKind::Flexible => "flexible",
        }
    }
}

impl std::fmt::Display for PatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reference found in the text. `start` is a byte offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedPattern {
    pub raw: String,
    pub kind: PatternKind,
    pub query: String,
    pub start: usize,
    /// ById only: the name written before the `|`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl ExtractedPattern {
    pub fn end(&self) -> usize {
        self.start + self.raw.len()
    }

    pub fn span(&self) -> Range<usize> {
        self.start..self.end()
    }
}

// ============================================================================
// GRAMMARS
// ============================================================================

static NOT_FOUND_MARKER: OnceLock<Regex> = OnceLock::new();
static AMBIGUOUS_MARKER: OnceLock<Regex> = OnceLock::new();
static BY_ID: OnceLock<Regex> = OnceLock::new();
static EXACT: OnceLock<Regex> = OnceLock::new();
static FLEXIBLE: OnceLock<Regex> = OnceLock::new();

fn not_found_marker() -> &'static Regex {
    NOT_FOUND_MARKER.get_or_init(|| Regex::new(r"\{\{NOTFOUND_`[^`]*`\}\}").expect("static marker pattern is valid"))
}

fn ambiguous_marker() -> &'static Regex {
    AMBIGUOUS_MARKER
        .get_or_init(|| Regex::new(r"\{\{`[^`]*`(?:_`[^`]*`)+\}\}").expect("static marker pattern is valid"))
}

fn by_id() -> &'static Regex {
    BY_ID.get_or_init(|| Regex::new(r"\{\{([^|{}]+)\|([^}]+)\}\}").expect("static by-id pattern is valid"))
}

fn exact() -> &'static Regex {
    EXACT.get_or_init(|| Regex::new(r"《([^》]+)》").expect("static exact pattern is valid"))
}

fn flexible() -> &'static Regex {
    FLEXIBLE.get_or_init(|| Regex::new(r"\{([^}]+)\}").expect("static flexible pattern is valid"))
}

// ============================================================================
// EXTRACTION
// ============================================================================

fn overlaps(claimed: &[Range<usize>], span: &Range<usize>) -> bool {
    claimed.iter().any(|c| c.start < span.end && span.start < c.end)
}

/// Byte index of the char after the one starting at `at`
fn next_boundary(text: &str, at: usize) -> usize {
    at + text[at..].chars().next().map_or(1, char::len_utf8)
}

/// Walk every match of `re` that does not touch a claimed span. `accept`
/// returns false to reject a match (e.g. empty body); rejected and
/// overlapping matches are retried one char after their start.
fn scan<F>(text: &str, re: &Regex, claimed: &mut Vec<Range<usize>>, mut accept: F)
where
    F: FnMut(&Captures) -> bool,
{
    let mut pos = 0;
    while pos < text.len() {
        let Some(caps) = re.captures_at(text, pos) else {
            break;
        };
        let Some(whole) = caps.get(0) else {
            break;
        };
        let span = whole.range();

        if overlaps(claimed, &span) || !accept(&caps) {
            pos = next_boundary(text, span.start);
            continue;
        }

        claimed.push(span.clone());
        pos = span.end;
    }
}

fn group(caps: &Captures, i: usize) -> String {
    caps.get(i).map_or("", |m| m.as_str()).trim().to_string()
}

/// All references in `text`, in document order
pub fn extract(text: &str) -> Vec<ExtractedPattern> {
    let mut claimed: Vec<Range<usize>> = Vec::new();
    let mut patterns: Vec<ExtractedPattern> = Vec::new();

    // Resolver output fed back in stays untouched
    for marker in [not_found_marker(), ambiguous_marker()] {
        scan(text, marker, &mut claimed, |_| true);
    }

    scan(text, by_id(), &mut claimed, |caps| {
        let (display, query) = (group(caps, 1), group(caps, 2));
        if display.is_empty() || query.is_empty() {
            return false;
        }
        patterns.push(pattern_from(caps, PatternKind::ById, query, Some(display)));
        true
    });

    for (re, kind) in [(exact(), PatternKind::Exact), (flexible(), PatternKind::Flexible)] {
        scan(text, re, &mut claimed, |caps| {
            let query = group(caps, 1);
            if query.is_empty() {
                return false;
            }
            patterns.push(pattern_from(caps, kind, query, None));
            true
        });
    }

    patterns.sort_by_key(|p| p.start);
    patterns
}

fn pattern_from(caps: &Captures, kind: PatternKind, query: String, display_name: Option<String>) -> ExtractedPattern {
    let whole = caps.get(0).map_or(("", 0), |m| (m.as_str(), m.start()));
    ExtractedPattern {
        raw: whole.0.to_string(),
        kind,
        query,
        start: whole.1,
        display_name,
    }
}

// ============================================================================
// TESTS
// ============================================================================
