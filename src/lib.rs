// Card Resolver - Core Library
// Card-name matching, filter queries and reference rewriting over flat card tables

pub mod error;      // Error kinds
pub mod fields;     // Card column schema
pub mod card;       // Card records + TSV loading
pub mod schema;     // Shape Layer - record validation
pub mod store;      // Loaded-once card snapshot
pub mod normalize;  // Canonical name keys
pub mod fuzzy;      // Levenshtein matching
pub mod matcher;    // Field matcher
pub mod filter;     // Filter shape
pub mod query;      // Query executor + projection
pub mod extract;    // Reference extraction
pub mod resolve;    // Reference rewriting
pub mod bulk;       // Batched queries
pub mod config;     // Configuration

// Re-export commonly used types
pub use error::{Result, SearchError};
pub use fields::{CardField, FieldRole};
pub use card::{CardDetail, CardRecord, load_cards_tsv, load_details_tsv};
pub use schema::{SchemaValidator, Severity, ValidationError, ValidationResult};
pub use store::{CardCollection, CardStore, DataSource};
pub use normalize::normalize;
pub use fuzzy::{fuzzy_match, levenshtein_distance};
pub use matcher::{FieldMatcher, MatchFlags, MatchMode, parse_negative};
pub use filter::{Combinator, Condition, FieldFilter, Filter};
pub use query::{
    Projection, ProjectedRow, QueryExecutor, QueryOptions, QueryOutcome, QueryRows,
    SortOrder, SortSpec,
};
pub use extract::{ExtractedPattern, PatternKind, extract};
pub use resolve::{
    CardSearch, ExecutorSearch, PatternMatch, PatternOutcome, RenderStyle,
    ReplacementOutcome, ReplacementReport, ReplacementResolver, search_patterns,
};
pub use bulk::{BulkQuery, BulkResult, run_bulk};
pub use config::SearchConfig;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
