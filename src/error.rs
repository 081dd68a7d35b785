// 🚨 Error kinds for the matching core
// Structural and configuration problems only. A reference that is not found
// or is ambiguous is an outcome, never an error.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("Invalid filter: {0}")]
    InvalidFilterSyntax(String),

    #[error("Conflicting mode flags: {0}")]
    ConflictingModeFlags(String),

    #[error("Regex literals (/.../) are not supported: field `{field}`")]
    UnsupportedLiteral { field: String },

    #[error("Invalid sort field \"{field}\". Available fields: {available}")]
    UnknownSortField { field: String, available: String },

    #[error("Data source unavailable ({path}): {reason}")]
    DataSourceUnavailable { path: String, reason: String },

    #[error("Not implemented: {0}")]
    UnimplementedFeature(String),
}

impl SearchError {
    pub fn invalid(message: impl Into<String>) -> Self {
        SearchError::InvalidFilterSyntax(message.into())
    }

    pub fn unavailable(path: impl Into<String>, reason: impl ToString) -> Self {
        SearchError::DataSourceUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
