// 📐 Shape Layer - Card Record Validation
// Checks loaded rows before they enter the collection

use crate::card::CardRecord;
use crate::fields::CardField;

/// Card types the data set is expected to contain
pub const KNOWN_CARD_TYPES: &[&str] = &["monster", "spell", "trap"];

// ============================================================================
// VALIDATION RESULT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Row cannot be used; it is skipped at load time
    Reject,
    /// Row is kept but looks suspicious
    Warn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: CardField,
    pub message: String,
    pub severity: Severity,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            Severity::Reject => "reject",
            Severity::Warn => "warn",
        };
        write!(f, "[{}] {}: {}", level, self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// True when any error in the list forces the row out
pub fn is_rejected(errors: &[ValidationError]) -> bool {
    errors.iter().any(|e| e.severity == Severity::Reject)
}

// ============================================================================
// SCHEMA VALIDATOR
// ============================================================================

pub struct SchemaValidator {
    required: Vec<CardField>,
}

impl SchemaValidator {
    pub fn new() -> Self {
        SchemaValidator {
            required: vec![CardField::CardId, CardField::CardType],
        }
    }

    /// Validate one card record
    pub fn validate(&self, card: &CardRecord) -> ValidationResult {
        let mut errors = Vec::new();

        for field in &self.required {
            if !card.has(*field) {
                errors.push(ValidationError {
                    field: *field,
                    message: "Required field is empty".to_string(),
                    severity: Severity::Reject,
                });
            }
        }

        if !card.has(CardField::Name) {
            errors.push(ValidationError {
                field: CardField::Name,
                message: "Card has no name".to_string(),
                severity: Severity::Warn,
            });
        }

        let card_type = card.card_type();
        if !card_type.is_empty() && !KNOWN_CARD_TYPES.contains(&card_type) {
            errors.push(ValidationError {
                field: CardField::CardType,
                message: format!("Unknown card type \"{}\"", card_type),
                severity: Severity::Warn,
            });
        }

        // Numeric columns may hold "?" (unknown stats); anything else must lead with a digit
        for field in CardField::ALL.iter().filter(|f| f.is_numeric()) {
            let value = card.get(*field);
            if value.is_empty() || value == "?" {
                continue;
            }
            if !value.trim_start().starts_with(|c: char| c.is_ascii_digit() || c == '-') {
                errors.push(ValidationError {
                    field: *field,
                    message: format!("Expected a number, got \"{}\"", value),
                    severity: Severity::Warn,
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
