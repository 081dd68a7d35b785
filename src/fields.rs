// 🏛️ Card Field Schema
// The fixed set of columns a card record can carry, and how each one is matched

use serde::{Deserialize, Serialize};

// ============================================================================
// FIELD ROLE
// ============================================================================

/// How a field takes part in matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldRole {
    /// Card names: normalization, fuzzy matching, alternate-reading fallback
    NameLike,
    /// Effect / pendulum / supplement text: substring, wildcard, negative search
    FreeText,
    /// Everything else: exact or partial string compare
    Plain,
}

// ============================================================================
// CARD FIELD
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CardField {
    // Identity
    CardType,
    Name,
    Ruby,
    CardId,
    Ciid,
    Imgs,
    Text,
    // Monster classification
    Attribute,
    LevelType,
    LevelValue,
    Race,
    MonsterTypes,
    Atk,
    Def,
    LinkMarkers,
    PendulumScale,
    PendulumText,
    IsExtraDeck,
    // Spell / trap
    SpellEffectType,
    TrapEffectType,
    // Detail table (merged by card id)
    SupplementInfo,
    SupplementDate,
    PendulumSupplementInfo,
    PendulumSupplementDate,
}

impl CardField {
    /// Every field, in column order
    pub const ALL: [CardField; 24] = [
        CardField::CardType,
        CardField::Name,
        CardField::Ruby,
        CardField::CardId,
        CardField::Ciid,
        CardField::Imgs,
        CardField::Text,
        CardField::Attribute,
        CardField::LevelType,
        CardField::LevelValue,
        CardField::Race,
        CardField::MonsterTypes,
        CardField::Atk,
        CardField::Def,
        CardField::LinkMarkers,
        CardField::PendulumScale,
        CardField::PendulumText,
        CardField::IsExtraDeck,
        CardField::SpellEffectType,
        CardField::TrapEffectType,
        CardField::SupplementInfo,
        CardField::SupplementDate,
        CardField::PendulumSupplementInfo,
        CardField::PendulumSupplementDate,
    ];

    /// Column name as it appears in the TSV header and in filters
    pub fn as_str(&self) -> &'static str {
        match self {
            CardField::CardType => "cardType",
            CardField::Name => "name",
            CardField::Ruby => "ruby",
            CardField::CardId => "cardId",
            CardField::Ciid => "ciid",
            CardField::Imgs => "imgs",
            CardField::Text => "text",
            CardField::Attribute => "attribute",
            CardField::LevelType => "levelType",
            CardField::LevelValue => "levelValue",
            CardField::Race => "race",
            CardField::MonsterTypes => "monsterTypes",
            CardField::Atk => "atk",
            CardField::Def => "def",
            CardField::LinkMarkers => "linkMarkers",
            CardField::PendulumScale => "pendulumScale",
            CardField::PendulumText => "pendulumText",
            CardField::IsExtraDeck => "isExtraDeck",
            CardField::SpellEffectType => "spellEffectType",
            CardField::TrapEffectType => "trapEffectType",
            CardField::SupplementInfo => "supplementInfo",
            CardField::SupplementDate => "supplementDate",
            CardField::PendulumSupplementInfo => "pendulumSupplementInfo",
            CardField::PendulumSupplementDate => "pendulumSupplementDate",
        }
    }

    /// Look up a field by its column name
    pub fn from_name(name: &str) -> Option<CardField> {
        CardField::ALL.iter().copied().find(|f| f.as_str() == name)
    }

    pub fn role(&self) -> FieldRole {
        match self {
            CardField::Name => FieldRole::NameLike,
            CardField::Text
            | CardField::PendulumText
            | CardField::SupplementInfo
            | CardField::PendulumSupplementInfo => FieldRole::FreeText,
            _ => FieldRole::Plain,
        }
    }

    /// Fields sorted as parsed integers
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            CardField::CardId
                | CardField::Atk
                | CardField::Def
                | CardField::LevelValue
                | CardField::PendulumScale
        )
    }

    /// Fields that come from the detail table rather than the card table
    pub fn is_detail(&self) -> bool {
        matches!(
            self,
            CardField::SupplementInfo
                | CardField::SupplementDate
                | CardField::PendulumSupplementInfo
                | CardField::PendulumSupplementDate
        )
    }

    /// Comma-separated list of every column name (for error messages)
    pub fn available_names() -> String {
        CardField::ALL
            .iter()
            .map(|f| f.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for CardField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// TESTS
// ============================================================================
