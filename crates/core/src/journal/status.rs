//! Journal entry lifecycle status.

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Journal entry status.
///
/// `Draft -> Posted -> Voided`; no other transitions exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    /// Editable, not yet part of the books.
    Draft,
    /// Balanced and locked.
    Posted,
    /// Reversed; rows kept for audit.
    Voided,
}

impl EntryStatus {
    /// Stored/wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Posted => "POSTED",
            Self::Voided => "VOIDED",
        }
    }

    /// Whether lines and header may still change.
    #[must_use]
    pub const fn is_editable(self) -> bool {
        matches!(self, Self::Draft)
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntryStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DRAFT" => Ok(Self::Draft),
            "POSTED" => Ok(Self::Posted),
            "VOIDED" => Ok(Self::Voided),
            _ => Err(LedgerError::invalid_field("status", format!("unknown status '{s}'"))),
        }
    }
}
