//! Checkout form fields and the error-text vocabulary attributed to them.
//!
//! One table maps each canonical field to the names callers may use for it,
//! the keywords that attribute an error message to it, and the message
//! patterns the storefront is known to render. Every alias lookup in the
//! crate goes through [`FieldId::resolve`] and [`error_mentions_field`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::result::ProbeError;

/// Canonical checkout step one input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldId {
    /// First name input
    FirstName,
    /// Last name input
    LastName,
    /// Postal / zip code input
    PostalCode,
}

struct FieldEntry {
    field: FieldId,
    test_id: &'static str,
    label: &'static str,
    /// Lower-case names accepted from callers
    names: &'static [&'static str],
    /// Substrings that attribute an error message to the field
    keywords: &'static [&'static str],
    /// Known full messages rendered for the field
    patterns: &'static [&'static str],
}

const FIELD_TABLE: [FieldEntry; 3] = [
    FieldEntry {
        field: FieldId::FirstName,
        test_id: "firstName",
        label: "First Name",
        names: &["firstname", "first name", "first_name"],
        keywords: &["First Name", "firstName"],
        patterns: &[
            "First Name is required",
            "Error: First Name is required",
            "Please enter your first name",
            "First name cannot be empty",
        ],
    },
    FieldEntry {
        field: FieldId::LastName,
        test_id: "lastName",
        label: "Last Name",
        names: &["lastname", "last name", "last_name"],
        keywords: &["Last Name", "lastName"],
        patterns: &[
            "Last Name is required",
            "Error: Last Name is required",
            "Please enter your last name",
            "Last name cannot be empty",
        ],
    },
    FieldEntry {
        field: FieldId::PostalCode,
        test_id: "postalCode",
        label: "Postal Code",
        names: &[
            "postalcode",
            "postal code",
            "postal_code",
            "zipcode",
            "zip code",
            "zip",
        ],
        keywords: &["Postal Code", "Zip Code", "postalCode"],
        patterns: &[
            "Postal Code is required",
            "Error: Postal Code is required",
            "Zip Code is required",
            "Error: Zip Code is required",
            "Please enter your postal code",
        ],
    },
];

impl FieldId {
    /// All fields in form order
    pub const ALL: [Self; 3] = [Self::FirstName, Self::LastName, Self::PostalCode];

    fn entry(self) -> &'static FieldEntry {
        match self {
            Self::FirstName => &FIELD_TABLE[0],
            Self::LastName => &FIELD_TABLE[1],
            Self::PostalCode => &FIELD_TABLE[2],
        }
    }

    /// Value of the input's `data-test` attribute
    #[must_use]
    pub fn test_id(self) -> &'static str {
        self.entry().test_id
    }

    /// Human label as rendered on the page
    #[must_use]
    pub fn label(self) -> &'static str {
        self.entry().label
    }

    /// Keywords that attribute an error message to this field
    #[must_use]
    pub fn error_keywords(self) -> &'static [&'static str] {
        self.entry().keywords
    }

    /// Known error messages for this field
    #[must_use]
    pub fn error_patterns(self) -> &'static [&'static str] {
        self.entry().patterns
    }

    /// Resolve a caller-supplied field name ("zip code", "postalCode", ...)
    #[must_use]
    pub fn resolve(name: &str) -> Option<Self> {
        let normalized = name.trim().to_lowercase();
        FIELD_TABLE
            .iter()
            .find(|entry| entry.names.contains(&normalized.as_str()))
            .map(|entry| entry.field)
    }

    /// Whether `message` mentions any keyword of this field (case-insensitive)
    #[must_use]
    pub fn is_mentioned_in(self, message: &str) -> bool {
        let message = message.to_lowercase();
        self.error_keywords()
            .iter()
            .any(|keyword| message.contains(&keyword.to_lowercase()))
    }

    /// Whether `message` contains one of the known error patterns for this field
    #[must_use]
    pub fn matches_error_message(self, message: &str) -> bool {
        let normalized = message.trim().to_lowercase();
        if normalized.is_empty() {
            return false;
        }
        let matched = self
            .error_patterns()
            .iter()
            .find(|pattern| normalized.contains(&pattern.to_lowercase()));
        match matched {
            Some(pattern) => {
                tracing::info!(field = %self, pattern, message, "matched error pattern");
                true
            }
            None => {
                tracing::warn!(field = %self, message, "no known error pattern matched");
                false
            }
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FieldId {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::resolve(s).ok_or_else(|| ProbeError::Config {
            message: format!("unknown checkout field '{s}'"),
        })
    }
}

/// Whether `error_text` is attributed to the field called `field_name`.
///
/// Known names go through the keyword table; anything else falls back to a
/// case-insensitive substring match on the name itself.
#[must_use]
pub fn error_mentions_field(field_name: &str, error_text: &str) -> bool {
    match FieldId::resolve(field_name) {
        Some(field) => field.is_mentioned_in(error_text),
        None => error_text
            .to_lowercase()
            .contains(&field_name.trim().to_lowercase()),
    }
}
