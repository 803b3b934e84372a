//! Locator abstraction for element selection.
//!
//! A [`Locator`] is one way of finding a rendered element; a [`LocatorSet`]
//! is the ordered list of alternative renderings of one logical signal.
//!
//! # Design Philosophy
//!
//! - **Immutable**: a locator never changes once built
//! - **Non-empty sets**: every signal has at least one candidate
//! - **Order is priority**: presence uses every candidate, text extraction
//!   walks them front to back

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::result::{ProbeError, ProbeResult};

/// Selector language of a locator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorKind {
    /// CSS selector (e.g., ".error-message-container h3")
    Css,
    /// XPath selector
    XPath,
    /// Test ID selector (`data-test` attribute)
    TestId,
}

impl SelectorKind {
    /// Short tag used in logs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::XPath => "xpath",
            Self::TestId => "test-id",
        }
    }
}

/// A selector expression plus the language it is written in
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    kind: SelectorKind,
    expression: String,
}

impl Locator {
    /// Create a CSS locator
    #[must_use]
    pub fn css(expression: impl Into<String>) -> Self {
        Self {
            kind: SelectorKind::Css,
            expression: expression.into(),
        }
    }

    /// Create an XPath locator
    #[must_use]
    pub fn xpath(expression: impl Into<String>) -> Self {
        Self {
            kind: SelectorKind::XPath,
            expression: expression.into(),
        }
    }

    /// Create a `data-test` locator
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self {
            kind: SelectorKind::TestId,
            expression: id.into(),
        }
    }

    /// Selector language
    #[must_use]
    pub const fn kind(&self) -> SelectorKind {
        self.kind
    }

    /// Raw selector expression
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// CSS form of the locator, if it has one.
    ///
    /// Test IDs expand to an attribute selector; XPath has no CSS form.
    #[must_use]
    pub fn to_css(&self) -> Option<String> {
        match self.kind {
            SelectorKind::Css => Some(self.expression.clone()),
            SelectorKind::TestId => Some(format!("[data-test='{}']", self.expression)),
            SelectorKind::XPath => None,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.expression)
    }
}

/// Ordered, non-empty list of candidate locators for one signal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocatorSet {
    name: String,
    candidates: Vec<Locator>,
}

impl LocatorSet {
    /// Create a locator set from candidates
    ///
    /// # Errors
    ///
    /// Returns error if `candidates` is empty
    pub fn new(name: impl Into<String>, candidates: Vec<Locator>) -> ProbeResult<Self> {
        let name = name.into();
        if candidates.is_empty() {
            return Err(ProbeError::Config {
                message: format!("locator set '{name}' needs at least one candidate"),
            });
        }
        Ok(Self { name, candidates })
    }

    /// Create a set with exactly one candidate
    #[must_use]
    pub fn single(name: impl Into<String>, locator: Locator) -> Self {
        Self {
            name: name.into(),
            candidates: vec![locator],
        }
    }

    /// Append a rendering variant
    #[must_use]
    pub fn with_candidate(mut self, locator: Locator) -> Self {
        self.candidates.push(locator);
        self
    }

    /// Logical signal name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Candidates in probe order
    #[must_use]
    pub fn candidates(&self) -> &[Locator] {
        &self.candidates
    }

    /// Iterate candidates in probe order
    pub fn iter(&self) -> std::slice::Iter<'_, Locator> {
        self.candidates.iter()
    }

    /// Number of candidates (never zero)
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Always false; present for API symmetry with collections
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

impl<'a> IntoIterator for &'a LocatorSet {
    type Item = &'a Locator;
    type IntoIter = std::slice::Iter<'a, Locator>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}
