//! Locator catalog for checkout step one.
//!
//! Each function returns the candidate renderings of one logical signal,
//! most specific first. Supporting a new rendering means appending a
//! candidate here; detection logic does not change.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::fields::FieldId;
use crate::locator::{Locator, LocatorSet};
use crate::result::ProbeError;

/// Path fragment identifying checkout step one
pub const CHECKOUT_STEP_ONE_PATH: &str = "checkout-step-one.html";

/// Title rendered on checkout step one
pub const CHECKOUT_STEP_ONE_TITLE: &str = "Checkout: Your Information";

/// Path fragment identifying checkout step two
pub const CHECKOUT_STEP_TWO_PATH: &str = "checkout-step-two.html";

/// Title rendered on checkout step two
pub const CHECKOUT_STEP_TWO_TITLE: &str = "Checkout: Overview";

/// Path fragment identifying the cart view
pub const CART_PATH: &str = "cart.html";

/// Title rendered on the cart view
pub const CART_TITLE: &str = "Your Cart";

fn css_set(name: &str, first: &str, rest: &[&str]) -> LocatorSet {
    rest.iter().fold(LocatorSet::single(name, Locator::css(first)), |set, expr| {
        set.with_candidate(Locator::css(*expr))
    })
}

/// Checkout validation error, in extraction priority order
#[must_use]
pub fn checkout_error() -> LocatorSet {
    LocatorSet::single("checkout-error", Locator::test_id("error"))
        .with_candidate(Locator::css(".error-message-container"))
        .with_candidate(Locator::css(".error-message-container .error"))
        .with_candidate(Locator::css(".error"))
        .with_candidate(Locator::css(".error-banner"))
        .with_candidate(Locator::css(".field-error"))
        .with_candidate(Locator::css(".error-message-container h3"))
}

/// Every known error rendering, used to collect all visible messages
#[must_use]
pub fn all_error_messages() -> LocatorSet {
    css_set(
        "all-error-messages",
        ".error-message-container",
        &[
            "[data-test='error']",
            ".error",
            ".error-banner",
            ".field-error",
            ".validation-error",
            ".form-error",
        ],
    )
}

/// Error styling applied to a single input
#[must_use]
pub fn field_error_styling(field: FieldId) -> LocatorSet {
    let id = field.test_id();
    LocatorSet::single(
        format!("{id}-error-styling"),
        Locator::css(format!("[data-test='{id}'].error")),
    )
    .with_candidate(Locator::css(format!("[data-test='{id}']:invalid")))
    .with_candidate(Locator::css(format!("[data-test='{id}'][aria-invalid='true']")))
    .with_candidate(Locator::css(format!("[data-test='{id}'].field-error")))
    .with_candidate(Locator::css(format!("[data-test='{id}'][class*='error']")))
}

/// The input element for a field
#[must_use]
pub fn field_input(field: FieldId) -> LocatorSet {
    LocatorSet::single(
        format!("{}-input", field.test_id()),
        Locator::test_id(field.test_id()),
    )
}

/// Page title element
#[must_use]
pub fn page_title() -> LocatorSet {
    LocatorSet::single("page-title", Locator::test_id("title"))
        .with_candidate(Locator::css(".title"))
}

/// Buttons on checkout step one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormAction {
    /// Continue to checkout step two
    Continue,
    /// Cancel back to the cart
    Cancel,
}

impl FormAction {
    /// Locator set for the button
    #[must_use]
    pub fn locators(self) -> LocatorSet {
        match self {
            Self::Continue => LocatorSet::single("continue", Locator::test_id("continue"))
                .with_candidate(Locator::css("input#continue")),
            Self::Cancel => LocatorSet::single("cancel", Locator::test_id("cancel"))
                .with_candidate(Locator::css("button#cancel")),
        }
    }

    /// Action name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Continue => "continue",
            Self::Cancel => "cancel",
        }
    }
}

impl fmt::Display for FormAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormAction {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "continue" => Ok(Self::Continue),
            "cancel" => Ok(Self::Cancel),
            other => Err(ProbeError::Config {
                message: format!("unknown form action '{other}'"),
            }),
        }
    }
}
