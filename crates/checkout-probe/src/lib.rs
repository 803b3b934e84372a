//! checkout-probe: signal detection for a storefront checkout form
//!
//! Drives checkout step one (first name, last name, postal code), submits
//! it, and reports whether the storefront rejected the data with a
//! validation error or moved on to the next step. Error renderings vary
//! between deployments, so every observable signal is described by an
//! ordered set of candidate locators and probed with deadline-bounded
//! polling.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      CheckoutForm                             │
//! │   NotLoaded → Loaded → Filled → Submitted → Advanced | Error  │
//! ├────────────────────────┬─────────────────────────────────────┤
//! │   SignalDetector       │   FieldStateInspector               │
//! │   (polled, multi-      │   (single-shot value / styling /    │
//! │    candidate)          │    enabled reads)                   │
//! ├────────────────────────┴─────────────────────────────────────┤
//! │   StatePoller          LocatorSet catalog (signals)          │
//! ├──────────────────────────────────────────────────────────────┤
//! │   BrowserSession: ChromiumSession (feature) | MockSession     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use checkout_probe::prelude::*;
//!
//! let config = ProbeConfig::new().with_tick_interval(10).with_max_wait(100).with_settle_delay(0);
//! let mut form = CheckoutForm::new(MockSession::checkout_step_one(), config);
//! form.fill_form("Emmanuel", "Arhu", "").unwrap();
//!
//! match form.submit_and_continue().unwrap() {
//!     SubmitOutcome::Rejected(form) => assert!(form.field_has_error("zip code").unwrap()),
//!     SubmitOutcome::Advanced(_) => unreachable!(),
//! }
//! ```

#![warn(missing_docs)]

#[cfg(feature = "browser")]
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod chromium;
mod config;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod controller;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod detector;
mod fields;
mod inspector;
mod locator;
mod logging;
mod mock;
mod pages;
mod poller;
mod result;
mod scenario;
mod session;
mod signals;

#[cfg(feature = "browser")]
pub use chromium::{ChromiumElement, ChromiumSession};
pub use config::{
    BrowserConfig, ProbeConfig, DEFAULT_MAX_WAIT_MS, DEFAULT_SETTLE_DELAY_MS,
    DEFAULT_TICK_INTERVAL_MS, ENV_BASE_URL, ENV_MAX_WAIT_MS, ENV_SETTLE_DELAY_MS,
    ENV_TICK_INTERVAL_MS,
};
pub use controller::{CheckoutForm, CheckoutState, SubmitOutcome};
pub use detector::{SignalDetector, MESSAGE_SEPARATOR};
pub use fields::{error_mentions_field, FieldId};
pub use inspector::{FieldStateInspector, FormFieldState};
pub use locator::{Locator, LocatorSet, SelectorKind};
pub use logging::{filter_for, init_logging, init_logging_with, LogFormat};
pub use mock::{
    CheckoutStorefront, ClickAction, ErrorRendering, InjectedFailure, MockElement,
    MockElementId, MockHandle, MockSession,
};
pub use pages::{verify_page, CartPage, CheckoutOverviewPage, PageObject};
pub use poller::{settle, PollResult, ProbeMatch, StatePoller, MIN_TICK_INTERVAL};
pub use result::{ProbeError, ProbeResult};
pub use scenario::{is_valid_postal_code_format, CheckoutScenario, ExpectedOutcome, ScenarioReport};
pub use session::{BrowserSession, ElementHandle};

/// Signal locator catalog for checkout step one
pub mod catalog {
    pub use super::signals::{
        all_error_messages, checkout_error, field_error_styling, field_input, page_title,
        FormAction, CART_PATH, CART_TITLE, CHECKOUT_STEP_ONE_PATH, CHECKOUT_STEP_ONE_TITLE,
        CHECKOUT_STEP_TWO_PATH, CHECKOUT_STEP_TWO_TITLE,
    };
}

pub use signals::FormAction;

/// Prelude for convenient imports
pub mod prelude {
    #[cfg(feature = "browser")]
    pub use super::chromium::ChromiumSession;
    pub use super::config::{BrowserConfig, ProbeConfig};
    pub use super::controller::{CheckoutForm, CheckoutState, SubmitOutcome};
    pub use super::detector::SignalDetector;
    pub use super::fields::FieldId;
    pub use super::locator::{Locator, LocatorSet};
    pub use super::mock::{CheckoutStorefront, MockElement, MockSession};
    pub use super::pages::{CartPage, CheckoutOverviewPage, PageObject};
    pub use super::poller::{PollResult, StatePoller};
    pub use super::result::{ProbeError, ProbeResult};
    pub use super::scenario::{CheckoutScenario, ExpectedOutcome};
    pub use super::session::{BrowserSession, ElementHandle};
    pub use super::signals::FormAction;
}
