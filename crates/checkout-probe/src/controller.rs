//! Checkout step one controller.
//!
//! [`CheckoutForm`] drives the customer information form and reports what
//! the storefront did with the submission. It never validates input
//! itself; it only observes the rendered outcome.
//!
//! ```text
//! NotLoaded -> Loaded -> Filled -> Submitted -> Advanced
//!                          ^           |
//!                          |           v
//!                          +-------- Error
//! ```
//!
//! Cancel leaves the state machine altogether and yields a [`CartPage`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ProbeConfig;
use crate::detector::SignalDetector;
use crate::fields::FieldId;
use crate::inspector::{FieldStateInspector, FormFieldState};
use crate::pages::{verify_page, CartPage, CheckoutOverviewPage, PageObject};
use crate::poller::{absorb, settle, PollResult, StatePoller};
use crate::result::{ProbeError, ProbeResult};
use crate::session::{BrowserSession, ElementHandle};
use crate::signals::{self, FormAction, CHECKOUT_STEP_ONE_PATH, CHECKOUT_STEP_ONE_TITLE};

/// Where the form is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CheckoutState {
    /// Load contract not yet verified
    NotLoaded,
    /// Page verified, nothing entered
    Loaded,
    /// At least one field entered
    Filled,
    /// Continue clicked, outcome pending
    Submitted,
    /// No error appeared; the storefront moved on
    Advanced,
    /// The storefront rendered a validation error
    Error,
}

impl CheckoutState {
    /// Whether `self -> next` is a legal transition
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::NotLoaded, Self::Loaded)
                | (Self::Loaded | Self::Filled | Self::Error, Self::Filled)
                | (Self::Filled | Self::Error, Self::Submitted)
                | (Self::Submitted, Self::Advanced | Self::Error)
        )
    }
}

impl fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotLoaded => "not-loaded",
            Self::Loaded => "loaded",
            Self::Filled => "filled",
            Self::Submitted => "submitted",
            Self::Advanced => "advanced",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// What happened to a submission
#[derive(Debug)]
pub enum SubmitOutcome<S: BrowserSession> {
    /// The storefront accepted the data; the session now shows step two
    Advanced(CheckoutOverviewPage<S>),
    /// A validation error is displayed; the form is still usable
    Rejected(CheckoutForm<S>),
}

impl<S: BrowserSession> SubmitOutcome<S> {
    /// Whether the submission advanced
    pub const fn is_advanced(&self) -> bool {
        matches!(self, Self::Advanced(_))
    }
}

/// Page object and state machine for checkout step one
#[derive(Debug)]
pub struct CheckoutForm<S: BrowserSession> {
    session: S,
    config: ProbeConfig,
    state: CheckoutState,
    last_error: Option<PollResult>,
}

impl<S: BrowserSession> CheckoutForm<S> {
    /// Wrap a session expected to show checkout step one
    pub fn new(session: S, config: ProbeConfig) -> Self {
        tracing::info!(
            tick_ms = config.tick_interval_ms,
            max_wait_ms = config.max_wait_ms,
            "checkout step one initialized"
        );
        Self {
            session,
            config,
            state: CheckoutState::NotLoaded,
            last_error: None,
        }
    }

    /// Navigate to checkout step one under the configured base URL
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid, no base URL is
    /// configured, navigation fails, or the page that loads is not checkout
    /// step one
    pub fn open(session: S, config: ProbeConfig) -> ProbeResult<Self> {
        config.validate()?;
        let base = config.base_url.as_deref().ok_or_else(|| ProbeError::Config {
            message: "baseUrl is required to open checkout".to_string(),
        })?;
        let url = format!("{}/{CHECKOUT_STEP_ONE_PATH}", base.trim_end_matches('/'));
        session.navigate(&url)?;

        let mut form = Self::new(session, config);
        if !form.is_page_loaded()? {
            let landed = form.session.current_url().unwrap_or_default();
            return Err(ProbeError::NavigationError {
                url,
                message: format!("checkout step one did not load, landed on '{landed}'"),
            });
        }
        Ok(form)
    }

    /// Current lifecycle state
    pub const fn state(&self) -> CheckoutState {
        self.state
    }

    /// Detection result of the last submit or error wait
    pub const fn last_error(&self) -> Option<&PollResult> {
        self.last_error.as_ref()
    }

    /// Probe configuration
    pub const fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Borrow the session
    pub const fn session(&self) -> &S {
        &self.session
    }

    /// Hand the session back
    pub fn into_session(self) -> S {
        self.session
    }

    fn transition(&mut self, next: CheckoutState) -> ProbeResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(ProbeError::invalid_state(format!(
                "cannot go from {} to {next}",
                self.state
            )));
        }
        tracing::debug!(from = %self.state, to = %next, "checkout state");
        if next == CheckoutState::Filled {
            self.last_error = None;
        }
        self.state = next;
        Ok(())
    }

    fn ensure_can_fill(&mut self) -> ProbeResult<()> {
        if self.state == CheckoutState::NotLoaded && !self.is_page_loaded()? {
            return Err(ProbeError::invalid_state("checkout step one is not loaded"));
        }
        if !self.state.can_transition_to(CheckoutState::Filled) {
            return Err(ProbeError::invalid_state(format!(
                "cannot enter data while {}",
                self.state
            )));
        }
        Ok(())
    }

    fn error_detector(&self) -> SignalDetector<'_, S> {
        SignalDetector::new(&self.session, signals::checkout_error(), self.poller())
    }

    fn inspector(&self) -> FieldStateInspector<'_, S> {
        FieldStateInspector::new(&self.session)
    }

    fn poller(&self) -> StatePoller {
        self.config.poller()
    }

    /// Verify the load contract; the first success moves to `Loaded`
    pub fn is_page_loaded(&mut self) -> ProbeResult<bool> {
        let loaded = self.is_loaded()?;
        if loaded && self.state == CheckoutState::NotLoaded {
            self.transition(CheckoutState::Loaded)?;
        }
        Ok(loaded)
    }

    /// Clear a field and type `value` into it. An empty value only clears.
    ///
    /// # Errors
    ///
    /// Returns error if the page is not loaded, the input is missing or the
    /// driver fails while typing
    pub fn enter(&mut self, field: FieldId, value: &str) -> ProbeResult<&mut Self> {
        self.ensure_can_fill()?;
        let input = self.session.require(&signals::field_input(field))?;
        input.clear()?;
        if !value.is_empty() {
            input.type_text(value)?;
        }
        tracing::info!(field = %field, value, "entered field");
        self.transition(CheckoutState::Filled)?;
        Ok(self)
    }

    /// Enter the first name
    pub fn enter_first_name(&mut self, value: &str) -> ProbeResult<&mut Self> {
        self.enter(FieldId::FirstName, value)
    }

    /// Enter the last name
    pub fn enter_last_name(&mut self, value: &str) -> ProbeResult<&mut Self> {
        self.enter(FieldId::LastName, value)
    }

    /// Enter the postal code
    pub fn enter_postal_code(&mut self, value: &str) -> ProbeResult<&mut Self> {
        self.enter(FieldId::PostalCode, value)
    }

    /// Enter all three fields in order. Stops at the first failure; fields
    /// already entered stay entered.
    pub fn fill_form(
        &mut self,
        first_name: &str,
        last_name: &str,
        postal_code: &str,
    ) -> ProbeResult<&mut Self> {
        self.enter_first_name(first_name)?
            .enter_last_name(last_name)?
            .enter_postal_code(postal_code)?;
        tracing::info!("filled checkout form");
        Ok(self)
    }

    /// Clear every field. Inputs that cannot be cleared are skipped.
    pub fn clear_all_fields(&mut self) -> ProbeResult<&mut Self> {
        self.ensure_can_fill()?;
        for field in FieldId::ALL {
            match self.session.locate(&signals::field_input(field))? {
                Some(input) => absorb(input.clear(), ())?,
                None => tracing::warn!(field = %field, "input not found while clearing"),
            }
        }
        tracing::info!("cleared all fields");
        self.transition(CheckoutState::Filled)?;
        Ok(self)
    }

    /// Click continue, wait the settle delay, then poll for an error.
    ///
    /// Returns `Error` if an error rendered within the poll window and
    /// `Advanced` otherwise.
    ///
    /// # Errors
    ///
    /// Returns error if nothing was entered yet, the button is missing, the
    /// click fails or the session is lost during detection
    pub fn submit(&mut self) -> ProbeResult<CheckoutState> {
        if !self.state.can_transition_to(CheckoutState::Submitted) {
            return Err(ProbeError::invalid_state(format!(
                "cannot submit while {}",
                self.state
            )));
        }
        let button = self.session.require(&FormAction::Continue.locators())?;
        button.click()?;
        self.transition(CheckoutState::Submitted)?;
        tracing::info!("clicked continue");

        settle(self.config.settle_delay());
        let result = self.error_detector().detect_presence()?;
        let next = if result.is_found() {
            tracing::info!(text = result.text(), "submission rejected");
            CheckoutState::Error
        } else {
            tracing::info!("submission advanced");
            CheckoutState::Advanced
        };
        self.last_error = Some(result);
        self.transition(next)?;
        Ok(next)
    }

    /// Submit and move to whichever page object now applies
    pub fn submit_and_continue(mut self) -> ProbeResult<SubmitOutcome<S>> {
        match self.submit()? {
            CheckoutState::Advanced => Ok(SubmitOutcome::Advanced(CheckoutOverviewPage::new(
                self.session,
                self.config,
            ))),
            _ => Ok(SubmitOutcome::Rejected(self)),
        }
    }

    /// Click cancel and return to the cart
    ///
    /// # Errors
    ///
    /// Returns error if the button is missing or the click fails
    pub fn cancel(self) -> ProbeResult<CartPage<S>> {
        let button = self.session.require(&FormAction::Cancel.locators())?;
        button.click()?;
        tracing::info!(from = %self.state, "clicked cancel");
        Ok(CartPage::new(self.session, self.config))
    }

    /// Whether an error is displayed.
    ///
    /// After a submit this answers from the cached detection result;
    /// otherwise it waits for the error like
    /// [`wait_for_error_message`](Self::wait_for_error_message).
    pub fn is_error_displayed(&mut self) -> ProbeResult<bool> {
        match &self.last_error {
            Some(result) => Ok(result.is_found()),
            None => self.wait_for_error_message(),
        }
    }

    /// Poll for the error over the configured window and cache the result
    pub fn wait_for_error_message(&mut self) -> ProbeResult<bool> {
        let result = self.error_detector().detect_presence()?;
        let found = result.is_found();
        self.last_error = Some(result);
        Ok(found)
    }

    /// Text of the displayed error, empty when there is none
    pub fn error_text(&self) -> ProbeResult<String> {
        self.error_detector().extract_text()
    }

    /// Whether the error text contains `expected`, ignoring case
    pub fn error_contains(&self, expected: &str) -> ProbeResult<bool> {
        self.error_detector().contains_text(expected)
    }

    /// Whether the displayed error is about `field_name` ("zip code",
    /// "First Name", "lastName", ...)
    pub fn field_has_error(&self, field_name: &str) -> ProbeResult<bool> {
        self.error_detector().has_field_error(field_name)
    }

    /// Every visible error message joined with `" | "`
    pub fn all_error_messages(&self) -> ProbeResult<String> {
        SignalDetector::new(&self.session, signals::all_error_messages(), self.poller())
            .joined_texts()
    }

    /// Current value of a field; empty when unreadable
    pub fn field_value(&self, field: FieldId) -> ProbeResult<String> {
        self.inspector().field_value(field)
    }

    /// Snapshot of a field
    pub fn field_state(&self, field: FieldId) -> ProbeResult<FormFieldState> {
        self.inspector().field_state(field)
    }

    /// Whether a field shows error styling
    pub fn field_has_error_styling(&self, field: FieldId) -> ProbeResult<bool> {
        self.inspector().field_has_error_styling(field)
    }

    /// Whether any field shows error styling
    pub fn any_field_has_error_styling(&self) -> ProbeResult<bool> {
        self.inspector().any_field_has_error_styling()
    }

    /// Whether all three inputs are visible
    pub fn are_form_fields_displayed(&self) -> ProbeResult<bool> {
        self.inspector().are_form_fields_displayed()
    }

    /// Whether a form button is enabled
    pub fn is_action_enabled(&self, action: FormAction) -> ProbeResult<bool> {
        self.inspector().is_action_enabled(action)
    }
}

impl<S: BrowserSession> PageObject for CheckoutForm<S> {
    fn url_pattern(&self) -> &str {
        CHECKOUT_STEP_ONE_PATH
    }

    fn expected_title(&self) -> &str {
        CHECKOUT_STEP_ONE_TITLE
    }

    fn is_loaded(&self) -> ProbeResult<bool> {
        verify_page(&self.session, CHECKOUT_STEP_ONE_PATH, CHECKOUT_STEP_ONE_TITLE)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mock::{CheckoutStorefront, ErrorRendering, InjectedFailure, MockSession};
    use std::time::Duration;

    fn fast_config() -> ProbeConfig {
        ProbeConfig::new()
            .with_tick_interval(10)
            .with_max_wait(100)
            .with_settle_delay(0)
    }

    fn form(session: MockSession) -> CheckoutForm<MockSession> {
        CheckoutForm::new(session, fast_config())
    }

    mod state_tests {
        use super::*;

        #[test]
        fn test_transitions() {
            use CheckoutState::*;
            assert!(NotLoaded.can_transition_to(Loaded));
            assert!(Loaded.can_transition_to(Filled));
            assert!(Filled.can_transition_to(Submitted));
            assert!(Submitted.can_transition_to(Advanced));
            assert!(Submitted.can_transition_to(Error));
            assert!(Error.can_transition_to(Filled));
            assert!(Error.can_transition_to(Submitted));
            assert!(!Loaded.can_transition_to(Submitted));
            assert!(!NotLoaded.can_transition_to(Filled));
            assert!(!Advanced.can_transition_to(Filled));
        }

        #[test]
        fn test_load_check() {
            let mut form = form(MockSession::checkout_step_one());
            assert_eq!(form.state(), CheckoutState::NotLoaded);
            assert!(form.is_page_loaded().unwrap());
            assert_eq!(form.state(), CheckoutState::Loaded);
        }

        #[test]
        fn test_fill_requires_loaded_page() {
            let mut form = form(MockSession::with_url("https://shop.test/inventory.html"));
            let err = form.enter_first_name("Emmanuel").unwrap_err();
            assert!(matches!(err, ProbeError::InvalidState { .. }));
            assert_eq!(form.state(), CheckoutState::NotLoaded);
        }

        #[test]
        fn test_fill_loads_lazily() {
            let mut form = form(MockSession::checkout_step_one());
            form.enter_first_name("Emmanuel").unwrap();
            assert_eq!(form.state(), CheckoutState::Filled);
            assert_eq!(form.field_value(FieldId::FirstName).unwrap(), "Emmanuel");
        }

        #[test]
        fn test_submit_requires_filled() {
            let mut form = form(MockSession::checkout_step_one());
            form.is_page_loaded().unwrap();
            assert!(matches!(
                form.submit(),
                Err(ProbeError::InvalidState { .. })
            ));
            assert!(!form.session().was_called("click:"));
        }

        #[test]
        fn test_open_navigates() {
            let session = CheckoutStorefront::new()
                .with_base_url("http://shop.test")
                .build();
            session.navigate("http://shop.test/cart.html").unwrap();

            let config = fast_config().with_base_url("http://shop.test/");
            let form = CheckoutForm::open(session, config).unwrap();
            assert_eq!(form.state(), CheckoutState::Loaded);
            assert!(form
                .session()
                .was_called("navigate:http://shop.test/checkout-step-one.html"));
        }

        #[test]
        fn test_open_needs_base_url() {
            let err = CheckoutForm::open(MockSession::new(), fast_config()).unwrap_err();
            assert!(matches!(err, ProbeError::Config { .. }));
        }

        #[test]
        fn test_open_rejects_zero_tick() {
            let config = fast_config()
                .with_base_url("http://shop.test")
                .with_tick_interval(0);
            let session = CheckoutStorefront::new()
                .with_base_url("http://shop.test")
                .build();
            let err = CheckoutForm::open(session.clone(), config).unwrap_err();
            assert!(matches!(err, ProbeError::Config { .. }));
            assert!(!session.was_called("navigate:"));
        }

        #[test]
        fn test_open_fails_when_page_does_not_load() {
            let config = fast_config().with_base_url("http://shop.test");
            let err = CheckoutForm::open(MockSession::new(), config).unwrap_err();
            match err {
                ProbeError::NavigationError { url, .. } => {
                    assert_eq!(url, "http://shop.test/checkout-step-one.html");
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    mod scenario_tests {
        use super::*;

        #[test]
        fn test_empty_fields_rejected() {
            let mut form = form(MockSession::checkout_step_one());
            form.fill_form("", "", "").unwrap();

            assert_eq!(form.submit().unwrap(), CheckoutState::Error);
            assert!(form.is_error_displayed().unwrap());
            assert!(form.error_contains("First Name is required").unwrap());
            assert!(form.field_has_error("first name").unwrap());
            assert!(!form.field_has_error("postal code").unwrap());
            assert!(form.field_has_error_styling(FieldId::FirstName).unwrap());
            assert!(form.any_field_has_error_styling().unwrap());
        }

        #[test]
        fn test_missing_first_name_rejected() {
            let mut form = form(MockSession::checkout_step_one());
            form.fill_form("", "Arhu", "12345").unwrap();

            assert_eq!(form.submit().unwrap(), CheckoutState::Error);
            assert!(form.is_error_displayed().unwrap());
            assert!(form.error_contains("First Name is required").unwrap());
            assert!(form.field_has_error("First Name").unwrap());
            assert!(!form.field_has_error("Last Name").unwrap());
            assert_eq!(form.field_value(FieldId::LastName).unwrap(), "Arhu");
        }

        #[test]
        fn test_zero_tick_wait_does_not_spin() {
            let config = fast_config().with_tick_interval(0);
            let mut form = CheckoutForm::new(MockSession::checkout_step_one(), config);

            assert!(!form.wait_for_error_message().unwrap());
            let result = form.last_error().unwrap();
            assert!(result.elapsed() >= Duration::from_millis(100));
            assert!(result.elapsed_ticks() <= 12);
        }

        #[test]
        fn test_valid_data_advances() {
            let mut form = form(MockSession::checkout_step_one());
            form.fill_form("Emmanuel", "Arhu", "12345").unwrap();

            let outcome = form.submit_and_continue().unwrap();
            let SubmitOutcome::Advanced(page) = outcome else {
                panic!("expected to advance");
            };
            assert!(page.is_loaded().unwrap());
        }

        #[test]
        fn test_missing_postal_code() {
            let mut form = form(MockSession::checkout_step_one());
            form.fill_form("Emmanuel", "Arhu", "").unwrap();

            let SubmitOutcome::Rejected(form) = form.submit_and_continue().unwrap() else {
                panic!("expected rejection");
            };
            assert_eq!(form.state(), CheckoutState::Error);
            assert_eq!(form.error_text().unwrap(), "Error: Postal Code is required");
            assert!(form.field_has_error("zip code").unwrap());
            assert!(form.field_has_error("postalCode").unwrap());
            assert_eq!(form.all_error_messages().unwrap(), "Error: Postal Code is required");
            assert_eq!(form.last_error().unwrap().text(), "Error: Postal Code is required");
        }

        #[test]
        fn test_delayed_error_within_window() {
            let session = CheckoutStorefront::new()
                .with_render_delay(Duration::from_millis(40))
                .with_rendering(ErrorRendering::ContainerOnly)
                .build();
            let mut form = form(session);
            form.fill_form("Emmanuel", "", "12345").unwrap();

            assert_eq!(form.submit().unwrap(), CheckoutState::Error);
            assert!(form.error_contains("last name").unwrap());
        }

        #[test]
        fn test_error_after_window_reads_as_advanced() {
            let session = CheckoutStorefront::new()
                .with_render_delay(Duration::from_millis(500))
                .build();
            let mut form = form(session);
            form.fill_form("", "", "").unwrap();

            assert_eq!(form.submit().unwrap(), CheckoutState::Advanced);
            assert!(!form.is_error_displayed().unwrap());
        }

        #[test]
        fn test_correct_and_resubmit() {
            let mut form = form(MockSession::checkout_step_one());
            form.fill_form("", "Arhu", "K1A0A6").unwrap();
            assert_eq!(form.submit().unwrap(), CheckoutState::Error);

            form.enter_first_name("Emmanuel").unwrap();
            assert!(form.last_error().is_none());
            assert_eq!(form.submit().unwrap(), CheckoutState::Advanced);
        }

        #[test]
        fn test_error_text_is_idempotent() {
            let mut form = form(MockSession::checkout_step_one());
            form.fill_form("", "", "").unwrap();
            form.submit().unwrap();
            assert_eq!(form.error_text().unwrap(), form.error_text().unwrap());
        }
    }

    mod field_tests {
        use super::*;

        #[test]
        fn test_clear_all_fields() {
            let mut form = form(MockSession::checkout_step_one());
            form.fill_form("Emmanuel", "Arhu", "12345").unwrap();
            form.clear_all_fields().unwrap();

            for field in FieldId::ALL {
                assert_eq!(form.field_value(field).unwrap(), "");
            }
            assert_eq!(form.state(), CheckoutState::Filled);
        }

        #[test]
        fn test_reentry_replaces_value() {
            let mut form = form(MockSession::checkout_step_one());
            form.enter_postal_code("99999").unwrap();
            form.enter_postal_code("K1A 0A6").unwrap();
            assert_eq!(form.field_value(FieldId::PostalCode).unwrap(), "K1A 0A6");
        }

        #[test]
        fn test_displayed_and_enabled() {
            let form = form(MockSession::checkout_step_one());
            assert!(form.are_form_fields_displayed().unwrap());
            assert!(form.is_action_enabled(FormAction::Continue).unwrap());
            assert!(form.is_action_enabled(FormAction::Cancel).unwrap());
        }
    }

    mod navigation_tests {
        use super::*;

        #[test]
        fn test_cancel_returns_cart() {
            let form = form(MockSession::checkout_step_one());
            let cart = form.cancel().unwrap();
            assert!(cart.is_loaded().unwrap());
        }

        #[test]
        fn test_cancel_after_error() {
            let mut form = form(MockSession::checkout_step_one());
            form.fill_form("", "", "").unwrap();
            form.submit().unwrap();
            let cart = form.cancel().unwrap();
            assert!(cart.is_loaded().unwrap());
        }

        #[test]
        fn test_lost_session_propagates_from_submit() {
            let session = MockSession::checkout_step_one();
            let mut form = form(session.clone());
            form.fill_form("", "", "").unwrap();
            session.fail_next("[data-test='error']", InjectedFailure::SessionLost, 1);

            let err = form.submit().unwrap_err();
            assert!(err.is_fatal());
            assert_eq!(form.state(), CheckoutState::Submitted);
        }

        #[test]
        fn test_missing_continue_button() {
            let session = MockSession::checkout_step_one();
            session.fail_next("[data-test='continue']", InjectedFailure::Transient, 1);
            session.fail_next("input#continue", InjectedFailure::Transient, 1);
            let mut form = form(session);
            form.fill_form("a", "b", "c").unwrap();

            assert!(matches!(
                form.submit(),
                Err(ProbeError::ElementNotFound { .. })
            ));
            assert_eq!(form.state(), CheckoutState::Filled);
        }
    }
}
