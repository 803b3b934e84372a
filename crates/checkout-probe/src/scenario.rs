//! Checkout validation scenarios.
//!
//! A scenario is one submission of checkout step one and the outcome the
//! storefront is expected to produce. Scenarios can be built in code or
//! loaded from a YAML list and run against any [`BrowserSession`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::controller::{CheckoutForm, CheckoutState, SubmitOutcome};
use crate::pages::PageObject;
use crate::result::ProbeResult;
use crate::session::BrowserSession;

/// Expected result of submitting a scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum ExpectedOutcome {
    /// The storefront moves on to checkout step two
    Advance,
    /// An error is displayed whose text contains `contains` (any case)
    Error {
        /// Expected fragment of the error text
        contains: String,
    },
}

/// Form data plus the expected outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutScenario {
    /// Scenario name
    pub name: String,
    /// First name to enter
    #[serde(default)]
    pub first_name: String,
    /// Last name to enter
    #[serde(default)]
    pub last_name: String,
    /// Postal code to enter
    #[serde(default)]
    pub postal_code: String,
    /// What the storefront should do
    pub expected: ExpectedOutcome,
}

impl CheckoutScenario {
    /// Create a scenario
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        postal_code: impl Into<String>,
        expected: ExpectedOutcome,
    ) -> Self {
        Self {
            name: name.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            postal_code: postal_code.into(),
            expected,
        }
    }

    fn error(contains: &str) -> ExpectedOutcome {
        ExpectedOutcome::Error {
            contains: contains.to_string(),
        }
    }

    /// Nothing entered
    #[must_use]
    pub fn empty_fields() -> Self {
        Self::new("empty fields", "", "", "", Self::error("First Name is required"))
    }

    /// Complete, valid data
    #[must_use]
    pub fn valid() -> Self {
        Self::new("valid data", "Emmanuel", "Arhu", "12345", ExpectedOutcome::Advance)
    }

    /// Valid data with a Canadian postal code
    #[must_use]
    pub fn valid_alphanumeric_postal_code() -> Self {
        Self::new(
            "valid alphanumeric postal code",
            "Emmanuel",
            "Arhu",
            "K1A0A6",
            ExpectedOutcome::Advance,
        )
    }

    /// First name left empty
    #[must_use]
    pub fn missing_first_name() -> Self {
        Self::new("missing first name", "", "Arhu", "12345", Self::error("First Name is required"))
    }

    /// Last name left empty
    #[must_use]
    pub fn missing_last_name() -> Self {
        Self::new(
            "missing last name",
            "Emmanuel",
            "",
            "12345",
            Self::error("Last Name is required"),
        )
    }

    /// Postal code left empty
    #[must_use]
    pub fn missing_postal_code() -> Self {
        Self::new(
            "missing postal code",
            "Emmanuel",
            "Arhu",
            "",
            Self::error("Postal Code is required"),
        )
    }

    /// Digits in both names; only storefronts that check letters reject it
    #[must_use]
    pub fn numeric_names() -> Self {
        Self::new(
            "numeric names",
            "12345",
            "12345",
            "12345",
            Self::error("Letters are required"),
        )
    }

    /// The required-field scenarios plus the valid ones
    #[must_use]
    pub fn standard_suite() -> Vec<Self> {
        vec![
            Self::empty_fields(),
            Self::valid(),
            Self::valid_alphanumeric_postal_code(),
            Self::missing_first_name(),
            Self::missing_last_name(),
            Self::missing_postal_code(),
        ]
    }

    /// Parse a YAML list of scenarios
    pub fn list_from_yaml_str(yaml: &str) -> ProbeResult<Vec<Self>> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Fill, submit, and compare the outcome with the expectation.
    ///
    /// The session is consumed; mismatches are reported, not raised.
    ///
    /// # Errors
    ///
    /// Returns error when the form cannot be driven at all
    pub fn run<S: BrowserSession>(&self, mut form: CheckoutForm<S>) -> ProbeResult<ScenarioReport> {
        tracing::info!(scenario = %self.name, "running checkout scenario");
        form.fill_form(&self.first_name, &self.last_name, &self.postal_code)?;

        let (state, error_text, passed) = match form.submit_and_continue()? {
            SubmitOutcome::Advanced(page) => {
                let loaded = page.is_loaded()?;
                let passed = self.expected == ExpectedOutcome::Advance && loaded;
                (CheckoutState::Advanced, String::new(), passed)
            }
            SubmitOutcome::Rejected(form) => {
                let text = form.error_text()?;
                let passed = match &self.expected {
                    ExpectedOutcome::Error { contains } => {
                        text.to_lowercase().contains(&contains.to_lowercase())
                    }
                    ExpectedOutcome::Advance => false,
                };
                (form.state(), text, passed)
            }
        };

        if passed {
            tracing::info!(scenario = %self.name, %state, "scenario passed");
        } else {
            tracing::warn!(scenario = %self.name, %state, error = %error_text, "scenario failed");
        }
        Ok(ScenarioReport {
            name: self.name.clone(),
            state,
            error_text,
            passed,
        })
    }
}

/// Result of running one scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioReport {
    /// Scenario name
    pub name: String,
    /// State the form ended in
    pub state: CheckoutState,
    /// Error text, empty when the form advanced
    pub error_text: String,
    /// Whether the outcome matched the expectation
    pub passed: bool,
}

fn postal_code_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9]{3,10}$").ok())
        .as_ref()
}

/// Loose postal code shape check: 3 to 10 letters or digits once spaces
/// and hyphens are removed
#[must_use]
pub fn is_valid_postal_code_format(postal_code: &str) -> bool {
    let compact: String = postal_code
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .collect();
    postal_code_pattern().is_some_and(|re| re.is_match(&compact))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ProbeConfig;
    use crate::mock::{CheckoutStorefront, MockSession};

    fn form(session: MockSession) -> CheckoutForm<MockSession> {
        CheckoutForm::new(
            session,
            ProbeConfig::new()
                .with_tick_interval(10)
                .with_max_wait(80)
                .with_settle_delay(0),
        )
    }

    mod postal_tests {
        use super::*;

        #[test]
        fn test_valid_shapes() {
            for code in ["12345", "K1A0A6", "K1A 0A6", "12345-6789", "SW1A 1AA", "abc"] {
                assert!(is_valid_postal_code_format(code), "{code}");
            }
        }

        #[test]
        fn test_invalid_shapes() {
            for code in ["", "12", "  - ", "12345678901", "12#45", "ab_cd"] {
                assert!(!is_valid_postal_code_format(code), "{code}");
            }
        }
    }

    mod run_tests {
        use super::*;

        #[test]
        fn test_standard_suite_passes_on_storefront() {
            for scenario in CheckoutScenario::standard_suite() {
                let report = scenario.run(form(MockSession::checkout_step_one())).unwrap();
                assert!(report.passed, "{report:?}");
            }
        }

        #[test]
        fn test_numeric_names_need_letter_check() {
            let scenario = CheckoutScenario::numeric_names();

            let plain = scenario.run(form(MockSession::checkout_step_one())).unwrap();
            assert!(!plain.passed);
            assert_eq!(plain.state, CheckoutState::Advanced);

            let strict = CheckoutStorefront::new().with_letters_only_names().build();
            let report = scenario.run(form(strict)).unwrap();
            assert!(report.passed);
            assert_eq!(report.state, CheckoutState::Error);
            assert_eq!(report.error_text, "Error: Letters are required");
        }

        #[test]
        fn test_scenarios_from_yaml() {
            let yaml = r"
- name: blank postal
  firstName: Emmanuel
  lastName: Arhu
  expected:
    outcome: error
    contains: postal code is required
- name: happy path
  firstName: Emmanuel
  lastName: Arhu
  postalCode: K1A 0A6
  expected:
    outcome: advance
";
            let scenarios = CheckoutScenario::list_from_yaml_str(yaml).unwrap();
            assert_eq!(scenarios.len(), 2);
            assert_eq!(scenarios[0].postal_code, "");
            for scenario in &scenarios {
                let report = scenario.run(form(MockSession::checkout_step_one())).unwrap();
                assert!(report.passed, "{report:?}");
            }
        }
    }
}
