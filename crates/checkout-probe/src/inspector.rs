//! Single-shot reads of form field state.
//!
//! Unlike [`SignalDetector`](crate::SignalDetector) queries, nothing here
//! polls: each call looks at the page once. Recoverable failures read as
//! "empty" or "false".

use serde::Serialize;

use crate::fields::FieldId;
use crate::locator::LocatorSet;
use crate::poller::absorb;
use crate::result::ProbeResult;
use crate::session::{BrowserSession, ElementHandle};
use crate::signals::{self, FormAction};

/// Snapshot of one input
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormFieldState {
    /// Field label
    pub name: String,
    /// Current value
    pub value: String,
    /// Whether the input accepts interaction
    pub is_enabled: bool,
    /// Whether any error styling applies
    pub has_error_styling: bool,
}

/// Reads input values, enabled state and error styling
#[derive(Debug)]
pub struct FieldStateInspector<'s, S: BrowserSession> {
    session: &'s S,
}

impl<'s, S: BrowserSession> FieldStateInspector<'s, S> {
    /// Create an inspector
    pub const fn new(session: &'s S) -> Self {
        Self { session }
    }

    /// Current value of a field; empty when the input cannot be read
    pub fn field_value(&self, field: FieldId) -> ProbeResult<String> {
        let Some(input) = self.session.locate(&signals::field_input(field))? else {
            tracing::warn!(field = %field, "input not found");
            return Ok(String::new());
        };
        let value = absorb(input.attribute("value"), None)?.unwrap_or_default();
        Ok(value)
    }

    /// Whether any error-styling candidate for `field` is visible
    pub fn field_has_error_styling(&self, field: FieldId) -> ProbeResult<bool> {
        let styled = self.any_visible(&signals::field_error_styling(field))?;
        if styled {
            tracing::info!(field = %field, "field has error styling");
        }
        Ok(styled)
    }

    /// Whether any of the three inputs shows error styling
    pub fn any_field_has_error_styling(&self) -> ProbeResult<bool> {
        for field in FieldId::ALL {
            if self.field_has_error_styling(field)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Whether all three inputs are visible
    pub fn are_form_fields_displayed(&self) -> ProbeResult<bool> {
        for field in FieldId::ALL {
            if !self.any_visible(&signals::field_input(field))? {
                tracing::info!(field = %field, "input not displayed");
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Whether a form button is enabled; false when it cannot be found
    pub fn is_action_enabled(&self, action: FormAction) -> ProbeResult<bool> {
        match self.session.locate(&action.locators())? {
            Some(button) => absorb(button.is_enabled(), false),
            None => Ok(false),
        }
    }

    /// Snapshot of one field
    pub fn field_state(&self, field: FieldId) -> ProbeResult<FormFieldState> {
        let value = self.field_value(field)?;
        let is_enabled = match self.session.locate(&signals::field_input(field))? {
            Some(input) => absorb(input.is_enabled(), false)?,
            None => false,
        };
        Ok(FormFieldState {
            name: field.label().to_string(),
            value,
            is_enabled,
            has_error_styling: self.field_has_error_styling(field)?,
        })
    }

    /// Whether any element matched by `set` is visible
    pub fn any_visible(&self, set: &LocatorSet) -> ProbeResult<bool> {
        for locator in set {
            for element in absorb(self.session.find_all(locator), Vec::new())? {
                if absorb(element.is_visible(), false)? {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}
