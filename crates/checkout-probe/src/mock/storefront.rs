//! Simulated checkout step one.
//!
//! Mirrors the storefront's behaviour closely enough for the probe: the
//! continue button validates the three inputs in form order and either
//! renders an error (after an optional render delay) or navigates to
//! checkout step two. Cancel goes back to the cart. The markup used for
//! the error is selectable so detection can be tested against each known
//! rendering.

use std::time::Duration;

use super::{ClickAction, MockDom, MockElement, MockSession};
use crate::fields::FieldId;
use crate::signals::{
    CART_PATH, CART_TITLE, CHECKOUT_STEP_ONE_PATH, CHECKOUT_STEP_ONE_TITLE,
    CHECKOUT_STEP_TWO_PATH, CHECKOUT_STEP_TWO_TITLE,
};

/// Markup used to render a validation error
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorRendering {
    /// `h3[data-test='error']` inside `.error-message-container`
    #[default]
    Standard,
    /// Only `.error-message-container` carries the message
    ContainerOnly,
    /// A generic `.error-banner`
    Banner,
    /// Inline `.field-error` next to the input
    InlineField,
}

/// Builder for a [`MockSession`] showing checkout step one
#[derive(Debug, Clone)]
pub struct CheckoutStorefront {
    base_url: String,
    rendering: ErrorRendering,
    render_delay: Duration,
    letters_only_names: bool,
}

impl Default for CheckoutStorefront {
    fn default() -> Self {
        Self {
            base_url: "https://www.saucedemo.com".to_string(),
            rendering: ErrorRendering::Standard,
            render_delay: Duration::ZERO,
            letters_only_names: false,
        }
    }
}

impl CheckoutStorefront {
    /// Default storefront
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set base URL (no trailing slash)
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set error markup
    #[must_use]
    pub const fn with_rendering(mut self, rendering: ErrorRendering) -> Self {
        self.rendering = rendering;
        self
    }

    /// Delay between submit and the error becoming visible
    #[must_use]
    pub const fn with_render_delay(mut self, delay: Duration) -> Self {
        self.render_delay = delay;
        self
    }

    /// Reject names containing digits with "Letters are required"
    #[must_use]
    pub const fn with_letters_only_names(mut self) -> Self {
        self.letters_only_names = true;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// Build the session
    #[must_use]
    pub fn build(self) -> MockSession {
        let session = MockSession::with_url(self.url(CHECKOUT_STEP_ONE_PATH));
        let mut dom = session.dom.borrow_mut();

        let title = dom.insert(
            "[data-test='title']".to_string(),
            MockElement::new().with_text(CHECKOUT_STEP_ONE_TITLE),
        );
        dom.alias(".title".to_string(), title);

        let inputs = FieldId::ALL.map(|field| {
            dom.insert(
                format!("[data-test='{}']", field.test_id()),
                MockElement::new()
                    .with_value("")
                    .with_attribute("placeholder", field.label()),
            )
        });

        let continue_button = dom.insert(
            "[data-test='continue']".to_string(),
            MockElement::new()
                .with_value("Continue")
                .on_click(ClickAction::SubmitCheckout),
        );
        dom.alias("input#continue".to_string(), continue_button);

        let cancel_button = dom.insert(
            "[data-test='cancel']".to_string(),
            MockElement::new()
                .with_text("Cancel")
                .on_click(ClickAction::Navigate(self.url(CART_PATH))),
        );
        dom.alias("button#cancel".to_string(), cancel_button);

        dom.storefront = Some(StorefrontState {
            config: self,
            title,
            inputs,
            form: vec![inputs[0], inputs[1], inputs[2], continue_button, cancel_button],
            rendered: Vec::new(),
            error_keys: Vec::new(),
        });
        drop(dom);
        session
    }
}

#[derive(Debug, Clone)]
pub(super) struct StorefrontState {
    config: CheckoutStorefront,
    title: usize,
    inputs: [usize; 3],
    form: Vec<usize>,
    rendered: Vec<usize>,
    error_keys: Vec<String>,
}

impl StorefrontState {
    /// First validation failure in form order
    fn validate(&self, values: &[String; 3]) -> Option<(String, Vec<FieldId>)> {
        for (field, value) in FieldId::ALL.iter().zip(values) {
            if value.trim().is_empty() {
                return Some((format!("Error: {} is required", field.label()), vec![*field]));
            }
        }
        if self.config.letters_only_names {
            let numeric: Vec<FieldId> = [FieldId::FirstName, FieldId::LastName]
                .into_iter()
                .zip(values)
                .filter(|(_, value)| value.chars().any(|c| c.is_ascii_digit()))
                .map(|(field, _)| field)
                .collect();
            if !numeric.is_empty() {
                return Some(("Error: Letters are required".to_string(), numeric));
            }
        }
        None
    }
}

impl MockDom {
    pub(super) fn submit_checkout(&mut self) {
        let Some(state) = self.storefront.clone() else {
            return;
        };
        self.clear_rendered_error();

        let values = state.inputs.map(|id| self.value_of(id));
        match state.validate(&values) {
            Some((message, fields)) => self.render_error(&state, &message, &fields),
            None => {
                let next = state.config.url(CHECKOUT_STEP_TWO_PATH);
                self.navigate_to(&next);
            }
        }
    }

    pub(super) fn storefront_navigated(&mut self) {
        let Some(state) = self.storefront.clone() else {
            return;
        };
        let (title, on_form) = if self.url.contains(CHECKOUT_STEP_ONE_PATH) {
            (CHECKOUT_STEP_ONE_TITLE, true)
        } else if self.url.contains(CHECKOUT_STEP_TWO_PATH) {
            (CHECKOUT_STEP_TWO_TITLE, false)
        } else if self.url.contains(CART_PATH) {
            (CART_TITLE, false)
        } else {
            ("", false)
        };

        if let Some(node) = self.nodes.get_mut(state.title) {
            node.element.text = title.to_string();
        }
        for id in &state.form {
            if let Some(node) = self.nodes.get_mut(*id) {
                node.element.visible = on_form;
            }
        }
        if !on_form {
            self.clear_rendered_error();
        }
    }

    fn clear_rendered_error(&mut self) {
        let Some(state) = self.storefront.as_mut() else {
            return;
        };
        let rendered = std::mem::take(&mut state.rendered);
        let keys = std::mem::take(&mut state.error_keys);
        for id in rendered {
            self.detach(id);
        }
        for key in keys {
            self.unindex(&key);
        }
    }

    fn render_error(&mut self, state: &StorefrontState, message: &str, fields: &[FieldId]) {
        let delay = state.config.render_delay;
        let text = || MockElement::new().with_text(message).appear_after(delay);
        let mut rendered = Vec::new();
        let mut keys = Vec::new();

        match state.config.rendering {
            ErrorRendering::Standard => {
                rendered.push(self.insert(".error-message-container".to_string(), text()));
                let h3 = self.insert("[data-test='error']".to_string(), text());
                self.alias(".error-message-container h3".to_string(), h3);
                rendered.push(h3);
            }
            ErrorRendering::ContainerOnly => {
                rendered.push(self.insert(".error-message-container".to_string(), text()));
            }
            ErrorRendering::Banner => {
                rendered.push(self.insert(".error-banner".to_string(), text()));
            }
            ErrorRendering::InlineField => {
                rendered.push(self.insert(".field-error".to_string(), text()));
            }
        }

        for field in fields {
            let input = state.inputs[field_index(*field)];
            for suffix in [".error", "[class*='error']"] {
                let key = format!("[data-test='{}']{suffix}", field.test_id());
                self.alias(key.clone(), input);
                keys.push(key);
            }
        }

        if let Some(current) = self.storefront.as_mut() {
            current.rendered = rendered;
            current.error_keys = keys;
        }
    }
}

fn field_index(field: FieldId) -> usize {
    match field {
        FieldId::FirstName => 0,
        FieldId::LastName => 1,
        FieldId::PostalCode => 2,
    }
}
