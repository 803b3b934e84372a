//! In-memory browser session for unit testing.
//!
//! [`MockSession`] keeps a small element arena indexed by selector. A
//! locator resolves by its CSS form (test IDs expand to `[data-test='..']`)
//! or, for XPath, by its raw expression. Elements can appear after a delay,
//! selectors can be made to fail, and the whole session can be declared
//! lost, which is enough to exercise every branch of the detection code
//! without a browser.
//!
//! [`CheckoutStorefront`] builds a session pre-populated with checkout step
//! one and the storefront's validation behaviour on continue.

mod storefront;

pub use storefront::{CheckoutStorefront, ErrorRendering};

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::locator::Locator;
use crate::result::{ProbeError, ProbeResult};
use crate::session::{BrowserSession, ElementHandle};
use storefront::StorefrontState;

/// Identifier of an element inside a [`MockSession`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MockElementId(usize);

/// Side effect of clicking a mock element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ClickAction {
    /// Nothing happens
    #[default]
    None,
    /// Navigate to a URL
    Navigate(String),
    /// Run the storefront's checkout step one validation
    SubmitCheckout,
}

/// Failure returned by the next lookup of a selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedFailure {
    /// Transient driver error
    Transient,
    /// Stale element reference
    Stale,
    /// Session dies; every later call fails too
    SessionLost,
}

impl InjectedFailure {
    fn into_error(self, key: &str) -> ProbeError {
        match self {
            Self::Transient => ProbeError::driver(format!("injected failure for {key}")),
            Self::Stale => ProbeError::StaleElement {
                expression: key.to_string(),
            },
            Self::SessionLost => ProbeError::session_lost(format!("injected loss at {key}")),
        }
    }
}

/// Description of a mock element
#[derive(Debug, Clone)]
pub struct MockElement {
    text: String,
    visible: bool,
    enabled: bool,
    attributes: HashMap<String, String>,
    appear_after: Duration,
    on_click: ClickAction,
}

impl Default for MockElement {
    fn default() -> Self {
        Self {
            text: String::new(),
            visible: true,
            enabled: true,
            attributes: HashMap::new(),
            appear_after: Duration::ZERO,
            on_click: ClickAction::None,
        }
    }
}

impl MockElement {
    /// A visible, enabled, empty element
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the input value
    #[must_use]
    pub fn with_value(self, value: impl Into<String>) -> Self {
        self.with_attribute("value", value)
    }

    /// Set an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Render but keep invisible
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Disable interaction
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Become visible only after `delay` has passed since insertion
    #[must_use]
    pub fn appear_after(mut self, delay: Duration) -> Self {
        self.appear_after = delay;
        self
    }

    /// Click side effect
    #[must_use]
    pub fn on_click(mut self, action: ClickAction) -> Self {
        self.on_click = action;
        self
    }
}

#[derive(Debug)]
struct Node {
    element: MockElement,
    inserted_at: Instant,
    attached: bool,
}

impl Node {
    fn is_visible(&self) -> bool {
        self.element.visible && self.inserted_at.elapsed() >= self.element.appear_after
    }
}

#[derive(Debug, Default)]
struct MockDom {
    url: String,
    nodes: Vec<Node>,
    index: HashMap<String, Vec<usize>>,
    failures: HashMap<String, VecDeque<InjectedFailure>>,
    lost: Option<String>,
    call_history: Vec<String>,
    storefront: Option<StorefrontState>,
}

impl MockDom {
    fn insert(&mut self, key: String, element: MockElement) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node {
            element,
            inserted_at: Instant::now(),
            attached: true,
        });
        self.index.entry(key).or_default().push(id);
        id
    }

    fn alias(&mut self, key: String, id: usize) {
        let ids = self.index.entry(key).or_default();
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    fn unindex(&mut self, key: &str) {
        self.index.remove(key);
    }

    fn detach(&mut self, id: usize) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.attached = false;
        }
        for ids in self.index.values_mut() {
            ids.retain(|i| *i != id);
        }
    }

    fn check_alive(&self) -> ProbeResult<()> {
        match &self.lost {
            Some(message) => Err(ProbeError::session_lost(message.clone())),
            None => Ok(()),
        }
    }

    fn attached(&self, id: usize, key: &str) -> ProbeResult<&Node> {
        self.check_alive()?;
        self.nodes
            .get(id)
            .filter(|node| node.attached)
            .ok_or_else(|| ProbeError::StaleElement {
                expression: key.to_string(),
            })
    }

    fn attached_mut(&mut self, id: usize, key: &str) -> ProbeResult<&mut Node> {
        self.check_alive()?;
        self.nodes
            .get_mut(id)
            .filter(|node| node.attached)
            .ok_or_else(|| ProbeError::StaleElement {
                expression: key.to_string(),
            })
    }

    fn value_of(&self, id: usize) -> String {
        self.nodes
            .get(id)
            .and_then(|node| node.element.attributes.get("value").cloned())
            .unwrap_or_default()
    }

    fn navigate_to(&mut self, url: &str) {
        self.url = url.to_string();
        self.storefront_navigated();
    }

    fn take_failure(&mut self, key: &str) -> Option<InjectedFailure> {
        let failure = self.failures.get_mut(key)?.pop_front()?;
        if failure == InjectedFailure::SessionLost {
            self.lost = Some(format!("injected loss at {key}"));
        }
        Some(failure)
    }
}

fn key_for(locator: &Locator) -> String {
    locator
        .to_css()
        .unwrap_or_else(|| locator.expression().to_string())
}

/// Mock browser session
#[derive(Debug, Clone, Default)]
pub struct MockSession {
    dom: Rc<RefCell<MockDom>>,
}

impl MockSession {
    /// Empty session at `about:blank`
    #[must_use]
    pub fn new() -> Self {
        Self::with_url("about:blank")
    }

    /// Empty session at `url`
    #[must_use]
    pub fn with_url(url: impl Into<String>) -> Self {
        let session = Self::default();
        session.dom.borrow_mut().url = url.into();
        session
    }

    /// Session showing checkout step one of the default storefront
    #[must_use]
    pub fn checkout_step_one() -> Self {
        CheckoutStorefront::new().build()
    }

    /// Add an element reachable through `selector`
    pub fn insert(&self, selector: impl Into<String>, element: MockElement) -> MockElementId {
        MockElementId(self.dom.borrow_mut().insert(selector.into(), element))
    }

    /// Add an element reachable through `locator`
    pub fn insert_for(&self, locator: &Locator, element: MockElement) -> MockElementId {
        self.insert(key_for(locator), element)
    }

    /// Make an existing element reachable through another selector too
    pub fn alias(&self, selector: impl Into<String>, id: MockElementId) {
        self.dom.borrow_mut().alias(selector.into(), id.0);
    }

    /// Remove an element from the document; existing handles go stale
    pub fn detach(&self, id: MockElementId) {
        self.dom.borrow_mut().detach(id.0);
    }

    /// Change text content
    pub fn set_text(&self, id: MockElementId, text: impl Into<String>) {
        if let Some(node) = self.dom.borrow_mut().nodes.get_mut(id.0) {
            node.element.text = text.into();
        }
    }

    /// Show or hide an element
    pub fn set_visible(&self, id: MockElementId, visible: bool) {
        if let Some(node) = self.dom.borrow_mut().nodes.get_mut(id.0) {
            node.element.visible = visible;
        }
    }

    /// Enable or disable an element
    pub fn set_enabled(&self, id: MockElementId, enabled: bool) {
        if let Some(node) = self.dom.borrow_mut().nodes.get_mut(id.0) {
            node.element.enabled = enabled;
        }
    }

    /// Current value of an input
    #[must_use]
    pub fn value(&self, id: MockElementId) -> String {
        self.dom.borrow().value_of(id.0)
    }

    /// Fail the next `times` lookups of `selector`
    pub fn fail_next(&self, selector: impl Into<String>, failure: InjectedFailure, times: usize) {
        self.dom
            .borrow_mut()
            .failures
            .entry(selector.into())
            .or_default()
            .extend(std::iter::repeat(failure).take(times));
    }

    /// Kill the session; every later call returns `SessionLost`
    pub fn lose_session(&self, message: impl Into<String>) {
        self.dom.borrow_mut().lost = Some(message.into());
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.dom.borrow().call_history.clone()
    }

    /// Check if a call with this prefix was made
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.dom
            .borrow()
            .call_history
            .iter()
            .any(|c| c.starts_with(prefix))
    }
}

impl BrowserSession for MockSession {
    type Element = MockHandle;

    fn find_all(&self, locator: &Locator) -> ProbeResult<Vec<MockHandle>> {
        let key = key_for(locator);
        let mut dom = self.dom.borrow_mut();
        dom.check_alive()?;
        if let Some(failure) = dom.take_failure(&key) {
            return Err(failure.into_error(&key));
        }
        let handles: Vec<MockHandle> = dom
            .index
            .get(&key)
            .map(|ids| {
                ids.iter()
                    .map(|id| MockHandle {
                        dom: Rc::clone(&self.dom),
                        id: *id,
                        key: key.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(handles)
    }

    fn current_url(&self) -> ProbeResult<String> {
        let dom = self.dom.borrow();
        dom.check_alive()?;
        Ok(dom.url.clone())
    }

    fn navigate(&self, url: &str) -> ProbeResult<()> {
        let mut dom = self.dom.borrow_mut();
        dom.check_alive()?;
        dom.call_history.push(format!("navigate:{url}"));
        dom.navigate_to(url);
        Ok(())
    }
}

/// Handle to an element of a [`MockSession`]
#[derive(Debug, Clone)]
pub struct MockHandle {
    dom: Rc<RefCell<MockDom>>,
    id: usize,
    key: String,
}

impl ElementHandle for MockHandle {
    fn is_visible(&self) -> ProbeResult<bool> {
        Ok(self.dom.borrow().attached(self.id, &self.key)?.is_visible())
    }

    fn is_enabled(&self) -> ProbeResult<bool> {
        Ok(self.dom.borrow().attached(self.id, &self.key)?.element.enabled)
    }

    fn text(&self) -> ProbeResult<String> {
        Ok(self
            .dom
            .borrow()
            .attached(self.id, &self.key)?
            .element
            .text
            .clone())
    }

    fn attribute(&self, name: &str) -> ProbeResult<Option<String>> {
        Ok(self
            .dom
            .borrow()
            .attached(self.id, &self.key)?
            .element
            .attributes
            .get(name)
            .cloned())
    }

    fn clear(&self) -> ProbeResult<()> {
        let mut dom = self.dom.borrow_mut();
        dom.attached_mut(self.id, &self.key)?
            .element
            .attributes
            .insert("value".to_string(), String::new());
        dom.call_history.push(format!("clear:{}", self.key));
        Ok(())
    }

    fn type_text(&self, text: &str) -> ProbeResult<()> {
        let mut dom = self.dom.borrow_mut();
        dom.attached_mut(self.id, &self.key)?
            .element
            .attributes
            .entry("value".to_string())
            .or_default()
            .push_str(text);
        dom.call_history.push(format!("type:{}:{text}", self.key));
        Ok(())
    }

    fn click(&self) -> ProbeResult<()> {
        let mut dom = self.dom.borrow_mut();
        let node = dom.attached(self.id, &self.key)?;
        if !node.is_visible() || !node.element.enabled {
            return Err(ProbeError::driver(format!(
                "element not interactable: {}",
                self.key
            )));
        }
        let action = node.element.on_click.clone();
        dom.call_history.push(format!("click:{}", self.key));
        match action {
            ClickAction::None => {}
            ClickAction::Navigate(url) => dom.navigate_to(&url),
            ClickAction::SubmitCheckout => dom.submit_checkout(),
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod lookup_tests {
        use super::*;

        #[test]
        fn test_find_by_css_and_test_id() {
            let session = MockSession::new();
            session.insert("[data-test='error']", MockElement::new().with_text("boom"));

            let found = session.find_all(&Locator::test_id("error")).unwrap();
            assert_eq!(found.len(), 1);
            assert_eq!(found[0].text().unwrap(), "boom");
            assert!(session
                .find_all(&Locator::css(".error"))
                .unwrap()
                .is_empty());
        }

        #[test]
        fn test_alias_resolves_same_element() {
            let session = MockSession::new();
            let id = session.insert(".error-message-container h3", MockElement::new());
            session.alias("[data-test='error']", id);
            session.set_text(id, "shared");

            let by_alias = session.find_all(&Locator::test_id("error")).unwrap();
            assert_eq!(by_alias[0].text().unwrap(), "shared");
        }

        #[test]
        fn test_xpath_keyed_by_expression() {
            let session = MockSession::new();
            session.insert("//h3", MockElement::new());
            assert_eq!(session.find_all(&Locator::xpath("//h3")).unwrap().len(), 1);
        }

        #[test]
        fn test_detached_handle_is_stale() {
            let session = MockSession::new();
            let id = session.insert(".error", MockElement::new());
            let handle = session.find_all(&Locator::css(".error")).unwrap().remove(0);
            session.detach(id);

            assert!(matches!(
                handle.is_visible(),
                Err(ProbeError::StaleElement { .. })
            ));
            assert!(session.find_all(&Locator::css(".error")).unwrap().is_empty());
        }
    }

    mod visibility_tests {
        use super::*;

        #[test]
        fn test_hidden_and_delayed() {
            let session = MockSession::new();
            session.insert(".hidden", MockElement::new().hidden());
            session.insert(
                ".late",
                MockElement::new().appear_after(Duration::from_millis(30)),
            );

            let hidden = session.find_all(&Locator::css(".hidden")).unwrap();
            assert!(!hidden[0].is_visible().unwrap());

            let late = session.find_all(&Locator::css(".late")).unwrap();
            assert!(!late[0].is_visible().unwrap());
            std::thread::sleep(Duration::from_millis(40));
            assert!(late[0].is_visible().unwrap());
        }

        #[test]
        fn test_click_hidden_fails() {
            let session = MockSession::new();
            session.insert("#go", MockElement::new().hidden());
            let handle = session.find_all(&Locator::css("#go")).unwrap().remove(0);
            assert!(matches!(handle.click(), Err(ProbeError::Driver { .. })));
        }
    }

    mod failure_tests {
        use super::*;

        #[test]
        fn test_transient_failure_consumed() {
            let session = MockSession::new();
            session.insert(".error", MockElement::new());
            session.fail_next(".error", InjectedFailure::Transient, 2);

            let locator = Locator::css(".error");
            assert!(matches!(
                session.find_all(&locator),
                Err(ProbeError::Driver { .. })
            ));
            assert!(session.find_all(&locator).is_err());
            assert_eq!(session.find_all(&locator).unwrap().len(), 1);
        }

        #[test]
        fn test_session_lost_is_sticky() {
            let session = MockSession::new();
            session.fail_next(".error", InjectedFailure::SessionLost, 1);

            let err = session.find_all(&Locator::css(".error")).unwrap_err();
            assert!(err.is_fatal());
            assert!(session.current_url().unwrap_err().is_fatal());
        }

        #[test]
        fn test_lose_session() {
            let session = MockSession::new();
            session.lose_session("crashed");
            assert!(session.navigate("https://shop.test").unwrap_err().is_fatal());
        }
    }

    mod interaction_tests {
        use super::*;

        #[test]
        fn test_clear_and_type() {
            let session = MockSession::new();
            let id = session.insert("#name", MockElement::new().with_value("old"));
            let handle = session.find_all(&Locator::css("#name")).unwrap().remove(0);

            handle.clear().unwrap();
            handle.type_text("Ada").unwrap();
            assert_eq!(session.value(id), "Ada");
            assert_eq!(handle.attribute("value").unwrap().as_deref(), Some("Ada"));
            assert!(session.was_called("clear:#name"));
            assert!(session.was_called("type:#name:Ada"));
        }

        #[test]
        fn test_click_navigates() {
            let session = MockSession::new();
            session.insert(
                "#cart",
                MockElement::new().on_click(ClickAction::Navigate("https://shop.test/cart.html".into())),
            );
            let handle = session.find_all(&Locator::css("#cart")).unwrap().remove(0);
            handle.click().unwrap();

            assert_eq!(session.current_url().unwrap(), "https://shop.test/cart.html");
            assert_eq!(session.history(), vec!["click:#cart".to_string()]);
        }
    }
}
