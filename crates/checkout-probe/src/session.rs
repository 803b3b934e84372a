//! Browser session abstraction.
//!
//! The probe only needs a handful of driver primitives, so it talks to the
//! browser through two small synchronous traits. `ChromiumSession` (with
//! the `browser` feature) drives a real Chromium over CDP; [`MockSession`]
//! backs unit tests.
//!
//! [`MockSession`]: crate::MockSession
//!
//! # Error contract
//!
//! - `find_all` returns an empty vector when nothing matches; it does not
//!   raise for "not found".
//! - A dead session is reported as [`ProbeError::SessionLost`]; every other
//!   error is treated as a recoverable probe failure by the detector.

use crate::locator::{Locator, LocatorSet};
use crate::poller::absorb;
use crate::result::{ProbeError, ProbeResult};

/// Handle to one element of the rendered page
pub trait ElementHandle {
    /// Whether the element is rendered and visible
    fn is_visible(&self) -> ProbeResult<bool>;

    /// Whether the element accepts interaction
    fn is_enabled(&self) -> ProbeResult<bool>;

    /// Rendered text content
    fn text(&self) -> ProbeResult<String>;

    /// Attribute or live property value (`value` reads the current input value)
    fn attribute(&self, name: &str) -> ProbeResult<Option<String>>;

    /// Clear an input
    fn clear(&self) -> ProbeResult<()>;

    /// Type text into an input
    fn type_text(&self, text: &str) -> ProbeResult<()>;

    /// Click the element
    fn click(&self) -> ProbeResult<()>;
}

/// An exclusively owned browser session
pub trait BrowserSession {
    /// Element handle type produced by this session
    type Element: ElementHandle;

    /// All elements matching a locator, possibly none
    fn find_all(&self, locator: &Locator) -> ProbeResult<Vec<Self::Element>>;

    /// Current page URL
    fn current_url(&self) -> ProbeResult<String>;

    /// Navigate to a URL
    fn navigate(&self, url: &str) -> ProbeResult<()>;

    /// First element matched by any candidate of `set`, in candidate order.
    ///
    /// Recoverable lookup failures skip to the next candidate.
    fn locate(&self, set: &LocatorSet) -> ProbeResult<Option<Self::Element>> {
        for locator in set {
            let mut found = absorb(self.find_all(locator), Vec::new())?;
            if !found.is_empty() {
                return Ok(Some(found.swap_remove(0)));
            }
        }
        Ok(None)
    }

    /// Like [`locate`](Self::locate) but missing elements are an error
    fn require(&self, set: &LocatorSet) -> ProbeResult<Self::Element> {
        self.locate(set)?.ok_or_else(|| ProbeError::ElementNotFound {
            expression: set.name().to_string(),
        })
    }
}
