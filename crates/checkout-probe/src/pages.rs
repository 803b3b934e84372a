//! Page objects around checkout step one.
//!
//! Every page here has the same load contract: the title element is
//! visible, the URL contains the page's path fragment, and the title text
//! matches exactly. Page objects own the session; moving from one page to
//! the next moves it along.

use crate::config::ProbeConfig;
use crate::poller::absorb;
use crate::result::ProbeResult;
use crate::session::{BrowserSession, ElementHandle};
use crate::signals::{self, CART_PATH, CART_TITLE, CHECKOUT_STEP_TWO_PATH, CHECKOUT_STEP_TWO_TITLE};

/// A page reachable during checkout
pub trait PageObject {
    /// URL fragment identifying the page (e.g., "cart.html")
    fn url_pattern(&self) -> &str;

    /// Title text rendered on the page
    fn expected_title(&self) -> &str;

    /// Check the page's load contract once
    fn is_loaded(&self) -> ProbeResult<bool>;

    /// Get the page name for logging/debugging
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Load contract shared by all pages.
///
/// Recoverable failures read as "not loaded".
pub fn verify_page<S: BrowserSession>(
    session: &S,
    url_pattern: &str,
    expected_title: &str,
) -> ProbeResult<bool> {
    let Some(title) = session.locate(&signals::page_title())? else {
        tracing::info!(page = url_pattern, "title element not found");
        return Ok(false);
    };
    if !absorb(title.is_visible(), false)? {
        tracing::info!(page = url_pattern, "title not visible");
        return Ok(false);
    }

    let url = absorb(session.current_url(), String::new())?;
    let title_text = absorb(title.text(), String::new())?;
    let loaded = url.contains(url_pattern) && title_text.trim() == expected_title;
    tracing::info!(page = url_pattern, %url, title = %title_text.trim(), loaded, "page load check");
    Ok(loaded)
}

macro_rules! session_page {
    ($(#[$meta:meta])* $name:ident, $path:expr, $title:expr) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $name<S: BrowserSession> {
            session: S,
            config: ProbeConfig,
        }

        impl<S: BrowserSession> $name<S> {
            /// Wrap a session already showing this page
            pub fn new(session: S, config: ProbeConfig) -> Self {
                tracing::info!(page = $path, "page object initialized");
                Self { session, config }
            }

            /// Borrow the session
            pub fn session(&self) -> &S {
                &self.session
            }

            /// Probe configuration carried over from the previous page
            pub fn config(&self) -> &ProbeConfig {
                &self.config
            }

            /// Hand the session back
            pub fn into_session(self) -> S {
                self.session
            }
        }

        impl<S: BrowserSession> PageObject for $name<S> {
            fn url_pattern(&self) -> &str {
                $path
            }

            fn expected_title(&self) -> &str {
                $title
            }

            fn is_loaded(&self) -> ProbeResult<bool> {
                verify_page(&self.session, $path, $title)
            }
        }
    };
}

session_page!(
    /// Checkout step two (order overview)
    CheckoutOverviewPage,
    CHECKOUT_STEP_TWO_PATH,
    CHECKOUT_STEP_TWO_TITLE
);

session_page!(
    /// The cart view
    CartPage,
    CART_PATH,
    CART_TITLE
);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mock::{MockElement, MockSession};
    use crate::signals::{CHECKOUT_STEP_ONE_PATH, CHECKOUT_STEP_ONE_TITLE};

    fn page_at(url: &str, title: &str) -> MockSession {
        let session = MockSession::with_url(url);
        session.insert("[data-test='title']", MockElement::new().with_text(title));
        session
    }

    mod verify_tests {
        use super::*;

        #[test]
        fn test_all_three_conditions() {
            let session = page_at(
                "https://shop.test/checkout-step-one.html",
                CHECKOUT_STEP_ONE_TITLE,
            );
            assert!(verify_page(&session, CHECKOUT_STEP_ONE_PATH, CHECKOUT_STEP_ONE_TITLE).unwrap());
        }

        #[test]
        fn test_wrong_url() {
            let session = page_at("https://shop.test/inventory.html", CHECKOUT_STEP_ONE_TITLE);
            assert!(!verify_page(&session, CHECKOUT_STEP_ONE_PATH, CHECKOUT_STEP_ONE_TITLE).unwrap());
        }

        #[test]
        fn test_title_must_match_exactly() {
            let session = page_at(
                "https://shop.test/checkout-step-one.html",
                "Checkout: Your Information (1/2)",
            );
            assert!(!verify_page(&session, CHECKOUT_STEP_ONE_PATH, CHECKOUT_STEP_ONE_TITLE).unwrap());
        }

        #[test]
        fn test_hidden_title() {
            let session = MockSession::with_url("https://shop.test/checkout-step-one.html");
            session.insert(
                ".title",
                MockElement::new().with_text(CHECKOUT_STEP_ONE_TITLE).hidden(),
            );
            assert!(!verify_page(&session, CHECKOUT_STEP_ONE_PATH, CHECKOUT_STEP_ONE_TITLE).unwrap());
        }
    }

    mod page_tests {
        use super::*;

        #[test]
        fn test_cart_page() {
            let page = CartPage::new(
                page_at("https://shop.test/cart.html", CART_TITLE),
                ProbeConfig::default(),
            );
            assert!(page.is_loaded().unwrap());
            assert_eq!(page.url_pattern(), "cart.html");
            assert!(page.page_name().contains("CartPage"));
        }

        #[test]
        fn test_overview_page_not_loaded_elsewhere() {
            let page = CheckoutOverviewPage::new(
                page_at("https://shop.test/cart.html", CART_TITLE),
                ProbeConfig::default(),
            );
            assert!(!page.is_loaded().unwrap());
            let session = page.into_session();
            assert!(session.current_url().unwrap().ends_with("cart.html"));
        }
    }
}
