//! Chromium backend over CDP.
//!
//! Wraps chromiumoxide behind the synchronous [`BrowserSession`] trait. The
//! session owns a tokio runtime and blocks on each CDP call, so it must not
//! be driven from inside another async runtime.
//!
//! The CDP handler runs on the session's runtime; once it stops, every
//! call reports [`ProbeError::SessionLost`].

use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::Deserialize;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Runtime;

use crate::config::BrowserConfig;
use crate::locator::Locator;
use crate::result::{ProbeError, ProbeResult};
use crate::session::{BrowserSession, ElementHandle};

const RENDERED_BOX_JS: &str = "function() {
    const style = window.getComputedStyle(this);
    const rect = this.getBoundingClientRect();
    return JSON.stringify({
        visibility: style.visibility,
        display: style.display,
        width: rect.width,
        height: rect.height,
    });
}";

const IS_ENABLED_JS: &str = "function() { return !this.disabled; }";

const VALUE_JS: &str = "function() { return this.value === undefined ? null : String(this.value); }";

const SELECT_ALL_JS: &str = "function() { this.focus(); if (this.select) { this.select(); } }";

/// Computed style and layout box of an element
#[derive(Debug, Clone, PartialEq, Deserialize)]
struct RenderedBox {
    visibility: String,
    display: String,
    width: f64,
    height: f64,
}

impl RenderedBox {
    /// Displayed only with a positive area; an empty block still has full width
    fn is_displayed(&self) -> bool {
        self.visibility != "hidden"
            && self.visibility != "collapse"
            && self.display != "none"
            && self.width > 0.0
            && self.height > 0.0
    }
}

fn classify(alive: &AtomicBool, expression: &str, message: String) -> ProbeError {
    if !alive.load(Ordering::SeqCst) {
        return ProbeError::session_lost(message);
    }
    if message.contains("No node with given id") || message.contains("Could not find node") {
        return ProbeError::StaleElement {
            expression: expression.to_string(),
        };
    }
    ProbeError::driver(message)
}

struct Bridge {
    runtime: Arc<Runtime>,
    alive: Arc<AtomicBool>,
}

impl Bridge {
    fn block<T, E, F>(&self, expression: &str, future: F) -> ProbeResult<T>
    where
        E: fmt::Display,
        F: Future<Output = Result<T, E>>,
    {
        if !self.alive.load(Ordering::SeqCst) {
            return Err(ProbeError::session_lost("CDP handler stopped"));
        }
        self.runtime
            .block_on(future)
            .map_err(|e| classify(&self.alive, expression, e.to_string()))
    }
}

/// A real Chromium tab driven over CDP
pub struct ChromiumSession {
    bridge: Bridge,
    browser: CdpBrowser,
    page: Page,
    handler: tokio::task::JoinHandle<()>,
}

impl fmt::Debug for ChromiumSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChromiumSession")
            .field("alive", &self.bridge.alive.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl ChromiumSession {
    /// Launch Chromium and open a blank tab
    ///
    /// # Errors
    ///
    /// Returns error if the runtime or browser cannot be started
    pub fn launch(config: &BrowserConfig) -> ProbeResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        let mut builder =
            CdpConfig::builder().window_size(config.viewport_width, config.viewport_height);
        if !config.headless {
            builder = builder.with_head();
        }
        if !config.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = config.chromium_path {
            builder = builder.chrome_executable(path);
        }
        let cdp_config = builder
            .build()
            .map_err(|message| ProbeError::BrowserLaunchError { message })?;

        let (browser, mut handler) = runtime.block_on(CdpBrowser::launch(cdp_config)).map_err(
            |e| ProbeError::BrowserLaunchError {
                message: e.to_string(),
            },
        )?;

        let alive = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&alive);
        let handler = runtime.spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "CDP handler event error");
                }
            }
            flag.store(false, Ordering::SeqCst);
            tracing::warn!("CDP handler stopped");
        });

        let page = runtime
            .block_on(browser.new_page("about:blank"))
            .map_err(|e| ProbeError::BrowserLaunchError {
                message: e.to_string(),
            })?;

        tracing::info!(
            headless = config.headless,
            width = config.viewport_width,
            height = config.viewport_height,
            "chromium launched"
        );
        Ok(Self {
            bridge: Bridge {
                runtime: Arc::new(runtime),
                alive,
            },
            browser,
            page,
            handler,
        })
    }

    /// Whether the CDP connection is still up
    pub fn is_alive(&self) -> bool {
        self.bridge.alive.load(Ordering::SeqCst)
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        if self.is_alive() {
            if let Err(e) = self.bridge.runtime.block_on(self.browser.close()) {
                tracing::debug!(error = %e, "closing chromium failed");
            }
        }
        self.handler.abort();
    }
}

impl BrowserSession for ChromiumSession {
    type Element = ChromiumElement;

    fn find_all(&self, locator: &Locator) -> ProbeResult<Vec<ChromiumElement>> {
        let expression = locator.expression();
        let elements = match locator.to_css() {
            Some(css) => self.bridge.block(expression, self.page.find_elements(css))?,
            None => self.bridge.block(expression, self.page.find_xpaths(expression))?,
        };
        Ok(elements
            .into_iter()
            .map(|element| ChromiumElement {
                bridge: Bridge {
                    runtime: Arc::clone(&self.bridge.runtime),
                    alive: Arc::clone(&self.bridge.alive),
                },
                element,
                expression: expression.to_string(),
            })
            .collect())
    }

    fn current_url(&self) -> ProbeResult<String> {
        Ok(self
            .bridge
            .block("location", self.page.url())?
            .unwrap_or_default())
    }

    fn navigate(&self, url: &str) -> ProbeResult<()> {
        self.bridge
            .block(url, self.page.goto(url))
            .map_err(|e| match e {
                ProbeError::Driver { message } => ProbeError::NavigationError {
                    url: url.to_string(),
                    message,
                },
                other => other,
            })?;
        tracing::info!(url, "navigated");
        Ok(())
    }
}

/// Element of a [`ChromiumSession`] page
pub struct ChromiumElement {
    bridge: Bridge,
    element: Element,
    expression: String,
}

impl fmt::Debug for ChromiumElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChromiumElement")
            .field("expression", &self.expression)
            .finish_non_exhaustive()
    }
}

impl ChromiumElement {
    fn js(&self, function: &str) -> ProbeResult<Option<serde_json::Value>> {
        let returns = self
            .bridge
            .block(&self.expression, self.element.call_js_fn(function, false))?;
        Ok(returns.result.value)
    }
}

impl ElementHandle for ChromiumElement {
    fn is_visible(&self) -> ProbeResult<bool> {
        let rendered = self
            .js(RENDERED_BOX_JS)?
            .and_then(|v| v.as_str().map(str::to_owned))
            .and_then(|raw| serde_json::from_str::<RenderedBox>(&raw).ok());
        Ok(rendered.is_some_and(|b| b.is_displayed()))
    }

    fn is_enabled(&self) -> ProbeResult<bool> {
        Ok(self
            .js(IS_ENABLED_JS)?
            .and_then(|v| v.as_bool())
            .unwrap_or(true))
    }

    fn text(&self) -> ProbeResult<String> {
        Ok(self
            .bridge
            .block(&self.expression, self.element.inner_text())?
            .unwrap_or_default())
    }

    fn attribute(&self, name: &str) -> ProbeResult<Option<String>> {
        if name == "value" {
            return Ok(self
                .js(VALUE_JS)?
                .and_then(|v| v.as_str().map(str::to_string)));
        }
        self.bridge
            .block(&self.expression, self.element.attribute(name))
    }

    fn clear(&self) -> ProbeResult<()> {
        self.js(SELECT_ALL_JS)?;
        self.bridge
            .block(&self.expression, self.element.press_key("Backspace"))?;
        Ok(())
    }

    fn type_text(&self, text: &str) -> ProbeResult<()> {
        self.bridge
            .block(&self.expression, self.element.focus())?;
        self.bridge
            .block(&self.expression, self.element.type_str(text))?;
        Ok(())
    }

    fn click(&self) -> ProbeResult<()> {
        self.bridge
            .block(&self.expression, self.element.click())?;
        Ok(())
    }
}
