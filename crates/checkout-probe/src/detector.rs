//! Multi-strategy signal detection.
//!
//! A [`SignalDetector`] answers questions about one logical signal (usually
//! the checkout error) by probing every candidate of its [`LocatorSet`]:
//!
//! - **presence** is the union of all candidates: any visible one counts
//! - **text** walks candidates in priority order and takes the first
//!   visible, non-empty, trimmed text
//!
//! Each probe runs through a [`StatePoller`], so both are deadline-bounded.
//! A candidate that fails to resolve (stale handle, transient driver
//! error) is a miss for that candidate only; a lost session aborts.

use crate::fields::error_mentions_field;
use crate::locator::{Locator, LocatorSet};
use crate::poller::{absorb, PollResult, ProbeMatch, StatePoller};
use crate::result::ProbeResult;
use crate::session::{BrowserSession, ElementHandle};

/// Separator used when joining every visible error message
pub const MESSAGE_SEPARATOR: &str = " | ";

/// Detector for one logical signal
#[derive(Debug)]
pub struct SignalDetector<'s, S: BrowserSession> {
    session: &'s S,
    locators: LocatorSet,
    poller: StatePoller,
}

impl<'s, S: BrowserSession> SignalDetector<'s, S> {
    /// Create a detector
    pub fn new(session: &'s S, locators: LocatorSet, poller: StatePoller) -> Self {
        Self {
            session,
            locators,
            poller,
        }
    }

    /// Candidates probed by this detector
    pub fn locators(&self) -> &LocatorSet {
        &self.locators
    }

    /// Poll until any candidate is visible or the window elapses.
    ///
    /// The matched text is the visible element's trimmed text, possibly
    /// empty.
    pub fn detect_presence(&self) -> ProbeResult<PollResult> {
        let result = self
            .poller
            .poll(self.locators.name(), || self.probe_presence())?;
        if result.is_found() {
            tracing::info!(signal = self.locators.name(), text = result.text(), "signal present");
        }
        Ok(result)
    }

    /// Whether the signal shows up within the poll window
    pub fn is_present(&self) -> ProbeResult<bool> {
        Ok(self.detect_presence()?.is_found())
    }

    /// Poll until a candidate yields non-empty text
    pub fn extract(&self) -> ProbeResult<PollResult> {
        self.poller
            .poll(self.locators.name(), || self.probe_text())
    }

    /// Text of the signal, or an empty string when nothing rendered any
    pub fn extract_text(&self) -> ProbeResult<String> {
        let result = self.extract()?;
        if result.is_found() {
            tracing::info!(signal = self.locators.name(), text = result.text(), "extracted text");
        } else {
            tracing::warn!(signal = self.locators.name(), "no text found");
        }
        Ok(result.text().to_string())
    }

    /// Case-insensitive substring check against the extracted text
    pub fn contains_text(&self, expected: &str) -> ProbeResult<bool> {
        let text = self.extract_text()?;
        let contains = text.to_lowercase().contains(&expected.to_lowercase());
        tracing::info!(expected, actual = %text, contains, "checked signal text");
        Ok(contains)
    }

    /// Whether the extracted text is attributed to `field_name`
    pub fn has_field_error(&self, field_name: &str) -> ProbeResult<bool> {
        let text = self.extract_text()?;
        let attributed = error_mentions_field(field_name, &text);
        tracing::info!(field = field_name, attributed, "checked field error");
        Ok(attributed)
    }

    /// Every visible, non-empty text across all candidates, in candidate
    /// order, without repeats. Probes once.
    ///
    /// A text already contained in an earlier one (a container and its
    /// heading, say) is skipped.
    pub fn collect_texts(&self) -> ProbeResult<Vec<String>> {
        let mut texts: Vec<String> = Vec::new();
        for locator in &self.locators {
            for element in absorb(self.session.find_all(locator), Vec::new())? {
                if let Some(text) = visible_text(&element, locator)? {
                    if !texts.iter().any(|seen| seen.contains(&text)) {
                        texts.push(text);
                    }
                }
            }
        }
        Ok(texts)
    }

    /// [`collect_texts`](Self::collect_texts) joined with `" | "`
    pub fn joined_texts(&self) -> ProbeResult<String> {
        let joined = self.collect_texts()?.join(MESSAGE_SEPARATOR);
        tracing::info!(signal = self.locators.name(), messages = %joined, "collected messages");
        Ok(joined)
    }

    fn probe_presence(&self) -> ProbeResult<Option<ProbeMatch>> {
        for locator in &self.locators {
            for element in absorb(self.session.find_all(locator), Vec::new())? {
                if absorb(element.is_visible(), false)? {
                    let text = absorb(element.text(), String::new())?;
                    return Ok(Some(ProbeMatch::new(locator.clone(), text.trim())));
                }
            }
            tracing::debug!(candidate = %locator, "not visible");
        }
        Ok(None)
    }

    fn probe_text(&self) -> ProbeResult<Option<ProbeMatch>> {
        for locator in &self.locators {
            for element in absorb(self.session.find_all(locator), Vec::new())? {
                if let Some(text) = visible_text(&element, locator)? {
                    return Ok(Some(ProbeMatch::new(locator.clone(), text)));
                }
            }
        }
        Ok(None)
    }
}

/// Trimmed text of a visible element, `None` if hidden, empty or unreadable
fn visible_text<E: ElementHandle>(element: &E, locator: &Locator) -> ProbeResult<Option<String>> {
    if !absorb(element.is_visible(), false)? {
        return Ok(None);
    }
    let text = absorb(element.text(), String::new())?;
    let text = text.trim();
    if text.is_empty() {
        tracing::debug!(candidate = %locator, "visible but empty");
        return Ok(None);
    }
    Ok(Some(text.to_string()))
}
