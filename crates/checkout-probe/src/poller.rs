//! Deadline-bounded polling.
//!
//! The poller invokes a probe every tick until it reports a match or the
//! poll window elapses. Running out of time is a normal negative result,
//! not an error: a valid submission renders no error at all.
//!
//! Probe errors are split by [`ProbeError::is_fatal`](crate::ProbeError::is_fatal). Recoverable ones
//! (stale handles, transient driver hiccups) count as "no match this tick";
//! a lost session stops the loop and propagates.

use serde::Serialize;
use std::time::{Duration, Instant};

use crate::locator::Locator;
use crate::result::ProbeResult;

/// Shortest pause between probes, whatever tick is configured
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(10);

/// What a successful probe saw
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeMatch {
    /// Trimmed text of the matched element (may be empty for presence checks)
    pub text: String,
    /// Candidate that matched
    pub source: Locator,
}

impl ProbeMatch {
    /// Create a match
    #[must_use]
    pub fn new(source: Locator, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source,
        }
    }
}

/// Result of one poll call. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollResult {
    found: bool,
    text: String,
    source: Option<Locator>,
    elapsed_ticks: u32,
    #[serde(skip)]
    elapsed: Duration,
}

impl PollResult {
    /// A positive result
    #[must_use]
    pub fn found(m: ProbeMatch, elapsed_ticks: u32, elapsed: Duration) -> Self {
        Self {
            found: true,
            text: m.text,
            source: Some(m.source),
            elapsed_ticks,
            elapsed,
        }
    }

    /// A negative result: empty text, no source
    #[must_use]
    pub fn not_found(elapsed_ticks: u32, elapsed: Duration) -> Self {
        Self {
            found: false,
            text: String::new(),
            source: None,
            elapsed_ticks,
            elapsed,
        }
    }

    /// Whether the signal was seen
    #[must_use]
    pub const fn is_found(&self) -> bool {
        self.found
    }

    /// Matched text (empty when not found)
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Candidate that matched
    #[must_use]
    pub const fn source(&self) -> Option<&Locator> {
        self.source.as_ref()
    }

    /// Number of probe invocations
    #[must_use]
    pub const fn elapsed_ticks(&self) -> u32 {
        self.elapsed_ticks
    }

    /// Wall time spent polling
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// Blocking sleep-and-recheck loop with an explicit tick and window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatePoller {
    tick_interval: Duration,
    max_wait: Duration,
}

impl StatePoller {
    /// Create a poller
    #[must_use]
    pub const fn new(tick_interval: Duration, max_wait: Duration) -> Self {
        Self {
            tick_interval,
            max_wait,
        }
    }

    /// A poller that probes exactly once
    #[must_use]
    pub const fn once() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// Tick interval
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Poll window
    #[must_use]
    pub const fn max_wait(&self) -> Duration {
        self.max_wait
    }

    /// Copy with a different window
    #[must_use]
    pub const fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Probe until a match or until the window elapses.
    ///
    /// A negative result is returned only once at least `max_wait` has
    /// passed; the final probe runs at the deadline. Ticks shorter than
    /// [`MIN_TICK_INTERVAL`] are raised to it.
    ///
    /// # Errors
    ///
    /// Returns the probe's error only when it is fatal
    pub fn poll<F>(&self, description: &str, mut probe: F) -> ProbeResult<PollResult>
    where
        F: FnMut() -> ProbeResult<Option<ProbeMatch>>,
    {
        let start = Instant::now();
        let tick = self.tick_interval.max(MIN_TICK_INTERVAL);
        let mut ticks: u32 = 0;

        loop {
            ticks = ticks.saturating_add(1);
            match probe() {
                Ok(Some(m)) => {
                    tracing::debug!(
                        signal = description,
                        source = %m.source,
                        ticks,
                        "signal found"
                    );
                    return Ok(PollResult::found(m, ticks, start.elapsed()));
                }
                Ok(None) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::debug!(signal = description, error = %e, "probe failed, treated as no match");
                }
            }

            let elapsed = start.elapsed();
            if elapsed >= self.max_wait {
                tracing::debug!(signal = description, ticks, ?elapsed, "poll window elapsed");
                return Ok(PollResult::not_found(ticks, elapsed));
            }
            std::thread::sleep(tick.min(self.max_wait - elapsed));
        }
    }
}

impl Default for StatePoller {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(crate::config::DEFAULT_TICK_INTERVAL_MS),
            Duration::from_millis(crate::config::DEFAULT_MAX_WAIT_MS),
        )
    }
}

/// Fixed pause after an action, before any state is queried
pub fn settle(delay: Duration) {
    if delay.is_zero() {
        return;
    }
    tracing::debug!(?delay, "settling");
    std::thread::sleep(delay);
}

/// Convenience for probes that ignore recoverable failures of one candidate
pub(crate) fn absorb<T>(result: ProbeResult<T>, fallback: T) -> ProbeResult<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            tracing::debug!(error = %e, "candidate probe failed");
            Ok(fallback)
        }
    }
}
