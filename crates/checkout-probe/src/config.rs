//! Probe configuration.
//!
//! Timing values are plain milliseconds so they can come from a YAML/JSON
//! file (`tickIntervalMs`, `maxWaitMs`, `settleDelayMs`) or from the
//! environment, and are overridable in code through the `with_*` setters.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::poller::StatePoller;
use crate::result::{ProbeError, ProbeResult};

/// Default tick interval between probes (500ms)
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 500;

/// Default poll window for error detection (5 seconds)
pub const DEFAULT_MAX_WAIT_MS: u64 = 5_000;

/// Default settle delay after submitting the form (1.5 seconds)
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 1_500;

/// Environment variable overriding `tickIntervalMs`
pub const ENV_TICK_INTERVAL_MS: &str = "CHECKOUT_PROBE_TICK_INTERVAL_MS";

/// Environment variable overriding `maxWaitMs`
pub const ENV_MAX_WAIT_MS: &str = "CHECKOUT_PROBE_MAX_WAIT_MS";

/// Environment variable overriding `settleDelayMs`
pub const ENV_SETTLE_DELAY_MS: &str = "CHECKOUT_PROBE_SETTLE_DELAY_MS";

/// Environment variable overriding `baseUrl`
pub const ENV_BASE_URL: &str = "CHECKOUT_PROBE_BASE_URL";

/// Browser launch configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 800,
            chromium_path: None,
            sandbox: true,
        }
    }
}

impl BrowserConfig {
    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

/// Timing and target configuration for a checkout probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProbeConfig {
    /// Interval between probes in milliseconds
    pub tick_interval_ms: u64,
    /// Maximum poll window in milliseconds
    pub max_wait_ms: u64,
    /// Pause after submit before any detection, in milliseconds
    pub settle_delay_ms: u64,
    /// Storefront base URL
    pub base_url: Option<String>,
    /// Browser launch options
    pub browser: BrowserConfig,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            max_wait_ms: DEFAULT_MAX_WAIT_MS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            base_url: None,
            browser: BrowserConfig::default(),
        }
    }
}

impl ProbeConfig {
    /// Create a config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set tick interval in milliseconds
    #[must_use]
    pub const fn with_tick_interval(mut self, tick_interval_ms: u64) -> Self {
        self.tick_interval_ms = tick_interval_ms;
        self
    }

    /// Set maximum poll window in milliseconds
    #[must_use]
    pub const fn with_max_wait(mut self, max_wait_ms: u64) -> Self {
        self.max_wait_ms = max_wait_ms;
        self
    }

    /// Set settle delay in milliseconds
    #[must_use]
    pub const fn with_settle_delay(mut self, settle_delay_ms: u64) -> Self {
        self.settle_delay_ms = settle_delay_ms;
        self
    }

    /// Set base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set browser options
    #[must_use]
    pub fn with_browser(mut self, browser: BrowserConfig) -> Self {
        self.browser = browser;
        self
    }

    /// Tick interval as Duration
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Poll window as Duration
    #[must_use]
    pub const fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }

    /// Settle delay as Duration
    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Poller configured with this tick interval and window
    #[must_use]
    pub const fn poller(&self) -> StatePoller {
        StatePoller::new(self.tick_interval(), self.max_wait())
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns error if the tick interval is zero
    pub fn validate(&self) -> ProbeResult<()> {
        if self.tick_interval_ms == 0 {
            return Err(ProbeError::Config {
                message: "tickIntervalMs must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> ProbeResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document
    pub fn from_json_str(json: &str) -> ProbeResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn from_file(path: impl AsRef<Path>) -> ProbeResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&contents),
            Some("yaml" | "yml") => Self::from_yaml_str(&contents),
            other => Err(ProbeError::Config {
                message: format!("unsupported config extension: {other:?}"),
            }),
        }
    }

    /// Apply `CHECKOUT_PROBE_*` environment variables
    pub fn with_env_overrides(self) -> ProbeResult<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn with_overrides<F>(mut self, lookup: F) -> ProbeResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse_ms = |key: &str| -> ProbeResult<Option<u64>> {
            lookup(key)
                .map(|raw| {
                    raw.trim().parse::<u64>().map_err(|e| ProbeError::Config {
                        message: format!("{key}={raw:?}: {e}"),
                    })
                })
                .transpose()
        };

        if let Some(ms) = parse_ms(ENV_TICK_INTERVAL_MS)? {
            self.tick_interval_ms = ms;
        }
        if let Some(ms) = parse_ms(ENV_MAX_WAIT_MS)? {
            self.max_wait_ms = ms;
        }
        if let Some(ms) = parse_ms(ENV_SETTLE_DELAY_MS)? {
            self.settle_delay_ms = ms;
        }
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.base_url = Some(url);
        }
        self.validate()?;
        Ok(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    mod defaults_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let config = ProbeConfig::default();
            assert_eq!(config.tick_interval_ms, 500);
            assert_eq!(config.max_wait_ms, 5_000);
            assert_eq!(config.settle_delay_ms, 1_500);
            assert!(config.base_url.is_none());
            assert!(config.browser.headless);
        }

        #[test]
        fn test_builder_chain() {
            let config = ProbeConfig::new()
                .with_tick_interval(100)
                .with_max_wait(1_000)
                .with_settle_delay(0)
                .with_base_url("https://www.saucedemo.com")
                .with_browser(BrowserConfig::default().with_headless(false).with_no_sandbox());
            assert_eq!(config.tick_interval(), Duration::from_millis(100));
            assert_eq!(config.max_wait(), Duration::from_secs(1));
            assert_eq!(config.settle_delay(), Duration::ZERO);
            assert!(!config.browser.headless);
            assert!(!config.browser.sandbox);
        }

        #[test]
        fn test_zero_tick_rejected() {
            assert!(ProbeConfig::new().with_tick_interval(0).validate().is_err());
        }
    }

    mod parse_tests {
        use super::*;

        #[test]
        fn test_yaml_camel_case_keys() {
            let config = ProbeConfig::from_yaml_str(
                "tickIntervalMs: 250\nmaxWaitMs: 1000\nbrowser:\n  headless: false\n",
            )
            .unwrap();
            assert_eq!(config.tick_interval_ms, 250);
            assert_eq!(config.max_wait_ms, 1000);
            assert_eq!(config.settle_delay_ms, DEFAULT_SETTLE_DELAY_MS);
            assert!(!config.browser.headless);
        }

        #[test]
        fn test_json() {
            let config =
                ProbeConfig::from_json_str(r#"{"maxWaitMs": 2000, "baseUrl": "http://localhost"}"#)
                    .unwrap();
            assert_eq!(config.max_wait_ms, 2000);
            assert_eq!(config.base_url.as_deref(), Some("http://localhost"));
        }

        #[test]
        fn test_from_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("probe.yaml");
            std::fs::write(&path, "settleDelayMs: 10\n").unwrap();
            let config = ProbeConfig::from_file(&path).unwrap();
            assert_eq!(config.settle_delay_ms, 10);
        }

        #[test]
        fn test_from_file_bad_extension() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("probe.toml");
            std::fs::write(&path, "").unwrap();
            assert!(matches!(
                ProbeConfig::from_file(&path),
                Err(ProbeError::Config { .. })
            ));
        }
    }

    mod override_tests {
        use super::*;

        fn lookup<'a>(
            vars: &'a HashMap<&'a str, &'a str>,
        ) -> impl Fn(&str) -> Option<String> + 'a {
            move |key| vars.get(key).map(|v| (*v).to_string())
        }

        #[test]
        fn test_overrides_applied() {
            let vars = HashMap::from([
                (ENV_TICK_INTERVAL_MS, "50"),
                (ENV_MAX_WAIT_MS, " 300 "),
                (ENV_BASE_URL, "http://shop.test"),
            ]);
            let config = ProbeConfig::new().with_overrides(lookup(&vars)).unwrap();
            assert_eq!(config.tick_interval_ms, 50);
            assert_eq!(config.max_wait_ms, 300);
            assert_eq!(config.settle_delay_ms, DEFAULT_SETTLE_DELAY_MS);
            assert_eq!(config.base_url.as_deref(), Some("http://shop.test"));
        }

        #[test]
        fn test_bad_override_rejected() {
            let vars = HashMap::from([(ENV_MAX_WAIT_MS, "soon")]);
            let err = ProbeConfig::new().with_overrides(lookup(&vars)).unwrap_err();
            assert!(err.to_string().contains(ENV_MAX_WAIT_MS));
        }
    }
}
