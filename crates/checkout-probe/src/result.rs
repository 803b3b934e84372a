//! Result and error types for checkout-probe.

use thiserror::Error;

/// Result type for checkout-probe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors that can occur while driving or inspecting a page
#[derive(Debug, Error)]
pub enum ProbeError {
    /// No element resolved for a locator
    #[error("Element not found: {expression}")]
    ElementNotFound {
        /// Locator expression that resolved to nothing
        expression: String,
    },

    /// Element handle no longer attached to the document
    #[error("Stale element reference: {expression}")]
    StaleElement {
        /// Locator expression the handle came from
        expression: String,
    },

    /// Transient driver error while talking to the browser
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// The automation session is unusable
    #[error("Browser session lost: {message}")]
    SessionLost {
        /// Error message
        message: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunchError {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Operation called in a state that does not allow it
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Invalid configuration: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl ProbeError {
    /// Create a transient driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create a session-lost error
    #[must_use]
    pub fn session_lost(message: impl Into<String>) -> Self {
        Self::SessionLost {
            message: message.into(),
        }
    }

    /// Create an invalid-state error
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Whether this error means the session cannot be recovered.
    ///
    /// Fatal errors always propagate out of detection queries; everything
    /// else is absorbed as "this candidate did not match".
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::SessionLost { .. })
    }
}
