//! Error taxonomy for the monitor core.
//!
//! Only authentication failures are fatal to a run. Navigation errors are
//! recoverable per date, and notification failures are logged after state
//! has already been persisted.

use thiserror::Error;

/// Errors surfaced by the monitor core.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Login could not be completed or verified. Fatal for the run.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// A page did not load within the configured timeout. Recoverable —
    /// the date is skipped and the run continues.
    #[error("navigation timed out after {timeout_ms}ms: {url}")]
    NavigationTimeout { url: String, timeout_ms: u64 },

    /// The browser failed to load a page for a reason other than a timeout.
    #[error("navigation failed for {url}: {reason}")]
    Navigation { url: String, reason: String },

    /// The notification channel rejected or never received a message.
    /// Logged, never fatal.
    #[error("notification delivery failed: {0}")]
    Notification(String),

    /// Snapshot store I/O failure.
    #[error("state store error: {0}")]
    Store(#[from] std::io::Error),
}

impl MonitorError {
    /// Whether this error aborts the whole run (vs. one date).
    pub fn is_fatal(&self) -> bool {
        matches!(self, MonitorError::Authentication(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_auth_is_fatal() {
        assert!(MonitorError::Authentication("bad password".into()).is_fatal());
        assert!(!MonitorError::NavigationTimeout {
            url: "https://x.test/app/2026-08-07".into(),
            timeout_ms: 25_000,
        }
        .is_fatal());
        assert!(!MonitorError::Notification("webhook 500".into()).is_fatal());
    }
}
