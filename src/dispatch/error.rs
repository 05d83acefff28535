//! Error taxonomy for the capture pipeline.
//!
//! Errors carry their category in the type instead of being
//! reconstructed from message text after the fact. `Unknown` remains
//! for failures crossing an external boundary where the concrete type
//! is not preservable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can abort a dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Empty or missing payload handed to the clipboard adapter.
    #[error("Nothing to copy")]
    NothingToCopy,

    #[error("Clipboard operation failed: {0}")]
    Clipboard(String),

    #[error("Storage operation failed: {0}")]
    Storage(String),

    #[error("Network operation failed: {0}")]
    Network(String),

    #[error("Permission denied: {0}")]
    Permission(String),

    /// The page refuses script access (browser-internal pages,
    /// restricted schemes).
    #[error("Page is not scriptable: {0}")]
    Injection(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Unknown(String),
}

/// Coarse error category, used for user messaging and the error log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Network,
    Permission,
    Storage,
    Clipboard,
    Injection,
    Unknown,
}

impl DispatchError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DispatchError::NothingToCopy | DispatchError::Clipboard(_) => ErrorCategory::Clipboard,
            DispatchError::Storage(_) | DispatchError::Io(_) => ErrorCategory::Storage,
            DispatchError::Network(_) => ErrorCategory::Network,
            DispatchError::Permission(_) => ErrorCategory::Permission,
            DispatchError::Injection(_) => ErrorCategory::Injection,
            DispatchError::Unknown(_) => ErrorCategory::Unknown,
        }
    }
}

impl ErrorCategory {
    /// The one user-facing sentence shown for this category.
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "Network error. Check your connection and try again.",
            ErrorCategory::Permission => "Permission denied. Please refresh the page and try again.",
            ErrorCategory::Storage => {
                "Storage error. Your data may be full. Try clearing some history."
            }
            ErrorCategory::Clipboard => {
                "Clipboard access denied. Please allow clipboard permissions."
            }
            ErrorCategory::Injection => "Cannot access this page. Try a different website.",
            ErrorCategory::Unknown => "An unexpected error occurred. Please try again.",
        }
    }

    /// Whether a delayed best-effort recovery suggestion should follow
    /// the error notice. Restricted to network failures; auto-recovery
    /// for unknown causes was judged too aggressive.
    pub fn wants_recovery(&self) -> bool {
        matches!(self, ErrorCategory::Network)
    }

    /// The recovery suggestion text for [`wants_recovery`] categories.
    ///
    /// [`wants_recovery`]: ErrorCategory::wants_recovery
    pub fn recovery_message(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "Still failing? Try reloading the page.",
            _ => "Please try again.",
        }
    }
}

/// One persisted entry of the capped error log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorLogEntry {
    pub timestamp: DateTime<Utc>,
    pub category: ErrorCategory,
    /// Label of the pipeline stage that failed, e.g. "clipboard" or
    /// "pickerAction".
    pub context: String,
    pub message: String,
    pub url: String,
}

impl ErrorLogEntry {
    pub fn new(error: &DispatchError, context: &str, url: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            category: error.category(),
            context: context.to_string(),
            message: error.to_string(),
            url: url.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_come_from_variants_not_messages() {
        // A storage failure whose message talks about the network must
        // still classify as storage.
        let err = DispatchError::Storage("network drive unavailable".to_string());
        assert_eq!(err.category(), ErrorCategory::Storage);
        assert_eq!(
            DispatchError::NothingToCopy.category(),
            ErrorCategory::Clipboard
        );
    }

    #[test]
    fn only_network_errors_schedule_recovery() {
        for category in [
            ErrorCategory::Permission,
            ErrorCategory::Storage,
            ErrorCategory::Clipboard,
            ErrorCategory::Injection,
            ErrorCategory::Unknown,
        ] {
            assert!(!category.wants_recovery());
        }
        assert!(ErrorCategory::Network.wants_recovery());
    }
}
