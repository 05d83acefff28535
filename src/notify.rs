//! User-facing notices, delivered via freedesktop D-Bus notifications.
//!
//! Every dispatch outcome produces exactly one notice. Desktop
//! notifications are sent with a stable replaces-id so a new notice
//! always supersedes one still on screen.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use zbus::{proxy, Connection};

/// Auto-dismiss timeout for transient notices.
const EXPIRE_TIMEOUT_MS: i32 = 3000;

/// The outcome surface shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// A capture completed; names the mode kind that ran.
    Success { kind: String },
    /// Transform ran but found nothing applicable.
    Empty { message: String },
    /// A second trigger arrived while a dispatch was running.
    Busy,
    /// The picker was cancelled.
    Cancelled,
    /// An image was saved to disk instead of the clipboard.
    Saved { filename: String },
    /// A dispatch failed; carries the category-specific sentence.
    Error { message: String },
    /// Delayed best-effort recovery suggestion after an error.
    Recovery { message: String },
}

impl Notice {
    /// Title line of the notification.
    pub fn summary(&self) -> &'static str {
        match self {
            Notice::Success { .. } => "Copied",
            Notice::Empty { .. } => "Nothing to copy",
            Notice::Busy => "Please wait",
            Notice::Cancelled => "Canceled",
            Notice::Saved { .. } => "Saved",
            Notice::Error { .. } => "Copy failed",
            Notice::Recovery { .. } => "Suggestion",
        }
    }

    /// Body text of the notification.
    pub fn body(&self) -> String {
        match self {
            Notice::Success { kind } => format!("{} copied to clipboard", kind),
            Notice::Empty { message } => message.clone(),
            Notice::Busy => "Another copy is still in progress".to_string(),
            Notice::Cancelled => "Selection canceled".to_string(),
            Notice::Saved { filename } => format!("Saved as {}", filename),
            Notice::Error { message } => message.clone(),
            Notice::Recovery { message } => message.clone(),
        }
    }
}

/// Delivery mechanism for notices. Mocked in tests.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);
}

/// D-Bus interface for freedesktop Notifications.
#[proxy(
    interface = "org.freedesktop.Notifications",
    default_service = "org.freedesktop.Notifications",
    default_path = "/org/freedesktop/Notifications"
)]
trait Notifications {
    #[allow(clippy::too_many_arguments)]
    fn notify(
        &self,
        app_name: &str,
        replaces_id: u32,
        app_icon: &str,
        summary: &str,
        body: &str,
        actions: Vec<&str>,
        hints: HashMap<&str, zbus::zvariant::Value<'_>>,
        expire_timeout: i32,
    ) -> zbus::Result<u32>;
}

/// Desktop notifier backed by the session bus.
///
/// Remembers the id of the last notification it sent and reuses it, so
/// consecutive notices replace each other instead of stacking.
pub struct DesktopNotifier {
    runtime_handle: tokio::runtime::Handle,
    last_id: Arc<AtomicU32>,
}

impl DesktopNotifier {
    pub fn new(runtime_handle: tokio::runtime::Handle) -> Self {
        Self {
            runtime_handle,
            last_id: Arc::new(AtomicU32::new(0)),
        }
    }

    async fn send(summary: &str, body: &str, replaces: u32) -> Result<u32, String> {
        let connection = Connection::session()
            .await
            .map_err(|e| format!("Failed to connect to session bus: {}", e))?;
        let proxy = NotificationsProxy::new(&connection)
            .await
            .map_err(|e| format!("Failed to create notifications proxy: {}", e))?;
        proxy
            .notify(
                "domclip",
                replaces,
                "edit-copy",
                summary,
                body,
                vec![],
                HashMap::new(),
                EXPIRE_TIMEOUT_MS,
            )
            .await
            .map_err(|e| format!("Failed to send notification: {}", e))
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, notice: &Notice) {
        let summary = notice.summary().to_string();
        let body = notice.body();
        let last_id = Arc::clone(&self.last_id);
        // Non-blocking: the dispatch pipeline never waits on the bus.
        self.runtime_handle.spawn(async move {
            let replaces = last_id.load(Ordering::Relaxed);
            match Self::send(&summary, &body, replaces).await {
                Ok(id) => last_id.store(id, Ordering::Relaxed),
                Err(e) => log::warn!("Failed to send notification: {}", e),
            }
        });
    }
}

/// Log-only notifier used by the CLI and headless runs.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: &Notice) {
        match notice {
            Notice::Error { .. } => log::error!("{}: {}", notice.summary(), notice.body()),
            Notice::Busy | Notice::Empty { .. } => {
                log::warn!("{}: {}", notice.summary(), notice.body())
            }
            _ => log::info!("{}: {}", notice.summary(), notice.body()),
        }
    }
}
