//! The capture pipeline: transform, clipboard write, history append.
//!
//! One dispatch runs at a time. The busy lock is acquired when a
//! target is confirmed and released on every path out of the critical
//! section; a second trigger while busy is rejected with a "please
//! wait" notice, never queued.

pub mod error;

#[cfg(test)]
mod tests;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::time::{sleep, Duration};

use crate::clipboard::{self, ClipboardBackend, WaylandClipboard};
use crate::dom::Document;
use crate::history::{Capture, ErrorLog, HistorySink, JsonErrorLog, JsonHistorySink, JsonUsageStore, UsageStore};
use crate::mode::Mode;
use crate::notify::{LogNotifier, Notice, Notifier};
use crate::transform::{self, Outcome, TransformInput, TransformOptions};
use error::{DispatchError, ErrorCategory, ErrorLogEntry};

/// Primary clipboard attempts before the legacy fallback.
const CLIPBOARD_RETRY_ATTEMPTS: u32 = 2;
/// Base backoff delay, doubled after each failed attempt.
const CLIPBOARD_RETRY_BASE_DELAY: Duration = Duration::from_millis(500);
/// Delay before the best-effort recovery suggestion after an error.
const RECOVERY_DELAY: Duration = Duration::from_millis(2000);

/// Bundle of collaborators used by the dispatcher. Each component can
/// be mocked in tests.
#[derive(Clone)]
pub struct DispatchDependencies {
    pub clipboard: Arc<dyn ClipboardBackend>,
    pub history: Arc<dyn HistorySink>,
    pub usage: Arc<dyn UsageStore>,
    pub error_log: Arc<dyn ErrorLog>,
    pub notifier: Arc<dyn Notifier>,
}

impl DispatchDependencies {
    /// Production wiring: Wayland clipboard and JSON stores under the
    /// given data directory.
    pub fn at_data_dir(data_dir: PathBuf) -> Self {
        Self {
            clipboard: Arc::new(WaylandClipboard::new()),
            history: Arc::new(JsonHistorySink::new(data_dir.join("history.json"))),
            usage: Arc::new(JsonUsageStore::new(data_dir.join("usage.json"))),
            error_log: Arc::new(JsonErrorLog::new(data_dir.join("errors.json"))),
            notifier: Arc::new(LogNotifier),
        }
    }
}

impl Default for DispatchDependencies {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("domclip");
        Self::at_data_dir(data_dir)
    }
}

/// How one dispatch ended.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Payload on the clipboard, capture in history.
    Completed(Capture),
    /// Transform found nothing applicable; informational notice shown.
    Empty,
    /// Rejected because another dispatch held the lock.
    Busy,
    /// Failed; carries the classified category.
    Failed(ErrorCategory),
}

/// Releases the busy lock when dropped, so no exit path can leak it.
pub struct BusyGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}

/// Runs confirmed captures through transform, clipboard, and history.
#[derive(Clone)]
pub struct Dispatcher {
    deps: DispatchDependencies,
    options: TransformOptions,
    busy: Arc<AtomicBool>,
}

impl Dispatcher {
    pub fn new(deps: DispatchDependencies, options: TransformOptions) -> Self {
        Self {
            deps,
            options,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a dispatch currently holds the lock.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.deps.notifier
    }

    /// Records a mode invocation. Fire-and-forget: a counter failure
    /// never aborts the capture.
    pub fn record_usage(&self, mode: Mode) {
        if let Err(err) = self.deps.usage.increment(mode) {
            log::warn!("Failed to track mode usage: {}", err);
        }
    }

    /// Most-used modes for the quick-launch surface.
    pub fn quick_launch(&self, n: usize) -> Vec<Mode> {
        self.deps.usage.top_n(n)
    }

    fn try_acquire(&self) -> Option<BusyGuard> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            Some(BusyGuard {
                busy: Arc::clone(&self.busy),
            })
        } else {
            None
        }
    }

    /// Takes the busy lock for a confirmed target. The caller holds it
    /// from confirmation through the clipboard write and history
    /// append; refusal notifies the user instead of queueing.
    pub fn begin(&self) -> Option<BusyGuard> {
        let guard = self.try_acquire();
        if guard.is_none() {
            log::warn!("Confirmed target rejected: busy");
            self.deps.notifier.notify(&Notice::Busy);
        }
        guard
    }

    /// Runs the critical section for a confirmed target.
    pub async fn run(
        &self,
        mode: Mode,
        input: TransformInput<'_>,
        doc: &Document,
    ) -> DispatchOutcome {
        let Some(guard) = self.try_acquire() else {
            log::warn!("Dispatch of {} rejected: busy", mode);
            self.deps.notifier.notify(&Notice::Busy);
            return DispatchOutcome::Busy;
        };
        self.run_locked(&guard, mode, input, doc).await
    }

    /// Transform half of the critical section, for a caller whose lock
    /// already spans a proxy round-trip.
    pub async fn run_locked(
        &self,
        _guard: &BusyGuard,
        mode: Mode,
        input: TransformInput<'_>,
        doc: &Document,
    ) -> DispatchOutcome {
        let result = transform::apply(mode, input, doc, &self.options);
        match result {
            Ok(Outcome::Copied { kind, data }) => self.deliver_locked(kind, data, &doc.url).await,
            Ok(Outcome::Empty(message)) => {
                log::info!("{} produced no result: {}", mode, message);
                self.deps.notifier.notify(&Notice::Empty {
                    message: message.to_string(),
                });
                DispatchOutcome::Empty
            }
            Err(err) => self.handle_error(err, &mode.to_string(), &doc.url),
        }
    }

    /// Delivers a payload computed outside the transform registry (the
    /// proxy-backed color modes). `_guard` is the lock the caller took
    /// when the pick confirmed.
    pub async fn complete(
        &self,
        _guard: &BusyGuard,
        kind: String,
        data: String,
        source_url: &str,
    ) -> DispatchOutcome {
        self.deliver_locked(kind, data, source_url).await
    }

    /// Records a capture that did not go through the text-clipboard
    /// path (an image already written by [`write_image`]): history
    /// append plus the success notice. Runs under the caller's lock.
    ///
    /// [`write_image`]: Dispatcher::write_image
    pub fn record_success(
        &self,
        _guard: &BusyGuard,
        kind: String,
        data: String,
        source_url: &str,
    ) -> DispatchOutcome {
        let capture = Capture::new(kind.clone(), data, source_url);
        if let Err(err) = self.deps.history.append(&capture) {
            log::warn!("Failed to append capture to history: {}", err);
        }
        self.deps.notifier.notify(&Notice::Success { kind });
        DispatchOutcome::Completed(capture)
    }

    /// Reports a failure from outside the transform registry through
    /// the standard classification path.
    pub fn fail(&self, err: DispatchError, context: &str, url: &str) -> DispatchOutcome {
        self.handle_error(err, context, url)
    }

    /// Delivers an already-computed payload: clipboard first, then
    /// history, then the success notice. Caller holds the busy lock.
    async fn deliver_locked(&self, kind: String, data: String, source_url: &str) -> DispatchOutcome {
        if let Err(err) = self.write_clipboard(&data).await {
            return self.handle_error(err, "clipboard", source_url);
        }

        let capture = Capture::new(kind.clone(), data, source_url);
        // History failure is logged and swallowed: it never undoes the
        // clipboard write or blocks the success notice.
        if let Err(err) = self.deps.history.append(&capture) {
            log::warn!("Failed to append capture to history: {}", err);
        }

        self.deps.notifier.notify(&Notice::Success { kind });
        DispatchOutcome::Completed(capture)
    }

    /// Clipboard write with exponential backoff, then the legacy path.
    async fn write_clipboard(&self, text: &str) -> Result<(), DispatchError> {
        let mut delay = CLIPBOARD_RETRY_BASE_DELAY;
        let mut last_err = None;
        for attempt in 1..=CLIPBOARD_RETRY_ATTEMPTS {
            match clipboard::write_text(self.deps.clipboard.as_ref(), text) {
                Ok(()) => return Ok(()),
                // An empty payload will not improve with retries.
                Err(DispatchError::NothingToCopy) => return Err(DispatchError::NothingToCopy),
                Err(err) => {
                    log::warn!(
                        "Clipboard write failed (attempt {}/{}): {}",
                        attempt,
                        CLIPBOARD_RETRY_ATTEMPTS,
                        err
                    );
                    last_err = Some(err);
                    if attempt < CLIPBOARD_RETRY_ATTEMPTS {
                        sleep(delay).await;
                        delay *= 2;
                    }
                }
            }
        }

        clipboard::write_text_legacy(self.deps.clipboard.as_ref(), text).map_err(|legacy_err| {
            let primary = last_err
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no attempts made".to_string());
            DispatchError::Clipboard(format!(
                "primary failed: {} ; legacy failed: {}",
                primary, legacy_err
            ))
        })
    }

    /// Classifies a failure, records it, notifies the user, and
    /// schedules the delayed recovery suggestion where applicable.
    fn handle_error(&self, err: DispatchError, context: &str, url: &str) -> DispatchOutcome {
        let category = err.category();
        log::error!("Dispatch failed in {}: {}", context, err);

        if let Err(log_err) = self
            .deps
            .error_log
            .record(&ErrorLogEntry::new(&err, context, url))
        {
            log::warn!("Failed to record error log entry: {}", log_err);
        }

        self.deps.notifier.notify(&Notice::Error {
            message: category.user_message().to_string(),
        });

        if category.wants_recovery() {
            let notifier = Arc::clone(&self.deps.notifier);
            tokio::spawn(async move {
                sleep(RECOVERY_DELAY).await;
                notifier.notify(&Notice::Recovery {
                    message: category.recovery_message().to_string(),
                });
            });
        }

        DispatchOutcome::Failed(category)
    }

    /// Writes an image payload. Not retried: on failure the caller
    /// falls back to a download-based save.
    pub fn write_image(&self, png: &[u8]) -> Result<(), DispatchError> {
        self.deps.clipboard.write_image(png)
    }
}

#[cfg(test)]
impl Dispatcher {
    /// Holds the busy lock for the guard's lifetime.
    pub(crate) fn hold_lock_for_test(&self) -> impl Drop {
        self.try_acquire().expect("lock already held")
    }
}
