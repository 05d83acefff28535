//! Clipboard adapter: primary write path plus a legacy fallback.
//!
//! The primary path shells out to `wl-copy`; the legacy path uses the
//! wl-clipboard-rs library directly. The dispatcher retries the
//! primary path with backoff before resorting to the legacy one.

use crate::dispatch::error::DispatchError;
use std::process::{Command, Stdio};
use wl_clipboard_rs::copy::{MimeType, Options, ServeRequests, Source};

/// Pluggable clipboard backend.
///
/// `write_text`/`write_image` are the primary mechanism; the matching
/// `*_legacy` methods are a last resort after primary retries are
/// exhausted. Image-write failures are not retried: callers fall back
/// to a download-based save instead.
pub trait ClipboardBackend: Send + Sync {
    fn write_text(&self, text: &str) -> Result<(), DispatchError>;
    fn write_text_legacy(&self, text: &str) -> Result<(), DispatchError>;
    fn write_image(&self, png: &[u8]) -> Result<(), DispatchError>;
}

/// Validates a payload and hands it to the backend.
///
/// An empty payload fails fast with [`DispatchError::NothingToCopy`]
/// before any clipboard call is attempted.
pub fn write_text(backend: &dyn ClipboardBackend, text: &str) -> Result<(), DispatchError> {
    if text.is_empty() {
        return Err(DispatchError::NothingToCopy);
    }
    backend.write_text(text)
}

/// Legacy-path counterpart of [`write_text`].
pub fn write_text_legacy(backend: &dyn ClipboardBackend, text: &str) -> Result<(), DispatchError> {
    if text.is_empty() {
        return Err(DispatchError::NothingToCopy);
    }
    backend.write_text_legacy(text)
}

/// Wayland clipboard backend.
#[derive(Debug, Default)]
pub struct WaylandClipboard;

impl WaylandClipboard {
    pub fn new() -> Self {
        Self
    }

    /// Pipes bytes into wl-copy with the given MIME type.
    fn copy_via_command(&self, data: &[u8], mime: &str) -> Result<(), DispatchError> {
        use std::io::Write;

        log::debug!("Copying {} bytes ({}) via wl-copy", data.len(), mime);
        let mut child = Command::new("wl-copy")
            .arg("--type")
            .arg(mime)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                DispatchError::Clipboard(format!("Failed to spawn wl-copy (is it installed?): {}", e))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(data).map_err(|e| {
                DispatchError::Clipboard(format!("Failed to write to wl-copy stdin: {}", e))
            })?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| DispatchError::Clipboard(format!("Failed to wait for wl-copy: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DispatchError::Clipboard(format!("wl-copy failed: {}", stderr)));
        }
        Ok(())
    }

    /// Copies bytes using the wl-clipboard-rs library directly.
    fn copy_via_library(&self, data: &[u8], mime: &str) -> Result<(), DispatchError> {
        let mut opts = Options::new();
        // Serve one paste then exit so the payload survives us briefly.
        opts.serve_requests(ServeRequests::Only(1));
        opts.copy(
            Source::Bytes(data.into()),
            MimeType::Specific(mime.to_string()),
        )
        .map_err(|e| DispatchError::Clipboard(format!("wl-clipboard-rs error: {}", e)))
    }
}

impl ClipboardBackend for WaylandClipboard {
    fn write_text(&self, text: &str) -> Result<(), DispatchError> {
        self.copy_via_command(text.as_bytes(), "text/plain;charset=utf-8")
    }

    fn write_text_legacy(&self, text: &str) -> Result<(), DispatchError> {
        log::warn!("Primary clipboard path exhausted, using wl-clipboard-rs fallback");
        self.copy_via_library(text.as_bytes(), "text/plain;charset=utf-8")
    }

    fn write_image(&self, png: &[u8]) -> Result<(), DispatchError> {
        match self.copy_via_command(png, "image/png") {
            Ok(()) => Ok(()),
            Err(cmd_err) => {
                log::warn!(
                    "wl-copy image path failed ({}). Falling back to wl-clipboard-rs",
                    cmd_err
                );
                self.copy_via_library(png, "image/png").map_err(|lib_err| {
                    DispatchError::Clipboard(format!(
                        "wl-copy failed: {} ; wl-clipboard-rs failed: {}",
                        cmd_err, lib_err
                    ))
                })
            }
        }
    }
}

/// Checks whether the primary clipboard mechanism is usable.
pub fn is_clipboard_available() -> bool {
    Command::new("wl-copy")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingBackend {
        texts: Mutex<Vec<String>>,
    }

    impl ClipboardBackend for RecordingBackend {
        fn write_text(&self, text: &str) -> Result<(), DispatchError> {
            self.texts.lock().unwrap().push(text.to_string());
            Ok(())
        }
        fn write_text_legacy(&self, text: &str) -> Result<(), DispatchError> {
            self.write_text(text)
        }
        fn write_image(&self, _png: &[u8]) -> Result<(), DispatchError> {
            Ok(())
        }
    }

    #[test]
    fn empty_payload_fails_fast() {
        let backend = RecordingBackend {
            texts: Mutex::new(vec![]),
        };
        let err = write_text(&backend, "").unwrap_err();
        assert!(matches!(err, DispatchError::NothingToCopy));
        // The backend must never have been reached.
        assert!(backend.texts.lock().unwrap().is_empty());
    }

    #[test]
    fn non_empty_payload_reaches_backend() {
        let backend = RecordingBackend {
            texts: Mutex::new(vec![]),
        };
        write_text(&backend, "hello").unwrap();
        assert_eq!(backend.texts.lock().unwrap().as_slice(), ["hello"]);
    }

    #[test]
    fn availability_check_does_not_panic() {
        let _available = is_clipboard_available();
    }
}
