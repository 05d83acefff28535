//! Interactive element picker state machine.
//!
//! The picker owns a transient session: hover highlighting driven by
//! frame-coalesced pointer events, click-to-confirm, Escape-to-cancel.
//! Listener registrations and the overlay are owned by the session and
//! torn down on every exit path before any result is reported, so a
//! transform can never race with a late pointer event.

use crate::dom::{Document, NodeId, Rect};

/// Generic key representation for host-agnostic input handling.
///
/// Hosts map their native key codes to these values before feeding
/// them to the picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Escape key (cancel)
    Escape,
    /// Regular character key
    Char(char),
    /// Unmapped or unrecognized key
    Unknown,
}

/// Input events delivered to an active picker session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickEvent {
    /// Raw pointer movement. Only records the position; hit-testing is
    /// deferred to the next [`PickEvent::Frame`].
    PointerMove { x: f64, y: f64 },
    /// Primary-button click. Confirms the hovered element; the
    /// position is carried from the host event but the highlight, not
    /// the click point, decides the target.
    Click { x: f64, y: f64 },
    /// Key press.
    KeyDown(Key),
    /// Display-refresh frame callback. Hit-testing and highlight
    /// updates happen here, at most once per frame.
    Frame,
}

/// Document-level listener registrations a session installs on entry.
///
/// Tracked explicitly so teardown can be verified: a leaked listener
/// means stuck cursors and phantom highlights on the host page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKind {
    PointerMove,
    Click,
    KeyDown,
    Frame,
}

const ALL_LISTENERS: [ListenerKind; 4] = [
    ListenerKind::PointerMove,
    ListenerKind::Click,
    ListenerKind::KeyDown,
    ListenerKind::Frame,
];

/// The highlight layer drawn over the hovered element.
///
/// Lives outside the document tree, so hit-testing never sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    /// Bounding box of the currently highlighted element.
    pub highlight: Option<Rect>,
    /// Instructional label text anchored to the highlight.
    pub label: String,
}

impl Overlay {
    fn new(label: &str) -> Self {
        Self {
            highlight: None,
            label: label.to_string(),
        }
    }
}

/// Result of feeding one event to the picker.
#[derive(Debug, Clone, PartialEq)]
pub enum PickOutcome {
    /// Session still running; nothing to report.
    Pending,
    /// User clicked with a valid element hovered. The session has
    /// already been torn down when this is returned.
    Confirmed(NodeId),
    /// Escape, or a confirm click with nothing hovered. Torn down.
    Cancelled,
}

/// Transient per-pick state. Created on session start, destroyed on
/// confirm, cancel, or error.
#[derive(Debug)]
struct Session {
    /// Element currently under the pointer, if any. A path into the
    /// document, never an owned copy: the picker observes the page, it
    /// does not hold onto its nodes.
    hovered: Option<NodeId>,
    /// Latest raw pointer position awaiting the next frame callback.
    pending_pointer: Option<(f64, f64)>,
    listeners: Vec<ListenerKind>,
    overlay: Overlay,
}

/// The picker itself. At most one session is active at a time; a start
/// request while picking is a no-op.
#[derive(Debug, Default)]
pub struct Picker {
    session: Option<Session>,
}

impl Picker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a session is currently active.
    pub fn is_picking(&self) -> bool {
        self.session.is_some()
    }

    /// Listener registrations currently installed. Empty unless a
    /// session is active.
    pub fn installed_listeners(&self) -> &[ListenerKind] {
        self.session
            .as_ref()
            .map(|s| s.listeners.as_slice())
            .unwrap_or(&[])
    }

    /// The overlay, when a session is active.
    pub fn overlay(&self) -> Option<&Overlay> {
        self.session.as_ref().map(|s| &s.overlay)
    }

    /// Starts a session: installs the capture-phase listeners and
    /// creates the overlay. Returns false (and does nothing) if a
    /// session is already active.
    pub fn start(&mut self, label: &str) -> bool {
        if self.session.is_some() {
            log::debug!("Pick requested while already picking, ignoring");
            return false;
        }
        self.session = Some(Session {
            hovered: None,
            pending_pointer: None,
            listeners: ALL_LISTENERS.to_vec(),
            overlay: Overlay::new(label),
        });
        log::debug!("Picker session started");
        true
    }

    /// Cancels any active session, tearing it down.
    pub fn cancel(&mut self) {
        if self.teardown() {
            log::debug!("Picker session cancelled");
        }
    }

    /// Feeds one event to the active session. Events arriving with no
    /// session active are ignored.
    pub fn handle_event(&mut self, doc: &Document, event: PickEvent) -> PickOutcome {
        if self.session.is_none() {
            return PickOutcome::Pending;
        }
        match event {
            PickEvent::PointerMove { x, y } => {
                // Record only; the hit-test runs on the next frame so a
                // burst of moves costs one lookup.
                if let Some(session) = self.session.as_mut() {
                    session.pending_pointer = Some((x, y));
                }
                PickOutcome::Pending
            }
            PickEvent::Frame => {
                self.process_frame(doc);
                PickOutcome::Pending
            }
            PickEvent::Click { .. } => {
                // Pointer motion may still be waiting on a frame; fold
                // it in so the confirm target matches what the user
                // last saw highlighted. The click confirms the hovered
                // element only; with nothing hovered it cancels.
                self.process_frame(doc);
                let target = self.session.as_ref().and_then(|s| s.hovered.clone());
                self.teardown();
                match target {
                    Some(id) => {
                        log::debug!("Picker confirmed element at {:?}", id);
                        PickOutcome::Confirmed(id)
                    }
                    None => {
                        log::debug!("Picker click with no element hovered, cancelling");
                        PickOutcome::Cancelled
                    }
                }
            }
            PickEvent::KeyDown(Key::Escape) => {
                self.teardown();
                log::debug!("Picker cancelled via Escape");
                PickOutcome::Cancelled
            }
            PickEvent::KeyDown(_) => PickOutcome::Pending,
        }
    }

    /// Runs the frame-aligned hover update: consume the pending pointer
    /// position, hit-test it, and move the highlight if the hovered
    /// element changed.
    fn process_frame(&mut self, doc: &Document) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some((x, y)) = session.pending_pointer.take() else {
            return;
        };
        let hit = doc.element_from_point(x, y);
        if hit == session.hovered {
            return;
        }
        session.overlay.highlight = hit
            .as_ref()
            .and_then(|id| doc.get(id))
            .map(|el| el.rect);
        session.hovered = hit;
    }

    /// Removes the overlay and every installed listener. Returns
    /// whether a session was actually torn down.
    fn teardown(&mut self) -> bool {
        match self.session.take() {
            Some(mut session) => {
                session.listeners.clear();
                true
            }
            None => false,
        }
    }
}
