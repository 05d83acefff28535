use std::sync::{Arc, Mutex};

use super::error::{DispatchError, ErrorCategory, ErrorLogEntry};
use super::{DispatchDependencies, DispatchOutcome, Dispatcher};
use crate::clipboard::ClipboardBackend;
use crate::dom::{Document, Element, Node, Rect};
use crate::history::{Capture, ErrorLog, HistorySink, UsageStore};
use crate::mode::{CaseStyle, Mode};
use crate::notify::{Notice, Notifier};
use crate::transform::{TransformInput, TransformOptions};
use std::collections::BTreeMap;

#[derive(Clone, Default)]
struct MockClipboard {
    primary_failures: Arc<Mutex<u32>>,
    legacy_should_fail: bool,
    primary_calls: Arc<Mutex<u32>>,
    legacy_calls: Arc<Mutex<u32>>,
    written: Arc<Mutex<Vec<String>>>,
}

impl ClipboardBackend for MockClipboard {
    fn write_text(&self, text: &str) -> Result<(), DispatchError> {
        *self.primary_calls.lock().unwrap() += 1;
        let mut failures = self.primary_failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(DispatchError::Clipboard("primary refused".to_string()));
        }
        self.written.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn write_text_legacy(&self, text: &str) -> Result<(), DispatchError> {
        *self.legacy_calls.lock().unwrap() += 1;
        if self.legacy_should_fail {
            return Err(DispatchError::Clipboard("legacy refused".to_string()));
        }
        self.written.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn write_image(&self, _png: &[u8]) -> Result<(), DispatchError> {
        Ok(())
    }
}

#[derive(Clone, Default)]
struct MockHistory {
    should_fail: bool,
    appended: Arc<Mutex<Vec<Capture>>>,
}

impl HistorySink for MockHistory {
    fn append(&self, capture: &Capture) -> Result<(), DispatchError> {
        if self.should_fail {
            return Err(DispatchError::Storage("history full".to_string()));
        }
        self.appended.lock().unwrap().push(capture.clone());
        Ok(())
    }
}

#[derive(Clone, Default)]
struct MockUsage {
    increments: Arc<Mutex<Vec<Mode>>>,
}

impl UsageStore for MockUsage {
    fn increment(&self, mode: Mode) -> Result<(), DispatchError> {
        self.increments.lock().unwrap().push(mode);
        Ok(())
    }

    fn top_n(&self, n: usize) -> Vec<Mode> {
        self.increments.lock().unwrap().iter().copied().take(n).collect()
    }
}

#[derive(Clone, Default)]
struct MockErrorLog {
    recorded: Arc<Mutex<Vec<ErrorLogEntry>>>,
}

impl ErrorLog for MockErrorLog {
    fn record(&self, entry: &ErrorLogEntry) -> Result<(), DispatchError> {
        self.recorded.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

#[derive(Clone, Default)]
struct MockNotifier {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl Notifier for MockNotifier {
    fn notify(&self, notice: &Notice) {
        self.notices.lock().unwrap().push(notice.clone());
    }
}

struct Harness {
    dispatcher: Dispatcher,
    clipboard: MockClipboard,
    history: MockHistory,
    error_log: MockErrorLog,
    notifier: MockNotifier,
}

fn harness_with(clipboard: MockClipboard, history: MockHistory) -> Harness {
    let error_log = MockErrorLog::default();
    let notifier = MockNotifier::default();
    let deps = DispatchDependencies {
        clipboard: Arc::new(clipboard.clone()),
        history: Arc::new(history.clone()),
        usage: Arc::new(MockUsage::default()),
        error_log: Arc::new(error_log.clone()),
        notifier: Arc::new(notifier.clone()),
    };
    Harness {
        dispatcher: Dispatcher::new(deps, TransformOptions::default()),
        clipboard,
        history,
        error_log,
        notifier,
    }
}

fn harness() -> Harness {
    harness_with(MockClipboard::default(), MockHistory::default())
}

fn heading_doc() -> Document {
    let h1 = Element {
        tag: "h1".to_string(),
        attrs: BTreeMap::new(),
        rect: Rect::new(10.0, 10.0, 200.0, 40.0),
        children: vec![Node::Text {
            text: "Hello, World!  ".to_string(),
        }],
    };
    Document {
        url: "https://example.com/post".to_string(),
        title: "Example".to_string(),
        meta: vec![],
        canonical: String::new(),
        root: Element {
            tag: "body".to_string(),
            attrs: BTreeMap::new(),
            rect: Rect::new(0.0, 0.0, 800.0, 600.0),
            children: vec![Node::Element(h1)],
        },
    }
}

fn picked_heading(doc: &Document) -> &Element {
    match &doc.root.children[0] {
        Node::Element(el) => el,
        Node::Text { .. } => unreachable!(),
    }
}

#[tokio::test]
async fn slugify_on_picked_heading_copies_and_records() {
    let h = harness();
    let doc = heading_doc();
    let outcome = h
        .dispatcher
        .run(Mode::Slugify, TransformInput::Element(picked_heading(&doc)), &doc)
        .await;

    let DispatchOutcome::Completed(capture) = outcome else {
        panic!("expected completion, got {:?}", outcome);
    };
    assert_eq!(capture.kind, "Slug");
    assert_eq!(capture.data, "hello-world");
    assert_eq!(h.clipboard.written.lock().unwrap().as_slice(), ["hello-world"]);

    let appended = h.history.appended.lock().unwrap();
    assert_eq!(appended.len(), 1);
    assert_eq!(appended[0].data, "hello-world");
    assert_eq!(appended[0].source_url, "https://example.com/post");

    let notices = h.notifier.notices.lock().unwrap();
    assert_eq!(
        notices.as_slice(),
        [Notice::Success {
            kind: "Slug".to_string()
        }]
    );
}

#[tokio::test]
async fn statistics_on_selection_skip_the_picker_path() {
    let h = harness();
    let doc = heading_doc();
    let outcome = h
        .dispatcher
        .run(
            Mode::TextStatistics,
            TransformInput::Selection("One two three. Four five."),
            &doc,
        )
        .await;

    let DispatchOutcome::Completed(capture) = outcome else {
        panic!("expected completion, got {:?}", outcome);
    };
    assert!(capture.data.contains("Words: 5"));
    assert!(capture.data.contains("Sentences: 2"));
    assert!(capture.data.contains("(1 min)"));
}

#[tokio::test]
async fn no_table_is_an_empty_result_not_an_error() {
    let h = harness();
    let doc = heading_doc();
    let outcome = h
        .dispatcher
        .run(Mode::TableCsv, TransformInput::Element(picked_heading(&doc)), &doc)
        .await;

    assert_eq!(outcome, DispatchOutcome::Empty);
    assert!(h.clipboard.written.lock().unwrap().is_empty());
    assert!(h.history.appended.lock().unwrap().is_empty());
    assert!(h.error_log.recorded.lock().unwrap().is_empty());
    let notices = h.notifier.notices.lock().unwrap();
    assert!(matches!(notices.as_slice(), [Notice::Empty { .. }]));
}

#[tokio::test]
async fn second_dispatch_while_busy_is_rejected() {
    let h = harness();
    let doc = heading_doc();
    let guard = h.dispatcher.hold_lock_for_test();

    let outcome = h
        .dispatcher
        .run(Mode::Text, TransformInput::Selection("hi"), &doc)
        .await;
    assert_eq!(outcome, DispatchOutcome::Busy);
    assert!(h.clipboard.written.lock().unwrap().is_empty());
    assert!(h.history.appended.lock().unwrap().is_empty());
    let notices = h.notifier.notices.lock().unwrap();
    assert_eq!(notices.as_slice(), [Notice::Busy]);
    drop(notices);

    drop(guard);
    let outcome = h
        .dispatcher
        .run(Mode::Text, TransformInput::Selection("hi"), &doc)
        .await;
    assert!(matches!(outcome, DispatchOutcome::Completed(_)));
}

#[tokio::test]
async fn busy_lock_is_released_after_failure() {
    let clipboard = MockClipboard {
        primary_failures: Arc::new(Mutex::new(u32::MAX)),
        legacy_should_fail: true,
        ..Default::default()
    };
    let h = harness_with(clipboard, MockHistory::default());
    let doc = heading_doc();

    let outcome = h
        .dispatcher
        .run(Mode::Text, TransformInput::Selection("hi"), &doc)
        .await;
    assert_eq!(outcome, DispatchOutcome::Failed(ErrorCategory::Clipboard));
    assert!(!h.dispatcher.is_busy());
}

#[tokio::test]
async fn clipboard_retries_then_falls_back_to_legacy() {
    let clipboard = MockClipboard {
        primary_failures: Arc::new(Mutex::new(u32::MAX)),
        ..Default::default()
    };
    let h = harness_with(clipboard, MockHistory::default());
    let doc = heading_doc();

    let outcome = h
        .dispatcher
        .run(Mode::Case(CaseStyle::Upper), TransformInput::Selection("abc"), &doc)
        .await;
    assert!(matches!(outcome, DispatchOutcome::Completed(_)));
    assert_eq!(*h.clipboard.primary_calls.lock().unwrap(), 2);
    assert_eq!(*h.clipboard.legacy_calls.lock().unwrap(), 1);
    assert_eq!(h.clipboard.written.lock().unwrap().as_slice(), ["ABC"]);
}

#[tokio::test]
async fn exhausted_clipboard_paths_record_and_notify() {
    let clipboard = MockClipboard {
        primary_failures: Arc::new(Mutex::new(u32::MAX)),
        legacy_should_fail: true,
        ..Default::default()
    };
    let h = harness_with(clipboard, MockHistory::default());
    let doc = heading_doc();

    let outcome = h
        .dispatcher
        .run(Mode::Text, TransformInput::Selection("hi"), &doc)
        .await;
    assert_eq!(outcome, DispatchOutcome::Failed(ErrorCategory::Clipboard));
    assert!(h.history.appended.lock().unwrap().is_empty());

    let recorded = h.error_log.recorded.lock().unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].category, ErrorCategory::Clipboard);
    assert_eq!(recorded[0].url, "https://example.com/post");

    let notices = h.notifier.notices.lock().unwrap();
    assert!(matches!(notices.as_slice(), [Notice::Error { .. }]));
}

#[tokio::test]
async fn empty_payload_fails_without_retry() {
    let h = harness();
    let doc = heading_doc();
    let outcome = h
        .dispatcher
        .run(Mode::Text, TransformInput::Selection(""), &doc)
        .await;
    assert_eq!(outcome, DispatchOutcome::Failed(ErrorCategory::Clipboard));
    // One fast-fail check, no retries, no legacy attempt.
    assert_eq!(*h.clipboard.primary_calls.lock().unwrap(), 0);
    assert_eq!(*h.clipboard.legacy_calls.lock().unwrap(), 0);
}

#[tokio::test]
async fn history_failure_never_blocks_the_success_notice() {
    let history = MockHistory {
        should_fail: true,
        ..Default::default()
    };
    let h = harness_with(MockClipboard::default(), history);
    let doc = heading_doc();

    let outcome = h
        .dispatcher
        .run(Mode::Text, TransformInput::Selection("hi"), &doc)
        .await;
    assert!(matches!(outcome, DispatchOutcome::Completed(_)));
    assert_eq!(h.clipboard.written.lock().unwrap().as_slice(), ["hi"]);
    let notices = h.notifier.notices.lock().unwrap();
    assert!(matches!(notices.as_slice(), [Notice::Success { .. }]));
}

#[tokio::test]
async fn usage_recording_is_fire_and_forget() {
    let h = harness();
    h.dispatcher.record_usage(Mode::Slugify);
    h.dispatcher.record_usage(Mode::Slugify);
    assert_eq!(h.dispatcher.quick_launch(1), vec![Mode::Slugify]);
}
