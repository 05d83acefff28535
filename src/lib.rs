//! Library exports for reusing domclip subsystems.
//!
//! The crate turns a picked page element or text selection into a
//! clipboard-ready payload: a closed set of transform modes, an
//! interactive element picker, and a dispatch pipeline with history
//! and usage tracking. Hosts embed [`Controller`]; the CLI binary
//! drives the same stack against page snapshots.

pub mod clipboard;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod dom;
pub mod filename;
pub mod history;
pub mod mode;
pub mod notify;
pub mod picker;
pub mod proxy;
pub mod transform;

pub use config::Config;
pub use controller::Controller;
pub use dispatch::{DispatchDependencies, DispatchOutcome, Dispatcher};
pub use mode::Mode;
