use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::{ArgAction, Parser};

use domclip::clipboard::{ClipboardBackend, WaylandClipboard};
use domclip::config::Config;
use domclip::controller::Controller;
use domclip::dispatch::error::DispatchError;
use domclip::dispatch::{DispatchDependencies, DispatchOutcome, Dispatcher};
use domclip::dom::Document;
use domclip::history::{JsonErrorLog, JsonHistorySink, JsonUsageStore};
use domclip::mode::{Mode, ALL_MODES};
use domclip::notify::LogNotifier;
use domclip::picker::PickEvent;
use domclip::proxy::PrivilegedProxy;

#[derive(Parser, Debug)]
#[command(name = "domclip")]
#[command(version, about = "Copy a page element or selection in any of two dozen formats")]
struct Cli {
    /// Page snapshot to operate on (JSON)
    #[arg(long, value_name = "FILE")]
    page: Option<PathBuf>,

    /// Mode identifier (see --list-modes)
    #[arg(long, short = 'm', value_name = "MODE")]
    mode: Option<String>,

    /// Apply the mode to this selection text instead of picking
    #[arg(long, value_name = "TEXT")]
    selection: Option<String>,

    /// Pick the element at these page coordinates
    #[arg(long, value_name = "X,Y")]
    at: Option<String>,

    /// Second pick point, for the two-color contrast flow
    #[arg(long, value_name = "X,Y")]
    then_at: Option<String>,

    /// Screenshot PNG backing the pixel-sampling modes
    #[arg(long, value_name = "FILE")]
    screenshot: Option<PathBuf>,

    /// Print the payload to stdout instead of the clipboard
    #[arg(long, action = ArgAction::SetTrue)]
    stdout: bool,

    /// State directory for history, usage, and error logs
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Config file path (defaults to ~/.config/domclip/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// List supported modes and exit
    #[arg(long, action = ArgAction::SetTrue)]
    list_modes: bool,
}

/// Clipboard backend that prints the payload, for headless use.
struct StdoutClipboard;

impl ClipboardBackend for StdoutClipboard {
    fn write_text(&self, text: &str) -> Result<(), DispatchError> {
        println!("{}", text);
        Ok(())
    }

    fn write_text_legacy(&self, text: &str) -> Result<(), DispatchError> {
        self.write_text(text)
    }

    fn write_image(&self, png: &[u8]) -> Result<(), DispatchError> {
        log::info!("Suppressing {} byte image write in stdout mode", png.len());
        Ok(())
    }
}

/// Proxy for headless runs: screenshots come from a file, downloads
/// are reported instead of performed.
struct SnapshotProxy {
    screenshot: Option<PathBuf>,
}

#[async_trait]
impl PrivilegedProxy for SnapshotProxy {
    async fn capture_visible_area(&self) -> Result<Vec<u8>, DispatchError> {
        let Some(path) = &self.screenshot else {
            return Err(DispatchError::Permission(
                "No screenshot available; pass --screenshot".to_string(),
            ));
        };
        std::fs::read(path).map_err(DispatchError::Io)
    }

    async fn download_url(&self, url: &str, filename: &str) -> Result<(), DispatchError> {
        log::info!("Would download {} as {}", url, filename);
        println!("{}", filename);
        Ok(())
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, DispatchError> {
        Err(DispatchError::Network(format!(
            "Image fetch not available headless: {}",
            url
        )))
    }
}

fn parse_point(raw: &str) -> Result<(f64, f64)> {
    let (x, y) = raw
        .split_once(',')
        .with_context(|| format!("Invalid point '{}', expected X,Y", raw))?;
    Ok((
        x.trim().parse().with_context(|| format!("Invalid X in '{}'", raw))?,
        y.trim().parse().with_context(|| format!("Invalid Y in '{}'", raw))?,
    ))
}

async fn pick(controller: &mut Controller, doc: &Document, point: (f64, f64)) -> Option<DispatchOutcome> {
    controller
        .handle_pick_event(doc, PickEvent::PointerMove { x: point.0, y: point.1 })
        .await;
    controller.handle_pick_event(doc, PickEvent::Frame).await;
    controller
        .handle_pick_event(doc, PickEvent::Click { x: point.0, y: point.1 })
        .await
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    if cli.list_modes {
        for mode in ALL_MODES {
            println!("{:<24} {}", mode.wire_name(), mode.kind());
        }
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let page_path = cli
        .page
        .context("--page is required (a JSON page snapshot)")?;
    let mode_name = cli.mode.context("--mode is required (see --list-modes)")?;
    let mode = Mode::parse(&mode_name);

    let page_raw = std::fs::read_to_string(&page_path)
        .with_context(|| format!("Failed to read page snapshot {}", page_path.display()))?;
    let doc: Document = serde_json::from_str(&page_raw)
        .with_context(|| format!("Failed to parse page snapshot {}", page_path.display()))?;

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => dirs::data_local_dir()
            .context("Could not find data directory")?
            .join("domclip"),
    };

    let clipboard: Arc<dyn ClipboardBackend> = if cli.stdout {
        Arc::new(StdoutClipboard)
    } else {
        Arc::new(WaylandClipboard::new())
    };
    let deps = DispatchDependencies {
        clipboard,
        history: Arc::new(JsonHistorySink::new(data_dir.join("history.json"))),
        usage: Arc::new(JsonUsageStore::new(data_dir.join("usage.json"))),
        error_log: Arc::new(JsonErrorLog::new(data_dir.join("errors.json"))),
        notifier: Arc::new(LogNotifier),
    };

    let dispatcher = Dispatcher::new(deps, config.transform_options(&doc.host()));
    let proxy = SnapshotProxy {
        screenshot: cli.screenshot,
    };
    let mut controller = Controller::new(
        dispatcher,
        Arc::new(proxy),
        config.filename.template.clone(),
        1.0,
    );
    controller.install();

    let mut outcome = controller
        .dispatch(mode, &doc, cli.selection.as_deref())
        .await;

    if outcome.is_none() && controller.is_picking() {
        let at = cli
            .at
            .as_deref()
            .context("--at X,Y is required when no selection applies")?;
        outcome = pick(&mut controller, &doc, parse_point(at)?).await;

        // The contrast flow needs a second point.
        if outcome.is_none() && controller.is_picking() {
            let then_at = cli
                .then_at
                .as_deref()
                .context("--then-at X,Y is required for the contrast flow")?;
            outcome = pick(&mut controller, &doc, parse_point(then_at)?).await;
        }
    }

    match outcome {
        Some(DispatchOutcome::Completed(capture)) => {
            log::info!("{} capture completed", capture.kind);
            Ok(())
        }
        Some(DispatchOutcome::Empty) => {
            log::info!("Nothing applicable at that target");
            Ok(())
        }
        Some(DispatchOutcome::Busy) => bail!("Another dispatch is already running"),
        Some(DispatchOutcome::Failed(category)) => {
            bail!("{}", category.user_message())
        }
        None => bail!("Pick did not resolve; check --at coordinates"),
    }
}
