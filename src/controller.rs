//! Per-page-context session owner.
//!
//! The controller wires invocations to the picker and the dispatcher,
//! and routes confirmed picks by mode: ordinary element transforms go
//! straight to the dispatcher, pixel-sampling modes detour through the
//! privileged screenshot round-trip, and the two-color contrast flow
//! chains a second pick as an explicit continuation stage.

use std::sync::Arc;

use crate::dispatch::error::DispatchError;
use crate::dispatch::{BusyGuard, DispatchOutcome, Dispatcher};
use crate::dom::{Document, NodeId};
use crate::filename::{generate_filename, FilenameData};
use crate::mode::Mode;
use crate::notify::Notice;
use crate::picker::{PickEvent, PickOutcome, Picker};
use crate::proxy::{sample_pixel, Invocation, PrivilegedProxy};
use crate::transform::color::{self, Rgb};
use crate::transform::{markup, TransformInput};

/// What a confirmed pick should do. The contrast flow is a two-step
/// state value: the second pick only exists once the first confirmed.
#[derive(Debug, Clone, PartialEq)]
enum PickStage {
    /// Hand the element to the mode's transform.
    Transform,
    /// Sample one pixel and format it (color picker, palette).
    SingleColor,
    /// First pick of the contrast flow.
    Foreground,
    /// Second pick of the contrast flow, foreground captured.
    Background { foreground: Rgb },
    /// Download the picked image.
    ImageSave,
    /// Copy the picked image to the clipboard.
    ImageClip,
}

#[derive(Debug, Clone)]
struct Pending {
    mode: Mode,
    stage: PickStage,
}

/// One controller instance per page context. Owns the picker session
/// and the continuation state between picks; nothing here is global.
pub struct Controller {
    dispatcher: Dispatcher,
    picker: Picker,
    proxy: Arc<dyn PrivilegedProxy>,
    filename_template: String,
    /// Ratio between page coordinates and screenshot pixels.
    device_pixel_ratio: f64,
    installed: bool,
    pending: Option<Pending>,
}

impl Controller {
    pub fn new(
        dispatcher: Dispatcher,
        proxy: Arc<dyn PrivilegedProxy>,
        filename_template: String,
        device_pixel_ratio: f64,
    ) -> Self {
        Self {
            dispatcher,
            picker: Picker::new(),
            proxy,
            filename_template,
            device_pixel_ratio,
            installed: false,
            pending: None,
        }
    }

    /// Marks this context initialized. Idempotent: a second install in
    /// the same context is refused, so document-level listeners are
    /// never registered twice.
    pub fn install(&mut self) -> bool {
        if self.installed {
            log::debug!("Context already initialized, skipping install");
            return false;
        }
        self.installed = true;
        true
    }

    pub fn is_picking(&self) -> bool {
        self.picker.is_picking()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Handles a mode invocation message.
    pub async fn handle_invocation(
        &mut self,
        invocation: Invocation,
        doc: &Document,
        selection: Option<&str>,
    ) -> Option<DispatchOutcome> {
        let Invocation::RunMode { mode } = invocation;
        self.dispatch(mode, doc, selection).await
    }

    /// Entry point for a user-triggered mode.
    ///
    /// Returns the final outcome when the dispatch could complete
    /// without picking (selection path, or busy rejection); `None`
    /// means a picker session was started and the outcome will arrive
    /// through [`handle_pick_event`].
    ///
    /// [`handle_pick_event`]: Controller::handle_pick_event
    pub async fn dispatch(
        &mut self,
        mode: Mode,
        doc: &Document,
        selection: Option<&str>,
    ) -> Option<DispatchOutcome> {
        if self.dispatcher.is_busy() {
            log::warn!("Invocation of {} rejected: busy", mode);
            self.dispatcher.notifier().notify(&Notice::Busy);
            return Some(DispatchOutcome::Busy);
        }

        self.dispatcher.record_usage(mode);

        let selection = selection.map(str::trim).filter(|s| !s.is_empty());
        if !mode.always_picks() {
            if let Some(sel) = selection {
                return Some(
                    self.dispatcher
                        .run(mode, TransformInput::Selection(sel), doc)
                        .await,
                );
            }
        }

        let stage = match mode {
            Mode::ColorPicker | Mode::ColorPalette => PickStage::SingleColor,
            Mode::ContrastChecker => PickStage::Foreground,
            Mode::ImageSave => PickStage::ImageSave,
            Mode::ImageClip => PickStage::ImageClip,
            _ => PickStage::Transform,
        };
        let label = match stage {
            PickStage::Foreground => "Click the foreground color",
            PickStage::SingleColor => "Click anywhere to pick a color",
            PickStage::ImageSave | PickStage::ImageClip => "Click an image",
            _ => "Click an element to copy",
        };
        if self.picker.start(label) {
            self.pending = Some(Pending { mode, stage });
        }
        None
    }

    /// Feeds a picker event through; resolves the pending stage when
    /// the pick confirms.
    pub async fn handle_pick_event(
        &mut self,
        doc: &Document,
        event: PickEvent,
    ) -> Option<DispatchOutcome> {
        match self.picker.handle_event(doc, event) {
            PickOutcome::Pending => None,
            PickOutcome::Cancelled => {
                self.pending = None;
                self.dispatcher.notifier().notify(&Notice::Cancelled);
                None
            }
            PickOutcome::Confirmed(id) => {
                let pending = self.pending.take()?;
                self.resolve_pick(pending, id, doc).await
            }
        }
    }

    async fn resolve_pick(
        &mut self,
        pending: Pending,
        id: NodeId,
        doc: &Document,
    ) -> Option<DispatchOutcome> {
        let Some(el) = doc.get(&id) else {
            return Some(self.dispatcher.fail(
                DispatchError::Unknown("Picked element no longer exists".to_string()),
                "picker",
                &doc.url,
            ));
        };

        // The confirmed pick opens the critical section: the lock is
        // held across the proxy round-trips, the clipboard write, and
        // the history append, so nothing can interleave.
        let Some(guard) = self.dispatcher.begin() else {
            return Some(DispatchOutcome::Busy);
        };

        match pending.stage {
            PickStage::Transform => Some(
                self.dispatcher
                    .run_locked(&guard, pending.mode, TransformInput::Element(el), doc)
                    .await,
            ),
            PickStage::SingleColor => {
                let (x, y) = el.rect.center();
                let color = match self.sample_at(x, y).await {
                    Ok(color) => color,
                    Err(err) => return Some(self.dispatcher.fail(err, "colorSample", &doc.url)),
                };
                let data = match pending.mode {
                    Mode::ColorPalette => color::format_palette(&color::generate_palette(color)),
                    _ => color::format_color(color, 1.0),
                };
                Some(
                    self.dispatcher
                        .complete(&guard, pending.mode.kind(), data, &doc.url)
                        .await,
                )
            }
            PickStage::Foreground => {
                let (x, y) = el.rect.center();
                let foreground = match self.sample_at(x, y).await {
                    Ok(color) => color,
                    Err(err) => return Some(self.dispatcher.fail(err, "colorSample", &doc.url)),
                };
                // Release the lock before the second pick: the user
                // may take arbitrarily long, and no clipboard or
                // history work happens until the background confirms.
                drop(guard);
                if self.picker.start("Click the background color") {
                    self.pending = Some(Pending {
                        mode: pending.mode,
                        stage: PickStage::Background { foreground },
                    });
                }
                None
            }
            PickStage::Background { foreground } => {
                let (x, y) = el.rect.center();
                let background = match self.sample_at(x, y).await {
                    Ok(color) => color,
                    Err(err) => return Some(self.dispatcher.fail(err, "colorSample", &doc.url)),
                };
                let result = color::contrast(foreground, background);
                let data = color::format_contrast(&result, foreground, background);
                Some(
                    self.dispatcher
                        .complete(&guard, pending.mode.kind(), data, &doc.url)
                        .await,
                )
            }
            PickStage::ImageSave => Some(self.save_image(&guard, el, doc).await),
            PickStage::ImageClip => Some(self.clip_image(&guard, el, doc).await),
        }
    }

    async fn sample_at(&self, x: f64, y: f64) -> Result<Rgb, DispatchError> {
        let screenshot = self.proxy.capture_visible_area().await?;
        sample_pixel(&screenshot, x, y, self.device_pixel_ratio)
    }

    fn image_filename(&self, src: &str, el: &crate::dom::Element, doc: &Document) -> String {
        let path = url::Url::parse(&doc.url)
            .map(|u| u.path().to_string())
            .unwrap_or_default();
        let data = FilenameData {
            title: doc.title.clone(),
            host: doc.host(),
            path,
            width: el.rect.width.round() as u32,
            height: el.rect.height.round() as u32,
            seq: 1,
            ext: markup::image_extension(src).unwrap_or_else(|| "png".to_string()),
        };
        generate_filename(&self.filename_template, &data)
    }

    async fn save_image(
        &self,
        guard: &BusyGuard,
        el: &crate::dom::Element,
        doc: &Document,
    ) -> DispatchOutcome {
        let Some(src) = el.attr("src") else {
            self.dispatcher.notifier().notify(&Notice::Empty {
                message: "That isn't an image".to_string(),
            });
            return DispatchOutcome::Empty;
        };
        let filename = self.image_filename(src, el, doc);
        match self.proxy.download_url(src, &filename).await {
            Ok(()) => {
                self.dispatcher
                    .notifier()
                    .notify(&Notice::Saved { filename });
                self.dispatcher
                    .record_success(guard, "ImageSave".to_string(), src.to_string(), &doc.url)
            }
            Err(err) => self.dispatcher.fail(err, "imageSave", &doc.url),
        }
    }

    async fn clip_image(
        &self,
        guard: &BusyGuard,
        el: &crate::dom::Element,
        doc: &Document,
    ) -> DispatchOutcome {
        let Some(src) = el.attr("src") else {
            self.dispatcher.notifier().notify(&Notice::Empty {
                message: "That isn't an image".to_string(),
            });
            return DispatchOutcome::Empty;
        };
        let png = match self.proxy.fetch_image(src).await {
            Ok(png) => png,
            Err(err) => return self.dispatcher.fail(err, "imageClip", &doc.url),
        };
        match self.dispatcher.write_image(&png) {
            Ok(()) => {
                self.dispatcher
                    .record_success(guard, "Image".to_string(), src.to_string(), &doc.url)
            }
            Err(clip_err) => {
                // Clipboard refused the image: fall back to saving it.
                log::warn!("Image clipboard write failed ({}), saving instead", clip_err);
                let filename = self.image_filename(src, el, doc);
                match self.proxy.download_url(src, &filename).await {
                    Ok(()) => {
                        self.dispatcher
                            .notifier()
                            .notify(&Notice::Saved { filename });
                        self.dispatcher.record_success(
                            guard,
                            "Image".to_string(),
                            src.to_string(),
                            &doc.url,
                        )
                    }
                    Err(err) => self.dispatcher.fail(err, "imageClip", &doc.url),
                }
            }
        }
    }
}
