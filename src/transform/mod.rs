//! The transform registry: one pure function per capture mode.
//!
//! [`apply`] maps a mode plus its input (a picked element or the
//! active selection string) to either a clipboard-ready payload, an
//! "empty result" signal (no table here, no links found, ...), or an
//! error. Pixel-sampling and image modes are not handled here; they
//! need the privileged proxy and are routed by the controller.

pub mod color;
pub mod markup;
pub mod site_rules;
pub mod text;

use crate::dispatch::error::DispatchError;
use crate::dom::{Document, Element};
use crate::mode::Mode;

pub use site_rules::SiteRules;

/// What a transform operates on.
#[derive(Debug, Clone, Copy)]
pub enum TransformInput<'a> {
    /// The active text selection.
    Selection(&'a str),
    /// The element confirmed by the picker.
    Element(&'a Element),
}

impl<'a> TransformInput<'a> {
    /// Readable text of the input, whichever variant it is.
    fn text(&self) -> String {
        match self {
            TransformInput::Selection(s) => (*s).to_string(),
            TransformInput::Element(el) => el.inner_text(),
        }
    }
}

/// Per-transform tuning taken from the configuration.
#[derive(Debug, Clone)]
pub struct TransformOptions {
    pub reading_wpm: u32,
    pub image_min_width: u32,
    pub image_min_height: u32,
    pub image_extensions: Vec<String>,
    pub site_rules: Option<SiteRules>,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            reading_wpm: text::DEFAULT_READING_WPM,
            image_min_width: 256,
            image_min_height: 256,
            image_extensions: vec![
                "png".to_string(),
                "jpg".to_string(),
                "jpeg".to_string(),
                "webp".to_string(),
            ],
            site_rules: None,
        }
    }
}

/// Result of running a transform.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A payload ready for the clipboard and history.
    Copied { kind: String, data: String },
    /// Nothing applicable at this input. Not an error: short-circuits
    /// to an informational notice.
    Empty(&'static str),
}

impl Outcome {
    fn copied(mode: Mode, data: String) -> Self {
        Outcome::Copied {
            kind: mode.kind(),
            data,
        }
    }
}

/// Runs the transform for `mode` over `input`.
///
/// Transforms are deterministic and never mutate the page. The one
/// intended side effect in the family (site-rule URL rewriting) is
/// reported inside the payload for the host to act on.
pub fn apply(
    mode: Mode,
    input: TransformInput<'_>,
    doc: &Document,
    options: &TransformOptions,
) -> Result<Outcome, DispatchError> {
    let outcome = match mode {
        Mode::Text => Outcome::copied(mode, input.text()),
        Mode::Html => {
            let data = match input {
                TransformInput::Element(el) => markup::outer_html(el),
                TransformInput::Selection(s) => s.to_string(),
            };
            Outcome::copied(mode, data)
        }
        Mode::Markdown => {
            let data = match input {
                TransformInput::Element(el) => markup::markdown_text(el),
                TransformInput::Selection(s) => s.to_string(),
            };
            Outcome::copied(mode, data)
        }
        Mode::TableCsv | Mode::TableTsv => {
            let format = if mode == Mode::TableCsv {
                markup::TableFormat::Csv
            } else {
                markup::TableFormat::Tsv
            };
            match input {
                TransformInput::Element(el) => match markup::table_export(el, format) {
                    Some(data) => Outcome::copied(mode, data),
                    None => Outcome::Empty(markup::NO_TABLE),
                },
                // A plain string selection has no table structure.
                TransformInput::Selection(_) => Outcome::Empty(markup::NO_TABLE),
            }
        }
        Mode::Links => match input {
            TransformInput::Element(el) => match markup::extract_links(el) {
                Some(data) => Outcome::copied(mode, data),
                None => Outcome::Empty(markup::NO_LINKS),
            },
            TransformInput::Selection(_) => Outcome::Empty(markup::NO_LINKS),
        },
        Mode::LinksEnhanced => match input {
            TransformInput::Element(el) => match markup::extract_links_enhanced(el) {
                Some(data) => Outcome::copied(mode, data),
                None => Outcome::Empty(markup::NO_LINKS),
            },
            TransformInput::Selection(_) => Outcome::Empty(markup::NO_LINKS),
        },
        Mode::JsonFormat => Outcome::copied(mode, text::format_json(&input.text())),
        Mode::CodeSyntax => {
            let (fenced, _language) = text::code_fence(&input.text());
            Outcome::copied(mode, fenced)
        }
        Mode::CleanCopy => Outcome::copied(mode, text::clean_text(&input.text())),
        Mode::SmartTitleCase => Outcome::copied(mode, text::smart_title_case(&input.text())),
        Mode::UnicodeFix => Outcome::copied(mode, text::unicode_fix(&input.text())),
        Mode::Slugify => Outcome::copied(mode, text::slugify(&input.text())),
        Mode::CopyWithSource => {
            Outcome::copied(mode, text::with_source(&input.text(), &doc.title, &doc.url))
        }
        Mode::MetaScraper => Outcome::copied(mode, markup::meta_report(doc)),
        Mode::ImageList => {
            let images = markup::page_images(
                doc,
                options.image_min_width,
                options.image_min_height,
                &options.image_extensions,
            );
            if images.is_empty() {
                Outcome::Empty(markup::NO_IMAGES)
            } else {
                Outcome::copied(mode, markup::format_images(&images))
            }
        }
        Mode::ApplySiteRules => {
            let applied =
                site_rules::apply_site_rules(&input.text(), options.site_rules.as_ref(), &doc.url);
            let mut data = applied.text;
            if let Some(url) = applied.rewritten_url {
                log::info!("Site rules rewrote page URL to {}", url);
                data.push_str(&format!("\n\nCleaned URL: {}", url));
            }
            Outcome::copied(mode, data)
        }
        Mode::Case(style) => Outcome::copied(mode, text::convert_case(&input.text(), style)),
        Mode::TextStatistics => {
            let stats = text::text_statistics(&input.text(), options.reading_wpm);
            Outcome::copied(mode, text::format_statistics(&stats))
        }
        Mode::Base64Encode => Outcome::copied(mode, text::base64_encode(&input.text())),
        Mode::Base64Decode => {
            let raw = input.text();
            if !text::is_base64(raw.trim()) {
                Outcome::Empty("Text doesn't appear to be Base64 encoded")
            } else {
                match text::base64_decode(&raw) {
                    Some(decoded) => Outcome::copied(mode, decoded),
                    None => Outcome::Empty("Text doesn't appear to be Base64 encoded"),
                }
            }
        }
        Mode::ColorPicker
        | Mode::ContrastChecker
        | Mode::ColorPalette
        | Mode::ImageSave
        | Mode::ImageClip => {
            return Err(DispatchError::Unknown(format!(
                "mode {} requires the privileged proxy and is routed by the controller",
                mode
            )));
        }
    };
    Ok(outcome)
}
