//! The closed set of capture modes.
//!
//! Every user-triggerable action maps to one [`Mode`] variant, so the
//! transform registry stays exhaustive-checkable instead of falling
//! through a string match. Wire identifiers (menu items, shortcuts,
//! quick-launch buttons) parse with [`Mode::parse`]; unknown
//! identifiers deliberately fall back to plain-text copy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Case conversion styles carried by [`Mode::Case`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStyle {
    Upper,
    Lower,
    Title,
    Camel,
    Snake,
    Kebab,
    Pascal,
}

impl CaseStyle {
    pub fn wire_name(&self) -> &'static str {
        match self {
            CaseStyle::Upper => "uppercase",
            CaseStyle::Lower => "lowercase",
            CaseStyle::Title => "titlecase",
            CaseStyle::Camel => "camelcase",
            CaseStyle::Snake => "snakecase",
            CaseStyle::Kebab => "kebabcase",
            CaseStyle::Pascal => "pascalcase",
        }
    }
}

/// One capture mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Mode {
    Text,
    Html,
    Markdown,
    TableCsv,
    TableTsv,
    Links,
    LinksEnhanced,
    JsonFormat,
    CodeSyntax,
    CleanCopy,
    SmartTitleCase,
    UnicodeFix,
    Slugify,
    CopyWithSource,
    MetaScraper,
    ImageList,
    ColorPicker,
    ContrastChecker,
    ColorPalette,
    ApplySiteRules,
    Case(CaseStyle),
    TextStatistics,
    Base64Encode,
    Base64Decode,
    ImageSave,
    ImageClip,
}

/// All modes, for `--list-modes` and exhaustive tests.
pub const ALL_MODES: &[Mode] = &[
    Mode::Text,
    Mode::Html,
    Mode::Markdown,
    Mode::TableCsv,
    Mode::TableTsv,
    Mode::Links,
    Mode::LinksEnhanced,
    Mode::JsonFormat,
    Mode::CodeSyntax,
    Mode::CleanCopy,
    Mode::SmartTitleCase,
    Mode::UnicodeFix,
    Mode::Slugify,
    Mode::CopyWithSource,
    Mode::MetaScraper,
    Mode::ImageList,
    Mode::ColorPicker,
    Mode::ContrastChecker,
    Mode::ColorPalette,
    Mode::ApplySiteRules,
    Mode::Case(CaseStyle::Upper),
    Mode::Case(CaseStyle::Lower),
    Mode::Case(CaseStyle::Title),
    Mode::Case(CaseStyle::Camel),
    Mode::Case(CaseStyle::Snake),
    Mode::Case(CaseStyle::Kebab),
    Mode::Case(CaseStyle::Pascal),
    Mode::TextStatistics,
    Mode::Base64Encode,
    Mode::Base64Decode,
    Mode::ImageSave,
    Mode::ImageClip,
];

impl Mode {
    /// Parses a wire identifier. Unknown identifiers fall back to
    /// [`Mode::Text`] so a stale menu entry still copies something.
    pub fn parse(s: &str) -> Mode {
        if let Some(case) = s.strip_prefix("case_") {
            let style = match case {
                "uppercase" => Some(CaseStyle::Upper),
                "lowercase" => Some(CaseStyle::Lower),
                "titlecase" => Some(CaseStyle::Title),
                "camelcase" => Some(CaseStyle::Camel),
                "snakecase" => Some(CaseStyle::Snake),
                "kebabcase" => Some(CaseStyle::Kebab),
                "pascalcase" => Some(CaseStyle::Pascal),
                _ => None,
            };
            if let Some(style) = style {
                return Mode::Case(style);
            }
            log::warn!("Unknown case mode '{}', falling back to text", s);
            return Mode::Text;
        }
        match s {
            "text" => Mode::Text,
            "html" => Mode::Html,
            "markdown" => Mode::Markdown,
            "table_csv" | "table_export_enhanced" => Mode::TableCsv,
            "table_tsv" => Mode::TableTsv,
            "links" => Mode::Links,
            "extract_links_enhanced" => Mode::LinksEnhanced,
            "json_format" => Mode::JsonFormat,
            "code_syntax" => Mode::CodeSyntax,
            "clean_copy" => Mode::CleanCopy,
            "smart_title_case" => Mode::SmartTitleCase,
            "unicode_fix" => Mode::UnicodeFix,
            "slugify" => Mode::Slugify,
            "copy_with_source" => Mode::CopyWithSource,
            "meta_og_scraper" => Mode::MetaScraper,
            "image_downloader" => Mode::ImageList,
            "color_picker" => Mode::ColorPicker,
            "contrast_checker" => Mode::ContrastChecker,
            "color_palette" => Mode::ColorPalette,
            "apply_site_rules" => Mode::ApplySiteRules,
            "text_statistics" => Mode::TextStatistics,
            "base64_encode" => Mode::Base64Encode,
            "base64_decode" => Mode::Base64Decode,
            "image_save" => Mode::ImageSave,
            "image_clip" => Mode::ImageClip,
            other => {
                log::warn!("Unknown mode '{}', falling back to text", other);
                Mode::Text
            }
        }
    }

    /// The wire identifier this mode parses from.
    pub fn wire_name(&self) -> String {
        match self {
            Mode::Text => "text".to_string(),
            Mode::Html => "html".to_string(),
            Mode::Markdown => "markdown".to_string(),
            Mode::TableCsv => "table_csv".to_string(),
            Mode::TableTsv => "table_tsv".to_string(),
            Mode::Links => "links".to_string(),
            Mode::LinksEnhanced => "extract_links_enhanced".to_string(),
            Mode::JsonFormat => "json_format".to_string(),
            Mode::CodeSyntax => "code_syntax".to_string(),
            Mode::CleanCopy => "clean_copy".to_string(),
            Mode::SmartTitleCase => "smart_title_case".to_string(),
            Mode::UnicodeFix => "unicode_fix".to_string(),
            Mode::Slugify => "slugify".to_string(),
            Mode::CopyWithSource => "copy_with_source".to_string(),
            Mode::MetaScraper => "meta_og_scraper".to_string(),
            Mode::ImageList => "image_downloader".to_string(),
            Mode::ColorPicker => "color_picker".to_string(),
            Mode::ContrastChecker => "contrast_checker".to_string(),
            Mode::ColorPalette => "color_palette".to_string(),
            Mode::ApplySiteRules => "apply_site_rules".to_string(),
            Mode::Case(style) => format!("case_{}", style.wire_name()),
            Mode::TextStatistics => "text_statistics".to_string(),
            Mode::Base64Encode => "base64_encode".to_string(),
            Mode::Base64Decode => "base64_decode".to_string(),
            Mode::ImageSave => "image_save".to_string(),
            Mode::ImageClip => "image_clip".to_string(),
        }
    }

    /// Human-readable category label used for history records and
    /// success notifications.
    pub fn kind(&self) -> String {
        match self {
            Mode::Text => "Text".to_string(),
            Mode::Html => "HTML".to_string(),
            Mode::Markdown => "Markdown".to_string(),
            Mode::TableCsv => "CSV".to_string(),
            Mode::TableTsv => "TSV".to_string(),
            Mode::Links => "Links".to_string(),
            Mode::LinksEnhanced => "Enhanced Links".to_string(),
            Mode::JsonFormat => "JSON".to_string(),
            Mode::CodeSyntax => "Code".to_string(),
            Mode::CleanCopy => "Clean Text".to_string(),
            Mode::SmartTitleCase => "Smart Title Case".to_string(),
            Mode::UnicodeFix => "Unicode Fixed".to_string(),
            Mode::Slugify => "Slug".to_string(),
            Mode::CopyWithSource => "Text with Source".to_string(),
            Mode::MetaScraper => "Meta/OG Data".to_string(),
            Mode::ImageList => "Images".to_string(),
            Mode::ColorPicker => "Color".to_string(),
            Mode::ContrastChecker => "Contrast Check".to_string(),
            Mode::ColorPalette => "Color Palette".to_string(),
            Mode::ApplySiteRules => "Site Rules Applied".to_string(),
            Mode::Case(style) => format!("Text ({})", style.wire_name()),
            Mode::TextStatistics => "Text Statistics".to_string(),
            Mode::Base64Encode => "Base64 Encoded".to_string(),
            Mode::Base64Decode => "Base64 Decoded".to_string(),
            Mode::ImageSave => "ImageSave".to_string(),
            Mode::ImageClip => "Image".to_string(),
        }
    }

    /// True for modes that sample rendered pixels and therefore need
    /// the privileged screenshot round-trip.
    pub fn needs_pixel_sample(&self) -> bool {
        matches!(
            self,
            Mode::ColorPicker | Mode::ContrastChecker | Mode::ColorPalette
        )
    }

    /// True for modes that always go through the picker, even when a
    /// text selection is active.
    pub fn always_picks(&self) -> bool {
        self.needs_pixel_sample() || matches!(self, Mode::ImageSave | Mode::ImageClip)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.wire_name())
    }
}

impl From<Mode> for String {
    fn from(mode: Mode) -> String {
        mode.wire_name()
    }
}

impl TryFrom<String> for Mode {
    type Error = std::convert::Infallible;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Ok(Mode::parse(&s))
    }
}
