//! Configuration type definitions.

use crate::transform::site_rules::SiteRules;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Transform tuning.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransformsConfig {
    /// Reading speed used by the text statistics transform, in words
    /// per minute (valid range: 50 - 2000)
    #[serde(default = "default_reading_wpm")]
    pub reading_wpm: u32,
}

impl Default for TransformsConfig {
    fn default() -> Self {
        Self {
            reading_wpm: default_reading_wpm(),
        }
    }
}

/// Image enumeration filters.
#[derive(Debug, Serialize, Deserialize)]
pub struct ImagesConfig {
    /// Minimum rendered width in pixels for an image to be listed
    /// (valid range: 16 - 4096)
    #[serde(default = "default_image_min_dimension")]
    pub min_width: u32,

    /// Minimum rendered height in pixels (valid range: 16 - 4096)
    #[serde(default = "default_image_min_dimension")]
    pub min_height: u32,

    /// Source file extensions to accept, lowercase, without the dot
    #[serde(default = "default_image_extensions")]
    pub extensions: Vec<String>,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            min_width: default_image_min_dimension(),
            min_height: default_image_min_dimension(),
            extensions: default_image_extensions(),
        }
    }
}

/// Image-save filename settings.
#[derive(Debug, Serialize, Deserialize)]
pub struct FilenameConfig {
    /// Template with named placeholders: `{title:slug}`, `{date:YYYYMMDD}`,
    /// `{time:HHmmss}`, `{w}`, `{h}`, `{seq}`, `{rand4}`, `{ext}`.
    /// Unknown placeholders are left as literal text.
    #[serde(default = "default_filename_template")]
    pub template: String,
}

impl Default for FilenameConfig {
    fn default() -> Self {
        Self {
            template: default_filename_template(),
        }
    }
}

/// Quick-launch list settings.
#[derive(Debug, Serialize, Deserialize)]
pub struct QuickLaunchConfig {
    /// Number of most-used modes to surface (valid range: 1 - 10)
    #[serde(default = "default_quick_launch_slots")]
    pub slots: usize,
}

impl Default for QuickLaunchConfig {
    fn default() -> Self {
        Self {
            slots: default_quick_launch_slots(),
        }
    }
}

/// Per-host cleanup rules, keyed by page host.
pub type SitesConfig = HashMap<String, SiteRules>;

pub(super) fn default_reading_wpm() -> u32 {
    225
}

pub(super) fn default_image_min_dimension() -> u32 {
    256
}

pub(super) fn default_image_extensions() -> Vec<String> {
    ["png", "jpg", "jpeg", "webp"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub(super) fn default_filename_template() -> String {
    "{title:slug}-{date:YYYYMMDD}-{time:HHmmss}-{w}x{h}.{ext}".to_string()
}

pub(super) fn default_quick_launch_slots() -> usize {
    5
}
