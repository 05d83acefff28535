//! Configuration file support for domclip.
//!
//! Settings are loaded from `~/.config/domclip/config.toml`: transform
//! tuning, image filters, the image-save filename template, the
//! quick-launch list size, and per-site cleanup rules.
//!
//! If no config file exists, sensible defaults are used automatically.

pub mod types;

pub use types::{FilenameConfig, ImagesConfig, QuickLaunchConfig, SitesConfig, TransformsConfig};

use crate::transform::site_rules::SiteRules;
use crate::transform::TransformOptions;
use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Main configuration structure containing all user settings.
///
/// All fields have sensible defaults and will use those if not
/// specified in the config file.
///
/// # Example TOML
/// ```toml
/// [transforms]
/// reading_wpm = 225
///
/// [images]
/// min_width = 256
/// min_height = 256
/// extensions = ["png", "jpg", "jpeg", "webp"]
///
/// [filename]
/// template = "{title:slug}-{date:YYYYMMDD}-{time:HHmmss}-{w}x{h}.{ext}"
///
/// [sites."example.com"]
/// url_params_to_remove = ["utm_*", "fbclid"]
/// [sites."example.com".clean_text]
/// zero_width = true
/// smart_quotes = "straight"
/// ```
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    /// Transform tuning (reading speed, ...)
    #[serde(default)]
    pub transforms: TransformsConfig,

    /// Image enumeration filters
    #[serde(default)]
    pub images: ImagesConfig,

    /// Filename template for saved images
    #[serde(default)]
    pub filename: FilenameConfig,

    /// Quick-launch list settings
    #[serde(default)]
    pub quick_launch: QuickLaunchConfig,

    /// Per-site cleanup rules, keyed by page host
    #[serde(default)]
    pub sites: SitesConfig,
}

impl Config {
    /// Validates and clamps all configuration values to acceptable
    /// ranges. Invalid values are clamped to the nearest valid value
    /// and a warning is logged.
    fn validate_and_clamp(&mut self) {
        if !(50..=2000).contains(&self.transforms.reading_wpm) {
            log::warn!(
                "Invalid reading_wpm {}, clamping to 50-2000 range",
                self.transforms.reading_wpm
            );
            self.transforms.reading_wpm = self.transforms.reading_wpm.clamp(50, 2000);
        }

        if !(16..=4096).contains(&self.images.min_width) {
            log::warn!(
                "Invalid images.min_width {}, clamping to 16-4096 range",
                self.images.min_width
            );
            self.images.min_width = self.images.min_width.clamp(16, 4096);
        }
        if !(16..=4096).contains(&self.images.min_height) {
            log::warn!(
                "Invalid images.min_height {}, clamping to 16-4096 range",
                self.images.min_height
            );
            self.images.min_height = self.images.min_height.clamp(16, 4096);
        }

        // Extensions are matched lowercase without the dot.
        self.images.extensions = self
            .images
            .extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        if self.images.extensions.is_empty() {
            log::warn!("Empty images.extensions list, falling back to defaults");
            self.images.extensions = types::default_image_extensions();
        }

        if self.filename.template.trim().is_empty() {
            log::warn!("Empty filename template, falling back to default");
            self.filename.template = types::default_filename_template();
        }

        if !(1..=10).contains(&self.quick_launch.slots) {
            log::warn!(
                "Invalid quick_launch.slots {}, clamping to 1-10 range",
                self.quick_launch.slots
            );
            self.quick_launch.slots = self.quick_launch.slots.clamp(1, 10);
        }
    }

    /// Returns the path to the configuration file.
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be determined
    /// (e.g., HOME not set).
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("domclip");

        Ok(config_dir.join("config.toml"))
    }

    /// Loads configuration from file, or returns defaults if not found.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The config directory path cannot be determined
    /// - The file exists but cannot be read
    /// - The file exists but contains invalid TOML syntax
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    /// Loads configuration from an explicit path.
    pub fn load_from(config_path: &PathBuf) -> Result<Self> {
        if !config_path.exists() {
            info!("Config file not found, using defaults");
            debug!("Expected config at: {}", config_path.display());
            return Ok(Self::default());
        }

        let config_str = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

        config.validate_and_clamp();

        info!("Loaded config from {}", config_path.display());
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Saves the current configuration to file.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The config directory cannot be created
    /// - The config cannot be serialized to TOML
    /// - The file cannot be written
    #[allow(dead_code)]
    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let config_str = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, config_str)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        info!("Saved config to {}", config_path.display());
        Ok(())
    }

    /// The cleanup rules configured for a page host, if any. Absence
    /// means a passthrough.
    pub fn site_rules_for(&self, host: &str) -> Option<&SiteRules> {
        self.sites.get(host)
    }

    /// Transform options for a page on the given host.
    pub fn transform_options(&self, host: &str) -> TransformOptions {
        TransformOptions {
            reading_wpm: self.transforms.reading_wpm,
            image_min_width: self.images.min_width,
            image_min_height: self.images.min_height,
            image_extensions: self.images.extensions.clone(),
            site_rules: self.site_rules_for(host).cloned(),
        }
    }
}
