//! Host configuration module.
//!
//! Everything the rewriter needs to know about the host site: where uploads
//! live, where the CDN lives, and which named sizes are registered. Loaded
//! from a TOML file and merged over stock defaults, so a config file only
//! needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # Base URL of the uploads directory. Only URLs under it are rewritten.
//! upload_base_url = "http://example.org/wp-content/uploads"
//!
//! # Base URL of the image CDN; replaces upload_base_url in rewritten URLs.
//! cdn_url = "http://example.org/tachyon"
//!
//! multisite = false               # strip /sites/<n> from the upload base
//! content_width = 640             # omit for no theme content width
//! remove_size_attributes = true   # drop width/height from rewritten tags
//!
//! [sizes.thumbnail]
//! width = 150
//! height = 150
//! crop = true
//!
//! [sizes.medium]
//! width = 300
//! height = 300
//!
//! [custom_sizes.hero]
//! width = 1600
//! height = 600
//! crop = ["top", "center"]        # or true / false
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::sizes::{CropSpec, FULL};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Host configuration loaded from a TOML file.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    /// Base URL of the host's uploads directory.
    pub upload_base_url: String,
    /// Base URL of the image CDN.
    pub cdn_url: String,
    /// Whether upload URLs carry a `/sites/<n>` segment to normalize away.
    pub multisite: bool,
    /// Theme content width in pixels, if the theme declares one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_width: Option<u32>,
    /// Drop `width`/`height` attributes from rewritten tags.
    pub remove_size_attributes: bool,
    /// Built-in size settings.
    pub sizes: SizesConfig,
    /// Additional named sizes, keyed by name.
    pub custom_sizes: BTreeMap<String, CustomSize>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            upload_base_url: "http://example.org/wp-content/uploads".to_string(),
            cdn_url: "http://example.org/tachyon".to_string(),
            multisite: false,
            content_width: None,
            remove_size_attributes: true,
            sizes: SizesConfig::default(),
            custom_sizes: BTreeMap::new(),
        }
    }
}

impl HostConfig {
    /// Validate URLs and size definitions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_base_url("upload_base_url", &self.upload_base_url)?;
        validate_base_url("cdn_url", &self.cdn_url)?;
        if self.content_width == Some(0) {
            return Err(ConfigError::Validation(
                "content_width must be non-zero (omit it to disable)".into(),
            ));
        }
        for (name, size) in &self.custom_sizes {
            if name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "custom_sizes names must not be empty".into(),
                ));
            }
            if name == FULL {
                return Err(ConfigError::Validation(format!(
                    "custom_sizes.{FULL} is reserved for the original image"
                )));
            }
            if size.width == 0 && size.height == 0 {
                return Err(ConfigError::Validation(format!(
                    "custom_sizes.{name} needs a non-zero width or height"
                )));
            }
        }
        Ok(())
    }
}

fn validate_base_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::Validation(format!("{key} is not a valid URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation(format!(
            "{key} must be an http or https URL"
        )));
    }
    Ok(())
}

/// Built-in size settings, as the host's media options define them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SizesConfig {
    pub thumbnail: ThumbnailSize,
    pub medium: BoxSize,
    pub medium_large: BoxSize,
    pub large: BoxSize,
}

impl Default for SizesConfig {
    fn default() -> Self {
        Self {
            thumbnail: ThumbnailSize::default(),
            medium: BoxSize {
                width: 300,
                height: 300,
            },
            medium_large: BoxSize {
                width: 768,
                height: 0,
            },
            large: BoxSize {
                width: 1024,
                height: 1024,
            },
        }
    }
}

/// Thumbnail box; the only built-in that may hard crop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailSize {
    pub width: u32,
    pub height: u32,
    pub crop: bool,
}

impl Default for ThumbnailSize {
    fn default() -> Self {
        Self {
            width: 150,
            height: 150,
            crop: true,
        }
    }
}

/// Fit-only box for `medium`, `medium_large` and `large`. Zero means unbounded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoxSize {
    pub width: u32,
    pub height: u32,
}

/// A custom named size. Zero on an axis means unbounded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CustomSize {
    pub width: u32,
    pub height: u32,
    pub crop: CropSpec,
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(HostConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file doesn't exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<HostConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: HostConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a TOML file, merged over stock defaults.
///
/// A missing file yields the validated defaults.
pub fn load_config(path: &Path) -> Result<HostConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Tachyon Rewrite Configuration
# =============================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# Base URL of the uploads directory. Only image URLs under this prefix
# are rewritten; everything else is left alone.
upload_base_url = "http://example.org/wp-content/uploads"

# Base URL of the image CDN. Replaces upload_base_url in rewritten URLs.
cdn_url = "http://example.org/tachyon"

# Multisite installs store uploads under /sites/<n>/; the CDN serves them
# from the network-wide base.
multisite = false

# Theme content width in pixels. Images wider than this are scaled down.
# content_width = 640

# Remove width/height attributes from rewritten <img> tags so the browser
# sizes them from the CDN output.
remove_size_attributes = true

# ---------------------------------------------------------------------------
# Built-in sizes (0 = unbounded on that axis)
# ---------------------------------------------------------------------------
[sizes.thumbnail]
width = 150
height = 150
crop = true

[sizes.medium]
width = 300
height = 300

[sizes.medium_large]
width = 768
height = 0

[sizes.large]
width = 1024
height = 1024

# ---------------------------------------------------------------------------
# Custom sizes
# ---------------------------------------------------------------------------
# crop = false                fit inside the box
# crop = true                 hard crop, centered
# crop = ["top", "left"]      hard crop anchored to the given edges
#
# [custom_sizes.hero]
# width = 1600
# height = 600
# crop = ["top", "center"]
"##
}
