//! Shared test utilities for the tachyon-rewrite test suite.
//!
//! Provides the reference host (upload base, CDN base, custom sizes), the
//! two reference attachments and small extractors for rewritten HTML.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let e = engine();
//! let html = format!(r#"<img src="{}">"#, upload("tachyon-150x150.jpg"));
//! assert_eq!(src_of(&e.rewrite_content(&html)), "http://tachy.on/u/tachyon.jpg?resize=150,150");
//! ```

use regex::Regex;
use std::collections::BTreeMap;

use crate::attachment::{Attachment, AttachmentIndex, SizeVariant};
use crate::config::{CustomSize, HostConfig};
use crate::engine::Engine;
use crate::sizes::CropSpec;

pub const UPLOAD_BASE: &str = "http://example.org/wp-content/uploads";
pub const CDN_BASE: &str = "http://tachy.on/u";

// =========================================================================
// Fixture setup
// =========================================================================

/// The reference host config with the four custom sizes.
pub fn host_config() -> HostConfig {
    let custom = |width, height, crop| CustomSize {
        width,
        height,
        crop,
    };
    let mut config = HostConfig {
        upload_base_url: UPLOAD_BASE.to_string(),
        cdn_url: CDN_BASE.to_string(),
        ..HostConfig::default()
    };
    config.custom_sizes = BTreeMap::from([
        ("oversize2d-early".to_string(), custom(2500, 1500, CropSpec::Fit)),
        ("too-wide-shorter-crop".to_string(), custom(1500, 500, CropSpec::Center)),
        ("too-tall-narrower-crop".to_string(), custom(1000, 1000, CropSpec::Center)),
        ("oversize2d-late".to_string(), custom(2000, 1000, CropSpec::Fit)),
    ]);
    config
}

fn variant(file: &str, width: u32, height: u32) -> SizeVariant {
    SizeVariant {
        file: file.to_string(),
        width,
        height,
    }
}

/// Attachment 42 (`tachyon.jpg`, 1280×719) and 43
/// (`tachyon-large-scaled.jpg`, 2560×1440) with their generated variants.
pub fn attachments() -> AttachmentIndex {
    let small = Attachment {
        id: 42,
        file: "tachyon.jpg".to_string(),
        width: 1280,
        height: 719,
        sizes: BTreeMap::from([
            ("thumbnail".to_string(), variant("tachyon-150x150.jpg", 150, 150)),
            ("medium".to_string(), variant("tachyon-300x169.jpg", 300, 169)),
            ("medium_large".to_string(), variant("tachyon-768x431.jpg", 768, 431)),
            ("large".to_string(), variant("tachyon-1024x575.jpg", 1024, 575)),
            ("too-wide-shorter-crop".to_string(), variant("tachyon-1280x500.jpg", 1280, 500)),
            ("too-tall-narrower-crop".to_string(), variant("tachyon-1000x719.jpg", 1000, 719)),
        ]),
    };
    let large = Attachment {
        id: 43,
        file: "tachyon-large-scaled.jpg".to_string(),
        width: 2560,
        height: 1440,
        sizes: BTreeMap::from([
            ("thumbnail".to_string(), variant("tachyon-large-scaled-150x150.jpg", 150, 150)),
            ("medium".to_string(), variant("tachyon-large-scaled-300x169.jpg", 300, 169)),
            ("medium_large".to_string(), variant("tachyon-large-scaled-768x432.jpg", 768, 432)),
            ("large".to_string(), variant("tachyon-large-scaled-1024x576.jpg", 1024, 576)),
            ("oversize2d-early".to_string(), variant("tachyon-large-scaled-2500x1406.jpg", 2500, 1406)),
            ("too-wide-shorter-crop".to_string(), variant("tachyon-large-scaled-1500x500.jpg", 1500, 500)),
            ("too-tall-narrower-crop".to_string(), variant("tachyon-large-scaled-1000x1000.jpg", 1000, 1000)),
            ("oversize2d-late".to_string(), variant("tachyon-large-scaled-1778x1000.jpg", 1778, 1000)),
        ]),
    };
    [small, large].into_iter().collect()
}

/// Engine over the reference host and attachments.
pub fn engine() -> Engine {
    Engine::new(host_config()).with_attachments(attachments())
}

/// Absolute upload URL for a path under the upload base.
pub fn upload(path: &str) -> String {
    format!("{UPLOAD_BASE}/{path}")
}

// =========================================================================
// Extractors: panic with a clear message on miss
// =========================================================================

fn attribute(html: &str, name: &str) -> String {
    let re = Regex::new(&format!(r#"\s{name}=["']([^"']*)["']"#)).unwrap();
    re.captures(html)
        .map(|c| c[1].replace("&amp;", "&"))
        .unwrap_or_else(|| panic!("no {name} attribute in: {html}"))
}

/// The first `src` in `html`, unescaped.
pub fn src_of(html: &str) -> String {
    attribute(html, "src")
}

/// The first `href` in `html`, unescaped.
pub fn href_of(html: &str) -> String {
    attribute(html, "href")
}
