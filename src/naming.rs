//! Filename parsing for the `-WxH` generated-size convention.
//!
//! When the host generates an intermediate size of an upload it writes a
//! sibling file whose stem carries the pixel box of the variant:
//!
//! - `photo.jpg` → `photo-150x150.jpg` (thumbnail)
//! - `photo.jpg` → `photo-300x169.jpg` (medium)
//!
//! Rewriting needs both directions: read the box back out of a variant's
//! name, and recover the canonical original so the CDN always works from
//! the full-size source.
//!
//! ## Edited crops
//!
//! Images edited in the host's media editor get a hash suffix instead:
//! `photo-e1577829132123.jpg`, with variants such as
//! `photo-e1577829132123-150x150.jpg`. These are already the canonical
//! file for the edit and must not be stripped further.

use regex::Regex;
use std::sync::LazyLock;

/// File extensions the CDN can transform. Everything else passes through.
pub const EXTENSIONS: &[&str] = &["gif", "jpg", "jpeg", "png"];

static DIMENSION_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)-(\d+)x(\d+)\.(?:gif|jpg|jpeg|png)$").expect("DIMENSION_SUFFIX is valid")
});

// The whole trailing run, so stripping is idempotent.
static DIMENSION_SUFFIX_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:-\d+x\d+)+(\.(?:gif|jpg|jpeg|png))$").expect("DIMENSION_SUFFIX_RUN is valid")
});

static EDITED_CROP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)-e[a-z0-9]+(?:-\d+x\d+)?\.(?:gif|jpg|jpeg|png)$").expect("EDITED_CROP is valid")
});

/// Pixel box parsed out of a variant filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileDimensions {
    pub width: u32,
    pub height: u32,
}

/// Parse the `-WxH` suffix of a filename or URL.
///
/// Returns `None` when the name doesn't follow the convention, when either
/// number is zero, or when the extension is not one the CDN handles.
///
/// - `".../photo-300x169.jpg"` → `Some(300×169)`
/// - `".../photo.jpg"` → `None`
/// - `".../photo-0x169.jpg"` → `None`
/// - `".../photo-300x169.webp"` → `None`
pub fn parse_dimensions(name: &str) -> Option<FileDimensions> {
    let caps = DIMENSION_SUFFIX.captures(name)?;
    let width: u32 = caps[1].parse().ok()?;
    let height: u32 = caps[2].parse().ok()?;
    if width == 0 || height == 0 {
        return None;
    }
    Some(FileDimensions { width, height })
}

/// Remove the trailing `-WxH` suffix to recover the canonical source URL.
///
/// Returns the input unchanged when there is no suffix. A stacked run such
/// as `-10x10-20x20` is removed as a whole, so applying this twice always
/// gives the same result as applying it once.
pub fn strip_dimension_suffix(url: &str) -> String {
    DIMENSION_SUFFIX_RUN.replace(url, "$1").into_owned()
}

/// Whether the filename is an editor-produced crop (`name-e<hash>.<ext>`).
pub fn is_edited_crop(name: &str) -> bool {
    EDITED_CROP.is_match(basename(name))
}

/// Whether the path ends in one of the [`EXTENSIONS`], ignoring case.
pub fn has_supported_extension(path: &str) -> bool {
    let file = basename(path);
    file.rsplit_once('.')
        .is_some_and(|(_, ext)| EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

/// Last path segment of a URL, ignoring any query string or fragment.
pub fn basename(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/').next().unwrap_or(path)
}
