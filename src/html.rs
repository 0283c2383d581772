//! `<img>` extraction from raw post HTML.
//!
//! Post content is a fragment written by editors and plugins, not a
//! well-formed document, so extraction is a regex scan rather than a DOM
//! parse. Each match is an `<img>` tag plus the `<a>` wrapping it, if any.
//! The helpers below read attributes out of a matched tag's text and build
//! the edited copy that gets spliced back.

use crate::geometry::Dimension;
use regex::{Captures, Regex};
use std::ops::Range;
use std::sync::LazyLock;

static IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)(?:<a[^>]+?href=["'](?P<link_url>[^\s]+?)["'][^>]*?>\s*)?(?P<img_tag><img[^>]+?src=["'](?P<img_url>[^\s]+?)["'].*?>)(?:\s*</a>)?"#,
    )
    .expect("IMAGE is valid")
});

static WIDTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|\s)width=["']?([\d%.]+)["']?"#).expect("WIDTH is valid")
});

static HEIGHT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|\s)height=["']?([\d%.]+)["']?"#).expect("HEIGHT is valid")
});

static SIZE_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\s(?:width|height)=["']?[\d%.]+["']?"#).expect("SIZE_ATTRIBUTE is valid")
});

static SIZE_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)class=["']?[^"']*\bsize-([^"'\s]+)"#).expect("SIZE_CLASS is valid")
});

static ATTACHMENT_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)class=["']?[^"']*\bwp-image-(\d+)\b"#).expect("ATTACHMENT_CLASS is valid")
});

static LAZY_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\sdata-lazy-(?:src|original)=["']([^"']+)["']"#).expect("LAZY_SRC is valid")
});

static TAG_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\s?/)?>(\s*</a>)?$").expect("TAG_END is valid"));

/// Attribute flagging a tag for client-side dimension recalculation.
pub const RECALC_MARKER: &str = r#"data-recalc-dims="1""#;

/// One `<img>` found in content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageOccurrence {
    /// Byte range of the whole match (link and image) in the content.
    pub range: Range<usize>,
    /// `href` of the wrapping link, if any.
    pub link_url: Option<String>,
    /// The matched text from the link's opening tag through `</a>`.
    pub full_match: String,
    /// The `<img ...>` tag text.
    pub img_tag: String,
    /// The `src` attribute value, as written.
    pub img_url: String,
    /// Position among the occurrences.
    pub index: usize,
}

/// All `<img>` occurrences in `html`, in document order.
pub fn extract_images(html: &str) -> Vec<ImageOccurrence> {
    IMAGE
        .captures_iter(html)
        .enumerate()
        .filter_map(|(index, caps)| {
            let whole = caps.get(0)?;
            Some(ImageOccurrence {
                range: whole.range(),
                link_url: caps.name("link_url").map(|m| m.as_str().to_string()),
                full_match: whole.as_str().to_string(),
                img_tag: caps.name("img_tag")?.as_str().to_string(),
                img_url: caps.name("img_url")?.as_str().to_string(),
                index,
            })
        })
        .collect()
}

pub fn width_attribute(tag: &str) -> Option<Dimension> {
    WIDTH.captures(tag).and_then(|c| Dimension::parse(&c[1]))
}

pub fn height_attribute(tag: &str) -> Option<Dimension> {
    HEIGHT.captures(tag).and_then(|c| Dimension::parse(&c[1]))
}

/// The `<name>` of a `size-<name>` class token.
pub fn size_class(tag: &str) -> Option<&str> {
    SIZE_CLASS.captures(tag).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// The `<id>` of a `wp-image-<id>` token in the class attribute.
pub fn attachment_id(tag: &str) -> Option<u64> {
    ATTACHMENT_CLASS
        .captures(tag)
        .and_then(|c| c[1].parse().ok())
        .filter(|&id| id > 0)
}

/// `data-lazy-src` / `data-lazy-original` value.
pub fn lazy_src(tag: &str) -> Option<&str> {
    LAZY_SRC.captures(tag).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// Distinct attachment IDs across `occurrences`, in first-seen order.
pub fn attachment_ids(occurrences: &[ImageOccurrence]) -> Vec<u64> {
    let mut ids = Vec::new();
    for id in occurrences.iter().filter_map(|o| attachment_id(&o.img_tag)) {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

/// Remove `width` and `height` attributes.
pub fn strip_size_attributes(tag: &str) -> String {
    SIZE_ATTRIBUTE.replace_all(tag, "").into_owned()
}

/// Add [`RECALC_MARKER`] before the tag's closing `>` (or `/>`). A tag that
/// already carries it is returned unchanged.
pub fn mark_for_recalc(tag: &str) -> String {
    if tag.contains(RECALC_MARKER) {
        return tag.to_string();
    }
    TAG_END
        .replace(tag, |caps: &Captures| {
            format!(
                " {RECALC_MARKER}{}>{}",
                caps.get(1).map_or("", |m| m.as_str()),
                caps.get(2).map_or("", |m| m.as_str())
            )
        })
        .into_owned()
}

/// Replace the first `href` whose value is exactly `old`.
pub fn replace_href(tag: &str, old: &str, new: &str) -> String {
    let pattern = format!(r#"(?i)(href=["']){}(["'])"#, regex::escape(old));
    let Ok(re) = Regex::new(&pattern) else {
        return tag.to_string();
    };
    re.replacen(tag, 1, |caps: &Captures| format!("{}{new}{}", &caps[1], &caps[2]))
        .into_owned()
}

/// Replace the attribute value `old` with `new` wherever it appears
/// quoted in `tag`.
pub fn replace_attribute_value(tag: &str, old: &str, new: &str) -> String {
    tag.replace(&format!("\"{old}\""), &format!("\"{new}\""))
        .replace(&format!("'{old}'"), &format!("'{new}'"))
}

/// Escape a URL for an HTML attribute value.
pub fn escape_url(url: &str) -> String {
    url.replace('&', "&amp;")
        .replace('"', "%22")
        .replace('\'', "%27")
        .replace('<', "%3C")
        .replace('>', "%3E")
}

/// Undo attribute escaping of `&` so the URL can be parsed.
pub fn unescape_url(url: &str) -> String {
    url.replace("&#038;", "&").replace("&amp;", "&")
}
