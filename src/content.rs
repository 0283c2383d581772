//! In-content image rewriting.
//!
//! Each `<img>` found in the HTML goes through the same steps:
//!
//! 1. **Skip**: a host hook vetoes the image. Left as is.
//! 2. **Not eligible**: the URL is not an upload the CDN serves. Left as
//!    is, except that a link around a legacy-proxy image is still pointed
//!    at the CDN.
//! 3. **Eligible**: identify the attachment, name the size, resolve the
//!    geometry, build the CDN URL and splice the edited tag back.
//!
//! Edits are spliced at the byte range of each match, never by searching
//! the content for the URL, so a second copy of the same URL elsewhere in
//! the post is not touched by accident.

use crate::attachment::Attachment;
use crate::classify::is_legacy_proxy;
use crate::downsize::size_dimensions;
use crate::engine::Engine;
use crate::geometry::{self, Signals, TransformArgs};
use crate::hooks::{ImageContext, SizeHint};
use crate::html::{self, ImageOccurrence};
use crate::naming;
use crate::sizes::{FULL, RegisteredSize};
use tracing::{debug, trace};

/// Outcome for one occurrence.
#[derive(Debug, PartialEq, Eq)]
enum ImageState {
    Skip,
    NotEligible,
    /// Legacy-proxy image whose link still moved to the CDN.
    LinkOnly(String),
    Rewritten(String),
}

pub(crate) fn rewrite_content(engine: &Engine, content: &str) -> String {
    let occurrences = html::extract_images(content);
    if occurrences.is_empty() {
        return content.to_string();
    }

    let ids = html::attachment_ids(&occurrences);
    if ids.len() > 1 {
        engine.attachments().prime(&ids);
    }

    let mut out = String::with_capacity(content.len() + occurrences.len() * 64);
    let mut last = 0;
    let mut rewritten = 0;
    for occurrence in &occurrences {
        out.push_str(&content[last..occurrence.range.start]);
        match rewrite_image(engine, occurrence) {
            ImageState::Rewritten(tag) | ImageState::LinkOnly(tag) => {
                rewritten += 1;
                out.push_str(&tag);
            }
            ImageState::Skip | ImageState::NotEligible => out.push_str(&occurrence.full_match),
        }
        last = occurrence.range.end;
    }
    out.push_str(&content[last..]);

    debug!(images = occurrences.len(), rewritten, "rewrote content");
    out
}

fn rewrite_image(engine: &Engine, occurrence: &ImageOccurrence) -> ImageState {
    let tag = &occurrence.full_match;
    let img_tag = &occurrence.img_tag;

    // Lazy loaders keep the real image in data-lazy-*, src is a placeholder.
    let (src_orig, placeholder) = match html::lazy_src(img_tag) {
        Some(lazy) => (lazy, Some(occurrence.img_url.as_str())),
        None => (occurrence.img_url.as_str(), None),
    };
    let src = html::unescape_url(src_orig);

    if engine.hooks().skips_image(&src, tag) {
        trace!(src = %src, "image skipped by hook");
        return ImageState::Skip;
    }
    if !engine.is_eligible(&src) {
        return legacy_link(engine, occurrence, &src);
    }

    let attachment = html::attachment_id(img_tag)
        .filter(|&id| is_local(engine, &src, id))
        .and_then(|id| engine.attachments().attachment(id));

    let mut signals = Signals {
        width: html::width_attribute(img_tag),
        height: html::height_attribute(img_tag),
        filename: naming::parse_dimensions(&src),
        natural: attachment.as_ref().and_then(Attachment::natural),
        content_width: engine.config().content_width,
        size: None,
    };
    let (width, height) = signals.explicit_dimensions();
    signals.size = resolve_size(&SizeLookup {
        engine,
        tag: img_tag,
        src: &src,
        attachment: attachment.as_ref(),
        width,
        height,
    });
    let geometry = geometry::resolve(&signals);

    let canonical = canonical_url(engine, &src, attachment.as_ref());

    let size_hint = match signals
        .size
        .or_else(|| engine.catalog().find_by_dimensions(geometry.width, geometry.height))
    {
        Some(size) => SizeHint::Named(&size.name),
        None => SizeHint::Dimensions {
            width: geometry.width,
            height: geometry.height,
        },
    };
    let args = engine.hooks().image_args(
        geometry.to_args(),
        &ImageContext {
            tag: img_tag,
            src: &canonical,
            src_orig,
            size: size_hint,
            attachment_id: attachment.as_ref().map(|a| a.id),
            transform: geometry.transform,
        },
    );

    let cdn_url = engine.urls().build(&canonical, &args);
    if cdn_url == src {
        return ImageState::NotEligible;
    }

    let mut new_tag = tag.clone();
    if let Some(link) = &occurrence.link_url {
        new_tag = rewrite_link(engine, &new_tag, link);
    }
    new_tag = html::replace_attribute_value(&new_tag, src_orig, &html::escape_url(&cdn_url));

    if let Some(placeholder) = placeholder {
        let placeholder_src = html::unescape_url(placeholder);
        if engine.is_eligible(&placeholder_src) {
            let placeholder_cdn = engine.urls().build(&placeholder_src, &TransformArgs::new());
            new_tag = html::replace_attribute_value(
                &new_tag,
                placeholder,
                &html::escape_url(&placeholder_cdn),
            );
        }
    }

    if engine.config().remove_size_attributes {
        new_tag = html::strip_size_attributes(&new_tag);
    }
    ImageState::Rewritten(html::mark_for_recalc(&new_tag))
}

/// Point a link to an uploaded file at the CDN, without transform arguments.
fn rewrite_link(engine: &Engine, tag: &str, link: &str) -> String {
    let link_src = html::unescape_url(link);
    if !engine.is_eligible(&link_src) {
        return tag.to_string();
    }
    let link_cdn = engine.urls().build(&link_src, &TransformArgs::new());
    html::replace_href(tag, link, &html::escape_url(&link_cdn))
}

fn legacy_link(engine: &Engine, occurrence: &ImageOccurrence, src: &str) -> ImageState {
    match &occurrence.link_url {
        Some(link) if is_legacy_proxy(src) => {
            let tag = rewrite_link(engine, &occurrence.full_match, link);
            if tag == occurrence.full_match {
                ImageState::NotEligible
            } else {
                ImageState::LinkOnly(tag)
            }
        }
        _ => ImageState::NotEligible,
    }
}

fn is_local(engine: &Engine, src: &str, attachment_id: u64) -> bool {
    engine
        .hooks()
        .image_is_local(src, attachment_id)
        .unwrap_or_else(|| src.starts_with(engine.upload_base_url()))
}

/// The full-size source the CDN should work from.
fn canonical_url(engine: &Engine, src: &str, attachment: Option<&Attachment>) -> String {
    if let Some(attachment) = attachment {
        let url = attachment.url(engine.upload_base_url());
        if engine.is_eligible(&url) {
            return url;
        }
    }
    if naming::is_edited_crop(src) {
        src.to_string()
    } else {
        naming::strip_dimension_suffix(src)
    }
}

// =============================================================================
// Size naming
// =============================================================================

/// What the size strategies can look at.
struct SizeLookup<'a> {
    engine: &'a Engine,
    tag: &'a str,
    src: &'a str,
    attachment: Option<&'a Attachment>,
    width: Option<u32>,
    height: Option<u32>,
}

type SizeStrategy = for<'a> fn(&SizeLookup<'a>) -> Option<&'a RegisteredSize>;

/// Tried in order; the first confident answer wins.
const SIZE_STRATEGIES: &[SizeStrategy] = &[
    size_from_class,
    size_from_variant_file,
    size_from_dimensions,
    full_when_unsized,
];

fn resolve_size<'a>(lookup: &SizeLookup<'a>) -> Option<&'a RegisteredSize> {
    SIZE_STRATEGIES.iter().find_map(|strategy| strategy(lookup))
}

/// `size-<name>` class token naming a registered size.
fn size_from_class<'a>(lookup: &SizeLookup<'a>) -> Option<&'a RegisteredSize> {
    let name = html::size_class(lookup.tag)?;
    lookup.engine.catalog().get(name)
}

/// Attachment variant whose file is the image's file.
fn size_from_variant_file<'a>(lookup: &SizeLookup<'a>) -> Option<&'a RegisteredSize> {
    let name = lookup
        .attachment?
        .size_for_file(naming::basename(lookup.src))?;
    lookup.engine.catalog().get(name)
}

/// Registered size that renders the attachment at exactly the tag's box.
fn size_from_dimensions<'a>(lookup: &SizeLookup<'a>) -> Option<&'a RegisteredSize> {
    let attachment = lookup.attachment?;
    let wanted = (lookup.width?, lookup.height?);
    let content_width = lookup.engine.config().content_width;
    lookup
        .engine
        .catalog()
        .sizes()
        .iter()
        .find(|size| size_dimensions(attachment, size, content_width) == wanted)
}

/// A known attachment with no dimensions anywhere is the original.
fn full_when_unsized<'a>(lookup: &SizeLookup<'a>) -> Option<&'a RegisteredSize> {
    if lookup.attachment.is_some() && lookup.width.is_none() && lookup.height.is_none() {
        lookup.engine.catalog().get(FULL)
    } else {
        None
    }
}
