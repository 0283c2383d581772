//! Responsive `srcset` candidates.
//!
//! Every candidate in a set is a variant of the same upload, so each one is
//! rewritten from the canonical original with arguments that reproduce the
//! variant's box. Candidates the CDN can't serve are kept as they are.

use crate::attachment::Attachment;
use crate::cdn::query_params;
use crate::engine::Engine;
use crate::geometry::{self, Dimension, Signals};
use crate::hooks::SrcsetContext;
use crate::naming;
use std::fmt;
use tracing::trace;

/// What a candidate's number measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descriptor {
    /// `300w`: intrinsic width in pixels.
    Width,
    /// `2x`: pixel density.
    Density,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SrcsetCandidate {
    pub url: String,
    pub descriptor: Descriptor,
    pub value: f64,
}

impl SrcsetCandidate {
    pub fn width(url: &str, value: u32) -> Self {
        Self {
            url: url.to_string(),
            descriptor: Descriptor::Width,
            value: value as f64,
        }
    }

    pub fn density(url: &str, value: f64) -> Self {
        Self {
            url: url.to_string(),
            descriptor: Descriptor::Density,
            value,
        }
    }

    /// Width descriptor as whole pixels.
    fn pixel_width(&self) -> Option<u32> {
        (self.descriptor == Descriptor::Width && self.value > 0.0 && self.value.fract() == 0.0)
            .then_some(self.value as u32)
    }
}

impl fmt::Display for SrcsetCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.descriptor {
            Descriptor::Width => 'w',
            Descriptor::Density => 'x',
        };
        write!(f, "{} {}{unit}", self.url, self.value)
    }
}

/// Parse a `srcset` attribute value.
///
/// A candidate without a descriptor is `1x`. Malformed descriptors drop
/// the candidate.
pub fn parse_srcset(srcset: &str) -> Vec<SrcsetCandidate> {
    let mut candidates = Vec::new();
    let mut rest = srcset;
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if rest.is_empty() {
            break;
        }
        let url_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let (url, after) = rest.split_at(url_end);

        // A URL ending in a comma has no descriptor.
        if let Some(url) = url.strip_suffix(',') {
            candidates.push(SrcsetCandidate::density(url.trim_end_matches(','), 1.0));
            rest = after;
            continue;
        }

        let desc_end = after.find(',').unwrap_or(after.len());
        let (descriptor, after) = after.split_at(desc_end);
        rest = after;

        if let Some(candidate) = parse_candidate(url, descriptor.trim()) {
            candidates.push(candidate);
        }
    }
    candidates
}

fn parse_candidate(url: &str, descriptor: &str) -> Option<SrcsetCandidate> {
    if descriptor.is_empty() {
        return Some(SrcsetCandidate::density(url, 1.0));
    }
    if let Some(w) = descriptor.strip_suffix('w') {
        return w.parse().ok().map(|w| SrcsetCandidate::width(url, w));
    }
    if let Some(x) = descriptor.strip_suffix('x') {
        return x.parse().ok().map(|x| SrcsetCandidate::density(url, x));
    }
    None
}

/// Join candidates into a `srcset` attribute value.
pub fn format_srcset(candidates: &[SrcsetCandidate]) -> String {
    candidates
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Rewrite each eligible candidate to a CDN URL.
///
/// `image_src` is the main `src` of the image the set belongs to; a
/// `gravity` it already carries on the CDN is shared with every candidate.
pub(crate) fn rewrite_srcset(
    engine: &Engine,
    sources: &[SrcsetCandidate],
    image_src: &str,
    attachment: Option<&Attachment>,
) -> Vec<SrcsetCandidate> {
    let gravity = image_src
        .starts_with(engine.urls().cdn_base())
        .then(|| query_params(image_src))
        .and_then(|params| params.into_iter().find(|(k, _)| k == "gravity"))
        .map(|(_, v)| v);

    sources
        .iter()
        .map(|candidate| {
            if !engine.is_eligible(&candidate.url) {
                trace!(url = %candidate.url, "srcset candidate not eligible");
                return candidate.clone();
            }

            let file = naming::parse_dimensions(&candidate.url);
            let canonical = match attachment {
                Some(a) => a.url(engine.upload_base_url()),
                None => naming::strip_dimension_suffix(&candidate.url),
            };

            let width = candidate.pixel_width();
            // A descriptor matching the file's own width keeps its height.
            let height = file
                .filter(|f| width == Some(f.width))
                .map(|f| f.height);
            let geometry = geometry::resolve(&Signals {
                width: width.map(Dimension::Pixels),
                height: height.map(Dimension::Pixels),
                ..Default::default()
            });

            let mut args = geometry.to_args();
            if let Some(gravity) = &gravity {
                args.set("gravity", gravity.clone());
            }
            let args = engine.hooks().srcset_args(
                args,
                &SrcsetContext {
                    candidate,
                    image_src,
                    attachment_id: attachment.map(|a| a.id),
                },
            );

            SrcsetCandidate {
                url: encode_query_commas(&engine.urls().build(&canonical, &args)),
                ..candidate.clone()
            }
        })
        .collect()
}

// Commas separate srcset candidates.
fn encode_query_commas(url: &str) -> String {
    match url.split_once('?') {
        Some((base, query)) => format!("{base}?{}", query.replace(',', "%2C")),
        None => url.to_string(),
    }
}
