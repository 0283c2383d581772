//! Dimension resolution: partial signals in, one [`ResolvedGeometry`] out.
//!
//! Every rewrite path funnels through [`resolve`]. The decision sequence is
//! fixed and order matters:
//!
//! 1. Explicit attributes, with the filename suffix filling any missing
//!    axis. Percent values are unknown and dropped.
//! 2. A matched catalog entry fills in the box when nothing explicit was
//!    found, and picks `resize` or `fit` from its crop spec.
//! 3. A known natural size caps each axis (never upscale).
//! 4. Still nothing known: the natural size, as a `fit`.
//! 5. A content width caps the width, scaling a known height with it.
//! 6. Width still unknown: the content width becomes the width, as a `fit`
//!    when a height is known.
//! 7. Anchored crops on a `resize` get a gravity.

use super::calculations::proportional_height;
use super::params::{Dimension, ResolvedGeometry, Transform};
use crate::naming::FileDimensions;
use crate::sizes::RegisteredSize;

/// Everything known about one image before resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct Signals<'a> {
    /// `width=` attribute.
    pub width: Option<Dimension>,
    /// `height=` attribute.
    pub height: Option<Dimension>,
    /// Box parsed from the `-WxH` filename suffix.
    pub filename: Option<FileDimensions>,
    /// Catalog entry the image was matched to.
    pub size: Option<&'a RegisteredSize>,
    /// Natural size of the original, when the attachment is known.
    pub natural: Option<(u32, u32)>,
    /// Theme content width.
    pub content_width: Option<u32>,
}

impl Signals<'_> {
    /// Step 1: attribute values, each missing or zero axis filled from the
    /// filename. A percent axis is unknown and is not filled.
    pub fn explicit_dimensions(&self) -> (Option<u32>, Option<u32>) {
        let axis = |attr: Option<Dimension>, from_file: Option<u32>| match attr {
            Some(Dimension::Percent(_)) => None,
            Some(Dimension::Pixels(px)) if px > 0 => Some(px),
            _ => from_file,
        };
        (
            axis(self.width, self.filename.map(|f| f.width)),
            axis(self.height, self.filename.map(|f| f.height)),
        )
    }
}

pub fn resolve(signals: &Signals<'_>) -> ResolvedGeometry {
    let (mut width, mut height) = signals.explicit_dimensions();
    let mut transform = Transform::Resize;

    if let Some(size) = signals.size
        && width.is_none()
        && height.is_none()
    {
        width = size.width;
        height = size.height;
        transform = Transform::for_crop(size.crop.is_crop());
    }

    if let Some((nat_w, nat_h)) = signals.natural {
        width = width.map(|w| w.min(nat_w));
        height = height.map(|h| h.min(nat_h));
        if width.is_none() && height.is_none() {
            width = Some(nat_w);
            height = Some(nat_h);
            transform = Transform::Fit;
        }
    }

    if let (Some(max_w), Some(w)) = (signals.content_width, width)
        && w > max_w
    {
        height = height.map(|h| proportional_height((w, h), max_w));
        width = Some(max_w);
    }

    if width.is_none()
        && let Some(max_w) = signals.content_width
    {
        width = Some(max_w);
        if height.is_some() {
            transform = Transform::Fit;
        }
    }

    let gravity = match (transform, signals.size) {
        (Transform::Resize, Some(size)) if !size.is_full() => size.crop.gravity(),
        _ => None,
    };

    ResolvedGeometry {
        width,
        height,
        transform,
        gravity,
        full: signals.size.is_some_and(RegisteredSize::is_full),
    }
}
