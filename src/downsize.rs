//! Size retrieval without HTML.
//!
//! Answers "give me attachment N at size S" with a CDN URL and the
//! dimensions the result will display at. A request is either a registered
//! size name or an explicit `WxH` box:
//!
//! - **Named**: the registered box, clamped to the original. Crop sizes
//!   `resize` to the clamped box; fit sizes send the clamped box as a `fit`
//!   and report the aspect-preserving result. No argument is sent when the
//!   result would not be smaller than the original.
//! - **Box**: always a `fit`, reporting the aspect-preserving fit of the
//!   original within the box.

use crate::attachment::Attachment;
use crate::engine::Engine;
use crate::geometry::{
    ResolvedGeometry, Transform, TransformArgs, constrain_dimensions, crop_dimensions, is_smaller,
};
use crate::hooks::DownsizeContext;
use crate::sizes::RegisteredSize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Sizes whose reported dimensions respect the theme content width.
const CONTENT_WIDTH_SIZES: &[&str] = &["medium_large", "large"];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SizeRequestError {
    #[error("size request is empty")]
    Empty,
    #[error("invalid size box {0:?}: expected WIDTHxHEIGHT")]
    InvalidBox(String),
}

/// A requested size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SizeRequest {
    /// A registered size name.
    Named(String),
    /// An explicit box. Zero means the axis was not given.
    Box { width: u32, height: u32 },
}

impl FromStr for SizeRequest {
    type Err = SizeRequestError;

    /// `thumbnail`, `large`, ... or `WxH`. A box may leave one side empty
    /// (`300x`), which parses but never resolves.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SizeRequestError::Empty);
        }
        let Some((w, h)) = s.split_once('x') else {
            return Ok(SizeRequest::Named(s.to_string()));
        };
        let is_axis = |v: &str| v.chars().all(|c| c.is_ascii_digit());
        if !is_axis(w) || !is_axis(h) || (w.is_empty() && h.is_empty()) {
            // Names like `extra` contain an x too.
            if w.chars().any(|c| c.is_ascii_digit()) {
                return Err(SizeRequestError::InvalidBox(s.to_string()));
            }
            return Ok(SizeRequest::Named(s.to_string()));
        }
        let axis = |v: &str| -> Result<u32, SizeRequestError> {
            if v.is_empty() {
                return Ok(0);
            }
            v.parse()
                .map_err(|_| SizeRequestError::InvalidBox(s.to_string()))
        };
        Ok(SizeRequest::Box {
            width: axis(w)?,
            height: axis(h)?,
        })
    }
}

impl fmt::Display for SizeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeRequest::Named(name) => f.write_str(name),
            SizeRequest::Box { width, height } => write!(f, "{width}x{height}"),
        }
    }
}

/// A resolved size retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downsized {
    pub url: String,
    pub width: u32,
    pub height: u32,
    /// Smaller than the original.
    pub is_intermediate: bool,
}

/// Resolve `request` for attachment `id`.
///
/// `None` leaves the retrieval to the host: unknown attachment, ineligible
/// URL, unregistered size name, a box missing an axis, or an override hook.
pub(crate) fn downsize(engine: &Engine, id: u64, request: &SizeRequest) -> Option<Downsized> {
    let attachment = engine.attachments().attachment(id)?;
    if engine.hooks().overrides_downsize(&attachment, request) {
        debug!(id, %request, "downsize overridden by hook");
        return None;
    }
    let image_url = attachment.url(engine.upload_base_url());
    if !engine.is_eligible(&image_url) {
        return None;
    }

    let sized = match request {
        SizeRequest::Named(name) => {
            let size = engine.catalog().get(name)?;
            named_size(&attachment, size, engine.config().content_width)
        }
        SizeRequest::Box { width, height } => fitted_box(&attachment, *width, *height)?,
    };

    let args = engine.hooks().downsize_args(
        sized.args,
        &DownsizeContext {
            attachment: &attachment,
            request,
        },
    );
    Some(Downsized {
        url: engine.urls().build(&image_url, &args),
        width: sized.width,
        height: sized.height,
        is_intermediate: sized.is_intermediate,
    })
}

/// Display dimensions of `attachment` at a registered size.
pub(crate) fn size_dimensions(
    attachment: &Attachment,
    size: &RegisteredSize,
    content_width: Option<u32>,
) -> (u32, u32) {
    let sized = named_size(attachment, size, content_width);
    (sized.width, sized.height)
}

struct SizeChoice {
    args: TransformArgs,
    width: u32,
    height: u32,
    is_intermediate: bool,
}

fn named_size(attachment: &Attachment, size: &RegisteredSize, content_width: Option<u32>) -> SizeChoice {
    let crop = size.crop.is_crop();
    let variant = attachment
        .variant(&size.name)
        .map(|v| (v.width, v.height));

    let Some(natural) = attachment.natural() else {
        // Without an original size there is nothing to clamp against.
        let geometry = ResolvedGeometry {
            width: size.width,
            height: size.height,
            transform: Transform::for_crop(crop),
            gravity: size.crop.gravity().filter(|_| crop),
            full: size.is_full(),
        };
        let args = geometry.to_args();
        let (width, height) =
            variant.unwrap_or((size.width.unwrap_or(0), size.height.unwrap_or(0)));
        return SizeChoice {
            is_intermediate: !args.is_empty(),
            args,
            width,
            height,
        };
    };

    if size.is_full() {
        return SizeChoice {
            args: TransformArgs::new(),
            width: natural.0,
            height: natural.1,
            is_intermediate: false,
        };
    }

    let mut display = variant.unwrap_or_else(|| match (crop, size.width, size.height) {
        (true, Some(w), Some(h)) => crop_dimensions(natural, (w, h)),
        _ => constrain_dimensions(natural, size.width, size.height),
    });

    let (width, height) = if crop {
        (
            size.width.map(|w| w.min(natural.0)),
            size.height.map(|h| h.min(natural.1)),
        )
    } else {
        (
            Some(size.width.map_or(display.0, |w| w.min(natural.0))),
            Some(size.height.map_or(display.1, |h| h.min(natural.1))),
        )
    };
    let is_intermediate = match (width, height) {
        (Some(w), Some(h)) => is_smaller((w, h), natural),
        _ => is_smaller(display, natural),
    };

    let args = if is_intermediate {
        ResolvedGeometry {
            width,
            height,
            transform: Transform::for_crop(crop),
            gravity: size.crop.gravity(),
            full: false,
        }
        .to_args()
    } else {
        TransformArgs::new()
    };

    if let Some(max_w) = content_width
        && CONTENT_WIDTH_SIZES.contains(&size.name.as_str())
    {
        display = constrain_dimensions(display, Some(max_w), None);
    }

    SizeChoice {
        args,
        width: display.0,
        height: display.1,
        is_intermediate,
    }
}

fn fitted_box(attachment: &Attachment, width: u32, height: u32) -> Option<SizeChoice> {
    if width == 0 || height == 0 {
        debug!(width, height, "size box missing an axis");
        return None;
    }
    let (fit_w, fit_h, is_intermediate) = match attachment.natural() {
        Some(natural) => {
            let fitted = constrain_dimensions(natural, Some(width), Some(height));
            (fitted.0, fitted.1, is_smaller(fitted, natural))
        }
        None => (width, height, true),
    };
    let args = ResolvedGeometry {
        width: Some(fit_w),
        height: Some(fit_h),
        transform: Transform::Fit,
        gravity: None,
        full: false,
    }
    .to_args();
    Some(SizeChoice {
        args,
        width: fit_w,
        height: fit_h,
        is_intermediate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::SizeVariant;
    use crate::sizes::{CropSpec, Horizontal, Vertical};

    fn photo() -> Attachment {
        Attachment {
            id: 42,
            file: "tachyon.jpg".into(),
            width: 1280,
            height: 719,
            sizes: Default::default(),
        }
    }

    fn query(sized: &SizeChoice) -> String {
        sized.args.to_query()
    }

    // =========================================================================
    // SizeRequest parsing
    // =========================================================================

    #[test]
    fn parses_requests() {
        assert_eq!("large".parse::<SizeRequest>(), Ok(SizeRequest::Named("large".into())));
        assert_eq!("medium_large".parse::<SizeRequest>(), Ok(SizeRequest::Named("medium_large".into())));
        assert_eq!(
            "500x300".parse::<SizeRequest>(),
            Ok(SizeRequest::Box {
                width: 500,
                height: 300
            })
        );
        assert_eq!(
            "300x".parse::<SizeRequest>(),
            Ok(SizeRequest::Box {
                width: 300,
                height: 0
            })
        );
        assert_eq!("extra".parse::<SizeRequest>(), Ok(SizeRequest::Named("extra".into())));
        assert_eq!("".parse::<SizeRequest>(), Err(SizeRequestError::Empty));
        assert!(matches!(
            "300x2y".parse::<SizeRequest>(),
            Err(SizeRequestError::InvalidBox(_))
        ));
    }

    #[test]
    fn request_display() {
        let r: SizeRequest = "500x300".parse().unwrap();
        assert_eq!(r.to_string(), "500x300");
    }

    // =========================================================================
    // Named sizes
    // =========================================================================

    #[test]
    fn crop_size_resizes() {
        let thumb = RegisteredSize::new("thumb", 150, 150, CropSpec::Center);
        let s = named_size(&photo(), &thumb, None);
        assert_eq!(query(&s), "resize=150,150");
        assert_eq!((s.width, s.height), (150, 150));
        assert!(s.is_intermediate);
    }

    #[test]
    fn fit_size_sends_clamped_box() {
        let medium = RegisteredSize::new("medium", 300, 300, CropSpec::Fit);
        let s = named_size(&photo(), &medium, None);
        assert_eq!(query(&s), "fit=300,300");
        assert_eq!((s.width, s.height), (300, 169));
    }

    #[test]
    fn unbounded_axis_uses_fitted_value() {
        let ml = RegisteredSize::new("medium_large", 768, 0, CropSpec::Fit);
        let s = named_size(&photo(), &ml, None);
        assert_eq!(query(&s), "fit=768,431");
    }

    #[test]
    fn full_has_no_args() {
        let full = RegisteredSize::new("full", 0, 0, CropSpec::Fit);
        let s = named_size(&photo(), &full, None);
        assert!(s.args.is_empty());
        assert_eq!((s.width, s.height), (1280, 719));
        assert!(!s.is_intermediate);
    }

    #[test]
    fn oversize_is_not_intermediate() {
        let big = RegisteredSize::new("oversize2d-early", 2500, 1500, CropSpec::Fit);
        let s = named_size(&photo(), &big, None);
        assert!(s.args.is_empty());
        assert_eq!((s.width, s.height), (1280, 719));
    }

    #[test]
    fn crop_clamps_each_axis() {
        let wide = RegisteredSize::new("too-wide", 1500, 500, CropSpec::Center);
        let s = named_size(&photo(), &wide, None);
        assert_eq!(query(&s), "resize=1280,500");
        assert_eq!((s.width, s.height), (1280, 500));
    }

    #[test]
    fn crop_with_open_axis_is_single_axis() {
        let strip = RegisteredSize::new("strip", 600, 0, CropSpec::Center);
        let s = named_size(&photo(), &strip, None);
        assert_eq!(query(&s), "w=600");
        assert!(s.is_intermediate);
    }

    #[test]
    fn anchored_crop_adds_gravity() {
        let hero = RegisteredSize::new(
            "hero",
            800,
            300,
            CropSpec::Anchored {
                vertical: Vertical::Bottom,
                horizontal: Horizontal::Center,
            },
        );
        let s = named_size(&photo(), &hero, None);
        assert_eq!(query(&s), "resize=800,300&gravity=south");
    }

    #[test]
    fn metadata_dimensions_preferred() {
        let mut a = photo();
        a.sizes.insert(
            "medium".into(),
            SizeVariant {
                file: "tachyon-300x168.jpg".into(),
                width: 300,
                height: 168,
            },
        );
        let medium = RegisteredSize::new("medium", 300, 300, CropSpec::Fit);
        let s = named_size(&a, &medium, None);
        assert_eq!((s.width, s.height), (300, 168));
    }

    #[test]
    fn content_width_limits_large_display_only() {
        let large = RegisteredSize::new("large", 1024, 1024, CropSpec::Fit);
        let s = named_size(&photo(), &large, Some(640));
        assert_eq!(query(&s), "fit=1024,719");
        assert_eq!((s.width, s.height), (640, 359));

        let medium = RegisteredSize::new("medium", 300, 300, CropSpec::Fit);
        let s = named_size(&photo(), &medium, Some(200));
        assert_eq!((s.width, s.height), (300, 169));
    }

    #[test]
    fn no_natural_size_uses_registered_box() {
        let mut a = photo();
        a.width = 0;
        a.height = 0;
        let thumb = RegisteredSize::new("thumb", 150, 150, CropSpec::Center);
        let s = named_size(&a, &thumb, None);
        assert_eq!(query(&s), "resize=150,150");
        assert_eq!((s.width, s.height), (150, 150));
    }

    // =========================================================================
    // Boxes
    // =========================================================================

    #[test]
    fn box_fits_within() {
        let s = fitted_box(&photo(), 1024, 1024).unwrap();
        assert_eq!(query(&s), "fit=1024,575");
        assert!(s.is_intermediate);

        let s = fitted_box(&photo(), 500, 300).unwrap();
        assert_eq!((s.width, s.height), (500, 281));

        let s = fitted_box(&photo(), 500, 30).unwrap();
        assert_eq!((s.width, s.height), (53, 30));
    }

    #[test]
    fn box_never_upscales() {
        let s = fitted_box(&photo(), 5000, 3000).unwrap();
        assert_eq!(query(&s), "fit=1280,719");
        assert_eq!((s.width, s.height), (1280, 719));
        assert!(!s.is_intermediate);
    }

    #[test]
    fn box_missing_axis_is_rejected() {
        assert!(fitted_box(&photo(), 300, 0).is_none());
        assert!(fitted_box(&photo(), 0, 300).is_none());
    }
}
