//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.
//! Rounding is half away from zero (`f64::round`) throughout.

/// Round a scaled dimension to whole pixels, never below 1.
pub fn round_dimension(value: f64) -> u32 {
    (value.round() as u32).max(1)
}

/// Scale `(width, height)` to fit inside a bounding box, preserving aspect ratio.
///
/// Never upscales. A `None` bound leaves that axis unconstrained. When
/// rounding leaves the constrained axis one pixel short of its bound, it is
/// snapped to the bound.
///
/// # Arguments
/// * `current` - Source dimensions (width, height)
/// * `max_width` - Bounding width, if any
/// * `max_height` - Bounding height, if any
///
/// # Returns
/// * `(width, height)` - Fitted dimensions
///
/// # Examples
/// ```
/// # use tachyon_rewrite::geometry::constrain_dimensions;
/// // 1280x719 into a 300x300 box → 300x169
/// assert_eq!(constrain_dimensions((1280, 719), Some(300), Some(300)), (300, 169));
///
/// // Height-only bound
/// assert_eq!(constrain_dimensions((2560, 1440), None, Some(1000)), (1778, 1000));
///
/// // Never upscales
/// assert_eq!(constrain_dimensions((640, 480), Some(1024), Some(1024)), (640, 480));
/// ```
pub fn constrain_dimensions(
    current: (u32, u32),
    max_width: Option<u32>,
    max_height: Option<u32>,
) -> (u32, u32) {
    let (cur_w, cur_h) = current;
    if cur_w == 0 || cur_h == 0 {
        return current;
    }

    let mut ratio = 1.0_f64;
    let mut did_width = false;
    let mut did_height = false;

    if let Some(max_w) = max_width.filter(|&m| m > 0 && cur_w > m) {
        ratio = ratio.min(max_w as f64 / cur_w as f64);
        did_width = true;
    }
    if let Some(max_h) = max_height.filter(|&m| m > 0 && cur_h > m) {
        ratio = ratio.min(max_h as f64 / cur_h as f64);
        did_height = true;
    }

    let mut w = round_dimension(cur_w as f64 * ratio);
    let mut h = round_dimension(cur_h as f64 * ratio);

    // Snap a one-pixel rounding shortfall back onto the bound.
    if let Some(max_w) = max_width.filter(|_| did_width)
        && w + 1 == max_w
    {
        w = max_w;
    }
    if let Some(max_h) = max_height.filter(|_| did_height)
        && h + 1 == max_h
    {
        h = max_h;
    }
    (w, h)
}

/// Hard-crop target for a source image: the box clamped to the source.
///
/// Crops never upscale, so each axis is the smaller of box and source.
pub fn crop_dimensions(current: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    (target.0.min(current.0), target.1.min(current.1))
}

/// Height for `width` at the aspect ratio of `(src_w, src_h)`.
pub fn proportional_height(source: (u32, u32), width: u32) -> u32 {
    let (src_w, src_h) = source;
    if src_w == 0 {
        return src_h;
    }
    round_dimension(width as f64 * src_h as f64 / src_w as f64)
}

/// Whether `(w, h)` is strictly smaller than `natural` on at least one axis.
pub fn is_smaller(dims: (u32, u32), natural: (u32, u32)) -> bool {
    dims.0 < natural.0 || dims.1 < natural.1
}
