//! Size retrieval without HTML, by registered name and by box.

mod common;

use common::engine;
use tachyon_rewrite::downsize::{Downsized, SizeRequest};

fn downsize(id: u64, size: &str) -> Option<Downsized> {
    engine().downsize(id, &size.parse().unwrap())
}

fn expect(id: u64, size: &str, url: &str, dims: (u32, u32), intermediate: bool) {
    let d = downsize(id, size).unwrap_or_else(|| panic!("{size} declined for {id}"));
    assert_eq!(d.url, url, "url for {size}");
    assert_eq!((d.width, d.height), dims, "dimensions for {size}");
    assert_eq!(d.is_intermediate, intermediate, "intermediate flag for {size}");
}

// =========================================================================
// Named sizes: 1280×719 original
// =========================================================================

#[test]
fn thumbnail_crops() {
    expect(
        42,
        "thumbnail",
        "http://tachy.on/u/tachyon.jpg?resize=150,150",
        (150, 150),
        true,
    );
}

#[test]
fn medium_fits() {
    expect(
        42,
        "medium",
        "http://tachy.on/u/tachyon.jpg?fit=300,300",
        (300, 169),
        true,
    );
}

#[test]
fn medium_large_fits() {
    expect(
        42,
        "medium_large",
        "http://tachy.on/u/tachyon.jpg?fit=768,431",
        (768, 431),
        true,
    );
}

#[test]
fn large_clamped_to_original_height() {
    expect(
        42,
        "large",
        "http://tachy.on/u/tachyon.jpg?fit=1024,719",
        (1024, 575),
        true,
    );
}

#[test]
fn full_has_no_arguments() {
    expect(42, "full", "http://tachy.on/u/tachyon.jpg", (1280, 719), false);
}

#[test]
fn oversize_is_not_intermediate() {
    expect(
        42,
        "oversize2d-early",
        "http://tachy.on/u/tachyon.jpg",
        (1280, 719),
        false,
    );
}

#[test]
fn crops_clamp_each_axis() {
    expect(
        42,
        "too-wide-shorter-crop",
        "http://tachy.on/u/tachyon.jpg?resize=1280,500",
        (1280, 500),
        true,
    );
    expect(
        42,
        "too-tall-narrower-crop",
        "http://tachy.on/u/tachyon.jpg?resize=1000,719",
        (1000, 719),
        true,
    );
}

// =========================================================================
// Named sizes: 2560×1440 original
// =========================================================================

#[test]
fn large_original_sizes() {
    let base = "http://tachy.on/u/tachyon-large-scaled.jpg";
    expect(43, "large", &format!("{base}?fit=1024,1024"), (1024, 576), true);
    expect(
        43,
        "oversize2d-early",
        &format!("{base}?fit=2500,1440"),
        (2500, 1406),
        true,
    );
    expect(
        43,
        "oversize2d-late",
        &format!("{base}?fit=2000,1000"),
        (1778, 1000),
        true,
    );
}

// =========================================================================
// Boxes
// =========================================================================

#[test]
fn boxes_always_fit() {
    let base = "http://tachy.on/u/tachyon.jpg";
    expect(42, "1024x1024", &format!("{base}?fit=1024,575"), (1024, 575), true);
    expect(42, "500x300", &format!("{base}?fit=500,281"), (500, 281), true);
    expect(42, "500x30", &format!("{base}?fit=53,30"), (53, 30), true);
}

#[test]
fn oversized_box_never_upscales() {
    expect(
        42,
        "5000x3000",
        "http://tachy.on/u/tachyon.jpg?fit=1280,719",
        (1280, 719),
        false,
    );
}

// =========================================================================
// Declined requests
// =========================================================================

#[test]
fn box_missing_axis_declined() {
    assert!(downsize(42, "300x").is_none());
    assert!(downsize(42, "x300").is_none());
}

#[test]
fn unknown_size_or_attachment_declined() {
    assert!(downsize(42, "poster").is_none());
    assert!(downsize(99, "thumbnail").is_none());
}

#[test]
fn override_hook_declines() {
    use tachyon_rewrite::hooks::Hooks;
    let e = engine().with_hooks(
        Hooks::new().on_override_downsize(|_, request| *request == SizeRequest::Named("large".into())),
    );
    assert!(e.downsize(42, &SizeRequest::Named("large".into())).is_none());
    assert!(e.downsize(42, &SizeRequest::Named("medium".into())).is_some());
}

#[test]
fn malformed_box_rejected_at_parse() {
    assert!("12x3y".parse::<SizeRequest>().is_err());
    assert!("".parse::<SizeRequest>().is_err());
}
