//! Registered size catalog.
//!
//! The host pre-defines named size templates (`thumbnail`, `medium`, ...)
//! which are the vocabulary of everything else: a `size-medium` class token,
//! a `large` retrieval request, a variant recorded in attachment metadata.
//!
//! The catalog always carries the built-in names, with `thumb` and
//! `thumbnail` as aliases of the same entry and `full` standing for the
//! untouched original, followed by any custom sizes from the host config.
//! A custom entry with a built-in name replaces the built-in.
//!
//! ## Memoization
//!
//! The merged list is computed on first use and kept. Registering a new
//! size afterwards does **not** change lookups until [`SizeCatalog::reset`]
//! is called; this is how a host that switches configuration mid-process
//! (a test harness, a multi-tenant worker) decides when the switch applies.

use crate::config::{CustomSize, HostConfig, SizesConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Name of the entry standing for the unmodified original.
pub const FULL: &str = "full";

/// Vertical crop anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vertical {
    Top,
    Center,
    Bottom,
}

/// Horizontal crop anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Horizontal {
    Left,
    Center,
    Right,
}

/// How a registered size treats the image when its box doesn't match the
/// image's aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawCrop", into = "RawCrop")]
pub enum CropSpec {
    /// Scale uniformly to fit inside the box.
    #[default]
    Fit,
    /// Hard crop to the exact box, centered.
    Center,
    /// Hard crop to the exact box, anchored to the given edges.
    Anchored {
        vertical: Vertical,
        horizontal: Horizontal,
    },
}

impl CropSpec {
    pub fn is_crop(self) -> bool {
        !matches!(self, CropSpec::Fit)
    }

    /// CDN gravity for an anchored crop: `north`, `southwest`, ...
    ///
    /// `None` for fit, centered crops, and a `center`/`center` anchor pair
    /// (the CDN's default already).
    pub fn gravity(self) -> Option<String> {
        let CropSpec::Anchored {
            vertical,
            horizontal,
        } = self
        else {
            return None;
        };
        let v = match vertical {
            Vertical::Top => "north",
            Vertical::Center => "",
            Vertical::Bottom => "south",
        };
        let h = match horizontal {
            Horizontal::Left => "west",
            Horizontal::Center => "",
            Horizontal::Right => "east",
        };
        let gravity = format!("{v}{h}");
        (!gravity.is_empty()).then_some(gravity)
    }
}

/// Config representation of [`CropSpec`]: `crop = true` or
/// `crop = ["top", "left"]` (tokens in either order).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawCrop {
    Flag(bool),
    Anchors(Vec<String>),
}

impl TryFrom<RawCrop> for CropSpec {
    type Error = String;

    fn try_from(raw: RawCrop) -> Result<Self, Self::Error> {
        match raw {
            RawCrop::Flag(false) => Ok(CropSpec::Fit),
            RawCrop::Flag(true) => Ok(CropSpec::Center),
            RawCrop::Anchors(tokens) => parse_anchors(&tokens),
        }
    }
}

impl From<CropSpec> for RawCrop {
    fn from(spec: CropSpec) -> Self {
        match spec {
            CropSpec::Fit => RawCrop::Flag(false),
            CropSpec::Center => RawCrop::Flag(true),
            CropSpec::Anchored {
                vertical,
                horizontal,
            } => {
                let v = match vertical {
                    Vertical::Top => "top",
                    Vertical::Center => "center",
                    Vertical::Bottom => "bottom",
                };
                let h = match horizontal {
                    Horizontal::Left => "left",
                    Horizontal::Center => "center",
                    Horizontal::Right => "right",
                };
                RawCrop::Anchors(vec![v.to_string(), h.to_string()])
            }
        }
    }
}

fn parse_anchors(tokens: &[String]) -> Result<CropSpec, String> {
    let [a, b] = tokens else {
        return Err(format!(
            "crop anchors need exactly two tokens, got {}",
            tokens.len()
        ));
    };

    let mut vertical = None;
    let mut horizontal = None;
    let mut centers = 0;
    for token in [a, b] {
        match token.to_ascii_lowercase().as_str() {
            "top" if vertical.is_none() => vertical = Some(Vertical::Top),
            "bottom" if vertical.is_none() => vertical = Some(Vertical::Bottom),
            "left" if horizontal.is_none() => horizontal = Some(Horizontal::Left),
            "right" if horizontal.is_none() => horizontal = Some(Horizontal::Right),
            "center" => centers += 1,
            other => return Err(format!("invalid crop anchor pair: {a:?}, {b:?} ({other:?})")),
        }
    }
    // "center" fills whichever axis the other token left open.
    for _ in 0..centers {
        if vertical.is_none() {
            vertical = Some(Vertical::Center);
        } else {
            horizontal = Some(Horizontal::Center);
        }
    }

    match (vertical, horizontal) {
        (Some(vertical), Some(horizontal)) => Ok(CropSpec::Anchored {
            vertical,
            horizontal,
        }),
        _ => Err(format!("invalid crop anchor pair: {a:?}, {b:?}")),
    }
}

/// One named size template. `None` on an axis means unconstrained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredSize {
    pub name: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub crop: CropSpec,
}

impl RegisteredSize {
    pub fn new(name: &str, width: u32, height: u32, crop: CropSpec) -> Self {
        Self {
            name: name.to_string(),
            width: axis(width),
            height: axis(height),
            crop,
        }
    }

    pub fn is_full(&self) -> bool {
        self.name == FULL
    }
}

impl fmt::Display for RegisteredSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = |v: Option<u32>| v.map_or_else(|| "*".to_string(), |v| v.to_string());
        write!(f, "{} {}x{}", self.name, side(self.width), side(self.height))?;
        match self.crop {
            CropSpec::Fit => Ok(()),
            CropSpec::Center => write!(f, " crop"),
            spec => write!(f, " crop {}", spec.gravity().unwrap_or_default()),
        }
    }
}

fn axis(value: u32) -> Option<u32> {
    (value > 0).then_some(value)
}

/// Memoized view over the host's size configuration.
#[derive(Debug)]
pub struct SizeCatalog {
    builtin: SizesConfig,
    custom: Vec<(String, CustomSize)>,
    memo: OnceLock<Vec<RegisteredSize>>,
}

impl SizeCatalog {
    pub fn new(builtin: SizesConfig, custom: Vec<(String, CustomSize)>) -> Self {
        Self {
            builtin,
            custom,
            memo: OnceLock::new(),
        }
    }

    pub fn from_config(config: &HostConfig) -> Self {
        let custom = config
            .custom_sizes
            .iter()
            .map(|(name, size)| (name.clone(), size.clone()))
            .collect();
        Self::new(config.sizes.clone(), custom)
    }

    /// All registered sizes, in lookup order.
    pub fn sizes(&self) -> &[RegisteredSize] {
        self.memo.get_or_init(|| build_catalog(&self.builtin, &self.custom))
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredSize> {
        self.sizes().iter().find(|s| s.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Register (or replace) a custom size in the host configuration.
    ///
    /// Takes effect on the next lookup after [`reset`](Self::reset).
    pub fn register(&mut self, name: &str, size: CustomSize) {
        match self.custom.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = size,
            None => self.custom.push((name.to_string(), size)),
        }
    }

    /// Replace the built-in size settings. Takes effect after [`reset`](Self::reset).
    pub fn set_builtin(&mut self, builtin: SizesConfig) {
        self.builtin = builtin;
    }

    /// Drop the memoized list so the next lookup recomputes it.
    pub fn reset(&mut self) {
        self.memo.take();
    }

    /// Sizes whose registered box matches the given dimensions.
    ///
    /// Tries entries matching every known axis first, then entries matching
    /// any one of them. Used to name a size for images without attachment
    /// metadata.
    pub fn find_by_dimensions(&self, width: Option<u32>, height: Option<u32>) -> Option<&RegisteredSize> {
        if width.is_none() && height.is_none() {
            return None;
        }
        let matches_w = |s: &RegisteredSize| width.is_some() && s.width == width;
        let matches_h = |s: &RegisteredSize| height.is_some() && s.height == height;

        self.sizes()
            .iter()
            .find(|s| {
                (width.is_none() || matches_w(s)) && (height.is_none() || matches_h(s))
            })
            .or_else(|| self.sizes().iter().find(|s| matches_w(s) || matches_h(s)))
    }
}

fn build_catalog(builtin: &SizesConfig, custom: &[(String, CustomSize)]) -> Vec<RegisteredSize> {
    let thumb_crop = if builtin.thumbnail.crop {
        CropSpec::Center
    } else {
        CropSpec::Fit
    };
    let thumb = |name: &str| {
        RegisteredSize::new(
            name,
            builtin.thumbnail.width,
            builtin.thumbnail.height,
            thumb_crop,
        )
    };

    let mut sizes = vec![
        thumb("thumb"),
        RegisteredSize::new("medium", builtin.medium.width, builtin.medium.height, CropSpec::Fit),
        RegisteredSize::new(
            "medium_large",
            builtin.medium_large.width,
            builtin.medium_large.height,
            CropSpec::Fit,
        ),
        RegisteredSize::new("large", builtin.large.width, builtin.large.height, CropSpec::Fit),
        RegisteredSize::new(FULL, 0, 0, CropSpec::Fit),
        thumb("thumbnail"),
    ];

    for (name, size) in custom {
        let entry = RegisteredSize::new(name, size.width, size.height, size.crop);
        match sizes.iter_mut().find(|s| &s.name == name) {
            Some(existing) => *existing = entry,
            None => sizes.push(entry),
        }
    }
    sizes
}
