//! Parameter types for CDN transforms.
//!
//! These describe *what* the CDN should do with an image, not how the URL
//! is spelled. [`ResolvedGeometry`] is the outcome of dimension resolution;
//! [`TransformArgs`] is the ordered query-argument map handed to the URL
//! builder.
//!
//! ## Types
//!
//! - [`Dimension`]: A tag attribute value: pixels or a percentage.
//! - [`Transform`]: `resize` (exact box, cropping) or `fit` (scale within).
//! - [`ResolvedGeometry`]: Final width/height/transform/gravity for one image.
//! - [`TransformArgs`]: Ordered key/value CDN arguments.

use std::fmt;

/// A width or height as written in markup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    Pixels(u32),
    Percent(f32),
}

impl Dimension {
    /// Parse an attribute value: `"150"` or `"50%"`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Some(pct) = raw.strip_suffix('%') {
            return pct.parse().ok().map(Dimension::Percent);
        }
        raw.parse().ok().map(Dimension::Pixels)
    }

    pub fn pixels(self) -> Option<u32> {
        match self {
            Dimension::Pixels(px) => Some(px),
            Dimension::Percent(_) => None,
        }
    }

    pub fn is_percent(self) -> bool {
        matches!(self, Dimension::Percent(_))
    }
}

/// CDN transform operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transform {
    /// Scale and crop to the exact box.
    #[default]
    Resize,
    /// Scale uniformly to fit within the box.
    Fit,
}

impl Transform {
    pub fn as_str(self) -> &'static str {
        match self {
            Transform::Resize => "resize",
            Transform::Fit => "fit",
        }
    }

    pub fn for_crop(crop: bool) -> Self {
        if crop { Transform::Resize } else { Transform::Fit }
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of dimension resolution for one image.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedGeometry {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub transform: Transform,
    pub gravity: Option<String>,
    /// The image resolves to the untouched original.
    pub full: bool,
}

impl ResolvedGeometry {
    /// CDN arguments for this geometry.
    ///
    /// Both axes known → `transform=W,H`. One axis → `w=` or `h=` alone.
    /// No axes, or the original size → no dimension argument.
    pub fn to_args(&self) -> TransformArgs {
        let mut args = TransformArgs::new();
        if !self.full {
            match (self.width, self.height) {
                (Some(w), Some(h)) => args.set(self.transform.as_str(), format!("{w},{h}")),
                (Some(w), None) => args.set("w", w.to_string()),
                (None, Some(h)) => args.set("h", h.to_string()),
                (None, None) => {}
            }
        }
        if let Some(gravity) = &self.gravity {
            args.set("gravity", gravity.clone());
        }
        args
    }
}

/// Ordered CDN query arguments. Setting an existing key replaces its value
/// in place.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransformArgs(Vec<(String, String)>);

impl TransformArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key.to_string(), value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let idx = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `key=value&...` with values percent-encoded. Commas inside a
    /// `W,H` pair stay literal.
    pub fn to_query(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), encode_value(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TransformArgs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut args = TransformArgs::new();
        for (k, v) in iter {
            let key: String = k.into();
            args.set(&key, v);
        }
        args
    }
}

pub(crate) fn encode_value(value: &str) -> String {
    urlencoding::encode(value).replace("%2C", ",")
}
