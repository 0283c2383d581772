//! CDN URL construction.
//!
//! [`UrlBuilder`] is the boundary between resolution and URL spelling: the
//! rewriter decides *what* transform an image needs, a builder decides how
//! that becomes a URL. [`CdnUrlBuilder`] is the stock implementation; it
//! swaps the upload base for the CDN base and appends the arguments as a
//! query string.
//!
//! ```text
//! http://example.org/wp-content/uploads/2020/01/photo.jpg  + resize=150,150
//!   → http://tachy.on/u/2020/01/photo.jpg?resize=150,150
//! ```

use crate::classify::normalize_upload_base;
use crate::geometry::{TransformArgs, encode_value};
use std::fmt;
use tracing::trace;

/// Turns an image URL plus transform arguments into a CDN URL.
pub trait UrlBuilder: Send + Sync {
    fn build(&self, image_url: &str, args: &TransformArgs) -> String;

    /// Base URL of the CDN, used to recognize already-rewritten URLs.
    fn cdn_base(&self) -> &str;
}

type SkipFn = Box<dyn Fn(&str, &TransformArgs) -> bool + Send + Sync>;
type MapUrlFn = Box<dyn Fn(String, &TransformArgs) -> String + Send + Sync>;
type MapArgsFn = Box<dyn Fn(TransformArgs, &str) -> TransformArgs + Send + Sync>;
type FinalUrlFn = Box<dyn Fn(String, &str, &TransformArgs) -> String + Send + Sync>;

/// Extension points of [`CdnUrlBuilder`], run in declaration order.
#[derive(Default)]
pub struct UrlHooks {
    /// Return `true` to leave the URL pointing at the origin.
    pub skip: Option<SkipFn>,
    /// Rewrite the origin URL before the base swap.
    pub image_url: Option<MapUrlFn>,
    /// Rewrite the arguments before they are appended.
    pub args: Option<MapArgsFn>,
    /// Rewrite the finished CDN URL. Receives the origin URL too.
    pub final_url: Option<FinalUrlFn>,
}

impl fmt::Debug for UrlHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlHooks")
            .field("skip", &self.skip.is_some())
            .field("image_url", &self.image_url.is_some())
            .field("args", &self.args.is_some())
            .field("final_url", &self.final_url.is_some())
            .finish()
    }
}

/// Upload-base → CDN-base URL builder.
#[derive(Debug)]
pub struct CdnUrlBuilder {
    upload_base: String,
    cdn_base: String,
    hooks: UrlHooks,
}

impl CdnUrlBuilder {
    pub fn new(upload_base: &str, cdn_base: &str, multisite: bool) -> Self {
        Self {
            upload_base: normalize_upload_base(upload_base, multisite),
            cdn_base: cdn_base.trim_end_matches('/').to_string(),
            hooks: UrlHooks::default(),
        }
    }

    pub fn with_hooks(mut self, hooks: UrlHooks) -> Self {
        self.hooks = hooks;
        self
    }
}

impl UrlBuilder for CdnUrlBuilder {
    fn build(&self, image_url: &str, args: &TransformArgs) -> String {
        let image_url = encode_basename(image_url.trim());

        // Only uploads can be served by the CDN.
        if !image_url.starts_with(&self.upload_base) {
            trace!(url = %image_url, "not under upload base");
            return image_url;
        }
        if self.hooks.skip.as_ref().is_some_and(|skip| skip(&image_url, args)) {
            trace!(url = %image_url, "skipped by hook");
            return image_url;
        }

        let origin = match &self.hooks.image_url {
            Some(map) => map(image_url, args),
            None => image_url,
        };
        let args = match &self.hooks.args {
            Some(map) => map(args.clone(), &origin),
            None => args.clone(),
        };

        let cdn_url = origin.replacen(&self.upload_base, &self.cdn_base, 1);
        let cdn_url = add_query_args(&cdn_url, &args);

        match &self.hooks.final_url {
            Some(map) => map(cdn_url, &origin, &args),
            None => cdn_url,
        }
    }

    fn cdn_base(&self) -> &str {
        &self.cdn_base
    }
}

/// Percent-encode the last path segment. Decodes first, so an already
/// encoded name is not encoded twice.
pub fn encode_basename(url: &str) -> String {
    let (path, tail) = split_path(url);
    let Some((dir, name)) = path.rsplit_once('/') else {
        return url.to_string();
    };
    let decoded = urlencoding::decode(name).map_or_else(|_| name.into(), |d| d);
    format!("{dir}/{}{tail}", urlencoding::encode(&decoded))
}

/// Merge `args` into the query string of `url`.
///
/// Existing parameters are kept in place; an argument whose key is already
/// present replaces that parameter's value. New keys are appended. A
/// fragment stays at the end.
pub fn add_query_args(url: &str, args: &TransformArgs) -> String {
    if args.is_empty() {
        return url.to_string();
    }
    let (url, fragment) = match url.split_once('#') {
        Some((u, f)) => (u, Some(f)),
        None => (url, None),
    };
    let (base, query) = match url.split_once('?') {
        Some((b, q)) => (b, q),
        None => (url, ""),
    };

    let mut pending: Vec<(&str, &str)> = args.iter().collect();
    let mut pairs: Vec<String> = Vec::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let key = pair.split_once('=').map_or(pair, |(k, _)| k);
        let decoded_key = urlencoding::decode(key).map_or_else(|_| key.into(), |k| k);
        match pending.iter().position(|(k, _)| *k == decoded_key) {
            Some(idx) => {
                let (k, v) = pending.remove(idx);
                pairs.push(format!("{}={}", urlencoding::encode(k), encode_value(v)));
            }
            None => pairs.push(pair.to_string()),
        }
    }
    pairs.extend(
        pending
            .into_iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), encode_value(v))),
    );

    let mut out = format!("{base}?{}", pairs.join("&"));
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    out
}

/// Query parameters of a URL, decoded.
pub fn query_params(url: &str) -> Vec<(String, String)> {
    let url = url.split('#').next().unwrap_or(url);
    let Some((_, query)) = url.split_once('?') else {
        return Vec::new();
    };
    query
        .split('&')
        .filter(|p| !p.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            let decode = |s: &str| {
                urlencoding::decode(s).map_or_else(|_| s.to_string(), |d| d.into_owned())
            };
            (decode(k), decode(v))
        })
        .collect()
}

fn split_path(url: &str) -> (&str, &str) {
    match url.find(['?', '#']) {
        Some(idx) => url.split_at(idx),
        None => (url, ""),
    }
}
