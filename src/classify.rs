//! URL eligibility.
//!
//! An image URL is rewritten only when it points at a transformable file
//! under the host's upload base. Everything else (third-party images,
//! SVGs, URLs already on the CDN) passes through untouched.

use crate::naming;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use tracing::trace;
use url::Url;

/// Legacy image proxy hosts (`i0.wp.com` ... `i9.wp.com`).
static LEGACY_PROXY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^https?://i\d\.wp\.com").expect("LEGACY_PROXY is valid"));

static MULTISITE_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/sites/\d+").expect("MULTISITE_SEGMENT is valid"));

/// Host-supplied veto, called with the URL once the structural checks pass.
pub type UrlVeto = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// Whether `url` points at a legacy image proxy host.
pub fn is_legacy_proxy(url: &str) -> bool {
    LEGACY_PROXY.is_match(url.trim())
}

/// Strip the `/sites/<n>` segment a multisite install adds to upload URLs.
pub fn normalize_upload_base(base: &str, multisite: bool) -> String {
    let base = base.trim_end_matches('/');
    if multisite {
        MULTISITE_SEGMENT.replace(base, "").into_owned()
    } else {
        base.to_string()
    }
}

/// Decides whether an image URL may be rewritten.
pub struct UrlClassifier {
    upload_base: String,
    veto: Option<UrlVeto>,
}

impl fmt::Debug for UrlClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlClassifier")
            .field("upload_base", &self.upload_base)
            .field("veto", &self.veto.is_some())
            .finish()
    }
}

impl UrlClassifier {
    pub fn new(upload_base: &str, multisite: bool) -> Self {
        Self {
            upload_base: normalize_upload_base(upload_base, multisite),
            veto: None,
        }
    }

    /// Install a veto. Returning `false` from it makes a URL ineligible.
    pub fn set_veto(&mut self, veto: impl Fn(&str) -> bool + Send + Sync + 'static) {
        self.veto = Some(Box::new(veto));
    }

    pub fn upload_base(&self) -> &str {
        &self.upload_base
    }

    /// Whether `url` is an uploaded image the CDN can serve.
    ///
    /// Rejects URLs that don't parse, lack a host or a path, point at a
    /// legacy proxy, have an extension outside the transformable set, or
    /// live outside the upload base. The veto runs last.
    pub fn is_eligible(&self, url: &str) -> bool {
        let url = url.trim();
        let Ok(parsed) = Url::parse(url) else {
            trace!(url, "not an absolute URL");
            return false;
        };
        if parsed.host_str().is_none_or(str::is_empty) {
            return false;
        }
        let path = parsed.path();
        if path.is_empty() || path == "/" {
            return false;
        }
        if is_legacy_proxy(url) {
            trace!(url, "legacy proxy URL");
            return false;
        }
        if !naming::has_supported_extension(path) {
            trace!(url, "extension not transformable");
            return false;
        }
        if !self.is_under_upload_base(url) {
            trace!(url, "outside upload base");
            return false;
        }
        self.veto.as_ref().is_none_or(|veto| veto(url))
    }

    fn is_under_upload_base(&self, url: &str) -> bool {
        let Some(rest) = url.strip_prefix(self.upload_base.as_str()) else {
            return false;
        };
        // Guard against sibling prefixes such as `/uploads-old/`.
        rest.starts_with('/')
    }
}
