//! The rewriting engine: one value owning everything a rewrite pass reads.
//!
//! An [`Engine`] holds the host configuration, the size catalog, the URL
//! classifier, the CDN URL builder, the attachment store and the hooks.
//! Every entry point takes `&self`; the only mutation after construction is
//! the explicit catalog reset.
//!
//! ```rust
//! use tachyon_rewrite::config::HostConfig;
//! use tachyon_rewrite::engine::Engine;
//!
//! let config = HostConfig {
//!     upload_base_url: "http://example.org/wp-content/uploads".into(),
//!     cdn_url: "http://tachy.on/u".into(),
//!     ..HostConfig::default()
//! };
//! let engine = Engine::new(config);
//! let html = r#"<img src="http://example.org/wp-content/uploads/a-150x150.jpg">"#;
//! assert_eq!(
//!     engine.rewrite_content(html),
//!     r#"<img src="http://tachy.on/u/a.jpg?resize=150,150" data-recalc-dims="1">"#
//! );
//! ```

use crate::attachment::{AttachmentIndex, AttachmentStore};
use crate::cdn::{CdnUrlBuilder, UrlBuilder};
use crate::classify::UrlClassifier;
use crate::config::HostConfig;
use crate::content;
use crate::downsize::{self, Downsized, SizeRequest};
use crate::geometry::TransformArgs;
use crate::hooks::Hooks;
use crate::sizes::SizeCatalog;
use crate::srcset::{self, SrcsetCandidate};
use std::fmt;

pub struct Engine {
    config: HostConfig,
    catalog: SizeCatalog,
    classifier: UrlClassifier,
    urls: Box<dyn UrlBuilder>,
    attachments: Box<dyn AttachmentStore>,
    hooks: Hooks,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("catalog", &self.catalog)
            .field("classifier", &self.classifier)
            .field("cdn_base", &self.urls.cdn_base())
            .field("hooks", &self.hooks)
            .finish()
    }
}

impl Engine {
    /// Engine with the default CDN URL builder and no attachments.
    pub fn new(config: HostConfig) -> Self {
        let catalog = SizeCatalog::from_config(&config);
        let classifier = UrlClassifier::new(&config.upload_base_url, config.multisite);
        let urls = CdnUrlBuilder::new(&config.upload_base_url, &config.cdn_url, config.multisite);
        Self {
            config,
            catalog,
            classifier,
            urls: Box::new(urls),
            attachments: Box::new(AttachmentIndex::new()),
            hooks: Hooks::default(),
        }
    }

    pub fn with_attachments(mut self, store: impl AttachmentStore + 'static) -> Self {
        self.attachments = Box::new(store);
        self
    }

    pub fn with_url_builder(mut self, builder: impl UrlBuilder + 'static) -> Self {
        self.urls = Box::new(builder);
        self
    }

    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Install a URL veto: returning `false` keeps the URL on the origin.
    pub fn veto_url(mut self, veto: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.classifier.set_veto(veto);
        self
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn catalog(&self) -> &SizeCatalog {
        &self.catalog
    }

    /// Mutable catalog, for registering sizes at runtime.
    pub fn catalog_mut(&mut self) -> &mut SizeCatalog {
        &mut self.catalog
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    pub fn urls(&self) -> &dyn UrlBuilder {
        self.urls.as_ref()
    }

    pub fn attachments(&self) -> &dyn AttachmentStore {
        self.attachments.as_ref()
    }

    /// Upload base as configured, without a trailing slash.
    ///
    /// Unlike the classifier's base this keeps a multisite `/sites/<n>`
    /// segment, since attachment files are relative to it.
    pub fn upload_base_url(&self) -> &str {
        self.config.upload_base_url.trim_end_matches('/')
    }

    /// Whether `url` is an upload the CDN can serve.
    pub fn is_eligible(&self, url: &str) -> bool {
        self.classifier.is_eligible(url)
    }

    /// CDN URL for `url` with explicit arguments.
    pub fn cdn_url(&self, url: &str, args: &TransformArgs) -> String {
        self.urls.build(url, args)
    }

    /// Rewrite every eligible `<img>` (and its wrapping link) in `html`.
    pub fn rewrite_content(&self, html: &str) -> String {
        content::rewrite_content(self, html)
    }

    /// Rewrite each gallery fragment independently.
    pub fn rewrite_galleries(&self, galleries: &[String]) -> Vec<String> {
        galleries
            .iter()
            .map(|gallery| self.rewrite_content(gallery))
            .collect()
    }

    /// Rewrite the candidates of one image's `srcset`.
    ///
    /// `image_src` is the image's main `src`; `attachment_id`, when known,
    /// supplies the canonical original.
    pub fn rewrite_srcset(
        &self,
        sources: &[SrcsetCandidate],
        image_src: &str,
        attachment_id: Option<u64>,
    ) -> Vec<SrcsetCandidate> {
        let attachment = attachment_id.and_then(|id| self.attachments.attachment(id));
        srcset::rewrite_srcset(self, sources, image_src, attachment.as_ref())
    }

    /// CDN URL and display size of attachment `id` at `request`.
    pub fn downsize(&self, id: u64, request: &SizeRequest) -> Option<Downsized> {
        downsize::downsize(self, id, request)
    }

    /// Drop the memoized size catalog; the next lookup recomputes it.
    pub fn reset_sizes(&mut self) {
        self.catalog.reset();
    }
}
