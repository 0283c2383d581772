//! Host extension points.
//!
//! Each hook is optional and takes and returns plain values. Install them
//! with the `on_*` builder methods:
//!
//! ```
//! use tachyon_rewrite::hooks::Hooks;
//!
//! let hooks = Hooks::new()
//!     .on_skip_image(|src, _tag| src.contains("/private/"))
//!     .on_image_args(|mut args, _ctx| {
//!         args.set("quality", "80");
//!         args
//!     });
//! assert!(hooks.skips_image("http://x/private/a.jpg", "<img>"));
//! ```
//!
//! URL-level hooks (skip, origin rewrite, final URL) belong to the URL
//! builder; see [`crate::cdn::UrlHooks`].

use crate::attachment::Attachment;
use crate::downsize::SizeRequest;
use crate::geometry::{Transform, TransformArgs};
use crate::srcset::SrcsetCandidate;
use std::fmt;

/// How an in-content image was sized, as seen by [`Hooks::on_image_args`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeHint<'a> {
    /// Matched to a registered size.
    Named(&'a str),
    /// Unmatched; the resolved box.
    Dimensions {
        width: Option<u32>,
        height: Option<u32>,
    },
}

/// Context for the per-image argument hook.
#[derive(Debug, Clone, Copy)]
pub struct ImageContext<'a> {
    /// The matched `<img>` tag, before rewriting.
    pub tag: &'a str,
    /// Canonical URL the CDN URL is built from.
    pub src: &'a str,
    /// URL as it appeared in the tag.
    pub src_orig: &'a str,
    pub size: SizeHint<'a>,
    pub attachment_id: Option<u64>,
    pub transform: Transform,
}

/// Context for the per-candidate srcset hook.
#[derive(Debug, Clone, Copy)]
pub struct SrcsetContext<'a> {
    pub candidate: &'a SrcsetCandidate,
    /// The main `src` of the image the set belongs to.
    pub image_src: &'a str,
    pub attachment_id: Option<u64>,
}

/// Context for the size-retrieval hook.
#[derive(Debug, Clone, Copy)]
pub struct DownsizeContext<'a> {
    pub attachment: &'a Attachment,
    pub request: &'a SizeRequest,
}

type SkipImageFn = Box<dyn Fn(&str, &str) -> bool + Send + Sync>;
type IsLocalFn = Box<dyn Fn(&str, u64) -> bool + Send + Sync>;
type ImageArgsFn = Box<dyn Fn(TransformArgs, &ImageContext<'_>) -> TransformArgs + Send + Sync>;
type SrcsetArgsFn = Box<dyn Fn(TransformArgs, &SrcsetContext<'_>) -> TransformArgs + Send + Sync>;
type DownsizeArgsFn =
    Box<dyn Fn(TransformArgs, &DownsizeContext<'_>) -> TransformArgs + Send + Sync>;
type OverrideDownsizeFn = Box<dyn Fn(&Attachment, &SizeRequest) -> bool + Send + Sync>;

#[derive(Default)]
pub struct Hooks {
    skip_image: Option<SkipImageFn>,
    image_is_local: Option<IsLocalFn>,
    image_args: Option<ImageArgsFn>,
    srcset_args: Option<SrcsetArgsFn>,
    downsize_args: Option<DownsizeArgsFn>,
    override_downsize: Option<OverrideDownsizeFn>,
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("skip_image", &self.skip_image.is_some())
            .field("image_is_local", &self.image_is_local.is_some())
            .field("image_args", &self.image_args.is_some())
            .field("srcset_args", &self.srcset_args.is_some())
            .field("downsize_args", &self.downsize_args.is_some())
            .field("override_downsize", &self.override_downsize.is_some())
            .finish()
    }
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Veto rewriting an in-content image. Called with `(src, tag)`.
    pub fn on_skip_image<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &str) -> bool + Send + Sync + 'static,
    {
        self.skip_image = Some(Box::new(f));
        self
    }

    /// Decide whether an image with an attachment class belongs to this
    /// site. Called with `(src, attachment_id)`; replaces the upload-base
    /// prefix check.
    pub fn on_image_is_local<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, u64) -> bool + Send + Sync + 'static,
    {
        self.image_is_local = Some(Box::new(f));
        self
    }

    /// Adjust the arguments of an in-content image.
    pub fn on_image_args<F>(mut self, f: F) -> Self
    where
        F: Fn(TransformArgs, &ImageContext<'_>) -> TransformArgs + Send + Sync + 'static,
    {
        self.image_args = Some(Box::new(f));
        self
    }

    /// Adjust the arguments of one srcset candidate.
    pub fn on_srcset_args<F>(mut self, f: F) -> Self
    where
        F: Fn(TransformArgs, &SrcsetContext<'_>) -> TransformArgs + Send + Sync + 'static,
    {
        self.srcset_args = Some(Box::new(f));
        self
    }

    /// Adjust the arguments of a size retrieval.
    pub fn on_downsize_args<F>(mut self, f: F) -> Self
    where
        F: Fn(TransformArgs, &DownsizeContext<'_>) -> TransformArgs + Send + Sync + 'static,
    {
        self.downsize_args = Some(Box::new(f));
        self
    }

    /// Return `true` to leave a size retrieval to the host.
    pub fn on_override_downsize<F>(mut self, f: F) -> Self
    where
        F: Fn(&Attachment, &SizeRequest) -> bool + Send + Sync + 'static,
    {
        self.override_downsize = Some(Box::new(f));
        self
    }

    pub fn skips_image(&self, src: &str, tag: &str) -> bool {
        self.skip_image.as_ref().is_some_and(|f| f(src, tag))
    }

    /// `None` when no hook is installed.
    pub fn image_is_local(&self, src: &str, attachment_id: u64) -> Option<bool> {
        self.image_is_local.as_ref().map(|f| f(src, attachment_id))
    }

    pub fn image_args(&self, args: TransformArgs, ctx: &ImageContext<'_>) -> TransformArgs {
        match &self.image_args {
            Some(f) => f(args, ctx),
            None => args,
        }
    }

    pub fn srcset_args(&self, args: TransformArgs, ctx: &SrcsetContext<'_>) -> TransformArgs {
        match &self.srcset_args {
            Some(f) => f(args, ctx),
            None => args,
        }
    }

    pub fn downsize_args(&self, args: TransformArgs, ctx: &DownsizeContext<'_>) -> TransformArgs {
        match &self.downsize_args {
            Some(f) => f(args, ctx),
            None => args,
        }
    }

    pub fn overrides_downsize(&self, attachment: &Attachment, request: &SizeRequest) -> bool {
        self.override_downsize
            .as_ref()
            .is_some_and(|f| f(attachment, request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_passthrough() {
        let hooks = Hooks::new();
        assert!(!hooks.skips_image("a", "b"));
        assert_eq!(hooks.image_is_local("a", 1), None);

        let args: TransformArgs = [("w", "10")].into_iter().collect();
        let ctx = ImageContext {
            tag: "<img>",
            src: "a",
            src_orig: "a",
            size: SizeHint::Named("thumb"),
            attachment_id: None,
            transform: Transform::Resize,
        };
        assert_eq!(hooks.image_args(args.clone(), &ctx), args);
    }

    #[test]
    fn installed_hooks_are_called() {
        let hooks = Hooks::new()
            .on_skip_image(|src, _| src.ends_with(".gif"))
            .on_image_is_local(|_, id| id == 42)
            .on_image_args(|mut args, ctx| {
                if let SizeHint::Named(name) = ctx.size {
                    args.set("size", name);
                }
                args
            });

        assert!(hooks.skips_image("a.gif", "<img>"));
        assert_eq!(hooks.image_is_local("x", 42), Some(true));
        assert_eq!(hooks.image_is_local("x", 7), Some(false));

        let ctx = ImageContext {
            tag: "<img>",
            src: "a",
            src_orig: "a",
            size: SizeHint::Named("large"),
            attachment_id: Some(42),
            transform: Transform::Fit,
        };
        let args = hooks.image_args(TransformArgs::new(), &ctx);
        assert_eq!(args.get("size"), Some("large"));
    }

    #[test]
    fn debug_lists_installed_hooks() {
        let hooks = Hooks::new().on_override_downsize(|_, _| true);
        let debug = format!("{hooks:?}");
        assert!(debug.contains("override_downsize: true"));
        assert!(debug.contains("skip_image: false"));
    }
}
