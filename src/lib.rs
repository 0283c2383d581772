//! # Tachyon Rewrite
//!
//! Rewrites references to uploaded images so they are served, resized and
//! cropped by an on-the-fly image CDN instead of by pre-generated files.
//! Three entry points share one geometry engine:
//!
//! ```text
//! rewrite_content   post HTML     →  <img>/<a> pointed at the CDN
//! rewrite_srcset    srcset list   →  candidates pointed at the CDN
//! downsize          id + size     →  CDN URL + display dimensions
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | The [`Engine`](engine::Engine): owns config, catalog, classifier, URL builder, attachments, hooks |
//! | [`config`] | `tachyon.toml` loading, merging over stock defaults, validation |
//! | [`sizes`] | Registered size catalog (`thumb`, `medium`, ... and custom sizes), memoized until reset |
//! | [`naming`] | The `-WxH` filename convention: parse, strip, edited-crop detection |
//! | [`classify`] | Which URLs are uploads the CDN can serve |
//! | [`geometry`] | Signals → `resize`/`fit`/`w`/`h` arguments, plus the fit/crop arithmetic |
//! | [`html`] | `<img>` extraction and attribute helpers over raw HTML |
//! | [`srcset`] | `srcset` parsing, formatting and candidate rewriting |
//! | [`downsize`] | Size retrieval without HTML: by name or by `WxH` box |
//! | [`cdn`] | The URL builder boundary: `UrlBuilder` and the default base-swap builder |
//! | [`attachment`] | Attachment records and the store the engine reads them from |
//! | [`hooks`] | Host extension points: skip, locality, argument filters |
//! | [`batch`] | In-place rewriting of HTML files in a directory |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## One Geometry Path
//!
//! In-content images, srcset candidates and direct size lookups all reduce
//! to the same question: given what is known about an image, which box
//! should the CDN produce? [`geometry::resolve`] answers it once, in a fixed
//! order, and every caller feeds it [`geometry::Signals`]. Size retrieval
//! adds only the clamping and intermediate-size bookkeeping it needs on top.
//!
//! ## Splice, Don't Search
//!
//! Rewritten tags are spliced back at the byte range where they were found.
//! A second copy of the same URL elsewhere in the post (in a caption, in a
//! code sample) is never touched by accident, and running the rewrite
//! twice is a no-op: rewritten URLs point at the CDN and are no longer
//! eligible.
//!
//! ## Explicit Hooks, No Globals
//!
//! The host plugs in through closures on [`hooks::Hooks`],
//! [`cdn::UrlHooks`] and a URL veto on the engine. There is no global filter
//! registry and no singleton: the engine is a value, and the size catalog's
//! memo is reset through a method.

pub mod attachment;
pub mod batch;
pub mod cdn;
pub mod classify;
pub mod config;
mod content;
pub mod downsize;
pub mod engine;
pub mod geometry;
pub mod hooks;
pub mod html;
pub mod naming;
pub mod output;
pub mod sizes;
pub mod srcset;

pub use engine::Engine;

#[cfg(test)]
pub(crate) mod test_helpers;
