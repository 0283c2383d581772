//! Fixture loading shared by the integration tests.
#![allow(dead_code)]

use regex::Regex;
use std::path::PathBuf;
use tachyon_rewrite::Engine;
use tachyon_rewrite::attachment::AttachmentIndex;
use tachyon_rewrite::config;

pub const UPLOAD_BASE: &str = "http://example.org/wp-content/uploads";

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
}

/// Engine over `fixtures/tachyon.toml` and `fixtures/attachments.json`.
pub fn engine() -> Engine {
    let host = config::load_config(&fixture("tachyon.toml")).unwrap();
    let attachments = AttachmentIndex::load(&fixture("attachments.json")).unwrap();
    Engine::new(host).with_attachments(attachments)
}

pub fn upload(path: &str) -> String {
    format!("{UPLOAD_BASE}/{path}")
}

fn attribute(html: &str, name: &str) -> String {
    let re = Regex::new(&format!(r#"\s{name}=["']([^"']*)["']"#)).unwrap();
    re.captures(html)
        .map(|c| c[1].replace("&amp;", "&"))
        .unwrap_or_else(|| panic!("no {name} attribute in: {html}"))
}

pub fn src_of(html: &str) -> String {
    attribute(html, "src")
}

pub fn href_of(html: &str) -> String {
    attribute(html, "href")
}
