//! Rewriting HTML files on disk.
//!
//! A directory is walked for `.html`/`.htm` files, which are rewritten in
//! place in parallel with [rayon](https://docs.rs/rayon). A file that
//! can't be read or written is reported and skipped; the rest of the batch
//! carries on.

use crate::engine::Engine;
use crate::html;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Outcome of rewriting one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    /// `<img>` tags found.
    pub images: usize,
    /// Whether the file was rewritten.
    pub changed: bool,
}

/// Result of a directory batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchReport {
    pub fn changed(&self) -> usize {
        self.files.iter().filter(|f| f.changed).count()
    }
}

/// HTML files under `root`, sorted by path.
pub fn html_files(root: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry?;
        if entry.file_type().is_file() && is_html(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"))
}

/// Rewrite one file in place. Unchanged files are not written.
pub fn rewrite_file(engine: &Engine, path: &Path) -> Result<FileReport, BatchError> {
    let io_err = |source| BatchError::Io {
        path: path.to_path_buf(),
        source,
    };
    let original = std::fs::read_to_string(path).map_err(io_err)?;
    let images = html::extract_images(&original).len();
    let rewritten = engine.rewrite_content(&original);
    let changed = rewritten != original;
    if changed {
        std::fs::write(path, rewritten).map_err(io_err)?;
    }
    debug!(path = %path.display(), images, changed, "rewrote file");
    Ok(FileReport {
        path: path.to_path_buf(),
        images,
        changed,
    })
}

/// Rewrite every HTML file under `root` in place.
pub fn rewrite_dir(engine: &Engine, root: &Path) -> Result<BatchReport, BatchError> {
    let files = html_files(root)?;
    let results: Vec<_> = files
        .par_iter()
        .map(|path| (path, rewrite_file(engine, path)))
        .collect();

    let mut report = BatchReport::default();
    for (path, result) in results {
        match result {
            Ok(file) => report.files.push(file),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping file");
                report.failed.push((path.clone(), e.to_string()));
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{engine, upload};
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn finds_html_files_recursively() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "b.html", "");
        write(tmp.path(), "nested/a.HTM", "");
        write(tmp.path(), "notes.txt", "");

        let files = html_files(tmp.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(tmp.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![PathBuf::from("b.html"), PathBuf::from("nested/a.HTM")]
        );
    }

    #[test]
    fn rewrites_file_in_place() {
        let tmp = TempDir::new().unwrap();
        let html = format!(r#"<p><img src="{}"></p>"#, upload("tachyon-150x150.jpg"));
        let path = write(tmp.path(), "post.html", &html);

        let report = rewrite_file(&engine(), &path).unwrap();
        assert_eq!(report.images, 1);
        assert!(report.changed);
        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert!(on_disk.contains("http://tachy.on/u/tachyon.jpg?resize=150,150"));
    }

    #[test]
    fn untouched_file_reported_unchanged() {
        let tmp = TempDir::new().unwrap();
        let path = write(tmp.path(), "plain.html", "<p>No images here.</p>");
        let report = rewrite_file(&engine(), &path).unwrap();
        assert_eq!(report.images, 0);
        assert!(!report.changed);
    }

    #[test]
    fn directory_batch_collects_reports() {
        let tmp = TempDir::new().unwrap();
        let img = format!(r#"<img src="{}">"#, upload("tachyon-300x169.jpg"));
        write(tmp.path(), "one.html", &img);
        write(tmp.path(), "two/index.html", "<p>text</p>");

        let report = rewrite_dir(&engine(), tmp.path()).unwrap();
        assert_eq!(report.files.len(), 2);
        assert_eq!(report.changed(), 1);
        assert!(report.failed.is_empty());
    }

    #[test]
    fn missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let result = rewrite_file(&engine(), &tmp.path().join("absent.html"));
        assert!(matches!(result, Err(BatchError::Io { .. })));
    }
}
