//! CLI output formatting.
//!
//! Every command's output is built by a pure `format_*` function returning
//! lines, with a thin `print_*` wrapper writing them to stdout. Tests check
//! the lines; the binary only prints.
//!
//! # Output Format
//!
//! ## Sizes
//!
//! ```text
//! 001 thumb 150x150 crop
//! 002 medium 300x300
//! 003 medium_large 768x*
//! ```
//!
//! ## Downsize
//!
//! ```text
//! large → http://tachy.on/u/tachyon.jpg?fit=1024,719
//!     Display: 1024x575
//!     Intermediate: yes
//! ```
//!
//! ## Batch rewrite
//!
//! ```text
//! 001 posts/hello.html (3 images) rewritten
//! 002 about.html (0 images) unchanged
//!
//! 1 of 2 files rewritten
//! ```

use crate::batch::BatchReport;
use crate::downsize::{Downsized, SizeRequest};
use crate::sizes::SizeCatalog;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

// ============================================================================
// Sizes
// ============================================================================

/// One line per registered size, in lookup order.
pub fn format_sizes(catalog: &SizeCatalog) -> Vec<String> {
    catalog
        .sizes()
        .iter()
        .enumerate()
        .map(|(i, size)| format!("{} {}", format_index(i + 1), size))
        .collect()
}

pub fn print_sizes(catalog: &SizeCatalog) {
    for line in format_sizes(catalog) {
        println!("{}", line);
    }
}

// ============================================================================
// Downsize
// ============================================================================

/// The resolved URL with its display size, or a note that the host keeps
/// the request.
pub fn format_downsize(id: u64, request: &SizeRequest, result: Option<&Downsized>) -> Vec<String> {
    match result {
        Some(d) => vec![
            format!("{} → {}", request, d.url),
            format!("{}Display: {}x{}", indent(1), d.width, d.height),
            format!(
                "{}Intermediate: {}",
                indent(1),
                if d.is_intermediate { "yes" } else { "no" }
            ),
        ],
        None => vec![format!("{request}: not rewritten for attachment {id}")],
    }
}

pub fn print_downsize(id: u64, request: &SizeRequest, result: Option<&Downsized>) {
    for line in format_downsize(id, request, result) {
        println!("{}", line);
    }
}

// ============================================================================
// Batch rewrite
// ============================================================================

/// Per-file lines relative to `root`, failures, then a summary.
pub fn format_batch_report(report: &BatchReport, root: &Path) -> Vec<String> {
    let relative = |p: &Path| {
        p.strip_prefix(root)
            .unwrap_or(p)
            .to_string_lossy()
            .into_owned()
    };

    let mut lines: Vec<String> = report
        .files
        .iter()
        .enumerate()
        .map(|(i, file)| {
            format!(
                "{} {} ({}) {}",
                format_index(i + 1),
                relative(&file.path),
                plural(file.images, "image"),
                if file.changed { "rewritten" } else { "unchanged" }
            )
        })
        .collect();

    if !report.failed.is_empty() {
        lines.push(String::new());
        lines.push("Failed".to_string());
        for (path, error) in &report.failed {
            lines.push(format!("{}{}: {}", indent(1), relative(path), error));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "{} of {} rewritten",
        report.changed(),
        plural(report.files.len(), "file")
    ));
    lines
}

pub fn print_batch_report(report: &BatchReport, root: &Path) {
    for line in format_batch_report(report, root) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::FileReport;
    use crate::config::HostConfig;
    use std::path::PathBuf;

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn plural_words() {
        assert_eq!(plural(1, "image"), "1 image");
        assert_eq!(plural(0, "image"), "0 images");
    }

    // =========================================================================
    // Command output
    // =========================================================================

    #[test]
    fn sizes_listed_in_order() {
        let catalog = SizeCatalog::from_config(&HostConfig::default());
        let lines = format_sizes(&catalog);
        assert_eq!(lines[0], "001 thumb 150x150 crop");
        assert_eq!(lines[1], "002 medium 300x300");
        assert_eq!(lines[2], "003 medium_large 768x*");
    }

    #[test]
    fn downsize_result_lines() {
        let d = Downsized {
            url: "http://tachy.on/u/tachyon.jpg?fit=1024,719".into(),
            width: 1024,
            height: 575,
            is_intermediate: true,
        };
        let request = SizeRequest::Named("large".into());
        let lines = format_downsize(42, &request, Some(&d));
        assert_eq!(
            lines,
            vec![
                "large → http://tachy.on/u/tachyon.jpg?fit=1024,719",
                "    Display: 1024x575",
                "    Intermediate: yes",
            ]
        );
    }

    #[test]
    fn downsize_declined() {
        let request = SizeRequest::Box {
            width: 300,
            height: 0,
        };
        assert_eq!(
            format_downsize(7, &request, None),
            vec!["300x0: not rewritten for attachment 7"]
        );
    }

    #[test]
    fn batch_report_lines() {
        let root = PathBuf::from("/site");
        let report = BatchReport {
            files: vec![
                FileReport {
                    path: root.join("posts/hello.html"),
                    images: 3,
                    changed: true,
                },
                FileReport {
                    path: root.join("about.html"),
                    images: 1,
                    changed: false,
                },
            ],
            failed: vec![(root.join("broken.html"), "denied".into())],
        };
        let lines = format_batch_report(&report, &root);
        assert_eq!(lines[0], "001 posts/hello.html (3 images) rewritten");
        assert_eq!(lines[1], "002 about.html (1 image) unchanged");
        assert_eq!(lines[3], "Failed");
        assert_eq!(lines[4], "    broken.html: denied");
        assert_eq!(lines.last().unwrap(), "1 of 2 files rewritten");
    }
}
