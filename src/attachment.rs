//! Attachment metadata.
//!
//! An attachment is the host's record of one upload: the original file, its
//! natural size, and the size variants generated from it. The rewriter
//! never reads images itself; everything it knows about an upload comes
//! through an [`AttachmentStore`].
//!
//! The CLI loads a JSON export into an [`AttachmentIndex`]:
//!
//! ```json
//! [
//!   {
//!     "id": 42,
//!     "file": "2020/01/photo.jpg",
//!     "width": 1280,
//!     "height": 719,
//!     "sizes": {
//!       "thumbnail": { "file": "photo-150x150.jpg", "width": 150, "height": 150 }
//!     }
//!   }
//! ]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AttachmentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One generated size variant, as recorded in attachment metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeVariant {
    /// Filename, relative to the original's directory.
    pub file: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: u64,
    /// Path of the original, relative to the upload base.
    pub file: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub sizes: BTreeMap<String, SizeVariant>,
}

impl Attachment {
    /// Natural size, when the metadata records one.
    pub fn natural(&self) -> Option<(u32, u32)> {
        (self.width > 0 && self.height > 0).then_some((self.width, self.height))
    }

    /// Absolute URL of the original under `upload_base`.
    pub fn url(&self, upload_base: &str) -> String {
        format!(
            "{}/{}",
            upload_base.trim_end_matches('/'),
            self.file.trim_start_matches('/')
        )
    }

    /// Name of the size whose variant file is `basename`.
    ///
    /// When several sizes share one file, the name sorting last wins.
    pub fn size_for_file(&self, basename: &str) -> Option<&str> {
        self.sizes
            .iter()
            .filter(|(_, v)| v.file == basename)
            .map(|(name, _)| name.as_str())
            .last()
    }

    pub fn variant(&self, size: &str) -> Option<&SizeVariant> {
        self.sizes.get(size)
    }
}

/// Read access to attachment metadata.
pub trait AttachmentStore: Send + Sync {
    fn attachment(&self, id: u64) -> Option<Attachment>;

    /// Warm any backing cache for `ids` before a batch of lookups.
    fn prime(&self, _ids: &[u64]) {}
}

/// In-memory store keyed by attachment ID.
#[derive(Debug, Clone, Default)]
pub struct AttachmentIndex {
    by_id: HashMap<u64, Attachment>,
}

impl AttachmentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON array of attachment records.
    pub fn load(path: &Path) -> Result<Self, AttachmentError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, AttachmentError> {
        let records: Vec<Attachment> = serde_json::from_str(json)?;
        Ok(records.into_iter().collect())
    }

    pub fn insert(&mut self, attachment: Attachment) {
        self.by_id.insert(attachment.id, attachment);
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl FromIterator<Attachment> for AttachmentIndex {
    fn from_iter<I: IntoIterator<Item = Attachment>>(iter: I) -> Self {
        let mut index = AttachmentIndex::new();
        for attachment in iter {
            index.insert(attachment);
        }
        index
    }
}

impl AttachmentStore for AttachmentIndex {
    fn attachment(&self, id: u64) -> Option<Attachment> {
        self.by_id.get(&id).cloned()
    }
}
