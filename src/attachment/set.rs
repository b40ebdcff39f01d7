//! Ordered attachment collection.

use tracing::{debug, warn};

use super::types::{Attachment, AttachmentError, AttachmentSummary, PendingFile};
use crate::validation::validate_attachment_size;

/// Outcome of adding several files at once.
///
/// A batch may partially succeed: accepted files are appended in order
/// and every rejected file contributes one error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchAddReport {
    /// Number of files appended.
    pub added: usize,
    /// Rejections, in input order.
    pub errors: Vec<AttachmentError>,
}

impl BatchAddReport {
    /// Returns true if every file was accepted.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// Per-file error strings for display.
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.to_string()).collect()
    }
}

/// Attachments of a draft, in insertion order.
///
/// No deduplication is performed: the same file may be added twice and
/// yields two distinct entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentSet {
    items: Vec<Attachment>,
}

impl AttachmentSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single file.
    ///
    /// Measures the file and rejects it if it exceeds
    /// [`MAX_ATTACHMENT_SIZE`](super::MAX_ATTACHMENT_SIZE). The set is unchanged on error.
    pub fn add(&mut self, file: PendingFile) -> Result<&Attachment, AttachmentError> {
        let size_bytes = file
            .content
            .size()
            .map_err(|e| AttachmentError::Unreadable {
                name: file.name.clone(),
                reason: e.to_string(),
            })?;

        if validate_attachment_size(size_bytes).is_err() {
            return Err(AttachmentError::TooLarge {
                name: file.name,
                size_bytes,
            });
        }

        debug!(name = %file.name, size_bytes, "attachment added");
        self.items
            .push(Attachment::new(file.name, size_bytes, file.content));
        let index = self.items.len() - 1;
        Ok(&self.items[index])
    }

    /// Add several files, continuing past rejected ones.
    pub fn add_all(&mut self, files: impl IntoIterator<Item = PendingFile>) -> BatchAddReport {
        let mut report = BatchAddReport::default();
        for file in files {
            match self.add(file) {
                Ok(_) => report.added += 1,
                Err(e) => {
                    warn!(error = %e, "attachment rejected");
                    report.errors.push(e);
                }
            }
        }
        report
    }

    /// Remove the attachment at `index`, keeping the others in order.
    pub fn remove(&mut self, index: usize) -> Result<Attachment, AttachmentError> {
        if index >= self.items.len() {
            return Err(AttachmentError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        Ok(self.items.remove(index))
    }

    /// Remove every attachment.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Combined size of all attachments in bytes.
    pub fn total_size(&self) -> u64 {
        self.items
            .iter()
            .fold(0u64, |acc, a| acc.saturating_add(a.size_bytes))
    }

    /// Number of attachments.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if there are no attachments.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Attachment at `index`.
    pub fn get(&self, index: usize) -> Option<&Attachment> {
        self.items.get(index)
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Attachment> {
        self.items.iter()
    }

    /// Borrow as a slice.
    pub fn as_slice(&self) -> &[Attachment] {
        &self.items
    }

    /// Display projections, in order.
    pub fn summaries(&self) -> Vec<AttachmentSummary> {
        self.items.iter().map(Attachment::summary).collect()
    }
}

impl<'a> IntoIterator for &'a AttachmentSet {
    type Item = &'a Attachment;
    type IntoIter = std::slice::Iter<'a, Attachment>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
