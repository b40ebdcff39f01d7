//! Attachment types.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::MAX_ATTACHMENT_SIZE;

/// Attachment-related errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttachmentError {
    /// The file is larger than the per-file limit.
    #[error("File \"{name}\" exceeds {} size limit", format_size(MAX_ATTACHMENT_SIZE))]
    TooLarge { name: String, size_bytes: u64 },

    /// The file could not be inspected or read.
    #[error("File \"{name}\" could not be read: {reason}")]
    Unreadable { name: String, reason: String },

    /// No attachment at the given position.
    #[error("attachment index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Opaque handle to attachment bytes.
///
/// File-backed content is only inspected for its size when added; the
/// bytes are read when the message is actually sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentContent {
    /// Content lives in a file on disk.
    File(PathBuf),
    /// Content is already in memory (e.g. a drag-and-drop payload).
    Memory(Arc<[u8]>),
}

impl AttachmentContent {
    /// Handle for a file on disk.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        AttachmentContent::File(path.into())
    }

    /// Handle for bytes already in memory.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        AttachmentContent::Memory(Arc::from(bytes.into()))
    }

    /// Size of the content in bytes.
    pub fn size(&self) -> io::Result<u64> {
        match self {
            AttachmentContent::File(path) => {
                let metadata = std::fs::metadata(path)?;
                if !metadata.is_file() {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "not a regular file",
                    ));
                }
                Ok(metadata.len())
            }
            AttachmentContent::Memory(bytes) => Ok(bytes.len() as u64),
        }
    }

    /// Read the full content.
    pub async fn read(&self) -> io::Result<Vec<u8>> {
        match self {
            AttachmentContent::File(path) => tokio::fs::read(path).await,
            AttachmentContent::Memory(bytes) => Ok(bytes.to_vec()),
        }
    }
}

/// A file the user picked or dropped, not yet admitted to a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
    /// Display name of the file.
    pub name: String,
    /// Content handle.
    pub content: AttachmentContent,
}

impl PendingFile {
    /// Create a pending file with an explicit name.
    pub fn new(name: impl Into<String>, content: AttachmentContent) -> Self {
        Self {
            name: name.into(),
            content,
        }
    }

    /// Pending file for a path on disk, named after its last component.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::new(name, AttachmentContent::from_path(path))
    }

    /// Pending file for in-memory bytes.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(name, AttachmentContent::from_bytes(bytes))
    }
}

/// An attachment admitted to a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Identity of this entry; two attachments with the same name are distinct.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Size in bytes, measured when the attachment was added.
    pub size_bytes: u64,
    /// Content handle.
    pub content: AttachmentContent,
}

impl Attachment {
    /// Create a new attachment with a fresh identity.
    pub fn new(name: impl Into<String>, size_bytes: u64, content: AttachmentContent) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            size_bytes,
            content,
        }
    }

    /// MIME type guessed from the file name.
    pub fn mime_type(&self) -> String {
        mime_guess::from_path(&self.name)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    }

    /// Name and size for display or history records.
    pub fn summary(&self) -> AttachmentSummary {
        AttachmentSummary {
            name: self.name.clone(),
            size_bytes: self.size_bytes,
            size: format_size(self.size_bytes),
        }
    }
}

/// Display projection of an attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentSummary {
    pub name: String,
    pub size_bytes: u64,
    /// Human-readable size.
    pub size: String,
}

/// Format a byte count as `B`, `KB` or `MB`.
///
/// # Examples
///
/// ```
/// use mailcomposer::attachment::format_size;
///
/// assert_eq!(format_size(512), "512 B");
/// assert_eq!(format_size(1536), "1.5 KB");
/// assert_eq!(format_size(20 * 1024 * 1024), "20.0 MB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;

    if bytes < KB {
        format!("{bytes} B")
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}
