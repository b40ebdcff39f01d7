//! Attachment handling for mail drafts.
//!
//! This module provides:
//! - Opaque content handles (file path or in-memory bytes)
//! - The per-file size gate applied when a file is added
//! - An ordered attachment set with size accounting

mod set;
mod types;

pub use set::{AttachmentSet, BatchAddReport};
pub use types::{
    format_size, Attachment, AttachmentContent, AttachmentError, AttachmentSummary, PendingFile,
};

/// Maximum size of a single attachment (20 MiB).
pub const MAX_ATTACHMENT_SIZE: u64 = 20 * 1024 * 1024;
