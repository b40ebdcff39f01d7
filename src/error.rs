//! Error types for the mail composer.

use thiserror::Error;

use crate::attachment::AttachmentError;
use crate::composer::{OperationError, SubmitError};
use crate::gateway::DeliveryError;

/// Common error type for the mail composer.
#[derive(Error, Debug)]
pub enum ComposerError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An operation was called in a state that does not allow it.
    #[error(transparent)]
    Operation(#[from] OperationError),

    /// A file could not be attached.
    #[error(transparent)]
    Attachment(#[from] AttachmentError),

    /// Submitting the draft failed.
    #[error(transparent)]
    Submit(#[from] SubmitError),

    /// The delivery gateway failed outside of a submission.
    #[error("delivery error: {0}")]
    Delivery(#[from] DeliveryError),
}

/// Result type alias for mail composer operations.
pub type Result<T> = std::result::Result<T, ComposerError>;
