//! mailcomposer - desktop mail composition core
//!
//! Owns an email draft (recipient, subject, body and attachments),
//! validates it and submits it through a pluggable delivery gateway.
//! An SMTP gateway and an in-memory sent history are included.

pub mod attachment;
pub mod composer;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod validation;

pub use attachment::{
    format_size, Attachment, AttachmentContent, AttachmentError, AttachmentSet,
    AttachmentSummary, BatchAddReport, PendingFile, MAX_ATTACHMENT_SIZE,
};
pub use composer::{
    Composer, ComposerView, Draft, OperationError, SubmissionStatus, SubmitError, TextField,
};
pub use config::{ComposerConfig, Config, HistoryConfig, LoggingConfig, SmtpConfig};
pub use error::{ComposerError, Result};
pub use gateway::{
    send_batch, BatchOutcome, DeliveryError, DeliveryGateway, DeliveryReceipt, DeliveryStatus,
    HistoryStats, OutgoingAttachment, OutgoingMail, RecordingGateway, SentHistory, SentMail,
    SmtpGateway, GENERIC_DELIVERY_FAILURE,
};
pub use validation::{
    validate_attachment_size, validate_attachments, validate_body, validate_draft,
    validate_recipient, validate_subject, Field, FieldError, ValidationError, ValidationReport,
    MAX_ATTACHMENTS, MAX_BODY_LENGTH, MAX_SUBJECT_LENGTH, MAX_TOTAL_ATTACHMENT_SIZE,
};
