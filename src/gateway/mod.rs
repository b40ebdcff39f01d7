//! Mail delivery for drafts.
//!
//! This module provides:
//! - The [`DeliveryGateway`] capability a composer submits through
//! - An SMTP-backed gateway
//! - Sent-mail history and a gateway decorator that records every attempt
//! - Batch sending of one message to several recipients

mod batch;
mod history;
mod smtp;
mod types;

pub use batch::{send_batch, BatchOutcome};
pub use history::{DeliveryStatus, HistoryStats, RecordingGateway, SentHistory, SentMail};
pub use smtp::SmtpGateway;
pub use types::{
    DeliveryError, DeliveryGateway, DeliveryReceipt, OutgoingAttachment, OutgoingMail,
    GENERIC_DELIVERY_FAILURE,
};
