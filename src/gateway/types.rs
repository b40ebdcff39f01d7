//! Delivery gateway types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::attachment::{format_size, Attachment, AttachmentContent, AttachmentSummary};

/// Message shown when a gateway fails without saying why.
pub const GENERIC_DELIVERY_FAILURE: &str = "Failed to send email";

/// Errors reported by a delivery gateway.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The mail server could not be reached.
    #[error("could not connect to the mail server: {0}")]
    Connection(String),

    /// The mail server refused the credentials.
    #[error("authentication with the mail server failed: {0}")]
    Authentication(String),

    /// The mail server refused the recipient.
    #[error("recipient rejected: {0}")]
    RecipientRejected(String),

    /// The message exceeds what the server accepts.
    #[error("message too large: {0}")]
    MessageTooLarge(String),

    /// A temporary failure; retrying later may succeed.
    #[error("temporary delivery failure: {0}")]
    Transient(String),

    /// The message could not be assembled.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// An attachment could not be read at send time.
    #[error("attachment \"{name}\" could not be read: {reason}")]
    Attachment { name: String, reason: String },

    /// Any other failure with a reason.
    #[error("{0}")]
    Failed(String),

    /// The gateway failed without a reason.
    #[error("{}", GENERIC_DELIVERY_FAILURE)]
    Unspecified,
}

impl DeliveryError {
    /// User-facing text, falling back to a generic message when the
    /// gateway supplied none.
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            GENERIC_DELIVERY_FAILURE.to_string()
        } else {
            message
        }
    }
}

/// An attachment as handed to a gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingAttachment {
    pub name: String,
    pub size_bytes: u64,
    /// Passed through unmodified from the draft.
    pub content: AttachmentContent,
}

impl OutgoingAttachment {
    /// Name and size for history records.
    pub fn summary(&self) -> AttachmentSummary {
        AttachmentSummary {
            name: self.name.clone(),
            size_bytes: self.size_bytes,
            size: format_size(self.size_bytes),
        }
    }
}

impl From<&Attachment> for OutgoingAttachment {
    fn from(attachment: &Attachment) -> Self {
        Self {
            name: attachment.name.clone(),
            size_bytes: attachment.size_bytes,
            content: attachment.content.clone(),
        }
    }
}

/// A validated message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub recipient: String,
    pub subject: String,
    pub body: String,
    /// In draft order.
    pub attachments: Vec<OutgoingAttachment>,
}

/// Proof of a successful delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// Identifier assigned to this delivery.
    pub id: String,
    /// When the gateway accepted the message.
    pub sent_at: DateTime<Utc>,
}

impl DeliveryReceipt {
    /// Receipt stamped with a fresh id and the current time.
    pub fn now() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sent_at: Utc::now(),
        }
    }
}

/// Capability that actually transmits a message.
///
/// Implementations own transport concerns such as timeouts; a composer
/// never cancels a call once it has been made.
#[async_trait]
pub trait DeliveryGateway: Send + Sync {
    /// Deliver a message.
    async fn send(&self, mail: &OutgoingMail) -> Result<DeliveryReceipt, DeliveryError>;

    /// Check that the gateway can reach its server.
    async fn test_connection(&self) -> Result<(), DeliveryError> {
        Ok(())
    }
}

#[async_trait]
impl<G: DeliveryGateway + ?Sized> DeliveryGateway for std::sync::Arc<G> {
    async fn send(&self, mail: &OutgoingMail) -> Result<DeliveryReceipt, DeliveryError> {
        (**self).send(mail).await
    }

    async fn test_connection(&self) -> Result<(), DeliveryError> {
        (**self).test_connection().await
    }
}
