//! Draft and submission types.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::attachment::{AttachmentSet, AttachmentSummary};
use crate::gateway::{DeliveryError, OutgoingAttachment, OutgoingMail};
use crate::validation::{validate_draft, Field, ValidationReport};

/// Errors from calling an operation in a state that does not allow it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    /// The draft is being submitted and cannot be changed.
    #[error("the draft is being sent and cannot be changed")]
    Busy,

    /// A submission is already in flight.
    #[error("the draft is already being sent")]
    AlreadyInFlight,

    /// No attachment at the given position.
    #[error("attachment index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// No delivery gateway has been set up.
    #[error("mail delivery is not configured; enter SMTP settings first")]
    NotConfigured,
}

/// Errors returned by a submission.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// The submission was not allowed.
    #[error(transparent)]
    Operation(#[from] OperationError),

    /// One or more fields are invalid; nothing was sent.
    #[error("{0}")]
    Invalid(ValidationReport),

    /// The gateway reported a failure.
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

/// A free-text field of the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextField {
    Recipient,
    Subject,
    Body,
}

impl From<TextField> for Field {
    fn from(field: TextField) -> Self {
        match field {
            TextField::Recipient => Field::Recipient,
            TextField::Subject => Field::Subject,
            TextField::Body => Field::Body,
        }
    }
}

/// Where the draft is in its submit lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    /// The last submission failed; carries the user-facing reason.
    Failed(String),
}

impl SubmissionStatus {
    /// Returns true while a submission is in flight.
    pub fn is_submitting(&self) -> bool {
        matches!(self, SubmissionStatus::Submitting)
    }

    /// The failure reason, only present when failed.
    pub fn last_error(&self) -> Option<&str> {
        match self {
            SubmissionStatus::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

/// The in-progress message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub attachments: AttachmentSet,
}

impl Draft {
    /// Returns true if nothing has been entered.
    pub fn is_empty(&self) -> bool {
        self.recipient.is_empty()
            && self.subject.is_empty()
            && self.body.is_empty()
            && self.attachments.is_empty()
    }

    /// Run every field check.
    pub fn validate(&self) -> ValidationReport {
        validate_draft(
            &self.recipient,
            &self.subject,
            &self.body,
            self.attachments.as_slice(),
        )
    }

    /// Package the draft for a gateway.
    pub fn to_outgoing(&self) -> OutgoingMail {
        OutgoingMail {
            recipient: self.recipient.clone(),
            subject: self.subject.clone(),
            body: self.body.clone(),
            attachments: self
                .attachments
                .iter()
                .map(OutgoingAttachment::from)
                .collect(),
        }
    }

    pub(crate) fn field_mut(&mut self, field: TextField) -> &mut String {
        match field {
            TextField::Recipient => &mut self.recipient,
            TextField::Subject => &mut self.subject,
            TextField::Body => &mut self.body,
        }
    }
}

/// Read-only projection of a composer for rendering a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComposerView {
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<AttachmentSummary>,
    pub total_attachment_size: u64,
    pub status: SubmissionStatus,
    pub last_error: Option<String>,
    /// Current validation messages by field.
    pub field_errors: BTreeMap<Field, String>,
    pub is_valid: bool,
    /// Whether a delivery gateway is set up.
    pub is_configured: bool,
}

impl ComposerView {
    pub(crate) fn new(draft: &Draft, status: &SubmissionStatus, is_configured: bool) -> Self {
        let report = draft.validate();
        Self {
            recipient: draft.recipient.clone(),
            subject: draft.subject.clone(),
            body: draft.body.clone(),
            attachments: draft.attachments.summaries(),
            total_attachment_size: draft.attachments.total_size(),
            status: status.clone(),
            last_error: status.last_error().map(str::to_string),
            field_errors: report.messages(),
            is_valid: report.is_valid(),
            is_configured,
        }
    }

    /// Whether the submit button should be enabled.
    pub fn can_submit(&self) -> bool {
        self.is_configured && self.is_valid && !self.status.is_submitting()
    }
}
