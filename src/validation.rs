//! Input validation for mail drafts.
//!
//! Every function here is pure and total: it inspects its input and
//! reports a [`ValidationError`] without touching any state. The
//! aggregate check ([`validate_draft`]) runs every field check and
//! collects the failures so a form can show all of them at once.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::attachment::{format_size, Attachment, MAX_ATTACHMENT_SIZE};

/// Maximum subject length (in characters).
pub const MAX_SUBJECT_LENGTH: usize = 200;

/// Maximum body length (in characters).
pub const MAX_BODY_LENGTH: usize = 50_000;

/// Maximum number of attachments per message.
pub const MAX_ATTACHMENTS: usize = 10;

/// Maximum combined size of all attachments (25 MiB).
pub const MAX_TOTAL_ATTACHMENT_SIZE: u64 = 25 * 1024 * 1024;

/// Maximum length of a single domain label.
pub const MAX_DOMAIN_LABEL_LENGTH: usize = 63;

/// Reason a single field failed validation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationError {
    /// Value is empty or blank.
    #[error("value is required")]
    Empty,

    /// Recipient is not of the form `local@domain.tld`.
    #[error("malformed email address")]
    MalformedAddress,

    /// Text exceeds its character limit.
    #[error("must be at most {max} characters")]
    TooLong { max: usize },

    /// Too many attachments.
    #[error("at most {max} attachments are allowed")]
    TooMany { max: usize },

    /// Combined attachment size exceeds the aggregate cap.
    #[error("combined attachment size exceeds {max_bytes} bytes")]
    AggregateTooLarge { max_bytes: u64 },

    /// A single file exceeds the per-file cap.
    #[error("file exceeds {max_bytes} bytes")]
    TooLarge { max_bytes: u64 },
}

/// A draft field that can carry a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Recipient,
    Subject,
    Body,
    Attachments,
}

impl Field {
    /// Name used in summaries and serialized views.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Recipient => "recipient",
            Field::Subject => "subject",
            Field::Body => "body",
            Field::Attachments => "attachments",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validation failure tied to the field it was found on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub reason: ValidationError,
}

impl FieldError {
    /// Create a new field error.
    pub fn new(field: Field, reason: ValidationError) -> Self {
        Self { field, reason }
    }

    /// Human-readable guidance for this field and reason.
    pub fn message(&self) -> String {
        use ValidationError::*;

        match (self.field, self.reason) {
            (Field::Recipient, Empty) => "Recipient email is required".to_string(),
            (Field::Recipient, MalformedAddress) => "Invalid email format".to_string(),
            (Field::Subject, Empty) => "Subject is required".to_string(),
            (Field::Subject, TooLong { max }) => {
                format!("Subject cannot exceed {max} characters")
            }
            (Field::Body, Empty) => "Message body is required".to_string(),
            (Field::Body, TooLong { max }) => {
                format!("Message body cannot exceed {max} characters")
            }
            (Field::Attachments, TooMany { max }) => format!("Maximum {max} files allowed"),
            (Field::Attachments, AggregateTooLarge { max_bytes }) => format!(
                "Total attachment size cannot exceed {}",
                format_size(max_bytes)
            ),
            (field, reason) => format!("{field}: {reason}"),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for FieldError {}

/// Result of validating every field of a draft.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    errors: BTreeMap<Field, ValidationError>,
}

impl ValidationReport {
    /// Returns true if no field failed.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// The failure recorded for `field`, if any.
    pub fn get(&self, field: Field) -> Option<ValidationError> {
        self.errors.get(&field).copied()
    }

    /// All failures, in field order.
    pub fn errors(&self) -> impl Iterator<Item = FieldError> + '_ {
        self.errors
            .iter()
            .map(|(field, reason)| FieldError::new(*field, *reason))
    }

    /// Number of failing fields.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns true if no field failed.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Field name to message mapping for display.
    pub fn messages(&self) -> BTreeMap<Field, String> {
        self.errors().map(|e| (e.field, e.message())).collect()
    }

    /// One-line summary of every failure.
    pub fn summary(&self) -> String {
        let details: Vec<String> = self.errors().map(|e| e.message()).collect();
        format!("Please fix the errors in the form: {}", details.join("; "))
    }

    fn record(&mut self, field: Field, result: Result<(), ValidationError>) {
        if let Err(reason) = result {
            self.errors.insert(field, reason);
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Validate a recipient address.
///
/// Requirements:
/// - Not blank
/// - Exactly one `@` with a non-empty local part of printable,
///   non-whitespace characters
/// - A domain of at least two dot-separated labels, each made of ASCII
///   letters, digits and hyphens, not starting or ending with a hyphen
///
/// # Examples
///
/// ```
/// use mailcomposer::validation::{validate_recipient, ValidationError};
///
/// assert!(validate_recipient("user@example.com").is_ok());
/// assert_eq!(validate_recipient("   "), Err(ValidationError::Empty));
/// assert_eq!(validate_recipient("invalid"), Err(ValidationError::MalformedAddress));
/// ```
pub fn validate_recipient(recipient: &str) -> Result<(), ValidationError> {
    if recipient.trim().is_empty() {
        return Err(ValidationError::Empty);
    }

    let (local, domain) = recipient
        .split_once('@')
        .ok_or(ValidationError::MalformedAddress)?;

    if !is_valid_local_part(local) || !is_valid_domain(domain) {
        return Err(ValidationError::MalformedAddress);
    }

    Ok(())
}

fn is_valid_local_part(local: &str) -> bool {
    !local.is_empty()
        && local
            .chars()
            .all(|c| c != '@' && !c.is_whitespace() && !c.is_control())
}

fn is_valid_domain(domain: &str) -> bool {
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| is_valid_label(label))
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= MAX_DOMAIN_LABEL_LENGTH
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Validate a subject line.
///
/// # Examples
///
/// ```
/// use mailcomposer::validation::validate_subject;
///
/// assert!(validate_subject("Hello").is_ok());
/// assert!(validate_subject(" ").is_err());
/// ```
pub fn validate_subject(subject: &str) -> Result<(), ValidationError> {
    validate_text(subject, MAX_SUBJECT_LENGTH)
}

/// Validate a message body.
pub fn validate_body(body: &str) -> Result<(), ValidationError> {
    validate_text(body, MAX_BODY_LENGTH)
}

fn validate_text(value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty);
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { max });
    }
    Ok(())
}

/// Validate the attachment list as a whole.
///
/// An empty list is valid. The per-file size cap is enforced when a file
/// is added, not here; this only re-checks count and combined size.
pub fn validate_attachments(attachments: &[Attachment]) -> Result<(), ValidationError> {
    if attachments.len() > MAX_ATTACHMENTS {
        return Err(ValidationError::TooMany {
            max: MAX_ATTACHMENTS,
        });
    }

    let too_large = ValidationError::AggregateTooLarge {
        max_bytes: MAX_TOTAL_ATTACHMENT_SIZE,
    };
    let total = attachments
        .iter()
        .try_fold(0u64, |acc, a| acc.checked_add(a.size_bytes))
        .ok_or(too_large)?;
    if total > MAX_TOTAL_ATTACHMENT_SIZE {
        return Err(too_large);
    }

    Ok(())
}

/// Validate the size of a single file against the per-file cap.
///
/// Applied when a file is added to a draft.
pub fn validate_attachment_size(size_bytes: u64) -> Result<(), ValidationError> {
    if size_bytes > MAX_ATTACHMENT_SIZE {
        return Err(ValidationError::TooLarge {
            max_bytes: MAX_ATTACHMENT_SIZE,
        });
    }
    Ok(())
}

/// Validate every field of a draft, collecting all failures.
pub fn validate_draft(
    recipient: &str,
    subject: &str,
    body: &str,
    attachments: &[Attachment],
) -> ValidationReport {
    let mut report = ValidationReport::default();
    report.record(Field::Recipient, validate_recipient(recipient));
    report.record(Field::Subject, validate_subject(subject));
    report.record(Field::Body, validate_body(body));
    report.record(Field::Attachments, validate_attachments(attachments));
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::AttachmentContent;

    const MIB: u64 = 1024 * 1024;

    fn attachment(name: &str, size_bytes: u64) -> Attachment {
        Attachment::new(name, size_bytes, AttachmentContent::from_bytes(Vec::new()))
    }

    // Recipient validation tests
    #[test]
    fn test_validate_recipient_valid() {
        assert!(validate_recipient("a@b.com").is_ok());
        assert!(validate_recipient("user@example.com").is_ok());
        assert!(validate_recipient("first.last+tag@mail.example.co.uk").is_ok());
        assert!(validate_recipient("x@my-host.org").is_ok());
        assert!(validate_recipient("o'neil!#$%@example.io").is_ok());
    }

    #[test]
    fn test_validate_recipient_empty() {
        assert_eq!(validate_recipient(""), Err(ValidationError::Empty));
        assert_eq!(validate_recipient("   "), Err(ValidationError::Empty));
        assert_eq!(validate_recipient("\t\n"), Err(ValidationError::Empty));
    }

    #[test]
    fn test_validate_recipient_without_at() {
        assert_eq!(
            validate_recipient("not-an-email"),
            Err(ValidationError::MalformedAddress)
        );
        assert_eq!(
            validate_recipient("example.com"),
            Err(ValidationError::MalformedAddress)
        );
    }

    #[test]
    fn test_validate_recipient_bad_local_part() {
        assert_eq!(
            validate_recipient("@example.com"),
            Err(ValidationError::MalformedAddress)
        );
        assert_eq!(
            validate_recipient("jo hn@example.com"),
            Err(ValidationError::MalformedAddress)
        );
        assert_eq!(
            validate_recipient("a@b@example.com"),
            Err(ValidationError::MalformedAddress)
        );
    }

    #[test]
    fn test_validate_recipient_bad_domain() {
        for addr in [
            "user@",
            "user@localhost",
            "user@.com",
            "user@example.",
            "user@exa..mple.com",
            "user@-example.com",
            "user@example-.com",
            "user@exam_ple.com",
            "user@example.com ",
        ] {
            assert_eq!(
                validate_recipient(addr),
                Err(ValidationError::MalformedAddress),
                "{addr}"
            );
        }
    }

    #[test]
    fn test_validate_recipient_label_length() {
        let ok = format!("user@{}.com", "a".repeat(63));
        let too_long = format!("user@{}.com", "a".repeat(64));
        assert!(validate_recipient(&ok).is_ok());
        assert_eq!(
            validate_recipient(&too_long),
            Err(ValidationError::MalformedAddress)
        );
    }

    // Subject validation tests
    #[test]
    fn test_validate_subject() {
        assert!(validate_subject("Hi").is_ok());
        assert_eq!(validate_subject(""), Err(ValidationError::Empty));
        assert_eq!(validate_subject("   "), Err(ValidationError::Empty));
    }

    #[test]
    fn test_validate_subject_length_counts_characters() {
        assert!(validate_subject(&"a".repeat(200)).is_ok());
        assert!(validate_subject(&"あ".repeat(200)).is_ok());
        assert_eq!(
            validate_subject(&"a".repeat(201)),
            Err(ValidationError::TooLong { max: 200 })
        );
    }

    // Body validation tests
    #[test]
    fn test_validate_body() {
        assert!(validate_body("Hello").is_ok());
        assert_eq!(validate_body("\n\n"), Err(ValidationError::Empty));
        assert!(validate_body(&"b".repeat(50_000)).is_ok());
        assert_eq!(
            validate_body(&"b".repeat(50_001)),
            Err(ValidationError::TooLong { max: 50_000 })
        );
    }

    // Attachment validation tests
    #[test]
    fn test_validate_attachments_empty_is_valid() {
        assert!(validate_attachments(&[]).is_ok());
    }

    #[test]
    fn test_validate_attachments_too_many() {
        let list: Vec<Attachment> = (0..11).map(|i| attachment(&format!("{i}.txt"), 1)).collect();
        assert_eq!(
            validate_attachments(&list),
            Err(ValidationError::TooMany { max: 10 })
        );
        assert!(validate_attachments(&list[..10]).is_ok());
    }

    #[test]
    fn test_validate_attachments_aggregate_too_large() {
        // Each file is under the per-file cap, the sum is not.
        let list = vec![attachment("a.bin", 15 * MIB), attachment("b.bin", 15 * MIB)];
        assert_eq!(
            validate_attachments(&list),
            Err(ValidationError::AggregateTooLarge {
                max_bytes: MAX_TOTAL_ATTACHMENT_SIZE
            })
        );

        let exact = vec![attachment("a.bin", 20 * MIB), attachment("b.bin", 5 * MIB)];
        assert!(validate_attachments(&exact).is_ok());
    }

    #[test]
    fn test_validate_attachments_size_overflow() {
        let list = vec![attachment("a.bin", u64::MAX), attachment("b.bin", 1)];
        assert_eq!(
            validate_attachments(&list),
            Err(ValidationError::AggregateTooLarge {
                max_bytes: MAX_TOTAL_ATTACHMENT_SIZE
            })
        );
    }

    #[test]
    fn test_validate_attachment_size() {
        assert!(validate_attachment_size(0).is_ok());
        assert!(validate_attachment_size(20 * MIB).is_ok());
        assert_eq!(
            validate_attachment_size(20 * MIB + 1),
            Err(ValidationError::TooLarge {
                max_bytes: 20 * MIB
            })
        );
    }

    // Aggregate tests
    #[test]
    fn test_validate_draft_collects_every_error() {
        let report = validate_draft("not-an-email", "", "", &[]);
        assert!(!report.is_valid());
        assert_eq!(report.len(), 3);
        assert_eq!(
            report.get(Field::Recipient),
            Some(ValidationError::MalformedAddress)
        );
        assert_eq!(report.get(Field::Subject), Some(ValidationError::Empty));
        assert_eq!(report.get(Field::Body), Some(ValidationError::Empty));
        assert_eq!(report.get(Field::Attachments), None);
    }

    #[test]
    fn test_validate_draft_valid() {
        let report = validate_draft("a@b.com", "Hi", "Hello", &[]);
        assert!(report.is_valid());
        assert!(report.messages().is_empty());
    }

    #[test]
    fn test_messages_are_distinct_per_reason() {
        let messages = [
            FieldError::new(Field::Recipient, ValidationError::Empty).message(),
            FieldError::new(Field::Recipient, ValidationError::MalformedAddress).message(),
            FieldError::new(Field::Subject, ValidationError::Empty).message(),
            FieldError::new(Field::Subject, ValidationError::TooLong { max: 200 }).message(),
            FieldError::new(Field::Body, ValidationError::Empty).message(),
            FieldError::new(Field::Body, ValidationError::TooLong { max: 50_000 }).message(),
            FieldError::new(Field::Attachments, ValidationError::TooMany { max: 10 }).message(),
            FieldError::new(
                Field::Attachments,
                ValidationError::AggregateTooLarge {
                    max_bytes: MAX_TOTAL_ATTACHMENT_SIZE,
                },
            )
            .message(),
        ];
        let unique: std::collections::HashSet<_> = messages.iter().collect();
        assert_eq!(unique.len(), messages.len());
    }

    #[test]
    fn test_summary_lists_each_failure() {
        let report = validate_draft("", "", "body", &[]);
        let summary = report.summary();
        assert!(summary.contains("Recipient email is required"));
        assert!(summary.contains("Subject is required"));
        assert!(!summary.contains("Message body"));
    }

    #[test]
    fn test_aggregate_message_uses_readable_size() {
        let err = FieldError::new(
            Field::Attachments,
            ValidationError::AggregateTooLarge {
                max_bytes: MAX_TOTAL_ATTACHMENT_SIZE,
            },
        );
        assert_eq!(err.to_string(), "Total attachment size cannot exceed 25.0 MB");
    }
}
