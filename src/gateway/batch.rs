//! Sending one message to several recipients.

use tracing::{debug, info, warn};

use super::types::{DeliveryError, DeliveryGateway, DeliveryReceipt, OutgoingMail};
use crate::validation::{validate_recipient, Field, FieldError};

/// Outcome for one recipient of a batch.
pub type BatchOutcome = (String, Result<DeliveryReceipt, DeliveryError>);

/// Send `mail` to each of `recipients` in turn, one message per recipient.
///
/// Every recipient gets its own outcome, in input order. Malformed
/// addresses are rejected without contacting the gateway; a failure for
/// one recipient does not stop the rest. Wrap the gateway in a
/// [`RecordingGateway`](super::RecordingGateway) to record each attempt.
pub async fn send_batch<G, I, S>(
    gateway: &G,
    mail: &OutgoingMail,
    recipients: I,
) -> Vec<BatchOutcome>
where
    G: DeliveryGateway + ?Sized,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut outcomes = Vec::new();

    for recipient in recipients {
        let recipient = recipient.into();
        let result = match validate_recipient(&recipient) {
            Ok(()) => {
                let single = OutgoingMail {
                    recipient: recipient.clone(),
                    ..mail.clone()
                };
                gateway.send(&single).await
            }
            Err(reason) => {
                debug!(to = %recipient, "batch recipient skipped");
                Err(DeliveryError::RecipientRejected(
                    FieldError::new(Field::Recipient, reason).message(),
                ))
            }
        };
        if let Err(e) = &result {
            warn!(to = %recipient, error = %e, "batch delivery failed");
        }
        outcomes.push((recipient, result));
    }

    let sent = outcomes.iter().filter(|(_, r)| r.is_ok()).count();
    info!(sent, total = outcomes.len(), "batch finished");
    outcomes
}
