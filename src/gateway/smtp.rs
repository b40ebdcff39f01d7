//! SMTP delivery gateway backed by `lettre`.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment as MimeAttachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, error, info, instrument};

use super::types::{DeliveryError, DeliveryGateway, DeliveryReceipt, OutgoingMail};
use crate::config::SmtpConfig;
use crate::{ComposerError, Result};

/// A gateway that delivers messages through an SMTP server.
pub struct SmtpGateway {
    config: SmtpConfig,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl std::fmt::Debug for SmtpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpGateway")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("from_address", &self.config.from_address)
            .field("transport", &"<AsyncSmtpTransport>")
            .finish()
    }
}

impl SmtpGateway {
    /// Create a gateway from validated SMTP settings.
    pub fn new(config: SmtpConfig) -> Result<Self> {
        config.validate()?;
        let transport = build_transport(&config)?;
        Ok(Self { config, transport })
    }

    /// Create a gateway with a pre-built transport.
    pub fn with_transport(config: SmtpConfig, transport: AsyncSmtpTransport<Tokio1Executor>) -> Self {
        Self { config, transport }
    }

    /// The settings this gateway was built from.
    pub fn config(&self) -> &SmtpConfig {
        &self.config
    }
}

fn build_transport(config: &SmtpConfig) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
    let builder = if config.tls {
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| ComposerError::Config(format!("SMTP TLS relay error: {e}")))?
    } else {
        AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
    };

    let builder = builder.port(config.port);

    let builder = match (&config.username, &config.password) {
        (Some(user), Some(pass)) if !user.is_empty() => {
            builder.credentials(Credentials::new(user.clone(), pass.clone()))
        }
        _ => builder,
    };

    Ok(builder.build())
}

/// Assemble the MIME message: a plain text part followed by one part per
/// attachment in draft order.
async fn build_message(
    config: &SmtpConfig,
    mail: &OutgoingMail,
) -> std::result::Result<Message, DeliveryError> {
    let from: Mailbox = config
        .from_address
        .parse()
        .map_err(|e| DeliveryError::InvalidMessage(format!("invalid sender address: {e}")))?;
    let to: Mailbox = mail
        .recipient
        .parse()
        .map_err(|e| DeliveryError::RecipientRejected(format!("invalid recipient address: {e}")))?;

    let builder = Message::builder().from(from).to(to).subject(&mail.subject);

    if mail.attachments.is_empty() {
        return builder
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body.clone())
            .map_err(|e| DeliveryError::InvalidMessage(format!("failed to build email: {e}")));
    }

    let mut parts = MultiPart::mixed().singlepart(SinglePart::plain(mail.body.clone()));
    for attachment in &mail.attachments {
        let bytes = attachment
            .content
            .read()
            .await
            .map_err(|e| DeliveryError::Attachment {
                name: attachment.name.clone(),
                reason: e.to_string(),
            })?;
        let mime = mime_guess::from_path(&attachment.name).first_or_octet_stream();
        let content_type = ContentType::parse(mime.essence_str()).map_err(|e| {
            DeliveryError::InvalidMessage(format!("invalid content type for {}: {e}", attachment.name))
        })?;
        parts = parts.singlepart(
            MimeAttachment::new(attachment.name.clone()).body(bytes, content_type),
        );
    }

    builder
        .multipart(parts)
        .map_err(|e| DeliveryError::InvalidMessage(format!("failed to build email: {e}")))
}

/// Map a lettre SMTP error to a [`DeliveryError`].
fn map_smtp_error(error: &lettre::transport::smtp::Error) -> DeliveryError {
    let message = error.to_string();
    let code = error.status().map(|c| c.to_string());

    match code.as_deref() {
        Some("530" | "534" | "535") => DeliveryError::Authentication(message),
        Some("550" | "551" | "553") => DeliveryError::RecipientRejected(message),
        Some("552") => DeliveryError::MessageTooLarge(message),
        _ if error.is_transient() => DeliveryError::Transient(message),
        _ if error.is_permanent() => DeliveryError::Failed(message),
        _ => DeliveryError::Connection(message),
    }
}

#[async_trait]
impl DeliveryGateway for SmtpGateway {
    #[instrument(skip(self, mail), fields(to = %mail.recipient, attachments = mail.attachments.len()))]
    async fn send(
        &self,
        mail: &OutgoingMail,
    ) -> std::result::Result<DeliveryReceipt, DeliveryError> {
        debug!(subject = %mail.subject, "building email message");
        let message = build_message(&self.config, mail).await?;

        info!("sending email");
        self.transport.send(message).await.map_err(|e| {
            error!(error = %e, "SMTP send failed");
            map_smtp_error(&e)
        })?;

        info!("email sent successfully");
        Ok(DeliveryReceipt::now())
    }

    #[instrument(skip(self), fields(host = %self.config.host))]
    async fn test_connection(&self) -> std::result::Result<(), DeliveryError> {
        debug!("testing SMTP connection");
        let reachable = self.transport.test_connection().await.map_err(|e| {
            error!(error = %e, "SMTP connection test failed");
            map_smtp_error(&e)
        })?;

        if !reachable {
            return Err(DeliveryError::Connection(format!(
                "{}:{} did not respond",
                self.config.host, self.config.port
            )));
        }

        info!("SMTP connection test passed");
        Ok(())
    }
}
