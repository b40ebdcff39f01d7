//! The composer: owns one draft and drives its submit lifecycle.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::types::{ComposerView, Draft, OperationError, SubmissionStatus, SubmitError, TextField};
use crate::attachment::{Attachment, AttachmentSet, BatchAddReport, PendingFile};
use crate::config::ComposerConfig;
use crate::gateway::{DeliveryError, DeliveryGateway, DeliveryReceipt};
use crate::validation::ValidationReport;

/// State guarded by the composer's lock.
struct Shared {
    draft: Draft,
    status: SubmissionStatus,
    gateway: Option<Arc<dyn DeliveryGateway>>,
    reset_timer: Option<JoinHandle<()>>,
    /// Bumped whenever a pending reset is cancelled or replaced.
    timer_epoch: u64,
}

impl Shared {
    /// Gate a mutation: refuse while submitting, otherwise drop any
    /// pending reset and return to idle.
    fn begin_edit(&mut self) -> Result<(), OperationError> {
        if self.status.is_submitting() {
            return Err(OperationError::Busy);
        }
        self.cancel_reset();
        if self.status != SubmissionStatus::Idle {
            debug!(from = ?self.status, "draft edited, back to idle");
            self.status = SubmissionStatus::Idle;
        }
        Ok(())
    }

    fn cancel_reset(&mut self) {
        if let Some(timer) = self.reset_timer.take() {
            timer.abort();
            self.timer_epoch += 1;
            debug!("pending auto-reset cancelled");
        }
    }

    fn clear_draft(&mut self) {
        self.draft = Draft::default();
        self.status = SubmissionStatus::Idle;
    }
}

/// Draft state machine.
///
/// A `Composer` is a cheap handle; clones share the same draft. Every
/// operation except [`submit`](Self::submit) and
/// [`test_connection`](Self::test_connection) is synchronous.
///
/// ```text
/// Idle -> Submitting -> Succeeded --(reset delay)--> Idle
///                    \-> Failed --(edit / reset)--> Idle
/// ```
#[derive(Clone)]
pub struct Composer {
    shared: Arc<Mutex<Shared>>,
    reset_delay: Duration,
}

impl fmt::Debug for Composer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = self.lock();
        f.debug_struct("Composer")
            .field("status", &shared.status)
            .field("is_configured", &shared.gateway.is_some())
            .field("reset_delay", &self.reset_delay)
            .finish()
    }
}

impl Composer {
    /// Open a composer with an empty draft.
    ///
    /// `gateway` may be `None` until mail settings are entered; submitting
    /// then fails with [`OperationError::NotConfigured`].
    pub fn open(gateway: Option<Arc<dyn DeliveryGateway>>, config: &ComposerConfig) -> Self {
        debug!(configured = gateway.is_some(), "composer opened");
        Self {
            shared: Arc::new(Mutex::new(Shared {
                draft: Draft::default(),
                status: SubmissionStatus::Idle,
                gateway,
                reset_timer: None,
                timer_epoch: 0,
            })),
            reset_delay: config.reset_delay(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------
    // Gateway
    // ------------------------------------------------------------------

    /// Install or replace the delivery gateway.
    ///
    /// An in-flight submission keeps the gateway it started with.
    pub fn set_gateway(&self, gateway: Arc<dyn DeliveryGateway>) {
        self.lock().gateway = Some(gateway);
        info!("delivery gateway configured");
    }

    /// Remove the delivery gateway, returning the previous one.
    pub fn clear_gateway(&self) -> Option<Arc<dyn DeliveryGateway>> {
        let previous = self.lock().gateway.take();
        if previous.is_some() {
            info!("delivery gateway removed");
        }
        previous
    }

    /// Returns true if a delivery gateway is installed.
    pub fn is_configured(&self) -> bool {
        self.lock().gateway.is_some()
    }

    /// Check the installed gateway.
    pub async fn test_connection(&self) -> Result<(), SubmitError> {
        let gateway = self
            .lock()
            .gateway
            .clone()
            .ok_or(OperationError::NotConfigured)?;
        gateway.test_connection().await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Replace the value of a text field.
    ///
    /// Clears any previous failure.
    pub fn update_field(
        &self,
        field: TextField,
        value: impl Into<String>,
    ) -> Result<(), OperationError> {
        let mut shared = self.lock();
        shared.begin_edit()?;
        *shared.draft.field_mut(field) = value.into();
        Ok(())
    }

    /// Set the recipient address.
    pub fn set_recipient(&self, value: impl Into<String>) -> Result<(), OperationError> {
        self.update_field(TextField::Recipient, value)
    }

    /// Set the subject line.
    pub fn set_subject(&self, value: impl Into<String>) -> Result<(), OperationError> {
        self.update_field(TextField::Subject, value)
    }

    /// Set the message body.
    pub fn set_body(&self, value: impl Into<String>) -> Result<(), OperationError> {
        self.update_field(TextField::Body, value)
    }

    /// Append files to the attachments.
    ///
    /// Files over the per-file limit are skipped and reported in the
    /// returned [`BatchAddReport`]; the others are still added.
    pub fn add_attachments(
        &self,
        files: impl IntoIterator<Item = PendingFile>,
    ) -> Result<BatchAddReport, OperationError> {
        let mut shared = self.lock();
        shared.begin_edit()?;
        let report = shared.draft.attachments.add_all(files);
        debug!(
            added = report.added,
            rejected = report.errors.len(),
            "attachments added"
        );
        Ok(report)
    }

    /// Replace all attachments with `files`.
    pub fn set_attachments(
        &self,
        files: impl IntoIterator<Item = PendingFile>,
    ) -> Result<BatchAddReport, OperationError> {
        let mut shared = self.lock();
        shared.begin_edit()?;
        let mut attachments = AttachmentSet::new();
        let report = attachments.add_all(files);
        shared.draft.attachments = attachments;
        Ok(report)
    }

    /// Remove the attachment at `index`.
    pub fn remove_attachment(&self, index: usize) -> Result<Attachment, OperationError> {
        let mut shared = self.lock();
        if shared.status.is_submitting() {
            return Err(OperationError::Busy);
        }
        let len = shared.draft.attachments.len();
        if index >= len {
            return Err(OperationError::IndexOutOfRange { index, len });
        }
        shared.begin_edit()?;
        shared
            .draft
            .attachments
            .remove(index)
            .map_err(|_| OperationError::IndexOutOfRange { index, len })
    }

    /// Empty the draft and return to idle.
    ///
    /// Refused with [`OperationError::Busy`] while a submission is in
    /// flight.
    pub fn reset(&self) -> Result<(), OperationError> {
        let mut shared = self.lock();
        if shared.status.is_submitting() {
            warn!("reset refused while submitting");
            return Err(OperationError::Busy);
        }
        shared.cancel_reset();
        shared.clear_draft();
        debug!("draft reset");
        Ok(())
    }

    /// The user "clear" action. Same as [`reset`](Self::reset).
    pub fn clear(&self) -> Result<(), OperationError> {
        self.reset()
    }

    /// Close the composer, cancelling any pending reset and dropping the
    /// draft contents.
    pub fn teardown(&self) -> Result<(), OperationError> {
        self.reset()?;
        info!("composer closed");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Submission
    // ------------------------------------------------------------------

    /// Validate the draft and hand it to the delivery gateway.
    ///
    /// Invalid drafts move to `Failed` without contacting the gateway.
    /// Once dispatched, delivery runs to completion even if the returned
    /// future is dropped. On success the draft is emptied after the
    /// configured reset delay; on failure it is kept for a retry.
    pub async fn submit(&self) -> Result<DeliveryReceipt, SubmitError> {
        let (gateway, mail) = {
            let mut shared = self.lock();
            let gateway = shared
                .gateway
                .clone()
                .ok_or(OperationError::NotConfigured)?;

            if shared.status.is_submitting() {
                debug!("submit refused, already in flight");
                return Err(OperationError::AlreadyInFlight.into());
            }

            let report = shared.draft.validate();
            shared.cancel_reset();
            if !report.is_valid() {
                warn!(errors = report.len(), "submit refused, draft is invalid");
                shared.status = SubmissionStatus::Failed(report.summary());
                return Err(SubmitError::Invalid(report));
            }

            shared.status = SubmissionStatus::Submitting;
            (gateway, shared.draft.to_outgoing())
        };

        info!(
            to = %mail.recipient,
            attachments = mail.attachments.len(),
            "submitting draft"
        );

        let in_flight = InFlight::new(self.clone());
        let task = tokio::spawn(async move {
            let result = gateway.send(&mail).await;
            in_flight.complete(&result);
            result
        });

        match task.await {
            Ok(result) => Ok(result?),
            Err(e) => {
                error!(error = %e, "delivery task did not complete");
                Err(DeliveryError::Unspecified.into())
            }
        }
    }

    fn complete(&self, result: &Result<DeliveryReceipt, DeliveryError>) {
        let mut shared = self.lock();
        match result {
            Ok(receipt) => {
                info!(receipt = %receipt.id, "draft delivered");
                shared.status = SubmissionStatus::Succeeded;
                self.schedule_reset(&mut shared);
            }
            Err(e) => {
                warn!(error = %e, "delivery failed, draft kept");
                shared.status = SubmissionStatus::Failed(e.user_message());
            }
        }
    }

    fn schedule_reset(&self, shared: &mut Shared) {
        shared.cancel_reset();
        let epoch = shared.timer_epoch;
        let delay = self.reset_delay;
        let weak = Arc::downgrade(&self.shared);

        shared.reset_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(state) = weak.upgrade() else {
                return;
            };
            let mut shared = state.lock().unwrap_or_else(PoisonError::into_inner);
            if shared.timer_epoch != epoch || shared.status != SubmissionStatus::Succeeded {
                return;
            }
            shared.reset_timer = None;
            shared.clear_draft();
            info!("draft reset after successful delivery");
        }));
        debug!(delay_ms = delay.as_millis() as u64, "auto-reset scheduled");
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Snapshot for rendering.
    pub fn view(&self) -> ComposerView {
        let shared = self.lock();
        ComposerView::new(&shared.draft, &shared.status, shared.gateway.is_some())
    }

    /// Copy of the current draft.
    pub fn draft(&self) -> Draft {
        self.lock().draft.clone()
    }

    pub fn status(&self) -> SubmissionStatus {
        self.lock().status.clone()
    }

    /// Reason of the last failure, present only while `Failed`.
    pub fn last_error(&self) -> Option<String> {
        self.lock().status.last_error().map(str::to_string)
    }

    /// Run every field check on the current draft.
    pub fn validate(&self) -> ValidationReport {
        self.lock().draft.validate()
    }

    /// Returns true if the current draft passes validation.
    pub fn is_valid(&self) -> bool {
        self.validate().is_valid()
    }

    /// Returns true while an auto-reset is waiting to fire.
    pub fn has_pending_reset(&self) -> bool {
        self.lock().reset_timer.is_some()
    }
}

/// Completion guard for a dispatched delivery.
///
/// If the delivery task ends without reporting (panic or runtime
/// shutdown) the draft is marked failed instead of staying in
/// `Submitting` forever.
struct InFlight {
    composer: Composer,
    armed: bool,
}

impl InFlight {
    fn new(composer: Composer) -> Self {
        Self {
            composer,
            armed: true,
        }
    }

    fn complete(mut self, result: &Result<DeliveryReceipt, DeliveryError>) {
        self.armed = false;
        self.composer.complete(result);
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut shared = self.composer.lock();
        if shared.status.is_submitting() {
            error!("delivery ended without a result");
            shared.status = SubmissionStatus::Failed(DeliveryError::Unspecified.user_message());
        }
    }
}
