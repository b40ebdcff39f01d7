//! Test helpers for composer integration tests.
//!
//! Provides a scripted delivery gateway and draft helpers.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use mailcomposer::{
    Composer, ComposerConfig, DeliveryError, DeliveryGateway, DeliveryReceipt, OutgoingMail,
};

/// Reset delay used by the tests (the default).
pub const RESET_DELAY: Duration = Duration::from_millis(3000);

/// Gateway that replays scripted outcomes and records what it was given.
///
/// Once the script runs out every send succeeds.
#[derive(Default)]
pub struct ScriptedGateway {
    script: Mutex<VecDeque<Result<(), DeliveryError>>>,
    sent: Mutex<Vec<OutgoingMail>>,
    calls: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

impl ScriptedGateway {
    /// A gateway that always succeeds.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A gateway that returns `outcomes` in order.
    pub fn with_script(outcomes: Vec<Result<(), DeliveryError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(outcomes.into()),
            ..Self::default()
        })
    }

    /// A gateway whose sends wait until `gate` is notified.
    pub fn held(gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            gate: Some(gate),
            ..Self::default()
        })
    }

    /// Number of send calls.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every message handed to the gateway.
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeliveryGateway for ScriptedGateway {
    async fn send(&self, mail: &OutgoingMail) -> Result<DeliveryReceipt, DeliveryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(mail.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let outcome = self.script.lock().unwrap().pop_front().unwrap_or(Ok(()));
        outcome.map(|_| DeliveryReceipt::now())
    }
}

/// Open a composer with the given gateway and the default reset delay.
pub fn open_composer(gateway: Arc<ScriptedGateway>) -> Composer {
    Composer::open(Some(gateway), &ComposerConfig::default())
}

/// Fill in a valid draft.
pub fn fill_draft(composer: &Composer, recipient: &str, subject: &str, body: &str) {
    composer.set_recipient(recipient).unwrap();
    composer.set_subject(subject).unwrap();
    composer.set_body(body).unwrap();
}

/// Yield until the composer reports an in-flight submission.
pub async fn wait_until_submitting(composer: &Composer) {
    while !composer.status().is_submitting() {
        tokio::task::yield_now().await;
    }
}
