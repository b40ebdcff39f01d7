//! Sent mail history.
//!
//! Every delivery attempt, successful or not, can be recorded here and
//! queried by a sent-mail view. Records are kept in memory only.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::types::{DeliveryError, DeliveryGateway, DeliveryReceipt, OutgoingMail};
use crate::attachment::AttachmentSummary;

/// Outcome of a recorded delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeliveryStatus {
    Sent,
    Failed,
}

/// A recorded delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentMail {
    pub recipient: String,
    pub subject: String,
    pub sent_at: DateTime<Utc>,
    pub status: DeliveryStatus,
    pub attachments: Vec<AttachmentSummary>,
    /// Failure reason for failed attempts.
    pub error: Option<String>,
}

impl SentMail {
    /// Record of a successful delivery.
    pub fn sent(mail: &OutgoingMail, sent_at: DateTime<Utc>) -> Self {
        Self::from_mail(mail, sent_at, DeliveryStatus::Sent, None)
    }

    /// Record of a failed delivery.
    pub fn failed(mail: &OutgoingMail, error: &DeliveryError) -> Self {
        Self::from_mail(
            mail,
            Utc::now(),
            DeliveryStatus::Failed,
            Some(error.user_message()),
        )
    }

    fn from_mail(
        mail: &OutgoingMail,
        sent_at: DateTime<Utc>,
        status: DeliveryStatus,
        error: Option<String>,
    ) -> Self {
        Self {
            recipient: mail.recipient.clone(),
            subject: mail.subject.clone(),
            sent_at,
            status,
            attachments: mail.attachments.iter().map(|a| a.summary()).collect(),
            error,
        }
    }

    fn matches(&self, query: &str) -> bool {
        self.recipient.to_lowercase().contains(query) || self.subject.to_lowercase().contains(query)
    }
}

/// Aggregate figures over the history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HistoryStats {
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    /// Timestamp of the most recent attempt.
    pub last_sent: Option<DateTime<Utc>>,
    /// Attempts per recipient.
    pub recipients: HashMap<String, usize>,
}

/// In-memory record of delivery attempts.
#[derive(Debug)]
pub struct SentHistory {
    entries: RwLock<VecDeque<SentMail>>,
    max_entries: usize,
}

impl SentHistory {
    /// Create a history holding at most `max_entries` records.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::new()),
            max_entries: max_entries.max(1),
        }
    }

    /// Append a record, dropping the oldest if full.
    pub fn record(&self, mail: SentMail) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.len() >= self.max_entries {
            entries.pop_front();
        }
        entries.push_back(mail);
    }

    /// All records, freshest first.
    pub fn list_sent(&self) -> Vec<SentMail> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.iter().rev().cloned().collect()
    }

    /// Records whose recipient or subject contains `query`, ignoring case.
    ///
    /// An empty query returns everything.
    pub fn search(&self, query: &str) -> Vec<SentMail> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.list_sent();
        }

        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .iter()
            .rev()
            .filter(|mail| mail.matches(&query))
            .cloned()
            .collect()
    }

    /// Totals, per-recipient counts and the latest timestamp.
    pub fn stats(&self) -> HistoryStats {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut stats = HistoryStats {
            total: entries.len(),
            ..HistoryStats::default()
        };

        for mail in entries.iter() {
            match mail.status {
                DeliveryStatus::Sent => stats.sent += 1,
                DeliveryStatus::Failed => stats.failed += 1,
            }
            *stats.recipients.entry(mail.recipient.clone()).or_default() += 1;
            if stats.last_sent.map_or(true, |last| mail.sent_at > last) {
                stats.last_sent = Some(mail.sent_at);
            }
        }

        stats
    }

    /// Remove every record.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SentHistory {
    fn default() -> Self {
        Self::new(500)
    }
}

/// Gateway decorator that records every attempt in a [`SentHistory`].
pub struct RecordingGateway<G> {
    inner: G,
    history: Arc<SentHistory>,
}

impl<G: DeliveryGateway> RecordingGateway<G> {
    /// Wrap `inner`, recording into `history`.
    pub fn new(inner: G, history: Arc<SentHistory>) -> Self {
        Self { inner, history }
    }

    /// The shared history.
    pub fn history(&self) -> &Arc<SentHistory> {
        &self.history
    }

    /// The wrapped gateway.
    pub fn inner(&self) -> &G {
        &self.inner
    }
}

#[async_trait]
impl<G: DeliveryGateway> DeliveryGateway for RecordingGateway<G> {
    async fn send(&self, mail: &OutgoingMail) -> Result<DeliveryReceipt, DeliveryError> {
        let result = self.inner.send(mail).await;
        let record = match &result {
            Ok(receipt) => SentMail::sent(mail, receipt.sent_at),
            Err(e) => SentMail::failed(mail, e),
        };
        debug!(to = %record.recipient, status = ?record.status, "recorded delivery attempt");
        self.history.record(record);
        result
    }

    async fn test_connection(&self) -> Result<(), DeliveryError> {
        self.inner.test_connection().await
    }
}
