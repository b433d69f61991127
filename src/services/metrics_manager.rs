// src/services/metrics_manager.rs
//! In-memory outcome counters served on `/admin/metrics`.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::lead_notifier::NotifyOutcome;

/// How a `/chat` request was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatOutcome {
    /// Blank message, short-circuited before retrieval.
    Empty,
    Answered,
    /// The model answered with whitespace; the fallback text was sent.
    EmptyAnswer,
    RetrievalFailed,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ChatCounters {
    pub empty: u64,
    pub answered: u64,
    pub empty_answer: u64,
    pub retrieval_failed: u64,
}

impl ChatCounters {
    fn slot(&mut self, outcome: ChatOutcome) -> &mut u64 {
        match outcome {
            ChatOutcome::Empty => &mut self.empty,
            ChatOutcome::Answered => &mut self.answered,
            ChatOutcome::EmptyAnswer => &mut self.empty_answer,
            ChatOutcome::RetrievalFailed => &mut self.retrieval_failed,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct LeadCounters {
    pub sent: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl LeadCounters {
    fn slot(&mut self, outcome: &NotifyOutcome) -> &mut u64 {
        match outcome {
            NotifyOutcome::Sent => &mut self.sent,
            NotifyOutcome::Skipped(_) => &mut self.skipped,
            NotifyOutcome::Failed(_) => &mut self.failed,
        }
    }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct MetricsData {
    pub chat_outcomes: ChatCounters,
    pub lead_outcomes: LeadCounters,
}

#[derive(Debug, Clone, Default)]
pub struct MetricsManager {
    inner: Arc<RwLock<MetricsData>>,
}

impl MetricsManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_chat(&self, outcome: ChatOutcome) {
        *self.inner.write().await.chat_outcomes.slot(outcome) += 1;
    }

    pub async fn record_lead(&self, outcome: &NotifyOutcome) {
        *self.inner.write().await.lead_outcomes.slot(outcome) += 1;
    }

    pub async fn snapshot(&self) -> MetricsData {
        self.inner.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::lead_notifier::SkipReason;

    #[tokio::test]
    async fn each_outcome_has_its_own_counter() {
        let metrics = MetricsManager::new();
        metrics.record_chat(ChatOutcome::Answered).await;
        metrics.record_chat(ChatOutcome::Answered).await;
        metrics.record_chat(ChatOutcome::RetrievalFailed).await;
        metrics
            .record_lead(&NotifyOutcome::Skipped(SkipReason::InvalidPort("x".to_string())))
            .await;

        let data = metrics.snapshot().await;
        assert_eq!(
            data.chat_outcomes,
            ChatCounters { answered: 2, retrieval_failed: 1, ..Default::default() }
        );
        assert_eq!(data.lead_outcomes, LeadCounters { skipped: 1, ..Default::default() });
    }

    #[tokio::test]
    async fn snapshot_serializes_every_counter() {
        let metrics = MetricsManager::new();
        metrics.record_lead(&NotifyOutcome::Sent).await;

        let json = serde_json::to_value(metrics.snapshot().await).unwrap();
        assert_eq!(json["lead_outcomes"]["sent"], 1);
        assert_eq!(json["lead_outcomes"]["failed"], 0);
        assert_eq!(json["chat_outcomes"]["empty_answer"], 0);
    }
}
