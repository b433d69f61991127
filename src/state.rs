// src/state.rs
use std::sync::Arc;

use crate::services::lead_notifier::LeadNotifier;
use crate::services::metrics_manager::MetricsManager;
use crate::services::retriever::AnswerService;

pub type SharedState = Arc<AppState>;

/// Dependencies built once at startup and shared read-only by every request.
pub struct AppState {
    pub retriever: Arc<dyn AnswerService>,
    pub notifier: LeadNotifier,
    pub metrics: MetricsManager,
    pub admin_key: Option<String>,
}

impl AppState {
    pub fn new(retriever: Arc<dyn AnswerService>, notifier: LeadNotifier) -> Self {
        Self {
            retriever,
            notifier,
            metrics: MetricsManager::new(),
            admin_key: None,
        }
    }

    pub fn with_admin_key(mut self, key: Option<String>) -> Self {
        self.admin_key = key;
        self
    }
}
