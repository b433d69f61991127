use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, header},
};
use tracing::{error, info, warn};

use crate::{
    message::{ChatRequest, ChatResponse},
    services::{
        lead_detector,
        lead_notifier::{LeadEvent, NotifyOutcome},
        metrics_manager::{ChatOutcome, MetricsData},
    },
    state::SharedState,
};

pub const SESSION_COOKIE: &str = "session_id";

pub const EMPTY_MESSAGE_REPLY: &str = "Zəhmət olmasa bir mesaj daxil edin.";
pub const FALLBACK_REPLY: &str = "Sistemdə nasazlıq yarandı.";
pub const SYSTEM_ERROR_REPLY: &str =
    "Sistem xətası. Zəhmət olmasa bir az sonra yenidən cəhd edin.";

/// Value of the cookie `name`, if the request carries one.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
}

fn referer(headers: &HeaderMap) -> String {
    headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

// Always 200: failures are reported in the response text.
pub async fn chat_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Json<ChatResponse> {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => {
            warn!("Unreadable chat request: {rejection}");
            ChatRequest::default()
        }
    };

    let message = payload.message.trim();
    if message.is_empty() {
        state.metrics.record_chat(ChatOutcome::Empty).await;
        return Json(ChatResponse::new(EMPTY_MESSAGE_REPLY));
    }

    let page_url = payload.page_url.unwrap_or_else(|| referer(&headers));
    let session_id = cookie_value(&headers, SESSION_COOKIE).unwrap_or_default();
    info!(session_id = %session_id, "User message: {message}");

    let lead = async {
        if !lead_detector::detect(message) {
            return None;
        }
        info!(session_id = %session_id, "Contact details detected, sending lead email");
        let event = LeadEvent {
            raw_text: message.to_string(),
            page_url: page_url.clone(),
            session_id: session_id.clone(),
        };
        Some(state.notifier.notify(&event).await)
    };

    let (lead_outcome, answer) = tokio::join!(lead, state.retriever.answer(message));

    if let Some(outcome) = lead_outcome {
        state.metrics.record_lead(&outcome).await;
        if let NotifyOutcome::Skipped(reason) = &outcome {
            info!(session_id = %session_id, "Lead not forwarded: {reason}");
        }
    }

    match answer {
        Ok(answer) if answer.trim().is_empty() => {
            warn!(session_id = %session_id, "Model returned an empty answer");
            state.metrics.record_chat(ChatOutcome::EmptyAnswer).await;
            Json(ChatResponse::new(FALLBACK_REPLY))
        }
        Ok(answer) => {
            info!(session_id = %session_id, "RAG response: {answer}");
            state.metrics.record_chat(ChatOutcome::Answered).await;
            Json(ChatResponse::new(answer))
        }
        Err(e) => {
            error!(session_id = %session_id, error = ?e, "Chat error: {e}");
            state.metrics.record_chat(ChatOutcome::RetrievalFailed).await;
            Json(ChatResponse::new(SYSTEM_ERROR_REPLY))
        }
    }
}

pub async fn get_metrics_handler(State(state): State<SharedState>) -> Json<MetricsData> {
    Json(state.metrics.snapshot().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn cookie_value_finds_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session_id=abc-123; lang=az"),
        );
        assert_eq!(cookie_value(&headers, "session_id").as_deref(), Some("abc-123"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn referer_defaults_to_empty() {
        assert_eq!(referer(&HeaderMap::new()), "");
    }
}
