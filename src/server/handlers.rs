//! Indexing endpoint handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::crawler::CoordinatorError;

/// Uniform envelope returned by every indexing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexingResponse {
    pub result: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IndexingResponse {
    pub fn ok() -> Self {
        Self {
            result: true,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            result: false,
            error: Some(message.into()),
        }
    }
}

impl From<Result<(), CoordinatorError>> for IndexingResponse {
    fn from(outcome: Result<(), CoordinatorError>) -> Self {
        match outcome {
            Ok(()) => Self::ok(),
            Err(e) => Self::failed(e.to_string()),
        }
    }
}

/// Starts a full indexing run; the run continues after the response.
pub async fn start_indexing(State(state): State<AppState>) -> impl IntoResponse {
    let outcome = state.coordinator.start().map(|handle| {
        tracing::debug!("Run {} started over HTTP", handle.id());
    });
    (StatusCode::OK, Json(IndexingResponse::from(outcome)))
}

/// Stops the active indexing run.
pub async fn stop_indexing(State(state): State<AppState>) -> impl IntoResponse {
    let outcome = state.coordinator.stop();
    (StatusCode::OK, Json(IndexingResponse::from(outcome)))
}

/// Indexes a single page and waits for it to finish.
///
/// The body is the page URL, either raw or form encoded as `url=<...>`.
pub async fn index_page(State(state): State<AppState>, body: String) -> impl IntoResponse {
    let url = page_url_from_body(&body);
    let outcome = state.coordinator.index_page(&url).await;
    if let Err(e) = &outcome {
        tracing::warn!("indexPage {} failed: {}", url, e);
    }
    (StatusCode::CREATED, Json(IndexingResponse::from(outcome)))
}

fn page_url_from_body(body: &str) -> String {
    let body = body.trim();
    if body.starts_with("url=") {
        if let Some((_, value)) = url::form_urlencoded::parse(body.as_bytes())
            .find(|(key, _)| key == "url")
        {
            return value.trim().to_string();
        }
    }
    body.to_string()
}
