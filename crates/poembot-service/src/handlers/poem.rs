//! Random poem handler.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use poembot_core::{truncate_chars, MAX_RESPONSE_CHARS};

use crate::error::ApiError;
use crate::state::AppState;

/// Poem response body.
#[derive(Debug, Serialize)]
pub struct PoemResponse<'a> {
    /// Poem text, at most 1000 characters.
    pub text: &'a str,
}

/// Return a random poem.
///
/// The body is JSON but the content type is `text/plain`; existing clients
/// depend on that header.
pub async fn get_poem(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let poem = state.poems.read_random_in(state.config.read_range)?;
    let text = truncate_chars(&poem, MAX_RESPONSE_CHARS);

    let body = serde_json::to_string(&PoemResponse { text })
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    tracing::debug!(chars = text.chars().count(), truncated = text.len() < poem.len(), "Poem served");

    Ok(([(header::CONTENT_TYPE, "text/plain")], body).into_response())
}
