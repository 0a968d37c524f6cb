//! Chat handlers: the rule-based financial assistant

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState};
use finlytics_core::chat::{self, ChatContext};
use finlytics_core::models::User;

#[derive(Serialize)]
pub struct ChatInfoResponse {
    pub greeting: &'static str,
    pub suggestions: &'static [&'static str],
}

/// GET /api/chat - Greeting and canned question suggestions
pub async fn chat_info() -> Json<ChatInfoResponse> {
    Json(ChatInfoResponse {
        greeting: chat::greeting(),
        suggestions: chat::suggested_questions(),
    })
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// POST /api/chat - Answer a question from the owner's aggregates
pub async fn chat_message(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if req.message.trim().is_empty() {
        return Err(AppError::bad_request("Message must not be empty"));
    }

    let transactions = state.db.list_transactions(user.id)?;
    let context = ChatContext::from_transactions(&transactions);
    let reply = chat::respond(&req.message, &context);

    Ok(Json(ChatResponse { reply }))
}
