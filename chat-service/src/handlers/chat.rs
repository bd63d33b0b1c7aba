use crate::dtos::{ChatContent, ChatQuery};
use crate::services::providers::GenerationParams;
use crate::startup::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use service_core::error::AppError;

/// Relay one user message to the chat model.
///
/// Every call opens its own session; nothing is kept between requests.
/// The query is read as raw pairs so a repeated `user_input` cannot fail
/// extraction.
#[tracing::instrument(skip_all)]
pub async fn palm2(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<ChatContent>, AppError> {
    let query = ChatQuery::from_pairs(pairs);

    let mut session = state.chat_model.start_chat().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to start chat session");
        AppError::from(e)
    })?;

    let reply = session
        .send_message(&query.user_input, &GenerationParams::CHAT_DEFAULTS)
        .await
        .map_err(|e| {
            tracing::error!(
                session_id = %session.id(),
                model = %state.chat_model.model_name(),
                error = %e,
                "Chat model request failed"
            );
            AppError::from(e)
        })?;

    tracing::info!(
        session_id = %session.id(),
        input_len = query.user_input.len(),
        reply_len = reply.text.len(),
        blocked = reply.blocked,
        "Chat reply relayed"
    );

    Ok(Json(ChatContent {
        content: reply.text,
    }))
}
