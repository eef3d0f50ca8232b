//! Message history routes for the admin dashboard

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use chatrelay_shared::{ChatMessage, ConversationSummary, CustomerId};
use serde::Serialize;

use crate::{
    auth::AuthIdentity,
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub message: String,
    pub updated: u64,
}

fn customer_id_from_path(raw: String) -> ApiResult<CustomerId> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation("customer id is required".into()));
    }
    Ok(CustomerId::from(trimmed))
}

/// GET /api/messages/:customer_id - thread history, oldest first
pub async fn list_messages(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> ApiResult<Json<Vec<ChatMessage>>> {
    let customer_id = customer_id_from_path(customer_id)?;
    let messages = state.store.list_by_party(&customer_id).await?;
    Ok(Json(messages))
}

/// GET /api/conversations - one summary per customer thread
pub async fn list_conversations(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<ConversationSummary>>> {
    let conversations = state.store.list_conversations().await?;
    Ok(Json(conversations))
}

/// PUT /api/messages/read/:customer_id - acknowledge customer messages
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthIdentity>,
    Path(customer_id): Path<String>,
) -> ApiResult<Json<MarkReadResponse>> {
    let customer_id = customer_id_from_path(customer_id)?;
    let updated = state.store.mark_read(&customer_id).await?;

    tracing::info!(
        customer_id = %customer_id,
        admin_id = %admin.party_id,
        updated,
        "Messages marked as read"
    );

    Ok(Json(MarkReadResponse {
        message: "Messages marked as read".to_string(),
        updated,
    }))
}
