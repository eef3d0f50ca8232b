//! Presence snapshot and client settings

use axum::{extract::State, Json};
use chatrelay_shared::PartyKind;
use serde::Serialize;

use crate::state::AppState;
use crate::websocket::registry::PresenceEntry;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceResponse {
    pub customers: Vec<PresenceEntry>,
    pub admins_online: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfigResponse {
    /// How long a receiver shows a typing indicator before clearing it
    pub typing_indicator_ttl_secs: u64,
}

/// GET /api/presence - customers currently connected
pub async fn online_presence(State(state): State<AppState>) -> Json<PresenceResponse> {
    let customers = state.registry.online(PartyKind::Customer).await;
    let admins_online = state.registry.stats().await.admins_online;

    Json(PresenceResponse {
        customers,
        admins_online,
    })
}

/// GET /api/config/client
pub async fn client_config(State(state): State<AppState>) -> Json<ClientConfigResponse> {
    Json(ClientConfigResponse {
        typing_indicator_ttl_secs: state.config.typing_indicator_ttl_secs,
    })
}
