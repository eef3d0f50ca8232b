//! API routes

pub mod health;
pub mod messages;
pub mod presence;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{auth::require_admin, state::AppState, websocket::ws_handler};

/// Create all API routes
pub fn create_router(state: AppState) -> Router {
    // Health check routes (at root level for infrastructure monitoring)
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/ws", get(ws_handler))
        .route("/api/config/client", get(presence::client_config));

    // Dashboard routes (admin bearer token required)
    let dashboard_routes = Router::new()
        .route("/api/messages/:customer_id", get(messages::list_messages))
        .route("/api/messages/read/:customer_id", put(messages::mark_read))
        .route("/api/conversations", get(messages::list_conversations))
        .route("/api/presence", get(presence::online_presence))
        .layer(middleware::from_fn_with_state(state.jwt.clone(), require_admin));

    Router::new()
        .merge(health_routes)
        .merge(public_routes)
        .merge(dashboard_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_allowed_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::PUT, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
