//! ChatRelay API Library
//!
//! Live support chat between storefront customers and dashboard admins:
//! the WebSocket relay core, the message store gateway and the dashboard
//! HTTP routes.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod store;
pub mod websocket;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use state::AppState;
