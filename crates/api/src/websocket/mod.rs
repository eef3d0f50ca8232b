//! WebSocket support for the live chat relay
//!
//! Provides the real-time core connecting storefront customers with support
//! admins:
//! - Presence tracking (which customers and admins are connected)
//! - Message relay between a customer and every admin
//! - Typing indicators (receivers expire them on their own)
//!
//! # Architecture
//!
//! - **Connection**: A socket bound to one customer or admin identity
//! - **Registry**: Party id -> live connection, last join wins
//! - **Relay**: Per-event state machine computing appends and fanout
//! - **Handler**: Axum WebSocket route handler
//! - **Events**: Type-safe event definitions for client/server communication

pub mod connection;
pub mod events;
pub mod handler;
pub mod registry;
pub mod relay;

pub use handler::ws_handler;
pub use registry::ConnectionRegistry;
pub use relay::RelayEngine;
