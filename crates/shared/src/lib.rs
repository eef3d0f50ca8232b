//! ChatRelay Shared Types and Utilities
//!
//! Message model, storage errors and database helpers shared by the relay
//! server and its tooling.

pub mod db;
pub mod error;
pub mod types;

pub use db::*;
pub use error::*;
pub use types::*;
