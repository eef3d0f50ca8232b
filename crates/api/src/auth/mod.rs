//! Authentication module for ChatRelay
//!
//! Tokens are issued by the external account service; the relay only validates
//! them and trusts the identity they carry.

pub mod jwt;
pub mod middleware;

pub use jwt::{Claims, JwtError, JwtManager};
pub use middleware::{bearer_token, require_admin, AuthIdentity};
