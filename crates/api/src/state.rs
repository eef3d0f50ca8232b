//! Shared application state

use std::sync::Arc;

use crate::auth::JwtManager;
use crate::config::Config;
use crate::store::MessageStore;
use crate::websocket::{ConnectionRegistry, RelayEngine};

/// Token lifetime used when the operator tool issues credentials
const TOKEN_EXPIRY_HOURS: i64 = 24;

/// State shared by every route and socket
///
/// Created once at startup; dropping the last clone tears down the registry.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn MessageStore>,
    pub registry: Arc<ConnectionRegistry>,
    pub relay: RelayEngine,
    pub jwt: JwtManager,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn MessageStore>) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let relay = RelayEngine::new(Arc::clone(&registry), Arc::clone(&store));
        let jwt = JwtManager::new(&config.jwt_secret, TOKEN_EXPIRY_HOURS);

        Self {
            config: Arc::new(config),
            store,
            registry,
            relay,
            jwt,
        }
    }
}
