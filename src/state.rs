//! Shared application state passed to every handler via Axum's `State` extractor.

use std::sync::Arc;

use crate::config::Config;
use crate::imds::IdentitySource;

/// Shared application state for the whoamid server.
///
/// Everything in here is immutable after startup — handlers never coordinate
/// through shared mutable state, so concurrent requests are fully independent.
#[derive(Clone)]
pub struct AppState {
    /// Immutable configuration loaded at startup.
    pub config: Arc<Config>,
    /// Instance identity metadata source queried by `GET /whoami`.
    pub identity: Arc<dyn IdentitySource>,
}

impl AppState {
    pub fn new(config: Config, identity: Arc<dyn IdentitySource>) -> Self {
        Self {
            config: Arc::new(config),
            identity,
        }
    }
}
