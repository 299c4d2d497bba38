//! Application state and shared resources.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::store::{MemoryStore, VerificationStore};
use crate::token::TokenService;
use crate::verification::{CodeNotifier, EngineConfig, LogNotifier, VerificationEngine};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Verification engine (owns the store and token service)
    pub engine: Arc<VerificationEngine>,
}

impl AppState {
    /// Build state with the in-memory store and log-only code delivery
    pub fn new(config: &AppConfig) -> Self {
        let store: Arc<dyn VerificationStore> = Arc::new(MemoryStore::new());
        let notifier: Arc<dyn CodeNotifier> =
            Arc::new(LogNotifier::new(config.verification.reveal_codes));
        Self::with_parts(config, store, notifier)
    }

    /// Build state around explicit store and notifier implementations
    pub fn with_parts(
        config: &AppConfig,
        store: Arc<dyn VerificationStore>,
        notifier: Arc<dyn CodeNotifier>,
    ) -> Self {
        let tokens = Arc::new(TokenService::new(&config.token.secret));

        let engine = VerificationEngine::new(
            EngineConfig {
                policy: config.verification.code.clone(),
                create_on_verify: config.verification.create_on_verify,
                wifi_password: config.wifi.password.clone(),
                session_ttl_secs: config.token.ttl_secs,
            },
            store,
            tokens,
            notifier,
        );

        Self {
            engine: Arc::new(engine),
        }
    }
}
