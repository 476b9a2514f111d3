use chrono::Duration;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::{
    api::{ApiClient, Backend},
    auth::{IdentityProvider, Session, SessionStore},
};

/// Shared application context handed to the shell and from there to every view.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub session: Arc<Session>,
    pub backend: Arc<dyn Backend>,
}

impl AppState {
    pub fn new(config: AppConfig, session: Arc<Session>, backend: Arc<dyn Backend>) -> Self {
        Self {
            config: Arc::new(config),
            session,
            backend,
        }
    }

    /// Wire the real identity provider, persisted session and HTTP backend.
    pub fn from_config(config: AppConfig) -> Self {
        let session = Arc::new(
            Session::new(
                IdentityProvider::from_config(&config),
                Duration::seconds(config.token_refresh_leeway_secs),
            )
            .with_store(SessionStore::new(config.session_file.clone())),
        );
        let backend: Arc<dyn Backend> =
            Arc::new(ApiClient::new(&config.api_url).with_session(session.clone()));
        Self::new(config, session, backend)
    }
}
