//! Application state shared by all connections: configuration and the backend client.
//!
//! Sessions are not stored here; each WebSocket connection opens its own and
//! drops it on disconnect.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::client::{RagBackend, RagClient, TransportError};
use crate::config::AppConfig;
use crate::session::Session;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub backend: Arc<dyn RagBackend>,
}

impl AppState {
    /// Build the HTTP client from config.
    #[instrument(level = "info", skip_all)]
    pub fn new(config: AppConfig) -> Result<Self, TransportError> {
        let client = RagClient::new(&config.backend)?;
        info!(
            target: "rag_frontend",
            backend_url = %client.base_url,
            timeout_secs = config.backend.timeout_secs,
            top_k = config.backend.top_k,
            "RAG backend client ready"
        );
        Ok(Self::with_backend(config, Arc::new(client)))
    }

    pub fn with_backend(config: AppConfig, backend: Arc<dyn RagBackend>) -> Self {
        Self { config, backend }
    }

    pub fn open_session(&self) -> Arc<Session> {
        let session = Arc::new(Session::new(self.backend.clone(), &self.config));
        info!(target: "session", session = %session.id, "Session opened");
        session
    }
}
