use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::config::AppConfig;
use crate::session::Session;
use crate::submit::{ResultsClient, ServerMetrics};

/// A stored session plus whatever the results collaborator said about it.
pub struct SessionEntry {
    pub session: Session,
    /// Metrics returned by the collaborator after submission, if any.
    pub server_metrics: Option<ServerMetrics>,
    /// Whether submission has been attempted (successfully or not).
    pub submitted: bool,
}

impl SessionEntry {
    pub fn new(session: Session) -> Self {
        SessionEntry {
            session,
            server_metrics: None,
            submitted: false,
        }
    }
}

/// Sessions stored by UUID.
pub type SessionStore = RwLock<HashMap<String, SessionEntry>>;

/// Shared application state passed to all handlers via Axum's State extractor.
pub struct AppState {
    pub sessions: SessionStore,
    pub config: AppConfig,
    pub results: ResultsClient,
    pub start_time: std::time::Instant,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: AppConfig) -> SharedState {
        let results = ResultsClient::new(
            config.results_url.clone(),
            Duration::from_millis(config.submit_timeout_ms),
        );

        Arc::new(AppState {
            sessions: RwLock::new(HashMap::new()),
            config,
            results,
            start_time: std::time::Instant::now(),
        })
    }
}
