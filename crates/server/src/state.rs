use chrono::{DateTime, Utc};
use locscout_common::AppConfig;
use locscout_vector::SearchService;
use std::sync::Arc;

/// Shared application state
///
/// Everything here is read-only after startup, so handlers share it without locks.
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,

    /// Search entry point over the loaded corpus
    pub search: Arc<SearchService>,

    /// When the corpus finished loading
    pub loaded_at: DateTime<Utc>,
}

impl AppState {
    /// Create new application state
    pub fn new(config: AppConfig, search: Arc<SearchService>) -> Self {
        Self {
            config,
            search,
            loaded_at: Utc::now(),
        }
    }
}
