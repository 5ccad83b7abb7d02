use chrono::{DateTime, Utc};
use locscout_vector::LocationResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Search request body
#[derive(Debug, Deserialize)]
pub struct SearchBody {
    /// Search query text
    #[serde(default)]
    pub query: String,

    /// Embedding category (defaults to "full")
    pub category: Option<String>,

    /// Top K results (defaults to the configured limit)
    pub top_k: Option<usize>,

    /// Minimum cosine similarity (defaults to the configured threshold)
    pub threshold: Option<f32>,
}

/// Search response
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<LocationResult>,
    pub query: String,
    pub count: usize,
}

/// Categories response
#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<String>,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,

    /// Metadata rows in the corpus
    pub records: usize,

    /// Category name -> embedding dimension
    pub categories: BTreeMap<String, usize>,

    pub embedding_model: String,

    pub loaded_at: DateTime<Utc>,
}

/// Error body for request-level failures
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
