use crate::error::LocScoutError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Categories looked for in the data directory when none are configured
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "full",
    "colors",
    "materials",
    "architecture",
    "aesthetics",
    "landscaping",
    "mood_vibes",
];

/// Result limit when a request omits `top_k`
pub const DEFAULT_TOP_K: usize = 100;

/// Minimum cosine similarity when a request omits `threshold`
pub const DEFAULT_THRESHOLD: f32 = 0.2;

/// LocScout application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the metadata CSV and `<category>_vectors.npy` files
    pub data_dir: PathBuf,

    /// Metadata CSV file name inside `data_dir`
    pub metadata_file: String,

    /// Categories to load from `data_dir`
    pub categories: Vec<String>,

    /// Embedding API base URL (Ollama-compatible)
    pub embedding_base_url: String,

    /// Embedding model name
    pub embedding_model: String,

    /// HTTP client timeout for embedding requests, in seconds
    pub embedding_timeout_secs: u64,

    /// Server bind address
    pub server_host: String,

    /// Server port
    pub server_port: u16,

    /// CORS origins allowed to call the API
    pub allowed_origins: Vec<String>,

    /// Log directory
    pub log_dir: PathBuf,

    /// Log level
    pub log_level: String,

    /// Result limit used when a request omits `top_k`
    pub default_top_k: usize,

    /// Score threshold used when a request omits `threshold`
    pub default_threshold: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            metadata_file: "metadata_with_coordinates.csv".to_string(),
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            embedding_base_url: "http://localhost:11434".to_string(),
            embedding_model: "all-minilm".to_string(),
            embedding_timeout_secs: 30,
            server_host: "127.0.0.1".to_string(),
            server_port: 5000,
            allowed_origins: vec!["http://localhost:5173".to_string()],
            log_dir: PathBuf::from("./data/log"),
            log_level: "info".to_string(),
            default_top_k: DEFAULT_TOP_K,
            default_threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and .env file
    ///
    /// The `.env` file is looked up in the working directory and its parents.
    pub fn from_env() -> Result<Self, LocScoutError> {
        if let Ok(path) = dotenv::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }

        let defaults = Self::default();

        let config = Self {
            data_dir: Self::get_env_path("DATA_DIR").unwrap_or(defaults.data_dir),
            metadata_file: std::env::var("METADATA_FILE").unwrap_or(defaults.metadata_file),
            categories: Self::get_env_list("CATEGORIES").unwrap_or(defaults.categories),
            embedding_base_url: std::env::var("EMBEDDING_BASE_URL")
                .unwrap_or(defaults.embedding_base_url),
            embedding_model: std::env::var("EMBEDDING_MODEL")
                .unwrap_or(defaults.embedding_model),
            embedding_timeout_secs: Self::get_env_parsed("EMBEDDING_TIMEOUT_SECS")?
                .unwrap_or(defaults.embedding_timeout_secs),
            server_host: std::env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: Self::get_env_parsed("SERVER_PORT")?.unwrap_or(defaults.server_port),
            allowed_origins: Self::get_env_list("ALLOWED_ORIGINS")
                .unwrap_or(defaults.allowed_origins),
            log_dir: Self::get_env_path("LOG_DIR").unwrap_or(defaults.log_dir),
            log_level: std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            default_top_k: Self::get_env_parsed("DEFAULT_TOP_K")?
                .unwrap_or(defaults.default_top_k),
            default_threshold: Self::get_env_parsed("DEFAULT_THRESHOLD")?
                .unwrap_or(defaults.default_threshold),
        };

        config.validate()?;

        Ok(config)
    }

    /// Get PathBuf from environment variable
    fn get_env_path(key: &str) -> Option<PathBuf> {
        std::env::var(key).ok().map(PathBuf::from)
    }

    /// Get a comma separated list from environment variable
    fn get_env_list(key: &str) -> Option<Vec<String>> {
        std::env::var(key).ok().map(|raw| parse_list(&raw))
    }

    /// Parse an environment variable, failing loudly on malformed values
    fn get_env_parsed<T: std::str::FromStr>(key: &str) -> Result<Option<T>, LocScoutError> {
        match std::env::var(key) {
            Ok(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| LocScoutError::config(format!("{} has invalid value '{}'", key, raw))),
            Err(_) => Ok(None),
        }
    }

    /// Get full path of the metadata CSV
    pub fn metadata_path(&self) -> PathBuf {
        self.data_dir.join(&self.metadata_file)
    }

    /// Get full path of a category's vector file
    pub fn vectors_path(&self, category: &str) -> PathBuf {
        self.data_dir.join(format!("{}_vectors.npy", category))
    }

    /// Get server bind address (host:port)
    pub fn server_bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), LocScoutError> {
        if self.metadata_file.trim().is_empty() {
            return Err(LocScoutError::config("Metadata file name cannot be empty"));
        }

        if self.embedding_model.is_empty() {
            return Err(LocScoutError::config("Embedding model name cannot be empty"));
        }

        if !self.embedding_base_url.starts_with("http://")
            && !self.embedding_base_url.starts_with("https://")
        {
            return Err(LocScoutError::config(
                "Embedding base URL must start with http:// or https://",
            ));
        }

        if self.server_port == 0 {
            return Err(LocScoutError::config("Server port cannot be 0"));
        }

        if self.default_top_k == 0 {
            return Err(LocScoutError::config("Default top_k must be at least 1"));
        }

        if !(-1.0..=1.0).contains(&self.default_threshold) {
            return Err(LocScoutError::config(
                "Default threshold must be within [-1, 1]",
            ));
        }

        Ok(())
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
