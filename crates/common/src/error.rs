/// LocScout error types
#[derive(Debug, thiserror::Error)]
pub enum LocScoutError {
    /// Corpus could not be loaded or violates row alignment (fatal at startup)
    #[error("Corpus error: {0}")]
    Corpus(String),

    /// Query rejected before or during ranking
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Embedding provider failed to produce a vector
    #[error("Embedding provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// General error (anyhow integration)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LocScoutError {
    /// Create corpus error
    pub fn corpus<S: Into<String>>(msg: S) -> Self {
        Self::Corpus(msg.into())
    }

    /// Create invalid query error
    pub fn invalid_query<S: Into<String>>(msg: S) -> Self {
        Self::InvalidQuery(msg.into())
    }

    /// Create provider unavailable error
    pub fn provider_unavailable<S: Into<String>>(msg: S) -> Self {
        Self::ProviderUnavailable(msg.into())
    }

    /// Create config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error should stop the process from starting
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Corpus(_) | Self::Config(_))
    }
}

impl LocScoutError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidQuery(_) => 400,
            Self::Json(_) => 400,
            Self::ProviderUnavailable(_) => 503,
            Self::Corpus(_) => 500,
            Self::Config(_) => 500,
            Self::Internal(_) => 500,
            Self::Io(_) => 500,
            Self::Other(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(LocScoutError::invalid_query("dim").status_code(), 400);
        assert_eq!(LocScoutError::provider_unavailable("down").status_code(), 503);
        assert_eq!(LocScoutError::corpus("rows").status_code(), 500);
    }

    #[test]
    fn test_fatal_classification() {
        assert!(LocScoutError::corpus("row mismatch").is_fatal());
        assert!(LocScoutError::config("bad port").is_fatal());
        assert!(!LocScoutError::invalid_query("empty").is_fatal());
        assert!(!LocScoutError::provider_unavailable("timeout").is_fatal());
    }

    #[test]
    fn test_display() {
        let err = LocScoutError::provider_unavailable("connection refused");
        assert_eq!(
            err.to_string(),
            "Embedding provider unavailable: connection refused"
        );
    }
}
