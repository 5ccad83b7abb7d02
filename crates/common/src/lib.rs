pub mod config;
pub mod error;
pub mod logger;

// Re-export commonly used types
pub use config::{AppConfig, DEFAULT_CATEGORIES, DEFAULT_THRESHOLD, DEFAULT_TOP_K};
pub use error::LocScoutError;
pub type Result<T> = std::result::Result<T, LocScoutError>;
