use crate::error::LocScoutError;
use std::path::Path;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

const LOG_FILE_NAME: &str = "locscout.log";

/// Initialize logging to both console and `<log_dir>/locscout.log`
///
/// `RUST_LOG` takes precedence over `log_level` when set.
pub fn setup_logging(log_dir: &Path, log_level: &str) -> Result<(), LocScoutError> {
    if !log_dir.exists() {
        std::fs::create_dir_all(log_dir).map_err(|e| {
            LocScoutError::config(format!(
                "Failed to create log directory {}: {}",
                log_dir.display(),
                e
            ))
        })?;
    }

    let log_file_path = log_dir.join(LOG_FILE_NAME);
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)
        .map_err(|e| {
            LocScoutError::config(format!(
                "Failed to open log file {}: {}",
                log_file_path.display(),
                e
            ))
        })?;

    let env_filter = env_filter(log_level)?;

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_filter(env_filter.clone());

    let file_layer = fmt::layer()
        .with_writer(log_file)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_span_events(FmtSpan::CLOSE)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LocScoutError::config(format!("Failed to install logger: {}", e)))?;

    tracing::info!(
        "Logging initialized: level={}, log_file={}",
        log_level,
        log_file_path.display()
    );

    Ok(())
}

/// Console-only logging, used by one-shot CLI commands
///
/// Writes to stderr so command output on stdout stays machine readable.
pub fn setup_console_logging(log_level: &str) -> Result<(), LocScoutError> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_env_filter(env_filter(log_level)?)
        .try_init()
        .map_err(|e| LocScoutError::config(format!("Failed to install logger: {}", e)))?;

    tracing::debug!("Console logging initialized: level={}", log_level);

    Ok(())
}

/// Build the filter from `RUST_LOG`, falling back to the configured level
fn env_filter(log_level: &str) -> Result<EnvFilter, LocScoutError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(log_level).map_err(|e| {
            LocScoutError::config(format!("Invalid log level '{}': {}", log_level, e))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_accepts_levels() {
        for level in ["trace", "debug", "info", "warn", "error", "locscout_vector=debug"] {
            assert!(env_filter(level).is_ok(), "level {} rejected", level);
        }
    }

    #[test]
    fn test_setup_logging_creates_directory() {
        let root = tempfile::TempDir::new().unwrap();
        let dir = root.path().join("log");

        // Another test may already own the global subscriber; only the file
        // side effects are checked here.
        let _ = setup_logging(&dir, "info");

        assert!(dir.join(LOG_FILE_NAME).exists());
    }
}
