//! services/api/src/error.rs
//!
//! Errors that stop the service from starting or serving.
//! Request-level failures are mapped to status codes in the handlers instead.

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Binding the listener or serving connections failed.
    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}
