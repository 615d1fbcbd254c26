//! services/client/src/error.rs
//!
//! Defines the primary error type for the client service.

use crate::config::ConfigError;
use wildlife_core::failure::Failure;
use wildlife_core::ports::PortError;

/// The primary error type for the `client` service.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// A classified failure from the session manager or the region coordinator.
    #[error("{0}")]
    Failed(#[from] Failure),

    /// Represents an error from building the HTTP client.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Represents a malformed region definition file.
    #[error("Region data error: {0}")]
    Regions(#[from] serde_json::Error),

    /// Represents a standard Input/Output error (e.g., reading a region file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Represents a generic internal error, often used for startup logic failures.
    #[error("Internal error: {0}")]
    Internal(String),
}
