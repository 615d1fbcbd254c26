//! crates/wildlife_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the client's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the HTTP transport, the token format and the storage medium.

use async_trait::async_trait;
use std::fmt;

use crate::domain::{
    AnimalId, AnimalRecord, BearerToken, Credentials, DecodedToken, IssuedToken, NewAccount,
    RegionAnimals, RegionId, UserSummary,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// Which registration field the server rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmailTaken,
    UsernameTaken,
    WeakPassword,
    Other(String),
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmailTaken => f.write_str("email already registered"),
            ValidationIssue::UsernameTaken => f.write_str("username already taken"),
            ValidationIssue::WeakPassword => f.write_str("password too weak"),
            ValidationIssue::Other(message) => f.write_str(message),
        }
    }
}

/// The error type for all port operations.
/// Adapters translate their transport-specific failures into these variants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Network unreachable: {0}")]
    NetworkUnreachable(String),
    #[error("Request timed out")]
    Timeout,
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden")]
    Forbidden,
    #[error("Validation failed: {0}")]
    Validation(ValidationIssue),
    #[error("Server fault ({status}): {message}")]
    ServerFault { status: u16, message: String },
    #[error("Token could not be decoded: {0}")]
    Decode(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait WildlifeApi: Send + Sync {
    async fn fetch_all_animals(&self, auth: Option<&BearerToken>) -> PortResult<Vec<AnimalRecord>>;

    /// Returns `PortError::NotFound` when the server has no such region.
    async fn fetch_region_animals(
        &self,
        region: RegionId,
        auth: Option<&BearerToken>,
    ) -> PortResult<RegionAnimals>;

    async fn fetch_animal(&self, id: AnimalId, auth: Option<&BearerToken>) -> PortResult<AnimalRecord>;
}

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn exchange_credentials(&self, credentials: &Credentials) -> PortResult<IssuedToken>;

    async fn create_account(&self, account: &NewAccount) -> PortResult<()>;

    /// The "who am I" call. Requires a valid token.
    async fn fetch_current_user(&self, auth: &BearerToken) -> PortResult<UserSummary>;
}

/// Reads claims from a token locally, without a network round-trip.
pub trait TokenDecoder: Send + Sync {
    fn decode(&self, token: &str) -> PortResult<DecodedToken>;
}

/// Persists exactly one token string across process restarts.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> PortResult<Option<String>>;
    fn save(&self, token: &str) -> PortResult<()>;
    fn clear(&self) -> PortResult<()>;
}
