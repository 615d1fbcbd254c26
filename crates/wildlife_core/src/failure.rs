//! crates/wildlife_core/src/failure.rs
//!
//! Turns port errors into the single user-facing message the coordinator and
//! the session manager publish. Raw transport errors never cross this boundary.

use crate::ports::{PortError, ValidationIssue};

/// The operation a failure happened in. Wording depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Login,
    Register,
    RestoreSession,
    CurrentUser,
    RegionLookup,
    Catalog,
    AnimalDetail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    NetworkUnreachable,
    Timeout,
    NotFound,
    Unauthorized,
    Forbidden,
    ValidationFailed(ValidationIssue),
    ServerFault,
    DecodeFailure,
    /// A newer session transition overtook the operation.
    Superseded,
    Unexpected,
}

/// A classified failure, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn classify(operation: Operation, error: &PortError) -> Self {
        let kind = match error {
            PortError::NetworkUnreachable(_) => FailureKind::NetworkUnreachable,
            PortError::Timeout => FailureKind::Timeout,
            PortError::NotFound(_) => FailureKind::NotFound,
            PortError::Unauthorized => FailureKind::Unauthorized,
            PortError::Forbidden => FailureKind::Forbidden,
            PortError::Validation(issue) => FailureKind::ValidationFailed(issue.clone()),
            PortError::ServerFault { .. } => FailureKind::ServerFault,
            PortError::Decode(_) => FailureKind::DecodeFailure,
            PortError::Unexpected(_) => FailureKind::Unexpected,
        };
        let message = message_for(operation, &kind);
        Self { kind, message }
    }

    pub(crate) fn superseded() -> Self {
        Self::new(
            FailureKind::Superseded,
            "This request was replaced by a newer one.",
        )
    }

    pub(crate) fn session_expired() -> Self {
        Self::new(
            FailureKind::Unauthorized,
            "Your session has expired. Please log in again.",
        )
    }
}

fn message_for(operation: Operation, kind: &FailureKind) -> String {
    match (kind, operation) {
        (FailureKind::NetworkUnreachable, _) => {
            "Cannot connect to the server. Please try again later.".to_string()
        }
        (FailureKind::Timeout, _) => {
            "The request timed out. Please check if the backend server is running.".to_string()
        }
        (FailureKind::Unauthorized, Operation::Login) => "Invalid email or password".to_string(),
        (FailureKind::Unauthorized, _) => "Your session has expired. Please log in again.".to_string(),
        (FailureKind::Forbidden, _) => "Admin privileges required".to_string(),
        (FailureKind::ValidationFailed(issue), _) => validation_message(issue),
        (FailureKind::DecodeFailure, _) => {
            "Your saved session could not be read. Please log in again.".to_string()
        }
        (FailureKind::NotFound, Operation::RegionLookup) => "Region information not found".to_string(),
        (FailureKind::NotFound, Operation::Catalog) => "No animals found".to_string(),
        (FailureKind::NotFound, Operation::AnimalDetail) => "Animal not found.".to_string(),
        (FailureKind::NotFound, _) => "The requested resource was not found.".to_string(),
        (FailureKind::ServerFault, Operation::Register) => {
            "Server error. Please try again later or contact support if the problem persists."
                .to_string()
        }
        (FailureKind::Superseded, _) => "This request was replaced by a newer one.".to_string(),
        (_, operation) => generic_message(operation).to_string(),
    }
}

fn validation_message(issue: &ValidationIssue) -> String {
    match issue {
        ValidationIssue::EmailTaken => {
            "This email is already registered. Please use a different email or try logging in."
                .to_string()
        }
        ValidationIssue::UsernameTaken => {
            "This username is already taken. Please choose a different username.".to_string()
        }
        ValidationIssue::WeakPassword => {
            "Password must be at least 6 characters long and contain at least one number."
                .to_string()
        }
        ValidationIssue::Other(message) if !message.trim().is_empty() => message.clone(),
        ValidationIssue::Other(_) => {
            "Invalid registration data. Please check your input.".to_string()
        }
    }
}

fn generic_message(operation: Operation) -> &'static str {
    match operation {
        Operation::Login => "Login failed. Please try again.",
        Operation::Register => "Registration failed. Please try again.",
        Operation::RestoreSession | Operation::CurrentUser => {
            "Could not confirm your session. Please log in again."
        }
        Operation::RegionLookup => "Failed to load region information. Please try again later.",
        Operation::Catalog => "Failed to load animals. Please try again later.",
        Operation::AnimalDetail => "Failed to load animal details. Please try again later.",
    }
}
