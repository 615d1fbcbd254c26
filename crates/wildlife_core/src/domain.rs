//! crates/wildlife_core/src/domain.rs
//!
//! Defines the pure, core data structures for the wildlife client.
//! These structs are independent of any transport or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;

//=========================================================================================
// Identifiers
//=========================================================================================

/// Identifier of a region on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(pub u32);

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an animal record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimalId(pub u32);

impl fmt::Display for AnimalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//=========================================================================================
// Wildlife
//=========================================================================================

/// A single species as returned by the wildlife API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimalRecord {
    pub id: AnimalId,
    pub common_name: String,
    pub scientific_name: Option<String>,
    /// Free-text conservation status, e.g. "Critically Endangered".
    pub risk_label: Option<String>,
    pub regions: Vec<RegionId>,
    pub kind: Option<String>,
    pub habitat: Option<String>,
    pub description: Option<String>,
    /// Free-text distribution, e.g. "Northern and eastern rainforests".
    pub distribution: Option<String>,
    pub image_url: Option<String>,
}

impl AnimalRecord {
    /// Creates a record with only the fields needed for classification.
    pub fn new(id: u32, common_name: impl Into<String>, risk_label: impl Into<String>) -> Self {
        Self {
            id: AnimalId(id),
            common_name: common_name.into(),
            scientific_name: None,
            risk_label: Some(risk_label.into()),
            regions: Vec::new(),
            kind: None,
            habitat: None,
            description: None,
            distribution: None,
            image_url: None,
        }
    }

    pub fn risk_label(&self) -> &str {
        self.risk_label.as_deref().unwrap_or("")
    }

    pub fn scientific_name(&self) -> &str {
        self.scientific_name.as_deref().unwrap_or("")
    }
}

/// A static region of the map. The boundary key points into a geometry source
/// owned by the presentation layer and is never interpreted here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionDescriptor {
    pub id: RegionId,
    pub name: String,
    pub description: String,
    pub boundary_key: String,
    /// Lowercase fragments of distribution text that place an animal in this region.
    pub keywords: Vec<String>,
}

/// The payload of a region-scoped retrieval.
#[derive(Debug, Clone)]
pub struct RegionAnimals {
    pub region: RegionId,
    pub name: String,
    pub description: String,
    pub animals: Vec<AnimalRecord>,
}

//=========================================================================================
// Authentication
//=========================================================================================

/// The authenticated user as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub role: Option<String>,
}

impl UserSummary {
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some("admin")
    }
}

// Only used for the credential exchange - contains sensitive data
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewAccount")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// An opaque bearer token. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Value for an `Authorization` header.
    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(..)")
    }
}

/// A token together with the user it was issued for.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: BearerToken,
    pub user: UserSummary,
}

/// Claims read from a token without verifying its signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedToken {
    pub expires_at: DateTime<Utc>,
    pub subject: Option<String>,
}

impl DecodedToken {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn bearer_token_debug_hides_secret() {
        let token = BearerToken::new("secret-value");
        assert_eq!(format!("{:?}", token), "BearerToken(..)");
        assert_eq!(token.header_value(), "Bearer secret-value");
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials {
            email: "a@b.c".to_string(),
            password: "hunter2".to_string(),
        };
        assert!(!format!("{:?}", creds).contains("hunter2"));
    }

    #[test]
    fn token_expiring_now_counts_as_expired() {
        let now = Utc::now();
        let token = DecodedToken { expires_at: now, subject: None };
        assert!(token.is_expired_at(now));
        assert!(!token.is_expired_at(now - Duration::seconds(1)));
    }

    #[test]
    fn admin_role_is_detected() {
        let mut user = UserSummary {
            id: 1,
            username: "ranger".to_string(),
            email: "ranger@example.org".to_string(),
            role: Some("user".to_string()),
        };
        assert!(!user.is_admin());
        user.role = Some("admin".to_string());
        assert!(user.is_admin());
    }
}
