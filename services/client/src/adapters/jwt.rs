//! services/client/src/adapters/jwt.rs
//!
//! Reads the claims of the server-issued JWT locally. The signing secret lives
//! only on the server, so the signature is not checked here; the server remains
//! the authority and rejects forged tokens with a 401.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use wildlife_core::domain::DecodedToken;
use wildlife_core::ports::{PortError, PortResult, TokenDecoder};

#[derive(Debug, Deserialize)]
struct Claims {
    exp: i64,
    // Either a string or a numeric user id, depending on the issuer.
    sub: Option<serde_json::Value>,
}

/// Implements the `TokenDecoder` port for HS256-style JWTs.
#[derive(Clone)]
pub struct JwtDecoder {
    validation: Validation,
}

impl JwtDecoder {
    pub fn new() -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        // Expiry is judged by the session manager against its own clock.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();
        Self { validation }
    }
}

impl Default for JwtDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenDecoder for JwtDecoder {
    fn decode(&self, token: &str) -> PortResult<DecodedToken> {
        let data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &self.validation)
            .map_err(|e| PortError::Decode(e.to_string()))?;

        let expires_at = DateTime::<Utc>::from_timestamp(data.claims.exp, 0)
            .ok_or_else(|| PortError::Decode(format!("exp {} is out of range", data.claims.exp)))?;

        let subject = match data.claims.sub {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(s)) => Some(s),
            Some(other) => Some(other.to_string()),
        };

        Ok(DecodedToken { expires_at, subject })
    }
}
