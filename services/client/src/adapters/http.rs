//! services/client/src/adapters/http.rs
//!
//! This module contains the adapter for the wildlife REST API.
//! It implements the `WildlifeApi` and `AuthApi` ports from the `core` crate.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};
use wildlife_core::domain::{
    AnimalId, AnimalRecord, BearerToken, Credentials, IssuedToken, NewAccount, RegionAnimals,
    RegionId, UserSummary,
};
use wildlife_core::ports::{AuthApi, PortError, PortResult, ValidationIssue, WildlifeApi};

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Debug, Deserialize)]
struct AnimalDto {
    id: u32,
    name: String,
    scientific_name: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    risk_level: Option<String>,
    description: Option<String>,
    /// Free-text distribution, e.g. "Northern and eastern rainforests".
    region: Option<String>,
    habitat: Option<String>,
    image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnimalListDto {
    items: Vec<AnimalDto>,
    total: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RegionDto {
    id: u32,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    animals: Vec<AnimalDto>,
}

#[derive(Debug, Deserialize)]
struct UserDto {
    id: u64,
    username: String,
    email: String,
    role: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginDto {
    token: String,
    user: UserDto,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

impl From<UserDto> for UserSummary {
    fn from(dto: UserDto) -> Self {
        Self {
            id: dto.id,
            username: dto.username,
            email: dto.email,
            role: dto.role,
        }
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that talks to the wildlife REST API over HTTP.
///
/// Every request is built from the token passed in for that call; the client
/// itself carries no default `Authorization` header.
#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    /// Creates a new `HttpApi` whose requests time out after `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str, auth: Option<&BearerToken>) -> RequestBuilder {
        let request = self.client.get(self.url(path));
        match auth {
            Some(token) => request.bearer_auth(token.expose()),
            None => request,
        }
    }

    /// Sends the request and decodes a successful JSON body, mapping every
    /// other outcome onto `PortError`.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> PortResult<T> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| PortError::Unexpected(format!("Malformed response body: {}", e)));
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(status, &body);
        debug!(status = status.as_u16(), %message, "API returned an error status");
        Err(classify_status(status, message))
    }

    fn record(&self, dto: AnimalDto) -> AnimalRecord {
        AnimalRecord {
            id: AnimalId(dto.id),
            common_name: dto.name,
            scientific_name: dto.scientific_name,
            risk_label: dto.risk_level,
            regions: Vec::new(),
            kind: dto.kind,
            habitat: dto.habitat,
            description: dto.description,
            distribution: dto.region,
            image_url: dto.image_url.and_then(|url| resolve_image_url(&self.base_url, &url)),
        }
    }
}

//=========================================================================================
// Error Mapping
//=========================================================================================

fn transport_error(error: reqwest::Error) -> PortError {
    if error.is_timeout() {
        PortError::Timeout
    } else if error.is_connect() || error.is_request() {
        PortError::NetworkUnreachable(error.to_string())
    } else {
        PortError::Unexpected(error.to_string())
    }
}

/// Picks the server's `error` (or `message`) field, falling back to the
/// canonical reason phrase when the body is not the usual JSON shape.
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error.or(b.message))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string())
}

/// Maps an HTTP error status onto the port error taxonomy.
pub fn classify_status(status: StatusCode, message: String) -> PortError {
    match status.as_u16() {
        400 | 422 => PortError::Validation(validation_issue(&message)),
        401 => PortError::Unauthorized,
        403 => PortError::Forbidden,
        404 => PortError::NotFound(message),
        408 => PortError::Timeout,
        code @ 500..=599 => PortError::ServerFault {
            status: code,
            message,
        },
        code => PortError::Unexpected(format!("HTTP {}: {}", code, message)),
    }
}

/// Works out which registration field the server complained about.
fn validation_issue(message: &str) -> ValidationIssue {
    static FIELDS: OnceLock<Vec<(Regex, ValidationIssue)>> = OnceLock::new();
    let fields = FIELDS.get_or_init(|| {
        [
            ("email", ValidationIssue::EmailTaken),
            ("username", ValidationIssue::UsernameTaken),
            ("password", ValidationIssue::WeakPassword),
        ]
        .into_iter()
        .filter_map(|(field, issue)| {
            Regex::new(&format!(r"(?i)\b{}\b", field))
                .ok()
                .map(|pattern| (pattern, issue))
        })
        .collect()
    });

    fields
        .iter()
        .find(|(pattern, _)| pattern.is_match(message))
        .map(|(_, issue)| issue.clone())
        .unwrap_or_else(|| ValidationIssue::Other(message.to_string()))
}

/// Absolute URLs are kept; server-relative paths are joined onto the base URL.
fn resolve_image_url(base_url: &str, url: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        None
    } else if url.starts_with("http://") || url.starts_with("https://") {
        Some(url.to_string())
    } else if url.starts_with('/') {
        Some(format!("{}{}", base_url, url))
    } else {
        Some(format!("{}/{}", base_url, url))
    }
}

//=========================================================================================
// `WildlifeApi` Trait Implementation
//=========================================================================================

#[async_trait]
impl WildlifeApi for HttpApi {
    async fn fetch_all_animals(&self, auth: Option<&BearerToken>) -> PortResult<Vec<AnimalRecord>> {
        let list: AnimalListDto = self.send(self.get("/api/all-animals", auth)).await?;
        if let Some(total) = list.total {
            if total != list.items.len() {
                warn!(total, received = list.items.len(), "Animal list total does not match items");
            }
        }
        Ok(list.items.into_iter().map(|dto| self.record(dto)).collect())
    }

    async fn fetch_region_animals(
        &self,
        region: RegionId,
        auth: Option<&BearerToken>,
    ) -> PortResult<RegionAnimals> {
        let dto: RegionDto = self
            .send(self.get(&format!("/api/regions/{}", region), auth))
            .await?;
        if dto.id != region.0 {
            warn!(requested = %region, returned = dto.id, "Region response carries a different id");
        }

        let animals = dto
            .animals
            .into_iter()
            .map(|animal| {
                let mut record = self.record(animal);
                record.regions.push(region);
                record
            })
            .collect();

        Ok(RegionAnimals {
            region,
            name: dto.name,
            description: dto.description,
            animals,
        })
    }

    async fn fetch_animal(&self, id: AnimalId, auth: Option<&BearerToken>) -> PortResult<AnimalRecord> {
        let dto: AnimalDto = self.send(self.get(&format!("/api/animals/{}", id), auth)).await?;
        Ok(self.record(dto))
    }
}

//=========================================================================================
// `AuthApi` Trait Implementation
//=========================================================================================

#[async_trait]
impl AuthApi for HttpApi {
    async fn exchange_credentials(&self, credentials: &Credentials) -> PortResult<IssuedToken> {
        let request = self.client.post(self.url("/api/auth/login")).json(&LoginRequest {
            email: &credentials.email,
            password: &credentials.password,
        });
        let login: LoginDto = self.send(request).await?;
        Ok(IssuedToken {
            token: BearerToken::new(login.token),
            user: login.user.into(),
        })
    }

    async fn create_account(&self, account: &NewAccount) -> PortResult<()> {
        let request = self.client.post(self.url("/api/auth/register")).json(&RegisterRequest {
            username: &account.username,
            email: &account.email,
            password: &account.password,
        });
        // The success body is only a confirmation message.
        let _: serde_json::Value = self.send(request).await?;
        Ok(())
    }

    async fn fetch_current_user(&self, auth: &BearerToken) -> PortResult<UserSummary> {
        let user: UserDto = self.send(self.get("/api/auth/user", Some(auth))).await?;
        Ok(user.into())
    }
}
