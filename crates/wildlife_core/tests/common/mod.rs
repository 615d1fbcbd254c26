//! In-memory port implementations shared by the integration suites.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::{mpsc, Notify};

use wildlife_core::{
    AnimalId, AnimalRecord, AuthApi, BearerToken, Credentials, DecodedToken, IssuedToken,
    NewAccount, PortError, PortResult, RegionAnimals, RegionDirectory, RegionId,
    RegionQueryCoordinator, SessionManager, TokenDecoder, TokenStore, UserSummary, WildlifeApi,
};

//=========================================================================================
// Tokens
//=========================================================================================

/// Tokens in tests look like `exp:<unix seconds>:<tag>`.
pub fn token_expiring_at(expires_at: DateTime<Utc>, tag: &str) -> String {
    format!("exp:{}:{}", expires_at.timestamp(), tag)
}

pub fn valid_token(tag: &str) -> String {
    token_expiring_at(Utc::now() + Duration::hours(1), tag)
}

pub fn expired_token(tag: &str) -> String {
    token_expiring_at(Utc::now() - Duration::hours(1), tag)
}

pub struct FakeDecoder;

impl TokenDecoder for FakeDecoder {
    fn decode(&self, token: &str) -> PortResult<DecodedToken> {
        let mut parts = token.splitn(3, ':');
        let (Some("exp"), Some(seconds), tag) = (parts.next(), parts.next(), parts.next()) else {
            return Err(PortError::Decode(format!("malformed token '{}'", token)));
        };
        let seconds: i64 = seconds
            .parse()
            .map_err(|_| PortError::Decode("bad exp".to_string()))?;
        let expires_at = DateTime::from_timestamp(seconds, 0)
            .ok_or_else(|| PortError::Decode("exp out of range".to_string()))?;
        Ok(DecodedToken {
            expires_at,
            subject: tag.map(str::to_string),
        })
    }
}

//=========================================================================================
// Token store
//=========================================================================================

#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn holding(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    pub fn current(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> PortResult<Option<String>> {
        Ok(self.current())
    }

    fn save(&self, token: &str) -> PortResult<()> {
        *self.token.lock().unwrap() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> PortResult<()> {
        *self.token.lock().unwrap() = None;
        Ok(())
    }
}

//=========================================================================================
// Auth API
//=========================================================================================

pub fn ranger() -> UserSummary {
    UserSummary {
        id: 7,
        username: "ranger".to_string(),
        email: "ranger@example.org".to_string(),
        role: Some("user".to_string()),
    }
}

pub fn issued(token: &str, user: UserSummary) -> IssuedToken {
    IssuedToken {
        token: BearerToken::new(token),
        user,
    }
}

pub fn credentials(password: &str) -> Credentials {
    Credentials {
        email: "ranger@example.org".to_string(),
        password: password.to_string(),
    }
}

pub struct FakeAuthApi {
    login: Mutex<PortResult<IssuedToken>>,
    register: Mutex<PortResult<()>>,
    current_user: Mutex<PortResult<UserSummary>>,
    login_gate: Mutex<Option<Arc<Notify>>>,
    whoami_gate: Mutex<Option<Arc<Notify>>>,
    calls: AtomicUsize,
}

impl FakeAuthApi {
    pub fn new() -> Self {
        Self {
            login: Mutex::new(Err(PortError::Unauthorized)),
            register: Mutex::new(Ok(())),
            current_user: Mutex::new(Ok(ranger())),
            login_gate: Mutex::new(None),
            whoami_gate: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn on_login(&self, result: PortResult<IssuedToken>) {
        *self.login.lock().unwrap() = result;
    }

    pub fn on_register(&self, result: PortResult<()>) {
        *self.register.lock().unwrap() = result;
    }

    pub fn on_current_user(&self, result: PortResult<UserSummary>) {
        *self.current_user.lock().unwrap() = result;
    }

    /// Makes credential exchanges wait until the returned gate is notified.
    pub fn hold_login(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.login_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    /// Makes the "who am I" call wait until the returned gate is notified.
    pub fn hold_current_user(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.whoami_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthApi for FakeAuthApi {
    async fn exchange_credentials(&self, credentials: &Credentials) -> PortResult<IssuedToken> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.login_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if credentials.password != "correct horse" {
            return Err(PortError::Unauthorized);
        }
        self.login.lock().unwrap().clone()
    }

    async fn create_account(&self, _account: &NewAccount) -> PortResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.register.lock().unwrap().clone()
    }

    async fn fetch_current_user(&self, _auth: &BearerToken) -> PortResult<UserSummary> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.whoami_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.current_user.lock().unwrap().clone()
    }
}

//=========================================================================================
// Wildlife API
//=========================================================================================

pub struct FakeWildlifeApi {
    regions: Mutex<HashMap<RegionId, PortResult<Vec<AnimalRecord>>>>,
    all: Mutex<PortResult<Vec<AnimalRecord>>>,
    gates: Mutex<HashMap<RegionId, Arc<Notify>>>,
    started: mpsc::UnboundedSender<RegionId>,
    seen_tokens: Mutex<Vec<Option<String>>>,
}

impl FakeWildlifeApi {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RegionId>) {
        let (started, rx) = mpsc::unbounded_channel();
        let api = Self {
            regions: Mutex::new(HashMap::new()),
            all: Mutex::new(Ok(Vec::new())),
            gates: Mutex::new(HashMap::new()),
            started,
            seen_tokens: Mutex::new(Vec::new()),
        };
        (api, rx)
    }

    pub fn respond(&self, region: u32, result: PortResult<Vec<AnimalRecord>>) {
        self.regions.lock().unwrap().insert(RegionId(region), result);
    }

    pub fn respond_all(&self, result: PortResult<Vec<AnimalRecord>>) {
        *self.all.lock().unwrap() = result;
    }

    /// Makes fetches for `region` wait until the returned gate is notified.
    pub fn hold(&self, region: u32) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().unwrap().insert(RegionId(region), Arc::clone(&gate));
        gate
    }

    pub fn seen_tokens(&self) -> Vec<Option<String>> {
        self.seen_tokens.lock().unwrap().clone()
    }

    fn record(&self, auth: Option<&BearerToken>) {
        self.seen_tokens
            .lock()
            .unwrap()
            .push(auth.map(|t| t.expose().to_string()));
    }
}

#[async_trait]
impl WildlifeApi for FakeWildlifeApi {
    async fn fetch_all_animals(&self, auth: Option<&BearerToken>) -> PortResult<Vec<AnimalRecord>> {
        self.record(auth);
        self.all.lock().unwrap().clone()
    }

    async fn fetch_region_animals(
        &self,
        region: RegionId,
        auth: Option<&BearerToken>,
    ) -> PortResult<RegionAnimals> {
        self.record(auth);
        let _ = self.started.send(region);
        let gate = self.gates.lock().unwrap().get(&region).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let result = self
            .regions
            .lock()
            .unwrap()
            .get(&region)
            .cloned()
            .unwrap_or_else(|| Err(PortError::NotFound(format!("region {}", region))));
        result.map(|animals| RegionAnimals {
            region,
            name: format!("Region {}", region),
            description: format!("Served description of region {}", region),
            animals,
        })
    }

    async fn fetch_animal(&self, id: AnimalId, auth: Option<&BearerToken>) -> PortResult<AnimalRecord> {
        self.record(auth);
        let all = self.all.lock().unwrap().clone()?;
        all.into_iter()
            .find(|animal| animal.id == id)
            .ok_or_else(|| PortError::NotFound(format!("animal {}", id)))
    }
}

//=========================================================================================
// Wiring
//=========================================================================================

pub struct Harness {
    pub auth: Arc<FakeAuthApi>,
    pub store: Arc<MemoryTokenStore>,
    pub api: Arc<FakeWildlifeApi>,
    pub started: mpsc::UnboundedReceiver<RegionId>,
    pub session: Arc<SessionManager>,
    pub coordinator: Arc<RegionQueryCoordinator>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(MemoryTokenStore::default())
    }

    pub fn with_store(store: MemoryTokenStore) -> Self {
        Self::build(store, RegionDirectory::madagascar())
    }

    pub fn with_directory(directory: RegionDirectory) -> Self {
        Self::build(MemoryTokenStore::default(), directory)
    }

    fn build(store: MemoryTokenStore, directory: RegionDirectory) -> Self {
        let auth = Arc::new(FakeAuthApi::new());
        let store = Arc::new(store);
        let (api, started) = FakeWildlifeApi::new();
        let api = Arc::new(api);
        let session = Arc::new(SessionManager::new(
            auth.clone(),
            Arc::new(FakeDecoder),
            store.clone(),
        ));
        let coordinator = Arc::new(RegionQueryCoordinator::new(
            api.clone(),
            Arc::new(directory),
            session.clone(),
        ));
        Self {
            auth,
            store,
            api,
            started,
            session,
            coordinator,
        }
    }

    /// Logs in with a fresh token and returns it.
    pub async fn logged_in(&self, tag: &str) -> String {
        let token = valid_token(tag);
        self.auth.on_login(Ok(issued(&token, ranger())));
        self.session
            .login(&credentials("correct horse"))
            .await
            .expect("login should succeed");
        token
    }
}

pub fn lemurs() -> Vec<AnimalRecord> {
    vec![
        AnimalRecord::new(1, "Aye-aye", "Endangered"),
        AnimalRecord::new(2, "Fossa", "Vulnerable"),
        AnimalRecord::new(3, "Ring-tailed lemur", "Endangered"),
    ]
}
