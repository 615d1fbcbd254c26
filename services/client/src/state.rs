//! services/client/src/state.rs
//!
//! Wires the adapters into the core components. Built once at startup and
//! shared by everything that drives the client.

use std::sync::Arc;

use tracing::info;
use wildlife_core::ports::{AuthApi, TokenDecoder, TokenStore, WildlifeApi};
use wildlife_core::{RegionDirectory, RegionQueryCoordinator, SessionManager};

use crate::adapters::{geojson, FileTokenStore, HttpApi, JwtDecoder};
use crate::config::Config;
use crate::error::ClientError;

/// The shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub regions: Arc<RegionDirectory>,
    pub session: Arc<SessionManager>,
    pub coordinator: Arc<RegionQueryCoordinator>,
}

impl AppState {
    /// Builds the production adapters described by `config`.
    pub fn from_config(config: Arc<Config>) -> Result<Self, ClientError> {
        let http = Arc::new(HttpApi::new(
            config.api_base_url.clone(),
            config.request_timeout,
        )?);

        let regions = match &config.regions_path {
            Some(path) => geojson::load_regions(path)?,
            None => RegionDirectory::madagascar(),
        };
        info!(
            api = %config.api_base_url,
            regions = regions.len(),
            "Client adapters initialized"
        );

        Ok(Self::assemble(
            config.clone(),
            regions,
            http.clone(),
            http,
            Arc::new(JwtDecoder::new()),
            Arc::new(FileTokenStore::new(config.token_path.clone())),
        ))
    }

    /// Builds the state from arbitrary port implementations.
    pub fn assemble(
        config: Arc<Config>,
        regions: RegionDirectory,
        wildlife: Arc<dyn WildlifeApi>,
        auth: Arc<dyn AuthApi>,
        decoder: Arc<dyn TokenDecoder>,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        let regions = Arc::new(regions);
        let session = Arc::new(SessionManager::new(auth, decoder, store));
        let coordinator = Arc::new(RegionQueryCoordinator::new(
            wildlife,
            regions.clone(),
            session.clone(),
        ));

        Self {
            config,
            regions,
            session,
            coordinator,
        }
    }
}
