//! crates/wildlife_core/src/coordinator.rs
//!
//! Turns a region selection into a classified list of animals.
//!
//! Each selection gets a sequence number and a cancellation token. Starting a
//! new selection or clearing the current one cancels the previous fetch, and a
//! response that still arrives is dropped unless its tag matches the active
//! selection, so the last selection always wins.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::catalog::{self, WildlifeCatalog};
use crate::domain::{AnimalId, AnimalRecord, RegionDescriptor, RegionId};
use crate::failure::{Failure, Operation};
use crate::ports::{PortError, WildlifeApi};
use crate::regions::RegionDirectory;
use crate::session::SessionManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionPhase {
    Idle,
    Loading,
    Populated,
    Failed,
}

/// The published `(region, classified animals, error)` tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionView {
    pub phase: RegionPhase,
    pub region: Option<RegionDescriptor>,
    pub animals: Vec<AnimalRecord>,
    pub failure: Option<Failure>,
}

impl RegionView {
    fn idle() -> Self {
        Self {
            phase: RegionPhase::Idle,
            region: None,
            animals: Vec::new(),
            failure: None,
        }
    }

    fn loading(region: RegionDescriptor) -> Self {
        Self {
            phase: RegionPhase::Loading,
            region: Some(region),
            animals: Vec::new(),
            failure: None,
        }
    }

    fn populated(region: RegionDescriptor, animals: Vec<AnimalRecord>) -> Self {
        Self {
            phase: RegionPhase::Populated,
            region: Some(region),
            animals,
            failure: None,
        }
    }

    fn failed(region: RegionDescriptor, failure: Failure) -> Self {
        Self {
            phase: RegionPhase::Failed,
            region: Some(region),
            animals: Vec::new(),
            failure: Some(failure),
        }
    }
}

impl Default for RegionView {
    fn default() -> Self {
        Self::idle()
    }
}

/// What happened to one selection gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// Nothing is mapped at the selection; no fetch was issued.
    NoInformation,
    Populated { animals: usize },
    Failed(Failure),
    /// A later selection or a dismissal overtook this one.
    Superseded,
}

struct InFlight {
    sequence: u64,
    region: RegionId,
    cancel: CancellationToken,
}

#[derive(Default)]
struct Selection {
    sequence: u64,
    in_flight: Option<InFlight>,
}

//=========================================================================================
// RegionQueryCoordinator
//=========================================================================================

pub struct RegionQueryCoordinator {
    api: Arc<dyn WildlifeApi>,
    directory: Arc<RegionDirectory>,
    session: Arc<SessionManager>,
    selection: Mutex<Selection>,
    view: watch::Sender<RegionView>,
}

impl RegionQueryCoordinator {
    pub fn new(
        api: Arc<dyn WildlifeApi>,
        directory: Arc<RegionDirectory>,
        session: Arc<SessionManager>,
    ) -> Self {
        let (view, _) = watch::channel(RegionView::idle());
        Self {
            api,
            directory,
            session,
            selection: Mutex::new(Selection::default()),
            view,
        }
    }

    pub fn view(&self) -> RegionView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RegionView> {
        self.view.subscribe()
    }

    pub fn directory(&self) -> &RegionDirectory {
        &self.directory
    }

    pub async fn select(&self, region_id: RegionId) -> SelectionOutcome {
        let Some(region) = self.directory.resolve(region_id).cloned() else {
            debug!(region_id = %region_id, "No region mapped at the selection");
            return SelectionOutcome::NoInformation;
        };

        let (sequence, cancel) = {
            let mut selection = self.selection.lock().await;
            selection.sequence += 1;
            if let Some(previous) = selection.in_flight.take() {
                debug!(region_id = %previous.region, "Superseding the in-flight region fetch");
                previous.cancel.cancel();
            }
            let cancel = CancellationToken::new();
            selection.in_flight = Some(InFlight {
                sequence: selection.sequence,
                region: region_id,
                cancel: cancel.clone(),
            });
            self.view.send_replace(RegionView::loading(region.clone()));
            (selection.sequence, cancel)
        };

        info!(region_id = %region_id, region = %region.name, "Fetching animals for region");
        let api = Arc::clone(&self.api);
        let fetch = self.session.authorized(move |token| async move {
            api.fetch_region_animals(region_id, token.as_ref()).await
        });

        let result = tokio::select! {
            _ = cancel.cancelled() => {
                debug!(region_id = %region_id, "Region fetch cancelled");
                return SelectionOutcome::Superseded;
            }
            result = fetch => result,
        };

        let mut selection = self.selection.lock().await;
        let current = matches!(
            &selection.in_flight,
            Some(in_flight) if in_flight.sequence == sequence && in_flight.region == region_id
        );
        if !current {
            debug!(region_id = %region_id, "Discarding a stale region response");
            return SelectionOutcome::Superseded;
        }
        selection.in_flight = None;

        match result {
            Ok(payload) => {
                if payload.region != region_id {
                    warn!(requested = %region_id, returned = %payload.region, "Region response carries a different id");
                }
                if payload.name != region.name {
                    debug!(region_id = %region_id, server = %payload.name, local = %region.name, "Server names the region differently");
                }
                let region = with_server_description(region, payload.description);
                let animals = catalog::sorted(payload.animals);
                let count = animals.len();
                info!(region_id = %region_id, animals = count, "Region populated");
                self.view.send_replace(RegionView::populated(region, animals));
                SelectionOutcome::Populated { animals: count }
            }
            Err(e) => {
                let failure = Failure::classify(Operation::RegionLookup, &e);
                warn!(region_id = %region_id, error = %e, kind = ?failure.kind, "Region fetch failed");
                self.view.send_replace(RegionView::failed(region, failure.clone()));
                SelectionOutcome::Failed(failure)
            }
        }
    }

    /// Dismisses the current selection from any state.
    pub async fn clear_selection(&self) {
        let mut selection = self.selection.lock().await;
        selection.sequence += 1;
        if let Some(previous) = selection.in_flight.take() {
            previous.cancel.cancel();
        }
        self.view.send_replace(RegionView::idle());
        debug!("Region selection cleared");
    }

    /// Fetches the full species list. The server answers "not found" when it
    /// has no animals at all, which is an empty catalog rather than a failure.
    pub async fn load_catalog(&self) -> Result<WildlifeCatalog, Failure> {
        let api = Arc::clone(&self.api);
        let result = self
            .session
            .authorized(move |token| async move { api.fetch_all_animals(token.as_ref()).await })
            .await;

        match result {
            Ok(mut records) => {
                self.directory.associate_records(&mut records);
                info!(animals = records.len(), "Catalog loaded");
                Ok(WildlifeCatalog::new(records))
            }
            Err(PortError::NotFound(_)) => {
                info!("Server reported no animals");
                Ok(WildlifeCatalog::default())
            }
            Err(e) => {
                let failure = Failure::classify(Operation::Catalog, &e);
                warn!(error = %e, kind = ?failure.kind, "Catalog fetch failed");
                Err(failure)
            }
        }
    }

    pub async fn animal_detail(&self, id: AnimalId) -> Result<AnimalRecord, Failure> {
        let api = Arc::clone(&self.api);
        let result = self
            .session
            .authorized(move |token| async move { api.fetch_animal(id, token.as_ref()).await })
            .await;

        match result {
            Ok(mut record) => {
                self.directory.associate_records(std::slice::from_mut(&mut record));
                Ok(record)
            }
            Err(e) => {
                let failure = Failure::classify(Operation::AnimalDetail, &e);
                warn!(animal_id = %id, error = %e, kind = ?failure.kind, "Animal fetch failed");
                Err(failure)
            }
        }
    }
}

/// Region files may leave the description out; the server's wording fills the gap.
fn with_server_description(mut region: RegionDescriptor, description: String) -> RegionDescriptor {
    if region.description.is_empty() && !description.is_empty() {
        region.description = description;
    }
    region
}
