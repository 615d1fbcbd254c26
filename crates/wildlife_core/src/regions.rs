//! crates/wildlife_core/src/regions.rs
//!
//! The static directory of map regions, and the keyword rules that associate
//! an animal's free-text distribution with those regions.

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::domain::{AnimalRecord, RegionDescriptor, RegionId};

const EVERYWHERE: &str = "throughout";

/// Immutable lookup from region identifier to descriptor, loaded once.
#[derive(Debug, Clone, Default)]
pub struct RegionDirectory {
    regions: BTreeMap<RegionId, RegionDescriptor>,
}

impl RegionDirectory {
    pub fn new(regions: impl IntoIterator<Item = RegionDescriptor>) -> Self {
        let mut map = BTreeMap::new();
        for region in regions {
            let id = region.id;
            if map.insert(id, region).is_some() {
                warn!(region_id = %id, "Duplicate region identifier; keeping the last definition");
            }
        }
        Self { regions: map }
    }

    /// The five administrative regions shipped with the application.
    pub fn madagascar() -> Self {
        Self::new([
            descriptor(1, "Diana", "Northern region of Madagascar", &["northern", "north"]),
            descriptor(2, "Sava", "Northeastern region of Madagascar", &["northeastern", "northeast"]),
            descriptor(
                3,
                "Analamanga",
                "Central region containing the capital Antananarivo",
                &["central"],
            ),
            descriptor(4, "Atsinanana", "Eastern coastal region", &["eastern"]),
            descriptor(5, "Menabe", "Western coastal region", &["western"]),
        ])
    }

    /// `None` means the selection has no mapped region. That is an expected
    /// outcome, not a failure.
    pub fn resolve(&self, id: RegionId) -> Option<&RegionDescriptor> {
        self.regions.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegionDescriptor> {
        self.regions.values()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Regions whose keywords occur in `distribution`. Text that matches no
    /// region, or that says the species occurs throughout, maps to every region.
    pub fn associate(&self, distribution: &str) -> BTreeSet<RegionId> {
        let text = distribution.to_lowercase();
        let matched: BTreeSet<RegionId> = self
            .regions
            .values()
            .filter(|region| region.keywords.iter().any(|k| text.contains(k.as_str())))
            .map(|region| region.id)
            .collect();

        if matched.is_empty() || text.contains(EVERYWHERE) {
            self.regions.keys().copied().collect()
        } else {
            matched
        }
    }

    /// Fills in region membership for records the server sent without any.
    pub fn associate_records(&self, records: &mut [AnimalRecord]) {
        for record in records.iter_mut().filter(|r| r.regions.is_empty()) {
            let text = record.distribution.as_deref().unwrap_or("");
            record.regions = self.associate(text).into_iter().collect();
        }
    }
}

fn descriptor(id: u32, name: &str, description: &str, keywords: &[&str]) -> RegionDescriptor {
    RegionDescriptor {
        id: RegionId(id),
        name: name.to_string(),
        description: description.to_string(),
        boundary_key: format!("feature-{}", id),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    }
}
