//! crates/wildlife_core/src/catalog.rs
//!
//! Sorted, grouped and filtered views over a snapshot of animal records.
//! This is the only place the client orders or groups species; presentation
//! renders what these functions return.

use std::collections::HashMap;

use crate::domain::{AnimalId, AnimalRecord, RegionId};
use crate::risk::{self, RiskLevel};

/// Records sharing one verbatim risk label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskGroup {
    pub label: String,
    pub level: RiskLevel,
    pub animals: Vec<AnimalRecord>,
}

/// Orders records most endangered first, then by common name ignoring case.
/// The sort is stable, so records equal on both keys keep their input order.
pub fn sorted(mut records: Vec<AnimalRecord>) -> Vec<AnimalRecord> {
    records.sort_by_cached_key(|record| {
        (risk::rank(record.risk_label()), record.common_name.to_lowercase())
    });
    records
}

/// Partitions records by verbatim risk label. Groups appear in the order their
/// first member appears in `sorted` output, members keep their sorted order.
pub fn grouped(records: Vec<AnimalRecord>) -> Vec<RiskGroup> {
    group_sorted(sorted(records))
}

fn group_sorted(records: Vec<AnimalRecord>) -> Vec<RiskGroup> {
    let mut groups: Vec<RiskGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let label = record.risk_label().to_string();
        match index.get(&label) {
            Some(&slot) => groups[slot].animals.push(record),
            None => {
                index.insert(label.clone(), groups.len());
                groups.push(RiskGroup {
                    level: risk::bucket(&label),
                    label,
                    animals: vec![record],
                });
            }
        }
    }

    groups
}

/// Keeps records whose common or scientific name contains `search` and whose
/// risk label equals `risk_filter`, both ignoring case. An empty argument
/// disables its predicate. Relative order is preserved.
pub fn filtered(records: &[AnimalRecord], search: &str, risk_filter: &str) -> Vec<AnimalRecord> {
    let search = search.to_lowercase();
    let risk_filter = risk_filter.to_lowercase();

    records
        .iter()
        .filter(|record| {
            search.is_empty()
                || record.common_name.to_lowercase().contains(&search)
                || record.scientific_name().to_lowercase().contains(&search)
        })
        .filter(|record| risk_filter.is_empty() || record.risk_label().to_lowercase() == risk_filter)
        .cloned()
        .collect()
}

//=========================================================================================
// WildlifeCatalog
//=========================================================================================

/// One retrieval's worth of records, held in sorted order.
/// Replaced wholesale on every successful fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WildlifeCatalog {
    records: Vec<AnimalRecord>,
}

impl WildlifeCatalog {
    pub fn new(records: Vec<AnimalRecord>) -> Self {
        Self {
            records: sorted(records),
        }
    }

    pub fn sorted(&self) -> &[AnimalRecord] {
        &self.records
    }

    pub fn grouped(&self) -> Vec<RiskGroup> {
        group_sorted(self.records.clone())
    }

    pub fn filtered(&self, search: &str, risk_filter: &str) -> Vec<AnimalRecord> {
        filtered(&self.records, search, risk_filter)
    }

    pub fn in_region(&self, region: RegionId) -> Vec<AnimalRecord> {
        self.records
            .iter()
            .filter(|record| record.regions.contains(&region))
            .cloned()
            .collect()
    }

    pub fn find(&self, id: AnimalId) -> Option<&AnimalRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
