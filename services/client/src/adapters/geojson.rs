//! services/client/src/adapters/geojson.rs
//!
//! Loads a `RegionDirectory` from a GeoJSON FeatureCollection. Only feature
//! properties are read; geometry stays with whoever draws the map.

use std::path::Path;

use serde::Deserialize;
use tracing::info;
use wildlife_core::domain::{RegionDescriptor, RegionId};
use wildlife_core::regions::RegionDirectory;

use crate::error::ClientError;

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    id: Option<serde_json::Value>,
    properties: RegionProperties,
}

#[derive(Debug, Deserialize)]
struct RegionProperties {
    id: u32,
    name: String,
    #[serde(default)]
    description: String,
    keywords: Option<Vec<String>>,
}

/// Parses a FeatureCollection. Features without `keywords` borrow the keywords
/// of the built-in region with the same id, if there is one.
pub fn parse_regions(source: &str) -> Result<RegionDirectory, serde_json::Error> {
    let collection: FeatureCollection = serde_json::from_str(source)?;
    let builtin = RegionDirectory::madagascar();

    let regions = collection.features.into_iter().map(|feature| {
        let id = RegionId(feature.properties.id);
        let boundary_key = match feature.id {
            Some(serde_json::Value::String(key)) => key,
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => format!("feature-{}", id),
        };
        let keywords = match feature.properties.keywords {
            Some(keywords) => keywords.into_iter().map(|k| k.to_lowercase()).collect(),
            None => builtin
                .resolve(id)
                .map(|region| region.keywords.clone())
                .unwrap_or_default(),
        };

        RegionDescriptor {
            id,
            name: feature.properties.name,
            description: feature.properties.description,
            boundary_key,
            keywords,
        }
    });

    Ok(RegionDirectory::new(regions))
}

pub fn load_regions(path: &Path) -> Result<RegionDirectory, ClientError> {
    let source = std::fs::read_to_string(path)?;
    let directory = parse_regions(&source)?;
    info!(path = %path.display(), regions = directory.len(), "Loaded region definitions");
    Ok(directory)
}
