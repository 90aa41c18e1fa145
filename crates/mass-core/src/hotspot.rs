//! Maritime traffic hotspot zones and the catalogue interface that supplies them.
//!
//! Zones arrive as GeoJSON-style records from an external catalogue. The
//! footprint is kept as raw JSON so a single malformed polygon only excludes
//! that zone from intersection testing instead of failing the whole catalogue.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::{CatalogueError, GeometryError};
use crate::models::Severity;
use crate::spatial::{BoundingBox, Footprint};

/// Zone classification as published by the catalogue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HotspotType {
    #[default]
    HighTrafficDensity,
    CrossingTraffic,
    Congestion,
    FishingActivity,
    /// Any tag this build does not know about.
    #[serde(other)]
    Other,
}

/// A named hazard zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotZone {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub zone_type: HotspotType,
    #[serde(default)]
    pub severity: Severity,
    /// GeoJSON `Polygon` or `MultiPolygon`, unvalidated.
    #[serde(default)]
    pub geometry: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: HotspotMetadata,
}

impl HotspotZone {
    pub fn footprint(&self) -> Result<Footprint, GeometryError> {
        Footprint::from_geojson(&self.geometry)
    }
}

/// Descriptive traffic statistics for a zone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HotspotMetadata {
    /// Kept as a JSON number so integer densities print without a fraction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_vessels_per_hour: Option<Number>,
    /// UTC windows formatted `HH:MM-HH:MM`.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub peak_hours_utc: Vec<String>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub dominant_vessel_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Catalogues publish `null` for fields they have no data for.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de;

    struct IdVisitor;

    impl<'de> de::Visitor<'de> for IdVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string or integer zone id")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_any(IdVisitor)
}

impl HotspotMetadata {
    /// Average density, treating zero as "not reported".
    pub fn reported_density(&self) -> Option<&Number> {
        self.avg_vessels_per_hour
            .as_ref()
            .filter(|density| density.as_f64().is_some_and(|value| value != 0.0))
    }

    pub fn reported_notes(&self) -> Option<&str> {
        self.notes.as_deref().filter(|notes| !notes.is_empty())
    }
}

/// Provenance of a catalogue snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogueMetadata {
    pub data_source: Option<String>,
    pub data_period: Option<String>,
    pub last_updated: Option<String>,
}

/// Source of hotspot zones.
pub trait HotspotCatalogue {
    /// Zones, optionally restricted to those with an outline vertex inside `bbox`.
    fn list_zones(&self, bbox: Option<&BoundingBox>) -> Result<Vec<HotspotZone>, CatalogueError>;

    fn metadata(&self) -> Result<CatalogueMetadata, CatalogueError>;
}

/// Keep zones whose first exterior ring has a vertex inside `bbox`.
/// Zones with unreadable footprints are dropped.
pub fn filter_by_bounding_box(zones: Vec<HotspotZone>, bbox: &BoundingBox) -> Vec<HotspotZone> {
    zones
        .into_iter()
        .filter(|zone| match zone.footprint() {
            Ok(footprint) => footprint
                .outline()
                .into_iter()
                .any(|(lat, lon)| bbox.contains(lat, lon)),
            Err(_) => false,
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct CatalogueDocument {
    #[serde(flatten)]
    metadata: CatalogueMetadata,
    #[serde(default)]
    hotspots: Vec<Value>,
}

impl CatalogueDocument {
    fn zones(self) -> Vec<HotspotZone> {
        self.hotspots
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| match serde_json::from_value::<HotspotZone>(record) {
                Ok(zone) => Some(zone),
                Err(err) => {
                    tracing::warn!(index, error = %err, "Skipping undecodable hotspot record");
                    None
                }
            })
            .collect()
    }
}

/// Catalogue backed by a JSON file, re-read on every call.
#[derive(Debug, Clone)]
pub struct JsonFileCatalogue {
    path: PathBuf,
}

impl JsonFileCatalogue {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<CatalogueDocument, CatalogueError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|source| CatalogueError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }
}

impl HotspotCatalogue for JsonFileCatalogue {
    fn list_zones(&self, bbox: Option<&BoundingBox>) -> Result<Vec<HotspotZone>, CatalogueError> {
        let zones = self.read_document()?.zones();
        Ok(match bbox {
            Some(bbox) => filter_by_bounding_box(zones, bbox),
            None => zones,
        })
    }

    fn metadata(&self) -> Result<CatalogueMetadata, CatalogueError> {
        Ok(self.read_document()?.metadata)
    }
}

/// In-memory catalogue for callers that already hold a snapshot.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalogue {
    zones: Vec<HotspotZone>,
    metadata: CatalogueMetadata,
}

impl StaticCatalogue {
    pub fn new(zones: Vec<HotspotZone>, metadata: CatalogueMetadata) -> Self {
        Self { zones, metadata }
    }

    /// Decode a catalogue JSON document held in memory.
    pub fn from_json(raw: &str) -> Result<Self, CatalogueError> {
        let document: CatalogueDocument = serde_json::from_str(raw)?;
        let metadata = document.metadata.clone();
        Ok(Self::new(document.zones(), metadata))
    }
}

impl HotspotCatalogue for StaticCatalogue {
    fn list_zones(&self, bbox: Option<&BoundingBox>) -> Result<Vec<HotspotZone>, CatalogueError> {
        let zones = self.zones.clone();
        Ok(match bbox {
            Some(bbox) => filter_by_bounding_box(zones, bbox),
            None => zones,
        })
    }

    fn metadata(&self) -> Result<CatalogueMetadata, CatalogueError> {
        Ok(self.metadata.clone())
    }
}
