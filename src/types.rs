//! Canonical records returned by the lookup operations.
//!
//! These are the shapes that leave the crate. Field names match the JSON
//! contract consumed by the address lookup UI, so most structs keep
//! snake_case fields while the aggregate uses camelCase dataset keys.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, IntoEnumIterator};

use crate::registry::DesignationKey;

/// Which schema tier a record came from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DatasetSource {
    /// Curated, public-facing schema.
    App,
    /// Authoritative raw import.
    Core,
}

/// A generic planning designation overlapping the looked-up point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignationItem {
    pub id: String,
    pub name: Option<String>,
    pub designation: Option<String>,
    pub category: Option<String>,
    pub reference: Option<String>,
    pub designation_date: Option<String>,
    pub documentation_url: Option<String>,
    pub notes: Option<String>,
    pub source: DatasetSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConservationAreaItem {
    pub id: String,
    pub name: Option<String>,
    pub lpa: Option<String>,
    pub designated_at: Option<String>,
    pub source: DatasetSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloodZoneItem {
    pub id: String,
    pub name: Option<String>,
    pub level: Option<String>,
    #[serde(rename = "type")]
    pub zone_type: Option<String>,
    pub dataset: Option<String>,
    pub source: DatasetSource,
}

/// Anything with a stable identifier, for per-dataset deduplication.
pub trait Identified {
    fn id(&self) -> &str;
}

impl Identified for DesignationItem {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for ConservationAreaItem {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for FloodZoneItem {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Every dataset found at a point.
///
/// `designations` always holds an entry for every registry key, so each
/// dataset serializes as an array (possibly empty), never as a missing field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressDatasets {
    pub conservation_areas: Vec<ConservationAreaItem>,
    pub flood_zones: Vec<FloodZoneItem>,
    #[serde(flatten)]
    pub designations: BTreeMap<DesignationKey, Vec<DesignationItem>>,
}

impl AddressDatasets {
    /// An aggregate with every dataset present and empty.
    pub fn empty() -> Self {
        Self {
            conservation_areas: Vec::new(),
            flood_zones: Vec::new(),
            designations: DesignationKey::iter().map(|k| (k, Vec::new())).collect(),
        }
    }

    pub fn designation(&self, key: DesignationKey) -> &[DesignationItem] {
        self.designations
            .get(&key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Total number of records across every dataset.
    pub fn total_items(&self) -> usize {
        self.conservation_areas.len()
            + self.flood_zones.len()
            + self.designations.values().map(Vec::len).sum::<usize>()
    }
}

impl Default for AddressDatasets {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// A local planning authority boundary record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LpaRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    /// GeoJSON geometry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub centroid: Option<Value>,
    /// GeoJSON geometry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundary: Option<Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LpaStats {
    pub total_lpas: i64,
    pub active_lpas: i64,
    pub historical_lpas: i64,
    pub with_boundaries: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LpaPage {
    pub data: Vec<LpaRecord>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LpaLookupResponse {
    pub coordinates: Coordinates,
    pub lpa: Option<LpaRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressLookupResponse {
    pub coordinates: Coordinates,
    pub lpa: Option<LpaRecord>,
    pub datasets: AddressDatasets,
}
