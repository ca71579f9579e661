//! Planning Context - address to planning-designation lookup
//!
//! Given a UK site address (or a coordinate), this crate works out which
//! planning designations overlap the site: local planning authority,
//! conservation areas, flood zones, listed buildings, green belt and roughly
//! thirty other datasets held in a PostGIS database.
//!
//! ## Call chain
//! Address -> Geocoder -> Point -> Aggregator -> (per dataset) two-tier
//! spatial lookup -> row normalizer -> `AddressDatasets`
//!
//! The aggregation core (`normalize`, `registry`, `resolve`, `aggregator`)
//! only talks to storage through the ports in `spatial` and `lpa`, so it
//! compiles and tests without a database. The sqlx adapters live behind the
//! `database` feature and the axum surface behind `server`.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod geocode;
pub mod lookup;
pub mod lpa;
pub mod normalize;
pub mod registry;
pub mod resolve;
pub mod row;
pub mod spatial;
pub mod types;

#[cfg(feature = "database")]
pub mod database;

#[cfg(feature = "server")]
pub mod server;

pub use aggregator::AddressContext;
pub use config::AppConfig;
pub use error::{ContextError, GeocodeError, StoreError};
pub use geocode::{Geocoder, NominatimGeocoder};
pub use lookup::AddressLookupService;
pub use registry::{DatasetConfig, DesignationKey};
pub use row::RawRow;
pub use spatial::{Point, SpatialBatch, SpatialQuery, SpatialStore, TableRef};
pub use types::{
    AddressDatasets, AddressLookupResponse, ConservationAreaItem, Coordinates, DatasetSource,
    DesignationItem, FloodZoneItem, LpaLookupResponse, LpaRecord, LpaStats,
};

#[cfg(feature = "database")]
pub use database::{DatabaseConfig, DatabaseManager, PgContextStore};
