//! Aggregator - every dataset at one point, in one response.
//!
//! `AddressContext::fetch_address_datasets` is the single entry point. It
//! opens one batch on the injected store, fans out the conservation-area,
//! flood-zone and registry lookups concurrently, and assembles
//! [`AddressDatasets`]. Any query failure other than a missing table fails
//! the whole call; there are no partial results.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::try_join_all;
use tracing::info;

use crate::error::{ContextError, StoreError};
use crate::normalize::{normalize_conservation_area, normalize_flood_zone};
use crate::registry::{registry, DatasetConfig, FixedDataset, CONSERVATION_AREAS, FLOOD_ZONES};
use crate::resolve::resolve_tiers;
use crate::row::RawRow;
use crate::spatial::{Point, SpatialBatch, SpatialStore};
use crate::types::{
    AddressDatasets, ConservationAreaItem, DatasetSource, DesignationItem, FloodZoneItem,
    Identified,
};

/// Overall budget for one aggregate lookup.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(20);

/// Address context service.
///
/// Holds no per-request state; clone the `Arc` store freely across requests.
#[derive(Clone)]
pub struct AddressContext {
    store: Option<Arc<dyn SpatialStore>>,
    timeout: Duration,
}

impl AddressContext {
    pub fn new(store: Arc<dyn SpatialStore>) -> Self {
        Self {
            store: Some(store),
            timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    /// A context with no datastore; every lookup fails with
    /// [`ContextError::NotConfigured`].
    pub fn unconfigured() -> Self {
        Self {
            store: None,
            timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.store.is_some()
    }

    /// Look up every dataset intersecting `(lat, lng)`.
    pub async fn fetch_address_datasets(
        &self,
        lat: f64,
        lng: f64,
    ) -> Result<AddressDatasets, ContextError> {
        let point = Point::new(lat, lng)?;
        let store = self.store.as_ref().ok_or(ContextError::NotConfigured)?;

        let started = Instant::now();
        let batch = store.begin().await?;
        let outcome =
            tokio::time::timeout(self.timeout, collect_datasets(batch.as_ref(), point)).await;
        // Release the batch before reporting, whatever the outcome.
        drop(batch);

        let datasets = outcome.map_err(|_| ContextError::Timeout(self.timeout.as_secs()))??;

        info!(
            lat,
            lng,
            records = datasets.total_items(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "address datasets resolved"
        );
        Ok(datasets)
    }
}

async fn collect_datasets(
    batch: &dyn SpatialBatch,
    point: Point,
) -> Result<AddressDatasets, StoreError> {
    let configs = registry();

    let (conservation_areas, flood_zones, designations) = futures::try_join!(
        lookup_conservation_areas(batch, point),
        lookup_flood_zones(batch, point),
        try_join_all(
            configs
                .iter()
                .map(|config| lookup_designation(batch, point, config))
        ),
    )?;

    let mut datasets = AddressDatasets::empty();
    datasets.conservation_areas = conservation_areas;
    datasets.flood_zones = flood_zones;
    for (config, items) in configs.iter().zip(designations) {
        datasets.designations.insert(config.key, items);
    }
    Ok(datasets)
}

async fn lookup_fixed<T, F>(
    batch: &dyn SpatialBatch,
    point: Point,
    dataset: &FixedDataset,
    normalize: F,
) -> Result<Vec<T>, StoreError>
where
    T: Identified,
    F: Fn(&RawRow, DatasetSource) -> T,
{
    let resolved = resolve_tiers(
        batch,
        &dataset.tiers,
        point,
        dataset.order_by,
        dataset.query_limit,
    )
    .await?;
    let mut items = resolved.normalize(normalize);
    items.truncate(dataset.result_limit);
    Ok(items)
}

async fn lookup_conservation_areas(
    batch: &dyn SpatialBatch,
    point: Point,
) -> Result<Vec<ConservationAreaItem>, StoreError> {
    lookup_fixed(batch, point, &CONSERVATION_AREAS, normalize_conservation_area).await
}

async fn lookup_flood_zones(
    batch: &dyn SpatialBatch,
    point: Point,
) -> Result<Vec<FloodZoneItem>, StoreError> {
    lookup_fixed(batch, point, &FLOOD_ZONES, normalize_flood_zone).await
}

async fn lookup_designation(
    batch: &dyn SpatialBatch,
    point: Point,
    config: &DatasetConfig,
) -> Result<Vec<DesignationItem>, StoreError> {
    let resolved =
        resolve_tiers(batch, &config.tiers, point, config.order_by, config.limit).await?;
    Ok(resolved.normalize(|row, source| config.normalize(row, source)))
}
