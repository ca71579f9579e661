//! Spatial lookup port and executor.
//!
//! Storage adapters implement [`SpatialStore`]; the aggregator opens one
//! [`SpatialBatch`] per address lookup and runs every dataset query through
//! it. [`fetch_rows`] is the executor the rest of the crate calls: it turns a
//! missing relation into an empty result and strips geometry columns from
//! whatever the adapter returned.

use async_trait::async_trait;
use tracing::warn;

use crate::error::{ContextError, StoreError};
use crate::row::RawRow;

/// Geometry column used when a table descriptor does not name one.
pub const DEFAULT_GEOMETRY_COLUMN: &str = "geom";

/// Columns that only ever serve the intersection predicate.
pub const GEOMETRY_COLUMNS: &[&str] = &["geom", "geom_simple", "boundary", "centroid"];

/// A WGS84 point. Construction rejects non-finite coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    lat: f64,
    lng: f64,
}

impl Point {
    pub fn new(lat: f64, lng: f64) -> Result<Self, ContextError> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(ContextError::InvalidCoordinates);
        }
        Ok(Self { lat, lng })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }
}

/// A queryable table and the geometry column to intersect against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRef {
    pub table: &'static str,
    pub geometry_column: &'static str,
}

impl TableRef {
    pub const fn new(table: &'static str) -> Self {
        Self {
            table,
            geometry_column: DEFAULT_GEOMETRY_COLUMN,
        }
    }

    pub const fn geometry(self, column: &'static str) -> Self {
        Self {
            table: self.table,
            geometry_column: column,
        }
    }
}

/// The curated "app" table (optional) and the authoritative "core" table
/// for one dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableTiers {
    pub app: Option<TableRef>,
    pub core: TableRef,
}

impl TableTiers {
    pub const fn core_only(core: TableRef) -> Self {
        Self { app: None, core }
    }

    pub const fn with_app(app: TableRef, core: TableRef) -> Self {
        Self {
            app: Some(app),
            core,
        }
    }
}

/// One intersection query.
#[derive(Debug, Clone, Copy)]
pub struct SpatialQuery<'a> {
    pub table: &'a TableRef,
    pub point: Point,
    /// Trusted ORDER BY body referring to the table as `t`.
    pub order_by: Option<&'a str>,
    pub limit: usize,
}

/// Storage capable of point-in-geometry queries.
#[async_trait]
pub trait SpatialStore: Send + Sync {
    /// Open a batch scope for one aggregate lookup. The batch is released
    /// when dropped, on success and failure alike.
    async fn begin(&self) -> Result<Box<dyn SpatialBatch>, StoreError>;
}

/// A scope in which many read-only intersection queries may run
/// concurrently.
#[async_trait]
pub trait SpatialBatch: Send + Sync {
    /// Rows whose geometry intersects the point, in query order.
    ///
    /// Must report an absent table as [`StoreError::MissingRelation`].
    async fn intersecting(&self, query: &SpatialQuery<'_>) -> Result<Vec<RawRow>, StoreError>;
}

/// Run one intersection query, treating a missing table as zero rows.
pub async fn fetch_rows(
    batch: &dyn SpatialBatch,
    query: &SpatialQuery<'_>,
) -> Result<Vec<RawRow>, StoreError> {
    let rows = match missing_as_none(batch.intersecting(query).await)? {
        Some(rows) => rows,
        None => {
            warn!(table = query.table.table, "relation missing, treating as empty");
            return Ok(Vec::new());
        }
    };

    Ok(rows
        .into_iter()
        .map(|row| strip_geometry(row, query.table.geometry_column))
        .collect())
}

/// Map [`StoreError::MissingRelation`] to `Ok(None)`; pass everything else
/// through.
pub fn missing_as_none<T>(result: Result<T, StoreError>) -> Result<Option<T>, StoreError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(StoreError::MissingRelation(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

fn strip_geometry(row: RawRow, geometry_column: &str) -> RawRow {
    let mut columns = row.into_inner();
    for column in GEOMETRY_COLUMNS {
        columns.remove(*column);
    }
    columns.remove(geometry_column);
    RawRow::new(columns)
}
