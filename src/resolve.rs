//! Two-tier resolution: curated "app" table first, authoritative "core"
//! table second.
//!
//! A non-empty app result is final. Otherwise the core result is final,
//! whatever it holds. The tiers are never merged, so one designation is
//! never counted under two source systems, and a partially covered app
//! tier masks a richer core tier.

use tracing::debug;

use crate::error::StoreError;
use crate::normalize::dedupe_by_id;
use crate::row::RawRow;
use crate::spatial::{fetch_rows, Point, SpatialBatch, SpatialQuery, TableRef, TableTiers};
use crate::types::{DatasetSource, Identified};

/// Rows from whichever tier answered.
#[derive(Debug, Clone, PartialEq)]
pub struct TierRows {
    pub source: DatasetSource,
    pub rows: Vec<RawRow>,
}

impl TierRows {
    /// Normalize every row with its source tag and drop repeated ids.
    pub fn normalize<T, F>(self, normalize: F) -> Vec<T>
    where
        T: Identified,
        F: Fn(&RawRow, DatasetSource) -> T,
    {
        let source = self.source;
        dedupe_by_id(self.rows.iter().map(|row| normalize(row, source)).collect())
    }
}

/// Resolve one dataset against its tiers.
pub async fn resolve_tiers(
    batch: &dyn SpatialBatch,
    tiers: &TableTiers,
    point: Point,
    order_by: Option<&str>,
    limit: usize,
) -> Result<TierRows, StoreError> {
    if let Some(app) = &tiers.app {
        let rows = fetch_rows(batch, &tier_query(app, point, order_by, limit)).await?;
        if !rows.is_empty() {
            debug!(table = app.table, rows = rows.len(), "app tier answered");
            return Ok(TierRows {
                source: DatasetSource::App,
                rows,
            });
        }
    }

    let rows = fetch_rows(batch, &tier_query(&tiers.core, point, order_by, limit)).await?;
    debug!(table = tiers.core.table, rows = rows.len(), "core tier answered");
    Ok(TierRows {
        source: DatasetSource::Core,
        rows,
    })
}

fn tier_query<'a>(
    table: &'a TableRef,
    point: Point,
    order_by: Option<&'a str>,
    limit: usize,
) -> SpatialQuery<'a> {
    SpatialQuery {
        table,
        point,
        order_by,
        limit,
    }
}
