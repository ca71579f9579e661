//! PostGIS implementations of the spatial and LPA ports.
//!
//! All SQL is runtime-checked (sqlx::query, not sqlx::query!). Table and
//! column names come from the static registry and are validated as plain
//! identifiers before being spliced into SQL; coordinates and limits are
//! always bound.

use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tokio::sync::Semaphore;
use tracing::trace;

use crate::error::StoreError;
use crate::lpa::{LpaListQuery, LpaStore};
use crate::row::RawRow;
use crate::spatial::{Point, SpatialBatch, SpatialQuery, SpatialStore, TableRef, GEOMETRY_COLUMNS};
use crate::types::{LpaRecord, LpaStats};

const UNDEFINED_TABLE: &str = "42P01";

const LPA_ORDER: &str = "t.valid_to IS NULL DESC, t.valid_to ASC NULLS FIRST";

// ── PgContextStore ────────────────────────────────────────────

/// Postgres-backed spatial and LPA store.
#[derive(Clone)]
pub struct PgContextStore {
    pool: PgPool,
    max_concurrency: usize,
}

impl PgContextStore {
    pub fn new(pool: PgPool, max_concurrency: usize) -> Self {
        Self {
            pool,
            max_concurrency: max_concurrency.max(1),
        }
    }
}

#[async_trait]
impl SpatialStore for PgContextStore {
    async fn begin(&self) -> Result<Box<dyn SpatialBatch>, StoreError> {
        Ok(Box::new(PgSpatialBatch {
            pool: self.pool.clone(),
            permits: Arc::new(Semaphore::new(self.max_concurrency)),
        }))
    }
}

// ── PgSpatialBatch ────────────────────────────────────────────

/// One aggregate lookup. Every query borrows a pooled connection for its
/// own duration; the semaphore caps how many run at once.
struct PgSpatialBatch {
    pool: PgPool,
    permits: Arc<Semaphore>,
}

impl Drop for PgSpatialBatch {
    fn drop(&mut self) {
        trace!("spatial batch released");
    }
}

#[async_trait]
impl SpatialBatch for PgSpatialBatch {
    async fn intersecting(&self, query: &SpatialQuery<'_>) -> Result<Vec<RawRow>, StoreError> {
        let sql = intersect_sql(query)?;
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| StoreError::Query(anyhow!(e)))?;

        let rows = sqlx::query(&sql)
            .bind(query.point.lng())
            .bind(query.point.lat())
            .bind(query.limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_error(query.table, e))?;

        rows.iter()
            .map(|row| {
                row.try_get::<Value, _>("record")
                    .map(RawRow::from)
                    .map_err(|e| StoreError::Query(anyhow!(e)))
            })
            .collect()
    }
}

// ── LpaStore ──────────────────────────────────────────────────

#[async_trait]
impl LpaStore for PgContextStore {
    async fn lpa_at_point(
        &self,
        table: &TableRef,
        point: Point,
    ) -> Result<Option<LpaRecord>, StoreError> {
        let (name, geom) = identifiers(table)?;
        let sql = format!(
            r#"
            SELECT id::text AS id, entity::text AS entity, reference::text AS reference,
                   name, is_active,
                   ST_AsGeoJSON(centroid)::json AS centroid,
                   ST_AsGeoJSON({geom})::json AS boundary
            FROM {name} AS t
            WHERE t.{geom} IS NOT NULL
              AND ST_Intersects(t.{geom}, ST_SetSRID(ST_Point($1, $2), 4326))
            ORDER BY {LPA_ORDER}
            LIMIT 1
            "#
        );

        let row = sqlx::query(&sql)
            .bind(point.lng())
            .bind(point.lat())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_error(table, e))?;

        row.as_ref().map(lpa_from_row).transpose()
    }

    async fn lpa_stats(&self, table: &TableRef) -> Result<LpaStats, StoreError> {
        let (name, geom) = identifiers(table)?;
        let sql = format!(
            r#"
            SELECT count(*)::bigint AS total_lpas,
                   count(*) FILTER (WHERE is_active IS TRUE)::bigint AS active_lpas,
                   count(*) FILTER (WHERE is_active IS FALSE)::bigint AS historical_lpas,
                   count(*) FILTER (WHERE {geom} IS NOT NULL)::bigint AS with_boundaries
            FROM {name}
            "#
        );

        let row = sqlx::query(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| store_error(table, e))?;

        let count = |column: &str| -> Result<i64, StoreError> {
            row.try_get::<i64, _>(column)
                .map_err(|e| StoreError::Query(anyhow!(e)))
        };
        Ok(LpaStats {
            total_lpas: count("total_lpas")?,
            active_lpas: count("active_lpas")?,
            historical_lpas: count("historical_lpas")?,
            with_boundaries: count("with_boundaries")?,
        })
    }

    async fn list_lpas(
        &self,
        table: &TableRef,
        query: &LpaListQuery,
    ) -> Result<(Vec<LpaRecord>, i64), StoreError> {
        let (name, _) = identifiers(table)?;
        let filter = if query.active_only {
            "WHERE is_active IS TRUE"
        } else {
            ""
        };

        let count_sql = format!("SELECT count(*)::bigint FROM {name} {filter}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| store_error(table, e))?;

        // Boundaries are omitted from listings; only the point lookup returns them.
        let sql = format!(
            r#"
            SELECT id::text AS id, entity::text AS entity, reference::text AS reference,
                   name, is_active,
                   ST_AsGeoJSON(centroid)::json AS centroid,
                   NULL::json AS boundary
            FROM {name}
            {filter}
            ORDER BY name ASC
            LIMIT $1 OFFSET $2
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(i64::from(query.page_size))
            .bind(query.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_error(table, e))?;

        let records = rows.iter().map(lpa_from_row).collect::<Result<_, _>>()?;
        Ok((records, total))
    }
}

// ── SQL helpers ───────────────────────────────────────────────

fn intersect_sql(query: &SpatialQuery<'_>) -> Result<String, StoreError> {
    let (name, geom) = identifiers(query.table)?;

    let mut record = String::from("to_jsonb(t.*)");
    for column in GEOMETRY_COLUMNS {
        record.push_str(&format!(" - '{column}'"));
    }
    if !GEOMETRY_COLUMNS.contains(&geom) {
        record.push_str(&format!(" - '{geom}'"));
    }

    let order = query
        .order_by
        .map(|o| format!("ORDER BY {o}"))
        .unwrap_or_default();

    Ok(format!(
        "SELECT ({record}) AS record FROM {name} AS t \
         WHERE t.{geom} IS NOT NULL \
         AND ST_Intersects(t.{geom}, ST_SetSRID(ST_Point($1, $2), 4326)) \
         {order} LIMIT $3"
    ))
}

/// Validated `(table, geometry column)` pair.
fn identifiers(table: &TableRef) -> Result<(&'static str, &'static str), StoreError> {
    let valid_table = table.table.split('.').all(is_identifier)
        && table.table.split('.').count() <= 2;
    if !valid_table || !is_identifier(table.geometry_column) {
        return Err(StoreError::Query(anyhow!(
            "invalid identifier: {}.{}",
            table.table,
            table.geometry_column
        )));
    }
    Ok((table.table, table.geometry_column))
}

fn is_identifier(part: &str) -> bool {
    let mut chars = part.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn store_error(table: &TableRef, error: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &error {
        if db.code().as_deref() == Some(UNDEFINED_TABLE) {
            return StoreError::MissingRelation(table.table.to_string());
        }
    }
    StoreError::Query(anyhow!(error).context(format!("querying {}", table.table)))
}

fn lpa_from_row(row: &PgRow) -> Result<LpaRecord, StoreError> {
    let get = |e: sqlx::Error| StoreError::Query(anyhow!(e));
    Ok(LpaRecord {
        id: row.try_get("id").map_err(get)?,
        entity: row.try_get("entity").map_err(get)?,
        reference: row.try_get("reference").map_err(get)?,
        name: row.try_get("name").map_err(get)?,
        is_active: row.try_get("is_active").map_err(get)?,
        centroid: row.try_get("centroid").map_err(get)?,
        boundary: row.try_get("boundary").map_err(get)?,
    })
}
