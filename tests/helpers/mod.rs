//! In-memory fakes for the storage and geocoder ports.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use planning_context::error::{GeocodeError, StoreError};
use planning_context::geocode::Geocoder;
use planning_context::lpa::{LpaListQuery, LpaStore};
use planning_context::{
    Coordinates, LpaRecord, LpaStats, Point, RawRow, SpatialBatch, SpatialQuery, SpatialStore,
    TableRef,
};
use serde_json::Value;

pub const LAT: f64 = 51.5072;
pub const LNG: f64 = -0.1276;

// ── FakeSpatialStore ──────────────────────────────────────────

#[derive(Debug, Clone, Default)]
struct Tables {
    rows: HashMap<String, Vec<Value>>,
    missing: HashSet<String>,
    failing: HashSet<String>,
    delay: Option<Duration>,
}

#[derive(Debug, Default)]
pub struct Counters {
    pub begun: AtomicUsize,
    pub released: AtomicUsize,
    pub calls: Mutex<Vec<String>>,
}

/// Tables not mentioned return no rows.
#[derive(Clone, Default)]
pub struct FakeSpatialStore {
    tables: Arc<Tables>,
    pub counters: Arc<Counters>,
}

impl FakeSpatialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, table: &str, rows: Vec<Value>) -> Self {
        Arc::make_mut(&mut self.tables)
            .rows
            .insert(table.to_string(), rows);
        self
    }

    pub fn missing(mut self, table: &str) -> Self {
        Arc::make_mut(&mut self.tables)
            .missing
            .insert(table.to_string());
        self
    }

    pub fn failing(mut self, table: &str) -> Self {
        Arc::make_mut(&mut self.tables)
            .failing
            .insert(table.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        Arc::make_mut(&mut self.tables).delay = Some(delay);
        self
    }

    pub fn begun(&self) -> usize {
        self.counters.begun.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.counters.released.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<String> {
        self.counters.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpatialStore for FakeSpatialStore {
    async fn begin(&self) -> Result<Box<dyn SpatialBatch>, StoreError> {
        self.counters.begun.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeBatch {
            tables: Arc::clone(&self.tables),
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct FakeBatch {
    tables: Arc<Tables>,
    counters: Arc<Counters>,
}

impl Drop for FakeBatch {
    fn drop(&mut self) {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl SpatialBatch for FakeBatch {
    async fn intersecting(&self, query: &SpatialQuery<'_>) -> Result<Vec<RawRow>, StoreError> {
        let table = query.table.table;
        self.counters.calls.lock().unwrap().push(table.to_string());

        if let Some(delay) = self.tables.delay {
            tokio::time::sleep(delay).await;
        }
        if self.tables.missing.contains(table) {
            return Err(StoreError::MissingRelation(table.to_string()));
        }
        if self.tables.failing.contains(table) {
            return Err(StoreError::Query(anyhow::anyhow!("connection reset")));
        }

        Ok(self
            .tables
            .rows
            .get(table)
            .map(|rows| {
                rows.iter()
                    .take(query.limit)
                    .cloned()
                    .map(RawRow::from)
                    .collect()
            })
            .unwrap_or_default())
    }
}

// ── FakeGeocoder ──────────────────────────────────────────────

pub enum FakeGeocoder {
    Found(Coordinates),
    NotFound,
}

impl FakeGeocoder {
    pub fn at(lat: f64, lng: f64) -> Self {
        Self::Found(Coordinates {
            lat,
            lng,
            display_name: Some("Trafalgar Square, London".into()),
        })
    }
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn geocode(&self, _address: &str) -> Result<Coordinates, GeocodeError> {
        match self {
            Self::Found(c) => Ok(c.clone()),
            Self::NotFound => Err(GeocodeError::NotFound),
        }
    }
}

// ── FakeLpaStore ──────────────────────────────────────────────

/// Per-table LPA records; a table without an entry is missing.
#[derive(Default)]
pub struct FakeLpaStore {
    pub records: HashMap<&'static str, Vec<LpaRecord>>,
}

impl FakeLpaStore {
    pub fn with(mut self, table: &'static str, records: Vec<LpaRecord>) -> Self {
        self.records.insert(table, records);
        self
    }

    fn table(&self, table: &TableRef) -> Result<&Vec<LpaRecord>, StoreError> {
        self.records
            .get(table.table)
            .ok_or_else(|| StoreError::MissingRelation(table.table.to_string()))
    }
}

#[async_trait]
impl LpaStore for FakeLpaStore {
    async fn lpa_at_point(
        &self,
        table: &TableRef,
        _point: Point,
    ) -> Result<Option<LpaRecord>, StoreError> {
        Ok(self.table(table)?.first().cloned())
    }

    async fn lpa_stats(&self, table: &TableRef) -> Result<LpaStats, StoreError> {
        let records = self.table(table)?;
        let count = |f: &dyn Fn(&LpaRecord) -> bool| records.iter().filter(|r| f(r)).count() as i64;
        Ok(LpaStats {
            total_lpas: records.len() as i64,
            active_lpas: count(&|r| r.is_active == Some(true)),
            historical_lpas: count(&|r| r.is_active == Some(false)),
            with_boundaries: count(&|r| r.boundary.is_some()),
        })
    }

    async fn list_lpas(
        &self,
        table: &TableRef,
        query: &LpaListQuery,
    ) -> Result<(Vec<LpaRecord>, i64), StoreError> {
        let mut records: Vec<LpaRecord> = self
            .table(table)?
            .iter()
            .filter(|r| !query.active_only || r.is_active == Some(true))
            .cloned()
            .collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        let total = records.len() as i64;
        let page = records
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.page_size as usize)
            .collect();
        Ok((page, total))
    }
}

pub fn lpa(name: &str, active: bool) -> LpaRecord {
    LpaRecord {
        id: Some(format!("lpa-{}", name.to_lowercase())),
        name: Some(name.to_string()),
        is_active: Some(active),
        ..LpaRecord::default()
    }
}
