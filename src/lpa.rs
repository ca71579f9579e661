//! Local planning authority lookups.
//!
//! The LPA record is richer than a generic designation (GeoJSON centroid
//! and boundary), so it has its own port. The same app-then-core rule
//! applies, with a missing table read as "no answer from this tier".

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ContextError, StoreError};
use crate::spatial::{missing_as_none, Point, TableRef, TableTiers};
use crate::types::{LpaPage, LpaRecord, LpaStats, Pagination};

pub const LPA_TIERS: TableTiers = TableTiers::with_app(
    TableRef::new("app.local_planning_authority_public").geometry("boundary"),
    TableRef::new("core.local_planning_authority_core").geometry("boundary"),
);

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 500;

/// Paging parameters for [`LpaService::list`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LpaListQuery {
    pub page: u32,
    pub page_size: u32,
    pub active_only: bool,
}

impl Default for LpaListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            active_only: false,
        }
    }
}

impl LpaListQuery {
    /// Clamp page to >= 1 and page size to 1..=MAX_PAGE_SIZE.
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            page_size: self.page_size.clamp(1, MAX_PAGE_SIZE),
            active_only: self.active_only,
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.page_size)
    }
}

/// Storage port for LPA records.
#[async_trait]
pub trait LpaStore: Send + Sync {
    /// The authority whose boundary contains `point`, current ones first.
    async fn lpa_at_point(
        &self,
        table: &TableRef,
        point: Point,
    ) -> Result<Option<LpaRecord>, StoreError>;

    async fn lpa_stats(&self, table: &TableRef) -> Result<LpaStats, StoreError>;

    /// One page of authorities ordered by name, plus the total row count.
    async fn list_lpas(
        &self,
        table: &TableRef,
        query: &LpaListQuery,
    ) -> Result<(Vec<LpaRecord>, i64), StoreError>;
}

#[derive(Clone)]
pub struct LpaService {
    store: Option<Arc<dyn LpaStore>>,
    tiers: TableTiers,
}

impl LpaService {
    pub fn new(store: Arc<dyn LpaStore>) -> Self {
        Self {
            store: Some(store),
            tiers: LPA_TIERS,
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            store: None,
            tiers: LPA_TIERS,
        }
    }

    fn store(&self) -> Result<&dyn LpaStore, ContextError> {
        self.store.as_deref().ok_or(ContextError::NotConfigured)
    }

    pub async fn lpa_at_point(&self, point: Point) -> Result<Option<LpaRecord>, ContextError> {
        let store = self.store()?;

        if let Some(app) = &self.tiers.app {
            if let Some(Some(record)) = missing_as_none(store.lpa_at_point(app, point).await)? {
                debug!(table = app.table, "lpa resolved from app tier");
                return Ok(Some(record));
            }
        }

        let record = missing_as_none(store.lpa_at_point(&self.tiers.core, point).await)?;
        Ok(record.flatten())
    }

    /// Authority counts. The app tier wins only when it reports at least one
    /// authority; an absent core tier falls back to the app figures or zeros.
    pub async fn stats(&self) -> Result<LpaStats, ContextError> {
        let store = self.store()?;

        let app = match &self.tiers.app {
            Some(app) => missing_as_none(store.lpa_stats(app).await)?,
            None => None,
        };
        if let Some(stats) = app.filter(|s| s.total_lpas > 0) {
            return Ok(stats);
        }

        let core = missing_as_none(store.lpa_stats(&self.tiers.core).await)?;
        Ok(core.or(app).unwrap_or_default())
    }

    pub async fn list(&self, query: LpaListQuery) -> Result<LpaPage, ContextError> {
        let store = self.store()?;
        let query = query.normalized();

        let mut page = None;
        if let Some(app) = &self.tiers.app {
            page = missing_as_none(store.list_lpas(app, &query).await)?
                .filter(|(_, total)| *total > 0);
        }
        let (data, total) = match page {
            Some(page) => page,
            None => missing_as_none(store.list_lpas(&self.tiers.core, &query).await)?
                .unwrap_or_default(),
        };

        let page_size = i64::from(query.page_size);
        Ok(LpaPage {
            data,
            pagination: Pagination {
                page: query.page,
                page_size: query.page_size,
                total,
                total_pages: ((total + page_size - 1) / page_size).max(1),
            },
        })
    }
}
