//! Error types for the address context service
//!
//! Three layers, each a thiserror enum:
//! - `StoreError` is what storage adapters report.
//! - `GeocodeError` is what the geocoder port reports.
//! - `ContextError` is what callers of the lookup operations see.

use thiserror::Error;

/// Errors reported by storage adapters.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The target table or view does not exist (SQLSTATE 42P01).
    #[error("relation does not exist: {0}")]
    MissingRelation(String),

    #[error("query failed: {0}")]
    Query(#[from] anyhow::Error),
}

/// Errors reported by the geocoder.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Address not found or could not be geocoded")]
    NotFound,

    #[error("Geocoder error {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Geocoder returned non-JSON response ({status}): {body}")]
    NonJson { status: u16, body: String },

    #[error("Geocoder returned invalid coordinates")]
    InvalidCoordinates,

    #[error("Geocoder request failed: {0}")]
    Transport(String),
}

impl GeocodeError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Upstream { status: 404, .. } => 404,
            Self::Upstream { .. } => 502,
            Self::NonJson { .. } => 502,
            Self::InvalidCoordinates => 502,
            Self::Transport(_) => 502,
        }
    }
}

/// Caller-facing errors for every lookup operation.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Invalid coordinates supplied for dataset lookup.")]
    InvalidCoordinates,

    #[error("DATABASE_URL is not configured; unable to query datasets.")]
    NotConfigured,

    #[error("dataset lookup timed out after {0}s")]
    Timeout(u64),

    #[error("database query failed: {0}")]
    Query(#[from] StoreError),

    #[error(transparent)]
    Geocode(#[from] GeocodeError),
}

impl ContextError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::InvalidCoordinates => 400,
            Self::NotConfigured => 500,
            Self::Timeout(_) => 504,
            Self::Query(_) => 500,
            Self::Geocode(e) => e.http_status(),
        }
    }

    /// Whether the message is safe to show to an HTTP client as-is.
    pub fn is_client_visible(&self) -> bool {
        !matches!(self, Self::Query(_))
    }
}
