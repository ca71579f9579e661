//! Address lookup orchestration: geocode, then LPA and datasets at the point.

use std::sync::Arc;

use tracing::info;

use crate::aggregator::AddressContext;
use crate::error::ContextError;
use crate::geocode::Geocoder;
use crate::lpa::LpaService;
use crate::spatial::Point;
use crate::types::{AddressLookupResponse, Coordinates, LpaLookupResponse};

#[derive(Clone)]
pub struct AddressLookupService {
    geocoder: Arc<dyn Geocoder>,
    lpa: LpaService,
    context: AddressContext,
}

impl AddressLookupService {
    pub fn new(geocoder: Arc<dyn Geocoder>, lpa: LpaService, context: AddressContext) -> Self {
        Self {
            geocoder,
            lpa,
            context,
        }
    }

    pub fn lpa(&self) -> &LpaService {
        &self.lpa
    }

    pub fn context(&self) -> &AddressContext {
        &self.context
    }

    /// Geocode an address and collect everything known about the site.
    pub async fn lookup_address(
        &self,
        address: &str,
    ) -> Result<AddressLookupResponse, ContextError> {
        let coordinates = self.geocode(address).await?;
        let point = Point::new(coordinates.lat, coordinates.lng)?;

        let (lpa, datasets) = tokio::try_join!(
            self.lpa.lpa_at_point(point),
            self.context.fetch_address_datasets(point.lat(), point.lng()),
        )?;

        info!(
            lpa = lpa.as_ref().and_then(|l| l.name.as_deref()).unwrap_or("none"),
            records = datasets.total_items(),
            "address lookup complete"
        );
        Ok(AddressLookupResponse {
            coordinates,
            lpa,
            datasets,
        })
    }

    pub async fn lookup_lpa(&self, address: &str) -> Result<LpaLookupResponse, ContextError> {
        let coordinates = self.geocode(address).await?;
        let point = Point::new(coordinates.lat, coordinates.lng)?;
        let lpa = self.lpa.lpa_at_point(point).await?;
        Ok(LpaLookupResponse { coordinates, lpa })
    }

    pub async fn lpa_by_point(
        &self,
        lat: f64,
        lng: f64,
    ) -> Result<LpaLookupResponse, ContextError> {
        let point = Point::new(lat, lng)?;
        let lpa = self.lpa.lpa_at_point(point).await?;
        Ok(LpaLookupResponse {
            coordinates: Coordinates {
                lat,
                lng,
                display_name: None,
            },
            lpa,
        })
    }

    async fn geocode(&self, address: &str) -> Result<Coordinates, ContextError> {
        let address = validate_address(address)?;
        Ok(self.geocoder.geocode(address).await?)
    }
}

/// Trimmed, non-empty address.
pub fn validate_address(address: &str) -> Result<&str, ContextError> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(ContextError::InvalidInput("Address required".into()));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_address_rejected() {
        let err = validate_address("   ").unwrap_err();
        assert_eq!(err.http_status(), 400);
        assert_eq!(err.to_string(), "Address required");
    }

    #[test]
    fn address_trimmed() {
        assert_eq!(validate_address("  1 High St ").unwrap(), "1 High St");
    }
}
