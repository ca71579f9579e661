//! Address and LPA lookups through the orchestration service.

mod helpers;

use std::sync::Arc;

use helpers::{lpa, FakeGeocoder, FakeLpaStore, FakeSpatialStore, LAT, LNG};
use planning_context::lpa::{LpaListQuery, LpaService};
use planning_context::{AddressContext, AddressLookupService, ContextError, GeocodeError};
use serde_json::json;

const APP_LPA: &str = "app.local_planning_authority_public";
const CORE_LPA: &str = "core.local_planning_authority_core";

fn service(
    geocoder: FakeGeocoder,
    lpas: FakeLpaStore,
    spatial: FakeSpatialStore,
) -> AddressLookupService {
    AddressLookupService::new(
        Arc::new(geocoder),
        LpaService::new(Arc::new(lpas)),
        AddressContext::new(Arc::new(spatial)),
    )
}

// ── lookup_address ────────────────────────────────────────────

#[tokio::test]
async fn address_lookup_combines_lpa_and_datasets() {
    let spatial = FakeSpatialStore::new().with_rows(
        "core.conservation_area_core",
        vec![json!({ "id": "ca-1", "name": "Trafalgar Square" })],
    );
    let lpas = FakeLpaStore::default()
        .with(APP_LPA, vec![])
        .with(CORE_LPA, vec![lpa("Westminster", true)]);
    let svc = service(FakeGeocoder::at(LAT, LNG), lpas, spatial);

    let response = svc.lookup_address("  Trafalgar Square, London ").await.unwrap();

    assert_eq!(response.coordinates.lat, LAT);
    assert_eq!(
        response.coordinates.display_name.as_deref(),
        Some("Trafalgar Square, London")
    );
    assert_eq!(
        response.lpa.and_then(|l| l.name).as_deref(),
        Some("Westminster")
    );
    assert_eq!(response.datasets.conservation_areas.len(), 1);
}

#[tokio::test]
async fn blank_address_rejected_without_geocoding() {
    let svc = service(
        FakeGeocoder::NotFound,
        FakeLpaStore::default(),
        FakeSpatialStore::new(),
    );

    let err = svc.lookup_address("   ").await.unwrap_err();

    assert!(matches!(err, ContextError::InvalidInput(_)));
    assert_eq!(err.to_string(), "Address required");
}

#[tokio::test]
async fn unknown_address_is_not_found() {
    let svc = service(
        FakeGeocoder::NotFound,
        FakeLpaStore::default(),
        FakeSpatialStore::new(),
    );

    let err = svc.lookup_lpa("Nowhere In Particular").await.unwrap_err();

    assert!(matches!(err, ContextError::Geocode(GeocodeError::NotFound)));
    assert_eq!(err.http_status(), 404);
}

// ── LPA ───────────────────────────────────────────────────────

#[tokio::test]
async fn app_lpa_preferred_over_core() {
    let lpas = FakeLpaStore::default()
        .with(APP_LPA, vec![lpa("Camden", true)])
        .with(CORE_LPA, vec![lpa("Camden (core)", true)]);
    let svc = service(FakeGeocoder::at(LAT, LNG), lpas, FakeSpatialStore::new());

    let response = svc.lpa_by_point(51.55, -0.16).await.unwrap();

    assert_eq!(response.coordinates.lat, 51.55);
    assert!(response.coordinates.display_name.is_none());
    assert_eq!(response.lpa.unwrap().name.as_deref(), Some("Camden"));
}

#[tokio::test]
async fn missing_lpa_tables_mean_no_lpa() {
    let svc = service(
        FakeGeocoder::at(LAT, LNG),
        FakeLpaStore::default(),
        FakeSpatialStore::new(),
    );

    let response = svc.lpa_by_point(LAT, LNG).await.unwrap();
    assert!(response.lpa.is_none());
}

#[tokio::test]
async fn lpa_by_point_rejects_non_finite() {
    let svc = service(
        FakeGeocoder::at(LAT, LNG),
        FakeLpaStore::default(),
        FakeSpatialStore::new(),
    );

    let err = svc.lpa_by_point(LAT, f64::INFINITY).await.unwrap_err();
    assert!(matches!(err, ContextError::InvalidCoordinates));
}

#[tokio::test]
async fn stats_use_core_when_app_is_empty() {
    let lpas = FakeLpaStore::default().with(APP_LPA, vec![]).with(
        CORE_LPA,
        vec![lpa("Camden", true), lpa("Old Borough", false)],
    );
    let service = LpaService::new(Arc::new(lpas));

    let stats = service.stats().await.unwrap();

    assert_eq!(stats.total_lpas, 2);
    assert_eq!(stats.active_lpas, 1);
    assert_eq!(stats.historical_lpas, 1);
}

#[tokio::test]
async fn stats_are_zero_without_tables() {
    let service = LpaService::new(Arc::new(FakeLpaStore::default()));
    let stats = service.stats().await.unwrap();
    assert_eq!(stats.total_lpas, 0);
    assert_eq!(stats.with_boundaries, 0);
}

#[tokio::test]
async fn list_pages_by_name() {
    let lpas = FakeLpaStore::default().with(
        CORE_LPA,
        vec![
            lpa("Westminster", true),
            lpa("Camden", true),
            lpa("Islington", true),
            lpa("Old Borough", false),
        ],
    );
    let service = LpaService::new(Arc::new(lpas));

    let page = service
        .list(LpaListQuery {
            page: 2,
            page_size: 2,
            active_only: false,
        })
        .await
        .unwrap();

    let names: Vec<_> = page.data.iter().filter_map(|l| l.name.as_deref()).collect();
    assert_eq!(names, vec!["Old Borough", "Westminster"]);
    assert_eq!(page.pagination.total, 4);
    assert_eq!(page.pagination.total_pages, 2);

    let active = service
        .list(LpaListQuery {
            active_only: true,
            ..LpaListQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(active.pagination.total, 3);
    assert_eq!(active.pagination.total_pages, 1);
}

#[tokio::test]
async fn empty_list_still_has_one_page() {
    let service = LpaService::new(Arc::new(FakeLpaStore::default()));
    let page = service.list(LpaListQuery::default()).await.unwrap();
    assert!(page.data.is_empty());
    assert_eq!(page.pagination.total, 0);
    assert_eq!(page.pagination.total_pages, 1);
}

#[tokio::test]
async fn unconfigured_lpa_service_is_rejected() {
    let err = LpaService::unconfigured().stats().await.unwrap_err();
    assert!(matches!(err, ContextError::NotConfigured));
}
