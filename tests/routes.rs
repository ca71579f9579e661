//! HTTP contract for the lookup routes.
//!
//! Run with: cargo test --features server --test routes

#![cfg(feature = "server")]

mod helpers;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use helpers::{lpa, FakeGeocoder, FakeLpaStore, FakeSpatialStore, LAT, LNG};
use http_body_util::BodyExt;
use planning_context::lpa::LpaService;
use planning_context::server::{build_router, AppState};
use planning_context::{AddressContext, AddressLookupService};
use serde_json::{json, Value};
use tower::ServiceExt;

// ── Test app builder ───────────────────────────────────────────

fn app(spatial: FakeSpatialStore) -> axum::Router {
    let lpas = FakeLpaStore::default()
        .with("core.local_planning_authority_core", vec![lpa("Westminster", true)]);
    let lookup = AddressLookupService::new(
        Arc::new(FakeGeocoder::at(LAT, LNG)),
        LpaService::new(Arc::new(lpas)),
        AddressContext::new(Arc::new(spatial)),
    );
    build_router(AppState::new(lookup))
}

fn unconfigured_app() -> axum::Router {
    let lookup = AddressLookupService::new(
        Arc::new(FakeGeocoder::at(LAT, LNG)),
        LpaService::unconfigured(),
        AddressContext::unconfigured(),
    );
    build_router(AppState::new(lookup))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, header::HeaderMap, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, body)
}

// ── Tests ──────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_database_configuration() {
    let (status, _, body) = send(app(FakeSpatialStore::new()), get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok", "database": true }));

    let (_, _, body) = send(unconfigured_app(), get("/api/health")).await;
    assert_eq!(body["database"], false);
}

#[tokio::test]
async fn address_lookup_returns_no_cache_response() {
    let spatial = FakeSpatialStore::new().with_rows(
        "core.flood_risk_zones_core",
        vec![json!({ "id": "fz-1", "flood_risk_level": 3 })],
    );
    let (status, headers, body) = send(
        app(spatial),
        post_json("/api/address/lookup", json!({ "address": "Trafalgar Square" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers[header::CACHE_CONTROL],
        "no-store, no-cache, must-revalidate, proxy-revalidate"
    );
    assert_eq!(headers[header::PRAGMA], "no-cache");
    assert_eq!(headers[header::EXPIRES], "0");
    assert_eq!(body["coordinates"]["lat"], LAT);
    assert_eq!(body["lpa"]["name"], "Westminster");
    assert_eq!(body["datasets"]["floodZones"][0]["level"], "3");
    assert_eq!(body["datasets"]["greenBelt"], json!([]));
}

#[tokio::test]
async fn blank_address_is_bad_request() {
    let (status, _, body) = send(
        app(FakeSpatialStore::new()),
        post_json("/api/address/lookup", json!({ "address": " " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Address required" }));
}

#[tokio::test]
async fn missing_address_reads_as_required() {
    for uri in ["/api/address/lookup", "/api/lpa/lookup"] {
        let request = post_json(uri, json!({}));
        let (status, _, body) = send(app(FakeSpatialStore::new()), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body, json!({ "error": "Address required" }), "{uri}");
    }
}

#[tokio::test]
async fn unknown_fields_are_rejected() {
    let (status, _, body) = send(
        app(FakeSpatialStore::new()),
        post_json("/api/lpa/lookup", json!({ "address": "x", "postcode": "SW1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));
}

#[tokio::test]
async fn lpa_by_point_returns_coordinates_and_lpa() {
    let (status, _, body) = send(
        app(FakeSpatialStore::new()),
        post_json("/api/lpa/by-point", json!({ "lat": 51.5, "lng": -0.12 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["coordinates"], json!({ "lat": 51.5, "lng": -0.12 }));
    assert_eq!(body["lpa"]["is_active"], true);
}

#[tokio::test]
async fn stats_and_list() {
    let (status, _, body) = send(app(FakeSpatialStore::new()), get("/api/lpa/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_lpas"], 1);

    let (status, _, body) = send(
        app(FakeSpatialStore::new()),
        get("/api/lpa/list?page=1&pageSize=10&activeOnly=true"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["name"], "Westminster");
    assert_eq!(
        body["pagination"],
        json!({ "page": 1, "pageSize": 10, "total": 1, "totalPages": 1 })
    );
}

#[tokio::test]
async fn query_failures_do_not_leak_details() {
    let spatial = FakeSpatialStore::new().failing("core.ward_core");
    let (status, _, body) = send(
        app(spatial),
        post_json("/api/address/lookup", json!({ "address": "Trafalgar Square" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Unable to complete address lookup" }));
}

#[tokio::test]
async fn unconfigured_datastore_is_server_error() {
    let (status, _, body) = send(unconfigured_app(), get("/api/lpa/stats")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("DATABASE_URL"));
}
