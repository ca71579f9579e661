use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::header::{CACHE_CONTROL, EXPIRES, PRAGMA};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use super::{ApiError, AppState};
use crate::lpa::LpaListQuery;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddressRequest {
    /// Absent reads as empty, which address validation rejects.
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PointRequest {
    pub lat: f64,
    pub lng: f64,
}

/// Lookup results are point-in-time; never let an intermediary cache them.
pub(super) fn no_cache(body: impl IntoResponse) -> Response {
    (
        [
            (
                CACHE_CONTROL,
                "no-store, no-cache, must-revalidate, proxy-revalidate",
            ),
            (PRAGMA, "no-cache"),
            (EXPIRES, "0"),
        ],
        body,
    )
        .into_response()
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(inner)| inner).map_err(|rejection| {
        ApiError::bad_request(format!("Invalid request body: {}", rejection.body_text()))
    })
}

pub async fn health(State(state): State<AppState>) -> Response {
    no_cache(Json(json!({
        "status": "ok",
        "database": state.lookup.context().is_configured(),
    })))
}

pub async fn address_lookup(
    State(state): State<AppState>,
    body: Result<Json<AddressRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request = json_body(body)?;
    let response = state.lookup.lookup_address(&request.address).await?;
    Ok(no_cache(Json(response)))
}

pub async fn lpa_lookup(
    State(state): State<AppState>,
    body: Result<Json<AddressRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request = json_body(body)?;
    let response = state.lookup.lookup_lpa(&request.address).await?;
    Ok(no_cache(Json(response)))
}

pub async fn lpa_by_point(
    State(state): State<AppState>,
    body: Result<Json<PointRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request = json_body(body)?;
    let response = state.lookup.lpa_by_point(request.lat, request.lng).await?;
    Ok(no_cache(Json(response)))
}

pub async fn lpa_stats(State(state): State<AppState>) -> Result<Response, ApiError> {
    let stats = state.lookup.lpa().stats().await?;
    Ok(no_cache(Json(stats)))
}

pub async fn lpa_list(
    State(state): State<AppState>,
    query: Result<Query<LpaListQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|rejection| {
        ApiError::bad_request(format!("Invalid query: {}", rejection.body_text()))
    })?;
    let page = state.lookup.lpa().list(query).await?;
    Ok(no_cache(Json(page)))
}
