//! Error responses: `{ "error": message }` with the error's status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

use super::handlers::no_cache;
use crate::error::ContextError;

const GENERIC_FAILURE: &str = "Unable to complete address lookup";

#[derive(Debug)]
pub struct ApiError(pub ContextError);

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self(ContextError::InvalidInput(message.into()))
    }
}

impl From<ContextError> for ApiError {
    fn from(e: ContextError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = if self.0.is_client_visible() {
            self.0.to_string()
        } else {
            GENERIC_FAILURE.to_string()
        };

        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self.0, "lookup failed");
        } else {
            warn!(status = status.as_u16(), error = %self.0, "lookup rejected");
        }

        let mut response = no_cache(Json(json!({ "error": message })));
        *response.status_mut() = status;
        response
    }
}
