//! Response construction and error mapping.
//!
//! # Responsibilities
//! - Map the error taxonomy onto HTTP status codes
//! - Serialize JSON bodies, logging encoding failures with the request ID
//! - Build the fallback redirect used for unauthorized and unmatched requests
//!
//! # Design Decisions
//! - Validation errors are 400, aggregate device failures 500
//! - Internal details never reach the caller; they are logged instead
//! - Rejected and unmatched requests are indistinguishable from outside

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{de::DeserializeOwned, Serialize};

use crate::http::request::RequestContext;
use crate::lights::command::InvalidParameter;

/// Errors a handler can end in.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Body was not valid JSON for the route.
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    /// A parameter was outside its documented range.
    #[error(transparent)]
    Validation(#[from] InvalidParameter),

    /// At least one device failed during fan-out.
    #[error("failed to {operation} some lights")]
    DeviceOperation { operation: &'static str },

    #[error("failed to encode response: {0}")]
    Encoding(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidJson(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::DeviceOperation { .. } | Self::Encoding(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show the caller.
    fn public_message(&self) -> String {
        match self {
            Self::InvalidJson(_) => "Invalid JSON".to_string(),
            Self::Validation(e) => e.to_string(),
            Self::DeviceOperation { .. } => self.to_string(),
            Self::Encoding(_) | Self::Internal(_) => "internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.public_message() });
        // A json! map of strings always serializes.
        let bytes = serde_json::to_vec(&body).unwrap_or_default();
        with_json_body(self.status(), bytes)
    }
}

fn with_json_body(status: StatusCode, bytes: Vec<u8>) -> Response {
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}

/// Serialize `value` as the response body.
pub fn json_response<T: Serialize>(
    ctx: &RequestContext,
    status: StatusCode,
    value: &T,
) -> Result<Response, ApiError> {
    match serde_json::to_vec(value) {
        Ok(bytes) => Ok(with_json_body(status, bytes)),
        Err(e) => {
            tracing::error!(
                request_id = %ctx.request_id(),
                error = %e,
                "Failed to encode response"
            );
            Err(ApiError::Encoding(e.to_string()))
        }
    }
}

/// Decode a JSON request body without regard to its content type.
pub fn parse_json<T: DeserializeOwned>(
    ctx: &RequestContext,
    body: &Bytes,
    operation: &str,
) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::error!(
            request_id = %ctx.request_id(),
            operation,
            error = %e,
            "Invalid JSON in request"
        );
        ApiError::InvalidJson(e.to_string())
    })
}

/// `{"status": "..."}` confirmation body.
#[derive(Debug, Clone, Serialize)]
pub struct StatusMessage {
    pub status: String,
}

/// Redirect to the configured fallback URL with `302 Found`.
#[derive(Debug, Clone)]
pub struct FallbackRedirect(pub Arc<str>);

impl IntoResponse for FallbackRedirect {
    fn into_response(self) -> Response {
        match HeaderValue::from_str(&self.0) {
            Ok(location) => (StatusCode::FOUND, [(header::LOCATION, location)]).into_response(),
            Err(_) => StatusCode::NOT_FOUND.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::InvalidJson("eof".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Validation(InvalidParameter::Brightness).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::DeviceOperation { operation: "turn_on" }.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = ApiError::Internal("entropy pool exhausted".into());
        assert_eq!(err.public_message(), "internal server error");

        let err = ApiError::DeviceOperation { operation: "turn_off" };
        assert_eq!(err.public_message(), "failed to turn_off some lights");
    }

    #[test]
    fn test_fallback_redirect() {
        let response = FallbackRedirect(Arc::from("https://example.com/")).into_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "https://example.com/"
        );
    }

    #[test]
    fn test_parse_json_rejects_garbage() {
        let ctx = RequestContext::for_tests();
        let parsed: Result<StatusMessageIn, _> =
            parse_json(&ctx, &Bytes::from_static(b"invalid json"), "rgb");
        assert!(matches!(parsed, Err(ApiError::InvalidJson(_))));
    }

    #[derive(Debug, serde::Deserialize)]
    #[allow(dead_code)]
    struct StatusMessageIn {
        status: String,
    }
}
