//! Health, readiness and liveness endpoints.

use axum::{extract::State, http::StatusCode, response::Response};

use super::checks::Severity;
use crate::http::request::RequestContext;
use crate::http::response::{json_response, ApiError};
use crate::http::server::AppState;

/// ok and warn keep the service in rotation; error takes it out.
pub fn status_code(severity: Severity) -> StatusCode {
    match severity {
        Severity::Ok | Severity::Warn => StatusCode::OK,
        Severity::Error => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub async fn health(State(state): State<AppState>, ctx: RequestContext) -> Result<Response, ApiError> {
    tracing::info!(request_id = %ctx.request_id(), "Health check requested");

    let report = state.health.report();
    if report.overall == Severity::Error {
        tracing::warn!(request_id = %ctx.request_id(), checks = ?report.checks, "Service unhealthy");
    }
    json_response(&ctx, status_code(report.overall), &report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_code(Severity::Ok), StatusCode::OK);
        assert_eq!(status_code(Severity::Warn), StatusCode::OK);
        assert_eq!(status_code(Severity::Error), StatusCode::SERVICE_UNAVAILABLE);
    }
}
