//! Bearer token authentication gate.
//!
//! Accepts a request iff the credential header is present, carries the
//! expected scheme, and the token equals the configured secret. Every
//! rejection looks the same from outside; only the log says why.

use std::fmt;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::config::AuthConfig;
use crate::http::request::RequestContextExt;
use crate::http::response::FallbackRedirect;

/// Why a credential was rejected. Never sent to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    MissingHeader,
    WrongScheme,
    TokenMismatch,
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MissingHeader => "missing credential header",
            Self::WrongScheme => "unexpected credential scheme",
            Self::TokenMismatch => "token mismatch",
        })
    }
}

/// Holds the single configured secret.
pub struct AuthGate {
    token: String,
    header: HeaderName,
    scheme_prefix: String,
    reject: FallbackRedirect,
}

impl fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGate")
            .field("header", &self.header)
            .field("scheme_prefix", &self.scheme_prefix)
            .finish_non_exhaustive()
    }
}

impl AuthGate {
    pub fn new(config: &AuthConfig, reject: FallbackRedirect) -> Result<Self, axum::http::header::InvalidHeaderName> {
        Ok(Self {
            token: config.bearer_token.clone(),
            header: HeaderName::try_from(config.header.as_str())?,
            scheme_prefix: format!("{} ", config.scheme),
            reject,
        })
    }

    /// Check the credential carried by `headers`.
    pub fn check(&self, headers: &HeaderMap) -> Result<(), AuthFailure> {
        let value = headers
            .get(&self.header)
            .ok_or(AuthFailure::MissingHeader)?
            .as_bytes();

        let presented = value
            .strip_prefix(self.scheme_prefix.as_bytes())
            .ok_or(AuthFailure::WrongScheme)?;

        if bool::from(presented.ct_eq(self.token.as_bytes())) {
            Ok(())
        } else {
            Err(AuthFailure::TokenMismatch)
        }
    }

    /// The uniform rejection response.
    pub fn rejection(&self) -> Response {
        self.reject.clone().into_response()
    }
}

/// Short-circuits the pipeline unless the request is authenticated.
pub async fn auth_middleware(
    State(gate): State<Arc<AuthGate>>,
    request: Request,
    next: Next,
) -> Response {
    match gate.check(request.headers()) {
        Ok(()) => next.run(request).await,
        Err(reason) => {
            let request_id = request
                .request_context()
                .map(|ctx| ctx.request_id().to_string())
                .unwrap_or_default();
            tracing::warn!(
                request_id = %request_id,
                path = %request.uri().path(),
                reason = %reason,
                "Authentication failed"
            );
            gate.rejection()
        }
    }
}
