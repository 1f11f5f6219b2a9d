//! Request correlation.
//!
//! # Responsibilities
//! - Generate a unique request ID before any other stage runs
//! - Attach a typed [`RequestContext`] to the request extensions
//! - Echo the ID back in the `x-request-id` response header
//! - Log request start and completion with the ID attached
//!
//! # Design Decisions
//! - IDs come from the OS entropy source by default; generation failure
//!   fails the request closed with a 500 instead of continuing with an
//!   empty ID
//! - The ID is a simple-format UUID v4 (32 lowercase hex characters)

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{header::USER_AGENT, request::Parts, HeaderName, HeaderValue, Request},
    response::{IntoResponse, Response},
};
use rand::{rngs::OsRng, RngCore};
use tower::{Layer, Service};

use crate::http::response::ApiError;

/// Response header carrying the request ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// The entropy source could not produce an ID.
#[derive(Debug, thiserror::Error)]
#[error("failed to generate request id: {0}")]
pub struct RequestIdError(#[from] rand::Error);

/// Per-request correlation identifier.
#[derive(Clone, PartialEq, Eq)]
pub struct RequestId {
    text: String,
    header: HeaderValue,
}

impl RequestId {
    /// Draw a fresh ID from the OS random source.
    pub fn generate() -> Result<Self, RequestIdError> {
        Self::generate_from(&mut OsRng)
    }

    /// Draw a fresh ID from `rng`.
    pub fn generate_from<R: RngCore + ?Sized>(rng: &mut R) -> Result<Self, RequestIdError> {
        let mut bytes = [0u8; 16];
        rng.try_fill_bytes(&mut bytes)?;
        Ok(Self::from_random_bytes(bytes))
    }

    fn from_random_bytes(bytes: [u8; 16]) -> Self {
        let text = uuid::Builder::from_random_bytes(bytes)
            .into_uuid()
            .simple()
            .to_string();
        // Hex digits are always valid header characters.
        let header = HeaderValue::from_str(&text).unwrap_or(HeaderValue::from_static("invalid"));
        Self { text, header }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn header_value(&self) -> HeaderValue {
        self.header.clone()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl fmt::Debug for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RequestId").field(&self.text).finish()
    }
}

/// Immutable per-request record, created at pipeline entry.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    started_at: Instant,
}

impl RequestContext {
    pub fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            started_at: Instant::now(),
        }
    }

    pub fn generate() -> Result<Self, RequestIdError> {
        RequestId::generate().map(Self::new)
    }

    pub fn generate_from<R: RngCore + ?Sized>(rng: &mut R) -> Result<Self, RequestIdError> {
        RequestId::generate_from(rng).map(Self::new)
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self::new(RequestId::from_random_bytes([7; 16]))
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or(ApiError::Internal("request context missing".to_string()))
    }
}

/// Layer that runs [`CorrelationService`] in front of everything else.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationLayer<R = OsRng> {
    rng: R,
}

impl CorrelationLayer {
    pub fn new() -> Self {
        Self { rng: OsRng }
    }
}

impl Default for CorrelationLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> CorrelationLayer<R> {
    /// Use `rng` as the ID source instead of the OS.
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<S, R: Clone> Layer<S> for CorrelationLayer<R> {
    type Service = CorrelationService<S, R>;

    fn layer(&self, inner: S) -> Self::Service {
        CorrelationService {
            inner,
            rng: self.rng.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CorrelationService<S, R = OsRng> {
    inner: S,
    rng: R,
}

impl<S, R> Service<Request<Body>> for CorrelationService<S, R>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    R: RngCore,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        let ctx = match RequestContext::generate_from(&mut self.rng) {
            Ok(ctx) => ctx,
            Err(e) => {
                tracing::error!(error = %e, "Rejecting request without correlation id");
                let response = ApiError::Internal(e.to_string()).into_response();
                return Box::pin(async move { Ok(response) });
            }
        };

        let method = request.method().clone();
        let path = request.uri().path().to_string();
        let user_agent = request
            .headers()
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        tracing::info!(
            request_id = %ctx.request_id(),
            method = %method,
            path = %path,
            user_agent = %user_agent,
            "Request started"
        );

        request.extensions_mut().insert(ctx.clone());

        // The clone has not been driven to readiness; keep the ready one.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let mut response = inner.call(request).await?;
            response
                .headers_mut()
                .insert(X_REQUEST_ID, ctx.request_id().header_value());

            tracing::info!(
                request_id = %ctx.request_id(),
                method = %method,
                path = %path,
                status = response.status().as_u16(),
                duration_ms = ctx.started_at().elapsed().as_millis() as u64,
                "Request completed"
            );
            Ok(response)
        })
    }
}

/// Extension trait for reading the context off a request.
pub trait RequestContextExt {
    fn request_context(&self) -> Option<&RequestContext>;
}

impl<B> RequestContextExt for Request<B> {
    fn request_context(&self) -> Option<&RequestContext> {
        self.extensions().get::<RequestContext>()
    }
}
