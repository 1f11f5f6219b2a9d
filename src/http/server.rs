//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with every route
//! - Compose the per-route pipeline: correlation → auth → metrics → handler
//! - Send unmatched and unauthenticated requests to the fallback URL
//! - Run the API listener and the metrics exporter
//! - Stop accepting on shutdown and drain in-flight requests

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header::InvalidHeaderName, StatusCode, Uri},
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::LightsConfig;
use crate::health::{self, HealthAggregator, ProcessStart, RegistryCheck};
use crate::http::middleware::{auth_middleware, metrics_middleware, AuthGate, InFlightTracker};
use crate::http::request::{CorrelationLayer, RequestContext};
use crate::http::response::FallbackRedirect;
use crate::lifecycle::Shutdown;
use crate::lights::{handlers as lights, FanOutExecutor};
use crate::observability::metrics::{self, MetricsSink};
use crate::registry::DeviceRegistry;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<dyn DeviceRegistry>,
    pub executor: Arc<FanOutExecutor>,
    pub health: Arc<HealthAggregator>,
    pub auth: Arc<AuthGate>,
    pub in_flight: Arc<InFlightTracker>,
    pub fallback: FallbackRedirect,
}

impl AppState {
    pub fn new(
        config: &LightsConfig,
        registry: Arc<dyn DeviceRegistry>,
        sink: Arc<dyn MetricsSink>,
        started: ProcessStart,
    ) -> Result<Self, InvalidHeaderName> {
        let fallback = FallbackRedirect(Arc::from(config.redirect.fallback_url.as_str()));
        let auth = AuthGate::new(&config.auth, fallback.clone())?;
        let executor = FanOutExecutor::new(registry.clone(), sink.clone(), config.fanout.device_delay());
        let health = HealthAggregator::new(started).with_check(Arc::new(RegistryCheck::new(registry.clone())));

        Ok(Self {
            registry,
            executor: Arc::new(executor),
            health: Arc::new(health),
            auth: Arc::new(auth),
            in_flight: Arc::new(InFlightTracker::new(sink)),
            fallback,
        })
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(config: &LightsConfig, state: AppState) -> Router {
    let instrument = middleware::from_fn_with_state(state.in_flight.clone(), metrics_middleware);

    let protected = Router::new()
        .route("/lights/on", post(lights::turn_on))
        .route("/lights/off", post(lights::turn_off))
        .route("/lights/red", post(lights::red))
        .route("/lights/yellow", post(lights::yellow))
        .route("/lights/orange", post(lights::orange))
        .route("/lights/dark-red", post(lights::dark_red))
        .route("/lights/rgb", post(lights::rgb))
        .route("/lights/brightness", post(lights::brightness))
        .route("/lights/colortemp", post(lights::color_temperature))
        .route("/lights/status", get(lights::status))
        .route_layer(instrument.clone())
        .route_layer(middleware::from_fn_with_state(state.auth.clone(), auth_middleware));

    let open = Router::new()
        .route("/health", get(health::handlers::health))
        .route("/ready", get(health::handlers::health))
        .route("/live", get(health::handlers::health))
        .route_layer(instrument);

    Router::new()
        .merge(protected)
        .merge(open)
        .fallback(unmatched)
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
        .layer(timeout_layer(config))
        .layer(CorrelationLayer::new())
        .layer(TraceLayer::new_for_http())
}

/// Requests still running after the configured timeout get a 408.
fn timeout_layer(config: &LightsConfig) -> TimeoutLayer {
    TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        Duration::from_secs(config.listener.request_timeout_secs),
    )
}

async fn unmatched(State(state): State<AppState>, ctx: RequestContext, uri: Uri) -> FallbackRedirect {
    tracing::info!(request_id = %ctx.request_id(), path = %uri.path(), "No route matched");
    state.fallback.clone()
}

/// HTTP server for the lights API.
pub struct HttpServer {
    router: Router,
    config: LightsConfig,
}

impl HttpServer {
    pub fn new(config: LightsConfig, state: AppState) -> Self {
        let router = build_router(&config, state);
        Self { router, config }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        if self.config.observability.metrics_enabled {
            let metrics_addr = format!(
                "{}:{}",
                self.config.listener.host, self.config.observability.metrics_port
            );
            match metrics_addr.parse::<SocketAddr>() {
                Ok(addr) => {
                    if let Err(e) = metrics::init_metrics(addr) {
                        tracing::error!(error = %e, "Failed to start metrics exporter");
                    }
                }
                Err(e) => {
                    tracing::error!(metrics_address = %metrics_addr, error = %e, "Failed to parse metrics address");
                }
            }
        }

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &LightsConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    use axum::{body::Body, http::Request, response::Response};
    use tower::{service_fn, Layer, ServiceExt};

    #[tokio::test(start_paused = true)]
    async fn test_slow_request_times_out_with_408() {
        let mut config = LightsConfig::default();
        config.listener.request_timeout_secs = 1;

        let slow = service_fn(|_req: Request<Body>| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, Infallible>(Response::new(Body::empty()))
        });
        let res = timeout_layer(&config)
            .layer(slow)
            .oneshot(Request::builder().uri("/lights/on").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::REQUEST_TIMEOUT);
    }
}
