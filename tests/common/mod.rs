//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header::AUTHORIZATION, Method, Request, Response},
    Router,
};
use lights_http::config::LightsConfig;
use lights_http::health::ProcessStart;
use lights_http::http::server::build_router;
use lights_http::observability::RecordingSink;
use lights_http::registry::SimulatedRegistry;
use lights_http::AppState;
use tower::ServiceExt;

pub const TOKEN: &str = "test-token";
pub const FALLBACK: &str = "https://fallback.example/";

/// A router wired to a simulated registry and an in-memory metrics sink.
pub struct TestApp {
    pub router: Router,
    pub registry: Arc<SimulatedRegistry>,
    pub sink: Arc<RecordingSink>,
    pub state: AppState,
}

pub fn test_config() -> LightsConfig {
    let mut config = LightsConfig::default();
    config.auth.bearer_token = TOKEN.to_string();
    config.redirect.fallback_url = FALLBACK.to_string();
    config.fanout.device_delay_ms = 0;
    config.observability.metrics_enabled = false;
    config
}

pub fn app_with_registry(registry: SimulatedRegistry) -> TestApp {
    let config = test_config();
    let registry = Arc::new(registry);
    let sink = Arc::new(RecordingSink::new());
    let state = AppState::new(&config, registry.clone(), sink.clone(), ProcessStart::now()).unwrap();
    let router = build_router(&config, state.clone());
    TestApp {
        router,
        registry,
        sink,
        state,
    }
}

pub fn app(devices: &[&str]) -> TestApp {
    app_with_registry(SimulatedRegistry::with_devices(devices.iter().copied()))
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Authenticated POST with an optional raw body.
    pub async fn post(&self, path: &str, body: Option<&str>) -> Response<Body> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(AUTHORIZATION, format!("Bearer {TOKEN}"))
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_default())
            .unwrap();
        self.send(request).await
    }

    /// Authenticated GET.
    pub async fn get(&self, path: &str) -> Response<Body> {
        let request = Request::builder()
            .uri(path)
            .header(AUTHORIZATION, format!("Bearer {TOKEN}"))
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Total commands issued across every device.
    pub fn device_calls(&self) -> usize {
        self.registry
            .devices_snapshot()
            .iter()
            .map(|d| d.command_count())
            .sum()
    }
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
