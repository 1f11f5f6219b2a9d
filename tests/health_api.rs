//! Health, readiness and liveness routes.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use lights_http::registry::SimulatedRegistry;

mod common;

use common::{app, app_with_registry, json_body};

fn unauthenticated(path: &str) -> Request<Body> {
    Request::builder().uri(path).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_uninitialized_registry_is_unavailable() {
    let app = app_with_registry(SimulatedRegistry::new());

    let res = app.send(unauthenticated("/health")).await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = json_body(res).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["checks"]["registry"]["status"], "error");
}

#[tokio::test]
async fn test_no_devices_is_still_healthy() {
    let app = app(&[]);

    let res = app.send(unauthenticated("/health")).await;
    assert_eq!(res.status(), StatusCode::OK);

    let body = json_body(res).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["checks"]["registry"]["status"], "ok");
    assert!(body["checks"]["registry"]["detail"]
        .as_str()
        .unwrap()
        .contains("no devices"));
}

#[tokio::test]
async fn test_ready_and_live_share_the_report() {
    let app = app(&["A", "B"]);

    for path in ["/health", "/ready", "/live"] {
        let res = app.send(unauthenticated(path)).await;
        assert_eq!(res.status(), StatusCode::OK, "{path}");
        assert!(res.headers().contains_key("x-request-id"));

        let body = json_body(res).await;
        assert_eq!(body["checks"]["registry"]["detail"], "2 devices connected");
        assert!(body["uptime"].is_string());
        assert!(body["timestamp"].is_string());
    }
}

#[tokio::test]
async fn test_registry_becomes_healthy_after_start() {
    let app = app_with_registry(SimulatedRegistry::new());
    assert_eq!(
        app.send(unauthenticated("/health")).await.status(),
        StatusCode::SERVICE_UNAVAILABLE
    );

    app.registry.start().await;
    assert_eq!(app.send(unauthenticated("/ready")).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_is_instrumented() {
    let app = app(&[]);
    app.send(unauthenticated("/live")).await;

    let requests = app.sink.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].route, "/live");
    assert_eq!(requests[0].status_class, "2xx");
}
