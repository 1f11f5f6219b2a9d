//! Request instrumentation.
//!
//! # Responsibilities
//! - Time every request with a monotonic clock
//! - Count requests by method, route and status class
//! - Track requests in flight through a RAII guard
//!
//! # Design Decisions
//! - Purely observational: never changes status or body
//! - The guard releases on every exit path, including cancellation
//! - The count and its gauge write happen under one lock, so the sink
//!   always ends on the true count

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};

use crate::observability::metrics::{status_class, MetricsSink};

/// Counts requests currently being handled.
pub struct InFlightTracker {
    current: Mutex<usize>,
    sink: Arc<dyn MetricsSink>,
}

impl InFlightTracker {
    pub fn new(sink: Arc<dyn MetricsSink>) -> Self {
        Self {
            current: Mutex::new(0),
            sink,
        }
    }

    pub fn current(&self) -> usize {
        *self.lock()
    }

    pub fn sink(&self) -> &Arc<dyn MetricsSink> {
        &self.sink
    }

    /// Take an in-flight slot; it is released when the guard drops.
    pub fn acquire(self: &Arc<Self>) -> InFlightGuard {
        self.adjust(|n| n + 1);
        InFlightGuard {
            tracker: self.clone(),
        }
    }

    fn adjust(&self, step: impl FnOnce(usize) -> usize) {
        let mut current = self.lock();
        *current = step(*current);
        self.sink.set_in_flight(*current);
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A RAII guard that owns one in-flight slot.
pub struct InFlightGuard {
    tracker: Arc<InFlightTracker>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.tracker.adjust(|n| n.saturating_sub(1));
    }
}

/// Records timing, counts and concurrency for the wrapped route.
pub async fn metrics_middleware(
    State(tracker): State<Arc<InFlightTracker>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let _slot = tracker.acquire();

    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let response = next.run(request).await;

    tracker.sink.observe_request(
        &method,
        &route,
        status_class(response.status().as_u16()),
        start.elapsed(),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::RecordingSink;

    #[test]
    fn test_guard_releases_slot() {
        let sink = Arc::new(RecordingSink::new());
        let tracker = Arc::new(InFlightTracker::new(sink.clone()));

        let a = tracker.acquire();
        let b = tracker.acquire();
        assert_eq!(tracker.current(), 2);
        drop(a);
        drop(b);
        assert_eq!(tracker.current(), 0);
        assert_eq!(sink.in_flight_history(), vec![1, 2, 1, 0]);
    }

    /// Sink whose writes of `1` stall, to widen the window between two releases.
    #[derive(Default)]
    struct SlowSink {
        stall: std::sync::atomic::AtomicBool,
        last: Mutex<Option<usize>>,
    }

    impl MetricsSink for SlowSink {
        fn set_in_flight(&self, in_flight: usize) {
            if in_flight == 1 && self.stall.load(std::sync::atomic::Ordering::SeqCst) {
                std::thread::sleep(std::time::Duration::from_millis(100));
            }
            *self.last.lock().unwrap() = Some(in_flight);
        }

        fn observe_request(&self, _: &str, _: &str, _: &str, _: std::time::Duration) {}

        fn observe_operation(&self, _: &str, _: bool) {}
    }

    #[test]
    fn test_concurrent_release_settles_gauge_at_zero() {
        let sink = Arc::new(SlowSink::default());
        let tracker = Arc::new(InFlightTracker::new(sink.clone()));

        let first = tracker.acquire();
        let second = tracker.acquire();
        sink.stall.store(true, std::sync::atomic::Ordering::SeqCst);

        let releaser = std::thread::spawn(move || drop(first));
        std::thread::sleep(std::time::Duration::from_millis(20));
        drop(second);
        releaser.join().unwrap();

        assert_eq!(tracker.current(), 0);
        assert_eq!(*sink.last.lock().unwrap(), Some(0));
    }

    #[test]
    fn test_guard_releases_on_panic() {
        let sink = Arc::new(RecordingSink::new());
        let tracker = Arc::new(InFlightTracker::new(sink));

        let t = tracker.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _slot = t.acquire();
            panic!("handler blew up");
        }));
        assert!(result.is_err());
        assert_eq!(tracker.current(), 0);
    }

    #[tokio::test]
    async fn test_guard_releases_on_cancellation() {
        let sink = Arc::new(RecordingSink::new());
        let tracker = Arc::new(InFlightTracker::new(sink));

        let t = tracker.clone();
        let task = tokio::spawn(async move {
            let _slot = t.acquire();
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        });
        tokio::task::yield_now().await;
        task.abort();
        let _ = task.await;
        assert_eq!(tracker.current(), 0);
    }
}
