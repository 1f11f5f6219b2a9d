//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, route table)
//!     → request.rs (request ID, RequestContext)
//!     → middleware/auth.rs (bearer token gate, protected routes only)
//!     → middleware/metrics.rs (timing, counts, in-flight gauge)
//!     → lights / health handlers
//!     → response.rs (status mapping, JSON body, fallback redirect)
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::{CorrelationLayer, RequestContext, RequestId, X_REQUEST_ID};
pub use response::{ApiError, FallbackRedirect};
pub use server::{AppState, HttpServer};
