//! HTTP control surface for a set of remote-controllable lights.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod lights;
pub mod observability;
pub mod registry;

pub use config::LightsConfig;
pub use http::{AppState, HttpServer};
pub use lifecycle::Shutdown;
