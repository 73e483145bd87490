//! HTTP handlers for weather-service.

pub mod chat;
pub mod health;
pub mod weather;

pub use chat::chat;
pub use health::{health_check, metrics_endpoint, not_found, readiness_check};
pub use weather::extreme_weather;
