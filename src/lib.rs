// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod cache;
pub mod chart;
pub mod config;
pub mod correlate;
pub mod dates;
pub mod error;
pub mod metrics;
pub mod news;
pub mod orchestrator;
pub mod retry;
pub mod sentiment;
pub mod stats;
pub mod timeframe;
pub mod trends;
pub mod validate;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::config::AppConfig;
pub use crate::orchestrator::{NewsRequest, NewsResponse, RequestOrchestrator};
