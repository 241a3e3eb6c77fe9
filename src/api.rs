use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use axum::{
    extract::{Query, RawQuery, State},
    response::Response,
    routing::get,
    Json, Router,
};
use metrics::{counter, histogram};
use rand::Rng;
use serde_json::Value;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;

use crate::cache::ResponseCache;
use crate::config::{ApiConfig, AppConfig};
use crate::error::{internal_error_response, ApiError};
use crate::orchestrator::{NewsRequest, RequestOrchestrator};
use crate::validate::ParamRules;

#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<RequestOrchestrator>,
    cache: Arc<ResponseCache>,
    rules: Arc<ParamRules>,
    defaults: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(
        orchestrator: RequestOrchestrator,
        cache_ttl: Duration,
        defaults: ApiConfig,
    ) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            cache: Arc::new(ResponseCache::new(cache_ttl)),
            rules: Arc::new(ParamRules::news()),
            defaults: Arc::new(defaults),
        }
    }

    /// Live providers wired from configuration.
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let orchestrator = RequestOrchestrator::from_config(cfg)?;
        Ok(Self::new(
            orchestrator,
            Duration::from_secs(cfg.cache.ttl_secs),
            cfg.api.clone(),
        ))
    }

    pub fn with_rules(mut self, rules: ParamRules) -> Self {
        self.rules = Arc::new(rules);
        self
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/news", get(get_news))
        .route("/api/real-time", get(real_time))
        .layer(CorsLayer::very_permissive())
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(state)
}

/// Records `api_request_ms` when dropped, so every exit path is timed.
struct RequestTimer(Instant);

impl RequestTimer {
    fn start() -> Self {
        Self(Instant::now())
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        histogram!("api_request_ms").record(self.0.elapsed().as_secs_f64() * 1_000.0);
    }
}

/// Validation → cache → orchestrator → cache store.
async fn get_news(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let _timer = RequestTimer::start();
    counter!("api_requests_total").increment(1);

    state.rules.check(&params)?;

    let key = raw.unwrap_or_default();
    if let Some(hit) = state.cache.get(&key) {
        return Ok(Json(hit));
    }

    let req = NewsRequest::from_params(&params, &state.defaults);
    let resp = state.orchestrator.run(&req).await?;
    let body = serde_json::to_value(&resp).context("serializing news response")?;
    state.cache.put(key, body.clone());
    Ok(Json(body))
}

/// Simulated engagement metric for the dashboard ticker.
async fn real_time() -> Json<Value> {
    let value: u32 = rand::rng().random_range(1..=100);
    Json(serde_json::json!({
        "timestamp": chrono::Local::now().naive_local().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
        "value": value,
        "metric": "engagement",
        "status": "success",
    }))
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(%details, "handler panicked");
    internal_error_response(details)
}
