use anyhow::Context;
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("news_fetch_attempts_total", "Calls made to the news provider.");
        describe_counter!("news_fetch_failures_total", "Failed news provider calls.");
        describe_counter!("news_fallback_total", "Synthetic news batches served.");
        describe_counter!("trends_fetch_attempts_total", "Calls made to the trend provider.");
        describe_counter!("trends_fetch_failures_total", "Failed trend provider calls.");
        describe_counter!("trends_fallback_total", "Synthetic trend series served.");
        describe_counter!(
            "trends_keywords_truncated_total",
            "Trend requests whose keyword list was cut to the provider maximum."
        );
        describe_counter!(
            "sentiment_scoring_errors_total",
            "Articles scored as neutral because the scorer failed."
        );
        describe_counter!(
            "correlation_fallback_total",
            "Correlations that fell back to zero news counts."
        );
        describe_counter!("api_requests_total", "Requests served by /api/news.");
        describe_counter!("api_validation_errors_total", "Requests rejected by parameter rules.");
        describe_counter!("response_cache_hits_total", "Response cache hits.");
        describe_counter!("response_cache_misses_total", "Response cache misses.");
        describe_histogram!("api_request_ms", "End-to-end /api/news time in milliseconds.");
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and expose the configured cache TTL as a gauge.
    pub fn init(cache_ttl_secs: u64) -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        ensure_metrics_described();
        gauge!("response_cache_ttl_secs").set(cache_ttl_secs as f64);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
