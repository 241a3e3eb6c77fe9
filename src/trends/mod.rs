// src/trends/mod.rs
//! Search-interest series: model, provider seam, retrying source and synthetic fallback.

pub mod google;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Local, NaiveDate, NaiveDateTime};
use metrics::counter;
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::error::ProviderError;
use crate::retry::RetryPolicy;
use crate::timeframe::Timeframe;

pub use google::GoogleTrendsClient;

/// The provider compares at most this many keywords per query.
pub const MAX_KEYWORDS: usize = 5;
pub const SYNTHETIC_WINDOW_DAYS: usize = 90;
pub const SYNTHETIC_MIN: u32 = 20;
pub const SYNTHETIC_MAX: u32 = 80;
const SMOOTHING_WINDOW: usize = 7;

/// A fully built provider query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendQuery {
    pub keywords: Vec<String>,
    pub timeframe: Timeframe,
    /// Region code; empty means worldwide.
    pub geo: String,
}

/// Provider-side handle obtained when a query is built; consumed by `read_series`.
#[derive(Debug, Clone)]
pub struct TrendPayload {
    pub query: TrendQuery,
    pub request: serde_json::Value,
    pub token: String,
}

/// Row as read from the provider, before partial rows are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTrendRow {
    pub time: NaiveDateTime,
    pub values: Vec<u32>,
    pub is_partial: bool,
}

#[async_trait]
pub trait TrendProvider: Send + Sync {
    async fn build_payload(&self, query: &TrendQuery) -> Result<TrendPayload, ProviderError>;
    async fn read_series(&self, payload: &TrendPayload) -> Result<Vec<RawTrendRow>, ProviderError>;
    fn name(&self) -> &'static str;
}

/// One interest value (0–100) per keyword at `date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDateTime,
    pub values: Vec<u8>,
}

/// Date-ordered series with unique dates and one column per keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendSeries {
    pub keywords: Vec<String>,
    pub points: Vec<TrendPoint>,
    /// Set when the series was generated locally instead of fetched.
    pub synthetic: bool,
}

impl TrendSeries {
    pub fn empty(keywords: Vec<String>) -> Self {
        Self {
            keywords,
            points: Vec::new(),
            synthetic: false,
        }
    }

    /// Drop partial rows and rows without exactly one value per keyword, clamp
    /// values into 0..=100, order by date and keep the first row for any
    /// repeated date.
    pub fn from_raw(keywords: Vec<String>, rows: Vec<RawTrendRow>) -> Self {
        let width = keywords.len();
        let mut points: Vec<TrendPoint> = rows
            .into_iter()
            .filter(|r| !r.is_partial)
            .filter(|r| {
                let fits = r.values.len() == width;
                if !fits {
                    warn!(
                        time = %r.time,
                        got = r.values.len(),
                        expected = width,
                        "dropping trend row with wrong number of values"
                    );
                }
                fits
            })
            .map(|r| TrendPoint {
                date: r.time,
                values: r.values.into_iter().map(|v| v.min(100) as u8).collect(),
            })
            .collect();
        points.sort_by_key(|p| p.date);
        points.dedup_by_key(|p| p.date);
        Self {
            keywords,
            points,
            synthetic: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }
}

/// Keywords split into the ones sent to the provider and the ones cut off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSelection {
    pub kept: Vec<String>,
    pub dropped: Vec<String>,
}

pub fn select_keywords(keywords: &[String]) -> KeywordSelection {
    let split = keywords.len().min(MAX_KEYWORDS);
    KeywordSelection {
        kept: keywords[..split].to_vec(),
        dropped: keywords[split..].to_vec(),
    }
}

/// Retrying wrapper around a [`TrendProvider`]. Never fails: exhaustion yields an
/// empty series (`fetch`) or a synthetic one (`fetch_safe`).
pub struct TrendSource {
    provider: Arc<dyn TrendProvider>,
    policy: RetryPolicy,
    settle_delay: Duration,
}

impl TrendSource {
    pub fn new(
        provider: Arc<dyn TrendProvider>,
        policy: RetryPolicy,
        settle_delay: Duration,
    ) -> Self {
        Self {
            provider,
            policy,
            settle_delay,
        }
    }

    pub async fn fetch(&self, keywords: &[String], timeframe: Timeframe, geo: &str) -> TrendSeries {
        let selection = select_keywords(keywords);
        if !selection.dropped.is_empty() {
            counter!("trends_keywords_truncated_total").increment(1);
            warn!(
                max = MAX_KEYWORDS,
                dropped = ?selection.dropped,
                "too many keywords; using the first {MAX_KEYWORDS}"
            );
        }
        let kws = selection.kept;
        if kws.is_empty() {
            warn!("no keywords given; skipping trend fetch");
            return TrendSeries::empty(kws);
        }

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.fetch_broadening(&kws, timeframe, geo).await {
                Ok(series) => return series,
                Err(e) => {
                    counter!("trends_fetch_failures_total").increment(1);
                    if !e.is_retryable() {
                        error!(
                            error = %e,
                            provider = self.provider.name(),
                            "unexpected trend provider error"
                        );
                        return TrendSeries::empty(kws);
                    }
                    if attempt > self.policy.max_retries {
                        error!(
                            attempts = attempt,
                            error = %e,
                            provider = self.provider.name(),
                            "trend fetch exhausted retries"
                        );
                        return TrendSeries::empty(kws);
                    }
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        attempt,
                        max = self.policy.max_retries,
                        ?delay,
                        error = %e,
                        "trend fetch failed; retrying"
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    /// Like [`fetch`](Self::fetch) but substitutes a synthetic series for an empty result.
    pub async fn fetch_safe(
        &self,
        keywords: &[String],
        timeframe: Timeframe,
        geo: &str,
    ) -> TrendSeries {
        let series = self.fetch(keywords, timeframe, geo).await;
        if series.is_empty() {
            let kept = select_keywords(keywords).kept;
            return synthetic_series(&kept, Local::now().date_naive());
        }
        series
    }

    /// Query `geo`; when that comes back empty, ask once more worldwide.
    async fn fetch_broadening(
        &self,
        keywords: &[String],
        timeframe: Timeframe,
        geo: &str,
    ) -> Result<TrendSeries, ProviderError> {
        let series = self.query_once(keywords, timeframe, geo).await?;
        if !series.is_empty() {
            info!(points = series.len(), keywords = keywords.len(), geo, "trends fetched");
            return Ok(series);
        }

        warn!(geo, "empty trend data; retrying worldwide");
        let series = self.query_once(keywords, timeframe, "").await?;
        if series.is_empty() {
            warn!("empty trend data returned by provider");
        } else {
            info!(points = series.len(), keywords = keywords.len(), "trends fetched worldwide");
        }
        Ok(series)
    }

    async fn query_once(
        &self,
        keywords: &[String],
        timeframe: Timeframe,
        geo: &str,
    ) -> Result<TrendSeries, ProviderError> {
        counter!("trends_fetch_attempts_total").increment(1);
        let query = TrendQuery {
            keywords: keywords.to_vec(),
            timeframe,
            geo: geo.to_string(),
        };
        let payload = self.provider.build_payload(&query).await?;
        sleep(self.settle_delay).await;
        let rows = self.provider.read_series(&payload).await?;
        Ok(TrendSeries::from_raw(keywords.to_vec(), rows))
    }
}

/// Smoothed random walk per keyword over the last [`SYNTHETIC_WINDOW_DAYS`] days ending at `end`.
pub fn synthetic_series(keywords: &[String], end: NaiveDate) -> TrendSeries {
    synthetic_series_with_rng(keywords, end, &mut rand::rng())
}

pub fn synthetic_series_with_rng<R: Rng>(
    keywords: &[String],
    end: NaiveDate,
    rng: &mut R,
) -> TrendSeries {
    info!(?keywords, "generating synthetic trend series");
    counter!("trends_fallback_total").increment(1);

    let columns: Vec<Vec<u8>> = keywords
        .iter()
        .map(|_| {
            let base: Vec<u32> = (0..SYNTHETIC_WINDOW_DAYS)
                .map(|_| rng.random_range(SYNTHETIC_MIN..=SYNTHETIC_MAX))
                .collect();
            trailing_mean_backfilled(&base, SMOOTHING_WINDOW)
                .into_iter()
                .map(|v| v as u8)
                .collect()
        })
        .collect();

    let start = end - ChronoDuration::days(SYNTHETIC_WINDOW_DAYS as i64 - 1);
    let points = (0..SYNTHETIC_WINDOW_DAYS)
        .map(|i| TrendPoint {
            date: (start + ChronoDuration::days(i as i64)).and_time(chrono::NaiveTime::MIN),
            values: columns.iter().map(|col| col[i]).collect(),
        })
        .collect();

    TrendSeries {
        keywords: keywords.to_vec(),
        points,
        synthetic: true,
    }
}

/// Trailing moving average; the leading positions without a full window take
/// the first defined average.
fn trailing_mean_backfilled(values: &[u32], window: usize) -> Vec<u32> {
    if values.len() < window || window == 0 {
        let mean = if values.is_empty() {
            0
        } else {
            values.iter().sum::<u32>() / values.len() as u32
        };
        return vec![mean; values.len()];
    }
    let mut out = vec![0u32; values.len()];
    for i in (window - 1)..values.len() {
        let sum: u32 = values[i + 1 - window..=i].iter().sum();
        out[i] = sum / window as u32;
    }
    let first = out[window - 1];
    for v in out.iter_mut().take(window - 1) {
        *v = first;
    }
    out
}
