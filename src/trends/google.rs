// src/trends/google.rs
//! Google Trends client speaking the two-step widget protocol:
//! `explore` returns a TIMESERIES widget (request + token), `widgetdata/multiline`
//! returns the interest-over-time rows for it.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use crate::dates::from_unix;
use crate::error::ProviderError;
use crate::trends::{RawTrendRow, TrendPayload, TrendProvider, TrendQuery};

#[derive(Debug, Deserialize)]
struct ExploreResponse {
    #[serde(default)]
    widgets: Vec<Widget>,
}

#[derive(Debug, Deserialize)]
struct Widget {
    id: String,
    #[serde(default)]
    request: serde_json::Value,
    #[serde(default)]
    token: String,
}

#[derive(Debug, Deserialize)]
struct MultilineResponse {
    default: Timeline,
}

#[derive(Debug, Deserialize)]
struct Timeline {
    #[serde(rename = "timelineData", default)]
    timeline_data: Vec<TimelinePoint>,
}

#[derive(Debug, Deserialize)]
struct TimelinePoint {
    time: String,
    #[serde(default)]
    value: Vec<u32>,
    #[serde(rename = "isPartial", default)]
    is_partial: bool,
}

pub struct GoogleTrendsClient {
    http: reqwest::Client,
    base_url: String,
    hl: String,
    tz: i32,
}

impl GoogleTrendsClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        hl: impl Into<String>,
        tz: i32,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            hl: hl.into(),
            tz,
        }
    }

    fn explore_request(query: &TrendQuery) -> serde_json::Value {
        let items: Vec<serde_json::Value> = query
            .keywords
            .iter()
            .map(|kw| {
                json!({
                    "keyword": kw,
                    "time": query.timeframe.provider_token(),
                    "geo": query.geo,
                })
            })
            .collect();
        json!({ "comparisonItem": items, "category": 0, "property": "" })
    }

    async fn get_text(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<String, ProviderError> {
        let url = format!("{}/{}", self.base_url, path);
        let resp = self.http.get(&url).query(params).send().await?;
        check_status(resp.status())?;
        Ok(resp.text().await?)
    }

    fn parse_explore(query: &TrendQuery, body: &str) -> Result<TrendPayload, ProviderError> {
        let explore: ExploreResponse = serde_json::from_str(strip_guard(body)?)?;
        let widget = explore
            .widgets
            .into_iter()
            .find(|w| w.id == "TIMESERIES")
            .ok_or_else(|| ProviderError::Malformed("no TIMESERIES widget".to_string()))?;
        Ok(TrendPayload {
            query: query.clone(),
            request: widget.request,
            token: widget.token,
        })
    }

    fn parse_multiline(body: &str) -> Result<Vec<RawTrendRow>, ProviderError> {
        let parsed: MultilineResponse = serde_json::from_str(strip_guard(body)?)?;
        parsed
            .default
            .timeline_data
            .into_iter()
            .map(|p| {
                let secs: i64 = p
                    .time
                    .parse()
                    .map_err(|_| ProviderError::Malformed(format!("bad timestamp {:?}", p.time)))?;
                let time = from_unix(secs).ok_or_else(|| {
                    ProviderError::Malformed(format!("timestamp out of range {secs}"))
                })?;
                Ok(RawTrendRow {
                    time,
                    values: p.value,
                    is_partial: p.is_partial,
                })
            })
            .collect()
    }
}

/// Any non-success status is retryable; 429 is reported as rate limiting.
fn check_status(status: StatusCode) -> Result<(), ProviderError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ProviderError::RateLimited);
    }
    if !status.is_success() {
        return Err(ProviderError::Unavailable {
            status: status.as_u16(),
        });
    }
    Ok(())
}

/// Responses start with an anti-hijacking prefix like `)]}',`; skip to the JSON object.
fn strip_guard(body: &str) -> Result<&str, ProviderError> {
    body.find('{')
        .map(|i| &body[i..])
        .ok_or_else(|| ProviderError::Malformed("no json object in response".to_string()))
}

#[async_trait]
impl TrendProvider for GoogleTrendsClient {
    async fn build_payload(&self, query: &TrendQuery) -> Result<TrendPayload, ProviderError> {
        let req = Self::explore_request(query).to_string();
        let body = self
            .get_text(
                "explore",
                &[("hl", self.hl.clone()), ("tz", self.tz.to_string()), ("req", req)],
            )
            .await?;
        Self::parse_explore(query, &body)
    }

    async fn read_series(&self, payload: &TrendPayload) -> Result<Vec<RawTrendRow>, ProviderError> {
        let body = self
            .get_text(
                "widgetdata/multiline",
                &[
                    ("hl", self.hl.clone()),
                    ("tz", self.tz.to_string()),
                    ("req", payload.request.to_string()),
                    ("token", payload.token.clone()),
                ],
            )
            .await?;
        Self::parse_multiline(&body)
    }

    fn name(&self) -> &'static str {
        "google-trends"
    }
}
