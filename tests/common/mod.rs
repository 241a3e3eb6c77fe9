// tests/common/mod.rs
//
// Scripted stub providers and an in-process router builder shared by the
// integration tests. Retry delays are zero so nothing sleeps.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use news_trend_dashboard::config::ApiConfig;
use news_trend_dashboard::error::ProviderError;
use news_trend_dashboard::news::{
    Article, ArticleSource, NewsProvider, NewsSearch, NewsSource,
};
use news_trend_dashboard::orchestrator::{OrchestratorSettings, RequestOrchestrator};
use news_trend_dashboard::retry::RetryPolicy;
use news_trend_dashboard::trends::{
    RawTrendRow, TrendPayload, TrendProvider, TrendQuery, TrendSource,
};
use news_trend_dashboard::{create_router, AppState};

/// What a stub call should return.
#[derive(Clone, Debug)]
pub enum Outcome<T> {
    Ok(T),
    RateLimited,
    Malformed,
    Unexpected,
    MissingKey,
}

impl<T: Clone> Outcome<T> {
    fn resolve(&self) -> Result<T, ProviderError> {
        match self {
            Outcome::Ok(v) => Ok(v.clone()),
            Outcome::RateLimited => Err(ProviderError::RateLimited),
            Outcome::Malformed => Err(ProviderError::Malformed("stub".into())),
            Outcome::Unexpected => Err(ProviderError::Api {
                status: "500".into(),
                message: "stub failure".into(),
            }),
            Outcome::MissingKey => Err(ProviderError::MissingApiKey),
        }
    }
}

/// Pops scripted outcomes; repeats `fallback` once the script is exhausted.
struct Script<T> {
    plan: Mutex<VecDeque<Outcome<T>>>,
    fallback: Outcome<T>,
}

impl<T: Clone> Script<T> {
    fn new(plan: Vec<Outcome<T>>, fallback: Outcome<T>) -> Self {
        Self {
            plan: Mutex::new(plan.into()),
            fallback,
        }
    }

    fn next(&self) -> Result<T, ProviderError> {
        let next = self.plan.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone()).resolve()
    }
}

pub struct StubNews {
    script: Script<Vec<Article>>,
    pub calls: AtomicUsize,
    pub searches: Mutex<Vec<NewsSearch>>,
}

impl StubNews {
    pub fn scripted(
        plan: Vec<Outcome<Vec<Article>>>,
        fallback: Outcome<Vec<Article>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Script::new(plan, fallback),
            calls: AtomicUsize::new(0),
            searches: Mutex::new(Vec::new()),
        })
    }

    pub fn always(outcome: Outcome<Vec<Article>>) -> Arc<Self> {
        Self::scripted(Vec::new(), outcome)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NewsProvider for StubNews {
    async fn search(&self, search: &NewsSearch) -> Result<Vec<Article>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.searches.lock().unwrap().push(search.clone());
        self.script.next()
    }

    fn name(&self) -> &'static str {
        "stub-news"
    }
}

pub struct StubTrends {
    script: Script<Vec<RawTrendRow>>,
    pub queries: Mutex<Vec<TrendQuery>>,
}

impl StubTrends {
    pub fn scripted(
        plan: Vec<Outcome<Vec<RawTrendRow>>>,
        fallback: Outcome<Vec<RawTrendRow>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Script::new(plan, fallback),
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn always(outcome: Outcome<Vec<RawTrendRow>>) -> Arc<Self> {
        Self::scripted(Vec::new(), outcome)
    }

    pub fn queries(&self) -> Vec<TrendQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl TrendProvider for StubTrends {
    async fn build_payload(&self, query: &TrendQuery) -> Result<TrendPayload, ProviderError> {
        self.queries.lock().unwrap().push(query.clone());
        Ok(TrendPayload {
            query: query.clone(),
            request: serde_json::Value::Null,
            token: "stub".into(),
        })
    }

    async fn read_series(
        &self,
        _payload: &TrendPayload,
    ) -> Result<Vec<RawTrendRow>, ProviderError> {
        self.script.next()
    }

    fn name(&self) -> &'static str {
        "stub-trends"
    }
}

/// News provider that panics inside the request.
pub struct PanickingNews;

#[async_trait]
impl NewsProvider for PanickingNews {
    async fn search(&self, _search: &NewsSearch) -> Result<Vec<Article>, ProviderError> {
        panic!("news provider exploded");
    }

    fn name(&self) -> &'static str {
        "panicking-news"
    }
}

pub fn article(title: &str, published_at: &str) -> Article {
    Article {
        title: title.to_string(),
        description: String::new(),
        published_at: published_at.to_string(),
        source: ArticleSource {
            name: "Stub Wire".to_string(),
        },
        url: "https://news.example/a".to_string(),
        content: "Body text".to_string(),
        url_to_image: String::new(),
    }
}

pub fn midnight(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Daily rows for January 2024 with one value per keyword.
pub fn january_rows(days: u32, keywords: usize) -> Vec<RawTrendRow> {
    (1..=days)
        .map(|d| RawTrendRow {
            time: midnight(2024, 1, d),
            values: vec![d * 3; keywords],
            is_partial: false,
        })
        .collect()
}

pub fn news_source(provider: Arc<StubNews>) -> NewsSource {
    NewsSource::new(provider, RetryPolicy::immediate(3))
}

pub fn trend_source(provider: Arc<StubTrends>) -> TrendSource {
    TrendSource::new(provider, RetryPolicy::immediate(3), Duration::ZERO)
}

pub fn app_state(news: Arc<StubNews>, trends: Arc<StubTrends>) -> AppState {
    app_state_with(news, trends)
}

/// Same wiring as [`app_state`] for any news provider.
pub fn app_state_with(news: Arc<dyn NewsProvider>, trends: Arc<StubTrends>) -> AppState {
    let orchestrator = RequestOrchestrator::new(
        NewsSource::new(news, RetryPolicy::immediate(3)),
        trend_source(trends),
        OrchestratorSettings::default(),
    );
    AppState::new(orchestrator, Duration::from_secs(300), ApiConfig::default())
}

pub fn app(news: Arc<StubNews>, trends: Arc<StubTrends>) -> Router {
    create_router(app_state(news, trends))
}
