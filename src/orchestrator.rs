// src/orchestrator.rs
//! Per-request pipeline: news → trends → sentiment + correlation → charts → payload.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{info, warn};

use crate::chart::{line_chart, pie_chart, ChartSpec};
use crate::config::{ApiConfig, AppConfig};
use crate::correlate::TrendCorrelator;
use crate::dates::display_date;
use crate::news::{Article, NewsApiClient, NewsSource};
use crate::sentiment::{SentimentAnalyzer, SentimentRecord};
use crate::stats::ColumnSummary;
use crate::timeframe;
use crate::trends::{GoogleTrendsClient, TrendSource};

const CONTENT_PREVIEW_CHARS: usize = 200;

/// Parsed `/api/news` parameters. Build only after [`crate::validate::ParamRules`] passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsRequest {
    pub query: String,
    pub days: u32,
    /// Keyword string as given (used in chart titles).
    pub keywords_raw: String,
    pub keywords: Vec<String>,
}

impl NewsRequest {
    pub fn from_params(params: &HashMap<String, String>, defaults: &ApiConfig) -> Self {
        let query = params
            .get("query")
            .filter(|q| !q.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| defaults.default_query.clone());
        let days = params
            .get("days")
            .and_then(|d| d.parse::<u32>().ok())
            .unwrap_or(defaults.default_days);
        let keywords_raw = params
            .get("keywords")
            .filter(|k| !k.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| query.clone());
        let keywords = split_keywords(&keywords_raw, &query);

        Self {
            query,
            days,
            keywords_raw,
            keywords,
        }
    }
}

/// Comma-separated list, trimmed, empties dropped; falls back to `query`.
pub fn split_keywords(raw: &str, query: &str) -> Vec<String> {
    let kws: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect();
    if kws.is_empty() {
        vec![query.trim().to_string()]
    } else {
        kws
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedArticle {
    pub title: String,
    pub source: String,
    pub date: String,
    pub url: String,
    pub content: String,
    pub image: String,
}

impl From<&Article> for FormattedArticle {
    fn from(a: &Article) -> Self {
        let content = if a.content.is_empty() {
            String::new()
        } else {
            let preview: String = a.content.chars().take(CONTENT_PREVIEW_CHARS).collect();
            format!("{preview}...")
        };
        Self {
            title: a.title.clone(),
            source: a.source_name().to_string(),
            date: display_date(&a.published_at),
            url: a.url_or_placeholder().to_string(),
            content,
            image: a.url_to_image.clone(),
        }
    }
}

pub fn format_news(articles: &[Article]) -> Vec<FormattedArticle> {
    articles.iter().map(FormattedArticle::from).collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct Analytics {
    pub sentiment: Vec<SentimentRecord>,
    pub trends: BTreeMap<String, ColumnSummary>,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Visualizations {
    pub trend_graph: ChartSpec,
    pub sentiment_graph: ChartSpec,
}

/// Serializes as the inner value, or `{}` when empty.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Section<T> {
    Filled(T),
    Empty {},
}

#[derive(Debug, Clone, Serialize)]
pub struct NewsResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub news: Vec<FormattedArticle>,
    pub analytics: Section<Analytics>,
    pub visualizations: Section<Visualizations>,
}

impl NewsResponse {
    pub fn no_news() -> Self {
        Self {
            status: "success",
            message: Some("No news found".to_string()),
            news: Vec::new(),
            analytics: Section::Empty {},
            visualizations: Section::Empty {},
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub language: String,
    pub geo: String,
    pub max_news: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            language: "pt".to_string(),
            geo: "BR".to_string(),
            max_news: 10,
        }
    }
}

pub struct RequestOrchestrator {
    news: NewsSource,
    trends: TrendSource,
    sentiment: SentimentAnalyzer,
    correlator: TrendCorrelator,
    settings: OrchestratorSettings,
}

impl RequestOrchestrator {
    pub fn new(news: NewsSource, trends: TrendSource, settings: OrchestratorSettings) -> Self {
        Self {
            news,
            trends,
            sentiment: SentimentAnalyzer::new(),
            correlator: TrendCorrelator::new(),
            settings,
        }
    }

    pub fn with_sentiment(mut self, sentiment: SentimentAnalyzer) -> Self {
        self.sentiment = sentiment;
        self
    }

    /// Wire live NewsAPI + Google Trends clients from configuration.
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let news_http = cfg.http.client().context("news http client")?;
        let trends_http = cfg.http.client().context("trends http client")?;

        let news_client = NewsApiClient::new(news_http, &cfg.news.base_url, &cfg.news.api_key);
        let news = NewsSource::new(Arc::new(news_client), cfg.news.retry_policy())
            .with_query_window(cfg.news.max_query_days)
            .with_paging(&cfg.news.sort_by, cfg.news.page_size);

        let trends_client = GoogleTrendsClient::new(
            trends_http,
            &cfg.trends.base_url,
            &cfg.trends.hl,
            cfg.trends.tz,
        );
        let trends = TrendSource::new(
            Arc::new(trends_client),
            cfg.trends.retry_policy(),
            cfg.trends.settle_delay(),
        );

        let settings = OrchestratorSettings {
            language: cfg.news.language.clone(),
            geo: cfg.trends.geo.clone(),
            max_news: cfg.api.max_news,
        };
        Ok(Self::new(news, trends, settings))
    }

    pub async fn run(&self, req: &NewsRequest) -> Result<NewsResponse> {
        let articles = self
            .news
            .fetch(&req.query, req.days, &self.settings.language)
            .await;
        if articles.is_empty() {
            warn!(query = %req.query, "no news found for query");
            return Ok(NewsResponse::no_news());
        }

        let tf = timeframe::convert(i64::from(req.days));
        let series = self
            .trends
            .fetch_safe(&req.keywords, tf, &self.settings.geo)
            .await;

        let counts = self.sentiment.analyze(&articles);
        let table = self.correlator.correlate(&articles, &series);

        let trend_graph = line_chart(
            &table,
            0,
            &format!("Search trend: {}", req.keywords_raw),
            "Date",
            "Interest",
        )
        .context("trend table has no keyword column to plot")?;
        let sentiment_graph = pie_chart(&counts, "Sentiment analysis");

        info!(
            query = %req.query,
            articles = articles.len(),
            trend_points = table.rows.len(),
            synthetic_trends = series.synthetic,
            "news request assembled"
        );

        let shown = articles.len().min(self.settings.max_news);
        Ok(NewsResponse {
            status: "success",
            message: None,
            news: format_news(&articles[..shown]),
            analytics: Section::Filled(Analytics {
                sentiment: counts.records(),
                trends: table.summary(),
                keywords: req.keywords.clone(),
            }),
            visualizations: Section::Filled(Visualizations {
                trend_graph,
                sentiment_graph,
            }),
        })
    }
}
