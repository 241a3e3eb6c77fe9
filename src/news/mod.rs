// src/news/mod.rs
//! News acquisition: article model, provider seam, and the retrying source.

pub mod newsapi;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Local, NaiveDate};
use metrics::counter;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::error::ProviderError;
use crate::retry::RetryPolicy;

pub use newsapi::NewsApiClient;

/// Source name carried by generated placeholder articles.
pub const SYNTHETIC_SOURCE_NAME: &str = "synthetic";
pub const UNKNOWN_SOURCE_NAME: &str = "unknown";
pub const PLACEHOLDER_URL: &str = "#";

const SYNTHETIC_ARTICLE_COUNT: usize = 5;

/// Article as delivered by the news provider. Every field tolerates `null` or absence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Raw provider timestamp; not guaranteed to parse.
    #[serde(default, deserialize_with = "null_as_default")]
    pub published_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: ArticleSource,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url_to_image: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSource {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

impl Article {
    pub fn source_name(&self) -> &str {
        if self.source.name.trim().is_empty() {
            UNKNOWN_SOURCE_NAME
        } else {
            &self.source.name
        }
    }

    pub fn url_or_placeholder(&self) -> &str {
        if self.url.trim().is_empty() {
            PLACEHOLDER_URL
        } else {
            &self.url
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.source.name == SYNTHETIC_SOURCE_NAME
    }

    /// Text used for sentiment: title + description.
    pub fn headline_text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }
}

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// One search call against the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsSearch {
    pub query: String,
    pub from: NaiveDate,
    pub language: String,
    pub sort_by: String,
    pub page_size: u32,
}

#[async_trait]
pub trait NewsProvider: Send + Sync {
    async fn search(&self, search: &NewsSearch) -> Result<Vec<Article>, ProviderError>;
    fn name(&self) -> &'static str;
}

/// Retrying wrapper around a [`NewsProvider`]. Never fails: exhaustion yields an
/// empty list (`fetch`) or placeholder articles (`fetch_safe`).
pub struct NewsSource {
    provider: Arc<dyn NewsProvider>,
    policy: RetryPolicy,
    max_query_days: u32,
    sort_by: String,
    page_size: u32,
}

impl NewsSource {
    pub fn new(provider: Arc<dyn NewsProvider>, policy: RetryPolicy) -> Self {
        Self {
            provider,
            policy,
            max_query_days: 30,
            sort_by: "relevancy".to_string(),
            page_size: 100,
        }
    }

    pub fn with_query_window(mut self, max_query_days: u32) -> Self {
        self.max_query_days = max_query_days.max(1);
        self
    }

    pub fn with_paging(mut self, sort_by: impl Into<String>, page_size: u32) -> Self {
        self.sort_by = sort_by.into();
        self.page_size = page_size;
        self
    }

    /// Build the provider call. The look-back is capped at `max_query_days`
    /// even though callers may ask for up to a year.
    pub fn search_for(
        &self,
        query: &str,
        days: u32,
        language: &str,
        today: NaiveDate,
    ) -> NewsSearch {
        let window = days.clamp(1, self.max_query_days);
        NewsSearch {
            query: query.to_string(),
            from: today - ChronoDuration::days(i64::from(window)),
            language: language.to_string(),
            sort_by: self.sort_by.clone(),
            page_size: self.page_size,
        }
    }

    pub async fn fetch(&self, query: &str, days: u32, language: &str) -> Vec<Article> {
        let search = self.search_for(query, days, language, Local::now().date_naive());
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            counter!("news_fetch_attempts_total").increment(1);

            match self.provider.search(&search).await {
                Ok(articles) => {
                    if articles.is_empty() {
                        warn!(query, attempt, provider = self.provider.name(), "no articles found");
                    } else {
                        info!(
                            query,
                            attempt,
                            count = articles.len(),
                            provider = self.provider.name(),
                            "news fetched"
                        );
                    }
                    return articles;
                }
                Err(ProviderError::MissingApiKey) => {
                    counter!("news_fetch_failures_total").increment(1);
                    error!(provider = self.provider.name(), "news api key missing; not retrying");
                    return Vec::new();
                }
                Err(e) => {
                    counter!("news_fetch_failures_total").increment(1);
                    if attempt > self.policy.max_retries {
                        error!(
                            query,
                            attempts = attempt,
                            error = %e,
                            provider = self.provider.name(),
                            "news fetch exhausted retries"
                        );
                        return Vec::new();
                    }
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        attempt,
                        max = self.policy.max_retries,
                        ?delay,
                        error = %e,
                        "news fetch failed; retrying"
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    /// Like [`fetch`](Self::fetch) but substitutes placeholder articles for an empty result.
    pub async fn fetch_safe(&self, query: &str, days: u32, language: &str) -> Vec<Article> {
        let news = self.fetch(query, days, language).await;
        if news.is_empty() {
            return synthetic_articles(query);
        }
        news
    }
}

/// Placeholder articles mentioning `query`, stamped with the current instant.
pub fn synthetic_articles(query: &str) -> Vec<Article> {
    info!(query, "generating synthetic articles");
    counter!("news_fallback_total").increment(1);

    let now = Local::now().naive_local().format("%Y-%m-%dT%H:%M:%S%.6f").to_string();
    (0..SYNTHETIC_ARTICLE_COUNT)
        .map(|_| Article {
            title: format!("Sample article about {query}"),
            description: format!("This is a simulated description about {query}"),
            published_at: now.clone(),
            source: ArticleSource {
                name: SYNTHETIC_SOURCE_NAME.to_string(),
            },
            url: "https://example.com".to_string(),
            content: format!("Simulated content about {query}..."),
            url_to_image: String::new(),
        })
        .collect()
}
