// src/news/newsapi.rs
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::ProviderError;
use crate::news::{Article, NewsProvider, NewsSearch};

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    status: String,
    #[serde(default)]
    articles: Option<Vec<Article>>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// NewsAPI `/v2/everything` client.
pub struct NewsApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl NewsApiClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn parse_body(status: StatusCode, body: &str) -> Result<Vec<Article>, ProviderError> {
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        let resp: EverythingResponse = serde_json::from_str(body)?;
        if resp.status != "ok" {
            if resp.code.as_deref() == Some("rateLimited") {
                return Err(ProviderError::RateLimited);
            }
            return Err(ProviderError::Api {
                status: resp.code.unwrap_or_else(|| status.as_u16().to_string()),
                message: resp.message.unwrap_or_else(|| "unknown error".to_string()),
            });
        }
        Ok(resp.articles.unwrap_or_default())
    }
}

#[async_trait]
impl NewsProvider for NewsApiClient {
    async fn search(&self, search: &NewsSearch) -> Result<Vec<Article>, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::MissingApiKey);
        }

        let url = format!("{}/everything", self.base_url);
        let resp = self
            .http
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .query(&[
                ("q", search.query.clone()),
                ("from", search.from.format("%Y-%m-%d").to_string()),
                ("language", search.language.clone()),
                ("sortBy", search.sort_by.clone()),
                ("pageSize", search.page_size.to_string()),
            ])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        Self::parse_body(status, &body)
    }

    fn name(&self) -> &'static str {
        "newsapi"
    }
}
