// src/config.rs
//! Application configuration: TOML file + environment overrides.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::RetryPolicy;

pub const ENV_CONFIG_PATH: &str = "APP_CONFIG_PATH";
pub const ENV_NEWS_API_KEY: &str = "NEWS_API_KEY";
pub const DEFAULT_CONFIG_PATH: &str = "config/app.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub news: NewsConfig,
    pub trends: TrendsConfig,
    pub http: HttpConfig,
    pub cache: CacheConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    pub base_url: String,
    /// "ENV" (or empty) means: read from NEWS_API_KEY.
    pub api_key: String,
    pub language: String,
    pub sort_by: String,
    pub page_size: u32,
    /// Upper bound on the look-back window sent to the provider.
    pub max_query_days: u32,
    pub max_retries: u32,
    pub retry_delay_secs: u64,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://newsapi.org/v2".to_string(),
            api_key: "ENV".to_string(),
            language: "pt".to_string(),
            sort_by: "relevancy".to_string(),
            page_size: 100,
            max_query_days: 30,
            max_retries: 3,
            retry_delay_secs: 2,
        }
    }
}

impl NewsConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(self.max_retries, Duration::from_secs(self.retry_delay_secs))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrendsConfig {
    pub base_url: String,
    pub hl: String,
    /// Timezone offset in minutes, as the provider expects it.
    pub tz: i32,
    pub geo: String,
    pub max_retries: u32,
    pub retry_delay_secs: u64,
}

impl Default for TrendsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://trends.google.com/trends/api".to_string(),
            hl: "pt-BR".to_string(),
            tz: 180,
            geo: "BR".to_string(),
            max_retries: 3,
            retry_delay_secs: 2,
        }
    }
}

impl TrendsConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::linear(self.max_retries, Duration::from_secs(self.retry_delay_secs))
    }

    /// Pause between building a query and reading its series.
    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            timeout_secs: 25,
            user_agent: "news-trend-dashboard/0.1".to_string(),
        }
    }
}

impl HttpConfig {
    pub fn client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(self.user_agent.clone())
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .context("building http client")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// 0 disables the response cache.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 300 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub default_query: String,
    pub default_days: u32,
    pub max_news: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            default_query: "tecnologia".to_string(),
            default_days: 7,
            max_news: 10,
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: AppConfig = toml::from_str(s).context("parsing app config toml")?;
        cfg.sanitize();
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&raw)
    }

    /// Lookup order:
    /// 1) $APP_CONFIG_PATH (must exist)
    /// 2) config/app.toml
    /// 3) built-in defaults
    ///
    /// The news api key is resolved from the environment afterwards.
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                Self::load_from(&default_path)?
            } else {
                AppConfig::default()
            }
        };
        cfg.resolve_api_key();
        Ok(cfg)
    }

    fn resolve_api_key(&mut self) {
        let key = self.news.api_key.trim();
        if key.is_empty() || key.eq_ignore_ascii_case("env") {
            self.news.api_key = std::env::var(ENV_NEWS_API_KEY).unwrap_or_default();
        }
        if self.news.api_key.is_empty() {
            tracing::warn!("{ENV_NEWS_API_KEY} not set; news requests will fail and degrade");
        }
    }

    fn sanitize(&mut self) {
        self.news.max_query_days = self.news.max_query_days.clamp(1, 365);
        self.news.page_size = self.news.page_size.clamp(1, 100);
        if self.api.default_days == 0 || self.api.default_days > 365 {
            self.api.default_days = ApiConfig::default().default_days;
        }
        if self.api.default_query.trim().is_empty() {
            self.api.default_query = ApiConfig::default().default_query;
        }
    }
}
