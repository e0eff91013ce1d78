use std::time::Duration;

use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// PostgreSQL connection URL for reader profiles; the seeded in-memory store is used when unset
    #[serde(default)]
    pub database_url: Option<String>,

    /// Redis connection URL for the catalog response cache; caching is off when unset
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Bibliographic catalog base URL
    #[serde(default = "default_catalog_api_url")]
    pub catalog_api_url: String,

    /// Timeout applied to each individual catalog call
    #[serde(default = "default_catalog_timeout_secs")]
    pub catalog_timeout_secs: u64,

    /// Shared deadline for a whole recommendation request
    #[serde(default = "default_request_deadline_secs")]
    pub request_deadline_secs: u64,

    /// Concurrent author searches
    #[serde(default = "default_author_concurrency")]
    pub author_concurrency: usize,

    /// Concurrent author-works fetches
    #[serde(default = "default_subject_concurrency")]
    pub subject_concurrency: usize,

    /// Concurrent edition/description fetches
    #[serde(default = "default_book_concurrency")]
    pub book_concurrency: usize,

    #[serde(default = "default_author_works_limit")]
    pub author_works_limit: usize,

    #[serde(default = "default_subject_works_limit")]
    pub subject_works_limit: usize,

    #[serde(default = "default_editions_limit")]
    pub editions_limit: usize,

    #[serde(default = "default_max_recommendations")]
    pub max_recommendations: usize,

    /// Width of the "in print" window, in years before the current one
    #[serde(default = "default_recency_window_years")]
    pub recency_window_years: i32,

    /// TTL for cached catalog responses
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_catalog_api_url() -> String {
    "https://openlibrary.org".to_string()
}

fn default_catalog_timeout_secs() -> u64 {
    10
}

fn default_request_deadline_secs() -> u64 {
    30
}

fn default_author_concurrency() -> usize {
    10
}

fn default_subject_concurrency() -> usize {
    20
}

fn default_book_concurrency() -> usize {
    10
}

fn default_author_works_limit() -> usize {
    100
}

fn default_subject_works_limit() -> usize {
    50
}

fn default_editions_limit() -> usize {
    50
}

fn default_max_recommendations() -> usize {
    3
}

fn default_recency_window_years() -> i32 {
    2
}

fn default_cache_ttl_secs() -> u64 {
    86_400
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects limits that would stall or disable a pipeline stage
    pub fn validate(&self) -> anyhow::Result<()> {
        let positive = [
            ("AUTHOR_CONCURRENCY", self.author_concurrency),
            ("SUBJECT_CONCURRENCY", self.subject_concurrency),
            ("BOOK_CONCURRENCY", self.book_concurrency),
            ("AUTHOR_WORKS_LIMIT", self.author_works_limit),
            ("SUBJECT_WORKS_LIMIT", self.subject_works_limit),
            ("EDITIONS_LIMIT", self.editions_limit),
            ("MAX_RECOMMENDATIONS", self.max_recommendations),
        ];
        for (name, value) in positive {
            if value == 0 {
                anyhow::bail!("{} must be greater than zero", name);
            }
        }
        if self.request_deadline_secs == 0 || self.catalog_timeout_secs == 0 {
            anyhow::bail!("REQUEST_DEADLINE_SECS and CATALOG_TIMEOUT_SECS must be greater than zero");
        }
        if self.recency_window_years < 0 {
            anyhow::bail!("RECENCY_WINDOW_YEARS cannot be negative");
        }
        Ok(())
    }

    pub fn request_deadline(&self) -> Duration {
        Duration::from_secs(self.request_deadline_secs)
    }

    pub fn catalog_timeout(&self) -> Duration {
        Duration::from_secs(self.catalog_timeout_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
