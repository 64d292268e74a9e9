//! Configuration management for the jobflow pipeline
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files. Search terms are an external input: a
//! newline-delimited file referenced by the crawler section.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Listing crawler configuration
    pub crawler: CrawlerConfig,

    /// Detail enricher configuration
    pub enricher: EnricherConfig,

    /// Remote index configuration
    pub index: IndexConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Listing-crawler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Root URL of the listing site
    pub site_url: String,

    /// Directory holding the per-term checkpoint files
    pub data_dir: PathBuf,

    /// Newline-delimited file of search terms
    pub terms_path: PathBuf,

    /// Checkpoint the summary mapping every N accumulated cards
    pub checkpoint_interval: usize,

    /// Worker pool size for per-card field extraction
    pub extract_workers: usize,

    /// Rate limit (requests per second)
    pub rate_limit: u32,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,
}

/// Detail-enricher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnricherConfig {
    /// Maximum number of not-yet-enriched urls to process per run
    pub number_to_process: usize,

    /// Worker pool size for concurrent detail fetches
    pub fetch_workers: usize,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,
}

/// Remote index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// API root URL
    pub api_url: String,

    /// API key (X-API-KEY header)
    pub api_key: String,

    /// User email (X-USER-EMAIL header)
    pub user_email: String,

    /// Board identifier the jobs are published under
    pub board_key: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let site_url = std::env::var("JOBFLOW_SITE_URL")
            .unwrap_or_else(|_| String::from("https://uk.indeed.com/"));

        let data_dir: PathBuf = std::env::var("JOBFLOW_DATA_DIR")
            .unwrap_or_else(|_| String::from("data"))
            .into();

        let terms_path: PathBuf = std::env::var("JOBFLOW_TERMS_PATH")
            .unwrap_or_else(|_| String::from("data/professions.txt"))
            .into();

        let checkpoint_interval = std::env::var("JOBFLOW_CHECKPOINT_INTERVAL")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(90);

        let extract_workers = std::env::var("JOBFLOW_EXTRACT_WORKERS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(15);

        let rate_limit = std::env::var("JOBFLOW_RATE_LIMIT")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(5);

        let request_timeout_secs = std::env::var("JOBFLOW_REQUEST_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        let number_to_process = std::env::var("JOBFLOW_BATCH_SIZE")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(100);

        let fetch_workers = std::env::var("JOBFLOW_FETCH_WORKERS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(100);

        let api_url = std::env::var("JOBFLOW_API_URL")
            .unwrap_or_else(|_| String::from("https://api.hrflow.ai/v1/"));

        let api_key = std::env::var("JOBFLOW_API_KEY").unwrap_or_default();
        let user_email = std::env::var("JOBFLOW_USER_EMAIL").unwrap_or_default();
        let board_key = std::env::var("JOBFLOW_BOARD_KEY").unwrap_or_default();

        let level = std::env::var("JOBFLOW_LOG_LEVEL").unwrap_or_else(|_| String::from("info"));
        let format = std::env::var("JOBFLOW_LOG_FORMAT").unwrap_or_else(|_| String::from("text"));

        Ok(Self {
            crawler: CrawlerConfig {
                site_url,
                data_dir,
                terms_path,
                checkpoint_interval,
                extract_workers,
                rate_limit,
                request_timeout_secs,
            },
            enricher: EnricherConfig {
                number_to_process,
                fetch_workers,
                request_timeout_secs,
            },
            index: IndexConfig {
                api_url,
                api_key,
                user_email,
                board_key,
            },
            logging: LoggingConfig { level, format },
        })
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.crawler.site_url.is_empty() {
            anyhow::bail!("site_url must not be empty");
        }

        if self.crawler.checkpoint_interval == 0 {
            anyhow::bail!("checkpoint_interval must be greater than 0");
        }

        if self.crawler.extract_workers == 0 {
            anyhow::bail!("extract_workers must be greater than 0");
        }

        if self.crawler.rate_limit == 0 {
            anyhow::bail!("rate_limit must be greater than 0");
        }

        if self.enricher.fetch_workers == 0 {
            anyhow::bail!("fetch_workers must be greater than 0");
        }

        Ok(())
    }

    /// Read the newline-delimited search terms file
    ///
    /// Blank lines are skipped; surrounding whitespace is trimmed.
    pub fn search_terms(&self) -> Result<Vec<String>> {
        let content = std::fs::read_to_string(&self.crawler.terms_path).with_context(|| {
            format!(
                "Failed to read search terms file: {}",
                self.crawler.terms_path.display()
            )
        })?;

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Get crawler request timeout as Duration
    #[must_use]
    pub fn crawler_timeout(&self) -> Duration {
        Duration::from_secs(self.crawler.request_timeout_secs)
    }

    /// Get enricher request timeout as Duration
    #[must_use]
    pub fn enricher_timeout(&self) -> Duration {
        Duration::from_secs(self.enricher.request_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawler: CrawlerConfig {
                site_url: String::from("https://uk.indeed.com/"),
                data_dir: PathBuf::from("data"),
                terms_path: PathBuf::from("data/professions.txt"),
                checkpoint_interval: 90,
                extract_workers: 15,
                rate_limit: 5,
                request_timeout_secs: 30,
            },
            enricher: EnricherConfig {
                number_to_process: 100,
                fetch_workers: 100,
                request_timeout_secs: 30,
            },
            index: IndexConfig {
                api_url: String::from("https://api.hrflow.ai/v1/"),
                api_key: String::new(),
                user_email: String::new(),
                board_key: String::new(),
            },
            logging: LoggingConfig {
                level: String::from("info"),
                format: String::from("text"),
            },
        }
    }
}
