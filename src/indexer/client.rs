//! HTTP clients for the remote index and the text-parsing API
//!
//! Both clients are explicit values constructed at stage start and passed by
//! parameter; there is no process-wide singleton. Authentication rides on
//! the `X-API-KEY` / `X-USER-EMAIL` headers.

use std::collections::HashSet;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::IndexConfig;
use crate::error::IndexError;
use crate::models::{Entity, FormattedJob};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Response envelope used by both APIs
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ReferenceEntry {
    reference: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ParsingData {
    ents: Vec<Entity>,
}

#[derive(Debug, Serialize)]
struct ParsingRequest<'a> {
    text: &'a str,
}

fn build_client(config: &IndexConfig) -> Result<Client, IndexError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        "X-API-KEY",
        HeaderValue::from_str(&config.api_key)
            .map_err(|_| IndexError::MalformedResponse("api_key is not a valid header value".to_string()))?,
    );
    headers.insert(
        "X-USER-EMAIL",
        HeaderValue::from_str(&config.user_email)
            .map_err(|_| IndexError::MalformedResponse("user_email is not a valid header value".to_string()))?,
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    Ok(Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .default_headers(headers)
        .build()?)
}

fn api_root(config: &IndexConfig) -> Result<Url, IndexError> {
    // A trailing slash keeps Url::join from eating the last path segment
    let mut root = config.api_url.clone();
    if !root.ends_with('/') {
        root.push('/');
    }
    Ok(Url::parse(&root)?)
}

/// Client for the remote job index
pub struct IndexClient {
    client: Client,
    api_url: Url,
    board_key: String,
}

impl IndexClient {
    /// Create an index client from the index configuration
    ///
    /// # Errors
    ///
    /// Returns `IndexError` if the API URL is invalid or the HTTP client
    /// cannot be built
    pub fn new(config: &IndexConfig) -> Result<Self, IndexError> {
        Ok(Self {
            client: build_client(config)?,
            api_url: api_root(config)?,
            board_key: config.board_key.clone(),
        })
    }

    /// Fetch every reference already stored in the board
    ///
    /// One query at publish start; the pipeline's effective exactly-once
    /// guarantee rests on this read-back plus reference equality on the url.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::Api` on a non-success status
    pub async fn fetch_indexed_references(&self) -> Result<HashSet<String>, IndexError> {
        let url = self.api_url.join("storing/jobs")?;
        let board_keys = format!("[\"{}\"]", self.board_key);

        let response = self
            .client
            .get(url)
            .query(&[("board_keys", board_keys.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(IndexError::Api {
                endpoint: "storing/jobs",
                status: status.as_u16(),
            });
        }

        let envelope: ApiEnvelope<Vec<ReferenceEntry>> = response.json().await?;
        Ok(envelope
            .data
            .into_iter()
            .filter_map(|entry| entry.reference)
            .collect())
    }

    /// Submit one job document to the board
    ///
    /// The index deduplicates on the `reference` field itself, so a retried
    /// submission of the same url is idempotent on the remote side.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::Api` on a non-success status
    pub async fn index_job(&self, job: &FormattedJob) -> Result<(), IndexError> {
        let url = self.api_url.join("job/indexing")?;

        let response = self
            .client
            .post(url)
            .query(&[("board_key", self.board_key.as_str())])
            .json(job)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(IndexError::Api {
                endpoint: "job/indexing",
                status: status.as_u16(),
            });
        }

        Ok(())
    }
}

/// Client for the text-parsing API that yields skill entity spans
pub struct ParsingClient {
    client: Client,
    api_url: Url,
}

impl ParsingClient {
    /// Create a parsing client from the index configuration
    ///
    /// # Errors
    ///
    /// Returns `IndexError` if the API URL is invalid or the HTTP client
    /// cannot be built
    pub fn new(config: &IndexConfig) -> Result<Self, IndexError> {
        Ok(Self {
            client: build_client(config)?,
            api_url: api_root(config)?,
        })
    }

    /// Parse a description text into entity spans
    ///
    /// Spans are char offsets over the exact text submitted here.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::Api` on a non-success status
    pub async fn parse_text(&self, text: &str) -> Result<Vec<Entity>, IndexError> {
        let url = self.api_url.join("document/parsing")?;

        let response = self
            .client
            .post(url)
            .json(&ParsingRequest { text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(IndexError::Api {
                endpoint: "document/parsing",
                status: status.as_u16(),
            });
        }

        let envelope: ApiEnvelope<ParsingData> = response.json().await?;
        Ok(envelope.data.ents)
    }
}
