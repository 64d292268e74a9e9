//! Publication stage: merge, dedup against the remote index, normalize,
//! publish
//!
//! The publisher joins a term's summary and detail checkpoints, skips every
//! url the index already holds, and submits the rest one document at a
//! time. A single job's failure is logged and skipped; only the inability
//! to read the remote reference set aborts the run, since without it the
//! dedup guarantee is void.

pub mod client;
pub mod format;

pub use client::{IndexClient, ParsingClient};
pub use format::{extract_salary_tags, format_job, format_skills, normalize_creation_date};

use std::collections::HashMap;
use std::time::Instant;

use crate::config::IndexConfig;
use crate::error::{Error, Result};
use crate::models::{JobDetail, JobSummary, SavedJob};
use crate::storage::{append_records, read_records, JobStore};

/// Publishes enriched postings into the remote index
pub struct Publisher {
    index: IndexClient,
    parsing: ParsingClient,
    store: JobStore,
}

impl Publisher {
    /// Create a publisher from the index configuration
    ///
    /// # Errors
    ///
    /// Returns a config error when credentials are missing, or an index
    /// error when the clients cannot be built
    pub fn new(store: JobStore, config: &IndexConfig) -> Result<Self> {
        if config.api_key.is_empty() || config.user_email.is_empty() || config.board_key.is_empty()
        {
            return Err(Error::config(
                "api_key, user_email and board_key are required to publish",
            ));
        }

        Ok(Self {
            index: IndexClient::new(config)?,
            parsing: ParsingClient::new(config)?,
            store,
        })
    }

    /// Publish every enriched, not-yet-indexed posting for one term
    ///
    /// Returns the number of jobs accepted by the index this run.
    pub async fn publish(&self, term: &str) -> Result<usize> {
        let started = Instant::now();

        let summaries: Vec<JobSummary> = read_records(&self.store.summary_path(term));
        let details: HashMap<String, JobDetail> =
            read_records::<JobDetail>(&self.store.details_path(term))
                .into_iter()
                .map(|d| (d.url.clone(), d))
                .collect();

        // One read-back at startup; everything already stored is skipped
        let indexed = self.index.fetch_indexed_references().await?;
        tracing::info!(
            term,
            local = summaries.len(),
            remote = indexed.len(),
            "Starting publish run"
        );

        let mut published: Vec<SavedJob> = Vec::new();

        for summary in &summaries {
            if indexed.contains(&summary.url) {
                tracing::debug!(url = %summary.url, "Already indexed, skipping");
                continue;
            }

            let Some(detail) = details.get(&summary.url) else {
                tracing::debug!(url = %summary.url, "Not enriched yet, skipping");
                continue;
            };

            match self.publish_one(summary, detail).await {
                Ok(()) => {
                    tracing::info!(url = %summary.url, "Indexed job");
                    published.push(SavedJob {
                        summary: summary.clone(),
                        description: detail.description.clone(),
                        salary_info: detail.salary_info.clone(),
                    });
                }
                // One bad job never aborts the run
                Err(e) => {
                    tracing::warn!(url = %summary.url, error = %e, "Failed to index job, skipping");
                }
            }
        }

        let count = published.len();
        if count > 0 {
            append_records(&self.store.saved_jobs_path(), published)?;
        }

        tracing::info!(
            term,
            published = count,
            elapsed_secs = started.elapsed().as_secs(),
            "Completed publish run"
        );

        Ok(count)
    }

    /// Format, parse skills for, and submit a single posting
    async fn publish_one(&self, summary: &JobSummary, detail: &JobDetail) -> Result<()> {
        let entities = self.parsing.parse_text(&detail.description).await?;
        let skills = format::format_skills(&detail.description, &entities);
        let job = format::format_job(summary, detail, skills)?;
        self.index.index_job(&job).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publisher_requires_credentials() {
        let store = JobStore::new("data");
        let config = IndexConfig {
            api_url: "https://api.example.com/v1/".to_string(),
            api_key: String::new(),
            user_email: "user@example.com".to_string(),
            board_key: "board".to_string(),
        };

        assert!(Publisher::new(store, &config).is_err());
    }
}
