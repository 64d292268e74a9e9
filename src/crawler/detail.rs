//! Detail enricher: second-pass fetch of full descriptions
//!
//! Takes at most `number_to_process` urls that have a summary but no detail
//! record yet, fetches each posting page concurrently, and appends the
//! results to the term's detail checkpoint in one shot at the end of the
//! batch.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};

use crate::config::EnricherConfig;
use crate::crawler::fetcher::PageFetcher;
use crate::error::{FetchError, Result};
use crate::models::{JobDetail, JobSummary};
use crate::parser;
use crate::storage::{read_records, write_records, JobStore};

/// Per-term detail enricher
pub struct DetailEnricher {
    store: JobStore,
    number_to_process: usize,
    fetch_workers: usize,
    timeout: Duration,
}

impl DetailEnricher {
    /// Create an enricher from the enricher configuration
    #[must_use]
    pub fn new(store: JobStore, config: &EnricherConfig) -> Self {
        Self {
            store,
            number_to_process: config.number_to_process,
            fetch_workers: config.fetch_workers,
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    /// Override the per-run batch size
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.number_to_process = limit;
        self
    }

    /// Enrich up to the configured number of not-yet-detailed postings
    ///
    /// The resume set is the summary urls minus the detail urls, in summary
    /// checkpoint order, truncated to the batch size. Running this
    /// repeatedly walks the backlog without ever reprocessing a url.
    ///
    /// Returns the number of detail records added.
    pub async fn enrich(&self, term: &str) -> Result<usize> {
        let started = Instant::now();
        let details_path = self.store.details_path(term);

        let summaries: Vec<JobSummary> = read_records(&self.store.summary_path(term));
        let mut details: Vec<JobDetail> = read_records(&details_path);

        let done: HashSet<&str> = details.iter().map(|d| d.url.as_str()).collect();
        let pending: Vec<String> = summaries
            .iter()
            .map(|s| s.url.clone())
            .filter(|url| !done.contains(url.as_str()))
            .take(self.number_to_process)
            .collect();

        if pending.is_empty() {
            tracing::info!(term, "No postings awaiting enrichment");
            return Ok(0);
        }

        tracing::info!(
            term,
            pending = pending.len(),
            workers = self.fetch_workers,
            "Starting detail enrichment batch"
        );

        let results: Vec<_> = stream::iter(pending.into_iter().map(|url| self.fetch_detail(url)))
            .buffer_unordered(self.fetch_workers)
            .collect()
            .await;

        let mut added = 0usize;
        for result in results {
            match result {
                Ok(detail) => {
                    details.push(detail);
                    added += 1;
                }
                // One url's failure never aborts its siblings
                Err((url, e)) => {
                    tracing::warn!(url = %url, error = %e, "Detail fetch failed, skipping url");
                }
            }
        }

        // Single persist at batch end; the batch is small enough that
        // full-loss-on-crash is an accepted trade against mid-batch locking
        write_records(&details_path, &details)?;

        tracing::info!(
            term,
            added,
            total = details.len(),
            elapsed_secs = started.elapsed().as_secs(),
            "Completed detail enrichment"
        );

        Ok(added)
    }

    /// Fetch and extract one posting page in its own isolated session
    async fn fetch_detail(&self, url: String) -> std::result::Result<JobDetail, (String, FetchError)> {
        // Fresh session per url: sessions are not shared across concurrent
        // fetch tasks, and the fetcher is dropped at task end
        let fetcher = match PageFetcher::isolated(self.timeout) {
            Ok(fetcher) => fetcher,
            Err(e) => return Err((url, e)),
        };

        match fetcher.fetch(&url).await {
            Ok(html) => Ok(parser::extract_detail(&html, &url)),
            Err(e) => Err((url, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn summary(url: &str) -> JobSummary {
        JobSummary {
            url: url.to_string(),
            name: String::new(),
            company: String::new(),
            location: String::new(),
            creation_date: String::new(),
            summary: String::new(),
            saved_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        }
    }

    fn detail(url: &str) -> JobDetail {
        JobDetail {
            url: url.to_string(),
            description: String::new(),
            salary_info: String::new(),
        }
    }

    /// Resume-set computation mirrored from `enrich`, kept testable without
    /// network access
    fn pending(summaries: &[JobSummary], details: &[JobDetail], limit: usize) -> Vec<String> {
        let done: HashSet<&str> = details.iter().map(|d| d.url.as_str()).collect();
        summaries
            .iter()
            .map(|s| s.url.clone())
            .filter(|url| !done.contains(url.as_str()))
            .take(limit)
            .collect()
    }

    #[test]
    fn test_resume_set_excludes_detailed_urls() {
        let summaries: Vec<_> = (1..=5).map(|i| summary(&format!("https://x/{i}"))).collect();
        let details = vec![detail("https://x/1"), detail("https://x/3"), detail("https://x/5")];

        let todo = pending(&summaries, &details, 100);
        assert_eq!(todo, vec!["https://x/2", "https://x/4"]);
    }

    #[test]
    fn test_resume_set_truncated_to_batch_size() {
        let summaries: Vec<_> = (1..=5).map(|i| summary(&format!("https://x/{i}"))).collect();
        let details = vec![detail("https://x/3")];

        let todo = pending(&summaries, &details, 2);
        assert_eq!(todo, vec!["https://x/1", "https://x/2"]);
    }
}
