//! Listing crawler with pagination and per-run deduplication
//!
//! Walks a term's search results page by page, folds newly seen postings
//! into a url-keyed mapping, and checkpoints that mapping periodically. The
//! page loop is strictly sequential (one live session); per-card field
//! extraction fans out into a bounded worker pool over static card
//! fragments.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use chrono::{Local, NaiveDate};
use futures::stream::{self, StreamExt};
use scraper::Html;
use url::Url;

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::PageFetcher;
use crate::error::{Error, Result};
use crate::models::JobSummary;
use crate::parser;
use crate::storage::{read_records, write_records, JobStore};

/// Outcome of loading one results page
///
/// Exhaustion (missing results container, fetch failure, no pagination
/// control) is a normal terminal state, never a propagating failure.
enum PageOutcome {
    /// Results container present: card fragments plus the next-page url
    Loaded {
        cards: Vec<String>,
        next: Option<String>,
    },
    /// No more results for this term
    Exhausted,
}

/// Per-term listing crawler
pub struct ListingCrawler {
    fetcher: PageFetcher,
    site: Url,
    store: JobStore,
    checkpoint_interval: usize,
    extract_workers: usize,
}

impl ListingCrawler {
    /// Create a crawler from the listing configuration
    ///
    /// # Errors
    ///
    /// Returns a config error for an unparseable site url, or a fetch error
    /// if the HTTP client cannot be built
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        let site = Url::parse(&config.site_url)
            .map_err(|e| Error::config(format!("Invalid site_url {:?}: {e}", config.site_url)))?;

        if config.checkpoint_interval == 0 {
            return Err(Error::config("checkpoint_interval must be greater than 0"));
        }

        let fetcher = PageFetcher::new(config.rate_limit, config_timeout(config))?;

        Ok(Self {
            fetcher,
            site,
            store: JobStore::new(&config.data_dir),
            checkpoint_interval: config.checkpoint_interval,
            extract_workers: config.extract_workers,
        })
    }

    /// Crawl all result pages for one search term
    ///
    /// `known_urls` seeds the dedup gate with every posting captured by any
    /// prior run under any term. The term's own checkpoint is loaded first,
    /// so an interrupted crawl resumes instead of re-capturing.
    ///
    /// Returns the number of postings newly captured for this term.
    pub async fn crawl(&self, term: &str, known_urls: &HashSet<String>) -> Result<usize> {
        let started = Instant::now();
        let path = self.store.summary_path(term);

        let mut jobs: HashMap<String, JobSummary> = read_records::<JobSummary>(&path)
            .into_iter()
            .map(|job| (job.url.clone(), job))
            .collect();
        let resumed = jobs.len();

        let saved_date = Local::now().date_naive();
        let mut page_url = self.search_url(term);
        let mut cards_seen = 0usize;
        let mut pages = 0u32;

        loop {
            match self.load_page(&page_url).await {
                PageOutcome::Exhausted => {
                    tracing::info!(term, pages, "No more results");
                    break;
                }
                PageOutcome::Loaded { cards, next } => {
                    pages += 1;
                    let batch = cards.len();

                    // Dedup gate input: cross-run seed set plus everything
                    // already captured in this run
                    let known: Arc<HashSet<String>> = Arc::new(
                        known_urls
                            .iter()
                            .cloned()
                            .chain(jobs.keys().cloned())
                            .collect(),
                    );

                    for summary in self.extract_batch(cards, known, saved_date).await {
                        jobs.insert(summary.url.clone(), summary);
                    }

                    let before = cards_seen;
                    cards_seen += batch;
                    if interval_crossed(before, cards_seen, self.checkpoint_interval) {
                        self.checkpoint(&path, &jobs)?;
                    }

                    tracing::debug!(term, page = pages, cards = batch, total = jobs.len(), "Processed results page");

                    match next {
                        Some(url) => page_url = url,
                        None => {
                            tracing::info!(term, pages, "No next-page control");
                            break;
                        }
                    }
                }
            }
        }

        self.checkpoint(&path, &jobs)?;

        let new_jobs = jobs.len() - resumed;
        tracing::info!(
            term,
            new_jobs,
            total = jobs.len(),
            pages,
            cards_seen,
            elapsed_secs = started.elapsed().as_secs(),
            "Completed listing crawl"
        );

        Ok(new_jobs)
    }

    /// Fetch and pre-parse one results page
    ///
    /// Both fetch failures and a missing results container map to
    /// `Exhausted`; a crawl for one term must never block the pipeline.
    async fn load_page(&self, url: &str) -> PageOutcome {
        let html = match self.fetcher.fetch(url).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(url, error = %e, "Page fetch failed, treating as end of results");
                return PageOutcome::Exhausted;
            }
        };

        match parser::collect_cards(&html) {
            Some(cards) => PageOutcome::Loaded {
                cards,
                next: parser::next_page_url(&html, &self.site),
            },
            None => PageOutcome::Exhausted,
        }
    }

    /// Extract summaries from card fragments in a bounded worker pool
    ///
    /// Fragment parsing is CPU work over a static snapshot, independent per
    /// card, so it runs on blocking workers; the live fetcher is never
    /// touched here.
    async fn extract_batch(
        &self,
        cards: Vec<String>,
        known: Arc<HashSet<String>>,
        saved_date: NaiveDate,
    ) -> Vec<JobSummary> {
        let site = self.site.clone();

        let results: Vec<_> = stream::iter(cards.into_iter().map(|fragment| {
            let site = site.clone();
            let known = Arc::clone(&known);
            tokio::task::spawn_blocking(move || extract_card(&fragment, &site, saved_date, &known))
        }))
        .buffer_unordered(self.extract_workers)
        .collect()
        .await;

        results
            .into_iter()
            .filter_map(|joined| match joined {
                Ok(summary) => summary,
                Err(e) => {
                    tracing::warn!(error = %e, "Card extraction task failed");
                    None
                }
            })
            .collect()
    }

    /// Persist the full mapping as the term's checkpoint
    fn checkpoint(&self, path: &std::path::Path, jobs: &HashMap<String, JobSummary>) -> Result<()> {
        let mut records: Vec<&JobSummary> = jobs.values().collect();
        records.sort_by(|a, b| a.url.cmp(&b.url));
        write_records(path, &records)
    }

    fn search_url(&self, term: &str) -> String {
        let mut url = self
            .site
            .join("jobs")
            .unwrap_or_else(|_| self.site.clone());
        url.query_pairs_mut().append_pair("q", term);
        url.into()
    }
}

/// True when the accumulated card count crosses an interval boundary
///
/// Page sizes rarely divide the interval evenly, so the check compares
/// interval buckets instead of testing for an exact multiple.
fn interval_crossed(before: usize, after: usize, interval: usize) -> bool {
    before / interval != after / interval
}

/// Extract one card, checking the dedup gate before field parsing
fn extract_card(
    fragment: &str,
    site: &Url,
    saved_date: NaiveDate,
    known: &HashSet<String>,
) -> Option<JobSummary> {
    let card = Html::parse_fragment(fragment);

    let url = match parser::card_url(&card, site) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!(error = %e, "Dropping card without a usable link");
            return None;
        }
    };

    // Skip the remaining field extraction for postings already captured
    if known.contains(&url) {
        return None;
    }

    Some(parser::summary_fields(&card, url, saved_date))
}

fn config_timeout(config: &CrawlerConfig) -> std::time::Duration {
    std::time::Duration::from_secs(config.request_timeout_secs)
}
