//! Crawling stages: listing discovery and detail enrichment
//!
//! Both stages run single-threaded control flow that fans per-item work out
//! into a fixed-size worker pool and collects results before proceeding.
//! Every network wait is bounded; expiry is a normal negative result for
//! the page loop and a logged skip for a single detail fetch.

pub mod detail;
pub mod fetcher;
pub mod listing;

pub use detail::DetailEnricher;
pub use fetcher::PageFetcher;
pub use listing::ListingCrawler;
