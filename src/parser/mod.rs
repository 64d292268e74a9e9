//! HTML extraction for listing pages and posting detail pages
//!
//! The listing crawler hands these functions a static snapshot of page
//! content; nothing here touches the live fetcher. Field-level extraction
//! failures degrade to empty strings, because partial data beats lost data.

pub mod detail;
pub mod listing;
pub mod selectors;

pub use detail::extract_detail;
pub use listing::{card_url, collect_cards, next_page_url, summary_fields};
