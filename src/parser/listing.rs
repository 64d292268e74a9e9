//! Extraction of job summaries from search-results pages
//!
//! A page is first parsed once to collect card fragments and the next-page
//! link; per-card field extraction then runs over those fragments in the
//! crawler's worker pool. The card url is extracted before any other field
//! so the dedup gate can skip known postings cheaply.

use chrono::NaiveDate;
use scraper::{ElementRef, Html};
use url::Url;

use crate::error::ExtractError;
use crate::models::JobSummary;
use crate::parser::selectors;

/// Collect job-card fragments from a results page
///
/// Returns `None` when the results container is absent, the terminal
/// "no more results" condition. An empty container yields `Some(vec![])`.
pub fn collect_cards(html: &str) -> Option<Vec<String>> {
    let document = Html::parse_document(html);

    document.select(&selectors::RESULTS_CONTAINER).next()?;

    Some(
        document
            .select(&selectors::JOB_CARD)
            .map(|card| card.html())
            .collect(),
    )
}

/// Find the next-page link on a results page, joined against the site root
///
/// Absence of the pagination control is the normal end-of-results signal,
/// not an error, hence the `Option`.
pub fn next_page_url(html: &str, site: &Url) -> Option<String> {
    let document = Html::parse_document(html);
    let anchor = document.select(&selectors::NEXT_PAGE).next()?;
    let href = anchor.value().attr("href")?;
    site.join(href).ok().map(Url::into)
}

/// Extract the posting url from a parsed card fragment
///
/// The url is the identity of the posting; a card without a resolvable link
/// cannot be keyed and is dropped.
pub fn card_url(card: &Html, site: &Url) -> Result<String, ExtractError> {
    let anchor = card
        .select(&selectors::CARD_LINK)
        .next()
        .ok_or(ExtractError::UrlNotFound)?;

    let href = anchor
        .value()
        .attr("href")
        .ok_or(ExtractError::UrlNotFound)?;

    site.join(href)
        .map(Url::into)
        .map_err(|_| ExtractError::BadLink(href.to_string()))
}

/// Extract the remaining summary fields from a parsed card fragment
///
/// Missing fields degrade to empty strings. The posted-date node renders as
/// "Posted\n3 days ago" on most cards; the phrase is the part after the
/// first newline when one is present.
pub fn summary_fields(card: &Html, url: String, saved_date: NaiveDate) -> JobSummary {
    JobSummary {
        name: text_of(card, &selectors::CARD_TITLE),
        company: text_of(card, &selectors::CARD_COMPANY),
        location: text_of(card, &selectors::CARD_LOCATION),
        creation_date: posted_phrase(card),
        summary: text_of(card, &selectors::CARD_SNIPPET),
        saved_date,
        url,
    }
}

fn posted_phrase(card: &Html) -> String {
    let raw = text_of(card, &selectors::CARD_POSTED_DATE);
    match raw.split_once('\n') {
        Some((_, phrase)) => phrase.to_string(),
        None => raw,
    }
}

fn text_of(card: &Html, selector: &scraper::Selector) -> String {
    card.select(selector)
        .next()
        .map(element_text)
        .unwrap_or_default()
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
