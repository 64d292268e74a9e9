//! Extraction of full description and salary text from a posting page

use scraper::Html;

use crate::models::JobDetail;
use crate::parser::selectors;

/// Extract the detail record for a posting page
///
/// Missing nodes degrade to empty strings; a detail record is produced for
/// every page that was fetched successfully.
pub fn extract_detail(html: &str, url: &str) -> JobDetail {
    let document = Html::parse_document(html);

    let description = document
        .select(&selectors::JOB_DESCRIPTION)
        .next()
        .map(|node| node.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let salary_info = document
        .select(&selectors::SALARY_INFO)
        .next()
        .map(|node| node.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    JobDetail {
        url: url.to_string(),
        description,
        salary_info,
    }
}
