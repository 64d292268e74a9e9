//! CSS selectors for the listing site's search results and posting pages

use lazy_static::lazy_static;
use scraper::Selector;

// Helper macro to parse selectors safely at startup
macro_rules! parse_selector {
    ($s:expr) => {
        Selector::parse($s).expect(concat!("Invalid CSS selector: ", $s))
    };
}

lazy_static! {
    /// Container that materializes once search results are present.
    /// Its absence on a fetched page means the results are exhausted.
    pub static ref RESULTS_CONTAINER: Selector = parse_selector!("#mosaic-provider-jobcards");

    /// One job card per posting in the results list
    pub static ref JOB_CARD: Selector = parse_selector!(".resultWithShelf");

    /// First anchor inside a card carries the posting link
    pub static ref CARD_LINK: Selector = parse_selector!("a");

    pub static ref CARD_TITLE: Selector = parse_selector!(".jobTitle");
    pub static ref CARD_COMPANY: Selector = parse_selector!(".companyName");
    pub static ref CARD_LOCATION: Selector = parse_selector!(".companyLocation");
    pub static ref CARD_SNIPPET: Selector = parse_selector!(".job-snippet");
    pub static ref CARD_POSTED_DATE: Selector = parse_selector!(".date");

    /// Pagination control; absence is the normal end-of-results signal
    pub static ref NEXT_PAGE: Selector = parse_selector!(r#"a[data-testid="pagination-page-next"]"#);

    /// Full description node on a posting detail page
    pub static ref JOB_DESCRIPTION: Selector = parse_selector!("#jobDescriptionText");

    /// Salary and employment-type node on a posting detail page
    pub static ref SALARY_INFO: Selector = parse_selector!("#salaryInfoAndJobType");
}
