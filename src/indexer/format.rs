//! Normalization of scraped text into index document fields
//!
//! Covers relative-date phrases ("3 days ago"), the salary/employment-type
//! text block, and skill entities returned by the text-parsing API.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::NormalizeError;
use crate::models::{
    Entity, FormattedJob, JobDetail, JobLocation, JobSection, JobSummary, Skill, SkillType, Tag,
};

lazy_static! {
    /// Currency range with period, e.g. "£25,000 - £30,000 a year"
    static ref SALARY_RE: Regex = Regex::new(
        r"£\d+(?:,\d{3})*(?:\.\d{2})? - £\d+(?:,\d{3})*(?:\.\d{2})? (?:a day|a week|a month|a year)"
    )
    .expect("invalid salary pattern");

    /// Closed set of employment-type tokens
    static ref JOB_TYPE_RE: Regex = Regex::new(
        r"Full-time|Part-time|Internship|Apprenticeship|Contract|Temporary"
    )
    .expect("invalid job type pattern");
}

/// Turn a relative creation phrase into an absolute date
///
/// The phrase is tokenized on whitespace and classified by unit keyword
/// (token equality, not substring):
///
/// - day(s): subtract the integer token; a `<int>+` token ("30+") is treated
///   as a floor and its leading integer subtracted
/// - hour(s)/minute(s): same-day granularity, the saved date is returned
/// - month(s): fixed 30-day months
/// - year(s): fixed 365-day years
///
/// Anything else is a data error; the caller fails that single job rather
/// than guessing a date.
///
/// # Errors
///
/// Returns `NormalizeError::UnparseableDate` when no unit keyword matches or
/// a required count token is missing
pub fn normalize_creation_date(
    phrase: &str,
    saved_date: NaiveDate,
) -> Result<NaiveDate, NormalizeError> {
    let tokens: Vec<&str> = phrase.split_whitespace().collect();
    let has_unit = |units: &[&str]| tokens.iter().any(|t| units.contains(t));
    let unparseable = || NormalizeError::UnparseableDate(phrase.to_string());

    if has_unit(&["day", "days"]) {
        for token in &tokens {
            if let Ok(days) = token.parse::<i64>() {
                return Ok(saved_date - Duration::days(days));
            }
            if token.contains('+') {
                // "30+" means at least 30; the floor is used as the count
                let digits: String = token.chars().take_while(char::is_ascii_digit).collect();
                if let Ok(days) = digits.parse::<i64>() {
                    return Ok(saved_date - Duration::days(days));
                }
            }
        }
        Err(unparseable())
    } else if has_unit(&["hour", "hours", "minute", "minutes"]) {
        Ok(saved_date)
    } else if has_unit(&["month", "months"]) {
        tokens
            .iter()
            .find_map(|t| t.parse::<i64>().ok())
            .map(|months| saved_date - Duration::days(months * 30))
            .ok_or_else(unparseable)
    } else if has_unit(&["year", "years"]) {
        tokens
            .iter()
            .find_map(|t| t.parse::<i64>().ok())
            .map(|years| saved_date - Duration::days(years * 365))
            .ok_or_else(unparseable)
    } else {
        Err(unparseable())
    }
}

/// Extract compensation and employment-type matches from the salary block
///
/// The two patterns are independent; either, both, or neither may match,
/// and absence is not an error.
#[must_use]
pub fn extract_salary_tags(salary_info: &str) -> (Option<String>, Option<String>) {
    let compensation = SALARY_RE
        .find(salary_info)
        .map(|m| m.as_str().to_string());
    let employment_type = JOB_TYPE_RE
        .find(salary_info)
        .map(|m| m.as_str().to_string());

    (compensation, employment_type)
}

/// Build skill tags from parsed entity spans over the description text
///
/// Keeps entities whose label starts with "skill"; `skill_hard` maps to a
/// hard skill, every other skill label to soft. Names are the lowercased
/// span text and deduplicated by name with a deliberate tie-break: the
/// later entity in the list wins, keeping the earlier entity's position.
/// Spans are char offsets; out-of-range spans are skipped.
#[must_use]
pub fn format_skills(text: &str, entities: &[Entity]) -> Vec<Skill> {
    let chars: Vec<char> = text.chars().collect();

    let mut order: Vec<String> = Vec::new();
    let mut by_name: HashMap<String, Skill> = HashMap::new();

    for entity in entities.iter().filter(|e| e.label.starts_with("skill")) {
        let Some(span) = chars.get(entity.start..entity.end) else {
            tracing::debug!(start = entity.start, end = entity.end, "Entity span out of range");
            continue;
        };

        let name = span.iter().collect::<String>().to_lowercase();
        let skill = Skill {
            name: name.clone(),
            value: None,
            kind: if entity.label == "skill_hard" {
                SkillType::Hard
            } else {
                SkillType::Soft
            },
        };

        if !by_name.contains_key(&name) {
            order.push(name.clone());
        }
        by_name.insert(name, skill);
    }

    order
        .into_iter()
        .filter_map(|name| by_name.remove(&name))
        .collect()
}

/// Assemble the index document for one enriched posting
///
/// # Errors
///
/// Returns `NormalizeError::UnparseableDate` when the creation phrase cannot
/// be normalized; the publisher fails that single job loudly
pub fn format_job(
    summary: &JobSummary,
    detail: &JobDetail,
    skills: Vec<Skill>,
) -> Result<FormattedJob, NormalizeError> {
    let created_at = normalize_creation_date(&summary.creation_date, summary.saved_date)?;

    let (compensation, employment_type) = extract_salary_tags(&detail.salary_info);
    let mut tags = Vec::new();
    if let Some(value) = compensation {
        tags.push(Tag {
            name: "compensation".to_string(),
            value,
        });
    }
    if let Some(value) = employment_type {
        tags.push(Tag {
            name: "employment_type".to_string(),
            value,
        });
    }

    Ok(FormattedJob {
        name: summary.name.clone(),
        agent_key: None,
        reference: summary.url.clone(),
        url: summary.url.clone(),
        created_at,
        updated_at: None,
        summary: summary.summary.clone(),
        location: JobLocation {
            text: summary.location.clone(),
            lat: None,
            lng: None,
        },
        sections: vec![JobSection {
            name: "description".to_string(),
            title: "Description".to_string(),
            description: detail.description.clone(),
        }],
        skills,
        languages: Vec::new(),
        tags,
        ranges_date: Vec::new(),
        ranges_float: Vec::new(),
        metadatas: Vec::new(),
    })
}
