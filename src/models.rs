// Core data structures for the jobflow pipeline

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Lightweight job record captured during listing discovery
///
/// Created once when a posting is first seen and never mutated afterwards.
/// Identity is `url`, which doubles as the dedup key across every stage and
/// the remote index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub url: String,
    pub name: String,
    pub company: String,
    pub location: String,
    /// Raw human phrase from the listing card, e.g. "3 days ago"
    pub creation_date: String,
    pub summary: String,
    /// Date of the run that first captured this posting
    pub saved_date: NaiveDate,
}

/// Full description and salary text captured in the enrichment pass
///
/// Created exactly once per url; immutable afterwards. `url` is a foreign
/// key into the summary checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDetail {
    pub url: String,
    pub description: String,
    pub salary_info: String,
}

/// Source record appended to the saved-jobs log after a successful publish
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedJob {
    #[serde(flatten)]
    pub summary: JobSummary,
    pub description: String,
    pub salary_info: String,
}

/// Entity span returned by the text-parsing API
///
/// Offsets are char positions into the exact description text that was
/// submitted for parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub start: usize,
    pub end: usize,
    pub label: String,
}

/// Skill classification derived from the entity label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillType {
    Hard,
    Soft,
}

/// Skill tag attached to a published job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub value: Option<String>,
    #[serde(rename = "type")]
    pub kind: SkillType,
}

/// Name/value tag (compensation, employment type)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

/// Location block of the index document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobLocation {
    pub text: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// Description section of the index document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSection {
    pub name: String,
    pub title: String,
    pub description: String,
}

/// Document shape expected by the remote index, derived and ephemeral
///
/// Computed by the publisher from a [`JobSummary`]/[`JobDetail`] pair; only
/// ever persisted as the payload sent to the index. `reference` carries the
/// posting url, which is also the index's own deduplication key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedJob {
    pub name: String,
    pub agent_key: Option<String>,
    pub reference: String,
    pub url: String,
    pub created_at: NaiveDate,
    pub updated_at: Option<NaiveDate>,
    pub summary: String,
    pub location: JobLocation,
    pub sections: Vec<JobSection>,
    pub skills: Vec<Skill>,
    pub languages: Vec<serde_json::Value>,
    pub tags: Vec<Tag>,
    pub ranges_date: Vec<serde_json::Value>,
    pub ranges_float: Vec<serde_json::Value>,
    pub metadatas: Vec<serde_json::Value>,
}
