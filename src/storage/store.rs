//! JSON checkpoint files for resumable pipeline stages
//!
//! Checkpoints are JSON arrays of records keyed by `url`. Files are
//! read-if-present (missing or corrupt files count as empty, so a fresh run
//! and a recovering run look the same) and written as a full-array overwrite
//! through a temp file + rename.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Suffix distinguishing detail checkpoints from listing checkpoints
const DETAILS_SUFFIX: &str = "_details";

/// File name of the publisher's saved-jobs log
const SAVED_JOBS_FILE: &str = "saved_jobs.json";

/// Read a checkpoint file into records, treating missing/corrupt as empty
pub fn read_records<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Corrupt checkpoint file, treating as empty"
                );
                Vec::new()
            }
        },
        Err(_) => Vec::new(),
    }
}

/// Overwrite a checkpoint file with the full record array
///
/// Writes to a temp file first, then renames, so a crash mid-write never
/// leaves a truncated checkpoint behind.
pub fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("json.tmp");
    let content = serde_json::to_string_pretty(records)?;
    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)?;

    tracing::debug!(path = %path.display(), count = records.len(), "Checkpoint saved");
    Ok(())
}

/// Append records to a checkpoint file
///
/// Implemented as read-extend-overwrite so the file stays one valid JSON
/// array across runs.
pub fn append_records<T: Serialize + DeserializeOwned>(path: &Path, records: Vec<T>) -> Result<()> {
    let mut existing: Vec<T> = read_records(path);
    existing.extend(records);
    write_records(path, &existing)
}

/// Minimal record shape used when only the dedup key matters
#[derive(Debug, Deserialize)]
struct UrlRecord {
    url: String,
}

/// Path layout over the pipeline's data directory
///
/// One listing checkpoint and one detail checkpoint per search term, plus a
/// single saved-jobs log for the publisher.
#[derive(Debug, Clone)]
pub struct JobStore {
    data_dir: PathBuf,
}

impl JobStore {
    /// Create a store over the given data directory
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Listing checkpoint path for a search term
    #[must_use]
    pub fn summary_path(&self, term: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", Self::file_stem(term)))
    }

    /// Detail checkpoint path for a search term
    #[must_use]
    pub fn details_path(&self, term: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}{DETAILS_SUFFIX}.json", Self::file_stem(term)))
    }

    /// Path of the publisher's saved-jobs log
    #[must_use]
    pub fn saved_jobs_path(&self) -> PathBuf {
        self.data_dir.join(SAVED_JOBS_FILE)
    }

    /// Collect every url already captured by any prior run, across all terms
    ///
    /// Scans the listing checkpoints in the data directory (detail
    /// checkpoints and the saved-jobs log are skipped; their urls are a
    /// subset of the listing files). Unreadable files are skipped.
    pub fn known_urls(&self) -> HashSet<String> {
        let mut urls = HashSet::new();

        let Ok(entries) = fs::read_dir(&self.data_dir) else {
            return urls;
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !Self::is_listing_checkpoint(&path) {
                continue;
            }
            let records: Vec<UrlRecord> = read_records(&path);
            urls.extend(records.into_iter().map(|r| r.url));
        }

        urls
    }

    fn is_listing_checkpoint(path: &Path) -> bool {
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            return false;
        }
        match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => !stem.ends_with(DETAILS_SUFFIX) && format!("{stem}.json") != SAVED_JOBS_FILE,
            None => false,
        }
    }

    /// Derive a stable file stem from a search term
    fn file_stem(term: &str) -> String {
        term.to_lowercase().replace(char::is_whitespace, "_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobSummary;
    use chrono::NaiveDate;

    fn summary(url: &str) -> JobSummary {
        JobSummary {
            url: url.to_string(),
            name: "Engineer".to_string(),
            company: "Acme".to_string(),
            location: "Leeds".to_string(),
            creation_date: "2 days ago".to_string(),
            summary: String::new(),
            saved_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        }
    }

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data_engineer.json");

        let records = vec![summary("https://x/1"), summary("https://x/2")];
        write_records(&path, &records).unwrap();

        let restored: Vec<JobSummary> = read_records(&path);
        assert_eq!(restored, records);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let restored: Vec<JobSummary> = read_records(Path::new("/nonexistent/nope.json"));
        assert!(restored.is_empty());
    }

    #[test]
    fn test_corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not valid json").unwrap();

        let restored: Vec<JobSummary> = read_records(&path);
        assert!(restored.is_empty());
    }

    #[test]
    fn test_append_keeps_valid_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved_jobs.json");

        append_records(&path, vec![summary("https://x/1")]).unwrap();
        append_records(&path, vec![summary("https://x/2")]).unwrap();

        let restored: Vec<JobSummary> = read_records(&path);
        assert_eq!(restored.len(), 2);
        assert_eq!(restored[1].url, "https://x/2");
    }

    #[test]
    fn test_term_paths() {
        let store = JobStore::new("data");
        assert_eq!(
            store.summary_path("Data Engineer"),
            PathBuf::from("data/data_engineer.json")
        );
        assert_eq!(
            store.details_path("Data Engineer"),
            PathBuf::from("data/data_engineer_details.json")
        );
    }

    #[test]
    fn test_known_urls_skips_details_and_saved() {
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::new(dir.path());

        write_records(&store.summary_path("nurse"), &[summary("https://x/1")]).unwrap();
        write_records(&store.summary_path("driver"), &[summary("https://x/2")]).unwrap();
        // Detail and saved-jobs files must not contribute extra urls
        write_records(&store.details_path("nurse"), &[summary("https://x/3")]).unwrap();
        write_records(&store.saved_jobs_path(), &[summary("https://x/4")]).unwrap();

        let urls = store.known_urls();
        assert_eq!(urls.len(), 2);
        assert!(urls.contains("https://x/1"));
        assert!(urls.contains("https://x/2"));
    }
}
