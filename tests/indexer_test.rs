//! Publish run against a mock remote index
//!
//! Exercises the read-back dedup, the per-job failure containment, and the
//! saved-jobs log the publisher appends to.

use chrono::NaiveDate;
use jobflow::config::IndexConfig;
use jobflow::indexer::Publisher;
use jobflow::models::{JobDetail, JobSummary, SavedJob};
use jobflow::storage::{read_records, write_records, JobStore};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn summary(url: &str, creation_date: &str) -> JobSummary {
    JobSummary {
        url: url.to_string(),
        name: "Data Engineer".to_string(),
        company: "Acme".to_string(),
        location: "London".to_string(),
        creation_date: creation_date.to_string(),
        summary: "Pipelines".to_string(),
        saved_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
    }
}

fn detail(url: &str) -> JobDetail {
    JobDetail {
        url: url.to_string(),
        description: "Python and pipeline experience required.".to_string(),
        salary_info: "£25,000 - £30,000 a year Full-time".to_string(),
    }
}

fn config(api_url: &str) -> IndexConfig {
    IndexConfig {
        api_url: api_url.to_string(),
        api_key: "key".to_string(),
        user_email: "user@example.com".to_string(),
        board_key: "board".to_string(),
    }
}

#[tokio::test]
async fn test_publish_skips_indexed_and_contains_failures() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let store = JobStore::new(dir.path());

    let indexed_url = "https://jobs.example.com/viewjob?jk=1";
    let fresh_url = "https://jobs.example.com/viewjob?jk=2";
    let unenriched_url = "https://jobs.example.com/viewjob?jk=3";
    let bad_date_url = "https://jobs.example.com/viewjob?jk=4";

    let summaries = vec![
        summary(indexed_url, "3 days ago"),
        summary(fresh_url, "3 days ago"),
        summary(unenriched_url, "3 days ago"),
        // An unparseable phrase fails that one job at format time
        summary(bad_date_url, "Just posted"),
    ];
    write_records(&store.summary_path("nurse"), &summaries).unwrap();

    let details = vec![detail(indexed_url), detail(fresh_url), detail(bad_date_url)];
    write_records(&store.details_path("nurse"), &details).unwrap();

    // Remote board already holds the first url
    Mock::given(method("GET"))
        .and(path("/storing/jobs"))
        .and(query_param("board_keys", r#"["board"]"#))
        .and(header("X-API-KEY", "key"))
        .and(header("X-USER-EMAIL", "user@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "reference": indexed_url }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Parsing runs for the fresh job and the bad-date job
    Mock::given(method("POST"))
        .and(path("/document/parsing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "ents": [{ "start": 0, "end": 6, "label": "skill_hard" }] }
        })))
        .expect(2)
        .mount(&mock_server)
        .await;

    // Only the fresh job reaches the index
    Mock::given(method("POST"))
        .and(path("/job/indexing"))
        .and(query_param("board_key", "board"))
        .and(body_partial_json(json!({
            "reference": fresh_url,
            "name": "Data Engineer",
            "created_at": "2024-01-28"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": {} })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let publisher = Publisher::new(store.clone(), &config(&mock_server.uri())).unwrap();
    let published = publisher.publish("nurse").await.unwrap();
    assert_eq!(published, 1);

    let saved: Vec<SavedJob> = read_records(&store.saved_jobs_path());
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].summary.url, fresh_url);
    assert_eq!(saved[0].description, "Python and pipeline experience required.");
}

#[tokio::test]
async fn test_saved_jobs_log_accumulates_across_runs() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let store = JobStore::new(dir.path());

    let url = "https://jobs.example.com/viewjob?jk=9";
    write_records(&store.summary_path("nurse"), &[summary(url, "1 day ago")]).unwrap();
    write_records(&store.details_path("nurse"), &[detail(url)]).unwrap();

    // Log already holds a job from an earlier run
    let earlier = SavedJob {
        summary: summary("https://jobs.example.com/viewjob?jk=8", "2 days ago"),
        description: "earlier run".to_string(),
        salary_info: String::new(),
    };
    write_records(&store.saved_jobs_path(), &[earlier]).unwrap();

    Mock::given(method("GET"))
        .and(path("/storing/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/document/parsing"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "ents": [] } })),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/job/indexing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": {} })))
        .mount(&mock_server)
        .await;

    let publisher = Publisher::new(store.clone(), &config(&mock_server.uri())).unwrap();
    assert_eq!(publisher.publish("nurse").await.unwrap(), 1);

    let saved: Vec<SavedJob> = read_records(&store.saved_jobs_path());
    assert_eq!(saved.len(), 2);
    assert_eq!(saved[0].description, "earlier run");
    assert_eq!(saved[1].summary.url, url);
}

#[tokio::test]
async fn test_read_back_failure_aborts_the_run() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let store = JobStore::new(dir.path());

    let url = "https://jobs.example.com/viewjob?jk=9";
    write_records(&store.summary_path("nurse"), &[summary(url, "1 day ago")]).unwrap();
    write_records(&store.details_path("nurse"), &[detail(url)]).unwrap();

    // Without the reference set the dedup guarantee is void
    Mock::given(method("GET"))
        .and(path("/storing/jobs"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    // No job may reach the index when read-back fails
    Mock::given(method("POST"))
        .and(path("/job/indexing"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let publisher = Publisher::new(store.clone(), &config(&mock_server.uri())).unwrap();
    assert!(publisher.publish("nurse").await.is_err());

    let saved: Vec<SavedJob> = read_records(&store.saved_jobs_path());
    assert!(saved.is_empty());
}

#[tokio::test]
async fn test_index_rejection_skips_that_job_only() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let store = JobStore::new(dir.path());

    let rejected_url = "https://jobs.example.com/viewjob?jk=10";
    let accepted_url = "https://jobs.example.com/viewjob?jk=11";

    write_records(
        &store.summary_path("nurse"),
        &[summary(rejected_url, "1 day ago"), summary(accepted_url, "1 day ago")],
    )
    .unwrap();
    write_records(
        &store.details_path("nurse"),
        &[detail(rejected_url), detail(accepted_url)],
    )
    .unwrap();

    Mock::given(method("GET"))
        .and(path("/storing/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/document/parsing"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "ents": [] } })),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/job/indexing"))
        .and(body_partial_json(json!({ "reference": rejected_url })))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/job/indexing"))
        .and(body_partial_json(json!({ "reference": accepted_url })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": {} })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let publisher = Publisher::new(store.clone(), &config(&mock_server.uri())).unwrap();
    assert_eq!(publisher.publish("nurse").await.unwrap(), 1);

    let saved: Vec<SavedJob> = read_records(&store.saved_jobs_path());
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].summary.url, accepted_url);
}
