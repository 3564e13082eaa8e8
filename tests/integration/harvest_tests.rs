//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for the scholar results pages and
//! the Custom Search API, and exercise the full crawl cycle end-to-end:
//! orchestrator, driver, adapters, and the CSV sink.

use paperfetch::config::{validate, JobConfig};
use paperfetch::crawler::{Orchestrator, Shutdown};
use paperfetch::source::SourceId;
use paperfetch::store::{CsvStore, RecordStore};
use paperfetch::Record;
use std::path::PathBuf;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a job with API credentials filled in; tests unset them as needed
fn test_job(sources: Vec<SourceId>, csv_file: PathBuf) -> JobConfig {
    JobConfig {
        query: "transformer models".to_string(),
        sources,
        max_results: None,
        csv_file,
        log_file: PathBuf::from("/tmp/paperfetch-test.log"),
        api_key: Some("test-key".to_string()),
        cse_id: Some("test-cx".to_string()),
    }
}

/// Renders a scholar results page with the count element and one result
/// container per title
fn scholar_results_page(total: &str, titles: &[String]) -> String {
    let mut body = format!(
        r#"<html><body><div id="gs_ab_md">About {} results (0.03 sec)</div>"#,
        total
    );
    for title in titles {
        body.push_str(&format!(
            r#"<div class="gs_ri"><h3 class="gs_rt"><a href="https://papers.example/{t}">{t}</a></h3></div>"#,
            t = title
        ));
    }
    body.push_str("</body></html>");
    body
}

fn numbered_titles(range: std::ops::Range<u32>) -> Vec<String> {
    range.map(|i| format!("Scholar paper {}", i)).collect()
}

/// Mounts the count request mock: same endpoint, no start parameter
async fn mount_scholar_count(server: &MockServer, total: &str) {
    Mock::given(method("GET"))
        .and(path("/scholar"))
        .and(query_param_is_missing("start"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(scholar_results_page(total, &[])),
        )
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_scholar_crawl_fetches_every_page() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let csv_file = dir.path().join("papers.csv");

    // 23 results → 3 pages of 10, 10, 3.
    mount_scholar_count(&server, "23").await;
    let pages = [
        numbered_titles(0..10),
        numbered_titles(10..20),
        numbered_titles(20..23),
    ];
    for (idx, titles) in pages.iter().enumerate() {
        Mock::given(method("GET"))
            .and(path("/scholar"))
            .and(query_param("start", (idx * 10).to_string()))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(scholar_results_page("23", titles)),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let store = CsvStore::open(&csv_file).unwrap();
    let job = test_job(vec![SourceId::GoogleScholar], csv_file.clone());
    let mut orchestrator =
        Orchestrator::new(job, store, Shutdown::new()).with_scholar_base_url(server.uri());

    let unique = orchestrator.run().await.unwrap();
    assert_eq!(unique, 23);

    // Reading the sink back reproduces the records in fetch order.
    let reopened = CsvStore::open(&csv_file).unwrap();
    assert_eq!(reopened.len(), 23);
    assert_eq!(reopened.records()[0].title, "Scholar paper 0");
    assert_eq!(reopened.records()[22].title, "Scholar paper 22");
    assert_eq!(
        reopened.records()[0].url.as_deref(),
        Some("https://papers.example/Scholar paper 0")
    );

    // The expect() counts assert exactly 3 page fetches when the server
    // drops.
}

#[tokio::test]
async fn test_result_cap_stops_mid_page() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let csv_file = dir.path().join("papers.csv");

    mount_scholar_count(&server, "23").await;
    Mock::given(method("GET"))
        .and(path("/scholar"))
        .and(query_param("start", "0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(scholar_results_page("23", &numbered_titles(0..10))),
        )
        .expect(1)
        .mount(&server)
        .await;
    // The cap lands inside page one; page two must never be requested.
    Mock::given(method("GET"))
        .and(path("/scholar"))
        .and(query_param("start", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .expect(0)
        .mount(&server)
        .await;

    let store = CsvStore::open(&csv_file).unwrap();
    let mut job = test_job(vec![SourceId::GoogleScholar], csv_file.clone());
    job.max_results = Some(5);
    let mut orchestrator =
        Orchestrator::new(job, store, Shutdown::new()).with_scholar_base_url(server.uri());

    let unique = orchestrator.run().await.unwrap();
    assert_eq!(unique, 5);
    assert_eq!(CsvStore::open(&csv_file).unwrap().len(), 5);
}

#[tokio::test]
async fn test_scholar_failure_keeps_prior_pages() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let csv_file = dir.path().join("papers.csv");

    mount_scholar_count(&server, "30").await;
    Mock::given(method("GET"))
        .and(path("/scholar"))
        .and(query_param("start", "0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(scholar_results_page("30", &numbered_titles(0..10))),
        )
        .expect(1)
        .mount(&server)
        .await;
    // Page two is blocked; the source ends there, page one stays on disk.
    Mock::given(method("GET"))
        .and(path("/scholar"))
        .and(query_param("start", "10"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/scholar"))
        .and(query_param("start", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .expect(0)
        .mount(&server)
        .await;

    let store = CsvStore::open(&csv_file).unwrap();
    let job = test_job(vec![SourceId::GoogleScholar], csv_file.clone());
    let mut orchestrator =
        Orchestrator::new(job, store, Shutdown::new()).with_scholar_base_url(server.uri());

    let unique = orchestrator.run().await.unwrap();
    assert_eq!(unique, 10);
    assert_eq!(CsvStore::open(&csv_file).unwrap().len(), 10);
}

#[tokio::test]
async fn test_api_source_follows_continuation() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let csv_file = dir.path().join("papers.csv");

    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .and(query_param("q", "site:dl.acm.org transformer models"))
        .and(query_param("start", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [
                {"title": "Efficient transformers: a survey", "link": "https://dl.acm.org/doi/10.1145/3530811"},
                {"title": "Attention mechanisms in vision", "link": "https://dl.acm.org/doi/10.1145/3505244"}
            ],
            "queries": {"nextPage": [{"startIndex": 11}]}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .and(query_param("start", "11"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [
                {"title": "Sparse attention models", "link": "https://dl.acm.org/doi/10.1145/3580305"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = CsvStore::open(&csv_file).unwrap();
    let job = test_job(vec![SourceId::Acm], csv_file.clone());
    let mut orchestrator = Orchestrator::new(job, store, Shutdown::new())
        .with_api_endpoint(format!("{}/customsearch/v1", server.uri()));

    let unique = orchestrator.run().await.unwrap();
    assert_eq!(unique, 3);

    let reopened = CsvStore::open(&csv_file).unwrap();
    let titles: Vec<_> = reopened.records().iter().map(|r| r.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Efficient transformers: a survey",
            "Attention mechanisms in vision",
            "Sparse attention models",
        ]
    );
}

#[tokio::test]
async fn test_api_source_without_continuation_stops_after_one_page() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let csv_file = dir.path().join("papers.csv");

    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [
                {"title": "A single page of results", "link": "https://arxiv.org/abs/2101.00001"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = CsvStore::open(&csv_file).unwrap();
    let mut job = test_job(vec![SourceId::Arxiv], csv_file.clone());
    // A generous cap must not force extra fetches once the continuation
    // is gone.
    job.max_results = Some(1000);
    let mut orchestrator = Orchestrator::new(job, store, Shutdown::new())
        .with_api_endpoint(format!("{}/customsearch/v1", server.uri()));

    let unique = orchestrator.run().await.unwrap();
    assert_eq!(unique, 1);
}

#[tokio::test]
async fn test_api_failure_leaves_other_sources_running() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let csv_file = dir.path().join("papers.csv");

    // ACM fails outright.
    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .and(query_param("q", "site:dl.acm.org transformer models"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    // arXiv still serves a page.
    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .and(query_param("q", "site:arxiv.org transformer models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [
                {"title": "Surviving source", "link": "https://arxiv.org/abs/2102.00002"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = CsvStore::open(&csv_file).unwrap();
    let job = test_job(vec![SourceId::Acm, SourceId::Arxiv], csv_file.clone());
    let mut orchestrator = Orchestrator::new(job, store, Shutdown::new())
        .with_api_endpoint(format!("{}/customsearch/v1", server.uri()));

    let unique = orchestrator.run().await.unwrap();
    assert_eq!(unique, 1);
    assert_eq!(
        CsvStore::open(&csv_file).unwrap().records()[0].title,
        "Surviving source"
    );
}

#[tokio::test]
async fn test_cross_run_dedup_collapses_previous_results() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let csv_file = dir.path().join("papers.csv");

    // A previous run already persisted two papers, one of which this run
    // finds again.
    {
        let mut store = CsvStore::open(&csv_file).unwrap();
        store
            .append_and_flush(vec![
                Record::new("Scholar paper 0", Some("https://papers.example/old".to_string())),
                Record::new("Unrelated earlier paper", None),
            ])
            .unwrap();
    }

    mount_scholar_count(&server, "3").await;
    Mock::given(method("GET"))
        .and(path("/scholar"))
        .and(query_param("start", "0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(scholar_results_page("3", &numbered_titles(0..3))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = CsvStore::open(&csv_file).unwrap();
    let job = test_job(vec![SourceId::GoogleScholar], csv_file.clone());
    let mut orchestrator =
        Orchestrator::new(job, store, Shutdown::new()).with_scholar_base_url(server.uri());

    // 2 preexisting + 3 fetched, one title shared: 4 unique.
    let unique = orchestrator.run().await.unwrap();
    assert_eq!(unique, 4);

    // First occurrence wins: the survivor keeps the URL from the earlier
    // run.
    let reopened = CsvStore::open(&csv_file).unwrap();
    assert_eq!(reopened.records()[0].title, "Scholar paper 0");
    assert_eq!(
        reopened.records()[0].url.as_deref(),
        Some("https://papers.example/old")
    );
}

#[test]
fn test_missing_api_key_fails_validation_before_any_fetch() {
    let mut job = test_job(vec![SourceId::Acm], PathBuf::from("unused.csv"));
    job.api_key = None;

    let err = validate(&job).unwrap_err();
    assert!(matches!(
        err,
        paperfetch::ConfigError::MissingCredential(_)
    ));
}
