//! Extraction against a mocked table API.

use coda_extract::api::CodaClient;
use coda_extract::extract::{Fetcher, SnapshotStore};
use coda_extract::metrics::MetricValue;
use coda_extract::pipeline::{ExtractRequest, Extractor};
use coda_extract::{Cell, Error};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{bearer_token, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TABLE: &str = "/apis/v1/docs/d1/tables/t1";

fn client(server: &MockServer) -> CodaClient {
    CodaClient::new(
        &format!("{}/apis/v1", server.uri()),
        "secret-token",
        Duration::from_secs(5),
    )
    .expect("client")
}

async fn mount_columns(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("{TABLE}/columns")))
        .and(bearer_token("secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"id": "c-date", "name": "Date"},
                {"id": "c-hours", "name": "Hours"},
                {"id": "c-proj", "name": "Project"}
            ]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn follows_page_tokens_and_writes_snapshot() {
    let server = MockServer::start().await;
    mount_columns(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("{TABLE}/rows")))
        .and(query_param("limit", "500"))
        .and(query_param_is_missing("pageToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"id": "r1", "values": {"c-date": "2024-01-15", "c-hours": "2:30", "c-proj": {"name": "Acme"}}},
                {"id": "r2", "values": {"c-date": "2024-01-16", "c-hours": "8:00", "c-proj": {"name": "Initech"}}}
            ],
            "nextPageToken": "p2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{TABLE}/rows")))
        .and(query_param("pageToken", "p2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"id": "r3", "values": {"c-date": "2024-01-17", "c-hours": "1:00", "c-proj": {"name": "Acme"}}}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let raw_dir = tempfile::tempdir().expect("temp dir");
    let extractor = Extractor::new(
        Fetcher::new(client(&server)).with_snapshots(SnapshotStore::new(raw_dir.path())),
    );

    let outcome = extractor
        .run(&ExtractRequest::new("d1", "t1"))
        .await
        .expect("run");

    assert_eq!(outcome.row_count(), 3);
    assert_eq!(outcome.table.columns(), ["Date", "Hours", "Project"]);
    assert_eq!(outcome.table.get(0, "Hours"), Some(&Cell::Number(2.5)));
    assert_eq!(
        outcome.metrics.get("total_hours"),
        Some(&MetricValue::Number(11.5))
    );
    let weekly = outcome
        .metrics
        .get("weekly_totals")
        .and_then(MetricValue::as_group)
        .expect("weekly totals");
    assert_eq!(weekly.get("2024-W03"), Some(&11.5));

    let snapshot = SnapshotStore::new(raw_dir.path())
        .latest()
        .expect("glob")
        .expect("snapshot written");
    let replayed = SnapshotStore::load(&snapshot).expect("load");
    assert_eq!(replayed.rows.len(), 3);
    assert_eq!(replayed.column_map.display_name("c-proj"), Some("Project"));
}

#[tokio::test]
async fn selected_columns_are_sent_as_ids() {
    let server = MockServer::start().await;
    mount_columns(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("{TABLE}/rows")))
        .and(query_param("columns", "c-proj,c-hours"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .expect(1)
        .mount(&server)
        .await;

    let extractor = Extractor::new(Fetcher::new(client(&server)));
    let selected = vec!["Project".to_string(), "Hours".to_string(), "Nope".to_string()];
    let table = extractor
        .extract("d1", "t1", Some(10), Some(selected.as_slice()))
        .await
        .expect("extract");

    assert!(table.is_empty());
}

#[tokio::test]
async fn zero_row_cap_never_requests_rows() {
    let server = MockServer::start().await;
    mount_columns(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("{TABLE}/rows")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .expect(0)
        .mount(&server)
        .await;

    let extractor = Extractor::new(Fetcher::new(client(&server)));
    let request = ExtractRequest::new("d1", "t1").with_max_rows(Some(0));
    let outcome = extractor.run(&request).await.expect("run");

    assert_eq!(outcome.row_count(), 0);
    assert_eq!(outcome.raw.column_map.len(), 3);
}

#[tokio::test]
async fn rejected_token_surfaces_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{TABLE}/columns")))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
        .mount(&server)
        .await;

    let raw_dir = tempfile::tempdir().expect("temp dir");
    let extractor = Extractor::new(
        Fetcher::new(client(&server)).with_snapshots(SnapshotStore::new(raw_dir.path())),
    );
    let err = extractor
        .run(&ExtractRequest::new("d1", "t1"))
        .await
        .expect_err("401 must fail");

    match err {
        Error::Upstream { status, body, .. } => {
            assert_eq!(status, 401);
            assert_eq!(body, "bad token");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(SnapshotStore::new(raw_dir.path())
        .latest()
        .expect("glob")
        .is_none());
}

#[tokio::test]
async fn lists_documents_across_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/apis/v1/docs"))
        .and(query_param_is_missing("pageToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"id": "d1", "name": "Timesheets", "type": "doc"}],
            "nextPageToken": "more"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/apis/v1/docs"))
        .and(query_param("pageToken", "more"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"id": "d2", "name": "Budget"}]
        })))
        .mount(&server)
        .await;

    let extractor = Extractor::new(Fetcher::new(client(&server)));
    let docs = extractor.list_documents().await.expect("docs");

    let names: Vec<&str> = docs.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, ["Timesheets", "Budget"]);
}

#[tokio::test]
async fn empty_listing_page_ends_the_walk() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/apis/v1/docs/d1/tables"))
        .and(query_param_is_missing("pageToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"id": "t1", "name": "Hours"}],
            "nextPageToken": "again"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/apis/v1/docs/d1/tables"))
        .and(query_param("pageToken", "again"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [],
            "nextPageToken": "again"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let extractor = Extractor::new(Fetcher::new(client(&server)));
    let tables = extractor.list_tables("d1").await.expect("tables");

    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].id, "t1");
}
