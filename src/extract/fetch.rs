// src/extract/fetch.rs

use super::columns::{fetch_columns, ColumnMap};
use super::snapshot::SnapshotStore;
use super::source::RowSource;
use crate::api::{PageRequest, RawRow, MAX_PAGE_SIZE};
use crate::error::Result;
use tracing::{debug, info, instrument, warn};

/// Rows in server order plus the column map that was current when they were fetched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchResult {
    pub rows: Vec<RawRow>,
    pub column_map: ColumnMap,
}

/// Page size for the next request, or `None` once the cap is reached.
pub fn page_limit(max_rows: Option<usize>, fetched: usize) -> Option<usize> {
    match max_rows {
        None => Some(MAX_PAGE_SIZE),
        Some(max) => match max.saturating_sub(fetched) {
            0 => None,
            remaining => Some(remaining.min(MAX_PAGE_SIZE)),
        },
    }
}

/// Walk the page-token protocol for one table.
///
/// Stops on an empty page, a page without continuation, or once `max_rows`
/// rows are in hand. Any upstream error aborts the whole fetch.
#[instrument(level = "info", skip(source, selected))]
pub async fn fetch_rows<S: RowSource>(
    source: &S,
    doc_id: &str,
    table_id: &str,
    max_rows: Option<usize>,
    selected: Option<&[String]>,
) -> Result<FetchResult> {
    // 1) column map, rebuilt on every call
    let column_map = fetch_columns(source, doc_id, table_id).await?;

    // 2) optional server-side column filter
    let columns = match selected {
        Some(names) if !names.is_empty() => {
            let ids = column_map.to_identifiers(names);
            if ids.is_empty() {
                warn!(requested = ?names, "none of the requested columns exist; fetching all");
            }
            ids
        }
        _ => Vec::new(),
    };

    // 3) page loop
    let mut rows: Vec<RawRow> = Vec::new();
    let mut page_token: Option<String> = None;
    let mut pages = 0usize;
    while let Some(limit) = page_limit(max_rows, rows.len()) {
        let request = PageRequest {
            limit,
            page_token: page_token.take(),
            columns: columns.clone(),
        };
        let page = source.rows_page(doc_id, table_id, &request).await?;
        pages += 1;

        let received = page.items.len();
        let next = page.continuation().map(str::to_string);
        rows.extend(page.items);
        debug!(page = pages, limit, received, total = rows.len(), "fetched page");

        if received == 0 || next.is_none() {
            break;
        }
        page_token = next;
    }

    // 4) a server may ignore `limit`; the cap still holds
    if let Some(max) = max_rows {
        rows.truncate(max);
    }

    info!(rows = rows.len(), pages, "fetch complete");
    Ok(FetchResult { rows, column_map })
}

/// A row source plus the optional raw snapshot sink.
#[derive(Debug, Clone)]
pub struct Fetcher<S> {
    source: S,
    snapshots: Option<SnapshotStore>,
}

impl<S: RowSource> Fetcher<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            snapshots: None,
        }
    }

    /// Record every successful fetch under `store`.
    pub fn with_snapshots(mut self, store: SnapshotStore) -> Self {
        self.snapshots = Some(store);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn snapshots(&self) -> Option<&SnapshotStore> {
        self.snapshots.as_ref()
    }

    pub async fn fetch(
        &self,
        doc_id: &str,
        table_id: &str,
        max_rows: Option<usize>,
        selected: Option<&[String]>,
    ) -> Result<FetchResult> {
        let result = fetch_rows(&self.source, doc_id, table_id, max_rows, selected).await?;
        if let Some(store) = &self.snapshots {
            store.record(&result.rows, &result.column_map);
        }
        Ok(result)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::api::{ColumnDef, Page};
    use crate::error::Error;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted source: hands out pages in order and records every request.
    #[derive(Default)]
    pub(crate) struct FakeSource {
        pub columns: Vec<ColumnDef>,
        pub pages: Mutex<VecDeque<Result<Page<RawRow>>>>,
        pub requests: Mutex<Vec<PageRequest>>,
    }

    impl FakeSource {
        pub(crate) fn new(columns: Vec<ColumnDef>) -> Self {
            Self {
                columns,
                ..Self::default()
            }
        }

        pub(crate) fn push_page(&self, rows: usize, token: Option<&str>) {
            let items = (0..rows)
                .map(|i| {
                    let mut row = RawRow::default();
                    row.values.insert("c-1".into(), json!(i));
                    row
                })
                .collect();
            self.push_rows(items, token);
        }

        pub(crate) fn push_rows(&self, items: Vec<RawRow>, token: Option<&str>) {
            self.pages.lock().unwrap().push_back(Ok(Page {
                items,
                next_page_token: token.map(str::to_string),
            }));
        }

        pub(crate) fn push_error(&self, status: u16) {
            self.pages.lock().unwrap().push_back(Err(Error::Upstream {
                status,
                url: "fake://rows".into(),
                body: "nope".into(),
            }));
        }

        pub(crate) fn limits(&self) -> Vec<usize> {
            self.requests.lock().unwrap().iter().map(|r| r.limit).collect()
        }
    }

    impl RowSource for FakeSource {
        async fn columns(&self, _doc_id: &str, _table_id: &str) -> Result<Vec<ColumnDef>> {
            Ok(self.columns.clone())
        }

        async fn rows_page(
            &self,
            _doc_id: &str,
            _table_id: &str,
            request: &PageRequest,
        ) -> Result<Page<RawRow>> {
            self.requests.lock().unwrap().push(request.clone());
            self.pages.lock().unwrap().pop_front().unwrap_or_else(|| {
                Ok(Page {
                    items: Vec::new(),
                    next_page_token: None,
                })
            })
        }
    }

    fn hours_source() -> FakeSource {
        FakeSource::new(vec![
            ColumnDef::new("c-1", "Hours"),
            ColumnDef::new("c-2", "Project"),
        ])
    }

    #[test]
    fn page_limit_respects_cap() {
        assert_eq!(page_limit(None, 10_000), Some(MAX_PAGE_SIZE));
        assert_eq!(page_limit(Some(1200), 0), Some(500));
        assert_eq!(page_limit(Some(1200), 1000), Some(200));
        assert_eq!(page_limit(Some(1200), 1200), None);
        assert_eq!(page_limit(Some(10), 30), None);
        assert_eq!(page_limit(Some(0), 0), None);
    }

    #[tokio::test]
    async fn capped_fetch_shrinks_last_page() {
        let source = hours_source();
        source.push_page(500, Some("p2"));
        source.push_page(500, Some("p3"));
        source.push_page(200, Some("p4"));

        let result = fetch_rows(&source, "doc", "tbl", Some(1200), None).await.unwrap();

        assert_eq!(result.rows.len(), 1200);
        assert_eq!(source.limits(), vec![500, 500, 200]);
        let tokens: Vec<Option<String>> = source
            .requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.page_token.clone())
            .collect();
        assert_eq!(tokens, vec![None, Some("p2".into()), Some("p3".into())]);
    }

    #[tokio::test]
    async fn zero_cap_issues_no_row_request() {
        let source = hours_source();
        source.push_page(5, None);

        let result = fetch_rows(&source, "doc", "tbl", Some(0), None).await.unwrap();

        assert!(result.rows.is_empty());
        assert_eq!(result.column_map.len(), 2);
        assert!(source.limits().is_empty());
    }

    #[tokio::test]
    async fn stops_when_token_is_missing() {
        let source = hours_source();
        source.push_page(3, Some("next"));
        source.push_page(2, None);
        source.push_page(7, Some("never"));

        let result = fetch_rows(&source, "doc", "tbl", None, None).await.unwrap();

        assert_eq!(result.rows.len(), 5);
        assert_eq!(source.limits(), vec![500, 500]);
    }

    #[tokio::test]
    async fn stops_on_empty_page_even_with_token() {
        let source = hours_source();
        source.push_page(0, Some("dangling"));
        source.push_page(4, None);

        let result = fetch_rows(&source, "doc", "tbl", None, None).await.unwrap();

        assert!(result.rows.is_empty());
        assert_eq!(source.limits().len(), 1);
    }

    #[tokio::test]
    async fn oversized_page_is_truncated_to_cap() {
        let source = hours_source();
        source.push_page(8, Some("more"));

        let result = fetch_rows(&source, "doc", "tbl", Some(5), None).await.unwrap();

        assert_eq!(result.rows.len(), 5);
        assert_eq!(source.limits(), vec![5]);
    }

    #[tokio::test]
    async fn selected_names_become_identifiers() {
        let source = hours_source();
        source.push_page(1, None);
        let selected = vec!["Project".to_string(), "Missing".to_string()];

        fetch_rows(&source, "doc", "tbl", None, Some(selected.as_slice())).await.unwrap();

        let requests = source.requests.lock().unwrap();
        assert_eq!(requests[0].columns, vec!["c-2".to_string()]);
    }

    #[tokio::test]
    async fn upstream_error_aborts_without_partial_rows() {
        let source = hours_source();
        source.push_page(500, Some("p2"));
        source.push_error(503);

        let err = fetch_rows(&source, "doc", "tbl", None, None).await.unwrap_err();

        assert!(matches!(err, Error::Upstream { status: 503, .. }));
        assert_eq!(source.limits().len(), 2);
    }

    #[tokio::test]
    async fn fetcher_writes_snapshot_after_success() {
        let dir = tempfile::tempdir().unwrap();
        let source = hours_source();
        source.push_page(2, None);
        let fetcher = Fetcher::new(source).with_snapshots(SnapshotStore::new(dir.path()));

        let result = fetcher.fetch("doc", "tbl", None, None).await.unwrap();

        let latest = fetcher.snapshots().unwrap().latest().unwrap().unwrap();
        let replayed = SnapshotStore::load(&latest).unwrap();
        assert_eq!(replayed, result);
    }
}
