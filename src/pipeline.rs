// src/pipeline.rs

//! Caller-facing entry points: list what is reachable, pull one table, and
//! run the whole fetch → normalize → clean → metrics chain.

use crate::api::{CodaClient, DocSummary, TableSummary};
use crate::config::{Config, DOC_VAR, TABLE_VAR};
use crate::error::{Error, Result};
use crate::extract::{FetchResult, Fetcher, RowSource, SnapshotStore};
use crate::metrics::{compute_timesheet_metrics, summarize, Metrics, Summary};
use crate::process::{clean, normalize, Table};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, instrument};

/// Which table to pull and how much of it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractRequest {
    pub doc_id: String,
    pub table_id: String,
    pub max_rows: Option<usize>,
    pub columns: Option<Vec<String>>,
}

impl ExtractRequest {
    pub fn new(doc_id: impl Into<String>, table_id: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            table_id: table_id.into(),
            ..Self::default()
        }
    }

    pub fn with_max_rows(mut self, max_rows: Option<usize>) -> Self {
        self.max_rows = max_rows;
        self
    }

    pub fn with_columns(mut self, columns: Option<Vec<String>>) -> Self {
        self.columns = columns;
        self
    }

    /// Document and table from the environment; both are required.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        match (&cfg.doc_id, &cfg.table_id) {
            (Some(doc), Some(table)) => Ok(Self::new(doc, table)),
            (doc, table) => {
                let missing: Vec<&str> = [(DOC_VAR, doc.is_none()), (TABLE_VAR, table.is_none())]
                    .into_iter()
                    .filter_map(|(name, absent)| absent.then_some(name))
                    .collect();
                Err(Error::Config(format!(
                    "missing required environment variables: {}",
                    missing.join(", ")
                )))
            }
        }
    }
}

/// Everything one run produces.
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    pub raw: FetchResult,
    /// Cleaned table.
    pub table: Table,
    pub summary: Summary,
    pub metrics: Metrics,
}

impl ExtractionOutcome {
    pub fn row_count(&self) -> usize {
        self.table.row_count()
    }
}

/// Normalize, clean, summarize and compute metrics for already-fetched rows.
pub fn process(raw: FetchResult) -> ExtractionOutcome {
    let normalized = normalize(&raw.rows, &raw.column_map);
    let table = clean(&normalized);
    let summary = summarize(&table);
    let metrics = compute_timesheet_metrics(&table);
    ExtractionOutcome {
        raw,
        table,
        summary,
        metrics,
    }
}

pub struct Extractor<S = CodaClient> {
    fetcher: Fetcher<S>,
}

impl Extractor<CodaClient> {
    /// HTTP client from `cfg`, snapshots under `cfg.raw_dir`. Fails before
    /// any network call when the token is missing.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let client = CodaClient::from_config(cfg)?;
        Ok(Self::new(
            Fetcher::new(client).with_snapshots(SnapshotStore::new(&cfg.raw_dir)),
        ))
    }

    pub async fn list_documents(&self) -> Result<Vec<DocSummary>> {
        let docs = self.fetcher.source().list_docs().await?;
        info!(count = docs.len(), "listed documents");
        Ok(docs)
    }

    pub async fn list_tables(&self, doc_id: &str) -> Result<Vec<TableSummary>> {
        let tables = self.fetcher.source().list_tables(doc_id).await?;
        info!(doc_id, count = tables.len(), "listed tables");
        Ok(tables)
    }
}

impl<S: RowSource> Extractor<S> {
    pub fn new(fetcher: Fetcher<S>) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &Fetcher<S> {
        &self.fetcher
    }

    pub async fn fetch(&self, request: &ExtractRequest) -> Result<FetchResult> {
        self.fetcher
            .fetch(
                &request.doc_id,
                &request.table_id,
                request.max_rows,
                request.columns.as_deref(),
            )
            .await
    }

    /// Normalized, uncleaned table.
    pub async fn extract(
        &self,
        doc_id: &str,
        table_id: &str,
        max_rows: Option<usize>,
        selected: Option<&[String]>,
    ) -> Result<Table> {
        let raw = self.fetcher.fetch(doc_id, table_id, max_rows, selected).await?;
        Ok(normalize(&raw.rows, &raw.column_map))
    }

    #[instrument(level = "info", skip(self, request), fields(doc = %request.doc_id, table = %request.table_id))]
    pub async fn run(&self, request: &ExtractRequest) -> Result<ExtractionOutcome> {
        let raw = self.fetch(request).await?;
        let outcome = process(raw);
        info!(
            rows = outcome.row_count(),
            metrics = outcome.metrics.len(),
            "extraction finished"
        );
        Ok(outcome)
    }
}

/// Run [`Extractor::run`] on the runtime's worker pool so an interactive
/// caller only waits on the handle.
pub fn spawn_extraction<S>(
    extractor: Arc<Extractor<S>>,
    request: ExtractRequest,
) -> JoinHandle<Result<ExtractionOutcome>>
where
    S: RowSource + Send + Sync + 'static,
{
    tokio::spawn(async move { extractor.run(&request).await })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ColumnDef, RawRow};
    use crate::extract::fetch::tests::FakeSource;
    use crate::metrics::MetricValue;
    use crate::process::Cell;
    use serde_json::json;

    fn acme_source() -> FakeSource {
        let source = FakeSource::new(vec![
            ColumnDef::new("c1", "Hours"),
            ColumnDef::new("c2", "Project"),
        ]);
        let mut row = RawRow::default();
        row.values.insert("c1".into(), json!("5"));
        row.values.insert("c2".into(), json!({"name": "Acme"}));
        source.push_rows(vec![row], None);
        source
    }

    #[tokio::test]
    async fn end_to_end_hours_by_project() {
        let extractor = Extractor::new(Fetcher::new(acme_source()));
        let outcome = extractor.run(&ExtractRequest::new("doc", "tbl")).await.unwrap();

        assert_eq!(outcome.table.columns(), ["Hours", "Project"]);
        assert_eq!(outcome.table.rows()[0], vec![Cell::Number(5.0), Cell::from("Acme")]);
        assert_eq!(
            outcome.metrics.get("total_hours"),
            Some(&MetricValue::Number(5.0))
        );
        let breakdown = outcome
            .metrics
            .get("project_breakdown")
            .and_then(MetricValue::as_group)
            .unwrap();
        assert_eq!(breakdown.get("Acme"), Some(&5.0));
        assert_eq!(outcome.summary.rows, 1);
    }

    #[tokio::test]
    async fn extract_returns_uncleaned_table() {
        let extractor = Extractor::new(Fetcher::new(acme_source()));
        let table = extractor.extract("doc", "tbl", None, None).await.unwrap();
        assert_eq!(table.get(0, "Hours"), Some(&Cell::from("5")));
    }

    #[tokio::test]
    async fn spawned_run_reports_upstream_errors() {
        let source = FakeSource::new(vec![ColumnDef::new("c1", "Hours")]);
        source.push_error(401);
        let extractor = Arc::new(Extractor::new(Fetcher::new(source)));

        let result = spawn_extraction(extractor, ExtractRequest::new("doc", "tbl"))
            .await
            .unwrap();

        assert!(matches!(result, Err(Error::Upstream { status: 401, .. })));
    }

    #[test]
    fn request_from_config_lists_missing_ids() {
        let cfg = Config::from_lookup(|key| (key == DOC_VAR).then(|| "d-1".to_string()));
        let err = ExtractRequest::from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains(TABLE_VAR));
        assert!(!err.to_string().contains(DOC_VAR));

        let cfg = Config::from_lookup(|key| match key {
            DOC_VAR => Some("d-1".into()),
            TABLE_VAR => Some("t-1".into()),
            _ => None,
        });
        assert_eq!(
            ExtractRequest::from_config(&cfg).unwrap(),
            ExtractRequest::new("d-1", "t-1")
        );
    }

    #[test]
    fn extractor_needs_a_token() {
        let err = Extractor::from_config(&Config::default()).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }
}
