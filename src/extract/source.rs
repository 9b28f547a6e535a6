// src/extract/source.rs

use crate::api::{CodaClient, ColumnDef, Page, PageRequest, RawRow};
use crate::error::Result;
use std::future::Future;

/// The two upstream calls the extraction loop needs. Implemented by
/// [`CodaClient`]; tests substitute scripted sources.
pub trait RowSource {
    fn columns(
        &self,
        doc_id: &str,
        table_id: &str,
    ) -> impl Future<Output = Result<Vec<ColumnDef>>> + Send;

    fn rows_page(
        &self,
        doc_id: &str,
        table_id: &str,
        request: &PageRequest,
    ) -> impl Future<Output = Result<Page<RawRow>>> + Send;
}

impl RowSource for CodaClient {
    async fn columns(&self, doc_id: &str, table_id: &str) -> Result<Vec<ColumnDef>> {
        self.list_columns(doc_id, table_id).await
    }

    async fn rows_page(
        &self,
        doc_id: &str,
        table_id: &str,
        request: &PageRequest,
    ) -> Result<Page<RawRow>> {
        CodaClient::rows_page(self, doc_id, table_id, request).await
    }
}
