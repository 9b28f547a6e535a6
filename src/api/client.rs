// src/api/client.rs

use super::types::{ColumnDef, DocSummary, Page, PageRequest, RawRow, TableSummary};
use crate::config::Config;
use crate::error::{Error, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, instrument};
use url::Url;

/// Largest `limit` the rows endpoint accepts.
pub const MAX_PAGE_SIZE: usize = 500;

/// Thin typed wrapper over the document-table REST endpoints.
#[derive(Debug, Clone)]
pub struct CodaClient {
    http: Client,
    base: Url,
    token: String,
}

impl CodaClient {
    pub fn new(base_url: &str, token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base_url)?;
        if base.cannot_be_a_base() {
            return Err(Error::Config(format!("base url `{base_url}` cannot carry a path")));
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base,
            token: token.into(),
        })
    }

    /// Fails fast with [`Error::Config`] when no token is configured.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(&cfg.base_url, cfg.token()?, cfg.request_timeout)
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(%url, "GET");
        let resp = self
            .http
            .get(url.clone())
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!(%url, status = status.as_u16(), "request rejected");
            return Err(Error::Upstream {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            });
        }
        Ok(resp.json::<T>().await?)
    }

    /// Follow `nextPageToken` until the listing is exhausted. An empty page
    /// ends the walk even when it carries a token.
    async fn get_all<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let mut page_url = url.clone();
            if let Some(t) = &token {
                page_url.query_pairs_mut().append_pair("pageToken", t);
            }
            let page: Page<T> = self.get_json(page_url).await?;
            token = page.continuation().map(str::to_string);
            let received = page.items.len();
            items.extend(page.items);
            if received == 0 || token.is_none() {
                return Ok(items);
            }
        }
    }

    #[instrument(level = "info", skip(self))]
    pub async fn list_docs(&self) -> Result<Vec<DocSummary>> {
        self.get_all(self.endpoint(&["docs"])).await
    }

    #[instrument(level = "info", skip(self))]
    pub async fn list_tables(&self, doc_id: &str) -> Result<Vec<TableSummary>> {
        self.get_all(self.endpoint(&["docs", doc_id, "tables"])).await
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn list_columns(&self, doc_id: &str, table_id: &str) -> Result<Vec<ColumnDef>> {
        self.get_all(self.endpoint(&["docs", doc_id, "tables", table_id, "columns"]))
            .await
    }

    #[instrument(level = "debug", skip(self, request), fields(limit = request.limit))]
    pub async fn rows_page(
        &self,
        doc_id: &str,
        table_id: &str,
        request: &PageRequest,
    ) -> Result<Page<RawRow>> {
        let mut url = self.endpoint(&["docs", doc_id, "tables", table_id, "rows"]);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &request.limit.to_string());
            if let Some(token) = &request.page_token {
                query.append_pair("pageToken", token);
            }
            if !request.columns.is_empty() {
                query.append_pair("columns", &request.columns.join(","));
            }
        }
        self.get_json(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_appends_segments_to_base_path() {
        let client =
            CodaClient::new("https://coda.io/apis/v1", "tok", Duration::from_secs(5)).unwrap();
        let url = client.endpoint(&["docs", "d-1", "tables", "grid 1", "rows"]);
        assert_eq!(
            url.as_str(),
            "https://coda.io/apis/v1/docs/d-1/tables/grid%201/rows"
        );

        let trailing =
            CodaClient::new("http://localhost:8080/", "tok", Duration::from_secs(5)).unwrap();
        assert_eq!(
            trailing.endpoint(&["docs"]).as_str(),
            "http://localhost:8080/docs"
        );
    }

    #[test]
    fn from_config_requires_token() {
        let err = CodaClient::from_config(&Config::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn rejects_non_base_urls() {
        let err = CodaClient::new("mailto:someone@example.com", "tok", Duration::from_secs(5))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
