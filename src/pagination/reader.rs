//! Page reader
//!
//! Drives repeated requests against one endpoint, one page per call.

use super::types::{NextPage, Page, PaginationState, Paginator};
use crate::decode::{JsonDecoder, RecordDecoder};
use crate::error::Result;
use crate::http::{HttpClient, RequestConfig};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

/// Lazy, finite walk over the pages of one endpoint
pub struct PageReader {
    client: Arc<HttpClient>,
    path: String,
    query: BTreeMap<String, String>,
    decoder: JsonDecoder,
    paginator: Box<dyn Paginator>,
    state: PaginationState,
    next_params: Option<HashMap<String, String>>,
}

impl PageReader {
    /// Create a reader for a rendered endpoint path
    pub fn new(
        client: Arc<HttpClient>,
        path: impl Into<String>,
        decoder: JsonDecoder,
        paginator: Box<dyn Paginator>,
    ) -> Self {
        Self {
            client,
            path: path.into(),
            query: BTreeMap::new(),
            decoder,
            paginator,
            state: PaginationState::new(),
            next_params: None,
        }
    }

    /// Add a fixed query parameter sent with every page
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Endpoint path this reader walks
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Pagination progress so far
    pub fn state(&self) -> &PaginationState {
        &self.state
    }

    /// Whether the walk has ended
    pub fn is_done(&self) -> bool {
        self.state.done
    }

    /// Fetch the next page, `None` once the walk is exhausted
    ///
    /// Transport errors propagate unchanged and end the walk.
    pub async fn next_page(&mut self) -> Result<Option<Page>> {
        if self.state.done {
            return Ok(None);
        }

        match self.fetch().await {
            Ok(page) => Ok(Some(page)),
            Err(e) => {
                self.state.mark_done();
                Err(e)
            }
        }
    }

    async fn fetch(&mut self) -> Result<Page> {
        let params = match self.next_params.take() {
            Some(params) => params,
            None => self.paginator.initial_params(&self.state),
        };

        let mut request = RequestConfig::new();
        for (key, value) in &self.query {
            request = request.query(key, value);
        }
        for (key, value) in params {
            request = request.query(key, value);
        }

        let requested_cursor = self.state.cursor.clone();
        let response = self.client.get_json_with_config(&self.path, request).await?;
        let records = self.decoder.decode(&response.body)?;

        let next = self
            .paginator
            .process_response(&response.body, &records, &mut self.state)?;
        self.state.next_page();

        let next_cursor = match next {
            NextPage::Continue { query_params } => {
                self.next_params = Some(query_params);
                self.state.cursor.clone()
            }
            NextPage::Done => {
                self.state.mark_done();
                None
            }
        };

        debug!(
            path = %self.path,
            page = self.state.page,
            records = records.len(),
            "Fetched page"
        );

        Ok(Page {
            number: self.state.page,
            records,
            cursor: requested_cursor,
            next_cursor,
        })
    }
}

impl std::fmt::Debug for PageReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageReader")
            .field("path", &self.path)
            .field("query", &self.query)
            .field("decoder", &self.decoder)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
