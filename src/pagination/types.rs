//! Pagination types and traits
//!
//! Defines the core pagination abstractions used by all strategies.

use super::strategies::{CursorPaginator, LastRecordPaginator, NoPaginator};
use crate::error::Result;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Result of the next page computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// More pages available with these parameters
    Continue {
        /// Query parameters to add/replace
        query_params: HashMap<String, String>,
    },
    /// No more pages
    Done,
}

impl NextPage {
    /// Create a continuation with query parameters
    pub fn with_params(params: HashMap<String, String>) -> Self {
        Self::Continue {
            query_params: params,
        }
    }

    /// Create a continuation with a single parameter
    pub fn with_param(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut params = HashMap::new();
        params.insert(key.into(), value.into());
        Self::Continue {
            query_params: params,
        }
    }

    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// One fetched page
#[derive(Debug, Clone)]
pub struct Page {
    /// 1-based position of the page within the walk
    pub number: u32,
    /// Raw records in response order
    pub records: Vec<Value>,
    /// Cursor the page was requested with
    pub cursor: Option<String>,
    /// Cursor for the following page, if any
    pub next_cursor: Option<String>,
}

/// Declarative pagination choice carried by a stream definition
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PaginationConfig {
    /// Single request
    #[default]
    None,

    /// Cursor returned in the response body
    Cursor {
        /// Query parameter name for cursor
        cursor_param: String,
        /// Path to the cursor in the response body
        cursor_path: String,
    },

    /// Cursor taken from the last record of a full page
    LastRecord {
        /// Query parameter carrying the page size
        limit_param: String,
        /// Query parameter carrying the last seen id
        cursor_param: String,
        /// Record field used as cursor
        id_field: String,
    },
}

impl PaginationConfig {
    /// Body cursor with the Faethm parameter names
    pub fn cursor() -> Self {
        Self::Cursor {
            cursor_param: "cursor".to_string(),
            cursor_path: "next_cursor".to_string(),
        }
    }

    /// Last-record cursor with the Faethm parameter names
    pub fn last_record() -> Self {
        Self::LastRecord {
            limit_param: "limit".to_string(),
            cursor_param: "cursor_key".to_string(),
            id_field: "id".to_string(),
        }
    }

    /// Build the strategy; `page_size` applies to limit-based strategies
    pub fn build(&self, page_size: u32) -> Box<dyn Paginator> {
        match self {
            Self::None => Box::new(NoPaginator),
            Self::Cursor {
                cursor_param,
                cursor_path,
            } => Box::new(CursorPaginator::new(cursor_param, cursor_path)),
            Self::LastRecord {
                limit_param,
                cursor_param,
                id_field,
            } => Box::new(LastRecordPaginator::new(
                limit_param,
                cursor_param,
                id_field,
                page_size,
            )),
        }
    }
}

/// Tracks pagination state during iteration
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    /// Pages fetched so far
    pub page: u32,
    /// Current cursor value
    pub cursor: Option<String>,
    /// Total records fetched so far
    pub total_fetched: u64,
    /// Is pagination complete?
    pub done: bool,
    /// Every cursor requested during this walk
    seen_cursors: HashSet<String>,
}

impl PaginationState {
    /// Create a new pagination state
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark pagination as complete
    pub fn mark_done(&mut self) {
        self.done = true;
    }

    /// Increment page number
    pub fn next_page(&mut self) {
        self.page += 1;
    }

    /// Set cursor; returns false when the walk already requested it
    pub fn set_cursor(&mut self, cursor: String) -> bool {
        let fresh = self.seen_cursors.insert(cursor.clone());
        self.cursor = Some(cursor);
        fresh
    }

    /// Add to total fetched
    pub fn add_fetched(&mut self, count: u64) {
        self.total_fetched += count;
    }
}

/// Core trait for pagination strategies
pub trait Paginator: Send + Sync {
    /// Query parameters for the first request
    fn initial_params(&self, state: &PaginationState) -> HashMap<String, String>;

    /// Process a response and determine if there's a next page
    fn process_response(
        &self,
        body: &Value,
        records: &[Value],
        state: &mut PaginationState,
    ) -> Result<NextPage>;
}
