//! Pagination strategy implementations
//!
//! Each strategy handles a specific pagination pattern.

use super::types::{NextPage, PaginationState, Paginator};
use crate::decode::lookup_path;
use crate::error::{Error, Result};
use crate::types::scalar_to_string;
use serde_json::Value;
use std::collections::HashMap;

// ============================================================================
// No Pagination
// ============================================================================

/// Single page, no pagination
#[derive(Debug, Clone, Default)]
pub struct NoPaginator;

impl Paginator for NoPaginator {
    fn initial_params(&self, _state: &PaginationState) -> HashMap<String, String> {
        HashMap::new()
    }

    fn process_response(
        &self,
        _body: &Value,
        records: &[Value],
        state: &mut PaginationState,
    ) -> Result<NextPage> {
        state.add_fetched(records.len() as u64);
        state.mark_done();
        Ok(NextPage::Done)
    }
}

// ============================================================================
// Cursor Pagination
// ============================================================================

/// Cursor-based pagination
///
/// The response envelope carries the cursor of the next page, which is sent
/// back as a query parameter: `?cursor=abc123`. A bare array response has no
/// envelope and therefore ends the walk.
#[derive(Debug, Clone)]
pub struct CursorPaginator {
    /// Query parameter name for cursor
    pub cursor_param: String,
    /// Path to the cursor in the response body
    pub cursor_path: String,
}

impl CursorPaginator {
    /// Create a new cursor paginator
    pub fn new(cursor_param: impl Into<String>, cursor_path: impl Into<String>) -> Self {
        Self {
            cursor_param: cursor_param.into(),
            cursor_path: cursor_path.into(),
        }
    }

    fn extract_cursor(&self, body: &Value) -> Result<Option<String>> {
        if !body.is_object() {
            return Ok(None);
        }

        match lookup_path(body, &self.cursor_path) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(value) => scalar_to_string(value).map(Some).ok_or_else(|| {
                Error::pagination(format!(
                    "cursor at '{}' must be a string or number, got {value}",
                    self.cursor_path
                ))
            }),
        }
    }
}

impl Paginator for CursorPaginator {
    fn initial_params(&self, state: &PaginationState) -> HashMap<String, String> {
        let mut params = HashMap::new();
        if let Some(cursor) = &state.cursor {
            params.insert(self.cursor_param.clone(), cursor.clone());
        }
        params
    }

    fn process_response(
        &self,
        body: &Value,
        records: &[Value],
        state: &mut PaginationState,
    ) -> Result<NextPage> {
        state.add_fetched(records.len() as u64);

        if records.is_empty() {
            state.mark_done();
            return Ok(NextPage::Done);
        }

        let Some(cursor) = self.extract_cursor(body)? else {
            state.mark_done();
            return Ok(NextPage::Done);
        };

        if !state.set_cursor(cursor.clone()) {
            return Err(Error::pagination(format!(
                "server returned the cursor '{cursor}' that was already requested"
            )));
        }

        Ok(NextPage::with_param(&self.cursor_param, cursor))
    }
}

// ============================================================================
// Last Record Pagination
// ============================================================================

/// Pagination keyed on the last record of a full page
///
/// Sends `?limit=<page_size>` and, after the first page,
/// `&cursor_key=<id of the last record>`. A page shorter than the limit is
/// the last one.
#[derive(Debug, Clone)]
pub struct LastRecordPaginator {
    /// Query parameter carrying the page size
    pub limit_param: String,
    /// Query parameter carrying the last seen id
    pub cursor_param: String,
    /// Record field used as cursor
    pub id_field: String,
    /// Records requested per page
    pub page_size: u32,
}

impl LastRecordPaginator {
    /// Create a new last-record paginator
    pub fn new(
        limit_param: impl Into<String>,
        cursor_param: impl Into<String>,
        id_field: impl Into<String>,
        page_size: u32,
    ) -> Self {
        Self {
            limit_param: limit_param.into(),
            cursor_param: cursor_param.into(),
            id_field: id_field.into(),
            page_size,
        }
    }

    fn params(&self, cursor: Option<&str>) -> HashMap<String, String> {
        let mut params = HashMap::new();
        params.insert(self.limit_param.clone(), self.page_size.to_string());
        if let Some(cursor) = cursor {
            params.insert(self.cursor_param.clone(), cursor.to_string());
        }
        params
    }
}

impl Paginator for LastRecordPaginator {
    fn initial_params(&self, state: &PaginationState) -> HashMap<String, String> {
        self.params(state.cursor.as_deref())
    }

    fn process_response(
        &self,
        _body: &Value,
        records: &[Value],
        state: &mut PaginationState,
    ) -> Result<NextPage> {
        state.add_fetched(records.len() as u64);

        let Some(last) = records.last() else {
            state.mark_done();
            return Ok(NextPage::Done);
        };

        if records.len() < self.page_size as usize {
            state.mark_done();
            return Ok(NextPage::Done);
        }

        let cursor = last
            .get(&self.id_field)
            .and_then(scalar_to_string)
            .ok_or_else(|| {
                Error::pagination(format!(
                    "last record of a full page has no usable '{}'",
                    self.id_field
                ))
            })?;

        if !state.set_cursor(cursor.clone()) {
            return Err(Error::pagination(format!(
                "page ended on a '{}' an earlier page already ended on: {cursor}",
                self.id_field
            )));
        }

        Ok(NextPage::with_params(self.params(Some(&cursor))))
    }
}
