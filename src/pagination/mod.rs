//! Pagination module
//!
//! Supports: no pagination, body cursor, last-record cursor
//!
//! # Overview
//!
//! The pagination module provides a unified interface for walking one
//! endpoint page by page. Each strategy extracts the next page parameters
//! from responses and tracks when pagination is complete; the
//! [`PageReader`] drives the requests and hands out one [`Page`] at a time.

mod reader;
mod strategies;
mod types;

pub use reader::PageReader;
pub use strategies::{CursorPaginator, LastRecordPaginator, NoPaginator};
pub use types::{NextPage, Page, PaginationConfig, PaginationState, Paginator};
