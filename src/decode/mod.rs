//! Response decoder module
//!
//! Extracts the raw records of one page from a parsed JSON response body.
//!
//! # Overview
//!
//! The Faethm endpoints answer either with a bare JSON array of records or
//! with an object envelope that holds the records under a path such as
//! `$.data[*]` or `$.skills[*]`. A bare array is always taken as the record
//! list; an envelope is resolved through the configured record path.

mod decoders;
mod types;

pub use decoders::{lookup_path, JsonDecoder};
pub use types::RecordDecoder;
