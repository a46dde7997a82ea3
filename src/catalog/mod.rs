//! Catalog module
//!
//! Discovery output and stream/field selection input, in the Singer catalog
//! format.

mod selection;
mod types;

pub use selection::Selection;
pub use types::{discover, Catalog, CatalogEntry, MetadataEntry};

#[cfg(test)]
mod tests;
