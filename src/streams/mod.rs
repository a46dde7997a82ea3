//! Stream module
//!
//! Stream definitions, the Faethm stream set, the parent/child graph, and
//! the per-instance sync that pages through one endpoint.
//!
//! # Overview
//!
//! - `StreamDefinition` - immutable descriptor of one stream
//! - `faethm_streams` - the streams this tap exposes
//! - `StreamGraph` - validated parent/child DAG
//! - `StreamSync` - lazy sequence of mapped record batches for one instance

mod definition;
mod faethm;
mod graph;
mod sync;

pub use definition::{Enrichment, ParentBinding, Replication, StreamDefinition};
pub use faethm::{
    faethm_streams, DECLINING_SKILLS, EMERGING_SKILLS, INDUSTRIES, INDUSTRY_FIELDS, SKILLS_LIST,
    SKILLS_LIST_FIELDS, SKILL_FIELDS, TRENDING_SKILLS,
};
pub use graph::StreamGraph;
pub use sync::{InstanceStats, StreamSync};

#[cfg(test)]
mod tests;
