//! Stream and field selection

use super::types::Catalog;
use crate::error::{Error, Result};
use crate::streams::StreamGraph;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::warn;

/// Which streams, and which of their fields, a run emits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Selected stream -> selected fields (`None` = every field)
    streams: HashMap<String, Option<HashSet<String>>>,
}

impl Selection {
    /// Every stream and every field
    pub fn all(graph: &StreamGraph) -> Self {
        Self {
            streams: graph
                .iter()
                .map(|def| (def.name.clone(), None))
                .collect(),
        }
    }

    /// Selection described by a catalog's metadata
    ///
    /// A stream is selected through `selected` on its stream-level
    /// breadcrumb, falling back to `selected-by-default`. Fields marked
    /// `selected: false` are dropped unless their inclusion is automatic.
    pub fn from_catalog(catalog: &Catalog, graph: &StreamGraph) -> Self {
        let mut streams = HashMap::new();

        for entry in &catalog.streams {
            let Some(def) = graph.get(&entry.tap_stream_id) else {
                warn!(stream = %entry.tap_stream_id, "Ignoring unknown stream in catalog");
                continue;
            };

            let selected = entry
                .stream_metadata()
                .and_then(|m| m.flag("selected").or_else(|| m.flag("selected-by-default")))
                .unwrap_or(false);
            if !selected {
                continue;
            }

            let mut fields = HashSet::new();
            let mut all_fields = true;
            for field in def.schema {
                let field_selected = entry.field_metadata(field.name).map_or(true, |m| {
                    m.text("inclusion") == Some("automatic")
                        || m.flag("selected")
                            .or_else(|| m.flag("selected-by-default"))
                            .unwrap_or(true)
                });
                if field_selected {
                    fields.insert(field.name.to_string());
                } else {
                    all_fields = false;
                }
            }

            streams.insert(def.name.clone(), if all_fields { None } else { Some(fields) });
        }

        Self { streams }
    }

    /// Keep only the named streams; unknown names are an error
    pub fn restrict(mut self, names: &[String], graph: &StreamGraph) -> Result<Self> {
        for name in names {
            if !graph.contains(name) {
                return Err(Error::StreamNotFound {
                    stream: name.clone(),
                });
            }
        }
        self.streams.retain(|stream, _| names.contains(stream));
        Ok(self)
    }

    /// Whether a stream's records are emitted
    pub fn is_selected(&self, stream: &str) -> bool {
        self.streams.contains_key(stream)
    }

    /// Selected fields of a stream (`None` = every field)
    pub fn fields(&self, stream: &str) -> Option<HashSet<String>> {
        self.streams.get(stream).cloned().flatten()
    }

    /// Selected stream names, sorted
    pub fn selected(&self) -> BTreeSet<&str> {
        self.streams.keys().map(String::as_str).collect()
    }

    /// Streams that must run: selected streams and their ancestors
    pub fn active(&self, graph: &StreamGraph) -> HashSet<String> {
        let mut active = HashSet::new();
        for name in self.streams.keys() {
            active.insert(name.clone());
            for ancestor in graph.ancestors(name) {
                active.insert(ancestor.name.clone());
            }
        }
        active
    }
}
