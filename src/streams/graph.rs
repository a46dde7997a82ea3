//! Stream graph
//!
//! Parent/child relationships resolved once at startup.

use super::definition::{Replication, StreamDefinition};
use crate::error::{Error, Result};
use crate::template;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Validated DAG of stream definitions
#[derive(Debug, Clone)]
pub struct StreamGraph {
    streams: Vec<Arc<StreamDefinition>>,
    index: HashMap<String, usize>,
    children: HashMap<String, Vec<usize>>,
}

impl StreamGraph {
    /// Validate the definitions and build the graph
    ///
    /// Fails with a config error on duplicate names, unknown parents, cycles,
    /// primary keys or replication keys missing from the schema, and
    /// endpoint placeholders that do not match the parent binding.
    pub fn new(definitions: Vec<StreamDefinition>) -> Result<Self> {
        let mut index = HashMap::new();
        for (i, def) in definitions.iter().enumerate() {
            if index.insert(def.name.clone(), i).is_some() {
                return Err(Error::config(format!("duplicate stream name '{}'", def.name)));
            }
        }

        let mut children: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, def) in definitions.iter().enumerate() {
            validate_definition(def)?;

            if let Some(binding) = &def.parent {
                if !index.contains_key(&binding.stream) {
                    return Err(Error::config(format!(
                        "stream '{}' has unknown parent '{}'",
                        def.name, binding.stream
                    )));
                }
                children.entry(binding.stream.clone()).or_default().push(i);
            }
        }

        let graph = Self {
            streams: definitions.into_iter().map(Arc::new).collect(),
            index,
            children,
        };
        graph.check_acyclic()?;
        Ok(graph)
    }

    fn check_acyclic(&self) -> Result<()> {
        for def in &self.streams {
            let mut seen = HashSet::new();
            let mut current = def.as_ref();
            while let Some(binding) = &current.parent {
                if !seen.insert(current.name.as_str()) {
                    return Err(Error::config(format!(
                        "stream '{}' is part of a parent cycle",
                        def.name
                    )));
                }
                match self.get(&binding.stream) {
                    Some(parent) => current = parent.as_ref(),
                    None => break,
                }
            }
        }
        Ok(())
    }

    /// Look up a stream by name
    pub fn get(&self, name: &str) -> Option<&Arc<StreamDefinition>> {
        self.index.get(name).map(|&i| &self.streams[i])
    }

    /// Whether a stream exists
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All streams in definition order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<StreamDefinition>> {
        self.streams.iter()
    }

    /// Stream names in definition order
    pub fn names(&self) -> Vec<&str> {
        self.streams.iter().map(|s| s.name.as_str()).collect()
    }

    /// Streams with no parent
    pub fn roots(&self) -> impl Iterator<Item = &Arc<StreamDefinition>> {
        self.streams.iter().filter(|s| !s.is_child())
    }

    /// Direct children of a stream
    pub fn children(&self, name: &str) -> Vec<&Arc<StreamDefinition>> {
        self.children
            .get(name)
            .map(|ids| ids.iter().map(|&i| &self.streams[i]).collect())
            .unwrap_or_default()
    }

    /// Parent chain of a stream, nearest first
    pub fn ancestors(&self, name: &str) -> Vec<&Arc<StreamDefinition>> {
        let mut chain = Vec::new();
        let mut current = self.get(name);
        while let Some(binding) = current.and_then(|def| def.parent.as_ref()) {
            current = self.get(&binding.stream);
            if let Some(parent) = current {
                chain.push(parent);
            }
        }
        chain
    }
}

fn validate_definition(def: &StreamDefinition) -> Result<()> {
    if def.primary_key.is_empty() {
        return Err(Error::config(format!(
            "stream '{}' declares no primary key",
            def.name
        )));
    }
    for key in def.primary_key {
        if !def.has_field(key) {
            return Err(Error::config(format!(
                "primary key '{key}' of stream '{}' is not in its schema",
                def.name
            )));
        }
    }

    let placeholders = template::placeholders(&def.endpoint);
    match &def.parent {
        None if !placeholders.is_empty() => {
            return Err(Error::config(format!(
                "root stream '{}' has placeholders in '{}'",
                def.name, def.endpoint
            )));
        }
        Some(binding) if placeholders != [binding.placeholder.as_str()] => {
            return Err(Error::config(format!(
                "child stream '{}' must have exactly the placeholder {{{}}} in '{}'",
                def.name, binding.placeholder, def.endpoint
            )));
        }
        _ => {}
    }

    if let Replication::Incremental {
        replication_key, ..
    } = &def.replication
    {
        if !def.has_field(replication_key) {
            return Err(Error::config(format!(
                "replication key '{replication_key}' of stream '{}' is not in its schema",
                def.name
            )));
        }
    }

    Ok(())
}
