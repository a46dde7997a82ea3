//! Stream definitions

use crate::pagination::PaginationConfig;
use crate::partition::ParentRouter;
use crate::schema::{Field, RecordMapper};
use crate::types::ReplicationMethod;
use serde_json::Value;

/// Binding of a child stream to its parent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentBinding {
    /// Parent stream name
    pub stream: String,
    /// Field of the parent record holding its identifier
    pub parent_key: String,
    /// Endpoint placeholder (and child field) receiving the identifier
    pub placeholder: String,
}

/// Replication settings
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Replication {
    /// Fetch everything every run
    #[default]
    FullTable,
    /// Fetch from the stored bookmark onwards
    Incremental {
        /// Field whose maximum becomes the bookmark
        replication_key: String,
        /// Query parameter carrying the stored bookmark
        filter_param: Option<String>,
    },
}

impl Replication {
    /// Catalog replication method
    pub fn method(&self) -> ReplicationMethod {
        match self {
            Replication::FullTable => ReplicationMethod::FullTable,
            Replication::Incremental { .. } => ReplicationMethod::Incremental,
        }
    }

    /// Replication key for incremental streams
    pub fn replication_key(&self) -> Option<&str> {
        match self {
            Replication::FullTable => None,
            Replication::Incremental {
                replication_key, ..
            } => Some(replication_key),
        }
    }
}

/// Fixed enrichment applied to raw records before mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enrichment {
    /// Set `country_code` from the configuration
    CountryCode,
    /// Set a field to the parent identifier
    ParentId(&'static str),
    /// Set a field to a constant string
    Constant {
        /// Target field
        field: &'static str,
        /// Value written
        value: &'static str,
    },
    /// Set a field to the 1-based extraction order within the instance
    Rank(&'static str),
}

/// Immutable descriptor of one stream
#[derive(Debug, Clone)]
pub struct StreamDefinition {
    /// Stream name
    pub name: String,
    /// Endpoint path template
    pub endpoint: String,
    /// Path to the records inside an object envelope
    pub records_path: String,
    /// Pagination strategy
    pub pagination: PaginationConfig,
    /// Primary-key fields
    pub primary_key: &'static [&'static str],
    /// Ordered schema
    pub schema: &'static [Field],
    /// Parent binding for child streams
    pub parent: Option<ParentBinding>,
    /// Replication settings
    pub replication: Replication,
    /// Enrichments, applied in order
    pub enrichments: Vec<Enrichment>,
}

impl StreamDefinition {
    /// Root, full-table stream with no pagination and records at `$.data[*]`
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        schema: &'static [Field],
        primary_key: &'static [&'static str],
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            records_path: "$.data[*]".to_string(),
            pagination: PaginationConfig::None,
            primary_key,
            schema,
            parent: None,
            replication: Replication::FullTable,
            enrichments: Vec::new(),
        }
    }

    /// Set the records path
    #[must_use]
    pub fn records_path(mut self, path: impl Into<String>) -> Self {
        self.records_path = path.into();
        self
    }

    /// Set the pagination strategy
    #[must_use]
    pub fn paginate(mut self, pagination: PaginationConfig) -> Self {
        self.pagination = pagination;
        self
    }

    /// Bind to a parent stream
    #[must_use]
    pub fn child_of(
        mut self,
        parent: impl Into<String>,
        parent_key: impl Into<String>,
        placeholder: impl Into<String>,
    ) -> Self {
        self.parent = Some(ParentBinding {
            stream: parent.into(),
            parent_key: parent_key.into(),
            placeholder: placeholder.into(),
        });
        self
    }

    /// Replicate incrementally on a key
    #[must_use]
    pub fn incremental(
        mut self,
        replication_key: impl Into<String>,
        filter_param: Option<&str>,
    ) -> Self {
        self.replication = Replication::Incremental {
            replication_key: replication_key.into(),
            filter_param: filter_param.map(str::to_string),
        };
        self
    }

    /// Add an enrichment
    #[must_use]
    pub fn enrich(mut self, enrichment: Enrichment) -> Self {
        self.enrichments.push(enrichment);
        self
    }

    /// Whether the stream is bound to a parent
    pub fn is_child(&self) -> bool {
        self.parent.is_some()
    }

    /// Whether a field is declared
    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Look up a declared field
    pub fn field(&self, name: &str) -> Option<&'static Field> {
        self.schema.iter().find(|field| field.name == name)
    }

    /// Router deriving child partitions from parent records
    pub fn router(&self) -> Option<ParentRouter> {
        self.parent.as_ref().map(|binding| {
            ParentRouter::new(&self.name, &binding.parent_key, &binding.placeholder)
        })
    }

    /// Mapper for this stream; key, parent-binding and replication fields always kept
    pub fn mapper(&self) -> RecordMapper {
        let mut mapper = RecordMapper::new(&self.name, self.schema).with_primary_key(self.primary_key);

        let pinned = [
            self.parent.as_ref().map(|binding| binding.placeholder.as_str()),
            self.replication.replication_key(),
        ];
        for name in pinned.into_iter().flatten() {
            if let Some(field) = self.field(name) {
                mapper = mapper.always_include(field.name);
            }
        }
        mapper
    }

    /// Apply the enrichments to a raw record; `rank` is 1-based
    pub fn apply_enrichments(
        &self,
        raw: &mut Value,
        country_code: &str,
        parent_id: Option<&str>,
        rank: u64,
    ) {
        let Value::Object(object) = raw else {
            return;
        };

        for enrichment in &self.enrichments {
            match enrichment {
                Enrichment::CountryCode => {
                    object.insert("country_code".to_string(), Value::from(country_code));
                }
                Enrichment::ParentId(field) => {
                    if let Some(id) = parent_id {
                        object.insert((*field).to_string(), Value::from(id));
                    }
                }
                Enrichment::Constant { field, value } => {
                    object.insert((*field).to_string(), Value::from(*value));
                }
                Enrichment::Rank(field) => {
                    object.insert((*field).to_string(), Value::from(rank));
                }
            }
        }
    }
}
