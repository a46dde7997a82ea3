//! Per-instance stream sync

use super::definition::{Replication, StreamDefinition};
use crate::context::RunContext;
use crate::decode::JsonDecoder;
use crate::error::{Error, Result};
use crate::pagination::PageReader;
use crate::partition::Partition;
use crate::schema::{OutputRecord, RecordMapper};
use crate::state::{compare_cursors, StateManager};
use crate::template::{self, TemplateContext};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Counters for one stream instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstanceStats {
    /// Pages fetched
    pub pages: u64,
    /// Records handed to the caller
    pub records: u64,
    /// Records dropped on schema mismatch
    pub dropped: u64,
    /// Records below the incremental bookmark
    pub filtered: u64,
}

/// One stream instance: a root stream, or a child stream for one parent record
///
/// Yields mapped record batches, one per page. The bookmark for a page is
/// committed once the caller has consumed it: on [`StreamSync::commit`], on
/// the following [`StreamSync::next_batch`], or on exhaustion.
pub struct StreamSync {
    definition: Arc<StreamDefinition>,
    partition: Option<Partition>,
    reader: PageReader,
    mapper: RecordMapper,
    state: StateManager,
    country_code: String,
    start_bookmark: Option<String>,
    pending_bookmark: Option<String>,
    extracted: u64,
    stats: InstanceStats,
}

impl StreamSync {
    /// Prepare an instance; no request is sent until the first batch
    ///
    /// `selection` restricts the emitted fields (`None` keeps all of them).
    pub async fn start(
        ctx: &RunContext,
        definition: Arc<StreamDefinition>,
        partition: Option<Partition>,
        selection: Option<HashSet<String>>,
    ) -> Result<Self> {
        let template_ctx = partition
            .as_ref()
            .map_or_else(TemplateContext::new, Partition::template_context);
        let path = template::render(&definition.endpoint, &template_ctx)?;

        let partition_id = partition.as_ref().map(|p| p.id.as_str());
        let start_bookmark = match &definition.replication {
            Replication::FullTable => None,
            Replication::Incremental { .. } => {
                ctx.state
                    .get_scoped_cursor(&definition.name, partition_id)
                    .await
            }
        };

        let paginator = definition.pagination.build(ctx.config.page_size);
        let mut reader = PageReader::new(
            Arc::clone(&ctx.client),
            path,
            JsonDecoder::with_path(&definition.records_path),
            paginator,
        );
        if let (
            Replication::Incremental {
                filter_param: Some(param),
                ..
            },
            Some(bookmark),
        ) = (&definition.replication, &start_bookmark)
        {
            reader = reader.with_query(param, bookmark);
        }

        debug!(
            stream = %definition.name,
            parent = ?partition_id,
            path = %reader.path(),
            bookmark = ?start_bookmark,
            "Prepared stream instance"
        );

        Ok(Self {
            mapper: definition.mapper().with_selection(selection),
            definition,
            partition,
            reader,
            state: ctx.state.clone(),
            country_code: ctx.config.country_code.clone(),
            start_bookmark,
            pending_bookmark: None,
            extracted: 0,
            stats: InstanceStats::default(),
        })
    }

    /// Definition of the stream
    pub fn definition(&self) -> &Arc<StreamDefinition> {
        &self.definition
    }

    /// Parent identifier for child instances
    pub fn parent_id(&self) -> Option<&str> {
        self.partition.as_ref().map(|p| p.id.as_str())
    }

    /// Counters so far
    pub fn stats(&self) -> InstanceStats {
        self.stats
    }

    /// Commit the bookmark of the page last handed out
    pub async fn commit(&mut self) {
        let Some(bookmark) = self.pending_bookmark.take() else {
            return;
        };
        let partition_id = self.partition.as_ref().map(|p| p.id.as_str());
        if self
            .state
            .advance_cursor(&self.definition.name, partition_id, &bookmark)
            .await
        {
            debug!(stream = %self.definition.name, parent = ?partition_id, %bookmark, "Bookmark advanced");
        }
    }

    /// Next batch of mapped records, `None` once the endpoint is exhausted
    ///
    /// Records failing to map are dropped and counted; transport and
    /// pagination errors end the instance.
    pub async fn next_batch(&mut self) -> Result<Option<Vec<OutputRecord>>> {
        self.commit().await;

        let Some(page) = self.reader.next_page().await? else {
            return Ok(None);
        };
        self.stats.pages += 1;

        let parent_id = self.partition.as_ref().map(|p| p.id.clone());
        let replication_key = self.definition.replication.replication_key();
        let mut batch = Vec::with_capacity(page.records.len());
        let mut page_max: Option<String> = None;

        for mut raw in page.records {
            self.extracted += 1;
            self.definition.apply_enrichments(
                &mut raw,
                &self.country_code,
                parent_id.as_deref(),
                self.extracted,
            );

            let record = match self.mapper.map(&raw, parent_id.as_deref()) {
                Ok(record) => record,
                Err(e @ Error::SchemaMismatch { .. }) => {
                    warn!(stream = %self.definition.name, parent = ?parent_id, "Dropping record: {e}");
                    self.stats.dropped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            if let Some(key) = replication_key {
                let value = record.get(key).and_then(|v| v.as_key());
                if let (Some(value), Some(bookmark)) = (&value, &self.start_bookmark) {
                    if compare_cursors(value, bookmark) == Ordering::Less {
                        self.stats.filtered += 1;
                        continue;
                    }
                }
                if let Some(value) = value {
                    let is_new_max = page_max
                        .as_deref()
                        .map_or(true, |max| compare_cursors(&value, max) == Ordering::Greater);
                    if is_new_max {
                        page_max = Some(value);
                    }
                }
            }

            batch.push(record);
        }

        self.stats.records += batch.len() as u64;
        self.pending_bookmark = page_max;
        Ok(Some(batch))
    }
}

impl std::fmt::Debug for StreamSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSync")
            .field("stream", &self.definition.name)
            .field("parent", &self.parent_id())
            .field("reader", &self.reader)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
