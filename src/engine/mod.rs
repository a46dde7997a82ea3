//! Execution engine module
//!
//! Main read loop and stream orchestration.
//!
//! # Overview
//!
//! The engine module provides:
//! - `CatalogRunner` - drives every selected stream depth-first into a sink
//! - `Message` - SCHEMA, RECORD and STATE protocol messages
//! - `SyncSummary` - per-instance outcomes of a run
//!
//! Root streams run one after the other. Every record of a parent drives one
//! instance of each active child stream before the next parent record is
//! processed, so child records always follow the parent record they belong
//! to. A STATE message is emitted after each root page, once the page's
//! records and all their child instances have been written.

mod types;

pub use types::{InstanceReport, InstanceStatus, Message, StreamSummary, SyncSummary};

use crate::catalog::Selection;
use crate::context::RunContext;
use crate::error::{Error, Result};
use crate::output::MessageSink;
use crate::partition::{ParentRouter, Partition};
use crate::schema::json_schema;
use crate::state::COMPLETE;
use crate::streams::{Replication, StreamDefinition, StreamGraph, StreamSync};
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

type InstanceFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + 'a>>;

/// Runs the selected streams of a catalog
pub struct CatalogRunner<S: MessageSink> {
    ctx: RunContext,
    graph: StreamGraph,
    selection: Selection,
    active: HashSet<String>,
    sink: S,
    schemas_sent: HashSet<String>,
    summary: SyncSummary,
}

impl<S: MessageSink> CatalogRunner<S> {
    /// Create a runner; streams outside the selection and its ancestors are skipped
    pub fn new(ctx: RunContext, graph: StreamGraph, selection: Selection, sink: S) -> Self {
        let active = selection.active(&graph);
        Self {
            ctx,
            graph,
            selection,
            active,
            sink,
            schemas_sent: HashSet::new(),
            summary: SyncSummary::default(),
        }
    }

    /// Get the sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consume the runner and return the sink
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Summary of the last run
    pub fn summary(&self) -> &SyncSummary {
        &self.summary
    }

    /// Run every active stream
    ///
    /// Instance failures are recorded in the summary and the run continues.
    /// Errors fatal to the run (authentication, state, output) abort it
    /// after a final STATE message.
    pub async fn run(&mut self) -> Result<SyncSummary> {
        let started = Instant::now();
        self.summary = SyncSummary::default();
        self.schemas_sent.clear();

        for def in self.graph.iter() {
            if !self.active.contains(&def.name) {
                debug!(stream = %def.name, "Stream not selected, skipping");
                self.summary.skipped.push(def.name.clone());
            }
        }

        self.prepare_state().await;

        let roots: Vec<Arc<StreamDefinition>> = self
            .graph
            .roots()
            .filter(|def| self.active.contains(&def.name))
            .cloned()
            .collect();

        for root in roots {
            info!(stream = %root.name, "Starting stream");
            if let Err(e) = self.run_instance(root, None).await {
                if let Err(state_err) = self.emit_state().await {
                    warn!("Failed to write final state: {state_err}");
                }
                self.summary.duration = started.elapsed();
                return Err(e);
            }
        }

        self.finish_full_table().await;
        self.emit_state().await?;

        self.summary.duration = started.elapsed();
        self.log_summary();
        Ok(self.summary.clone())
    }

    /// Start a fresh pass for full-table streams whose last run completed
    ///
    /// Only a run that aborted leaves completed partitions behind; the rerun
    /// resumes after them.
    async fn prepare_state(&self) {
        for def in self.graph.iter() {
            if !self.active.contains(&def.name) || def.replication != Replication::FullTable {
                continue;
            }
            if self.ctx.state.get_cursor(&def.name).await.as_deref() == Some(COMPLETE) {
                self.ctx.state.clear_stream(&def.name).await;
            }
        }
    }

    /// Close the pass of every full-table stream once the run reached its end
    ///
    /// Streams where neither they nor an ancestor failed are marked complete.
    /// The others lose their partition progress so the next run fetches
    /// everything again.
    async fn finish_full_table(&self) {
        for def in self.graph.iter() {
            if !self.active.contains(&def.name) || def.replication != Replication::FullTable {
                continue;
            }
            let failed = self.summary.stream_failed(&def.name)
                || self
                    .graph
                    .ancestors(&def.name)
                    .iter()
                    .any(|parent| self.summary.stream_failed(&parent.name));

            self.ctx.state.clear_stream(&def.name).await;
            if !failed {
                self.ctx
                    .state
                    .set_cursor(&def.name, COMPLETE.to_string())
                    .await;
            }
        }
    }

    fn run_instance(
        &mut self,
        definition: Arc<StreamDefinition>,
        partition: Option<Partition>,
    ) -> InstanceFuture<'_> {
        Box::pin(async move {
            let is_root = partition.is_none();
            let selected = self.selection.is_selected(&definition.name);
            let mut report = InstanceReport {
                stream: definition.name.clone(),
                parent_id: partition.as_ref().map(|p| p.id.clone()),
                status: InstanceStatus::Running,
                records: 0,
                dropped: 0,
                error: None,
            };

            let fields = self.selection.fields(&definition.name);
            let mut sync =
                match StreamSync::start(&self.ctx, Arc::clone(&definition), partition, fields)
                    .await
                {
                    Ok(sync) => sync,
                    Err(e) => return self.instance_failed(report, e),
                };

            let children: Vec<(Arc<StreamDefinition>, ParentRouter)> = self
                .graph
                .children(&definition.name)
                .into_iter()
                .filter(|child| self.active.contains(&child.name))
                .filter_map(|child| child.router().map(|router| (Arc::clone(child), router)))
                .collect();

            if selected {
                self.emit_schema(&definition)?;
            }

            loop {
                let batch = match sync.next_batch().await {
                    Ok(Some(batch)) => batch,
                    Ok(None) => break,
                    Err(e) => {
                        report.dropped = sync.stats().dropped;
                        return self.instance_failed(report, e);
                    }
                };

                for record in batch {
                    let partitions: Vec<_> = children
                        .iter()
                        .map(|(child, router)| (Arc::clone(child), router.partition_for(&record)))
                        .collect();

                    if selected {
                        self.sink.emit(&Message::record(record))?;
                        report.records += 1;
                    }

                    for (child, partition) in partitions {
                        match partition {
                            Ok(partition) => self.run_child(child, partition).await?,
                            Err(e) => {
                                let child_report = InstanceReport {
                                    stream: child.name.clone(),
                                    parent_id: None,
                                    status: InstanceStatus::Running,
                                    records: 0,
                                    dropped: 0,
                                    error: None,
                                };
                                self.instance_failed(child_report, e)?;
                            }
                        }
                    }
                }

                sync.commit().await;
                if is_root {
                    self.emit_state().await?;
                }
            }

            report.dropped = sync.stats().dropped;
            report.status = InstanceStatus::Complete;
            if let Some(parent_id) = &report.parent_id {
                self.ctx
                    .state
                    .mark_partition_completed(&definition.name, parent_id)
                    .await;
            }

            debug!(
                stream = %report.stream,
                parent = ?report.parent_id,
                records = report.records,
                pages = sync.stats().pages,
                "Stream instance complete"
            );
            self.summary.add_instance(report);
            Ok(())
        })
    }

    async fn run_child(&mut self, child: Arc<StreamDefinition>, partition: Partition) -> Result<()> {
        if child.replication == Replication::FullTable
            && self
                .ctx
                .state
                .is_partition_completed(&child.name, &partition.id)
                .await
        {
            debug!(stream = %child.name, parent = %partition.id, "Partition already synced, skipping");
            return Ok(());
        }
        self.run_instance(child, Some(partition)).await
    }

    /// Record a failed instance; errors fatal to the run are passed back
    fn instance_failed(&mut self, mut report: InstanceReport, error: Error) -> Result<()> {
        warn!(
            stream = %report.stream,
            parent = ?report.parent_id,
            "Stream instance failed: {error}"
        );
        report.status = InstanceStatus::Failed;
        report.error = Some(error.to_string());
        self.summary.add_instance(report);

        if error.is_fatal_to_run() {
            Err(error)
        } else {
            Ok(())
        }
    }

    fn emit_schema(&mut self, definition: &StreamDefinition) -> Result<()> {
        if !self.schemas_sent.insert(definition.name.clone()) {
            return Ok(());
        }
        let message = Message::Schema {
            stream: definition.name.clone(),
            schema: json_schema(definition.schema).to_json(),
            key_properties: definition
                .primary_key
                .iter()
                .map(|key| (*key).to_string())
                .collect(),
            bookmark_properties: definition
                .replication
                .replication_key()
                .map(|key| vec![key.to_string()])
                .unwrap_or_default(),
        };
        self.sink.emit(&message)
    }

    async fn emit_state(&mut self) -> Result<()> {
        let value = self.ctx.state.to_value().await?;
        self.sink.emit(&Message::state(value))?;
        self.sink.flush()?;
        self.ctx.state.flush().await
    }

    fn log_summary(&self) {
        for (stream, totals) in self.summary.by_stream() {
            if totals.failed > 0 {
                warn!(
                    stream = %stream,
                    completed = totals.completed,
                    failed = totals.failed,
                    records = totals.records,
                    dropped = totals.dropped,
                    "Stream finished with failures"
                );
            } else {
                info!(
                    stream = %stream,
                    instances = totals.completed,
                    records = totals.records,
                    dropped = totals.dropped,
                    "Stream complete"
                );
            }
        }
        if !self.summary.skipped.is_empty() {
            info!(streams = ?self.summary.skipped, "Skipped streams");
        }
        info!(
            records = self.summary.total_records(),
            duration_ms = self.summary.duration.as_millis() as u64,
            "Sync finished"
        );
    }
}

impl<S: MessageSink> std::fmt::Debug for CatalogRunner<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogRunner")
            .field("active", &self.active)
            .field("selection", &self.selection)
            .finish_non_exhaustive()
    }
}
