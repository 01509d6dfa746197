// src/engine/service.rs

//! Submit / query / delete boundary over the scheduler and run store.
//!
//! Transports (HTTP handlers, websocket pushes, CLIs) call into this type;
//! it maps store misses to [`NodeflowError::RunNotFound`] and rejects
//! malformed graphs before any run is created.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::engine::scheduler::{RunHandle, Scheduler};
use crate::errors::{NodeflowError, Result};
use crate::exec::NodeExecutor;
use crate::graph::{Graph, RawGraph, parse_graph_json};
use crate::run::Run;
use crate::store::RunStore;

#[derive(Debug, Clone)]
pub struct WorkflowService {
    scheduler: Scheduler,
}

impl WorkflowService {
    pub fn new(executor: Arc<dyn NodeExecutor>, store: Arc<dyn RunStore>) -> Self {
        Self {
            scheduler: Scheduler::new(executor, store),
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    fn store(&self) -> &Arc<dyn RunStore> {
        self.scheduler.store()
    }

    /// Validate and start a graph, returning the initial run record.
    pub fn submit(&self, raw: RawGraph) -> Result<Run> {
        Ok(self.start(raw)?.into_snapshot())
    }

    /// Like [`submit`](Self::submit) but keeps the handle for in-process
    /// callers that want to await settlement.
    pub fn start(&self, raw: RawGraph) -> Result<RunHandle> {
        let graph = Graph::try_from(raw).inspect_err(log_rejection)?;
        Ok(self.scheduler.execute(graph))
    }

    /// Parse a `{ "nodes": [...], "edges": [...] }` body and submit it.
    pub fn submit_json(&self, body: &str) -> Result<Run> {
        let graph = parse_graph_json(body).inspect_err(log_rejection)?;
        Ok(self.scheduler.execute(graph).into_snapshot())
    }

    /// Current record of a run.
    pub fn status(&self, run_id: &str) -> Result<Run> {
        self.store()
            .get_run(run_id)
            .ok_or_else(|| NodeflowError::RunNotFound(run_id.to_string()))
    }

    /// Remove a run record. In-flight work for the run is not stopped; its
    /// later writes become no-ops.
    pub fn delete(&self, run_id: &str) -> Result<()> {
        if self.store().delete_run(run_id) {
            info!(run_id, "run deleted");
            Ok(())
        } else {
            Err(NodeflowError::RunNotFound(run_id.to_string()))
        }
    }

    /// Evict runs older than `max_age`; returns how many were removed.
    pub fn sweep(&self, max_age: Duration) -> usize {
        self.store().cleanup(max_age)
    }
}

fn log_rejection(err: &NodeflowError) {
    warn!(error = %err, "rejected graph submission");
}
