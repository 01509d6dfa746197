// src/engine/scheduler.rs

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::engine::walk::RunWalk;
use crate::exec::NodeExecutor;
use crate::graph::Graph;
use crate::run::{Run, RunStatus, RunUpdate};
use crate::store::RunStore;
use crate::types::RunId;

/// Dependency scheduler.
///
/// Owns nothing but its collaborators: the [`NodeExecutor`] that performs
/// each node's work and the [`RunStore`] every state transition is written
/// to. Each call to [`Scheduler::execute`] starts an independent run.
#[derive(Clone)]
pub struct Scheduler {
    executor: Arc<dyn NodeExecutor>,
    store: Arc<dyn RunStore>,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler").finish_non_exhaustive()
    }
}

impl Scheduler {
    pub fn new(executor: Arc<dyn NodeExecutor>, store: Arc<dyn RunStore>) -> Self {
        Self { executor, store }
    }

    pub fn store(&self) -> &Arc<dyn RunStore> {
        &self.store
    }

    /// Start executing `graph` and return immediately.
    ///
    /// The run is created in the store (`Running`, every node `Pending`)
    /// before this returns. Execution proceeds on a spawned task; node and
    /// run failures are recorded in the store only and never surface here.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn execute(&self, graph: Graph) -> RunHandle {
        let run_id = new_run_id();
        let snapshot = self.store.create_run(&run_id, &graph);

        info!(
            run_id = %run_id,
            nodes = graph.len(),
            edges = graph.edges().len(),
            "run submitted"
        );

        let walk = Arc::new(RunWalk::new(
            run_id.clone(),
            Arc::new(graph),
            Arc::clone(&self.executor),
            Arc::clone(&self.store),
        ));
        let task = tokio::spawn(supervise(walk, Arc::clone(&self.store), run_id));

        RunHandle { snapshot, task }
    }
}

/// Drive a walk to completion and record the run-level outcome.
///
/// The walk runs on its own task so that a panic inside it (for example in a
/// node executor) is caught here and recorded as a failed run.
async fn supervise(walk: Arc<RunWalk>, store: Arc<dyn RunStore>, run_id: RunId) {
    let update = match tokio::spawn(walk.drive()).await {
        Ok(summary) if summary.is_complete() => {
            info!(
                run_id = %run_id,
                succeeded = summary.succeeded,
                failed = summary.failed,
                "all nodes settled; run completed"
            );
            RunUpdate::completed(Utc::now())
        }
        Ok(summary) => {
            warn!(
                run_id = %run_id,
                settled = summary.settled,
                total = summary.total,
                "run walk finished with unsettled nodes"
            );
            RunUpdate::failed(
                format!(
                    "Not all nodes were executed ({} of {} settled)",
                    summary.settled, summary.total
                ),
                Utc::now(),
            )
        }
        Err(err) => {
            error!(run_id = %run_id, error = %err, "run walk aborted");
            RunUpdate::failed(format!("Run walk aborted: {err}"), Utc::now())
        }
    };

    if store.update_run(&run_id, update).is_none() {
        debug!(run_id = %run_id, "run removed from store before it settled");
    }
}

fn new_run_id() -> RunId {
    format!("run-{}", Uuid::new_v4())
}

/// Handle returned by [`Scheduler::execute`].
///
/// Carries the run id and the initial snapshot. Dropping the handle does not
/// stop the run; [`RunHandle::wait`] lets in-process callers await
/// settlement, after which the terminal state is read from the store.
#[derive(Debug)]
pub struct RunHandle {
    snapshot: Run,
    task: JoinHandle<()>,
}

impl RunHandle {
    pub fn run_id(&self) -> &str {
        &self.snapshot.run_id
    }

    /// Status at submission time (always `Running`).
    pub fn status(&self) -> RunStatus {
        self.snapshot.status
    }

    /// The run record as created at submission.
    pub fn snapshot(&self) -> &Run {
        &self.snapshot
    }

    pub fn into_snapshot(self) -> Run {
        self.snapshot
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait until the run's terminal status has been written to the store.
    pub async fn wait(self) {
        if let Err(err) = self.task.await {
            warn!(run_id = %self.snapshot.run_id, error = %err, "run supervisor task failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::exec::SimulatedExecutor;
    use crate::graph::{Edge, Node};
    use crate::run::NodeStatus;
    use crate::store::InMemoryRunStore;

    #[tokio::test]
    async fn unreachable_nodes_fail_the_run() {
        // b and c only reach each other, so no root leads to them.
        let graph = Graph::new_unchecked(
            vec![Node::new("a", "A"), Node::new("b", "B"), Node::new("c", "C")],
            vec![Edge::new("e1", "b", "c"), Edge::new("e2", "c", "b")],
        );
        let store = Arc::new(InMemoryRunStore::new());
        let executor = SimulatedExecutor::new(Duration::ZERO, Duration::ZERO, 0.0);
        let scheduler = Scheduler::new(Arc::new(executor), store.clone());

        let handle = scheduler.execute(graph);
        let run_id = handle.run_id().to_string();
        tokio::time::timeout(Duration::from_secs(5), handle.wait())
            .await
            .unwrap();

        let run = store.get_run(&run_id).unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(
            run.error.as_deref(),
            Some("Not all nodes were executed (1 of 3 settled)")
        );
        assert_eq!(run.node_state("a").unwrap().status, NodeStatus::Success);
        assert_eq!(run.node_state("b").unwrap().status, NodeStatus::Pending);
    }
}
