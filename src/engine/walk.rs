// src/engine/walk.rs

//! Memoized dependency walk for a single run.
//!
//! Every node gets exactly one shared outcome future, created the first time
//! any path reaches it. Dependents that reach the same node concurrently all
//! await that one future, so a node's executor runs at most once per run no
//! matter how many paths lead to it (diamonds, fan-in).
//!
//! Activation (`activate`) and resolution (`outcome_of`) are kept apart: a
//! node's outcome settles as soon as its own work is recorded, and only then
//! are its children activated. Children await their parents' outcomes, never
//! the other way round.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use tracing::{debug, info, warn};

use crate::exec::{NodeExecutor, NodeOutcome, ParentResults};
use crate::graph::Graph;
use crate::run::NodeStateUpdate;
use crate::store::RunStore;
use crate::types::{NodeId, RunId};

type SharedOutcome = Shared<BoxFuture<'static, NodeOutcome>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Counts gathered once every reachable branch has settled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct WalkSummary {
    pub total: usize,
    pub settled: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl WalkSummary {
    pub fn is_complete(&self) -> bool {
        self.settled == self.total
    }
}

pub(crate) struct RunWalk {
    run_id: RunId,
    graph: Arc<Graph>,
    executor: Arc<dyn NodeExecutor>,
    store: Arc<dyn RunStore>,
    /// In-flight or settled outcome per activated node.
    outcomes: Mutex<HashMap<NodeId, SharedOutcome>>,
    /// Nodes whose children have been activated.
    fanned_out: Mutex<HashSet<NodeId>>,
}

impl RunWalk {
    pub fn new(
        run_id: RunId,
        graph: Arc<Graph>,
        executor: Arc<dyn NodeExecutor>,
        store: Arc<dyn RunStore>,
    ) -> Self {
        Self {
            run_id,
            graph,
            executor,
            store,
            outcomes: Mutex::new(HashMap::new()),
            fanned_out: Mutex::new(HashSet::new()),
        }
    }

    /// Activate every root concurrently and wait until all reachable
    /// branches have settled.
    pub async fn drive(self: Arc<Self>) -> WalkSummary {
        let roots: Vec<NodeId> = self
            .graph
            .root_nodes()
            .into_iter()
            .map(|node| node.id.clone())
            .collect();

        info!(run_id = %self.run_id, ?roots, "starting run walk from roots");

        join_all(
            roots
                .into_iter()
                .map(|root| Arc::clone(&self).activate(root)),
        )
        .await;

        let summary = self.summary();
        debug!(run_id = %self.run_id, ?summary, "run walk settled");
        summary
    }

    /// Settle `node_id`, then activate its children exactly once.
    ///
    /// Children are activated whatever the outcome: on failure they record a
    /// cascaded failure without running their executor.
    fn activate(self: Arc<Self>, node_id: NodeId) -> BoxFuture<'static, ()> {
        async move {
            let outcome = self.outcome_of(&node_id).await;

            if !lock(&self.fanned_out).insert(node_id.clone()) {
                return;
            }

            let children = self.graph.child_ids(&node_id).to_vec();
            if children.is_empty() {
                return;
            }

            debug!(
                run_id = %self.run_id,
                node = %node_id,
                success = outcome.is_success(),
                ?children,
                "activating children"
            );

            join_all(
                children
                    .into_iter()
                    .map(|child| Arc::clone(&self).activate(child)),
            )
            .await;
        }
        .boxed()
    }

    /// The single shared outcome future for `node_id`, created on first use.
    fn outcome_of(self: &Arc<Self>, node_id: &str) -> SharedOutcome {
        let mut outcomes = lock(&self.outcomes);
        if let Some(existing) = outcomes.get(node_id) {
            return existing.clone();
        }

        let outcome = Arc::clone(self)
            .resolve(node_id.to_string())
            .boxed()
            .shared();
        outcomes.insert(node_id.to_string(), outcome.clone());
        outcome
    }

    /// Wait for every parent, then either cascade a parent failure or run the
    /// node executor, recording each transition in the store.
    async fn resolve(self: Arc<Self>, node_id: NodeId) -> NodeOutcome {
        let Some(node) = self.graph.node(&node_id) else {
            let error = format!("Node {node_id} not found");
            warn!(run_id = %self.run_id, node = %node_id, "node missing from graph");
            self.store.update_node(
                &self.run_id,
                &node_id,
                NodeStateUpdate::failed(error.clone(), Utc::now()),
            );
            return NodeOutcome::Failed(error);
        };

        let parent_ids = self.graph.parent_ids(&node_id);
        let parent_outcomes = join_all(parent_ids.iter().map(|parent| self.outcome_of(parent))).await;

        let mut parent_results = ParentResults::with_capacity(parent_ids.len());
        for (parent_id, outcome) in parent_ids.iter().zip(parent_outcomes) {
            match outcome {
                NodeOutcome::Success(result) => {
                    parent_results.insert(parent_id.clone(), result);
                }
                NodeOutcome::Failed(_) => {
                    let error = format!("Parent node {parent_id} failed");
                    warn!(
                        run_id = %self.run_id,
                        node = %node_id,
                        parent = %parent_id,
                        "parent failed; failing node without executing it"
                    );
                    self.store.update_node(
                        &self.run_id,
                        &node_id,
                        NodeStateUpdate::failed(error.clone(), Utc::now()),
                    );
                    return NodeOutcome::Failed(error);
                }
            }
        }

        info!(run_id = %self.run_id, node = %node_id, "executing node");
        self.store
            .update_node(&self.run_id, &node_id, NodeStateUpdate::running(Utc::now()));

        let outcome = self.executor.execute_node(node, &parent_results).await;

        match &outcome {
            NodeOutcome::Success(_) => {
                info!(run_id = %self.run_id, node = %node_id, "node succeeded");
            }
            NodeOutcome::Failed(error) => {
                warn!(run_id = %self.run_id, node = %node_id, %error, "node failed");
            }
        }

        self.store.update_node(
            &self.run_id,
            &node_id,
            NodeStateUpdate::from_outcome(&outcome, Utc::now()),
        );
        outcome
    }

    fn summary(&self) -> WalkSummary {
        let outcomes = lock(&self.outcomes);
        let mut summary = WalkSummary {
            total: self.graph.len(),
            ..WalkSummary::default()
        };

        for outcome in outcomes.values().filter_map(|shared| shared.peek()) {
            summary.settled += 1;
            if outcome.is_success() {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
        }

        summary
    }
}
