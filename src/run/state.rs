// src/run/state.rs

//! Per-run execution record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::exec::NodeOutcome;
use crate::graph::{Edge, Graph, Node};
use crate::types::RunId;

/// Status of one node within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    /// Waiting on parents (or not reached yet).
    Pending,
    /// The node executor has been invoked and has not returned.
    Running,
    Success,
    /// The executor reported failure, or a parent failed.
    Failed,
}

impl NodeStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, NodeStatus::Success | NodeStatus::Failed)
    }
}

/// Overall status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    /// Every node reached a terminal status (successful or not).
    Completed,
    /// The run could not settle every node, or the walk itself aborted.
    Failed,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

/// Mutable state of one node in one run.
///
/// Invariants maintained by the scheduler:
/// - `Pending` iff both timestamps are `None`
/// - terminal iff `end_time` is set
/// - `result` only on `Success`, `error` only on `Failed`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunNodeState {
    pub status: NodeStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub result: Option<String>,
    pub error: Option<String>,
}

impl Default for RunNodeState {
    fn default() -> Self {
        Self {
            status: NodeStatus::Pending,
            start_time: None,
            end_time: None,
            result: None,
            error: None,
        }
    }
}

/// A graph node together with its state in a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunNode {
    #[serde(flatten)]
    pub node: Node,
    #[serde(flatten)]
    pub state: RunNodeState,
}

impl RunNode {
    pub fn id(&self) -> &str {
        &self.node.id
    }
}

/// One execution instance of a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub run_id: RunId,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: RunStatus,
    /// Run-level error, distinct from any node's error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub nodes: Vec<RunNode>,
    pub edges: Vec<Edge>,
}

impl Run {
    /// A fresh run: `Running`, with every node `Pending`.
    pub fn new(run_id: impl Into<RunId>, graph: &Graph, now: DateTime<Utc>) -> Self {
        Self {
            run_id: run_id.into(),
            start_time: now,
            end_time: None,
            status: RunStatus::Running,
            error: None,
            nodes: graph
                .nodes()
                .iter()
                .map(|node| RunNode {
                    node: node.clone(),
                    state: RunNodeState::default(),
                })
                .collect(),
            edges: graph.edges().to_vec(),
        }
    }

    pub fn node(&self, id: &str) -> Option<&RunNode> {
        self.nodes.iter().find(|n| n.node.id == id)
    }

    pub fn node_state(&self, id: &str) -> Option<&RunNodeState> {
        self.node(id).map(|n| &n.state)
    }

    pub fn all_nodes_terminal(&self) -> bool {
        self.nodes.iter().all(|n| n.state.status.is_terminal())
    }

    pub fn count_nodes(&self, status: NodeStatus) -> usize {
        self.nodes.iter().filter(|n| n.state.status == status).count()
    }

    /// Merge `update` into the state of `node_id`.
    ///
    /// Returns `false` if the run has no such node.
    pub fn apply_node_update(&mut self, node_id: &str, update: NodeStateUpdate) -> bool {
        match self.nodes.iter_mut().find(|n| n.node.id == node_id) {
            Some(node) => {
                update.apply(&mut node.state);
                true
            }
            None => false,
        }
    }

    /// Merge `update` into the run-level fields.
    pub fn apply_update(&mut self, update: RunUpdate) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(end_time) = update.end_time {
            self.end_time = Some(end_time);
        }
        if let Some(error) = update.error {
            self.error = Some(error);
        }
    }
}

/// Partial node state; `Some` fields overwrite, `None` fields are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeStateUpdate {
    pub status: Option<NodeStatus>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub result: Option<String>,
    pub error: Option<String>,
}

impl NodeStateUpdate {
    pub fn running(now: DateTime<Utc>) -> Self {
        Self {
            status: Some(NodeStatus::Running),
            start_time: Some(now),
            ..Self::default()
        }
    }

    pub fn succeeded(result: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            status: Some(NodeStatus::Success),
            end_time: Some(now),
            result: Some(result.into()),
            ..Self::default()
        }
    }

    pub fn failed(error: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            status: Some(NodeStatus::Failed),
            end_time: Some(now),
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn from_outcome(outcome: &NodeOutcome, now: DateTime<Utc>) -> Self {
        match outcome {
            NodeOutcome::Success(result) => Self::succeeded(result.clone(), now),
            NodeOutcome::Failed(error) => Self::failed(error.clone(), now),
        }
    }

    pub fn apply(self, state: &mut RunNodeState) {
        if let Some(status) = self.status {
            state.status = status;
        }
        if let Some(start_time) = self.start_time {
            state.start_time = Some(start_time);
        }
        if let Some(end_time) = self.end_time {
            state.end_time = Some(end_time);
        }
        if let Some(result) = self.result {
            state.result = Some(result);
        }
        if let Some(error) = self.error {
            state.error = Some(error);
        }
    }
}

/// Partial run-level state; `Some` fields overwrite, `None` fields are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunUpdate {
    pub status: Option<RunStatus>,
    pub end_time: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl RunUpdate {
    pub fn completed(now: DateTime<Utc>) -> Self {
        Self {
            status: Some(RunStatus::Completed),
            end_time: Some(now),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            status: Some(RunStatus::Failed),
            end_time: Some(now),
            error: Some(error.into()),
        }
    }
}
