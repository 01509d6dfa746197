// src/exec/backend.rs

//! Pluggable node executor abstraction.
//!
//! The scheduler talks to a `NodeExecutor` instead of doing work itself.
//! This makes it easy to swap in a scripted executor in tests while keeping
//! the default simulated executor in [`super::simulated`].

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use crate::graph::Node;
use crate::types::NodeId;

/// Result text of every direct parent, keyed by parent id.
pub type ParentResults = HashMap<NodeId, String>;

/// Outcome of executing one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeOutcome {
    /// Work finished; carries the result text handed to children.
    Success(String),
    /// Work failed; carries the error message recorded on the node.
    Failed(String),
}

impl NodeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, NodeOutcome::Success(_))
    }
}

/// Trait abstracting how a single node's work is performed.
///
/// Implementations may take arbitrary wall-clock time and may fail; failure
/// is reported as [`NodeOutcome::Failed`], not as a panic or error. The
/// scheduler invokes an executor at most once per node per run, and only
/// after every parent has succeeded.
pub trait NodeExecutor: Send + Sync {
    fn execute_node<'a>(
        &'a self,
        node: &'a Node,
        parent_results: &'a ParentResults,
    ) -> Pin<Box<dyn Future<Output = NodeOutcome> + Send + 'a>>;
}
