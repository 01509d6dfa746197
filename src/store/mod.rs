// src/store/mod.rs

//! Run storage.
//!
//! The scheduler writes run state through the [`RunStore`] trait and status
//! queries read through it. How runs are kept (memory, database, file) is up
//! to the implementation; [`InMemoryRunStore`] is the reference one.
//!
//! - [`memory`] holds the in-memory store with per-run locking.
//! - [`sweep`] provides a periodic retention task that hosts may spawn.

pub mod memory;
pub mod sweep;

use std::time::Duration;

use crate::graph::Graph;
use crate::run::{NodeStateUpdate, Run, RunUpdate};

pub use memory::InMemoryRunStore;
pub use sweep::spawn_retention_sweep;

/// Keyed storage of [`Run`] records.
///
/// Updates against a run that does not exist (never created, deleted, or
/// evicted) are no-ops that return `None`; they are never errors. Concurrent
/// updates to different nodes of the same run must not lose each other's
/// writes.
pub trait RunStore: Send + Sync {
    /// Create (or replace) a run for `graph`, every node `Pending`.
    fn create_run(&self, run_id: &str, graph: &Graph) -> Run;

    /// Snapshot of the run, if present.
    fn get_run(&self, run_id: &str) -> Option<Run>;

    /// Merge `update` into one node's state; returns the updated snapshot.
    fn update_node(&self, run_id: &str, node_id: &str, update: NodeStateUpdate) -> Option<Run>;

    /// Merge `update` into the run-level fields; returns the updated snapshot.
    fn update_run(&self, run_id: &str, update: RunUpdate) -> Option<Run>;

    /// Remove a run. Returns whether it existed.
    fn delete_run(&self, run_id: &str) -> bool;

    /// Remove runs whose `start_time` is older than `max_age`; returns how
    /// many were removed.
    fn cleanup(&self, max_age: Duration) -> usize;
}
