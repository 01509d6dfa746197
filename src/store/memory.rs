// src/store/memory.rs

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::graph::Graph;
use crate::run::{NodeStateUpdate, Run, RunUpdate};
use crate::store::RunStore;
use crate::types::RunId;

/// In-memory run store.
///
/// The outer map is behind a `RwLock` that is only held to look up, insert or
/// remove a run. Each run sits behind its own `Mutex`, so read-merge-write
/// updates are serialized per run while different runs proceed in parallel.
#[derive(Debug, Default)]
pub struct InMemoryRunStore {
    runs: RwLock<HashMap<RunId, Arc<Mutex<Run>>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl InMemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of runs currently stored.
    pub fn len(&self) -> usize {
        self.runs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry(&self, run_id: &str) -> Option<Arc<Mutex<Run>>> {
        self.runs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(run_id)
            .cloned()
    }
}

impl RunStore for InMemoryRunStore {
    fn create_run(&self, run_id: &str, graph: &Graph) -> Run {
        let run = Run::new(run_id, graph, Utc::now());
        let previous = self
            .runs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(run_id.to_string(), Arc::new(Mutex::new(run.clone())));

        if previous.is_some() {
            warn!(run_id, "replacing existing run with the same id");
        }
        debug!(run_id, nodes = run.nodes.len(), "run created");
        run
    }

    fn get_run(&self, run_id: &str) -> Option<Run> {
        let entry = self.entry(run_id)?;
        let run = lock(&entry).clone();
        Some(run)
    }

    fn update_node(&self, run_id: &str, node_id: &str, update: NodeStateUpdate) -> Option<Run> {
        let Some(entry) = self.entry(run_id) else {
            debug!(run_id, node = node_id, "node update for absent run; ignoring");
            return None;
        };

        let mut run = lock(&entry);
        if !run.apply_node_update(node_id, update) {
            warn!(run_id, node = node_id, "node update for unknown node; ignoring");
        }
        Some(run.clone())
    }

    fn update_run(&self, run_id: &str, update: RunUpdate) -> Option<Run> {
        let Some(entry) = self.entry(run_id) else {
            debug!(run_id, "run update for absent run; ignoring");
            return None;
        };

        let mut run = lock(&entry);
        run.apply_update(update);
        Some(run.clone())
    }

    fn delete_run(&self, run_id: &str) -> bool {
        let removed = self
            .runs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(run_id)
            .is_some();
        debug!(run_id, removed, "delete run");
        removed
    }

    fn cleanup(&self, max_age: Duration) -> usize {
        // An age reaching past the representable range keeps every run.
        let Some(cutoff) = chrono::Duration::from_std(max_age)
            .ok()
            .and_then(|age| Utc::now().checked_sub_signed(age))
        else {
            return 0;
        };

        let mut runs = self.runs.write().unwrap_or_else(PoisonError::into_inner);
        let before = runs.len();
        runs.retain(|_, run| lock(run.as_ref()).start_time >= cutoff);
        let removed = before - runs.len();

        if removed > 0 {
            info!(removed, remaining = runs.len(), "evicted expired runs");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, Node, RawGraph};
    use crate::run::{NodeStatus, RunStatus};

    fn graph() -> Graph {
        Graph::try_from(RawGraph::new(
            vec![Node::new("a", "A"), Node::new("b", "B")],
            vec![Edge::new("e1", "a", "b")],
        ))
        .unwrap()
    }

    #[test]
    fn create_then_get_returns_equal_snapshots() {
        let store = InMemoryRunStore::new();
        let created = store.create_run("run-1", &graph());

        let first = store.get_run("run-1").unwrap();
        let second = store.get_run("run-1").unwrap();
        assert_eq!(first, created);
        assert_eq!(first, second);
    }

    #[test]
    fn updates_to_absent_runs_are_no_ops() {
        let store = InMemoryRunStore::new();
        assert!(store
            .update_node("nope", "a", NodeStateUpdate::running(Utc::now()))
            .is_none());
        assert!(store.update_run("nope", RunUpdate::completed(Utc::now())).is_none());
        assert!(store.get_run("nope").is_none());
    }

    #[test]
    fn delete_is_idempotent() {
        let store = InMemoryRunStore::new();
        store.create_run("run-1", &graph());
        assert!(store.delete_run("run-1"));
        assert!(!store.delete_run("run-1"));
        assert!(store.is_empty());
    }

    #[test]
    fn run_update_merges_into_run_fields() {
        let store = InMemoryRunStore::new();
        store.create_run("run-1", &graph());
        store.update_node("run-1", "a", NodeStateUpdate::succeeded("ok", Utc::now()));

        let run = store
            .update_run("run-1", RunUpdate::failed("boom", Utc::now()))
            .unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.error.as_deref(), Some("boom"));
        assert!(run.end_time.is_some());
        assert_eq!(run.node_state("a").unwrap().status, NodeStatus::Success);
    }

    #[test]
    fn concurrent_updates_to_different_nodes_are_all_kept() {
        let ids: Vec<String> = (0..32).map(|i| format!("n{i}")).collect();
        let graph = Graph::try_from(RawGraph::new(
            ids.iter().map(|id| Node::new(id.as_str(), id.as_str())).collect(),
            vec![],
        ))
        .unwrap();

        let store = Arc::new(InMemoryRunStore::new());
        store.create_run("run-1", &graph);

        let handles: Vec<_> = ids
            .iter()
            .cloned()
            .map(|id| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store.update_node("run-1", &id, NodeStateUpdate::running(Utc::now()));
                    store.update_node("run-1", &id, NodeStateUpdate::succeeded(id.clone(), Utc::now()));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let run = store.get_run("run-1").unwrap();
        assert_eq!(run.count_nodes(NodeStatus::Success), ids.len());
    }

    #[test]
    fn cleanup_evicts_only_old_runs() {
        let store = InMemoryRunStore::new();
        store.create_run("old", &graph());
        std::thread::sleep(Duration::from_millis(20));

        assert_eq!(store.cleanup(Duration::from_secs(3600)), 0);
        assert_eq!(store.cleanup(Duration::from_millis(10)), 1);
        assert!(store.get_run("old").is_none());
    }

    #[test]
    fn cleanup_with_out_of_range_age_keeps_everything() {
        let store = InMemoryRunStore::new();
        store.create_run("kept", &graph());

        assert_eq!(store.cleanup(Duration::from_secs(10_000_000_000_000)), 0);
        assert_eq!(store.cleanup(Duration::MAX), 0);
        assert!(store.get_run("kept").is_some());
    }
}
