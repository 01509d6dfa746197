use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use nodeflow::exec::{NodeExecutor, NodeOutcome, ParentResults};
use nodeflow::graph::Node;

/// One finished call to [`ScriptedExecutor::execute_node`].
#[derive(Debug, Clone)]
pub struct Invocation {
    pub node: String,
    pub parent_results: ParentResults,
    pub started: Instant,
    pub finished: Instant,
}

/// A fake executor that:
/// - records every invocation with its parent results and timing
/// - succeeds with `"{id} done"` unless told to fail, panic or hang
/// - optionally sleeps per node to shape interleavings.
#[derive(Debug, Clone, Default)]
pub struct ScriptedExecutor {
    failing: HashSet<String>,
    panicking: HashSet<String>,
    hanging: HashSet<String>,
    delays: HashMap<String, Duration>,
    default_delay: Duration,
    started: Arc<Mutex<Vec<String>>>,
    finished: Arc<Mutex<Vec<Invocation>>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(mut self, node: &str) -> Self {
        self.failing.insert(node.to_string());
        self
    }

    pub fn panic_on(mut self, node: &str) -> Self {
        self.panicking.insert(node.to_string());
        self
    }

    /// The node's execution never completes.
    pub fn hang_on(mut self, node: &str) -> Self {
        self.hanging.insert(node.to_string());
        self
    }

    pub fn delay(mut self, node: &str, delay: Duration) -> Self {
        self.delays.insert(node.to_string(), delay);
        self
    }

    pub fn default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    /// Ids of nodes whose execution started, in start order.
    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }

    /// Finished invocations, in finish order.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.finished.lock().unwrap().clone()
    }

    pub fn calls_for(&self, node: &str) -> usize {
        self.started().iter().filter(|id| id.as_str() == node).count()
    }

    pub fn invocation(&self, node: &str) -> Option<Invocation> {
        self.invocations().into_iter().find(|inv| inv.node == node)
    }

    pub fn success_text(node: &str) -> String {
        format!("{node} done")
    }

    pub fn failure_text(node: &str) -> String {
        format!("{node} exploded")
    }
}

impl NodeExecutor for ScriptedExecutor {
    fn execute_node<'a>(
        &'a self,
        node: &'a Node,
        parent_results: &'a ParentResults,
    ) -> Pin<Box<dyn Future<Output = NodeOutcome> + Send + 'a>> {
        Box::pin(async move {
            let id = node.id.clone();
            let started = Instant::now();
            self.started.lock().unwrap().push(id.clone());

            if self.hanging.contains(&id) {
                std::future::pending::<()>().await;
            }

            let delay = self.delays.get(&id).copied().unwrap_or(self.default_delay);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            if self.panicking.contains(&id) {
                panic!("scripted panic in node {id}");
            }

            let outcome = if self.failing.contains(&id) {
                NodeOutcome::Failed(Self::failure_text(&id))
            } else {
                NodeOutcome::Success(Self::success_text(&id))
            };

            self.finished.lock().unwrap().push(Invocation {
                node: id,
                parent_results: parent_results.clone(),
                started,
                finished: Instant::now(),
            });

            outcome
        })
    }
}
