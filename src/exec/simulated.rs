// src/exec/simulated.rs

//! Default node executor: simulated work with randomized latency and
//! randomized failure.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::config::ExecutorSection;
use crate::exec::template::render_prompt;
use crate::exec::{NodeExecutor, NodeOutcome, ParentResults};
use crate::graph::Node;

/// Simulated executor.
///
/// Each node sleeps for a uniformly random delay in `[min_delay, max_delay]`,
/// then:
/// - without a prompt, succeeds with a fixed message;
/// - otherwise renders the prompt against parent results and fails with
///   probability `failure_rate`, or succeeds with the rendered prompt.
#[derive(Debug)]
pub struct SimulatedExecutor {
    min_delay: Duration,
    max_delay: Duration,
    failure_rate: f64,
    rng: Mutex<StdRng>,
}

/// Result text for nodes that carry no prompt.
pub const NO_PROMPT_RESULT: &str = "Node executed without prompt";

/// Error text for a simulated failure.
pub const RANDOM_FAILURE: &str = "Random execution failure";

impl SimulatedExecutor {
    pub fn new(min_delay: Duration, max_delay: Duration, failure_rate: f64) -> Self {
        Self {
            min_delay: min_delay.min(max_delay),
            max_delay,
            failure_rate: if failure_rate.is_nan() {
                0.0
            } else {
                failure_rate.clamp(0.0, 1.0)
            },
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn from_config(cfg: &ExecutorSection) -> Self {
        Self::new(cfg.min_delay(), cfg.max_delay(), cfg.failure_rate)
    }

    /// Use a fixed seed so delays and failures are reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Draw the delay and the failure decision for one node.
    fn draw(&self) -> (Duration, bool) {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let delay = if self.max_delay > self.min_delay {
            rng.gen_range(self.min_delay..=self.max_delay)
        } else {
            self.min_delay
        };
        let fails = rng.gen_bool(self.failure_rate);
        (delay, fails)
    }
}

impl Default for SimulatedExecutor {
    fn default() -> Self {
        Self::from_config(&ExecutorSection::default())
    }
}

impl NodeExecutor for SimulatedExecutor {
    fn execute_node<'a>(
        &'a self,
        node: &'a Node,
        parent_results: &'a ParentResults,
    ) -> Pin<Box<dyn Future<Output = NodeOutcome> + Send + 'a>> {
        // The RNG guard must not be held across the sleep.
        let (delay, fails) = self.draw();

        Box::pin(async move {
            debug!(node = %node.id, ?delay, "simulating node work");
            tokio::time::sleep(delay).await;

            let Some(template) = node.prompt() else {
                return NodeOutcome::Success(NO_PROMPT_RESULT.to_string());
            };

            let prompt = render_prompt(template, parent_results);

            if fails {
                info!(node = %node.id, "simulated node failure");
                return NodeOutcome::Failed(RANDOM_FAILURE.to_string());
            }

            NodeOutcome::Success(format!("Processed: {prompt}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant(failure_rate: f64) -> SimulatedExecutor {
        SimulatedExecutor::new(Duration::ZERO, Duration::ZERO, failure_rate).with_seed(7)
    }

    #[tokio::test]
    async fn node_without_prompt_always_succeeds() {
        let exec = instant(1.0);
        let node = Node::new("a", "A");
        let outcome = exec.execute_node(&node, &ParentResults::new()).await;
        assert_eq!(outcome, NodeOutcome::Success(NO_PROMPT_RESULT.to_string()));
    }

    #[tokio::test]
    async fn renders_parent_results_into_prompt() {
        let exec = instant(0.0);
        let node = Node::new("b", "B").with_prompt("summarize {{a}}");
        let parents: ParentResults = [("a".to_string(), "the data".to_string())].into();

        let outcome = exec.execute_node(&node, &parents).await;
        assert_eq!(
            outcome,
            NodeOutcome::Success("Processed: summarize the data".to_string())
        );
    }

    #[tokio::test]
    async fn certain_failure_rate_fails_prompted_nodes() {
        let exec = instant(1.0);
        let node = Node::new("a", "A").with_prompt("work");
        let outcome = exec.execute_node(&node, &ParentResults::new()).await;
        assert_eq!(outcome, NodeOutcome::Failed(RANDOM_FAILURE.to_string()));
    }

    #[test]
    fn delay_stays_within_bounds() {
        let exec = SimulatedExecutor::new(
            Duration::from_millis(10),
            Duration::from_millis(20),
            0.5,
        )
        .with_seed(42);
        for _ in 0..100 {
            let (delay, _) = exec.draw();
            assert!(delay >= Duration::from_millis(10) && delay <= Duration::from_millis(20));
        }
    }
}
