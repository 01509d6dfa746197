// tests/scheduler_properties.rs

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;

use nodeflow::engine::Scheduler;
use nodeflow::run::{NodeStatus, Run, RunStatus};
use nodeflow::store::{InMemoryRunStore, RunStore};
use nodeflow_test_utils::{GraphBuilder, ScriptedExecutor};

#[derive(Debug, Clone)]
struct DagCase {
    /// `parents[i]` only holds indices `< i`, so the graph is acyclic.
    parents: Vec<BTreeSet<usize>>,
    failing: Vec<bool>,
    delays_ms: Vec<u64>,
}

fn name(i: usize) -> String {
    format!("n{i}")
}

fn dag_strategy(max_nodes: usize) -> impl Strategy<Value = DagCase> {
    (1..=max_nodes).prop_flat_map(|n| {
        (
            proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..3), n),
            proptest::collection::vec(proptest::bool::weighted(0.2), n),
            proptest::collection::vec(0..4u64, n),
        )
            .prop_map(|(raw_parents, failing, delays_ms)| {
                let parents = raw_parents
                    .into_iter()
                    .enumerate()
                    .map(|(i, picks)| {
                        if i == 0 {
                            BTreeSet::new()
                        } else {
                            picks.into_iter().map(|p| p % i).collect()
                        }
                    })
                    .collect();
                DagCase {
                    parents,
                    failing,
                    delays_ms,
                }
            })
    })
}

fn execute(case: &DagCase) -> (Run, ScriptedExecutor) {
    let mut builder = GraphBuilder::new();
    let mut exec = ScriptedExecutor::new();
    for i in 0..case.parents.len() {
        builder = builder.node(&name(i));
        exec = exec.delay(&name(i), Duration::from_millis(case.delays_ms[i]));
        if case.failing[i] {
            exec = exec.fail_on(&name(i));
        }
    }
    for (child, parents) in case.parents.iter().enumerate() {
        for parent in parents {
            builder = builder.edge(&name(*parent), &name(child));
        }
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap();

    let run = runtime.block_on(async {
        let store = Arc::new(InMemoryRunStore::new());
        let scheduler = Scheduler::new(Arc::new(exec.clone()), store.clone());
        let handle = scheduler.execute(builder.build());
        let run_id = handle.run_id().to_string();
        tokio::time::timeout(Duration::from_secs(5), handle.wait())
            .await
            .expect("run did not settle");
        store.get_run(&run_id).unwrap()
    });

    (run, exec)
}

/// Expected status per node: a node succeeds only if every parent succeeded
/// and it is not scripted to fail.
fn expected_statuses(case: &DagCase) -> Vec<NodeStatus> {
    let mut expected = Vec::with_capacity(case.parents.len());
    for (i, parents) in case.parents.iter().enumerate() {
        let parents_ok = parents
            .iter()
            .all(|p| expected[*p] == NodeStatus::Success);
        expected.push(if parents_ok && !case.failing[i] {
            NodeStatus::Success
        } else {
            NodeStatus::Failed
        });
    }
    expected
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn every_run_settles_with_memoized_ordered_execution(case in dag_strategy(10)) {
        let (run, exec) = execute(&case);
        let expected = expected_statuses(&case);

        prop_assert_eq!(run.status, RunStatus::Completed);
        prop_assert!(run.all_nodes_terminal());

        let invocations: HashMap<String, _> = exec
            .invocations()
            .into_iter()
            .map(|inv| (inv.node.clone(), inv))
            .collect();

        for (i, parents) in case.parents.iter().enumerate() {
            let id = name(i);
            let state = run.node_state(&id).unwrap();
            prop_assert_eq!(state.status, expected[i], "status of {}", id);

            let parents_ok = parents.iter().all(|p| expected[*p] == NodeStatus::Success);
            if parents_ok {
                prop_assert_eq!(exec.calls_for(&id), 1, "{} should run once", id);
                let inv = &invocations[&id];
                prop_assert_eq!(inv.parent_results.len(), parents.len());
                for p in parents {
                    prop_assert!(invocations[&name(*p)].finished <= inv.started);
                }
            } else {
                prop_assert_eq!(exec.calls_for(&id), 0, "{} must not run", id);
                let error = state.error.as_deref().unwrap();
                prop_assert!(error.starts_with("Parent node "));
            }
        }
    }
}
