// tests/service_boundary.rs

use std::sync::Arc;
use std::time::Duration;

use nodeflow::engine::WorkflowService;
use nodeflow::errors::NodeflowError;
use nodeflow::graph::{Edge, Node, RawGraph};
use nodeflow::run::{NodeStatus, RunStatus};
use nodeflow::store::InMemoryRunStore;
use nodeflow_test_utils::{GraphBuilder, ScriptedExecutor, init_tracing, with_timeout};

fn service(exec: ScriptedExecutor) -> (WorkflowService, Arc<InMemoryRunStore>) {
    let store = Arc::new(InMemoryRunStore::new());
    (WorkflowService::new(Arc::new(exec), store.clone()), store)
}

#[tokio::test]
async fn submit_returns_initial_record_and_status_tracks_it() {
    init_tracing();
    let (service, _store) = service(ScriptedExecutor::new().default_delay(Duration::from_millis(5)));

    let run = service.submit(GraphBuilder::diamond().raw()).unwrap();
    assert_eq!(run.status, RunStatus::Running);
    assert_eq!(run.nodes.len(), 4);
    assert_eq!(run.edges.len(), 4);

    let settled = with_timeout(async {
        loop {
            let current = service.status(&run.run_id).unwrap();
            if current.status.is_terminal() {
                break current;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;

    assert_eq!(settled.status, RunStatus::Completed);
    assert!(settled.all_nodes_terminal());
    assert_eq!(settled.count_nodes(NodeStatus::Success), 4);
}

#[tokio::test]
async fn edge_to_unknown_node_is_rejected_without_creating_a_run() {
    init_tracing();
    let (service, store) = service(ScriptedExecutor::new());

    let raw = RawGraph::new(
        vec![Node::new("a", "A")],
        vec![Edge::new("e1", "a", "ghost")],
    );
    let err = service.submit(raw).unwrap_err();

    assert!(err.is_validation());
    assert!(matches!(err, NodeflowError::UnknownNode { ref node, .. } if node == "ghost"));
    assert!(store.is_empty());
}

#[tokio::test]
async fn cyclic_graph_is_rejected() {
    init_tracing();
    let (service, store) = service(ScriptedExecutor::new());

    let raw = GraphBuilder::new()
        .chain(&["a", "b", "c"])
        .edge("c", "a")
        .raw();
    let err = service.submit(raw).unwrap_err();

    assert!(matches!(err, NodeflowError::GraphCycle(_)));
    assert!(store.is_empty());
}

#[tokio::test]
async fn json_body_missing_edges_is_rejected() {
    init_tracing();
    let (service, store) = service(ScriptedExecutor::new());

    let err = service
        .submit_json(r#"{ "nodes": [ { "id": "a", "data": { "label": "A" } } ] }"#)
        .unwrap_err();

    assert!(matches!(err, NodeflowError::InvalidGraph(ref m) if m.contains("edges")));
    assert!(store.is_empty());
}

#[tokio::test]
async fn json_body_is_submitted() {
    init_tracing();
    let (service, _store) = service(ScriptedExecutor::new());

    let body = r#"{
        "nodes": [
            { "id": "fetch", "data": { "label": "Fetch", "prompt": "get" } },
            { "id": "sum", "data": { "label": "Sum", "prompt": "sum {{fetch}}" } }
        ],
        "edges": [ { "id": "e1", "source": "fetch", "target": "sum" } ]
    }"#;
    let run = service.submit_json(body).unwrap();

    assert_eq!(run.node("sum").unwrap().node.prompt(), Some("sum {{fetch}}"));
    assert_eq!(run.node_state("fetch").unwrap().status, NodeStatus::Pending);
}

#[tokio::test]
async fn unknown_run_is_not_found() {
    init_tracing();
    let (service, _store) = service(ScriptedExecutor::new());

    assert!(matches!(
        service.status("run-nope"),
        Err(NodeflowError::RunNotFound(ref id)) if id == "run-nope"
    ));
    assert!(matches!(
        service.delete("run-nope"),
        Err(NodeflowError::RunNotFound(_))
    ));
}

#[tokio::test]
async fn delete_removes_the_record() {
    init_tracing();
    let (service, _store) = service(ScriptedExecutor::new());

    let handle = service.start(GraphBuilder::new().chain(&["a", "b"]).raw()).unwrap();
    let run_id = handle.run_id().to_string();
    with_timeout(handle.wait()).await;

    service.delete(&run_id).unwrap();
    assert!(matches!(
        service.status(&run_id),
        Err(NodeflowError::RunNotFound(_))
    ));
    assert!(service.delete(&run_id).is_err());
}

#[tokio::test]
async fn sweep_evicts_only_old_runs() {
    init_tracing();
    let (service, store) = service(ScriptedExecutor::new());

    let handle = service.start(GraphBuilder::new().node("a").raw()).unwrap();
    with_timeout(handle.wait()).await;

    assert_eq!(service.sweep(Duration::from_secs(3600)), 0);
    assert_eq!(store.len(), 1);

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(service.sweep(Duration::from_millis(1)), 1);
    assert!(store.is_empty());
}
