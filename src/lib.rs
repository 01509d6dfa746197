// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod graph;
pub mod logging;
pub mod observer;
pub mod run;
pub mod store;
pub mod types;

use std::sync::Arc;

use anyhow::{Result, bail};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::load_or_default;
use crate::engine::WorkflowService;
use crate::exec::SimulatedExecutor;
use crate::graph::{Graph, load_graph};
use crate::observer::{ObserverEvent, PollingOptions, StatusObserver};
use crate::run::{NodeStatus, RunStatus};
use crate::store::{InMemoryRunStore, spawn_retention_sweep};
use crate::types::TransportErrorPolicy;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config and graph loading
/// - in-memory run store with its retention sweep
/// - simulated executor and scheduler
/// - status observer following the submitted run
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_or_default(args.config.as_deref())?;
    let graph = load_graph(&args.graph)?;

    if args.dry_run {
        print_dry_run(&graph);
        return Ok(());
    }

    let store = Arc::new(InMemoryRunStore::new());
    let _sweep = spawn_retention_sweep(
        store.clone(),
        cfg.retention.sweep_interval(),
        cfg.retention.max_age(),
    );

    let mut executor = SimulatedExecutor::from_config(&cfg.executor);
    if let Some(seed) = args.seed {
        executor = executor.with_seed(seed);
    }

    let service = Arc::new(WorkflowService::new(Arc::new(executor), store));
    let handle = service.scheduler().execute(graph);
    let run_id = handle.run_id().to_string();
    info!(run_id = %run_id, "following run");

    let mut observer = StatusObserver::spawn(
        service.clone(),
        PollingOptions::from(&cfg.observer),
        run_id.clone(),
    );

    let final_run = loop {
        match observer.recv().await {
            Some(ObserverEvent::Snapshot(run)) => {
                info!(
                    run_id = %run.run_id,
                    pending = run.count_nodes(NodeStatus::Pending),
                    running = run.count_nodes(NodeStatus::Running),
                    succeeded = run.count_nodes(NodeStatus::Success),
                    failed = run.count_nodes(NodeStatus::Failed),
                    "run in progress"
                );
            }
            Some(ObserverEvent::Completed(run)) | Some(ObserverEvent::Failed(run)) => break run,
            Some(ObserverEvent::TransportError { error, .. }) => {
                if cfg.observer.on_transport_error == TransportErrorPolicy::Stop {
                    bail!("stopped observing run {run_id}: {error}");
                }
                warn!(run_id = %run_id, %error, "status poll failed; retrying");
            }
            None => bail!("observer stopped before run {run_id} settled"),
        }
    };
    observer.cancel();

    println!("{}", serde_json::to_string_pretty(&final_run)?);

    if final_run.status == RunStatus::Failed {
        bail!(
            "run {} failed: {}",
            final_run.run_id,
            final_run.error.as_deref().unwrap_or("unknown error")
        );
    }

    Ok(())
}

/// Simple dry-run output: roots, then each node with its neighbours.
fn print_dry_run(graph: &Graph) {
    println!("nodeflow dry-run");
    let roots: Vec<&str> = graph.root_nodes().iter().map(|n| n.id.as_str()).collect();
    println!("  roots: {roots:?}");
    println!();

    println!("nodes ({}):", graph.len());
    for node in graph.nodes() {
        println!("  - {} ({})", node.id, node.data.label);
        if let Some(prompt) = node.prompt() {
            println!("      prompt: {prompt}");
        }
        let parents = graph.parent_ids(&node.id);
        if !parents.is_empty() {
            println!("      parents: {parents:?}");
        }
        let children = graph.child_ids(&node.id);
        if !children.is_empty() {
            println!("      children: {children:?}");
        }
    }

    debug!("dry-run complete (no execution)");
}
