// src/observer/poller.rs

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ObserverSection;
use crate::engine::WorkflowService;
use crate::errors::{NodeflowError, Result};
use crate::observer::backoff::Backoff;
use crate::run::{Run, RunStatus};
use crate::store::RunStore;
use crate::types::{RunId, TransportErrorPolicy};

const EVENT_BUFFER: usize = 64;

/// Where the observer fetches run records from.
///
/// A missing run is reported as an error, which the observer treats like any
/// other transport failure.
pub trait RunSource: Send + Sync {
    fn fetch_run<'a>(
        &'a self,
        run_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Run>> + Send + 'a>>;
}

impl RunSource for WorkflowService {
    fn fetch_run<'a>(
        &'a self,
        run_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Run>> + Send + 'a>> {
        Box::pin(async move { self.status(run_id) })
    }
}

impl<S: RunStore> RunSource for S {
    fn fetch_run<'a>(
        &'a self,
        run_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Run>> + Send + 'a>> {
        Box::pin(async move {
            self.get_run(run_id)
                .ok_or_else(|| NodeflowError::RunNotFound(run_id.to_string()))
        })
    }
}

#[derive(Debug, Clone)]
pub struct PollingOptions {
    /// Wait before the first poll of a run.
    pub initial_delay: Duration,
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub backoff_factor: f64,
    pub on_transport_error: TransportErrorPolicy,
}

impl Default for PollingOptions {
    fn default() -> Self {
        Self::from(&ObserverSection::default())
    }
}

impl From<&ObserverSection> for PollingOptions {
    fn from(cfg: &ObserverSection) -> Self {
        Self {
            initial_delay: Duration::from_millis(cfg.initial_delay_ms),
            initial_interval: Duration::from_millis(cfg.initial_interval_ms),
            max_interval: Duration::from_millis(cfg.max_interval_ms),
            backoff_factor: cfg.backoff_factor,
            on_transport_error: cfg.on_transport_error,
        }
    }
}

impl PollingOptions {
    fn backoff(&self) -> Backoff {
        Backoff::new(self.initial_interval, self.backoff_factor, self.max_interval)
    }
}

/// What the observer reports for each poll.
#[derive(Debug, Clone)]
pub enum ObserverEvent {
    /// The run is still `Running`.
    Snapshot(Run),
    /// The run reached `Completed`; polling stops.
    Completed(Run),
    /// The run reached `Failed`; polling stops.
    Failed(Run),
    /// A poll failed before a record was obtained.
    TransportError { run_id: RunId, error: String },
}

/// Spawns polling loops that follow one run at a time.
pub struct StatusObserver;

impl StatusObserver {
    /// Start following `run_id`. Must be called from within a Tokio runtime.
    pub fn spawn(
        source: Arc<dyn RunSource>,
        options: PollingOptions,
        run_id: impl Into<RunId>,
    ) -> ObserverHandle {
        let (control_tx, control_rx) = watch::channel(Some(run_id.into()));
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);

        let task = tokio::spawn(observe_loop(source, options, control_rx, events_tx));

        ObserverHandle {
            events: events_rx,
            control: control_tx,
            task,
        }
    }
}

/// Handle to a running observer.
///
/// Dropping the handle stops the observer.
#[derive(Debug)]
pub struct ObserverHandle {
    events: mpsc::Receiver<ObserverEvent>,
    control: watch::Sender<Option<RunId>>,
    task: JoinHandle<()>,
}

impl ObserverHandle {
    /// Next event, or `None` once the observer has stopped and every
    /// buffered event has been read.
    pub async fn recv(&mut self) -> Option<ObserverEvent> {
        self.events.recv().await
    }

    /// Switch to a different run (or restart the same one). Pending waits
    /// are abandoned and the interval is reset.
    pub fn observe(&self, run_id: impl Into<RunId>) {
        self.control.send_replace(Some(run_id.into()));
    }

    pub fn cancel(&self) {
        self.control.send_replace(None);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

enum Follow {
    /// A terminal status was seen, or polling stopped on a transport error.
    Settled,
    /// The observed run id changed or observation was cancelled.
    Redirected,
    /// The handle or the event receiver went away.
    Closed,
}

async fn observe_loop(
    source: Arc<dyn RunSource>,
    options: PollingOptions,
    mut control: watch::Receiver<Option<RunId>>,
    events: mpsc::Sender<ObserverEvent>,
) {
    loop {
        let Some(run_id) = control.borrow_and_update().clone() else {
            debug!("observer cancelled");
            return;
        };

        match follow(source.as_ref(), &options, &run_id, &mut control, &events).await {
            Follow::Redirected => continue,
            Follow::Closed => return,
            Follow::Settled => {
                // Idle until asked to observe another run.
                if control.changed().await.is_err() {
                    return;
                }
            }
        }
    }
}

async fn follow(
    source: &dyn RunSource,
    options: &PollingOptions,
    run_id: &str,
    control: &mut watch::Receiver<Option<RunId>>,
    events: &mpsc::Sender<ObserverEvent>,
) -> Follow {
    let mut backoff = options.backoff();
    let mut wait = options.initial_delay;

    debug!(run_id, ?wait, "observing run");

    loop {
        tokio::select! {
            changed = control.changed() => {
                return if changed.is_ok() { Follow::Redirected } else { Follow::Closed };
            }
            _ = tokio::time::sleep(wait) => {}
        }

        let (event, settled) = match source.fetch_run(run_id).await {
            Ok(run) => match run.status {
                RunStatus::Running => (ObserverEvent::Snapshot(run), false),
                RunStatus::Completed => {
                    info!(run_id, "observed run completed");
                    (ObserverEvent::Completed(run), true)
                }
                RunStatus::Failed => {
                    info!(run_id, error = ?run.error, "observed run failed");
                    (ObserverEvent::Failed(run), true)
                }
            },
            Err(err) => {
                warn!(run_id, error = %err, "status poll failed");
                let stop = options.on_transport_error == TransportErrorPolicy::Stop;
                let event = ObserverEvent::TransportError {
                    run_id: run_id.to_string(),
                    error: err.to_string(),
                };
                (event, stop)
            }
        };

        if events.send(event).await.is_err() {
            return Follow::Closed;
        }
        if settled {
            return Follow::Settled;
        }

        wait = backoff.next();
        debug!(run_id, ?wait, "next poll scheduled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Graph, Node, RawGraph};
    use crate::run::RunUpdate;
    use crate::store::InMemoryRunStore;
    use chrono::Utc;

    fn fast() -> PollingOptions {
        PollingOptions {
            initial_delay: Duration::from_millis(1),
            initial_interval: Duration::from_millis(2),
            max_interval: Duration::from_millis(5),
            backoff_factor: 2.0,
            on_transport_error: TransportErrorPolicy::Stop,
        }
    }

    fn single_node() -> Graph {
        Graph::try_from(RawGraph::new(vec![Node::new("a", "A")], vec![])).unwrap()
    }

    #[tokio::test]
    async fn reports_completion_of_a_settled_run() {
        let store = Arc::new(InMemoryRunStore::new());
        store.create_run("run-1", &single_node());
        store.update_run("run-1", RunUpdate::completed(Utc::now()));

        let mut handle = StatusObserver::spawn(store, fast(), "run-1");
        match handle.recv().await {
            Some(ObserverEvent::Completed(run)) => assert_eq!(run.run_id, "run-1"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_run_is_a_transport_error() {
        let store = Arc::new(InMemoryRunStore::new());
        let mut handle = StatusObserver::spawn(store, fast(), "run-missing");
        match handle.recv().await {
            Some(ObserverEvent::TransportError { run_id, error }) => {
                assert_eq!(run_id, "run-missing");
                assert!(error.contains("run-missing"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancel_ends_the_event_stream() {
        let store = Arc::new(InMemoryRunStore::new());
        store.create_run("run-1", &single_node());

        let mut handle = StatusObserver::spawn(store, fast(), "run-1");
        assert!(matches!(handle.recv().await, Some(ObserverEvent::Snapshot(_))));
        handle.cancel();

        while let Some(event) = handle.recv().await {
            assert!(matches!(event, ObserverEvent::Snapshot(_)));
        }
    }
}
