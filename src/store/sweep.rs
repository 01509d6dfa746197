// src/store/sweep.rs

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::store::RunStore;

/// Spawn a background task that evicts runs older than `max_age` every
/// `every`.
///
/// The scheduler never starts this itself; the host process decides whether
/// and how often to sweep. Abort the returned handle to stop sweeping.
pub fn spawn_retention_sweep(
    store: Arc<dyn RunStore>,
    every: Duration,
    max_age: Duration,
) -> JoinHandle<()> {
    info!(?every, ?max_age, "starting run retention sweep");

    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let removed = store.cleanup(max_age);
            debug!(removed, "retention sweep tick");
        }
    })
}
