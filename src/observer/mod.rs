// src/observer/mod.rs

//! Status observation for a single run.
//!
//! - [`backoff`] computes the growing poll interval.
//! - [`poller`] runs the polling loop and reports each fetched record.

pub mod backoff;
pub mod poller;

pub use backoff::Backoff;
pub use poller::{ObserverEvent, ObserverHandle, PollingOptions, RunSource, StatusObserver};
