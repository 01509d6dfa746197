// src/engine/mod.rs

//! Workflow execution engine.
//!
//! This module ties together:
//! - the dependency scheduler, which starts runs and records their
//!   run-level outcome ([`scheduler`])
//! - the memoized per-run walk that activates roots, waits on parents,
//!   cascades failures and fans out to children ([`walk`])
//! - the submit / status / delete boundary used by transports
//!   ([`service`])

pub mod scheduler;
pub mod service;
mod walk;

pub use scheduler::{RunHandle, Scheduler};
pub use service::WorkflowService;
