// src/run/mod.rs

//! Run state: the per-execution record the scheduler writes and status
//! queries read.

pub mod state;

pub use state::{NodeStateUpdate, NodeStatus, Run, RunNode, RunNodeState, RunStatus, RunUpdate};
