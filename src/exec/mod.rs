// src/exec/mod.rs

//! Node execution layer.
//!
//! - [`backend`] provides the `NodeExecutor` trait the scheduler drives, plus
//!   the `NodeOutcome` it reports.
//! - [`simulated`] is the default executor: randomized latency and failure
//!   over a templated prompt.
//! - [`template`] substitutes `{{nodeId}}` placeholders with parent results.

pub mod backend;
pub mod simulated;
pub mod template;

pub use backend::{NodeExecutor, NodeOutcome, ParentResults};
pub use simulated::SimulatedExecutor;
pub use template::render_prompt;
