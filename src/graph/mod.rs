// src/graph/mod.rs

//! Graph model.
//!
//! - [`model`] holds nodes, edges and the validated, immutable [`Graph`]
//!   with its structural queries (parents, children, roots).
//! - [`validate`] turns a submitted [`RawGraph`] into a [`Graph`], rejecting
//!   missing fields, unknown edge endpoints and cycles.
//! - [`loader`] reads graphs from JSON or TOML files.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_graph, parse_graph_json};
pub use model::{Edge, Graph, Node, NodeData};
pub use validate::RawGraph;
