// src/graph/loader.rs

use std::fs;
use std::path::Path;

use crate::errors::Result;
use crate::graph::model::Graph;
use crate::graph::validate::RawGraph;

/// Load a graph file and validate it.
///
/// Files ending in `.toml` are parsed as TOML; everything else is parsed as
/// the `{ "nodes": [...], "edges": [...] }` JSON document the editor posts.
pub fn load_graph(path: impl AsRef<Path>) -> Result<Graph> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    let raw: RawGraph = if is_toml {
        toml::from_str(&contents)?
    } else {
        serde_json::from_str(&contents)?
    };

    Graph::try_from(raw)
}

/// Parse and validate a JSON graph document.
pub fn parse_graph_json(json: &str) -> Result<Graph> {
    let raw: RawGraph = serde_json::from_str(json)?;
    Graph::try_from(raw)
}
