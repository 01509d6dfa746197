// src/graph/validate.rs

use std::collections::HashSet;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use serde::{Deserialize, Serialize};

use crate::errors::{NodeflowError, Result};
use crate::graph::model::{Edge, Graph, Node};

/// Graph as submitted over the wire, before validation.
///
/// Both fields are optional here so that a missing field can be reported as
/// a validation error instead of a parse error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawGraph {
    #[serde(default)]
    pub nodes: Option<Vec<Node>>,
    #[serde(default)]
    pub edges: Option<Vec<Edge>>,
}

impl RawGraph {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self {
            nodes: Some(nodes),
            edges: Some(edges),
        }
    }
}

impl TryFrom<RawGraph> for Graph {
    type Error = NodeflowError;

    fn try_from(raw: RawGraph) -> std::result::Result<Self, Self::Error> {
        let (nodes, edges) = match (raw.nodes, raw.edges) {
            (Some(nodes), Some(edges)) => (nodes, edges),
            (None, _) => {
                return Err(NodeflowError::InvalidGraph(
                    "Invalid workflow format: missing `nodes`".to_string(),
                ));
            }
            (_, None) => {
                return Err(NodeflowError::InvalidGraph(
                    "Invalid workflow format: missing `edges`".to_string(),
                ));
            }
        };

        validate_graph(&nodes, &edges)?;
        Ok(Graph::new_unchecked(nodes, edges))
    }
}

fn validate_graph(nodes: &[Node], edges: &[Edge]) -> Result<()> {
    let ids = validate_node_ids(nodes)?;
    validate_edge_endpoints(&ids, edges)?;
    validate_acyclic(nodes, edges)?;
    Ok(())
}

fn validate_node_ids(nodes: &[Node]) -> Result<HashSet<&str>> {
    let mut ids = HashSet::with_capacity(nodes.len());
    for node in nodes {
        if node.id.trim().is_empty() {
            return Err(NodeflowError::InvalidGraph(
                "node ids must be non-empty".to_string(),
            ));
        }
        if !ids.insert(node.id.as_str()) {
            return Err(NodeflowError::InvalidGraph(format!(
                "duplicate node id '{}'",
                node.id
            )));
        }
    }
    Ok(ids)
}

fn validate_edge_endpoints(ids: &HashSet<&str>, edges: &[Edge]) -> Result<()> {
    for edge in edges {
        for endpoint in [&edge.source, &edge.target] {
            if !ids.contains(endpoint.as_str()) {
                return Err(NodeflowError::UnknownNode {
                    edge: edge.id.clone(),
                    node: endpoint.clone(),
                });
            }
        }
        if edge.source == edge.target {
            return Err(NodeflowError::GraphCycle(format!(
                "edge '{}' connects node '{}' to itself",
                edge.id, edge.source
            )));
        }
    }
    Ok(())
}

fn validate_acyclic(nodes: &[Node], edges: &[Edge]) -> Result<()> {
    // Edge direction: source -> target (dependency -> dependent).
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for node in nodes {
        graph.add_node(node.id.as_str());
    }
    for edge in edges {
        graph.add_edge(edge.source.as_str(), edge.target.as_str(), ());
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(NodeflowError::GraphCycle(format!(
            "cycle detected in graph involving node '{}'",
            cycle.node_id()
        ))),
    }
}
