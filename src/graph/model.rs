// src/graph/model.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::graph::validate::RawGraph;
use crate::types::NodeId;

/// A single unit of work in a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(default)]
    pub data: NodeData,
}

/// User-facing payload of a node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeData {
    #[serde(default)]
    pub label: String,

    /// Prompt template; `{{nodeId}}` placeholders are replaced with that
    /// parent's result text at execution time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: NodeData {
                label: label.into(),
                prompt: None,
            },
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.data.prompt = Some(prompt.into());
        self
    }

    /// The prompt, treating an empty template the same as no template.
    pub fn prompt(&self) -> Option<&str> {
        self.data.prompt.as_deref().filter(|p| !p.is_empty())
    }
}

/// Directed dependency: `target` runs only after `source` has settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: NodeId,
    pub target: NodeId,
}

impl Edge {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Per-node adjacency, in edge-list order.
#[derive(Debug, Clone, Default)]
struct Adjacency {
    /// Position of the node in `Graph::nodes`.
    position: usize,
    /// Direct dependencies: sources of edges targeting this node.
    parents: Vec<NodeId>,
    /// Direct dependents: targets of edges leaving this node.
    children: Vec<NodeId>,
}

/// Validated, immutable graph of nodes and edges.
///
/// The only way to obtain a `Graph` is through validation
/// (`Graph::try_from(RawGraph)` or deserialization), so every edge endpoint
/// is a known node and the graph is acyclic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawGraph")]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    #[serde(skip)]
    adjacency: HashMap<NodeId, Adjacency>,
}

impl Graph {
    /// Build adjacency for already-validated nodes and edges.
    pub(crate) fn new_unchecked(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        let mut adjacency: HashMap<NodeId, Adjacency> = nodes
            .iter()
            .enumerate()
            .map(|(position, node)| {
                (
                    node.id.clone(),
                    Adjacency {
                        position,
                        ..Adjacency::default()
                    },
                )
            })
            .collect();

        for edge in &edges {
            if let Some(target) = adjacency.get_mut(&edge.target) {
                target.parents.push(edge.source.clone());
            }
            if let Some(source) = adjacency.get_mut(&edge.source) {
                source.children.push(edge.target.clone());
            }
        }

        Self {
            nodes,
            edges,
            adjacency,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.adjacency
            .get(id)
            .and_then(|adj| self.nodes.get(adj.position))
    }

    /// Ids of the direct parents of `id` (empty for unknown ids).
    pub fn parent_ids(&self, id: &str) -> &[NodeId] {
        self.adjacency
            .get(id)
            .map(|adj| adj.parents.as_slice())
            .unwrap_or(&[])
    }

    /// Ids of the direct children of `id` (empty for unknown ids).
    pub fn child_ids(&self, id: &str) -> &[NodeId] {
        self.adjacency
            .get(id)
            .map(|adj| adj.children.as_slice())
            .unwrap_or(&[])
    }

    /// Nodes with an edge whose target is `id`, in edge-list order.
    pub fn parents_of(&self, id: &str) -> Vec<&Node> {
        self.parent_ids(id)
            .iter()
            .filter_map(|parent| self.node(parent))
            .collect()
    }

    /// Nodes with an edge whose source is `id`, in edge-list order.
    pub fn children_of(&self, id: &str) -> Vec<&Node> {
        self.child_ids(id)
            .iter()
            .filter_map(|child| self.node(child))
            .collect()
    }

    /// Nodes that are no edge's target, in node order.
    pub fn root_nodes(&self) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|node| self.parent_ids(&node.id).is_empty())
            .collect()
    }
}
