#![allow(dead_code)]

use nodeflow::graph::{Edge, Graph, Node, RawGraph};

/// Builder for graphs to simplify test setup.
///
/// Edge ids are generated as `"{source}->{target}"`.
#[derive(Debug, Default, Clone)]
pub struct GraphBuilder {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node labelled with its own id and no prompt.
    pub fn node(mut self, id: &str) -> Self {
        self.nodes.push(Node::new(id, id.to_uppercase()));
        self
    }

    pub fn nodes(self, ids: &[&str]) -> Self {
        ids.iter().fold(self, |builder, id| builder.node(id))
    }

    pub fn node_with_prompt(mut self, id: &str, prompt: &str) -> Self {
        self.nodes
            .push(Node::new(id, id.to_uppercase()).with_prompt(prompt));
        self
    }

    pub fn edge(mut self, source: &str, target: &str) -> Self {
        self.edges
            .push(Edge::new(format!("{source}->{target}"), source, target));
        self
    }

    /// Add `ids` as nodes linked in sequence.
    pub fn chain(self, ids: &[&str]) -> Self {
        let builder = self.nodes(ids);
        ids.windows(2)
            .fold(builder, |builder, pair| builder.edge(pair[0], pair[1]))
    }

    /// `a -> {b, c} -> d`
    pub fn diamond() -> Self {
        Self::new()
            .nodes(&["a", "b", "c", "d"])
            .edge("a", "b")
            .edge("a", "c")
            .edge("b", "d")
            .edge("c", "d")
    }

    pub fn raw(self) -> RawGraph {
        RawGraph::new(self.nodes, self.edges)
    }

    pub fn build(self) -> Graph {
        Graph::try_from(self.raw()).expect("Failed to build valid graph from builder")
    }
}
