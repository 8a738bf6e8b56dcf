use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub mod collapse;
pub mod color;
pub mod display;
pub mod error;
pub mod geometry;
pub mod relation;

pub use collapse::CollapseData;
pub use color::Color;
pub use display::{
    ArrowHead, DisplayPropertyRepository, EdgeDisplayProperty, InMemoryDisplayRepository,
    LineStyle, NodeDisplayProperty, ShapeKind,
};
pub use error::CoreError;
pub use geometry::{Rect, Translater, Vec2};
pub use relation::{EdgeMatcher, MatchDirection, Relation, RelationId, RelationRegistry};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct NodeId(pub i64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub i64);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Node {
    pub id: NodeId,
    /// Free-form element kind, e.g. "type", "method", "file".
    #[serde(default)]
    pub kind: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub relation: RelationId,
}

/// The dependency graph handed to the view. The view never mutates it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    #[serde(skip)]
    index: HashMap<NodeId, usize>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        let mut graph = Self {
            nodes,
            edges,
            index: HashMap::new(),
        };
        graph.reindex();
        graph
    }

    /// Rebuild the id lookup. Needed after deserialization.
    pub fn reindex(&mut self) {
        self.index = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id, i))
            .collect();
    }

    pub fn add_node(&mut self, node: Node) {
        if self.index.contains_key(&node.id) {
            return;
        }
        self.index.insert(node.id, self.nodes.len());
        self.nodes.push(node);
    }

    pub fn add_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.index.get(&id).map(|&i| &self.nodes[i])
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn edge_endpoints(&self, id: EdgeId) -> Option<(NodeId, NodeId)> {
        self.edges
            .iter()
            .find(|edge| edge.id == id)
            .map(|edge| (edge.source, edge.target))
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().map(|node| node.id)
    }

    /// Report the first edge whose endpoint is not a node of this graph.
    pub fn validate(&self) -> Result<(), CoreError> {
        for edge in &self.edges {
            for endpoint in [edge.source, edge.target] {
                if !self.contains_node(endpoint) {
                    return Err(CoreError::DanglingEdge {
                        edge: edge.id,
                        node: endpoint,
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: i64, name: &str) -> Node {
        Node {
            id: NodeId(id),
            kind: "type".to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_graph_lookup_and_validation() {
        let mut graph = DependencyGraph::new();
        graph.add_node(node(1, "A"));
        graph.add_node(node(2, "B"));
        graph.add_node(node(2, "B again"));
        graph.add_edge(Edge {
            id: EdgeId(10),
            source: NodeId(1),
            target: NodeId(2),
            relation: RelationId(0),
        });

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.node(NodeId(2)).map(|n| n.name.as_str()), Some("B"));
        assert_eq!(
            graph.edge_endpoints(EdgeId(10)),
            Some((NodeId(1), NodeId(2)))
        );
        assert!(graph.validate().is_ok());

        graph.add_edge(Edge {
            id: EdgeId(11),
            source: NodeId(1),
            target: NodeId(99),
            relation: RelationId(0),
        });
        assert!(matches!(
            graph.validate(),
            Err(CoreError::DanglingEdge {
                edge: EdgeId(11),
                node: NodeId(99)
            })
        ));
    }

    #[test]
    fn test_graph_reindex_after_deserialize() {
        let json = r#"{
            "nodes": [{"id": 1, "name": "A"}, {"id": 2, "kind": "method", "name": "B"}],
            "edges": [{"id": 1, "source": 1, "target": 2, "relation": 0}]
        }"#;
        let mut graph: DependencyGraph = serde_json::from_str(json).unwrap();
        assert!(graph.node(NodeId(1)).is_none());
        graph.reindex();
        assert_eq!(graph.node(NodeId(2)).unwrap().kind, "method");
        assert!(graph.validate().is_ok());
    }
}
