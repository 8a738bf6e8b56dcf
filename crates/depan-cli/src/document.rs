use anyhow::{Context, Result};
use depan_core::{
    DependencyGraph, DisplayPropertyRepository, Edge, InMemoryDisplayRepository, Node,
    NodeDisplayProperty, NodeId, RelationRegistry, Vec2,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// JSON graph document read by the CLI.
///
/// Relation names are listed in id order: the first name is relation 0.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub relations: Vec<String>,
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    /// Stored node positions keyed by node id.
    #[serde(default)]
    pub positions: BTreeMap<i64, [f32; 2]>,
}

impl GraphDocument {
    pub fn parse(json: &str) -> Result<Self> {
        let document: GraphDocument =
            serde_json::from_str(json).context("Graph document is not valid JSON")?;
        if let Err(err) = document.graph().validate() {
            // The view skips such edges; the rest of the document is usable.
            tracing::warn!("Graph document is inconsistent: {err}");
        }
        Ok(document)
    }

    pub fn graph(&self) -> DependencyGraph {
        DependencyGraph::from_parts(self.nodes.clone(), self.edges.clone())
    }

    pub fn relations(&self) -> RelationRegistry {
        RelationRegistry::from_names(self.relations.iter().map(String::as_str))
    }

    pub fn repository(&self) -> InMemoryDisplayRepository {
        let mut repository = InMemoryDisplayRepository::new();
        for (id, [x, y]) in &self.positions {
            repository.set_node_property(
                NodeId(*id),
                NodeDisplayProperty {
                    position: Some(Vec2::new(*x, *y)),
                    ..Default::default()
                },
            );
        }
        repository
    }
}

/// Positions as written by `depan layout`.
pub fn positions_json(moves: &[(NodeId, Vec2)]) -> Result<String> {
    let positions: BTreeMap<i64, [f32; 2]> = moves.iter().map(|(id, p)| (id.0, [p.x, p.y])).collect();
    serde_json::to_string_pretty(&positions).context("Failed to encode positions")
}
