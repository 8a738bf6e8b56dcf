//! Persisted per-element view preferences.
//!
//! The repository is read when a view opens and written back when the view
//! reports edits. How it is stored is up to the host.

use crate::{Color, EdgeId, NodeId, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShapeKind {
    #[default]
    Circle,
    Square,
    Diamond,
    Triangle,
    Hexagon,
    Star,
    /// Drawn for collapse masters standing in for a group.
    Group,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 7] = [
        ShapeKind::Circle,
        ShapeKind::Square,
        ShapeKind::Diamond,
        ShapeKind::Triangle,
        ShapeKind::Hexagon,
        ShapeKind::Star,
        ShapeKind::Group,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ArrowHead {
    None,
    Open,
    #[default]
    Filled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeDisplayProperty {
    pub color: Option<Color>,
    pub size: Option<f32>,
    pub shape: Option<ShapeKind>,
    pub visible: bool,
    pub position: Option<Vec2>,
}

impl Default for NodeDisplayProperty {
    fn default() -> Self {
        Self {
            color: None,
            size: None,
            shape: None,
            visible: true,
            position: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeDisplayProperty {
    pub color: Option<Color>,
    pub line_style: LineStyle,
    pub arrow_head: ArrowHead,
    pub visible: bool,
}

impl Default for EdgeDisplayProperty {
    fn default() -> Self {
        Self {
            color: None,
            line_style: LineStyle::Solid,
            arrow_head: ArrowHead::Filled,
            visible: true,
        }
    }
}

pub trait DisplayPropertyRepository {
    fn node_property(&self, id: NodeId) -> Option<NodeDisplayProperty>;
    fn edge_property(&self, id: EdgeId) -> Option<EdgeDisplayProperty>;
    fn set_node_property(&mut self, id: NodeId, property: NodeDisplayProperty);
    fn set_edge_property(&mut self, id: EdgeId, property: EdgeDisplayProperty);
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryDisplayRepository {
    nodes: HashMap<NodeId, NodeDisplayProperty>,
    edges: HashMap<EdgeId, EdgeDisplayProperty>,
}

impl InMemoryDisplayRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl DisplayPropertyRepository for InMemoryDisplayRepository {
    fn node_property(&self, id: NodeId) -> Option<NodeDisplayProperty> {
        self.nodes.get(&id).cloned()
    }

    fn edge_property(&self, id: EdgeId) -> Option<EdgeDisplayProperty> {
        self.edges.get(&id).cloned()
    }

    fn set_node_property(&mut self, id: NodeId, property: NodeDisplayProperty) {
        self.nodes.insert(id, property);
    }

    fn set_edge_property(&mut self, id: EdgeId, property: EdgeDisplayProperty) {
        self.edges.insert(id, property);
    }
}
