//! Per-element rendering state.
//!
//! One [`NodeRenderingProperty`] per graph node and one
//! [`EdgeRenderingProperty`] per graph edge, stored in arenas and addressed
//! by [`NodeIndex`]/[`EdgeIndex`]. Indices never change while the view is
//! open, which is what makes them usable as pick names.

use crate::config::ViewConfig;
use crate::surface::TextureId;
use depan_core::{
    ArrowHead, Color, DependencyGraph, DisplayPropertyRepository, EdgeId, LineStyle, NodeId,
    Rect, RelationId, ShapeKind, Vec2,
};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeIndex(pub usize);

const TAG_MASK: u32 = 0b11 << 30;
const NODE_TAG: u32 = 0b11 << 30;
const EDGE_TAG: u32 = 0b10 << 30;
const INDEX_MASK: u32 = !TAG_MASK;

/// Largest arena index that fits in a pick name.
pub const MAX_PICK_INDEX: usize = INDEX_MASK as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickKind {
    Node,
    Edge,
    Unused,
}

/// Name pushed to the surface while selecting.
///
/// The two high bits tag the element kind and the low 30 bits carry the
/// arena index, so a hit decodes back to its element without a lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PickId(pub u32);

impl PickId {
    /// Name that decodes to nothing.
    pub const UNUSED: PickId = PickId(0);

    /// Pick name for a node, or [`PickId::UNUSED`] past [`MAX_PICK_INDEX`].
    pub fn node(index: NodeIndex) -> Self {
        Self::try_node(index).unwrap_or(Self::UNUSED)
    }

    /// Pick name for an edge, or [`PickId::UNUSED`] past [`MAX_PICK_INDEX`].
    pub fn edge(index: EdgeIndex) -> Self {
        Self::try_edge(index).unwrap_or(Self::UNUSED)
    }

    pub fn try_node(index: NodeIndex) -> Option<Self> {
        (index.0 <= MAX_PICK_INDEX).then(|| PickId(NODE_TAG | index.0 as u32))
    }

    pub fn try_edge(index: EdgeIndex) -> Option<Self> {
        (index.0 <= MAX_PICK_INDEX).then(|| PickId(EDGE_TAG | index.0 as u32))
    }

    pub fn kind(self) -> PickKind {
        match self.0 & TAG_MASK {
            NODE_TAG => PickKind::Node,
            EDGE_TAG => PickKind::Edge,
            _ => PickKind::Unused,
        }
    }

    pub fn node_index(self) -> Option<NodeIndex> {
        (self.kind() == PickKind::Node).then(|| NodeIndex((self.0 & INDEX_MASK) as usize))
    }

    pub fn edge_index(self) -> Option<EdgeIndex> {
        (self.kind() == PickKind::Edge).then(|| EdgeIndex((self.0 & INDEX_MASK) as usize))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeRenderingProperty {
    pub node: NodeId,
    pub index: NodeIndex,
    pub pick_id: PickId,
    pub kind: String,
    pub name: String,

    position: Vec2,
    target_position: Vec2,
    /// Position after the scale-factor stage; what the draw stage uses.
    pub draw_position: Vec2,

    pub size: f32,
    pub fill_color: Color,
    pub stroke_color: Color,
    pub stroke_width: f32,
    pub shape: ShapeKind,
    overridden_color: Option<Color>,
    overridden_size: Option<f32>,
    overridden_shape: Option<ShapeKind>,

    visible: bool,
    selected: bool,

    /// Master of the collapse group hiding this node.
    pub collapsed_under: Option<NodeIndex>,
    pub is_collapse_master: bool,
    /// Nodes hidden behind this master, nested groups included.
    pub collapsed_count: usize,

    pub label: String,
    pub label_visible: bool,
    pub text_dirty: bool,
    pub label_texture: Option<TextureId>,

    pub degree_ratio: f32,
    pub rank_ratio: f32,
}

impl NodeRenderingProperty {
    pub fn new(node: NodeId, index: NodeIndex, kind: &str, name: &str, config: &ViewConfig) -> Self {
        Self {
            node,
            index,
            pick_id: PickId::node(index),
            kind: kind.to_string(),
            name: name.to_string(),
            position: Vec2::ZERO,
            target_position: Vec2::ZERO,
            draw_position: Vec2::ZERO,
            size: config.node.size,
            fill_color: config.node.color,
            stroke_color: config.node.color.darken(0.3),
            stroke_width: config.node.stroke_width,
            shape: config.node.shape,
            overridden_color: None,
            overridden_size: None,
            overridden_shape: None,
            visible: true,
            selected: false,
            collapsed_under: None,
            is_collapse_master: false,
            collapsed_count: 0,
            label: String::new(),
            label_visible: false,
            text_dirty: true,
            label_texture: None,
            degree_ratio: 0.0,
            rank_ratio: 0.0,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn target_position(&self) -> Vec2 {
        self.target_position
    }

    /// Discrete move: current and target jump together.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.target_position = position;
    }

    /// Animated move: only the target changes.
    pub fn edit_position(&mut self, target: Vec2) {
        self.target_position = target;
    }

    /// Renderer-authored move such as a drag; both jump.
    pub fn update_position(&mut self, position: Vec2) {
        self.set_position(position);
    }

    /// Advance toward the target by `1/speed` of the remaining distance.
    ///
    /// Snaps onto the target once within `epsilon`. Returns true while still
    /// moving.
    pub fn step_toward_target(&mut self, speed: f32, epsilon: f32) -> bool {
        let remaining = self.target_position - self.position;
        if remaining.length() <= epsilon {
            self.position = self.target_position;
            return false;
        }
        self.position += remaining / speed;
        true
    }

    pub fn is_animating(&self, epsilon: f32) -> bool {
        self.position.distance(self.target_position) > epsilon
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Only the selection model should flip this, so flags and set agree.
    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    pub fn overridden_color(&self) -> Option<Color> {
        self.overridden_color
    }

    pub fn set_overridden_color(&mut self, color: Option<Color>) {
        self.overridden_color = color;
    }

    pub fn overridden_size(&self) -> Option<f32> {
        self.overridden_size
    }

    pub fn set_overridden_size(&mut self, size: Option<f32>) {
        self.overridden_size = size.filter(|s| s.is_finite() && *s > 0.0);
    }

    pub fn overridden_shape(&self) -> Option<ShapeKind> {
        self.overridden_shape
    }

    pub fn set_overridden_shape(&mut self, shape: Option<ShapeKind>) {
        self.overridden_shape = shape;
    }

    /// Replace the label, marking the texture stale only when the text changed.
    pub fn set_label(&mut self, text: &str) {
        if self.label != text {
            self.label.clear();
            self.label.push_str(text);
            self.text_dirty = true;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRenderingProperty {
    pub edge: EdgeId,
    pub index: EdgeIndex,
    pub relation: RelationId,
    pub pick_id: PickId,
    pub source: NodeIndex,
    pub target: NodeIndex,
    /// Endpoints after collapse redirection.
    pub render_source: NodeIndex,
    pub render_target: NodeIndex,

    pub stroke_color: Color,
    pub overridden_color: Option<Color>,
    pub width: f32,
    pub dashed: bool,
    pub arrow_head: ArrowHead,
    pub visible: bool,

    pub label: String,
    pub label_visible: bool,
    pub text_dirty: bool,
    pub label_texture: Option<TextureId>,

    /// Perpendicular bend of the edge curve, used to separate parallel edges.
    pub deviation: f32,
    pub target_deviation: f32,
}

impl EdgeRenderingProperty {
    pub fn set_label(&mut self, text: &str) {
        if self.label != text {
            self.label.clear();
            self.label.push_str(text);
            self.text_dirty = true;
        }
    }

    /// Same stepping rule as node positions. Returns true while still moving.
    pub fn step_deviation(&mut self, speed: f32, epsilon: f32) -> bool {
        let remaining = self.target_deviation - self.deviation;
        if remaining.abs() <= epsilon {
            self.deviation = self.target_deviation;
            return false;
        }
        self.deviation += remaining / speed;
        true
    }
}

/// Follow `collapsed_under` links up to the outermost visible master.
///
/// The walk is bounded by the arena size, so a corrupted chain ends instead
/// of looping.
pub fn visible_master(nodes: &[NodeRenderingProperty], node: NodeIndex) -> Option<NodeIndex> {
    let mut current = node;
    for _ in 0..=nodes.len() {
        match nodes.get(current.0)?.collapsed_under {
            Some(master) => current = master,
            None => return Some(current),
        }
    }
    tracing::warn!(node = node.0, "Collapse chain does not terminate");
    None
}

#[derive(Debug, Clone, Default)]
pub struct RenderingModel {
    nodes: Vec<NodeRenderingProperty>,
    edges: Vec<EdgeRenderingProperty>,
    node_lookup: HashMap<NodeId, NodeIndex>,
    edge_lookup: HashMap<EdgeId, EdgeIndex>,
}

impl RenderingModel {
    /// Build exactly one property per node and per resolvable edge.
    ///
    /// Stored display properties seed overrides, visibility and positions.
    /// Edges whose endpoints are not in the graph get no property.
    pub fn from_graph(
        graph: &DependencyGraph,
        repository: &dyn DisplayPropertyRepository,
        config: &ViewConfig,
    ) -> Self {
        let mut model = RenderingModel::default();

        for node in &graph.nodes {
            if model.node_lookup.contains_key(&node.id) {
                tracing::debug!(node = %node.id, "Duplicate node ignored");
                continue;
            }
            let index = NodeIndex(model.nodes.len());
            if index.0 > MAX_PICK_INDEX {
                tracing::warn!(node = %node.id, "Graph exceeds the pickable node count; node not rendered");
                continue;
            }
            let mut prop = NodeRenderingProperty::new(node.id, index, &node.kind, &node.name, config);
            if let Some(display) = repository.node_property(node.id) {
                prop.set_overridden_color(display.color);
                prop.set_overridden_size(display.size);
                prop.set_overridden_shape(display.shape);
                prop.set_visible(display.visible);
                if let Some(position) = display.position.filter(|p| p.is_finite()) {
                    prop.set_position(position);
                }
            }
            model.node_lookup.insert(node.id, index);
            model.nodes.push(prop);
        }

        for edge in &graph.edges {
            let (Some(&source), Some(&target)) = (
                model.node_lookup.get(&edge.source),
                model.node_lookup.get(&edge.target),
            ) else {
                tracing::warn!(edge = %edge.id, "Edge endpoint missing from graph; edge not rendered");
                continue;
            };
            if model.edge_lookup.contains_key(&edge.id) {
                tracing::debug!(edge = %edge.id, "Duplicate edge ignored");
                continue;
            }
            let index = EdgeIndex(model.edges.len());
            if index.0 > MAX_PICK_INDEX {
                tracing::warn!(edge = %edge.id, "Graph exceeds the pickable edge count; edge not rendered");
                continue;
            }
            let display = repository.edge_property(edge.id).unwrap_or_default();
            model.edges.push(EdgeRenderingProperty {
                edge: edge.id,
                index,
                relation: edge.relation,
                pick_id: PickId::edge(index),
                source,
                target,
                render_source: source,
                render_target: target,
                stroke_color: display.color.unwrap_or(config.edge.color),
                overridden_color: display.color,
                width: config.edge.width,
                dashed: display.line_style == LineStyle::Dashed,
                arrow_head: display.arrow_head,
                visible: display.visible,
                label: String::new(),
                label_visible: false,
                text_dirty: true,
                label_texture: None,
                deviation: 0.0,
                target_deviation: 0.0,
            });
            model.edge_lookup.insert(edge.id, index);
        }

        tracing::debug!(
            nodes = model.nodes.len(),
            edges = model.edges.len(),
            "Built rendering model"
        );
        model
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes(&self) -> &[NodeRenderingProperty] {
        &self.nodes
    }

    pub fn edges(&self) -> &[EdgeRenderingProperty] {
        &self.edges
    }

    pub fn nodes_mut(&mut self) -> &mut [NodeRenderingProperty] {
        &mut self.nodes
    }

    pub fn edges_mut(&mut self) -> &mut [EdgeRenderingProperty] {
        &mut self.edges
    }

    /// Both arenas at once, for passes that mutate edges while reading nodes.
    pub fn parts_mut(&mut self) -> (&mut [NodeRenderingProperty], &mut [EdgeRenderingProperty]) {
        (&mut self.nodes, &mut self.edges)
    }

    pub fn node(&self, index: NodeIndex) -> Option<&NodeRenderingProperty> {
        self.nodes.get(index.0)
    }

    pub fn node_mut(&mut self, index: NodeIndex) -> Option<&mut NodeRenderingProperty> {
        self.nodes.get_mut(index.0)
    }

    pub fn edge(&self, index: EdgeIndex) -> Option<&EdgeRenderingProperty> {
        self.edges.get(index.0)
    }

    pub fn node_index(&self, id: NodeId) -> Option<NodeIndex> {
        self.node_lookup.get(&id).copied()
    }

    pub fn edge_index(&self, id: EdgeId) -> Option<EdgeIndex> {
        self.edge_lookup.get(&id).copied()
    }

    pub fn node_by_id(&self, id: NodeId) -> Option<&NodeRenderingProperty> {
        self.node_index(id).and_then(|i| self.node(i))
    }

    pub fn node_by_id_mut(&mut self, id: NodeId) -> Option<&mut NodeRenderingProperty> {
        let index = self.node_index(id)?;
        self.node_mut(index)
    }

    /// Resolve a node pick name. Out-of-range indices resolve to nothing.
    pub fn pick_to_node(&self, pick: PickId) -> Option<NodeIndex> {
        pick.node_index().filter(|i| i.0 < self.nodes.len())
    }

    pub fn pick_to_edge(&self, pick: PickId) -> Option<EdgeIndex> {
        pick.edge_index().filter(|i| i.0 < self.edges.len())
    }

    pub fn visible_master(&self, node: NodeIndex) -> Option<NodeIndex> {
        visible_master(&self.nodes, node)
    }

    /// Node ids of all nodes currently drawn: visible and not collapsed away.
    pub fn shown_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.is_visible() && n.collapsed_under.is_none())
            .map(|n| n.node)
            .collect()
    }

    /// Current target positions keyed by node id.
    pub fn target_positions(&self) -> HashMap<NodeId, Vec2> {
        self.nodes
            .iter()
            .map(|n| (n.node, n.target_position()))
            .collect()
    }

    /// Bounds of the target positions of shown nodes, grown by their size.
    pub fn bounds(&self) -> Option<Rect> {
        let mut bounds: Option<Rect> = None;
        for node in self
            .nodes
            .iter()
            .filter(|n| n.is_visible() && n.collapsed_under.is_none())
        {
            let r = Rect::from_center_size(
                node.target_position(),
                Vec2::new(node.size * 2.0, node.size * 2.0),
            );
            bounds = Some(match bounds {
                None => r,
                Some(b) => Rect::from_min_max(
                    Vec2::new(b.min.x.min(r.min.x), b.min.y.min(r.min.y)),
                    Vec2::new(b.max.x.max(r.max.x), b.max.y.max(r.max.y)),
                ),
            });
        }
        bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depan_core::{
        Edge, EdgeDisplayProperty, InMemoryDisplayRepository, Node, NodeDisplayProperty,
    };

    fn graph() -> DependencyGraph {
        let nodes = (1..=3)
            .map(|i| Node {
                id: NodeId(i),
                kind: "type".to_string(),
                name: format!("N{i}"),
            })
            .collect();
        let edges = vec![
            Edge {
                id: EdgeId(10),
                source: NodeId(1),
                target: NodeId(2),
                relation: RelationId(0),
            },
            Edge {
                id: EdgeId(11),
                source: NodeId(2),
                target: NodeId(99),
                relation: RelationId(0),
            },
        ];
        DependencyGraph::from_parts(nodes, edges)
    }

    #[test]
    fn test_pick_id_tags() {
        let n = PickId::node(NodeIndex(5));
        let e = PickId::edge(EdgeIndex(5));
        assert_ne!(n, e);
        assert_eq!(n.kind(), PickKind::Node);
        assert_eq!(e.kind(), PickKind::Edge);
        assert_eq!(n.node_index(), Some(NodeIndex(5)));
        assert_eq!(n.edge_index(), None);
        assert_eq!(e.edge_index(), Some(EdgeIndex(5)));
        assert_eq!(PickId(5).kind(), PickKind::Unused);
        assert_eq!(PickId(5).node_index(), None);
    }

    #[test]
    fn test_oversized_index_never_aliases_another_kind() {
        let past = MAX_PICK_INDEX + 1;
        assert_eq!(PickId::try_node(NodeIndex(past)), None);
        assert_eq!(PickId::try_edge(EdgeIndex(past)), None);
        // 2^31 would carry into the tag bits without the guard
        let node = PickId::node(NodeIndex(1 << 31));
        assert_eq!(node.kind(), PickKind::Unused);
        assert_eq!(node.node_index(), None);
        assert_eq!(PickId::edge(EdgeIndex(past)).edge_index(), None);

        let last = PickId::node(NodeIndex(MAX_PICK_INDEX));
        assert_eq!(last.node_index(), Some(NodeIndex(MAX_PICK_INDEX)));
    }

    #[test]
    fn test_model_has_one_property_per_element() {
        let model = RenderingModel::from_graph(
            &graph(),
            &InMemoryDisplayRepository::new(),
            &ViewConfig::default(),
        );
        assert_eq!(model.node_count(), 3);
        // dangling edge 11 is skipped
        assert_eq!(model.edge_count(), 1);
        let idx = model.node_index(NodeId(2)).unwrap();
        assert_eq!(model.node(idx).unwrap().node, NodeId(2));
        assert_eq!(model.pick_to_node(PickId::node(idx)), Some(idx));
        assert_eq!(model.pick_to_node(PickId::node(NodeIndex(40))), None);
        assert_eq!(model.edge_index(EdgeId(11)), None);
    }

    #[test]
    fn test_repository_seeds_properties() {
        let mut repo = InMemoryDisplayRepository::new();
        repo.set_node_property(
            NodeId(1),
            NodeDisplayProperty {
                color: Some(Color::rgb(1, 2, 3)),
                size: Some(-4.0),
                visible: false,
                position: Some(Vec2::new(7.0, 8.0)),
                ..Default::default()
            },
        );
        repo.set_edge_property(
            EdgeId(10),
            EdgeDisplayProperty {
                line_style: LineStyle::Dashed,
                ..Default::default()
            },
        );
        let model = RenderingModel::from_graph(&graph(), &repo, &ViewConfig::default());
        let node = model.node_by_id(NodeId(1)).unwrap();
        assert_eq!(node.overridden_color(), Some(Color::rgb(1, 2, 3)));
        assert_eq!(node.overridden_size(), None);
        assert!(!node.is_visible());
        assert_eq!(node.position(), Vec2::new(7.0, 8.0));
        assert_eq!(node.target_position(), Vec2::new(7.0, 8.0));
        assert!(model.edges()[0].dashed);
    }

    #[test]
    fn test_position_flavours() {
        let config = ViewConfig::default();
        let mut node = NodeRenderingProperty::new(NodeId(1), NodeIndex(0), "", "a", &config);
        node.set_position(Vec2::new(10.0, 0.0));
        node.edit_position(Vec2::new(20.0, 0.0));
        assert_eq!(node.position(), Vec2::new(10.0, 0.0));
        assert!(node.is_animating(0.01));

        assert!(node.step_toward_target(5.0, 0.01));
        assert_eq!(node.position(), Vec2::new(12.0, 0.0));

        node.update_position(Vec2::new(3.0, 3.0));
        assert!(!node.is_animating(0.01));
        assert!(!node.step_toward_target(5.0, 0.01));
    }

    #[test]
    fn test_label_dirty_only_on_change() {
        let config = ViewConfig::default();
        let mut node = NodeRenderingProperty::new(NodeId(1), NodeIndex(0), "", "a", &config);
        node.set_label("a");
        assert!(node.text_dirty);
        node.text_dirty = false;
        node.set_label("a");
        assert!(!node.text_dirty);
        node.set_label("a (+2)");
        assert!(node.text_dirty);
    }

    #[test]
    fn test_visible_master_follows_chain() {
        let mut model = RenderingModel::from_graph(
            &graph(),
            &InMemoryDisplayRepository::new(),
            &ViewConfig::default(),
        );
        model.nodes_mut()[0].collapsed_under = Some(NodeIndex(1));
        model.nodes_mut()[1].collapsed_under = Some(NodeIndex(2));
        assert_eq!(model.visible_master(NodeIndex(0)), Some(NodeIndex(2)));
        assert_eq!(model.visible_master(NodeIndex(2)), Some(NodeIndex(2)));

        model.nodes_mut()[2].collapsed_under = Some(NodeIndex(0));
        assert_eq!(model.visible_master(NodeIndex(0)), None);
        assert_eq!(model.visible_master(NodeIndex(9)), None);
    }
}
