use super::{EdgeStage, FrameContext, NodeStage, RenderingPlugin};
use crate::config::{LabelMode, ViewConfig};
use crate::property::{EdgeRenderingProperty, NodeRenderingProperty};
use depan_core::{RelationId, RelationRegistry};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct LabelPlugin {
    node_mode: LabelMode,
    edge_mode: LabelMode,
    relation_names: HashMap<RelationId, String>,
}

impl LabelPlugin {
    pub fn new(config: &ViewConfig, relations: &RelationRegistry) -> Self {
        Self {
            node_mode: config.modes.node_label,
            edge_mode: config.modes.edge_label,
            relation_names: relations.iter().map(|r| (r.id, r.name.clone())).collect(),
        }
    }

    pub fn set_node_mode(&mut self, mode: LabelMode) {
        self.node_mode = mode;
    }

    pub fn set_edge_mode(&mut self, mode: LabelMode) {
        self.edge_mode = mode;
    }
}

fn node_text(node: &NodeRenderingProperty) -> String {
    if node.is_collapse_master && node.collapsed_count > 0 {
        format!("{} (+{})", node.name, node.collapsed_count)
    } else {
        node.name.clone()
    }
}

impl RenderingPlugin for LabelPlugin {
    fn name(&self) -> &'static str {
        "label"
    }

    fn node_stage(&self) -> Option<NodeStage> {
        Some(NodeStage::Label)
    }

    fn edge_stage(&self) -> Option<EdgeStage> {
        Some(EdgeStage::Label)
    }

    fn apply_node(&mut self, node: &mut NodeRenderingProperty, _ctx: &mut FrameContext<'_>) -> bool {
        node.label_visible = match self.node_mode {
            LabelMode::All => true,
            LabelMode::Selected => node.is_selected(),
            LabelMode::None => false,
        };
        if node.label_visible {
            let text = node_text(node);
            node.set_label(&text);
        }
        true
    }

    fn apply_edge(
        &mut self,
        edge: &mut EdgeRenderingProperty,
        nodes: &[NodeRenderingProperty],
        _ctx: &mut FrameContext<'_>,
    ) -> bool {
        edge.label_visible = match self.edge_mode {
            LabelMode::All => true,
            LabelMode::Selected => [edge.source, edge.target]
                .iter()
                .any(|i| nodes.get(i.0).is_some_and(|n| n.is_selected())),
            LabelMode::None => false,
        };
        if edge.label_visible {
            match self.relation_names.get(&edge.relation) {
                Some(name) => edge.set_label(name),
                None => edge.set_label(&edge.relation.to_string()),
            }
        }
        true
    }
}
