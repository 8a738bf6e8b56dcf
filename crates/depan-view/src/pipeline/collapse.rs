use super::{EdgeStage, FrameContext, NodeStage, RenderingPlugin};
use crate::property::{EdgeRenderingProperty, NodeRenderingProperty, visible_master};

/// Hides collapsed and invisible nodes and reroutes edges to their masters.
#[derive(Debug, Default, Clone, Copy)]
pub struct CollapsePlugin;

impl RenderingPlugin for CollapsePlugin {
    fn name(&self) -> &'static str {
        "collapse"
    }

    fn node_stage(&self) -> Option<NodeStage> {
        Some(NodeStage::Collapse)
    }

    fn edge_stage(&self) -> Option<EdgeStage> {
        Some(EdgeStage::Collapse)
    }

    fn apply_node(&mut self, node: &mut NodeRenderingProperty, _ctx: &mut FrameContext<'_>) -> bool {
        node.is_visible() && node.collapsed_under.is_none()
    }

    fn apply_edge(
        &mut self,
        edge: &mut EdgeRenderingProperty,
        nodes: &[NodeRenderingProperty],
        _ctx: &mut FrameContext<'_>,
    ) -> bool {
        let (Some(source), Some(target)) = (
            visible_master(nodes, edge.source),
            visible_master(nodes, edge.target),
        ) else {
            tracing::trace!(edge = %edge.edge, "Edge endpoints unresolved");
            return false;
        };
        if source == target {
            // both ends inside one group
            return false;
        }
        let shown = |i: usize| nodes.get(i).is_some_and(|n| n.is_visible());
        if !shown(source.0) || !shown(target.0) {
            return false;
        }
        edge.render_source = source;
        edge.render_target = target;
        true
    }
}
