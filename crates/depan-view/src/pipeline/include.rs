use super::{EdgeStage, FrameContext, RenderingPlugin};
use crate::property::{EdgeRenderingProperty, NodeRenderingProperty};
use depan_core::RelationId;
use std::collections::HashSet;

/// Drops edges of hidden relations and edges marked invisible.
#[derive(Debug, Default, Clone)]
pub struct IncludePlugin {
    hidden: HashSet<RelationId>,
}

impl IncludePlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_relation_visible(&mut self, relation: RelationId, visible: bool) {
        if visible {
            self.hidden.remove(&relation);
        } else {
            self.hidden.insert(relation);
        }
    }

    pub fn is_relation_visible(&self, relation: RelationId) -> bool {
        !self.hidden.contains(&relation)
    }
}

impl RenderingPlugin for IncludePlugin {
    fn name(&self) -> &'static str {
        "include"
    }

    fn edge_stage(&self) -> Option<EdgeStage> {
        Some(EdgeStage::Include)
    }

    fn apply_edge(
        &mut self,
        edge: &mut EdgeRenderingProperty,
        _nodes: &[NodeRenderingProperty],
        _ctx: &mut FrameContext<'_>,
    ) -> bool {
        edge.visible && self.is_relation_visible(edge.relation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_toggle() {
        let mut plugin = IncludePlugin::new();
        assert!(plugin.is_relation_visible(RelationId(3)));
        plugin.set_relation_visible(RelationId(3), false);
        assert!(!plugin.is_relation_visible(RelationId(3)));
        assert!(plugin.is_relation_visible(RelationId(4)));
        plugin.set_relation_visible(RelationId(3), true);
        assert!(plugin.is_relation_visible(RelationId(3)));
    }
}
