use super::{EdgeStage, FrameContext, RenderingPlugin};
use crate::property::{EdgeRenderingProperty, NodeRenderingProperty, visible_master};
use depan_core::EdgeId;
use std::collections::HashMap;

/// Spacing between neighbouring parallel edges.
pub const DEVIATION_STEP: f32 = 0.6;

/// Spreads parallel edges between the same endpoints apart.
///
/// Layout runs edit node targets directly; this plugin only owns the edge
/// side of the layout stage.
#[derive(Debug, Default)]
pub struct LayoutPlugin {
    deviations: HashMap<EdgeId, f32>,
    groups: HashMap<(usize, usize), Vec<EdgeId>>,
}

impl LayoutPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deviation(&self, edge: EdgeId) -> f32 {
        self.deviations.get(&edge).copied().unwrap_or(0.0)
    }
}

impl RenderingPlugin for LayoutPlugin {
    fn name(&self) -> &'static str {
        "layout"
    }

    fn edge_stage(&self) -> Option<EdgeStage> {
        Some(EdgeStage::Layout)
    }

    fn begin_dry_run(&mut self) {
        self.groups.clear();
        self.deviations.clear();
    }

    fn dry_run_edge(&mut self, edge: &EdgeRenderingProperty, nodes: &[NodeRenderingProperty]) {
        let a = visible_master(nodes, edge.source).unwrap_or(edge.source).0;
        let b = visible_master(nodes, edge.target).unwrap_or(edge.target).0;
        let key = (a.min(b), a.max(b));
        let group = self.groups.entry(key).or_default();
        group.push(edge.edge);

        // recentre the whole group each time it grows
        let k = group.len();
        for (i, id) in group.iter().enumerate() {
            let offset = (i as f32 - (k as f32 - 1.0) / 2.0) * DEVIATION_STEP;
            self.deviations.insert(*id, offset);
        }
    }

    fn apply_edge(
        &mut self,
        edge: &mut EdgeRenderingProperty,
        _nodes: &[NodeRenderingProperty],
        _ctx: &mut FrameContext<'_>,
    ) -> bool {
        let mut deviation = self.deviation(edge.edge);
        // offsets are laid out relative to the lower-index endpoint
        if edge.render_source.0 > edge.render_target.0 {
            deviation = -deviation;
        }
        edge.target_deviation = deviation;
        true
    }
}
