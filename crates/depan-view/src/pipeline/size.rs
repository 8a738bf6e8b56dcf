use super::{FrameContext, NodeStage, RenderingPlugin};
use crate::config::{NodeSizeMode, ViewConfig};
use crate::property::NodeRenderingProperty;

#[derive(Debug, Clone)]
pub struct SizePlugin {
    mode: NodeSizeMode,
    default_size: f32,
    min_size: f32,
    max_size: f32,
}

impl SizePlugin {
    pub fn new(config: &ViewConfig) -> Self {
        Self {
            mode: config.modes.node_size,
            default_size: config.node.size,
            min_size: config.node.min_size,
            max_size: config.node.max_size,
        }
    }

    pub fn mode(&self) -> NodeSizeMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: NodeSizeMode) {
        self.mode = mode;
    }

    /// Square-root scaling so area, not radius, tracks the ratio.
    fn scaled(&self, ratio: f32) -> f32 {
        self.min_size + (self.max_size - self.min_size) * ratio.clamp(0.0, 1.0).sqrt()
    }
}

impl RenderingPlugin for SizePlugin {
    fn name(&self) -> &'static str {
        "size"
    }

    fn node_stage(&self) -> Option<NodeStage> {
        Some(NodeStage::Size)
    }

    fn apply_node(&mut self, node: &mut NodeRenderingProperty, _ctx: &mut FrameContext<'_>) -> bool {
        let computed = match self.mode {
            NodeSizeMode::Default => self.default_size,
            NodeSizeMode::Degree => self.scaled(node.degree_ratio),
            NodeSizeMode::Rank => self.scaled(node.rank_ratio),
        };
        node.size = node.overridden_size().unwrap_or(computed);
        true
    }
}
