use super::{FrameContext, NodeStage, RenderingPlugin};
use crate::interaction::{Key, Modifiers};
use crate::property::NodeRenderingProperty;
use depan_core::{Translater, Vec2};

const STEP: f32 = 1.1;

/// Stretches the drawn layout along x and y without touching positions.
#[derive(Debug, Clone)]
pub struct FactorPlugin {
    factor: Vec2,
    translater: Translater,
}

impl Default for FactorPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl FactorPlugin {
    pub fn new() -> Self {
        Self {
            factor: Vec2::new(1.0, 1.0),
            translater: Translater::identity(),
        }
    }

    pub fn factor(&self) -> Vec2 {
        self.factor
    }

    pub fn set_factor(&mut self, factor: Vec2) {
        if !(factor.is_finite() && factor.x > 0.0 && factor.y > 0.0) {
            tracing::debug!(?factor, "Ignoring non-positive scale factor");
            return;
        }
        self.factor = factor;
        self.translater = if factor == Vec2::new(1.0, 1.0) {
            Translater::identity()
        } else {
            Translater::scale(factor.x, factor.y)
        };
    }
}

impl RenderingPlugin for FactorPlugin {
    fn name(&self) -> &'static str {
        "factor"
    }

    fn node_stage(&self) -> Option<NodeStage> {
        Some(NodeStage::ScaleFactor)
    }

    fn apply_node(&mut self, node: &mut NodeRenderingProperty, _ctx: &mut FrameContext<'_>) -> bool {
        node.draw_position = self.translater.translate(node.position());
        true
    }

    fn key_pressed(&mut self, key: Key, modifiers: Modifiers) -> bool {
        let Key::Char(c) = key else {
            return false;
        };
        let shrink = modifiers.shift || c.is_ascii_uppercase();
        let step = if shrink { 1.0 / STEP } else { STEP };
        let f = self.factor;
        match c.to_ascii_lowercase() {
            'x' => self.set_factor(Vec2::new(f.x * step, f.y)),
            'y' => self.set_factor(Vec2::new(f.x, f.y * step)),
            '0' => self.set_factor(Vec2::new(1.0, 1.0)),
            _ => return false,
        }
        true
    }
}
