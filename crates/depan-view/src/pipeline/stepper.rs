use super::{EdgeStage, FrameContext, NodeStage, RenderingPlugin};
use crate::property::{EdgeRenderingProperty, NodeRenderingProperty};

/// Easing divisor shared with the camera.
pub const STEP_SPEED: f32 = 5.0;

/// Advances every drawn node and edge toward its target each render frame.
#[derive(Debug, Clone)]
pub struct StepperPlugin {
    epsilon: f32,
    moving: bool,
    animating: bool,
}

impl StepperPlugin {
    pub fn new(epsilon: f32) -> Self {
        Self {
            epsilon,
            moving: false,
            animating: false,
        }
    }

    /// Whether the last render frame moved anything.
    pub fn is_animating(&self) -> bool {
        self.animating
    }
}

impl RenderingPlugin for StepperPlugin {
    fn name(&self) -> &'static str {
        "stepper"
    }

    fn node_stage(&self) -> Option<NodeStage> {
        Some(NodeStage::Stepper)
    }

    fn edge_stage(&self) -> Option<EdgeStage> {
        Some(EdgeStage::Stepper)
    }

    fn pre_frame(&mut self, ctx: &mut FrameContext<'_>) {
        if ctx.is_render() {
            self.moving = false;
        }
    }

    fn post_frame(&mut self, ctx: &mut FrameContext<'_>) {
        if ctx.is_render() {
            self.animating = self.moving;
        }
    }

    fn apply_node(&mut self, node: &mut NodeRenderingProperty, ctx: &mut FrameContext<'_>) -> bool {
        if ctx.is_render() && node.step_toward_target(STEP_SPEED, self.epsilon) {
            self.moving = true;
        }
        true
    }

    fn apply_edge(
        &mut self,
        edge: &mut EdgeRenderingProperty,
        _nodes: &[NodeRenderingProperty],
        ctx: &mut FrameContext<'_>,
    ) -> bool {
        if ctx.is_render() && edge.step_deviation(STEP_SPEED, self.epsilon) {
            self.moving = true;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_SETTLE_EPSILON, ViewConfig};
    use crate::pipeline::FrameMode;
    use crate::property::RenderingModel;
    use crate::surface::RecordingSurface;
    use depan_core::{DependencyGraph, InMemoryDisplayRepository, Node, NodeId, Vec2};

    fn single_node() -> RenderingModel {
        let node = Node {
            id: NodeId(1),
            kind: String::new(),
            name: String::new(),
        };
        RenderingModel::from_graph(
            &DependencyGraph::from_parts(vec![node], Vec::new()),
            &InMemoryDisplayRepository::new(),
            &ViewConfig::default(),
        )
    }

    fn frame(
        plugin: &mut StepperPlugin,
        node: &mut NodeRenderingProperty,
        surface: &mut RecordingSurface,
        mode: FrameMode,
    ) {
        let mut ctx = FrameContext {
            mode,
            surface,
            selection_active: false,
            hyperbolic: None,
            frame: 0,
        };
        plugin.pre_frame(&mut ctx);
        plugin.apply_node(node, &mut ctx);
        plugin.post_frame(&mut ctx);
    }

    #[test]
    fn test_eases_a_fifth_of_the_way_each_frame() {
        let mut model = single_node();
        let node = &mut model.nodes_mut()[0];
        node.set_position(Vec2::ZERO);
        node.edit_position(Vec2::new(100.0, 0.0));

        let mut plugin = StepperPlugin::new(DEFAULT_SETTLE_EPSILON);
        let mut surface = RecordingSurface::new();
        for expected in [20.0, 36.0, 48.8, 59.04] {
            frame(&mut plugin, node, &mut surface, FrameMode::Render);
            assert!((node.position().x - expected).abs() < 1e-3, "{:?}", node.position());
            assert!(plugin.is_animating());
        }
    }

    #[test]
    fn test_snaps_onto_target_and_stops() {
        let mut model = single_node();
        let node = &mut model.nodes_mut()[0];
        node.set_position(Vec2::ZERO);
        node.edit_position(Vec2::new(10.0, -4.0));

        let mut plugin = StepperPlugin::new(DEFAULT_SETTLE_EPSILON);
        let mut surface = RecordingSurface::new();
        let mut frames = 0;
        loop {
            frame(&mut plugin, node, &mut surface, FrameMode::Render);
            frames += 1;
            if !plugin.is_animating() {
                break;
            }
            assert!(frames < 200, "never settled");
        }
        assert_eq!(node.position(), Vec2::new(10.0, -4.0));
        assert!(!node.is_animating(DEFAULT_SETTLE_EPSILON));
    }

    #[test]
    fn test_select_frames_do_not_advance() {
        let mut model = single_node();
        let node = &mut model.nodes_mut()[0];
        node.set_position(Vec2::ZERO);
        node.edit_position(Vec2::new(50.0, 0.0));

        let mut plugin = StepperPlugin::new(DEFAULT_SETTLE_EPSILON);
        let mut surface = RecordingSurface::new();
        frame(&mut plugin, node, &mut surface, FrameMode::Select);
        assert_eq!(node.position(), Vec2::ZERO);
        assert!(!plugin.is_animating());

        frame(&mut plugin, node, &mut surface, FrameMode::Render);
        assert_eq!(node.position(), Vec2::new(10.0, 0.0));
        frame(&mut plugin, node, &mut surface, FrameMode::Select);
        assert_eq!(node.position(), Vec2::new(10.0, 0.0));
        assert!(plugin.is_animating());
    }
}
