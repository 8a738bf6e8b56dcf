use super::{FrameContext, NodeStage, RenderingPlugin};
use crate::config::ViewConfig;
use crate::property::NodeRenderingProperty;
use depan_core::Color;

#[derive(Debug, Clone)]
pub struct StrokePlugin {
    width: f32,
    selected_width: f32,
    selection_color: Color,
}

impl StrokePlugin {
    pub fn new(config: &ViewConfig) -> Self {
        Self {
            width: config.node.stroke_width,
            selected_width: config.node.selected_stroke_width,
            selection_color: config.selection_color,
        }
    }
}

impl RenderingPlugin for StrokePlugin {
    fn name(&self) -> &'static str {
        "stroke"
    }

    fn node_stage(&self) -> Option<NodeStage> {
        Some(NodeStage::Stroke)
    }

    fn apply_node(&mut self, node: &mut NodeRenderingProperty, _ctx: &mut FrameContext<'_>) -> bool {
        if node.is_selected() {
            node.stroke_color = self.selection_color;
            node.stroke_width = self.selected_width;
        } else {
            node.stroke_color = node.fill_color.darken(0.3);
            node.stroke_width = self.width;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::FrameMode;
    use crate::property::RenderingModel;
    use crate::surface::RecordingSurface;
    use depan_core::{DependencyGraph, InMemoryDisplayRepository, Node, NodeId};

    #[test]
    fn test_selected_nodes_get_the_selection_stroke() {
        let config = ViewConfig::default();
        let nodes = (0..2)
            .map(|i| Node {
                id: NodeId(i),
                kind: String::new(),
                name: String::new(),
            })
            .collect();
        let mut model = RenderingModel::from_graph(
            &DependencyGraph::from_parts(nodes, Vec::new()),
            &InMemoryDisplayRepository::new(),
            &config,
        );
        model.nodes_mut()[0].fill_color = Color::rgb(200, 100, 50);
        model.nodes_mut()[1].fill_color = Color::rgb(200, 100, 50);
        model.nodes_mut()[1].set_selected(true);

        let mut surface = RecordingSurface::new();
        let mut ctx = FrameContext {
            mode: FrameMode::Render,
            surface: &mut surface,
            selection_active: true,
            hyperbolic: None,
            frame: 0,
        };
        let mut plugin = StrokePlugin::new(&config);
        let nodes = model.nodes_mut();
        assert!(plugin.apply_node(&mut nodes[0], &mut ctx));
        assert!(plugin.apply_node(&mut nodes[1], &mut ctx));

        assert_eq!(nodes[0].stroke_color, Color::rgb(200, 100, 50).darken(0.3));
        assert_eq!(nodes[0].stroke_width, config.node.stroke_width);
        assert_eq!(nodes[1].stroke_color, config.selection_color);
        assert_eq!(nodes[1].stroke_width, config.node.selected_stroke_width);
    }
}
