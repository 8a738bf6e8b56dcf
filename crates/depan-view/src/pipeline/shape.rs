use super::{FrameContext, NodeStage, RenderingPlugin};
use crate::config::{NodeShapeMode, ViewConfig};
use crate::property::NodeRenderingProperty;
use depan_core::ShapeKind;

#[derive(Debug, Clone)]
pub struct ShapePlugin {
    mode: NodeShapeMode,
    default_shape: ShapeKind,
}

impl ShapePlugin {
    pub fn new(config: &ViewConfig) -> Self {
        Self {
            mode: config.modes.node_shape,
            default_shape: config.node.shape,
        }
    }

    pub fn mode(&self) -> NodeShapeMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: NodeShapeMode) {
        self.mode = mode;
    }

    fn computed(&self, node: &NodeRenderingProperty) -> ShapeKind {
        match self.mode {
            NodeShapeMode::Default => self.default_shape,
            NodeShapeMode::ByKind => shape_for_kind(&node.kind).unwrap_or(self.default_shape),
            NodeShapeMode::Degree => match node.degree_ratio {
                r if r < 0.25 => ShapeKind::Circle,
                r if r < 0.5 => ShapeKind::Square,
                r if r < 0.75 => ShapeKind::Hexagon,
                _ => ShapeKind::Star,
            },
        }
    }
}

fn shape_for_kind(kind: &str) -> Option<ShapeKind> {
    let shape = match kind.to_ascii_lowercase().as_str() {
        "type" | "class" | "interface" | "struct" | "enum" => ShapeKind::Square,
        "method" | "function" | "constructor" => ShapeKind::Circle,
        "field" | "variable" | "constant" => ShapeKind::Diamond,
        "file" => ShapeKind::Hexagon,
        "package" | "directory" | "module" => ShapeKind::Triangle,
        _ => return None,
    };
    Some(shape)
}

impl RenderingPlugin for ShapePlugin {
    fn name(&self) -> &'static str {
        "shape"
    }

    fn node_stage(&self) -> Option<NodeStage> {
        Some(NodeStage::Shape)
    }

    fn apply_node(&mut self, node: &mut NodeRenderingProperty, _ctx: &mut FrameContext<'_>) -> bool {
        node.shape = match node.overridden_shape() {
            Some(shape) => shape,
            None if node.is_collapse_master => ShapeKind::Group,
            None => self.computed(node),
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::FrameMode;
    use crate::property::NodeIndex;
    use crate::surface::RecordingSurface;
    use depan_core::NodeId;

    #[test]
    fn test_shape_precedence() {
        let mut config = ViewConfig::default();
        config.modes.node_shape = NodeShapeMode::ByKind;
        let mut plugin = ShapePlugin::new(&config);
        let mut surface = RecordingSurface::new();
        let mut ctx = FrameContext {
            mode: FrameMode::Render,
            surface: &mut surface,
            selection_active: false,
            hyperbolic: None,
            frame: 0,
        };
        let mut node = NodeRenderingProperty::new(NodeId(1), NodeIndex(0), "Field", "f", &config);
        plugin.apply_node(&mut node, &mut ctx);
        assert_eq!(node.shape, ShapeKind::Diamond);

        node.is_collapse_master = true;
        plugin.apply_node(&mut node, &mut ctx);
        assert_eq!(node.shape, ShapeKind::Group);

        node.set_overridden_shape(Some(ShapeKind::Star));
        plugin.apply_node(&mut node, &mut ctx);
        assert_eq!(node.shape, ShapeKind::Star);

        let mut other = NodeRenderingProperty::new(NodeId(2), NodeIndex(1), "widget", "w", &config);
        plugin.apply_node(&mut other, &mut ctx);
        assert_eq!(other.shape, config.node.shape);
    }
}
