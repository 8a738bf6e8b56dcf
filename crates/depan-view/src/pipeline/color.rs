use super::{EdgeStage, FrameContext, NodeStage, RenderingPlugin};
use crate::color_map::ColorMap;
use crate::config::{ColorMapChoice, NodeColorMode, ViewConfig};
use crate::property::{EdgeRenderingProperty, NodeRenderingProperty};
use crate::stats::DegreeCounter;
use depan_core::Color;

/// Computes node fill and edge stroke colors.
///
/// Also owns the per-node degree statistics gathered in the dry run and
/// publishes them as `degree_ratio` for the stages that follow.
#[derive(Debug, Clone)]
pub struct ColorPlugin {
    mode: NodeColorMode,
    color_map: ColorMap,
    node_color: Color,
    edge_color: Color,
    selection_color: Color,
    dim_unselected: bool,
    degrees: DegreeCounter,
}

impl ColorPlugin {
    pub fn new(config: &ViewConfig) -> Self {
        let color_map = match &config.color_map {
            ColorMapChoice::Named(name) => ColorMap::named(name),
            ColorMapChoice::Custom(definition) => ColorMap::new(definition.clone()),
        };
        Self {
            mode: config.modes.node_color,
            color_map,
            node_color: config.node.color,
            edge_color: config.edge.color,
            selection_color: config.selection_color,
            dim_unselected: config.edge.dim_unselected,
            degrees: DegreeCounter::default(),
        }
    }

    pub fn mode(&self) -> NodeColorMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: NodeColorMode) {
        self.mode = mode;
    }

    pub fn set_color_map(&mut self, color_map: ColorMap) {
        self.color_map = color_map;
    }

    pub fn max_degree(&self) -> u32 {
        self.degrees.max()
    }
}

impl RenderingPlugin for ColorPlugin {
    fn name(&self) -> &'static str {
        "color"
    }

    fn node_stage(&self) -> Option<NodeStage> {
        Some(NodeStage::Color)
    }

    fn edge_stage(&self) -> Option<EdgeStage> {
        Some(EdgeStage::Color)
    }

    fn begin_dry_run(&mut self) {
        self.degrees.reset();
    }

    fn dry_run_edge(&mut self, edge: &EdgeRenderingProperty, _nodes: &[NodeRenderingProperty]) {
        if edge.visible {
            self.degrees.add_edge(edge.source, edge.target);
        }
    }

    fn apply_node(&mut self, node: &mut NodeRenderingProperty, _ctx: &mut FrameContext<'_>) -> bool {
        node.degree_ratio = self.degrees.ratio(node.index);
        let computed = match self.mode {
            NodeColorMode::Default => self.node_color,
            NodeColorMode::Degree => self.color_map.get_color(node.degree_ratio),
            NodeColorMode::Rank => self.color_map.get_color(node.rank_ratio),
        };
        let fill = node.overridden_color().unwrap_or(computed);
        node.fill_color = if node.is_selected() {
            fill.lighten(0.3)
        } else {
            fill
        };
        true
    }

    fn apply_edge(
        &mut self,
        edge: &mut EdgeRenderingProperty,
        nodes: &[NodeRenderingProperty],
        ctx: &mut FrameContext<'_>,
    ) -> bool {
        let base = edge.overridden_color.unwrap_or(self.edge_color);
        edge.stroke_color = if ctx.selection_active {
            let touches_selection = [edge.source, edge.target]
                .iter()
                .any(|i| nodes.get(i.0).is_some_and(|n| n.is_selected()));
            if touches_selection {
                self.selection_color
            } else if self.dim_unselected {
                base.with_alpha(base.a / 4)
            } else {
                base
            }
        } else {
            base
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::FrameMode;
    use crate::property::{NodeIndex, RenderingModel};
    use crate::surface::RecordingSurface;
    use depan_core::{
        DependencyGraph, Edge, EdgeId, InMemoryDisplayRepository, Node, NodeId, RelationId,
    };

    fn model(edges: &[(i64, i64)]) -> RenderingModel {
        let nodes = (0..3)
            .map(|i| Node {
                id: NodeId(i),
                kind: String::new(),
                name: String::new(),
            })
            .collect();
        let edges = edges
            .iter()
            .enumerate()
            .map(|(i, (s, t))| Edge {
                id: EdgeId(i as i64),
                source: NodeId(*s),
                target: NodeId(*t),
                relation: RelationId(0),
            })
            .collect();
        RenderingModel::from_graph(
            &DependencyGraph::from_parts(nodes, edges),
            &InMemoryDisplayRepository::new(),
            &ViewConfig::default(),
        )
    }

    fn run(plugin: &mut ColorPlugin, model: &mut RenderingModel, selection_active: bool) {
        plugin.begin_dry_run();
        for edge in model.edges() {
            plugin.dry_run_edge(edge, model.nodes());
        }
        let mut surface = RecordingSurface::new();
        let mut ctx = FrameContext {
            mode: FrameMode::Render,
            surface: &mut surface,
            selection_active,
            hyperbolic: None,
            frame: 0,
        };
        let (nodes, edges) = model.parts_mut();
        for node in nodes.iter_mut() {
            plugin.apply_node(node, &mut ctx);
        }
        for edge in edges.iter_mut() {
            plugin.apply_edge(edge, nodes, &mut ctx);
        }
    }

    #[test]
    fn test_degree_mode_without_edges_uses_bottom_of_map() {
        let mut config = ViewConfig::default();
        config.modes.node_color = NodeColorMode::Degree;
        let mut plugin = ColorPlugin::new(&config);
        let mut m = model(&[]);
        run(&mut plugin, &mut m, false);
        assert_eq!(plugin.max_degree(), 0);
        let bottom = ColorMap::named("jet").get_color(0.0);
        for node in m.nodes() {
            assert_eq!(node.degree_ratio, 0.0);
            assert_eq!(node.fill_color, bottom);
        }
    }

    #[test]
    fn test_override_wins_over_mode() {
        let mut config = ViewConfig::default();
        config.modes.node_color = NodeColorMode::Degree;
        let mut plugin = ColorPlugin::new(&config);
        let mut m = model(&[(0, 1), (0, 2)]);
        m.nodes_mut()[1].set_overridden_color(Some(Color::rgb(9, 9, 9)));
        run(&mut plugin, &mut m, false);
        assert_eq!(m.nodes()[0].degree_ratio, 1.0);
        assert_eq!(m.nodes()[0].fill_color, ColorMap::named("jet").get_color(1.0));
        assert_eq!(m.nodes()[1].fill_color, Color::rgb(9, 9, 9));

        m.nodes_mut()[1].set_overridden_color(None);
        run(&mut plugin, &mut m, false);
        assert_eq!(m.nodes()[1].fill_color, ColorMap::named("jet").get_color(0.5));
    }

    #[test]
    fn test_edges_touching_selection_are_highlighted() {
        let mut config = ViewConfig::default();
        config.edge.dim_unselected = true;
        let mut plugin = ColorPlugin::new(&config);
        let mut m = model(&[(0, 1), (1, 2)]);
        m.node_mut(NodeIndex(0)).unwrap().set_selected(true);
        run(&mut plugin, &mut m, true);
        assert_eq!(m.edges()[0].stroke_color, config.selection_color);
        assert_eq!(m.edges()[1].stroke_color.a, config.edge.color.a / 4);
    }
}
