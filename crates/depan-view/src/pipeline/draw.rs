use super::{EdgeStage, FrameContext, NodeStage, RenderingPlugin};
use crate::hyperbolic::HyperbolicProjection;
use crate::property::{EdgeRenderingProperty, NodeRenderingProperty};
use crate::shape::outline;
use crate::surface::{DrawingSurface, Primitive, TextureId};
use depan_core::{ArrowHead, Vec2};
use glam::DVec2;

const CURVE_SEGMENTS: usize = 12;
const ARROW_LENGTH: f32 = 0.6;
const ARROW_HALF_WIDTH: f32 = 0.3;
const LABEL_HEIGHT: f32 = 0.8;
/// Below this a deviation is drawn as a straight line.
const STRAIGHT_DEVIATION: f32 = 1e-4;

/// Final stage: emits primitives, pick names and label textures.
#[derive(Debug, Clone, Default)]
pub struct DrawPlugin;

impl DrawPlugin {
    pub fn new() -> Self {
        Self
    }
}

fn project(hyperbolic: Option<HyperbolicProjection>, p: Vec2) -> Vec2 {
    match hyperbolic {
        Some(h) => {
            let q = h.to_disk(DVec2::new(p.x as f64, p.y as f64));
            Vec2::new(q.x as f32, q.y as f32)
        }
        None => p,
    }
}

/// Recreate a stale texture, release the old one, and return the live one.
fn refresh_texture(
    surface: &mut dyn DrawingSurface,
    texture: &mut Option<TextureId>,
    dirty: &mut bool,
    text: &str,
) -> Option<TextureId> {
    if *dirty || texture.is_none() {
        if let Some(old) = texture.take() {
            surface.release_texture(old);
        }
        if !text.is_empty() {
            *texture = Some(surface.create_text_texture(text));
        }
        *dirty = false;
    }
    *texture
}

fn quadratic(start: Vec2, control: Vec2, end: Vec2, t: f32) -> Vec2 {
    let u = 1.0 - t;
    start * (u * u) + control * (2.0 * u * t) + end * (t * t)
}

impl DrawPlugin {
    fn draw_node(&self, node: &mut NodeRenderingProperty, ctx: &mut FrameContext<'_>) {
        let points = outline(node.shape);
        let center = node.draw_position;
        let size = node.size;
        let hyperbolic = ctx.hyperbolic;
        let render = ctx.is_render();
        let surface = &mut *ctx.surface;

        let emit = |surface: &mut dyn DrawingSurface, primitive: Primitive| {
            surface.begin(primitive);
            for p in points {
                let v = match hyperbolic {
                    Some(_) => project(hyperbolic, center + *p * size),
                    None => *p,
                };
                surface.vertex(v.x, v.y);
            }
            surface.end();
        };

        surface.push_matrix();
        if hyperbolic.is_none() {
            surface.translate(center.x, center.y, 0.0);
            surface.scale(size, size, 1.0);
        }
        surface.set_color(node.fill_color);
        emit(surface, Primitive::Polygon);
        if render {
            surface.set_color(node.stroke_color);
            surface.set_line_width(node.stroke_width);
            emit(surface, Primitive::LineLoop);
        }
        surface.pop_matrix();

        if render && node.label_visible {
            let texture = refresh_texture(
                surface,
                &mut node.label_texture,
                &mut node.text_dirty,
                &node.label,
            );
            if let Some(texture) = texture {
                let at = project(hyperbolic, center - Vec2::new(0.0, size * 1.2));
                surface.draw_texture(texture, at, LABEL_HEIGHT);
            }
        }
    }

    fn draw_edge(
        &self,
        edge: &mut EdgeRenderingProperty,
        nodes: &[NodeRenderingProperty],
        ctx: &mut FrameContext<'_>,
    ) -> bool {
        let (Some(source), Some(target)) =
            (nodes.get(edge.render_source.0), nodes.get(edge.render_target.0))
        else {
            return false;
        };
        let start = source.draw_position;
        let end = target.draw_position;
        let span = end - start;
        let length = span.length();
        if length <= f32::EPSILON {
            return false;
        }

        let curved = edge.deviation.abs() > STRAIGHT_DEVIATION;
        let control = if curved {
            (start + end) / 2.0 + span.perp().normalized_or_zero() * (edge.deviation * length / 2.0)
        } else {
            (start + end) / 2.0
        };
        let toward_end = (end - control).normalized_or_zero();
        let tip = end - toward_end * target.size;

        let hyperbolic = ctx.hyperbolic;
        let render = ctx.is_render();
        let surface = &mut *ctx.surface;

        surface.set_color(edge.stroke_color);
        surface.set_line_width(edge.width);
        surface.set_line_dash(edge.dashed);
        surface.begin(Primitive::LineStrip);
        let segments = if curved || hyperbolic.is_some() { CURVE_SEGMENTS } else { 1 };
        for i in 0..=segments {
            let t = i as f32 / segments as f32;
            let p = project(hyperbolic, quadratic(start, control, tip, t));
            surface.vertex(p.x, p.y);
        }
        surface.end();
        surface.set_line_dash(false);

        if render && edge.arrow_head != ArrowHead::None {
            let side = toward_end.perp() * ARROW_HALF_WIDTH;
            let base = tip - toward_end * ARROW_LENGTH;
            let left = project(hyperbolic, base + side);
            let right = project(hyperbolic, base - side);
            let point = project(hyperbolic, tip);
            let primitive = match edge.arrow_head {
                ArrowHead::Filled => Primitive::Polygon,
                _ => Primitive::LineStrip,
            };
            surface.begin(primitive);
            for p in [left, point, right] {
                surface.vertex(p.x, p.y);
            }
            surface.end();
        }

        if render && edge.label_visible {
            let texture = refresh_texture(
                surface,
                &mut edge.label_texture,
                &mut edge.text_dirty,
                &edge.label,
            );
            if let Some(texture) = texture {
                let at = project(hyperbolic, quadratic(start, control, tip, 0.5));
                surface.draw_texture(texture, at, LABEL_HEIGHT);
            }
        }
        true
    }
}

impl RenderingPlugin for DrawPlugin {
    fn name(&self) -> &'static str {
        "draw"
    }

    fn node_stage(&self) -> Option<NodeStage> {
        Some(NodeStage::Draw)
    }

    fn edge_stage(&self) -> Option<EdgeStage> {
        Some(EdgeStage::Draw)
    }

    fn apply_node(&mut self, node: &mut NodeRenderingProperty, ctx: &mut FrameContext<'_>) -> bool {
        ctx.surface.load_name(node.pick_id.0);
        self.draw_node(node, ctx);
        true
    }

    fn apply_edge(
        &mut self,
        edge: &mut EdgeRenderingProperty,
        nodes: &[NodeRenderingProperty],
        ctx: &mut FrameContext<'_>,
    ) -> bool {
        ctx.surface.load_name(edge.pick_id.0);
        self.draw_edge(edge, nodes, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewConfig;
    use crate::pipeline::FrameMode;
    use crate::property::{NodeIndex, RenderingModel};
    use crate::surface::{DrawCall, RecordingSurface};
    use depan_core::{DependencyGraph, Edge, EdgeId, InMemoryDisplayRepository, Node, NodeId, RelationId};
    use glam::DMat4;

    fn model() -> RenderingModel {
        let nodes = (0..2)
            .map(|i| Node {
                id: NodeId(i),
                kind: String::new(),
                name: format!("n{i}"),
            })
            .collect();
        let edges = vec![Edge {
            id: EdgeId(0),
            source: NodeId(0),
            target: NodeId(1),
            relation: RelationId(0),
        }];
        let mut m = RenderingModel::from_graph(
            &DependencyGraph::from_parts(nodes, edges),
            &InMemoryDisplayRepository::new(),
            &ViewConfig::default(),
        );
        m.nodes_mut()[0].draw_position = Vec2::new(0.0, 0.0);
        m.nodes_mut()[1].draw_position = Vec2::new(10.0, 0.0);
        m
    }

    fn ctx(surface: &mut RecordingSurface, mode: FrameMode) -> FrameContext<'_> {
        FrameContext {
            mode,
            surface,
            selection_active: false,
            hyperbolic: None,
            frame: 0,
        }
    }

    #[test]
    fn test_node_is_drawn_at_its_position() {
        let mut m = model();
        let mut surface = RecordingSurface::new();
        surface.begin_frame(&DMat4::IDENTITY, &DMat4::IDENTITY);
        let mut plugin = DrawPlugin::new();
        let pick = m.nodes()[1].pick_id.0;
        {
            let mut c = ctx(&mut surface, FrameMode::Render);
            plugin.apply_node(&mut m.nodes_mut()[1], &mut c);
        }
        let drawn = surface.primitives_named(pick);
        assert_eq!(drawn.len(), 2);
        let DrawCall::Primitive { vertices, .. } = drawn[0] else {
            panic!("expected a primitive");
        };
        let center = vertices.iter().fold(Vec2::ZERO, |acc, v| acc + *v) / vertices.len() as f32;
        assert!(center.distance(Vec2::new(10.0, 0.0)) < 1e-3);
    }

    #[test]
    fn test_select_pass_skips_strokes_and_labels() {
        let mut m = model();
        m.nodes_mut()[0].set_label("n0");
        m.nodes_mut()[0].label_visible = true;
        let mut surface = RecordingSurface::new();
        surface.begin_frame(&DMat4::IDENTITY, &DMat4::IDENTITY);
        let mut plugin = DrawPlugin::new();
        let pick = m.nodes()[0].pick_id.0;
        {
            let mut c = ctx(&mut surface, FrameMode::Select);
            plugin.apply_node(&mut m.nodes_mut()[0], &mut c);
        }
        assert_eq!(surface.primitives_named(pick).len(), 1);
        assert_eq!(surface.stats().textures_created, 0);
    }

    #[test]
    fn test_label_texture_is_reused_until_text_changes() {
        let mut m = model();
        let mut surface = RecordingSurface::new();
        let mut plugin = DrawPlugin::new();
        m.nodes_mut()[0].set_label("first");
        m.nodes_mut()[0].label_visible = true;
        for _ in 0..3 {
            surface.begin_frame(&DMat4::IDENTITY, &DMat4::IDENTITY);
            let mut c = ctx(&mut surface, FrameMode::Render);
            plugin.apply_node(&mut m.nodes_mut()[0], &mut c);
        }
        assert_eq!(surface.stats().textures_created, 1);

        m.nodes_mut()[0].set_label("second");
        surface.begin_frame(&DMat4::IDENTITY, &DMat4::IDENTITY);
        {
            let mut c = ctx(&mut surface, FrameMode::Render);
            plugin.apply_node(&mut m.nodes_mut()[0], &mut c);
        }
        assert_eq!(surface.stats().textures_created, 2);
        assert_eq!(surface.live_textures(), 1);
        let texture = m.nodes()[0].label_texture.unwrap();
        assert_eq!(surface.texture_text(texture), Some("second"));
    }

    #[test]
    fn test_edge_stops_at_target_boundary() {
        let mut m = model();
        m.nodes_mut()[1].size = 2.0;
        let mut surface = RecordingSurface::new();
        surface.begin_frame(&DMat4::IDENTITY, &DMat4::IDENTITY);
        let mut plugin = DrawPlugin::new();
        let (nodes, edges) = m.parts_mut();
        let edge = &mut edges[0];
        edge.render_source = NodeIndex(0);
        edge.render_target = NodeIndex(1);
        let pick = edge.pick_id.0;
        {
            let mut c = ctx(&mut surface, FrameMode::Render);
            assert!(plugin.apply_edge(edge, nodes, &mut c));
        }
        let drawn = surface.primitives_named(pick);
        assert_eq!(drawn.len(), 2, "line and arrow head");
        let DrawCall::Primitive { vertices, .. } = drawn[0] else {
            panic!("expected a primitive");
        };
        let last = vertices[vertices.len() - 1];
        assert!(last.distance(Vec2::new(8.0, 0.0)) < 1e-3);
    }

    #[test]
    fn test_zero_length_edge_is_skipped() {
        let mut m = model();
        m.nodes_mut()[1].draw_position = Vec2::ZERO;
        let mut surface = RecordingSurface::new();
        let mut plugin = DrawPlugin::new();
        let (nodes, edges) = m.parts_mut();
        let mut c = ctx(&mut surface, FrameMode::Render);
        assert!(!plugin.apply_edge(&mut edges[0], nodes, &mut c));
    }
}
