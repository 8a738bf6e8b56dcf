//! Per-frame rendering pipeline.
//!
//! Every frame walks each node, then each edge, through an ordered list of
//! plugins. A plugin returning `false` ends that element's walk for the
//! frame: the element is not drawn. Stage order is fixed by [`NodeStage`]
//! and [`EdgeStage`]; plugins are sorted into it when registered, keeping
//! registration order among plugins of the same stage.

mod collapse;
mod color;
mod draw;
mod factor;
mod include;
mod label;
mod layout;
mod shape;
mod size;
mod stepper;
mod stroke;

pub use collapse::CollapsePlugin;
pub use color::ColorPlugin;
pub use draw::DrawPlugin;
pub use factor::FactorPlugin;
pub use include::IncludePlugin;
pub use label::LabelPlugin;
pub use layout::LayoutPlugin;
pub use shape::ShapePlugin;
pub use size::SizePlugin;
pub use stepper::StepperPlugin;
pub use stroke::StrokePlugin;

use crate::config::ViewConfig;
use crate::hyperbolic::HyperbolicProjection;
use crate::interaction::{Key, Modifiers};
use crate::property::{EdgeRenderingProperty, NodeRenderingProperty, RenderingModel};
use crate::surface::DrawingSurface;
use depan_core::RelationRegistry;
use std::any::Any;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeStage {
    Layout,
    Collapse,
    Color,
    Size,
    Stroke,
    Shape,
    Label,
    ScaleFactor,
    Stepper,
    Draw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EdgeStage {
    Include,
    Layout,
    Collapse,
    Color,
    Label,
    Stepper,
    Draw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameMode {
    Render,
    /// Pick pass: draws pick names only and never advances animation.
    Select,
}

pub struct FrameContext<'a> {
    pub mode: FrameMode,
    pub surface: &'a mut dyn DrawingSurface,
    /// Whether any node is selected this frame.
    pub selection_active: bool,
    pub hyperbolic: Option<HyperbolicProjection>,
    pub frame: u64,
}

impl FrameContext<'_> {
    pub fn is_render(&self) -> bool {
        self.mode == FrameMode::Render
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub nodes_drawn: usize,
    pub nodes_skipped: usize,
    pub edges_drawn: usize,
    pub edges_skipped: usize,
}

/// Upcast helper so the pipeline can hand out concrete plugin types.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub trait RenderingPlugin: AsAny {
    fn name(&self) -> &'static str;

    fn node_stage(&self) -> Option<NodeStage> {
        None
    }

    fn edge_stage(&self) -> Option<EdgeStage> {
        None
    }

    fn pre_frame(&mut self, _ctx: &mut FrameContext<'_>) {}

    /// Runs after every element, whether or not any walk was cut short.
    fn post_frame(&mut self, _ctx: &mut FrameContext<'_>) {}

    /// Called once before the dry-run element walks.
    fn begin_dry_run(&mut self) {}

    fn dry_run_node(&mut self, _node: &NodeRenderingProperty) {}

    fn dry_run_edge(&mut self, _edge: &EdgeRenderingProperty, _nodes: &[NodeRenderingProperty]) {}

    fn apply_node(&mut self, _node: &mut NodeRenderingProperty, _ctx: &mut FrameContext<'_>) -> bool {
        true
    }

    fn apply_edge(
        &mut self,
        _edge: &mut EdgeRenderingProperty,
        _nodes: &[NodeRenderingProperty],
        _ctx: &mut FrameContext<'_>,
    ) -> bool {
        true
    }

    fn key_pressed(&mut self, _key: Key, _modifiers: Modifiers) -> bool {
        false
    }
}

#[derive(Default)]
pub struct RenderingPipeline {
    plugins: Vec<Box<dyn RenderingPlugin>>,
    node_order: Vec<usize>,
    edge_order: Vec<usize>,
    dirty: bool,
}

impl std::fmt::Debug for RenderingPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.plugins.iter().map(|p| p.name()).collect();
        f.debug_struct("RenderingPipeline")
            .field("plugins", &names)
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl RenderingPipeline {
    pub fn new() -> Self {
        Self {
            dirty: true,
            ..Default::default()
        }
    }

    /// The full plugin set used by the graph view.
    pub fn standard(config: &ViewConfig, relations: &RelationRegistry) -> Self {
        let mut pipeline = Self::new();
        pipeline.register(Box::new(LayoutPlugin::new()));
        pipeline.register(Box::new(CollapsePlugin));
        pipeline.register(Box::new(IncludePlugin::new()));
        pipeline.register(Box::new(ColorPlugin::new(config)));
        pipeline.register(Box::new(SizePlugin::new(config)));
        pipeline.register(Box::new(StrokePlugin::new(config)));
        pipeline.register(Box::new(ShapePlugin::new(config)));
        pipeline.register(Box::new(LabelPlugin::new(config, relations)));
        pipeline.register(Box::new(FactorPlugin::new()));
        pipeline.register(Box::new(StepperPlugin::new(config.settle_epsilon)));
        pipeline.register(Box::new(DrawPlugin::new()));
        pipeline
    }

    pub fn register(&mut self, plugin: Box<dyn RenderingPlugin>) {
        self.plugins.push(plugin);
        self.rebuild_order();
        self.dirty = true;
    }

    fn rebuild_order(&mut self) {
        let mut nodes: Vec<(NodeStage, usize)> = self
            .plugins
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.node_stage().map(|s| (s, i)))
            .collect();
        nodes.sort_by_key(|(stage, _)| *stage);
        self.node_order = nodes.into_iter().map(|(_, i)| i).collect();

        let mut edges: Vec<(EdgeStage, usize)> = self
            .plugins
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.edge_stage().map(|s| (s, i)))
            .collect();
        edges.sort_by_key(|(stage, _)| *stage);
        self.edge_order = edges.into_iter().map(|(_, i)| i).collect();
    }

    /// Plugin names in node walk order.
    pub fn node_walk(&self) -> Vec<&'static str> {
        self.node_order.iter().map(|i| self.plugins[*i].name()).collect()
    }

    /// Plugin names in edge walk order.
    pub fn edge_walk(&self) -> Vec<&'static str> {
        self.edge_order.iter().map(|i| self.plugins[*i].name()).collect()
    }

    pub fn plugin<T: RenderingPlugin + 'static>(&self) -> Option<&T> {
        self.plugins
            .iter()
            .find_map(|p| (**p).as_any().downcast_ref::<T>())
    }

    pub fn plugin_mut<T: RenderingPlugin + 'static>(&mut self) -> Option<&mut T> {
        self.plugins
            .iter_mut()
            .find_map(|p| (**p).as_any_mut().downcast_mut::<T>())
    }

    /// Force a dry run before the next frame.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn dry_run(&mut self, model: &RenderingModel) {
        for plugin in &mut self.plugins {
            plugin.begin_dry_run();
        }
        for node in model.nodes() {
            for plugin in &mut self.plugins {
                plugin.dry_run_node(node);
            }
        }
        for edge in model.edges() {
            for plugin in &mut self.plugins {
                plugin.dry_run_edge(edge, model.nodes());
            }
        }
        self.dirty = false;
        tracing::debug!(
            nodes = model.node_count(),
            edges = model.edge_count(),
            "Pipeline dry run"
        );
    }

    pub fn render_frame(
        &mut self,
        model: &mut RenderingModel,
        ctx: &mut FrameContext<'_>,
    ) -> FrameStats {
        for plugin in &mut self.plugins {
            plugin.pre_frame(ctx);
        }
        if self.dirty {
            self.dry_run(model);
        }

        let mut stats = FrameStats::default();
        let (nodes, edges) = model.parts_mut();
        for node in nodes.iter_mut() {
            let drawn = self
                .node_order
                .iter()
                .all(|&i| self.plugins[i].apply_node(node, ctx));
            if drawn {
                stats.nodes_drawn += 1;
            } else {
                stats.nodes_skipped += 1;
            }
        }

        let nodes: &[NodeRenderingProperty] = nodes;
        for edge in edges.iter_mut() {
            let drawn = self
                .edge_order
                .iter()
                .all(|&i| self.plugins[i].apply_edge(edge, nodes, ctx));
            if drawn {
                stats.edges_drawn += 1;
            } else {
                stats.edges_skipped += 1;
            }
        }

        for plugin in &mut self.plugins {
            plugin.post_frame(ctx);
        }
        tracing::trace!(?stats, frame = ctx.frame, "Frame rendered");
        stats
    }

    /// Offer a key to each plugin in registration order until one claims it.
    pub fn key_pressed(&mut self, key: Key, modifiers: Modifiers) -> bool {
        for plugin in &mut self.plugins {
            if plugin.key_pressed(key, modifiers) {
                tracing::debug!(plugin = plugin.name(), ?key, "Key handled");
                self.dirty = true;
                return true;
            }
        }
        false
    }
}
