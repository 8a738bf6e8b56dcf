//! The interactive graph view.
//!
//! [`GraphView`] owns everything one open graph needs on the UI thread: the
//! rendering model, the plugin pipeline, the camera, the selection and
//! collapse state, and the listener lists that tell the rest of the
//! application what changed. It is not `Send`; the only work that happens on
//! another thread is the repaint ticker in [`crate::render_loop`].

use crate::camera::{ProjectionMode, SceneCamera};
use crate::collapse::CollapseManager;
use crate::color_map::ColorMap;
use crate::config::{LabelMode, NodeColorMode, NodeShapeMode, NodeSizeMode, ViewConfig};
use crate::error::ViewError;
use crate::hierarchy::HierarchyTree;
use crate::hyperbolic::HyperbolicProjection;
use crate::interaction::{
    Key, Modifiers, MouseButton, MouseController, MouseState, SceneTarget, SelectionMode,
    camera_key,
};
use crate::layout::{GridLayout, LayoutContext, LayoutGenerator, LayoutKind, LayoutScaler, run_layout};
use crate::picking::{PickRegion, SelectionSurface, pick_capacity};
use crate::pipeline::{
    ColorPlugin, FrameContext, FrameMode, FrameStats, IncludePlugin, LabelPlugin,
    RenderingPipeline, ShapePlugin, SizePlugin, StepperPlugin,
};
use crate::property::{NodeIndex, PickId, PickKind, RenderingModel};
use crate::render_loop::HostMessage;
use crate::selection::SelectionModel;
use crate::stats::NodeStatistics;
use crate::surface::DrawingSurface;
use crossbeam_channel::Receiver;
use depan_core::{
    CollapseData, Color, DependencyGraph, DisplayPropertyRepository, EdgeMatcher, NodeId,
    NodeDisplayProperty, Rect, RelationId, RelationRegistry, ShapeKind, Vec2,
};
use depan_events::{
    Author, CollapseEvent, ErrorSink, ListenerHandle, ListenerList, LocationEvent, LocationKind,
    LogErrorSink, SelectionChange, SelectionEvent,
};
use glam::DVec2;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Spacing of the fallback grid, in multiples of the largest node size.
const PLACEMENT_SPACING: f32 = 2.5;

pub struct GraphView {
    graph: DependencyGraph,
    relations: RelationRegistry,
    config: ViewConfig,
    model: RenderingModel,
    pipeline: RenderingPipeline,
    camera: SceneCamera,
    selection: SelectionModel,
    collapse: CollapseManager,
    statistics: NodeStatistics,
    mouse: MouseController,
    author: Author,
    selection_listeners: ListenerList<SelectionEvent>,
    location_listeners: ListenerList<LocationEvent>,
    collapse_listeners: ListenerList<CollapseEvent>,
    error_sink: Box<dyn ErrorSink>,
    /// Nodes dragged since the last mouse-down.
    dragged: BTreeMap<NodeId, Vec2>,
    frame: u64,
    disposed: bool,
}

impl std::fmt::Debug for GraphView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphView")
            .field("author", &self.author)
            .field("nodes", &self.model.node_count())
            .field("edges", &self.model.edge_count())
            .field("selected", &self.selection.len())
            .field("groups", &self.collapse.len())
            .field("frame", &self.frame)
            .field("disposed", &self.disposed)
            .finish()
    }
}

impl GraphView {
    /// Open a view of `graph` in a `width` x `height` pixel viewport.
    ///
    /// Stored display properties seed the model. Nodes without a stored
    /// position are placed on a grid, and the camera starts fitted to the
    /// whole graph.
    pub fn open(
        graph: DependencyGraph,
        relations: RelationRegistry,
        repository: &dyn DisplayPropertyRepository,
        config: ViewConfig,
        width: u32,
        height: u32,
    ) -> Self {
        let config = config.validated();
        let mut model = RenderingModel::from_graph(&graph, repository, &config);
        place_unpositioned(&graph, &mut model, repository, &config);

        let statistics = NodeStatistics::compute(&model);
        for node in model.nodes_mut() {
            node.rank_ratio = statistics.rank_ratio(node.index);
        }

        let mut camera = SceneCamera::new(width, height);
        if let Some(radius) = config.hyperbolic_radius {
            match HyperbolicProjection::new(radius) {
                Some(h) => camera.set_projection_mode(ProjectionMode::Hyperbolic(h)),
                None => tracing::warn!(radius, "Invalid hyperbolic radius; using planar projection"),
            }
        }
        if let Some(bounds) = model.bounds() {
            camera.zoom_to_fit(bounds);
        }
        camera.jump_to_targets();

        let pipeline = RenderingPipeline::standard(&config, &relations);
        let author = Author::new();
        tracing::info!(
            %author,
            nodes = model.node_count(),
            edges = model.edge_count(),
            "Opened graph view"
        );

        Self {
            graph,
            relations,
            config,
            model,
            pipeline,
            camera,
            selection: SelectionModel::new(),
            collapse: CollapseManager::new(),
            statistics,
            mouse: MouseController::new(),
            author,
            selection_listeners: ListenerList::new(),
            location_listeners: ListenerList::new(),
            collapse_listeners: ListenerList::new(),
            error_sink: Box::new(LogErrorSink),
            dragged: BTreeMap::new(),
            frame: 0,
            disposed: false,
        }
    }

    pub fn author(&self) -> Author {
        self.author
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn relations(&self) -> &RelationRegistry {
        &self.relations
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn model(&self) -> &RenderingModel {
        &self.model
    }

    pub fn pipeline(&self) -> &RenderingPipeline {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut RenderingPipeline {
        &mut self.pipeline
    }

    pub fn camera(&self) -> &SceneCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut SceneCamera {
        &mut self.camera
    }

    pub fn statistics(&self) -> &NodeStatistics {
        &self.statistics
    }

    pub fn collapse_manager(&self) -> &CollapseManager {
        &self.collapse
    }

    pub fn mouse_state(&self) -> MouseState {
        self.mouse.state()
    }

    pub fn rubber_band(&self) -> Option<((f64, f64), (f64, f64))> {
        self.mouse.rubber_band()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Whether another frame would still move something on screen.
    pub fn is_animating(&self) -> bool {
        let nodes = self
            .pipeline
            .plugin::<StepperPlugin>()
            .is_some_and(StepperPlugin::is_animating);
        // edits made since the last frame have not been stepped yet
        let epsilon = self.config.settle_epsilon;
        let unsettled = self
            .model
            .nodes()
            .iter()
            .any(|n| n.is_visible() && n.collapsed_under.is_none() && n.is_animating(epsilon));
        nodes || unsettled || !self.camera.is_settled(self.config.settle_epsilon as f64)
    }

    // ----- frames -----

    /// Draw one frame and advance every animation by one step.
    pub fn render_frame(&mut self, surface: &mut dyn DrawingSurface) -> FrameStats {
        if self.disposed {
            tracing::debug!("Frame requested after dispose; ignored");
            return FrameStats::default();
        }
        self.camera.step();
        surface.begin_frame(&self.camera.projection_matrix(), &self.camera.view_matrix());
        let mut ctx = FrameContext {
            mode: FrameMode::Render,
            surface,
            selection_active: !self.selection.is_empty(),
            hyperbolic: self.camera.hyperbolic(),
            frame: self.frame,
        };
        let stats = self.pipeline.render_frame(&mut self.model, &mut ctx);
        ctx.surface.end_frame();
        self.frame += 1;
        stats
    }

    /// Drain the host queue, rendering at most one frame for any number of
    /// queued repaints. Returns the number of frames drawn.
    pub fn pump(
        &mut self,
        queue: &Receiver<HostMessage>,
        surface: &mut dyn DrawingSurface,
    ) -> Result<usize, ViewError> {
        if self.disposed {
            return Err(ViewError::Disposed);
        }
        let mut repaint = false;
        for message in queue.try_iter() {
            match message {
                HostMessage::Repaint => repaint = true,
                HostMessage::Dispose => {
                    self.dispose(surface);
                    return Ok(0);
                }
            }
        }
        if !repaint {
            return Ok(0);
        }
        self.render_frame(surface);
        Ok(1)
    }

    pub fn resize(&mut self, surface: &mut dyn DrawingSurface, width: u32, height: u32) {
        self.camera.resize(width, height);
        surface.resize(width, height);
    }

    /// Release label textures and the surface. Later frames draw nothing.
    pub fn dispose(&mut self, surface: &mut dyn DrawingSurface) {
        if self.disposed {
            return;
        }
        let (nodes, edges) = self.model.parts_mut();
        let textures = nodes
            .iter_mut()
            .filter_map(|n| n.label_texture.take())
            .chain(edges.iter_mut().filter_map(|e| e.label_texture.take()));
        for texture in textures {
            surface.release_texture(texture);
        }
        surface.dispose();
        self.disposed = true;
        tracing::info!(author = %self.author, frames = self.frame, "Graph view disposed");
    }

    // ----- picking -----

    pub fn pick_objects_at(&mut self, x: f64, y: f64) -> Vec<PickId> {
        let (_, height) = self.camera.viewport();
        let region = PickRegion::around(x, y, self.config.pick_tolerance as f64, height as f64);
        self.pick(region)
    }

    pub fn pick_rectangle(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<PickId> {
        let (_, height) = self.camera.viewport();
        self.pick(PickRegion::spanning(x0, y0, x1, y1, height as f64))
    }

    /// Run a select-mode frame over `region`; hits in draw order, each once.
    fn pick(&mut self, region: PickRegion) -> Vec<PickId> {
        if self.disposed {
            return Vec::new();
        }
        let (width, height) = self.camera.viewport();
        let capacity = pick_capacity(self.model.node_count(), self.model.edge_count());
        let mut surface = SelectionSurface::new(region, width, height, capacity);
        surface.begin_frame(&self.camera.projection_matrix(), &self.camera.view_matrix());
        let mut ctx = FrameContext {
            mode: FrameMode::Select,
            surface: &mut surface,
            selection_active: !self.selection.is_empty(),
            hyperbolic: self.camera.hyperbolic(),
            frame: self.frame,
        };
        self.pipeline.render_frame(&mut self.model, &mut ctx);

        let mut seen = HashSet::new();
        surface
            .finish()
            .names()
            .into_iter()
            .map(PickId)
            .filter(|p| p.kind() != PickKind::Unused && seen.insert(*p))
            .collect()
    }

    // ----- selection -----

    pub fn set_selection(&mut self, picks: &[PickId]) -> Option<SelectionChange> {
        let change = self.selection.set_selection(&mut self.model, picks)?;
        Some(self.emit_selection(change))
    }

    pub fn extend_selection(&mut self, picks: &[PickId]) -> Option<SelectionChange> {
        let change = self.selection.extend_selection(&mut self.model, picks)?;
        Some(self.emit_selection(change))
    }

    pub fn reduce_selection(&mut self, picks: &[PickId]) -> Option<SelectionChange> {
        let change = self.selection.reduce_selection(&mut self.model, picks)?;
        Some(self.emit_selection(change))
    }

    /// Replace the selection by node id. Unknown ids are ignored.
    pub fn select_nodes(&mut self, nodes: &[NodeId]) -> Option<SelectionChange> {
        let indices = self.indices_of(nodes);
        let change = self.selection.set_nodes(&mut self.model, &indices)?;
        Some(self.emit_selection(change))
    }

    pub fn clear_selection(&mut self) -> Option<SelectionChange> {
        let change = self.selection.clear(&mut self.model)?;
        Some(self.emit_selection(change))
    }

    pub fn selected_nodes(&self) -> Vec<NodeId> {
        self.selection.node_ids(&self.model)
    }

    /// Mirror a selection made elsewhere. Own events and no-ops are ignored,
    /// and nothing is re-broadcast.
    pub fn apply_selection_event(&mut self, event: &SelectionEvent) -> bool {
        if event.author == self.author {
            return false;
        }
        let changed = match &event.change {
            SelectionChange::Changed { current, .. } => {
                let indices = self.indices_of(current);
                self.selection.set_nodes(&mut self.model, &indices)
            }
            SelectionChange::Extended { added } => {
                let indices = self.indices_of(added);
                self.selection.extend_nodes(&mut self.model, &indices)
            }
            SelectionChange::Reduced { removed } => {
                let indices = self.indices_of(removed);
                self.selection.reduce_nodes(&mut self.model, &indices)
            }
        };
        changed.is_some()
    }

    fn indices_of(&self, nodes: &[NodeId]) -> Vec<NodeIndex> {
        nodes.iter().filter_map(|id| self.model.node_index(*id)).collect()
    }

    fn emit_selection(&mut self, change: SelectionChange) -> SelectionChange {
        let event = SelectionEvent {
            author: self.author,
            change,
        };
        self.selection_listeners.dispatch(&event, self.error_sink.as_mut());
        event.change
    }

    // ----- locations and layout -----

    /// Jump nodes to new positions.
    pub fn set_locations(&mut self, moves: &[(NodeId, Vec2)]) -> usize {
        self.move_nodes(LocationKind::Set, moves, true)
    }

    /// Animate nodes toward new positions.
    pub fn edit_locations(&mut self, moves: &[(NodeId, Vec2)]) -> usize {
        self.move_nodes(LocationKind::Edit, moves, true)
    }

    /// Apply a location change from another author. Returns the number of
    /// nodes moved; echoes of this view's own events move nothing.
    pub fn apply_location_event(&mut self, event: &LocationEvent) -> usize {
        if event.author == self.author {
            tracing::trace!("Ignoring own location event");
            return 0;
        }
        self.move_nodes(event.kind, &event.moves, false)
    }

    fn move_nodes(&mut self, kind: LocationKind, moves: &[(NodeId, Vec2)], emit: bool) -> usize {
        let mut applied = Vec::with_capacity(moves.len());
        for (id, position) in moves {
            if !position.is_finite() {
                tracing::debug!(node = %id, "Non-finite location ignored");
                continue;
            }
            let Some(node) = self.model.node_by_id_mut(*id) else {
                continue;
            };
            match kind {
                LocationKind::Set => node.set_position(*position),
                LocationKind::Edit => node.edit_position(*position),
                LocationKind::Update => node.update_position(*position),
            }
            applied.push((*id, *position));
        }
        let count = applied.len();
        if emit && !applied.is_empty() {
            self.emit_locations(kind, applied);
        }
        count
    }

    fn emit_locations(&mut self, kind: LocationKind, moves: Vec<(NodeId, Vec2)>) {
        let event = LocationEvent {
            author: self.author,
            kind,
            moves,
        };
        self.location_listeners.dispatch(&event, self.error_sink.as_mut());
    }

    /// Lay out `movable` (every shown node when `None`) with a named layout.
    pub fn apply_layout(
        &mut self,
        kind: LayoutKind,
        movable: Option<&[NodeId]>,
        matcher: &EdgeMatcher,
    ) -> Vec<(NodeId, Vec2)> {
        let generator = kind.generator();
        self.apply_layout_with(generator.as_ref(), movable, matcher)
    }

    /// Run `generator` over the movable nodes and animate them to the
    /// result. Non-movable nodes never move.
    pub fn apply_layout_with(
        &mut self,
        generator: &dyn LayoutGenerator,
        movable: Option<&[NodeId]>,
        matcher: &EdgeMatcher,
    ) -> Vec<(NodeId, Vec2)> {
        let movable = match movable {
            Some(nodes) => nodes.to_vec(),
            None => self.model.shown_nodes(),
        };
        let ctx = LayoutContext::build(
            &self.graph,
            &movable,
            matcher,
            self.model.target_positions(),
            self.camera.visible_world_rect(),
        );
        let scaler = LayoutScaler::new(self.config.layout_margin);
        let mut moves: Vec<(NodeId, Vec2)> = run_layout(generator, &ctx, &scaler).into_iter().collect();
        moves.sort_by_key(|(id, _)| *id);

        self.move_nodes(LocationKind::Edit, &moves, true);
        tracing::info!(layout = generator.name(), nodes = moves.len(), "Applied layout");
        moves
    }

    // ----- collapse -----

    pub fn collapse(&mut self, master: NodeId, picked: &[NodeId], erase: bool) -> bool {
        let Some((created, erased)) = self.collapse.collapse(&mut self.model, master, picked, erase) else {
            return false;
        };
        self.emit_collapse(vec![created], erased)
    }

    pub fn uncollapse(&mut self, master: NodeId, delete_group: bool) -> bool {
        let Some((group, dissolved)) = self.collapse.uncollapse(&mut self.model, master, delete_group)
        else {
            return false;
        };
        let mut removed = vec![group];
        removed.extend(dissolved);
        self.emit_collapse(Vec::new(), removed)
    }

    /// Collapse every shown subtree of the hierarchy `matcher` defines.
    pub fn collapse_tree(&mut self, matcher: &EdgeMatcher) -> bool {
        let tree = HierarchyTree::from_graph(&self.graph, &self.model.shown_nodes(), matcher);
        let changes = self.collapse.collapse_tree(&mut self.model, &tree);
        self.emit_collapse(changes.created, changes.removed)
    }

    pub fn uncollapse_all(&mut self) -> bool {
        let removed = self.collapse.uncollapse_all(&mut self.model);
        self.emit_collapse(Vec::new(), removed)
    }

    fn emit_collapse(&mut self, created: Vec<CollapseData>, removed: Vec<CollapseData>) -> bool {
        let Some(event) = CollapseEvent::new(self.author, created, removed) else {
            return false;
        };
        self.pipeline.mark_dirty();
        self.collapse_listeners.dispatch(&event, self.error_sink.as_mut());
        true
    }

    // ----- display properties and modes -----

    pub fn set_node_color(&mut self, node: NodeId, color: Option<Color>) -> Result<(), ViewError> {
        self.node_mut(node)?.set_overridden_color(color);
        Ok(())
    }

    pub fn set_node_size(&mut self, node: NodeId, size: Option<f32>) -> Result<(), ViewError> {
        let size = size.filter(|s| s.is_finite() && *s > 0.0);
        self.node_mut(node)?.set_overridden_size(size);
        Ok(())
    }

    pub fn set_node_shape(&mut self, node: NodeId, shape: Option<ShapeKind>) -> Result<(), ViewError> {
        self.node_mut(node)?.set_overridden_shape(shape);
        Ok(())
    }

    pub fn set_node_visible(&mut self, node: NodeId, visible: bool) -> Result<(), ViewError> {
        self.node_mut(node)?.set_visible(visible);
        self.pipeline.mark_dirty();
        Ok(())
    }

    fn node_mut(&mut self, node: NodeId) -> Result<&mut crate::property::NodeRenderingProperty, ViewError> {
        self.model
            .node_by_id_mut(node)
            .ok_or(ViewError::UnknownNode(node))
    }

    pub fn set_relation_visible(&mut self, relation: RelationId, visible: bool) {
        if let Some(include) = self.pipeline.plugin_mut::<IncludePlugin>() {
            include.set_relation_visible(relation, visible);
        }
        self.pipeline.mark_dirty();
    }

    pub fn set_node_color_mode(&mut self, mode: NodeColorMode) {
        if let Some(color) = self.pipeline.plugin_mut::<ColorPlugin>() {
            color.set_mode(mode);
        }
    }

    pub fn set_color_map(&mut self, color_map: ColorMap) {
        if let Some(color) = self.pipeline.plugin_mut::<ColorPlugin>() {
            color.set_color_map(color_map);
        }
    }

    pub fn set_node_size_mode(&mut self, mode: NodeSizeMode) {
        if let Some(size) = self.pipeline.plugin_mut::<SizePlugin>() {
            size.set_mode(mode);
        }
    }

    pub fn set_node_shape_mode(&mut self, mode: NodeShapeMode) {
        if let Some(shape) = self.pipeline.plugin_mut::<ShapePlugin>() {
            shape.set_mode(mode);
        }
    }

    pub fn set_label_modes(&mut self, nodes: LabelMode, edges: LabelMode) {
        if let Some(label) = self.pipeline.plugin_mut::<LabelPlugin>() {
            label.set_node_mode(nodes);
            label.set_edge_mode(edges);
        }
    }

    /// Store every node's target position and overrides in `repository`.
    pub fn write_back(&self, repository: &mut dyn DisplayPropertyRepository) -> usize {
        for node in self.model.nodes() {
            let mut property = repository
                .node_property(node.node)
                .unwrap_or_else(NodeDisplayProperty::default);
            property.position = Some(node.target_position());
            property.color = node.overridden_color();
            property.size = node.overridden_size();
            property.shape = node.overridden_shape();
            property.visible = node.is_visible();
            repository.set_node_property(node.node, property);
        }
        tracing::debug!(nodes = self.model.node_count(), "Wrote display properties back");
        self.model.node_count()
    }

    // ----- input -----

    pub fn mouse_down(&mut self, x: f64, y: f64, button: MouseButton, modifiers: Modifiers) {
        self.dragged.clear();
        let mut mouse = std::mem::take(&mut self.mouse);
        mouse.mouse_down(self, x, y, button, modifiers);
        self.mouse = mouse;
    }

    pub fn mouse_drag(&mut self, x: f64, y: f64) {
        let mut mouse = std::mem::take(&mut self.mouse);
        mouse.mouse_drag(self, x, y);
        self.mouse = mouse;
    }

    pub fn mouse_up(&mut self, x: f64, y: f64) {
        let mut mouse = std::mem::take(&mut self.mouse);
        mouse.mouse_up(self, x, y);
        self.mouse = mouse;
    }

    pub fn mouse_wheel(&mut self, notches: f64) {
        let mut mouse = std::mem::take(&mut self.mouse);
        mouse.mouse_wheel(self, notches);
        self.mouse = mouse;
    }

    /// Escape clears the selection; camera keys come next, then plugins.
    pub fn key_pressed(&mut self, key: Key, modifiers: Modifiers) -> bool {
        if key == Key::Escape {
            self.clear_selection();
            return true;
        }
        camera_key(&mut self.camera, key, modifiers) || self.pipeline.key_pressed(key, modifiers)
    }

    // ----- listeners -----

    pub fn add_selection_listener<F>(&mut self, callback: F) -> ListenerHandle
    where
        F: FnMut(&SelectionEvent) -> anyhow::Result<()> + 'static,
    {
        self.selection_listeners.add(callback)
    }

    pub fn remove_selection_listener(&mut self, handle: ListenerHandle) -> bool {
        self.selection_listeners.remove(handle)
    }

    pub fn add_location_listener<F>(&mut self, callback: F) -> ListenerHandle
    where
        F: FnMut(&LocationEvent) -> anyhow::Result<()> + 'static,
    {
        self.location_listeners.add(callback)
    }

    pub fn remove_location_listener(&mut self, handle: ListenerHandle) -> bool {
        self.location_listeners.remove(handle)
    }

    pub fn add_collapse_listener<F>(&mut self, callback: F) -> ListenerHandle
    where
        F: FnMut(&CollapseEvent) -> anyhow::Result<()> + 'static,
    {
        self.collapse_listeners.add(callback)
    }

    pub fn remove_collapse_listener(&mut self, handle: ListenerHandle) -> bool {
        self.collapse_listeners.remove(handle)
    }

    /// Where listener failures go. Defaults to a warning in the log.
    pub fn set_error_sink(&mut self, sink: Box<dyn ErrorSink>) {
        self.error_sink = sink;
    }
}

impl SceneTarget for GraphView {
    fn pick_objects_at(&mut self, x: f64, y: f64) -> Vec<PickId> {
        GraphView::pick_objects_at(self, x, y)
    }

    fn pick_rectangle(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<PickId> {
        GraphView::pick_rectangle(self, x0, y0, x1, y1)
    }

    fn is_pick_selected(&self, pick: PickId) -> bool {
        self.model
            .pick_to_node(pick)
            .is_some_and(|n| self.selection.contains(n))
    }

    fn apply_selection(&mut self, mode: SelectionMode, picks: &[PickId]) {
        match mode {
            SelectionMode::Replace => self.set_selection(picks),
            SelectionMode::Extend => self.extend_selection(picks),
            SelectionMode::Reduce => self.reduce_selection(picks),
        };
    }

    fn window_to_world(&self, x: f64, y: f64) -> DVec2 {
        self.camera.window_to_world(x, y)
    }

    fn move_selection(&mut self, delta: Vec2) {
        let selected: Vec<NodeIndex> = self.selection.indices().collect();
        for index in selected {
            let Some(node) = self.model.node_mut(index) else {
                continue;
            };
            let position = node.target_position() + delta;
            node.update_position(position);
            self.dragged.insert(node.node, position);
        }
    }

    fn finish_selection_move(&mut self) {
        let moves: Vec<(NodeId, Vec2)> = std::mem::take(&mut self.dragged).into_iter().collect();
        if !moves.is_empty() {
            self.emit_locations(LocationKind::Update, moves);
        }
    }

    fn pan_camera(&mut self, dx: f64, dy: f64) {
        self.camera.pan_by(dx, dy);
    }

    fn rotate_camera(&mut self, dx: f64, dy: f64) {
        self.camera.rotate_by(dx, dy, 0.0);
    }

    fn zoom_camera(&mut self, factor: f64) {
        self.camera.zoom_by(factor);
    }
}

/// Grid-place nodes the repository has no position for, to the right of
/// any already placed nodes.
fn place_unpositioned(
    graph: &DependencyGraph,
    model: &mut RenderingModel,
    repository: &dyn DisplayPropertyRepository,
    config: &ViewConfig,
) {
    let unplaced: Vec<NodeId> = model
        .nodes()
        .iter()
        .map(|n| n.node)
        .filter(|id| {
            repository
                .node_property(*id)
                .and_then(|p| p.position)
                .is_none_or(|p| !p.is_finite())
        })
        .collect();
    if unplaced.is_empty() {
        return;
    }
    let spacing = config.node.max_size.max(config.node.size) * PLACEMENT_SPACING;
    let placed_right = model
        .nodes()
        .iter()
        .filter(|n| !unplaced.contains(&n.node))
        .map(|n| n.target_position().x)
        .fold(None, |acc: Option<f32>, x| Some(acc.map_or(x, |a| a.max(x))));
    let shift = Vec2::new(placed_right.map_or(0.0, |x| x + spacing), 0.0);

    let ctx = LayoutContext::build(
        graph,
        &unplaced,
        &EdgeMatcher::none(),
        HashMap::new(),
        Rect::from_center_size(Vec2::ZERO, Vec2::ZERO),
    );
    let grid = GridLayout { spacing };
    for (id, position) in grid.execute(&ctx) {
        if let Some(node) = model.node_by_id_mut(id) {
            node.set_position(position + shift);
        }
    }
    tracing::debug!(nodes = unplaced.len(), "Placed nodes without a stored position");
}
