use super::circle::pre_order;
use super::{LayoutContext, LayoutGenerator};
use depan_core::{NodeId, Vec2};
use std::collections::HashMap;
use std::f32::consts::TAU;

/// Layered top-down tree. Roots on the first layer, each child one layer
/// below its parent; crossings are reduced with barycenter ordering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeLayout {
    pub layer_spacing: f32,
    pub node_spacing: f32,
    pub passes: usize,
}

impl Default for TreeLayout {
    fn default() -> Self {
        Self {
            layer_spacing: 2.0,
            node_spacing: 1.5,
            passes: 2,
        }
    }
}

impl TreeLayout {
    fn build_layers(ctx: &LayoutContext) -> Vec<Vec<NodeId>> {
        let mut layers: Vec<Vec<NodeId>> = Vec::new();
        for node in pre_order(ctx) {
            let depth = ctx.hierarchy.depth(node);
            if layers.len() <= depth {
                layers.resize_with(depth + 1, Vec::new);
            }
            layers[depth].push(node);
        }
        layers
    }

    fn assign_coords(layer: &[NodeId], coords: &mut HashMap<NodeId, f32>, spacing: f32) {
        for (j, node) in layer.iter().enumerate() {
            coords.insert(*node, j as f32 * spacing);
        }
    }

    fn order_layer_by_barycenter(
        layer: &mut [NodeId],
        coords: &HashMap<NodeId, f32>,
        neighbors: impl Fn(NodeId) -> Vec<NodeId>,
    ) {
        let barycenters: HashMap<NodeId, f32> = layer
            .iter()
            .map(|node| {
                let linked: Vec<f32> = neighbors(*node)
                    .iter()
                    .filter_map(|n| coords.get(n).copied())
                    .collect();
                let center = if linked.is_empty() {
                    coords.get(node).copied().unwrap_or(0.0)
                } else {
                    linked.iter().sum::<f32>() / linked.len() as f32
                };
                (*node, center)
            })
            .collect();

        layer.sort_by(|a, b| {
            barycenters
                .get(a)
                .unwrap_or(&0.0)
                .partial_cmp(barycenters.get(b).unwrap_or(&0.0))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    fn run_barycenter_passes(&self, ctx: &LayoutContext, layers: &mut [Vec<NodeId>]) {
        let spacing = self.node_spacing;
        let mut coords = HashMap::new();
        for layer in layers.iter() {
            Self::assign_coords(layer, &mut coords, spacing);
        }
        let parent = |n: NodeId| ctx.hierarchy.parent(n).into_iter().collect::<Vec<_>>();
        let children = |n: NodeId| ctx.hierarchy.children(n).to_vec();

        for _ in 0..self.passes {
            for layer in layers.iter_mut().skip(1) {
                Self::order_layer_by_barycenter(layer, &coords, parent);
                Self::assign_coords(layer, &mut coords, spacing);
            }
            let below = layers.len().saturating_sub(1);
            for layer in layers[..below].iter_mut().rev() {
                Self::order_layer_by_barycenter(layer, &coords, children);
                Self::assign_coords(layer, &mut coords, spacing);
            }
        }
    }
}

impl LayoutGenerator for TreeLayout {
    fn name(&self) -> &'static str {
        "tree"
    }

    fn execute(&self, ctx: &LayoutContext) -> HashMap<NodeId, Vec2> {
        let mut layers = Self::build_layers(ctx);
        self.run_barycenter_passes(ctx, &mut layers);

        let mut out = HashMap::with_capacity(ctx.movable.len());
        for (depth, layer) in layers.iter().enumerate() {
            let half = (layer.len() as f32 - 1.0) / 2.0;
            let y = -(depth as f32) * self.layer_spacing;
            for (j, node) in layer.iter().enumerate() {
                out.insert(*node, Vec2::new((j as f32 - half) * self.node_spacing, y));
            }
        }
        out
    }
}

/// Concentric rings around the root, each subtree in its own angular
/// sector sized by its leaf count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialLayout {
    pub ring_spacing: f32,
}

impl Default for RadialLayout {
    fn default() -> Self {
        Self { ring_spacing: 2.0 }
    }
}

impl LayoutGenerator for RadialLayout {
    fn name(&self) -> &'static str {
        "radial"
    }

    fn execute(&self, ctx: &LayoutContext) -> HashMap<NodeId, Vec2> {
        let tree = &ctx.hierarchy;
        let mut leaves: HashMap<NodeId, f32> = HashMap::new();
        for node in tree.post_order() {
            let below: f32 = tree
                .children(node)
                .iter()
                .map(|c| leaves.get(c).copied().unwrap_or(1.0))
                .sum();
            leaves.insert(node, below.max(1.0));
        }
        let weight = |n: &NodeId| leaves.get(n).copied().unwrap_or(1.0);

        let roots = tree.roots();
        // A lone root sits in the middle; several share the first ring.
        let first_ring = if roots.len() == 1 { 0 } else { 1 };
        let mut out = HashMap::with_capacity(ctx.movable.len());
        let mut stack: Vec<(NodeId, f32, f32, usize)> = Vec::new();

        let push_sector = |stack: &mut Vec<(NodeId, f32, f32, usize)>,
                           nodes: &[NodeId],
                           start: f32,
                           sweep: f32,
                           ring: usize| {
            let total: f32 = nodes.iter().map(weight).sum();
            let mut angle = start;
            for node in nodes {
                let share = if total > 0.0 { sweep * weight(node) / total } else { 0.0 };
                stack.push((*node, angle, share, ring));
                angle += share;
            }
        };

        push_sector(&mut stack, &roots, 0.0, TAU, first_ring);
        while let Some((node, start, sweep, ring)) = stack.pop() {
            let position = if ring == 0 {
                Vec2::ZERO
            } else {
                let angle = start + sweep / 2.0;
                let radius = ring as f32 * self.ring_spacing;
                Vec2::new(angle.cos() * radius, angle.sin() * radius)
            };
            out.insert(node, position);
            push_sector(&mut stack, tree.children(node), start, sweep, ring + 1);
        }
        out
    }
}
