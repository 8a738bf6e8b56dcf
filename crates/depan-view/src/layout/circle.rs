use super::{LayoutContext, LayoutGenerator};
use depan_core::{NodeId, Vec2};
use std::collections::HashMap;
use std::f32::consts::TAU;

/// Nodes evenly spaced on one circle, hierarchy neighbours kept adjacent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleLayout {
    /// Arc length between neighbouring nodes.
    pub spacing: f32,
}

impl Default for CircleLayout {
    fn default() -> Self {
        Self { spacing: 1.0 }
    }
}

/// Depth-first pre-order over the hierarchy forest.
pub(super) fn pre_order(ctx: &LayoutContext) -> Vec<NodeId> {
    let mut out = Vec::with_capacity(ctx.movable.len());
    for root in ctx.hierarchy.roots() {
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(ctx.hierarchy.children(node).iter().rev().copied());
        }
    }
    out
}

impl LayoutGenerator for CircleLayout {
    fn name(&self) -> &'static str {
        "circle"
    }

    fn execute(&self, ctx: &LayoutContext) -> HashMap<NodeId, Vec2> {
        let order = pre_order(ctx);
        let n = order.len().max(1) as f32;
        let radius = (n * self.spacing / TAU).max(self.spacing);
        order
            .into_iter()
            .enumerate()
            .map(|(i, node)| {
                let angle = TAU * i as f32 / n;
                (node, Vec2::new(angle.cos() * radius, angle.sin() * radius))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::graph;
    use super::*;
    use depan_core::{EdgeMatcher, Rect};

    #[test]
    fn test_all_nodes_share_one_radius() {
        let g = graph(8, &[(0, 1), (0, 2), (2, 3)]);
        let movable: Vec<NodeId> = g.node_ids().collect();
        let ctx = LayoutContext::build(&g, &movable, &EdgeMatcher::all(), HashMap::new(), Rect::from_center_size(Vec2::ZERO, Vec2::new(1.0, 1.0)));
        let out = CircleLayout::default().execute(&ctx);
        assert_eq!(out.len(), 8);
        let r = out[&NodeId(0)].length();
        for p in out.values() {
            assert!((p.length() - r).abs() < 1e-4);
        }
        assert_eq!(pre_order(&ctx)[..4], [NodeId(0), NodeId(1), NodeId(2), NodeId(3)]);
    }
}
