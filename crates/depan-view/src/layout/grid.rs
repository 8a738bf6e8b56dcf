use super::{LayoutContext, LayoutGenerator};
use depan_core::{NodeId, Vec2};
use std::collections::HashMap;

/// Row-major square grid in movable order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub spacing: f32,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self { spacing: 1.0 }
    }
}

impl LayoutGenerator for GridLayout {
    fn name(&self) -> &'static str {
        "grid"
    }

    fn execute(&self, ctx: &LayoutContext) -> HashMap<NodeId, Vec2> {
        let columns = (ctx.movable.len() as f32).sqrt().ceil().max(1.0) as usize;
        ctx.movable
            .iter()
            .enumerate()
            .map(|(i, node)| {
                let (row, column) = (i / columns, i % columns);
                (
                    *node,
                    Vec2::new(column as f32 * self.spacing, -(row as f32) * self.spacing),
                )
            })
            .collect()
    }
}
