//! Layout generators.
//!
//! A generator proposes positions for the movable nodes of a
//! [`LayoutContext`]. [`run_layout`] wraps every generator with the shared
//! guarantees: fixed nodes never move, a lone movable node stays where it
//! is, and the result is fitted into the viewport by a [`LayoutScaler`].

mod circle;
mod force;
mod grid;
mod scaler;
mod tree;

pub use circle::CircleLayout;
pub use force::ForceDirectedLayout;
pub use grid::GridLayout;
pub use scaler::LayoutScaler;
pub use tree::{RadialLayout, TreeLayout};

use crate::error::ViewError;
use crate::hierarchy::HierarchyTree;
use depan_core::{DependencyGraph, EdgeMatcher, NodeId, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Inputs for one layout run.
#[derive(Debug, Clone)]
pub struct LayoutContext {
    /// Nodes the generator may move, in a stable order.
    pub movable: Vec<NodeId>,
    /// Undirected neighbours among the movable nodes.
    pub adjacency: HashMap<NodeId, Vec<NodeId>>,
    /// Oriented forest over the movable nodes.
    pub hierarchy: HierarchyTree,
    /// Current positions of every known node, movable or not.
    pub positions: HashMap<NodeId, Vec2>,
    pub viewport: Rect,
}

impl LayoutContext {
    pub fn build(
        graph: &DependencyGraph,
        movable: &[NodeId],
        matcher: &EdgeMatcher,
        positions: HashMap<NodeId, Vec2>,
        viewport: Rect,
    ) -> Self {
        let mut seen = HashSet::new();
        let movable: Vec<NodeId> = movable
            .iter()
            .copied()
            .filter(|n| graph.contains_node(*n) && seen.insert(*n))
            .collect();

        let mut adjacency: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        let mut linked = HashSet::new();
        for edge in graph.edges.iter().filter(|e| matcher.matches(e)) {
            let (a, b) = (edge.source, edge.target);
            if a == b || !seen.contains(&a) || !seen.contains(&b) {
                continue;
            }
            let key = if a < b { (a, b) } else { (b, a) };
            if linked.insert(key) {
                adjacency.entry(a).or_default().push(b);
                adjacency.entry(b).or_default().push(a);
            }
        }

        let hierarchy = HierarchyTree::from_graph(graph, &movable, matcher);
        Self {
            movable,
            adjacency,
            hierarchy,
            positions,
            viewport,
        }
    }

    pub fn neighbors(&self, node: NodeId) -> &[NodeId] {
        self.adjacency.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn position(&self, node: NodeId) -> Vec2 {
        self.positions.get(&node).copied().unwrap_or(Vec2::ZERO)
    }
}

pub trait LayoutGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Proposed positions for `ctx.movable`. Extra keys are ignored.
    fn execute(&self, ctx: &LayoutContext) -> HashMap<NodeId, Vec2>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutKind {
    Grid,
    Circle,
    #[default]
    Force,
    Tree,
    Radial,
}

impl LayoutKind {
    pub const ALL: [LayoutKind; 5] = [
        LayoutKind::Grid,
        LayoutKind::Circle,
        LayoutKind::Force,
        LayoutKind::Tree,
        LayoutKind::Radial,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LayoutKind::Grid => "grid",
            LayoutKind::Circle => "circle",
            LayoutKind::Force => "force",
            LayoutKind::Tree => "tree",
            LayoutKind::Radial => "radial",
        }
    }

    pub fn generator(self) -> Box<dyn LayoutGenerator> {
        match self {
            LayoutKind::Grid => Box::new(GridLayout::default()),
            LayoutKind::Circle => Box::new(CircleLayout::default()),
            LayoutKind::Force => Box::new(ForceDirectedLayout::default()),
            LayoutKind::Tree => Box::new(TreeLayout::default()),
            LayoutKind::Radial => Box::new(RadialLayout::default()),
        }
    }
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutKind {
    type Err = ViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        LayoutKind::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| ViewError::UnknownLayout(s.to_string()))
    }
}

/// Run `generator` and return the new position of every movable node.
pub fn run_layout(
    generator: &dyn LayoutGenerator,
    ctx: &LayoutContext,
    scaler: &LayoutScaler,
) -> HashMap<NodeId, Vec2> {
    match ctx.movable.len() {
        0 => return HashMap::new(),
        1 => {
            let node = ctx.movable[0];
            return HashMap::from([(node, ctx.position(node))]);
        }
        _ => {}
    }

    let mut proposed = generator.execute(ctx);
    let mut result = HashMap::with_capacity(ctx.movable.len());
    let mut repaired = 0usize;
    for node in &ctx.movable {
        let position = match proposed.remove(node) {
            Some(p) if p.is_finite() => p,
            _ => {
                repaired += 1;
                ctx.position(*node)
            }
        };
        result.insert(*node, position);
    }
    if repaired > 0 {
        tracing::warn!(
            layout = generator.name(),
            repaired,
            "Layout left nodes without a finite position; kept their current location"
        );
    }

    scaler.fit(&mut result, ctx.viewport);
    tracing::debug!(
        layout = generator.name(),
        nodes = result.len(),
        "Layout finished"
    );
    result
}

#[cfg(test)]
pub(crate) mod test_support {
    use depan_core::{DependencyGraph, Edge, EdgeId, Node, NodeId, RelationId};

    /// Graph with nodes `0..n` and the given directed edges, relation 0.
    pub fn graph(n: i64, edges: &[(i64, i64)]) -> DependencyGraph {
        let nodes = (0..n)
            .map(|i| Node {
                id: NodeId(i),
                kind: String::new(),
                name: format!("n{i}"),
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
        DependencyGraph::from_parts(nodes, edges)
    }
}
