//! Parent/child forest over a node subset.
//!
//! Built from an edge matcher: each matched edge proposes a (parent, child)
//! pair. A child keeps the first parent it is offered, and a pair that would
//! close a cycle is dropped, so the result is always a forest.

use depan_core::{DependencyGraph, EdgeMatcher, NodeId};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct HierarchyTree {
    nodes: Vec<NodeId>,
    parent: HashMap<NodeId, NodeId>,
    children: HashMap<NodeId, Vec<NodeId>>,
}

impl HierarchyTree {
    /// Forest over `nodes`. Pairs naming a node outside the set are ignored.
    pub fn from_edges(
        nodes: impl IntoIterator<Item = NodeId>,
        pairs: impl IntoIterator<Item = (NodeId, NodeId)>,
    ) -> Self {
        let mut seen = HashSet::new();
        let nodes: Vec<NodeId> = nodes.into_iter().filter(|n| seen.insert(*n)).collect();
        let mut tree = Self {
            nodes,
            parent: HashMap::new(),
            children: HashMap::new(),
        };

        let mut dropped = 0usize;
        for (parent, child) in pairs {
            if parent == child || !seen.contains(&parent) || !seen.contains(&child) {
                continue;
            }
            if tree.parent.contains_key(&child) {
                continue;
            }
            if tree.is_ancestor(child, parent) {
                dropped += 1;
                continue;
            }
            tree.parent.insert(child, parent);
            tree.children.entry(parent).or_default().push(child);
        }
        if dropped > 0 {
            tracing::debug!(dropped, "Hierarchy edges dropped to break cycles");
        }
        tree
    }

    pub fn from_graph(graph: &DependencyGraph, nodes: &[NodeId], matcher: &EdgeMatcher) -> Self {
        Self::from_edges(
            nodes.iter().copied(),
            graph.edges.iter().filter_map(|e| matcher.orient(e)),
        )
    }

    /// True when `ancestor` lies on the parent chain above `node`, or is `node`.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = node;
        loop {
            if current == ancestor {
                return true;
            }
            match self.parent.get(&current) {
                Some(p) => current = *p,
                None => return false,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.parent.get(&node).copied()
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.children.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Parentless nodes in input order.
    pub fn roots(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .copied()
            .filter(|n| !self.parent.contains_key(n))
            .collect()
    }

    pub fn depth(&self, node: NodeId) -> usize {
        let mut depth = 0;
        let mut current = node;
        while let Some(p) = self.parent.get(&current) {
            depth += 1;
            current = *p;
        }
        depth
    }

    /// Every node, children before their parent, roots in input order.
    pub fn post_order(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        for root in self.roots() {
            let mut stack = vec![(root, false)];
            while let Some((node, expanded)) = stack.pop() {
                if expanded {
                    out.push(node);
                    continue;
                }
                stack.push((node, true));
                for child in self.children(node).iter().rev() {
                    stack.push((*child, false));
                }
            }
        }
        out
    }

    /// All nodes below `node`, not including it.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }
}
