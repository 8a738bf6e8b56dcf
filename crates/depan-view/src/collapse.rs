//! Collapse groups.
//!
//! A collapse master stands in for a set of hidden nodes. Groups that were
//! already collapsed when a new group absorbs their master are either kept
//! nested inside it or, when erasing, flattened into it. The manager only
//! tracks top-level groups; nested ones live inside their parent's
//! [`CollapseData`].
//!
//! Positions used here are logical ones (the target position), so a node
//! that is still animating is recorded where it is heading.

use crate::hierarchy::HierarchyTree;
use crate::property::RenderingModel;
use depan_core::{CollapseData, NodeId, Vec2};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct CollapseManager {
    groups: BTreeMap<NodeId, CollapseData>,
}

/// Created and removed groups of one operation.
///
/// `created` lists every group formed by the operation, deepest first. A
/// group that was then folded into a parent in the same operation is listed
/// on its own and again inside the parent's `child_collapses`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollapseChanges {
    pub created: Vec<CollapseData>,
    pub removed: Vec<CollapseData>,
}

impl CollapseChanges {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.removed.is_empty()
    }
}

impl CollapseManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Whether `node` masters a top-level group.
    pub fn is_master(&self, node: NodeId) -> bool {
        self.groups.contains_key(&node)
    }

    pub fn group(&self, master: NodeId) -> Option<&CollapseData> {
        self.groups.get(&master)
    }

    pub fn groups(&self) -> impl Iterator<Item = &CollapseData> {
        self.groups.values()
    }

    /// Hide `picked` under `master`.
    ///
    /// Returns the new group and any groups erased into it, or `None` when
    /// nothing changed: the master is unknown, hidden, or already a master,
    /// or no picked node can be collapsed.
    pub fn collapse(
        &mut self,
        model: &mut RenderingModel,
        master: NodeId,
        picked: &[NodeId],
        erase: bool,
    ) -> Option<(CollapseData, Vec<CollapseData>)> {
        let master_index = model.node_index(master)?;
        let master_node = model.node(master_index)?;
        if master_node.collapsed_under.is_some() || self.groups.contains_key(&master) {
            tracing::debug!(%master, "Collapse ignored: master is hidden or already collapsed");
            return None;
        }
        let origin = master_node.target_position();

        let mut seen = HashSet::new();
        let candidates: Vec<NodeId> = picked
            .iter()
            .copied()
            .filter(|id| *id != master && seen.insert(*id))
            .filter(|id| {
                model
                    .node_by_id(*id)
                    .is_some_and(|n| n.collapsed_under.is_none())
            })
            .collect();
        if candidates.is_empty() {
            return None;
        }

        let mut data = CollapseData::new(master, origin);
        let mut removed = Vec::new();
        let mut hide = Vec::new();
        let mut unmark = Vec::new();

        for id in candidates {
            let Some(position) = model.node_by_id(id).map(|n| n.target_position()) else {
                continue;
            };
            match self.groups.remove(&id) {
                Some(group) if erase => {
                    let mut restored = Vec::new();
                    restore_positions(&group, position, &mut restored, &mut unmark);
                    for (node, at) in restored {
                        data.children.push(node);
                        data.child_offsets.insert(node, at - origin);
                        hide.push(node);
                    }
                    unmark.push(id);
                    data.children.push(id);
                    data.child_offsets.insert(id, position - origin);
                    hide.push(id);
                    removed.push(group);
                }
                Some(group) => {
                    data.child_offsets.insert(id, position - origin);
                    data.child_collapses.push(group);
                    hide.push(id);
                }
                None => {
                    data.children.push(id);
                    data.child_offsets.insert(id, position - origin);
                    hide.push(id);
                }
            }
        }

        for id in unmark {
            if let Some(node) = model.node_by_id_mut(id) {
                node.is_collapse_master = false;
                node.collapsed_count = 0;
            }
        }
        for id in hide {
            if let Some(node) = model.node_by_id_mut(id) {
                node.collapsed_under = Some(master_index);
                node.set_position(origin);
            }
        }
        if let Some(node) = model.node_mut(master_index) {
            node.is_collapse_master = true;
            node.collapsed_count = data.all_hidden().len();
        }

        tracing::debug!(
            %master,
            children = data.children.len(),
            nested = data.child_collapses.len(),
            erased = removed.len(),
            "Collapsed group"
        );
        self.groups.insert(master, data.clone());
        Some((data, removed))
    }

    /// Restore the group mastered by `master`.
    ///
    /// Direct children animate out to their recorded offset from the
    /// master's current position. Nested groups come back as top-level
    /// groups, or are dissolved too when `delete_group` is set. Returns the
    /// removed group and any nested groups dissolved with it.
    pub fn uncollapse(
        &mut self,
        model: &mut RenderingModel,
        master: NodeId,
        delete_group: bool,
    ) -> Option<(CollapseData, Vec<CollapseData>)> {
        let group = self.groups.remove(&master)?;
        let (master_now, master_drawn) = match model.node_by_id(master) {
            Some(node) => (node.target_position(), node.position()),
            None => (group.master_origin, group.master_origin),
        };

        let mut dissolved = Vec::new();
        release(model, &group, master_now, master_drawn);
        for nested in &group.child_collapses {
            let nested_at = master_now + offset_of(&group, nested.master);
            if delete_group {
                dissolve(model, nested, nested_at, master_drawn, &mut dissolved);
            } else {
                self.groups.insert(nested.master, nested.clone());
            }
        }

        if let Some(node) = model.node_by_id_mut(master) {
            node.is_collapse_master = false;
            node.collapsed_count = 0;
        }
        tracing::debug!(
            %master,
            restored = group.children.len() + group.child_collapses.len(),
            dissolved = dissolved.len(),
            "Uncollapsed group"
        );
        Some((group, dissolved))
    }

    /// Collapse every subtree of `tree` into its root, deepest first.
    pub fn collapse_tree(&mut self, model: &mut RenderingModel, tree: &HierarchyTree) -> CollapseChanges {
        let before: HashSet<NodeId> = self.groups.keys().copied().collect();
        let mut removed = Vec::new();
        let mut created = Vec::new();
        for node in tree.post_order() {
            let children = tree.children(node);
            if children.is_empty() {
                continue;
            }
            if let Some((data, erased)) = self.collapse(model, node, children, false) {
                removed.extend(erased);
                if !before.contains(&data.master) {
                    created.push(data);
                }
            }
        }
        CollapseChanges { created, removed }
    }

    /// Dissolve every group, nested ones included.
    pub fn uncollapse_all(&mut self, model: &mut RenderingModel) -> Vec<CollapseData> {
        let masters: Vec<NodeId> = self.groups.keys().copied().collect();
        let mut removed = Vec::new();
        for master in masters {
            if let Some((group, dissolved)) = self.uncollapse(model, master, true) {
                removed.push(group);
                removed.extend(dissolved);
            }
        }
        removed
    }
}

fn offset_of(group: &CollapseData, node: NodeId) -> Vec2 {
    group.child_offsets.get(&node).copied().unwrap_or(Vec2::ZERO)
}

/// Logical positions of everything `group` hides, given where its master is now.
fn restore_positions(
    group: &CollapseData,
    master_at: Vec2,
    out: &mut Vec<(NodeId, Vec2)>,
    masters: &mut Vec<NodeId>,
) {
    for child in &group.children {
        out.push((*child, master_at + offset_of(group, *child)));
    }
    for nested in &group.child_collapses {
        let nested_at = master_at + offset_of(group, nested.master);
        out.push((nested.master, nested_at));
        masters.push(nested.master);
        restore_positions(nested, nested_at, out, masters);
    }
}

/// Make the direct children and nested masters of `group` visible again,
/// animating out from `drawn_from`.
fn release(model: &mut RenderingModel, group: &CollapseData, master_at: Vec2, drawn_from: Vec2) {
    let direct = group
        .children
        .iter()
        .copied()
        .chain(group.child_collapses.iter().map(|g| g.master));
    for id in direct {
        let target = master_at + offset_of(group, id);
        if let Some(node) = model.node_by_id_mut(id) {
            node.collapsed_under = None;
            node.set_position(drawn_from);
            node.edit_position(target);
        }
    }
}

fn dissolve(
    model: &mut RenderingModel,
    group: &CollapseData,
    master_at: Vec2,
    drawn_from: Vec2,
    dissolved: &mut Vec<CollapseData>,
) {
    release(model, group, master_at, drawn_from);
    for nested in &group.child_collapses {
        let nested_at = master_at + offset_of(group, nested.master);
        dissolve(model, nested, nested_at, drawn_from, dissolved);
    }
    if let Some(node) = model.node_by_id_mut(group.master) {
        node.is_collapse_master = false;
        node.collapsed_count = 0;
    }
    dissolved.push(group.clone());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewConfig;
    use depan_core::{DependencyGraph, InMemoryDisplayRepository, Node};

    fn model(n: i64) -> RenderingModel {
        let nodes = (0..n)
            .map(|i| Node {
                id: NodeId(i),
                kind: String::new(),
                name: format!("n{i}"),
            })
            .collect();
        let mut m = RenderingModel::from_graph(
            &DependencyGraph::from_parts(nodes, vec![]),
            &InMemoryDisplayRepository::new(),
            &ViewConfig::default(),
        );
        for (i, node) in m.nodes_mut().iter_mut().enumerate() {
            node.set_position(Vec2::new(i as f32 * 10.0, 0.0));
        }
        m
    }

    fn node(m: &RenderingModel, id: i64) -> &crate::property::NodeRenderingProperty {
        m.node_by_id(NodeId(id)).unwrap()
    }

    #[test]
    fn test_collapse_then_uncollapse_restores_offsets() {
        let mut m = model(3);
        let mut manager = CollapseManager::new();
        let (data, removed) = manager
            .collapse(&mut m, NodeId(1), &[NodeId(1), NodeId(2)], false)
            .unwrap();
        assert!(removed.is_empty());
        assert_eq!(data.children, vec![NodeId(2)]);
        assert_eq!(data.child_offsets[&NodeId(2)], Vec2::new(10.0, 0.0));
        assert!(node(&m, 1).is_collapse_master);
        assert_eq!(node(&m, 1).collapsed_count, 1);
        assert!(node(&m, 2).collapsed_under.is_some());

        m.node_by_id_mut(NodeId(1)).unwrap().set_position(Vec2::new(10.0, 5.0));
        let (group, dissolved) = manager.uncollapse(&mut m, NodeId(1), false).unwrap();
        assert_eq!(group.master, NodeId(1));
        assert!(dissolved.is_empty());
        assert!(node(&m, 2).collapsed_under.is_none());
        assert_eq!(node(&m, 2).target_position(), Vec2::new(20.0, 5.0));
        assert_eq!(node(&m, 2).position(), Vec2::new(10.0, 5.0));
        assert!(!node(&m, 1).is_collapse_master);
    }

    #[test]
    fn test_repeated_operations_are_no_ops() {
        let mut m = model(3);
        let mut manager = CollapseManager::new();
        assert!(manager.collapse(&mut m, NodeId(0), &[NodeId(1)], false).is_some());
        assert!(manager.collapse(&mut m, NodeId(0), &[NodeId(2)], false).is_none());
        assert!(manager.collapse(&mut m, NodeId(1), &[NodeId(2)], false).is_none());
        assert!(manager.uncollapse(&mut m, NodeId(0), false).is_some());
        assert!(manager.uncollapse(&mut m, NodeId(0), false).is_none());
        assert!(manager.uncollapse(&mut m, NodeId(2), false).is_none());
        assert!(manager.collapse(&mut m, NodeId(0), &[NodeId(0)], false).is_none());
    }

    #[test]
    fn test_nested_group_survives_uncollapse() {
        let mut m = model(4);
        let mut manager = CollapseManager::new();
        manager.collapse(&mut m, NodeId(2), &[NodeId(3)], false).unwrap();
        manager.collapse(&mut m, NodeId(0), &[NodeId(1), NodeId(2)], false).unwrap();
        assert_eq!(manager.len(), 1);
        assert_eq!(node(&m, 0).collapsed_count, 3);
        assert_eq!(m.visible_master(m.node_index(NodeId(3)).unwrap()), m.node_index(NodeId(0)));

        manager.uncollapse(&mut m, NodeId(0), false).unwrap();
        assert!(manager.is_master(NodeId(2)));
        assert!(node(&m, 2).collapsed_under.is_none());
        assert!(node(&m, 3).collapsed_under.is_some());
        assert_eq!(node(&m, 2).target_position(), Vec2::new(20.0, 0.0));
    }

    #[test]
    fn test_delete_group_dissolves_nested() {
        let mut m = model(4);
        let mut manager = CollapseManager::new();
        manager.collapse(&mut m, NodeId(2), &[NodeId(3)], false).unwrap();
        manager.collapse(&mut m, NodeId(0), &[NodeId(1), NodeId(2)], false).unwrap();
        let (_, dissolved) = manager.uncollapse(&mut m, NodeId(0), true).unwrap();
        assert_eq!(dissolved.len(), 1);
        assert!(manager.is_empty());
        assert!(m.nodes().iter().all(|n| n.collapsed_under.is_none()));
        assert!(m.nodes().iter().all(|n| !n.is_collapse_master));
        assert_eq!(node(&m, 3).target_position(), Vec2::new(30.0, 0.0));
    }

    #[test]
    fn test_erase_flattens_picked_groups() {
        let mut m = model(4);
        let mut manager = CollapseManager::new();
        manager.collapse(&mut m, NodeId(2), &[NodeId(3)], false).unwrap();
        let (data, removed) = manager
            .collapse(&mut m, NodeId(0), &[NodeId(2)], true)
            .unwrap();
        assert_eq!(removed.len(), 1);
        assert!(data.child_collapses.is_empty());
        let mut children = data.children.clone();
        children.sort();
        assert_eq!(children, vec![NodeId(2), NodeId(3)]);
        assert_eq!(data.child_offsets[&NodeId(3)], Vec2::new(30.0, 0.0));
        assert!(!node(&m, 2).is_collapse_master);
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_collapse_tree_and_uncollapse_all() {
        let mut m = model(5);
        let tree = HierarchyTree::from_edges(
            (0..5).map(NodeId),
            [
                (NodeId(0), NodeId(1)),
                (NodeId(1), NodeId(2)),
                (NodeId(0), NodeId(3)),
            ],
        );
        let mut manager = CollapseManager::new();
        let changes = manager.collapse_tree(&mut m, &tree);
        // the nested group is reported as well as the top-level one
        let masters: Vec<NodeId> = changes.created.iter().map(|g| g.master).collect();
        assert_eq!(masters, vec![NodeId(1), NodeId(0)]);
        assert_eq!(changes.created[0].children, vec![NodeId(2)]);
        let nested: Vec<NodeId> = changes.created[1].child_collapses.iter().map(|g| g.master).collect();
        assert_eq!(nested, vec![NodeId(1)]);
        assert!(changes.removed.is_empty());
        assert_eq!(manager.len(), 1);
        assert_eq!(node(&m, 0).collapsed_count, 3);
        assert!(node(&m, 4).collapsed_under.is_none());

        let removed = manager.uncollapse_all(&mut m);
        assert_eq!(removed.len(), 2);
        assert!(m.nodes().iter().all(|n| n.collapsed_under.is_none()));
    }
}
