//! Node selection state.
//!
//! The ordered index set and the per-node `selected` flags in the rendering
//! model always agree; every mutation goes through this type. Operations
//! return the change they made, or `None` when the selection is unchanged.

use crate::property::{NodeIndex, PickId, RenderingModel};
use depan_core::NodeId;
use depan_events::SelectionChange;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionModel {
    selected: BTreeSet<NodeIndex>,
}

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn contains(&self, node: NodeIndex) -> bool {
        self.selected.contains(&node)
    }

    pub fn indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.selected.iter().copied()
    }

    pub fn node_ids(&self, model: &RenderingModel) -> Vec<NodeId> {
        to_ids(model, self.selected.iter().copied())
    }

    /// Replace the selection with the nodes among `picks`. Edge picks are dropped.
    pub fn set_selection(
        &mut self,
        model: &mut RenderingModel,
        picks: &[PickId],
    ) -> Option<SelectionChange> {
        let wanted = nodes_of(model, picks);
        self.set_nodes(model, &wanted)
    }

    pub fn extend_selection(
        &mut self,
        model: &mut RenderingModel,
        picks: &[PickId],
    ) -> Option<SelectionChange> {
        let wanted = nodes_of(model, picks);
        self.extend_nodes(model, &wanted)
    }

    pub fn reduce_selection(
        &mut self,
        model: &mut RenderingModel,
        picks: &[PickId],
    ) -> Option<SelectionChange> {
        let wanted = nodes_of(model, picks);
        self.reduce_nodes(model, &wanted)
    }

    pub fn clear(&mut self, model: &mut RenderingModel) -> Option<SelectionChange> {
        self.set_nodes(model, &[])
    }

    pub fn set_nodes(
        &mut self,
        model: &mut RenderingModel,
        nodes: &[NodeIndex],
    ) -> Option<SelectionChange> {
        let next: BTreeSet<NodeIndex> = nodes
            .iter()
            .copied()
            .filter(|i| i.0 < model.node_count())
            .collect();
        if next == self.selected {
            return None;
        }
        let previous = to_ids(model, self.selected.iter().copied());
        for index in self.selected.difference(&next) {
            if let Some(node) = model.node_mut(*index) {
                node.set_selected(false);
            }
        }
        for index in next.difference(&self.selected) {
            if let Some(node) = model.node_mut(*index) {
                node.set_selected(true);
            }
        }
        self.selected = next;
        Some(SelectionChange::Changed {
            previous,
            current: to_ids(model, self.selected.iter().copied()),
        })
    }

    pub fn extend_nodes(
        &mut self,
        model: &mut RenderingModel,
        nodes: &[NodeIndex],
    ) -> Option<SelectionChange> {
        let mut added = Vec::new();
        for &index in nodes {
            if index.0 >= model.node_count() {
                continue;
            }
            if self.selected.insert(index) {
                if let Some(node) = model.node_mut(index) {
                    node.set_selected(true);
                }
                added.push(index);
            }
        }
        if added.is_empty() {
            return None;
        }
        Some(SelectionChange::Extended {
            added: to_ids(model, added),
        })
    }

    pub fn reduce_nodes(
        &mut self,
        model: &mut RenderingModel,
        nodes: &[NodeIndex],
    ) -> Option<SelectionChange> {
        let mut removed = Vec::new();
        for &index in nodes {
            if self.selected.remove(&index) {
                if let Some(node) = model.node_mut(index) {
                    node.set_selected(false);
                }
                removed.push(index);
            }
        }
        if removed.is_empty() {
            return None;
        }
        Some(SelectionChange::Reduced {
            removed: to_ids(model, removed),
        })
    }

    /// True when the set and the model's flags agree.
    pub fn is_consistent(&self, model: &RenderingModel) -> bool {
        model
            .nodes()
            .iter()
            .all(|n| n.is_selected() == self.selected.contains(&n.index))
            && self.selected.iter().all(|i| i.0 < model.node_count())
    }
}

/// Node indices among `picks`, first occurrence order, duplicates removed.
fn nodes_of(model: &RenderingModel, picks: &[PickId]) -> Vec<NodeIndex> {
    let mut seen = BTreeSet::new();
    picks
        .iter()
        .filter_map(|p| model.pick_to_node(*p))
        .filter(|i| seen.insert(*i))
        .collect()
}

fn to_ids(model: &RenderingModel, indices: impl IntoIterator<Item = NodeIndex>) -> Vec<NodeId> {
    indices
        .into_iter()
        .filter_map(|i| model.node(i).map(|n| n.node))
        .collect()
}
