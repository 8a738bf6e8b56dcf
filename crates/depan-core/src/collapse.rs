use crate::{NodeId, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One collapse group: a master node standing in for its hidden children.
///
/// `child_collapses` holds groups that were already collapsed when this one
/// was formed and were kept nested rather than flattened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollapseData {
    pub master: NodeId,
    pub children: Vec<NodeId>,
    pub child_collapses: Vec<CollapseData>,
    /// Master position when the group was formed.
    pub master_origin: Vec2,
    /// Child positions relative to `master_origin` at collapse time.
    pub child_offsets: BTreeMap<NodeId, Vec2>,
}

impl CollapseData {
    pub fn new(master: NodeId, master_origin: Vec2) -> Self {
        Self {
            master,
            children: Vec::new(),
            child_collapses: Vec::new(),
            master_origin,
            child_offsets: BTreeMap::new(),
        }
    }

    /// Every node hidden by this group, nested groups included.
    pub fn all_hidden(&self) -> Vec<NodeId> {
        let mut out = self.children.clone();
        for nested in &self.child_collapses {
            out.push(nested.master);
            out.extend(nested.all_hidden());
        }
        out
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.children.contains(&node)
            || self
                .child_collapses
                .iter()
                .any(|nested| nested.master == node || nested.contains(node))
    }
}
