//! Relation kinds and edge matchers.
//!
//! An edge matcher selects which relations count as graph edges for a given
//! operation and, for hierarchy building, which endpoint acts as the parent.

use crate::{CoreError, Edge, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RelationId(pub u32);

impl fmt::Display for RelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub id: RelationId,
    pub name: String,
}

/// The set of relation kinds known to a graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelationRegistry {
    relations: Vec<Relation>,
}

impl RelationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: RelationId, name: impl Into<String>) -> Result<(), CoreError> {
        if self.get(id).is_some() {
            return Err(CoreError::DuplicateRelation(id));
        }
        self.relations.push(Relation {
            id,
            name: name.into(),
        });
        Ok(())
    }

    /// Registry with relation ids 0.. assigned in order.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let relations = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| Relation {
                id: RelationId(i as u32),
                name: name.to_string(),
            })
            .collect();
        Self { relations }
    }

    pub fn get(&self, id: RelationId) -> Option<&Relation> {
        self.relations.iter().find(|r| r.id == id)
    }

    pub fn by_name(&self, name: &str) -> Result<&Relation, CoreError> {
        self.relations
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| CoreError::UnknownRelation(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relation> {
        self.relations.iter()
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchDirection {
    /// Source is the parent of target.
    Forward,
    /// Target is the parent of source.
    Backward,
    /// Matches in either direction; hierarchy treats it as forward.
    Both,
}

/// Predicate over relations. An empty matcher with `match_all` accepts every edge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdgeMatcher {
    rules: HashMap<RelationId, MatchDirection>,
    match_all: bool,
}

impl EdgeMatcher {
    pub fn all() -> Self {
        Self {
            rules: HashMap::new(),
            match_all: true,
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn with(mut self, relation: RelationId, direction: MatchDirection) -> Self {
        self.rules.insert(relation, direction);
        self
    }

    pub fn forward(relations: impl IntoIterator<Item = RelationId>) -> Self {
        relations
            .into_iter()
            .fold(Self::none(), |m, r| m.with(r, MatchDirection::Forward))
    }

    pub fn direction(&self, relation: RelationId) -> Option<MatchDirection> {
        match self.rules.get(&relation) {
            Some(direction) => Some(*direction),
            None if self.match_all => Some(MatchDirection::Both),
            None => None,
        }
    }

    pub fn matches(&self, edge: &Edge) -> bool {
        self.direction(edge.relation).is_some()
    }

    /// (parent, child) for a matched edge.
    pub fn orient(&self, edge: &Edge) -> Option<(NodeId, NodeId)> {
        match self.direction(edge.relation)? {
            MatchDirection::Forward | MatchDirection::Both => Some((edge.source, edge.target)),
            MatchDirection::Backward => Some((edge.target, edge.source)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EdgeId;

    fn edge(relation: u32) -> Edge {
        Edge {
            id: EdgeId(1),
            source: NodeId(1),
            target: NodeId(2),
            relation: RelationId(relation),
        }
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = RelationRegistry::from_names(["contains", "calls"]);
        assert_eq!(registry.by_name("calls").unwrap().id, RelationId(1));
        assert!(registry.by_name("extends").is_err());
        assert_eq!(
            registry.register(RelationId(1), "dup"),
            Err(CoreError::DuplicateRelation(RelationId(1)))
        );
        registry.register(RelationId(7), "extends").unwrap();
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_matcher_orientation() {
        let matcher = EdgeMatcher::none()
            .with(RelationId(0), MatchDirection::Forward)
            .with(RelationId(1), MatchDirection::Backward);

        assert_eq!(matcher.orient(&edge(0)), Some((NodeId(1), NodeId(2))));
        assert_eq!(matcher.orient(&edge(1)), Some((NodeId(2), NodeId(1))));
        assert!(!matcher.matches(&edge(2)));
        assert!(EdgeMatcher::all().matches(&edge(2)));
    }
}
