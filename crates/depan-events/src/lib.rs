use depan_core::{CollapseData, NodeId, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub mod listener;

pub use listener::{
    CollectErrorSink, ErrorSink, ListenerFailure, ListenerHandle, ListenerList, LogErrorSink,
};

/// Identifies the component that initiated a change, so it can recognise its
/// own changes when they come back as events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Author(Uuid);

impl Author {
    /// Changes that did not originate from any registered component.
    pub const EXTERNAL: Author = Author(Uuid::nil());

    pub fn new() -> Self {
        Author(Uuid::new_v4())
    }

    pub fn is_external(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for Author {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionChange {
    Changed {
        previous: Vec<NodeId>,
        current: Vec<NodeId>,
    },
    Extended {
        added: Vec<NodeId>,
    },
    Reduced {
        removed: Vec<NodeId>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionEvent {
    pub author: Author,
    pub change: SelectionChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationKind {
    /// Discrete repositioning; current and target jump.
    Set,
    /// Target moves, current animates toward it.
    Edit,
    /// Immediate renderer-authored move such as a drag.
    Update,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationEvent {
    pub author: Author,
    pub kind: LocationKind,
    pub moves: Vec<(NodeId, Vec2)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollapseEvent {
    pub author: Author,
    pub created: Vec<CollapseData>,
    pub removed: Vec<CollapseData>,
}

impl CollapseEvent {
    /// `None` when the operation changed nothing.
    pub fn new(
        author: Author,
        created: Vec<CollapseData>,
        removed: Vec<CollapseData>,
    ) -> Option<Self> {
        if created.is_empty() && removed.is_empty() {
            return None;
        }
        Some(Self {
            author,
            created,
            removed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_identity() {
        let a = Author::new();
        let b = Author::new();
        assert_ne!(a, b);
        assert!(!a.is_external());
        assert!(Author::EXTERNAL.is_external());
    }

    #[test]
    fn test_empty_collapse_event_is_never_built() {
        assert!(CollapseEvent::new(Author::EXTERNAL, vec![], vec![]).is_none());
        let data = CollapseData::new(NodeId(1), Vec2::ZERO);
        let event = CollapseEvent::new(Author::EXTERNAL, vec![data.clone()], vec![]).unwrap();
        assert_eq!(event.created, vec![data]);
    }
}
