use crate::{EdgeId, NodeId, RelationId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Edge {edge} references node {node} which is not part of the graph")]
    DanglingEdge { edge: EdgeId, node: NodeId },
    #[error("Unknown relation: {0}")]
    UnknownRelation(String),
    #[error("Duplicate relation id {0:?}")]
    DuplicateRelation(RelationId),
}
