use depan_core::{CoreError, NodeId};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ViewError {
    #[error("Unknown node {0}")]
    UnknownNode(NodeId),
    #[error("Unknown layout {0:?}")]
    UnknownLayout(String),
    #[error("View has been disposed")]
    Disposed,
    #[error("Failed to read view configuration {path:?}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid view configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Validation failures of a color map definition.
///
/// These never escape [`crate::color_map::ColorMap::new`], which falls back to
/// the default map instead; they are public for callers that validate ahead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ColorMapError {
    #[error("Color map needs 4 components, found {0}")]
    ComponentCount(usize),
    #[error("Component {component} needs at least 2 control points")]
    TooFewPoints { component: usize },
    #[error("Component {component} must start at 0.0 and end at 1.0")]
    Boundary { component: usize },
    #[error("Component {component} control points are not strictly increasing")]
    NotIncreasing { component: usize },
    #[error("Component {component} has a value outside [0, 1]")]
    ValueRange { component: usize },
}
