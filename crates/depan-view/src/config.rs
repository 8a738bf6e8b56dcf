//! View configuration.
//!
//! Every section defaults independently, so a partial JSON document only
//! overrides what it names. Out-of-range values are repaired by
//! [`ViewConfig::validated`] with a warning instead of failing the view.

use crate::color_map::ColorMapDefinition;
use crate::error::ViewError;
use depan_core::{Color, ShapeKind};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 10;
pub const DEFAULT_PICK_TOLERANCE: f32 = 5.0;
pub const DEFAULT_NODE_SIZE: f32 = 1.0;
pub const DEFAULT_LAYOUT_MARGIN: f32 = 2.0;
pub const DEFAULT_SETTLE_EPSILON: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeColorMode {
    #[default]
    Default,
    Degree,
    Rank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeSizeMode {
    #[default]
    Default,
    Degree,
    Rank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeShapeMode {
    #[default]
    Default,
    ByKind,
    Degree,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelMode {
    #[default]
    All,
    Selected,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMapChoice {
    Named(String),
    Custom(ColorMapDefinition),
}

impl Default for ColorMapChoice {
    fn default() -> Self {
        ColorMapChoice::Named("jet".to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeDefaults {
    pub size: f32,
    /// Bounds used by the degree and rank size modes.
    pub min_size: f32,
    pub max_size: f32,
    pub color: Color,
    pub shape: ShapeKind,
    pub stroke_width: f32,
    pub selected_stroke_width: f32,
}

impl Default for NodeDefaults {
    fn default() -> Self {
        Self {
            size: DEFAULT_NODE_SIZE,
            min_size: 0.5,
            max_size: 3.0,
            color: Color::rgb(0x5b, 0x9b, 0xd5),
            shape: ShapeKind::Circle,
            stroke_width: 1.0,
            selected_stroke_width: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeDefaults {
    pub color: Color,
    pub width: f32,
    /// Fade edges with no selected endpoint while a selection exists.
    pub dim_unselected: bool,
}

impl Default for EdgeDefaults {
    fn default() -> Self {
        Self {
            color: Color::rgb(0x80, 0x80, 0x80),
            width: 1.0,
            dim_unselected: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderModes {
    pub node_color: NodeColorMode,
    pub node_size: NodeSizeMode,
    pub node_shape: NodeShapeMode,
    pub node_label: LabelMode,
    pub edge_label: LabelMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub frame_interval_ms: u64,
    pub pick_tolerance: f32,
    pub node: NodeDefaults,
    pub edge: EdgeDefaults,
    pub modes: RenderModes,
    pub color_map: ColorMapChoice,
    /// Inset applied by the layout scaler on every side of the viewport.
    pub layout_margin: f32,
    pub settle_epsilon: f32,
    pub selection_color: Color,
    /// Radius of the hyperbolic disk; `None` keeps the planar projection.
    pub hyperbolic_radius: Option<f64>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            pick_tolerance: DEFAULT_PICK_TOLERANCE,
            node: NodeDefaults::default(),
            edge: EdgeDefaults::default(),
            modes: RenderModes::default(),
            color_map: ColorMapChoice::default(),
            layout_margin: DEFAULT_LAYOUT_MARGIN,
            settle_epsilon: DEFAULT_SETTLE_EPSILON,
            selection_color: Color::rgb(0xff, 0x8c, 0x00),
            hyperbolic_radius: None,
        }
    }
}

impl ViewConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ViewError> {
        let config: ViewConfig = serde_json::from_str(json)?;
        Ok(config.validated())
    }

    pub fn from_path(path: &Path) -> Result<Self, ViewError> {
        let text = std::fs::read_to_string(path).map_err(|source| ViewError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Replace out-of-range values with their defaults.
    pub fn validated(mut self) -> Self {
        let defaults = ViewConfig::default();

        if self.frame_interval_ms == 0 {
            tracing::warn!(
                "frame_interval_ms must be positive; using {}",
                DEFAULT_FRAME_INTERVAL_MS
            );
            self.frame_interval_ms = DEFAULT_FRAME_INTERVAL_MS;
        }
        if !(self.pick_tolerance.is_finite() && self.pick_tolerance > 0.0) {
            tracing::warn!(
                "pick_tolerance {} is invalid; using {}",
                self.pick_tolerance,
                DEFAULT_PICK_TOLERANCE
            );
            self.pick_tolerance = DEFAULT_PICK_TOLERANCE;
        }
        if !positive(self.node.size) {
            tracing::warn!("node size {} is invalid; using default", self.node.size);
            self.node.size = defaults.node.size;
        }
        if !positive(self.node.min_size)
            || !positive(self.node.max_size)
            || self.node.min_size > self.node.max_size
        {
            tracing::warn!(
                "node size bounds [{}, {}] are invalid; using defaults",
                self.node.min_size,
                self.node.max_size
            );
            self.node.min_size = defaults.node.min_size;
            self.node.max_size = defaults.node.max_size;
        }
        if !positive(self.node.stroke_width) {
            self.node.stroke_width = defaults.node.stroke_width;
        }
        if !positive(self.node.selected_stroke_width) {
            self.node.selected_stroke_width = defaults.node.selected_stroke_width;
        }
        if !positive(self.edge.width) {
            self.edge.width = defaults.edge.width;
        }
        if !(self.layout_margin.is_finite() && self.layout_margin >= 0.0) {
            tracing::warn!(
                "layout_margin {} is invalid; using {}",
                self.layout_margin,
                DEFAULT_LAYOUT_MARGIN
            );
            self.layout_margin = DEFAULT_LAYOUT_MARGIN;
        }
        if !positive(self.settle_epsilon) {
            tracing::warn!(
                "settle_epsilon {} is invalid; using {}",
                self.settle_epsilon,
                DEFAULT_SETTLE_EPSILON
            );
            self.settle_epsilon = DEFAULT_SETTLE_EPSILON;
        }
        if let Some(radius) = self.hyperbolic_radius {
            if !(radius.is_finite() && radius > 0.0) {
                tracing::warn!("hyperbolic_radius {radius} is invalid; using planar projection");
                self.hyperbolic_radius = None;
            }
        }
        self
    }
}

fn positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}
