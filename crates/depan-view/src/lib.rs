pub mod camera;
pub mod collapse;
pub mod color_map;
pub mod config;
pub mod error;
pub mod hierarchy;
pub mod hyperbolic;
pub mod interaction;
pub mod layout;
pub mod picking;
pub mod pipeline;
pub mod property;
pub mod render_loop;
pub mod selection;
pub mod shape;
pub mod stats;
pub mod surface;
pub mod view;

pub use camera::{ProjectionMode, SceneCamera};
pub use collapse::{CollapseChanges, CollapseManager};
pub use color_map::{ColorMap, ColorMapDefinition};
pub use config::{
    ColorMapChoice, LabelMode, NodeColorMode, NodeShapeMode, NodeSizeMode, RenderModes, ViewConfig,
};
pub use error::{ColorMapError, ViewError};
pub use hierarchy::HierarchyTree;
pub use hyperbolic::HyperbolicProjection;
pub use interaction::{Key, Modifiers, MouseButton, MouseController, MouseState, SceneTarget, SelectionMode};
pub use layout::{LayoutContext, LayoutGenerator, LayoutKind, LayoutScaler, run_layout};
pub use picking::{PickBuffer, PickRegion, SelectionSurface, decode_hits, pick_capacity};
pub use pipeline::{FrameContext, FrameMode, FrameStats, RenderingPipeline, RenderingPlugin};
pub use property::{
    EdgeIndex, EdgeRenderingProperty, NodeIndex, NodeRenderingProperty, PickId, PickKind,
    RenderingModel,
};
pub use render_loop::{HostMessage, RenderLoop};
pub use selection::SelectionModel;
pub use stats::NodeStatistics;
pub use surface::{DrawCall, DrawingSurface, Primitive, RecordingSurface, SurfaceStats, TextureId};
pub use view::GraphView;
