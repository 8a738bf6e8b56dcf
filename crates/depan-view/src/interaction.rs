//! Mouse and keyboard interaction.
//!
//! [`MouseController`] is the drag state machine. It never touches the model
//! directly: everything goes through a [`SceneTarget`], which the graph view
//! implements and tests can mock.

use crate::camera::SceneCamera;
use crate::property::{PickId, PickKind};
use depan_core::Vec2;
use glam::DVec2;

/// Degrees of camera rotation per dragged pixel.
const ROTATE_PER_PIXEL: f64 = 0.5;
/// Zoom multiplier per wheel notch.
const WHEEL_ZOOM_STEP: f64 = 1.1;
const KEY_PAN_FRACTION: f64 = 0.1;
const KEY_ZOOM_STEP: f64 = 1.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Left,
    Right,
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    Escape,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    Replace,
    Extend,
    Reduce,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MouseState {
    #[default]
    None,
    /// Camera drag: pan, or rotate with Alt held.
    Moving { rotate: bool },
    /// Dragging the selected nodes.
    MovingObject,
    RectangleSelection { mode: SelectionMode },
}

/// What the mouse controller drives.
pub trait SceneTarget {
    fn pick_objects_at(&mut self, x: f64, y: f64) -> Vec<PickId>;
    fn pick_rectangle(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<PickId>;
    fn is_pick_selected(&self, pick: PickId) -> bool;
    fn apply_selection(&mut self, mode: SelectionMode, picks: &[PickId]);
    fn window_to_world(&self, x: f64, y: f64) -> DVec2;
    /// Move every selected node by a world delta, both position and target.
    fn move_selection(&mut self, delta: Vec2);
    /// A drag of the selection ended after moving it.
    fn finish_selection_move(&mut self);
    fn pan_camera(&mut self, dx: f64, dy: f64);
    fn rotate_camera(&mut self, dx: f64, dy: f64);
    fn zoom_camera(&mut self, factor: f64);
}

/// The pick a click acts on: the first node hit, else the first hit.
pub fn top_pick(picks: &[PickId]) -> Option<PickId> {
    picks
        .iter()
        .copied()
        .find(|p| p.kind() == PickKind::Node)
        .or_else(|| picks.first().copied())
}

#[derive(Debug, Clone, Default)]
pub struct MouseController {
    state: MouseState,
    press: (f64, f64),
    last: (f64, f64),
    moved_selection: bool,
}

impl MouseController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MouseState {
        self.state
    }

    /// Window corners of the rectangle being dragged, if any.
    pub fn rubber_band(&self) -> Option<((f64, f64), (f64, f64))> {
        match self.state {
            MouseState::RectangleSelection { .. } => Some((self.press, self.last)),
            _ => None,
        }
    }

    pub fn mouse_down(
        &mut self,
        target: &mut dyn SceneTarget,
        x: f64,
        y: f64,
        button: MouseButton,
        modifiers: Modifiers,
    ) {
        self.press = (x, y);
        self.last = (x, y);
        self.moved_selection = false;

        self.state = match button {
            MouseButton::Right => MouseState::None,
            MouseButton::Middle => MouseState::Moving { rotate: modifiers.alt },
            MouseButton::Left if modifiers.shift => MouseState::Moving { rotate: modifiers.alt },
            MouseButton::Left if modifiers.ctrl => MouseState::RectangleSelection {
                mode: if modifiers.alt {
                    SelectionMode::Reduce
                } else {
                    SelectionMode::Extend
                },
            },
            MouseButton::Left => {
                let picks = target.pick_objects_at(x, y);
                match top_pick(&picks) {
                    Some(pick) => {
                        if !target.is_pick_selected(pick) {
                            target.apply_selection(SelectionMode::Replace, &[pick]);
                        }
                        MouseState::MovingObject
                    }
                    None => MouseState::RectangleSelection {
                        mode: SelectionMode::Replace,
                    },
                }
            }
        };
        tracing::trace!(state = ?self.state, x, y, "Mouse down");
    }

    pub fn mouse_drag(&mut self, target: &mut dyn SceneTarget, x: f64, y: f64) {
        let (lx, ly) = self.last;
        match self.state {
            MouseState::None | MouseState::RectangleSelection { .. } => {}
            MouseState::Moving { rotate: true } => {
                target.rotate_camera((y - ly) * ROTATE_PER_PIXEL, (x - lx) * ROTATE_PER_PIXEL);
            }
            MouseState::Moving { rotate: false } => {
                let delta = target.window_to_world(lx, ly) - target.window_to_world(x, y);
                target.pan_camera(delta.x, delta.y);
            }
            MouseState::MovingObject => {
                let delta = target.window_to_world(x, y) - target.window_to_world(lx, ly);
                if delta != DVec2::ZERO {
                    target.move_selection(Vec2::new(delta.x as f32, delta.y as f32));
                    self.moved_selection = true;
                }
            }
        }
        self.last = (x, y);
    }

    pub fn mouse_up(&mut self, target: &mut dyn SceneTarget, x: f64, y: f64) {
        let state = std::mem::take(&mut self.state);
        let clicked = (x, y) == self.press;
        match state {
            MouseState::None | MouseState::Moving { .. } => {}
            MouseState::MovingObject => {
                if self.moved_selection {
                    target.finish_selection_move();
                } else if clicked {
                    let picks = target.pick_objects_at(x, y);
                    let top: Vec<PickId> = top_pick(&picks).into_iter().collect();
                    target.apply_selection(SelectionMode::Replace, &top);
                }
            }
            MouseState::RectangleSelection { mode } => {
                let picks = if clicked {
                    let picks = target.pick_objects_at(x, y);
                    top_pick(&picks).into_iter().collect()
                } else {
                    let (px, py) = self.press;
                    target.pick_rectangle(px, py, x, y)
                };
                target.apply_selection(mode, &picks);
            }
        }
        self.moved_selection = false;
        tracing::trace!(?state, x, y, "Mouse up");
    }

    /// Positive notches zoom in.
    pub fn mouse_wheel(&mut self, target: &mut dyn SceneTarget, notches: f64) {
        if notches != 0.0 && notches.is_finite() {
            target.zoom_camera(WHEEL_ZOOM_STEP.powf(notches));
        }
    }
}

/// Keyboard camera navigation. Returns whether the key was consumed.
pub fn camera_key(camera: &mut SceneCamera, key: Key, modifiers: Modifiers) -> bool {
    let rect = camera.visible_world_rect();
    let step_x = rect.width() as f64 * KEY_PAN_FRACTION;
    let step_y = rect.height() as f64 * KEY_PAN_FRACTION;
    match key {
        Key::Left if modifiers.alt => camera.rotate_by(0.0, 0.0, -5.0),
        Key::Right if modifiers.alt => camera.rotate_by(0.0, 0.0, 5.0),
        Key::Left => camera.pan_by(-step_x, 0.0),
        Key::Right => camera.pan_by(step_x, 0.0),
        Key::Up => camera.pan_by(0.0, step_y),
        Key::Down => camera.pan_by(0.0, -step_y),
        Key::PageUp => camera.zoom_by(KEY_ZOOM_STEP),
        Key::PageDown => camera.zoom_by(1.0 / KEY_ZOOM_STEP),
        Key::Home => {
            camera.reset_rotation();
            camera.set_zoom(1.0);
        }
        Key::Char(_) | Key::Escape => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::{EdgeIndex, NodeIndex};
    use std::collections::BTreeSet;

    /// Scene with pick regions keyed by exact window position.
    #[derive(Default)]
    struct MockScene {
        objects: Vec<((f64, f64), PickId)>,
        selected: BTreeSet<u32>,
        log: Vec<String>,
        moved: Vec<Vec2>,
        zoom: f64,
    }

    impl MockScene {
        fn with_node(mut self, at: (f64, f64), index: usize) -> Self {
            self.objects.push((at, PickId::node(NodeIndex(index))));
            self
        }
    }

    impl SceneTarget for MockScene {
        fn pick_objects_at(&mut self, x: f64, y: f64) -> Vec<PickId> {
            self.objects
                .iter()
                .filter(|(at, _)| *at == (x, y))
                .map(|(_, p)| *p)
                .collect()
        }

        fn pick_rectangle(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<PickId> {
            self.log.push("rect".into());
            self.objects
                .iter()
                .filter(|((x, y), _)| {
                    *x >= x0.min(x1) && *x <= x0.max(x1) && *y >= y0.min(y1) && *y <= y0.max(y1)
                })
                .map(|(_, p)| *p)
                .collect()
        }

        fn is_pick_selected(&self, pick: PickId) -> bool {
            self.selected.contains(&pick.0)
        }

        fn apply_selection(&mut self, mode: SelectionMode, picks: &[PickId]) {
            self.log.push(format!("{mode:?}:{}", picks.len()));
            let ids = picks.iter().map(|p| p.0);
            match mode {
                SelectionMode::Replace => self.selected = ids.collect(),
                SelectionMode::Extend => self.selected.extend(ids),
                SelectionMode::Reduce => {
                    for id in ids {
                        self.selected.remove(&id);
                    }
                }
            }
        }

        fn window_to_world(&self, x: f64, y: f64) -> DVec2 {
            DVec2::new(x / 10.0, -y / 10.0)
        }

        fn move_selection(&mut self, delta: Vec2) {
            self.moved.push(delta);
        }

        fn finish_selection_move(&mut self) {
            self.log.push("finish".into());
        }

        fn pan_camera(&mut self, dx: f64, dy: f64) {
            self.log.push(format!("pan:{dx}:{dy}"));
        }

        fn rotate_camera(&mut self, _dx: f64, _dy: f64) {
            self.log.push("rotate".into());
        }

        fn zoom_camera(&mut self, factor: f64) {
            self.zoom = factor;
        }
    }

    #[test]
    fn test_click_unselected_node_selects_and_moves() {
        let mut scene = MockScene::default().with_node((10.0, 10.0), 0);
        let mut mouse = MouseController::new();
        mouse.mouse_down(&mut scene, 10.0, 10.0, MouseButton::Left, Modifiers::NONE);
        assert_eq!(mouse.state(), MouseState::MovingObject);
        assert!(scene.is_pick_selected(PickId::node(NodeIndex(0))));

        mouse.mouse_drag(&mut scene, 30.0, 10.0);
        mouse.mouse_up(&mut scene, 30.0, 10.0);
        assert_eq!(scene.moved, vec![Vec2::new(2.0, 0.0)]);
        assert_eq!(scene.log.last().map(String::as_str), Some("finish"));
        assert_eq!(mouse.state(), MouseState::None);
    }

    #[test]
    fn test_click_selected_node_keeps_selection_until_release() {
        let mut scene = MockScene::default()
            .with_node((10.0, 10.0), 0)
            .with_node((50.0, 50.0), 1);
        scene.selected = [PickId::node(NodeIndex(0)).0, PickId::node(NodeIndex(1)).0].into();
        let mut mouse = MouseController::new();
        mouse.mouse_down(&mut scene, 10.0, 10.0, MouseButton::Left, Modifiers::NONE);
        assert_eq!(scene.selected.len(), 2);
        assert!(scene.log.is_empty());

        // zero-distance release replaces the selection with the clicked node
        mouse.mouse_up(&mut scene, 10.0, 10.0);
        assert_eq!(scene.selected.len(), 1);
        assert!(scene.is_pick_selected(PickId::node(NodeIndex(0))));
    }

    #[test]
    fn test_background_click_clears_selection() {
        let mut scene = MockScene::default().with_node((10.0, 10.0), 0);
        scene.selected.insert(PickId::node(NodeIndex(0)).0);
        let mut mouse = MouseController::new();
        mouse.mouse_down(&mut scene, 200.0, 200.0, MouseButton::Left, Modifiers::NONE);
        assert_eq!(
            mouse.state(),
            MouseState::RectangleSelection {
                mode: SelectionMode::Replace
            }
        );
        mouse.mouse_up(&mut scene, 200.0, 200.0);
        assert!(scene.selected.is_empty());
        assert_eq!(scene.log, vec!["Replace:0".to_string()]);
    }

    #[test]
    fn test_ctrl_drag_extends_and_ctrl_alt_reduces() {
        let mut scene = MockScene::default()
            .with_node((10.0, 10.0), 0)
            .with_node((20.0, 20.0), 1)
            .with_node((90.0, 90.0), 2);
        let mut mouse = MouseController::new();
        mouse.mouse_down(&mut scene, 0.0, 0.0, MouseButton::Left, Modifiers::ctrl());
        mouse.mouse_drag(&mut scene, 30.0, 30.0);
        assert_eq!(mouse.rubber_band(), Some(((0.0, 0.0), (30.0, 30.0))));
        mouse.mouse_up(&mut scene, 30.0, 30.0);
        assert_eq!(scene.selected.len(), 2);

        let reduce = Modifiers {
            ctrl: true,
            alt: true,
            ..Modifiers::NONE
        };
        mouse.mouse_down(&mut scene, 15.0, 15.0, MouseButton::Left, reduce);
        assert_eq!(
            mouse.state(),
            MouseState::RectangleSelection {
                mode: SelectionMode::Reduce
            }
        );
        mouse.mouse_up(&mut scene, 25.0, 25.0);
        assert!(scene.is_pick_selected(PickId::node(NodeIndex(0))));
        assert!(!scene.is_pick_selected(PickId::node(NodeIndex(1))));
    }

    #[test]
    fn test_ctrl_click_on_node_extends_with_it() {
        let mut scene = MockScene::default()
            .with_node((10.0, 10.0), 0)
            .with_node((20.0, 20.0), 1);
        scene.selected.insert(PickId::node(NodeIndex(0)).0);
        let mut mouse = MouseController::new();
        mouse.mouse_down(&mut scene, 20.0, 20.0, MouseButton::Left, Modifiers::ctrl());
        mouse.mouse_up(&mut scene, 20.0, 20.0);
        assert_eq!(scene.selected.len(), 2);
    }

    #[test]
    fn test_shift_drag_pans_camera() {
        let mut scene = MockScene::default().with_node((10.0, 10.0), 0);
        let mut mouse = MouseController::new();
        mouse.mouse_down(&mut scene, 10.0, 10.0, MouseButton::Left, Modifiers::shift());
        assert_eq!(mouse.state(), MouseState::Moving { rotate: false });
        mouse.mouse_drag(&mut scene, 20.0, 10.0);
        mouse.mouse_up(&mut scene, 20.0, 10.0);
        assert_eq!(scene.log, vec!["pan:-1:0".to_string()]);
        assert!(scene.selected.is_empty());
    }

    #[test]
    fn test_top_pick_prefers_nodes() {
        let edge = PickId::edge(EdgeIndex(3));
        let node = PickId::node(NodeIndex(1));
        assert_eq!(top_pick(&[edge, node]), Some(node));
        assert_eq!(top_pick(&[edge]), Some(edge));
        assert_eq!(top_pick(&[]), None);
    }

    #[test]
    fn test_wheel_zooms() {
        let mut scene = MockScene::default();
        let mut mouse = MouseController::new();
        mouse.mouse_wheel(&mut scene, 1.0);
        assert!((scene.zoom - WHEEL_ZOOM_STEP).abs() < 1e-12);
    }

    #[test]
    fn test_camera_keys() {
        let mut camera = SceneCamera::new(800, 600);
        let before = camera.x_offset.target;
        assert!(camera_key(&mut camera, Key::Right, Modifiers::NONE));
        assert!(camera.x_offset.target > before);
        assert!(camera_key(&mut camera, Key::PageUp, Modifiers::NONE));
        assert!(camera.z_offset.target < 100.0);
        assert!(camera_key(&mut camera, Key::Home, Modifiers::NONE));
        assert!((camera.z_offset.target - 100.0).abs() < 1e-9);
        assert!(!camera_key(&mut camera, Key::Char('x'), Modifiers::NONE));
    }
}
