//! Perspective camera over the z = 0 layout plane.
//!
//! Every camera quantity has a current value and a target. Interaction moves
//! targets; [`SceneCamera::step`] eases the current values toward them once
//! per frame. All matrix math runs in f64 so picking far from the origin
//! stays exact.

use crate::hyperbolic::HyperbolicProjection;
use depan_core::{Rect, Vec2};
use glam::{DMat4, DVec2, DVec3, DVec4};

/// Easing divisor: each step covers `1/SPEED` of the remaining distance.
pub const SPEED: f64 = 5.0;
pub const FOV_DEGREES: f64 = 45.0;
pub const Z_NEAR: f64 = 0.4;
pub const Z_FAR: f64 = 1000.0;
/// Eye distance at which the zoom reads 100%.
pub const HUNDRED_PERCENT_ZOOM: f64 = 100.0;
/// Closest the eye may get to the plane.
pub const ZOOM_MIN_DISTANCE: f64 = 1.1;
const ZOOM_MAX_DISTANCE: f64 = Z_FAR * 0.9;
const FIT_PADDING: f64 = 1.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Eased {
    pub value: f64,
    pub target: f64,
}

impl Eased {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            target: value,
        }
    }

    pub fn step(&mut self) {
        self.value += (self.target - self.value) / SPEED;
    }

    pub fn is_settled(&self, epsilon: f64) -> bool {
        (self.target - self.value).abs() <= epsilon
    }

    pub fn jump(&mut self) {
        self.value = self.target;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionMode {
    Planar,
    Hyperbolic(HyperbolicProjection),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneCamera {
    pub x_offset: Eased,
    pub y_offset: Eased,
    pub z_offset: Eased,
    pub x_rotation: Eased,
    pub y_rotation: Eased,
    pub z_rotation: Eased,
    width: u32,
    height: u32,
    mode: ProjectionMode,
}

impl Default for SceneCamera {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

impl SceneCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            x_offset: Eased::new(0.0),
            y_offset: Eased::new(0.0),
            z_offset: Eased::new(HUNDRED_PERCENT_ZOOM),
            x_rotation: Eased::new(0.0),
            y_rotation: Eased::new(0.0),
            z_rotation: Eased::new(0.0),
            width: width.max(1),
            height: height.max(1),
            mode: ProjectionMode::Planar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
    }

    pub fn viewport(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    pub fn projection_mode(&self) -> ProjectionMode {
        self.mode
    }

    pub fn set_projection_mode(&mut self, mode: ProjectionMode) {
        self.mode = mode;
    }

    pub fn hyperbolic(&self) -> Option<HyperbolicProjection> {
        match self.mode {
            ProjectionMode::Planar => None,
            ProjectionMode::Hyperbolic(h) => Some(h),
        }
    }

    fn values_mut(&mut self) -> [&mut Eased; 6] {
        [
            &mut self.x_offset,
            &mut self.y_offset,
            &mut self.z_offset,
            &mut self.x_rotation,
            &mut self.y_rotation,
            &mut self.z_rotation,
        ]
    }

    /// Ease every value one step toward its target.
    pub fn step(&mut self) {
        for value in self.values_mut() {
            value.step();
        }
    }

    pub fn is_settled(&self, epsilon: f64) -> bool {
        [
            self.x_offset,
            self.y_offset,
            self.z_offset,
            self.x_rotation,
            self.y_rotation,
            self.z_rotation,
        ]
        .iter()
        .all(|v| v.is_settled(epsilon))
    }

    /// Skip the easing and land on the targets.
    pub fn jump_to_targets(&mut self) {
        for value in self.values_mut() {
            value.jump();
        }
    }

    pub fn zoom(&self) -> f64 {
        HUNDRED_PERCENT_ZOOM / self.z_offset.value
    }

    /// Target a zoom scale, 1.0 being 100%. Non-positive scales are ignored.
    pub fn set_zoom(&mut self, scale: f64) {
        if !(scale.is_finite() && scale > 0.0) {
            tracing::debug!("Ignoring zoom scale {scale}");
            return;
        }
        self.set_eye_distance(HUNDRED_PERCENT_ZOOM / scale);
    }

    /// Multiply the target zoom by `factor`.
    pub fn zoom_by(&mut self, factor: f64) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        self.set_eye_distance(self.z_offset.target / factor);
    }

    pub fn set_eye_distance(&mut self, distance: f64) {
        self.z_offset.target = distance.clamp(ZOOM_MIN_DISTANCE, ZOOM_MAX_DISTANCE);
    }

    pub fn pan_to(&mut self, x: f64, y: f64) {
        self.x_offset.target = x;
        self.y_offset.target = y;
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.x_offset.target += dx;
        self.y_offset.target += dy;
    }

    /// Rotate the targets, in degrees.
    pub fn rotate_by(&mut self, dx: f64, dy: f64, dz: f64) {
        self.x_rotation.target += dx;
        self.y_rotation.target += dy;
        self.z_rotation.target += dz;
    }

    pub fn reset_rotation(&mut self) {
        self.x_rotation.target = 0.0;
        self.y_rotation.target = 0.0;
        self.z_rotation.target = 0.0;
    }

    /// Target a view centered on `bounds` with all of it visible.
    pub fn zoom_to_fit(&mut self, bounds: Rect) {
        let center = bounds.center();
        self.pan_to(center.x as f64, center.y as f64);
        let half_height = (bounds.height() as f64 / 2.0)
            .max(bounds.width() as f64 / 2.0 / self.aspect());
        let tan = (FOV_DEGREES.to_radians() / 2.0).tan();
        self.set_eye_distance(half_height * FIT_PADDING / tan);
    }

    pub fn projection_matrix(&self) -> DMat4 {
        DMat4::perspective_rh_gl(FOV_DEGREES.to_radians(), self.aspect(), Z_NEAR, Z_FAR)
    }

    /// Eye translation followed by x, y and z rotations.
    pub fn view_matrix(&self) -> DMat4 {
        DMat4::from_translation(DVec3::new(
            -self.x_offset.value,
            -self.y_offset.value,
            -self.z_offset.value,
        )) * DMat4::from_rotation_x(self.x_rotation.value.to_radians())
            * DMat4::from_rotation_y(self.y_rotation.value.to_radians())
            * DMat4::from_rotation_z(self.z_rotation.value.to_radians())
    }

    /// Window coordinates (GL convention, origin bottom-left, depth in
    /// `[0, 1]`) back to world space.
    pub fn unproject(&self, win_x: f64, win_y: f64, win_z: f64) -> Option<DVec3> {
        let inverse = (self.projection_matrix() * self.view_matrix()).inverse();
        let ndc = DVec4::new(
            2.0 * win_x / self.width as f64 - 1.0,
            2.0 * win_y / self.height as f64 - 1.0,
            2.0 * win_z - 1.0,
            1.0,
        );
        let world = inverse * ndc;
        if world.w == 0.0 || !world.is_finite() {
            return None;
        }
        Some(world.truncate() / world.w)
    }

    /// Point on the z = 0 plane under a window pixel (origin top-left).
    ///
    /// Un-projects at the near and far planes and intersects that ray with
    /// the plane. In hyperbolic mode the plane point is mapped back out of
    /// the disk; pixels beyond the rim fall back to the disk point.
    pub fn window_to_world(&self, x: f64, y: f64) -> DVec2 {
        let gl_y = self.height as f64 - y;
        let (Some(near), Some(far)) = (self.unproject(x, gl_y, 0.0), self.unproject(x, gl_y, 1.0))
        else {
            return DVec2::new(self.x_offset.value, self.y_offset.value);
        };
        let dir = far - near;
        let on_plane = if dir.z.abs() < f64::EPSILON {
            near.truncate()
        } else {
            (near + dir * (-near.z / dir.z)).truncate()
        };
        match self.mode {
            ProjectionMode::Planar => on_plane,
            ProjectionMode::Hyperbolic(h) => h.from_disk(on_plane).unwrap_or(on_plane),
        }
    }

    /// Window pixel (origin top-left) of a world point, `None` behind the eye.
    pub fn world_to_window(&self, p: DVec2) -> Option<DVec2> {
        let p = match self.mode {
            ProjectionMode::Planar => p,
            ProjectionMode::Hyperbolic(h) => h.to_disk(p),
        };
        let clip = self.projection_matrix() * self.view_matrix() * DVec4::new(p.x, p.y, 0.0, 1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        let x = (ndc.x + 1.0) / 2.0 * self.width as f64;
        let gl_y = (ndc.y + 1.0) / 2.0 * self.height as f64;
        Some(DVec2::new(x, self.height as f64 - gl_y))
    }

    /// World rectangle covered by the window at the current camera.
    pub fn visible_world_rect(&self) -> Rect {
        let (w, h) = (self.width as f64, self.height as f64);
        let corners = [(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)]
            .map(|(x, y)| self.window_to_world(x, y))
            .map(|p| Vec2::new(p.x as f32, p.y as f32));
        Rect::from_points(corners).unwrap_or_else(|| Rect::from_center_size(Vec2::ZERO, Vec2::ZERO))
    }
}
