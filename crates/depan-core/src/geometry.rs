//! Plane geometry shared by the layout engine and the renderer.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        self.length_sq().sqrt()
    }

    pub fn length_sq(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (self - other).length()
    }

    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Counter-clockwise perpendicular.
    pub fn perp(self) -> Vec2 {
        Vec2::new(-self.y, self.x)
    }

    /// Unit vector in the same direction, or zero for a zero-length vector.
    pub fn normalized_or_zero(self) -> Vec2 {
        let len = self.length();
        if len > f32::EPSILON {
            self / len
        } else {
            Vec2::ZERO
        }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Vec2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f32> for Vec2 {
    type Output = Vec2;
    fn div(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// Axis aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    /// Create a new rectangle from min and max corners
    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Create a new rectangle from position and size
    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self {
            min: pos,
            max: Vec2::new(pos.x + size.x, pos.y + size.y),
        }
    }

    /// Rectangle centered on `center` with the given full size.
    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Bounding box of a set of points. `None` when the iterator is empty.
    pub fn from_points(points: impl IntoIterator<Item = Vec2>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut rect = Self {
            min: first,
            max: first,
        };
        for p in points {
            rect.min.x = rect.min.x.min(p.x);
            rect.min.y = rect.min.y.min(p.y);
            rect.max.x = rect.max.x.max(p.x);
            rect.max.y = rect.max.y.max(p.y);
        }
        Some(rect)
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width(), self.height())
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.min.x + self.width() * 0.5,
            self.min.y + self.height() * 0.5,
        )
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Grow (or shrink, for negative amounts) on every side.
    pub fn expand(&self, amount: f32) -> Rect {
        Rect {
            min: Vec2::new(self.min.x - amount, self.min.y - amount),
            max: Vec2::new(self.max.x + amount, self.max.y + amount),
        }
    }
}

/// A composable point transform.
///
/// Layout post-processing and keyboard stretch commands are expressed as
/// translaters so they can be chained before being applied to node positions.
#[derive(Debug, Clone, PartialEq)]
pub enum Translater {
    Identity,
    Delta(Vec2),
    Scale(Vec2),
    /// Apply the first, then the second.
    Compose(Box<Translater>, Box<Translater>),
}

impl Translater {
    pub fn identity() -> Self {
        Translater::Identity
    }

    pub fn delta(dx: f32, dy: f32) -> Self {
        Translater::Delta(Vec2::new(dx, dy))
    }

    pub fn scale(sx: f32, sy: f32) -> Self {
        Translater::Scale(Vec2::new(sx, sy))
    }

    /// Scale about a fixed point instead of the origin.
    pub fn scale_about(center: Vec2, sx: f32, sy: f32) -> Self {
        Translater::delta(-center.x, -center.y)
            .then(Translater::scale(sx, sy))
            .then(Translater::delta(center.x, center.y))
    }

    pub fn then(self, next: Translater) -> Self {
        match (self, next) {
            (Translater::Identity, next) => next,
            (first, Translater::Identity) => first,
            (first, next) => Translater::Compose(Box::new(first), Box::new(next)),
        }
    }

    pub fn translate(&self, point: Vec2) -> Vec2 {
        match self {
            Translater::Identity => point,
            Translater::Delta(d) => point + *d,
            Translater::Scale(s) => Vec2::new(point.x * s.x, point.y * s.y),
            Translater::Compose(first, second) => second.translate(first.translate(point)),
        }
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn non_zero_scale() -> impl Strategy<Value = f32> {
        prop_oneof![0.05f32..20.0, -20.0f32..-0.05]
    }

    proptest! {
        /// Scaling by (sx, sy) then by (1/sx, 1/sy) is the identity.
        #[test]
        fn prop_scale_round_trip(
            x in -1000.0f32..1000.0,
            y in -1000.0f32..1000.0,
            sx in non_zero_scale(),
            sy in non_zero_scale(),
        ) {
            let t = Translater::scale(sx, sy).then(Translater::scale(1.0 / sx, 1.0 / sy));
            let p = t.translate(Vec2::new(x, y));
            let tolerance = 1e-3 * (1.0 + x.abs().max(y.abs()));
            prop_assert!((p.x - x).abs() <= tolerance, "x {} -> {}", x, p.x);
            prop_assert!((p.y - y).abs() <= tolerance, "y {} -> {}", y, p.y);
        }

        #[test]
        fn prop_delta_round_trip(
            x in -1000.0f32..1000.0,
            y in -1000.0f32..1000.0,
            dx in -500.0f32..500.0,
            dy in -500.0f32..500.0,
        ) {
            let t = Translater::delta(dx, dy).then(Translater::delta(-dx, -dy));
            let p = t.translate(Vec2::new(x, y));
            prop_assert!((p.x - x).abs() <= 1e-3);
            prop_assert!((p.y - y).abs() <= 1e-3);
        }
    }
}
