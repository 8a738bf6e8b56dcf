//! Optional hyperbolic (fish-eye) projection of the layout plane.
//!
//! Maps the unbounded plane onto a disk of radius `R`: points near the origin
//! keep their scale while distant points crowd against the rim. The inverse is
//! undefined on and outside the rim.

use glam::DVec2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HyperbolicProjection {
    radius: f64,
}

impl HyperbolicProjection {
    /// `None` for a non-positive or non-finite radius.
    pub fn new(radius: f64) -> Option<Self> {
        (radius.is_finite() && radius > 0.0).then_some(Self { radius })
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// `p · R / (R + |p|)`
    pub fn to_disk(&self, p: DVec2) -> DVec2 {
        p * (self.radius / (self.radius + p.length()))
    }

    /// Inverse of [`to_disk`](Self::to_disk); `None` at or beyond the rim.
    pub fn from_disk(&self, q: DVec2) -> Option<DVec2> {
        let d = q.length();
        if !d.is_finite() || d >= self.radius {
            return None;
        }
        Some(q * (self.radius / (self.radius - d)))
    }
}
