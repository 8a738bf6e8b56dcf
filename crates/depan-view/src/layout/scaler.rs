use crate::config::DEFAULT_LAYOUT_MARGIN;
use depan_core::{NodeId, Rect, Vec2};
use std::collections::HashMap;

/// Fits a layout into a viewport, keeping its aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutScaler {
    /// Inset on every side of the viewport.
    pub margin: f32,
}

impl Default for LayoutScaler {
    fn default() -> Self {
        Self::new(DEFAULT_LAYOUT_MARGIN)
    }
}

impl LayoutScaler {
    pub fn new(margin: f32) -> Self {
        let margin = if margin.is_finite() && margin >= 0.0 {
            margin
        } else {
            tracing::warn!(margin, "Invalid layout margin; using {DEFAULT_LAYOUT_MARGIN}");
            DEFAULT_LAYOUT_MARGIN
        };
        Self { margin }
    }

    /// Rescale `positions` in place. A single position is left untouched.
    pub fn fit(&self, positions: &mut HashMap<NodeId, Vec2>, viewport: Rect) {
        if positions.len() <= 1 {
            return;
        }
        let Some(bounds) = Rect::from_points(positions.values().copied()) else {
            return;
        };

        let mut target = viewport.expand(-self.margin);
        if target.width() <= 0.0 || target.height() <= 0.0 {
            target = viewport;
        }
        let center = target.center();

        let sx = if bounds.width() > f32::EPSILON {
            Some(target.width() / bounds.width())
        } else {
            None
        };
        let sy = if bounds.height() > f32::EPSILON {
            Some(target.height() / bounds.height())
        } else {
            None
        };
        let scale = match (sx, sy) {
            (Some(x), Some(y)) => x.min(y),
            (Some(s), None) | (None, Some(s)) => s,
            (None, None) => 0.0,
        };

        let origin = bounds.center();
        for p in positions.values_mut() {
            *p = center + (*p - origin) * scale;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_preserves_aspect_ratio() {
        let mut positions = HashMap::from([
            (NodeId(1), Vec2::new(0.0, 0.0)),
            (NodeId(2), Vec2::new(10.0, 5.0)),
        ]);
        let viewport = Rect::from_min_max(Vec2::new(0.0, 0.0), Vec2::new(100.0, 100.0));
        LayoutScaler::new(0.0).fit(&mut positions, viewport);
        assert_eq!(positions[&NodeId(1)], Vec2::new(0.0, 25.0));
        assert_eq!(positions[&NodeId(2)], Vec2::new(100.0, 75.0));
    }

    #[test]
    fn test_coincident_points_move_to_center() {
        let mut positions = HashMap::from([
            (NodeId(1), Vec2::new(3.0, 3.0)),
            (NodeId(2), Vec2::new(3.0, 3.0)),
        ]);
        let viewport = Rect::from_min_max(Vec2::new(0.0, 0.0), Vec2::new(10.0, 20.0));
        LayoutScaler::default().fit(&mut positions, viewport);
        assert_eq!(positions[&NodeId(1)], Vec2::new(5.0, 10.0));
        assert_eq!(positions[&NodeId(2)], Vec2::new(5.0, 10.0));
    }

    #[test]
    fn test_single_point_is_untouched() {
        let mut positions = HashMap::from([(NodeId(1), Vec2::new(-40.0, 3.0))]);
        let viewport = Rect::from_min_max(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0));
        LayoutScaler::default().fit(&mut positions, viewport);
        assert_eq!(positions[&NodeId(1)], Vec2::new(-40.0, 3.0));
    }

    #[test]
    fn test_negative_margin_falls_back() {
        assert_eq!(LayoutScaler::new(-1.0).margin, DEFAULT_LAYOUT_MARGIN);
    }
}
