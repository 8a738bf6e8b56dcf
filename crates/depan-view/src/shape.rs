//! Unit-radius outlines for node shapes.

use depan_core::{ShapeKind, Vec2};
use std::f32::consts::{FRAC_PI_2, TAU};
use std::sync::LazyLock;

const CIRCLE_SEGMENTS: usize = 24;

static OUTLINES: LazyLock<Vec<Vec<Vec2>>> = LazyLock::new(|| {
    ShapeKind::ALL
        .iter()
        .map(|shape| build_outline(*shape))
        .collect()
});

/// Counter-clockwise outline centered on the origin, radius 1.
pub fn outline(shape: ShapeKind) -> &'static [Vec2] {
    let slot = ShapeKind::ALL
        .iter()
        .position(|s| *s == shape)
        .unwrap_or_default();
    &OUTLINES[slot]
}

fn regular(sides: usize, rotation: f32) -> Vec<Vec2> {
    (0..sides)
        .map(|i| {
            let a = rotation + TAU * i as f32 / sides as f32;
            Vec2::new(a.cos(), a.sin())
        })
        .collect()
}

fn build_outline(shape: ShapeKind) -> Vec<Vec2> {
    match shape {
        ShapeKind::Circle => regular(CIRCLE_SEGMENTS, 0.0),
        ShapeKind::Square => vec![
            Vec2::new(-1.0, -1.0),
            Vec2::new(1.0, -1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(-1.0, 1.0),
        ],
        ShapeKind::Diamond => regular(4, 0.0),
        ShapeKind::Triangle => regular(3, FRAC_PI_2),
        ShapeKind::Hexagon => regular(6, 0.0),
        ShapeKind::Star => (0..10)
            .map(|i| {
                let a = FRAC_PI_2 + TAU * i as f32 / 10.0;
                let r = if i % 2 == 0 { 1.0 } else { 0.45 };
                Vec2::new(a.cos() * r, a.sin() * r)
            })
            .collect(),
        ShapeKind::Group => regular(8, TAU / 16.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_shape_has_an_outline() {
        for shape in ShapeKind::ALL {
            let points = outline(shape);
            assert!(points.len() >= 3, "{shape:?}");
            for p in points {
                assert!(p.length() <= 1.5, "{shape:?} point {p:?}");
            }
        }
        assert_eq!(outline(ShapeKind::Square).len(), 4);
        assert_eq!(outline(ShapeKind::Star).len(), 10);
    }
}
