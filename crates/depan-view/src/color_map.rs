//! Piecewise-linear color maps for degree and rank coloring.
//!
//! A map has four components (red, green, blue, alpha). Each component is a
//! list of control points `[x, below, above]`: `below` is the value reached
//! when approaching `x` from the left, `above` the value leaving it to the
//! right. The first point sits at `x = 0.0`, the last at `x = 1.0`.

use crate::error::ColorMapError;
use depan_core::Color;
use serde::{Deserialize, Serialize};

pub type ControlPoint = [f32; 3];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorMapDefinition {
    pub components: Vec<Vec<ControlPoint>>,
}

impl ColorMapDefinition {
    pub fn new(
        red: &[ControlPoint],
        green: &[ControlPoint],
        blue: &[ControlPoint],
        alpha: &[ControlPoint],
    ) -> Self {
        Self {
            components: vec![red.to_vec(), green.to_vec(), blue.to_vec(), alpha.to_vec()],
        }
    }

    pub fn validate(&self) -> Result<(), ColorMapError> {
        if self.components.len() != 4 {
            return Err(ColorMapError::ComponentCount(self.components.len()));
        }
        for (component, points) in self.components.iter().enumerate() {
            if points.len() < 2 {
                return Err(ColorMapError::TooFewPoints { component });
            }
            let first = points[0][0];
            let last = points[points.len() - 1][0];
            if first != 0.0 || last != 1.0 {
                return Err(ColorMapError::Boundary { component });
            }
            if points.windows(2).any(|w| !(w[0][0] < w[1][0])) {
                return Err(ColorMapError::NotIncreasing { component });
            }
            let in_range = |v: f32| (0.0..=1.0).contains(&v);
            if points.iter().any(|p| !in_range(p[1]) || !in_range(p[2])) {
                return Err(ColorMapError::ValueRange { component });
            }
        }
        Ok(())
    }
}

const OPAQUE: [ControlPoint; 2] = [[0.0, 1.0, 1.0], [1.0, 1.0, 1.0]];

const JET_RED: [ControlPoint; 5] = [
    [0.0, 0.0, 0.0],
    [0.35, 0.0, 0.0],
    [0.66, 1.0, 1.0],
    [0.89, 1.0, 1.0],
    [1.0, 0.5, 0.5],
];
const JET_GREEN: [ControlPoint; 6] = [
    [0.0, 0.0, 0.0],
    [0.125, 0.0, 0.0],
    [0.375, 1.0, 1.0],
    [0.64, 1.0, 1.0],
    [0.91, 0.0, 0.0],
    [1.0, 0.0, 0.0],
];
const JET_BLUE: [ControlPoint; 5] = [
    [0.0, 0.5, 0.5],
    [0.11, 1.0, 1.0],
    [0.34, 1.0, 1.0],
    [0.65, 0.0, 0.0],
    [1.0, 0.0, 0.0],
];

const HOT_RED: [ControlPoint; 3] = [
    [0.0, 0.0416, 0.0416],
    [0.365079, 1.0, 1.0],
    [1.0, 1.0, 1.0],
];
const HOT_GREEN: [ControlPoint; 4] = [
    [0.0, 0.0, 0.0],
    [0.365079, 0.0, 0.0],
    [0.746032, 1.0, 1.0],
    [1.0, 1.0, 1.0],
];
const HOT_BLUE: [ControlPoint; 3] = [[0.0, 0.0, 0.0], [0.746032, 0.0, 0.0], [1.0, 1.0, 1.0]];

const RAMP_UP: [ControlPoint; 2] = [[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]];
const RAMP_DOWN: [ControlPoint; 2] = [[0.0, 1.0, 1.0], [1.0, 0.0, 0.0]];

pub const BUILTIN_NAMES: [&str; 4] = ["jet", "hot", "cool", "gray"];
pub const DEFAULT_MAP: &str = "jet";

pub fn builtin(name: &str) -> Option<ColorMapDefinition> {
    let def = match name {
        "jet" => ColorMapDefinition::new(&JET_RED, &JET_GREEN, &JET_BLUE, &OPAQUE),
        "hot" => ColorMapDefinition::new(&HOT_RED, &HOT_GREEN, &HOT_BLUE, &OPAQUE),
        "cool" => ColorMapDefinition::new(&RAMP_UP, &RAMP_DOWN, &OPAQUE, &OPAQUE),
        "gray" => ColorMapDefinition::new(&RAMP_UP, &RAMP_UP, &RAMP_UP, &OPAQUE),
        _ => return None,
    };
    Some(def)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColorMap {
    definition: ColorMapDefinition,
}

impl Default for ColorMap {
    fn default() -> Self {
        Self::default_map()
    }
}

impl ColorMap {
    /// Build from a definition, falling back to [`DEFAULT_MAP`] when it is invalid.
    pub fn new(definition: ColorMapDefinition) -> Self {
        match Self::try_new(definition) {
            Ok(map) => map,
            Err(err) => {
                tracing::warn!("Invalid color map ({err}); using {DEFAULT_MAP}");
                Self::default_map()
            }
        }
    }

    pub fn try_new(definition: ColorMapDefinition) -> Result<Self, ColorMapError> {
        definition.validate()?;
        Ok(Self { definition })
    }

    /// Look up a built-in by name, falling back to [`DEFAULT_MAP`] when unknown.
    pub fn named(name: &str) -> Self {
        match builtin(name) {
            Some(definition) => Self { definition },
            None => {
                tracing::warn!("Unknown color map {name:?}; using {DEFAULT_MAP}");
                Self::default_map()
            }
        }
    }

    pub fn default_map() -> Self {
        Self {
            definition: ColorMapDefinition::new(&JET_RED, &JET_GREEN, &JET_BLUE, &OPAQUE),
        }
    }

    pub fn definition(&self) -> &ColorMapDefinition {
        &self.definition
    }

    /// Unit-range RGBA for `p`, clamped to `[0, 1]`. NaN maps like 0.
    pub fn unit_color(&self, p: f32) -> [f32; 4] {
        let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
        let mut out = [0.0; 4];
        for (slot, points) in out.iter_mut().zip(&self.definition.components) {
            *slot = interpolate(points, p);
        }
        out
    }

    pub fn get_color(&self, p: f32) -> Color {
        let [r, g, b, a] = self.unit_color(p);
        Color::from_unit(r, g, b, a)
    }
}

fn interpolate(points: &[ControlPoint], p: f32) -> f32 {
    for pair in points.windows(2) {
        let [x0, _, above] = pair[0];
        let [x1, below, _] = pair[1];
        if p <= x1 {
            let t = (p - x0) / (x1 - x0);
            return above + (below - above) * t;
        }
    }
    points.last().map(|p| p[1]).unwrap_or(0.0)
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_components_stay_in_unit_range(p in -2.0f32..2.0, idx in 0usize..4) {
            let map = ColorMap::named(BUILTIN_NAMES[idx]);
            for v in map.unit_color(p) {
                prop_assert!((0.0..=1.0).contains(&v));
            }
        }

        #[test]
        fn prop_monotonic_between_control_points(a in 0.0f32..1.0, b in 0.0f32..1.0) {
            // jet red rises monotonically on [0.35, 0.66]
            let map = ColorMap::named("jet");
            let lo = 0.35 + 0.31 * a.min(b);
            let hi = 0.35 + 0.31 * a.max(b);
            prop_assert!(map.unit_color(lo)[0] <= map.unit_color(hi)[0] + 1e-6);
        }
    }
}
