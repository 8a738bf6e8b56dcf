//! Fruchterman-Reingold spring embedder.
//!
//! Starting points come from a seeded hash of each node id, so a run is
//! reproducible regardless of input order. Repulsion is the quadratic part
//! and is computed per node in parallel; each node only reads the previous
//! iteration's positions, so the result does not depend on thread timing.

use super::{LayoutContext, LayoutGenerator};
use depan_core::{NodeId, Vec2};
use rayon::prelude::*;
use std::collections::HashMap;

const MIN_DISTANCE: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceDirectedLayout {
    pub iterations: usize,
    pub seed: u64,
    /// Ideal edge length.
    pub spring_length: f32,
}

impl Default for ForceDirectedLayout {
    fn default() -> Self {
        Self {
            iterations: 200,
            seed: 0x5EED_DE9A,
            spring_length: 1.0,
        }
    }
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Uniform in `[0, 1)`.
fn unit(bits: u64) -> f32 {
    (bits >> 40) as f32 / (1u64 << 24) as f32
}

impl ForceDirectedLayout {
    fn seed_position(&self, node: NodeId, side: f32) -> Vec2 {
        let a = splitmix64(self.seed ^ node.0 as u64);
        let b = splitmix64(a);
        Vec2::new(unit(a) * side, unit(b) * side)
    }
}

/// Unit vector apart from `other`, with a stable fallback for coincident points.
fn apart(delta: Vec2, i: usize, j: usize) -> (Vec2, f32) {
    let distance = delta.length();
    if distance > MIN_DISTANCE {
        (delta / distance, distance)
    } else {
        let angle = (i * 31 + j * 17) as f32;
        (Vec2::new(angle.cos(), angle.sin()), MIN_DISTANCE)
    }
}

impl LayoutGenerator for ForceDirectedLayout {
    fn name(&self) -> &'static str {
        "force"
    }

    fn execute(&self, ctx: &LayoutContext) -> HashMap<NodeId, Vec2> {
        let nodes = &ctx.movable;
        let n = nodes.len();
        if n == 0 {
            return HashMap::new();
        }
        let k = self.spring_length.max(MIN_DISTANCE);
        let side = (n as f32).sqrt() * k;
        let index: HashMap<NodeId, usize> = nodes.iter().enumerate().map(|(i, n)| (*n, i)).collect();
        let mut links = Vec::new();
        for (i, node) in nodes.iter().enumerate() {
            for other in ctx.neighbors(*node) {
                if let Some(&j) = index.get(other) {
                    if i < j {
                        links.push((i, j));
                    }
                }
            }
        }

        let mut positions: Vec<Vec2> = nodes.iter().map(|n| self.seed_position(*n, side)).collect();
        let start_temperature = side / 10.0 + k;

        for iteration in 0..self.iterations {
            let current = &positions;
            let mut displacement: Vec<Vec2> = (0..n)
                .into_par_iter()
                .map(|i| {
                    let mut push = Vec2::ZERO;
                    for j in 0..n {
                        if i == j {
                            continue;
                        }
                        let (dir, distance) = apart(current[i] - current[j], i, j);
                        push += dir * (k * k / distance);
                    }
                    push
                })
                .collect();

            for &(i, j) in &links {
                let (dir, distance) = apart(positions[i] - positions[j], i, j);
                let pull = dir * (distance * distance / k);
                displacement[i] -= pull;
                displacement[j] += pull;
            }

            let temperature =
                start_temperature * (1.0 - iteration as f32 / self.iterations as f32);
            for (p, d) in positions.iter_mut().zip(&displacement) {
                let length = d.length();
                if length > 0.0 && length.is_finite() {
                    *p += *d / length * length.min(temperature);
                }
            }
        }

        nodes.iter().copied().zip(positions).collect()
    }
}
