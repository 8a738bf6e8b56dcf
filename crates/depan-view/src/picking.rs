//! Select-mode rendering and hit decoding.
//!
//! Picking renders a frame through the normal pipeline into a
//! [`SelectionSurface`]. Instead of rasterizing, the surface projects each
//! primitive to window space, tests it against the pick region and records a
//! hit record per pick name, in the layout GL's selection buffer uses:
//! `[name_count, z_min, z_max, names...]`.

use crate::surface::{DrawingSurface, Primitive, TextureId};
use depan_core::{Color, Vec2};
use glam::{DMat4, DVec2, DVec3, DVec4};

/// Hit records a pick may produce before overflowing.
pub fn pick_capacity(node_count: usize, edge_count: usize) -> usize {
    2 * node_count + edge_count
}

/// Pick region in GL window coordinates (origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickRegion {
    pub min: DVec2,
    pub max: DVec2,
}

impl PickRegion {
    /// Square of side `tolerance` centered on a window pixel (origin top-left).
    pub fn around(x: f64, y: f64, tolerance: f64, window_height: f64) -> Self {
        let center = DVec2::new(x, window_height - y);
        let half = DVec2::splat(tolerance.max(1.0) / 2.0);
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Rectangle spanned by two window pixels (origin top-left), in any order.
    pub fn spanning(x0: f64, y0: f64, x1: f64, y1: f64, window_height: f64) -> Self {
        let a = DVec2::new(x0, window_height - y0);
        let b = DVec2::new(x1, window_height - y1);
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) / 2.0
    }
}

/// Finished selection buffer. A negative hit count means overflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickBuffer {
    pub data: Vec<u32>,
    pub hits: i32,
}

impl PickBuffer {
    pub fn names(&self) -> Vec<u32> {
        decode_hits(&self.data, self.hits)
    }
}

/// Final name of every hit record, in record order.
///
/// A negative hit count (overflow) yields no hits. A truncated record ends
/// decoding early.
pub fn decode_hits(buffer: &[u32], hits: i32) -> Vec<u32> {
    if hits < 0 {
        tracing::warn!("Pick buffer overflowed; ignoring hits");
        return Vec::new();
    }
    let mut names = Vec::with_capacity(hits as usize);
    let mut pos = 0usize;
    for _ in 0..hits {
        let Some(&count) = buffer.get(pos) else {
            break;
        };
        // name count, then min and max depth
        pos += 3;
        let count = count as usize;
        if count == 0 {
            continue;
        }
        let Some(&name) = buffer.get(pos + count - 1) else {
            tracing::debug!("Truncated hit record at {pos}");
            break;
        };
        names.push(name);
        pos += count;
    }
    names
}

#[derive(Debug)]
pub struct SelectionSurface {
    region: PickRegion,
    viewport: DVec2,
    projection: DMat4,
    model_view: DMat4,
    stack: Vec<DMat4>,
    primitive: Option<Primitive>,
    vertices: Vec<DVec3>,
    name: Option<u32>,
    pending: Option<(f64, f64)>,
    capacity: usize,
    records: usize,
    data: Vec<u32>,
    overflow: bool,
    next_texture: u32,
}

impl SelectionSurface {
    pub fn new(region: PickRegion, width: u32, height: u32, capacity: usize) -> Self {
        Self {
            region,
            viewport: DVec2::new(width.max(1) as f64, height.max(1) as f64),
            projection: DMat4::IDENTITY,
            model_view: DMat4::IDENTITY,
            stack: Vec::new(),
            primitive: None,
            vertices: Vec::new(),
            name: None,
            pending: None,
            capacity,
            records: 0,
            data: Vec::new(),
            overflow: false,
            next_texture: 0,
        }
    }

    /// Flush the open record and hand back the buffer.
    pub fn finish(mut self) -> PickBuffer {
        self.flush();
        let hits = if self.overflow {
            tracing::warn!(capacity = self.capacity, "Pick buffer overflow");
            -1
        } else {
            self.records as i32
        };
        PickBuffer {
            data: self.data,
            hits,
        }
    }

    fn flush(&mut self) {
        let (Some(name), Some((z_min, z_max))) = (self.name, self.pending.take()) else {
            return;
        };
        if self.records >= self.capacity {
            self.overflow = true;
            return;
        }
        self.data
            .extend_from_slice(&[1, depth_to_u32(z_min), depth_to_u32(z_max), name]);
        self.records += 1;
    }

    /// Window-space position and depth of a model-space vertex.
    fn to_window(&self, vertex: DVec3) -> Option<DVec3> {
        let clip = self.projection * self.model_view * DVec4::new(vertex.x, vertex.y, vertex.z, 1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(DVec3::new(
            (ndc.x + 1.0) / 2.0 * self.viewport.x,
            (ndc.y + 1.0) / 2.0 * self.viewport.y,
            (ndc.z + 1.0) / 2.0,
        ))
    }

    fn primitive_hits(&self, primitive: Primitive, points: &[DVec2]) -> bool {
        let region = &self.region;
        match primitive {
            Primitive::Polygon => polygon_hits(points, region),
            Primitive::LineLoop => {
                closed_segments(points).any(|(a, b)| segment_hits(a, b, region))
                    || (points.len() == 1 && region.contains(points[0]))
            }
            Primitive::LineStrip => {
                points.windows(2).any(|w| segment_hits(w[0], w[1], region))
                    || (points.len() == 1 && region.contains(points[0]))
            }
            Primitive::Lines => points
                .chunks_exact(2)
                .any(|pair| segment_hits(pair[0], pair[1], region)),
        }
    }
}

fn depth_to_u32(z: f64) -> u32 {
    (z.clamp(0.0, 1.0) * u32::MAX as f64) as u32
}

fn closed_segments(points: &[DVec2]) -> impl Iterator<Item = (DVec2, DVec2)> + '_ {
    let n = points.len();
    let count = if n > 1 { n } else { 0 };
    (0..count).map(move |i| (points[i], points[(i + 1) % n]))
}

fn polygon_hits(points: &[DVec2], region: &PickRegion) -> bool {
    if points.is_empty() {
        return false;
    }
    points.iter().any(|p| region.contains(*p))
        || point_in_polygon(region.center(), points)
        || closed_segments(points).any(|(a, b)| segment_hits(a, b, region))
}

/// Even-odd rule, so concave outlines such as stars work.
fn point_in_polygon(p: DVec2, polygon: &[DVec2]) -> bool {
    let mut inside = false;
    for (a, b) in closed_segments(polygon) {
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x {
                inside = !inside;
            }
        }
    }
    inside
}

/// Liang-Barsky clip of a segment against the region.
fn segment_hits(a: DVec2, b: DVec2, region: &PickRegion) -> bool {
    let d = b - a;
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;
    let checks = [
        (-d.x, a.x - region.min.x),
        (d.x, region.max.x - a.x),
        (-d.y, a.y - region.min.y),
        (d.y, region.max.y - a.y),
    ];
    for (p, q) in checks {
        if p == 0.0 {
            if q < 0.0 {
                return false;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return false;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return false;
            }
            t1 = t1.min(r);
        }
    }
    t0 <= t1
}

impl DrawingSurface for SelectionSurface {
    fn begin_frame(&mut self, projection: &DMat4, view: &DMat4) {
        self.projection = *projection;
        self.model_view = *view;
        self.stack.clear();
    }

    fn end_frame(&mut self) {
        self.flush();
    }

    fn push_matrix(&mut self) {
        self.stack.push(self.model_view);
    }

    fn pop_matrix(&mut self) {
        if let Some(m) = self.stack.pop() {
            self.model_view = m;
        }
    }

    fn translate(&mut self, x: f32, y: f32, z: f32) {
        self.model_view *= DMat4::from_translation(DVec3::new(x as f64, y as f64, z as f64));
    }

    fn scale(&mut self, sx: f32, sy: f32, sz: f32) {
        self.model_view *= DMat4::from_scale(DVec3::new(sx as f64, sy as f64, sz as f64));
    }

    fn set_color(&mut self, _color: Color) {}

    fn set_line_width(&mut self, _width: f32) {}

    fn set_line_dash(&mut self, _dashed: bool) {}

    fn begin(&mut self, primitive: Primitive) {
        self.primitive = Some(primitive);
        self.vertices.clear();
    }

    fn vertex(&mut self, x: f32, y: f32) {
        self.vertices.push(DVec3::new(x as f64, y as f64, 0.0));
    }

    fn end(&mut self) {
        let Some(primitive) = self.primitive.take() else {
            return;
        };
        if self.name.is_none() {
            return;
        }
        let mut window = Vec::with_capacity(self.vertices.len());
        for v in &self.vertices {
            match self.to_window(*v) {
                Some(w) => window.push(w),
                // behind the eye
                None => return,
            }
        }
        let points: Vec<DVec2> = window.iter().map(|w| w.truncate()).collect();
        if !self.primitive_hits(primitive, &points) {
            return;
        }
        let z_min = window.iter().map(|w| w.z).fold(f64::INFINITY, f64::min);
        let z_max = window.iter().map(|w| w.z).fold(f64::NEG_INFINITY, f64::max);
        self.pending = Some(match self.pending {
            Some((lo, hi)) => (lo.min(z_min), hi.max(z_max)),
            None => (z_min, z_max),
        });
    }

    fn load_name(&mut self, name: u32) {
        self.flush();
        self.name = Some(name);
    }

    fn create_text_texture(&mut self, _text: &str) -> TextureId {
        let id = TextureId(self.next_texture);
        self.next_texture += 1;
        id
    }

    fn release_texture(&mut self, _texture: TextureId) {}

    fn draw_texture(&mut self, _texture: TextureId, _at: Vec2, _height: f32) {}
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_decode_never_exceeds_hit_count(
            data in proptest::collection::vec(0u32..8, 0..40),
            hits in -2i32..10,
        ) {
            let names = decode_hits(&data, hits);
            prop_assert!(names.len() <= hits.max(0) as usize);
        }
    }
}
