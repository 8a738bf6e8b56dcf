//! Immediate-mode drawing surface driven by the pipeline's draw stage.
//!
//! The surface mirrors the small subset of fixed-function GL the renderer
//! needs: a model-view matrix stack, colored primitives, text textures and
//! pick names. Window and context lifetime belong to the host; the view only
//! forwards resize and dispose.

use depan_core::{Color, Vec2};
use glam::DMat4;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// Filled convex polygon.
    Polygon,
    LineLoop,
    LineStrip,
    Lines,
}

pub trait DrawingSurface {
    fn begin_frame(&mut self, projection: &DMat4, view: &DMat4);
    fn end_frame(&mut self) {}

    fn push_matrix(&mut self);
    fn pop_matrix(&mut self);
    fn translate(&mut self, x: f32, y: f32, z: f32);
    fn scale(&mut self, sx: f32, sy: f32, sz: f32);

    fn set_color(&mut self, color: Color);
    fn set_line_width(&mut self, width: f32);
    fn set_line_dash(&mut self, dashed: bool);

    fn begin(&mut self, primitive: Primitive);
    fn vertex(&mut self, x: f32, y: f32);
    fn end(&mut self);

    /// Replace the current pick name. Only meaningful while selecting.
    fn load_name(&mut self, name: u32);

    fn create_text_texture(&mut self, text: &str) -> TextureId;
    fn release_texture(&mut self, texture: TextureId);
    fn draw_texture(&mut self, texture: TextureId, at: Vec2, height: f32);

    fn resize(&mut self, _width: u32, _height: u32) {}
    fn dispose(&mut self) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    BeginFrame,
    EndFrame,
    Primitive {
        primitive: Primitive,
        color: Color,
        vertices: Vec<Vec2>,
    },
    Texture {
        texture: TextureId,
        at: Vec2,
    },
    Name(u32),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceStats {
    pub frames: u64,
    pub primitives: u64,
    pub vertices: u64,
    pub textures_created: u64,
    pub textures_released: u64,
    pub textures_drawn: u64,
}

/// Headless surface that records draw calls.
///
/// Vertices are stored after the model-view translation and scale, so tests
/// and the CLI can inspect where things landed in world space. Only the
/// calls of the most recent frame are kept.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    calls: Vec<DrawCall>,
    stats: SurfaceStats,
    stack: Vec<(Vec2, Vec2)>,
    offset: Vec2,
    scale: Vec2,
    color: Color,
    open: Option<(Primitive, Vec<Vec2>)>,
    textures: HashMap<TextureId, String>,
    next_texture: u32,
    size: (u32, u32),
    disposed: bool,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self {
            scale: Vec2::new(1.0, 1.0),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    pub fn stats(&self) -> SurfaceStats {
        self.stats
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn texture_text(&self, texture: TextureId) -> Option<&str> {
        self.textures.get(&texture).map(String::as_str)
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Primitives drawn under `name` in the last frame.
    pub fn primitives_named(&self, name: u32) -> Vec<&DrawCall> {
        let mut current = None;
        let mut out = Vec::new();
        for call in &self.calls {
            match call {
                DrawCall::Name(n) => current = Some(*n),
                DrawCall::Primitive { .. } if current == Some(name) => out.push(call),
                _ => {}
            }
        }
        out
    }

    fn apply(&self, x: f32, y: f32) -> Vec2 {
        Vec2::new(x * self.scale.x + self.offset.x, y * self.scale.y + self.offset.y)
    }
}

impl DrawingSurface for RecordingSurface {
    fn begin_frame(&mut self, _projection: &DMat4, _view: &DMat4) {
        self.calls.clear();
        self.stack.clear();
        self.offset = Vec2::ZERO;
        self.scale = Vec2::new(1.0, 1.0);
        self.stats.frames += 1;
        self.calls.push(DrawCall::BeginFrame);
    }

    fn end_frame(&mut self) {
        self.calls.push(DrawCall::EndFrame);
    }

    fn push_matrix(&mut self) {
        self.stack.push((self.offset, self.scale));
    }

    fn pop_matrix(&mut self) {
        if let Some((offset, scale)) = self.stack.pop() {
            self.offset = offset;
            self.scale = scale;
        }
    }

    fn translate(&mut self, x: f32, y: f32, _z: f32) {
        self.offset = self.apply(x, y);
    }

    fn scale(&mut self, sx: f32, sy: f32, _sz: f32) {
        self.scale = Vec2::new(self.scale.x * sx, self.scale.y * sy);
    }

    fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    fn set_line_width(&mut self, _width: f32) {}

    fn set_line_dash(&mut self, _dashed: bool) {}

    fn begin(&mut self, primitive: Primitive) {
        self.open = Some((primitive, Vec::new()));
    }

    fn vertex(&mut self, x: f32, y: f32) {
        let p = self.apply(x, y);
        if let Some((_, vertices)) = self.open.as_mut() {
            vertices.push(p);
        }
    }

    fn end(&mut self) {
        if let Some((primitive, vertices)) = self.open.take() {
            self.stats.primitives += 1;
            self.stats.vertices += vertices.len() as u64;
            self.calls.push(DrawCall::Primitive {
                primitive,
                color: self.color,
                vertices,
            });
        }
    }

    fn load_name(&mut self, name: u32) {
        self.calls.push(DrawCall::Name(name));
    }

    fn create_text_texture(&mut self, text: &str) -> TextureId {
        let id = TextureId(self.next_texture);
        self.next_texture += 1;
        self.textures.insert(id, text.to_string());
        self.stats.textures_created += 1;
        id
    }

    fn release_texture(&mut self, texture: TextureId) {
        if self.textures.remove(&texture).is_some() {
            self.stats.textures_released += 1;
        }
    }

    fn draw_texture(&mut self, texture: TextureId, at: Vec2, _height: f32) {
        self.stats.textures_drawn += 1;
        let at = self.apply(at.x, at.y);
        self.calls.push(DrawCall::Texture { texture, at });
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn dispose(&mut self) {
        self.textures.clear();
        self.disposed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_applies_matrix_stack() {
        let mut surface = RecordingSurface::new();
        surface.begin_frame(&DMat4::IDENTITY, &DMat4::IDENTITY);
        surface.load_name(7);
        surface.push_matrix();
        surface.translate(10.0, 5.0, 0.0);
        surface.scale(2.0, 2.0, 1.0);
        surface.begin(Primitive::Polygon);
        surface.vertex(1.0, 0.0);
        surface.vertex(0.0, 1.0);
        surface.end();
        surface.pop_matrix();
        surface.begin(Primitive::Lines);
        surface.vertex(1.0, 1.0);
        surface.end();
        surface.end_frame();

        let named = surface.primitives_named(7);
        assert_eq!(named.len(), 2);
        match named[0] {
            DrawCall::Primitive { vertices, .. } => {
                assert_eq!(vertices, &vec![Vec2::new(12.0, 5.0), Vec2::new(10.0, 7.0)]);
            }
            other => panic!("unexpected call {other:?}"),
        }
        match named[1] {
            DrawCall::Primitive { vertices, .. } => {
                assert_eq!(vertices, &vec![Vec2::new(1.0, 1.0)]);
            }
            other => panic!("unexpected call {other:?}"),
        }
        assert_eq!(surface.stats().primitives, 2);
    }

    #[test]
    fn test_texture_lifecycle() {
        let mut surface = RecordingSurface::new();
        let a = surface.create_text_texture("alpha");
        let b = surface.create_text_texture("beta");
        assert_ne!(a, b);
        assert_eq!(surface.texture_text(a), Some("alpha"));
        surface.release_texture(a);
        surface.release_texture(a);
        assert_eq!(surface.live_textures(), 1);
        assert_eq!(surface.stats().textures_released, 1);
        surface.dispose();
        assert_eq!(surface.live_textures(), 0);
        assert!(surface.is_disposed());
    }
}
