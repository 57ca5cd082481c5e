//! # Vertex Synthesis
//!
//! Turns one resolved frame into per-layer quads.
//!
//! ## Responsibilities
//! - **Quads**: one quad per layer slot, four vertices each, in the fixed
//!   corner order top-left, top-right, bottom-left, bottom-right (Y up).
//! - **Clipping**: an optional source-space rectangle shrinks each side of a
//!   layer's quad and its texture window.
//! - **Outline spread**: grows visible quads so an outline shader has room.
//! - **Buffers**: fixed-size flat `f32` attribute buffers with dirty flags.
//!
//! ## Key Types
//! - `SpriteBuffers`: index buffer plus the six attribute buffers.
//! - `Synthesizer`: texture size and per-layer depth, fixed at construction.
//! - `Quad`: positions and UVs for one layer.

use crate::catalog::{FrameInfo, PixelRect, SheetFrame};
use glam::{Vec2, Vec3};

pub const VERTICES_PER_QUAD: usize = 4;
pub const INDICES_PER_QUAD: usize = 6;

pub const POSITION_SIZE: usize = 3;
pub const UV_SIZE: usize = 2;
pub const OPACITY_SIZE: usize = 1;
pub const COLOR_SIZE: usize = 3;
pub const FADE_SIZE: usize = 4;
pub const OUTLINE_SIZE: usize = 1;

/// A flat per-vertex `f32` buffer. Its length never changes after
/// construction.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeBuffer {
    item_size: usize,
    data: Vec<f32>,
    dirty: bool,
}

impl AttributeBuffer {
    /// A buffer of `vertex_count` vertices, each initialised to `fill`.
    pub fn new(vertex_count: usize, fill: &[f32]) -> Self {
        let mut data = Vec::with_capacity(vertex_count * fill.len());
        for _ in 0..vertex_count {
            data.extend_from_slice(fill);
        }
        Self {
            item_size: fill.len(),
            data,
            dirty: true,
        }
    }

    /// Floats per vertex.
    pub fn item_size(&self) -> usize {
        self.item_size
    }

    pub fn vertex_count(&self) -> usize {
        if self.item_size == 0 {
            0
        } else {
            self.data.len() / self.item_size
        }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns the dirty flag and clears it. Renderers call this before
    /// uploading.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    /// Writes the same `value` to all four vertices of quad `quad`.
    pub(crate) fn fill_quad(&mut self, quad: usize, value: &[f32]) {
        debug_assert_eq!(value.len(), self.item_size);
        let start = quad * VERTICES_PER_QUAD * self.item_size;
        let end = start + VERTICES_PER_QUAD * self.item_size;
        if let Some(slot) = self.data.get_mut(start..end) {
            for vertex in slot.chunks_exact_mut(self.item_size) {
                vertex.copy_from_slice(value);
            }
            self.dirty = true;
        }
    }

    /// Writes four vertices' worth of values to quad `quad`.
    pub(crate) fn write_quad(&mut self, quad: usize, values: &[f32]) {
        debug_assert_eq!(values.len(), VERTICES_PER_QUAD * self.item_size);
        let start = quad * VERTICES_PER_QUAD * self.item_size;
        if let Some(slot) = self.data.get_mut(start..start + values.len()) {
            slot.copy_from_slice(values);
            self.dirty = true;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    fn include(bounds: Option<BoundingBox>, point: Vec3) -> BoundingBox {
        match bounds {
            Some(b) => BoundingBox {
                min: b.min.min(point),
                max: b.max.max(point),
            },
            None => BoundingBox {
                min: point,
                max: point,
            },
        }
    }
}

/// Index buffer and vertex attribute buffers of one sprite.
#[derive(Debug, Clone)]
pub struct SpriteBuffers {
    indices: Vec<u32>,
    position: AttributeBuffer,
    uv: AttributeBuffer,
    opacity: AttributeBuffer,
    color: AttributeBuffer,
    fade: AttributeBuffer,
    outline: AttributeBuffer,
    bounds: Option<BoundingBox>,
}

impl SpriteBuffers {
    pub fn new(layer_count: usize) -> Self {
        let vertex_count = layer_count * VERTICES_PER_QUAD;

        let mut indices = Vec::with_capacity(layer_count * INDICES_PER_QUAD);
        for layer in 0..layer_count {
            let b = (layer * VERTICES_PER_QUAD) as u32;
            indices.extend_from_slice(&[b, b + 2, b + 1, b + 1, b + 2, b + 3]);
        }

        Self {
            indices,
            position: AttributeBuffer::new(vertex_count, &[0.0; POSITION_SIZE]),
            uv: AttributeBuffer::new(vertex_count, &[0.0; UV_SIZE]),
            opacity: AttributeBuffer::new(vertex_count, &[1.0; OPACITY_SIZE]),
            color: AttributeBuffer::new(vertex_count, &[1.0; COLOR_SIZE]),
            fade: AttributeBuffer::new(vertex_count, &[0.0; FADE_SIZE]),
            outline: AttributeBuffer::new(vertex_count, &[1.0; OUTLINE_SIZE]),
            bounds: None,
        }
    }

    pub fn layer_count(&self) -> usize {
        self.indices.len() / INDICES_PER_QUAD
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn position(&self) -> &AttributeBuffer {
        &self.position
    }

    pub fn uv(&self) -> &AttributeBuffer {
        &self.uv
    }

    pub fn opacity(&self) -> &AttributeBuffer {
        &self.opacity
    }

    pub fn color(&self) -> &AttributeBuffer {
        &self.color
    }

    pub fn fade(&self) -> &AttributeBuffer {
        &self.fade
    }

    pub fn outline(&self) -> &AttributeBuffer {
        &self.outline
    }

    pub fn position_mut(&mut self) -> &mut AttributeBuffer {
        &mut self.position
    }

    pub fn uv_mut(&mut self) -> &mut AttributeBuffer {
        &mut self.uv
    }

    pub fn opacity_mut(&mut self) -> &mut AttributeBuffer {
        &mut self.opacity
    }

    pub fn color_mut(&mut self) -> &mut AttributeBuffer {
        &mut self.color
    }

    pub fn fade_mut(&mut self) -> &mut AttributeBuffer {
        &mut self.fade
    }

    pub fn outline_mut(&mut self) -> &mut AttributeBuffer {
        &mut self.outline
    }

    /// Extent of every quad with area, or `None` when nothing is visible.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.bounds
    }
}

/// Positions and UVs of one layer's quad.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub positions: [f32; VERTICES_PER_QUAD * POSITION_SIZE],
    pub uvs: [f32; VERTICES_PER_QUAD * UV_SIZE],
    /// Width and height after clipping and outline spread.
    pub size: Vec2,
}

impl Quad {
    pub fn has_area(&self) -> bool {
        self.size.x > 0.0 && self.size.y > 0.0
    }

    pub fn corner(&self, index: usize) -> Vec3 {
        let p = &self.positions[index * POSITION_SIZE..(index + 1) * POSITION_SIZE];
        Vec3::new(p[0], p[1], p[2])
    }
}

/// Where the sprite sits and how far visible quads spread for outlines.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Placement {
    pub offset: Vec2,
    pub outline_width: f32,
}

/// Builds quads for a fixed texture and layer stack.
#[derive(Debug, Clone)]
pub struct Synthesizer {
    texture_size: Vec2,
    depths: Vec<f32>,
}

impl Synthesizer {
    /// `texture_size` must be non-zero in both dimensions.
    pub fn new(texture_size: Vec2, layer_count: usize, layer_depth: f32) -> Self {
        let depths = (0..layer_count).map(|i| i as f32 * layer_depth).collect();
        Self {
            texture_size,
            depths,
        }
    }

    pub fn depth(&self, layer: usize) -> f32 {
        self.depths.get(layer).copied().unwrap_or(0.0)
    }

    /// Builds the quad for one layer frame.
    pub fn quad(
        &self,
        frame: &SheetFrame,
        clip: Option<&PixelRect>,
        placement: &Placement,
        z: f32,
    ) -> Quad {
        let tex = frame.texture_rect;
        let mut src = Vec2::new(frame.trimmed_offset.x, frame.trimmed_offset.y);
        let mut tex_origin = Vec2::new(tex.x, tex.y);
        let mut size = Vec2::new(tex.w, tex.h);

        if let Some(clip) = clip {
            let left = (clip.x - src.x).clamp(0.0, size.x);
            let right = ((src.x + size.x) - clip.right()).clamp(0.0, size.x - left);
            let top = (clip.y - src.y).clamp(0.0, size.y);
            let bottom = ((src.y + size.y) - clip.bottom()).clamp(0.0, size.y - top);

            src += Vec2::new(left, top);
            tex_origin += Vec2::new(left, top);
            size -= Vec2::new(left + right, top + bottom);
        }

        let spread = placement.outline_width;
        // A negative spread would invert the quad.
        if spread > 0.0 && !frame.is_empty() && size.x > 0.0 && size.y > 0.0 {
            src -= Vec2::splat(spread);
            tex_origin -= Vec2::splat(spread);
            size += Vec2::splat(spread * 2.0);
        }

        let x0 = placement.offset.x - frame.source_size.x / 2.0 + src.x;
        let x1 = x0 + size.x;
        let y0 = placement.offset.y + frame.source_size.y / 2.0 - src.y;
        let y1 = y0 - size.y;

        let u0 = tex_origin.x / self.texture_size.x;
        let u1 = (tex_origin.x + size.x) / self.texture_size.x;
        let v0 = 1.0 - tex_origin.y / self.texture_size.y;
        let v1 = 1.0 - (tex_origin.y + size.y) / self.texture_size.y;

        Quad {
            positions: [x0, y0, z, x1, y0, z, x0, y1, z, x1, y1, z],
            uvs: [u0, v0, u1, v0, u0, v1, u1, v1],
            size,
        }
    }

    /// Rewrites positions and UVs of every layer slot for `frame` and
    /// recomputes the bounding box. Attribute buffers are left alone.
    ///
    /// `clips` is indexed like `layers`; a missing entry means no clip.
    pub fn synthesize(
        &self,
        frame: &FrameInfo,
        layers: &[String],
        clips: &[Option<PixelRect>],
        placement: &Placement,
        buffers: &mut SpriteBuffers,
    ) {
        let mut bounds = None;

        for (index, layer) in layers.iter().enumerate() {
            let sheet_frame = frame.layer(layer).unwrap_or(&SheetFrame::EMPTY);
            let clip = clips.get(index).and_then(Option::as_ref);
            let quad = self.quad(sheet_frame, clip, placement, self.depth(index));

            buffers.position.write_quad(index, &quad.positions);
            buffers.uv.write_quad(index, &quad.uvs);

            if quad.has_area() {
                for corner in 0..VERTICES_PER_QUAD {
                    bounds = Some(BoundingBox::include(bounds, quad.corner(corner)));
                }
            }
        }

        buffers.position.dirty = true;
        buffers.uv.dirty = true;
        buffers.bounds = bounds;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn frame(tex: PixelRect, offset: Vec2, source: Vec2) -> SheetFrame {
        SheetFrame {
            texture_rect: tex,
            trimmed_offset: offset,
            source_size: source,
            duration: 100,
        }
    }

    fn synthesizer() -> Synthesizer {
        Synthesizer::new(Vec2::new(64.0, 32.0), 2, 0.5)
    }

    #[test]
    fn test_index_buffer_layout() {
        let buffers = SpriteBuffers::new(2);
        assert_eq!(buffers.indices(), &[0, 2, 1, 1, 2, 3, 4, 6, 5, 5, 6, 7]);
        assert_eq!(buffers.position().as_slice().len(), 2 * 4 * 3);
        assert_eq!(buffers.fade().item_size(), 4);
        assert_eq!(buffers.opacity().as_slice(), &[1.0; 8]);
        assert_eq!(buffers.outline().as_slice(), &[1.0; 8]);
    }

    #[test]
    fn test_untrimmed_quad_is_centred() {
        let f = frame(
            PixelRect::new(16.0, 0.0, 16.0, 8.0),
            Vec2::ZERO,
            Vec2::new(16.0, 8.0),
        );
        let quad = synthesizer().quad(&f, None, &Placement::default(), 0.0);

        assert_eq!(quad.corner(0), Vec3::new(-8.0, 4.0, 0.0));
        assert_eq!(quad.corner(1), Vec3::new(8.0, 4.0, 0.0));
        assert_eq!(quad.corner(2), Vec3::new(-8.0, -4.0, 0.0));
        assert_eq!(quad.corner(3), Vec3::new(8.0, -4.0, 0.0));
        assert_eq!(quad.uvs, [0.25, 1.0, 0.5, 1.0, 0.25, 0.75, 0.5, 0.75]);
    }

    #[test]
    fn test_trimmed_frame_is_placed_inside_source() {
        let f = frame(
            PixelRect::new(0.0, 0.0, 4.0, 4.0),
            Vec2::new(2.0, 1.0),
            Vec2::new(16.0, 8.0),
        );
        let placement = Placement {
            offset: Vec2::new(10.0, 0.0),
            outline_width: 0.0,
        };
        let quad = synthesizer().quad(&f, None, &placement, 0.25);

        assert_eq!(quad.corner(0), Vec3::new(4.0, 3.0, 0.25));
        assert_eq!(quad.corner(3), Vec3::new(8.0, -1.0, 0.25));
    }

    #[test]
    fn test_clip_shrinks_quad_and_texture_window() {
        let f = frame(
            PixelRect::new(0.0, 0.0, 16.0, 8.0),
            Vec2::ZERO,
            Vec2::new(16.0, 8.0),
        );
        let clip = PixelRect::new(4.0, 0.0, 8.0, 4.0);
        let quad = synthesizer().quad(&f, Some(&clip), &Placement::default(), 0.0);

        assert_eq!(quad.size, Vec2::new(8.0, 4.0));
        assert_eq!(quad.corner(0), Vec3::new(-4.0, 4.0, 0.0));
        assert_eq!(quad.corner(3), Vec3::new(4.0, 0.0, 0.0));
        assert_eq!(quad.uvs[0], 4.0 / 64.0);
        assert_eq!(quad.uvs[2], 12.0 / 64.0);
    }

    #[test]
    fn test_clip_excluding_layer_collapses_quad() {
        let f = frame(
            PixelRect::new(0.0, 0.0, 16.0, 8.0),
            Vec2::ZERO,
            Vec2::new(16.0, 8.0),
        );
        let clip = PixelRect::new(100.0, 100.0, 10.0, 10.0);
        let placement = Placement {
            offset: Vec2::ZERO,
            outline_width: 2.0,
        };
        let quad = synthesizer().quad(&f, Some(&clip), &placement, 0.0);

        assert!(!quad.has_area());
        assert_eq!(quad.size, Vec2::ZERO, "no outline spread on an empty clip");
        assert!(quad.uvs.iter().all(|v| v.is_finite()));
        assert_eq!(quad.uvs[0], quad.uvs[2]);
        assert_eq!(quad.uvs[1], quad.uvs[5]);
    }

    #[test]
    fn test_outline_spread_grows_visible_quads_only() {
        let f = frame(
            PixelRect::new(8.0, 8.0, 4.0, 4.0),
            Vec2::ZERO,
            Vec2::new(4.0, 4.0),
        );
        let placement = Placement {
            offset: Vec2::ZERO,
            outline_width: 1.0,
        };
        let s = synthesizer();

        let quad = s.quad(&f, None, &placement, 0.0);
        assert_eq!(quad.size, Vec2::new(6.0, 6.0));
        assert_eq!(quad.corner(0), Vec3::new(-3.0, 3.0, 0.0));
        assert_eq!(quad.uvs[0], 7.0 / 64.0);

        let empty = s.quad(&SheetFrame::EMPTY, None, &placement, 0.0);
        assert!(!empty.has_area());
    }

    #[test]
    fn test_negative_outline_spread_keeps_quad_upright() {
        let f = frame(
            PixelRect::new(8.0, 8.0, 4.0, 4.0),
            Vec2::ZERO,
            Vec2::new(4.0, 4.0),
        );
        let placement = Placement {
            offset: Vec2::ZERO,
            outline_width: -3.0,
        };
        let quad = synthesizer().quad(&f, None, &placement, 0.0);

        assert_eq!(quad.size, Vec2::new(4.0, 4.0));
        assert!(quad.corner(0).x < quad.corner(1).x);
        assert!(quad.uvs[0] < quad.uvs[2]);
    }

    #[test]
    fn test_synthesize_writes_slots_and_bounds() {
        let mut layer_frames = HashMap::new();
        layer_frames.insert(
            "Body".to_string(),
            frame(
                PixelRect::new(0.0, 0.0, 8.0, 8.0),
                Vec2::ZERO,
                Vec2::new(8.0, 8.0),
            ),
        );
        let info = FrameInfo {
            duration: 100,
            layer_frames,
        };
        let layers = vec!["Body".to_string(), "Hat".to_string()];
        let mut buffers = SpriteBuffers::new(2);
        buffers.position_mut().take_dirty();
        buffers.uv_mut().take_dirty();

        synthesizer().synthesize(&info, &layers, &[], &Placement::default(), &mut buffers);

        assert!(buffers.position().is_dirty());
        assert!(buffers.uv().is_dirty());
        let hat = &buffers.position().as_slice()[12..24];
        assert_eq!(hat, &[0.0, 0.0, 0.5, 0.0, 0.0, 0.5, 0.0, 0.0, 0.5, 0.0, 0.0, 0.5]);

        let bounds = buffers.bounding_box().expect("body is visible");
        assert_eq!(bounds.min, Vec3::new(-4.0, -4.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(4.0, 4.0, 0.0));
        assert_eq!(bounds.size(), Vec3::new(8.0, 8.0, 0.0));
    }

    #[test]
    fn test_fill_quad_marks_dirty() {
        let mut buffer = AttributeBuffer::new(8, &[0.0; 3]);
        assert!(buffer.take_dirty());
        assert!(!buffer.is_dirty());

        buffer.fill_quad(1, &[0.5, 0.25, 1.0]);
        assert!(buffer.is_dirty());
        assert_eq!(&buffer.as_slice()[12..15], &[0.5, 0.25, 1.0]);
        assert_eq!(&buffer.as_slice()[..3], &[0.0; 3]);
        assert_eq!(buffer.vertex_count(), 8);
    }
}
