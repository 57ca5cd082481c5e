//! Visual overrides: sprite-wide shader uniforms and per-layer vertex state.

use crate::catalog::PixelRect;
use crate::geometry::SpriteBuffers;
use glam::{Vec3, Vec4};

/// Sprite-wide values a shader reads as uniforms.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteUniforms {
    pub opacity: f32,
    /// Multiplied into every texel.
    pub color: Vec3,
    /// `rgb` is the fade color, `w` how far to fade towards it.
    pub fade: Vec4,
    pub outline_width: f32,
    pub outline_color: Vec3,
    pub outline_opacity: f32,
    dirty: bool,
}

impl Default for SpriteUniforms {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            color: Vec3::ONE,
            fade: Vec4::ZERO,
            outline_width: 0.0,
            outline_color: Vec3::ZERO,
            outline_opacity: 1.0,
            dirty: true,
        }
    }
}

impl SpriteUniforms {
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

/// Overrides of one layer slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerVisual {
    pub opacity: f32,
    pub color: Vec3,
    pub fade: Vec4,
    /// Multiplier on the sprite outline width for this layer.
    pub outline: f32,
    /// Source-space rectangle the layer is cut to.
    pub clip: Option<PixelRect>,
}

impl Default for LayerVisual {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            color: Vec3::ONE,
            fade: Vec4::ZERO,
            outline: 1.0,
            clip: None,
        }
    }
}

/// Per-layer overrides, indexed like the layer order.
#[derive(Debug, Clone)]
pub struct LayerVisuals {
    layers: Vec<LayerVisual>,
}

impl LayerVisuals {
    pub fn new(layer_count: usize) -> Self {
        Self {
            layers: vec![LayerVisual::default(); layer_count],
        }
    }

    pub fn get(&self, layer: usize) -> Option<&LayerVisual> {
        self.layers.get(layer)
    }

    /// Clip rectangles in layer order.
    pub fn clips(&self) -> Vec<Option<PixelRect>> {
        self.layers.iter().map(|l| l.clip).collect()
    }

    pub(crate) fn set_opacity(&mut self, layer: usize, opacity: f32, buffers: &mut SpriteBuffers) {
        if let Some(visual) = self.layers.get_mut(layer) {
            visual.opacity = opacity;
            buffers.opacity_mut().fill_quad(layer, &[opacity]);
        }
    }

    pub(crate) fn set_color(&mut self, layer: usize, color: Vec3, buffers: &mut SpriteBuffers) {
        if let Some(visual) = self.layers.get_mut(layer) {
            visual.color = color;
            buffers.color_mut().fill_quad(layer, &color.to_array());
        }
    }

    pub(crate) fn set_fade(&mut self, layer: usize, fade: Vec4, buffers: &mut SpriteBuffers) {
        if let Some(visual) = self.layers.get_mut(layer) {
            visual.fade = fade;
            buffers.fade_mut().fill_quad(layer, &fade.to_array());
        }
    }

    pub(crate) fn set_outline(&mut self, layer: usize, spread: f32, buffers: &mut SpriteBuffers) {
        if let Some(visual) = self.layers.get_mut(layer) {
            visual.outline = spread;
            buffers.outline_mut().fill_quad(layer, &[spread]);
        }
    }

    /// Returns `true` when the clip changed.
    pub(crate) fn set_clip(&mut self, layer: usize, clip: Option<PixelRect>) -> bool {
        match self.layers.get_mut(layer) {
            Some(visual) if visual.clip != clip => {
                visual.clip = clip;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_writes_touch_only_their_quad() {
        let mut visuals = LayerVisuals::new(3);
        let mut buffers = SpriteBuffers::new(3);
        buffers.color_mut().take_dirty();

        visuals.set_color(1, Vec3::new(1.0, 0.0, 0.5), &mut buffers);

        let color = buffers.color().as_slice();
        assert!(buffers.color().is_dirty());
        assert_eq!(&color[12..15], &[1.0, 0.0, 0.5]);
        assert_eq!(&color[21..24], &[1.0, 0.0, 0.5]);
        assert_eq!(&color[..12], &[1.0; 12]);
        assert_eq!(&color[24..], &[1.0; 12]);
        assert_eq!(visuals.get(1).map(|l| l.color), Some(Vec3::new(1.0, 0.0, 0.5)));
    }

    #[test]
    fn test_out_of_range_layer_is_ignored() {
        let mut visuals = LayerVisuals::new(1);
        let mut buffers = SpriteBuffers::new(1);
        buffers.opacity_mut().take_dirty();

        visuals.set_opacity(4, 0.0, &mut buffers);
        assert!(!buffers.opacity().is_dirty());
        assert!(!visuals.set_clip(4, Some(PixelRect::ZERO)));
    }

    #[test]
    fn test_clip_reports_changes() {
        let mut visuals = LayerVisuals::new(2);
        let rect = PixelRect::new(0.0, 0.0, 4.0, 4.0);

        assert!(visuals.set_clip(0, Some(rect)));
        assert!(!visuals.set_clip(0, Some(rect)));
        assert_eq!(visuals.clips(), vec![Some(rect), None]);
        assert!(visuals.set_clip(0, None));
    }

    #[test]
    fn test_uniform_defaults() {
        let mut uniforms = SpriteUniforms::default();
        assert_eq!(uniforms.opacity, 1.0);
        assert_eq!(uniforms.color, Vec3::ONE);
        assert!(uniforms.take_dirty());
        assert!(!uniforms.is_dirty());
    }
}
