use serde::{Deserialize, Serialize};

/// Construction-time options for an [`AnimatedSprite`](crate::AnimatedSprite).
///
/// Every field has a default, so a config can be deserialized from a partial
/// document such as `{"layer_depth": 0.01}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpriteConfig {
    /// Explicit layer order. Used verbatim instead of `meta.layers`.
    pub layers: Option<Vec<String>>,
    /// Z distance between consecutive layers.
    pub layer_depth: f32,
    /// Sprite-space offset applied to every quad.
    pub offset: [f32; 2],
    pub playing: bool,
    pub backward: bool,
    /// Tag entered right after construction.
    pub initial_tag: Option<String>,
    pub outline_width: f32,
}

impl Default for SpriteConfig {
    fn default() -> Self {
        Self {
            layers: None,
            layer_depth: 0.001,
            offset: [0.0, 0.0],
            playing: true,
            backward: false,
            initial_tag: None,
            outline_width: 0.0,
        }
    }
}
