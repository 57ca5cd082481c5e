use thiserror::Error;

/// Errors raised while building or driving an animated sprite.
#[derive(Debug, Error)]
pub enum SpriteError {
    /// The export declares no frames at all.
    #[error("Sprite sheet contains no frames")]
    NoFrames,

    /// Neither tags nor frame names yield a usable frame range.
    #[error("Cannot determine the frame range of the sprite sheet")]
    UnresolvableFrameRange,

    /// The inverse frame-name function rejected a raw frame key.
    #[error("Cannot resolve frame name '{0}' to a frame index and layer")]
    UnresolvableFrameName(String),

    #[error("Tag '{name}' has an invalid range {from}..={to}")]
    InvalidTagRange { name: String, from: usize, to: usize },

    /// No texture info was given and the export has no `meta.size`.
    #[error("Texture size is unknown: pass a texture or export meta.size")]
    MissingTextureSize,

    #[error("Texture size {width}x{height} must be non-zero")]
    InvalidTextureSize { width: u32, height: u32 },

    #[error("Layer '{0}' is listed more than once")]
    DuplicateLayer(String),

    /// Direct frame access outside the frame table.
    #[error("Frame {0} is not in the frame table")]
    UnknownFrame(usize),

    /// Direct tag access with a name that was never declared.
    #[error("Unknown tag '{0}'")]
    UnknownTag(String),

    #[error("Invalid sprite sheet json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = SpriteError> = std::result::Result<T, E>;
