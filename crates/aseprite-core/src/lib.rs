pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod geometry;
pub mod groups;
pub mod playback;
pub mod sprite;
pub mod triggers;
pub mod visuals;

pub use catalog::{FrameInfo, FrameNaming, PixelRect, SheetCatalog, SheetFrame, Tag};
pub use config::SpriteConfig;
pub use error::{Result, SpriteError};
pub use events::{EventKind, ListenerId, SpriteEvent};
pub use geometry::{AttributeBuffer, BoundingBox, SpriteBuffers};
pub use groups::LayerGroups;
pub use sprite::{AnimatedSprite, SpriteBuilder, TextureInfo};
pub use triggers::Trigger;
pub use visuals::{LayerVisual, SpriteUniforms};

pub use aseprite_data::SheetJson;
