//! # Animated Sprite
//!
//! The facade hosts drive once per tick.
//!
//! ## Responsibilities
//! - **Construction**: `SpriteBuilder` validates the texture, builds the
//!   catalog, sizes the buffers and synthesizes the first frame.
//! - **Playback**: forwards time and jumps to the playback state machine and
//!   regenerates geometry when the frame moves.
//! - **Overrides**: group-aware per-layer setters and sprite-wide uniforms.
//! - **Events**: queues events during a call and dispatches them before the
//!   call returns.

use crate::catalog::{FrameInfo, FrameNaming, PixelRect, SheetCatalog, Tag};
use crate::config::SpriteConfig;
use crate::error::{Result, SpriteError};
use crate::events::{EventDispatcher, EventKind, ListenerId, SpriteEvent};
use crate::geometry::{BoundingBox, Placement, SpriteBuffers, Synthesizer};
use crate::playback::Playback;
use crate::triggers::{Trigger, TriggerRegistry};
use crate::visuals::{LayerVisual, LayerVisuals, SpriteUniforms};
use aseprite_data::SheetJson;
use glam::{Vec2, Vec3};

/// Pixel size of the texture the sheet was packed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
}

impl TextureInfo {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Builds an [`AnimatedSprite`] from a parsed export.
///
/// ```ignore
/// let sprite = SpriteBuilder::new(&sheet)
///     .texture(TextureInfo::new(256, 128))
///     .frame_name(|frame, layer| format!("{layer} {frame}"))
///     .build()?;
/// ```
pub struct SpriteBuilder<'a> {
    sheet: &'a SheetJson,
    texture: Option<TextureInfo>,
    config: SpriteConfig,
    naming: FrameNaming,
}

impl<'a> SpriteBuilder<'a> {
    pub fn new(sheet: &'a SheetJson) -> Self {
        Self {
            sheet,
            texture: None,
            config: SpriteConfig::default(),
            naming: FrameNaming::default(),
        }
    }

    /// Texture size. Falls back to `meta.size` when not given.
    pub fn texture(mut self, texture: TextureInfo) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn config(mut self, config: SpriteConfig) -> Self {
        self.config = config;
        self
    }

    /// Names raw frames by `(frame, layer)`. Replaces any inverse naming.
    pub fn frame_name(mut self, name: impl Fn(usize, &str) -> String + 'static) -> Self {
        self.naming = FrameNaming::Forward(Box::new(name));
        self
    }

    /// Maps raw frame keys to `(frame, layer)`. Replaces any forward naming.
    pub fn frame_name_inverse(
        mut self,
        inverse: impl Fn(&str) -> Option<(usize, String)> + 'static,
    ) -> Self {
        self.naming = FrameNaming::Inverse(Box::new(inverse));
        self
    }

    pub fn build(self) -> Result<AnimatedSprite> {
        let texture = match self.texture {
            Some(texture) => texture,
            None => self
                .sheet
                .meta
                .size
                .as_ref()
                .map(|size| TextureInfo::new(size.w, size.h))
                .ok_or(SpriteError::MissingTextureSize)?,
        };
        if texture.width == 0 || texture.height == 0 {
            return Err(SpriteError::InvalidTextureSize {
                width: texture.width,
                height: texture.height,
            });
        }

        let config = self.config;
        let catalog = SheetCatalog::build(self.sheet, config.layers.as_deref(), &self.naming)?;
        if let Some(tag) = &config.initial_tag {
            catalog.tag_info(tag)?;
        }

        let layer_count = catalog.layers().len();
        let synthesizer = Synthesizer::new(
            Vec2::new(texture.width as f32, texture.height as f32),
            layer_count,
            config.layer_depth,
        );
        let mut uniforms = SpriteUniforms::default();
        if valid_outline_width(config.outline_width) {
            uniforms.outline_width = config.outline_width;
        } else {
            tracing::warn!(
                width = config.outline_width,
                "ignoring negative or non-finite outline width in config"
            );
        }

        let mut sprite = AnimatedSprite {
            playback: Playback::new(catalog.min_frame(), config.playing, config.backward),
            catalog,
            triggers: TriggerRegistry::new(),
            dispatcher: EventDispatcher::new(),
            synthesizer,
            buffers: SpriteBuffers::new(layer_count),
            visuals: LayerVisuals::new(layer_count),
            uniforms,
            texture,
            offset: Vec2::from(config.offset),
        };

        if let Some(tag) = config.initial_tag.as_deref() {
            // Nobody can be listening yet.
            let mut events = Vec::new();
            sprite.playback.goto_tag(Some(tag), &sprite.catalog, &mut events);
        }
        sprite.synthesize(sprite.playback.current_frame())?;

        tracing::debug!(
            layers = layer_count,
            frame = sprite.playback.current_frame(),
            tag = sprite.playback.current_tag(),
            "animated sprite built"
        );
        Ok(sprite)
    }
}

/// A layered sprite driven by time, with renderer-ready vertex buffers.
#[derive(Debug)]
pub struct AnimatedSprite {
    catalog: SheetCatalog,
    playback: Playback,
    triggers: TriggerRegistry,
    dispatcher: EventDispatcher,
    synthesizer: Synthesizer,
    buffers: SpriteBuffers,
    visuals: LayerVisuals,
    uniforms: SpriteUniforms,
    texture: TextureInfo,
    offset: Vec2,
}

impl AnimatedSprite {
    /// Parses `json` and builds a sprite with declaration-order naming.
    pub fn from_json(
        json: &str,
        texture: Option<TextureInfo>,
        config: SpriteConfig,
    ) -> Result<Self> {
        let sheet = SheetJson::parse(json)?;
        let mut builder = SpriteBuilder::new(&sheet).config(config);
        if let Some(texture) = texture {
            builder = builder.texture(texture);
        }
        builder.build()
    }

    // --- Tables ---

    pub fn catalog(&self) -> &SheetCatalog {
        &self.catalog
    }

    pub fn layers(&self) -> &[String] {
        self.catalog.layers()
    }

    pub fn tags(&self) -> &[Tag] {
        self.catalog.tags()
    }

    pub fn frame_info(&self, frame: usize) -> Result<&FrameInfo> {
        self.catalog.frame_info(frame)
    }

    pub fn texture(&self) -> TextureInfo {
        self.texture
    }

    // --- Render output ---

    pub fn buffers(&self) -> &SpriteBuffers {
        &self.buffers
    }

    /// Mutable access is limited to consuming dirty flags.
    pub fn buffers_mut(&mut self) -> &mut SpriteBuffers {
        &mut self.buffers
    }

    pub fn indices(&self) -> &[u32] {
        self.buffers.indices()
    }

    pub fn uniforms(&self) -> &SpriteUniforms {
        &self.uniforms
    }

    pub fn take_uniforms_dirty(&mut self) -> bool {
        self.uniforms.take_dirty()
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.buffers.bounding_box()
    }

    pub fn layer_visual(&self, layer: &str) -> Option<&LayerVisual> {
        self.catalog
            .layer_index(layer)
            .and_then(|index| self.visuals.get(index))
    }

    /// Rewrites positions and UVs for `frame`. Does not move playback.
    pub fn synthesize(&mut self, frame: usize) -> Result<()> {
        let info = self.catalog.frame_info(frame)?;
        let placement = Placement {
            offset: self.offset,
            outline_width: self.uniforms.outline_width,
        };
        self.synthesizer.synthesize(
            info,
            self.catalog.layers(),
            &self.visuals.clips(),
            &placement,
            &mut self.buffers,
        );
        Ok(())
    }

    fn refresh(&mut self) {
        let frame = self.playback.current_frame();
        if let Err(err) = self.synthesize(frame) {
            tracing::warn!(frame, %err, "failed to synthesize current frame");
        }
    }

    // --- Playback ---

    pub fn play(&mut self) {
        self.playback.play();
    }

    pub fn pause(&mut self) {
        self.playback.pause();
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    pub fn set_backward(&mut self, backward: bool) {
        self.playback.set_backward(backward);
    }

    pub fn is_backward(&self) -> bool {
        self.playback.is_backward()
    }

    pub fn current_frame(&self) -> usize {
        self.playback.current_frame()
    }

    pub fn current_tag(&self) -> Option<&str> {
        self.playback.current_tag()
    }

    pub fn current_tag_frame(&self) -> Option<usize> {
        self.playback.current_tag_frame()
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.playback.elapsed_ms()
    }

    /// Moves playback forward by `delta_ms`, regenerates geometry for the
    /// final frame, then dispatches and returns the events raised on the way.
    pub fn advance(&mut self, delta_ms: f64) -> Vec<SpriteEvent> {
        let mut events = Vec::new();
        let steps = self
            .playback
            .advance(delta_ms, &self.catalog, &self.triggers, &mut events);
        if steps > 0 {
            self.refresh();
        }
        self.dispatcher.dispatch(&events);
        events
    }

    /// Switches to a tag and restarts at its first frame. `None` leaves the
    /// current frame and plays the whole sheet.
    pub fn goto_tag(&mut self, tag: Option<&str>) {
        let mut events = Vec::new();
        if self.playback.goto_tag(tag, &self.catalog, &mut events) {
            self.refresh();
        }
        self.dispatcher.dispatch(&events);
    }

    pub fn goto_frame(&mut self, frame: usize) {
        let mut events = Vec::new();
        if self.playback.goto_frame(frame, &self.catalog, &mut events) {
            self.refresh();
        }
        self.dispatcher.dispatch(&events);
    }

    pub fn goto_tag_frame(&mut self, relative: i64) {
        let mut events = Vec::new();
        if self
            .playback
            .goto_tag_frame(relative, &self.catalog, &mut events)
        {
            self.refresh();
        }
        self.dispatcher.dispatch(&events);
    }

    // --- Events ---

    pub fn on(
        &mut self,
        kind: EventKind,
        listener: impl FnMut(&SpriteEvent) + 'static,
    ) -> ListenerId {
        self.dispatcher.on(kind, listener)
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.dispatcher.off(id)
    }

    // --- Triggers ---

    /// Raises `event` whenever playback enters `frame`, optionally only
    /// while `tag` is active.
    pub fn add_frame_trigger(&mut self, frame: usize, event: &str, tag: Option<&str>) {
        self.triggers.add(frame, event, tag);
    }

    /// Raises `event` on the `relative`-th frame of `tag` while that tag is
    /// active. Returns `false` for an unknown tag or an offset past its end.
    pub fn add_tag_frame_trigger(&mut self, tag: &str, relative: usize, event: &str) -> bool {
        match self.tag_frame(tag, relative) {
            Some(frame) => {
                self.triggers.add(frame, event, Some(tag));
                true
            }
            None => false,
        }
    }

    pub fn remove_frame_trigger(&mut self, frame: usize, event: &str, tag: Option<&str>) -> usize {
        self.triggers.remove(frame, event, tag)
    }

    pub fn remove_tag_frame_trigger(&mut self, tag: &str, relative: usize, event: &str) -> usize {
        match self.tag_frame(tag, relative) {
            Some(frame) => self.triggers.remove(frame, event, Some(tag)),
            None => 0,
        }
    }

    pub fn triggers_at(&self, frame: usize) -> &[Trigger] {
        self.triggers.at(frame)
    }

    fn tag_frame(&self, tag: &str, relative: usize) -> Option<usize> {
        let Some(info) = self.catalog.tag(tag) else {
            tracing::debug!(tag, "ignoring trigger on unknown tag");
            return None;
        };
        if relative >= info.span() {
            tracing::debug!(tag, relative, span = info.span(), "trigger offset is past the tag");
            return None;
        }
        Some(info.from + relative)
    }

    // --- Sprite-wide overrides ---

    pub fn set_opacity(&mut self, opacity: f32) {
        self.uniforms.opacity = opacity;
        self.uniforms.mark_dirty();
    }

    pub fn set_color(&mut self, color: Vec3) {
        self.uniforms.color = color;
        self.uniforms.mark_dirty();
    }

    /// Fades every texel towards `color` by `amount` (0 = untouched).
    pub fn set_fade(&mut self, color: Vec3, amount: f32) {
        self.uniforms.fade = color.extend(amount);
        self.uniforms.mark_dirty();
    }

    pub fn set_outline(&mut self, width: f32, color: Vec3, opacity: f32) {
        self.uniforms.outline_color = color;
        self.uniforms.outline_opacity = opacity;
        self.set_outline_width(width);
    }

    /// Outline width grows every visible quad, so this regenerates geometry.
    /// Negative and non-finite widths are ignored.
    pub fn set_outline_width(&mut self, width: f32) {
        if !valid_outline_width(width) {
            tracing::warn!(width, "ignoring negative or non-finite outline width");
            return;
        }
        self.uniforms.outline_width = width;
        self.uniforms.mark_dirty();
        self.refresh();
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn set_offset(&mut self, offset: Vec2) {
        if offset != self.offset {
            self.offset = offset;
            self.refresh();
        }
    }

    // --- Per-layer overrides ---

    /// Expands layer-or-group names to layer slots, in layer order.
    fn layer_targets<S, T>(&self, assignment: impl IntoIterator<Item = (S, T)>) -> Vec<(usize, T)>
    where
        S: Into<String>,
        T: Clone,
    {
        let mut targets: Vec<(usize, T)> = self
            .catalog
            .groups()
            .expand(assignment)
            .into_iter()
            .filter_map(|(name, value)| match self.catalog.layer_index(&name) {
                Some(index) => Some((index, value)),
                // A group's own name is recorded alongside its members.
                None if self.catalog.groups().is_group(&name) => None,
                None => {
                    tracing::debug!(layer = %name, "ignoring override for unknown layer");
                    None
                }
            })
            .collect();
        targets.sort_by_key(|(index, _)| *index);
        targets
    }

    /// Per-layer opacity. Names may be layers or groups.
    pub fn set_layer_opacities<S: Into<String>>(
        &mut self,
        opacities: impl IntoIterator<Item = (S, f32)>,
    ) {
        for (layer, opacity) in self.layer_targets(opacities) {
            self.visuals.set_opacity(layer, opacity, &mut self.buffers);
        }
    }

    pub fn set_layer_colors<S: Into<String>>(
        &mut self,
        colors: impl IntoIterator<Item = (S, Vec3)>,
    ) {
        for (layer, color) in self.layer_targets(colors) {
            self.visuals.set_color(layer, color, &mut self.buffers);
        }
    }

    /// Per-layer fade as `(color, amount)`.
    pub fn set_layer_fades<S: Into<String>>(
        &mut self,
        fades: impl IntoIterator<Item = (S, (Vec3, f32))>,
    ) {
        for (layer, (color, amount)) in self.layer_targets(fades) {
            self.visuals
                .set_fade(layer, color.extend(amount), &mut self.buffers);
        }
    }

    /// Per-layer multiplier on the sprite outline width.
    pub fn set_layer_outlines<S: Into<String>>(
        &mut self,
        spreads: impl IntoIterator<Item = (S, f32)>,
    ) {
        for (layer, spread) in self.layer_targets(spreads) {
            self.visuals.set_outline(layer, spread, &mut self.buffers);
        }
    }

    /// Shows or hides layers through their opacity.
    pub fn set_layers_visible<S: Into<String>>(
        &mut self,
        visible: impl IntoIterator<Item = (S, bool)>,
    ) {
        for (layer, visible) in self.layer_targets(visible) {
            let opacity = if visible { 1.0 } else { 0.0 };
            self.visuals.set_opacity(layer, opacity, &mut self.buffers);
        }
    }

    /// Cuts layers to a rectangle in untrimmed source pixels (Y down).
    pub fn set_layer_clipping<S: Into<String>>(
        &mut self,
        clips: impl IntoIterator<Item = (S, PixelRect)>,
    ) {
        let mut changed = false;
        for (layer, clip) in self.layer_targets(clips) {
            let finite = [clip.x, clip.y, clip.w, clip.h].iter().all(|v| v.is_finite());
            if !finite {
                tracing::warn!(layer, ?clip, "ignoring non-finite clip rectangle");
                continue;
            }
            changed |= self.visuals.set_clip(layer, Some(clip));
        }
        if changed {
            self.refresh();
        }
    }

    pub fn clear_layer_clipping<S: Into<String>>(&mut self, layers: impl IntoIterator<Item = S>) {
        let mut changed = false;
        for (layer, ()) in self.layer_targets(layers.into_iter().map(|name| (name, ()))) {
            changed |= self.visuals.set_clip(layer, None);
        }
        if changed {
            self.refresh();
        }
    }
}

fn valid_outline_width(width: f32) -> bool {
    width.is_finite() && width >= 0.0
}
