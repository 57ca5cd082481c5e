//! # Sheet Catalog
//!
//! Indexes the raw export once at construction.
//!
//! ## Responsibilities
//! - **Layer order**: explicit list, `meta.layers`, or a single `"Default"` layer.
//! - **Groups**: membership declared through each entry's parent `group`.
//! - **Tags**: declared `frameTags`, or one implicit tag over every resolvable frame.
//! - **Frame table**: a dense `FrameInfo` per absolute frame in `[min_frame, max_frame]`.
//!
//! ## Key Types
//! - `SheetCatalog`: the immutable tables.
//! - `FrameNaming`: how raw frame keys map to `(frame, layer)`.
//! - `SheetFrame`: one layer's sub-image at one frame.

use crate::error::{Result, SpriteError};
use crate::groups::LayerGroups;
use aseprite_data::model::{Direction, LayerEntry, RawFrame, SheetJson};
use glam::Vec2;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Layer name used when the export declares no layers.
pub const DEFAULT_LAYER: &str = "Default";
/// Name of the implicit tag built when the export declares no tags.
pub const DEFAULT_TAG: &str = "Default";
/// Upper bound on the dense frame table, as a multiple of the raw frame count.
pub const MAX_FRAMES_PER_RAW_FRAME: usize = 64;

/// A rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl PixelRect {
    pub const ZERO: PixelRect = PixelRect {
        x: 0.0,
        y: 0.0,
        w: 0.0,
        h: 0.0,
    };

    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }
}

/// One layer's packed sub-image at one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SheetFrame {
    /// Packed rectangle inside the texture.
    pub texture_rect: PixelRect,
    /// Top-left of the trimmed image inside the untrimmed source.
    pub trimmed_offset: Vec2,
    /// Untrimmed source size.
    pub source_size: Vec2,
    pub duration: u32,
}

impl SheetFrame {
    /// Stand-in for a layer that has nothing to draw at a frame.
    pub const EMPTY: SheetFrame = SheetFrame {
        texture_rect: PixelRect::ZERO,
        trimmed_offset: Vec2::ZERO,
        source_size: Vec2::ZERO,
        duration: 0,
    };

    pub fn from_raw(raw: &RawFrame) -> Self {
        let trimmed = raw.trimmed_rect();
        let source = raw.untrimmed_size();
        Self {
            texture_rect: PixelRect::new(
                raw.frame.x as f32,
                raw.frame.y as f32,
                raw.frame.w as f32,
                raw.frame.h as f32,
            ),
            trimmed_offset: Vec2::new(trimmed.x as f32, trimmed.y as f32),
            source_size: Vec2::new(source.w as f32, source.h as f32),
            duration: raw.duration,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }
}

/// All layer frames of one absolute frame.
#[derive(Debug, Clone, Default)]
pub struct FrameInfo {
    /// Longest duration among the participating layers, 0 if none.
    pub duration: u32,
    pub layer_frames: HashMap<String, SheetFrame>,
}

impl FrameInfo {
    pub fn layer(&self, name: &str) -> Option<&SheetFrame> {
        self.layer_frames.get(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub from: usize,
    pub to: usize,
    pub direction: Direction,
}

impl Tag {
    /// Number of frames in the tag.
    pub fn span(&self) -> usize {
        self.to - self.from + 1
    }

    pub fn contains(&self, frame: usize) -> bool {
        (self.from..=self.to).contains(&frame)
    }
}

pub type FrameNameFn = Box<dyn Fn(usize, &str) -> String>;
pub type FrameNameInverseFn = Box<dyn Fn(&str) -> Option<(usize, String)>>;

/// How raw frame keys relate to `(frame, layer)` pairs.
#[derive(Default)]
pub enum FrameNaming {
    /// Frames are numbered in declaration order; several layers are split
    /// layer-major.
    #[default]
    DeclarationOrder,
    /// `(frame, layer) -> key`, looked up per table cell.
    Forward(FrameNameFn),
    /// `key -> (frame, layer)`, applied once to every raw frame.
    Inverse(FrameNameInverseFn),
}

impl fmt::Debug for FrameNaming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameNaming::DeclarationOrder => f.write_str("DeclarationOrder"),
            FrameNaming::Forward(_) => f.write_str("Forward(..)"),
            FrameNaming::Inverse(_) => f.write_str("Inverse(..)"),
        }
    }
}

type Buckets = HashMap<usize, HashMap<String, SheetFrame>>;

/// Static frame, tag and layer tables of one sprite sheet.
#[derive(Debug, Clone)]
pub struct SheetCatalog {
    frames: Vec<FrameInfo>,
    min_frame: usize,
    max_frame: usize,
    tags: Vec<Tag>,
    tag_index: HashMap<String, usize>,
    layers: Vec<String>,
    groups: LayerGroups,
}

impl SheetCatalog {
    pub fn build(
        sheet: &SheetJson,
        explicit_layers: Option<&[String]>,
        naming: &FrameNaming,
    ) -> Result<Self> {
        if sheet.frames.is_empty() {
            return Err(SpriteError::NoFrames);
        }

        let (layers, groups) = resolve_layers(sheet, explicit_layers)?;

        let rotated = sheet.frames.iter().filter(|(_, raw)| raw.rotated).count();
        if rotated > 0 {
            tracing::warn!(
                rotated,
                "rotated frames are not supported and will be drawn unrotated"
            );
        }

        let raw_by_key: HashMap<&str, &RawFrame> = sheet.frames.iter().collect();
        let buckets = match naming {
            FrameNaming::DeclarationOrder => Some(bucket_by_declaration(sheet, &layers)),
            FrameNaming::Inverse(inverse) => Some(bucket_by_inverse(sheet, &layers, inverse)?),
            FrameNaming::Forward(_) => None,
        };

        let mut tags = Vec::with_capacity(sheet.meta.frame_tags.len());
        for raw in &sheet.meta.frame_tags {
            if raw.from > raw.to {
                return Err(SpriteError::InvalidTagRange {
                    name: raw.name.clone(),
                    from: raw.from,
                    to: raw.to,
                });
            }
            tags.push(Tag {
                name: raw.name.clone(),
                from: raw.from,
                to: raw.to,
                direction: raw.direction,
            });
        }

        let (min_frame, max_frame) = if tags.is_empty() {
            let range = match (&buckets, naming) {
                (Some(buckets), _) => {
                    let min = buckets.keys().min().copied();
                    let max = buckets.keys().max().copied();
                    min.zip(max)
                }
                (None, FrameNaming::Forward(forward)) => {
                    scan_forward_range(sheet.frames.len(), &layers, forward, &raw_by_key)
                }
                (None, _) => None,
            };
            let (min, max) = range.ok_or(SpriteError::UnresolvableFrameRange)?;
            tags.push(Tag {
                name: DEFAULT_TAG.to_string(),
                from: min,
                to: max,
                direction: Direction::Forward,
            });
            (min, max)
        } else {
            let min = tags.iter().map(|t| t.from).min();
            let max = tags.iter().map(|t| t.to).max();
            min.zip(max).ok_or(SpriteError::UnresolvableFrameRange)?
        };

        let span = max_frame
            .checked_sub(min_frame)
            .and_then(|d| d.checked_add(1));
        let limit = sheet.frames.len().saturating_mul(MAX_FRAMES_PER_RAW_FRAME);
        let span = match span {
            Some(span) if span <= limit => span,
            _ => {
                tracing::warn!(
                    min_frame,
                    max_frame,
                    limit,
                    "frame range is far larger than the sheet, refusing to build it"
                );
                return Err(SpriteError::UnresolvableFrameRange);
            }
        };

        let mut frames = Vec::with_capacity(span);
        for index in min_frame..=max_frame {
            let layer_frames = match (&buckets, naming) {
                (Some(buckets), _) => buckets.get(&index).cloned().unwrap_or_default(),
                (None, FrameNaming::Forward(forward)) => layers
                    .iter()
                    .filter_map(|layer| {
                        let key = forward(index, layer.as_str());
                        raw_by_key
                            .get(key.as_str())
                            .map(|raw| (layer.clone(), SheetFrame::from_raw(raw)))
                    })
                    .collect(),
                (None, _) => HashMap::new(),
            };
            let duration = layer_frames.values().map(|f| f.duration).max().unwrap_or(0);
            frames.push(FrameInfo {
                duration,
                layer_frames,
            });
        }

        let mut tag_index = HashMap::with_capacity(tags.len());
        for (i, tag) in tags.iter().enumerate() {
            if tag_index.contains_key(&tag.name) {
                tracing::warn!(tag = %tag.name, "duplicate tag name, keeping the first one");
                continue;
            }
            tag_index.insert(tag.name.clone(), i);
        }

        tracing::debug!(
            min_frame,
            max_frame,
            layers = layers.len(),
            tags = tags.len(),
            "sprite sheet catalog built"
        );

        Ok(Self {
            frames,
            min_frame,
            max_frame,
            tags,
            tag_index,
            layers,
            groups,
        })
    }

    pub fn min_frame(&self) -> usize {
        self.min_frame
    }

    pub fn max_frame(&self) -> usize {
        self.max_frame
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn contains_frame(&self, index: usize) -> bool {
        (self.min_frame..=self.max_frame).contains(&index)
    }

    pub fn frame(&self, index: usize) -> Option<&FrameInfo> {
        if !self.contains_frame(index) {
            return None;
        }
        self.frames.get(index - self.min_frame)
    }

    /// Like [`frame`](Self::frame), but an unknown index is an error.
    pub fn frame_info(&self, index: usize) -> Result<&FrameInfo> {
        self.frame(index).ok_or(SpriteError::UnknownFrame(index))
    }

    pub fn frame_duration(&self, index: usize) -> Option<u32> {
        self.frame(index).map(|f| f.duration)
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn tag(&self, name: &str) -> Option<&Tag> {
        self.tag_index.get(name).and_then(|&i| self.tags.get(i))
    }

    /// Like [`tag`](Self::tag), but an unknown name is an error.
    pub fn tag_info(&self, name: &str) -> Result<&Tag> {
        self.tag(name)
            .ok_or_else(|| SpriteError::UnknownTag(name.to_string()))
    }

    /// Sum of the frame durations of a tag, in milliseconds.
    pub fn tag_duration(&self, name: &str) -> Result<u64> {
        let tag = self.tag_info(name)?;
        let mut total = 0u64;
        for index in tag.from..=tag.to {
            total += u64::from(self.frame_info(index)?.duration);
        }
        Ok(total)
    }

    pub fn tag_frame_count(&self, name: &str) -> Result<usize> {
        self.tag_info(name).map(Tag::span)
    }

    pub fn layers(&self) -> &[String] {
        &self.layers
    }

    pub fn layer_index(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|l| l == name)
    }

    pub fn groups(&self) -> &LayerGroups {
        &self.groups
    }
}

fn resolve_layers(
    sheet: &SheetJson,
    explicit: Option<&[String]>,
) -> Result<(Vec<String>, LayerGroups)> {
    let mut groups = LayerGroups::new();
    let mut declared = Vec::new();

    for entry in &sheet.meta.layers {
        match entry {
            LayerEntry::Layer { name, .. } => declared.push(name.clone()),
            LayerEntry::Group { name, .. } => groups.register(name),
        }
        if let Some(parent) = entry.group() {
            groups.add_member(parent, entry.name());
        }
    }

    let layers = match explicit {
        Some(list) => list.to_vec(),
        None if !declared.is_empty() => declared,
        None => vec![DEFAULT_LAYER.to_string()],
    };

    let mut seen = HashSet::with_capacity(layers.len());
    for layer in &layers {
        if !seen.insert(layer.as_str()) {
            return Err(SpriteError::DuplicateLayer(layer.clone()));
        }
    }

    Ok((layers, groups))
}

fn bucket_by_declaration(sheet: &SheetJson, layers: &[String]) -> Buckets {
    let raw_count = sheet.frames.len();
    let layer_count = layers.len().max(1);
    let mut buckets = Buckets::new();

    if layer_count == 1 {
        for (index, (_, raw)) in sheet.frames.iter().enumerate() {
            buckets
                .entry(index)
                .or_default()
                .insert(layers[0].clone(), SheetFrame::from_raw(raw));
        }
        return buckets;
    }

    if raw_count % layer_count != 0 {
        tracing::warn!(
            raw_count,
            layer_count,
            "frame count is not a multiple of the layer count, trailing frames are ignored"
        );
    }
    let per_layer = (raw_count / layer_count).max(1);

    for (i, (_, raw)) in sheet.frames.iter().enumerate() {
        let layer = i / per_layer;
        if layer >= layer_count {
            break;
        }
        buckets
            .entry(i % per_layer)
            .or_default()
            .insert(layers[layer].clone(), SheetFrame::from_raw(raw));
    }
    buckets
}

fn bucket_by_inverse(
    sheet: &SheetJson,
    layers: &[String],
    inverse: &FrameNameInverseFn,
) -> Result<Buckets> {
    let known: HashSet<&str> = layers.iter().map(String::as_str).collect();
    let mut buckets = Buckets::new();

    for (key, raw) in sheet.frames.iter() {
        let (index, layer) =
            inverse(key).ok_or_else(|| SpriteError::UnresolvableFrameName(key.to_string()))?;
        if !known.contains(layer.as_str()) {
            tracing::debug!(key, layer = %layer, "frame belongs to an unknown layer, skipped");
            continue;
        }
        buckets
            .entry(index)
            .or_default()
            .insert(layer, SheetFrame::from_raw(raw));
    }
    Ok(buckets)
}

fn scan_forward_range(
    raw_count: usize,
    layers: &[String],
    forward: &FrameNameFn,
    raw_by_key: &HashMap<&str, &RawFrame>,
) -> Option<(usize, usize)> {
    let resolvable = (0..=raw_count).filter(|&index| {
        layers
            .iter()
            .any(|layer| raw_by_key.contains_key(forward(index, layer.as_str()).as_str()))
    });

    let mut range: Option<(usize, usize)> = None;
    for index in resolvable {
        range = Some(match range {
            Some((min, _)) => (min, index),
            None => (index, index),
        });
    }
    range
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(x: u32, duration: u32) -> serde_json::Value {
        json!({
            "frame": { "x": x, "y": 0, "w": 8, "h": 8 },
            "spriteSourceSize": { "x": 0, "y": 0, "w": 8, "h": 8 },
            "sourceSize": { "w": 8, "h": 8 },
            "duration": duration
        })
    }

    fn sheet(value: serde_json::Value) -> SheetJson {
        SheetJson::from_value(value).expect("valid sheet json")
    }

    #[test]
    fn test_no_frames_is_fatal() {
        let s = sheet(json!({ "frames": {}, "meta": {} }));
        let err = SheetCatalog::build(&s, None, &FrameNaming::default()).unwrap_err();
        assert!(matches!(err, SpriteError::NoFrames));
    }

    #[test]
    fn test_single_layer_declaration_order_with_implicit_tag() {
        let s = sheet(json!({
            "frames": [
                { "filename": "f0", "frame": { "x": 0, "y": 0, "w": 8, "h": 8 }, "duration": 100 },
                { "filename": "f1", "frame": { "x": 8, "y": 0, "w": 8, "h": 8 }, "duration": 150 },
                { "filename": "f2", "frame": { "x": 16, "y": 0, "w": 8, "h": 8 }, "duration": 50 }
            ]
        }));
        let catalog = SheetCatalog::build(&s, None, &FrameNaming::default()).expect("catalog");

        assert_eq!(catalog.layers(), &[DEFAULT_LAYER.to_string()]);
        assert_eq!((catalog.min_frame(), catalog.max_frame()), (0, 2));
        assert_eq!(catalog.tags().len(), 1);
        assert_eq!(catalog.tags()[0].name, DEFAULT_TAG);
        assert_eq!(catalog.frame_duration(1), Some(150));
        assert_eq!(
            catalog.frame(2).and_then(|f| f.layer(DEFAULT_LAYER)).map(|f| f.texture_rect.x),
            Some(16.0)
        );
        assert_eq!(catalog.tag_duration(DEFAULT_TAG).expect("tag"), 300);
    }

    #[test]
    fn test_tags_define_range_and_absent_layers_are_recorded() {
        let s = sheet(json!({
            "frames": {
                "Body 0": raw(0, 100),
                "Body 1": raw(8, 100),
                "Body 2": raw(16, 100),
                "Hat 1": raw(24, 120)
            },
            "meta": {
                "layers": [
                    { "name": "Body", "opacity": 255 },
                    { "name": "Hat", "opacity": 255 }
                ],
                "frameTags": [
                    { "name": "Idle", "from": 0, "to": 1 },
                    { "name": "Wave", "from": 1, "to": 2 }
                ]
            }
        }));
        let naming = FrameNaming::Forward(Box::new(|frame: usize, layer: &str| {
            format!("{layer} {frame}")
        }));
        let catalog = SheetCatalog::build(&s, None, &naming).expect("catalog");

        assert_eq!((catalog.min_frame(), catalog.max_frame()), (0, 2));
        assert_eq!(catalog.frame_count(), 3);
        assert!(catalog.frame(0).expect("frame 0").layer("Hat").is_none());
        assert_eq!(catalog.frame_duration(1), Some(120), "max over layers");
        assert_eq!(catalog.tag_frame_count("Wave").expect("tag"), 2);
        assert!(catalog.frame(3).is_none());
        assert!(matches!(
            catalog.frame_info(3),
            Err(SpriteError::UnknownFrame(3))
        ));
        assert!(matches!(
            catalog.tag_info("Run"),
            Err(SpriteError::UnknownTag(_))
        ));
    }

    #[test]
    fn test_forward_naming_without_tags_scans_range() {
        let s = sheet(json!({
            "frames": {
                "a 1": raw(0, 100),
                "a 2": raw(8, 100),
                "a 3": raw(16, 100)
            }
        }));
        let naming = FrameNaming::Forward(Box::new(|frame: usize, _: &str| format!("a {frame}")));
        let catalog = SheetCatalog::build(&s, None, &naming).expect("catalog");
        assert_eq!((catalog.min_frame(), catalog.max_frame()), (1, 3));
    }

    #[test]
    fn test_forward_naming_that_resolves_nothing_is_fatal() {
        let s = sheet(json!({ "frames": { "x": raw(0, 100) } }));
        let naming =
            FrameNaming::Forward(Box::new(|frame: usize, _: &str| format!("missing {frame}")));
        let err = SheetCatalog::build(&s, None, &naming).unwrap_err();
        assert!(matches!(err, SpriteError::UnresolvableFrameRange));
    }

    #[test]
    fn test_inverse_naming_buckets_frames() {
        let s = sheet(json!({
            "frames": {
                "Legs#0": raw(0, 100),
                "Arms#0": raw(8, 90),
                "Legs#1": raw(16, 100),
                "Cape#1": raw(24, 100)
            },
            "meta": { "layers": [
                { "name": "Legs", "opacity": 255 },
                { "name": "Arms", "opacity": 255 }
            ] }
        }));
        let naming = FrameNaming::Inverse(Box::new(|key: &str| {
            let (layer, frame) = key.split_once('#')?;
            Some((frame.parse::<usize>().ok()?, layer.to_string()))
        }));
        let catalog = SheetCatalog::build(&s, None, &naming).expect("catalog");

        assert_eq!((catalog.min_frame(), catalog.max_frame()), (0, 1));
        let frame0 = catalog.frame(0).expect("frame 0");
        assert_eq!(frame0.layer_frames.len(), 2);
        let frame1 = catalog.frame(1).expect("frame 1");
        assert!(frame1.layer("Arms").is_none());
        assert!(frame1.layer("Cape").is_none(), "unknown layers are dropped");
    }

    #[test]
    fn test_inverse_naming_rejects_unmapped_key() {
        let s = sheet(json!({ "frames": { "Legs#0": raw(0, 100), "junk": raw(8, 100) } }));
        let naming = FrameNaming::Inverse(Box::new(|key: &str| {
            let (layer, frame) = key.split_once('#')?;
            Some((frame.parse::<usize>().ok()?, layer.to_string()))
        }));
        let err = SheetCatalog::build(&s, Some(&["Legs".to_string()]), &naming).unwrap_err();
        assert!(matches!(err, SpriteError::UnresolvableFrameName(ref key) if key == "junk"));
    }

    #[test]
    fn test_declaration_order_splits_layers_layer_major() {
        let s = sheet(json!({
            "frames": [
                { "filename": "a0", "frame": { "x": 0, "y": 0, "w": 8, "h": 8 } },
                { "filename": "a1", "frame": { "x": 8, "y": 0, "w": 8, "h": 8 } },
                { "filename": "b0", "frame": { "x": 16, "y": 0, "w": 8, "h": 8 } },
                { "filename": "b1", "frame": { "x": 24, "y": 0, "w": 8, "h": 8 } },
                { "filename": "extra", "frame": { "x": 32, "y": 0, "w": 8, "h": 8 } }
            ],
            "meta": { "layers": [
                { "name": "A", "opacity": 255 },
                { "name": "B", "opacity": 255 }
            ] }
        }));
        let catalog = SheetCatalog::build(&s, None, &FrameNaming::default()).expect("catalog");

        assert_eq!((catalog.min_frame(), catalog.max_frame()), (0, 1));
        let x_of = |frame: usize, layer: &str| {
            catalog
                .frame(frame)
                .and_then(|f| f.layer(layer))
                .map(|f| f.texture_rect.x)
        };
        assert_eq!(x_of(0, "A"), Some(0.0));
        assert_eq!(x_of(1, "A"), Some(8.0));
        assert_eq!(x_of(0, "B"), Some(16.0));
        assert_eq!(x_of(1, "B"), Some(24.0));
    }

    #[test]
    fn test_layer_metadata_registers_groups() {
        let s = sheet(json!({
            "frames": { "x": raw(0, 100) },
            "meta": { "layers": [
                { "name": "Body" },
                { "name": "Torso", "group": "Body", "opacity": 255 },
                { "name": "Head", "group": "Body", "opacity": 200 },
                { "name": "Fx", "opacity": 255 }
            ] }
        }));
        let catalog = SheetCatalog::build(
            &s,
            None,
            &FrameNaming::Forward(Box::new(|_: usize, _: &str| "x".to_string())),
        )
        .expect("catalog");

        assert_eq!(catalog.layers(), &["Torso", "Head", "Fx"]);
        assert_eq!(
            catalog.groups().members("Body"),
            Some(&["Torso".to_string(), "Head".to_string()][..])
        );
        assert_eq!(catalog.layer_index("Fx"), Some(2));
    }

    #[test]
    fn test_explicit_layers_are_used_verbatim() {
        let s = sheet(json!({
            "frames": { "x": raw(0, 100) },
            "meta": { "layers": [ { "name": "Fx", "opacity": 255 } ] }
        }));
        let explicit = vec!["Back".to_string(), "Front".to_string()];
        let catalog = SheetCatalog::build(
            &s,
            Some(&explicit),
            &FrameNaming::Forward(Box::new(|_: usize, _: &str| "x".to_string())),
        )
        .expect("catalog");
        assert_eq!(catalog.layers(), explicit.as_slice());

        let duplicated = vec!["Back".to_string(), "Back".to_string()];
        let err = SheetCatalog::build(&s, Some(&duplicated), &FrameNaming::default()).unwrap_err();
        assert!(matches!(err, SpriteError::DuplicateLayer(_)));
    }

    #[test]
    fn test_inverted_tag_range_is_fatal() {
        let s = sheet(json!({
            "frames": { "x": raw(0, 100) },
            "meta": { "frameTags": [ { "name": "Bad", "from": 3, "to": 1 } ] }
        }));
        let err = SheetCatalog::build(&s, None, &FrameNaming::default()).unwrap_err();
        assert!(matches!(err, SpriteError::InvalidTagRange { from: 3, to: 1, .. }));
    }

    #[test]
    fn test_tag_range_beyond_frames_stays_dense() {
        let s = sheet(json!({
            "frames": [ { "filename": "only", "frame": { "x": 0, "y": 0, "w": 8, "h": 8 } } ],
            "meta": { "frameTags": [ { "name": "Long", "from": 0, "to": 3 } ] }
        }));
        let catalog = SheetCatalog::build(&s, None, &FrameNaming::default()).expect("catalog");
        assert_eq!(catalog.frame_count(), 4);
        let last = catalog.frame(3).expect("dense table");
        assert!(last.layer_frames.is_empty());
        assert_eq!(last.duration, 0);
    }

    #[test]
    fn test_oversized_tag_range_is_rejected() {
        for to in [100_000_000, usize::MAX] {
            let s = sheet(json!({
                "frames": { "x": raw(0, 100) },
                "meta": { "frameTags": [ { "name": "Huge", "from": 0, "to": to } ] }
            }));
            let err = SheetCatalog::build(&s, None, &FrameNaming::default()).unwrap_err();
            assert!(
                matches!(err, SpriteError::UnresolvableFrameRange),
                "to = {to}: {err:?}"
            );
        }
    }

    #[test]
    fn test_empty_frame_is_canonical() {
        assert!(SheetFrame::EMPTY.is_empty());
        let frame: RawFrame =
            serde_json::from_value(raw(0, 100)).expect("valid raw frame");
        assert!(!SheetFrame::from_raw(&frame).is_empty());
    }
}
