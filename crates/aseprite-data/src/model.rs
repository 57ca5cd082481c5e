use serde::ser::SerializeMap;
use serde::{de::MapAccess, de::SeqAccess, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Root of an Aseprite `--data` export.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SheetJson {
    pub frames: FrameTable,
    #[serde(default)]
    pub meta: Meta,
}

impl SheetJson {
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default)]
    pub w: u32,
    #[serde(default)]
    pub h: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct Size {
    #[serde(default)]
    pub w: u32,
    #[serde(default)]
    pub h: u32,
}

/// One packed sub-image as it appears in the `frames` table.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawFrame {
    pub frame: Rect,
    #[serde(default)]
    pub rotated: bool,
    #[serde(default)]
    pub trimmed: bool,
    #[serde(default)]
    pub sprite_source_size: Option<Rect>, // Trimmed placement inside the untrimmed cel
    #[serde(default)]
    pub source_size: Option<Size>, // Untrimmed cel size
    #[serde(default = "default_duration")]
    pub duration: u32, // Milliseconds
}

fn default_duration() -> u32 {
    100
}

impl RawFrame {
    /// Trimmed placement, falling back to the packed size at the origin when
    /// the exporter omitted `spriteSourceSize`.
    pub fn trimmed_rect(&self) -> Rect {
        self.sprite_source_size.unwrap_or(Rect {
            x: 0,
            y: 0,
            w: self.frame.w,
            h: self.frame.h,
        })
    }

    pub fn untrimmed_size(&self) -> Size {
        self.source_size.unwrap_or(Size {
            w: self.frame.w,
            h: self.frame.h,
        })
    }
}

/// Array-form entry: the frame carries its own filename.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NamedFrame {
    pub filename: String,
    #[serde(flatten)]
    pub frame: RawFrame,
}

/// The `frames` table. Aseprite writes either a filename-keyed object
/// ("Hash" export) or an array of filename-tagged frames ("Array" export).
/// Both keep document order, which matters when frames are numbered by
/// declaration order.
#[derive(Debug, Clone)]
pub enum FrameTable {
    Hash(Vec<(String, RawFrame)>),
    Array(Vec<NamedFrame>),
}

impl Default for FrameTable {
    fn default() -> Self {
        FrameTable::Array(Vec::new())
    }
}

impl FrameTable {
    pub fn len(&self) -> usize {
        match self {
            FrameTable::Hash(entries) => entries.len(),
            FrameTable::Array(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Frames in declaration order, paired with their source key.
    pub fn iter(&self) -> Box<dyn Iterator<Item = (&str, &RawFrame)> + '_> {
        match self {
            FrameTable::Hash(entries) => {
                Box::new(entries.iter().map(|(key, frame)| (key.as_str(), frame)))
            }
            FrameTable::Array(entries) => Box::new(
                entries
                    .iter()
                    .map(|named| (named.filename.as_str(), &named.frame)),
            ),
        }
    }
}

impl<'de> Deserialize<'de> for FrameTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FrameTableVisitor;
        impl<'de> serde::de::Visitor<'de> for FrameTableVisitor {
            type Value = FrameTable;
            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a filename-keyed frame object or an array of named frames")
            }
            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, frame)) = map.next_entry::<String, RawFrame>()? {
                    entries.push((key, frame));
                }
                Ok(FrameTable::Hash(entries))
            }
            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut entries = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(named) = seq.next_element::<NamedFrame>()? {
                    entries.push(named);
                }
                Ok(FrameTable::Array(entries))
            }
        }
        deserializer.deserialize_any(FrameTableVisitor)
    }
}

impl Serialize for FrameTable {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            FrameTable::Hash(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, frame) in entries {
                    map.serialize_entry(key, frame)?;
                }
                map.end()
            }
            FrameTable::Array(entries) => entries.serialize(serializer),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(default)]
    pub app: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub size: Option<Size>,
    #[serde(default, deserialize_with = "deserialize_scale")]
    pub scale: Option<String>, // Aseprite writes "1"; some packers write 1
    #[serde(default)]
    pub frame_tags: Vec<FrameTag>,
    #[serde(default)]
    pub layers: Vec<LayerEntry>,
}

fn deserialize_scale<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    Ok(match v {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FrameTag {
    pub name: String,
    pub from: usize,
    pub to: usize,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
    Pingpong,
    PingpongReverse,
    #[serde(other)]
    Unknown,
}

/// An entry of `meta.layers`, classified once at parse time: entries that
/// carry an opacity are drawable layers, entries without one are groups.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(from = "LayerEntryData", into = "LayerEntryData")]
pub enum LayerEntry {
    Layer {
        name: String,
        group: Option<String>,
        opacity: u8,
        blend_mode: Option<String>,
    },
    Group {
        name: String,
        group: Option<String>,
    },
}

impl LayerEntry {
    pub fn name(&self) -> &str {
        match self {
            LayerEntry::Layer { name, .. } | LayerEntry::Group { name, .. } => name,
        }
    }

    /// The parent group this entry belongs to, if any.
    pub fn group(&self) -> Option<&str> {
        match self {
            LayerEntry::Layer { group, .. } | LayerEntry::Group { group, .. } => group.as_deref(),
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, LayerEntry::Group { .. })
    }
}

/// Wire shape of a `meta.layers` entry.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LayerEntryData {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blend_mode: Option<String>,
}

impl From<LayerEntryData> for LayerEntry {
    fn from(raw: LayerEntryData) -> Self {
        match raw.opacity {
            Some(opacity) => LayerEntry::Layer {
                name: raw.name,
                group: raw.group,
                opacity,
                blend_mode: raw.blend_mode,
            },
            None => LayerEntry::Group {
                name: raw.name,
                group: raw.group,
            },
        }
    }
}

impl From<LayerEntry> for LayerEntryData {
    fn from(entry: LayerEntry) -> Self {
        match entry {
            LayerEntry::Layer {
                name,
                group,
                opacity,
                blend_mode,
            } => LayerEntryData {
                name,
                group,
                opacity: Some(opacity),
                blend_mode,
            },
            LayerEntry::Group { name, group } => LayerEntryData {
                name,
                group,
                opacity: None,
                blend_mode: None,
            },
        }
    }
}
