//! Map objects: placed room objects, effects, and the closed registry of
//! object kinds that can appear on the map and in the saved session.
//!
//! The set of persistable kinds is closed and known at build time, so
//! deserialization goes through a tag string matched against the registry
//! instead of any runtime type machinery. Per-kind behavior is a capability
//! bitset plus payload fields on one struct, dispatched with `match`.

use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;

/// Capabilities of a map object, as a bitset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const ICON: Capabilities = Capabilities(1 << 0);
    pub const TEXT: Capabilities = Capabilities(1 << 1);
    pub const SELECTABLE: Capabilities = Capabilities(1 << 2);
    pub const ROOM_ANCHORED: Capabilities = Capabilities(1 << 3);

    pub fn contains(self, other: Capabilities) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for Capabilities {
    type Output = Capabilities;
    fn bitor(self, rhs: Capabilities) -> Capabilities {
        Capabilities(self.0 | rhs.0)
    }
}

/// Closed set of map object kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapObjectKind {
    RoomIcon,
    ShelterIcon,
    GateIcon,
    KarmaFlowerIcon,
    TextLabel,
    SubregionLabel,
}

impl MapObjectKind {
    /// Stable tag used in save files.
    pub fn tag(&self) -> &'static str {
        match self {
            MapObjectKind::RoomIcon => "room_icon",
            MapObjectKind::ShelterIcon => "shelter_icon",
            MapObjectKind::GateIcon => "gate_icon",
            MapObjectKind::KarmaFlowerIcon => "karma_flower_icon",
            MapObjectKind::TextLabel => "text_label",
            MapObjectKind::SubregionLabel => "subregion_label",
        }
    }

    pub fn from_tag(tag: &str) -> Option<MapObjectKind> {
        ALL_KINDS.iter().copied().find(|k| k.tag() == tag)
    }

    pub fn capabilities(&self) -> Capabilities {
        match self {
            MapObjectKind::RoomIcon
            | MapObjectKind::ShelterIcon
            | MapObjectKind::GateIcon
            | MapObjectKind::KarmaFlowerIcon => {
                Capabilities::ICON | Capabilities::SELECTABLE | Capabilities::ROOM_ANCHORED
            }
            MapObjectKind::TextLabel => Capabilities::TEXT | Capabilities::SELECTABLE,
            MapObjectKind::SubregionLabel => Capabilities::TEXT,
        }
    }
}

const ALL_KINDS: [MapObjectKind; 6] = [
    MapObjectKind::RoomIcon,
    MapObjectKind::ShelterIcon,
    MapObjectKind::GateIcon,
    MapObjectKind::KarmaFlowerIcon,
    MapObjectKind::TextLabel,
    MapObjectKind::SubregionLabel,
];

/// One object placed on the map, selectable and draggable when its
/// capabilities say so.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MapObject {
    pub name: String,
    pub kind: MapObjectKind,
    /// World position, or offset from the anchor room when room-anchored.
    pub position: Vec2Data,
    /// Room name this object is anchored to, when room-anchored.
    pub anchor_room: Option<String>,
    /// Text payload for text-capable kinds.
    pub text: Option<String>,
    /// Logical icon name for icon-capable kinds, resolved via the asset
    /// manifest.
    pub icon: Option<String>,
}

/// Serializable position; `Vec2` itself stays serde-free.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2Data {
    pub x: f32,
    pub y: f32,
}

impl From<Vec2> for Vec2Data {
    fn from(v: Vec2) -> Vec2Data {
        Vec2Data { x: v.x, y: v.y }
    }
}

impl From<Vec2Data> for Vec2 {
    fn from(v: Vec2Data) -> Vec2 {
        Vec2::new(v.x, v.y)
    }
}

impl MapObject {
    pub fn new(name: &str, kind: MapObjectKind, position: Vec2) -> MapObject {
        MapObject {
            name: name.to_string(),
            kind,
            position: position.into(),
            anchor_room: None,
            text: None,
            icon: None,
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.kind.capabilities()
    }

    /// Save-file key, unique per object: name plus kind tag.
    pub fn key(&self) -> String {
        format!("{}:{}", self.name, self.kind.tag())
    }
}

/// A `PlacedObjects:` entry from a room settings file.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedObject {
    pub name: String,
    pub x: f32,
    pub y: f32,
}

/// An `Effects:` entry from a room settings file (`name-amount-?-?`).
#[derive(Clone, Debug, PartialEq)]
pub struct RoomEffect {
    pub name: String,
    pub amount: f32,
}

/// Parse a room settings file for `PlacedObjects:` and `Effects:` lines.
///
/// Malformed sub-records are skipped; the function never fails.
pub fn parse_room_settings(text: &str) -> (Vec<PlacedObject>, Vec<RoomEffect>) {
    let mut objects = Vec::new();
    let mut effects = Vec::new();

    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("PlacedObjects:") {
            for record in rest.split(char::is_whitespace).flat_map(|r| r.split(',')) {
                // record: name><x><y>... fields separated by "><"
                let mut fields = record.split("><");
                let Some(name) = fields.next() else { continue };
                let name = name.trim();
                if name.is_empty() {
                    continue;
                }
                let x = fields.next().and_then(|f| f.trim().parse::<f32>().ok());
                let y = fields.next().and_then(|f| f.trim().parse::<f32>().ok());
                let (Some(x), Some(y)) = (x, y) else { continue };
                objects.push(PlacedObject {
                    name: name.to_string(),
                    x,
                    y,
                });
            }
        } else if let Some(rest) = line.strip_prefix("Effects:") {
            for record in rest.split(',') {
                let mut fields = record.split('-');
                let Some(name) = fields.next() else { continue };
                let name = name.trim();
                if name.is_empty() {
                    continue;
                }
                let Some(amount) = fields.next().and_then(|f| f.trim().parse::<f32>().ok())
                else {
                    continue;
                };
                effects.push(RoomEffect {
                    name: name.to_string(),
                    amount,
                });
            }
        }
    }

    (objects, effects)
}
