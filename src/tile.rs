//! Tile-level types for room grids.
//!
//! A room's level data encodes every grid cell as a comma-separated list of
//! integer codes: the first is the terrain type, the rest are feature codes
//! stacked on the cell (beams, shortcut markers, hive, waterfall, ...).
//! Tiles are immutable once parsed and live inside their room's grid.

/// Terrain type of a single tile (code 0-4 in room data).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TerrainType {
    #[default]
    Air,
    Solid,
    Slope,
    Floor,
    ShortcutEntrance,
}

impl TerrainType {
    pub fn from_code(code: i32) -> Option<TerrainType> {
        match code {
            0 => Some(TerrainType::Air),
            1 => Some(TerrainType::Solid),
            2 => Some(TerrainType::Slope),
            3 => Some(TerrainType::Floor),
            4 => Some(TerrainType::ShortcutEntrance),
            _ => None,
        }
    }
}

/// What a shortcut marker on a tile leads to.
///
/// `Normal` tiles form the body of a shortcut path; the other variants
/// classify the destination tile the trace terminates on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShortcutType {
    #[default]
    None,
    Normal,
    RoomExit,
    CreatureHole,
    NpcTransportation,
    RegionTransportation,
}

/// Bitset of stackable tile attributes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TileAttributes(u16);

impl TileAttributes {
    pub const VERTICAL_BEAM: TileAttributes = TileAttributes(1 << 0);
    pub const HORIZONTAL_BEAM: TileAttributes = TileAttributes(1 << 1);
    pub const WALL_BEHIND: TileAttributes = TileAttributes(1 << 2);
    pub const HIVE: TileAttributes = TileAttributes(1 << 3);
    pub const WATERFALL: TileAttributes = TileAttributes(1 << 4);
    pub const GARBAGE_HOLE: TileAttributes = TileAttributes(1 << 5);
    pub const WORM_GRASS: TileAttributes = TileAttributes(1 << 6);

    pub fn empty() -> TileAttributes {
        TileAttributes(0)
    }

    pub fn contains(self, other: TileAttributes) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: TileAttributes) {
        self.0 |= other.0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for TileAttributes {
    type Output = TileAttributes;
    fn bitor(self, rhs: TileAttributes) -> TileAttributes {
        TileAttributes(self.0 | rhs.0)
    }
}

/// One cell of a room grid.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Tile {
    pub terrain: TerrainType,
    pub shortcut: ShortcutType,
    pub attributes: TileAttributes,
}

impl Tile {
    /// Parse one cell from its comma-separated integer codes.
    ///
    /// A bad terrain code falls back to `Air`; unknown feature codes are
    /// ignored. Malformed cells never fail the row.
    pub fn from_codes(codes: &str) -> Tile {
        let mut parts = codes.split(',');
        let terrain = parts
            .next()
            .and_then(|c| c.trim().parse::<i32>().ok())
            .and_then(TerrainType::from_code)
            .unwrap_or_default();

        let mut tile = Tile {
            terrain,
            shortcut: ShortcutType::None,
            attributes: TileAttributes::empty(),
        };

        for part in parts {
            let Ok(code) = part.trim().parse::<i32>() else {
                continue;
            };
            match code {
                1 => tile.attributes.insert(TileAttributes::VERTICAL_BEAM),
                2 => tile.attributes.insert(TileAttributes::HORIZONTAL_BEAM),
                3 => tile.shortcut = ShortcutType::Normal,
                4 => tile.shortcut = ShortcutType::RoomExit,
                5 => tile.shortcut = ShortcutType::CreatureHole,
                6 => tile.attributes.insert(TileAttributes::WALL_BEHIND),
                7 => tile.attributes.insert(TileAttributes::HIVE),
                8 => tile.attributes.insert(TileAttributes::WATERFALL),
                9 => tile.attributes.insert(TileAttributes::GARBAGE_HOLE),
                10 => tile.attributes.insert(TileAttributes::WORM_GRASS),
                12 => tile.shortcut = ShortcutType::NpcTransportation,
                13 => tile.shortcut = ShortcutType::RegionTransportation,
                _ => {}
            }
        }
        tile
    }

    /// Whether this tile carries any shortcut marker.
    pub fn is_shortcut(&self) -> bool {
        self.shortcut != ShortcutType::None
    }
}
