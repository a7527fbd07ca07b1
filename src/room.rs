//! Room data: level-text parsing, the tile grid, exits and shortcut tracing.
//!
//! A room's level file is line oriented: line 0 is the display name, line 1
//! is `"W*H|waterLevel|waterInFront"`, and line 11 holds the tile grid as
//! `|`-separated cells in column-major order (all of column 0 top to bottom,
//! then column 1, ...). Everything else in the file belongs to the game and
//! is ignored here.

use crate::geometry::{TilePos, Vec2};
use crate::objects::{PlacedObject, RoomEffect};
use crate::tile::{ShortcutType, TerrainType, Tile};

/// Line index of the tile grid inside a room level file.
const TILE_DATA_LINE: usize = 11;

/// Scan order for shortcut tracing: up, right, down, left.
const TRACE_DIRECTIONS: [TilePos; 4] = [
    TilePos { x: 0, y: -1 },
    TilePos { x: 1, y: 0 },
    TilePos { x: 0, y: 1 },
    TilePos { x: -1, y: 0 },
];

/// A traced shortcut: entrance tile, terminal tile and the terminal tile's
/// classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Shortcut {
    pub entrance: TilePos,
    pub target: TilePos,
    pub kind: ShortcutType,
}

/// One resolved adjacency slot: which room this exit leads to and which exit
/// slot on the target leads back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoomConnection {
    pub target: String,
    pub exit: usize,
    pub target_exit: usize,
}

/// A single room of a region.
#[derive(Clone, Debug, Default)]
pub struct Room {
    pub name: String,
    pub display_name: String,
    pub width: usize,
    pub height: usize,
    pub water_level: i32,
    pub water_in_front: bool,
    tiles: Vec<Tile>,
    /// RoomExit shortcut entrances, in trace order. The index into this list
    /// is the exit slot used by the world file's adjacency entries.
    pub exits: Vec<TilePos>,
    pub shortcuts: Vec<Shortcut>,
    /// Per-exit-slot resolved connection; `None` for disconnected slots.
    pub connections: Vec<Option<RoomConnection>>,
    pub placed_objects: Vec<PlacedObject>,
    pub effects: Vec<RoomEffect>,
    /// Layout position in map space, in tiles.
    pub world_pos: Vec2,
    pub layer: i32,
    pub subregion: Option<usize>,
    pub is_gate: bool,
    pub is_shelter: bool,
    pub is_swarm_room: bool,
    pub is_scavenger_trader: bool,
}

impl Room {
    pub fn new(name: &str) -> Room {
        Room {
            name: name.to_string(),
            display_name: name.to_string(),
            ..Room::default()
        }
    }

    pub fn in_bounds(&self, pos: TilePos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height
    }

    pub fn tile(&self, pos: TilePos) -> Option<&Tile> {
        if !self.in_bounds(pos) {
            return None;
        }
        Some(&self.tiles[pos.y as usize * self.width + pos.x as usize])
    }

    fn set_tile(&mut self, pos: TilePos, tile: Tile) {
        if self.in_bounds(pos) {
            self.tiles[pos.y as usize * self.width + pos.x as usize] = tile;
        }
    }

    /// Bounding rect size of the room in map units.
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    /// World-space position of the center of a tile.
    pub fn tile_world_pos(&self, pos: TilePos) -> Vec2 {
        self.world_pos + Vec2::new(pos.x as f32 + 0.5, pos.y as f32 + 0.5)
    }

    /// World-space point of an exit slot, or the room center for an
    /// out-of-range slot (stale world files reference missing exits).
    pub fn exit_world_pos(&self, exit: usize) -> Vec2 {
        match self.exits.get(exit) {
            Some(pos) => self.tile_world_pos(*pos),
            None => self.world_pos + self.size() * 0.5,
        }
    }

    /// Parse the room's level text into this room.
    ///
    /// Malformed rows and cells are skipped per-cell; only a missing or
    /// unparsable size line makes the whole room unusable.
    pub fn parse_level_text(&mut self, text: &str) -> Result<(), String> {
        let lines: Vec<&str> = text.lines().collect();

        if let Some(name) = lines.first() {
            if !name.trim().is_empty() {
                self.display_name = name.trim().to_string();
            }
        }

        let size_line = lines
            .get(1)
            .ok_or_else(|| format!("room {}: missing size line", self.name))?;
        self.parse_size_line(size_line)?;

        self.tiles = vec![Tile::default(); self.width * self.height];

        if let Some(tile_line) = lines.get(TILE_DATA_LINE) {
            self.parse_tile_line(tile_line);
        }

        self.derive_shortcuts();
        Ok(())
    }

    /// Line 1: `"W*H|waterLevel|waterInFront"`.
    fn parse_size_line(&mut self, line: &str) -> Result<(), String> {
        let mut fields = line.split('|');
        let size = fields
            .next()
            .ok_or_else(|| format!("room {}: empty size line", self.name))?;
        let (w, h) = size
            .split_once('*')
            .ok_or_else(|| format!("room {}: bad size field {:?}", self.name, size))?;
        self.width = w
            .trim()
            .parse::<usize>()
            .map_err(|_| format!("room {}: bad width {:?}", self.name, w))?;
        self.height = h
            .trim()
            .parse::<usize>()
            .map_err(|_| format!("room {}: bad height {:?}", self.name, h))?;

        self.water_level = fields
            .next()
            .and_then(|f| f.trim().parse::<i32>().ok())
            .unwrap_or(-1);
        self.water_in_front = fields
            .next()
            .map(|f| f.trim() == "1")
            .unwrap_or(false);
        Ok(())
    }

    /// Line 11: `|`-separated cells, column-major.
    fn parse_tile_line(&mut self, line: &str) {
        for (i, cell) in line.split('|').enumerate() {
            if cell.trim().is_empty() {
                continue;
            }
            if i >= self.width * self.height {
                break;
            }
            let pos = TilePos::new((i / self.height) as i32, (i % self.height) as i32);
            self.set_tile(pos, Tile::from_codes(cell));
        }
    }

    /// Trace every shortcut entrance and collect room exits in scan order.
    fn derive_shortcuts(&mut self) {
        self.shortcuts.clear();
        self.exits.clear();

        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                let pos = TilePos::new(x, y);
                let Some(tile) = self.tile(pos) else { continue };
                if tile.terrain != TerrainType::ShortcutEntrance {
                    continue;
                }
                let target = self.trace_shortcut(pos);
                let kind = self
                    .tile(target)
                    .map(|t| t.shortcut)
                    .unwrap_or(ShortcutType::None);
                self.shortcuts.push(Shortcut {
                    entrance: pos,
                    target,
                    kind,
                });
                if kind == ShortcutType::RoomExit {
                    self.exits.push(pos);
                }
            }
        }
        self.connections = vec![None; self.exits.len()];
    }

    /// Follow a shortcut path from an entrance tile to its terminal tile.
    ///
    /// Steps 4-directionally (up, right, down, left) onto adjacent tiles
    /// carrying a shortcut marker, never back onto the previous tile and
    /// never onto an already-visited tile, so loops of `Normal` tiles
    /// terminate. A non-`Normal` shortcut tile ends the walk immediately;
    /// running out of candidates returns the last position. A start with no
    /// valid neighbor returns the start itself.
    pub fn trace_shortcut(&self, start: TilePos) -> TilePos {
        let mut visited = vec![false; self.width * self.height];
        let mut current = start;
        let mut previous = start;

        loop {
            if self.in_bounds(current) {
                visited[current.y as usize * self.width + current.x as usize] = true;
            }

            let mut next = None;
            for dir in TRACE_DIRECTIONS {
                let candidate = current + dir;
                if candidate == previous || !self.in_bounds(candidate) {
                    continue;
                }
                if visited[candidate.y as usize * self.width + candidate.x as usize] {
                    continue;
                }
                let Some(tile) = self.tile(candidate) else { continue };
                if tile.is_shortcut() {
                    next = Some((candidate, tile.shortcut));
                    break;
                }
            }

            match next {
                Some((pos, kind)) => {
                    previous = current;
                    current = pos;
                    if kind != ShortcutType::Normal {
                        return current;
                    }
                }
                None => return current,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a room from a character map: `.` air, `#` solid, `E` shortcut
    /// entrance, `+` normal shortcut path, `X` room exit marker, `C`
    /// creature hole marker.
    fn room_from_map(rows: &[&str]) -> Room {
        let height = rows.len();
        let width = rows[0].len();
        let mut cells = Vec::new();
        for x in 0..width {
            for y in 0..height {
                let ch = rows[y].as_bytes()[x] as char;
                cells.push(match ch {
                    '.' => "0",
                    '#' => "1",
                    'E' => "4",
                    '+' => "1,3",
                    'X' => "1,4",
                    'C' => "1,5",
                    _ => panic!("unknown map char {ch}"),
                });
            }
        }
        let mut lines = vec!["Test Room".to_string(), format!("{width}*{height}|-1|0")];
        while lines.len() < TILE_DATA_LINE {
            lines.push(String::new());
        }
        lines.push(cells.join("|"));

        let mut room = Room::new("TEST_A01");
        room.parse_level_text(&lines.join("\n")).unwrap();
        room
    }

    #[test]
    fn test_parse_size_and_water() {
        let mut room = Room::new("SU_C01");
        let text = "Subterranean C01\n24*12|5|1\n\n\n\n\n\n\n\n\n\n\n";
        room.parse_level_text(text).unwrap();
        assert_eq!(room.width, 24);
        assert_eq!(room.height, 12);
        assert_eq!(room.water_level, 5);
        assert!(room.water_in_front);
        assert_eq!(room.display_name, "Subterranean C01");
    }

    #[test]
    fn test_missing_size_line_is_error() {
        let mut room = Room::new("SU_C01");
        assert!(room.parse_level_text("only a name").is_err());
    }

    #[test]
    fn test_tile_grid_column_major() {
        let room = room_from_map(&[
            "#.",
            "##",
        ]);
        assert_eq!(
            room.tile(TilePos::new(0, 0)).unwrap().terrain,
            TerrainType::Solid
        );
        assert_eq!(
            room.tile(TilePos::new(1, 0)).unwrap().terrain,
            TerrainType::Air
        );
        assert_eq!(
            room.tile(TilePos::new(1, 1)).unwrap().terrain,
            TerrainType::Solid
        );
    }

    #[test]
    fn test_straight_corridor_trace() {
        let room = room_from_map(&[
            "E+++X",
            "#####",
        ]);
        assert_eq!(room.shortcuts.len(), 1);
        let shortcut = room.shortcuts[0];
        assert_eq!(shortcut.entrance, TilePos::new(0, 0));
        assert_eq!(shortcut.target, TilePos::new(4, 0));
        assert_eq!(shortcut.kind, ShortcutType::RoomExit);
        assert_eq!(room.exits, vec![TilePos::new(0, 0)]);
    }

    #[test]
    fn test_bent_corridor_trace() {
        let room = room_from_map(&[
            "E+...",
            ".+...",
            ".+++C",
        ]);
        let shortcut = room.shortcuts[0];
        assert_eq!(shortcut.target, TilePos::new(4, 2));
        assert_eq!(shortcut.kind, ShortcutType::CreatureHole);
        // Creature holes are not room exits.
        assert!(room.exits.is_empty());
    }

    #[test]
    fn test_trace_terminates_on_cycle() {
        // 2x2 loop of normal shortcut tiles next to the entrance. Without a
        // visited guard this walk would orbit forever.
        let room = room_from_map(&[
            "E++..",
            ".++..",
        ]);
        let target = room.trace_shortcut(TilePos::new(0, 0));
        assert!(room.in_bounds(target));
    }

    #[test]
    fn test_trace_with_no_neighbors_returns_start() {
        let room = room_from_map(&[
            "E..",
            "...",
        ]);
        assert_eq!(room.trace_shortcut(TilePos::new(0, 0)), TilePos::new(0, 0));
    }

    #[test]
    fn test_dead_end_returns_last_position() {
        let room = room_from_map(&[
            "E++..",
            ".....",
        ]);
        // Path of normal tiles that just stops; trace ends on the last one.
        assert_eq!(room.trace_shortcut(TilePos::new(0, 0)), TilePos::new(2, 0));
    }

    #[test]
    fn test_exit_order_is_scan_order() {
        let room = room_from_map(&[
            "E+X..",
            ".....",
            "..X+E",
        ]);
        assert_eq!(room.exits.len(), 2);
        // Row 0 entrance comes before row 2 entrance.
        assert_eq!(room.exits[0], TilePos::new(0, 0));
        assert_eq!(room.exits[1], TilePos::new(4, 2));
    }

    #[test]
    fn test_short_tile_row_tolerated() {
        let mut room = Room::new("SU_C02");
        let mut lines = vec!["name".to_string(), "3*2|-1|0".to_string()];
        while lines.len() < TILE_DATA_LINE {
            lines.push(String::new());
        }
        // Only two cells for a 6-cell grid, one of them garbage.
        lines.push("1|zzz".to_string());
        room.parse_level_text(&lines.join("\n")).unwrap();
        assert_eq!(
            room.tile(TilePos::new(0, 0)).unwrap().terrain,
            TerrainType::Solid
        );
        assert_eq!(
            room.tile(TilePos::new(2, 1)).unwrap().terrain,
            TerrainType::Air
        );
    }
}
