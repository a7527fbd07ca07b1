//! Region loading: world text, conditional links, map positions, gates and
//! subregions, assembled into a `Region` room graph.
//!
//! Parsing is staged the same way the world files are layered: room
//! declarations first, then slugcat-conditional overrides, then room level
//! data, then cross-referencing adjacency into reciprocal connections, then
//! map positions and gate locks. Every anomaly lands in the shared
//! `LoadErrorLog`; the region always loads with whatever survived.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use crate::errors::{LoadErrorKind, LoadErrorLog};
use crate::geometry::Vec2;
use crate::objects;
use crate::room::{Room, RoomConnection};

/// Offset applied when a room inherits its position from a neighbor.
const ADOPTED_POS_OFFSET: Vec2 = Vec2 { x: 8.0, y: 8.0 };

/// Default palette cycled through for subregions without an explicit color.
const SUBREGION_PALETTE: [[u8; 4]; 8] = [
    [54, 90, 130, 255],
    [130, 84, 51, 255],
    [77, 125, 66, 255],
    [122, 62, 120, 255],
    [140, 127, 51, 255],
    [58, 122, 117, 255],
    [125, 62, 62, 255],
    [95, 95, 130, 255],
];

/// A color that is either a named reference into the region color table or
/// a direct value.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorRef {
    pub name: Option<String>,
    pub color: [u8; 4],
}

impl ColorRef {
    pub fn direct(color: [u8; 4]) -> ColorRef {
        ColorRef { name: None, color }
    }

    pub fn named(name: &str, color: [u8; 4]) -> ColorRef {
        ColorRef {
            name: Some(name.to_string()),
            color,
        }
    }
}

/// Named, reusable colors shared by subregions.
#[derive(Clone, Debug, Default)]
pub struct ColorTable {
    entries: Vec<(String, [u8; 4])>,
}

impl ColorTable {
    pub fn get(&self, name: &str) -> Option<[u8; 4]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| *c)
    }

    pub fn set(&mut self, name: &str, color: [u8; 4]) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = color,
            None => self.entries.push((name.to_string(), color)),
        }
    }

    pub fn entries(&self) -> &[(String, [u8; 4])] {
        &self.entries
    }
}

/// A subregion of the map: rooms tagged with the same subregion name share
/// background and water colors.
#[derive(Clone, Debug)]
pub struct Subregion {
    pub name: String,
    pub background_color: ColorRef,
    pub water_color: ColorRef,
}

/// A gate room's lock info and resolved target region.
#[derive(Clone, Debug, PartialEq)]
pub struct GateInfo {
    pub room: String,
    pub left_karma: String,
    pub right_karma: String,
    pub swapped: bool,
    /// The other side of the gate, when the name resolves against this
    /// region's id.
    pub target_region: Option<String>,
}

/// A loaded region: ordered rooms plus subregion/gate metadata.
#[derive(Clone, Debug, Default)]
pub struct Region {
    pub id: String,
    pub rooms: Vec<Room>,
    pub subregions: Vec<Subregion>,
    pub colors: ColorTable,
    pub gates: Vec<GateInfo>,
    index: HashMap<String, usize>,
}

impl Region {
    pub fn room_index(&self, name: &str) -> Option<usize> {
        self.index.get(&name.to_ascii_uppercase()).copied()
    }

    pub fn room(&self, name: &str) -> Option<&Room> {
        self.room_index(name).map(|i| &self.rooms[i])
    }

    pub fn room_mut(&mut self, name: &str) -> Option<&mut Room> {
        let i = self.room_index(name)?;
        Some(&mut self.rooms[i])
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .rooms
            .iter()
            .enumerate()
            .map(|(i, r)| (r.name.to_ascii_uppercase(), i))
            .collect();
    }

    fn subregion_index(&mut self, name: &str) -> usize {
        if let Some(i) = self.subregions.iter().position(|s| s.name == name) {
            return i;
        }
        let color = SUBREGION_PALETTE[self.subregions.len() % SUBREGION_PALETTE.len()];
        let water = [color[0] / 2, color[1] / 2, color[2].saturating_add(60), 255];
        self.subregions.push(Subregion {
            name: name.to_string(),
            background_color: ColorRef::named(name, color),
            water_color: ColorRef::direct(water),
        });
        self.colors.set(name, color);
        self.subregions.len() - 1
    }
}

/// Provider of per-room level and settings text.
///
/// The editor reads from the region directory; tests provide in-memory
/// sources.
pub trait RoomDataSource {
    fn level_text(&self, room: &str) -> Option<String>;
    fn settings_text(&self, room: &str) -> Option<String>;
}

/// Directory-backed room data: `<root>/<room>.txt` and
/// `<root>/<room>_settings.txt`, case-insensitive on the room name.
pub struct DirDataSource {
    pub root: PathBuf,
}

impl RoomDataSource for DirDataSource {
    fn level_text(&self, room: &str) -> Option<String> {
        read_any_case(&self.root, &format!("{room}.txt"))
    }

    fn settings_text(&self, room: &str) -> Option<String> {
        read_any_case(&self.root, &format!("{room}_settings.txt"))
    }
}

fn read_any_case(root: &std::path::Path, file: &str) -> Option<String> {
    let direct = root.join(file);
    if let Ok(text) = std::fs::read_to_string(&direct) {
        return Some(text);
    }
    std::fs::read_to_string(root.join(file.to_ascii_lowercase())).ok()
}

/// In-memory room data for tests and state reloads.
#[derive(Default)]
pub struct MemoryDataSource {
    pub levels: HashMap<String, String>,
    pub settings: HashMap<String, String>,
}

impl RoomDataSource for MemoryDataSource {
    fn level_text(&self, room: &str) -> Option<String> {
        self.levels.get(room).cloned()
    }

    fn settings_text(&self, room: &str) -> Option<String> {
        self.settings.get(room).cloned()
    }
}

/// Raw inputs of one region load.
pub struct RegionSource<'a> {
    pub id: &'a str,
    pub world_text: &'a str,
    pub map_text: &'a str,
    pub properties_text: &'a str,
    pub gate_lock_text: &'a str,
    pub data: &'a dyn RoomDataSource,
}

/// One declared room before cross-referencing.
#[derive(Clone, Debug, Default)]
struct RoomDecl {
    name: String,
    adjacency: Vec<String>,
    is_gate: bool,
    is_shelter: bool,
    is_swarm_room: bool,
    is_scavenger_trader: bool,
}

/// One line of the `CONDITIONAL LINKS` block.
#[derive(Clone, Debug)]
enum ConditionalLink {
    /// Room exists only for these slugcats.
    Exclusive { slugcats: Vec<String>, room: String },
    /// Room is hidden for these slugcats.
    Hide { slugcats: Vec<String>, room: String },
    /// Replace `target` (or the next DISCONNECTED slot) in `room`'s
    /// adjacency with `replacement` for these slugcats.
    Replace {
        slugcats: Vec<String>,
        room: String,
        target: String,
        replacement: String,
    },
}

/// Build a region from its raw sources.
///
/// `slugcat` selects which conditional links apply; `None` loads the
/// unconditional world (exclusive/hidden rooms all stay).
pub fn build_region(
    src: &RegionSource,
    slugcat: Option<&str>,
    errors: &mut LoadErrorLog,
) -> Region {
    let (mut decls, links) = parse_world_text(src.world_text);
    apply_conditional_links(&mut decls, &links, slugcat);

    let mut region = Region {
        id: src.id.to_ascii_uppercase(),
        ..Region::default()
    };

    // Load per-room level data; rooms without a data file are excluded.
    for decl in &decls {
        let Some(text) = src.data.level_text(&decl.name) else {
            errors.push(
                LoadErrorKind::MissingRoomFile,
                format!("{}: no level data, room excluded", decl.name),
            );
            continue;
        };
        let mut room = Room::new(&decl.name);
        if let Err(e) = room.parse_level_text(&text) {
            errors.push(LoadErrorKind::MissingRoomFile, e);
            continue;
        }
        room.is_gate = decl.is_gate || decl.name.to_ascii_uppercase().starts_with("GATE_");
        room.is_shelter = decl.is_shelter;
        room.is_swarm_room = decl.is_swarm_room;
        room.is_scavenger_trader = decl.is_scavenger_trader;

        if let Some(settings) = src.data.settings_text(&decl.name) {
            let (placed, effects) = objects::parse_room_settings(&settings);
            room.placed_objects = placed;
            room.effects = effects;
        }
        region.rooms.push(room);
    }
    region.rebuild_index();

    cross_reference(&mut region, &decls, errors);
    parse_properties(&mut region, src.properties_text, errors);
    let positioned = apply_map_text(&mut region, src.map_text, errors);
    resolve_positions(&mut region, &positioned, errors);
    parse_gates(&mut region, src.gate_lock_text, errors);

    region
}

/// Parse the region properties text: subregion declarations in order, with
/// an optional color (`Subregion: <name>` or `Subregion: <name>: #RRGGBB`).
///
/// Declared subregions exist even when no room references them; an explicit
/// color replaces the palette default.
fn parse_properties(region: &mut Region, text: &str, errors: &mut LoadErrorLog) {
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        let Some(rest) = line.strip_prefix("Subregion:") else { continue };
        let mut fields = rest.split(':').map(str::trim);
        let Some(name) = fields.next().filter(|n| !n.is_empty()) else {
            continue;
        };
        let name = name.to_string();
        let index = region.subregion_index(&name);
        if let Some(color_field) = fields.next() {
            match parse_hex_color(color_field) {
                Some(color) => {
                    region.subregions[index].background_color = ColorRef::named(&name, color);
                    region.colors.set(&name, color);
                }
                None => errors.push(
                    LoadErrorKind::BadSettings,
                    format!("subregion {name}: unparsable color {color_field:?}"),
                ),
            }
        }
    }
}

/// `#RRGGBB`, fully opaque.
fn parse_hex_color(field: &str) -> Option<[u8; 4]> {
    let hex = field.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let value = u32::from_str_radix(hex, 16).ok()?;
    Some([(value >> 16) as u8, (value >> 8) as u8, value as u8, 255])
}

/// Parse the `ROOMS` and `CONDITIONAL LINKS` blocks of a world file.
fn parse_world_text(text: &str) -> (Vec<RoomDecl>, Vec<ConditionalLink>) {
    let mut decls = Vec::new();
    let mut links = Vec::new();

    let mut in_rooms = false;
    let mut in_links = false;
    for line in text.lines() {
        let line = line.trim();
        match line {
            "ROOMS" => {
                in_rooms = true;
                continue;
            }
            "END ROOMS" => {
                in_rooms = false;
                continue;
            }
            "CONDITIONAL LINKS" => {
                in_links = true;
                continue;
            }
            "END CONDITIONAL LINKS" => {
                in_links = false;
                continue;
            }
            _ => {}
        }
        if line.is_empty() || line.starts_with("//") {
            continue;
        }

        if in_rooms {
            if let Some(decl) = parse_room_decl(line) {
                decls.push(decl);
            }
        } else if in_links {
            if let Some(link) = parse_conditional_link(line) {
                links.push(link);
            }
        }
    }
    (decls, links)
}

/// `NAME : adj1, adj2, DISCONNECTED : GATE` (tags optional).
fn parse_room_decl(line: &str) -> Option<RoomDecl> {
    let mut parts = line.split(':').map(str::trim);
    let name = parts.next()?;
    if name.is_empty() {
        return None;
    }
    let mut decl = RoomDecl {
        name: name.to_string(),
        ..RoomDecl::default()
    };
    if let Some(adjacency) = parts.next() {
        decl.adjacency = adjacency
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    for tag in parts {
        match tag.to_ascii_uppercase().as_str() {
            "GATE" => decl.is_gate = true,
            "SHELTER" => decl.is_shelter = true,
            "SWARMROOM" => decl.is_swarm_room = true,
            "SCAVTRADER" | "SCAVOUTPOST" => decl.is_scavenger_trader = true,
            _ => {}
        }
    }
    Some(decl)
}

fn parse_conditional_link(line: &str) -> Option<ConditionalLink> {
    let parts: Vec<&str> = line.split(':').map(str::trim).collect();
    let slugcats: Vec<String> = parts
        .first()?
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    match parts.get(1).copied() {
        Some("EXCLUSIVEROOM") => Some(ConditionalLink::Exclusive {
            slugcats,
            room: parts.get(2)?.to_string(),
        }),
        Some("HIDEROOM") => Some(ConditionalLink::Hide {
            slugcats,
            room: parts.get(2)?.to_string(),
        }),
        Some(room) if parts.len() >= 4 => Some(ConditionalLink::Replace {
            slugcats,
            room: room.to_string(),
            target: parts[2].to_string(),
            replacement: parts[3].to_string(),
        }),
        _ => None,
    }
}

/// Apply conditional links for the selected slugcat.
///
/// EXCLUSIVEROOM directives accumulate an eligibility set per room; removal
/// happens only when a slugcat is actually selected. Replacement of
/// `DISCONNECTED` targets consumes slots left to right so several overrides
/// on one room compose deterministically.
fn apply_conditional_links(
    decls: &mut Vec<RoomDecl>,
    links: &[ConditionalLink],
    slugcat: Option<&str>,
) {
    let Some(slugcat) = slugcat else { return };

    let matches = |cats: &[String]| cats.iter().any(|c| c.eq_ignore_ascii_case(slugcat));

    // Replacements first, so a later hide of the same room still wins.
    let mut disconnected_consumed: HashMap<String, usize> = HashMap::new();
    for link in links {
        let ConditionalLink::Replace {
            slugcats,
            room,
            target,
            replacement,
        } = link
        else {
            continue;
        };
        if !matches(slugcats) {
            continue;
        }
        let Some(decl) = decls.iter_mut().find(|d| d.name.eq_ignore_ascii_case(room)) else {
            continue;
        };
        if target.eq_ignore_ascii_case("DISCONNECTED") {
            let consumed = disconnected_consumed.entry(decl.name.clone()).or_insert(0);
            let slot = decl
                .adjacency
                .iter()
                .enumerate()
                .filter(|(_, a)| a.eq_ignore_ascii_case("DISCONNECTED"))
                .nth(*consumed)
                .map(|(i, _)| i);
            if let Some(i) = slot {
                decl.adjacency[i] = replacement.clone();
                *consumed += 1;
            }
        } else if let Some(entry) = decl
            .adjacency
            .iter_mut()
            .find(|a| a.eq_ignore_ascii_case(target))
        {
            *entry = replacement.clone();
        }
    }

    // Accumulate eligibility sets, then remove.
    let mut exclusive: HashMap<String, HashSet<String>> = HashMap::new();
    let mut hidden: HashSet<String> = HashSet::new();
    for link in links {
        match link {
            ConditionalLink::Exclusive { slugcats, room } => {
                exclusive
                    .entry(room.to_ascii_uppercase())
                    .or_default()
                    .extend(slugcats.iter().map(|s| s.to_ascii_lowercase()));
            }
            ConditionalLink::Hide { slugcats, room } => {
                if matches(slugcats) {
                    hidden.insert(room.to_ascii_uppercase());
                }
            }
            ConditionalLink::Replace { .. } => {}
        }
    }
    decls.retain(|d| {
        let key = d.name.to_ascii_uppercase();
        if hidden.contains(&key) {
            return false;
        }
        match exclusive.get(&key) {
            Some(set) => set.contains(&slugcat.to_ascii_lowercase()),
            None => true,
        }
    });
}

/// Resolve adjacency names into reciprocal exit-slot connections.
///
/// For each slot, the reverse slot on the target is the index of the
/// target's adjacency entry naming this room. Asymmetric entries are dropped
/// with a load error; no synthetic reciprocal is ever invented.
fn cross_reference(region: &mut Region, decls: &[RoomDecl], errors: &mut LoadErrorLog) {
    let adjacency: HashMap<String, Vec<String>> = decls
        .iter()
        .map(|d| (d.name.to_ascii_uppercase(), d.adjacency.clone()))
        .collect();

    for decl in decls {
        let Some(room_idx) = region.room_index(&decl.name) else { continue };

        let mut connections: Vec<Option<RoomConnection>> = vec![None; decl.adjacency.len()];
        for (slot, target_name) in decl.adjacency.iter().enumerate() {
            if target_name.eq_ignore_ascii_case("DISCONNECTED") {
                continue;
            }
            if region.room_index(target_name).is_none() {
                errors.push(
                    LoadErrorKind::UnknownRoom,
                    format!("{} exit {} names unknown room {}", decl.name, slot, target_name),
                );
                continue;
            }
            let reverse = adjacency
                .get(&target_name.to_ascii_uppercase())
                .and_then(|adj| {
                    adj.iter()
                        .position(|a| a.eq_ignore_ascii_case(&decl.name))
                });
            match reverse {
                Some(target_exit) => {
                    connections[slot] = Some(RoomConnection {
                        target: target_name.clone(),
                        exit: slot,
                        target_exit,
                    });
                }
                None => {
                    errors.push(
                        LoadErrorKind::DanglingConnection,
                        format!(
                            "{} names {} but {} does not name it back",
                            decl.name, target_name, target_name
                        ),
                    );
                }
            }
        }
        region.rooms[room_idx].connections = connections;
    }
}

/// Apply the map file: explicit positions, layer and subregion per room.
///
/// Lines are `NAME: x,y,devx,devy,layer,subregion`; trailing fields are
/// optional. Returns the uppercased names of rooms that received an explicit
/// position, `0,0` included.
fn apply_map_text(
    region: &mut Region,
    map_text: &str,
    errors: &mut LoadErrorLog,
) -> HashSet<String> {
    let mut positioned = HashSet::new();
    for line in map_text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        let Some((name, rest)) = line.split_once(':') else { continue };
        let name = name.trim();
        // Map files also hold object lines keyed differently; only room
        // entries are interesting here.
        if region.room_index(name).is_none() {
            continue;
        }

        let fields: Vec<&str> = rest.split(',').map(str::trim).collect();
        let x = fields.first().and_then(|f| f.parse::<f32>().ok());
        let y = fields.get(1).and_then(|f| f.parse::<f32>().ok());
        let (Some(x), Some(y)) = (x, y) else {
            errors.push(
                LoadErrorKind::BadMapLine,
                format!("{name}: unparsable position {rest:?}"),
            );
            continue;
        };
        let layer = fields.get(4).and_then(|f| f.parse::<i32>().ok()).unwrap_or(0);
        let subregion = fields
            .get(5)
            .filter(|s| !s.is_empty())
            .map(|s| region.subregion_index(s));

        if let Some(room) = region.room_mut(name) {
            room.world_pos = Vec2::new(x, y);
            room.layer = layer;
            room.subregion = subregion;
            positioned.insert(room.name.to_ascii_uppercase());
        }
    }
    positioned
}

/// Rooms without explicit map coordinates inherit "positioned" status from
/// any positioned neighbor (fixed-point iteration); leftovers are orphans
/// and get removed with a summary error.
///
/// `explicit` holds the rooms the map file actually placed, so a room
/// legitimately at the origin still counts as positioned.
fn resolve_positions(
    region: &mut Region,
    explicit: &HashSet<String>,
    errors: &mut LoadErrorLog,
) {
    let mut positioned: Vec<bool> = region
        .rooms
        .iter()
        .map(|r| explicit.contains(&r.name.to_ascii_uppercase()))
        .collect();

    let mut changed = true;
    while changed {
        changed = false;
        for i in 0..region.rooms.len() {
            if positioned[i] {
                continue;
            }
            let neighbor = region.rooms[i]
                .connections
                .iter()
                .flatten()
                .filter_map(|c| region.room_index(&c.target))
                .find(|&j| positioned[j]);
            if let Some(j) = neighbor {
                region.rooms[i].world_pos = region.rooms[j].world_pos + ADOPTED_POS_OFFSET;
                positioned[i] = true;
                changed = true;
            }
        }
    }

    let orphans: Vec<String> = region
        .rooms
        .iter()
        .zip(&positioned)
        .filter(|(_, &p)| !p)
        .map(|(r, _)| r.name.clone())
        .collect();
    if !orphans.is_empty() {
        errors.push(
            LoadErrorKind::UnpositionedRoom,
            format!("{} room(s) removed as orphans: {}", orphans.len(), orphans.join(", ")),
        );
        region.rooms.retain(|r| !orphans.contains(&r.name));
        region.rebuild_index();
        // Drop connections into removed rooms.
        let index = region.index.clone();
        for room in &mut region.rooms {
            for slot in &mut room.connections {
                if let Some(c) = slot {
                    if !index.contains_key(&c.target.to_ascii_uppercase()) {
                        *slot = None;
                    }
                }
            }
        }
    }
}

/// Parse gate lock lines and resolve gate target regions from the
/// `GATE_<Left>_<Right>` naming scheme.
fn parse_gates(region: &mut Region, lock_text: &str, errors: &mut LoadErrorLog) {
    let mut locks: HashMap<String, (String, String, bool)> = HashMap::new();
    for line in lock_text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(':').map(str::trim).collect();
        if fields.len() < 3 {
            errors.push(
                LoadErrorKind::BadGateLock,
                format!("unparsable lock line {line:?}"),
            );
            continue;
        }
        let swapped = fields
            .iter()
            .any(|f| f.eq_ignore_ascii_case("SWAPMAPSYMBOL"));
        locks.insert(
            fields[0].to_ascii_uppercase(),
            (fields[1].to_string(), fields[2].to_string(), swapped),
        );
    }

    let gate_rooms: Vec<String> = region
        .rooms
        .iter()
        .filter(|r| r.is_gate)
        .map(|r| r.name.clone())
        .collect();

    for name in gate_rooms {
        let upper = name.to_ascii_uppercase();
        let (mut left_karma, mut right_karma, swapped) = locks
            .get(&upper)
            .cloned()
            .unwrap_or_else(|| ("1".to_string(), "1".to_string(), false));
        if swapped {
            std::mem::swap(&mut left_karma, &mut right_karma);
        }

        let target_region = gate_target_region(&upper, &region.id);
        if target_region.is_none() {
            errors.push(
                LoadErrorKind::BadGateLock,
                format!("{name}: cannot resolve target region from gate name"),
            );
        }
        region.gates.push(GateInfo {
            room: name,
            left_karma,
            right_karma,
            swapped,
            target_region,
        });
    }
}

/// Resolve the far side of `GATE_<Left>_<Right>` against `region_id`.
///
/// When only one side matches the current region the other side is the
/// target; when both or neither match, the name is ambiguous.
fn gate_target_region(gate_name: &str, region_id: &str) -> Option<String> {
    let rest = gate_name.strip_prefix("GATE_")?;
    let (left, right) = rest.split_once('_')?;
    let left_is_here = left.eq_ignore_ascii_case(region_id);
    let right_is_here = right.eq_ignore_ascii_case(region_id);
    match (left_is_here, right_is_here) {
        (true, false) => Some(right.to_string()),
        (false, true) => Some(left.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal level text: one exit corridor on the top row per `exits`.
    fn level_with_exits(exits: usize) -> String {
        let width = (exits * 6).max(6);
        let height = 4;
        let mut cells = vec!["0".to_string(); width * height];
        for e in 0..exits {
            // column-major index of (x, y) is x * height + y
            let base_x = e * 6;
            cells[base_x * height] = "4".to_string(); // entrance
            cells[(base_x + 1) * height] = "1,3".to_string();
            cells[(base_x + 2) * height] = "1,4".to_string(); // room exit
        }
        let mut lines = vec!["room".to_string(), format!("{width}*{height}|-1|0")];
        while lines.len() < 11 {
            lines.push(String::new());
        }
        lines.push(cells.join("|"));
        lines.join("\n")
    }

    fn source_with_rooms(rooms: &[(&str, usize)]) -> MemoryDataSource {
        let mut data = MemoryDataSource::default();
        for (name, exits) in rooms {
            data.levels.insert(name.to_string(), level_with_exits(*exits));
        }
        data
    }

    fn build(
        world: &str,
        map: &str,
        locks: &str,
        data: &MemoryDataSource,
        slugcat: Option<&str>,
    ) -> (Region, LoadErrorLog) {
        build_full(world, map, "", locks, data, slugcat)
    }

    fn build_full(
        world: &str,
        map: &str,
        properties: &str,
        locks: &str,
        data: &MemoryDataSource,
        slugcat: Option<&str>,
    ) -> (Region, LoadErrorLog) {
        let mut errors = LoadErrorLog::new();
        let region = build_region(
            &RegionSource {
                id: "SU",
                world_text: world,
                map_text: map,
                properties_text: properties,
                gate_lock_text: locks,
                data,
            },
            slugcat,
            &mut errors,
        );
        (region, errors)
    }

    const TWO_ROOM_WORLD: &str = "ROOMS\nSU_A01 : SU_B02\nSU_B02 : SU_A01\nEND ROOMS\n";
    const TWO_ROOM_MAP: &str = "SU_A01: 10,20,0,0,0,Outskirts\nSU_B02: 40,20,0,0,1,\n";

    #[test]
    fn test_reciprocal_connections_resolved() {
        let data = source_with_rooms(&[("SU_A01", 1), ("SU_B02", 1)]);
        let (region, errors) = build(TWO_ROOM_WORLD, TWO_ROOM_MAP, "", &data, None);
        assert!(errors.is_empty(), "{:?}", errors.entries());
        let a = region.room("SU_A01").unwrap();
        let conn = a.connections[0].as_ref().unwrap();
        assert_eq!(conn.target, "SU_B02");
        assert_eq!(conn.target_exit, 0);
        let b = region.room("su_b02").unwrap();
        assert_eq!(b.connections[0].as_ref().unwrap().target, "SU_A01");
    }

    #[test]
    fn test_asymmetric_adjacency_dropped_with_error() {
        // B02 never names A01 back; no connection is created either way.
        let world = "ROOMS\nSU_A01 : SU_B02\nSU_B02 : DISCONNECTED\nEND ROOMS\n";
        let data = source_with_rooms(&[("SU_A01", 1), ("SU_B02", 1)]);
        let (region, errors) = build(world, TWO_ROOM_MAP, "", &data, None);
        let a = region.room("SU_A01").unwrap();
        assert!(a.connections.iter().all(Option::is_none));
        assert_eq!(errors.count_of(LoadErrorKind::DanglingConnection), 1);
    }

    #[test]
    fn test_unknown_target_room_recorded() {
        let world = "ROOMS\nSU_A01 : SU_NOPE\nEND ROOMS\n";
        let data = source_with_rooms(&[("SU_A01", 1)]);
        let (_, errors) = build(world, "SU_A01: 5,5\n", "", &data, None);
        assert_eq!(errors.count_of(LoadErrorKind::UnknownRoom), 1);
    }

    #[test]
    fn test_missing_room_file_excludes_room() {
        let data = source_with_rooms(&[("SU_A01", 1)]);
        let (region, errors) = build(TWO_ROOM_WORLD, TWO_ROOM_MAP, "", &data, None);
        assert!(region.room("SU_B02").is_none());
        assert_eq!(errors.count_of(LoadErrorKind::MissingRoomFile), 1);
        // The surviving side records a dangling connection instead of
        // pointing into a missing room.
        assert!(region.room("SU_A01").is_some());
    }

    #[test]
    fn test_conditional_replace_named_target() {
        let world = "ROOMS\nSU_A01 : SU_B02\nSU_B02 : SU_A01\nSU_C03 : SU_A01\nEND ROOMS\n\
                     CONDITIONAL LINKS\nWhite : SU_A01 : SU_B02 : SU_C03\nEND CONDITIONAL LINKS\n";
        let map = "SU_A01: 10,20\nSU_B02: 40,20\nSU_C03: 70,20\n";
        let data = source_with_rooms(&[("SU_A01", 1), ("SU_B02", 1), ("SU_C03", 1)]);
        let (region, _) = build(world, map, "", &data, Some("White"));
        let a = region.room("SU_A01").unwrap();
        assert_eq!(a.connections[0].as_ref().unwrap().target, "SU_C03");
    }

    #[test]
    fn test_conditional_replace_ignored_for_other_slugcat() {
        let world = "ROOMS\nSU_A01 : SU_B02\nSU_B02 : SU_A01\nSU_C03 : SU_A01\nEND ROOMS\n\
                     CONDITIONAL LINKS\nWhite : SU_A01 : SU_B02 : SU_C03\nEND CONDITIONAL LINKS\n";
        let map = "SU_A01: 10,20\nSU_B02: 40,20\nSU_C03: 70,20\n";
        let data = source_with_rooms(&[("SU_A01", 1), ("SU_B02", 1), ("SU_C03", 1)]);
        let (region, _) = build(world, map, "", &data, Some("Red"));
        let a = region.room("SU_A01").unwrap();
        assert_eq!(a.connections[0].as_ref().unwrap().target, "SU_B02");
    }

    #[test]
    fn test_disconnected_slots_consumed_in_order() {
        let world = "ROOMS\n\
                     SU_A01 : DISCONNECTED, DISCONNECTED\n\
                     SU_B02 : SU_A01\nSU_C03 : SU_A01\nEND ROOMS\n\
                     CONDITIONAL LINKS\n\
                     White : SU_A01 : DISCONNECTED : SU_B02\n\
                     White : SU_A01 : DISCONNECTED : SU_C03\n\
                     END CONDITIONAL LINKS\n";
        let map = "SU_A01: 10,20\nSU_B02: 40,20\nSU_C03: 70,20\n";
        let data = source_with_rooms(&[("SU_A01", 2), ("SU_B02", 1), ("SU_C03", 1)]);
        let (region, _) = build(world, map, "", &data, Some("White"));
        let a = region.room("SU_A01").unwrap();
        assert_eq!(a.connections[0].as_ref().unwrap().target, "SU_B02");
        assert_eq!(a.connections[1].as_ref().unwrap().target, "SU_C03");
    }

    #[test]
    fn test_exclusive_room_removed_for_wrong_slugcat() {
        let world = "ROOMS\nSU_A01 : DISCONNECTED\nSU_B02 : DISCONNECTED\nEND ROOMS\n\
                     CONDITIONAL LINKS\nYellow : EXCLUSIVEROOM : SU_B02\nEND CONDITIONAL LINKS\n";
        let map = "SU_A01: 10,20\nSU_B02: 40,20\n";
        let data = source_with_rooms(&[("SU_A01", 1), ("SU_B02", 1)]);

        let (region, _) = build(world, map, "", &data, Some("White"));
        assert!(region.room("SU_B02").is_none());

        let (region, _) = build(world, map, "", &data, Some("Yellow"));
        assert!(region.room("SU_B02").is_some());

        // No slugcat selected: everything stays.
        let (region, _) = build(world, map, "", &data, None);
        assert!(region.room("SU_B02").is_some());
    }

    #[test]
    fn test_hide_room_removed_for_named_slugcat() {
        let world = "ROOMS\nSU_A01 : DISCONNECTED\nSU_B02 : DISCONNECTED\nEND ROOMS\n\
                     CONDITIONAL LINKS\nRed : HIDEROOM : SU_B02\nEND CONDITIONAL LINKS\n";
        let map = "SU_A01: 10,20\nSU_B02: 40,20\n";
        let data = source_with_rooms(&[("SU_A01", 1), ("SU_B02", 1)]);
        let (region, _) = build(world, map, "", &data, Some("Red"));
        assert!(region.room("SU_B02").is_none());
        let (region, _) = build(world, map, "", &data, Some("White"));
        assert!(region.room("SU_B02").is_some());
    }

    #[test]
    fn test_transitive_positioning_and_orphan_removal() {
        let world = "ROOMS\nSU_A01 : SU_B02\nSU_B02 : SU_A01\nSU_X09 : DISCONNECTED\nEND ROOMS\n";
        // Only A01 has a map position; B02 adopts it, X09 is an orphan.
        let map = "SU_A01: 10,20\n";
        let data = source_with_rooms(&[("SU_A01", 1), ("SU_B02", 1), ("SU_X09", 1)]);
        let (region, errors) = build(world, map, "", &data, None);
        let b = region.room("SU_B02").unwrap();
        assert_eq!(b.world_pos, Vec2::new(18.0, 28.0));
        assert!(region.room("SU_X09").is_none());
        assert_eq!(errors.count_of(LoadErrorKind::UnpositionedRoom), 1);
    }

    #[test]
    fn test_subregion_created_and_colored() {
        let data = source_with_rooms(&[("SU_A01", 1), ("SU_B02", 1)]);
        let (region, _) = build(TWO_ROOM_WORLD, TWO_ROOM_MAP, "", &data, None);
        assert_eq!(region.subregions.len(), 1);
        assert_eq!(region.subregions[0].name, "Outskirts");
        assert_eq!(region.room("SU_A01").unwrap().subregion, Some(0));
        assert_eq!(region.room("SU_B02").unwrap().subregion, None);
        assert!(region.colors.get("Outskirts").is_some());
    }

    #[test]
    fn test_gate_target_and_lock_parsing() {
        let world = "ROOMS\nGATE_SU_HI : DISCONNECTED : GATE\nEND ROOMS\n";
        let map = "GATE_SU_HI: 10,10\n";
        let locks = "GATE_SU_HI:3:2\n";
        let data = source_with_rooms(&[("GATE_SU_HI", 1)]);
        let (region, errors) = build(world, map, locks, &data, None);
        assert!(errors.is_empty(), "{:?}", errors.entries());
        let gate = &region.gates[0];
        assert_eq!(gate.target_region.as_deref(), Some("HI"));
        assert_eq!(gate.left_karma, "3");
        assert_eq!(gate.right_karma, "2");
        assert!(!gate.swapped);
    }

    #[test]
    fn test_gate_swap_marker_swaps_karma() {
        let world = "ROOMS\nGATE_HI_SU : DISCONNECTED : GATE\nEND ROOMS\n";
        let map = "GATE_HI_SU: 10,10\n";
        let locks = "GATE_HI_SU:5:1:SWAPMAPSYMBOL\n";
        let data = source_with_rooms(&[("GATE_HI_SU", 1)]);
        let (region, _) = build(world, map, locks, &data, None);
        let gate = &region.gates[0];
        assert_eq!(gate.target_region.as_deref(), Some("HI"));
        assert!(gate.swapped);
        assert_eq!(gate.left_karma, "1");
        assert_eq!(gate.right_karma, "5");
    }

    #[test]
    fn test_room_explicitly_at_origin_survives() {
        // An explicit 0,0 map position is a real position, not a missing
        // one; the room must not be treated as an orphan.
        let world = "ROOMS\nSU_A01 : DISCONNECTED\nEND ROOMS\n";
        let data = source_with_rooms(&[("SU_A01", 1)]);
        let (region, errors) = build(world, "SU_A01: 0,0\n", "", &data, None);
        assert!(region.room("SU_A01").is_some());
        assert_eq!(errors.count_of(LoadErrorKind::UnpositionedRoom), 0);
        assert_eq!(region.room("SU_A01").unwrap().world_pos, Vec2::ZERO);
    }

    #[test]
    fn test_unmapped_room_still_removed_as_orphan() {
        let world = "ROOMS\nSU_A01 : DISCONNECTED\nEND ROOMS\n";
        let data = source_with_rooms(&[("SU_A01", 1)]);
        let (region, errors) = build(world, "", "", &data, None);
        assert!(region.room("SU_A01").is_none());
        assert_eq!(errors.count_of(LoadErrorKind::UnpositionedRoom), 1);
    }

    #[test]
    fn test_properties_declare_subregions_with_colors() {
        let properties = "Subregion: Chasm: #10FF20\nSubregion: Spires\n";
        let map = "SU_A01: 10,20,0,0,0,Spires\nSU_B02: 40,20\n";
        let data = source_with_rooms(&[("SU_A01", 1), ("SU_B02", 1)]);
        let (region, errors) =
            build_full(TWO_ROOM_WORLD, map, properties, "", &data, None);
        assert!(errors.is_empty(), "{:?}", errors.entries());
        // Declaration order holds even for the unreferenced subregion.
        assert_eq!(region.subregions[0].name, "Chasm");
        assert_eq!(region.subregions[1].name, "Spires");
        assert_eq!(region.colors.get("Chasm"), Some([0x10, 0xFF, 0x20, 255]));
        assert_eq!(region.room("SU_A01").unwrap().subregion, Some(1));
    }

    #[test]
    fn test_properties_bad_color_logged() {
        let properties = "Subregion: Chasm: notacolor\n";
        let data = source_with_rooms(&[("SU_A01", 1), ("SU_B02", 1)]);
        let (region, errors) =
            build_full(TWO_ROOM_WORLD, TWO_ROOM_MAP, properties, "", &data, None);
        assert_eq!(errors.count_of(LoadErrorKind::BadSettings), 1);
        // The subregion still exists with its palette color.
        assert!(region.subregions.iter().any(|s| s.name == "Chasm"));
    }

    #[test]
    fn test_room_effects_loaded_from_settings() {
        let mut data = source_with_rooms(&[("SU_A01", 1), ("SU_B02", 1)]);
        data.settings.insert(
            "SU_A01".to_string(),
            "Effects: Fog-0.5-A-B\nPlacedObjects: KarmaFlower><12><8><x\n".to_string(),
        );
        let (region, _) = build(TWO_ROOM_WORLD, TWO_ROOM_MAP, "", &data, None);
        let room = region.room("SU_A01").unwrap();
        assert_eq!(room.effects.len(), 1);
        assert_eq!(room.effects[0].name, "Fog");
        assert!((room.effects[0].amount - 0.5).abs() < 1e-6);
        assert_eq!(room.placed_objects.len(), 1);
        assert!(region.room("SU_B02").unwrap().effects.is_empty());
    }

    #[test]
    fn test_gate_with_ambiguous_name_errors() {
        let world = "ROOMS\nGATE_HI_LF : DISCONNECTED : GATE\nEND ROOMS\n";
        let map = "GATE_HI_LF: 10,10\n";
        let data = source_with_rooms(&[("GATE_HI_LF", 1)]);
        let (region, errors) = build(world, map, "GATE_HI_LF:1:1\n", &data, None);
        assert_eq!(region.gates[0].target_region, None);
        assert_eq!(errors.count_of(LoadErrorKind::BadGateLock), 1);
    }
}
