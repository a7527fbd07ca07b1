//! The editor session: one loaded region plus everything the user piled on
//! top of it. All editor state lives here; the window loop and the headless
//! export both drive a session and nothing else.

use std::collections::BTreeMap;
use std::path::Path;

use crate::assets;
use crate::connections::RegionConnections;
use crate::errors::{LoadErrorKind, LoadErrorLog};
use crate::geometry::{Rect, Vec2};
use crate::objects::{Capabilities, MapObject, MapObjectKind};
use crate::region::{build_region, DirDataSource, Region, RegionSource};
use crate::render::{measure_text, Camera, Color, Renderer};
use crate::state::{AppState, RegionState, RoomState};

const ROOM_FILL: Color = [40, 40, 48, 255];
const ROOM_SOLID: Color = [12, 12, 14, 255];
const ROOM_WATER: Color = [36, 70, 130, 200];
const ROOM_OUTLINE: Color = [90, 90, 100, 255];
const ROOM_SELECTED_OUTLINE: Color = [255, 200, 80, 255];
const INACTIVE_LAYER_DIM: Color = [0, 0, 0, 140];
const LABEL_COLOR: Color = [235, 235, 235, 255];

/// What the user currently has selected.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Selection {
    #[default]
    None,
    Room(String),
    Object(usize),
    Waypoint {
        connection: usize,
        point: usize,
    },
}

/// One loaded region and the user's edits.
#[derive(Default)]
pub struct EditorSession {
    pub region: Option<Region>,
    /// Embedded sources for saving, kept from the load.
    pub region_state: Option<RegionState>,
    pub connections: RegionConnections,
    pub objects: Vec<MapObject>,
    pub selection: Selection,
    pub errors: LoadErrorLog,
    pub camera: Camera,
    pub slugcat: Option<String>,
    pub active_layer: i32,
    pub snap_to_grid: bool,
    pub dirty: bool,
}

impl EditorSession {
    pub fn new() -> EditorSession {
        EditorSession::default()
    }

    /// Load a region from a game-format directory: `world_<id>.txt`,
    /// `map_<id>.txt`, optional `properties.txt` and `locks.txt`, room
    /// files alongside.
    pub fn load_region_dir(
        &mut self,
        dir: &Path,
        id: &str,
        slugcat: Option<&str>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let lower = id.to_ascii_lowercase();
        let world_text = std::fs::read_to_string(dir.join(format!("world_{lower}.txt")))?;
        // A slugcat-specific map file wins over the shared one.
        let map_text = slugcat
            .and_then(|s| {
                std::fs::read_to_string(
                    dir.join(format!("map_{lower}-{}.txt", s.to_ascii_lowercase())),
                )
                .ok()
            })
            .or_else(|| std::fs::read_to_string(dir.join(format!("map_{lower}.txt"))).ok())
            .unwrap_or_default();
        let properties_text =
            std::fs::read_to_string(dir.join("properties.txt")).unwrap_or_default();
        let gate_lock_text = std::fs::read_to_string(dir.join("locks.txt")).unwrap_or_default();

        self.errors.clear();
        let data = DirDataSource {
            root: dir.to_path_buf(),
        };
        let region = build_region(
            &RegionSource {
                id,
                world_text: &world_text,
                map_text: &map_text,
                properties_text: &properties_text,
                gate_lock_text: &gate_lock_text,
                data: &data,
            },
            slugcat,
            &mut self.errors,
        );

        // Embed the sources so the session file stands alone.
        let mut rooms = BTreeMap::new();
        for room in &region.rooms {
            if let Some(level_text) = data_text(dir, &room.name) {
                rooms.insert(
                    room.name.clone(),
                    RoomState {
                        level_text,
                        settings_text: settings_text(dir, &room.name),
                    },
                );
            }
        }
        self.region_state = Some(RegionState {
            id: region.id.clone(),
            world_text,
            map_text,
            properties_text,
            gate_lock_text,
            rooms,
            room_positions: BTreeMap::new(),
            subregion_colors: BTreeMap::new(),
        });

        self.slugcat = slugcat.map(str::to_string);
        self.install_region(region);
        Ok(())
    }

    /// Restore a saved session.
    pub fn load_state(&mut self, state: AppState) {
        self.errors.clear();
        self.slugcat = state.slugcat.clone();
        self.camera.position = Vec2::new(state.camera.x, state.camera.y);
        self.camera.scale = state.camera.scale;

        if let Some(region_state) = state.region {
            let region = region_state.restore(self.slugcat.as_deref(), &mut self.errors);
            self.region_state = Some(region_state);
            self.install_region(region);
        }
        // Saved objects include the seeded defaults; they replace whatever
        // install_region spawned.
        self.objects = state.objects.into_values().collect();
        for (key, data) in &state.connections {
            self.connections.apply_data(key, data);
        }
        self.dirty = false;
    }

    pub fn to_state(&self) -> AppState {
        crate::state::capture_state(
            self.slugcat.as_deref(),
            self.region_state.clone(),
            self.region.as_ref(),
            &self.connections,
            &self.objects,
            self.camera.position.x,
            self.camera.position.y,
            self.camera.scale,
        )
    }

    fn install_region(&mut self, region: Region) {
        self.connections = RegionConnections::build(&region);
        self.spawn_default_objects(&region);
        self.region = Some(region);
        self.selection = Selection::None;
        self.dirty = true;
    }

    /// Seed the standard per-room markers: shelters, gates, swarm rooms,
    /// scavenger traders, and a subregion label per subregion.
    fn spawn_default_objects(&mut self, region: &Region) {
        self.objects.clear();
        for room in &region.rooms {
            let icon = if room.is_shelter {
                Some(("shelter", MapObjectKind::ShelterIcon))
            } else if room.is_gate {
                Some(("gate", MapObjectKind::GateIcon))
            } else if room.is_swarm_room {
                Some(("swarm_room", MapObjectKind::RoomIcon))
            } else if room.is_scavenger_trader {
                Some(("scavenger_trader", MapObjectKind::RoomIcon))
            } else {
                None
            };
            let Some((icon_name, kind)) = icon else { continue };
            let mut obj = MapObject::new(&room.name, kind, room.size() * 0.5);
            obj.anchor_room = Some(room.name.clone());
            obj.icon = Some(icon_name.to_string());
            self.objects.push(obj);
        }
        for (i, sub) in region.subregions.iter().enumerate() {
            let center = subregion_center(region, i);
            let mut obj = MapObject::new(&sub.name, MapObjectKind::SubregionLabel, center);
            obj.text = Some(sub.name.clone());
            self.objects.push(obj);
        }
    }

    /// World-space rect of a room.
    pub fn room_rect(room: &crate::room::Room) -> Rect {
        Rect::new(
            room.world_pos.x,
            room.world_pos.y,
            room.width as f32,
            room.height as f32,
        )
    }

    /// Topmost room under a world point, on the active layer first.
    pub fn room_at(&self, point: Vec2) -> Option<&crate::room::Room> {
        let region = self.region.as_ref()?;
        region
            .rooms
            .iter()
            .filter(|r| Self::room_rect(r).contains(point))
            .max_by_key(|r| (r.layer == self.active_layer, std::cmp::Reverse(r.layer)))
    }

    /// World position of an object, resolving room anchors.
    pub fn object_world_pos(&self, obj: &MapObject) -> Vec2 {
        let offset: Vec2 = obj.position.into();
        match (&obj.anchor_room, &self.region) {
            (Some(room), Some(region)) => match region.room(room) {
                Some(room) => room.world_pos + offset,
                None => offset,
            },
            _ => offset,
        }
    }

    /// Selectable object under a world point, within `radius` world units.
    pub fn object_at(&self, point: Vec2, radius: f32) -> Option<usize> {
        self.objects
            .iter()
            .enumerate()
            .filter(|(_, o)| o.capabilities().contains(Capabilities::SELECTABLE))
            .find(|(_, o)| self.object_world_pos(o).distance(point) <= radius)
            .map(|(i, _)| i)
    }

    /// Move a room, keeping connection endpoints in sync. Snapping rounds
    /// to whole tiles.
    pub fn move_room(&mut self, name: &str, mut pos: Vec2) {
        if self.snap_to_grid {
            pos = Vec2::new(pos.x.round(), pos.y.round());
        }
        let Some(region) = self.region.as_mut() else { return };
        if let Some(room) = region.room_mut(name) {
            room.world_pos = pos;
        }
        self.connections.update_endpoints(region);
        self.dirty = true;
    }

    pub fn move_object(&mut self, index: usize, world: Vec2) {
        let Some(obj) = self.objects.get(index) else { return };
        let anchored = obj.anchor_room.clone();
        let pos = match (anchored, &self.region) {
            (Some(room), Some(region)) => match region.room(&room) {
                Some(room) => world - room.world_pos,
                None => world,
            },
            _ => world,
        };
        self.objects[index].position = pos.into();
        self.dirty = true;
    }

    /// Change a subregion's background color, recording the override for the
    /// save file.
    pub fn set_subregion_color(&mut self, name: &str, color: Color) {
        if let Some(region) = self.region.as_mut() {
            region.colors.set(name, color);
            if let Some(sub) = region.subregions.iter_mut().find(|s| s.name == name) {
                sub.background_color.color = color;
            }
        }
        if let Some(state) = self.region_state.as_mut() {
            state.subregion_colors.insert(name.to_string(), color);
        }
        self.dirty = true;
    }

    /// Draw the whole map: rooms back to front by layer, connection shadow
    /// and line passes, then icons and labels.
    pub fn draw_map(&self, renderer: &mut dyn Renderer, camera: &Camera) {
        let Some(region) = &self.region else { return };

        let mut order: Vec<usize> = (0..region.rooms.len()).collect();
        order.sort_by_key(|&i| std::cmp::Reverse(region.rooms[i].layer));

        for &i in &order {
            let room = &region.rooms[i];
            self.draw_room(renderer, camera, region, room);
        }

        self.connections.draw(renderer, camera, true);
        self.connections.draw(renderer, camera, false);

        for (i, obj) in self.objects.iter().enumerate() {
            let screen = camera.world_to_screen(self.object_world_pos(obj));
            if obj.capabilities().contains(Capabilities::ICON) {
                let asset = assets::icon(obj.icon.as_deref().unwrap_or("placeholder"));
                assets::draw_icon(renderer, screen, asset, camera.scale / 4.0);
            }
            if let Some(text) = &obj.text {
                let size = measure_text(text, 1.0);
                renderer.draw_text(screen - size * 0.5, text, LABEL_COLOR, 1.0);
            }
            if self.selection == Selection::Object(i) {
                renderer.draw_rect_outline(
                    Rect::new(screen.x - 8.0, screen.y - 8.0, 16.0, 16.0),
                    ROOM_SELECTED_OUTLINE,
                );
            }
        }
    }

    fn draw_room(
        &self,
        renderer: &mut dyn Renderer,
        camera: &Camera,
        region: &Region,
        room: &crate::room::Room,
    ) {
        let rect = Self::room_rect(room);
        let top_left = camera.world_to_screen(Vec2::new(rect.x, rect.y));
        let screen_rect = Rect::new(
            top_left.x,
            top_left.y,
            rect.width * camera.scale,
            rect.height * camera.scale,
        );
        if !screen_rect.intersects(&renderer.screen_rect()) {
            return;
        }

        let fill = room
            .subregion
            .and_then(|i| region.subregions.get(i))
            .map(|s| s.background_color.color)
            .unwrap_or(ROOM_FILL);
        renderer.fill_rect(screen_rect, fill);

        // Water band from the water level down.
        if room.water_level >= 0 {
            let surface = (room.height as i32 - room.water_level).max(0) as f32;
            let water_top = camera.world_to_screen(room.world_pos + Vec2::new(0.0, surface));
            renderer.fill_rect(
                Rect::new(
                    screen_rect.x,
                    water_top.y,
                    screen_rect.width,
                    screen_rect.bottom() - water_top.y,
                ),
                ROOM_WATER,
            );
        }

        // Solid terrain at tile resolution; skipped when zoomed far out.
        if camera.scale >= 1.0 {
            for y in 0..room.height as i32 {
                for x in 0..room.width as i32 {
                    let pos = crate::geometry::TilePos::new(x, y);
                    let Some(tile) = room.tile(pos) else { continue };
                    if tile.terrain != crate::tile::TerrainType::Solid {
                        continue;
                    }
                    let p = camera.world_to_screen(room.world_pos + Vec2::new(x as f32, y as f32));
                    renderer.fill_rect(
                        Rect::new(p.x, p.y, camera.scale, camera.scale),
                        ROOM_SOLID,
                    );
                }
            }
        }

        let outline = if self.selection == Selection::Room(room.name.clone()) {
            ROOM_SELECTED_OUTLINE
        } else {
            ROOM_OUTLINE
        };
        renderer.draw_rect_outline(screen_rect, outline);

        if room.layer != self.active_layer {
            renderer.fill_rect(screen_rect, INACTIVE_LAYER_DIM);
        }
    }

    /// Combined world-space bounds of all rooms, padded; `None` when no
    /// region is loaded or it has no rooms.
    pub fn map_bounds(&self, padding: f32) -> Option<Rect> {
        let region = self.region.as_ref()?;
        let mut rooms = region.rooms.iter();
        let first = Self::room_rect(rooms.next()?);
        let mut min = Vec2::new(first.x, first.y);
        let mut max = Vec2::new(first.right(), first.bottom());
        for room in rooms {
            let r = Self::room_rect(room);
            min.x = min.x.min(r.x);
            min.y = min.y.min(r.y);
            max.x = max.x.max(r.right());
            max.y = max.y.max(r.bottom());
        }
        Some(Rect::new(
            min.x - padding,
            min.y - padding,
            max.x - min.x + padding * 2.0,
            max.y - min.y + padding * 2.0,
        ))
    }

    /// Status-line summary of load problems.
    pub fn error_summary(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        let dangling = self.errors.count_of(LoadErrorKind::DanglingConnection);
        Some(format!(
            "{} load issue(s), {} dangling connection(s)",
            self.errors.len(),
            dangling
        ))
    }
}

fn data_text(dir: &Path, room: &str) -> Option<String> {
    let direct = dir.join(format!("{room}.txt"));
    std::fs::read_to_string(&direct)
        .ok()
        .or_else(|| std::fs::read_to_string(dir.join(format!("{}.txt", room.to_ascii_lowercase()))).ok())
}

fn settings_text(dir: &Path, room: &str) -> Option<String> {
    std::fs::read_to_string(dir.join(format!("{room}_settings.txt")))
        .ok()
        .or_else(|| {
            std::fs::read_to_string(
                dir.join(format!("{}_settings.txt", room.to_ascii_lowercase())),
            )
            .ok()
        })
}

/// Average of room centers in a subregion, as a label anchor.
fn subregion_center(region: &Region, subregion: usize) -> Vec2 {
    let mut sum = Vec2::ZERO;
    let mut count = 0;
    for room in &region.rooms {
        if room.subregion == Some(subregion) {
            sum = sum + room.world_pos + room.size() * 0.5;
            count += 1;
        }
    }
    if count == 0 {
        Vec2::ZERO
    } else {
        sum * (1.0 / count as f32)
    }
}
