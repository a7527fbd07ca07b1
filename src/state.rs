//! Session persistence: everything needed to reopen a map exactly where it
//! was left, in one JSON file.
//!
//! The state file embeds the raw region texts and per-room level data, so a
//! saved session reloads without the original game install present. Saves go
//! through a temp file and rename; the previous file is copied to a
//! timestamped backup first.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::connections::{ConnectionData, RegionConnections};
use crate::errors::LoadErrorLog;
use crate::geometry::Vec2;
use crate::objects::MapObject;
use crate::region::{build_region, MemoryDataSource, Region, RegionSource};

pub const STATE_VERSION: u32 = 2;

/// The whole saved session.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppState {
    #[serde(default)]
    pub version: u32,
    pub slugcat: Option<String>,
    pub region: Option<RegionState>,
    /// Map objects keyed by `name:kind_tag`.
    #[serde(default)]
    pub objects: BTreeMap<String, MapObject>,
    /// Waypoints keyed by `source~destination`.
    #[serde(default)]
    pub connections: BTreeMap<String, ConnectionData>,
    #[serde(default)]
    pub camera: CameraState,
}

/// Saved camera view.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct CameraState {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
}

impl Default for CameraState {
    fn default() -> Self {
        CameraState {
            x: 0.0,
            y: 0.0,
            scale: 4.0,
        }
    }
}

/// Embedded copy of the region sources plus the user's edits on top.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RegionState {
    pub id: String,
    pub world_text: String,
    pub map_text: String,
    #[serde(default)]
    pub properties_text: String,
    #[serde(default)]
    pub gate_lock_text: String,
    /// Per-room embedded data, keyed by room name.
    pub rooms: BTreeMap<String, RoomState>,
    /// Room positions moved by the user, overriding the map text.
    #[serde(default)]
    pub room_positions: BTreeMap<String, [f32; 2]>,
    /// Subregion background colors changed by the user.
    #[serde(default)]
    pub subregion_colors: BTreeMap<String, [u8; 4]>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoomState {
    pub level_text: String,
    pub settings_text: Option<String>,
}

impl RegionState {
    /// Rebuild the region from the embedded sources and re-apply the user's
    /// position and color edits.
    pub fn restore(&self, slugcat: Option<&str>, errors: &mut LoadErrorLog) -> Region {
        let mut data = MemoryDataSource::default();
        for (name, room) in &self.rooms {
            data.levels.insert(name.clone(), room.level_text.clone());
            if let Some(settings) = &room.settings_text {
                data.settings.insert(name.clone(), settings.clone());
            }
        }
        let mut region = build_region(
            &RegionSource {
                id: &self.id,
                world_text: &self.world_text,
                map_text: &self.map_text,
                properties_text: &self.properties_text,
                gate_lock_text: &self.gate_lock_text,
                data: &data,
            },
            slugcat,
            errors,
        );
        for (name, pos) in &self.room_positions {
            if let Some(room) = region.room_mut(name) {
                room.world_pos = Vec2::new(pos[0], pos[1]);
            }
        }
        for (name, color) in &self.subregion_colors {
            region.colors.set(name, *color);
            if let Some(sub) = region.subregions.iter_mut().find(|s| &s.name == name) {
                sub.background_color.color = *color;
            }
        }
        region
    }
}

/// Why a state file failed to load; `Corrupt` is surfaced to the user with a
/// keep-or-start-over choice instead of silently discarding their work.
#[derive(Debug)]
pub enum StateLoadError {
    Missing,
    Io(std::io::Error),
    Corrupt(String),
}

impl std::fmt::Display for StateLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateLoadError::Missing => write!(f, "state file not found"),
            StateLoadError::Io(e) => write!(f, "state file unreadable: {e}"),
            StateLoadError::Corrupt(e) => write!(f, "state file corrupt: {e}"),
        }
    }
}

impl std::error::Error for StateLoadError {}

pub fn load_state(path: &Path) -> Result<AppState, StateLoadError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StateLoadError::Missing)
        }
        Err(e) => return Err(StateLoadError::Io(e)),
    };
    serde_json::from_str(&text).map_err(|e| StateLoadError::Corrupt(e.to_string()))
}

/// Write the state atomically: serialize to `<path>.tmp`, then rename over
/// the destination. An existing file is copied to a timestamped backup
/// first.
pub fn save_state(path: &Path, state: &AppState) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        let backup = backup_path(path);
        fs::copy(path, &backup)?;
        println!("Backed up previous state to {}", backup.display());
    }
    let json = serde_json::to_string_pretty(state)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn backup_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "state".to_string());
    let stamp = Local::now().format("%Y%m%d-%H%M%S");
    path.with_file_name(format!("{stem}-{stamp}.json"))
}

/// Capture the live session into a serializable state.
pub fn capture_state(
    slugcat: Option<&str>,
    region_state: Option<RegionState>,
    region: Option<&Region>,
    connections: &RegionConnections,
    objects: &[MapObject],
    camera_x: f32,
    camera_y: f32,
    camera_scale: f32,
) -> AppState {
    let mut region_state = region_state;
    if let (Some(state), Some(region)) = (region_state.as_mut(), region) {
        state.room_positions = region
            .rooms
            .iter()
            .map(|r| (r.name.clone(), [r.world_pos.x, r.world_pos.y]))
            .collect();
    }
    AppState {
        version: STATE_VERSION,
        slugcat: slugcat.map(str::to_string),
        region: region_state,
        objects: objects.iter().map(|o| (o.key(), o.clone())).collect(),
        connections: connections.to_data().into_iter().collect(),
        camera: CameraState {
            x: camera_x,
            y: camera_y,
            scale: camera_scale,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::MapObjectKind;

    fn minimal_level() -> String {
        let mut lines = vec!["room".to_string(), "6*4|-1|0".to_string()];
        while lines.len() < 11 {
            lines.push(String::new());
        }
        let mut cells = vec!["0".to_string(); 24];
        cells[0] = "4".to_string();
        cells[4] = "1,3".to_string();
        cells[8] = "1,4".to_string();
        lines.push(cells.join("|"));
        lines.join("\n")
    }

    fn sample_region_state() -> RegionState {
        let mut rooms = BTreeMap::new();
        rooms.insert(
            "SU_A01".to_string(),
            RoomState {
                level_text: minimal_level(),
                settings_text: None,
            },
        );
        rooms.insert(
            "SU_B02".to_string(),
            RoomState {
                level_text: minimal_level(),
                settings_text: None,
            },
        );
        RegionState {
            id: "SU".to_string(),
            world_text: "ROOMS\nSU_A01 : SU_B02\nSU_B02 : SU_A01\nEND ROOMS\n".to_string(),
            map_text: "SU_A01: 10,20\nSU_B02: 60,20\n".to_string(),
            rooms,
            ..RegionState::default()
        }
    }

    #[test]
    fn test_state_json_round_trip() {
        let mut state = AppState {
            version: STATE_VERSION,
            slugcat: Some("White".to_string()),
            region: Some(sample_region_state()),
            ..AppState::default()
        };
        let obj = MapObject::new("label", MapObjectKind::TextLabel, Vec2::new(3.0, 4.0));
        state.objects.insert(obj.key(), obj);
        state
            .connections
            .insert("SU_A01~SU_B02".to_string(), ConnectionData::Legacy(2));

        let json = serde_json::to_string_pretty(&state).unwrap();
        let loaded: AppState = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.slugcat.as_deref(), Some("White"));
        assert!(loaded.objects.contains_key("label:text_label"));
        assert!(matches!(
            loaded.connections.get("SU_A01~SU_B02"),
            Some(ConnectionData::Legacy(2))
        ));
    }

    #[test]
    fn test_restore_applies_position_overrides() {
        let mut state = sample_region_state();
        state
            .room_positions
            .insert("SU_A01".to_string(), [111.0, 222.0]);
        let mut errors = LoadErrorLog::new();
        let region = state.restore(None, &mut errors);
        assert_eq!(
            region.room("SU_A01").unwrap().world_pos,
            Vec2::new(111.0, 222.0)
        );
        // Unedited room keeps its map position.
        assert_eq!(
            region.room("SU_B02").unwrap().world_pos,
            Vec2::new(60.0, 20.0)
        );
    }

    #[test]
    fn test_restore_applies_color_overrides() {
        let mut state = sample_region_state();
        state.map_text = "SU_A01: 10,20,0,0,0,Chimney\nSU_B02: 60,20\n".to_string();
        state
            .subregion_colors
            .insert("Chimney".to_string(), [9, 8, 7, 255]);
        let mut errors = LoadErrorLog::new();
        let region = state.restore(None, &mut errors);
        assert_eq!(region.colors.get("Chimney"), Some([9, 8, 7, 255]));
        assert_eq!(region.subregions[0].background_color.color, [9, 8, 7, 255]);
    }

    #[test]
    fn test_restore_uses_embedded_properties() {
        let mut state = sample_region_state();
        state.properties_text = "Subregion: Chimney: #336699\n".to_string();
        let mut errors = LoadErrorLog::new();
        let region = state.restore(None, &mut errors);
        assert!(errors.is_empty(), "{:?}", errors.entries());
        assert_eq!(region.subregions[0].name, "Chimney");
        assert_eq!(region.colors.get("Chimney"), Some([0x33, 0x66, 0x99, 255]));

        // The field survives a serde round trip of the whole session.
        let json = serde_json::to_string(&state).unwrap();
        let loaded: RegionState = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.properties_text, state.properties_text);
    }

    #[test]
    fn test_save_creates_backup_and_renames() {
        let dir = std::env::temp_dir().join("cornifer-state-test");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("session.json");

        let state = AppState::default();
        save_state(&path, &state).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());

        // Second save backs up the first.
        save_state(&path, &state).unwrap();
        let backups = fs::read_dir(&dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| {
                let name = e.file_name().to_string_lossy().into_owned();
                name.starts_with("session-") && name.ends_with(".json")
            })
            .count();
        assert_eq!(backups, 1);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_distinguishes_missing_and_corrupt() {
        let dir = std::env::temp_dir().join("cornifer-state-load-test");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        let missing = dir.join("nope.json");
        assert!(matches!(
            load_state(&missing),
            Err(StateLoadError::Missing)
        ));

        let corrupt = dir.join("bad.json");
        fs::write(&corrupt, "{not json").unwrap();
        assert!(matches!(
            load_state(&corrupt),
            Err(StateLoadError::Corrupt(_))
        ));
        let _ = fs::remove_dir_all(&dir);
    }
}
