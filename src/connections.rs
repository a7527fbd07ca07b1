//! Routed connections between rooms: deduplicated edges, user waypoints,
//! polyline hit-testing and rendering.
//!
//! Every resolved room pair gets exactly one `Connection` no matter which
//! side declared it first. The routed polyline runs source exit point →
//! waypoints → destination exit point; users insert waypoints by clicking a
//! segment and drag or delete them afterwards.

use serde::{Deserialize, Serialize};

use crate::geometry::{point_in_segment_rect, project_onto_segment, Vec2};
use crate::region::Region;
use crate::render::{Camera, Color, Renderer};

/// Hit-test breadth around a segment, in screen pixels.
pub const HIT_BREADTH: f32 = 20.0;

/// Drawn breadth of a connection line, in world units.
const LINE_BREADTH: f32 = 1.0;

const LINE_COLOR: Color = [255, 255, 255, 255];
const SHADOW_COLOR: Color = [0, 0, 0, 160];
const POINT_COLOR: Color = [255, 200, 80, 255];
const POINT_SELECTED_COLOR: Color = [255, 90, 90, 255];

/// A user-editable waypoint on a connection polyline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConnectionPoint {
    pub position: Vec2,
    pub selected: bool,
}

impl ConnectionPoint {
    pub fn new(position: Vec2) -> ConnectionPoint {
        ConnectionPoint {
            position,
            selected: false,
        }
    }
}

/// One routed edge between two rooms.
#[derive(Clone, Debug)]
pub struct Connection {
    pub source: String,
    pub destination: String,
    pub source_exit: usize,
    pub destination_exit: usize,
    /// Fixed endpoints in world space, recomputed when rooms move.
    pub source_point: Vec2,
    pub destination_point: Vec2,
    pub points: Vec<ConnectionPoint>,
}

impl Connection {
    /// Save-file key for this connection.
    pub fn key(&self) -> String {
        format!("{}~{}", self.source, self.destination)
    }

    /// The full polyline: fixed source, waypoints, fixed destination.
    pub fn polyline(&self) -> Vec<Vec2> {
        let mut line = Vec::with_capacity(self.points.len() + 2);
        line.push(self.source_point);
        line.extend(self.points.iter().map(|p| p.position));
        line.push(self.destination_point);
        line
    }

    pub fn segment_count(&self) -> usize {
        self.points.len() + 1
    }
}

/// Result of hit-testing a point against the connection polylines.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConnectionHit {
    pub connection: usize,
    pub segment: usize,
    /// Normalized projection along the hit segment, 0..1.
    pub t: f32,
    pub distance: f32,
}

/// Serialized form of one connection's waypoints.
///
/// The legacy format stored only a point count; points are reconstructed by
/// linear interpolation between the fixed endpoints. The current format
/// stores explicit coordinates.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConnectionData {
    Legacy(usize),
    Points(Vec<[f32; 2]>),
}

/// All routed connections of a region.
#[derive(Clone, Debug, Default)]
pub struct RegionConnections {
    pub connections: Vec<Connection>,
}

impl RegionConnections {
    /// Build one connection per resolved room pair.
    ///
    /// The pair is represented once: the side encountered first in room
    /// order becomes the source.
    pub fn build(region: &Region) -> RegionConnections {
        let mut connections: Vec<Connection> = Vec::new();
        for room in &region.rooms {
            for conn in room.connections.iter().flatten() {
                let duplicate = connections.iter().any(|c| {
                    (c.source.eq_ignore_ascii_case(&room.name)
                        && c.destination.eq_ignore_ascii_case(&conn.target))
                        || (c.destination.eq_ignore_ascii_case(&room.name)
                            && c.source.eq_ignore_ascii_case(&conn.target))
                });
                if duplicate {
                    continue;
                }
                let Some(target) = region.room(&conn.target) else { continue };
                connections.push(Connection {
                    source: room.name.clone(),
                    destination: target.name.clone(),
                    source_exit: conn.exit,
                    destination_exit: conn.target_exit,
                    source_point: room.exit_world_pos(conn.exit),
                    destination_point: target.exit_world_pos(conn.target_exit),
                    points: Vec::new(),
                });
            }
        }
        RegionConnections { connections }
    }

    /// Recompute fixed endpoints after rooms were repositioned.
    pub fn update_endpoints(&mut self, region: &Region) {
        for conn in &mut self.connections {
            if let Some(room) = region.room(&conn.source) {
                conn.source_point = room.exit_world_pos(conn.source_exit);
            }
            if let Some(room) = region.room(&conn.destination) {
                conn.destination_point = room.exit_world_pos(conn.destination_exit);
            }
        }
    }

    /// Find the nearest segment whose oriented hit rectangle contains
    /// `point` (world space, `breadth` in world units).
    pub fn hit_test(&self, point: Vec2, breadth: f32) -> Option<ConnectionHit> {
        let mut best: Option<ConnectionHit> = None;
        for (ci, conn) in self.connections.iter().enumerate() {
            let line = conn.polyline();
            for si in 0..line.len() - 1 {
                let (a, b) = (line[si], line[si + 1]);
                if !point_in_segment_rect(a, b, breadth, point) {
                    continue;
                }
                let (t, distance) = project_onto_segment(a, b, point);
                if best.map_or(true, |h| distance < h.distance) {
                    best = Some(ConnectionHit {
                        connection: ci,
                        segment: si,
                        t,
                        distance,
                    });
                }
            }
        }
        best
    }

    /// Insert a waypoint at a hit, splitting the hit segment in two.
    ///
    /// The parameter is nudged away from 0 and 1 so the new waypoint never
    /// coincides with the fixed endpoints. Returns the waypoint's index in
    /// the connection's point list.
    pub fn insert_waypoint(&mut self, hit: ConnectionHit) -> usize {
        let conn = &mut self.connections[hit.connection];
        let line = conn.polyline();
        let a = line[hit.segment];
        let b = line[hit.segment + 1];
        let t = hit.t.clamp(0.05, 0.95);
        conn.points
            .insert(hit.segment, ConnectionPoint::new(a.lerp(b, t)));
        hit.segment
    }

    pub fn remove_waypoint(&mut self, connection: usize, point: usize) {
        let conn = &mut self.connections[connection];
        if point < conn.points.len() {
            conn.points.remove(point);
        }
    }

    pub fn remove_selected(&mut self) {
        for conn in &mut self.connections {
            conn.points.retain(|p| !p.selected);
        }
    }

    /// Find a waypoint under `point` within `radius` (world units).
    pub fn point_at(&self, point: Vec2, radius: f32) -> Option<(usize, usize)> {
        for (ci, conn) in self.connections.iter().enumerate() {
            for (pi, wp) in conn.points.iter().enumerate() {
                if wp.position.distance(point) <= radius {
                    return Some((ci, pi));
                }
            }
        }
        None
    }

    /// Serialize waypoints to the save-file map of `"{src}~{dst}"` keys.
    pub fn to_data(&self) -> Vec<(String, ConnectionData)> {
        self.connections
            .iter()
            .filter(|c| !c.points.is_empty())
            .map(|c| {
                let points = c
                    .points
                    .iter()
                    .map(|p| [p.position.x, p.position.y])
                    .collect();
                (c.key(), ConnectionData::Points(points))
            })
            .collect()
    }

    /// Restore waypoints for a keyed connection from either format.
    pub fn apply_data(&mut self, key: &str, data: &ConnectionData) {
        let Some(conn) = self
            .connections
            .iter_mut()
            .find(|c| c.key().eq_ignore_ascii_case(key))
        else {
            return;
        };
        conn.points = match data {
            ConnectionData::Legacy(count) => (0..*count)
                .map(|i| {
                    let t = (i + 1) as f32 / (*count + 1) as f32;
                    ConnectionPoint::new(conn.source_point.lerp(conn.destination_point, t))
                })
                .collect(),
            ConnectionData::Points(points) => points
                .iter()
                .map(|p| ConnectionPoint::new(Vec2::new(p[0], p[1])))
                .collect(),
        };
    }

    /// Draw every connection as oriented rectangle sprites.
    ///
    /// Segments are trimmed at shared corners by half the line breadth so
    /// joints do not overdraw. The shadow pass shortens and darkens interior
    /// segments (those not touching a fixed endpoint) to read as a local
    /// drop shadow under the line work.
    pub fn draw(&self, renderer: &mut dyn Renderer, camera: &Camera, shadow: bool) {
        for conn in &self.connections {
            let line = conn.polyline();
            let last = line.len() - 2;
            for i in 0..=last {
                let (a, b) = (line[i], line[i + 1]);
                let interior = i != 0 && i != last;
                if shadow && !interior {
                    continue;
                }
                let (color, trim) = if shadow {
                    (SHADOW_COLOR, LINE_BREADTH)
                } else {
                    (LINE_COLOR, LINE_BREADTH / 2.0)
                };
                draw_segment(renderer, camera, a, b, trim, color);
            }
            if !shadow {
                for point in &conn.points {
                    let color = if point.selected {
                        POINT_SELECTED_COLOR
                    } else {
                        POINT_COLOR
                    };
                    let screen = camera.world_to_screen(point.position);
                    let size = (LINE_BREADTH * 2.0 * camera.scale).max(4.0);
                    renderer.fill_rotated_rect(screen, Vec2::new(size, size), 0.0, color);
                }
            }
        }
    }
}

/// Draw one segment as a rotated rectangle, trimmed by `trim` world units at
/// both ends (skipped when the segment is too short to trim).
fn draw_segment(
    renderer: &mut dyn Renderer,
    camera: &Camera,
    a: Vec2,
    b: Vec2,
    trim: f32,
    color: Color,
) {
    let length = a.distance(b);
    if length <= f32::EPSILON {
        return;
    }
    let drawn = (length - trim * 2.0).max(length * 0.25);
    let center = camera.world_to_screen(a.lerp(b, 0.5));
    let size = Vec2::new(drawn * camera.scale, LINE_BREADTH * camera.scale.max(1.0));
    renderer.fill_rotated_rect(center, size, (b - a).angle(), color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LoadErrorLog;
    use crate::region::{build_region, MemoryDataSource, RegionSource};

    fn level_with_one_exit() -> String {
        let width = 6;
        let height = 4;
        let mut cells = vec!["0".to_string(); width * height];
        cells[0] = "4".to_string();
        cells[height] = "1,3".to_string();
        cells[height * 2] = "1,4".to_string();
        let mut lines = vec!["room".to_string(), format!("{width}*{height}|-1|0")];
        while lines.len() < 11 {
            lines.push(String::new());
        }
        lines.push(cells.join("|"));
        lines.join("\n")
    }

    fn two_room_region() -> crate::region::Region {
        let mut data = MemoryDataSource::default();
        data.levels.insert("SU_A01".into(), level_with_one_exit());
        data.levels.insert("SU_B02".into(), level_with_one_exit());
        let mut errors = LoadErrorLog::new();
        build_region(
            &RegionSource {
                id: "SU",
                world_text: "ROOMS\nSU_A01 : SU_B02\nSU_B02 : SU_A01\nEND ROOMS\n",
                map_text: "SU_A01: 10,20\nSU_B02: 60,20\n",
                properties_text: "",
                gate_lock_text: "",
                data: &data,
            },
            None,
            &mut errors,
        )
    }

    #[test]
    fn test_pair_represented_once() {
        let region = two_room_region();
        let conns = RegionConnections::build(&region);
        assert_eq!(conns.connections.len(), 1);
        let conn = &conns.connections[0];
        assert_eq!(conn.source, "SU_A01");
        assert_eq!(conn.destination, "SU_B02");
        assert_eq!(conn.key(), "SU_A01~SU_B02");
    }

    #[test]
    fn test_hit_test_finds_nearest_segment() {
        let region = two_room_region();
        let mut conns = RegionConnections::build(&region);
        let conn = &mut conns.connections[0];
        conn.source_point = Vec2::new(0.0, 0.0);
        conn.destination_point = Vec2::new(20.0, 0.0);
        conn.points = vec![ConnectionPoint::new(Vec2::new(10.0, 10.0))];

        // Near the middle of the first segment (0,0)..(10,10).
        let hit = conns.hit_test(Vec2::new(4.0, 5.0), 4.0).unwrap();
        assert_eq!(hit.segment, 0);
        assert!(hit.t > 0.3 && hit.t < 0.6);

        // Far from everything.
        assert!(conns.hit_test(Vec2::new(100.0, 100.0), 4.0).is_none());
    }

    #[test]
    fn test_insert_waypoint_splits_segment() {
        let region = two_room_region();
        let mut conns = RegionConnections::build(&region);
        {
            let conn = &mut conns.connections[0];
            conn.source_point = Vec2::new(0.0, 0.0);
            conn.destination_point = Vec2::new(10.0, 0.0);
        }
        let hit = conns.hit_test(Vec2::new(5.0, 1.0), 4.0).unwrap();
        let index = conns.insert_waypoint(hit);
        assert_eq!(index, 0);
        let conn = &conns.connections[0];
        assert_eq!(conn.points.len(), 1);
        assert_eq!(conn.segment_count(), 2);
        assert!((conn.points[0].position.x - 5.0).abs() < 0.5);
        // The waypoint may not coincide with either fixed endpoint.
        assert!(conn.points[0].position.distance(conn.source_point) > 0.1);
        assert!(conn.points[0].position.distance(conn.destination_point) > 0.1);
    }

    #[test]
    fn test_insert_at_segment_end_never_touches_endpoints() {
        let region = two_room_region();
        let mut conns = RegionConnections::build(&region);
        {
            let conn = &mut conns.connections[0];
            conn.source_point = Vec2::new(0.0, 0.0);
            conn.destination_point = Vec2::new(10.0, 0.0);
        }
        let hit = ConnectionHit {
            connection: 0,
            segment: 0,
            t: 0.0,
            distance: 0.0,
        };
        conns.insert_waypoint(hit);
        let conn = &conns.connections[0];
        assert!(conn.points[0].position.distance(conn.source_point) > 0.1);
    }

    #[test]
    fn test_waypoint_round_trip() {
        let region = two_room_region();
        let mut conns = RegionConnections::build(&region);
        conns.connections[0].points = vec![
            ConnectionPoint::new(Vec2::new(12.5, 20.25)),
            ConnectionPoint::new(Vec2::new(30.0, 24.75)),
            ConnectionPoint::new(Vec2::new(45.125, 21.0)),
        ];
        let data = conns.to_data();
        assert_eq!(data.len(), 1);

        let json = serde_json::to_string(&data[0].1).unwrap();
        let parsed: ConnectionData = serde_json::from_str(&json).unwrap();

        let mut restored = RegionConnections::build(&region);
        restored.apply_data(&data[0].0, &parsed);
        let original = &conns.connections[0].points;
        let loaded = &restored.connections[0].points;
        assert_eq!(loaded.len(), original.len());
        for (a, b) in original.iter().zip(loaded) {
            assert!((a.position.x - b.position.x).abs() < f32::EPSILON);
            assert!((a.position.y - b.position.y).abs() < f32::EPSILON);
        }
    }

    #[test]
    fn test_legacy_count_interpolates() {
        let region = two_room_region();
        let mut conns = RegionConnections::build(&region);
        {
            let conn = &mut conns.connections[0];
            conn.source_point = Vec2::new(0.0, 0.0);
            conn.destination_point = Vec2::new(8.0, 4.0);
        }
        let key = conns.connections[0].key();

        let parsed: ConnectionData = serde_json::from_str("3").unwrap();
        conns.apply_data(&key, &parsed);

        let points = &conns.connections[0].points;
        assert_eq!(points.len(), 3);
        for (i, expected_t) in [(0usize, 0.25f32), (1, 0.5), (2, 0.75)] {
            let expected = Vec2::new(8.0 * expected_t, 4.0 * expected_t);
            assert!((points[i].position.x - expected.x).abs() < 1e-6);
            assert!((points[i].position.y - expected.y).abs() < 1e-6);
        }
    }

    #[test]
    fn test_legacy_and_explicit_parse_from_json() {
        let legacy: ConnectionData = serde_json::from_str("4").unwrap();
        assert!(matches!(legacy, ConnectionData::Legacy(4)));
        let explicit: ConnectionData = serde_json::from_str("[[1.0,2.0],[3.0,4.0]]").unwrap();
        match explicit {
            ConnectionData::Points(p) => assert_eq!(p.len(), 2),
            _ => panic!("expected explicit points"),
        }
    }

    #[test]
    fn test_remove_selected_points() {
        let region = two_room_region();
        let mut conns = RegionConnections::build(&region);
        conns.connections[0].points = vec![
            ConnectionPoint::new(Vec2::new(1.0, 1.0)),
            ConnectionPoint {
                position: Vec2::new(2.0, 2.0),
                selected: true,
            },
            ConnectionPoint::new(Vec2::new(3.0, 3.0)),
        ];
        conns.remove_selected();
        assert_eq!(conns.connections[0].points.len(), 2);
    }

    #[test]
    fn test_endpoints_follow_room_moves() {
        let mut region = two_room_region();
        let mut conns = RegionConnections::build(&region);
        let before = conns.connections[0].source_point;
        region.room_mut("SU_A01").unwrap().world_pos = Vec2::new(200.0, 300.0);
        conns.update_endpoints(&region);
        let after = conns.connections[0].source_point;
        assert_ne!(before, after);
        assert!((after.x - 200.5).abs() < 1e-6);
    }
}
