//! The interactive editor: a minifb window over an `EditorSession`.
//!
//! Each frame handles input (camera pan/zoom, room and waypoint dragging,
//! UI clicks), drains the UI event queue into session operations, then
//! redraws the map and the sidebar into the window's pixel buffer.

use std::path::{Path, PathBuf};

use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use crate::connections::HIT_BREADTH;
use crate::dialogs::Platform;
use crate::export::{export_png, ExportOptions};
use crate::geometry::{Rect, Vec2};
use crate::objects::Capabilities;
use crate::render::FramebufferRenderer;
use crate::render::{Color, Renderer};
use crate::session::{EditorSession, Selection};
use crate::state::save_state;
use crate::ui::{
    Anchor, CollapsibleState, Constraints, ElementId, ElementKind, ListState, UiAction, UiTree,
};
use crate::version::UpdateCheck;

const WINDOW_WIDTH: usize = 1280;
const WINDOW_HEIGHT: usize = 800;
const SIDEBAR_WIDTH: f32 = 220.0;
const STATUS_HEIGHT: f32 = 18.0;
const BACKGROUND: Color = [18, 18, 22, 255];
const STATUS_BAR: Color = [30, 34, 40, 255];
const STATUS_TEXT: Color = [210, 210, 210, 255];

const SLUGCATS: [&str; 3] = ["White", "Yellow", "Red"];

/// What the pointer is currently dragging.
#[derive(Clone, Debug, Default, PartialEq)]
enum Drag {
    #[default]
    None,
    Pan,
    Room {
        name: String,
        grab: Vec2,
    },
    Object(usize),
    Waypoint {
        connection: usize,
        point: usize,
    },
}

/// Sidebar and modal element ids, resolved once at build time.
struct UiIds {
    snap_button: ElementId,
    error_modal: ElementId,
    error_label: ElementId,
}

pub struct Editor {
    pub session: EditorSession,
    pub ui: UiTree,
    platform: Box<dyn Platform>,
    update: UpdateCheck,
    state_path: PathBuf,
    ids: UiIds,
    drag: Drag,
    last_mouse: Vec2,
    left_was_down: bool,
    pub errors_dismissed: bool,
}

impl Editor {
    pub fn new(
        session: EditorSession,
        state_path: PathBuf,
        platform: Box<dyn Platform>,
    ) -> Editor {
        let mut ui = UiTree::new();
        let ids = build_ui(&mut ui);
        Editor {
            session,
            ui,
            platform,
            update: UpdateCheck::spawn(),
            state_path,
            ids,
            drag: Drag::None,
            last_mouse: Vec2::ZERO,
            left_was_down: false,
            errors_dismissed: false,
        }
    }

    pub fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let mut window = Window::new(
            "Cornifer",
            WINDOW_WIDTH,
            WINDOW_HEIGHT,
            WindowOptions {
                resize: true,
                ..WindowOptions::default()
            },
        )?;
        window.set_target_fps(60);
        let mut renderer = FramebufferRenderer::new(WINDOW_WIDTH, WINDOW_HEIGHT);

        while window.is_open() && !window.is_key_down(Key::Escape) {
            let (width, height) = window.get_size();
            renderer.resize(width, height);
            self.ui
                .recalculate(Rect::new(0.0, 0.0, width as f32, height as f32));

            self.handle_input(&window);
            for event in self.ui.drain_events() {
                self.handle_action(event.action);
            }
            self.sync_ui();

            renderer.clear(BACKGROUND);
            let camera = self.session.camera;
            self.session.draw_map(&mut renderer, &camera);
            self.ui.draw(&mut renderer);
            self.draw_status(&mut renderer);
            window.update_with_buffer(&renderer.buffer, width, height)?;
        }

        if self.session.dirty
            && self
                .platform
                .confirm("Cornifer", "Save the session before quitting?")
        {
            self.handle_action(UiAction::SaveState);
        }
        Ok(())
    }

    fn handle_input(&mut self, window: &Window) {
        let Some((mx, my)) = window.get_mouse_pos(MouseMode::Pass) else {
            return;
        };
        let mouse = Vec2::new(mx, my);
        let left = window.get_mouse_down(MouseButton::Left);
        self.ui.update_hover(mouse);

        if let Some((_, wheel)) = window.get_scroll_wheel() {
            if wheel != 0.0 {
                if self.ui.hit_test(mouse).is_some() {
                    self.ui.scroll(mouse, -wheel * 20.0);
                } else {
                    let factor = if wheel > 0.0 { 1.15 } else { 1.0 / 1.15 };
                    self.session.camera.zoom_around(mouse, factor);
                }
            }
        }

        let world = self.session.camera.screen_to_world(mouse);
        if left && !self.left_was_down {
            self.on_press(mouse, world);
        } else if left {
            self.on_drag(mouse, world);
        } else if self.left_was_down {
            self.drag = Drag::None;
        }

        if window.is_key_pressed(Key::S, KeyRepeat::No) {
            self.handle_action(UiAction::SaveState);
        }
        if window.is_key_pressed(Key::E, KeyRepeat::No) {
            self.handle_action(UiAction::ExportImage);
        }
        if window.is_key_pressed(Key::G, KeyRepeat::No) {
            self.handle_action(UiAction::ToggleSnap);
        }
        for (key, layer) in [(Key::Key1, 0), (Key::Key2, 1), (Key::Key3, 2)] {
            if window.is_key_pressed(key, KeyRepeat::No) {
                self.handle_action(UiAction::Custom(layer));
            }
        }
        if window.is_key_pressed(Key::Delete, KeyRepeat::No)
            || window.is_key_pressed(Key::Backspace, KeyRepeat::No)
        {
            self.delete_selection();
        }

        self.last_mouse = mouse;
        self.left_was_down = left;
    }

    /// Left press: UI first, then waypoints, objects, rooms, connection
    /// segments, and finally camera panning.
    fn on_press(&mut self, mouse: Vec2, world: Vec2) {
        if self.ui.click(mouse) {
            return;
        }
        let scale = self.session.camera.scale;
        let point_radius = 8.0 / scale;

        if let Some((connection, point)) = self.session.connections.point_at(world, point_radius)
        {
            self.select_waypoint(connection, point);
            self.drag = Drag::Waypoint { connection, point };
            return;
        }
        if let Some(index) = self.session.object_at(world, point_radius.max(2.0)) {
            self.session.selection = Selection::Object(index);
            self.drag = Drag::Object(index);
            return;
        }
        if let Some(room) = self.session.room_at(world) {
            let name = room.name.clone();
            let grab = world - room.world_pos;
            self.session.selection = Selection::Room(name.clone());
            self.drag = Drag::Room { name, grab };
            return;
        }
        if let Some(hit) = self
            .session
            .connections
            .hit_test(world, HIT_BREADTH / scale)
        {
            let point = self.session.connections.insert_waypoint(hit);
            self.select_waypoint(hit.connection, point);
            self.drag = Drag::Waypoint {
                connection: hit.connection,
                point,
            };
            self.session.dirty = true;
            return;
        }
        self.session.selection = Selection::None;
        self.drag = Drag::Pan;
    }

    fn on_drag(&mut self, mouse: Vec2, world: Vec2) {
        match self.drag.clone() {
            Drag::None => {}
            Drag::Pan => {
                let delta = (mouse - self.last_mouse) * (1.0 / self.session.camera.scale);
                self.session.camera.position = self.session.camera.position - delta;
            }
            Drag::Room { name, grab } => {
                self.session.move_room(&name, world - grab);
            }
            Drag::Object(index) => {
                self.session.move_object(index, world);
            }
            Drag::Waypoint { connection, point } => {
                if let Some(conn) = self.session.connections.connections.get_mut(connection) {
                    if let Some(wp) = conn.points.get_mut(point) {
                        wp.position = world;
                        self.session.dirty = true;
                    }
                }
            }
        }
    }

    fn select_waypoint(&mut self, connection: usize, point: usize) {
        for conn in &mut self.session.connections.connections {
            for wp in &mut conn.points {
                wp.selected = false;
            }
        }
        if let Some(wp) = self
            .session
            .connections
            .connections
            .get_mut(connection)
            .and_then(|c| c.points.get_mut(point))
        {
            wp.selected = true;
        }
        self.session.selection = Selection::Waypoint { connection, point };
    }

    fn delete_selection(&mut self) {
        match std::mem::take(&mut self.session.selection) {
            Selection::Waypoint { .. } => {
                self.session.connections.remove_selected();
                self.session.dirty = true;
            }
            Selection::Object(index) => {
                if self
                    .session
                    .objects
                    .get(index)
                    .map(|o| o.capabilities().contains(Capabilities::SELECTABLE))
                    .unwrap_or(false)
                {
                    self.session.objects.remove(index);
                    self.session.dirty = true;
                }
            }
            // Rooms come from the region; they move but never delete.
            other => self.session.selection = other,
        }
    }

    /// Apply one UI action to the session.
    pub fn handle_action(&mut self, action: UiAction) {
        match action {
            UiAction::None => {}
            UiAction::SaveState => {
                match save_state(&self.state_path, &self.session.to_state()) {
                    Ok(()) => self.session.dirty = false,
                    Err(e) => self.platform.alert("Save failed", &e.to_string()),
                }
            }
            UiAction::LoadRegion => {
                let Some(dir) = self.platform.pick_folder("Pick a region folder") else {
                    return;
                };
                let Some(id) = infer_region_id(&dir) else {
                    self.platform
                        .alert("Load failed", "no world_<id>.txt in that folder");
                    return;
                };
                let slugcat = self.session.slugcat.clone();
                if let Err(e) = self.session.load_region_dir(&dir, &id, slugcat.as_deref()) {
                    self.platform.alert("Load failed", &e.to_string());
                }
                self.errors_dismissed = false;
            }
            UiAction::ExportImage => {
                let Some(path) = self.platform.save_file("Export map", "map.png", "png") else {
                    return;
                };
                if let Err(e) = export_png(&self.session, &path, &ExportOptions::default()) {
                    self.platform.alert("Export failed", &e.to_string());
                }
            }
            UiAction::DismissErrors | UiAction::CloseModal => {
                self.errors_dismissed = true;
            }
            UiAction::ToggleSnap => {
                self.session.snap_to_grid = !self.session.snap_to_grid;
            }
            UiAction::SelectSlugcat(slugcat) => {
                self.reload_for_slugcat(&slugcat);
            }
            UiAction::SelectSubregion(_) => {}
            UiAction::Custom(layer) => {
                self.session.active_layer = layer as i32;
            }
        }
    }

    /// Rebuild the region from the embedded sources for a different
    /// slugcat.
    fn reload_for_slugcat(&mut self, slugcat: &str) {
        let Some(region_state) = self.session.region_state.clone() else {
            return;
        };
        let connections = self.session.to_state().connections;
        let mut fresh = EditorSession::new();
        fresh.camera = self.session.camera;
        fresh.slugcat = Some(slugcat.to_string());
        fresh.objects = std::mem::take(&mut self.session.objects);
        let region = region_state.restore(Some(slugcat), &mut fresh.errors);
        fresh.connections = crate::connections::RegionConnections::build(&region);
        for (key, data) in &connections {
            fresh.connections.apply_data(key, data);
        }
        fresh.region = Some(region);
        fresh.region_state = Some(region_state);
        fresh.dirty = true;
        self.session = fresh;
        self.errors_dismissed = false;
    }

    /// Push per-frame session facts into the UI elements.
    fn sync_ui(&mut self) {
        let snap_label = if self.session.snap_to_grid {
            "Snap: on"
        } else {
            "Snap: off"
        };
        if let ElementKind::Button { label, .. } = &mut self.ui.get_mut(self.ids.snap_button).kind
        {
            *label = snap_label.to_string();
        }

        let show_errors = !self.session.errors.is_empty() && !self.errors_dismissed;
        self.ui.get_mut(self.ids.error_modal).visible = show_errors;
        if show_errors {
            let entries = self.session.errors.entries();
            let mut text = format!("{} load issue(s). First:", entries.len());
            if let Some(first) = entries.first() {
                text.push(' ');
                text.push_str(&first.to_string());
            }
            if let ElementKind::Label { text: label } =
                &mut self.ui.get_mut(self.ids.error_label).kind
            {
                *label = text;
            }
        }
    }

    fn draw_status(&self, renderer: &mut dyn Renderer) {
        let height = renderer.height() as f32;
        let width = renderer.width() as f32;
        let bar = Rect::new(0.0, height - STATUS_HEIGHT, width, STATUS_HEIGHT);
        renderer.fill_rect(bar, STATUS_BAR);

        let mut status = match &self.session.region {
            Some(region) => format!(
                "{} | {} rooms | layer {}",
                region.id,
                region.rooms.len(),
                self.session.active_layer + 1
            ),
            None => "no region loaded".to_string(),
        };
        if let Some(summary) = self.session.error_summary() {
            status.push_str(" | ");
            status.push_str(&summary);
        }
        if let Some(version) = self.update.newer_version() {
            status.push_str(&format!(" | update available: {version}"));
        }
        renderer.draw_text(
            Vec2::new(6.0, bar.y + 5.0),
            &status,
            STATUS_TEXT,
            1.0,
        );
    }
}

/// Region id from the folder's `world_<id>.txt`, uppercased.
pub fn infer_region_id(dir: &Path) -> Option<String> {
    let entries = std::fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().to_ascii_lowercase();
        if let Some(rest) = name.strip_prefix("world_") {
            if let Some(id) = rest.strip_suffix(".txt") {
                return Some(id.to_ascii_uppercase());
            }
        }
    }
    None
}

fn build_ui(ui: &mut UiTree) -> UiIds {
    let root = ui.add_root();

    let sidebar = ui.add(
        root,
        ElementKind::List(ListState {
            spacing: 4.0,
            padding: 6.0,
            ..ListState::default()
        }),
        Constraints {
            left: Anchor::mixed(-SIDEBAR_WIDTH, 1.0),
            top: Anchor::fixed(0.0),
            width: Anchor::fixed(SIDEBAR_WIDTH),
            height: Anchor::mixed(-STATUS_HEIGHT, 1.0),
        },
    );

    for (label, action) in [
        ("Load region...", UiAction::LoadRegion),
        ("Save session", UiAction::SaveState),
        ("Export PNG...", UiAction::ExportImage),
    ] {
        ui.add(
            sidebar,
            ElementKind::Button {
                label: label.to_string(),
                action,
            },
            Constraints::fixed(0.0, 0.0, SIDEBAR_WIDTH - 12.0, 22.0),
        );
    }
    let snap_button = ui.add(
        sidebar,
        ElementKind::Button {
            label: "Snap: off".to_string(),
            action: UiAction::ToggleSnap,
        },
        Constraints::fixed(0.0, 0.0, SIDEBAR_WIDTH - 12.0, 22.0),
    );

    let layers = ui.add(
        sidebar,
        ElementKind::Collapsible(CollapsibleState::new("Layers")),
        Constraints::fixed(0.0, 0.0, SIDEBAR_WIDTH - 12.0, 0.0),
    );
    for layer in 0..3u32 {
        ui.add(
            layers,
            ElementKind::Button {
                label: format!("Layer {}", layer + 1),
                action: UiAction::Custom(layer),
            },
            Constraints::fixed(4.0, layer as f32 * 20.0, SIDEBAR_WIDTH - 20.0, 20.0),
        );
    }

    let slugcats = ui.add(
        sidebar,
        ElementKind::Collapsible(CollapsibleState::new("Slugcat")),
        Constraints::fixed(0.0, 0.0, SIDEBAR_WIDTH - 12.0, 0.0),
    );
    for (i, name) in SLUGCATS.iter().enumerate() {
        ui.add(
            slugcats,
            ElementKind::Button {
                label: name.to_string(),
                action: UiAction::SelectSlugcat(name.to_string()),
            },
            Constraints::fixed(4.0, i as f32 * 20.0, SIDEBAR_WIDTH - 20.0, 20.0),
        );
    }

    let error_modal = ui.add(
        root,
        ElementKind::Panel,
        Constraints {
            left: Anchor::mixed(-220.0, 0.5),
            top: Anchor::mixed(-60.0, 0.5),
            width: Anchor::fixed(440.0),
            height: Anchor::fixed(120.0),
        },
    );
    ui.get_mut(error_modal).modal = true;
    ui.get_mut(error_modal).visible = false;
    let error_label = ui.add(
        error_modal,
        ElementKind::Label {
            text: String::new(),
        },
        Constraints::fixed(10.0, 28.0, 420.0, 60.0),
    );
    ui.add(
        error_modal,
        ElementKind::Button {
            label: "Dismiss".to_string(),
            action: UiAction::DismissErrors,
        },
        Constraints::fixed(170.0, 92.0, 100.0, 20.0),
    );

    UiIds {
        snap_button,
        error_modal,
        error_label,
    }
}
