//! Retained-mode UI layout engine.
//!
//! Elements live in an arena and form a tree. Each element has four anchors
//! (top/left/width/height), every anchor an `offset + fraction * parent`
//! pair resolved against the parent's children rect. `recalculate` resolves
//! screen rects top-down in a single pass; mutating an anchor or a flag does
//! nothing until a caller recalculates from an ancestor. Specialized
//! containers (lists, modals, collapsible panels, tab hosts) override child
//! placement; hit-testing honors modal exclusivity.
//!
//! Interaction is a typed event queue: clicking an element pushes a
//! `UiEvent` carrying the element's `UiAction` payload; the editor drains
//! the queue each frame. Actions are plain data owned by the element, so
//! tearing the tree down cannot leak handlers.

use crate::geometry::{Rect, Vec2};
use crate::render::{Color, Renderer};

pub type ElementId = usize;

const PANEL_COLOR: Color = [30, 34, 40, 235];
const PANEL_BORDER: Color = [90, 96, 110, 255];
const BUTTON_COLOR: Color = [52, 58, 70, 255];
const BUTTON_HOVER_COLOR: Color = [72, 80, 96, 255];
const BUTTON_DISABLED_COLOR: Color = [40, 42, 48, 255];
const TEXT_COLOR: Color = [235, 235, 235, 255];
const TEXT_DISABLED_COLOR: Color = [140, 140, 140, 255];
const BACKDROP_COLOR: Color = [0, 0, 0, 140];
const SCROLLBAR_TRACK: Color = [24, 26, 30, 255];
const SCROLLBAR_THUMB: Color = [110, 118, 132, 255];
const HEADER_COLOR: Color = [46, 52, 62, 255];

/// One positioning anchor: `offset + fraction * parent_size`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Anchor {
    pub offset: f32,
    pub fraction: f32,
}

impl Anchor {
    pub fn fixed(offset: f32) -> Anchor {
        Anchor {
            offset,
            fraction: 0.0,
        }
    }

    pub fn fraction(fraction: f32) -> Anchor {
        Anchor {
            offset: 0.0,
            fraction,
        }
    }

    pub fn mixed(offset: f32, fraction: f32) -> Anchor {
        Anchor { offset, fraction }
    }

    pub fn resolve(&self, parent: f32) -> f32 {
        self.offset + self.fraction * parent
    }
}

/// The four anchors of an element.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Constraints {
    pub top: Anchor,
    pub left: Anchor,
    pub width: Anchor,
    pub height: Anchor,
}

impl Constraints {
    pub fn fixed(left: f32, top: f32, width: f32, height: f32) -> Constraints {
        Constraints {
            top: Anchor::fixed(top),
            left: Anchor::fixed(left),
            width: Anchor::fixed(width),
            height: Anchor::fixed(height),
        }
    }

    /// Fill the parent's children rect completely.
    pub fn fill() -> Constraints {
        Constraints {
            top: Anchor::fixed(0.0),
            left: Anchor::fixed(0.0),
            width: Anchor::fraction(1.0),
            height: Anchor::fraction(1.0),
        }
    }
}

/// Typed payload attached to clickable elements.
#[derive(Clone, Debug, PartialEq)]
pub enum UiAction {
    None,
    CloseModal,
    SaveState,
    LoadRegion,
    ExportImage,
    DismissErrors,
    ToggleSnap,
    SelectSlugcat(String),
    SelectSubregion(usize),
    Custom(u32),
}

/// One event produced by interaction, drained by the editor each frame.
#[derive(Clone, Debug, PartialEq)]
pub struct UiEvent {
    pub element: ElementId,
    pub action: UiAction,
}

/// State of a list container.
#[derive(Clone, Debug)]
pub struct ListState {
    pub spacing: f32,
    pub padding: f32,
    /// When set, the list's own height is computed from its children.
    pub auto_size: bool,
    pub scroll: f32,
    /// Measured stacked height of visible children, updated by layout.
    pub content_height: f32,
    pub scrollbar_width: f32,
}

impl Default for ListState {
    fn default() -> Self {
        ListState {
            spacing: 4.0,
            padding: 0.0,
            auto_size: false,
            scroll: 0.0,
            content_height: 0.0,
            scrollbar_width: 8.0,
        }
    }
}

impl ListState {
    fn max_scroll(&self, rect_height: f32) -> f32 {
        (self.content_height - rect_height).max(0.0)
    }
}

/// State of a collapsible panel.
#[derive(Clone, Debug)]
pub struct CollapsibleState {
    pub title: String,
    pub collapsed: bool,
    pub header_height: f32,
}

impl CollapsibleState {
    pub fn new(title: &str) -> CollapsibleState {
        CollapsibleState {
            title: title.to_string(),
            collapsed: false,
            header_height: 18.0,
        }
    }
}

/// State of a tab host; child `i` is the page for tab `i`.
#[derive(Clone, Debug)]
pub struct TabState {
    pub titles: Vec<String>,
    pub active: usize,
    pub tab_height: f32,
}

/// What an element is, plus kind-specific payload.
#[derive(Clone, Debug)]
pub enum ElementKind {
    Panel,
    Label { text: String },
    Button { label: String, action: UiAction },
    List(ListState),
    Collapsible(CollapsibleState),
    TabHost(TabState),
}

/// One node of the element tree.
#[derive(Clone, Debug)]
pub struct Element {
    pub kind: ElementKind,
    pub constraints: Constraints,
    pub visible: bool,
    pub enabled: bool,
    pub hovered: bool,
    /// Modal elements own input while visible and draw a backdrop.
    pub modal: bool,
    pub screen_rect: Rect,
    children: Vec<ElementId>,
    parent: Option<ElementId>,
}

impl Element {
    fn new(kind: ElementKind, constraints: Constraints) -> Element {
        Element {
            kind,
            constraints,
            visible: true,
            enabled: true,
            hovered: false,
            modal: false,
            screen_rect: Rect::default(),
            children: Vec::new(),
            parent: None,
        }
    }
}

/// The element arena plus the pending event queue.
#[derive(Debug, Default)]
pub struct UiTree {
    elements: Vec<Element>,
    events: Vec<UiEvent>,
}

impl UiTree {
    pub fn new() -> UiTree {
        UiTree::default()
    }

    /// Create the root element filling the screen. Must be called first.
    pub fn add_root(&mut self) -> ElementId {
        debug_assert!(self.elements.is_empty());
        self.elements
            .push(Element::new(ElementKind::Panel, Constraints::fill()));
        0
    }

    pub fn add(
        &mut self,
        parent: ElementId,
        kind: ElementKind,
        constraints: Constraints,
    ) -> ElementId {
        let id = self.elements.len();
        let mut element = Element::new(kind, constraints);
        element.parent = Some(parent);
        self.elements.push(element);
        self.elements[parent].children.push(id);
        id
    }

    pub fn get(&self, id: ElementId) -> &Element {
        &self.elements[id]
    }

    pub fn get_mut(&mut self, id: ElementId) -> &mut Element {
        &mut self.elements[id]
    }

    pub fn children(&self, id: ElementId) -> &[ElementId] {
        &self.elements[id].children
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Resolve every screen rect top-down from the given screen area.
    ///
    /// Single pass, no relaxation: an element's rect depends only on its
    /// parent's children rect and its own anchors, so one call settles the
    /// whole tree and repeated calls are idempotent.
    pub fn recalculate(&mut self, screen: Rect) {
        if self.elements.is_empty() {
            return;
        }
        self.layout(0, screen);
    }

    fn layout(&mut self, id: ElementId, reference: Rect) {
        let rect = self.resolve_rect(id, reference);
        self.elements[id].screen_rect = rect;
        self.layout_children(id);
    }

    fn resolve_rect(&self, id: ElementId, reference: Rect) -> Rect {
        let c = &self.elements[id].constraints;
        Rect::new(
            reference.x + c.left.resolve(reference.width),
            reference.y + c.top.resolve(reference.height),
            c.width.resolve(reference.width).max(0.0),
            c.height.resolve(reference.height).max(0.0),
        )
    }

    fn layout_children(&mut self, id: ElementId) {
        match &self.elements[id].kind {
            ElementKind::List(_) => self.layout_list(id),
            ElementKind::Collapsible(_) => self.layout_collapsible(id),
            ElementKind::TabHost(_) => self.layout_tab_host(id),
            _ => {
                let rect = self.elements[id].screen_rect;
                for child in self.elements[id].children.clone() {
                    self.layout(child, rect);
                }
            }
        }
    }

    /// Stack visible children vertically with spacing; in auto-size mode the
    /// list's own height becomes the measured content height (two passes:
    /// provisional measure against a zero-height frame, then the real
    /// layout).
    fn layout_list(&mut self, id: ElementId) {
        let mut rect = self.elements[id].screen_rect;
        let children = self.elements[id].children.clone();

        let (spacing, padding, auto_size, scrollbar_width) = {
            let ElementKind::List(list) = &self.elements[id].kind else {
                unreachable!()
            };
            (
                list.spacing,
                list.padding,
                list.auto_size,
                list.scrollbar_width,
            )
        };

        let measured = self.measure_stack(&children, rect.width, spacing) + padding * 2.0;
        if auto_size {
            rect.height = measured;
            self.elements[id].screen_rect = rect;
        }

        let scrollable = !auto_size && measured > rect.height;
        let content_width = if scrollable {
            rect.width - scrollbar_width
        } else {
            rect.width
        };

        let scroll = {
            let ElementKind::List(list) = &mut self.elements[id].kind else {
                unreachable!()
            };
            list.content_height = measured;
            list.scroll = list.scroll.clamp(0.0, list.max_scroll(rect.height));
            if scrollable {
                list.scroll
            } else {
                0.0
            }
        };

        let mut y = rect.y + padding - scroll;
        for child in children {
            if !self.elements[child].visible {
                continue;
            }
            let height = self.measure_element(child, content_width);
            let frame = Rect::new(rect.x + padding, y, content_width - padding * 2.0, height);
            // List children keep their own left/width anchors but their top
            // anchor is owned by the stacking pass.
            let c = self.elements[child].constraints;
            let child_rect = Rect::new(
                frame.x + c.left.resolve(frame.width),
                frame.y,
                c.width.resolve(frame.width).max(0.0),
                height,
            );
            self.elements[child].screen_rect = child_rect;
            self.layout_children(child);
            y += height + spacing;
        }
    }

    /// Measured heights of visible children stacked with `spacing` gaps.
    fn measure_stack(&self, children: &[ElementId], width: f32, spacing: f32) -> f32 {
        let mut total = 0.0;
        let mut count = 0;
        for &child in children {
            if !self.elements[child].visible {
                continue;
            }
            total += self.measure_element(child, width);
            count += 1;
        }
        if count > 1 {
            total += spacing * (count - 1) as f32;
        }
        total
    }

    /// Height an element wants inside a stack. Anchors resolve against a
    /// zero-height provisional frame, so fractional heights collapse to
    /// their offsets; auto-sizing containers measure their content instead.
    fn measure_element(&self, id: ElementId, width: f32) -> f32 {
        match &self.elements[id].kind {
            ElementKind::List(list) if list.auto_size => {
                self.measure_stack(&self.elements[id].children, width, list.spacing)
                    + list.padding * 2.0
            }
            ElementKind::Collapsible(panel) => {
                if panel.collapsed {
                    panel.header_height
                } else {
                    panel.header_height
                        + self.measure_stack(&self.elements[id].children, width, 0.0)
                }
            }
            _ => self.elements[id].constraints.height.resolve(0.0).max(0.0),
        }
    }

    /// Content goes below the header; collapsed content is hidden but keeps
    /// its last rect (stale rects are allowed by design).
    fn layout_collapsible(&mut self, id: ElementId) {
        let rect = self.elements[id].screen_rect;
        let (collapsed, header_height) = {
            let ElementKind::Collapsible(panel) = &self.elements[id].kind else {
                unreachable!()
            };
            (panel.collapsed, panel.header_height)
        };
        if collapsed {
            return;
        }
        let content = Rect::new(
            rect.x,
            rect.y + header_height,
            rect.width,
            (rect.height - header_height).max(0.0),
        );
        for child in self.elements[id].children.clone() {
            self.layout(child, content);
        }
    }

    /// One page visible at a time, below the tab strip.
    fn layout_tab_host(&mut self, id: ElementId) {
        let rect = self.elements[id].screen_rect;
        let (active, tab_height) = {
            let ElementKind::TabHost(tabs) = &self.elements[id].kind else {
                unreachable!()
            };
            (tabs.active, tabs.tab_height)
        };
        let content = Rect::new(
            rect.x,
            rect.y + tab_height,
            rect.width,
            (rect.height - tab_height).max(0.0),
        );
        for (i, child) in self.elements[id].children.clone().into_iter().enumerate() {
            self.elements[child].visible = i == active;
            self.layout(child, content);
        }
    }

    /// Recursive hit-test with modal exclusivity.
    ///
    /// If any visible modal child exists, only modal children are
    /// considered (first match wins) and non-modal siblings are skipped
    /// entirely. Otherwise the first visible child containing the point is
    /// descended into; failing that the element itself is returned when
    /// `can_return_self`.
    pub fn element_at(
        &self,
        id: ElementId,
        point: Vec2,
        can_return_self: bool,
    ) -> Option<ElementId> {
        let element = &self.elements[id];
        if !element.visible {
            return None;
        }

        let has_visible_modal = element
            .children
            .iter()
            .any(|&c| self.elements[c].visible && self.elements[c].modal);

        if has_visible_modal {
            for &child in &element.children {
                let c = &self.elements[child];
                if c.visible && c.modal && c.screen_rect.contains(point) {
                    return self.element_at(child, point, true);
                }
            }
        } else {
            for &child in &element.children {
                let c = &self.elements[child];
                if c.visible && c.screen_rect.contains(point) {
                    if let Some(hit) = self.element_at(child, point, true) {
                        return Some(hit);
                    }
                }
            }
        }

        if can_return_self && element.screen_rect.contains(point) {
            Some(id)
        } else {
            None
        }
    }

    /// Hit-test from the root.
    pub fn hit_test(&self, point: Vec2) -> Option<ElementId> {
        if self.elements.is_empty() {
            return None;
        }
        self.element_at(0, point, false)
    }

    /// Update hover flags for the current pointer position.
    pub fn update_hover(&mut self, point: Vec2) {
        let hit = self.hit_test(point);
        for (id, element) in self.elements.iter_mut().enumerate() {
            element.hovered = hit == Some(id);
        }
    }

    /// Process a click: emits button events, toggles collapsible headers,
    /// switches tabs. Returns true when the click landed on the UI (so the
    /// editor does not also treat it as a canvas click).
    pub fn click(&mut self, point: Vec2) -> bool {
        let Some(id) = self.hit_test(point) else {
            return false;
        };
        let rect = self.elements[id].screen_rect;
        let enabled = self.elements[id].enabled;

        // Tab strips and collapsible headers live on the container itself.
        match &mut self.elements[id].kind {
            ElementKind::Button { action, .. } => {
                if enabled {
                    let action = action.clone();
                    self.events.push(UiEvent {
                        element: id,
                        action,
                    });
                }
            }
            ElementKind::Collapsible(panel) => {
                let header = Rect::new(rect.x, rect.y, rect.width, panel.header_height);
                if header.contains(point) {
                    panel.collapsed = !panel.collapsed;
                }
            }
            ElementKind::TabHost(tabs) => {
                if point.y < rect.y + tabs.tab_height && !tabs.titles.is_empty() {
                    let tab_width = rect.width / tabs.titles.len() as f32;
                    let index = ((point.x - rect.x) / tab_width) as usize;
                    tabs.active = index.min(tabs.titles.len() - 1);
                }
            }
            _ => {}
        }
        true
    }

    /// Scroll the innermost list under the pointer.
    pub fn scroll(&mut self, point: Vec2, delta: f32) {
        let mut target = self.hit_test(point);
        while let Some(id) = target {
            let height = self.elements[id].screen_rect.height;
            if let ElementKind::List(list) = &mut self.elements[id].kind {
                list.scroll = (list.scroll - delta).clamp(0.0, list.max_scroll(height));
                return;
            }
            target = self.elements[id].parent;
        }
    }

    pub fn drain_events(&mut self) -> Vec<UiEvent> {
        std::mem::take(&mut self.events)
    }

    /// Draw the tree front to back. Modal children draw a translucent
    /// backdrop covering the parent's full rect before their own content.
    pub fn draw(&self, renderer: &mut dyn Renderer) {
        if self.elements.is_empty() {
            return;
        }
        self.draw_element(0, renderer);
    }

    fn draw_element(&self, id: ElementId, renderer: &mut dyn Renderer) {
        let element = &self.elements[id];
        if !element.visible {
            return;
        }
        let rect = element.screen_rect;

        if element.modal {
            if let Some(parent) = element.parent {
                renderer.fill_rect(self.elements[parent].screen_rect, BACKDROP_COLOR);
            }
        }

        match &element.kind {
            ElementKind::Panel => {
                if id != 0 {
                    renderer.fill_rect(rect, PANEL_COLOR);
                    renderer.draw_rect_outline(rect, PANEL_BORDER);
                }
            }
            ElementKind::Label { text } => {
                let color = if element.enabled {
                    TEXT_COLOR
                } else {
                    TEXT_DISABLED_COLOR
                };
                renderer.draw_text(Vec2::new(rect.x, rect.y), text, color, 1.0);
            }
            ElementKind::Button { label, .. } => {
                let color = if !element.enabled {
                    BUTTON_DISABLED_COLOR
                } else if element.hovered {
                    BUTTON_HOVER_COLOR
                } else {
                    BUTTON_COLOR
                };
                renderer.fill_rect(rect, color);
                renderer.draw_rect_outline(rect, PANEL_BORDER);
                let text_pos = Vec2::new(rect.x + 4.0, rect.y + (rect.height - 7.0) / 2.0);
                let text_color = if element.enabled {
                    TEXT_COLOR
                } else {
                    TEXT_DISABLED_COLOR
                };
                renderer.draw_text(text_pos, label, text_color, 1.0);
            }
            ElementKind::List(list) => {
                renderer.fill_rect(rect, PANEL_COLOR);
                if !list.auto_size && list.content_height > rect.height {
                    self.draw_scrollbar(renderer, rect, list);
                }
            }
            ElementKind::Collapsible(panel) => {
                renderer.fill_rect(rect, PANEL_COLOR);
                let header = Rect::new(rect.x, rect.y, rect.width, panel.header_height);
                renderer.fill_rect(header, HEADER_COLOR);
                let marker = if panel.collapsed { "+" } else { "-" };
                renderer.draw_text(
                    Vec2::new(rect.x + 4.0, rect.y + 4.0),
                    &format!("{} {}", marker, panel.title),
                    TEXT_COLOR,
                    1.0,
                );
                if panel.collapsed {
                    return;
                }
            }
            ElementKind::TabHost(tabs) => {
                renderer.fill_rect(rect, PANEL_COLOR);
                if !tabs.titles.is_empty() {
                    let tab_width = rect.width / tabs.titles.len() as f32;
                    for (i, title) in tabs.titles.iter().enumerate() {
                        let tab = Rect::new(
                            rect.x + tab_width * i as f32,
                            rect.y,
                            tab_width,
                            tabs.tab_height,
                        );
                        let color = if i == tabs.active {
                            BUTTON_HOVER_COLOR
                        } else {
                            HEADER_COLOR
                        };
                        renderer.fill_rect(tab, color);
                        renderer.draw_text(
                            Vec2::new(tab.x + 4.0, tab.y + 4.0),
                            title,
                            TEXT_COLOR,
                            1.0,
                        );
                    }
                }
            }
        }

        let clip = match &element.kind {
            ElementKind::List(list) if !list.auto_size => Some(rect),
            _ => None,
        };
        if let Some(clip_rect) = clip {
            renderer.push_clip(clip_rect);
        }
        for &child in &element.children {
            self.draw_element(child, renderer);
        }
        if clip.is_some() {
            renderer.pop_clip();
        }
    }

    fn draw_scrollbar(&self, renderer: &mut dyn Renderer, rect: Rect, list: &ListState) {
        let track = Rect::new(
            rect.right() - list.scrollbar_width,
            rect.y,
            list.scrollbar_width,
            rect.height,
        );
        renderer.fill_rect(track, SCROLLBAR_TRACK);
        let thumb_height = (rect.height / list.content_height * rect.height).max(12.0);
        let max_scroll = list.max_scroll(rect.height);
        let t = if max_scroll > 0.0 {
            list.scroll / max_scroll
        } else {
            0.0
        };
        let thumb = Rect::new(
            track.x + 1.0,
            track.y + t * (rect.height - thumb_height),
            track.width - 2.0,
            thumb_height,
        );
        renderer.fill_rect(thumb, SCROLLBAR_THUMB);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen() -> Rect {
        Rect::new(0.0, 0.0, 800.0, 600.0)
    }

    #[test]
    fn test_anchor_resolution() {
        assert_eq!(Anchor::fixed(10.0).resolve(200.0), 10.0);
        assert_eq!(Anchor::fraction(0.5).resolve(200.0), 100.0);
        assert_eq!(Anchor::mixed(-20.0, 1.0).resolve(200.0), 180.0);
    }

    #[test]
    fn test_basic_layout_from_parent() {
        let mut ui = UiTree::new();
        let root = ui.add_root();
        let panel = ui.add(
            root,
            ElementKind::Panel,
            Constraints {
                left: Anchor::mixed(-200.0, 1.0),
                top: Anchor::fixed(0.0),
                width: Anchor::fixed(200.0),
                height: Anchor::fraction(1.0),
            },
        );
        ui.recalculate(screen());
        let rect = ui.get(panel).screen_rect;
        assert_eq!(rect, Rect::new(600.0, 0.0, 200.0, 600.0));
    }

    #[test]
    fn test_recalculate_is_idempotent() {
        let mut ui = UiTree::new();
        let root = ui.add_root();
        let panel = ui.add(root, ElementKind::Panel, Constraints::fixed(10.0, 10.0, 300.0, 200.0));
        let list = ui.add(
            panel,
            ElementKind::List(ListState {
                auto_size: true,
                spacing: 5.0,
                ..ListState::default()
            }),
            Constraints::fixed(0.0, 0.0, 300.0, 0.0),
        );
        for _ in 0..3 {
            ui.add(
                list,
                ElementKind::Label {
                    text: "row".into(),
                },
                Constraints::fixed(0.0, 0.0, 280.0, 20.0),
            );
        }
        ui.recalculate(screen());
        let first: Vec<Rect> = (0..5).map(|i| ui.get(i).screen_rect).collect();
        ui.recalculate(screen());
        let second: Vec<Rect> = (0..5).map(|i| ui.get(i).screen_rect).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_list_auto_size_height() {
        let mut ui = UiTree::new();
        let root = ui.add_root();
        let list = ui.add(
            root,
            ElementKind::List(ListState {
                auto_size: true,
                spacing: 5.0,
                ..ListState::default()
            }),
            Constraints::fixed(0.0, 0.0, 200.0, 0.0),
        );
        for height in [20.0, 30.0, 15.0] {
            ui.add(
                list,
                ElementKind::Panel,
                Constraints::fixed(0.0, 0.0, 200.0, height),
            );
        }
        ui.recalculate(screen());
        // 20 + 30 + 15 plus two 5px gaps.
        assert_eq!(ui.get(list).screen_rect.height, 75.0);
    }

    #[test]
    fn test_list_stacks_children_with_spacing() {
        let mut ui = UiTree::new();
        let root = ui.add_root();
        let list = ui.add(
            root,
            ElementKind::List(ListState {
                auto_size: true,
                spacing: 5.0,
                ..ListState::default()
            }),
            Constraints::fixed(0.0, 0.0, 200.0, 0.0),
        );
        let a = ui.add(list, ElementKind::Panel, Constraints::fixed(0.0, 0.0, 200.0, 20.0));
        let hidden = ui.add(list, ElementKind::Panel, Constraints::fixed(0.0, 0.0, 200.0, 99.0));
        ui.get_mut(hidden).visible = false;
        let b = ui.add(list, ElementKind::Panel, Constraints::fixed(0.0, 0.0, 200.0, 30.0));
        ui.recalculate(screen());
        assert_eq!(ui.get(a).screen_rect.y, 0.0);
        // Hidden child contributes nothing.
        assert_eq!(ui.get(b).screen_rect.y, 25.0);
        assert_eq!(ui.get(list).screen_rect.height, 55.0);
    }

    #[test]
    fn test_list_scroll_clamped() {
        let mut ui = UiTree::new();
        let root = ui.add_root();
        let list = ui.add(
            root,
            ElementKind::List(ListState {
                spacing: 0.0,
                ..ListState::default()
            }),
            Constraints::fixed(0.0, 0.0, 200.0, 100.0),
        );
        for _ in 0..10 {
            ui.add(list, ElementKind::Panel, Constraints::fixed(0.0, 0.0, 180.0, 30.0));
        }
        if let ElementKind::List(state) = &mut ui.get_mut(list).kind {
            state.scroll = 9999.0;
        }
        ui.recalculate(screen());
        if let ElementKind::List(state) = &ui.get(list).kind {
            assert_eq!(state.content_height, 300.0);
            assert_eq!(state.scroll, 200.0);
        } else {
            panic!("not a list");
        }
    }

    #[test]
    fn test_modal_exclusivity_in_hit_test() {
        let mut ui = UiTree::new();
        let root = ui.add_root();
        let container = ui.add(root, ElementKind::Panel, Constraints::fixed(0.0, 0.0, 400.0, 400.0));
        let plain_a = ui.add(container, ElementKind::Panel, Constraints::fixed(0.0, 0.0, 100.0, 100.0));
        let plain_b = ui.add(container, ElementKind::Panel, Constraints::fixed(300.0, 0.0, 100.0, 100.0));
        let modal = ui.add(container, ElementKind::Panel, Constraints::fixed(150.0, 150.0, 100.0, 100.0));
        ui.get_mut(modal).modal = true;
        ui.recalculate(screen());

        // Point inside the modal resolves into the modal.
        assert_eq!(
            ui.element_at(container, Vec2::new(200.0, 200.0), true),
            Some(modal)
        );
        // Point inside a non-modal child never reaches that child.
        let hit = ui.element_at(container, Vec2::new(50.0, 50.0), true);
        assert_eq!(hit, Some(container));
        assert_ne!(hit, Some(plain_a));
        let hit = ui.element_at(container, Vec2::new(350.0, 50.0), false);
        assert_eq!(hit, None);
        assert_ne!(hit, Some(plain_b));

        // Hiding the modal restores normal hit-testing.
        ui.get_mut(modal).visible = false;
        assert_eq!(
            ui.element_at(container, Vec2::new(50.0, 50.0), true),
            Some(plain_a)
        );
    }

    #[test]
    fn test_first_visible_child_wins() {
        let mut ui = UiTree::new();
        let root = ui.add_root();
        let a = ui.add(root, ElementKind::Panel, Constraints::fixed(0.0, 0.0, 100.0, 100.0));
        let _b = ui.add(root, ElementKind::Panel, Constraints::fixed(50.0, 50.0, 100.0, 100.0));
        ui.recalculate(screen());
        assert_eq!(ui.hit_test(Vec2::new(75.0, 75.0)), Some(a));
    }

    #[test]
    fn test_button_click_emits_typed_event() {
        let mut ui = UiTree::new();
        let root = ui.add_root();
        let button = ui.add(
            root,
            ElementKind::Button {
                label: "Save".into(),
                action: UiAction::SaveState,
            },
            Constraints::fixed(10.0, 10.0, 80.0, 20.0),
        );
        ui.recalculate(screen());

        assert!(ui.click(Vec2::new(20.0, 20.0)));
        let events = ui.drain_events();
        assert_eq!(events, vec![UiEvent { element: button, action: UiAction::SaveState }]);
        // Queue drains once.
        assert!(ui.drain_events().is_empty());
    }

    #[test]
    fn test_disabled_button_emits_nothing() {
        let mut ui = UiTree::new();
        let root = ui.add_root();
        let button = ui.add(
            root,
            ElementKind::Button {
                label: "Save".into(),
                action: UiAction::SaveState,
            },
            Constraints::fixed(10.0, 10.0, 80.0, 20.0),
        );
        ui.get_mut(button).enabled = false;
        ui.recalculate(screen());
        ui.click(Vec2::new(20.0, 20.0));
        assert!(ui.drain_events().is_empty());
    }

    #[test]
    fn test_collapsible_header_click_toggles_and_resizes() {
        let mut ui = UiTree::new();
        let root = ui.add_root();
        let list = ui.add(
            root,
            ElementKind::List(ListState {
                auto_size: true,
                spacing: 0.0,
                ..ListState::default()
            }),
            Constraints::fixed(0.0, 0.0, 200.0, 0.0),
        );
        let panel = ui.add(
            list,
            ElementKind::Collapsible(CollapsibleState::new("Options")),
            Constraints::fixed(0.0, 0.0, 200.0, 0.0),
        );
        ui.add(panel, ElementKind::Panel, Constraints::fixed(0.0, 0.0, 200.0, 50.0));
        ui.recalculate(screen());
        assert_eq!(ui.get(list).screen_rect.height, 18.0 + 50.0);

        // Click the header, expect collapse and a smaller auto-size.
        assert!(ui.click(Vec2::new(10.0, 5.0)));
        ui.recalculate(screen());
        assert_eq!(ui.get(list).screen_rect.height, 18.0);

        // Clicking again expands back.
        assert!(ui.click(Vec2::new(10.0, 5.0)));
        ui.recalculate(screen());
        assert_eq!(ui.get(list).screen_rect.height, 68.0);
    }

    #[test]
    fn test_tab_host_shows_one_page() {
        let mut ui = UiTree::new();
        let root = ui.add_root();
        let tabs = ui.add(
            root,
            ElementKind::TabHost(TabState {
                titles: vec!["Rooms".into(), "Colors".into()],
                active: 0,
                tab_height: 16.0,
            }),
            Constraints::fixed(0.0, 0.0, 200.0, 200.0),
        );
        let page_a = ui.add(tabs, ElementKind::Panel, Constraints::fill());
        let page_b = ui.add(tabs, ElementKind::Panel, Constraints::fill());
        ui.recalculate(screen());
        assert!(ui.get(page_a).visible);
        assert!(!ui.get(page_b).visible);

        // Click the second tab.
        ui.click(Vec2::new(150.0, 8.0));
        ui.recalculate(screen());
        assert!(!ui.get(page_a).visible);
        assert!(ui.get(page_b).visible);
    }

    #[test]
    fn test_mutating_anchor_requires_recalculate() {
        let mut ui = UiTree::new();
        let root = ui.add_root();
        let panel = ui.add(root, ElementKind::Panel, Constraints::fixed(0.0, 0.0, 50.0, 50.0));
        ui.recalculate(screen());
        ui.get_mut(panel).constraints.left = Anchor::fixed(100.0);
        // Stale until recalculated.
        assert_eq!(ui.get(panel).screen_rect.x, 0.0);
        ui.recalculate(screen());
        assert_eq!(ui.get(panel).screen_rect.x, 100.0);
    }
}
