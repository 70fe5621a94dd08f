//! Render surface abstraction.
//!
//! The engine never touches a UI toolkit directly. Everything it needs from
//! the host (rectangles, visual flags, hit testing, scrolling, listener
//! registration) goes through [`RenderSurface`].

mod headless;

pub use headless::HeadlessSurface;

use crate::geometry::BoundingRect;
use kurbo::{Insets, Point, Size, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Opaque handle to a host element (selectable item, drop zone, area child).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub u64);

/// Named boolean markers the engine sets on host elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Flag {
    Selectable,
    Selected,
    /// First member of a contiguous run of selected items.
    SelectedFirst,
    /// Last member of a contiguous run of selected items.
    SelectedLast,
    /// Inner member of a contiguous run of selected items.
    SelectedIntermediate,
    Dragging,
    /// Drop zone accepts the items currently being dragged.
    DropReady,
    /// Drop zone is under the pointer and would receive the drop.
    DropArmed,
}

/// Groups of native listeners the engine asks the host to (un)register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ListenerGroup {
    /// Pointer-down / touch-start on the area.
    AreaPress,
    /// Pointer-up / touch-end on the document, only during a gesture.
    DocumentRelease,
    /// Document/window scroll.
    BodyScroll,
    /// Key-down / key-up / window blur.
    Keyboard,
    /// Capture-phase click swallowing after a rectangle selection.
    ClickCapture,
}

/// Capabilities the host environment provides to the engine.
pub trait RenderSurface {
    /// Current rectangle of an element in viewport coordinates.
    fn rect(&self, element: ElementId) -> Option<BoundingRect>;

    /// Structural parent of an element.
    fn parent(&self, element: ElementId) -> Option<ElementId>;

    /// Whether the element lives inside the bounded area.
    fn contains(&self, element: ElementId) -> bool;

    /// Elements under a point, topmost first.
    fn elements_from_point(&self, point: Point) -> Vec<ElementId>;

    fn set_flag(&mut self, element: ElementId, flag: Flag, on: bool);

    fn has_flag(&self, element: ElementId, flag: Flag) -> bool;

    /// Bump an element's stacking layer by `delta`.
    fn adjust_layer(&mut self, element: ElementId, delta: i32);

    /// Move an element visually by `by`.
    fn translate(&mut self, element: ElementId, by: Vec2);

    /// Rectangle of the bounded area in viewport coordinates.
    fn area_rect(&self) -> Option<BoundingRect>;

    /// Border widths of the bounded area.
    fn area_border(&self) -> Insets;

    /// Current scroll offset of the bounded area.
    fn area_scroll(&self) -> Vec2;

    /// Whether the bounded area has scrollable overflow.
    fn can_scroll(&self) -> bool;

    fn scroll_area_by(&mut self, delta: Vec2);

    /// Current scroll offset of the window.
    fn window_scroll(&self) -> Vec2;

    fn scroll_window_by(&mut self, delta: Vec2);

    /// Size of the visible viewport.
    fn viewport(&self) -> Size;

    /// Register or unregister a group of native listeners.
    fn listen(&mut self, group: ListenerGroup, on: bool);

    /// Show the selection rectangle (area-relative), or hide it with `None`.
    fn show_selector(&mut self, rect: Option<BoundingRect>);

    /// Show the stand-in visual for `count` dragged items at `at`.
    fn show_drag_proxy(&mut self, count: usize, at: Point);

    fn translate_drag_proxy(&mut self, by: Vec2);

    fn hide_drag_proxy(&mut self);
}

/// Listener groups currently registered with the surface.
#[derive(Debug, Clone, Default)]
pub struct ListenerSet {
    active: HashSet<ListenerGroup>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or unregister a group, telling the surface only on change.
    pub fn set(&mut self, surface: &mut dyn RenderSurface, group: ListenerGroup, on: bool) {
        if on {
            if self.active.insert(group) {
                surface.listen(group, true);
            }
        } else if self.active.remove(&group) {
            surface.listen(group, false);
        }
    }

    pub fn is_active(&self, group: ListenerGroup) -> bool {
        self.active.contains(&group)
    }

    /// Unregister everything.
    pub fn clear(&mut self, surface: &mut dyn RenderSurface) {
        for group in self.active.drain() {
            surface.listen(group, false);
        }
    }
}
