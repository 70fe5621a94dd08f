//! Moving the selection, by pointer or by keyboard.

use crate::bus::{Event, InteractionData, KeyData};
use crate::engine::Context;
use crate::geometry::{BoundingRect, limit_direction};
use crate::input::{InputEvent, KeyInput};
use crate::selector_area;
use crate::surface::{ElementId, Flag, RenderSurface};
use kurbo::{Point, Vec2};
use std::fmt;

/// Layer offset applied to dragged items while the drag lasts.
const DRAG_LAYER: i32 = 9999;

/// Speed multiplier for keyboard drags with shift held.
const SHIFT_BOOST: f64 = 2.5;

/// One movement step, as handed to the drag filter.
#[derive(Debug, Clone, PartialEq)]
pub struct DragMove {
    pub elements: Vec<ElementId>,
    pub direction: Vec2,
}

/// Hook that can rewrite a movement step before it is applied.
///
/// Pointer drags of a single item translate only the first element of the
/// returned step; keyboard drags translate every element in it.
pub type DragFilter = Box<dyn FnMut(DragMove) -> DragMove>;

/// Last sampled cursor position and scroll offset.
#[derive(Debug, Clone, Copy, Default)]
struct CursorHistory {
    cursor: Option<Point>,
    scroll: Option<Vec2>,
}

impl CursorHistory {
    fn seed(&mut self, cursor: Point, scroll: Vec2) {
        self.cursor = Some(cursor);
        self.scroll = Some(scroll);
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn cursor_diff(&mut self, current: Point) -> Vec2 {
        let diff = self.cursor.map_or(Vec2::ZERO, |prev| current - prev);
        self.cursor = Some(current);
        diff
    }

    fn scroll_diff(&mut self, current: Vec2) -> Vec2 {
        let diff = self.scroll.map_or(Vec2::ZERO, |prev| current - prev);
        self.scroll = Some(current);
        diff
    }
}

/// Drags the selected items.
///
/// Pointer drags follow the cursor plus any scrolling since the last tick,
/// clamped so the selection stays inside the area. Several items move as a
/// single drag proxy; a single item is moved itself. Keyboard drags step
/// every selected item by a fixed distance per key press.
#[derive(Default)]
pub struct Drag {
    active: bool,
    keyboard: bool,
    started: bool,
    elements: Vec<ElementId>,
    selection_rect: Option<BoundingRect>,
    history: CursorHistory,
    armed: Option<ElementId>,
    proxy_shown: bool,
    layered: bool,
    filter: Option<DragFilter>,
}

impl fmt::Debug for Drag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Drag")
            .field("active", &self.active)
            .field("keyboard", &self.keyboard)
            .field("elements", &self.elements)
            .field("selection_rect", &self.selection_rect)
            .field("armed", &self.armed)
            .field("proxy_shown", &self.proxy_shown)
            .field("filter", &self.filter.is_some())
            .finish()
    }
}

impl Drag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install (or remove) the movement filter.
    pub fn set_filter(&mut self, filter: Option<DragFilter>) {
        self.filter = filter;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Drop zone element currently armed under the pointer.
    pub fn armed(&self) -> Option<ElementId> {
        self.armed
    }

    /// Forget the armed zone. Used when the zones are replaced mid-drag,
    /// which already cleared their flags.
    pub fn disarm(&mut self) {
        if let Some(zone) = self.armed.take() {
            log::debug!("drop zone {zone:?} disarmed");
        }
    }

    pub fn handle(&mut self, event: &Event, cx: &mut Context<'_>) {
        match event {
            Event::InteractionStart(data) if data.is_dragging => self.start(data, cx),
            Event::InteractionUpdate(data) | Event::InteractionScroll(data)
                if data.is_dragging && !data.is_dragging_keyboard =>
            {
                self.update(cx)
            }
            Event::InteractionEnd(_) => self.stop(cx),
            Event::KeyDown(data) => self.key_down(data, cx),
            Event::KeyUp(data) => self.key_up(data, cx),
            _ => {}
        }
    }

    fn start(&mut self, data: &InteractionData, cx: &mut Context<'_>) {
        self.begin(cx);
        if !data.is_dragging_keyboard {
            return;
        }

        self.keyboard = true;
        self.started = true;
        for &element in &self.elements {
            cx.surface.set_flag(element, Flag::Dragging, true);
        }
        if let Some(InputEvent::Key(input)) = &data.input {
            if let Some(unit) = cx.settings.drag_keys.direction(&input.key) {
                self.keyboard_step(input, unit, cx);
            }
        }
    }

    fn begin(&mut self, cx: &mut Context<'_>) {
        self.active = true;
        self.keyboard = false;
        self.started = false;
        self.armed = None;
        self.elements = cx.selected.elements();
        self.selection_rect = cx.selected.bounding_rect(cx.now, &*cx.surface);
        self.history.seed(cx.pointer.current(), scroll_position(cx));

        if cx.settings.use_layers {
            for &element in &self.elements {
                cx.surface.adjust_layer(element, DRAG_LAYER);
            }
            self.layered = true;
        }
        log::debug!("dragging {} item(s)", self.elements.len());
    }

    fn update(&mut self, cx: &mut Context<'_>) {
        if !self.active || self.keyboard || self.elements.is_empty() {
            return;
        }
        if !self.started {
            self.started = true;
            for &element in &self.elements {
                cx.surface.set_flag(element, Flag::Dragging, true);
            }
            if self.elements.len() > 1 {
                cx.surface.show_drag_proxy(self.elements.len(), cx.pointer.initial());
                self.proxy_shown = true;
            }
        }

        let direction =
            self.history.cursor_diff(cx.pointer.current()) + self.history.scroll_diff(scroll_position(cx));
        self.arm_drop_zone(cx);
        let direction = self.limit(direction, cx);
        self.move_elements(direction, cx);
    }

    fn stop(&mut self, cx: &mut Context<'_>) {
        if !self.active {
            return;
        }
        if self.layered {
            for &element in &self.elements {
                cx.surface.adjust_layer(element, -DRAG_LAYER);
            }
        }
        for &element in &self.elements {
            cx.surface.set_flag(element, Flag::Dragging, false);
        }
        if let Some(zone) = self.armed.take() {
            cx.surface.set_flag(zone, Flag::DropArmed, false);
        }
        if self.proxy_shown {
            cx.surface.hide_drag_proxy();
        }

        self.active = false;
        self.keyboard = false;
        self.started = false;
        self.layered = false;
        self.proxy_shown = false;
        self.elements.clear();
        self.selection_rect = None;
        self.history.reset();
    }

    fn key_down(&mut self, data: &KeyData, cx: &mut Context<'_>) {
        if !cx.settings.keyboard_drag || !cx.settings.draggability {
            return;
        }
        let Some(unit) = cx.settings.drag_keys.direction(&data.key) else {
            return;
        };
        if self.active && self.keyboard {
            self.keyboard_step(&data.input, unit, cx);
        } else if !cx.interacting && !cx.selected.is_empty() {
            cx.bus.publish(Event::InteractionStartPre(InteractionData::keyboard(data.input.clone())));
        }
    }

    fn key_up(&mut self, data: &KeyData, cx: &mut Context<'_>) {
        if !self.active || !self.keyboard || cx.settings.drag_keys.direction(&data.key).is_none() {
            return;
        }
        cx.bus.publish(Event::InteractionEndPre(InteractionData::keyboard(data.input.clone())));
    }

    fn keyboard_step(&mut self, input: &KeyInput, unit: Vec2, cx: &mut Context<'_>) {
        let shift = input.modifiers.shift || cx.keys.is_pressed("shift");
        let boost = if shift { SHIFT_BOOST } else { 1.0 };
        let direction = unit * (cx.settings.keyboard_drag_speed * cx.settings.zoom * boost);
        let direction = self.limit(direction, cx);
        self.move_elements(direction, cx);

        let data = InteractionData::keyboard(input.clone());
        cx.bus.publish_pair(
            Event::InteractionUpdatePre(data.clone()),
            Event::InteractionUpdate(data),
        );
    }

    fn limit(&self, direction: Vec2, cx: &Context<'_>) -> Vec2 {
        match (selector_area::rect(&*cx.surface), self.selection_rect) {
            (Some(container), Some(selection)) => {
                limit_direction(direction, &container, cx.scroll.scroll_amount(), &selection)
            }
            _ => direction,
        }
    }

    fn move_elements(&mut self, direction: Vec2, cx: &mut Context<'_>) {
        let step = DragMove {
            elements: self.elements.clone(),
            direction,
        };
        let step = match self.filter.as_mut() {
            Some(filter) => filter(step),
            None => step,
        };
        if step.direction == Vec2::ZERO {
            return;
        }
        log::trace!("moving {} item(s) by {:?}", step.elements.len(), step.direction);

        if self.proxy_shown {
            cx.surface.translate_drag_proxy(step.direction);
        } else if self.keyboard {
            for &element in &step.elements {
                cx.surface.translate(element, step.direction);
            }
        } else if let Some(&first) = step.elements.first() {
            cx.surface.translate(first, step.direction);
        }
        self.selection_rect = self.selection_rect.map(|rect| rect.translate(step.direction));
    }

    /// Flag the ready drop zone under the pointer, ignoring the dragged items.
    fn arm_drop_zone(&mut self, cx: &mut Context<'_>) {
        let surface = &*cx.surface;
        let zone = surface
            .elements_from_point(cx.pointer.current())
            .into_iter()
            .filter(|element| !self.elements.contains(element))
            .find_map(|element| ready_zone(surface, element));
        if zone == self.armed {
            return;
        }

        if let Some(old) = self.armed.take() {
            cx.surface.set_flag(old, Flag::DropArmed, false);
        }
        if let Some(new) = zone {
            log::debug!("drop zone {new:?} armed");
            cx.surface.set_flag(new, Flag::DropArmed, true);
        }
        self.armed = zone;
    }
}

/// The element itself or its nearest ancestor flagged as a ready drop zone.
fn ready_zone(surface: &dyn RenderSurface, element: ElementId) -> Option<ElementId> {
    let mut current = Some(element);
    while let Some(el) = current {
        if surface.has_flag(el, Flag::DropReady) {
            return Some(el);
        }
        current = surface.parent(el);
    }
    None
}

/// Area plus window scroll, the content offset the drag has to follow.
fn scroll_position(cx: &Context<'_>) -> Vec2 {
    cx.scroll.current() + cx.scroll.scroll_amount_window()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::HeadlessSurface;

    #[test]
    fn test_history_first_diff_is_zero() {
        let mut history = CursorHistory::default();
        assert_eq!(history.cursor_diff(Point::new(10.0, 10.0)), Vec2::ZERO);
        assert_eq!(history.cursor_diff(Point::new(15.0, 8.0)), Vec2::new(5.0, -2.0));
        assert_eq!(history.scroll_diff(Vec2::new(0.0, 30.0)), Vec2::ZERO);
        assert_eq!(history.scroll_diff(Vec2::new(0.0, 45.0)), Vec2::new(0.0, 15.0));
    }

    #[test]
    fn test_history_seeded() {
        let mut history = CursorHistory::default();
        history.seed(Point::new(100.0, 100.0), Vec2::ZERO);
        assert_eq!(history.cursor_diff(Point::new(120.0, 90.0)), Vec2::new(20.0, -10.0));
        history.reset();
        assert_eq!(history.cursor_diff(Point::new(0.0, 0.0)), Vec2::ZERO);
    }

    #[test]
    fn test_ready_zone_walks_ancestors() {
        let mut surface = HeadlessSurface::new();
        surface.add_element(ElementId(10), BoundingRect::new(0.0, 0.0, 100.0, 100.0));
        surface.add_element(ElementId(11), BoundingRect::new(10.0, 10.0, 10.0, 10.0));
        surface.set_parent(ElementId(11), ElementId(10));

        assert_eq!(ready_zone(&surface, ElementId(11)), None);
        surface.set_flag(ElementId(10), Flag::DropReady, true);
        assert_eq!(ready_zone(&surface, ElementId(11)), Some(ElementId(10)));
        assert_eq!(ready_zone(&surface, ElementId(10)), Some(ElementId(10)));
    }
}
