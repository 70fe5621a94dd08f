//! The interaction state machine.
//!
//! `idle -> interacting (selecting | dragging) -> idle`. Raw pointer events
//! come in as `Pointer:*` topics. Interaction gates and classifies them and
//! republishes the `Interaction:*` lifecycle every other component reacts to.
//! Each transition goes through its `:pre` topic first, so subscribers of the
//! pre event run before the authoritative one is published.

use crate::bus::{Event, InteractionData};
use crate::engine::Context;
use crate::input::{InputEvent, MouseButton, PointerInput};
use crate::selection::shift_range;
use crate::selector_area;
use crate::surface::{ElementId, ListenerGroup};
use kurbo::Point;

/// State of one press-move-release cycle.
#[derive(Debug, Clone)]
struct InteractionSession {
    start: Point,
    is_dragging: bool,
    is_keyboard: bool,
    last_input: Option<InputEvent>,
}

impl InteractionSession {
    fn data(&self, input: Option<InputEvent>) -> InteractionData {
        InteractionData {
            input,
            is_dragging: self.is_dragging,
            is_dragging_keyboard: self.is_keyboard,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Interaction {
    session: Option<InteractionSession>,
}

impl Interaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_interacting(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_dragging(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_dragging)
    }

    pub fn is_dragging_keyboard(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_keyboard)
    }

    /// Drop the session without publishing anything.
    pub fn stop(&mut self) {
        self.session = None;
    }

    pub fn handle(&mut self, event: &Event, cx: &mut Context<'_>) {
        match event {
            Event::InteractionInitPre => self.init(cx),
            Event::PointerDown(input) => {
                if cx.listeners.is_active(ListenerGroup::AreaPress) {
                    let data = InteractionData::pointer(input.clone(), self.is_dragging());
                    cx.bus.publish(Event::InteractionStartPre(data));
                }
            }
            Event::InteractionStartPre(data) => self.start(data, cx),
            Event::PointerUpdated(input) => self.update(input.clone(), cx),
            Event::AreaScroll { .. } => {
                // The content moved under a still pointer.
                let last = self.session.as_ref().and_then(|s| s.last_input.clone());
                if let Some(InputEvent::Pointer(mut input)) = last {
                    input.position = cx.pointer.current();
                    self.update(input, cx);
                }
            }
            Event::PointerUp(input) => {
                if cx.listeners.is_active(ListenerGroup::DocumentRelease) {
                    self.reset(Some(InputEvent::Pointer(input.clone())), cx);
                }
            }
            Event::InteractionEndPre(data) => self.end(data, cx),
            Event::WindowScroll => {
                if cx.listeners.is_active(ListenerGroup::BodyScroll) {
                    if let Some(session) = &self.session {
                        let data = session.data(session.last_input.clone());
                        cx.bus.publish_pair(
                            Event::InteractionScrollPre(data.clone()),
                            Event::InteractionScroll(data),
                        );
                    }
                }
            }
            Event::Blur => {
                let last = self.session.as_ref().map(|s| s.last_input.clone());
                if let Some(input) = last {
                    log::debug!("window lost focus, ending interaction");
                    self.reset(input, cx);
                }
            }
            Event::Click(input) => self.on_click(input, cx),
            _ => {}
        }
    }

    fn init(&mut self, cx: &mut Context<'_>) {
        self.session = None;
        cx.surface.show_selector(None);
        for group in [
            ListenerGroup::AreaPress,
            ListenerGroup::BodyScroll,
            ListenerGroup::DocumentRelease,
        ] {
            cx.listen(group, false);
        }
        cx.listen(ListenerGroup::AreaPress, true);
        cx.listen(ListenerGroup::BodyScroll, true);
        cx.bus.publish(Event::InteractionInit);
    }

    fn start(&mut self, data: &InteractionData, cx: &mut Context<'_>) {
        if data.is_dragging_keyboard {
            if self.session.is_some() {
                return;
            }
            log::debug!("keyboard drag started");
            self.session = Some(InteractionSession {
                start: Point::ZERO,
                is_dragging: true,
                is_keyboard: true,
                last_input: data.input.clone(),
            });
            cx.bus.publish(Event::InteractionStart(data.clone()));
            return;
        }

        let Some(InputEvent::Pointer(input)) = &data.input else {
            return;
        };
        if !self.can_interact(input, cx) {
            return;
        }
        let is_dragging = self.is_drag_event(input, cx);
        log::debug!(
            "interaction started at {:?} ({})",
            input.position,
            if is_dragging { "drag" } else { "select" }
        );

        self.session = Some(InteractionSession {
            start: input.position,
            is_dragging,
            is_keyboard: false,
            last_input: Some(InputEvent::Pointer(input.clone())),
        });
        cx.bus.publish(Event::InteractionStart(InteractionData::pointer(
            input.clone(),
            is_dragging,
        )));
        cx.listen(ListenerGroup::DocumentRelease, true);
    }

    /// Gate for pointer starts and modifier clicks.
    fn can_interact(&self, input: &PointerInput, cx: &Context<'_>) -> bool {
        if input.button == MouseButton::Right || self.session.is_some() {
            return false;
        }
        if let Some(target) = input.target {
            if !selector_area::is_inside(&*cx.surface, cx.scroll, target) {
                return false;
            }
        }
        input.is_keyboard_click() || selector_area::is_clicked(&*cx.surface, input.position)
    }

    /// A press is a drag when it lands on a selected item with no
    /// multi-select modifier held.
    fn is_drag_event(&self, input: &PointerInput, cx: &mut Context<'_>) -> bool {
        let modifiers = Some(input.modifiers);
        if !cx.settings.draggability
            || cx.keys.is_shift_pressed(modifiers)
            || cx.keys.is_ctrl_or_meta_pressed(modifiers)
        {
            return false;
        }
        let Some(item) = pressed_item(input, cx) else {
            return false;
        };

        if cx.settings.immediate_drag && !cx.selected.contains(item) {
            let (selected, mut env) = cx.split();
            selected.clear(&mut env);
            selected.add(item, &mut env);
        }
        cx.selected.contains(item)
    }

    fn update(&mut self, input: PointerInput, cx: &mut Context<'_>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.is_keyboard {
            return;
        }
        let threshold = cx.settings.drag_threshold;
        let delta = input.position - session.start;
        // Movement past the threshold on either axis is enough.
        if delta.x.abs() <= threshold && delta.y.abs() <= threshold {
            return;
        }

        session.last_input = Some(InputEvent::Pointer(input.clone()));
        let data = InteractionData::pointer(input, session.is_dragging);
        cx.bus.publish_pair(
            Event::InteractionUpdatePre(data.clone()),
            Event::InteractionUpdate(data),
        );
    }

    fn reset(&mut self, input: Option<InputEvent>, cx: &mut Context<'_>) {
        if let Some(session) = &self.session {
            cx.bus.publish(Event::InteractionEndPre(session.data(input)));
        }
    }

    fn end(&mut self, data: &InteractionData, cx: &mut Context<'_>) {
        let Some(session) = self.session.take() else {
            return;
        };
        cx.listen(ListenerGroup::DocumentRelease, false);
        log::debug!("interaction ended (dragging: {})", session.is_dragging);
        cx.bus.publish(Event::InteractionEnd(InteractionData {
            input: data.input.clone(),
            is_dragging: session.is_dragging,
            is_dragging_keyboard: session.is_keyboard,
        }));
    }

    /// Modifier clicks: shift extends to a range, ctrl/meta toggles.
    fn on_click(&mut self, input: &PointerInput, cx: &mut Context<'_>) {
        if cx.listeners.is_active(ListenerGroup::ClickCapture) {
            log::trace!("click swallowed after rectangle selection");
            return;
        }
        if !self.can_interact(input, cx) {
            return;
        }
        let modifiers = Some(input.modifiers);
        let is_shift = cx.keys.is_shift_pressed(modifiers);
        let is_ctrl = cx.keys.is_ctrl_or_meta_pressed(modifiers);
        if !is_shift && !is_ctrl {
            return;
        }
        let Some(item) = input.target.and_then(|t| cx.selectables.closest(&*cx.surface, t)) else {
            return;
        };

        let (selected, mut env) = cx.split();
        if is_shift {
            let range = shift_range(item, &selected.elements(), &env.selectables.ordered());
            selected.add_all(&range, &mut env);
        } else {
            selected.toggle(item, &mut env);
        }
    }
}

/// Selectable under the press: from the event target, falling back to hit
/// testing at the press position.
fn pressed_item(input: &PointerInput, cx: &Context<'_>) -> Option<ElementId> {
    let surface = &*cx.surface;
    match input.target {
        Some(target) => cx.selectables.closest(surface, target),
        None => surface
            .elements_from_point(input.position)
            .into_iter()
            .find_map(|element| cx.selectables.closest(surface, element)),
    }
}
