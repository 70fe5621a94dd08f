//! Input events delivered by the host for mouse/touch/keyboard interaction.

use crate::surface::ElementId;
use kurbo::Point;
use serde::Serialize;

// Use web_time for WASM compatibility
#[cfg(target_arch = "wasm32")]
use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum MouseButton {
    #[default]
    Left,
    Middle,
    /// The secondary button. Presses with it never start an interaction.
    Right,
}

/// Modifier keys state carried by an input event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub fn shift() -> Self {
        Self { shift: true, ..Self::default() }
    }

    pub fn ctrl() -> Self {
        Self { ctrl: true, ..Self::default() }
    }

    pub fn is_empty(&self) -> bool {
        !(self.shift || self.ctrl || self.alt || self.meta)
    }
}

/// Where a pointer event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PointerSource {
    #[default]
    Mouse,
    Touch,
}

/// Phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
}

/// A pointer (mouse or touch) event in viewport coordinates.
#[derive(Debug, Clone, Serialize)]
pub struct PointerInput {
    pub phase: PointerPhase,
    pub source: PointerSource,
    pub position: Point,
    pub button: MouseButton,
    pub modifiers: Modifiers,
    /// Element the event was dispatched to, if any.
    pub target: Option<ElementId>,
    /// Click count; `0` for synthetic clicks generated by the keyboard.
    pub detail: u32,
    #[serde(skip)]
    pub timestamp: Instant,
}

impl PointerInput {
    /// Create a left-button mouse event.
    pub fn new(phase: PointerPhase, position: Point, timestamp: Instant) -> Self {
        Self {
            phase,
            source: PointerSource::Mouse,
            position,
            button: MouseButton::Left,
            modifiers: Modifiers::default(),
            target: None,
            detail: 1,
            timestamp,
        }
    }

    pub fn with_target(mut self, target: ElementId) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }

    pub fn with_source(mut self, source: PointerSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_detail(mut self, detail: u32) -> Self {
        self.detail = detail;
        self
    }

    /// Activation generated by the keyboard (enter/space on a focused item):
    /// no coordinates, no click count, but a target.
    pub fn is_keyboard_click(&self) -> bool {
        self.position == Point::ZERO && self.detail == 0 && self.target.is_some()
    }
}

/// Phase of a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KeyPhase {
    Down,
    Up,
}

/// A keyboard event.
#[derive(Debug, Clone, Serialize)]
pub struct KeyInput {
    pub phase: KeyPhase,
    /// Key name as reported by the host (e.g. `"Shift"`, `"ArrowUp"`, `"a"`).
    pub key: String,
    pub modifiers: Modifiers,
    /// Focused element, if any.
    pub target: Option<ElementId>,
    #[serde(skip)]
    pub timestamp: Instant,
}

impl KeyInput {
    pub fn new(phase: KeyPhase, key: impl Into<String>, timestamp: Instant) -> Self {
        Self {
            phase,
            key: key.into(),
            modifiers: Modifiers::default(),
            target: None,
            timestamp,
        }
    }

    pub fn with_target(mut self, target: ElementId) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Lowercased key name, the form every key comparison uses.
    pub fn normalized_key(&self) -> String {
        self.key.to_lowercase()
    }
}

/// Which surface scrolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScrollTarget {
    /// The bounded interaction area.
    Area,
    /// The window/document.
    Window,
}

/// An input event delivered by the host.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InputEvent {
    Pointer(PointerInput),
    Key(KeyInput),
    /// A native click (or keyboard activation) on an element.
    Click(PointerInput),
    Scroll {
        target: ScrollTarget,
        #[serde(skip)]
        timestamp: Instant,
    },
    /// The window lost focus.
    Blur {
        #[serde(skip)]
        timestamp: Instant,
    },
}

impl InputEvent {
    pub fn timestamp(&self) -> Instant {
        match self {
            Self::Pointer(input) | Self::Click(input) => input.timestamp,
            Self::Key(input) => input.timestamp,
            Self::Scroll { timestamp, .. } | Self::Blur { timestamp } => *timestamp,
        }
    }

    /// Modifier state, when the event carries one.
    pub fn modifiers(&self) -> Option<Modifiers> {
        match self {
            Self::Pointer(input) | Self::Click(input) => Some(input.modifiers),
            Self::Key(input) => Some(input.modifiers),
            _ => None,
        }
    }

    /// Element the event was dispatched to, if any.
    pub fn target(&self) -> Option<ElementId> {
        match self {
            Self::Pointer(input) | Self::Click(input) => input.target,
            Self::Key(input) => input.target,
            _ => None,
        }
    }

    pub fn as_pointer(&self) -> Option<&PointerInput> {
        match self {
            Self::Pointer(input) | Self::Click(input) => Some(input),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyboard_click_detection() {
        let now = Instant::now();
        let click = PointerInput::new(PointerPhase::Up, Point::ZERO, now)
            .with_detail(0)
            .with_target(ElementId(3));
        assert!(click.is_keyboard_click());

        let mouse = PointerInput::new(PointerPhase::Up, Point::ZERO, now).with_target(ElementId(3));
        assert!(!mouse.is_keyboard_click());

        let untargeted = PointerInput::new(PointerPhase::Up, Point::ZERO, now).with_detail(0);
        assert!(!untargeted.is_keyboard_click());
    }

    #[test]
    fn test_modifiers() {
        assert!(Modifiers::default().is_empty());
        assert!(!Modifiers::shift().is_empty());
        assert!(Modifiers::ctrl().ctrl);
    }

    #[test]
    fn test_event_accessors() {
        let now = Instant::now();
        let key = InputEvent::Key(
            KeyInput::new(KeyPhase::Down, "ArrowUp", now)
                .with_target(ElementId(7))
                .with_modifiers(Modifiers::shift()),
        );
        assert_eq!(key.target(), Some(ElementId(7)));
        assert_eq!(key.modifiers(), Some(Modifiers::shift()));
        assert!(key.as_pointer().is_none());

        let blur = InputEvent::Blur { timestamp: now };
        assert_eq!(blur.timestamp(), now);
        assert_eq!(blur.modifiers(), None);
    }
}
