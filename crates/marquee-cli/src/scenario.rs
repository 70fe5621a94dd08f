//! Scripted input scenarios.
//!
//! A scenario describes a headless layout (area, items, drop zones) and a
//! list of timed steps. Replaying it feeds each step into an [`Engine`] and
//! collects every event the engine publishes.
//!
//! ```json
//! {
//!   "settings": { "immediateDrag": true },
//!   "area": { "left": 0, "top": 0, "width": 500, "height": 500 },
//!   "items": [{ "id": 1, "rect": { "left": 20, "top": 20, "width": 40, "height": 40 } }],
//!   "zones": [{ "id": "trash", "element": 100, "rect": { "left": 300, "top": 300, "width": 100, "height": 100 } }],
//!   "steps": [
//!     { "at": 0, "type": "down", "x": 40, "y": 40, "target": 1 },
//!     { "at": 16, "type": "move", "x": 350, "y": 350 },
//!     { "at": 32, "type": "up", "x": 350, "y": 350 }
//!   ]
//! }
//! ```

use kurbo::{Point, Size, Vec2};
use marquee_core::{
    BoundingRect, ConfigError, DropZoneConfig, ElementId, Engine, Event, HeadlessSurface, InputEvent, KeyInput,
    KeyPhase, Modifiers, MouseButton, PointerInput, PointerPhase, RenderSurface, ScrollTarget, Settings, Topic,
};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Scenario errors.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("Failed to read scenario: {0}")]
    Io(#[from] std::io::Error),
    #[error("Scenario JSON error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Step {index} targets unknown element {element:?}")]
    UnknownElement { index: usize, element: ElementId },
}

/// Result type for scenario operations.
pub type ScenarioResult<T> = Result<T, ScenarioError>;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    #[serde(default)]
    pub settings: Settings,
    pub area: BoundingRect,
    #[serde(default)]
    pub viewport: Option<Size>,
    /// How far the area itself can scroll on each axis.
    #[serde(default)]
    pub area_scroll_limit: Option<Vec2>,
    #[serde(default)]
    pub items: Vec<ScenarioItem>,
    #[serde(default)]
    pub zones: Vec<ScenarioZone>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioItem {
    pub id: ElementId,
    pub rect: BoundingRect,
    #[serde(default)]
    pub group: Option<ElementId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioZone {
    pub id: String,
    pub element: ElementId,
    pub rect: BoundingRect,
    #[serde(default)]
    pub droppables: Option<Vec<ElementId>>,
}

/// One timed step. `at` is milliseconds since the replay started.
#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub at: u64,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Down(PointerStep),
    Move(PointerStep),
    Up(PointerStep),
    Click(PointerStep),
    KeyDown(KeyStep),
    KeyUp(KeyStep),
    /// Scroll the window (or the area) by `dx`/`dy`, then report it.
    Scroll {
        #[serde(default)]
        area: bool,
        #[serde(default)]
        dx: f64,
        #[serde(default)]
        dy: f64,
    },
    Blur,
    /// Only advance time, letting due timers fire.
    Tick,
    Select { items: Vec<ElementId> },
    ClearSelection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PointerStep {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub target: Option<ElementId>,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub right: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeyStep {
    pub key: String,
    #[serde(default)]
    pub target: Option<ElementId>,
    #[serde(default)]
    pub shift: bool,
}

/// An event published during the replay, stamped with the step time.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    pub at: u64,
    pub event: Event,
}

/// Final engine state after a replay.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub selection: Vec<ElementId>,
    pub dropped: Vec<(String, Vec<ElementId>)>,
    pub offsets: Vec<(ElementId, Vec2)>,
    pub window_scroll: Vec2,
}

impl PointerStep {
    fn modifiers(&self) -> Modifiers {
        Modifiers {
            shift: self.shift,
            ctrl: self.ctrl,
            ..Modifiers::default()
        }
    }

    fn input(&self, phase: PointerPhase, timestamp: Instant) -> PointerInput {
        let mut input = PointerInput::new(phase, Point::new(self.x, self.y), timestamp).with_modifiers(self.modifiers());
        if self.right {
            input = input.with_button(MouseButton::Right);
        }
        if let Some(target) = self.target {
            input = input.with_target(target);
        }
        input
    }
}

impl KeyStep {
    fn input(&self, phase: KeyPhase, timestamp: Instant) -> KeyInput {
        let mut input = KeyInput::new(phase, self.key.as_str(), timestamp).with_modifiers(Modifiers {
            shift: self.shift,
            ..Modifiers::default()
        });
        if let Some(target) = self.target {
            input = input.with_target(target);
        }
        input
    }
}

impl Scenario {
    pub fn load(path: &Path) -> ScenarioResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> ScenarioResult<Self> {
        let scenario: Self = serde_json::from_str(json)?;
        scenario.settings.validate()?;
        scenario.check_targets()?;
        Ok(scenario)
    }

    fn check_targets(&self) -> ScenarioResult<()> {
        let known = |id: ElementId| self.items.iter().any(|item| item.id == id) || self.zones.iter().any(|z| z.element == id);
        for (index, step) in self.steps.iter().enumerate() {
            let target = match &step.action {
                Action::Down(p) | Action::Move(p) | Action::Up(p) | Action::Click(p) => p.target,
                Action::KeyDown(k) | Action::KeyUp(k) => k.target,
                _ => None,
            };
            if let Some(element) = target.filter(|&id| !known(id)) {
                return Err(ScenarioError::UnknownElement { index, element });
            }
        }
        Ok(())
    }

    /// Build the surface and engine described by the scenario.
    pub fn engine(&self) -> Engine<HeadlessSurface> {
        let mut surface = HeadlessSurface::new().with_area(self.area);
        if let Some(viewport) = self.viewport {
            surface = surface.with_viewport(viewport);
        }
        if let Some(limit) = self.area_scroll_limit {
            surface = surface.with_area_scroll_limit(limit);
        }
        for item in &self.items {
            surface.add_element(item.id, item.rect);
        }
        for zone in &self.zones {
            surface.add_element(zone.element, zone.rect);
        }

        let mut engine = Engine::new(surface, self.settings.clone());
        engine.add_selectables(self.items.iter().map(|item| (item.id, item.group)));
        engine.set_drop_zones(
            self.zones
                .iter()
                .map(|zone| DropZoneConfig {
                    id: zone.id.clone(),
                    element: zone.element,
                    droppables: zone.droppables.clone(),
                })
                .collect(),
        );
        engine
    }

    /// Replay every step. Timer events are only recorded with `timers` set.
    pub fn run(&self, timers: bool) -> (Vec<Record>, Summary) {
        let mut engine = self.engine();
        let start = Instant::now();

        let current = Rc::new(RefCell::new(0u64));
        let records = Rc::new(RefCell::new(Vec::new()));
        for topic in Topic::ALL {
            if topic == Topic::TimerFired && !timers {
                continue;
            }
            let at = Rc::clone(&current);
            let sink = Rc::clone(&records);
            engine.subscribe(topic, move |event| {
                sink.borrow_mut().push(Record {
                    at: *at.borrow(),
                    event: event.clone(),
                });
            });
        }

        for step in &self.steps {
            *current.borrow_mut() = step.at;
            let now = start + Duration::from_millis(step.at);
            engine.tick(now);
            apply(&mut engine, &step.action, now);
        }

        let summary = Summary {
            selection: engine.selection(),
            dropped: self
                .zones
                .iter()
                .map(|zone| (zone.id.clone(), engine.items_dropped(&zone.id).unwrap_or_default()))
                .collect(),
            offsets: self
                .items
                .iter()
                .map(|item| (item.id, engine.surface().offset(item.id)))
                .filter(|(_, offset)| *offset != Vec2::ZERO)
                .collect(),
            window_scroll: engine.surface().window_scroll(),
        };
        engine.stop();

        let records = records.borrow().clone();
        (records, summary)
    }
}

fn apply(engine: &mut Engine<HeadlessSurface>, action: &Action, now: Instant) {
    match action {
        Action::Down(p) => engine.handle_input(InputEvent::Pointer(p.input(PointerPhase::Down, now))),
        Action::Move(p) => engine.handle_input(InputEvent::Pointer(p.input(PointerPhase::Move, now))),
        Action::Up(p) => engine.handle_input(InputEvent::Pointer(p.input(PointerPhase::Up, now))),
        Action::Click(p) => engine.handle_input(InputEvent::Click(p.input(PointerPhase::Up, now))),
        Action::KeyDown(k) => engine.handle_input(InputEvent::Key(k.input(KeyPhase::Down, now))),
        Action::KeyUp(k) => engine.handle_input(InputEvent::Key(k.input(KeyPhase::Up, now))),
        Action::Scroll { area, dx, dy } => {
            let delta = Vec2::new(*dx, *dy);
            let target = if *area {
                engine.surface_mut().scroll_area_by(delta);
                ScrollTarget::Area
            } else {
                engine.surface_mut().scroll_window_by(delta);
                ScrollTarget::Window
            };
            engine.handle_input(InputEvent::Scroll { target, timestamp: now });
        }
        Action::Blur => engine.handle_input(InputEvent::Blur { timestamp: now }),
        Action::Tick => {}
        Action::Select { items } => engine.select(items),
        Action::ClearSelection => engine.clear_selection(),
    }
}
