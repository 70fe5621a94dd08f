//! The engine: owns every component and drives the bus.

use crate::bus::{Component, Event, EventBus, InteractionData, Subscriber, SubscriptionId, Topic};
use crate::drag::{Drag, DragFilter, DragMove};
use crate::drop_zones::{DropZoneConfig, DropZones};
use crate::error::ConfigResult;
use crate::geometry::BoundingRect;
use crate::input::{InputEvent, KeyPhase, PointerPhase, ScrollTarget};
use crate::interaction::Interaction;
use crate::selectable::SelectableSet;
use crate::selected::{SelectedSet, SetEnv};
use crate::selection::Selection;
use crate::selector::Selector;
use crate::selector_area::SelectorArea;
use crate::settings::Settings;
use crate::stores::{KeyStore, PointerStore, ScrollStore};
use crate::surface::{ElementId, ListenerGroup, ListenerSet, RenderSurface};
use crate::timers::Timers;
use kurbo::Point;

// Use web_time for WASM compatibility
#[cfg(target_arch = "wasm32")]
use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

/// Topics each component listens to, in subscription order.
const ROUTES: [(Component, &[Topic]); 9] = [
    (
        Component::KeyStore,
        &[Topic::InteractionInit, Topic::Blur, Topic::TimerFired],
    ),
    (
        Component::ScrollStore,
        &[
            Topic::InteractionStart,
            Topic::InteractionEnd,
            Topic::WindowScroll,
            Topic::AreaScroll,
        ],
    ),
    (Component::PointerStore, &[Topic::InteractionStart]),
    (
        Component::Interaction,
        &[
            Topic::InteractionInitPre,
            Topic::PointerDown,
            Topic::InteractionStartPre,
            Topic::PointerUpdated,
            Topic::AreaScroll,
            Topic::PointerUp,
            Topic::InteractionEndPre,
            Topic::WindowScroll,
            Topic::Blur,
            Topic::Click,
        ],
    ),
    (
        Component::SelectorArea,
        &[Topic::InteractionStart, Topic::InteractionEnd, Topic::TimerFired],
    ),
    (
        Component::Selector,
        &[
            Topic::InteractionInit,
            Topic::InteractionStart,
            Topic::InteractionUpdate,
            Topic::InteractionEnd,
            Topic::InteractionScrollPre,
            Topic::TimerFired,
        ],
    ),
    (
        Component::Selection,
        &[Topic::InteractionStart, Topic::SelectorUpdated, Topic::InteractionEnd],
    ),
    (
        Component::Drag,
        &[
            Topic::InteractionStart,
            Topic::InteractionUpdate,
            Topic::InteractionScroll,
            Topic::InteractionEnd,
            Topic::KeyDown,
            Topic::KeyUp,
        ],
    ),
    (
        Component::DropZones,
        &[Topic::InteractionStart, Topic::InteractionEnd],
    ),
];

/// What a component handler may touch while an event is delivered.
pub struct Context<'a> {
    pub now: Instant,
    /// Whether a gesture was running when the event was delivered.
    pub interacting: bool,
    pub settings: &'a Settings,
    pub bus: &'a mut EventBus,
    pub timers: &'a mut Timers,
    pub listeners: &'a mut ListenerSet,
    pub surface: &'a mut dyn RenderSurface,
    pub keys: &'a KeyStore,
    pub scroll: &'a ScrollStore,
    pub pointer: &'a PointerStore,
    pub selectables: &'a SelectableSet,
    pub selected: &'a mut SelectedSet,
}

impl Context<'_> {
    /// The selected set together with what its mutations need.
    pub fn split(&mut self) -> (&mut SelectedSet, SetEnv<'_>) {
        (
            &mut *self.selected,
            SetEnv {
                bus: &mut *self.bus,
                surface: &mut *self.surface,
                selectables: self.selectables,
            },
        )
    }

    pub fn listen(&mut self, group: ListenerGroup, on: bool) {
        self.listeners.set(&mut *self.surface, group, on);
    }
}

/// Selection and drag engine bound to a render surface.
///
/// The host feeds raw input through [`Engine::handle_input`] and advances
/// time with [`Engine::tick`]. Every call drains the bus before returning,
/// so observers registered with [`Engine::subscribe`] have seen all
/// resulting events by then.
pub struct Engine<S: RenderSurface> {
    surface: S,
    settings: Settings,
    bus: EventBus,
    timers: Timers,
    listeners: ListenerSet,
    now: Instant,
    selectables: SelectableSet,
    selected: SelectedSet,
    keys: KeyStore,
    scroll: ScrollStore,
    pointer: PointerStore,
    interaction: Interaction,
    selector: Selector,
    selector_area: SelectorArea,
    selection: Selection,
    drag: Drag,
    drop_zones: DropZones,
}

impl<S: RenderSurface> Engine<S> {
    pub fn new(surface: S, settings: Settings) -> Self {
        let mut bus = EventBus::new();
        for (component, topics) in ROUTES {
            for &topic in topics {
                bus.subscribe_component(topic, component);
            }
        }

        let mut engine = Self {
            surface,
            bus,
            timers: Timers::new(),
            listeners: ListenerSet::new(),
            now: Instant::now(),
            selectables: SelectableSet::new(),
            selected: SelectedSet::new(&settings),
            keys: KeyStore::new(&settings),
            scroll: ScrollStore::new(&settings),
            pointer: PointerStore::new(),
            interaction: Interaction::new(),
            selector: Selector::new(),
            selector_area: SelectorArea::new(),
            selection: Selection::new(),
            drag: Drag::new(),
            drop_zones: DropZones::new(),
            settings,
        };
        engine.init();
        engine
    }

    /// (Re)register the area listeners and reset the interaction state.
    pub fn init(&mut self) {
        self.bus.publish(Event::InteractionInitPre);
        self.dispatch();
    }

    /// Feed one host input event.
    pub fn handle_input(&mut self, input: InputEvent) {
        self.advance(input.timestamp());
        match input {
            InputEvent::Pointer(pointer) => {
                self.pointer.update(pointer.position);
                let event = match pointer.phase {
                    PointerPhase::Down => Event::PointerDown(pointer),
                    PointerPhase::Move => Event::PointerUpdated(pointer),
                    PointerPhase::Up | PointerPhase::Cancel => Event::PointerUp(pointer),
                };
                self.bus.publish(event);
            }
            InputEvent::Key(key) => {
                if !self.listeners.is_active(ListenerGroup::Keyboard) {
                    return;
                }
                match key.phase {
                    KeyPhase::Down => self.keys.key_down(&key, self.now, &mut self.timers, &mut self.bus),
                    KeyPhase::Up => self.keys.key_up(&key, &mut self.timers, &mut self.bus),
                }
            }
            InputEvent::Click(click) => self.bus.publish(Event::Click(click)),
            InputEvent::Scroll { target: ScrollTarget::Area, .. } => self.bus.publish(Event::AreaScroll {
                edges: Vec::new(),
                speed: 0.0,
            }),
            InputEvent::Scroll { target: ScrollTarget::Window, .. } => self.bus.publish(Event::WindowScroll),
            InputEvent::Blur { .. } => {
                if self.listeners.is_active(ListenerGroup::Keyboard) {
                    self.bus.publish(Event::Blur);
                }
            }
        }
        self.dispatch();
    }

    /// Advance time and run every timer that is due.
    pub fn tick(&mut self, now: Instant) {
        self.advance(now);
        for kind in self.timers.due(self.now) {
            self.bus.publish(Event::TimerFired(kind));
            self.dispatch();
        }
    }

    fn advance(&mut self, now: Instant) {
        if now > self.now {
            self.now = now;
        }
    }

    fn dispatch(&mut self) {
        while let Some(event) = self.bus.next() {
            log::trace!("dispatching {}", event.topic().name());
            for subscriber in self.bus.subscribers(event.topic()) {
                match subscriber {
                    Subscriber::Component(component) => self.deliver(component, &event),
                    Subscriber::Callback(id) => self.bus.notify(id, &event),
                }
            }
        }
    }

    fn deliver(&mut self, component: Component, event: &Event) {
        let Self {
            surface,
            settings,
            bus,
            timers,
            listeners,
            now,
            selectables,
            selected,
            keys,
            scroll,
            pointer,
            interaction,
            selector,
            selector_area,
            selection,
            drag,
            drop_zones,
        } = self;

        match component {
            Component::KeyStore => return keys.handle(event, timers, listeners, surface),
            Component::ScrollStore => return scroll.handle(event, surface),
            Component::PointerStore => return pointer.handle(event),
            _ => {}
        }

        let mut cx = Context {
            now: *now,
            interacting: interaction.is_interacting(),
            settings,
            bus,
            timers,
            listeners,
            surface,
            keys,
            scroll,
            pointer,
            selectables,
            selected,
        };
        match component {
            Component::Interaction => interaction.handle(event, &mut cx),
            Component::SelectorArea => selector_area.handle(event, &mut cx),
            Component::Selector => selector.handle(event, &mut cx),
            Component::Selection => selection.handle(event, &mut cx),
            Component::Drag => drag.handle(event, &mut cx),
            Component::DropZones => drop_zones.handle(event, &mut cx),
            Component::KeyStore | Component::ScrollStore | Component::PointerStore => {}
        }
    }

    /// Observe a topic. The callback runs while the bus is drained.
    pub fn subscribe(&mut self, topic: Topic, callback: impl FnMut(&Event) + 'static) -> SubscriptionId {
        self.bus.subscribe(topic, callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Register a selectable item, optionally with its group.
    pub fn add_selectable(&mut self, item: ElementId, group: Option<ElementId>) {
        self.selectables.add(&mut self.surface, item, group);
    }

    pub fn add_selectables(&mut self, items: impl IntoIterator<Item = (ElementId, Option<ElementId>)>) {
        for (item, group) in items {
            self.add_selectable(item, group);
        }
    }

    /// Unregister items, deselecting them first.
    pub fn remove_selectables(&mut self, items: &[ElementId]) {
        self.with_selected(|selected, env| selected.delete_all(items, env));
        for &item in items {
            self.selectables.remove(&mut self.surface, item);
        }
    }

    /// Add registered items to the selection. Unknown items are skipped.
    pub fn select(&mut self, items: &[ElementId]) {
        let known = self.known(items);
        self.with_selected(|selected, env| selected.add_all(&known, env));
    }

    pub fn deselect(&mut self, items: &[ElementId]) {
        self.with_selected(|selected, env| selected.delete_all(items, env));
    }

    /// Flip membership of one item. Returns whether it is selected afterwards.
    pub fn toggle(&mut self, item: ElementId) -> bool {
        if self.known(&[item]).is_empty() {
            return false;
        }
        self.with_selected(|selected, env| selected.toggle(item, env))
    }

    pub fn clear_selection(&mut self) {
        self.with_selected(|selected, env| selected.clear(env));
    }

    /// Selected items in insertion order.
    pub fn selection(&self) -> Vec<ElementId> {
        self.selected.elements()
    }

    pub fn selected(&self) -> &SelectedSet {
        &self.selected
    }

    pub fn selectables(&self) -> &SelectableSet {
        &self.selectables
    }

    /// Combined rectangle of the selected items.
    pub fn selection_rect(&mut self) -> Option<BoundingRect> {
        self.selected.bounding_rect(self.now, &self.surface)
    }

    fn known(&self, items: &[ElementId]) -> Vec<ElementId> {
        items
            .iter()
            .copied()
            .filter(|&item| {
                let known = self.selectables.contains(item);
                if !known {
                    log::warn!("ignoring unknown item {item:?}");
                }
                known
            })
            .collect()
    }

    fn with_selected<R>(&mut self, f: impl FnOnce(&mut SelectedSet, &mut SetEnv<'_>) -> R) -> R {
        let mut env = SetEnv {
            bus: &mut self.bus,
            surface: &mut self.surface,
            selectables: &self.selectables,
        };
        let result = f(&mut self.selected, &mut env);
        self.dispatch();
        result
    }

    /// Replace the drop zones.
    pub fn set_drop_zones(&mut self, zones: Vec<DropZoneConfig>) {
        let ids = self.drop_zones.configure(zones, &mut self.surface);
        self.drag.disarm();
        self.bus.publish(Event::DropZonesConfigured(ids));
        self.dispatch();
    }

    /// Validate and apply new settings.
    pub fn set_settings(&mut self, settings: Settings) -> ConfigResult<()> {
        settings.validate()?;
        self.keys.apply_settings(&settings);
        self.scroll.apply_settings(&settings);
        self.selected.apply_settings(&settings);
        self.settings = settings;
        self.bus.publish(Event::SettingsUpdated(Box::new(self.settings.clone())));
        self.dispatch();
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Rewrite every drag step before it is applied.
    pub fn set_drag_filter(&mut self, filter: impl FnMut(DragMove) -> DragMove + 'static) {
        let filter: DragFilter = Box::new(filter);
        self.drag.set_filter(Some(filter));
    }

    pub fn clear_drag_filter(&mut self) {
        self.drag.set_filter(None);
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn is_interacting(&self) -> bool {
        self.interaction.is_interacting()
    }

    pub fn is_dragging(&self) -> bool {
        self.interaction.is_dragging()
    }

    /// Drop zone element armed under the pointer during a drag.
    pub fn armed_drop_zone(&self) -> Option<ElementId> {
        self.drag.armed()
    }

    /// Items currently dropped into a zone. Unknown ids give `None`.
    pub fn items_dropped(&self, zone: &str) -> Option<Vec<ElementId>> {
        self.drop_zones.items_dropped_by_id(zone).map(<[ElementId]>::to_vec)
    }

    /// Selectable items overlapping a zone. Unknown ids give `None`.
    pub fn items_inside(&self, zone: &str) -> Option<Vec<ElementId>> {
        self.drop_zones
            .items_inside_by_id(zone, &self.surface, &self.selectables)
    }

    pub fn zones_for_item(&self, item: ElementId) -> Vec<String> {
        self.drop_zones
            .zones_for_item(item)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Zone that would receive a drop at `point`.
    pub fn drop_target_at(&self, point: Point) -> Option<String> {
        self.drop_zones
            .target_at(&self.surface, point, self.settings.drop_threshold())
            .map(str::to_string)
    }

    /// Whether any timer is pending.
    pub fn has_pending_timers(&self) -> bool {
        !self.timers.is_empty()
    }

    /// End the running gesture, then unregister every listener and cancel
    /// every timer. Call [`Engine::init`] to start listening again.
    pub fn stop(&mut self) {
        if self.interaction.is_interacting() {
            self.bus.publish(Event::InteractionEndPre(InteractionData {
                input: None,
                is_dragging: self.interaction.is_dragging(),
                is_dragging_keyboard: self.interaction.is_dragging_keyboard(),
            }));
            self.dispatch();
        }
        self.listeners.clear(&mut self.surface);
        self.keys.reset(&mut self.timers);
        self.timers.clear();
        self.surface.show_selector(None);
        self.surface.hide_drag_proxy();
        self.interaction.stop();
        log::debug!("engine stopped");
    }
}
