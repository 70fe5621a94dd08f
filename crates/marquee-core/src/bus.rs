//! Typed publish/subscribe bus.
//!
//! Components never call into each other. They publish [`Event`]s, and the
//! engine drains the bus and hands each event to the subscribers of its
//! [`Topic`], in subscription order. Publishing only enqueues, so a handler
//! always runs to completion before the next event is delivered, and a
//! "pre" event published before its authoritative pair is fully delivered
//! first.

use crate::geometry::{BoundingRect, Edge};
use crate::input::{InputEvent, KeyInput, PointerInput};
use crate::settings::Settings;
use crate::surface::ElementId;
use crate::timers::TimerKind;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::fmt;

/// Event topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    InteractionInitPre,
    InteractionInit,
    InteractionStartPre,
    InteractionStart,
    InteractionUpdatePre,
    InteractionUpdate,
    InteractionEndPre,
    InteractionEnd,
    InteractionScrollPre,
    InteractionScroll,
    SelectedAddedPre,
    SelectedAdded,
    SelectedRemovedPre,
    SelectedRemoved,
    KeyDownPre,
    KeyDown,
    KeyUpPre,
    KeyUp,
    PointerDown,
    PointerUpdated,
    PointerUp,
    Click,
    AreaScroll,
    WindowScroll,
    Blur,
    SelectorUpdated,
    DropZoneDrop,
    DropZoneNoDrop,
    DropZonesConfigured,
    SettingsUpdated,
    TimerFired,
}

impl Topic {
    /// Every topic, in declaration order.
    pub const ALL: [Topic; 31] = [
        Self::InteractionInitPre,
        Self::InteractionInit,
        Self::InteractionStartPre,
        Self::InteractionStart,
        Self::InteractionUpdatePre,
        Self::InteractionUpdate,
        Self::InteractionEndPre,
        Self::InteractionEnd,
        Self::InteractionScrollPre,
        Self::InteractionScroll,
        Self::SelectedAddedPre,
        Self::SelectedAdded,
        Self::SelectedRemovedPre,
        Self::SelectedRemoved,
        Self::KeyDownPre,
        Self::KeyDown,
        Self::KeyUpPre,
        Self::KeyUp,
        Self::PointerDown,
        Self::PointerUpdated,
        Self::PointerUp,
        Self::Click,
        Self::AreaScroll,
        Self::WindowScroll,
        Self::Blur,
        Self::SelectorUpdated,
        Self::DropZoneDrop,
        Self::DropZoneNoDrop,
        Self::DropZonesConfigured,
        Self::SettingsUpdated,
        Self::TimerFired,
    ];

    /// Wire name of the topic.
    pub fn name(&self) -> &'static str {
        match self {
            Self::InteractionInitPre => "Interaction:init:pre",
            Self::InteractionInit => "Interaction:init",
            Self::InteractionStartPre => "Interaction:start:pre",
            Self::InteractionStart => "Interaction:start",
            Self::InteractionUpdatePre => "Interaction:update:pre",
            Self::InteractionUpdate => "Interaction:update",
            Self::InteractionEndPre => "Interaction:end:pre",
            Self::InteractionEnd => "Interaction:end",
            Self::InteractionScrollPre => "Interaction:scroll:pre",
            Self::InteractionScroll => "Interaction:scroll",
            Self::SelectedAddedPre => "Selected:added:pre",
            Self::SelectedAdded => "Selected:added",
            Self::SelectedRemovedPre => "Selected:removed:pre",
            Self::SelectedRemoved => "Selected:removed",
            Self::KeyDownPre => "KeyStore:down:pre",
            Self::KeyDown => "KeyStore:down",
            Self::KeyUpPre => "KeyStore:up:pre",
            Self::KeyUp => "KeyStore:up",
            Self::PointerDown => "Pointer:down",
            Self::PointerUpdated => "Pointer:updated",
            Self::PointerUp => "Pointer:up",
            Self::Click => "Pointer:click",
            Self::AreaScroll => "Area:scroll",
            Self::WindowScroll => "Window:scroll",
            Self::Blur => "Window:blur",
            Self::SelectorUpdated => "Selector:updated",
            Self::DropZoneDrop => "DropZone:drop",
            Self::DropZoneNoDrop => "DropZone:nodrop",
            Self::DropZonesConfigured => "DropZones:configured",
            Self::SettingsUpdated => "Settings:updated",
            Self::TimerFired => "Timer:fired",
        }
    }
}

/// Payload of the interaction lifecycle events.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionData {
    /// Input that triggered the event, if any.
    pub input: Option<InputEvent>,
    /// Whether the gesture is a drag (as opposed to a rectangle selection).
    pub is_dragging: bool,
    pub is_dragging_keyboard: bool,
}

impl InteractionData {
    pub fn pointer(input: PointerInput, is_dragging: bool) -> Self {
        Self {
            input: Some(InputEvent::Pointer(input)),
            is_dragging,
            is_dragging_keyboard: false,
        }
    }

    pub fn keyboard(input: KeyInput) -> Self {
        Self {
            input: Some(InputEvent::Key(input)),
            is_dragging: true,
            is_dragging_keyboard: true,
        }
    }
}

/// Payload of the selected-set events.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionChange {
    /// Full membership, in insertion order.
    pub items: Vec<ElementId>,
    /// The item added or removed.
    pub item: ElementId,
}

/// Payload of the key events.
#[derive(Debug, Clone, Serialize)]
pub struct KeyData {
    /// Lowercased key name.
    pub key: String,
    pub input: KeyInput,
}

/// Payload of the per-zone drop notifications.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropData {
    pub zone: String,
    pub items: Vec<ElementId>,
}

/// Everything that travels over the bus.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "topic", content = "data")]
pub enum Event {
    #[serde(rename = "Interaction:init:pre")]
    InteractionInitPre,
    #[serde(rename = "Interaction:init")]
    InteractionInit,
    #[serde(rename = "Interaction:start:pre")]
    InteractionStartPre(InteractionData),
    #[serde(rename = "Interaction:start")]
    InteractionStart(InteractionData),
    #[serde(rename = "Interaction:update:pre")]
    InteractionUpdatePre(InteractionData),
    #[serde(rename = "Interaction:update")]
    InteractionUpdate(InteractionData),
    #[serde(rename = "Interaction:end:pre")]
    InteractionEndPre(InteractionData),
    #[serde(rename = "Interaction:end")]
    InteractionEnd(InteractionData),
    #[serde(rename = "Interaction:scroll:pre")]
    InteractionScrollPre(InteractionData),
    #[serde(rename = "Interaction:scroll")]
    InteractionScroll(InteractionData),
    #[serde(rename = "Selected:added:pre")]
    SelectedAddedPre(SelectionChange),
    #[serde(rename = "Selected:added")]
    SelectedAdded(SelectionChange),
    #[serde(rename = "Selected:removed:pre")]
    SelectedRemovedPre(SelectionChange),
    #[serde(rename = "Selected:removed")]
    SelectedRemoved(SelectionChange),
    #[serde(rename = "KeyStore:down:pre")]
    KeyDownPre(KeyData),
    #[serde(rename = "KeyStore:down")]
    KeyDown(KeyData),
    #[serde(rename = "KeyStore:up:pre")]
    KeyUpPre(KeyData),
    #[serde(rename = "KeyStore:up")]
    KeyUp(KeyData),
    #[serde(rename = "Pointer:down")]
    PointerDown(PointerInput),
    #[serde(rename = "Pointer:updated")]
    PointerUpdated(PointerInput),
    #[serde(rename = "Pointer:up")]
    PointerUp(PointerInput),
    #[serde(rename = "Pointer:click")]
    Click(PointerInput),
    /// The area scrolled; `edges` and `speed` are set for auto-scroll steps.
    #[serde(rename = "Area:scroll")]
    AreaScroll { edges: Vec<Edge>, speed: f64 },
    #[serde(rename = "Window:scroll")]
    WindowScroll,
    #[serde(rename = "Window:blur")]
    Blur,
    /// The selection rectangle moved. `rect` is in viewport coordinates;
    /// `from_press` marks the 1px rectangle placed at the press point.
    #[serde(rename = "Selector:updated")]
    SelectorUpdated { rect: BoundingRect, from_press: bool },
    #[serde(rename = "DropZone:drop")]
    DropZoneDrop(DropData),
    #[serde(rename = "DropZone:nodrop")]
    DropZoneNoDrop(DropData),
    /// Drop zones were replaced; carries the new zone ids.
    #[serde(rename = "DropZones:configured")]
    DropZonesConfigured(Vec<String>),
    #[serde(rename = "Settings:updated")]
    SettingsUpdated(Box<Settings>),
    #[serde(rename = "Timer:fired")]
    TimerFired(TimerKind),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Self::InteractionInitPre => Topic::InteractionInitPre,
            Self::InteractionInit => Topic::InteractionInit,
            Self::InteractionStartPre(_) => Topic::InteractionStartPre,
            Self::InteractionStart(_) => Topic::InteractionStart,
            Self::InteractionUpdatePre(_) => Topic::InteractionUpdatePre,
            Self::InteractionUpdate(_) => Topic::InteractionUpdate,
            Self::InteractionEndPre(_) => Topic::InteractionEndPre,
            Self::InteractionEnd(_) => Topic::InteractionEnd,
            Self::InteractionScrollPre(_) => Topic::InteractionScrollPre,
            Self::InteractionScroll(_) => Topic::InteractionScroll,
            Self::SelectedAddedPre(_) => Topic::SelectedAddedPre,
            Self::SelectedAdded(_) => Topic::SelectedAdded,
            Self::SelectedRemovedPre(_) => Topic::SelectedRemovedPre,
            Self::SelectedRemoved(_) => Topic::SelectedRemoved,
            Self::KeyDownPre(_) => Topic::KeyDownPre,
            Self::KeyDown(_) => Topic::KeyDown,
            Self::KeyUpPre(_) => Topic::KeyUpPre,
            Self::KeyUp(_) => Topic::KeyUp,
            Self::PointerDown(_) => Topic::PointerDown,
            Self::PointerUpdated(_) => Topic::PointerUpdated,
            Self::PointerUp(_) => Topic::PointerUp,
            Self::Click(_) => Topic::Click,
            Self::AreaScroll { .. } => Topic::AreaScroll,
            Self::WindowScroll => Topic::WindowScroll,
            Self::Blur => Topic::Blur,
            Self::SelectorUpdated { .. } => Topic::SelectorUpdated,
            Self::DropZoneDrop(_) => Topic::DropZoneDrop,
            Self::DropZoneNoDrop(_) => Topic::DropZoneNoDrop,
            Self::DropZonesConfigured(_) => Topic::DropZonesConfigured,
            Self::SettingsUpdated(_) => Topic::SettingsUpdated,
            Self::TimerFired(_) => Topic::TimerFired,
        }
    }
}

/// Engine components that subscribe to the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    KeyStore,
    ScrollStore,
    PointerStore,
    Interaction,
    Selector,
    SelectorArea,
    Selection,
    Drag,
    DropZones,
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(usize);

/// A subscriber of a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subscriber<K> {
    /// An internal component, delivered to by whoever drains the bus.
    Component(K),
    /// An external callback.
    Callback(SubscriptionId),
}

type Callback = Box<dyn FnMut(&Event)>;

/// Topic routing table plus the queue of pending events.
pub struct EventBus<K = Component> {
    routes: HashMap<Topic, Vec<Subscriber<K>>>,
    callbacks: Vec<Option<Callback>>,
    queue: VecDeque<Event>,
}

impl<K> Default for EventBus<K> {
    fn default() -> Self {
        Self {
            routes: HashMap::new(),
            callbacks: Vec::new(),
            queue: VecDeque::new(),
        }
    }
}

impl<K: fmt::Debug> fmt::Debug for EventBus<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("routes", &self.routes)
            .field("callbacks", &self.callbacks.iter().filter(|cb| cb.is_some()).count())
            .field("queued", &self.queue.len())
            .finish()
    }
}

impl<K: Copy> EventBus<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a topic to an internal component.
    pub fn subscribe_component(&mut self, topic: Topic, component: K) {
        self.routes
            .entry(topic)
            .or_default()
            .push(Subscriber::Component(component));
    }

    /// Route a topic to an external callback.
    pub fn subscribe(&mut self, topic: Topic, callback: impl FnMut(&Event) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.callbacks.len());
        self.callbacks.push(Some(Box::new(callback)));
        self.routes.entry(topic).or_default().push(Subscriber::Callback(id));
        id
    }

    /// Remove a callback. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let Some(slot) = self.callbacks.get_mut(id.0) else {
            return false;
        };
        if slot.take().is_none() {
            return false;
        }
        for subscribers in self.routes.values_mut() {
            subscribers.retain(|sub| !matches!(sub, Subscriber::Callback(other) if *other == id));
        }
        true
    }

    /// Enqueue an event.
    pub fn publish(&mut self, event: Event) {
        self.queue.push_back(event);
    }

    /// Enqueue a "pre" event followed by its authoritative pair.
    pub fn publish_pair(&mut self, pre: Event, post: Event) {
        self.queue.push_back(pre);
        self.queue.push_back(post);
    }

    /// Next event to deliver.
    pub fn next(&mut self) -> Option<Event> {
        self.queue.pop_front()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    /// Subscribers of a topic, in subscription order.
    pub fn subscribers(&self, topic: Topic) -> Vec<Subscriber<K>> {
        self.routes.get(&topic).cloned().unwrap_or_default()
    }

    /// Run an external callback.
    pub fn notify(&mut self, id: SubscriptionId, event: &Event) {
        if let Some(Some(callback)) = self.callbacks.get_mut(id.0) {
            callback(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Drain the bus, recording component deliveries as `(component, topic)`.
    fn drain(bus: &mut EventBus<&'static str>, log: &mut Vec<(&'static str, &'static str)>) {
        while let Some(event) = bus.next() {
            for sub in bus.subscribers(event.topic()) {
                match sub {
                    Subscriber::Component(name) => {
                        log.push((name, event.topic().name()));
                        // The first subscriber of a pre event publishes the follow-up.
                        if name == "a" && event.topic() == Topic::InteractionInitPre {
                            bus.publish(Event::InteractionInit);
                        }
                    }
                    Subscriber::Callback(id) => bus.notify(id, &event),
                }
            }
        }
    }

    #[test]
    fn test_delivery_order() {
        let mut bus: EventBus<&'static str> = EventBus::new();
        bus.subscribe_component(Topic::InteractionInitPre, "a");
        bus.subscribe_component(Topic::InteractionInitPre, "b");
        bus.subscribe_component(Topic::InteractionInit, "b");
        bus.subscribe_component(Topic::InteractionInit, "a");

        let mut log = Vec::new();
        bus.publish(Event::InteractionInitPre);
        drain(&mut bus, &mut log);

        assert_eq!(
            log,
            vec![
                ("a", "Interaction:init:pre"),
                ("b", "Interaction:init:pre"),
                ("b", "Interaction:init"),
                ("a", "Interaction:init"),
            ]
        );
        assert!(bus.is_idle());
    }

    #[test]
    fn test_callbacks_and_unsubscribe() {
        let mut bus: EventBus<&'static str> = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = bus.subscribe(Topic::WindowScroll, move |event| {
            sink.borrow_mut().push(event.topic().name());
        });

        let mut log = Vec::new();
        bus.publish(Event::WindowScroll);
        drain(&mut bus, &mut log);
        assert_eq!(*seen.borrow(), vec!["Window:scroll"]);

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(Event::WindowScroll);
        drain(&mut bus, &mut log);
        assert_eq!(seen.borrow().len(), 1);
        assert!(bus.subscribers(Topic::WindowScroll).is_empty());
    }

    #[test]
    fn test_publish_pair_keeps_order() {
        let mut bus: EventBus<&'static str> = EventBus::new();
        bus.publish_pair(
            Event::InteractionScrollPre(InteractionData::default()),
            Event::InteractionScroll(InteractionData::default()),
        );
        assert_eq!(bus.next().map(|e| e.topic()), Some(Topic::InteractionScrollPre));
        assert_eq!(bus.next().map(|e| e.topic()), Some(Topic::InteractionScroll));
        assert!(bus.next().is_none());
    }

    #[test]
    fn test_event_serializes_with_topic_name() {
        let json = serde_json::to_value(Event::DropZoneDrop(DropData {
            zone: "trash".into(),
            items: vec![ElementId(4)],
        }))
        .unwrap();
        assert_eq!(json["topic"], "DropZone:drop");
        assert_eq!(json["data"]["zone"], "trash");
        assert_eq!(json["data"]["items"][0], 4);
    }

    #[test]
    fn test_topic_names_are_unique() {
        let names: std::collections::HashSet<_> = Topic::ALL.iter().map(Topic::name).collect();
        assert_eq!(names.len(), Topic::ALL.len());
    }
}
