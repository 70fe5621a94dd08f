//! Pressed-key tracking.

use crate::bus::{Event, EventBus, KeyData};
use crate::input::{KeyInput, Modifiers};
use crate::settings::Settings;
use crate::surface::{ListenerGroup, ListenerSet, RenderSurface};
use crate::timers::{TimerId, TimerKind, Timers};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

// Use web_time for WASM compatibility
#[cfg(target_arch = "wasm32")]
use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

/// Keys whose key-up is unreliable across platforms; they expire on a timer.
const SYSTEM_KEYS: [&str; 4] = ["meta", "control", "alt", "os"];

/// Live set of pressed keys.
#[derive(Debug, Clone)]
pub struct KeyStore {
    pressed: HashSet<String>,
    decay: HashMap<String, TimerId>,
    decay_after: Duration,
    multi_select_mode: bool,
}

impl KeyStore {
    pub fn new(settings: &Settings) -> Self {
        Self {
            pressed: HashSet::new(),
            decay: HashMap::new(),
            decay_after: settings.key_decay(),
            multi_select_mode: settings.multi_select_mode,
        }
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        self.decay_after = settings.key_decay();
        self.multi_select_mode = settings.multi_select_mode;
    }

    pub fn handle(
        &mut self,
        event: &Event,
        timers: &mut Timers,
        listeners: &mut ListenerSet,
        surface: &mut dyn RenderSurface,
    ) {
        match event {
            Event::InteractionInit => listeners.set(surface, ListenerGroup::Keyboard, true),
            Event::Blur => self.reset(timers),
            Event::TimerFired(TimerKind::KeyDecay(key)) => {
                if self.decay.remove(key).is_some() {
                    log::trace!("key {key} decayed");
                    self.pressed.remove(key);
                }
            }
            _ => {}
        }
    }

    pub fn key_down(&mut self, input: &KeyInput, now: Instant, timers: &mut Timers, bus: &mut EventBus) {
        let key = input.normalized_key();
        let data = KeyData { key: key.clone(), input: input.clone() };

        bus.publish(Event::KeyDownPre(data.clone()));
        self.pressed.insert(key.clone());
        bus.publish(Event::KeyDown(data));

        if SYSTEM_KEYS.contains(&key.as_str()) {
            if let Some(old) = self.decay.remove(&key) {
                timers.cancel(old);
            }
            let id = timers.after(now, self.decay_after, TimerKind::KeyDecay(key.clone()));
            self.decay.insert(key, id);
        }
    }

    pub fn key_up(&mut self, input: &KeyInput, timers: &mut Timers, bus: &mut EventBus) {
        let key = input.normalized_key();
        let data = KeyData { key: key.clone(), input: input.clone() };

        bus.publish(Event::KeyUpPre(data.clone()));
        self.pressed.remove(&key);
        bus.publish(Event::KeyUp(data));

        if let Some(id) = self.decay.remove(&key) {
            timers.cancel(id);
        }
    }

    /// Forget every pressed key.
    pub fn reset(&mut self, timers: &mut Timers) {
        self.pressed.clear();
        for (_, id) in self.decay.drain() {
            timers.cancel(id);
        }
    }

    pub fn is_pressed(&self, key: &str) -> bool {
        self.pressed.contains(&key.to_lowercase())
    }

    /// Pressed keys, sorted.
    pub fn pressed(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.pressed.iter().cloned().collect();
        keys.sort();
        keys
    }

    /// Shift held, per the event's modifiers or the tracked keys.
    pub fn is_shift_pressed(&self, modifiers: Option<Modifiers>) -> bool {
        self.multi_select_mode
            || modifiers.is_some_and(|m| m.shift)
            || self.pressed.contains("shift")
    }

    /// Control or meta held, per the event's modifiers or the tracked keys.
    pub fn is_ctrl_or_meta_pressed(&self, modifiers: Option<Modifiers>) -> bool {
        self.multi_select_mode
            || modifiers.is_some_and(|m| m.ctrl || m.meta)
            || self.pressed.contains("control")
            || self.pressed.contains("meta")
    }
}
