//! Intervals and deferred continuations.
//!
//! The engine never sleeps. Components schedule work here and the host
//! advances time with `Engine::tick`, which turns every due timer into a
//! `Timer:fired` event.

use crate::geometry::Edge;
use serde::Serialize;
use std::time::Duration;

// Use web_time for WASM compatibility
#[cfg(target_arch = "wasm32")]
use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

/// What a timer is for. Delivered back to components when it fires.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum TimerKind {
    /// A held system key (meta/control/alt/os) expires.
    KeyDecay(String),
    /// Scroll the window towards an edge while selecting.
    SelectorAutoScroll(Edge),
    /// Check the pointer against the area edges and scroll the area.
    AreaAutoScroll,
    /// Recompute the selection rectangle after a scroll settled.
    SelectorRecompute,
    /// Stop swallowing clicks after a rectangle selection.
    ReleaseClickCapture,
}

/// Handle to a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Timer {
    id: TimerId,
    kind: TimerKind,
    due: Instant,
    every: Option<Duration>,
}

/// Scheduler for one-shot and interval timers.
#[derive(Debug, Clone, Default)]
pub struct Timers {
    next_id: u64,
    timers: Vec<Timer>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire once, `delay` after `now`.
    pub fn after(&mut self, now: Instant, delay: Duration, kind: TimerKind) -> TimerId {
        self.schedule(now + delay, None, kind)
    }

    /// Fire every `interval`, starting one interval after `now`.
    pub fn every(&mut self, now: Instant, interval: Duration, kind: TimerKind) -> TimerId {
        self.schedule(now + interval, Some(interval), kind)
    }

    /// Fire on the next tick.
    pub fn defer(&mut self, now: Instant, kind: TimerKind) -> TimerId {
        self.schedule(now, None, kind)
    }

    fn schedule(&mut self, due: Instant, every: Option<Duration>, kind: TimerKind) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer { id, kind, due, every });
        id
    }

    /// Cancel a timer. Returns `false` if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|timer| timer.id != id);
        self.timers.len() != before
    }

    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.timers.iter().any(|timer| timer.id == id)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Cancel everything.
    pub fn clear(&mut self) {
        self.timers.clear();
    }

    /// Collect the timers due at `now`, in due order.
    ///
    /// One-shot timers are removed. An interval fires at most once per call
    /// and is rescheduled one interval later (or one interval after `now`
    /// if the host fell behind).
    pub fn due(&mut self, now: Instant) -> Vec<TimerKind> {
        let mut fired: Vec<(Instant, TimerId, TimerKind)> = Vec::new();
        self.timers.retain_mut(|timer| {
            if timer.due > now {
                return true;
            }
            fired.push((timer.due, timer.id, timer.kind.clone()));
            match timer.every {
                Some(every) => {
                    let next = timer.due + every;
                    timer.due = if next > now { next } else { now + every };
                    true
                }
                None => false,
            }
        });
        fired.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.0.cmp(&b.1.0)));
        fired.into_iter().map(|(_, _, kind)| kind).collect()
    }
}
