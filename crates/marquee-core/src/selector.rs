//! The live selection rectangle.

use crate::bus::Event;
use crate::engine::Context;
use crate::geometry::{BoundingRect, Edge, scroll_vector, selector_position};
use crate::selector_area;
use crate::surface::ListenerGroup;
use crate::timers::{TimerId, TimerKind};

/// Draws the selection rectangle while a select gesture is running.
///
/// Every recompute publishes `Selector:updated` with the rectangle in
/// viewport coordinates. Near the top or bottom of the viewport the window
/// is scrolled on a fixed interval. Clicks are captured once a rectangle
/// was drawn, so the click ending the gesture does not reach the items.
#[derive(Debug, Clone, Default)]
pub struct Selector {
    active: bool,
    visible: bool,
    capturing: bool,
    auto_scroll: Option<(Edge, TimerId)>,
    recompute: Option<TimerId>,
    release: Option<TimerId>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&mut self, event: &Event, cx: &mut Context<'_>) {
        match event {
            Event::InteractionInit => self.reset(cx),
            Event::InteractionStart(data) if !data.is_dragging => self.start(cx),
            Event::InteractionUpdate(data) if self.active && !data.is_dragging => self.update(cx),
            Event::InteractionScrollPre(_) if self.active => self.schedule_recompute(cx),
            Event::InteractionEnd(_) => self.stop(cx),
            Event::TimerFired(kind) => self.on_timer(kind, cx),
            _ => {}
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether clicks are currently swallowed.
    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn reset(&mut self, cx: &mut Context<'_>) {
        if self.capturing {
            cx.listen(ListenerGroup::ClickCapture, false);
        }
        let timers = [self.auto_scroll.map(|(_, id)| id), self.recompute, self.release];
        for id in timers.into_iter().flatten() {
            cx.timers.cancel(id);
        }
        *self = Self::default();
    }

    fn start(&mut self, cx: &mut Context<'_>) {
        self.active = true;
        self.visible = false;
        if let Some(id) = self.release.take() {
            cx.timers.cancel(id);
        }
        cx.bus.publish(Event::SelectorUpdated {
            rect: BoundingRect::around(cx.pointer.initial(), 1.0),
            from_press: true,
        });
    }

    fn update(&mut self, cx: &mut Context<'_>) {
        self.visible = true;
        self.recompute(cx);
        self.check_auto_scroll(cx);
    }

    fn schedule_recompute(&mut self, cx: &mut Context<'_>) {
        if let Some(id) = self.recompute.take() {
            cx.timers.cancel(id);
        }
        self.recompute = Some(cx.timers.defer(cx.now, TimerKind::SelectorRecompute));
    }

    fn on_timer(&mut self, kind: &TimerKind, cx: &mut Context<'_>) {
        match kind {
            TimerKind::SelectorRecompute => {
                self.recompute = None;
                if self.active {
                    self.recompute(cx);
                }
            }
            TimerKind::SelectorAutoScroll(edge) if self.active => {
                let speed = cx.settings.selector_auto_scroll.speed;
                let before = cx.surface.window_scroll();
                cx.surface.scroll_window_by(scroll_vector(&[*edge], speed));
                if cx.surface.window_scroll() != before {
                    cx.bus.publish(Event::WindowScroll);
                }
            }
            TimerKind::ReleaseClickCapture => {
                self.release = None;
                if !self.active && self.capturing {
                    self.capturing = false;
                    cx.listen(ListenerGroup::ClickCapture, false);
                }
            }
            _ => {}
        }
    }

    fn recompute(&mut self, cx: &mut Context<'_>) {
        let Some(container) = selector_area::rect(&*cx.surface) else {
            log::warn!("selector area has no rectangle, skipping selector update");
            return;
        };
        let scroll = cx.scroll.scroll_amount() + cx.scroll.scroll_amount_window();
        let rect = selector_position(cx.pointer.initial(), cx.pointer.current(), scroll, &container);
        log::trace!("selector at {rect:?}");

        if self.visible {
            cx.surface.show_selector(Some(rect));
        }
        if !self.capturing {
            self.capturing = true;
            cx.listen(ListenerGroup::ClickCapture, true);
        }
        cx.bus.publish(Event::SelectorUpdated {
            rect: rect.translate(container.origin().to_vec2()),
            from_press: false,
        });
    }

    fn check_auto_scroll(&mut self, cx: &mut Context<'_>) {
        let edge = edge_for(
            cx.pointer.current().y,
            cx.surface.viewport().height,
            cx.settings.selector_auto_scroll.edge_threshold,
        );
        if self.auto_scroll.map(|(current, _)| current) == edge {
            return;
        }
        if let Some((_, id)) = self.auto_scroll.take() {
            cx.timers.cancel(id);
        }
        if let Some(edge) = edge {
            log::debug!("selector auto-scroll towards {edge:?}");
            let interval = cx.settings.selector_auto_scroll_interval();
            let id = cx.timers.every(cx.now, interval, TimerKind::SelectorAutoScroll(edge));
            self.auto_scroll = Some((edge, id));
        }
    }

    fn stop(&mut self, cx: &mut Context<'_>) {
        if !self.active {
            return;
        }
        self.active = false;
        self.visible = false;
        cx.surface.show_selector(None);

        if let Some((_, id)) = self.auto_scroll.take() {
            cx.timers.cancel(id);
        }
        if let Some(id) = self.recompute.take() {
            cx.timers.cancel(id);
        }
        // Keep swallowing clicks until the click ending this gesture went by.
        if self.capturing {
            self.release = Some(cx.timers.defer(cx.now, TimerKind::ReleaseClickCapture));
        }
    }
}

/// Viewport edge the pointer is past, for window auto-scroll.
fn edge_for(y: f64, viewport_height: f64, threshold: f64) -> Option<Edge> {
    if y < threshold {
        Some(Edge::Top)
    } else if y > viewport_height - threshold {
        Some(Edge::Bottom)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_for_negative_threshold() {
        assert_eq!(edge_for(-20.0, 768.0, -15.0), Some(Edge::Top));
        assert_eq!(edge_for(-10.0, 768.0, -15.0), None);
        assert_eq!(edge_for(400.0, 768.0, -15.0), None);
        assert_eq!(edge_for(790.0, 768.0, -15.0), Some(Edge::Bottom));
    }

    #[test]
    fn test_edge_for_positive_threshold() {
        assert_eq!(edge_for(10.0, 768.0, 20.0), Some(Edge::Top));
        assert_eq!(edge_for(750.0, 768.0, 20.0), Some(Edge::Bottom));
        assert_eq!(edge_for(30.0, 768.0, 20.0), None);
    }
}
