//! The bounded interaction surface and its auto-scroll.

use crate::bus::Event;
use crate::engine::Context;
use crate::geometry::{BoundingRect, Edge, collides, overflow_edges, scroll_vector};
use crate::stores::ScrollStore;
use crate::surface::{ElementId, RenderSurface};
use crate::timers::{TimerId, TimerKind, Timers};
use kurbo::{Point, Vec2};

/// Inner rectangle of the area: its viewport rectangle shifted by the
/// top/left border.
pub fn rect(surface: &dyn RenderSurface) -> Option<BoundingRect> {
    let area = surface.area_rect()?;
    let border = surface.area_border();
    Some(area.translate(Vec2::new(border.x0, border.y0)))
}

/// Whether an element belongs to the area: it lives inside a scrollable
/// area, or its rectangle overlaps the area.
pub fn is_inside(surface: &dyn RenderSurface, scroll: &ScrollStore, element: ElementId) -> bool {
    if surface.contains(element) && scroll.can_scroll(surface) {
        return true;
    }
    match (rect(surface), surface.rect(element)) {
        (Some(area), Some(element_rect)) => collides(&area, &element_rect, 0.0),
        _ => false,
    }
}

/// Whether a viewport point lies inside the area.
pub fn is_clicked(surface: &dyn RenderSurface, point: Point) -> bool {
    rect(surface).is_some_and(|area| collides(&BoundingRect::from_point(point), &area, 0.0))
}

/// Scrolls the area while the pointer is near its edges during a gesture.
#[derive(Debug, Clone, Default)]
pub struct SelectorArea {
    auto_scroll: Option<TimerId>,
    edges: Vec<Edge>,
}

impl SelectorArea {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&mut self, event: &Event, cx: &mut Context<'_>) {
        match event {
            Event::InteractionStart(data) if !data.is_dragging_keyboard => self.start(cx),
            Event::InteractionEnd(_) => self.stop(cx.timers),
            Event::TimerFired(TimerKind::AreaAutoScroll) => self.auto_scroll(cx),
            _ => {}
        }
    }

    /// Edges the pointer overflowed on the last check.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    fn start(&mut self, cx: &mut Context<'_>) {
        self.stop(cx.timers);
        let interval = cx.settings.area_auto_scroll_interval();
        self.auto_scroll = Some(cx.timers.every(cx.now, interval, TimerKind::AreaAutoScroll));
    }

    fn auto_scroll(&mut self, cx: &mut Context<'_>) {
        if self.auto_scroll.is_none() {
            return;
        }
        let Some(area) = rect(&*cx.surface) else {
            return;
        };
        let pointer = BoundingRect::from_point(cx.pointer.current());
        self.edges = overflow_edges(&pointer, &area, cx.settings.overflow_tolerance);
        if self.edges.is_empty() {
            return;
        }

        let speed = cx.settings.auto_scroll_speed;
        let before = cx.surface.area_scroll();
        cx.surface.scroll_area_by(scroll_vector(&self.edges, speed));
        if cx.surface.area_scroll() != before {
            log::trace!("area auto-scroll towards {:?}", self.edges);
            cx.bus.publish(Event::AreaScroll {
                edges: self.edges.clone(),
                speed,
            });
        }
    }

    fn stop(&mut self, timers: &mut Timers) {
        self.edges.clear();
        if let Some(id) = self.auto_scroll.take() {
            timers.cancel(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::surface::HeadlessSurface;
    use kurbo::Insets;

    fn surface() -> HeadlessSurface {
        HeadlessSurface::new()
            .with_area(BoundingRect::new(100.0, 100.0, 200.0, 200.0))
            .with_border(Insets::new(2.0, 3.0, 2.0, 3.0))
    }

    #[test]
    fn test_rect_includes_border_offset() {
        assert_eq!(rect(&surface()), Some(BoundingRect::new(102.0, 103.0, 200.0, 200.0)));
        assert_eq!(rect(&HeadlessSurface::new()), None);
    }

    #[test]
    fn test_is_clicked() {
        let surface = surface();
        assert!(is_clicked(&surface, Point::new(150.0, 150.0)));
        assert!(!is_clicked(&surface, Point::new(50.0, 150.0)));
        assert!(!is_clicked(&surface, Point::new(102.0, 150.0)));
    }

    #[test]
    fn test_is_inside() {
        let mut surface = surface();
        surface.add_element(ElementId(1), BoundingRect::new(120.0, 120.0, 10.0, 10.0));
        surface.add_detached(ElementId(2), BoundingRect::new(400.0, 400.0, 10.0, 10.0));
        surface.add_element(ElementId(3), BoundingRect::new(120.0, 900.0, 10.0, 10.0));
        let scroll = ScrollStore::new(&Settings::default());

        assert!(is_inside(&surface, &scroll, ElementId(1)));
        assert!(!is_inside(&surface, &scroll, ElementId(2)));
        // Far below the visible area, only reachable when the area scrolls.
        assert!(!is_inside(&surface, &scroll, ElementId(3)));
        let surface = surface.with_area_scroll_limit(Vec2::new(0.0, 1000.0));
        assert!(is_inside(&surface, &scroll, ElementId(3)));
    }
}
