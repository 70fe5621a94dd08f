//! In-memory render surface for tests and scripted replays.

use super::{ElementId, Flag, ListenerGroup, RenderSurface};
use crate::geometry::BoundingRect;
use kurbo::{Insets, Point, Size, Vec2};
use std::collections::{HashMap, HashSet};

/// Surface that keeps its whole "layout" in memory.
///
/// Element rectangles are given in layout coordinates; the reported
/// rectangles subtract the window scroll, plus the area scroll for elements
/// placed inside the area. Later elements are on top for hit testing.
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    rects: HashMap<ElementId, BoundingRect>,
    offsets: HashMap<ElementId, Vec2>,
    z_order: Vec<ElementId>,
    parents: HashMap<ElementId, ElementId>,
    inside: HashSet<ElementId>,
    flags: HashMap<ElementId, HashSet<Flag>>,
    layers: HashMap<ElementId, i32>,
    area: Option<BoundingRect>,
    border: Insets,
    area_scroll: Vec2,
    area_scroll_max: Vec2,
    window_scroll: Vec2,
    viewport: Size,
    listening: HashSet<ListenerGroup>,
    listen_calls: usize,
    selector: Option<BoundingRect>,
    proxy: Option<(usize, Point)>,
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self {
            rects: HashMap::new(),
            offsets: HashMap::new(),
            z_order: Vec::new(),
            parents: HashMap::new(),
            inside: HashSet::new(),
            flags: HashMap::new(),
            layers: HashMap::new(),
            area: None,
            border: Insets::ZERO,
            area_scroll: Vec2::ZERO,
            area_scroll_max: Vec2::ZERO,
            window_scroll: Vec2::ZERO,
            viewport: Size::new(1024.0, 768.0),
            listening: HashSet::new(),
            listen_calls: 0,
            selector: None,
            proxy: None,
        }
    }
}

impl HeadlessSurface {
    /// Create an empty surface without an area.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bounded area rectangle.
    pub fn with_area(mut self, area: BoundingRect) -> Self {
        self.area = Some(area);
        self
    }

    pub fn with_viewport(mut self, viewport: Size) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn with_border(mut self, border: Insets) -> Self {
        self.border = border;
        self
    }

    /// Allow the area to scroll up to `max` on each axis.
    pub fn with_area_scroll_limit(mut self, max: Vec2) -> Self {
        self.area_scroll_max = max;
        self
    }

    /// Add an element inside the area, on top of everything added before.
    pub fn add_element(&mut self, id: ElementId, rect: BoundingRect) {
        self.add_detached(id, rect);
        self.inside.insert(id);
    }

    /// Add an element outside the area (it does not scroll with it).
    pub fn add_detached(&mut self, id: ElementId, rect: BoundingRect) {
        self.rects.insert(id, rect);
        self.z_order.retain(|&other| other != id);
        self.z_order.push(id);
    }

    pub fn set_parent(&mut self, child: ElementId, parent: ElementId) {
        self.parents.insert(child, parent);
    }

    pub fn set_rect(&mut self, id: ElementId, rect: BoundingRect) {
        self.rects.insert(id, rect);
    }

    pub fn remove_element(&mut self, id: ElementId) {
        self.rects.remove(&id);
        self.offsets.remove(&id);
        self.z_order.retain(|&other| other != id);
        self.inside.remove(&id);
        self.flags.remove(&id);
    }

    /// Flags currently set on an element.
    pub fn flags(&self, id: ElementId) -> HashSet<Flag> {
        self.flags.get(&id).cloned().unwrap_or_default()
    }

    pub fn layer(&self, id: ElementId) -> i32 {
        self.layers.get(&id).copied().unwrap_or(0)
    }

    /// Total translation applied to an element.
    pub fn offset(&self, id: ElementId) -> Vec2 {
        self.offsets.get(&id).copied().unwrap_or(Vec2::ZERO)
    }

    pub fn selector(&self) -> Option<BoundingRect> {
        self.selector
    }

    /// Item count and position of the drag proxy, if shown.
    pub fn drag_proxy(&self) -> Option<(usize, Point)> {
        self.proxy
    }

    pub fn is_listening(&self, group: ListenerGroup) -> bool {
        self.listening.contains(&group)
    }

    /// Number of listener (un)registrations the engine requested.
    pub fn listen_calls(&self) -> usize {
        self.listen_calls
    }
}

impl RenderSurface for HeadlessSurface {
    fn rect(&self, element: ElementId) -> Option<BoundingRect> {
        let base = self.rects.get(&element)?;
        let mut shift = self.offset(element) - self.window_scroll;
        if self.inside.contains(&element) {
            shift -= self.area_scroll;
        }
        Some(base.translate(shift))
    }

    fn parent(&self, element: ElementId) -> Option<ElementId> {
        self.parents.get(&element).copied()
    }

    fn contains(&self, element: ElementId) -> bool {
        self.inside.contains(&element)
    }

    fn elements_from_point(&self, point: Point) -> Vec<ElementId> {
        self.z_order
            .iter()
            .rev()
            .copied()
            .filter(|&id| self.rect(id).is_some_and(|rect| rect.contains(point)))
            .collect()
    }

    fn set_flag(&mut self, element: ElementId, flag: Flag, on: bool) {
        let flags = self.flags.entry(element).or_default();
        if on {
            flags.insert(flag);
        } else {
            flags.remove(&flag);
        }
    }

    fn has_flag(&self, element: ElementId, flag: Flag) -> bool {
        self.flags.get(&element).is_some_and(|flags| flags.contains(&flag))
    }

    fn adjust_layer(&mut self, element: ElementId, delta: i32) {
        *self.layers.entry(element).or_insert(0) += delta;
    }

    fn translate(&mut self, element: ElementId, by: Vec2) {
        *self.offsets.entry(element).or_insert(Vec2::ZERO) += by;
    }

    fn area_rect(&self) -> Option<BoundingRect> {
        self.area.map(|area| area.translate(-self.window_scroll))
    }

    fn area_border(&self) -> Insets {
        self.border
    }

    fn area_scroll(&self) -> Vec2 {
        self.area_scroll
    }

    fn can_scroll(&self) -> bool {
        self.area_scroll_max.x > 0.0 || self.area_scroll_max.y > 0.0
    }

    fn scroll_area_by(&mut self, delta: Vec2) {
        let next = self.area_scroll + delta;
        self.area_scroll = Vec2::new(
            next.x.clamp(0.0, self.area_scroll_max.x.max(0.0)),
            next.y.clamp(0.0, self.area_scroll_max.y.max(0.0)),
        );
    }

    fn window_scroll(&self) -> Vec2 {
        self.window_scroll
    }

    fn scroll_window_by(&mut self, delta: Vec2) {
        let next = self.window_scroll + delta;
        self.window_scroll = Vec2::new(next.x.max(0.0), next.y.max(0.0));
    }

    fn viewport(&self) -> Size {
        self.viewport
    }

    fn listen(&mut self, group: ListenerGroup, on: bool) {
        self.listen_calls += 1;
        if on {
            self.listening.insert(group);
        } else {
            self.listening.remove(&group);
        }
    }

    fn show_selector(&mut self, rect: Option<BoundingRect>) {
        self.selector = rect;
    }

    fn show_drag_proxy(&mut self, count: usize, at: Point) {
        self.proxy = Some((count, at));
    }

    fn translate_drag_proxy(&mut self, by: Vec2) {
        if let Some((_, at)) = self.proxy.as_mut() {
            *at += by;
        }
    }

    fn hide_drag_proxy(&mut self) {
        self.proxy = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_testing_topmost_first() {
        let mut surface = HeadlessSurface::new();
        surface.add_element(ElementId(1), BoundingRect::new(0.0, 0.0, 100.0, 100.0));
        surface.add_element(ElementId(2), BoundingRect::new(50.0, 50.0, 100.0, 100.0));

        let hits = surface.elements_from_point(Point::new(75.0, 75.0));
        assert_eq!(hits, vec![ElementId(2), ElementId(1)]);
        assert!(surface.elements_from_point(Point::new(500.0, 500.0)).is_empty());
    }

    #[test]
    fn test_area_scroll_moves_inner_elements() {
        let mut surface = HeadlessSurface::new()
            .with_area(BoundingRect::new(0.0, 0.0, 200.0, 200.0))
            .with_area_scroll_limit(Vec2::new(0.0, 100.0));
        surface.add_element(ElementId(1), BoundingRect::new(10.0, 150.0, 20.0, 20.0));
        surface.add_detached(ElementId(2), BoundingRect::new(300.0, 0.0, 20.0, 20.0));

        surface.scroll_area_by(Vec2::new(0.0, 150.0));
        assert_eq!(surface.area_scroll(), Vec2::new(0.0, 100.0));
        assert_eq!(surface.rect(ElementId(1)), Some(BoundingRect::new(10.0, 50.0, 20.0, 20.0)));
        assert_eq!(surface.rect(ElementId(2)), Some(BoundingRect::new(300.0, 0.0, 20.0, 20.0)));
    }

    #[test]
    fn test_flags_and_layers() {
        let mut surface = HeadlessSurface::new();
        surface.set_flag(ElementId(1), Flag::Selected, true);
        assert!(surface.has_flag(ElementId(1), Flag::Selected));
        surface.set_flag(ElementId(1), Flag::Selected, false);
        assert!(!surface.has_flag(ElementId(1), Flag::Selected));

        surface.adjust_layer(ElementId(1), 3);
        surface.adjust_layer(ElementId(1), -1);
        assert_eq!(surface.layer(ElementId(1)), 2);
    }

    #[test]
    fn test_drag_proxy() {
        let mut surface = HeadlessSurface::new();
        surface.translate_drag_proxy(Vec2::new(5.0, 5.0));
        assert!(surface.drag_proxy().is_none());

        surface.show_drag_proxy(3, Point::new(10.0, 10.0));
        surface.translate_drag_proxy(Vec2::new(5.0, -5.0));
        assert_eq!(surface.drag_proxy(), Some((3, Point::new(15.0, 5.0))));

        surface.hide_drag_proxy();
        assert!(surface.drag_proxy().is_none());
    }
}
