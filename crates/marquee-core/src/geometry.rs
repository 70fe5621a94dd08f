//! Geometry helpers: rectangles, collision tests and selector math.
//!
//! Everything in here is a pure function over values. Positions are
//! `kurbo::Point`, movement and scroll deltas are `kurbo::Vec2`.

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in viewport coordinates.
///
/// `width` and `height` are always derived from the edges (or the edges from
/// origin and size), so `width == right - left` and `height == bottom - top`
/// hold for every value built through the constructors, including values
/// read from JSON.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RectInput")]
pub struct BoundingRect {
    pub top: f64,
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub width: f64,
    pub height: f64,
}

/// Wire shape accepted when deserializing a [`BoundingRect`].
#[derive(Deserialize)]
struct RectInput {
    #[serde(default)]
    left: f64,
    #[serde(default)]
    top: f64,
    #[serde(default)]
    width: f64,
    #[serde(default)]
    height: f64,
}

impl From<RectInput> for BoundingRect {
    fn from(input: RectInput) -> Self {
        Self::new(input.left, input.top, input.width, input.height)
    }
}

impl BoundingRect {
    /// Create a rectangle from its top-left corner and size.
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            right: left + width,
            bottom: top + height,
            width,
            height,
        }
    }

    /// Create a rectangle from its four edges.
    pub fn from_edges(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            top,
            left,
            right,
            bottom,
            width: right - left,
            height: bottom - top,
        }
    }

    /// Zero-sized rectangle at a point.
    pub fn from_point(point: Point) -> Self {
        Self::new(point.x, point.y, 0.0, 0.0)
    }

    /// Square of `size` with its top-left corner at `point`.
    pub fn around(point: Point, size: f64) -> Self {
        Self::new(point.x, point.y, size, size)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.left, self.top)
    }

    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    /// Move the rectangle without changing its size.
    pub fn translate(&self, by: Vec2) -> Self {
        Self::new(self.left + by.x, self.top + by.y, self.width, self.height)
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Self) -> Self {
        Self::from_edges(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right.max(other.right),
            self.bottom.max(other.bottom),
        )
    }

    /// Inclusive point containment (used for hit testing).
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left && point.x <= self.right && point.y >= self.top && point.y <= self.bottom
    }
}

impl From<Rect> for BoundingRect {
    fn from(rect: Rect) -> Self {
        Self::from_edges(rect.x0, rect.y0, rect.x1, rect.y1)
    }
}

impl From<BoundingRect> for Rect {
    fn from(rect: BoundingRect) -> Self {
        Rect::new(rect.left, rect.top, rect.right, rect.bottom)
    }
}

/// Edge of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

/// Strict overlap test between two rectangles.
///
/// Touching edges do not collide. `threshold` widens the test by a fraction
/// of the larger extent on each axis, so near misses can still count. The
/// margin is taken from both rectangles, which keeps
/// `collides(a, b, t) == collides(b, a, t)`.
pub fn collides(a: &BoundingRect, b: &BoundingRect, threshold: f64) -> bool {
    let margin_x = threshold * a.width.max(b.width);
    let margin_y = threshold * a.height.max(b.height);

    a.left < b.right + margin_x
        && a.right > b.left - margin_x
        && a.top < b.bottom + margin_y
        && a.bottom > b.top - margin_y
}

/// Position of the selection rectangle, relative to `container`.
///
/// `start` and `current` are viewport points. `scroll` is the content scroll
/// accumulated since the gesture started: the start point is anchored to the
/// content and moves against it, the current point is the live pointer.
/// The current point is clamped to the container, and a rectangle growing
/// left or up moves its origin instead of getting a negative size.
pub fn selector_position(
    start: Point,
    current: Point,
    scroll: Vec2,
    container: &BoundingRect,
) -> BoundingRect {
    let start = Point::new(
        start.x - container.left - scroll.x,
        start.y - container.top - scroll.y,
    );
    let current = Point::new(current.x - container.left, current.y - container.top);
    let clamped = Point::new(
        current.x.clamp(0.0, container.width.max(0.0)),
        current.y.clamp(0.0, container.height.max(0.0)),
    );

    let (left, width) = axis_span(start.x, clamped.x);
    let (top, height) = axis_span(start.y, clamped.y);
    BoundingRect::new(left, top, width, height)
}

fn axis_span(start: f64, current: f64) -> (f64, f64) {
    if current >= start {
        (start.max(0.0), current - start)
    } else {
        (current.max(0.0), start - current)
    }
}

/// Edges of `container` that `element` is within `tolerance` of (or past).
pub fn overflow_edges(element: &BoundingRect, container: &BoundingRect, tolerance: Vec2) -> Vec<Edge> {
    let mut edges = Vec::new();
    if element.top - tolerance.y < container.top {
        edges.push(Edge::Top);
    }
    if element.left - tolerance.x < container.left {
        edges.push(Edge::Left);
    }
    if element.bottom + tolerance.y > container.bottom {
        edges.push(Edge::Bottom);
    }
    if element.right + tolerance.x > container.right {
        edges.push(Edge::Right);
    }
    edges
}

/// Scroll delta that moves towards the given edges at `speed` per step.
pub fn scroll_vector(edges: &[Edge], speed: f64) -> Vec2 {
    edges.iter().fold(Vec2::ZERO, |acc, edge| {
        acc + match edge {
            Edge::Top => Vec2::new(0.0, -speed),
            Edge::Bottom => Vec2::new(0.0, speed),
            Edge::Left => Vec2::new(-speed, 0.0),
            Edge::Right => Vec2::new(speed, 0.0),
        }
    })
}

/// Clamp a movement so `selection` stays inside `container`.
///
/// `scroll` is the content scroll since the drag started; the selection
/// rectangle lives in start-of-drag coordinates, so the container is shifted
/// by it before clamping. A selection already outside may still move back in.
pub fn limit_direction(
    direction: Vec2,
    container: &BoundingRect,
    scroll: Vec2,
    selection: &BoundingRect,
) -> Vec2 {
    let bounds = container.translate(scroll);
    Vec2::new(
        clamp_axis(direction.x, selection.left, selection.right, bounds.left, bounds.right),
        clamp_axis(direction.y, selection.top, selection.bottom, bounds.top, bounds.bottom),
    )
}

fn clamp_axis(delta: f64, low: f64, high: f64, min: f64, max: f64) -> f64 {
    if delta < 0.0 {
        delta.max((min - low).min(0.0))
    } else if delta > 0.0 {
        delta.min((max - high).max(0.0))
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container() -> BoundingRect {
        BoundingRect::new(0.0, 0.0, 500.0, 500.0)
    }

    #[test]
    fn test_rect_invariants() {
        let rect = BoundingRect::new(10.0, 20.0, 30.0, 40.0);
        assert!((rect.right - 40.0).abs() < f64::EPSILON);
        assert!((rect.bottom - 60.0).abs() < f64::EPSILON);

        let rect = BoundingRect::from_edges(10.0, 20.0, 30.0, 40.0);
        assert!((rect.width - 20.0).abs() < f64::EPSILON);
        assert!((rect.height - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rect_from_json_derives_edges() {
        let rect: BoundingRect =
            serde_json::from_str(r#"{"left": 5, "top": 5, "width": 10, "height": 20}"#).unwrap();
        assert_eq!(rect, BoundingRect::new(5.0, 5.0, 10.0, 20.0));
    }

    #[test]
    fn test_rect_kurbo_roundtrip() {
        let rect = BoundingRect::new(1.0, 2.0, 3.0, 4.0);
        let kurbo_rect: Rect = rect.into();
        assert_eq!(BoundingRect::from(kurbo_rect), rect);
    }

    #[test]
    fn test_union() {
        let a = BoundingRect::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingRect::new(20.0, 5.0, 10.0, 30.0);
        assert_eq!(a.union(&b), BoundingRect::from_edges(0.0, 0.0, 30.0, 35.0));
    }

    #[test]
    fn test_selector_drag_backwards() {
        let rect = selector_position(
            Point::new(100.0, 100.0),
            Point::new(50.0, 50.0),
            Vec2::ZERO,
            &container(),
        );
        assert_eq!(rect, BoundingRect::new(50.0, 50.0, 50.0, 50.0));
    }

    #[test]
    fn test_selector_clamps_to_container() {
        let rect = selector_position(
            Point::new(100.0, 100.0),
            Point::new(600.0, 100.0),
            Vec2::ZERO,
            &container(),
        );
        assert_eq!(rect, BoundingRect::new(100.0, 100.0, 400.0, 0.0));
    }

    #[test]
    fn test_selector_edges_follow_pointer() {
        let start = Point::new(200.0, 200.0);
        for &(x, y) in &[(250.0, 260.0), (700.0, -40.0), (10.0, 480.0), (-30.0, 900.0)] {
            let rect = selector_position(start, Point::new(x, y), Vec2::ZERO, &container());
            let clamped_x: f64 = x.clamp(0.0, 500.0);
            let clamped_y: f64 = y.clamp(0.0, 500.0);
            if clamped_x >= start.x {
                assert!((rect.left + rect.width - clamped_x).abs() < f64::EPSILON);
            } else {
                assert!((rect.left - clamped_x).abs() < f64::EPSILON);
            }
            if clamped_y >= start.y {
                assert!((rect.top + rect.height - clamped_y).abs() < f64::EPSILON);
            } else {
                assert!((rect.top - clamped_y).abs() < f64::EPSILON);
            }
        }
    }

    #[test]
    fn test_selector_offset_container() {
        let container = BoundingRect::new(100.0, 50.0, 300.0, 300.0);
        let rect = selector_position(
            Point::new(150.0, 100.0),
            Point::new(250.0, 200.0),
            Vec2::ZERO,
            &container,
        );
        assert_eq!(rect, BoundingRect::new(50.0, 50.0, 100.0, 100.0));
    }

    #[test]
    fn test_selector_scroll_moves_anchor() {
        let start = Point::new(100.0, 100.0);
        let current = Point::new(200.0, 200.0);
        let before = selector_position(start, current, Vec2::ZERO, &container());

        // Content scrolled down by 40: the anchor moved up, the rect grew.
        let scrolled = selector_position(start, current, Vec2::new(0.0, 40.0), &container());
        assert!((scrolled.top - 60.0).abs() < f64::EPSILON);
        assert!((scrolled.height - 140.0).abs() < f64::EPSILON);

        let back = selector_position(start, current, Vec2::ZERO, &container());
        assert_eq!(back, before);
    }

    #[test]
    fn test_collision_edges_are_exclusive() {
        let a = BoundingRect::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingRect::new(10.0, 0.0, 10.0, 10.0);
        assert!(!collides(&a, &b, 0.0));
        assert!(collides(&a, &BoundingRect::new(5.0, 5.0, 10.0, 10.0), 0.0));
    }

    #[test]
    fn test_collision_symmetric() {
        let rects = [
            BoundingRect::new(0.0, 0.0, 10.0, 10.0),
            BoundingRect::new(20.0, 20.0, 10.0, 10.0),
            BoundingRect::new(9.0, 9.0, 0.0, 0.0),
            BoundingRect::new(-5.0, 3.0, 40.0, 2.0),
            BoundingRect::new(10.5, 10.5, 1.0, 1.0),
        ];
        for a in &rects {
            for b in &rects {
                for threshold in [0.0, 0.1, 0.5] {
                    assert_eq!(collides(a, b, threshold), collides(b, a, threshold));
                }
            }
        }
    }

    #[test]
    fn test_point_on_zone_corner() {
        let zones = [
            BoundingRect::new(0.0, 0.0, 10.0, 10.0),
            BoundingRect::new(20.0, 20.0, 10.0, 10.0),
        ];
        let point = BoundingRect::from_point(Point::new(10.0, 10.0));
        assert!(zones.iter().all(|zone| !collides(zone, &point, 0.0)));
        assert!(collides(&zones[0], &point, 0.1));
        assert!(!collides(&zones[1], &point, 0.1));
    }

    #[test]
    fn test_overflow_edges() {
        let area = BoundingRect::new(0.0, 0.0, 200.0, 200.0);
        let tolerance = Vec2::new(10.0, 10.0);

        let middle = BoundingRect::from_point(Point::new(100.0, 100.0));
        assert!(overflow_edges(&middle, &area, tolerance).is_empty());

        let top_left = BoundingRect::from_point(Point::new(5.0, 5.0));
        assert_eq!(overflow_edges(&top_left, &area, tolerance), vec![Edge::Top, Edge::Left]);

        let below = BoundingRect::from_point(Point::new(100.0, 250.0));
        assert_eq!(overflow_edges(&below, &area, tolerance), vec![Edge::Bottom]);
    }

    #[test]
    fn test_scroll_vector() {
        let v = scroll_vector(&[Edge::Top, Edge::Right], 5.0);
        assert_eq!(v, Vec2::new(5.0, -5.0));
        assert_eq!(scroll_vector(&[], 5.0), Vec2::ZERO);
    }

    #[test]
    fn test_limit_direction() {
        let selection = BoundingRect::new(400.0, 10.0, 50.0, 50.0);

        let limited = limit_direction(Vec2::new(100.0, -30.0), &container(), Vec2::ZERO, &selection);
        assert_eq!(limited, Vec2::new(50.0, -10.0));

        let free = limit_direction(Vec2::new(-20.0, 20.0), &container(), Vec2::ZERO, &selection);
        assert_eq!(free, Vec2::new(-20.0, 20.0));
    }

    #[test]
    fn test_limit_direction_with_scroll() {
        let selection = BoundingRect::new(0.0, 0.0, 50.0, 50.0);
        // Content scrolled by 100 on y: the selection may follow 100px further down.
        let limited = limit_direction(
            Vec2::new(0.0, 1000.0),
            &container(),
            Vec2::new(0.0, 100.0),
            &selection,
        );
        assert_eq!(limited, Vec2::new(0.0, 550.0));
    }
}
