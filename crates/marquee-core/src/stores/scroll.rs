//! Scroll offsets of the area and the window since the gesture started.

use crate::bus::Event;
use crate::settings::Settings;
use crate::surface::RenderSurface;
use kurbo::Vec2;

#[derive(Debug, Clone)]
pub struct ScrollStore {
    initial: Vec2,
    initial_window: Vec2,
    current: Vec2,
    current_window: Vec2,
    can_scroll: Option<bool>,
    zoom: f64,
}

impl ScrollStore {
    pub fn new(settings: &Settings) -> Self {
        Self {
            initial: Vec2::ZERO,
            initial_window: Vec2::ZERO,
            current: Vec2::ZERO,
            current_window: Vec2::ZERO,
            can_scroll: None,
            zoom: settings.zoom,
        }
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        self.zoom = settings.zoom;
    }

    pub fn handle(&mut self, event: &Event, surface: &mut dyn RenderSurface) {
        match event {
            Event::InteractionStart(_) => self.start(surface),
            Event::InteractionEnd(_) => self.reset(),
            Event::WindowScroll | Event::AreaScroll { .. } => self.update(surface),
            _ => {}
        }
    }

    /// Snapshot the offsets at gesture start.
    pub fn start(&mut self, surface: &dyn RenderSurface) {
        self.initial = surface.area_scroll();
        self.current = self.initial;
        self.initial_window = surface.window_scroll();
        self.current_window = self.initial_window;
        self.can_scroll = Some(surface.can_scroll());
    }

    pub fn update(&mut self, surface: &dyn RenderSurface) {
        self.current = surface.area_scroll();
        self.current_window = surface.window_scroll();
    }

    pub fn reset(&mut self) {
        self.initial = self.current;
        self.initial_window = self.current_window;
        self.can_scroll = None;
    }

    /// Current area scroll offset.
    pub fn current(&self) -> Vec2 {
        self.current
    }

    /// Zoom-corrected area scroll since gesture start.
    pub fn scroll_amount(&self) -> Vec2 {
        let diff = self.current - self.initial;
        let correction = diff * self.zoom - diff;
        diff + correction
    }

    /// Window scroll since gesture start.
    pub fn scroll_amount_window(&self) -> Vec2 {
        self.current_window - self.initial_window
    }

    /// Whether the area has scrollable overflow (snapshotted at gesture start).
    pub fn can_scroll(&self, surface: &dyn RenderSurface) -> bool {
        self.can_scroll.unwrap_or_else(|| surface.can_scroll())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoundingRect;
    use crate::surface::HeadlessSurface;

    fn surface() -> HeadlessSurface {
        HeadlessSurface::new()
            .with_area(BoundingRect::new(0.0, 0.0, 200.0, 200.0))
            .with_area_scroll_limit(Vec2::new(0.0, 500.0))
    }

    #[test]
    fn test_scroll_amount_since_start() {
        let mut surface = surface();
        let mut store = ScrollStore::new(&Settings::default());

        surface.scroll_area_by(Vec2::new(0.0, 30.0));
        store.start(&surface);
        surface.scroll_area_by(Vec2::new(0.0, 20.0));
        surface.scroll_window_by(Vec2::new(0.0, 7.0));
        store.update(&surface);

        assert_eq!(store.scroll_amount(), Vec2::new(0.0, 20.0));
        assert_eq!(store.scroll_amount_window(), Vec2::new(0.0, 7.0));
        assert_eq!(store.current(), Vec2::new(0.0, 50.0));

        store.reset();
        assert_eq!(store.scroll_amount(), Vec2::ZERO);
    }

    #[test]
    fn test_zoom_correction() {
        let mut surface = surface();
        let mut store = ScrollStore::new(&Settings {
            zoom: 2.0,
            ..Settings::default()
        });

        store.start(&surface);
        surface.scroll_area_by(Vec2::new(0.0, 10.0));
        store.update(&surface);
        assert!((store.scroll_amount().y - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_can_scroll_snapshot() {
        let surface = surface();
        let mut store = ScrollStore::new(&Settings::default());
        assert!(store.can_scroll(&surface));

        store.start(&HeadlessSurface::new());
        assert!(!store.can_scroll(&surface));
        store.reset();
        assert!(store.can_scroll(&surface));
    }
}
