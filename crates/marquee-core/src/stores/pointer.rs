//! Pointer positions.

use crate::bus::{Event, InteractionData};
use crate::input::InputEvent;
use kurbo::Point;

/// Pointer position at gesture start and now, in viewport coordinates.
#[derive(Debug, Clone, Default)]
pub struct PointerStore {
    initial: Point,
    current: Point,
}

impl PointerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&mut self, event: &Event) {
        if let Event::InteractionStart(InteractionData {
            input: Some(InputEvent::Pointer(input)),
            ..
        }) = event
        {
            self.initial = input.position;
            self.current = input.position;
        }
    }

    /// Record the live pointer position.
    pub fn update(&mut self, position: Point) {
        self.current = position;
    }

    pub fn initial(&self) -> Point {
        self.initial
    }

    pub fn current(&self) -> Point {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{PointerInput, PointerPhase};

    #[cfg(target_arch = "wasm32")]
    use web_time::Instant;
    #[cfg(not(target_arch = "wasm32"))]
    use std::time::Instant;

    #[test]
    fn test_start_and_update() {
        let mut store = PointerStore::new();
        store.update(Point::new(3.0, 4.0));

        let press = PointerInput::new(PointerPhase::Down, Point::new(10.0, 20.0), Instant::now());
        store.handle(&Event::InteractionStart(InteractionData::pointer(press, false)));
        assert_eq!(store.initial(), Point::new(10.0, 20.0));
        assert_eq!(store.current(), Point::new(10.0, 20.0));

        store.update(Point::new(15.0, 25.0));
        assert_eq!(store.initial(), Point::new(10.0, 20.0));
        assert_eq!(store.current(), Point::new(15.0, 25.0));
    }
}
