//! Drop zones and drop target resolution.

use crate::bus::{DropData, Event, InteractionData};
use crate::engine::Context;
use crate::geometry::{BoundingRect, collides};
use crate::input::InputEvent;
use crate::selectable::SelectableSet;
use crate::surface::{ElementId, Flag, RenderSurface};
use indexmap::IndexSet;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Host description of a drop zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropZoneConfig {
    pub id: String,
    pub element: ElementId,
    /// Items the zone accepts. `None` accepts every item.
    #[serde(default)]
    pub droppables: Option<Vec<ElementId>>,
}

#[derive(Debug, Clone)]
struct DropZone {
    id: String,
    element: ElementId,
    droppables: Option<IndexSet<ElementId>>,
    items_dropped: Vec<ElementId>,
}

impl DropZone {
    fn accepts(&self, item: ElementId) -> bool {
        self.droppables.as_ref().is_none_or(|items| items.contains(&item))
    }
}

/// Configured drop zones with lookups by element, by id and by droppable.
#[derive(Debug, Clone, Default)]
pub struct DropZones {
    zones: Vec<DropZone>,
    by_element: HashMap<ElementId, usize>,
    by_id: HashMap<String, usize>,
    by_droppable: HashMap<ElementId, Vec<usize>>,
}

impl DropZones {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every zone. The new indexes are built before the old zones
    /// are torn down, so no mix of both is ever observable.
    pub fn configure(&mut self, configs: Vec<DropZoneConfig>, surface: &mut dyn RenderSurface) -> Vec<String> {
        let mut next = DropZones::new();
        for config in configs {
            if next.by_id.contains_key(&config.id) {
                log::warn!("duplicate drop zone id {:?}, keeping the first", config.id);
                continue;
            }
            let index = next.zones.len();
            next.by_element.insert(config.element, index);
            next.by_id.insert(config.id.clone(), index);
            if let Some(items) = &config.droppables {
                for &item in items {
                    next.by_droppable.entry(item).or_default().push(index);
                }
            }
            next.zones.push(DropZone {
                id: config.id,
                element: config.element,
                droppables: config.droppables.map(|items| items.into_iter().collect()),
                items_dropped: Vec::new(),
            });
        }

        self.clear_flags(surface);
        *self = next;
        log::debug!("configured {} drop zone(s)", self.zones.len());
        self.ids()
    }

    pub fn handle(&mut self, event: &Event, cx: &mut Context<'_>) {
        match event {
            Event::InteractionStart(data) if data.is_dragging => self.ready(cx),
            Event::InteractionEnd(data) if data.is_dragging => self.drop(data, cx),
            _ => {}
        }
    }

    /// Flag the zones that accept at least one of the dragged items.
    fn ready(&mut self, cx: &mut Context<'_>) {
        for zone in &self.zones {
            if cx.selected.iter().any(|item| zone.accepts(item)) {
                cx.surface.set_flag(zone.element, Flag::DropReady, true);
            }
        }
    }

    fn drop(&mut self, data: &InteractionData, cx: &mut Context<'_>) {
        let point = drop_point(data, &*cx.surface).unwrap_or_else(|| cx.pointer.current());
        let target = self.target_index(&*cx.surface, point, cx.settings.drop_threshold());
        let items = cx.selected.elements();

        for (index, zone) in self.zones.iter_mut().enumerate() {
            if Some(index) == target {
                continue;
            }
            zone.items_dropped.retain(|item| !items.contains(item));
            cx.bus.publish(Event::DropZoneNoDrop(DropData {
                zone: zone.id.clone(),
                items: items.clone(),
            }));
        }

        if let Some(zone) = target.and_then(|index| self.zones.get_mut(index)) {
            let accepted: Vec<ElementId> = items.iter().copied().filter(|&item| zone.accepts(item)).collect();
            if accepted.is_empty() {
                log::debug!("drop zone {:?} accepts none of the dragged items", zone.id);
                cx.bus.publish(Event::DropZoneNoDrop(DropData {
                    zone: zone.id.clone(),
                    items,
                }));
            } else {
                log::debug!("dropped {} item(s) on zone {:?}", accepted.len(), zone.id);
                for &item in &accepted {
                    if !zone.items_dropped.contains(&item) {
                        zone.items_dropped.push(item);
                    }
                }
                cx.bus.publish(Event::DropZoneDrop(DropData {
                    zone: zone.id.clone(),
                    items: accepted,
                }));
            }
        }

        self.clear_flags(cx.surface);
    }

    fn clear_flags(&self, surface: &mut dyn RenderSurface) {
        for zone in &self.zones {
            surface.set_flag(zone.element, Flag::DropReady, false);
            surface.set_flag(zone.element, Flag::DropArmed, false);
        }
    }

    fn target_index(&self, surface: &dyn RenderSurface, point: Point, threshold: f64) -> Option<usize> {
        let probe = BoundingRect::from_point(point);
        surface.elements_from_point(point).into_iter().find_map(|element| {
            let index = *self.by_element.get(&element)?;
            let rect = surface.rect(element)?;
            collides(&rect, &probe, threshold).then_some(index)
        })
    }

    /// Id of the topmost zone at `point`.
    pub fn target_at(&self, surface: &dyn RenderSurface, point: Point, threshold: f64) -> Option<&str> {
        self.target_index(surface, point, threshold)
            .map(|index| self.zones[index].id.as_str())
    }

    /// Items currently dropped into the zone.
    pub fn items_dropped_by_id(&self, id: &str) -> Option<&[ElementId]> {
        let zone = self.zone(id)?;
        Some(&zone.items_dropped)
    }

    /// Selectable items whose rectangle overlaps the zone.
    pub fn items_inside_by_id(
        &self,
        id: &str,
        surface: &dyn RenderSurface,
        selectables: &SelectableSet,
    ) -> Option<Vec<ElementId>> {
        let zone = self.zone(id)?;
        let Some(zone_rect) = surface.rect(zone.element) else {
            return Some(Vec::new());
        };
        Some(
            selectables
                .iter()
                .filter(|&item| {
                    surface
                        .rect(item)
                        .is_some_and(|rect| collides(&rect, &zone_rect, 0.0))
                })
                .collect(),
        )
    }

    /// Ids of the zones that list `item` as droppable.
    pub fn zones_for_item(&self, item: ElementId) -> Vec<&str> {
        self.by_droppable
            .get(&item)
            .map(|indices| indices.iter().map(|&i| self.zones[i].id.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn ids(&self) -> Vec<String> {
        self.zones.iter().map(|zone| zone.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    fn zone(&self, id: &str) -> Option<&DropZone> {
        let zone = self.by_id.get(id).map(|&index| &self.zones[index]);
        if zone.is_none() {
            log::warn!("No drop zone found (id: {id})");
        }
        zone
    }
}

/// Keyboard drags drop at the centre of the focused element.
fn drop_point(data: &InteractionData, surface: &dyn RenderSurface) -> Option<Point> {
    if !data.is_dragging_keyboard {
        return None;
    }
    match &data.input {
        Some(InputEvent::Key(input)) => input.target.and_then(|target| surface.rect(target)).map(|rect| rect.center()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::HeadlessSurface;

    fn zone(id: &str, element: u64, droppables: Option<Vec<u64>>) -> DropZoneConfig {
        DropZoneConfig {
            id: id.to_string(),
            element: ElementId(element),
            droppables: droppables.map(|items| items.into_iter().map(ElementId).collect()),
        }
    }

    fn surface() -> HeadlessSurface {
        let mut surface = HeadlessSurface::new().with_area(BoundingRect::new(0.0, 0.0, 500.0, 500.0));
        surface.add_element(ElementId(100), BoundingRect::new(0.0, 0.0, 10.0, 10.0));
        surface.add_element(ElementId(200), BoundingRect::new(20.0, 20.0, 10.0, 10.0));
        surface
    }

    #[test]
    fn test_point_on_shared_corner_matches_nothing() {
        let mut surface = surface();
        let mut zones = DropZones::new();
        zones.configure(vec![zone("a", 100, None), zone("b", 200, None)], &mut surface);

        assert_eq!(zones.target_at(&surface, Point::new(10.0, 10.0), 0.0), None);
        assert_eq!(zones.target_at(&surface, Point::new(5.0, 5.0), 0.0), Some("a"));
        assert_eq!(zones.target_at(&surface, Point::new(25.0, 25.0), 0.0), Some("b"));
    }

    #[test]
    fn test_threshold_allows_near_miss() {
        let mut surface = surface();
        let mut zones = DropZones::new();
        zones.configure(vec![zone("a", 100, None)], &mut surface);
        assert_eq!(zones.target_at(&surface, Point::new(10.0, 5.0), 0.1), Some("a"));
    }

    #[test]
    fn test_reconfigure_replaces_indexes_and_flags() {
        let mut surface = surface();
        let mut zones = DropZones::new();
        zones.configure(vec![zone("a", 100, Some(vec![1, 2]))], &mut surface);
        surface.set_flag(ElementId(100), Flag::DropReady, true);
        assert_eq!(zones.zones_for_item(ElementId(1)), vec!["a"]);

        let ids = zones.configure(vec![zone("b", 200, Some(vec![2])), zone("b", 100, None)], &mut surface);
        assert_eq!(ids, vec!["b".to_string()]);
        assert!(!surface.has_flag(ElementId(100), Flag::DropReady));
        assert!(zones.zones_for_item(ElementId(1)).is_empty());
        assert_eq!(zones.zones_for_item(ElementId(2)), vec!["b"]);
        assert_eq!(zones.target_at(&surface, Point::new(5.0, 5.0), 0.0), None);
        assert!(zones.items_dropped_by_id("a").is_none());
    }

    #[test]
    fn test_items_inside() {
        let mut surface = surface();
        let mut selectables = SelectableSet::new();
        surface.add_element(ElementId(1), BoundingRect::new(2.0, 2.0, 4.0, 4.0));
        surface.add_element(ElementId(2), BoundingRect::new(50.0, 50.0, 4.0, 4.0));
        selectables.add(&mut surface, ElementId(1), None);
        selectables.add(&mut surface, ElementId(2), None);

        let mut zones = DropZones::new();
        zones.configure(vec![zone("a", 100, None)], &mut surface);
        assert_eq!(
            zones.items_inside_by_id("a", &surface, &selectables),
            Some(vec![ElementId(1)])
        );
        assert_eq!(zones.items_inside_by_id("missing", &surface, &selectables), None);
    }

    #[test]
    fn test_accepts() {
        let open = DropZone {
            id: "open".into(),
            element: ElementId(1),
            droppables: None,
            items_dropped: Vec::new(),
        };
        let strict = DropZone {
            droppables: Some([ElementId(5)].into_iter().collect()),
            ..open.clone()
        };
        assert!(open.accepts(ElementId(9)));
        assert!(strict.accepts(ElementId(5)));
        assert!(!strict.accepts(ElementId(9)));
    }
}
