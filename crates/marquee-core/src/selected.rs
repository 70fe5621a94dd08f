//! The selected set: ordered membership plus run labelling.

use crate::bus::{Event, EventBus, SelectionChange};
use crate::cache::TtlCache;
use crate::geometry::BoundingRect;
use crate::selectable::SelectableSet;
use crate::settings::Settings;
use crate::surface::{ElementId, Flag, RenderSurface};
use indexmap::IndexSet;
use std::collections::{HashMap, HashSet};

// Use web_time for WASM compatibility
#[cfg(target_arch = "wasm32")]
use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

/// Position of a selected item inside a contiguous run of selected items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunLabel {
    /// The run has a single member (it is both first and last).
    Single,
    First,
    Intermediate,
    Last,
}

/// What a selected-set mutation needs from its surroundings.
pub struct SetEnv<'a> {
    pub bus: &'a mut EventBus,
    pub surface: &'a mut dyn RenderSurface,
    pub selectables: &'a SelectableSet,
}

/// Ordered, deduplicated set of selected items.
///
/// Every mutation publishes a pre event (membership before the change)
/// and a post event (membership after), sets the `Selected` flag, and
/// relabels contiguous runs. Two members are adjacent when they are
/// neighbours in the selectable registration order and share a group.
#[derive(Debug, Clone)]
pub struct SelectedSet {
    members: IndexSet<ElementId>,
    labels: HashMap<ElementId, RunLabel>,
    rects: TtlCache<Vec<(ElementId, BoundingRect)>>,
    use_layers: bool,
}

impl SelectedSet {
    pub fn new(settings: &Settings) -> Self {
        Self {
            members: IndexSet::new(),
            labels: HashMap::new(),
            rects: TtlCache::new(settings.refresh_memory_rate()),
            use_layers: settings.use_layers,
        }
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        self.use_layers = settings.use_layers;
        self.rects.set_ttl(settings.refresh_memory_rate());
        self.rects.invalidate();
    }

    /// Add an item. Returns `false` if it was already selected.
    pub fn add(&mut self, item: ElementId, env: &mut SetEnv<'_>) -> bool {
        if self.members.contains(&item) {
            return false;
        }
        env.bus.publish(Event::SelectedAddedPre(self.change(item)));
        self.members.insert(item);
        env.surface.set_flag(item, Flag::Selected, true);
        if self.use_layers {
            env.surface.adjust_layer(item, 1);
        }
        self.relabel(env);
        env.bus.publish(Event::SelectedAdded(self.change(item)));
        true
    }

    /// Remove an item. Returns `false` if it was not selected.
    pub fn delete(&mut self, item: ElementId, env: &mut SetEnv<'_>) -> bool {
        if !self.members.contains(&item) {
            return false;
        }
        env.bus.publish(Event::SelectedRemovedPre(self.change(item)));
        self.members.shift_remove(&item);
        env.surface.set_flag(item, Flag::Selected, false);
        if self.use_layers {
            env.surface.adjust_layer(item, -1);
        }
        self.relabel(env);
        env.bus.publish(Event::SelectedRemoved(self.change(item)));
        true
    }

    /// Add the item if absent, remove it otherwise. Returns whether it is
    /// selected afterwards.
    pub fn toggle(&mut self, item: ElementId, env: &mut SetEnv<'_>) -> bool {
        if self.members.contains(&item) {
            self.delete(item, env);
            false
        } else {
            self.add(item, env)
        }
    }

    pub fn add_all(&mut self, items: &[ElementId], env: &mut SetEnv<'_>) {
        for &item in items {
            self.add(item, env);
        }
    }

    pub fn delete_all(&mut self, items: &[ElementId], env: &mut SetEnv<'_>) {
        for &item in items {
            self.delete(item, env);
        }
    }

    pub fn clear(&mut self, env: &mut SetEnv<'_>) {
        let items = self.elements();
        self.delete_all(&items, env);
    }

    pub fn contains(&self, item: ElementId) -> bool {
        self.members.contains(&item)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members in insertion order.
    pub fn elements(&self) -> Vec<ElementId> {
        self.members.iter().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.members.iter().copied()
    }

    /// Run label of a member.
    pub fn label(&self, item: ElementId) -> Option<RunLabel> {
        self.labels.get(&item).copied()
    }

    /// Member rectangles, memoized for the refresh interval.
    pub fn rects(&mut self, now: Instant, surface: &dyn RenderSurface) -> &[(ElementId, BoundingRect)] {
        let members = &self.members;
        self.rects.get_or_insert_with(now, || {
            members
                .iter()
                .filter_map(|&item| surface.rect(item).map(|rect| (item, rect)))
                .collect()
        })
    }

    /// Union of the member rectangles.
    pub fn bounding_rect(&mut self, now: Instant, surface: &dyn RenderSurface) -> Option<BoundingRect> {
        self.rects(now, surface)
            .iter()
            .map(|(_, rect)| *rect)
            .reduce(|acc, rect| acc.union(&rect))
    }

    fn change(&self, item: ElementId) -> SelectionChange {
        SelectionChange { items: self.elements(), item }
    }

    fn relabel(&mut self, env: &mut SetEnv<'_>) {
        self.rects.invalidate();

        let mut labels = HashMap::new();
        let mut ordered = Vec::with_capacity(self.members.len());
        for &item in &self.members {
            match env.selectables.index_of(item) {
                Some(index) => ordered.push((index, item)),
                None => {
                    labels.insert(item, RunLabel::Single);
                }
            }
        }
        ordered.sort_unstable_by_key(|(index, _)| *index);

        let mut runs: Vec<Vec<ElementId>> = Vec::new();
        let mut previous: Option<(usize, Option<ElementId>)> = None;
        for (index, item) in ordered {
            let group = env.selectables.group(item);
            let adjacent = previous.is_some_and(|(prev, prev_group)| prev + 1 == index && prev_group == group);
            match runs.last_mut() {
                Some(run) if adjacent => run.push(item),
                _ => runs.push(vec![item]),
            }
            previous = Some((index, group));
        }

        for run in runs {
            let last = run.len() - 1;
            for (position, item) in run.into_iter().enumerate() {
                let label = match position {
                    _ if last == 0 => RunLabel::Single,
                    0 => RunLabel::First,
                    p if p == last => RunLabel::Last,
                    _ => RunLabel::Intermediate,
                };
                labels.insert(item, label);
            }
        }

        let touched: HashSet<ElementId> = self.labels.keys().chain(labels.keys()).copied().collect();
        for item in touched {
            let label = labels.get(&item).copied();
            if self.labels.get(&item).copied() != label {
                apply_label(env.surface, item, label);
            }
        }
        self.labels = labels;
    }
}

fn apply_label(surface: &mut dyn RenderSurface, item: ElementId, label: Option<RunLabel>) {
    let first = matches!(label, Some(RunLabel::Single | RunLabel::First));
    let last = matches!(label, Some(RunLabel::Single | RunLabel::Last));
    let intermediate = matches!(label, Some(RunLabel::Intermediate));
    surface.set_flag(item, Flag::SelectedFirst, first);
    surface.set_flag(item, Flag::SelectedLast, last);
    surface.set_flag(item, Flag::SelectedIntermediate, intermediate);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::HeadlessSurface;
    use std::time::Duration;

    struct Fixture {
        bus: EventBus,
        surface: HeadlessSurface,
        selectables: SelectableSet,
        selected: SelectedSet,
    }

    impl Fixture {
        fn new(count: u64) -> Self {
            let mut surface = HeadlessSurface::new();
            let mut selectables = SelectableSet::new();
            for id in 0..count {
                surface.add_element(ElementId(id), BoundingRect::new(id as f64 * 20.0, 0.0, 10.0, 10.0));
                selectables.add(&mut surface, ElementId(id), None);
            }
            Self {
                bus: EventBus::new(),
                surface,
                selectables,
                selected: SelectedSet::new(&Settings::default()),
            }
        }

        fn add(&mut self, id: u64) -> bool {
            let mut env = SetEnv {
                bus: &mut self.bus,
                surface: &mut self.surface,
                selectables: &self.selectables,
            };
            self.selected.add(ElementId(id), &mut env)
        }

        fn delete(&mut self, id: u64) -> bool {
            let mut env = SetEnv {
                bus: &mut self.bus,
                surface: &mut self.surface,
                selectables: &self.selectables,
            };
            self.selected.delete(ElementId(id), &mut env)
        }

        fn labels(&self) -> Vec<(u64, Option<RunLabel>)> {
            (0..self.selectables.len() as u64)
                .map(|id| (id, self.selected.label(ElementId(id))))
                .collect()
        }
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut fx = Fixture::new(3);
        assert!(fx.add(1));
        assert!(!fx.add(1));
        assert_eq!(fx.selected.len(), 1);
        assert!(fx.surface.has_flag(ElementId(1), Flag::Selected));
        assert_eq!(fx.surface.layer(ElementId(1)), 1);
    }

    #[test]
    fn test_run_labels() {
        let mut fx = Fixture::new(6);
        for id in [1, 2, 3, 5] {
            fx.add(id);
        }
        assert_eq!(fx.selected.label(ElementId(1)), Some(RunLabel::First));
        assert_eq!(fx.selected.label(ElementId(2)), Some(RunLabel::Intermediate));
        assert_eq!(fx.selected.label(ElementId(3)), Some(RunLabel::Last));
        assert_eq!(fx.selected.label(ElementId(5)), Some(RunLabel::Single));

        assert!(fx.surface.has_flag(ElementId(5), Flag::SelectedFirst));
        assert!(fx.surface.has_flag(ElementId(5), Flag::SelectedLast));
        assert!(fx.surface.has_flag(ElementId(2), Flag::SelectedIntermediate));
        assert!(!fx.surface.has_flag(ElementId(2), Flag::SelectedFirst));

        fx.delete(2);
        assert_eq!(fx.selected.label(ElementId(1)), Some(RunLabel::Single));
        assert_eq!(fx.selected.label(ElementId(3)), Some(RunLabel::Single));
        assert!(!fx.surface.has_flag(ElementId(2), Flag::SelectedIntermediate));
    }

    #[test]
    fn test_groups_split_runs() {
        let mut surface = HeadlessSurface::new();
        let mut selectables = SelectableSet::new();
        selectables.add(&mut surface, ElementId(0), Some(ElementId(100)));
        selectables.add(&mut surface, ElementId(1), Some(ElementId(100)));
        selectables.add(&mut surface, ElementId(2), Some(ElementId(200)));
        let mut bus = EventBus::new();
        let mut selected = SelectedSet::new(&Settings::default());
        let mut env = SetEnv {
            bus: &mut bus,
            surface: &mut surface,
            selectables: &selectables,
        };
        selected.add_all(&[ElementId(0), ElementId(1), ElementId(2)], &mut env);

        assert_eq!(selected.label(ElementId(0)), Some(RunLabel::First));
        assert_eq!(selected.label(ElementId(1)), Some(RunLabel::Last));
        assert_eq!(selected.label(ElementId(2)), Some(RunLabel::Single));
    }

    #[test]
    fn test_add_then_delete_restores_labels() {
        let mut fx = Fixture::new(8);
        for id in [0, 1, 4, 6, 7] {
            fx.add(id);
        }
        let before = fx.labels();
        for id in [2, 3, 5] {
            fx.add(id);
            fx.delete(id);
            assert_eq!(fx.labels(), before);
        }
    }

    #[test]
    fn test_events_carry_membership() {
        let mut fx = Fixture::new(3);
        fx.add(0);
        fx.add(2);
        fx.delete(0);

        let events: Vec<Event> = std::iter::from_fn(|| fx.bus.next()).collect();
        let topics: Vec<&str> = events.iter().map(|e| e.topic().name()).collect();
        assert_eq!(
            topics,
            vec![
                "Selected:added:pre",
                "Selected:added",
                "Selected:added:pre",
                "Selected:added",
                "Selected:removed:pre",
                "Selected:removed",
            ]
        );
        match (&events[4], &events[5]) {
            (Event::SelectedRemovedPre(pre), Event::SelectedRemoved(post)) => {
                assert_eq!(pre.items, vec![ElementId(0), ElementId(2)]);
                assert_eq!(post.items, vec![ElementId(2)]);
                assert_eq!(post.item, ElementId(0));
            }
            other => panic!("unexpected events {other:?}"),
        }
    }

    #[test]
    fn test_toggle_and_clear() {
        let mut fx = Fixture::new(3);
        let mut env = SetEnv {
            bus: &mut fx.bus,
            surface: &mut fx.surface,
            selectables: &fx.selectables,
        };
        assert!(fx.selected.toggle(ElementId(1), &mut env));
        assert!(!fx.selected.toggle(ElementId(1), &mut env));
        fx.selected.add_all(&[ElementId(0), ElementId(2)], &mut env);
        fx.selected.clear(&mut env);
        assert!(fx.selected.is_empty());
        assert_eq!(fx.surface.layer(ElementId(0)), 0);
        assert!(fx.labels().iter().all(|(_, label)| label.is_none()));
    }

    #[test]
    fn test_rect_cache_ttl() {
        let now = Instant::now();
        let mut fx = Fixture::new(2);
        fx.add(0);
        fx.add(1);
        let union = fx.selected.bounding_rect(now, &fx.surface);
        assert_eq!(union, Some(BoundingRect::new(0.0, 0.0, 30.0, 10.0)));

        fx.surface.translate(ElementId(1), kurbo::Vec2::new(10.0, 0.0));
        let cached = fx.selected.bounding_rect(now + Duration::from_millis(10), &fx.surface);
        assert_eq!(cached, union);

        let fresh = fx.selected.bounding_rect(now + Duration::from_millis(80), &fx.surface);
        assert_eq!(fresh, Some(BoundingRect::new(0.0, 0.0, 40.0, 10.0)));
    }
}
