//! Host-registered selectable items.

use crate::surface::{ElementId, Flag, RenderSurface};
use indexmap::IndexMap;

/// Ordered list of selectable items with their group.
///
/// The registration order is the "full ordered list" used by range
/// selection and by run labelling in the selected set.
#[derive(Debug, Clone, Default)]
pub struct SelectableSet {
    items: IndexMap<ElementId, Option<ElementId>>,
}

impl SelectableSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an item (no-op if already registered) and flag it.
    pub fn add(&mut self, surface: &mut dyn RenderSurface, item: ElementId, group: Option<ElementId>) {
        if self.items.contains_key(&item) {
            return;
        }
        self.items.insert(item, group);
        surface.set_flag(item, Flag::Selectable, true);
    }

    /// Unregister an item. Returns `false` if it was unknown.
    pub fn remove(&mut self, surface: &mut dyn RenderSurface, item: ElementId) -> bool {
        if self.items.shift_remove(&item).is_none() {
            return false;
        }
        surface.set_flag(item, Flag::Selectable, false);
        true
    }

    pub fn contains(&self, item: ElementId) -> bool {
        self.items.contains_key(&item)
    }

    pub fn index_of(&self, item: ElementId) -> Option<usize> {
        self.items.get_index_of(&item)
    }

    /// Group (structural parent) of an item.
    pub fn group(&self, item: ElementId) -> Option<ElementId> {
        self.items.get(&item).copied().flatten()
    }

    pub fn iter(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.items.keys().copied()
    }

    pub fn ordered(&self) -> Vec<ElementId> {
        self.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The element itself or its nearest ancestor that is selectable.
    pub fn closest(&self, surface: &dyn RenderSurface, element: ElementId) -> Option<ElementId> {
        let mut current = Some(element);
        while let Some(el) = current {
            if self.contains(el) {
                return Some(el);
            }
            current = surface.parent(el);
        }
        None
    }
}
