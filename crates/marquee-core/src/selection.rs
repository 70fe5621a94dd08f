//! Rectangle selection and shift-range selection.

use crate::bus::{Event, InteractionData};
use crate::engine::Context;
use crate::geometry::{BoundingRect, collides};
use crate::input::InputEvent;
use crate::surface::ElementId;
use std::collections::HashSet;

/// Keeps the selected set in sync with the selection rectangle.
///
/// Items covered by the rectangle are selected. Items the rectangle left
/// again fall back to their state from before the gesture. With a
/// multi-select modifier held the previous selection is kept, and with
/// `multiSelectToggling` covering a previously selected item deselects it.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    active: bool,
    multi: bool,
    previous: HashSet<ElementId>,
    touched: HashSet<ElementId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&mut self, event: &Event, cx: &mut Context<'_>) {
        match event {
            Event::InteractionStart(data) if !data.is_dragging => self.start(data, cx),
            Event::SelectorUpdated { rect, from_press } => self.update(rect, *from_press, cx),
            Event::InteractionEnd(_) => self.stop(),
            _ => {}
        }
    }

    fn start(&mut self, data: &InteractionData, cx: &mut Context<'_>) {
        let modifiers = data.input.as_ref().and_then(InputEvent::modifiers);
        self.multi = cx.keys.is_shift_pressed(modifiers) || cx.keys.is_ctrl_or_meta_pressed(modifiers);
        self.touched.clear();
        self.active = true;

        let (selected, mut env) = cx.split();
        if self.multi {
            self.previous = selected.iter().collect();
        } else {
            self.previous.clear();
            selected.clear(&mut env);
        }
    }

    fn update(&mut self, rect: &BoundingRect, from_press: bool, cx: &mut Context<'_>) {
        // Modifier clicks are resolved by the click path.
        if !self.active || (from_press && self.multi) {
            return;
        }
        let toggle = self.multi && cx.settings.multi_select_toggling;

        let (selected, mut env) = cx.split();
        let items: Vec<ElementId> = env.selectables.iter().collect();
        for item in items {
            let inside = env
                .surface
                .rect(item)
                .is_some_and(|item_rect| collides(&item_rect, rect, 0.0));
            let was_selected = self.previous.contains(&item);

            if inside {
                if self.touched.insert(item) {
                    if toggle && was_selected {
                        selected.delete(item, &mut env);
                    } else {
                        selected.add(item, &mut env);
                    }
                }
            } else if self.touched.remove(&item) {
                if was_selected {
                    selected.add(item, &mut env);
                } else {
                    selected.delete(item, &mut env);
                }
            }
        }
    }

    fn stop(&mut self) {
        self.active = false;
        self.multi = false;
        self.previous.clear();
        self.touched.clear();
    }
}

/// Items selected by shift-clicking `clicked`.
///
/// The range runs from the nearest selected item before `clicked` to the
/// nearest selected item after it (or to `clicked` when only one side has
/// one), as an inclusive slice of `ordered`. With no selection on either
/// side the range is `clicked` alone; an unknown `clicked` gives nothing.
pub fn shift_range(clicked: ElementId, selected: &[ElementId], ordered: &[ElementId]) -> Vec<ElementId> {
    let Some(index) = ordered.iter().position(|&item| item == clicked) else {
        return Vec::new();
    };
    let selected_indices = selected
        .iter()
        .filter_map(|item| ordered.iter().position(|other| other == item));

    let mut below: Option<usize> = None;
    let mut above: Option<usize> = None;
    for i in selected_indices {
        if i < index {
            below = Some(below.map_or(i, |b| b.max(i)));
        } else if i > index {
            above = Some(above.map_or(i, |a| a.min(i)));
        }
    }

    match (below, above) {
        (Some(low), Some(high)) => ordered[low..=high].to_vec(),
        (Some(low), None) => ordered[low..=index].to_vec(),
        (None, Some(high)) => ordered[index..=high].to_vec(),
        (None, None) => vec![clicked],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[u64]) -> Vec<ElementId> {
        values.iter().map(|&v| ElementId(v)).collect()
    }

    #[test]
    fn test_range_between_neighbours() {
        // A B C D with B and D selected, shift-click C.
        let ordered = ids(&[1, 2, 3, 4]);
        let range = shift_range(ElementId(3), &ids(&[2, 4]), &ordered);
        assert_eq!(range, ids(&[2, 3, 4]));
    }

    #[test]
    fn test_range_one_side() {
        let ordered = ids(&[1, 2, 3, 4, 5]);
        assert_eq!(shift_range(ElementId(4), &ids(&[1]), &ordered), ids(&[1, 2, 3, 4]));
        assert_eq!(shift_range(ElementId(2), &ids(&[5]), &ordered), ids(&[2, 3, 4, 5]));
    }

    #[test]
    fn test_range_uses_nearest_bounds() {
        let ordered = ids(&[1, 2, 3, 4, 5, 6, 7]);
        let range = shift_range(ElementId(4), &ids(&[7, 1, 2, 6]), &ordered);
        assert_eq!(range, ids(&[2, 3, 4, 5, 6]));
    }

    #[test]
    fn test_range_without_selection() {
        let ordered = ids(&[1, 2, 3]);
        assert_eq!(shift_range(ElementId(2), &[], &ordered), ids(&[2]));
        assert_eq!(shift_range(ElementId(2), &ids(&[2]), &ordered), ids(&[2]));
        assert!(shift_range(ElementId(9), &ids(&[1]), &ordered).is_empty());
    }

    #[test]
    fn test_range_is_idempotent() {
        let ordered = ids(&[1, 2, 3, 4, 5]);
        let mut selected = ids(&[4, 1]);
        let first = shift_range(ElementId(3), &selected, &ordered);
        for item in &first {
            if !selected.contains(item) {
                selected.push(*item);
            }
        }
        let snapshot = selected.clone();
        let second = shift_range(ElementId(3), &selected, &ordered);
        for item in &second {
            if !selected.contains(item) {
                selected.push(*item);
            }
        }
        assert!(second.iter().all(|item| first.contains(item)));
        assert_eq!(selected, snapshot);
        assert_eq!(&selected[..2], &ids(&[4, 1])[..]);
    }
}
