// Colorful Logger - core/filter.rs
//
// Tag visibility filter. Every application recomputes `visible` for every
// stored line from scratch, so the visible set is always a pure function of
// the store contents and the current selection.
// Core layer: pure logic, no I/O.

use crate::core::model::LogLine;
use crate::core::store::LineStore;
use crate::core::tags::{TagRegistry, TagSelection};

/// The active tag filter. Defaults to the sentinel (show everything).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    selected: TagSelection,
}

impl FilterState {
    pub fn selected(&self) -> &TagSelection {
        &self.selected
    }

    /// Returns true if no filter is active.
    pub fn is_empty(&self) -> bool {
        self.selected == TagSelection::All
    }

    /// Change the selection from a tag name as received from a UI.
    /// Returns true when the selection actually changed.
    pub fn select(&mut self, registry: &TagRegistry, name: &str) -> bool {
        let selection = registry.resolve_selection(name);
        if selection == self.selected {
            return false;
        }
        tracing::debug!(from = self.selected.label(), to = selection.label(), "Filter changed");
        self.selected = selection;
        true
    }
}

/// Whether `line` passes `selection`.
///
/// Untagged lines pass only the sentinel selection.
pub fn is_visible(line: &LogLine, selection: &TagSelection) -> bool {
    match selection {
        TagSelection::All => true,
        TagSelection::Tag(selected) => line.tag() == Some(selected),
        TagSelection::Unknown(_) => false,
    }
}

/// Recompute visibility of every line in `store`. Returns the number of
/// visible lines.
pub fn apply_filter(store: &mut LineStore, selection: &TagSelection) -> usize {
    let mut visible = 0;
    for line in store.iter_mut() {
        let show = is_visible(line, selection);
        line.set_visible(show);
        visible += usize::from(show);
    }
    tracing::debug!(
        selection = selection.label(),
        visible,
        total = store.len(),
        "Filter applied"
    );
    visible
}
