//! Selection state over nodes and connections.

use std::collections::HashSet;

/// A selectable element of the diagram.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementId {
    Node(i32),
    Connection(i32),
}

/// Tracks the selected elements with O(1) membership checks.
#[derive(Default)]
pub struct SelectionManager {
    selected: HashSet<ElementId>,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a click on an element. Additive interaction (shift held)
    /// toggles membership; plain interaction makes it the sole selection.
    pub fn handle_interaction(&mut self, id: ElementId, additive: bool) {
        if additive {
            if !self.selected.remove(&id) {
                self.selected.insert(id);
            }
        } else {
            if self.selected.len() == 1 && self.selected.contains(&id) {
                return;
            }
            self.selected.clear();
            self.selected.insert(id);
        }
    }

    /// Replace the selection wholesale, e.g. after a box selection.
    pub fn replace_selection<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = ElementId>,
    {
        self.selected.clear();
        self.selected.extend(ids);
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.selected.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ElementId> {
        self.selected.iter()
    }

    /// Selected node ids, sorted.
    pub fn node_ids(&self) -> Vec<i32> {
        let mut ids: Vec<i32> = self
            .selected
            .iter()
            .filter_map(|id| match id {
                ElementId::Node(node) => Some(*node),
                _ => None,
            })
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Selected connection ids, sorted.
    pub fn connection_ids(&self) -> Vec<i32> {
        let mut ids: Vec<i32> = self
            .selected
            .iter()
            .filter_map(|id| match id {
                ElementId::Connection(connection) => Some(*connection),
                _ => None,
            })
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}
