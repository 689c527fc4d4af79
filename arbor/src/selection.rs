//! Focus and multi-selection state for one open map.
//!
//! The single focus (`active`) and the ordered multi-selection are independent:
//! a node can be focused without being multi-selected and vice versa. Flags on
//! the nodes themselves are kept in sync so the rendering layer can style them.

use crate::{
    error::Result,
    tree::{MindMap, NodeId},
};

#[derive(Debug, Default)]
pub struct SelectionState {
    /// At most one node treated as focused.
    active: Option<NodeId>,
    /// Multi-selection in insertion order; the order drives copy fan-out and
    /// reposition batches.
    multi: Vec<NodeId>,
    /// Last known vertical depth, recorded after each committed focus move and
    /// consumed as the landing depth of later vertical steps.
    prev_depth: Option<u32>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<NodeId> {
        self.active
    }

    pub fn multi(&self) -> &[NodeId] {
        &self.multi
    }

    pub fn prev_depth(&self) -> Option<u32> {
        self.prev_depth
    }

    pub fn set_prev_depth(&mut self, depth: u32) {
        self.prev_depth = Some(depth);
    }

    /// Focus `id`, clearing the previous focus flag first.
    pub fn select(&mut self, map: &mut MindMap, id: NodeId) -> Result<()> {
        if let Some(previous) = self.active.take() {
            // The previous focus may have been removed from the map already.
            let _ = map.set_selected(previous, false);
        }
        map.set_selected(id, true)?;
        self.active = Some(id);
        Ok(())
    }

    /// Drop the focus without focusing anything else.
    pub fn deselect(&mut self, map: &mut MindMap) {
        if let Some(previous) = self.active.take() {
            let _ = map.set_selected(previous, false);
        }
    }

    /// Append `id` to the multi-selection, marking it soft-selected. Re-adding a
    /// member keeps its original position in the order.
    pub fn push_multi(&mut self, map: &mut MindMap, id: NodeId) -> Result<()> {
        map.set_soft_selected(id, true)?;
        if !self.multi.contains(&id) {
            self.multi.push(id);
        }
        Ok(())
    }

    /// Empty the multi-selection, clearing every member's soft flag. Idempotent.
    pub fn clear_all(&mut self, map: &mut MindMap) {
        for id in self.multi.drain(..) {
            let _ = map.set_soft_selected(id, false);
        }
    }

    /// Drop a node that no longer exists from both selections.
    pub fn forget(&mut self, id: NodeId) {
        if self.active == Some(id) {
            self.active = None;
        }
        self.multi.retain(|&n| n != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Position;

    fn map_with_children() -> (MindMap, NodeId, NodeId) {
        let mut map = MindMap::new("root");
        let a = map
            .insert_root_child(Position::Right, "a", 0)
            .expect("insert a");
        let b = map
            .insert_root_child(Position::Right, "b", 1)
            .expect("insert b");
        (map, a, b)
    }

    #[test]
    fn selecting_moves_the_flag() {
        let (mut map, a, b) = map_with_children();
        let mut selection = SelectionState::new();

        selection.select(&mut map, a).expect("select a");
        assert!(map.node(a).expect("a").is_selected());

        selection.select(&mut map, b).expect("select b");
        assert!(!map.node(a).expect("a").is_selected());
        assert!(map.node(b).expect("b").is_selected());
        assert_eq!(selection.active(), Some(b));
    }

    #[test]
    fn deselect_clears_without_replacement() {
        let (mut map, a, _) = map_with_children();
        let mut selection = SelectionState::new();

        selection.select(&mut map, a).expect("select");
        selection.deselect(&mut map);

        assert_eq!(selection.active(), None);
        assert!(!map.node(a).expect("a").is_selected());
    }

    #[test]
    fn multi_selection_is_ordered_and_independent_of_focus() {
        let (mut map, a, b) = map_with_children();
        let mut selection = SelectionState::new();

        selection.select(&mut map, a).expect("select");
        selection.push_multi(&mut map, b).expect("push b");
        selection.push_multi(&mut map, a).expect("push a");

        assert_eq!(selection.multi(), &[b, a]);
        assert!(map.node(b).expect("b").is_soft_selected());
        assert_eq!(selection.active(), Some(a));
    }

    #[test]
    fn clear_all_is_idempotent() {
        let (mut map, a, b) = map_with_children();
        let mut selection = SelectionState::new();

        selection.push_multi(&mut map, a).expect("push a");
        selection.push_multi(&mut map, b).expect("push b");
        selection.clear_all(&mut map);
        assert!(selection.multi().is_empty());
        assert!(!map.node(a).expect("a").is_soft_selected());

        // Clearing an already-empty selection changes nothing.
        selection.clear_all(&mut map);
        assert!(selection.multi().is_empty());
    }
}
