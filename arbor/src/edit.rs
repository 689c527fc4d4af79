//! Cut/copy buffers and the ordering rule for batch reposition.
//!
//! The cut buffer holds detached subtrees pending paste; the copy buffer holds
//! serialized outline fragments. Each gesture clears its buffer and then
//! appends, so a buffer always reflects the latest cut or copy; between
//! gestures it is append-only until consumed.

use crate::{
    action::Direction,
    error::Result,
    tree::{Detached, MindMap, NodeId},
};
use smallvec::SmallVec;
use std::cmp::Reverse;

#[derive(Debug, Default)]
pub struct Clipboard {
    cut: Vec<Detached>,
    copy: Vec<String>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Detached subtrees pending paste, oldest first.
    pub fn cut_entries(&self) -> &[Detached] {
        &self.cut
    }

    /// Outline fragments pending paste, in the order they were copied.
    pub fn copy_fragments(&self) -> &[String] {
        &self.copy
    }

    pub(crate) fn begin_cut(&mut self) {
        self.cut.clear();
    }

    pub(crate) fn begin_copy(&mut self) {
        self.copy.clear();
    }

    pub(crate) fn push_cut(&mut self, entry: Detached) {
        self.cut.push(entry);
    }

    pub(crate) fn push_copy(&mut self, fragment: String) {
        self.copy.push(fragment);
    }

    /// Consume the cut buffer, oldest entry first.
    pub(crate) fn take_cut(&mut self) -> Vec<Detached> {
        std::mem::take(&mut self.cut)
    }
}

/// Order a resolved multi-selection for a batch swap.
///
/// Moving up, the member closest to the top of its sibling sequence must move
/// first so it frees the slot the next one swaps into; moving down the bottom
/// member goes first, symmetrically. Without this ordering adjacent selected
/// siblings would clobber each other's target slot. Members that no longer sit
/// in a sibling sequence are dropped.
pub(crate) fn reposition_order(
    map: &MindMap,
    selection: &[NodeId],
    direction: Direction,
) -> Result<SmallVec<[NodeId; 8]>> {
    let mut batch: SmallVec<[(usize, NodeId); 8]> = SmallVec::new();
    for &id in selection {
        if let Some(index) = map.sibling_index(id)? {
            batch.push((index, id));
        }
    }
    match direction {
        Direction::Up => batch.sort_by_key(|&(index, _)| index),
        Direction::Down => batch.sort_by_key(|&(index, _)| Reverse(index)),
    }
    Ok(batch.into_iter().map(|(_, id)| id).collect())
}

/// Swap every batch member one step in `direction` within its own sibling
/// sequence, preserving the relative order of the batch.
///
/// A member at its sequence boundary stays put, and so does a member whose
/// target slot is held by another member that stayed put -- otherwise a
/// contiguous block pressed against the boundary would rotate through itself.
/// Members elsewhere in the batch (other sequences included) still move.
/// Returns how many members actually moved.
pub(crate) fn reposition_batch(
    map: &mut MindMap,
    selection: &[NodeId],
    direction: Direction,
) -> Result<usize> {
    let order = reposition_order(map, selection, direction)?;
    let mut held: SmallVec<[NodeId; 8]> = SmallVec::new();
    let mut moved = 0;
    for &id in &order {
        let siblings = map.sibling_sequence(id)?;
        let Some(index) = siblings.iter().position(|&n| n == id) else {
            continue;
        };
        let neighbor = match direction {
            Direction::Up => index.checked_sub(1).map(|i| siblings[i]),
            Direction::Down => siblings.get(index + 1).copied(),
        };
        match neighbor {
            Some(neighbor) if !held.contains(&neighbor) => {
                map.reposition(id, direction)?;
                moved += 1;
            }
            _ => held.push(id),
        }
    }
    Ok(moved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Position;

    #[test]
    fn a_new_gesture_clears_the_buffer() {
        let mut clipboard = Clipboard::new();
        clipboard.push_copy("one".into());
        clipboard.begin_copy();
        clipboard.push_copy("two".into());
        assert_eq!(clipboard.copy_fragments(), &["two".to_string()]);
    }

    fn three_children() -> (MindMap, NodeId, NodeId, NodeId, NodeId) {
        let mut map = MindMap::new("root");
        let parent = map
            .insert_root_child(Position::Left, "parent", 0)
            .expect("insert parent");
        let child1 = map.insert_child(parent, "child1", 0).expect("child1");
        let child2 = map.insert_child(parent, "child2", 1).expect("child2");
        let child3 = map.insert_child(parent, "child3", 2).expect("child3");
        (map, parent, child1, child2, child3)
    }

    #[test]
    fn upward_batches_run_top_to_bottom() {
        let (map, _, child1, child2, child3) = three_children();

        let up = reposition_order(&map, &[child3, child2, child1], Direction::Up).expect("order");
        assert_eq!(up.as_slice(), &[child1, child2, child3]);

        let down =
            reposition_order(&map, &[child1, child3, child2], Direction::Down).expect("order");
        assert_eq!(down.as_slice(), &[child3, child2, child1]);
    }

    #[test]
    fn a_partial_batch_moves_as_a_block() {
        let (mut map, parent, child1, child2, child3) = three_children();

        let moved =
            reposition_batch(&mut map, &[child3, child2], Direction::Up).expect("batch");
        assert_eq!(moved, 2);
        assert_eq!(
            map.sequence(parent, Position::Left).expect("seq"),
            &[child2, child3, child1]
        );
    }

    #[test]
    fn a_block_against_the_boundary_does_not_rotate() {
        let (mut map, parent, child1, child2, child3) = three_children();

        let moved =
            reposition_batch(&mut map, &[child3, child2, child1], Direction::Up).expect("batch");
        assert_eq!(moved, 0);
        assert_eq!(
            map.sequence(parent, Position::Left).expect("seq"),
            &[child1, child2, child3]
        );

        let moved =
            reposition_batch(&mut map, &[child1, child2, child3], Direction::Down).expect("batch");
        assert_eq!(moved, 0);
        assert_eq!(
            map.sequence(parent, Position::Left).expect("seq"),
            &[child1, child2, child3]
        );
    }
}
