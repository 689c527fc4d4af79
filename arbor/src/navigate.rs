//! Depth-aligned focus movement across the tree.
//!
//! Vertical movement steps between siblings, but the node the focus *lands* on
//! should sit at the same depth the focus came from, even when the neighboring
//! subtree is shaped differently. [`same_level_child`] does that depth-matching
//! descent; [`vertical_target`] combines it with the sibling step. Horizontal
//! movement is position-dependent and lives in [`crate::dispatch`].

use crate::{
    action::Direction,
    error::Result,
    tree::{MindMap, NodeId},
};

/// Descend from `start` along first children until reaching `target_depth`.
///
/// Total by construction: each descent strictly increases depth and the walk is
/// bounded by the remaining distance to the target. A collapsed node hides its
/// children, so the walk may stop shallower than the target; the deepest node
/// reached is returned in that case. A childless `start`, or one already at the
/// target depth, is returned unchanged.
pub fn same_level_child(map: &MindMap, start: NodeId, target_depth: u32) -> NodeId {
    let Some(node) = map.get(start) else {
        return start;
    };
    let mut current = start;
    let mut remaining = target_depth.saturating_sub(node.depth());
    while remaining > 0 {
        match map.first_visible_child(current) {
            Some(child) => {
                current = child;
                remaining -= 1;
            }
            None => break,
        }
    }
    current
}

/// The node vertical movement should focus from `node`, or `None` when the step
/// has nowhere to go (no parent, or no sibling in that direction -- there is no
/// wraparound).
///
/// The landing depth is `reference_depth` when the caller tracks one across
/// moves, falling back to the depth of the node being left.
pub fn vertical_target(
    map: &MindMap,
    node: NodeId,
    direction: Direction,
    reference_depth: Option<u32>,
) -> Result<Option<NodeId>> {
    let current = map.node(node)?;
    if current.parent().is_none() {
        return Ok(None);
    }

    let siblings = map.sibling_sequence(node)?;
    let Some(index) = siblings.iter().position(|&n| n == node) else {
        return Ok(None);
    };
    let target_index = match direction {
        Direction::Up => index.checked_sub(1),
        Direction::Down => (index + 1 < siblings.len()).then_some(index + 1),
    };
    let Some(target_index) = target_index else {
        return Ok(None);
    };

    let sibling = siblings[target_index];
    let depth = reference_depth.unwrap_or(current.depth());
    Ok(Some(same_level_child(map, sibling, depth)))
}

/// Pick the focus after a node was removed, given the sibling sequence as it
/// exists *after* removal and the former index of the removed node.
///
/// Preference order: the sibling now occupying the former index (what was the
/// "next" sibling), then the former "previous" sibling, then the parent. The
/// parent always exists because the root is never removable, so this always
/// yields exactly one node.
pub fn focus_after_delete(siblings: &[NodeId], former_index: usize, parent: NodeId) -> NodeId {
    siblings
        .get(former_index)
        .or_else(|| former_index.checked_sub(1).and_then(|i| siblings.get(i)))
        .copied()
        .unwrap_or(parent)
}
