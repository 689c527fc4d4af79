//! Mirrored resolution of physical horizontal keys.
//!
//! The map grows in two opposite directions from the root, so one physical key
//! means "away from the root" on one branch and "toward the root" on the other.
//! The mirroring rule lives in a single lookup table keyed by the focused node's
//! position and the physical key, instead of being scattered across conditionals.
//!
//! Dispatch itself runs in three steps on the session object: a pre-action hook
//! resolves the current selection (an unresolved selection short-circuits the
//! whole dispatch), the resolved case action runs, and a post-action hook commits
//! the new focus and records its depth as the running reference depth.

use crate::{action::Action, tree::Position};

/// Logical meaning of a physical horizontal key on a particular branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalMove {
    /// Away from the root: expand a collapsed node, or focus its first child.
    TowardChildren,
    /// Toward the root: focus the structural parent.
    TowardParent,
}

/// What a dispatched intent did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Handled,
    /// Silent no-op: nothing eligible to act on, or the session is read-only.
    Ignored,
}

/// The mirroring rule. Root is absent on purpose: the root has no branch
/// position, so horizontal keys on it resolve to nothing.
const MIRROR: [((Position, Action), HorizontalMove); 4] = [
    (
        (Position::Right, Action::Right),
        HorizontalMove::TowardChildren,
    ),
    ((Position::Right, Action::Left), HorizontalMove::TowardParent),
    ((Position::Left, Action::Right), HorizontalMove::TowardParent),
    (
        (Position::Left, Action::Left),
        HorizontalMove::TowardChildren,
    ),
];

/// Resolve a physical `Left`/`Right` key against the focused node's position.
pub fn resolve_horizontal(position: Position, key: Action) -> Option<HorizontalMove> {
    MIRROR
        .iter()
        .find(|((p, k), _)| *p == position && *k == key)
        .map(|&(_, movement)| movement)
}
