use serde::{Deserialize, Serialize};

/// Decoded key intents accepted by the engine.
///
/// The shortcut layer owns raw key events; by the time an intent reaches the engine it
/// has already been resolved to one of these values. `Left`/`Right` are *physical*
/// directions -- whether they mean "toward the children" or "toward the root" depends on
/// which branch the focused node sits on (see [`crate::dispatch`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    Delete,
    NewSibling,
    NewChild,
    ToggleCollapse,
    Cut,
    Copy,
    Paste,
    Escape,
    Edit,
}

/// Vertical stepping direction shared by navigation and reposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum Direction {
    Up,
    Down,
}

impl Action {
    /// The vertical direction carried by this intent, if any.
    pub fn vertical(self) -> Option<Direction> {
        match self {
            Action::Up => Some(Direction::Up),
            Action::Down => Some(Direction::Down),
            _ => None,
        }
    }

    /// Whether this intent can mutate the map. Non-mutating intents stay dispatchable
    /// in read-only sessions.
    pub fn mutates(self) -> bool {
        matches!(
            self,
            Action::Delete
                | Action::NewSibling
                | Action::NewChild
                | Action::Cut
                | Action::Paste
                | Action::Edit
        )
    }

    /// Get a brief description of this intent.
    pub fn description(self) -> &'static str {
        match self {
            Action::Up => "Move focus to the sibling above",
            Action::Down => "Move focus to the sibling below",
            Action::Left => "Move focus leftward across the map",
            Action::Right => "Move focus rightward across the map",
            Action::Delete => "Delete the focused node and its subtree",
            Action::NewSibling => "Insert a sibling after the focused node",
            Action::NewChild => "Insert a child under the focused node",
            Action::ToggleCollapse => "Collapse or expand the focused node",
            Action::Cut => "Cut the selected nodes into the paste buffer",
            Action::Copy => "Copy the selected nodes as outline text",
            Action::Paste => "Paste cut subtrees under the focused node",
            Action::Escape => "Clear focus and multi-selection",
            Action::Edit => "Edit the focused node's label",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Action::Up => "up",
            Action::Down => "down",
            Action::Left => "left",
            Action::Right => "right",
            Action::Delete => "delete",
            Action::NewSibling => "new-sibling",
            Action::NewChild => "new-child",
            Action::ToggleCollapse => "toggle-collapse",
            Action::Cut => "cut",
            Action::Copy => "copy",
            Action::Paste => "paste",
            Action::Escape => "escape",
            Action::Edit => "edit",
        };
        write!(f, "{}", s)
    }
}
