//! The core engine of a bidirectional mind-map editor.
//!
//! A map is a tree of ideas spreading from a root into two opposing branches.
//! This crate owns the logical side of editing such a map: interpreting decoded
//! key intents against the tree, keeping focus and multi-selection consistent
//! across structural edits, and notifying the collaborators that own rendering
//! and persistence. It never touches pixels, raw key events, or wire formats.
//!
//! The entry point is [`Arbor`]: one instance per open map, constructed when the
//! map opens and dropped when it closes. Intents arrive through
//! [`Arbor::handle_action`] and are fully processed -- mutation, focus update,
//! collaborator notifications -- before the next one is accepted. The engine is
//! single-threaded by design; embedders that need to drive a session from
//! multiple threads must funnel every operation through [`SharedArbor`]'s lock.

pub mod action;
pub mod dispatch;
pub mod edit;
pub mod effects;
pub mod error;
pub mod keymap;
pub mod navigate;
pub mod selection;
pub mod tree;

pub use action::{Action, Direction};
pub use dispatch::{HorizontalMove, Outcome};
pub use edit::Clipboard;
pub use effects::{
    Collaborators, NodeRecord, OutlineSerializer, Persistence, RecordId, Renderer, StoreError,
};
pub use error::{Error, Result};
pub use keymap::{EventSpec, EventsMap, KeyBinder};
pub use selection::SelectionState;
pub use tree::{Children, Detached, MindMap, Node, NodeId, Position};

use smallvec::SmallVec;
use std::sync::Arc;
use tracing::{debug, warn};

/// Shared handle for embedders that drive one session from multiple threads.
/// Every mutating operation must go through the single lock; the engine itself
/// assumes one mutator at a time.
pub type SharedArbor = Arc<parking_lot::Mutex<Arbor>>;

/// One editing session: an open map plus its selection, clipboard and
/// collaborator handles.
pub struct Arbor {
    map: MindMap,
    selection: SelectionState,
    clipboard: Clipboard,
    events: EventsMap,
    editable: bool,
    persistence: Arc<dyn Persistence>,
    renderer: Arc<dyn Renderer>,
    serializer: Arc<dyn OutlineSerializer>,
}

impl Arbor {
    /// Open a fresh map with no-op collaborators. Mostly useful headless.
    pub fn new(root_label: impl Into<compact_str::CompactString>) -> Self {
        Self::with_collaborators(root_label, Collaborators::default())
    }

    /// Open a fresh map wired to real collaborators.
    pub fn with_collaborators(
        root_label: impl Into<compact_str::CompactString>,
        collaborators: Collaborators,
    ) -> Self {
        let mut session = Self {
            map: MindMap::new(root_label),
            selection: SelectionState::new(),
            clipboard: Clipboard::new(),
            events: EventsMap::default(),
            editable: true,
            persistence: collaborators.persistence,
            renderer: collaborators.renderer,
            serializer: collaborators.serializer,
        };
        session.persist_create(session.map.root());
        session
    }

    pub fn map(&self) -> &MindMap {
        &self.map
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn events(&self) -> &EventsMap {
        &self.events
    }

    pub fn set_events(&mut self, events: EventsMap) {
        self.events = events;
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    /// Flip between editable and read-only ("presentation") mode.
    pub fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
    }

    /// Focus a node, typically on behalf of a pointer click in the renderer.
    ///
    /// Unlike keyboard dispatch this does *not* update the running reference
    /// depth: a later vertical step still lands at the depth the keyboard
    /// navigation last visited, which is what keeps depth-aligned scanning
    /// continuous across a click.
    pub fn select_node(&mut self, id: NodeId) -> Result<()> {
        self.map.node(id)?;
        self.selection.select(&mut self.map, id)?;
        self.renderer.focus_changed(id);
        Ok(())
    }

    /// Drop the focus without focusing anything else.
    pub fn deselect_node(&mut self) {
        self.selection.deselect(&mut self.map);
    }

    /// Add a node to the multi-selection.
    pub fn multi_select(&mut self, id: NodeId) -> Result<()> {
        self.selection.push_multi(&mut self.map, id)
    }

    /// Empty the multi-selection. Idempotent on an already-empty selection.
    pub fn clear_all_selected(&mut self) {
        self.selection.clear_all(&mut self.map);
        self.renderer.selection_cleared();
    }

    /// Commit a label edit from the inline editor.
    pub fn rename(&mut self, id: NodeId, label: impl Into<compact_str::CompactString>) -> Result<()> {
        self.map.set_label(id, label)?;
        self.persist_update(id);
        Ok(())
    }

    /// Process one decoded intent. Exactly one of three things happens: the
    /// intent is handled, it is silently ignored (nothing eligible, or the
    /// session is read-only), or a rejected mutation is reported as an error
    /// with no state change.
    pub fn handle_action(&mut self, action: Action) -> Result<Outcome> {
        if !self.editable && action.mutates() {
            debug!(%action, "ignored in read-only session");
            return Ok(Outcome::Ignored);
        }
        match action {
            Action::Up | Action::Down => {
                let Some(direction) = action.vertical() else {
                    return Ok(Outcome::Ignored);
                };
                if self.selection.multi().is_empty() {
                    self.vertical_movement(direction)
                } else if self.editable {
                    self.vertical_reposition_action(direction)
                } else {
                    Ok(Outcome::Ignored)
                }
            }
            Action::Left | Action::Right => self.horizontal_movement(action),
            Action::Delete => self.delete_action(),
            Action::NewSibling => self.add_sibling_action(),
            Action::NewChild => self.add_child_action(),
            Action::ToggleCollapse => self.toggle_collapse_action(),
            Action::Cut => self.cut_action(),
            Action::Copy => self.copy_action(),
            Action::Paste => self.paste_action(),
            Action::Escape => self.escape_action(),
            Action::Edit => self.edit_action(),
        }
    }

    /// Pre-action hook: resolve the focused node, or short-circuit the dispatch.
    fn before_action(&self) -> Option<NodeId> {
        let id = self.selection.active()?;
        self.map.get(id).map(|node| node.id())
    }

    /// Post-action hook: commit the new focus and record its depth as the
    /// running reference depth for later vertical landings.
    fn after_action(&mut self, id: NodeId) -> Result<()> {
        self.selection.select(&mut self.map, id)?;
        let depth = self.map.node(id)?.depth();
        self.selection.set_prev_depth(depth);
        self.renderer.focus_changed(id);
        Ok(())
    }

    fn vertical_movement(&mut self, direction: Direction) -> Result<Outcome> {
        let Some(node) = self.before_action() else {
            return Ok(Outcome::Ignored);
        };
        let target =
            navigate::vertical_target(&self.map, node, direction, self.selection.prev_depth())?;
        match target {
            Some(target) => {
                self.after_action(target)?;
                Ok(Outcome::Handled)
            }
            None => Ok(Outcome::Ignored),
        }
    }

    fn horizontal_movement(&mut self, key: Action) -> Result<Outcome> {
        let Some(node) = self.before_action() else {
            return Ok(Outcome::Ignored);
        };
        let position = self.map.node(node)?.position();
        let Some(movement) = dispatch::resolve_horizontal(position, key) else {
            return Ok(Outcome::Ignored);
        };

        let target = match movement {
            HorizontalMove::TowardChildren => {
                let current = self.map.node(node)?;
                if current.children().is_empty() {
                    None
                } else if current.is_collapsed() {
                    // Expand in place; the focus stays put.
                    self.map.toggle_collapsed(node)?;
                    self.renderer.node_collapsed(node, false);
                    if self.editable {
                        self.persist_update(node);
                    }
                    Some(node)
                } else {
                    self.map.first_visible_child(node)
                }
            }
            HorizontalMove::TowardParent => self.map.node(node)?.parent(),
        };

        match target {
            Some(target) => {
                self.after_action(target)?;
                Ok(Outcome::Handled)
            }
            None => Ok(Outcome::Ignored),
        }
    }

    fn delete_action(&mut self) -> Result<Outcome> {
        let Some(node) = self.before_action() else {
            return Ok(Outcome::Ignored);
        };
        if self.map.is_root(node) {
            warn!("refusing to delete the map root");
            return Err(Error::RootMutationRejected {
                operation: "deleted",
            });
        }

        let removed = self.map.remove_subtree(node)?;
        for id in &removed.nodes {
            self.selection.forget(*id);
        }
        if let Some(record) = removed.record {
            self.persist_delete(record);
        }

        let siblings: SmallVec<[NodeId; 8]> = self
            .map
            .sequence(removed.parent, removed.position)?
            .iter()
            .copied()
            .collect();
        let focus = navigate::focus_after_delete(&siblings, removed.index, removed.parent);
        self.after_action(focus)?;
        self.renderer.structure_changed();
        Ok(Outcome::Handled)
    }

    fn add_sibling_action(&mut self) -> Result<Outcome> {
        let Some(node) = self.before_action() else {
            return Ok(Outcome::Ignored);
        };
        let new_node = match self.map.node(node)?.parent() {
            // A sibling of the root is really a fresh top-level idea; only here
            // does the branch balancing rule pick the side.
            None => {
                let side = self.map.calculate_direction();
                self.map.insert_root_child(side, "", usize::MAX)?
            }
            Some(parent) => {
                let index = self.map.sibling_index(node)?.map_or(usize::MAX, |i| i + 1);
                if self.map.is_root(parent) {
                    // Siblings share their side, top-level nodes included.
                    let side = self.map.node(node)?.position();
                    self.map.insert_root_child(side, "", index)?
                } else {
                    self.map.insert_child(parent, "", index)?
                }
            }
        };
        self.after_new_node(new_node)?;
        Ok(Outcome::Handled)
    }

    fn add_child_action(&mut self) -> Result<Outcome> {
        let Some(node) = self.before_action() else {
            return Ok(Outcome::Ignored);
        };
        // Appending to a collapsed parent would hide the new node mid-edit.
        if self.map.node(node)?.is_collapsed() {
            self.map.toggle_collapsed(node)?;
            self.renderer.node_collapsed(node, false);
        }
        let new_node = self.map.insert_child(node, "", usize::MAX)?;
        self.after_new_node(new_node)?;
        Ok(Outcome::Handled)
    }

    /// Shared tail of both insertion flows: persist the node, move the focus
    /// onto it and hand it to the inline editor.
    fn after_new_node(&mut self, new_node: NodeId) -> Result<()> {
        self.persist_create(new_node);
        self.selection.deselect(&mut self.map);
        self.after_action(new_node)?;
        self.renderer.structure_changed();
        self.renderer.begin_edit(new_node);
        Ok(())
    }

    fn toggle_collapse_action(&mut self) -> Result<Outcome> {
        let Some(node) = self.before_action() else {
            return Ok(Outcome::Ignored);
        };
        if self.map.node(node)?.children().is_empty() {
            return Ok(Outcome::Ignored);
        }
        let collapsed = self.map.toggle_collapsed(node)?;
        self.renderer.node_collapsed(node, collapsed);
        if self.editable {
            self.persist_update(node);
        }
        Ok(Outcome::Handled)
    }

    fn cut_action(&mut self) -> Result<Outcome> {
        let targets: SmallVec<[NodeId; 8]> = if self.selection.multi().is_empty() {
            match self.before_action() {
                Some(node) => SmallVec::from_slice(&[node]),
                None => return Ok(Outcome::Ignored),
            }
        } else {
            self.selection.multi().iter().copied().collect()
        };

        // Reject before touching anything so a failed cut changes no state.
        if targets.iter().any(|&id| self.map.is_root(id)) {
            warn!("refusing to cut the map root");
            return Err(Error::RootMutationRejected { operation: "cut" });
        }

        self.clipboard.begin_cut();
        let mut last = None;
        for &target in &targets {
            let record = self.map.node(target)?.record();
            let detached = self.map.detach(target)?;
            if let Some(record) = record {
                self.persist_delete(record);
            }
            self.clipboard.push_cut(detached);
            last = Some(detached);
        }

        self.selection.clear_all(&mut self.map);
        if let Some(last) = last {
            let siblings: SmallVec<[NodeId; 8]> = self
                .map
                .sequence(last.source_parent, last.source_position)?
                .iter()
                .copied()
                .collect();
            let focus =
                navigate::focus_after_delete(&siblings, last.source_index, last.source_parent);
            self.after_action(focus)?;
        }
        self.renderer.structure_changed();
        Ok(Outcome::Handled)
    }

    fn copy_action(&mut self) -> Result<Outcome> {
        let targets: SmallVec<[NodeId; 8]> = self.selection.multi().iter().copied().collect();
        if targets.is_empty() {
            return Ok(Outcome::Ignored);
        }

        self.clipboard.begin_copy();
        for target in targets {
            let fragment = self.serializer.serialize(&self.map, target);
            self.clipboard.push_copy(fragment);
        }
        self.selection.clear_all(&mut self.map);
        self.renderer.selection_cleared();
        Ok(Outcome::Handled)
    }

    fn paste_action(&mut self) -> Result<Outcome> {
        let Some(target) = self.before_action() else {
            return Ok(Outcome::Ignored);
        };
        let entries = self.clipboard.take_cut();
        if entries.is_empty() {
            return Ok(Outcome::Ignored);
        }

        let mut last = None;
        for entry in entries {
            self.map.attach(entry.root, target, usize::MAX)?;
            for id in self.map.subtree(entry.root) {
                self.persist_create(id);
            }
            last = Some(entry.root);
        }
        if let Some(last) = last {
            self.after_action(last)?;
        }
        self.renderer.structure_changed();
        Ok(Outcome::Handled)
    }

    /// Swap every multi-selected node with its neighbor in `direction`, keeping
    /// the batch's relative order stable. Members already at their boundary are
    /// left unmoved for this call.
    fn vertical_reposition_action(&mut self, direction: Direction) -> Result<Outcome> {
        if self.selection.multi().is_empty() {
            return Ok(Outcome::Ignored);
        }
        let multi: SmallVec<[NodeId; 8]> = self.selection.multi().iter().copied().collect();
        let moved = edit::reposition_batch(&mut self.map, &multi, direction)?;
        debug!(moved, "reposition batch");
        self.renderer.structure_changed();
        Ok(Outcome::Handled)
    }

    fn escape_action(&mut self) -> Result<Outcome> {
        self.selection.clear_all(&mut self.map);
        self.selection.deselect(&mut self.map);
        self.renderer.selection_cleared();
        Ok(Outcome::Handled)
    }

    fn edit_action(&mut self) -> Result<Outcome> {
        let Some(node) = self.before_action() else {
            return Ok(Outcome::Ignored);
        };
        self.renderer.begin_edit(node);
        Ok(Outcome::Handled)
    }

    fn persist_create(&mut self, id: NodeId) {
        let Some(record) = NodeRecord::of(&self.map, id) else {
            return;
        };
        match self.persistence.create(record) {
            Ok(record_id) => {
                let _ = self.map.set_record(id, record_id);
            }
            Err(err) => warn!(%err, "store create failed"),
        }
    }

    fn persist_update(&self, id: NodeId) {
        let Some(node) = self.map.get(id) else {
            return;
        };
        let Some(record_id) = node.record() else {
            return;
        };
        let Some(record) = NodeRecord::of(&self.map, id) else {
            return;
        };
        if let Err(err) = self.persistence.update(record_id, record) {
            warn!(%err, "store update failed");
        }
    }

    fn persist_delete(&self, record: RecordId) {
        if let Err(err) = self.persistence.delete(record) {
            warn!(%err, "store delete failed");
        }
    }
}
