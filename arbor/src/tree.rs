//! The map tree: an arena of nodes spreading from a root into two branches.
//!
//! Nodes are stored in an id-keyed arena; parent links are plain ids, never owning
//! references, so subtrees can be detached and re-attached without touching the
//! nodes themselves. Two invariants hold after every mutation:
//!
//! - `depth == parent.depth + 1` for every non-root node
//! - `position` equals the position of the node's top-level ancestor, i.e. the
//!   direct child of root its subtree hangs off
//!
//! The root is special: it keeps two independently ordered child sequences, one per
//! branch direction, and is never removable.

use crate::{
    action::Direction,
    effects::RecordId,
    error::{Error, Result},
};
use compact_str::CompactString;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Stable identifier of a node within one map. Assigned at creation, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// Which side of the root a node's subtree grows toward.
///
/// Only direct children of root fix this value; every deeper descendant inherits it
/// from its top-level ancestor. The root itself is `Root`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    Left,
    Right,
    Root,
}

impl Position {
    /// Whether this is one of the two branch sides (not the root marker).
    pub fn is_branch(self) -> bool {
        !matches!(self, Position::Root)
    }
}

/// Ordered child storage. The root keeps one sequence per branch; everyone else
/// keeps a single sequence. Order is significant -- it defines sibling adjacency.
#[derive(Debug, Clone)]
pub enum Children {
    Root {
        left: Vec<NodeId>,
        right: Vec<NodeId>,
    },
    Branch(Vec<NodeId>),
}

impl Children {
    fn branch() -> Self {
        Children::Branch(Vec::new())
    }

    fn root() -> Self {
        Children::Root {
            left: Vec::new(),
            right: Vec::new(),
        }
    }

    /// The sequence a child with the given position lives in.
    pub fn sequence(&self, side: Position) -> &[NodeId] {
        match self {
            Children::Root { left, .. } if side == Position::Left => left,
            Children::Root { right, .. } => right,
            Children::Branch(seq) => seq,
        }
    }

    fn sequence_mut(&mut self, side: Position) -> &mut Vec<NodeId> {
        match self {
            Children::Root { left, .. } if side == Position::Left => left,
            Children::Root { right, .. } => right,
            Children::Branch(seq) => seq,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Children::Root { left, right } => left.len() + right.len(),
            Children::Branch(seq) => seq.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All children in order; for the root the left branch comes first.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        let (a, b): (&[NodeId], &[NodeId]) = match self {
            Children::Root { left, right } => (left, right),
            Children::Branch(seq) => (seq, &[]),
        };
        a.iter().chain(b.iter()).copied()
    }

    pub fn first(&self) -> Option<NodeId> {
        self.iter().next()
    }
}

/// One node of the map.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    label: CompactString,
    position: Position,
    depth: u32,
    parent: Option<NodeId>,
    children: Children,
    collapsed: bool,
    selected: bool,
    soft_selected: bool,
    record: Option<RecordId>,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &Children {
        &self.children
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn is_soft_selected(&self) -> bool {
        self.soft_selected
    }

    /// Persistence record backing this node, once the store has acknowledged it.
    pub fn record(&self) -> Option<RecordId> {
        self.record
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// A subtree detached from its parent, with enough source information to put it
/// back or paste it elsewhere. The nodes stay in the arena while detached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detached {
    pub root: NodeId,
    pub source_parent: NodeId,
    pub source_index: usize,
    pub source_position: Position,
}

/// Result of removing a subtree from the map entirely.
#[derive(Debug, Clone)]
pub struct Removed {
    pub parent: NodeId,
    pub index: usize,
    pub position: Position,
    pub record: Option<RecordId>,
    /// Every node of the removed subtree, pre-order.
    pub nodes: Vec<NodeId>,
}

/// The map itself: an arena of [`Node`]s plus the root id.
#[derive(Debug, Clone)]
pub struct MindMap {
    nodes: FxHashMap<NodeId, Node>,
    root: NodeId,
    next_id: u64,
}

impl MindMap {
    pub fn new(label: impl Into<CompactString>) -> Self {
        let root = NodeId(0);
        let mut nodes = FxHashMap::default();
        nodes.insert(
            root,
            Node {
                id: root,
                label: label.into(),
                position: Position::Root,
                depth: 0,
                parent: None,
                children: Children::root(),
                collapsed: false,
                selected: false,
                soft_selected: false,
                record: None,
            },
        );
        Self {
            nodes,
            root,
            next_id: 1,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        id == self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Every node in the arena, in no particular order. Includes subtrees that
    /// are currently detached and waiting in a cut buffer.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(&id).ok_or(Error::NodeNotFound { id })
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(&id).ok_or(Error::NodeNotFound { id })
    }

    /// The branch a new direct child of root should land on: the side with fewer
    /// children, ties toward `Right`.
    pub fn calculate_direction(&self) -> Position {
        let root = &self.nodes[&self.root];
        match &root.children {
            Children::Root { left, right } if left.len() < right.len() => Position::Left,
            _ => Position::Right,
        }
    }

    /// Insert a new node under `parent` at `index` (clamped to the sequence length).
    ///
    /// For a root parent the branch side is chosen by [`Self::calculate_direction`];
    /// everyone else inherits the parent's position.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        label: impl Into<CompactString>,
        index: usize,
    ) -> Result<NodeId> {
        let side = if self.is_root(parent) {
            self.calculate_direction()
        } else {
            self.node(parent)?.position
        };
        self.insert_child_at(parent, side, label, index)
    }

    /// Insert a new direct child of root on an explicit side.
    pub fn insert_root_child(
        &mut self,
        side: Position,
        label: impl Into<CompactString>,
        index: usize,
    ) -> Result<NodeId> {
        let side = if side.is_branch() {
            side
        } else {
            self.calculate_direction()
        };
        self.insert_child_at(self.root, side, label, index)
    }

    fn insert_child_at(
        &mut self,
        parent: NodeId,
        side: Position,
        label: impl Into<CompactString>,
        index: usize,
    ) -> Result<NodeId> {
        let depth = self.node(parent)?.depth + 1;
        let id = NodeId(self.next_id);
        self.next_id += 1;

        let label = label.into();
        debug!(?id, ?parent, ?side, %label, "insert node");

        self.nodes.insert(
            id,
            Node {
                id,
                label,
                position: side,
                depth,
                parent: Some(parent),
                children: Children::branch(),
                collapsed: false,
                selected: false,
                soft_selected: false,
                record: None,
            },
        );

        let seq = self
            .nodes
            .get_mut(&parent)
            .ok_or(Error::NodeNotFound { id: parent })?
            .children
            .sequence_mut(side);
        let at = index.min(seq.len());
        seq.insert(at, id);
        Ok(id)
    }

    /// The sibling sequence `id` sits in. The root has no siblings, so it gets the
    /// empty slice.
    pub fn sibling_sequence(&self, id: NodeId) -> Result<&[NodeId]> {
        let node = self.node(id)?;
        match node.parent {
            Some(parent) => Ok(self.node(parent)?.children.sequence(node.position)),
            None => Ok(&[]),
        }
    }

    /// The child sequence of `parent` holding children at `position`.
    pub fn sequence(&self, parent: NodeId, position: Position) -> Result<&[NodeId]> {
        Ok(self.node(parent)?.children.sequence(position))
    }

    /// Index of `id` within its sibling sequence, if it has one.
    pub fn sibling_index(&self, id: NodeId) -> Result<Option<usize>> {
        Ok(self.sibling_sequence(id)?.iter().position(|&n| n == id))
    }

    /// The direct child of root whose subtree contains `id`; root maps to itself.
    pub fn top_level_ancestor(&self, id: NodeId) -> Result<NodeId> {
        let mut current = id;
        loop {
            match self.node(current)?.parent {
                None => return Ok(current),
                Some(parent) if self.is_root(parent) => return Ok(current),
                Some(parent) => current = parent,
            }
        }
    }

    /// First child reachable by navigation: `None` when `id` is collapsed or a leaf.
    pub fn first_visible_child(&self, id: NodeId) -> Option<NodeId> {
        let node = self.get(id)?;
        if node.collapsed {
            return None;
        }
        node.children.first()
    }

    /// Every node of the subtree at `id`, pre-order. For the root the left branch
    /// comes first.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            if let Some(node) = self.get(current) {
                // Reverse so the stack pops children in sequence order.
                let children: Vec<_> = node.children.iter().collect();
                stack.extend(children.into_iter().rev());
            }
        }
        out
    }

    /// Detach the subtree at `id` from its parent, leaving the nodes in the arena.
    pub fn detach(&mut self, id: NodeId) -> Result<Detached> {
        if self.is_root(id) {
            return Err(Error::RootMutationRejected {
                operation: "detached",
            });
        }
        let node = self.node(id)?;
        let parent = node.parent.ok_or(Error::NodeNotFound { id })?;
        let position = node.position;

        let seq = self.node_mut(parent)?.children.sequence_mut(position);
        let index = seq
            .iter()
            .position(|&n| n == id)
            .ok_or(Error::NodeNotFound { id })?;
        seq.remove(index);

        self.node_mut(id)?.parent = None;
        debug!(?id, ?parent, index, "detach subtree");
        Ok(Detached {
            root: id,
            source_parent: parent,
            source_index: index,
            source_position: position,
        })
    }

    /// Attach a previously detached subtree under `parent` at `index`, re-deriving
    /// `depth` for the whole subtree and re-stamping `position` when it crosses
    /// branches.
    pub fn attach(&mut self, id: NodeId, parent: NodeId, index: usize) -> Result<()> {
        if self.is_root(id) {
            return Err(Error::RootMutationRejected {
                operation: "re-attached",
            });
        }
        // The target must not sit inside the subtree being attached.
        let mut probe = Some(parent);
        while let Some(current) = probe {
            if current == id {
                return Err(Error::NodeNotFound { id: parent });
            }
            probe = self.node(current)?.parent;
        }

        let side = if self.is_root(parent) {
            self.calculate_direction()
        } else {
            self.node(parent)?.position
        };
        let depth = self.node(parent)?.depth + 1;

        {
            let node = self.node_mut(id)?;
            node.parent = Some(parent);
            node.position = side;
            node.depth = depth;
        }
        let seq = self.node_mut(parent)?.children.sequence_mut(side);
        let at = index.min(seq.len());
        seq.insert(at, id);

        self.restamp_descendants(id)?;
        debug!(?id, ?parent, ?side, "attach subtree");
        Ok(())
    }

    /// Remove the subtree at `id` from the map entirely.
    pub fn remove_subtree(&mut self, id: NodeId) -> Result<Removed> {
        if self.is_root(id) {
            return Err(Error::RootMutationRejected {
                operation: "deleted",
            });
        }
        let detached = self.detach(id)?;
        let nodes = self.subtree(id);
        let record = self.node(id)?.record;
        for node in &nodes {
            self.nodes.remove(node);
        }
        debug!(?id, removed = nodes.len(), "remove subtree");
        Ok(Removed {
            parent: detached.source_parent,
            index: detached.source_index,
            position: detached.source_position,
            record,
            nodes,
        })
    }

    /// Swap `id` with its immediate neighbor in `direction` within its own sibling
    /// sequence. Returns `false` (and changes nothing) at the sequence boundary.
    pub fn reposition(&mut self, id: NodeId, direction: Direction) -> Result<bool> {
        if self.is_root(id) {
            return Err(Error::RootMutationRejected {
                operation: "repositioned",
            });
        }
        let node = self.node(id)?;
        let parent = node.parent.ok_or(Error::NodeNotFound { id })?;
        let position = node.position;

        let seq = self.node_mut(parent)?.children.sequence_mut(position);
        let index = seq
            .iter()
            .position(|&n| n == id)
            .ok_or(Error::NodeNotFound { id })?;
        let target = match direction {
            Direction::Up => index.checked_sub(1),
            Direction::Down => (index + 1 < seq.len()).then_some(index + 1),
        };
        match target {
            Some(target) => {
                seq.swap(index, target);
                debug!(?id, from = index, to = target, "reposition");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Flip the collapsed flag, returning the new state.
    pub fn toggle_collapsed(&mut self, id: NodeId) -> Result<bool> {
        let node = self.node_mut(id)?;
        node.collapsed = !node.collapsed;
        Ok(node.collapsed)
    }

    pub fn set_label(&mut self, id: NodeId, label: impl Into<CompactString>) -> Result<()> {
        self.node_mut(id)?.label = label.into();
        Ok(())
    }

    pub(crate) fn set_selected(&mut self, id: NodeId, selected: bool) -> Result<()> {
        self.node_mut(id)?.selected = selected;
        Ok(())
    }

    pub(crate) fn set_soft_selected(&mut self, id: NodeId, soft: bool) -> Result<()> {
        self.node_mut(id)?.soft_selected = soft;
        Ok(())
    }

    pub(crate) fn set_record(&mut self, id: NodeId, record: RecordId) -> Result<()> {
        self.node_mut(id)?.record = Some(record);
        Ok(())
    }

    /// Re-derive `depth` and `position` for everything below `id` from `id`'s own
    /// (already correct) values.
    fn restamp_descendants(&mut self, id: NodeId) -> Result<()> {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let (depth, position, children): (u32, Position, Vec<NodeId>) = {
                let node = self.node(current)?;
                (node.depth, node.position, node.children.iter().collect())
            };
            for child in children {
                let child_node = self.node_mut(child)?;
                child_node.depth = depth + 1;
                child_node.position = position;
                stack.push(child);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (MindMap, NodeId, NodeId, NodeId) {
        let mut map = MindMap::new("root");
        let parent = map
            .insert_root_child(Position::Right, "parent", 0)
            .expect("insert parent");
        let a = map.insert_child(parent, "a", 0).expect("insert a");
        let b = map.insert_child(parent, "b", 1).expect("insert b");
        (map, parent, a, b)
    }

    #[test]
    fn depth_is_derived_from_parent() {
        let (map, parent, a, _) = sample();
        assert_eq!(map.node(parent).expect("parent").depth(), 1);
        assert_eq!(map.node(a).expect("a").depth(), 2);
    }

    #[test]
    fn children_inherit_branch_position() {
        let (map, _, a, b) = sample();
        assert_eq!(map.node(a).expect("a").position(), Position::Right);
        assert_eq!(map.node(b).expect("b").position(), Position::Right);
    }

    #[test]
    fn direction_prefers_emptier_side_with_right_tiebreak() {
        let mut map = MindMap::new("root");
        assert_eq!(map.calculate_direction(), Position::Right);

        map.insert_root_child(Position::Right, "r", 0)
            .expect("insert right");
        assert_eq!(map.calculate_direction(), Position::Left);

        map.insert_root_child(Position::Left, "l", 0)
            .expect("insert left");
        assert_eq!(map.calculate_direction(), Position::Right);
    }

    #[test]
    fn root_cannot_be_removed() {
        let mut map = MindMap::new("root");
        let err = map.remove_subtree(map.root()).expect_err("root removal");
        assert_eq!(
            err,
            Error::RootMutationRejected {
                operation: "deleted"
            }
        );
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn remove_drops_the_whole_subtree() {
        let (mut map, parent, a, b) = sample();
        let removed = map.remove_subtree(parent).expect("remove parent");
        assert_eq!(removed.nodes, vec![parent, a, b]);
        assert_eq!(removed.index, 0);
        assert!(map.get(parent).is_none());
        assert!(map.get(a).is_none());
        assert!(map.get(b).is_none());
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn reattach_across_branches_restamps_depth_and_position() {
        let mut map = MindMap::new("root");
        let right = map
            .insert_root_child(Position::Right, "right", 0)
            .expect("insert right");
        let left = map
            .insert_root_child(Position::Left, "left", 0)
            .expect("insert left");
        let child = map.insert_child(right, "child", 0).expect("insert child");
        let grandchild = map
            .insert_child(child, "grandchild", 0)
            .expect("insert grandchild");

        map.detach(child).expect("detach");
        map.attach(child, left, 0).expect("attach");

        let child_node = map.node(child).expect("child");
        assert_eq!(child_node.position(), Position::Left);
        assert_eq!(child_node.depth(), 2);
        let grandchild_node = map.node(grandchild).expect("grandchild");
        assert_eq!(grandchild_node.position(), Position::Left);
        assert_eq!(grandchild_node.depth(), 3);
    }

    #[test]
    fn attach_rejects_a_target_inside_the_subtree() {
        let (mut map, parent, a, _) = sample();
        map.detach(parent).expect("detach");
        assert!(map.attach(parent, a, 0).is_err());
    }

    #[test]
    fn reposition_swaps_with_the_neighbor() {
        let (mut map, parent, a, b) = sample();
        assert!(map.reposition(b, Direction::Up).expect("swap"));
        assert_eq!(map.sequence(parent, Position::Right).expect("seq"), &[b, a]);
    }

    #[test]
    fn reposition_is_a_no_op_at_the_boundary() {
        let (mut map, parent, a, b) = sample();
        assert!(!map.reposition(a, Direction::Up).expect("no-op"));
        assert_eq!(map.sequence(parent, Position::Right).expect("seq"), &[a, b]);
    }

    #[test]
    fn collapsed_nodes_hide_their_children_from_navigation() {
        let (mut map, parent, a, _) = sample();
        assert_eq!(map.first_visible_child(parent), Some(a));
        map.toggle_collapsed(parent).expect("collapse");
        assert_eq!(map.first_visible_child(parent), None);
    }

    #[test]
    fn top_level_ancestor_walks_to_the_root_child() {
        let (map, parent, a, _) = sample();
        let grand = map.top_level_ancestor(a).expect("ancestor");
        assert_eq!(grand, parent);
        assert_eq!(
            map.top_level_ancestor(map.root()).expect("root ancestor"),
            map.root()
        );
    }
}
