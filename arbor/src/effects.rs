//! Seams to the collaborators that live outside the engine.
//!
//! The engine never blocks on any of these: persistence and rendering calls are
//! fire-and-forget notifications issued after the in-memory state has already
//! been updated. Store failures are logged and otherwise left to the store to
//! retry or report; they never roll back an engine mutation.

use crate::tree::{MindMap, NodeId, Position};
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Identifier of a persisted node record, owned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of a node as handed to the store.
///
/// The record id deliberately travels *next to* the payload, never inside it, so
/// an update can't clobber the store's own key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub label: CompactString,
    pub position: Position,
    pub collapsed: bool,
    pub updated_at: DateTime<Utc>,
}

impl NodeRecord {
    /// Snapshot the node `id` as it currently exists in `map`.
    pub fn of(map: &MindMap, id: NodeId) -> Option<Self> {
        let node = map.get(id)?;
        Some(Self {
            label: node.label().into(),
            position: node.position(),
            collapsed: node.is_collapsed(),
            updated_at: Utc::now(),
        })
    }
}

/// Error reported by a store implementation. The engine logs it and moves on.
#[derive(Debug, thiserror::Error)]
#[error("store error: {0}")]
pub struct StoreError(pub String);

/// The persistence collaborator.
pub trait Persistence: Send + Sync {
    fn create(&self, record: NodeRecord) -> Result<RecordId, StoreError>;
    fn update(&self, id: RecordId, record: NodeRecord) -> Result<(), StoreError>;
    fn delete(&self, id: RecordId) -> Result<(), StoreError>;
}

/// The rendering collaborator. It owns all visual geometry; the engine only
/// tells it what changed. Implementations override what they care about.
pub trait Renderer: Send + Sync {
    fn focus_changed(&self, _node: NodeId) {}
    fn selection_cleared(&self) {}
    fn structure_changed(&self) {}
    fn node_collapsed(&self, _node: NodeId, _collapsed: bool) {}
    fn begin_edit(&self, _node: NodeId) {}
}

/// Produces an outline-text fragment for a node and its reachable,
/// non-collapsed descendants. The fragment format is the serializer's business.
pub trait OutlineSerializer: Send + Sync {
    fn serialize(&self, map: &MindMap, node: NodeId) -> String;
}

/// The collaborator handles one session needs. [`Collaborators::default`] wires
/// in no-op implementations, which is what tests and headless embedders want.
#[derive(Clone)]
pub struct Collaborators {
    pub persistence: Arc<dyn Persistence>,
    pub renderer: Arc<dyn Renderer>,
    pub serializer: Arc<dyn OutlineSerializer>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            persistence: Arc::new(NullStore),
            renderer: Arc::new(NullRenderer),
            serializer: Arc::new(NullSerializer),
        }
    }
}

struct NullStore;

impl Persistence for NullStore {
    fn create(&self, _record: NodeRecord) -> Result<RecordId, StoreError> {
        Ok(RecordId::new())
    }

    fn update(&self, _id: RecordId, _record: NodeRecord) -> Result<(), StoreError> {
        Ok(())
    }

    fn delete(&self, _id: RecordId) -> Result<(), StoreError> {
        Ok(())
    }
}

struct NullRenderer;

impl Renderer for NullRenderer {}

struct NullSerializer;

impl OutlineSerializer for NullSerializer {
    fn serialize(&self, _map: &MindMap, _node: NodeId) -> String {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_snapshots_the_current_node_state() {
        let mut map = MindMap::new("root");
        let id = map
            .insert_root_child(Position::Left, "idea", 0)
            .expect("insert");
        map.toggle_collapsed(id).expect("collapse");

        let record = NodeRecord::of(&map, id).expect("record");
        assert_eq!(record.label, "idea");
        assert_eq!(record.position, Position::Left);
        assert!(record.collapsed);
    }

    #[test]
    fn record_ids_are_unique() {
        assert_ne!(RecordId::new(), RecordId::new());
    }
}
