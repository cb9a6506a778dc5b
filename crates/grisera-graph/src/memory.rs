//! In-process [`GraphStore`] for tests and dry runs.
//!
//! Ids are handed out sequentially starting at 1 and listings come back in
//! creation order. Every mutating call is appended to a journal, and any
//! operation can be told to fail so callers can check what happens after a
//! store error.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use grisera_core::{NodeId, NodeRecord, Properties, RelationshipRecord};

use crate::client::GraphError;
use crate::store::GraphStore;

/// A mutating call recorded by [`MemoryGraphStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOp {
    CreateNode { label: String },
    CreateRelationship { start: NodeId, end: NodeId, name: String },
    CreateProperties { id: NodeId, keys: Vec<String> },
    DeleteNodeProperties { id: NodeId },
    DeleteNode { id: NodeId },
}

#[derive(Default)]
struct State {
    next_node_id: i64,
    next_relationship_id: i64,
    nodes: BTreeMap<NodeId, StoredNode>,
    relationships: Vec<RelationshipRecord>,
    journal: Vec<StoreOp>,
    failing: HashSet<String>,
}

struct StoredNode {
    labels: Vec<String>,
    properties: Properties,
}

impl State {
    fn check(&self, operation: &str) -> Result<(), GraphError> {
        if self.failing.contains(operation) {
            return Err(GraphError::Rejected {
                operation: operation.to_string(),
                reason: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    fn record(&self, id: NodeId, node: &StoredNode) -> NodeRecord {
        NodeRecord {
            id,
            labels: node.labels.clone(),
            properties: node.properties.clone(),
        }
    }
}

#[derive(Default)]
pub struct MemoryGraphStore {
    state: Mutex<State>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Insert a node directly, bypassing the journal. Used to lay out
    /// fixtures, including nodes with several labels.
    pub fn insert_node(&self, labels: &[&str], properties: Properties) -> NodeId {
        let mut state = self.lock();
        state.next_node_id += 1;
        let id = NodeId(state.next_node_id);
        state.nodes.insert(
            id,
            StoredNode {
                labels: labels.iter().map(|l| (*l).to_string()).collect(),
                properties,
            },
        );
        id
    }

    /// Make every future call of `operation` (a [`GraphStore`] method name,
    /// e.g. `"create_node"`) fail.
    pub fn fail_on(&self, operation: &str) {
        self.lock().failing.insert(operation.to_string());
    }

    /// Stop failing `operation`.
    pub fn recover(&self, operation: &str) {
        self.lock().failing.remove(operation);
    }

    /// Mutating calls made so far, oldest first.
    pub fn journal(&self) -> Vec<StoreOp> {
        self.lock().journal.clone()
    }

    pub fn clear_journal(&self) {
        self.lock().journal.clear();
    }

    pub fn node_count(&self) -> usize {
        self.lock().nodes.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.lock().relationships.len()
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn create_node(&self, label: &str) -> Result<NodeId, GraphError> {
        let mut state = self.lock();
        state.check("create_node")?;
        state.next_node_id += 1;
        let id = NodeId(state.next_node_id);
        state.nodes.insert(
            id,
            StoredNode {
                labels: vec![label.to_string()],
                properties: Properties::new(),
            },
        );
        state.journal.push(StoreOp::CreateNode {
            label: label.to_string(),
        });
        Ok(id)
    }

    async fn get_node(&self, id: NodeId) -> Result<Option<NodeRecord>, GraphError> {
        let state = self.lock();
        state.check("get_node")?;
        Ok(state.nodes.get(&id).map(|node| state.record(id, node)))
    }

    async fn get_nodes(&self, label: &str) -> Result<Vec<NodeRecord>, GraphError> {
        let state = self.lock();
        state.check("get_nodes")?;
        Ok(state
            .nodes
            .iter()
            .filter(|(_, node)| node.labels.iter().any(|l| l == label))
            .map(|(id, node)| state.record(*id, node))
            .collect())
    }

    async fn get_node_relationships(
        &self,
        id: NodeId,
    ) -> Result<Vec<RelationshipRecord>, GraphError> {
        let state = self.lock();
        state.check("get_node_relationships")?;
        Ok(state
            .relationships
            .iter()
            .filter(|r| r.start_node == id || r.end_node == id)
            .cloned()
            .collect())
    }

    async fn create_relationship(
        &self,
        start: NodeId,
        end: NodeId,
        name: &str,
    ) -> Result<RelationshipRecord, GraphError> {
        let mut state = self.lock();
        state.check("create_relationship")?;
        for endpoint in [start, end] {
            if !state.nodes.contains_key(&endpoint) {
                return Err(GraphError::MissingNode(endpoint));
            }
        }
        state.next_relationship_id += 1;
        let relationship = RelationshipRecord {
            id: state.next_relationship_id,
            start_node: start,
            end_node: end,
            name: name.to_string(),
        };
        state.relationships.push(relationship.clone());
        state.journal.push(StoreOp::CreateRelationship {
            start,
            end,
            name: name.to_string(),
        });
        Ok(relationship)
    }

    async fn create_properties(
        &self,
        id: NodeId,
        properties: &Properties,
    ) -> Result<(), GraphError> {
        let mut state = self.lock();
        state.check("create_properties")?;
        let node = state.nodes.get_mut(&id).ok_or(GraphError::MissingNode(id))?;
        for property in properties {
            node.properties
                .insert(property.key.clone(), property.value.clone());
        }
        state.journal.push(StoreOp::CreateProperties {
            id,
            keys: properties.keys().map(str::to_string).collect(),
        });
        Ok(())
    }

    async fn delete_node_properties(&self, id: NodeId) -> Result<(), GraphError> {
        let mut state = self.lock();
        state.check("delete_node_properties")?;
        let node = state.nodes.get_mut(&id).ok_or(GraphError::MissingNode(id))?;
        node.properties = Properties::new();
        state.journal.push(StoreOp::DeleteNodeProperties { id });
        Ok(())
    }

    async fn delete_node(&self, id: NodeId) -> Result<(), GraphError> {
        let mut state = self.lock();
        state.check("delete_node")?;
        if state.nodes.remove(&id).is_none() {
            return Err(GraphError::MissingNode(id));
        }
        state
            .relationships
            .retain(|r| r.start_node != id && r.end_node != id);
        state.journal.push(StoreOp::DeleteNode { id });
        Ok(())
    }
}
