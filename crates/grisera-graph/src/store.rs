//! The graph store driver interface consumed by the entity mapper.

use async_trait::async_trait;
use grisera_core::{NodeId, NodeRecord, Properties, RelationshipRecord};

use crate::client::{GraphClient, GraphError};

/// Low-level calls the mapper issues against a property graph.
///
/// Implementations never interpret labels or relation names; type checks
/// and relation policy live in the mapper. `get_node` reports an absent id as
/// `Ok(None)` so callers can tell "not found" apart from a store failure.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Allocate a new node carrying `label` and no properties.
    async fn create_node(&self, label: &str) -> Result<NodeId, GraphError>;

    /// Fetch a node with its labels and properties.
    async fn get_node(&self, id: NodeId) -> Result<Option<NodeRecord>, GraphError>;

    /// Fetch every node carrying `label`.
    async fn get_nodes(&self, label: &str) -> Result<Vec<NodeRecord>, GraphError>;

    /// Fetch every relationship that starts or ends at `id`.
    async fn get_node_relationships(
        &self,
        id: NodeId,
    ) -> Result<Vec<RelationshipRecord>, GraphError>;

    /// Create a directed, named edge.
    async fn create_relationship(
        &self,
        start: NodeId,
        end: NodeId,
        name: &str,
    ) -> Result<RelationshipRecord, GraphError>;

    /// Write properties onto a node, overwriting keys that already exist.
    async fn create_properties(&self, id: NodeId, properties: &Properties)
        -> Result<(), GraphError>;

    /// Remove all properties from a node.
    async fn delete_node_properties(&self, id: NodeId) -> Result<(), GraphError>;

    /// Remove a node and every relationship incident to it.
    async fn delete_node(&self, id: NodeId) -> Result<(), GraphError>;
}

/// [`GraphStore`] bound to one Neo4j database.
#[derive(Clone)]
pub struct Neo4jStore {
    client: GraphClient,
    database: String,
}

impl Neo4jStore {
    pub fn new(client: GraphClient, database: impl Into<String>) -> Self {
        Self {
            client,
            database: database.into(),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }
}

#[async_trait]
impl GraphStore for Neo4jStore {
    async fn create_node(&self, label: &str) -> Result<NodeId, GraphError> {
        self.client.create_node(&self.database, label).await
    }

    async fn get_node(&self, id: NodeId) -> Result<Option<NodeRecord>, GraphError> {
        self.client.get_node(&self.database, id).await
    }

    async fn get_nodes(&self, label: &str) -> Result<Vec<NodeRecord>, GraphError> {
        self.client.get_nodes(&self.database, label).await
    }

    async fn get_node_relationships(
        &self,
        id: NodeId,
    ) -> Result<Vec<RelationshipRecord>, GraphError> {
        self.client.get_node_relationships(&self.database, id).await
    }

    async fn create_relationship(
        &self,
        start: NodeId,
        end: NodeId,
        name: &str,
    ) -> Result<RelationshipRecord, GraphError> {
        self.client
            .create_relationship(&self.database, start, end, name)
            .await
    }

    async fn create_properties(
        &self,
        id: NodeId,
        properties: &Properties,
    ) -> Result<(), GraphError> {
        self.client
            .create_properties(&self.database, id, properties)
            .await
    }

    async fn delete_node_properties(&self, id: NodeId) -> Result<(), GraphError> {
        self.client.delete_node_properties(&self.database, id).await
    }

    async fn delete_node(&self, id: NodeId) -> Result<(), GraphError> {
        self.client.delete_node(&self.database, id).await
    }
}
