//! Read operations against a dataset database.

use grisera_core::{NodeId, NodeRecord, Properties, Property, RelationshipRecord};
use neo4rs::query;

use crate::client::{escape_identifier, GraphClient, GraphError};

const NODE_PROJECTION: &str = "id(n) AS id, labels(n) AS labels,
       [k IN keys(n) | {key: k, value: n[k]}] AS properties";

impl GraphClient {
    /// Get a node by its internal id.
    pub async fn get_node(
        &self,
        database: &str,
        id: NodeId,
    ) -> Result<Option<NodeRecord>, GraphError> {
        let cypher = format!(
            "MATCH (n) WHERE id(n) = $id
             RETURN {NODE_PROJECTION}"
        );

        let q = query(&cypher).param("id", id.0);

        match self.query_one_on(database, q).await? {
            Some(row) => Ok(Some(row_to_node(&row)?)),
            None => Ok(None),
        }
    }

    /// List all nodes carrying `label`, in id order.
    pub async fn get_nodes(
        &self,
        database: &str,
        label: &str,
    ) -> Result<Vec<NodeRecord>, GraphError> {
        let cypher = format!(
            "MATCH (n:{label})
             RETURN {NODE_PROJECTION}
             ORDER BY id(n)",
            label = escape_identifier(label)
        );

        let rows = self.query_rows_on(database, query(&cypher)).await?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            results.push(row_to_node(&row)?);
        }
        Ok(results)
    }

    /// All relationships touching the node, in either direction.
    pub async fn get_node_relationships(
        &self,
        database: &str,
        id: NodeId,
    ) -> Result<Vec<RelationshipRecord>, GraphError> {
        let q = query(
            "MATCH (n)-[r]-() WHERE id(n) = $id
             RETURN DISTINCT id(r) AS id, id(startNode(r)) AS start_node,
                    id(endNode(r)) AS end_node, type(r) AS name
             ORDER BY id",
        )
        .param("id", id.0);

        let rows = self.query_rows_on(database, q).await?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let read = |key: &str| {
                row.get::<i64>(key).map_err(|e| {
                    GraphError::Serialization(format!("Failed to read relationship {key}: {e}"))
                })
            };
            results.push(RelationshipRecord {
                id: read("id")?,
                start_node: NodeId(read("start_node")?),
                end_node: NodeId(read("end_node")?),
                name: row.get("name").map_err(|e| {
                    GraphError::Serialization(format!("Failed to read relationship name: {e}"))
                })?,
            });
        }
        Ok(results)
    }
}

/// Convert a projected row into a [`NodeRecord`].
fn row_to_node(row: &neo4rs::Row) -> Result<NodeRecord, GraphError> {
    let id: i64 = row
        .get("id")
        .map_err(|e| GraphError::Serialization(format!("Failed to read node id: {e}")))?;
    let labels: Vec<String> = row.get("labels").unwrap_or_default();
    let properties: Vec<Property> = row
        .get("properties")
        .map_err(|e| GraphError::Serialization(format!("Failed to read node properties: {e}")))?;

    Ok(NodeRecord {
        id: NodeId(id),
        labels,
        properties: properties.into_iter().collect::<Properties>(),
    })
}
