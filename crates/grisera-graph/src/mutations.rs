//! Write operations against a dataset database.
//!
//! Nodes are addressed by their internal Neo4j id. Every statement returns
//! something so a write against a missing node is reported instead of being
//! silently matched away.

use grisera_core::{NodeId, Properties, PropertyValue, RelationshipRecord};
use neo4rs::{query, Query};

use crate::client::{escape_identifier, GraphClient, GraphError};

impl GraphClient {
    /// Create an empty node with a single label and return its id.
    pub async fn create_node(&self, database: &str, label: &str) -> Result<NodeId, GraphError> {
        let cypher = format!(
            "CREATE (n:{label})
             RETURN id(n) AS id",
            label = escape_identifier(label)
        );

        match self.query_one_on(database, query(&cypher)).await? {
            Some(row) => {
                let id: i64 = row.get("id").map_err(|e| {
                    GraphError::Serialization(format!("Failed to read created node id: {e}"))
                })?;
                Ok(NodeId(id))
            }
            None => Err(GraphError::Rejected {
                operation: "create_node".to_string(),
                reason: format!("no node returned for label {label}"),
            }),
        }
    }

    /// Create a directed edge `start -[name]-> end`.
    pub async fn create_relationship(
        &self,
        database: &str,
        start: NodeId,
        end: NodeId,
        name: &str,
    ) -> Result<RelationshipRecord, GraphError> {
        let cypher = format!(
            "MATCH (a), (b)
             WHERE id(a) = $start AND id(b) = $end
             CREATE (a)-[r:{rel_type}]->(b)
             RETURN id(r) AS id",
            rel_type = escape_identifier(name)
        );

        let q = query(&cypher).param("start", start.0).param("end", end.0);

        match self.query_one_on(database, q).await? {
            Some(row) => {
                let id: i64 = row.get("id").map_err(|e| {
                    GraphError::Serialization(format!("Failed to read relationship id: {e}"))
                })?;
                Ok(RelationshipRecord {
                    id,
                    start_node: start,
                    end_node: end,
                    name: name.to_string(),
                })
            }
            None => Err(GraphError::Rejected {
                operation: "create_relationship".to_string(),
                reason: format!("node {start} or {end} does not exist"),
            }),
        }
    }

    /// Set every property in `properties` on the node, keeping other keys.
    pub async fn create_properties(
        &self,
        database: &str,
        id: NodeId,
        properties: &Properties,
    ) -> Result<(), GraphError> {
        if properties.is_empty() {
            return Ok(());
        }

        let assignments: Vec<String> = properties
            .keys()
            .enumerate()
            .map(|(i, key)| format!("n.{} = $p{i}", escape_identifier(key)))
            .collect();
        let cypher = format!(
            "MATCH (n) WHERE id(n) = $id
             SET {}
             RETURN id(n) AS id",
            assignments.join(", ")
        );

        let mut q = query(&cypher).param("id", id.0);
        for (i, property) in properties.iter().enumerate() {
            q = bind_value(q, &format!("p{i}"), &property.value);
        }

        self.expect_node(database, q, id).await
    }

    /// Remove every property from the node.
    pub async fn delete_node_properties(
        &self,
        database: &str,
        id: NodeId,
    ) -> Result<(), GraphError> {
        let q = query(
            "MATCH (n) WHERE id(n) = $id
             SET n = {}
             RETURN id(n) AS id",
        )
        .param("id", id.0);

        self.expect_node(database, q, id).await
    }

    /// Delete the node together with all its relationships.
    pub async fn delete_node(&self, database: &str, id: NodeId) -> Result<(), GraphError> {
        let q = query(
            "MATCH (n) WHERE id(n) = $id
             DETACH DELETE n
             RETURN count(n) AS cnt",
        )
        .param("id", id.0);

        let deleted = match self.query_one_on(database, q).await? {
            Some(row) => row.get::<i64>("cnt").unwrap_or(0),
            None => 0,
        };
        if deleted == 0 {
            return Err(GraphError::MissingNode(id));
        }
        Ok(())
    }

    async fn expect_node(&self, database: &str, q: Query, id: NodeId) -> Result<(), GraphError> {
        match self.query_one_on(database, q).await? {
            Some(_) => Ok(()),
            None => Err(GraphError::MissingNode(id)),
        }
    }
}

fn bind_value(q: Query, name: &str, value: &PropertyValue) -> Query {
    match value {
        PropertyValue::Bool(b) => q.param(name, *b),
        PropertyValue::Int(i) => q.param(name, *i),
        PropertyValue::Float(f) => q.param(name, *f),
        PropertyValue::String(s) => q.param(name, s.clone()),
    }
}
