//! Neo4j connection management and shared graph client.

use grisera_core::config::Neo4jSettings;
use grisera_core::NodeId;
use neo4rs::{ConfigBuilder, Graph, Query};

/// Errors from graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Neo4j connection error: {0}")]
    Connection(String),

    #[error("Neo4j query error: {0}")]
    Query(#[from] neo4rs::Error),

    #[error("Node {0} does not exist")]
    MissingNode(NodeId),

    #[error("Store rejected {operation}: {reason}")]
    Rejected { operation: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Configuration for connecting to Neo4j.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
    pub fetch_size: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self::from(&Neo4jSettings::default())
    }
}

impl From<&Neo4jSettings> for GraphConfig {
    fn from(settings: &Neo4jSettings) -> Self {
        Self {
            uri: settings.uri.clone(),
            user: settings.user.clone(),
            password: settings.password.clone(),
            max_connections: settings.max_connections,
            fetch_size: settings.fetch_size,
        }
    }
}

/// Thread-safe Neo4j graph client with connection pooling.
///
/// Every dataset is a separate Neo4j database; the `*_on` methods route a
/// query to one of them. Clone is cheap (inner Arc).
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    /// Connect to Neo4j with the given configuration.
    pub async fn connect(config: &GraphConfig) -> Result<Self, GraphError> {
        let neo_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .max_connections(config.max_connections as usize)
            .fetch_size(config.fetch_size)
            .build()
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        tracing::info!(uri = %config.uri, "Connected to Neo4j");
        Ok(Self { graph })
    }

    /// Execute a write-only query against the given database.
    pub async fn run_on(&self, database: &str, query: Query) -> Result<(), GraphError> {
        self.graph.run_on(database, query).await?;
        Ok(())
    }

    /// Execute a read query against the given database and collect all rows.
    pub async fn query_rows_on(
        &self,
        database: &str,
        query: Query,
    ) -> Result<Vec<neo4rs::Row>, GraphError> {
        let mut stream = self.graph.execute_on(database, query).await?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Execute a read query against the given database and return the first row, if any.
    pub async fn query_one_on(
        &self,
        database: &str,
        query: Query,
    ) -> Result<Option<neo4rs::Row>, GraphError> {
        let mut stream = self.graph.execute_on(database, query).await?;
        Ok(stream.next().await?)
    }
}

/// Quote an identifier (label, relationship type, property key) for Cypher.
///
/// GRISERA labels contain spaces (`Registered Channel`), so every
/// identifier is wrapped in backticks with embedded backticks doubled.
pub fn escape_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}
